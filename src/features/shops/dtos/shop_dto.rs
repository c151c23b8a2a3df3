use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::shops::models::Shop;

/// Public view of a shop, shown on the upload page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShopSummaryDto {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
}

impl From<Shop> for ShopSummaryDto {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            uuid: shop.uuid,
            name: shop.name,
        }
    }
}

/// Context for the upload page reached through a shop's QR code
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrintPageDto {
    /// `null` when no shop was given or it does not exist
    pub shop: Option<ShopSummaryDto>,
    /// The shop UUID as requested
    pub shop_uuid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShopResponseDto {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub user_id: Option<String>,
    /// Print jobs created at this shop since midnight UTC
    pub today_print_jobs_count: i64,
    /// Target of the shop's QR code
    pub qr_code_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
