use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Header numbers for the admin dashboard
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummaryDto {
    /// Every registered shop
    pub overall_shops_count: i64,
    /// Print jobs created since midnight UTC, across all shops
    pub today_prints_count: i64,
}
