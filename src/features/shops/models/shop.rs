use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for a print shop
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Shop {
    pub id: i64,
    /// External reference encoded in the shop's QR code
    pub uuid: Uuid,
    pub name: String,
    /// Owning account (identity provider subject)
    pub user_id: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
