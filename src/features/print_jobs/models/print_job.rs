use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Print job status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "print_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrintJobStatus {
    Pending,
    Paid,
    Verified,
    Failed,
}

impl PrintJobStatus {
    /// Whether a live (not removed) job may move from `self` to `next`
    pub fn can_transition_to(self, next: PrintJobStatus) -> bool {
        use PrintJobStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Verified)
                | (Paid, Verified)
                | (Pending, Failed)
                | (Paid, Failed)
                | (Verified, Failed)
        )
    }

    /// Every status that may move to `next`
    pub fn sources_of(next: PrintJobStatus) -> Vec<PrintJobStatus> {
        [
            PrintJobStatus::Pending,
            PrintJobStatus::Paid,
            PrintJobStatus::Verified,
            PrintJobStatus::Failed,
        ]
        .into_iter()
        .filter(|from| from.can_transition_to(next))
        .collect()
    }
}

impl std::fmt::Display for PrintJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrintJobStatus::Pending => write!(f, "pending"),
            PrintJobStatus::Paid => write!(f, "paid"),
            PrintJobStatus::Verified => write!(f, "verified"),
            PrintJobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Database model for a print job
#[derive(Debug, Clone, FromRow)]
pub struct PrintJob {
    pub id: i64,
    pub job_uuid: Uuid,
    pub doc_no: i64,
    pub shop_id: Option<i64>,
    pub user_id: Option<String>,
    pub printer: Option<String>,
    pub error_message: Option<String>,
    pub status: PrintJobStatus,
    pub total_copies: i32,
    pub is_color: bool,
    pub is_double_sided: bool,
    pub is_portrait: bool,
    pub total_pages: Option<i32>,
    pub total_cost: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrintJob {
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }
}

/// Data for inserting a fully priced print job
#[derive(Debug, Clone)]
pub struct NewPrintJob {
    pub job_uuid: Uuid,
    pub shop_id: Option<i64>,
    pub user_id: Option<String>,
    pub total_copies: i32,
    pub is_color: bool,
    pub is_double_sided: bool,
    pub is_portrait: bool,
    pub total_pages: i32,
    pub total_cost: Decimal,
    pub otp: String,
    pub otp_expires_at: DateTime<Utc>,
}
