//! Relational persistence for shops, print jobs and attachments.
//!
//! Lifecycle services depend on the [`Repository`] trait instead of a concrete
//! pool. State changes are compare-and-set: an update names the state it expects
//! the row to be in and returns `None` when another request got there first.

#[cfg(test)]
pub mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::features::print_jobs::models::{
    Attachment, NewAttachment, NewPrintJob, PrintJob, PrintJobStatus,
};
use crate::features::shops::models::Shop;

pub use postgres::PostgresRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Payment details written when a job is paid
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub method: String,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

#[async_trait]
pub trait Repository: Send + Sync {
    // ───────────────────────────── Shops ─────────────────────────────

    async fn find_shop_by_uuid(&self, uuid: Uuid) -> Result<Option<Shop>, RepositoryError>;

    async fn count_shops(&self) -> Result<i64, RepositoryError>;

    /// Jobs created at or after `since`, optionally limited to one shop
    async fn count_jobs_created_since(
        &self,
        since: DateTime<Utc>,
        shop_id: Option<i64>,
    ) -> Result<i64, RepositoryError>;

    // ───────────────────────────── Print jobs ─────────────────────────────

    /// Insert a job together with all of its attachments in one transaction
    async fn insert_print_job(
        &self,
        job: &NewPrintJob,
        attachments: &[NewAttachment],
    ) -> Result<(PrintJob, Vec<Attachment>), RepositoryError>;

    async fn find_print_job_by_id(&self, id: i64) -> Result<Option<PrintJob>, RepositoryError>;

    async fn find_print_job_by_uuid(
        &self,
        job_uuid: Uuid,
    ) -> Result<Option<PrintJob>, RepositoryError>;

    async fn find_print_job_by_doc_no(
        &self,
        doc_no: i64,
    ) -> Result<Option<PrintJob>, RepositoryError>;

    async fn list_attachments(&self, print_job_id: i64)
        -> Result<Vec<Attachment>, RepositoryError>;

    // ───────────────────────────── Transitions ─────────────────────────────

    /// Move a live job in one of `from` to `paid`
    async fn record_payment(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        payment: &PaymentRecord,
    ) -> Result<Option<PrintJob>, RepositoryError>;

    /// Move a live job to `verified` if `otp` still matches and has not expired.
    /// Clears the OTP so it cannot be presented again.
    async fn consume_otp(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PrintJob>, RepositoryError>;

    async fn mark_failed(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        message: &str,
    ) -> Result<Option<PrintJob>, RepositoryError>;

    /// Set `removed_at` on a job that is not removed yet
    async fn mark_removed(
        &self,
        id: i64,
        removed_at: DateTime<Utc>,
    ) -> Result<Option<PrintJob>, RepositoryError>;

    /// Undo [`Repository::mark_removed`] when the file purge that followed it failed
    async fn restore_removed(
        &self,
        id: i64,
        removed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

pub(crate) fn status_names(statuses: &[PrintJobStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.to_string()).collect()
}
