use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for a file attached to a print job
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Attachment {
    pub id: i64,
    pub print_job_id: i64,
    /// Original client filename
    pub filename: String,
    /// Opaque file store key
    pub filepath: String,
    pub filesize: i64,
    pub filetype: String,
    pub pages: i32,
    pub created_at: DateTime<Utc>,
}

/// Attachment row for a file that has already been written to the file store
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub filename: String,
    pub filepath: String,
    pub filesize: i64,
    pub filetype: String,
    pub pages: i32,
}
