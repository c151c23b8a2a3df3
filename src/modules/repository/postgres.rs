use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::{status_names, PaymentRecord, Repository, RepositoryError};
use crate::features::print_jobs::models::{
    Attachment, NewAttachment, NewPrintJob, PrintJob, PrintJobStatus,
};
use crate::features::shops::models::Shop;

/// Postgres implementation backed by the `shops`, `print_jobs` and `attachments` tables
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn log_db_error(context: &'static str) -> impl Fn(sqlx::Error) -> RepositoryError {
    move |e| {
        error!("{}: {:?}", context, e);
        RepositoryError::Database(e)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_shop_by_uuid(&self, uuid: Uuid) -> Result<Option<Shop>, RepositoryError> {
        sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, uuid, name, user_id, created_by, updated_by, created_at, updated_at
            FROM shops
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_error("Failed to get shop"))
    }

    async fn count_shops(&self) -> Result<i64, RepositoryError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shops")
            .fetch_one(&self.pool)
            .await
            .map_err(log_db_error("Failed to count shops"))
    }

    async fn count_jobs_created_since(
        &self,
        since: DateTime<Utc>,
        shop_id: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM print_jobs
            WHERE created_at >= $1
            AND ($2::BIGINT IS NULL OR shop_id = $2)
            "#,
        )
        .bind(since)
        .bind(shop_id)
        .fetch_one(&self.pool)
        .await
        .map_err(log_db_error("Failed to count print jobs"))
    }

    async fn insert_print_job(
        &self,
        job: &NewPrintJob,
        attachments: &[NewAttachment],
    ) -> Result<(PrintJob, Vec<Attachment>), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(log_db_error("Failed to begin transaction"))?;

        let print_job = sqlx::query_as::<_, PrintJob>(
            r#"
            INSERT INTO print_jobs (
                job_uuid, shop_id, user_id, status, total_copies, is_color,
                is_double_sided, is_portrait, total_pages, total_cost, otp, otp_expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(job.job_uuid)
        .bind(job.shop_id)
        .bind(&job.user_id)
        .bind(PrintJobStatus::Pending)
        .bind(job.total_copies)
        .bind(job.is_color)
        .bind(job.is_double_sided)
        .bind(job.is_portrait)
        .bind(job.total_pages)
        .bind(job.total_cost)
        .bind(&job.otp)
        .bind(job.otp_expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(log_db_error("Failed to insert print job"))?;

        let mut rows = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let row = sqlx::query_as::<_, Attachment>(
                r#"
                INSERT INTO attachments (print_job_id, filename, filepath, filesize, filetype, pages)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, print_job_id, filename, filepath, filesize, filetype, pages, created_at
                "#,
            )
            .bind(print_job.id)
            .bind(&attachment.filename)
            .bind(&attachment.filepath)
            .bind(attachment.filesize)
            .bind(&attachment.filetype)
            .bind(attachment.pages)
            .fetch_one(&mut *tx)
            .await
            .map_err(log_db_error("Failed to insert attachment"))?;
            rows.push(row);
        }

        tx.commit()
            .await
            .map_err(log_db_error("Failed to commit print job"))?;

        debug!(
            "Inserted print job {} with {} attachment(s)",
            print_job.job_uuid,
            rows.len()
        );
        Ok((print_job, rows))
    }

    async fn find_print_job_by_id(&self, id: i64) -> Result<Option<PrintJob>, RepositoryError> {
        sqlx::query_as::<_, PrintJob>("SELECT * FROM print_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_db_error("Failed to get print job"))
    }

    async fn find_print_job_by_uuid(
        &self,
        job_uuid: Uuid,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        sqlx::query_as::<_, PrintJob>("SELECT * FROM print_jobs WHERE job_uuid = $1")
            .bind(job_uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_db_error("Failed to get print job by uuid"))
    }

    async fn find_print_job_by_doc_no(
        &self,
        doc_no: i64,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        sqlx::query_as::<_, PrintJob>("SELECT * FROM print_jobs WHERE doc_no = $1")
            .bind(doc_no)
            .fetch_optional(&self.pool)
            .await
            .map_err(log_db_error("Failed to get print job by doc_no"))
    }

    async fn list_attachments(
        &self,
        print_job_id: i64,
    ) -> Result<Vec<Attachment>, RepositoryError> {
        sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, print_job_id, filename, filepath, filesize, filetype, pages, created_at
            FROM attachments
            WHERE print_job_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(print_job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(log_db_error("Failed to list attachments"))
    }

    async fn record_payment(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        payment: &PaymentRecord,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        sqlx::query_as::<_, PrintJob>(
            r#"
            UPDATE print_jobs
            SET status = $3, submitted_at = $4, payment_method = $5,
                payment_reference = $6, updated_at = NOW()
            WHERE id = $1
            AND status::TEXT = ANY($2)
            AND removed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status_names(from))
        .bind(PrintJobStatus::Paid)
        .bind(payment.paid_at)
        .bind(&payment.method)
        .bind(&payment.reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_error("Failed to record payment"))
    }

    async fn consume_otp(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        sqlx::query_as::<_, PrintJob>(
            r#"
            UPDATE print_jobs
            SET status = $3, completed_at = $5, otp = NULL, otp_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            AND status::TEXT = ANY($2)
            AND removed_at IS NULL
            AND otp = $4
            AND otp_expires_at >= $5
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status_names(from))
        .bind(PrintJobStatus::Verified)
        .bind(otp)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_error("Failed to consume OTP"))
    }

    async fn mark_failed(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        message: &str,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        sqlx::query_as::<_, PrintJob>(
            r#"
            UPDATE print_jobs
            SET status = $3, error_message = $4, updated_at = NOW()
            WHERE id = $1
            AND status::TEXT = ANY($2)
            AND removed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status_names(from))
        .bind(PrintJobStatus::Failed)
        .bind(message)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_error("Failed to mark print job as failed"))
    }

    async fn mark_removed(
        &self,
        id: i64,
        removed_at: DateTime<Utc>,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        sqlx::query_as::<_, PrintJob>(
            r#"
            UPDATE print_jobs
            SET removed_at = $2, updated_at = NOW()
            WHERE id = $1
            AND removed_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(removed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(log_db_error("Failed to mark print job as removed"))
    }

    async fn restore_removed(
        &self,
        id: i64,
        removed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE print_jobs
            SET removed_at = NULL, updated_at = NOW()
            WHERE id = $1
            AND removed_at = $2
            "#,
        )
        .bind(id)
        .bind(removed_at)
        .execute(&self.pool)
        .await
        .map_err(log_db_error("Failed to restore print job"))?;

        Ok(())
    }
}
