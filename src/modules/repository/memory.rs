//! In-process repository used by service and handler tests

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PaymentRecord, Repository, RepositoryError};
use crate::features::print_jobs::models::{
    Attachment, NewAttachment, NewPrintJob, PrintJob, PrintJobStatus,
};
use crate::features::shops::models::Shop;

const FIRST_DOC_NO: i64 = 100_001;

#[derive(Default)]
struct MemoryState {
    shops: Vec<Shop>,
    jobs: Vec<PrintJob>,
    attachments: Vec<Attachment>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
    fail_inserts: AtomicBool,
    remove_after_next_read: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_shop(&self, name: &str) -> Shop {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let shop = Shop {
            id: state.shops.len() as i64 + 1,
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            user_id: Some("shop-owner".to_string()),
            created_by: Some("admin".to_string()),
            updated_by: None,
            created_at: now,
            updated_at: now,
        };
        state.shops.push(shop.clone());
        shop
    }

    /// Make the next inserts fail as if the database rejected the transaction
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Hand out the next job read as-is, then remove the row behind the
    /// reader's back, like a concurrent delete landing between read and write
    pub fn remove_after_next_read(&self) {
        self.remove_after_next_read.store(true, Ordering::SeqCst);
    }

    async fn read_job<P>(&self, predicate: P) -> Option<PrintJob>
    where
        P: Fn(&PrintJob) -> bool + Send,
    {
        let mut state = self.state.write().await;
        let job = state.jobs.iter_mut().find(|j| predicate(j))?;
        let snapshot = job.clone();
        if self.remove_after_next_read.swap(false, Ordering::SeqCst) {
            job.removed_at = Some(Utc::now());
        }
        Some(snapshot)
    }

    pub async fn job_count(&self) -> usize {
        self.state.read().await.jobs.len()
    }

    pub async fn attachment_count(&self) -> usize {
        self.state.read().await.attachments.len()
    }

    /// Overwrite a job's creation time, for day-boundary tests
    pub async fn set_created_at(&self, id: i64, created_at: DateTime<Utc>) {
        let mut state = self.state.write().await;
        if let Some(job) = state.jobs.iter_mut().find(|j| j.id == id) {
            job.created_at = created_at;
        }
    }

    async fn update_where<F, U>(&self, id: i64, guard: F, update: U) -> Option<PrintJob>
    where
        F: FnOnce(&PrintJob) -> bool + Send,
        U: FnOnce(&mut PrintJob) + Send,
    {
        let mut state = self.state.write().await;
        let job = state.jobs.iter_mut().find(|j| j.id == id)?;
        if !guard(job) {
            return None;
        }
        update(job);
        job.updated_at = Utc::now();
        Some(job.clone())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_shop_by_uuid(&self, uuid: Uuid) -> Result<Option<Shop>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.shops.iter().find(|s| s.uuid == uuid).cloned())
    }

    async fn count_shops(&self) -> Result<i64, RepositoryError> {
        Ok(self.state.read().await.shops.len() as i64)
    }

    async fn count_jobs_created_since(
        &self,
        since: DateTime<Utc>,
        shop_id: Option<i64>,
    ) -> Result<i64, RepositoryError> {
        let state = self.state.read().await;
        let count = state
            .jobs
            .iter()
            .filter(|j| j.created_at >= since)
            .filter(|j| shop_id.is_none() || j.shop_id == shop_id)
            .count();
        Ok(count as i64)
    }

    async fn insert_print_job(
        &self,
        job: &NewPrintJob,
        attachments: &[NewAttachment],
    ) -> Result<(PrintJob, Vec<Attachment>), RepositoryError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Backend(
                "insert rejected by test repository".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        let now = Utc::now();
        let id = state.jobs.len() as i64 + 1;

        let print_job = PrintJob {
            id,
            job_uuid: job.job_uuid,
            doc_no: FIRST_DOC_NO + id - 1,
            shop_id: job.shop_id,
            user_id: job.user_id.clone(),
            printer: None,
            error_message: None,
            status: PrintJobStatus::Pending,
            total_copies: job.total_copies,
            is_color: job.is_color,
            is_double_sided: job.is_double_sided,
            is_portrait: job.is_portrait,
            total_pages: Some(job.total_pages),
            total_cost: Some(job.total_cost),
            payment_method: None,
            payment_reference: None,
            otp: Some(job.otp.clone()),
            otp_expires_at: Some(job.otp_expires_at),
            submitted_at: None,
            completed_at: None,
            removed_at: None,
            created_at: now,
            updated_at: now,
        };

        let mut rows = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let row = Attachment {
                id: (state.attachments.len() + rows.len()) as i64 + 1,
                print_job_id: id,
                filename: attachment.filename.clone(),
                filepath: attachment.filepath.clone(),
                filesize: attachment.filesize,
                filetype: attachment.filetype.clone(),
                pages: attachment.pages,
                created_at: now,
            };
            rows.push(row);
        }

        state.jobs.push(print_job.clone());
        state.attachments.extend(rows.iter().cloned());
        Ok((print_job, rows))
    }

    async fn find_print_job_by_id(&self, id: i64) -> Result<Option<PrintJob>, RepositoryError> {
        Ok(self.read_job(|j| j.id == id).await)
    }

    async fn find_print_job_by_uuid(
        &self,
        job_uuid: Uuid,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        Ok(self.read_job(|j| j.job_uuid == job_uuid).await)
    }

    async fn find_print_job_by_doc_no(
        &self,
        doc_no: i64,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.jobs.iter().find(|j| j.doc_no == doc_no).cloned())
    }

    async fn list_attachments(
        &self,
        print_job_id: i64,
    ) -> Result<Vec<Attachment>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .attachments
            .iter()
            .filter(|a| a.print_job_id == print_job_id)
            .cloned()
            .collect())
    }

    async fn record_payment(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        payment: &PaymentRecord,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        Ok(self
            .update_where(
                id,
                |job| !job.is_removed() && from.contains(&job.status),
                |job| {
                    job.status = PrintJobStatus::Paid;
                    job.submitted_at = Some(payment.paid_at);
                    job.payment_method = Some(payment.method.clone());
                    job.payment_reference = Some(payment.reference.clone());
                },
            )
            .await)
    }

    async fn consume_otp(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        Ok(self
            .update_where(
                id,
                |job| {
                    !job.is_removed()
                        && from.contains(&job.status)
                        && job.otp.as_deref() == Some(otp)
                        && job.otp_expires_at.is_some_and(|expiry| now <= expiry)
                },
                |job| {
                    job.status = PrintJobStatus::Verified;
                    job.completed_at = Some(now);
                    job.otp = None;
                    job.otp_expires_at = None;
                },
            )
            .await)
    }

    async fn mark_failed(
        &self,
        id: i64,
        from: &[PrintJobStatus],
        message: &str,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        Ok(self
            .update_where(
                id,
                |job| !job.is_removed() && from.contains(&job.status),
                |job| {
                    job.status = PrintJobStatus::Failed;
                    job.error_message = Some(message.to_string());
                },
            )
            .await)
    }

    async fn mark_removed(
        &self,
        id: i64,
        removed_at: DateTime<Utc>,
    ) -> Result<Option<PrintJob>, RepositoryError> {
        Ok(self
            .update_where(
                id,
                |job| !job.is_removed(),
                |job| job.removed_at = Some(removed_at),
            )
            .await)
    }

    async fn restore_removed(
        &self,
        id: i64,
        removed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.update_where(
            id,
            |job| job.removed_at == Some(removed_at),
            |job| job.removed_at = None,
        )
        .await;
        Ok(())
    }
}
