use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::config::{OtpConfig, PricingConfig};
use crate::core::error::AppError;
use crate::features::print_jobs::dtos::{
    file_extension, validate_upload, CreatePrintJob, PaymentResponseDto, PrintJobResponseDto,
    ReleasedFileDto, RemovedResponseDto, UploadedFile, VerifyOtpResponseDto,
};
use crate::features::print_jobs::models::{NewAttachment, NewPrintJob, PrintJob, PrintJobStatus};
use crate::features::print_jobs::services::otp::{verify_otp, OtpCheck, OtpIssuer};
use crate::features::print_jobs::services::payment::{
    PaymentError, PaymentMethod, PaymentProvider,
};
use crate::features::print_jobs::services::pricing::{estimate_pages, CostCalculator};
use crate::modules::repository::{PaymentRecord, Repository, RepositoryError};
use crate::modules::storage::{job_directory, job_file_key, FileStore, StorageError};

const OCTET_STREAM: &str = "application/octet-stream";

/// Failure kinds of the print job lifecycle
#[derive(Debug, Error)]
pub enum PrintJobError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    OtpMismatch,

    #[error("OTP already used")]
    OtpConsumed,

    #[error("Cannot move print job from {from} to {to}")]
    InvalidTransition {
        from: PrintJobStatus,
        to: PrintJobStatus,
    },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<PrintJobError> for AppError {
    fn from(err: PrintJobError) -> Self {
        match err {
            PrintJobError::Validation(messages) => AppError::Validation(messages),
            PrintJobError::NotFound(msg) => AppError::NotFound(msg),
            e @ (PrintJobError::OtpExpired
            | PrintJobError::OtpMismatch
            | PrintJobError::OtpConsumed
            | PrintJobError::InvalidTransition { .. }) => AppError::BadRequest(e.to_string()),
            PrintJobError::Conflict(msg) => AppError::Conflict(msg),
            PrintJobError::Payment(e) => AppError::PaymentRequired(e.to_string()),
            PrintJobError::Storage(e) => AppError::Storage(e),
            PrintJobError::Repository(e) => e.into(),
        }
    }
}

type Result<T> = std::result::Result<T, PrintJobError>;

fn job_not_found() -> PrintJobError {
    PrintJobError::NotFound("Print job not found".to_string())
}

/// MIME type recorded for an upload, guessed from the filename when the client sent none
fn resolve_content_type(file: &UploadedFile) -> String {
    match file.content_type.as_deref().map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != OCTET_STREAM => ct.to_string(),
        _ => mime_guess::from_path(&file.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

/// Drives a print job from upload to release and removal
pub struct PrintJobService {
    repository: Arc<dyn Repository>,
    file_store: Arc<dyn FileStore>,
    payment_provider: Arc<dyn PaymentProvider>,
    calculator: CostCalculator,
    otp_issuer: OtpIssuer,
}

impl PrintJobService {
    pub fn new(
        repository: Arc<dyn Repository>,
        file_store: Arc<dyn FileStore>,
        payment_provider: Arc<dyn PaymentProvider>,
        pricing: PricingConfig,
        otp: &OtpConfig,
    ) -> Self {
        Self {
            repository,
            file_store,
            payment_provider,
            calculator: CostCalculator::new(pricing),
            otp_issuer: OtpIssuer::new(otp),
        }
    }

    /// Ingest an upload: store every file, price the job and commit it with its
    /// attachments. Either the whole job exists afterwards or nothing does.
    pub async fn create(&self, request: CreatePrintJob) -> Result<PrintJobResponseDto> {
        validate_upload(&request).map_err(PrintJobError::Validation)?;

        let shop_id = match request.shop_uuid {
            Some(shop_uuid) => {
                let shop = self
                    .repository
                    .find_shop_by_uuid(shop_uuid)
                    .await?
                    .ok_or_else(|| PrintJobError::Validation(vec!["shop not found".to_string()]))?;
                Some(shop.id)
            }
            None => None,
        };

        let job_uuid = Uuid::new_v4();
        let otp = self.otp_issuer.issue(Utc::now());

        let CreatePrintJob {
            files,
            copies,
            is_color,
            is_double_sided,
            is_portrait,
            user_id,
            ..
        } = request;

        let mut attachments = Vec::with_capacity(files.len());
        let mut total_pages: u32 = 0;

        for file in files {
            let extension = file_extension(&file.filename).unwrap_or_default();
            let filesize = file.size() as u64;
            let pages = estimate_pages(&extension, filesize);
            let filetype = resolve_content_type(&file);
            let key = job_file_key(job_uuid, &format!("{}.{}", Uuid::new_v4(), extension));

            if let Err(e) = self.file_store.put(&key, file.data, &filetype).await {
                error!("Failed to store '{}' for print job {}: {}", file.filename, job_uuid, e);
                self.purge_job_directory(job_uuid).await;
                return Err(e.into());
            }

            total_pages = total_pages.saturating_add(pages);
            attachments.push(NewAttachment {
                filename: file.filename,
                filepath: key,
                filesize: filesize as i64,
                filetype,
                pages: i32::try_from(pages).unwrap_or(i32::MAX),
            });
        }

        let total_cost = self.calculator.cost(
            total_pages,
            copies.max(0) as u32,
            is_color,
            is_double_sided,
        );

        let new_job = NewPrintJob {
            job_uuid,
            shop_id,
            user_id,
            total_copies: copies,
            is_color,
            is_double_sided,
            is_portrait,
            total_pages: i32::try_from(total_pages).unwrap_or(i32::MAX),
            total_cost,
            otp: otp.code,
            otp_expires_at: otp.expires_at,
        };

        let (job, attachments) = match self.repository.insert_print_job(&new_job, &attachments).await
        {
            Ok(inserted) => inserted,
            Err(e) => {
                self.purge_job_directory(job_uuid).await;
                return Err(e.into());
            }
        };

        info!(
            "Created print job {} (doc_no {}) with {} file(s), {} page(s), cost {}",
            job.job_uuid,
            job.doc_no,
            attachments.len(),
            total_pages,
            total_cost
        );

        Ok(PrintJobResponseDto::with_attachments(job, attachments))
    }

    /// Charge a pending job and hand out its OTP
    pub async fn pay(&self, print_job_id: i64, method: PaymentMethod) -> Result<PaymentResponseDto> {
        let job = self.find_live_by_id(print_job_id).await?;

        if job.status != PrintJobStatus::Pending {
            return Err(PrintJobError::InvalidTransition {
                from: job.status,
                to: PrintJobStatus::Paid,
            });
        }

        let receipt = self.payment_provider.charge(&job, method).await?;

        let payment = PaymentRecord {
            method: receipt.method.to_string(),
            reference: receipt.reference.clone(),
            paid_at: Utc::now(),
        };

        let job = self
            .repository
            .record_payment(job.id, &[PrintJobStatus::Pending], &payment)
            .await?
            .ok_or_else(|| {
                PrintJobError::Conflict("Print job was changed by another request".to_string())
            })?;

        let otp = job.otp.clone().ok_or(PrintJobError::OtpConsumed)?;

        info!(
            "Print job {} paid {} via {} (reference {})",
            job.job_uuid, receipt.amount, payment.method, payment.reference
        );

        Ok(PaymentResponseDto {
            otp,
            print_job: job.into(),
        })
    }

    pub async fn verify_otp(&self, job_uuid: Uuid, code: &str) -> Result<VerifyOtpResponseDto> {
        self.verify_otp_at(job_uuid, code, Utc::now()).await
    }

    /// Check the OTP and release the job's files. The code works once.
    pub async fn verify_otp_at(
        &self,
        job_uuid: Uuid,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifyOtpResponseDto> {
        let job = self.find_live_by_uuid(job_uuid).await?;

        match verify_otp(job.otp.as_deref(), job.otp_expires_at, code, now) {
            OtpCheck::Valid => {}
            OtpCheck::Expired => return Err(PrintJobError::OtpExpired),
            OtpCheck::Mismatch => return Err(PrintJobError::OtpMismatch),
            OtpCheck::Consumed => return Err(PrintJobError::OtpConsumed),
        }

        if !job.status.can_transition_to(PrintJobStatus::Verified) {
            return Err(PrintJobError::InvalidTransition {
                from: job.status,
                to: PrintJobStatus::Verified,
            });
        }

        // URLs first so a storage failure leaves the OTP usable
        let attachments = self.repository.list_attachments(job.id).await?;
        let mut files = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let url = self.file_store.file_url(&attachment.filepath).await?;
            files.push(ReleasedFileDto {
                filename: attachment.filename,
                filepath: url,
            });
        }

        let job = self
            .repository
            .consume_otp(
                job.id,
                &PrintJobStatus::sources_of(PrintJobStatus::Verified),
                code.trim(),
                now,
            )
            .await?
            .ok_or_else(|| {
                PrintJobError::Conflict("Print job was changed by another request".to_string())
            })?;

        info!("Print job {} verified, released {} file(s)", job.job_uuid, files.len());

        Ok(VerifyOtpResponseDto {
            print_job_uuid: job.job_uuid,
            shop_id: job.shop_id,
            files,
        })
    }

    /// Remove a job by its document number and purge its files
    pub async fn delete_by_doc_no(&self, doc_no: i64) -> Result<RemovedResponseDto> {
        let job = self
            .repository
            .find_print_job_by_doc_no(doc_no)
            .await?
            .filter(|job| !job.is_removed())
            .ok_or_else(job_not_found)?;

        self.remove(job).await
    }

    /// Remove a job by UUID and purge its files
    pub async fn remove_files(&self, job_uuid: Uuid) -> Result<RemovedResponseDto> {
        let job = self.find_live_by_uuid(job_uuid).await?;
        self.remove(job).await
    }

    pub async fn mark_failed(&self, job_uuid: Uuid, message: &str) -> Result<PrintJobResponseDto> {
        let job = self.find_live_by_uuid(job_uuid).await?;

        if !job.status.can_transition_to(PrintJobStatus::Failed) {
            return Err(PrintJobError::InvalidTransition {
                from: job.status,
                to: PrintJobStatus::Failed,
            });
        }

        let job = self
            .repository
            .mark_failed(
                job.id,
                &PrintJobStatus::sources_of(PrintJobStatus::Failed),
                message,
            )
            .await?
            .ok_or_else(|| {
                PrintJobError::Conflict("Print job was changed by another request".to_string())
            })?;

        warn!("Print job {} marked as failed: {}", job.job_uuid, message);
        Ok(job.into())
    }

    /// Job with its attachments. Read-only.
    pub async fn get_by_uuid(&self, job_uuid: Uuid) -> Result<PrintJobResponseDto> {
        let job = self.find_live_by_uuid(job_uuid).await?;
        let attachments = self.repository.list_attachments(job.id).await?;
        Ok(PrintJobResponseDto::with_attachments(job, attachments))
    }

    async fn find_live_by_id(&self, id: i64) -> Result<PrintJob> {
        self.repository
            .find_print_job_by_id(id)
            .await?
            .filter(|job| !job.is_removed())
            .ok_or_else(job_not_found)
    }

    async fn find_live_by_uuid(&self, job_uuid: Uuid) -> Result<PrintJob> {
        self.repository
            .find_print_job_by_uuid(job_uuid)
            .await?
            .filter(|job| !job.is_removed())
            .ok_or_else(job_not_found)
    }

    /// Claim the row, then purge. A failed purge releases the claim so the
    /// removal can be retried.
    async fn remove(&self, job: PrintJob) -> Result<RemovedResponseDto> {
        let removed_at = Utc::now();

        let job = self
            .repository
            .mark_removed(job.id, removed_at)
            .await?
            .ok_or_else(job_not_found)?;

        if let Err(e) = self
            .file_store
            .delete_directory(&job_directory(job.job_uuid))
            .await
        {
            error!("Failed to purge files of print job {}: {}", job.job_uuid, e);
            if let Err(restore_err) = self.repository.restore_removed(job.id, removed_at).await {
                error!(
                    "Failed to release removal claim on print job {}: {}",
                    job.job_uuid, restore_err
                );
            }
            return Err(e.into());
        }

        info!("Removed print job {} (doc_no {})", job.job_uuid, job.doc_no);

        Ok(RemovedResponseDto {
            job_uuid: job.job_uuid,
            doc_no: job.doc_no,
            removed_at,
        })
    }

    /// Best-effort cleanup after a failed ingestion
    async fn purge_job_directory(&self, job_uuid: Uuid) {
        if let Err(e) = self
            .file_store
            .delete_directory(&job_directory(job_uuid))
            .await
        {
            error!("Failed to purge files of abandoned print job {}: {}", job_uuid, e);
        }
    }

    #[cfg(test)]
    pub fn calculator(&self) -> &CostCalculator {
        &self.calculator
    }
}
