use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::print_jobs::models::{Attachment, PrintJob, PrintJobStatus};
use crate::features::print_jobs::services::payment::PaymentMethod;
use crate::shared::validation::{validation_messages, OTP_REGEX};

/// Extensions accepted for printing
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Maximum size of a single uploaded file (10 MiB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub const MAX_COPIES: i32 = 100;

/// Lowercased extension of a client filename, if it has one
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn is_extension_allowed(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension)
}

/// Upload form for OpenAPI documentation.
/// The handler reads the multipart body field by field.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadPrintJobFormDto {
    /// One or more documents (repeat the field, `files[]` is also accepted)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub files: Vec<String>,
    /// Shop the job is printed at
    pub shop_uuid: Option<Uuid>,
    /// Copies per document, 1 to 100
    #[schema(example = 1)]
    pub copies: i32,
    #[schema(example = false)]
    pub is_color: bool,
    #[schema(example = false)]
    pub is_double_sided: bool,
    /// Defaults to portrait
    #[schema(example = true)]
    pub is_portrait: Option<bool>,
}

/// A file read from the upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Parsed upload request, validated before anything is stored
#[derive(Debug, Clone, Validate)]
pub struct CreatePrintJob {
    pub files: Vec<UploadedFile>,
    pub shop_uuid: Option<Uuid>,
    #[validate(range(min = 1, max = MAX_COPIES, message = "copies must be between 1 and 100"))]
    pub copies: i32,
    pub is_color: bool,
    pub is_double_sided: bool,
    pub is_portrait: bool,
    /// Submitting identity when the uploader was signed in
    pub user_id: Option<String>,
}

#[cfg(test)]
impl CreatePrintJob {
    pub fn new(files: Vec<UploadedFile>, copies: i32) -> Self {
        Self {
            files,
            shop_uuid: None,
            copies,
            is_color: false,
            is_double_sided: false,
            is_portrait: true,
            user_id: None,
        }
    }
}

/// Collect every problem with an upload request
pub fn validate_upload(request: &CreatePrintJob) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    if request.files.is_empty() {
        errors.push("at least one file is required".to_string());
    }
    if let Err(e) = request.validate() {
        errors.extend(validation_messages(&e));
    }

    for file in &request.files {
        match file_extension(&file.filename) {
            Some(ext) if is_extension_allowed(&ext) => {}
            _ => errors.push(format!(
                "{}: unsupported file type. Allowed types: {}",
                file.filename,
                ALLOWED_EXTENSIONS.join(", ")
            )),
        }

        if file.size() > MAX_FILE_SIZE {
            errors.push(format!(
                "{}: file too large. Maximum size is {} MB",
                file.filename,
                MAX_FILE_SIZE / 1024 / 1024
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PaymentDto {
    #[validate(range(min = 1, message = "print_job_id is required"))]
    pub print_job_id: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpDto {
    pub print_job_uuid: Uuid,
    #[validate(regex(path = *OTP_REGEX, message = "otp must be exactly 4 digits"))]
    #[schema(example = "4821")]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteByDocNoDto {
    #[validate(range(min = 1, message = "doc_no is required"))]
    #[schema(example = 100001)]
    pub doc_no: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MarkFailedDto {
    #[validate(length(min = 1, max = 500, message = "message must be between 1 and 500 characters"))]
    #[schema(example = "Printer jammed")]
    pub message: String,
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponseDto {
    pub id: i64,
    pub filename: String,
    pub filesize: i64,
    pub filetype: String,
    /// Estimated page count of this file
    pub pages: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponseDto {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            filename: a.filename,
            filesize: a.filesize,
            filetype: a.filetype,
            pages: a.pages,
            created_at: a.created_at,
        }
    }
}

/// Print job as seen by clients. The OTP is never part of it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrintJobResponseDto {
    pub id: i64,
    pub job_uuid: Uuid,
    pub doc_no: i64,
    pub shop_id: Option<i64>,
    /// Terminal that printed the job, once known
    pub printer: Option<String>,
    pub status: PrintJobStatus,
    pub total_copies: i32,
    pub is_color: bool,
    pub is_double_sided: bool,
    pub is_portrait: bool,
    pub total_pages: Option<i32>,
    #[schema(value_type = Option<String>, example = "60")]
    pub total_cost: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentResponseDto>>,
}

impl From<PrintJob> for PrintJobResponseDto {
    fn from(job: PrintJob) -> Self {
        Self {
            id: job.id,
            job_uuid: job.job_uuid,
            doc_no: job.doc_no,
            shop_id: job.shop_id,
            printer: job.printer,
            status: job.status,
            total_copies: job.total_copies,
            is_color: job.is_color,
            is_double_sided: job.is_double_sided,
            is_portrait: job.is_portrait,
            total_pages: job.total_pages,
            total_cost: job.total_cost,
            payment_method: job.payment_method,
            payment_reference: job.payment_reference,
            otp_expires_at: job.otp_expires_at,
            submitted_at: job.submitted_at,
            completed_at: job.completed_at,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
            attachments: None,
        }
    }
}

impl PrintJobResponseDto {
    pub fn with_attachments(job: PrintJob, attachments: Vec<Attachment>) -> Self {
        let mut dto = Self::from(job);
        dto.attachments = Some(attachments.into_iter().map(Into::into).collect());
        dto
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponseDto {
    /// Code to present at the shop terminal
    #[schema(example = "4821")]
    pub otp: String,
    pub print_job: PrintJobResponseDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReleasedFileDto {
    pub filename: String,
    /// URL the terminal downloads the file from
    pub filepath: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpResponseDto {
    pub print_job_uuid: Uuid,
    pub shop_id: Option<i64>,
    pub files: Vec<ReleasedFileDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RemovedResponseDto {
    pub job_uuid: Uuid,
    pub doc_no: i64,
    pub removed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: None,
            data: vec![0u8; size],
        }
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Report.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_valid_upload() {
        let request = CreatePrintJob::new(vec![file("a.pdf", 1024), file("b.JPG", 10)], 2);
        assert!(validate_upload(&request).is_ok());
    }

    #[test]
    fn test_zero_files_rejected() {
        let errors = validate_upload(&CreatePrintJob::new(vec![], 1)).unwrap_err();
        assert_eq!(errors, vec!["at least one file is required".to_string()]);
    }

    #[test]
    fn test_missing_files_and_bad_copies_both_reported() {
        let errors = validate_upload(&CreatePrintJob::new(vec![], MAX_COPIES + 1)).unwrap_err();
        assert_eq!(
            errors,
            vec![
                "at least one file is required".to_string(),
                "copies must be between 1 and 100".to_string(),
            ]
        );
    }

    #[test]
    fn test_oversized_file_rejected() {
        let request = CreatePrintJob::new(vec![file("big.pdf", MAX_FILE_SIZE + 1)], 1);
        let errors = validate_upload(&request).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("big.pdf: file too large"));
    }

    #[test]
    fn test_file_at_limit_accepted() {
        let request = CreatePrintJob::new(vec![file("edge.pdf", MAX_FILE_SIZE)], 1);
        assert!(validate_upload(&request).is_ok());
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let request = CreatePrintJob::new(vec![file("virus.exe", 10), file("notes", 10)], 1);
        let errors = validate_upload(&request).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("unsupported file type"));
    }

    #[test]
    fn test_copies_range() {
        let too_few = CreatePrintJob::new(vec![file("a.pdf", 1)], 0);
        let too_many = CreatePrintJob::new(vec![file("a.pdf", 1)], MAX_COPIES + 1);
        assert!(validate_upload(&too_few).is_err());
        assert!(validate_upload(&too_many).is_err());
        assert!(validate_upload(&CreatePrintJob::new(vec![file("a.pdf", 1)], MAX_COPIES)).is_ok());
    }

    #[test]
    fn test_verify_otp_dto_format() {
        let ok = VerifyOtpDto {
            print_job_uuid: Uuid::new_v4(),
            otp: "0042".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = VerifyOtpDto {
            print_job_uuid: Uuid::new_v4(),
            otp: "42".to_string(),
        };
        assert!(bad.validate().is_err());
    }
}
