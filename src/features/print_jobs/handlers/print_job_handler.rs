use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::print_jobs::dtos::{
    CreatePrintJob, DeleteByDocNoDto, PaymentDto, PaymentResponseDto, PrintJobResponseDto,
    RemovedResponseDto, UploadPrintJobFormDto, UploadedFile, VerifyOtpDto, VerifyOtpResponseDto,
};
use crate::features::print_jobs::services::PrintJobService;
use crate::shared::types::ApiResponse;
use crate::shared::validation::validation_messages;

/// Form values as sent by the browser, before type checks
#[derive(Default)]
struct UploadForm {
    files: Vec<UploadedFile>,
    shop_uuid: Option<String>,
    copies: Option<String>,
    is_color: Option<String>,
    is_double_sided: Option<String>,
    is_portrait: Option<String>,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn required_bool(value: Option<&str>, name: &str, errors: &mut Vec<String>) -> bool {
    match value.map(parse_bool) {
        Some(Some(flag)) => flag,
        Some(None) => {
            errors.push(format!("{} must be a boolean", name));
            false
        }
        None => {
            errors.push(format!("{} is required", name));
            false
        }
    }
}

impl UploadForm {
    /// Type-check the raw form. Range and file checks happen in the service.
    fn into_request(self, user_id: Option<String>) -> Result<CreatePrintJob, AppError> {
        let mut errors = Vec::new();

        let copies = match self.copies.as_deref().map(str::trim) {
            Some(raw) => raw.parse::<i32>().unwrap_or_else(|_| {
                errors.push("copies must be an integer".to_string());
                0
            }),
            None => {
                errors.push("copies is required".to_string());
                0
            }
        };

        let is_color = required_bool(self.is_color.as_deref(), "is_color", &mut errors);
        let is_double_sided =
            required_bool(self.is_double_sided.as_deref(), "is_double_sided", &mut errors);
        let is_portrait = match self.is_portrait.as_deref().map(parse_bool) {
            None => true,
            Some(Some(flag)) => flag,
            Some(None) => {
                errors.push("is_portrait must be a boolean".to_string());
                true
            }
        };

        let shop_uuid = match self.shop_uuid.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match Uuid::parse_str(raw) {
                Ok(uuid) => Some(uuid),
                Err(_) => {
                    errors.push("shop_uuid must be a valid UUID".to_string());
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(CreatePrintJob {
            files: self.files,
            shop_uuid,
            copies,
            is_color,
            is_double_sided,
            is_portrait,
            user_id,
        })
    }
}

/// Body limit hits surface as 413, everything else as a bad request
fn multipart_error(e: MultipartError, what: &str) -> AppError {
    debug!("Failed to read {}: {}", what, e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read {}: {}", what, e.body_text()))
    }
}

async fn field_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| multipart_error(e, &format!("{} field", name)))
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "multipart data"))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "files" | "files[]" => {
                let content_type = field.content_type().map(|s| s.to_string());
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "file data"))?;

                form.files.push(UploadedFile {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "shop_uuid" => form.shop_uuid = Some(field_text(field, "shop_uuid").await?),
            "copies" => form.copies = Some(field_text(field, "copies").await?),
            "is_color" => form.is_color = Some(field_text(field, "is_color").await?),
            "is_double_sided" => {
                form.is_double_sided = Some(field_text(field, "is_double_sided").await?)
            }
            "is_portrait" => form.is_portrait = Some(field_text(field, "is_portrait").await?),
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    Ok(form)
}

/// Upload documents and create a print job
///
/// The job is priced immediately. Its OTP is only revealed after payment.
#[utoipa::path(
    post,
    path = "/print/upload",
    tag = "print",
    request_body(
        content = UploadPrintJobFormDto,
        content_type = "multipart/form-data",
        description = "Documents plus print options",
    ),
    responses(
        (status = 201, description = "Print job created", body = ApiResponse<PrintJobResponseDto>),
        (status = 400, description = "Invalid files or options"),
        (status = 401, description = "Invalid bearer token"),
        (status = 413, description = "Upload too large"),
        (status = 500, description = "Files could not be stored")
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn upload_print_job(
    user: Option<AuthenticatedUser>,
    State(service): State<Arc<PrintJobService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<PrintJobResponseDto>>), AppError> {
    let form = read_upload_form(multipart).await?;
    let request = form.into_request(user.map(|u| u.sub))?;

    let job = service.create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(job),
            Some("Print job created".to_string()),
            None,
        )),
    ))
}

/// Pay for a print job (mock provider)
#[utoipa::path(
    post,
    path = "/print/pay",
    tag = "print",
    request_body = PaymentDto,
    responses(
        (status = 200, description = "Payment successful, OTP issued", body = ApiResponse<PaymentResponseDto>),
        (status = 400, description = "Job is not awaiting payment"),
        (status = 402, description = "Payment declined"),
        (status = 404, description = "Print job not found"),
        (status = 409, description = "Job changed concurrently")
    )
)]
pub async fn pay_print_job(
    State(service): State<Arc<PrintJobService>>,
    AppJson(dto): AppJson<PaymentDto>,
) -> Result<Json<ApiResponse<PaymentResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(validation_messages(&e)))?;

    let response = service.pay(dto.print_job_id, dto.payment_method).await?;

    Ok(Json(ApiResponse::success(
        Some(response),
        Some("Payment successful!".to_string()),
        None,
    )))
}

/// Verify a print job's OTP and release its files
#[utoipa::path(
    post,
    path = "/print/verify-otp",
    tag = "print",
    request_body = VerifyOtpDto,
    responses(
        (status = 200, description = "OTP accepted, files released", body = ApiResponse<VerifyOtpResponseDto>),
        (status = 400, description = "OTP expired, wrong or already used"),
        (status = 404, description = "Print job not found"),
        (status = 409, description = "Job changed concurrently")
    )
)]
pub async fn verify_print_job_otp(
    State(service): State<Arc<PrintJobService>>,
    AppJson(dto): AppJson<VerifyOtpDto>,
) -> Result<Json<ApiResponse<VerifyOtpResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(validation_messages(&e)))?;

    let response = service.verify_otp(dto.print_job_uuid, &dto.otp).await?;

    Ok(Json(ApiResponse::success(
        Some(response),
        Some("OTP verified".to_string()),
        None,
    )))
}

/// Delete a print job by its document number and purge its files
#[utoipa::path(
    post,
    path = "/delete-print-job",
    tag = "print",
    request_body = DeleteByDocNoDto,
    responses(
        (status = 200, description = "Print job removed", body = ApiResponse<RemovedResponseDto>),
        (status = 404, description = "Print job not found or already removed"),
        (status = 500, description = "Files could not be purged")
    )
)]
pub async fn delete_print_job(
    State(service): State<Arc<PrintJobService>>,
    AppJson(dto): AppJson<DeleteByDocNoDto>,
) -> Result<Json<ApiResponse<RemovedResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(validation_messages(&e)))?;

    let removed = service.delete_by_doc_no(dto.doc_no).await?;

    Ok(Json(ApiResponse::success(
        Some(removed),
        Some("Print job deleted successfully".to_string()),
        None,
    )))
}
