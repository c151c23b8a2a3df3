use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequireStaff;
use crate::features::print_jobs::dtos::{MarkFailedDto, PrintJobResponseDto, RemovedResponseDto};
use crate::features::print_jobs::services::PrintJobService;
use crate::shared::types::ApiResponse;
use crate::shared::validation::validation_messages;

/// Get a print job with its attachments
#[utoipa::path(
    get,
    path = "/print-jobs/{job_uuid}",
    tag = "print-jobs",
    params(
        ("job_uuid" = Uuid, Path, description = "Print job UUID")
    ),
    responses(
        (status = 200, description = "Print job", body = ApiResponse<PrintJobResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Print job not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_print_job(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<PrintJobService>>,
    Path(job_uuid): Path<Uuid>,
) -> Result<Json<ApiResponse<PrintJobResponseDto>>, AppError> {
    let job = service.get_by_uuid(job_uuid).await?;
    Ok(Json(ApiResponse::success(Some(job), None, None)))
}

/// Remove a print job and purge its files
#[utoipa::path(
    post,
    path = "/print-jobs/{job_uuid}/delete-files",
    tag = "print-jobs",
    params(
        ("job_uuid" = Uuid, Path, description = "Print job UUID")
    ),
    responses(
        (status = 200, description = "Files deleted", body = ApiResponse<RemovedResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Print job not found or already removed"),
        (status = 500, description = "Files could not be purged")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_print_job_files(
    RequireStaff(user): RequireStaff,
    State(service): State<Arc<PrintJobService>>,
    Path(job_uuid): Path<Uuid>,
) -> Result<Json<ApiResponse<RemovedResponseDto>>, AppError> {
    let removed = service.remove_files(job_uuid).await?;
    info!("Files of print job {} deleted by {}", job_uuid, user.sub);

    Ok(Json(ApiResponse::success(
        Some(removed),
        Some("Files deleted successfully".to_string()),
        None,
    )))
}

/// Mark a print job as failed
#[utoipa::path(
    post,
    path = "/print-jobs/{job_uuid}/fail",
    tag = "print-jobs",
    params(
        ("job_uuid" = Uuid, Path, description = "Print job UUID")
    ),
    request_body = MarkFailedDto,
    responses(
        (status = 200, description = "Print job marked as failed", body = ApiResponse<PrintJobResponseDto>),
        (status = 400, description = "Job already failed"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Print job not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn fail_print_job(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<PrintJobService>>,
    Path(job_uuid): Path<Uuid>,
    AppJson(dto): AppJson<MarkFailedDto>,
) -> Result<Json<ApiResponse<PrintJobResponseDto>>, AppError> {
    dto.validate()
        .map_err(|e| AppError::Validation(validation_messages(&e)))?;

    let job = service.mark_failed(job_uuid, &dto.message).await?;

    Ok(Json(ApiResponse::success(Some(job), None, None)))
}
