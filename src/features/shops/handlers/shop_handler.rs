use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::auth::guards::RequireStaff;
use crate::features::shops::dtos::{PrintPageDto, ShopResponseDto};
use crate::features::shops::services::ShopService;
use crate::shared::types::ApiResponse;

/// Upload page context without a shop
#[utoipa::path(
    get,
    path = "/print",
    tag = "print",
    responses(
        (status = 200, description = "Upload page context", body = ApiResponse<PrintPageDto>)
    )
)]
pub async fn get_print_page(
    State(service): State<Arc<ShopService>>,
) -> Result<Json<ApiResponse<PrintPageDto>>, AppError> {
    let page = service.get_print_page(None).await?;
    Ok(Json(ApiResponse::success(Some(page), None, None)))
}

/// Upload page context for the shop in a scanned QR code
#[utoipa::path(
    get,
    path = "/print/{shop_uuid}",
    tag = "print",
    params(
        ("shop_uuid" = String, Path, description = "Shop UUID from the QR code")
    ),
    responses(
        (status = 200, description = "Upload page context, `shop` is null for unknown shops", body = ApiResponse<PrintPageDto>)
    )
)]
pub async fn get_shop_print_page(
    State(service): State<Arc<ShopService>>,
    Path(shop_uuid): Path<String>,
) -> Result<Json<ApiResponse<PrintPageDto>>, AppError> {
    let page = service.get_print_page(Some(&shop_uuid)).await?;
    Ok(Json(ApiResponse::success(Some(page), None, None)))
}

/// Get a shop with today's print count and QR target
#[utoipa::path(
    get,
    path = "/shops/{shop_uuid}",
    tag = "shops",
    params(
        ("shop_uuid" = Uuid, Path, description = "Shop UUID")
    ),
    responses(
        (status = 200, description = "Shop details", body = ApiResponse<ShopResponseDto>),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Staff access required"),
        (status = 404, description = "Shop not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_shop(
    RequireStaff(_user): RequireStaff,
    State(service): State<Arc<ShopService>>,
    Path(shop_uuid): Path<Uuid>,
) -> Result<Json<ApiResponse<ShopResponseDto>>, AppError> {
    let shop = service.get_shop(shop_uuid).await?;
    Ok(Json(ApiResponse::success(Some(shop), None, None)))
}
