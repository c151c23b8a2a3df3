use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::model::AuthenticatedUser;
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::print_jobs::{
    dtos as print_jobs_dtos, handlers as print_jobs_handlers, models as print_jobs_models,
    services::PaymentMethod,
};
use crate::features::shops::{dtos as shops_dtos, handlers as shops_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Kiosk
        shops_handlers::get_print_page,
        shops_handlers::get_shop_print_page,
        print_jobs_handlers::upload_print_job,
        print_jobs_handlers::pay_print_job,
        print_jobs_handlers::verify_print_job_otp,
        print_jobs_handlers::delete_print_job,
        // Shop terminal
        print_jobs_handlers::get_print_job,
        print_jobs_handlers::delete_print_job_files,
        print_jobs_handlers::fail_print_job,
        shops_handlers::get_shop,
        dashboard_handlers::get_summary,
    ),
    components(
        schemas(
            Meta,
            AuthenticatedUser,
            // Print jobs
            print_jobs_models::PrintJobStatus,
            PaymentMethod,
            print_jobs_dtos::UploadPrintJobFormDto,
            print_jobs_dtos::PaymentDto,
            print_jobs_dtos::VerifyOtpDto,
            print_jobs_dtos::DeleteByDocNoDto,
            print_jobs_dtos::MarkFailedDto,
            print_jobs_dtos::AttachmentResponseDto,
            print_jobs_dtos::PrintJobResponseDto,
            print_jobs_dtos::PaymentResponseDto,
            print_jobs_dtos::ReleasedFileDto,
            print_jobs_dtos::VerifyOtpResponseDto,
            print_jobs_dtos::RemovedResponseDto,
            ApiResponse<print_jobs_dtos::PrintJobResponseDto>,
            ApiResponse<print_jobs_dtos::PaymentResponseDto>,
            ApiResponse<print_jobs_dtos::VerifyOtpResponseDto>,
            ApiResponse<print_jobs_dtos::RemovedResponseDto>,
            // Shops
            shops_dtos::ShopSummaryDto,
            shops_dtos::PrintPageDto,
            shops_dtos::ShopResponseDto,
            ApiResponse<shops_dtos::PrintPageDto>,
            ApiResponse<shops_dtos::ShopResponseDto>,
            // Dashboard
            dashboard_dtos::DashboardSummaryDto,
            ApiResponse<dashboard_dtos::DashboardSummaryDto>,
        )
    ),
    tags(
        (name = "print", description = "Kiosk upload, payment and OTP release (guests welcome)"),
        (name = "print-jobs", description = "Print job handling at the shop terminal (staff only)"),
        (name = "shops", description = "Shop details and QR codes (staff only)"),
        (name = "Dashboard", description = "Operator dashboard (staff only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Printdesk API",
        version = "0.1.0",
        description = "API documentation for the Printdesk kiosk",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Overrides the generated info block with configured values
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
