use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::print_jobs::handlers;
use crate::features::print_jobs::services::PrintJobService;

/// Kiosk routes, open to guests
///
/// `max_upload_body_size` caps the whole multipart body. Per-file limits are
/// enforced by upload validation.
pub fn public_routes(service: Arc<PrintJobService>, max_upload_body_size: usize) -> Router {
    Router::new()
        .route(
            "/print/upload",
            post(handlers::upload_print_job).layer(DefaultBodyLimit::max(max_upload_body_size)),
        )
        // Guests pay and cancel their own jobs at the kiosk, so these stay open
        .route("/print/pay", post(handlers::pay_print_job))
        .route("/print/verify-otp", post(handlers::verify_print_job_otp))
        .route("/delete-print-job", post(handlers::delete_print_job))
        .with_state(service)
}

/// Shop terminal routes
///
/// Note: This requires authentication, staff role is checked per handler
pub fn staff_routes(service: Arc<PrintJobService>) -> Router {
    Router::new()
        .route("/print-jobs/{job_uuid}", get(handlers::get_print_job))
        .route(
            "/print-jobs/{job_uuid}/delete-files",
            post(handlers::delete_print_job_files),
        )
        .route("/print-jobs/{job_uuid}/fail", post(handlers::fail_print_job))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::shared::test_helpers::{with_staff_auth, TestContext, TEST_PUBLIC_URL};

    const BODY_LIMIT: usize = 1024 * 1024;

    fn server(ctx: &TestContext, body_limit: usize) -> TestServer {
        let app = Router::new()
            .merge(public_routes(ctx.service.clone(), body_limit))
            .merge(with_staff_auth(staff_routes(ctx.service.clone())));
        TestServer::new(app).unwrap()
    }

    fn upload_form() -> MultipartForm {
        MultipartForm::new()
            .add_text("copies", "2")
            .add_text("is_color", "0")
            .add_text("is_double_sided", "false")
            .add_part(
                "files",
                Part::bytes(vec![7u8; 150 * 1024])
                    .file_name("thesis.pdf")
                    .mime_type("application/pdf"),
            )
    }

    async fn upload(server: &TestServer) -> Value {
        let response = server.post("/print/upload").multipart(upload_form()).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["data"].clone()
    }

    #[tokio::test]
    async fn test_kiosk_flow_over_http() {
        let ctx = TestContext::new();
        let server = server(&ctx, BODY_LIMIT);

        let job = upload(&server).await;
        assert_eq!(job["status"], "pending");
        assert_eq!(job["total_pages"], 2);
        assert!(job.get("otp").is_none());
        assert_eq!(job["attachments"].as_array().unwrap().len(), 1);

        let paid = server
            .post("/print/pay")
            .json(&json!({ "print_job_id": job["id"], "payment_method": "cash" }))
            .await;
        paid.assert_status_ok();
        let paid = paid.json::<Value>();
        let otp = paid["data"]["otp"].as_str().unwrap().to_string();
        assert_eq!(otp.len(), 4);
        assert_eq!(paid["data"]["print_job"]["status"], "paid");

        let wrong = if otp == "0000" { "1111" } else { "0000" };
        server
            .post("/print/verify-otp")
            .json(&json!({ "print_job_uuid": job["job_uuid"], "otp": wrong }))
            .expect_failure()
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let released = server
            .post("/print/verify-otp")
            .json(&json!({ "print_job_uuid": job["job_uuid"], "otp": otp }))
            .await;
        released.assert_status_ok();
        let files = released.json::<Value>()["data"]["files"].clone();
        assert_eq!(files.as_array().unwrap().len(), 1);
        assert_eq!(files[0]["filename"], "thesis.pdf");
        assert!(files[0]["filepath"]
            .as_str()
            .unwrap()
            .starts_with(&format!("{}/storage/print-jobs/", TEST_PUBLIC_URL)));

        // Single use
        server
            .post("/print/verify-otp")
            .json(&json!({ "print_job_uuid": job["job_uuid"], "otp": otp }))
            .expect_failure()
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/delete-print-job")
            .json(&json!({ "doc_no": job["doc_no"] }))
            .await
            .assert_status_ok();
        assert_eq!(ctx.stored_job_dirs(), 0);

        server
            .post("/delete-print-job")
            .json(&json!({ "doc_no": job["doc_no"] }))
            .expect_failure()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_without_files_is_rejected() {
        let ctx = TestContext::new();
        let server = server(&ctx, BODY_LIMIT);

        let form = MultipartForm::new()
            .add_text("copies", "1")
            .add_text("is_color", "1")
            .add_text("is_double_sided", "1");
        let response = server
            .post("/print/upload")
            .multipart(form)
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["errors"][0],
            "at least one file is required"
        );
        assert_eq!(ctx.repository.job_count().await, 0);
    }

    #[tokio::test]
    async fn test_upload_over_body_limit() {
        let ctx = TestContext::new();
        let server = server(&ctx, 1024);

        server
            .post("/print/upload")
            .multipart(upload_form())
            .expect_failure()
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ctx.stored_job_dirs(), 0);
    }

    #[tokio::test]
    async fn test_unknown_payment_method() {
        let ctx = TestContext::new();
        let server = server(&ctx, BODY_LIMIT);
        let job = upload(&server).await;

        server
            .post("/print/pay")
            .json(&json!({ "print_job_id": job["id"], "payment_method": "bitcoin" }))
            .expect_failure()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_staff_can_inspect_and_fail_job() {
        let ctx = TestContext::new();
        let server = server(&ctx, BODY_LIMIT);
        let job = upload(&server).await;
        let uuid = job["job_uuid"].as_str().unwrap();

        let fetched = server.get(&format!("/print-jobs/{}", uuid)).await;
        fetched.assert_status_ok();
        let fetched = fetched.json::<Value>();
        assert_eq!(fetched["data"]["attachments"][0]["filename"], "thesis.pdf");

        let failed = server
            .post(&format!("/print-jobs/{}/fail", uuid))
            .json(&json!({ "message": "Printer jammed" }))
            .await;
        failed.assert_status_ok();
        let failed = failed.json::<Value>();
        assert_eq!(failed["data"]["status"], "failed");
        assert_eq!(failed["data"]["error_message"], "Printer jammed");
    }

    #[tokio::test]
    async fn test_staff_routes_require_user() {
        let ctx = TestContext::new();
        let server = TestServer::new(staff_routes(ctx.service.clone())).unwrap();

        server
            .get(&format!("/print-jobs/{}", uuid::Uuid::new_v4()))
            .expect_failure()
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
