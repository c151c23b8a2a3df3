use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::shops::handlers;
use crate::features::shops::services::ShopService;

/// QR landing routes, open to guests
pub fn public_routes(service: Arc<ShopService>) -> Router {
    Router::new()
        .route("/print", get(handlers::get_print_page))
        .route("/print/{shop_uuid}", get(handlers::get_shop_print_page))
        .with_state(service)
}

/// Note: This requires authentication
pub fn staff_routes(service: Arc<ShopService>) -> Router {
    Router::new()
        .route("/shops/{shop_uuid}", get(handlers::get_shop))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::modules::repository::memory::MemoryRepository;
    use crate::shared::test_helpers::{with_staff_auth, TEST_PUBLIC_URL};

    #[tokio::test]
    async fn test_print_page_and_shop_details() {
        let repository = Arc::new(MemoryRepository::new());
        let shop = repository.add_shop("Corner Copy").await;
        let service = Arc::new(ShopService::new(repository.clone(), TEST_PUBLIC_URL));

        let app = Router::new()
            .merge(public_routes(service.clone()))
            .merge(with_staff_auth(staff_routes(service)));
        let server = TestServer::new(app).unwrap();

        let page = server.get(&format!("/print/{}", shop.uuid)).await;
        page.assert_status_ok();
        assert_eq!(page.json::<Value>()["data"]["shop"]["name"], "Corner Copy");

        let unknown = server.get("/print/not-a-shop").await;
        unknown.assert_status_ok();
        assert!(unknown.json::<Value>()["data"]["shop"].is_null());

        let details = server.get(&format!("/shops/{}", shop.uuid)).await;
        details.assert_status_ok();
        assert_eq!(
            details.json::<Value>()["data"]["qr_code_url"],
            format!("{}/print/{}", TEST_PUBLIC_URL, shop.uuid)
        );

        server
            .get(&format!("/shops/{}", uuid::Uuid::new_v4()))
            .expect_failure()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
