use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::shops::dtos::{PrintPageDto, ShopResponseDto};
use crate::modules::repository::Repository;
use crate::shared::time::start_of_utc_day;

pub struct ShopService {
    repository: Arc<dyn Repository>,
    public_url: String,
}

impl ShopService {
    pub fn new(repository: Arc<dyn Repository>, public_url: &str) -> Self {
        Self {
            repository,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// URL a shop's QR code points to
    pub fn qr_code_url(&self, shop_uuid: Uuid) -> String {
        format!("{}/print/{}", self.public_url, shop_uuid)
    }

    /// Upload page context. Unknown or malformed shop UUIDs give `shop: null`.
    pub async fn get_print_page(&self, shop_uuid: Option<&str>) -> Result<PrintPageDto> {
        let shop = match shop_uuid.map(|raw| Uuid::parse_str(raw.trim())) {
            Some(Ok(uuid)) => self.repository.find_shop_by_uuid(uuid).await?,
            Some(Err(_)) | None => None,
        };

        Ok(PrintPageDto {
            shop: shop.map(Into::into),
            shop_uuid: shop_uuid.map(str::to_string),
        })
    }

    pub async fn get_shop(&self, shop_uuid: Uuid) -> Result<ShopResponseDto> {
        self.get_shop_at(shop_uuid, Utc::now()).await
    }

    pub async fn get_shop_at(&self, shop_uuid: Uuid, now: DateTime<Utc>) -> Result<ShopResponseDto> {
        let shop = self
            .repository
            .find_shop_by_uuid(shop_uuid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shop {} not found", shop_uuid)))?;

        let today_print_jobs_count = self
            .repository
            .count_jobs_created_since(start_of_utc_day(now), Some(shop.id))
            .await?;

        Ok(ShopResponseDto {
            id: shop.id,
            uuid: shop.uuid,
            qr_code_url: self.qr_code_url(shop.uuid),
            name: shop.name,
            user_id: shop.user_id,
            today_print_jobs_count,
            created_at: shop.created_at,
            updated_at: shop.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::print_jobs::dtos::{CreatePrintJob, UploadedFile};
    use crate::shared::test_helpers::{TestContext, TEST_PUBLIC_URL};

    fn pdf() -> UploadedFile {
        UploadedFile {
            filename: "a.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: vec![1; 10],
        }
    }

    #[tokio::test]
    async fn test_print_page_with_known_shop() {
        let ctx = TestContext::new();
        let shop = ctx.repository.add_shop("Library").await;
        let service = ShopService::new(ctx.repository.clone(), TEST_PUBLIC_URL);

        let raw = shop.uuid.to_string();
        let page = service.get_print_page(Some(&raw)).await.unwrap();
        assert_eq!(page.shop.unwrap().name, "Library");
        assert_eq!(page.shop_uuid, Some(raw));
    }

    #[tokio::test]
    async fn test_print_page_with_unknown_or_bad_shop() {
        let ctx = TestContext::new();
        let service = ShopService::new(ctx.repository.clone(), TEST_PUBLIC_URL);

        let unknown = Uuid::new_v4().to_string();
        let page = service.get_print_page(Some(&unknown)).await.unwrap();
        assert!(page.shop.is_none());
        assert_eq!(page.shop_uuid, Some(unknown));

        let page = service.get_print_page(Some("abc")).await.unwrap();
        assert!(page.shop.is_none());

        let page = service.get_print_page(None).await.unwrap();
        assert!(page.shop.is_none());
        assert!(page.shop_uuid.is_none());
    }

    #[tokio::test]
    async fn test_shop_counts_only_its_jobs_today() {
        let ctx = TestContext::new();
        let shop = ctx.repository.add_shop("Library").await;
        let other = ctx.repository.add_shop("Cafe").await;

        for target in [shop.uuid, shop.uuid, other.uuid] {
            let mut request = CreatePrintJob::new(vec![pdf()], 1);
            request.shop_uuid = Some(target);
            ctx.service.create(request).await.unwrap();
        }
        ctx.service
            .create(CreatePrintJob::new(vec![pdf()], 1))
            .await
            .unwrap();

        let service = ShopService::new(ctx.repository.clone(), "http://kiosk.test/");
        let details = service.get_shop(shop.uuid).await.unwrap();

        assert_eq!(details.today_print_jobs_count, 2);
        assert_eq!(
            details.qr_code_url,
            format!("http://kiosk.test/print/{}", shop.uuid)
        );

        let tomorrow = Utc::now() + chrono::Duration::days(1);
        let later = service.get_shop_at(shop.uuid, tomorrow).await.unwrap();
        assert_eq!(later.today_print_jobs_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_shop_is_not_found() {
        let ctx = TestContext::new();
        let service = ShopService::new(ctx.repository.clone(), TEST_PUBLIC_URL);
        let err = service.get_shop(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
