use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use tempfile::TempDir;

use crate::core::config::{OtpConfig, PricingConfig};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::print_jobs::models::{PrintJob, PrintJobStatus};
use crate::features::print_jobs::services::{MockPaymentProvider, PrintJobService};
use crate::modules::repository::memory::MemoryRepository;
use crate::modules::storage::{FileStore, LocalFileStore, StorageError};
use crate::shared::constants::ROLE_SHOP;

pub const TEST_PUBLIC_URL: &str = "http://kiosk.test";

pub fn create_staff_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "test-shop-operator".to_string(),
        roles: vec![ROLE_SHOP.to_string()],
    }
}

async fn inject_staff_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_staff_user());
    next.run(request).await
}

/// Wrap a router so every request arrives as an authenticated shop operator
pub fn with_staff_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_staff_middleware))
}

/// Pending job that was never stored, for provider tests
pub fn sample_print_job(total_cost: Option<Decimal>) -> PrintJob {
    let now = Utc::now();
    PrintJob {
        id: 1,
        job_uuid: uuid::Uuid::new_v4(),
        doc_no: 100_001,
        shop_id: None,
        user_id: None,
        printer: None,
        error_message: None,
        status: PrintJobStatus::Pending,
        total_copies: 1,
        is_color: false,
        is_double_sided: false,
        is_portrait: true,
        total_pages: Some(1),
        total_cost,
        payment_method: None,
        payment_reference: None,
        otp: Some("4821".to_string()),
        otp_expires_at: Some(now),
        submitted_at: None,
        completed_at: None,
        removed_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Local store that can be told to fail, for compensation tests
pub struct FailingFileStore {
    inner: LocalFileStore,
    /// Number of successful puts before every further put fails
    puts_before_failure: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_urls: AtomicBool,
}

impl FailingFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            inner: LocalFileStore::new(root, TEST_PUBLIC_URL),
            puts_before_failure: AtomicUsize::new(0),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_urls: AtomicBool::new(false),
        }
    }

    pub fn fail_puts_after(&self, successful_puts: usize) {
        self.puts_before_failure
            .store(successful_puts, Ordering::SeqCst);
        self.fail_puts.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_urls(&self, fail: bool) {
        self.fail_urls.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileStore for FailingFileStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            let remaining = self.puts_before_failure.load(Ordering::SeqCst);
            if remaining == 0 {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    message: "disk full".to_string(),
                });
            }
            self.puts_before_failure
                .store(remaining - 1, Ordering::SeqCst);
        }
        self.inner.put(key, data, content_type).await
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.read(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }

    async fn delete_directory(&self, prefix: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete {
                key: prefix.to_string(),
                message: "permission denied".to_string(),
            });
        }
        self.inner.delete_directory(prefix).await
    }

    async fn file_url(&self, key: &str) -> Result<String, StorageError> {
        if self.fail_urls.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("signing failed".to_string()));
        }
        self.inner.file_url(key).await
    }
}

/// Everything a lifecycle test needs, backed by memory and a temp directory
pub struct TestContext {
    pub repository: Arc<MemoryRepository>,
    pub store: Arc<FailingFileStore>,
    pub service: Arc<PrintJobService>,
    pub storage_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_pricing(PricingConfig::default())
    }

    pub fn with_pricing(pricing: PricingConfig) -> Self {
        let storage_dir = tempfile::tempdir().expect("temp dir");
        let repository = Arc::new(MemoryRepository::new());
        let store = Arc::new(FailingFileStore::new(storage_dir.path()));
        let service = Arc::new(PrintJobService::new(
            repository.clone(),
            store.clone(),
            Arc::new(MockPaymentProvider),
            pricing,
            &OtpConfig::default(),
        ));

        Self {
            repository,
            store,
            service,
            storage_dir,
        }
    }

    /// Whether anything is left below the print job root
    pub fn stored_job_dirs(&self) -> usize {
        let root = self.storage_dir.path().join("print-jobs");
        match std::fs::read_dir(root) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}
