use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::dashboard::dtos::DashboardSummaryDto;
use crate::modules::repository::Repository;
use crate::shared::time::start_of_utc_day;

/// Service for admin dashboard queries
pub struct DashboardService {
    repository: Arc<dyn Repository>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub async fn get_summary(&self) -> Result<DashboardSummaryDto> {
        self.summary_at(Utc::now()).await
    }

    pub async fn summary_at(&self, now: DateTime<Utc>) -> Result<DashboardSummaryDto> {
        let overall_shops_count = self.repository.count_shops().await?;
        let today_prints_count = self
            .repository
            .count_jobs_created_since(start_of_utc_day(now), None)
            .await?;

        Ok(DashboardSummaryDto {
            overall_shops_count,
            today_prints_count,
        })
    }
}
