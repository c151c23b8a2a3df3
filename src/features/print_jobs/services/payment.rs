//! Payment collection for print jobs
//!
//! Only a mock provider exists; real gateways plug in behind [`PaymentProvider`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::print_jobs::models::PrintJob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Gpay,
    Card,
    Cash,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Gpay => write!(f, "gpay"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Cash => write!(f, "cash"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub method: PaymentMethod,
    pub reference: String,
    pub amount: Decimal,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Charge the job's total cost
    async fn charge(
        &self,
        job: &PrintJob,
        method: PaymentMethod,
    ) -> Result<PaymentReceipt, PaymentError>;
}

/// Accepts every priced charge without contacting anyone
#[derive(Debug, Default, Clone)]
pub struct MockPaymentProvider;

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn charge(
        &self,
        job: &PrintJob,
        method: PaymentMethod,
    ) -> Result<PaymentReceipt, PaymentError> {
        let amount = job
            .total_cost
            .ok_or_else(|| PaymentError::Declined("print job has no price".to_string()))?;
        let reference = format!("mock-{}", Uuid::new_v4());

        info!(
            "Mock payment of {} via {} accepted for print job {}",
            amount, method, job.job_uuid
        );

        Ok(PaymentReceipt {
            method,
            reference,
            amount,
        })
    }
}
