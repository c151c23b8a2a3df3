pub mod otp;
pub mod payment;
pub mod pricing;
mod print_job_service;

pub use payment::{MockPaymentProvider, PaymentMethod};
pub use print_job_service::PrintJobService;
