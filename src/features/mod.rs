pub mod auth;
pub mod dashboard;
pub mod print_jobs;
pub mod shops;
