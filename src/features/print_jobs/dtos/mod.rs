mod print_job_dto;

pub use print_job_dto::*;
