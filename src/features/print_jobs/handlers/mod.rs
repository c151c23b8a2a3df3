mod print_job_handler;
mod staff_handler;

pub use print_job_handler::{
    __path_delete_print_job, __path_pay_print_job, __path_upload_print_job,
    __path_verify_print_job_otp, delete_print_job, pay_print_job, upload_print_job,
    verify_print_job_otp,
};
pub use staff_handler::{
    __path_delete_print_job_files, __path_fail_print_job, __path_get_print_job,
    delete_print_job_files, fail_print_job, get_print_job,
};
