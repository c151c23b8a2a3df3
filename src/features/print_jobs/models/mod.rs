mod attachment;
mod print_job;

pub use attachment::{Attachment, NewAttachment};
pub use print_job::{NewPrintJob, PrintJob, PrintJobStatus};
