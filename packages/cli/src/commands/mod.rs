pub mod check;
pub mod init;
pub mod plan_upload;

pub use check::{check, CheckArgs};
pub use init::{init, InitArgs};
pub use plan_upload::{plan_upload, PlanUploadArgs};
