pub mod pii;
pub mod forms;
pub mod upload;
pub mod models;

pub use forms::FieldErrors;
pub use pii::Masked;
pub use upload::{UploadError, UploadKind};
