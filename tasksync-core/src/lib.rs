pub mod errors;
pub mod models;
pub mod protocol;

pub use errors::*;
pub use models::*;
pub use protocol::*;

pub type SyncResult<T> = Result<T, SyncError>;
