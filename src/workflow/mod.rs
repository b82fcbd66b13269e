pub mod file_ctx;
pub mod file_flow;
pub mod state;

pub use file_ctx::{BatchCtx, FileCtx};
pub use file_flow::{DownloadOutcome, FileFlow, FileResult};
pub use state::{FlagGuard, ProcessingState};
