pub mod cdp_page;
pub mod host_page;
pub mod js_executor;

pub use cdp_page::CdpPage;
pub use host_page::{HostPage, MouseEventKind};
pub use js_executor::JsExecutor;
