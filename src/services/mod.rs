pub mod clock;
pub mod failure_writer;
pub mod license;
pub mod notifier;
pub mod operator;
pub mod store;
pub mod verifier;
pub mod wait;

pub use clock::{Clock, SystemClock};
pub use failure_writer::FailureWriter;
pub use license::{LicenseGuard, LicenseRecord, LicenseState, Session, UsageReport};
pub use notifier::{LogNotifier, Notice, Notifier};
pub use operator::{ConsoleOperator, InputKind, Operator};
pub use store::{JsonFileStore, KvStore, MemoryStore};
pub use verifier::{CredentialVerifier, HmacVerifier};
