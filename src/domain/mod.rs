//! Domain layer for logsight-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `Event`: opaque input record with dotted-path lookup
//! - `Log` / `LogBatch`: validated records and their per-(application, tag) groups
//! - `Application`: remote namespace a batch is filed under
//! - `ValidationError`: level/timestamp grammar violations

pub mod application;
pub mod error;
pub mod event;
pub mod log;

pub use application::{Application, DEFAULT_APPLICATION_NAME, escape_application_name};
pub use error::ValidationError;
pub use event::{Event, EventError, TIMESTAMP_FIELD};
pub use log::{ALLOWED_LEVELS, Log, LogBatch, validate_level, validate_timestamp};
