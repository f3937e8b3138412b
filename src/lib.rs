// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Millisecond durations fit in u64
    clippy::cast_precision_loss,      // Jitter math on durations
    clippy::cast_sign_loss,           // Jittered delays are never negative
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. MappingError in mapper module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod domain;
pub mod mapper;
pub mod reliability;
pub mod sender;

pub use app::{App, Client, Config, PublishReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
