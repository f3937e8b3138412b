//! Everything that talks to the logsight service: the authenticated
//! transport, application resolution and log submission.

pub mod application;
pub mod cache;
pub mod error;
pub mod log_api;
pub mod route;
pub mod serialization;
pub mod transmission;
pub mod transport;

pub use application::{ApplicationApi, HttpApplicationApi};
pub use cache::{ApplicationCache, CachedApplicationApi};
pub use error::{ApiError, SendError};
pub use log_api::{LogApi, LogBatchRequest, LogReceipt};
pub use route::ApiRoute;
pub use serialization::{BodyEncoder, EncodedBody, SerializationError};
pub use transmission::{LogSender, MissingApplicationPolicy};
pub use transport::{
    ApiResponse, AuthSession, AuthTransport, ConnectionStats, Credentials, TransportConfig,
    UserInfo,
};
