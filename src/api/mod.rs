//! HTTP plumbing: the transport seam, the refreshing request client, and the
//! transport-level error type. Helpers here never log request bodies or
//! bearer tokens.

mod client;
mod errors;
mod transport;

pub use client::{ApiClient, RetryPolicy};
pub use errors::AppError;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, APP_USER_AGENT};
