//! Authenticated request layer.

mod client;
mod error;
mod form;

pub use client::{ApiClient, ApiRequest, REFRESH_PATH, RequestBody, USER_AGENT};
pub use error::{NETWORK_ERROR_MESSAGE, RequestError, RequestErrorKind};
pub use form::{UploadFile, mime_type_for_path};

/// Result type for API calls.
pub type RequestResult<T> = std::result::Result<T, RequestError>;
