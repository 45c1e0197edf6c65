//! Gateway error responses
//!
//! Non-2xx responses carry a JSON body of the form:
//!
//! ```json
//! {
//!   "requestId": "11728-2929992-1",
//!   "errorCode": "404.001.03",
//!   "errorMessage": "Invalid Access Token"
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error body returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{error_code}: {error_message}")]
pub struct DarajaApiError {
    /// Request ID for tracing with gateway support
    #[serde(default)]
    pub request_id: Option<String>,
    /// Gateway error code, e.g. `404.001.03`
    pub error_code: String,
    /// Developer-facing error description
    pub error_message: String,
}
