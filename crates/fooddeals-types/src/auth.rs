//! Authentication and account payloads.

use serde::{Deserialize, Serialize};

/// Response of `/register`, `/login` and `/auth/refresh`.
///
/// The server has shipped the token under several keys over time
/// (`"access token"`, `"access token:"`, `"access_token"`). They are read
/// as one optional field; the first present key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAuthResponse")]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Deserialize)]
struct RawAuthResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "access token")]
    spaced: Option<String>,
    #[serde(default, rename = "access token:")]
    spaced_colon: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl From<RawAuthResponse> for AuthResponse {
    fn from(raw: RawAuthResponse) -> Self {
        let access_token = raw
            .spaced
            .or(raw.spaced_colon)
            .or(raw.access_token)
            .filter(|token| !token.trim().is_empty());
        Self {
            status: raw.status,
            access_token,
        }
    }
}

/// Profile returned by `/myemail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
}

/// Generic `{status}` / `{detail}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StatusResponse {
    /// Human-readable acknowledgement text.
    pub fn message(&self) -> &str {
        self.status
            .as_deref()
            .or(self.detail.as_deref())
            .unwrap_or("ok")
    }
}
