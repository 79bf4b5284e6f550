//! Cookie jar for the HTTP-only refresh credential.
//!
//! The server sets the refresh token as a cookie scoped to
//! `/auth/refresh`. Persisting the jar lets a later process refresh the
//! session the way a browser tab would.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};

use super::storage::write_private_file;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCookie {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl StoredCookie {
    fn matches(&self, request_path: &str) -> bool {
        match self.path.as_deref() {
            None | Some("" | "/") => true,
            Some(prefix) => {
                request_path == prefix
                    || request_path.strip_prefix(prefix).is_some_and(|rest| {
                        prefix.ends_with('/') || rest.starts_with('/')
                    })
            }
        }
    }
}

/// Name → cookie map implementing reqwest's [`reqwest::cookie::CookieStore`].
///
/// Domain attributes are ignored: one jar talks to one API host.
#[derive(Debug, Default)]
pub struct CookieVault {
    cookies: RwLock<BTreeMap<String, StoredCookie>>,
    path: Option<PathBuf>,
}

impl CookieVault {
    /// A jar that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the jar persisted at `path`.
    ///
    /// A missing or unparseable file yields an empty jar; the next change
    /// rewrites it.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cookies = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cookies from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "ignoring unparseable cookie jar"
                );
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            cookies: RwLock::new(cookies),
            path: Some(path),
        })
    }

    /// Value of the cookie called `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|cookie| cookie.value.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Forgets every cookie.
    ///
    /// # Errors
    /// Returns an error if the persisted jar cannot be rewritten.
    pub fn clear(&self) -> Result<()> {
        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        cookies.clear();
        self.persist(&cookies)
    }

    /// Applies one `Set-Cookie` header value.
    fn apply(cookies: &mut BTreeMap<String, StoredCookie>, header: &str) {
        let mut parts = header.split(';').map(str::trim);
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let mut path = None;
        let mut expired = false;
        for attribute in parts {
            let (key, attr_value) = attribute.split_once('=').unwrap_or((attribute, ""));
            match key.trim().to_ascii_lowercase().as_str() {
                "path" => path = Some(attr_value.trim().to_string()),
                "max-age" => {
                    expired = attr_value.trim().parse::<i64>().is_ok_and(|secs| secs <= 0);
                }
                _ => {}
            }
        }

        let value = value.trim().trim_matches('"');
        if expired || value.is_empty() {
            cookies.remove(name);
        } else {
            cookies.insert(
                name.to_string(),
                StoredCookie {
                    value: value.to_string(),
                    path,
                },
            );
        }
    }

    fn persist(&self, cookies: &BTreeMap<String, StoredCookie>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if cookies.is_empty() {
            return match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => {
                    Err(err).with_context(|| format!("Failed to remove {}", path.display()))
                }
            };
        }
        let contents = serde_json::to_string_pretty(cookies).context("Failed to serialize cookies")?;
        write_private_file(path, &contents)
    }
}

impl reqwest::cookie::CookieStore for CookieVault {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &url::Url) {
        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        let before = cookies.clone();
        for header in cookie_headers {
            if let Ok(header) = header.to_str() {
                Self::apply(&mut cookies, header);
            }
        }

        if *cookies != before
            && let Err(err) = self.persist(&cookies)
        {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist cookies");
        }
    }

    fn cookies(&self, url: &url::Url) -> Option<HeaderValue> {
        let cookies = self.cookies.read().unwrap_or_else(PoisonError::into_inner);
        let header = cookies
            .iter()
            .filter(|(_, cookie)| cookie.matches(url.path()))
            .map(|(name, cookie)| format!("{name}={}", cookie.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}
