//! URL parsing into the fields host factories need.
//!
//! Accepts `scheme://[user[:password]@]host[:port]/path[?query][#fragment]`.
//! The heavy lifting is done by the `url` crate; this module flattens the
//! result into a plain value and applies two conventions of its own: the
//! path loses its leading `/` (segments are always relative to the host),
//! and user info is percent-decoded into [`Credentials`].

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};

/// Username and optional password supplied by the caller or in a URL.
///
/// Credentials never take part in host equality; two hosts reaching the same
/// endpoint with different logins compare equal.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    pub fn username_only(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
        }
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A parsed URL. Produced once by [`Url::parse`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    pub scheme: String,
    pub credentials: Option<Credentials>,
    pub hostname: String,
    pub port: Option<u16>,
    /// Decoded path without its leading `/`.
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Url {
    pub fn parse(input: &str) -> Result<Url> {
        let malformed = |reason: String| Error::MalformedUrl {
            url: input.to_string(),
            reason,
        };

        let parsed = ::url::Url::parse(input).map_err(|e| malformed(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(malformed("expected scheme://host/path".to_string()));
        }

        let credentials = if parsed.username().is_empty() {
            None
        } else {
            Some(Credentials {
                username: decode(parsed.username()),
                password: parsed.password().map(decode),
            })
        };

        let path = decode(parsed.path());

        Ok(Url {
            scheme: parsed.scheme().to_string(),
            credentials,
            hostname: parsed.host_str().unwrap_or_default().to_string(),
            port: parsed.port(),
            path: path.trim_start_matches('/').to_string(),
            query: parsed.query().map(str::to_string),
            fragment: parsed.fragment().map(str::to_string),
        })
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
