//! Resolved connection parameters for the active tenant.

use prism_core::secret::mask_token;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::error::ClientError;

/// The ready-to-use connection parameters for one tenant.
///
/// Derived deterministically from a credential plus routing configuration:
/// the same connection string always parses to the same descriptor, which is
/// what allows [`ConnectionManager`](crate::ConnectionManager) to cache parse
/// results. Value equality is the identity used by tests and caches.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    host: String,
    params: BTreeMap<String, String>,
    auth_header: String,
}

impl ConnectionDescriptor {
    /// Parse an `arrow-flight-sql` connection string into a descriptor.
    ///
    /// Accepts the `jdbc:`-prefixed form as well. The token query parameter
    /// becomes the bearer auth header; every other parameter is kept with a
    /// lowercased key. The standard port 443 is dropped from the host.
    pub fn parse(uri: &str) -> Result<Self, ClientError> {
        let rest = uri.strip_prefix("jdbc:").unwrap_or(uri);
        let url = Url::parse(rest)
            .map_err(|e| ClientError::InvalidConnectionString(e.to_string()))?;

        if url.scheme() != "arrow-flight-sql" {
            return Err(ClientError::InvalidConnectionString(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ClientError::InvalidConnectionString("missing host".to_string()))?;

        let mut params: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
            .collect();

        let token = params
            .remove("token")
            .filter(|t| !t.is_empty())
            .ok_or(ClientError::MissingToken)?;

        let host = match url.port() {
            Some(port) if port != 443 => format!("https://{host}:{port}"),
            _ => format!("https://{host}"),
        };

        Ok(Self {
            host,
            params,
            auth_header: format!("Bearer {token}"),
        })
    }

    /// Construct a descriptor directly (test doubles and mock servers).
    #[doc(hidden)]
    pub fn from_parts(
        host: impl Into<String>,
        params: BTreeMap<String, String>,
        auth_header: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            params,
            auth_header: auth_header.into(),
        }
    }

    /// The https base the backend is reached at.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Connection parameters (lowercased keys, token removed).
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// The backend environment identifier, when present.
    pub fn environment_id(&self) -> Option<&str> {
        self.params.get("environmentid").map(String::as_str)
    }

    /// The bearer auth header. Never log this; use the `Debug` form.
    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    /// Absolute URL for a path on the backend host.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = match self.auth_header.strip_prefix("Bearer ") {
            Some(token) => format!("Bearer {}", mask_token(token)),
            None => mask_token(&self.auth_header),
        };
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("params", &self.params)
            .field("auth_header", &masked)
            .finish()
    }
}
