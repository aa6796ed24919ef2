//! Stable per-client key used for rate limiting.

use super::state::ServerState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::SocketAddr;

pub const ANONYMOUS_CLIENT: &str = "anonymous";

const MAX_CLIENT_KEY_LENGTH: usize = 128;

/// The configured client header if present, else the peer IP, else [`ANONYMOUS_CLIENT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    pub fn from_parts(parts: &Parts, client_id_header: Option<&str>) -> Self {
        if let Some(header) = client_id_header {
            let value = parts
                .headers
                .get(header)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(value) = value {
                let key: String = value.chars().take(MAX_CLIENT_KEY_LENGTH).collect();
                return ClientIdentity(format!("key:{}", key));
            }
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return ClientIdentity(format!("ip:{}", addr.ip()));
        }

        ClientIdentity(ANONYMOUS_CLIENT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequestParts<ServerState> for ClientIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(
            parts,
            state.config.client_id_header.as_deref(),
        ))
    }
}
