//! Endpoint keys and URL resolution

use std::fmt;

use berth_utils::{BerthError, Result};
use url::Url;

/// Which stream of a container an endpoint serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Interactive shell, bidirectional text
    Shell,
    /// Resource telemetry, server push only
    Telemetry,
}

impl EndpointKind {
    fn segment(self) -> &'static str {
        match self {
            EndpointKind::Shell => "terminal",
            EndpointKind::Telemetry => "stats",
        }
    }
}

/// Identity of one remote stream: at most one channel is open per key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    kind: EndpointKind,
    container_id: String,
}

impl EndpointKey {
    pub fn new(kind: EndpointKind, container_id: &str) -> Result<Self> {
        let container_id = container_id.trim();
        if container_id.is_empty() {
            return Err(BerthError::validation("container id must not be empty"));
        }
        Ok(Self {
            kind,
            container_id: container_id.to_string(),
        })
    }

    pub fn shell(container_id: &str) -> Result<Self> {
        Self::new(EndpointKind::Shell, container_id)
    }

    pub fn telemetry(container_id: &str) -> Result<Self> {
        Self::new(EndpointKind::Telemetry, container_id)
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Resolve against the host's base URL
    ///
    /// `http` becomes `ws` and `https` becomes `wss`; any path on the base
    /// is kept as a prefix.
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(BerthError::config(format!(
                    "unsupported scheme '{}' in server url {}",
                    other, base
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| BerthError::config(format!("cannot derive websocket url from {}", base)))?;
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|_| BerthError::config(format!("server url {} cannot be a base", base)))?
            .pop_if_empty()
            .extend(["ws", self.kind.segment(), self.container_id.as_str()]);
        Ok(url)
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.segment(), self.container_id)
    }
}
