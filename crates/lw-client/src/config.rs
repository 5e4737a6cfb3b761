use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lw_transport::{CertificateBundle, NodePool, TcpTransport, TlsTransport, Transport, WireProtocol, WsTransport};
use lw_types::Node;

use crate::error::{ConnectorError, ConnectorResult};

pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_RESUBSCRIBE_DELAY_MS: u64 = 5_000;
pub const DEFAULT_MAX_SEND_RETRIES: u32 = 3;

/// Settings for a [`Connector`](crate::Connector).
///
/// Loadable from TOML:
///
/// ```toml
/// protocol = "tls"
/// private_key = "client.key"
/// certificate = "client.crt"
/// root_certificates = ["root.crt"]
///
/// [[nodes]]
/// url = "tls://ledger-1:3001"
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectorSettings {
    pub nodes: Vec<Node>,
    /// `"ws"`, `"tls"`, or anything else for the plain stream transport.
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub block_version: Option<String>,
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    #[serde(default)]
    pub certificate: Option<PathBuf>,
    #[serde(default)]
    pub root_certificates: Vec<PathBuf>,
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
    #[serde(default = "default_resubscribe_delay_ms")]
    pub resubscribe_delay_ms: u64,
    #[serde(default = "default_max_send_retries")]
    pub max_send_retries: u32,
}

fn default_confirmation_timeout_ms() -> u64 { DEFAULT_CONFIRMATION_TIMEOUT_MS }
fn default_resubscribe_delay_ms() -> u64 { DEFAULT_RESUBSCRIBE_DELAY_MS }
fn default_max_send_retries() -> u32 { DEFAULT_MAX_SEND_RETRIES }

impl ConnectorSettings {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            protocol: None,
            block_version: None,
            private_key: None,
            certificate: None,
            root_certificates: Vec::new(),
            confirmation_timeout_ms: DEFAULT_CONFIRMATION_TIMEOUT_MS,
            resubscribe_delay_ms: DEFAULT_RESUBSCRIBE_DELAY_MS,
            max_send_retries: DEFAULT_MAX_SEND_RETRIES,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn with_tls(
        mut self,
        private_key: impl Into<PathBuf>,
        certificate: impl Into<PathBuf>,
        root_certificates: Vec<PathBuf>,
    ) -> Self {
        self.protocol = Some(WireProtocol::Tls.as_str().into());
        self.private_key = Some(private_key.into());
        self.certificate = Some(certificate.into());
        self.root_certificates = root_certificates;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_resubscribe_delay(mut self, delay: Duration) -> Self {
        self.resubscribe_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_send_retries(mut self, retries: u32) -> Self {
        self.max_send_retries = retries;
        self
    }

    pub fn from_toml_str(s: &str) -> ConnectorResult<Self> {
        toml::from_str(s).map_err(|e| ConnectorError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ConnectorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConnectorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn wire_protocol(&self) -> WireProtocol {
        WireProtocol::from_setting(self.protocol.as_deref())
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn resubscribe_delay(&self) -> Duration {
        Duration::from_millis(self.resubscribe_delay_ms)
    }

    pub fn node_pool(&self) -> ConnectorResult<NodePool> {
        if let Some(node) = self.nodes.iter().find(|n| n.address().trim().is_empty()) {
            return Err(ConnectorError::Config(format!("node address is empty: {node:?}")));
        }
        NodePool::new(self.nodes.clone())
            .ok_or_else(|| ConnectorError::Config("no nodes are configured".into()))
    }

    /// Read the TLS key material. `None` unless the protocol is TLS, in which
    /// case every path must be set and readable.
    pub fn certificate_bundle(&self) -> ConnectorResult<Option<CertificateBundle>> {
        if self.wire_protocol() != WireProtocol::Tls {
            return Ok(None);
        }
        let private_key = self
            .private_key
            .as_deref()
            .ok_or_else(|| ConnectorError::Config("private_key is not set".into()))?;
        let certificate = self
            .certificate
            .as_deref()
            .ok_or_else(|| ConnectorError::Config("certificate is not set".into()))?;
        if self.root_certificates.is_empty() {
            return Err(ConnectorError::Config("root_certificates is not set".into()));
        }
        CertificateBundle::load(private_key, certificate, &self.root_certificates)
            .map(Some)
            .map_err(|e| ConnectorError::Config(e.to_string()))
    }

    /// Driver for the configured protocol.
    pub fn build_transport(&self) -> ConnectorResult<Arc<dyn Transport>> {
        let transport: Arc<dyn Transport> = match self.wire_protocol() {
            WireProtocol::Tcp => Arc::new(TcpTransport::new()),
            WireProtocol::Ws => Arc::new(WsTransport::new()),
            WireProtocol::Tls => {
                let bundle = self
                    .certificate_bundle()?
                    .ok_or_else(|| ConnectorError::Config("TLS key material missing".into()))?;
                let tls = TlsTransport::new(&bundle).map_err(|e| ConnectorError::Config(e.to_string()))?;
                Arc::new(tls)
            }
        };
        Ok(transport)
    }
}
