use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::verify_server_cert_signed_by_trust_anchor;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use lw_types::Node;

use crate::endpoint::Endpoint;
use crate::error::{TransportError, TransportResult};
use crate::reply::Reply;
use crate::stream::exchange;
use crate::transport::{SendFlags, Transport};

/// Client key material for mutual TLS, read once and held for the lifetime
/// of the connector.
#[derive(Clone)]
pub struct CertificateBundle {
    pub private_key: Vec<u8>,
    pub certificate: Vec<u8>,
    pub root_certificates: Vec<Vec<u8>>,
}

impl std::fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("private_key", &"<redacted>")
            .field("certificate_len", &self.certificate.len())
            .field("root_certificates", &self.root_certificates.len())
            .finish()
    }
}

impl CertificateBundle {
    /// Read PEM files from disk.
    pub fn load(private_key: &Path, certificate: &Path, root_certificates: &[PathBuf]) -> TransportResult<Self> {
        if root_certificates.is_empty() {
            return Err(TransportError::Certificate("no root certificates configured".into()));
        }
        Ok(Self {
            private_key: read(private_key)?,
            certificate: read(certificate)?,
            root_certificates: root_certificates
                .iter()
                .map(|path| read(path))
                .collect::<TransportResult<_>>()?,
        })
    }

    /// Build a client configuration presenting our certificate and trusting
    /// only the configured roots.
    pub fn client_config(&self) -> TransportResult<ClientConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut roots = RootCertStore::empty();
        for pem in &self.root_certificates {
            for cert in parse_certificates(pem)? {
                roots.add(cert).map_err(|e| TransportError::Certificate(e.to_string()))?;
            }
        }
        let verifier = RootOnlyVerifier {
            roots: Arc::new(roots),
            algorithms: provider.signature_verification_algorithms,
        };

        let chain = parse_certificates(&self.certificate)?;
        let key = parse_private_key(&self.private_key)?;

        ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TransportError::Tls(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_client_auth_cert(chain, key)
            .map_err(|e| TransportError::Certificate(e.to_string()))
    }
}

fn read(path: &Path) -> TransportResult<Vec<u8>> {
    fs::read(path).map_err(|e| TransportError::Certificate(format!("{}: {e}", path.display())))
}

fn parse_certificates(pem: &[u8]) -> TransportResult<Vec<CertificateDer<'static>>> {
    let mut reader = pem;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::Certificate(e.to_string()))?;
    if certs.is_empty() {
        return Err(TransportError::Certificate("no certificate in PEM data".into()));
    }
    Ok(certs)
}

fn parse_private_key(pem: &[u8]) -> TransportResult<PrivateKeyDer<'static>> {
    let mut reader = pem;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| TransportError::Certificate(e.to_string()))?
        .ok_or_else(|| TransportError::Certificate("no private key in PEM data".into()))
}

/// Validates the server chain against the configured roots but does not
/// check that the certificate names the host we dialed.
#[derive(Debug)]
struct RootOnlyVerifier {
    roots: Arc<RootCertStore>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl ServerCertVerifier for RootOnlyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let cert = ParsedCertificate::try_from(end_entity)?;
        verify_server_cert_signed_by_trust_anchor(&cert, &self.roots, intermediates, now, self.algorithms.all)?;
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

/// Mutual-TLS stream driver. Addresses must use the `tls://host:port` form.
#[derive(Clone)]
pub struct TlsTransport {
    connector: TlsConnector,
}

impl TlsTransport {
    pub fn new(bundle: &CertificateBundle) -> TransportResult<Self> {
        let config = bundle.client_config()?;
        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
        })
    }
}

#[async_trait]
impl Transport for TlsTransport {
    fn name(&self) -> &'static str {
        "tls"
    }

    async fn send(&self, node: &Node, payload: Bytes, flags: SendFlags) -> TransportResult<Option<Reply>> {
        let endpoint = Endpoint::parse_tls(node.address())?;
        let server_name = ServerName::try_from(endpoint.host.clone()).map_err(|e| {
            TransportError::InvalidEndpoint {
                address: node.address().to_string(),
                reason: e.to_string(),
            }
        })?;
        let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|source| TransportError::Connect {
                address: node.address().to_string(),
                source,
            })?;
        let stream = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| TransportError::Tls(e.to_string()))?;
        debug!(node = %node, ?flags, "tls session established");
        exchange(stream, &payload, flags).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use lw_protocol::{LwCodec, FRAME_HEADER_SIZE};
    use rcgen::{BasicConstraints, CertificateParams, ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose};
    use rustls::pki_types::PrivatePkcs8KeyDer;
    use rustls::server::WebPkiClientVerifier;
    use rustls::ServerConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_rustls::TlsAcceptor;

    struct Authority {
        cert: rcgen::Certificate,
        key: KeyPair,
    }

    impl Authority {
        fn new(name: &str) -> Self {
            let key = KeyPair::generate().unwrap();
            let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::DigitalSignature];
            let cert = params.self_signed(&key).unwrap();
            Self { cert, key }
        }

        fn issue(&self, name: &str, usage: ExtendedKeyUsagePurpose) -> (rcgen::Certificate, KeyPair) {
            let key = KeyPair::generate().unwrap();
            let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
            params.extended_key_usages = vec![usage];
            let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
            (cert, key)
        }
    }

    /// Client material issued by `issuer`, trusting only `trusted`.
    fn client_bundle(trusted: &Authority, issuer: &Authority) -> (CertificateBundle, CertificateDer<'static>) {
        let (cert, key) = issuer.issue("client.local", ExtendedKeyUsagePurpose::ClientAuth);
        let bundle = CertificateBundle {
            private_key: key.serialize_pem().into_bytes(),
            certificate: cert.pem().into_bytes(),
            root_certificates: vec![trusted.cert.pem().into_bytes()],
        };
        (bundle, cert.der().clone())
    }

    /// One-shot TLS node whose certificate names a host we never dial. It
    /// answers one frame with "pong" and reports the client chain it saw.
    async fn serve(
        server_ca: &Authority,
        client_ca: &Authority,
    ) -> (Node, JoinHandle<Option<Vec<CertificateDer<'static>>>>) {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let (cert, key) = server_ca.issue("other-host.example", ExtendedKeyUsagePurpose::ServerAuth);

        let mut client_roots = RootCertStore::empty();
        client_roots.add(client_ca.cert.der().clone()).unwrap();
        let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(client_roots), provider.clone())
            .build()
            .unwrap();
        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .unwrap()
            .with_client_cert_verifier(verifier)
            .with_single_cert(
                vec![cert.der().clone()],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
            )
            .unwrap();
        let acceptor = TlsAcceptor::from(Arc::new(config));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut tls = acceptor.accept(tcp).await.ok()?;
            let mut header = [0u8; FRAME_HEADER_SIZE];
            tls.read_exact(&mut header).await.ok()?;
            let mut body = vec![0u8; u32::from_be_bytes(header) as usize];
            tls.read_exact(&mut body).await.ok()?;
            tls.write_all(&LwCodec::frame(b"pong").unwrap()).await.ok()?;
            tls.flush().await.ok()?;
            tls.get_ref().1.peer_certificates().map(|chain| chain.to_vec())
        });
        (Node::new(format!("tls://{addr}")).unwrap(), handle)
    }

    #[tokio::test]
    async fn configured_root_is_trusted_whatever_the_hostname() {
        let ca = Authority::new("ledger-ca.local");
        let (bundle, client_cert) = client_bundle(&ca, &ca);
        let (node, server) = serve(&ca, &ca).await;

        let reply = TlsTransport::new(&bundle)
            .unwrap()
            .send(&node, Bytes::from_static(b"ping"), SendFlags::request())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.frame, Bytes::from_static(b"pong"));

        let presented = server.await.unwrap().expect("server saw no client certificate");
        assert_eq!(presented.first(), Some(&client_cert));
    }

    #[tokio::test]
    async fn unknown_root_is_rejected() {
        let ca = Authority::new("ledger-ca.local");
        let rogue = Authority::new("rogue-ca.local");
        let (bundle, _) = client_bundle(&ca, &ca);
        let (node, server) = serve(&rogue, &ca).await;

        let err = TlsTransport::new(&bundle)
            .unwrap()
            .send(&node, Bytes::from_static(b"ping"), SendFlags::request())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Tls(_)), "got {err:?}");
        assert!(!err.is_config());
        assert!(server.await.unwrap().is_none());
    }

    fn temp_file(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn missing_file_is_certificate_error() {
        let key = temp_file(b"key");
        let err = CertificateBundle::load(
            key.path(),
            Path::new("/nonexistent/client.pem"),
            &[PathBuf::from("/nonexistent/root.pem")],
        )
        .unwrap_err();
        assert!(matches!(err, TransportError::Certificate(_)));
        assert!(err.is_config());
    }

    #[test]
    fn empty_roots_rejected() {
        let key = temp_file(b"key");
        let cert = temp_file(b"cert");
        let err = CertificateBundle::load(key.path(), cert.path(), &[]).unwrap_err();
        assert!(matches!(err, TransportError::Certificate(_)));
    }

    #[test]
    fn load_reads_all_files() {
        let key = temp_file(b"key-bytes");
        let cert = temp_file(b"cert-bytes");
        let root_a = temp_file(b"root-a");
        let root_b = temp_file(b"root-b");
        let bundle = CertificateBundle::load(
            key.path(),
            cert.path(),
            &[root_a.path().to_path_buf(), root_b.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(bundle.private_key, b"key-bytes");
        assert_eq!(bundle.certificate, b"cert-bytes");
        assert_eq!(bundle.root_certificates.len(), 2);
    }

    #[test]
    fn non_pem_material_rejected() {
        let bundle = CertificateBundle {
            private_key: b"not a key".to_vec(),
            certificate: b"not a cert".to_vec(),
            root_certificates: vec![b"not a root".to_vec()],
        };
        let err = bundle.client_config().unwrap_err();
        assert!(matches!(err, TransportError::Certificate(_)));
        assert!(TlsTransport::new(&bundle).is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let bundle = CertificateBundle {
            private_key: b"secret".to_vec(),
            certificate: vec![],
            root_certificates: vec![],
        };
        assert!(!format!("{bundle:?}").contains("secret"));
    }
}
