//! TLS trust configuration: loading a CA bundle, certificate, and private
//! key into `rustls` client/server configs.
//!
//! Grounded on `hotaru_core::connection::builder::ConnectionBuilder`'s
//! `root_certificate()`/`try_connect()` PEM-loading path, generalized two
//! ways: the hub also needs a *server* config (to terminate inbound TLS),
//! and both roles support mutual TLS when a CA bundle is supplied alongside
//! a local cert/key pair, via `rustls::server::WebPkiClientVerifier`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use rustls_pemfile::Item;

use crate::error::{Result, TransportError};

/// A named bundle of TLS trust material: an optional custom CA bundle and
/// an optional local certificate/key pair.
///
/// Corresponds to the `--cert-conf` file accepted by the hub and notifier in
/// the original tool; here it is built up programmatically by the CLI
/// layer rather than parsed from a bespoke file format, since the
/// underlying cert/key/CA paths are what the file ultimately named.
#[derive(Debug, Clone, Default)]
pub struct CertProfile {
    pub ca_path: Option<PathBuf>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
}

impl CertProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ca(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(path.into());
        self
    }

    pub fn with_cert_and_key(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.cert_path = Some(cert.into());
        self.key_path = Some(key.into());
        self
    }

    fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
        let file = File::open(path).map_err(|e| TransportError::CertRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);
        let certs: Vec<CertificateDer<'static>> = rustls_pemfile::read_all(&mut reader)
            .into_iter()
            .filter_map(|item| match item {
                Ok(Item::X509Certificate(cert)) => Some(cert),
                _ => None,
            })
            .collect();
        if certs.is_empty() {
            return Err(TransportError::NoCertificate(path.display().to_string()));
        }
        Ok(certs)
    }

    fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
        let file = File::open(path).map_err(|e| TransportError::CertRead {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut reader = BufReader::new(file);
        for item in rustls_pemfile::read_all(&mut reader) {
            match item {
                Ok(Item::Pkcs8Key(key)) => return Ok(PrivateKeyDer::Pkcs8(key)),
                Ok(Item::Pkcs1Key(key)) => return Ok(PrivateKeyDer::Pkcs1(key)),
                Ok(Item::Sec1Key(key)) => return Ok(PrivateKeyDer::Sec1(key)),
                _ => continue,
            }
        }
        Err(TransportError::NoPrivateKey(path.display().to_string()))
    }

    fn root_store(&self) -> Result<RootCertStore> {
        let mut store = RootCertStore::empty();
        match &self.ca_path {
            Some(path) => {
                let certs = Self::load_certs(path)?;
                let (_added, _ignored) = store.add_parsable_certificates(certs);
            }
            None => store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned()),
        }
        Ok(store)
    }

    /// Builds a `ServerConfig` for the hub. Requires `cert_path`/`key_path`.
    /// When `ca_path` is also set, inbound connections must present a
    /// client certificate signed by that CA (mutual TLS).
    pub fn server_config(&self) -> Result<ServerConfig> {
        let cert_path = self
            .cert_path
            .as_ref()
            .ok_or_else(|| TransportError::NoCertificate("<none configured>".to_string()))?;
        let key_path = self
            .key_path
            .as_ref()
            .ok_or_else(|| TransportError::NoPrivateKey("<none configured>".to_string()))?;

        let certs = Self::load_certs(cert_path)?;
        let key = Self::load_key(key_path)?;
        let provider = Arc::new(default_provider());

        let builder = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        let config = if self.ca_path.is_some() {
            let client_roots = Arc::new(self.root_store()?);
            let verifier = WebPkiClientVerifier::builder(client_roots)
                .build()
                .map_err(|e| TransportError::Tls(e.to_string()))?;
            builder
                .with_client_cert_verifier(verifier)
                .with_single_cert(certs, key)
                .map_err(|e| TransportError::Tls(e.to_string()))?
        } else {
            builder
                .with_no_client_auth()
                .with_single_cert(certs, key)
                .map_err(|e| TransportError::Tls(e.to_string()))?
        };

        Ok(config)
    }

    /// Builds a `ClientConfig` for the notifier/submitter. Trusts the
    /// configured CA bundle, or the system/webpki roots if none was given.
    /// Presents a client certificate for mutual TLS when `cert_path`/
    /// `key_path` are also set.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let root_store = self.root_store()?;
        let provider = Arc::new(default_provider());
        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TransportError::Tls(e.to_string()))?
            .with_root_certificates(root_store);

        let config = match (&self.cert_path, &self.key_path) {
            (Some(cert_path), Some(key_path)) => {
                let certs = Self::load_certs(cert_path)?;
                let key = Self::load_key(key_path)?;
                builder
                    .with_client_auth_cert(certs, key)
                    .map_err(|e| TransportError::Tls(e.to_string()))?
            }
            _ => builder.with_no_client_auth(),
        };

        Ok(config)
    }
}
