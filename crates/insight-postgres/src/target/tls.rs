//! TLS for target-database connections.
//!
//! Modes follow libpq's `sslmode`: `prefer` and `require` encrypt without
//! checking the server certificate, `verify-full` checks the chain against
//! the platform roots (plus an optional extra CA file) and the host name.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[cfg(feature = "config")]
use clap::ValueEnum;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio_postgres::config::SslMode;
use tokio_postgres_rustls::MakeRustlsConnect;

use super::{TargetDefaults, TargetError, TargetResult};
use crate::TRACING_TARGET_TARGET;

/// How target connections negotiate TLS.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TargetSslMode {
    /// Plain TCP only.
    Disable,
    /// Encrypt when the server offers TLS, plain TCP otherwise.
    #[default]
    Prefer,
    /// Encrypt or fail; the certificate is not checked.
    Require,
    /// Encrypt and verify the certificate chain and host name.
    VerifyFull,
}

impl TargetSslMode {
    /// Returns the driver's negotiation mode.
    pub fn driver_mode(self) -> SslMode {
        match self {
            Self::Disable => SslMode::Disable,
            Self::Prefer => SslMode::Prefer,
            Self::Require | Self::VerifyFull => SslMode::Require,
        }
    }
}

/// TLS connector shared by every target connection.
///
/// Built once at startup so root certificates are loaded a single time.
#[derive(Clone)]
pub struct TargetTls {
    mode: TargetSslMode,
    connector: Option<MakeRustlsConnect>,
}

impl TargetTls {
    /// Plain TCP for every connection.
    pub fn disabled() -> Self {
        Self {
            mode: TargetSslMode::Disable,
            connector: None,
        }
    }

    /// Builds the connector described by the target defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::Config`] if the extra CA file cannot be read
    /// or the TLS configuration cannot be built.
    pub fn from_defaults(defaults: &TargetDefaults) -> TargetResult<Self> {
        let mode = defaults.target_ssl_mode;
        let root_cert = defaults.target_ssl_root_cert.as_deref();

        let config = match mode {
            TargetSslMode::Disable => return Ok(Self::disabled()),
            TargetSslMode::Prefer | TargetSslMode::Require => encrypt_only_config()?,
            TargetSslMode::VerifyFull => verifying_config(root_cert)?,
        };

        tracing::debug!(
            target: TRACING_TARGET_TARGET,
            mode = %mode,
            "Target TLS connector built"
        );

        Ok(Self {
            mode,
            connector: Some(MakeRustlsConnect::new(config)),
        })
    }

    /// Returns the negotiation mode.
    #[inline]
    pub fn mode(&self) -> TargetSslMode {
        self.mode
    }

    /// Returns the rustls connector, absent when TLS is disabled.
    #[inline]
    pub(crate) fn connector(&self) -> Option<&MakeRustlsConnect> {
        self.connector.as_ref()
    }
}

impl fmt::Debug for TargetTls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetTls")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn tls_error(error: rustls::Error) -> TargetError {
    TargetError::config(format!("Invalid target TLS configuration: {error}"))
}

fn encrypt_only_config() -> TargetResult<ClientConfig> {
    let provider = provider();
    let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(tls_error)?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(UncheckedCertificate(provider)))
        .with_no_client_auth();

    Ok(config)
}

fn verifying_config(root_cert: Option<&Path>) -> TargetResult<ClientConfig> {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        tracing::warn!(
            target: TRACING_TARGET_TARGET,
            error = %error,
            "Failed to load a system root certificate"
        );
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);

    let mut extra = 0;
    if let Some(path) = root_cert {
        let certs = CertificateDer::pem_file_iter(path)
            .and_then(|certs| certs.collect::<Result<Vec<_>, _>>())
            .map_err(|e| {
                TargetError::config(format!(
                    "Cannot read target root certificate {}: {e}",
                    path.display()
                ))
            })?;

        for cert in certs {
            roots.add(cert).map_err(tls_error)?;
            extra += 1;
        }
    }

    if roots.is_empty() {
        return Err(TargetError::config(
            "No root certificates available for target TLS verification",
        ));
    }

    tracing::debug!(
        target: TRACING_TARGET_TARGET,
        system = added,
        ignored,
        extra,
        "Target root certificates loaded"
    );

    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .map_err(tls_error)?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(config)
}

/// Accepts any server certificate while still checking handshake
/// signatures, which is what libpq does for `prefer` and `require`.
#[derive(Debug)]
struct UncheckedCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for UncheckedCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::str::FromStr;

    use super::*;

    fn defaults(mode: TargetSslMode) -> TargetDefaults {
        TargetDefaults {
            target_ssl_mode: mode,
            ..TargetDefaults::default()
        }
    }

    #[test]
    fn prefer_is_the_default_mode() {
        assert_eq!(TargetDefaults::default().target_ssl_mode, TargetSslMode::Prefer);
        assert_eq!(TargetSslMode::Prefer.driver_mode(), SslMode::Prefer);
        assert_eq!(TargetSslMode::VerifyFull.driver_mode(), SslMode::Require);
    }

    #[test]
    fn modes_parse_like_libpq() {
        assert_eq!(<TargetSslMode as FromStr>::from_str("verify-full"), Ok(TargetSslMode::VerifyFull));
        assert_eq!(<TargetSslMode as FromStr>::from_str("disable"), Ok(TargetSslMode::Disable));
        assert_eq!(TargetSslMode::Require.to_string(), "require");
    }

    #[test]
    fn disabled_mode_has_no_connector() -> TargetResult<()> {
        let tls = TargetTls::from_defaults(&defaults(TargetSslMode::Disable))?;
        assert!(tls.connector().is_none());
        Ok(())
    }

    #[test]
    fn encrypting_modes_build_a_connector() -> TargetResult<()> {
        for mode in [TargetSslMode::Prefer, TargetSslMode::Require] {
            let tls = TargetTls::from_defaults(&defaults(mode))?;
            assert!(tls.connector().is_some());
            assert_eq!(tls.mode(), mode);
        }
        Ok(())
    }

    #[test]
    fn unreadable_root_certificate_is_config_error() {
        let defaults = TargetDefaults {
            target_ssl_root_cert: Some(PathBuf::from("/nonexistent/insight-ca.pem")),
            ..defaults(TargetSslMode::VerifyFull)
        };

        let result = TargetTls::from_defaults(&defaults);
        assert!(matches!(result, Err(TargetError::Config(_))));
    }
}
