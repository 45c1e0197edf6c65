//! Security credential signing and STK password derivation
//!
//! Privileged operations (B2C, B2B, balance, reversal, status) authorize the
//! initiator by RSA-encrypting its password with the gateway's public
//! certificate and base64-encoding the result. STK push instead derives a
//! time-boxed password from the shortcode and passkey. Both values are cheap
//! to compute and time- or configuration-dependent, so they are recomputed on
//! every call rather than cached.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use openssl::rsa::{Padding, Rsa};
use openssl::x509::X509;

use crate::config::Environment;
use crate::error::Error;

/// Source of the gateway's per-environment public certificates
pub trait CertificateSource: Send + Sync {
    /// Return the PEM bytes for the given environment
    fn certificate_pem(&self, environment: Environment) -> Result<Vec<u8>, Error>;
}

/// Loads `sandbox.cer` / `production.cer` from a directory on disk
#[derive(Debug, Clone)]
pub struct CertificateDir {
    dir: PathBuf,
}

impl CertificateDir {
    /// Create a source rooted at `dir`
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl CertificateSource for CertificateDir {
    fn certificate_pem(&self, environment: Environment) -> Result<Vec<u8>, Error> {
        let path = self.dir.join(environment.certificate_file());
        std::fs::read(&path)
            .map_err(|e| Error::KeyLoad(format!("failed to read {}: {}", path.display(), e)))
    }
}

/// RSA-encrypt the initiator secret with the gateway's public key and
/// base64-encode it into a security credential.
///
/// Accepts either an X.509 certificate PEM (as shipped by the gateway) or a
/// bare RSA public key PEM. PKCS1 padding caps the secret at the key size
/// minus padding overhead (214 bytes for a 2048-bit key).
pub fn security_credential(secret: &str, certificate_pem: &[u8]) -> Result<String, Error> {
    if secret.is_empty() {
        return Err(Error::InvalidArgument(
            "initiator secret is empty".to_string(),
        ));
    }

    let rsa = public_key(certificate_pem)?;

    let mut encrypted = vec![0; rsa.size() as usize];
    let len = rsa
        .public_encrypt(secret.as_bytes(), &mut encrypted, Padding::PKCS1)
        .map_err(|e| Error::Encryption(e.to_string()))?;
    encrypted.truncate(len);

    Ok(STANDARD.encode(&encrypted))
}

/// Derive the STK push password: `base64(shortcode + passkey + timestamp)`
///
/// The timestamp is the caller's signing timestamp (`YYYYMMDDHHmmss`) and
/// must match the `Timestamp` field sent alongside the password.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> Result<String, Error> {
    if shortcode.is_empty() {
        return Err(Error::InvalidArgument("shortcode is empty".to_string()));
    }
    if passkey.is_empty() {
        return Err(Error::InvalidArgument("passkey is empty".to_string()));
    }

    Ok(STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp)))
}

fn public_key(pem: &[u8]) -> Result<Rsa<openssl::pkey::Public>, Error> {
    if String::from_utf8_lossy(pem).contains("BEGIN CERTIFICATE") {
        let certificate = X509::from_pem(pem).map_err(|e| Error::KeyLoad(e.to_string()))?;
        certificate
            .public_key()
            .and_then(|key| key.rsa())
            .map_err(|e| Error::KeyLoad(e.to_string()))
    } else {
        Rsa::public_key_from_pem(pem).map_err(|e| Error::KeyLoad(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_stk_password() {
        let password = stk_password("174379", "bfb279f9aa9bdbcf", "20250101120000").unwrap();
        assert_eq!(
            password,
            STANDARD.encode("174379bfb279f9aa9bdbcf20250101120000")
        );
    }

    #[test]
    fn test_stk_password_rejects_empty_inputs() {
        assert!(matches!(
            stk_password("", "passkey", "20250101120000"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            stk_password("174379", "", "20250101120000"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_security_credential_round_trip() {
        let rsa = Rsa::generate(2048).unwrap();
        let public_pem = rsa.public_key_to_pem().unwrap();

        let credential = security_credential("Secret123!", &public_pem).unwrap();

        let encrypted = STANDARD.decode(credential).unwrap();
        let mut decrypted = vec![0; rsa.size() as usize];
        let len = rsa
            .private_decrypt(&encrypted, &mut decrypted, Padding::PKCS1)
            .unwrap();
        assert_eq!(&decrypted[..len], b"Secret123!");
    }

    #[test]
    fn test_security_credential_rejects_oversize_secret() {
        let rsa = Rsa::generate(2048).unwrap();
        let public_pem = rsa.public_key_to_pem().unwrap();

        // Past the PKCS1 plaintext limit for a 2048-bit key
        let secret = "x".repeat(300);
        assert!(matches!(
            security_credential(&secret, &public_pem),
            Err(Error::Encryption(_))
        ));
    }

    #[test]
    fn test_security_credential_rejects_empty_secret() {
        assert!(matches!(
            security_credential("", b"irrelevant"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_security_credential_rejects_bad_pem() {
        assert!(matches!(
            security_credential("secret", b"not a pem"),
            Err(Error::KeyLoad(_))
        ));
    }

    #[test]
    fn test_certificate_dir() {
        let dir = tempfile::tempdir().unwrap();
        let rsa = Rsa::generate(2048).unwrap();
        let pem = rsa.public_key_to_pem().unwrap();

        let path = dir.path().join(Environment::Sandbox.certificate_file());
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&pem).unwrap();

        let source = CertificateDir::new(dir.path().to_path_buf());
        assert_eq!(source.certificate_pem(Environment::Sandbox).unwrap(), pem);
        assert!(matches!(
            source.certificate_pem(Environment::Production),
            Err(Error::KeyLoad(_))
        ));
    }
}
