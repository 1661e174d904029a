//! RSA key handling — implements the `PublicKeyDeriver` port.

use anyhow::{Context, Result};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::application::ports::PublicKeyDeriver;

/// Derives SubjectPublicKeyInfo PEM from an RSA private key.
///
/// Accepts both `BEGIN RSA PRIVATE KEY` (PKCS#1) and `BEGIN PRIVATE KEY`
/// (PKCS#8) input.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaPublicKeyDeriver;

impl PublicKeyDeriver for RsaPublicKeyDeriver {
    fn public_key_pem(&self, private_pem: &str) -> Result<String> {
        let private = RsaPrivateKey::from_pkcs1_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(private_pem))
            .context("not an RSA private key in PKCS#1 or PKCS#8 PEM form")?;
        RsaPublicKey::from(&private)
            .to_public_key_pem(LineEnding::LF)
            .context("cannot encode public key")
    }
}
