//! SSH keypair generation
//!
//! Every replica gets its own RSA keypair. The private half is PKCS#1 PEM
//! (what OpenSSH reads from `id_rsa`), the public half a single
//! `authorized_keys` line. All public lines are concatenated into a
//! [`TrustSet`] that every replica receives, so each pod accepts logins
//! from every pod in the fleet, itself included.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use ssh_key::public::KeyData;
use ssh_key::PublicKey;
use zeroize::Zeroizing;

use kssh_common::Error;

/// Modulus size for generated keys
pub const RSA_KEY_BITS: usize = 4096;

/// One replica's identity material
pub struct KeyPair {
    private_key_pem: Zeroizing<String>,
    authorized_key: String,
}

impl KeyPair {
    /// Assemble a keypair from already-encoded halves
    pub fn new(private_key_pem: impl Into<String>, authorized_key: impl Into<String>) -> Self {
        Self {
            private_key_pem: Zeroizing::new(private_key_pem.into()),
            authorized_key: authorized_key.into(),
        }
    }

    /// PEM-encoded private key
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// `ssh-rsa <base64>\n` line
    pub fn authorized_key(&self) -> &str {
        &self.authorized_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key_pem", &"<redacted>")
            .field("authorized_key", &self.authorized_key)
            .finish()
    }
}

/// Anything that can mint fresh keypairs
pub trait KeySource: Send + Sync {
    /// Generate a new, independent keypair
    fn generate(&self) -> Result<KeyPair, Error>;
}

/// RSA keypairs from the operating system's secure RNG
#[derive(Debug, Clone)]
pub struct RsaKeyGenerator {
    bits: usize,
}

impl Default for RsaKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RsaKeyGenerator {
    /// Generator for [`RSA_KEY_BITS`]-bit keys
    pub fn new() -> Self {
        Self { bits: RSA_KEY_BITS }
    }

    #[cfg(test)]
    pub(crate) fn with_bits(bits: usize) -> Self {
        Self { bits }
    }
}

impl KeySource for RsaKeyGenerator {
    fn generate(&self) -> Result<KeyPair, Error> {
        let private_key = RsaPrivateKey::new(&mut OsRng, self.bits)
            .map_err(|e| Error::key_generation(format!("failed to generate private key: {}", e)))?;

        let private_key_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| Error::key_generation(format!("failed to encode private key: {}", e)))?;

        Ok(KeyPair {
            private_key_pem,
            authorized_key: authorized_key_line(&private_key.to_public_key())?,
        })
    }
}

/// Encode an RSA public key as an OpenSSH `authorized_keys` line
pub fn authorized_key_line(key: &RsaPublicKey) -> Result<String, Error> {
    let key_data = ssh_key::public::RsaPublicKey::try_from(key)
        .map_err(|e| Error::key_generation(format!("failed to convert public key: {}", e)))?;
    let line = PublicKey::from(KeyData::Rsa(key_data))
        .to_openssh()
        .map_err(|e| Error::key_generation(format!("failed to encode public key: {}", e)))?;
    Ok(format!("{}\n", line.trim_end()))
}

/// Concatenated public keys of every replica, in generation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustSet {
    lines: String,
    count: usize,
}

impl TrustSet {
    /// Empty trust set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one replica's public key
    pub fn push(&mut self, keypair: &KeyPair) {
        let line = keypair.authorized_key();
        self.lines.push_str(line);
        if !line.ends_with('\n') {
            self.lines.push('\n');
        }
        self.count += 1;
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if no keys were added
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The `authorized_keys` file content
    pub fn as_str(&self) -> &str {
        &self.lines
    }

    /// Base64 of the file content, as stored in a Secret's `data`
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.lines.as_bytes())
    }
}
