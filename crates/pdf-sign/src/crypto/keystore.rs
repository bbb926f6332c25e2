use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;
use std::fmt;
use thiserror::Error;

/// Why a credential container could not be turned into a signing identity.
///
/// The variants are distinct so callers can report a bad secret without
/// inspecting error text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyStoreError {
    #[error("credential container is malformed: {0}")]
    Malformed(String),
    #[error("credential container could not be unlocked with the given secret")]
    Rejected,
    #[error("credential container holds no private key")]
    MissingKey,
    #[error("credential container holds no certificate")]
    MissingCertificate,
    #[error("certificate does not match the private key")]
    KeyMismatch,
}

/// A private key and its certificate chain (leaf first).
///
/// The identity is borrowed by the engine for one signing call and never
/// stored beyond it.
pub struct SigningIdentity {
    key: PKey<Private>,
    chain: Vec<X509>,
}

impl SigningIdentity {
    /// Build an identity from a key and a leaf-first chain.
    ///
    /// The leaf's public key must match `key`.
    pub fn new(key: PKey<Private>, chain: Vec<X509>) -> Result<Self, KeyStoreError> {
        let leaf = chain.first().ok_or(KeyStoreError::MissingCertificate)?;
        let public = leaf
            .public_key()
            .map_err(|e| KeyStoreError::Malformed(e.to_string()))?;
        if !public.public_eq(&key) {
            return Err(KeyStoreError::KeyMismatch);
        }
        Ok(Self { key, chain })
    }

    pub fn key(&self) -> &PKey<Private> {
        &self.key
    }

    /// Leaf certificate
    pub fn certificate(&self) -> &X509 {
        // `new` guarantees a non-empty chain
        &self.chain[0]
    }

    /// Certificates after the leaf (intermediates, then root)
    pub fn intermediates(&self) -> &[X509] {
        &self.chain[1..]
    }

    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    /// Common name of the leaf certificate's subject
    pub fn common_name(&self) -> Option<String> {
        self.certificate()
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .map(|entry| String::from_utf8_lossy(entry.data().as_slice()).into_owned())
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("subject", &self.common_name())
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// Unlock a PKCS#12 (`.p12`/`.pfx`) container.
///
/// A container that cannot be parsed is `Malformed`; a container that parses
/// but cannot be decrypted with `secret` is `Rejected`.
pub fn load_pkcs12(container: &[u8], secret: &str) -> Result<SigningIdentity, KeyStoreError> {
    let pkcs12 =
        Pkcs12::from_der(container).map_err(|e| KeyStoreError::Malformed(e.to_string()))?;

    let parsed = pkcs12.parse2(secret).map_err(|e| {
        log::debug!("PKCS#12 decryption failed: {}", e);
        KeyStoreError::Rejected
    })?;

    let key = parsed.pkey.ok_or(KeyStoreError::MissingKey)?;
    let leaf = parsed.cert.ok_or(KeyStoreError::MissingCertificate)?;

    let mut chain = vec![leaf];
    if let Some(ca) = parsed.ca {
        chain.extend(ca.into_iter());
    }

    log::debug!("Loaded signing identity with {} certificate(s)", chain.len());
    SigningIdentity::new(key, chain)
}
