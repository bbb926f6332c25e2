use super::SigningIdentity;
use crate::types::{EngineError, Result};
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::Id;
use openssl::stack::Stack;
use openssl::x509::X509;

/// Digest used for the signature's message digest attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
}

/// Produces a detached CMS signature over externally supplied bytes
pub trait DetachedSigner {
    /// Name shown in the stamp caption and the signature dictionary
    fn signer_name(&self) -> Option<String>;

    /// Sign `data` and return the DER-encoded PKCS#7 SignedData (no embedded content)
    ///
    /// Implementations must produce a signature using `digest` or fail with
    /// `SigningFailure`.
    fn sign_detached(&self, digest: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>>;
}

impl DetachedSigner for SigningIdentity {
    fn signer_name(&self) -> Option<String> {
        self.common_name()
    }

    fn sign_detached(&self, digest: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        // PKCS7_sign takes the key's default digest, which is SHA-256 only for RSA and EC
        let DigestAlgorithm::Sha256 = digest;
        let key_type = self.key().id();
        if key_type != Id::RSA && key_type != Id::EC {
            return Err(EngineError::SigningFailure(format!(
                "{:?} signatures are not supported for key type {:?}",
                digest, key_type
            )));
        }

        let mut certs = Stack::<X509>::new().map_err(signing_failure)?;
        for cert in self.intermediates() {
            certs.push(cert.clone()).map_err(signing_failure)?;
        }

        // NOATTR must stay off: the signed attributes carry the message digest
        let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY | Pkcs7Flags::NOSMIMECAP;
        let pkcs7 = Pkcs7::sign(self.certificate(), self.key(), &certs, data, flags)
            .map_err(signing_failure)?;

        pkcs7.to_der().map_err(signing_failure)
    }
}

fn signing_failure(err: openssl::error::ErrorStack) -> EngineError {
    EngineError::SigningFailure(err.to_string())
}
