//! Signing credentials and the detached signature primitive
//!
//! - [`keystore`]: unlocking a PKCS#12 container into a [`SigningIdentity`]
//! - [`cms`]: producing a detached PKCS#7 signature over a byte range

pub mod cms;
pub mod keystore;

pub use cms::{DetachedSigner, DigestAlgorithm};
pub use keystore::{KeyStoreError, SigningIdentity, load_pkcs12};

#[cfg(test)]
pub(crate) mod test_support;
