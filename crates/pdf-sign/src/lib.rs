pub mod appearance;
pub mod constants;
pub mod crypto;
pub mod engine;
pub mod geometry;
pub mod naming;
mod options;
pub mod ordering;
pub mod pdf;
pub mod signer;
mod types;

pub use crypto::{DetachedSigner, KeyStoreError, SigningIdentity, load_pkcs12};
pub use engine::{
    PreparedDocument, add_placeholders, add_placeholders_blocking, list_signature_fields,
    load_file, save_file, sign, sign_blocking, sign_document, sign_with_credentials,
    sign_with_credentials_blocking,
};
pub use geometry::BoundsPolicy;
pub use options::*;
pub use pdf::{DocumentModel, PdfDocument};
pub use types::*;
