//! Signing orchestration
//!
//! One call produces one cryptographic signature and any number of
//! decorative stamps:
//! 1. Sort placements by page; the first one is the signing target
//! 2. Resolve every placement against its page (fail before drawing anything)
//! 3. Draw a stamp for each remaining placement into its page content
//! 4. Name the new field from the live field list
//! 5. Add the signature field with the same stamp as its appearance
//! 6. Append the revision and embed the detached signature

mod io;

pub use io::{load_file, save_file};

use crate::appearance::{Caption, StampImage};
use crate::crypto::{DetachedSigner, SigningIdentity, load_pkcs12};
use crate::geometry::to_document_space;
use crate::naming::{ensure_unused, next_signature_field_name};
use crate::options::SignOptions;
use crate::ordering::order_placements;
use crate::pdf::{DocumentModel, PdfDocument, SignatureFieldSpec, SignatureValue, StampContent};
use crate::signer::finish_signature;
use crate::types::*;
use chrono::{DateTime, FixedOffset, Local};

/// A document with unsigned signature fields added
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDocument {
    pub bytes: Vec<u8>,
    /// Names of the created fields, in placement order
    pub field_names: Vec<String>,
}

/// Sign an opened document model.
///
/// The lowest-page placement receives the signature; all others get a
/// decorative stamp. Any failure aborts the call and no bytes are returned.
pub fn sign_document<D: DocumentModel>(
    doc: &mut D,
    placements: &[PlacementRequest],
    signer: &dyn DetachedSigner,
    stamp: Option<&StampImage>,
    options: &SignOptions,
) -> Result<SignedDocument> {
    options.validate()?;
    let ordered = order_placements(placements)?;
    let policy = options.bounds_policy();

    let target_rect = resolve_rect(&*doc, ordered.target, options)?;
    let decorative = ordered
        .decorative
        .iter()
        .map(|p| Ok((p.page, resolve_rect(&*doc, p, options)?)))
        .collect::<Result<Vec<_>>>()?;
    log::debug!(
        "Signing target on page {}, {} decorative stamp(s), bounds policy {:?}",
        ordered.target.page,
        decorative.len(),
        policy
    );

    let signed_at: DateTime<FixedOffset> = Local::now().fixed_offset();
    let signer_name = options.signer_name.clone().or_else(|| signer.signer_name());
    let caption = Caption::for_signature(
        signer_name.as_deref(),
        signed_at,
        options.reason.as_deref(),
        options.location.as_deref(),
    );
    let content = StampContent {
        image: stamp,
        caption: &caption,
        style: &options.stamp,
    };

    for (page, rect) in &decorative {
        doc.draw_stamp(*page, rect, content)?;
    }

    // Re-read the live field list: earlier steps may have changed the document
    let existing = doc.signature_fields()?;
    let names = doc.field_names()?;
    let field_name = next_signature_field_name(existing.len(), &names)?;

    doc.add_signature_field(SignatureFieldSpec {
        page: ordered.target.page,
        rect: target_rect,
        name: field_name.clone(),
        appearance: Some(content),
        signature: Some(SignatureValue {
            signer_name,
            reason: options.reason.clone(),
            location: options.location.clone(),
            contact_info: options.contact_info.clone(),
            signed_at,
            reserve_bytes: options.signature_reserve_bytes,
        }),
    })?;

    let update = doc.write_incremental()?;
    let bytes = finish_signature(update, signer)?;

    log::info!(
        "Signed field '{}' on page {} with {} decorative stamp(s)",
        field_name,
        ordered.target.page,
        decorative.len()
    );

    Ok(SignedDocument {
        bytes,
        field_name,
        decorative_stamps: decorative.len(),
    })
}

fn resolve_rect<D: DocumentModel>(
    doc: &D,
    placement: &PlacementRequest,
    options: &SignOptions,
) -> Result<DocumentSpaceRect> {
    let page_box = doc.page_box(placement.page)?;
    to_document_space(placement, &page_box, options.bounds_policy())
}

/// Sign PDF bytes with an unlocked identity (blocking).
pub fn sign_blocking(
    document: Vec<u8>,
    placements: &[PlacementRequest],
    identity: &SigningIdentity,
    stamp: Option<&[u8]>,
    options: &SignOptions,
) -> Result<SignedDocument> {
    if placements.is_empty() {
        return Err(InvalidInput::EmptyPlacementList.into());
    }

    let stamp = stamp.map(StampImage::decode).transpose()?;
    let mut doc = PdfDocument::open(document)?;
    sign_document(&mut doc, placements, identity, stamp.as_ref(), options)
}

/// Sign PDF bytes with an unlocked identity on the blocking thread pool.
///
/// The identity is dropped when the call completes.
pub async fn sign(
    document: Vec<u8>,
    placements: Vec<PlacementRequest>,
    identity: SigningIdentity,
    stamp: Option<Vec<u8>>,
    options: SignOptions,
) -> Result<SignedDocument> {
    tokio::task::spawn_blocking(move || {
        sign_blocking(document, &placements, &identity, stamp.as_deref(), &options)
    })
    .await?
}

/// Unlock a PKCS#12 container and sign (blocking).
pub fn sign_with_credentials_blocking(
    document: Vec<u8>,
    placements: &[PlacementRequest],
    certificate: &[u8],
    password: &str,
    stamp: Option<&[u8]>,
    options: &SignOptions,
) -> Result<SignedDocument> {
    if placements.is_empty() {
        return Err(InvalidInput::EmptyPlacementList.into());
    }

    let identity = load_pkcs12(certificate, password)?;
    sign_blocking(document, placements, &identity, stamp, options)
}

/// Unlock a PKCS#12 container and sign, on the blocking thread pool.
pub async fn sign_with_credentials(
    document: Vec<u8>,
    placements: Vec<PlacementRequest>,
    certificate: Vec<u8>,
    password: String,
    stamp: Option<Vec<u8>>,
    options: SignOptions,
) -> Result<SignedDocument> {
    tokio::task::spawn_blocking(move || {
        sign_with_credentials_blocking(
            document,
            &placements,
            &certificate,
            &password,
            stamp.as_deref(),
            &options,
        )
    })
    .await?
}

/// Add one empty, printable signature field per placement (blocking).
///
/// Fields are named by the placement's `field_name`, or `Signature{n}` when
/// absent. All fields go into a single appended revision.
pub fn add_placeholders_blocking(
    document: Vec<u8>,
    placements: &[PlacementRequest],
    options: &SignOptions,
) -> Result<PreparedDocument> {
    options.validate()?;
    if placements.is_empty() {
        return Err(InvalidInput::EmptyPlacementList.into());
    }

    let mut doc = PdfDocument::open(document)?;
    let rects = placements
        .iter()
        .map(|p| resolve_rect(&doc, p, options))
        .collect::<Result<Vec<_>>>()?;

    let mut names = doc.field_names()?;
    let mut signature_count = doc.signature_fields()?.len();
    let mut created = Vec::with_capacity(placements.len());

    for (placement, rect) in placements.iter().zip(rects) {
        let name = match &placement.field_name {
            Some(name) => {
                ensure_unused(name, &names)?;
                name.clone()
            }
            None => next_signature_field_name(signature_count, &names)?,
        };

        doc.add_signature_field(SignatureFieldSpec {
            page: placement.page,
            rect,
            name: name.clone(),
            appearance: None,
            signature: None,
        })?;

        names.push(name.clone());
        created.push(name);
        signature_count += 1;
    }

    let update = doc.write_incremental()?;
    log::info!("Added {} signature placeholder(s)", created.len());

    Ok(PreparedDocument {
        bytes: update.bytes,
        field_names: created,
    })
}

/// Add empty signature fields on the blocking thread pool.
pub async fn add_placeholders(
    document: Vec<u8>,
    placements: Vec<PlacementRequest>,
    options: SignOptions,
) -> Result<PreparedDocument> {
    tokio::task::spawn_blocking(move || add_placeholders_blocking(document, &placements, &options))
        .await?
}

/// Signature fields present in a PDF
pub fn list_signature_fields(document: Vec<u8>) -> Result<Vec<SignatureFieldInfo>> {
    let doc = PdfDocument::open(document)?;
    doc.signature_fields()
}
