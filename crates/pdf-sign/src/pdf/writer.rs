//! Incremental-update writing
//!
//! lopdf appends the revision: every changed or new object, then an xref
//! section in the style of the source (table or stream) whose trailer points
//! back through /Prev. When signing, the revision also carries a /Sig
//! dictionary written with fixed-width placeholders:
//!
//! ```text
//! /ByteRange[0 9999999999 9999999999 9999999999]  (patched in place)
//! /Contents<0000 ... 0000>                        (receives the CMS blob)
//! ```

use super::{SignaturePlaceholder, SignatureValue};
use crate::appearance::encode_text_string;
use crate::constants::BYTE_RANGE_DIGITS;
use crate::types::{EngineError, Result};
use chrono::{DateTime, FixedOffset};
use lopdf::{Dictionary, Document, IncrementalDocument, Object, ObjectId, StringFormat};
use std::collections::BTreeMap;

/// Trailer keys that describe the previous cross-reference section only
const SECTION_KEYS: [&[u8]; 9] = [
    b"Prev",
    b"XRefStm",
    b"Type",
    b"W",
    b"Index",
    b"Length",
    b"Filter",
    b"DecodeParms",
    b"DL",
];

/// Uppercase hex without separators
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

/// PDF date string, e.g. `D:20240305123045+02'00'`
pub fn pdf_date(at: &DateTime<FixedOffset>) -> String {
    let offset = at.offset().local_minus_utc();
    let sign = if offset < 0 { '-' } else { '+' };
    let offset = offset.abs();
    format!(
        "D:{}{}{:02}'{:02}'",
        at.format("%Y%m%d%H%M%S"),
        sign,
        offset / 3600,
        (offset % 3600) / 60
    )
}

// =============================================================================
// Signature Dictionary
// =============================================================================

/// Largest value a /ByteRange slot can hold
fn byte_range_filler() -> i64 {
    10_i64.pow(BYTE_RANGE_DIGITS as u32) - 1
}

/// The /ByteRange array text as written before patching, without brackets
fn byte_range_placeholder() -> String {
    let filler = byte_range_filler();
    format!("0 {} {} {}", filler, filler, filler)
}

/// /Sig dictionary with /ByteRange and /Contents left as placeholders
pub(crate) fn signature_dictionary(value: &SignatureValue) -> Dictionary {
    let filler = byte_range_filler();
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"Sig".to_vec()));
    dict.set("Filter", Object::Name(b"Adobe.PPKLite".to_vec()));
    dict.set("SubFilter", Object::Name(b"adbe.pkcs7.detached".to_vec()));
    dict.set(
        "ByteRange",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(filler),
            Object::Integer(filler),
            Object::Integer(filler),
        ]),
    );
    dict.set(
        "Contents",
        Object::String(vec![0; value.reserve_bytes], StringFormat::Hexadecimal),
    );
    dict.set(
        "M",
        Object::String(pdf_date(&value.signed_at).into_bytes(), StringFormat::Literal),
    );

    let text_entries = [
        ("Name", &value.signer_name),
        ("Reason", &value.reason),
        ("Location", &value.location),
        ("ContactInfo", &value.contact_info),
    ];
    for (key, text) in text_entries {
        if let Some(text) = text {
            dict.set(
                key,
                Object::String(encode_text_string(text), StringFormat::Literal),
            );
        }
    }
    dict
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Find the placeholders of the /Sig dictionary written after `from`.
pub(crate) fn locate_placeholder(
    bytes: &[u8],
    from: usize,
    reserve_bytes: usize,
) -> Result<SignaturePlaceholder> {
    let missing = |what: &str| {
        EngineError::SigningFailure(format!("{} placeholder not found in the revision", what))
    };

    let range_text = byte_range_placeholder();
    let marker = format!("/ByteRange[{}]", range_text);
    let range_at = find(bytes, marker.as_bytes(), from).ok_or_else(|| missing("/ByteRange"))?;
    let byte_range_offset = range_at + "/ByteRange".len();

    let contents_len = reserve_bytes * 2 + 2;
    let mut search = from;
    let contents_offset = loop {
        let at = find(bytes, b"/Contents<", search).ok_or_else(|| missing("/Contents"))?;
        let start = at + "/Contents".len();
        let zeros = bytes.get(start + 1..start + contents_len - 1);
        let is_placeholder = zeros.is_some_and(|z| z.iter().all(|&b| b == b'0'))
            && bytes.get(start + contents_len - 1) == Some(&b'>');
        if is_placeholder {
            break start;
        }
        search = at + 1;
    };

    Ok(SignaturePlaceholder {
        byte_range_offset,
        byte_range_width: range_text.len(),
        contents_offset,
        contents_len,
    })
}

// =============================================================================
// Incremental Writer
// =============================================================================

/// Everything needed to append one revision
pub(crate) struct Revision<'a> {
    pub source: &'a [u8],
    /// Working document: supplies the trailer, the highest object id, the
    /// xref style and the previous xref offset
    pub base: &'a Document,
    /// Objects to append, keyed by id
    pub objects: BTreeMap<ObjectId, &'a Object>,
    /// Signature dictionary written with placeholders, if any
    pub signature: Option<(ObjectId, &'a SignatureValue)>,
}

impl Revision<'_> {
    pub(crate) fn write(&self) -> Result<(Vec<u8>, Option<SignaturePlaceholder>)> {
        if self.base.trailer.get(b"Root").is_err() {
            return Err(EngineError::DocumentStructure(
                "trailer has no /Root".to_string(),
            ));
        }

        let mut update = IncrementalDocument::create_from(self.source.to_vec(), self.previous());
        update.new_document.version = self.base.version.clone();

        for (&id, obj) in &self.objects {
            update.new_document.set_object(id, (*obj).clone());
        }
        if let Some((id, value)) = self.signature {
            if update.new_document.has_object(id) {
                return Err(EngineError::DocumentStructure(format!(
                    "object {} is scheduled twice",
                    id.0
                )));
            }
            update.new_document.set_object(id, signature_dictionary(value));
        }

        let mut bytes = Vec::with_capacity(self.source.len() + 4096);
        update.save_to(&mut bytes).map_err(|e| {
            EngineError::DocumentStructure(format!("failed to write revision: {}", e))
        })?;

        let placeholder = match self.signature {
            Some((_, value)) => Some(locate_placeholder(
                &bytes,
                self.source.len(),
                value.reserve_bytes,
            )?),
            None => None,
        };
        Ok((bytes, placeholder))
    }

    /// Object-free stand-in for the previous revision
    fn previous(&self) -> Document {
        let mut trailer = self.base.trailer.clone();
        for key in SECTION_KEYS {
            trailer.remove(key);
        }

        let mut prev = Document::new();
        prev.version = self.base.version.clone();
        prev.trailer = trailer;
        prev.reference_table.cross_reference_type = self.base.reference_table.cross_reference_type;
        prev.max_id = self.base.max_id;
        prev.xref_start = self.base.xref_start;
        prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lopdf::dictionary;
    use lopdf::xref::XrefType;

    fn source_document(xref: XrefType) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc.reference_table.cross_reference_type = xref;

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn sample_value(reserve_bytes: usize) -> SignatureValue {
        SignatureValue {
            signer_name: Some("Jane Roe".to_string()),
            reason: Some("Approved".to_string()),
            location: None,
            contact_info: None,
            signed_at: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .unwrap(),
            reserve_bytes,
        }
    }

    #[test]
    fn test_pdf_date() {
        let at = FixedOffset::west_opt(5 * 3600 + 30 * 60)
            .unwrap()
            .with_ymd_and_hms(2023, 12, 1, 8, 5, 9)
            .unwrap();
        assert_eq!(pdf_date(&at), "D:20231201080509-05'30'");
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x00, 0xAB, 0x7F]), "00AB7F");
        assert_eq!(hex_encode(&[]), "");
    }

    #[test]
    fn test_signature_dictionary_entries() {
        let dict = signature_dictionary(&sample_value(8));
        assert_eq!(dict.get(b"Type").unwrap(), &Object::Name(b"Sig".to_vec()));
        assert_eq!(
            dict.get(b"SubFilter").unwrap(),
            &Object::Name(b"adbe.pkcs7.detached".to_vec())
        );
        assert_eq!(
            dict.get(b"M").unwrap(),
            &Object::String(b"D:20240101000000+00'00'".to_vec(), StringFormat::Literal)
        );
        assert!(dict.get(b"Name").is_ok());
        assert!(dict.get(b"Location").is_err());
        match dict.get(b"Contents").unwrap() {
            Object::String(bytes, StringFormat::Hexadecimal) => assert_eq!(bytes.len(), 8),
            other => panic!("unexpected /Contents {:?}", other),
        }
    }

    #[test]
    fn test_revision_appends_and_chains() {
        let source = source_document(XrefType::CrossReferenceTable);
        let mut base = Document::load_mem(&source).unwrap();
        let prev_xref = base.xref_start;

        let sig_id = base.new_object_id();
        let annot = Object::Array(vec![Object::Reference(sig_id)]);
        let annot_id = base.new_object_id();
        let value = sample_value(8);

        let mut objects = BTreeMap::new();
        objects.insert(annot_id, &annot);
        let revision = Revision {
            source: &source,
            base: &base,
            objects,
            signature: Some((sig_id, &value)),
        };
        let (bytes, placeholder) = revision.write().unwrap();
        let placeholder = placeholder.unwrap();

        assert!(bytes.starts_with(&source));
        assert_eq!(bytes[placeholder.byte_range_offset], b'[');
        assert_eq!(
            bytes[placeholder.byte_range_offset + placeholder.byte_range_width + 1],
            b']'
        );
        assert_eq!(placeholder.contents_len, 18);
        assert_eq!(
            &bytes[placeholder.contents_offset..][..placeholder.contents_len],
            b"<0000000000000000>"
        );

        let text = String::from_utf8_lossy(&bytes[source.len()..]).into_owned();
        assert!(text.contains("xref\n"));
        assert!(text.contains(&format!("/Prev {}", prev_xref)));

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_object(annot_id).unwrap(), &annot);
        assert!(reloaded.get_dictionary(sig_id).is_ok());
        assert_eq!(reloaded.get_pages().len(), 1);
    }

    #[test]
    fn test_revision_follows_xref_stream_source() {
        let source = source_document(XrefType::CrossReferenceStream);
        let mut base = Document::load_mem(&source).unwrap();
        let extra = Object::Integer(5);
        let extra_id = base.new_object_id();

        let mut objects = BTreeMap::new();
        objects.insert(extra_id, &extra);
        let revision = Revision {
            source: &source,
            base: &base,
            objects,
            signature: None,
        };
        let (bytes, placeholder) = revision.write().unwrap();

        assert!(placeholder.is_none());
        let appended = String::from_utf8_lossy(&bytes[source.len()..]).into_owned();
        assert!(appended.contains("/Type/XRef"));
        assert!(!appended.contains("\ntrailer\n"));

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_object(extra_id).unwrap(), &extra);
    }

    #[test]
    fn test_locate_placeholder_ignores_earlier_bytes() {
        let mut bytes = b"/ByteRange[0 9999999999 9999999999 9999999999] /Contents<0000>".to_vec();
        let from = bytes.len();
        assert!(locate_placeholder(&bytes, from, 2).is_err());

        bytes.extend_from_slice(b"\n/Contents[3 0 R]/ByteRange[0 9999999999 9999999999 9999999999]");
        bytes.extend_from_slice(b"/Contents<0000>");
        let placeholder = locate_placeholder(&bytes, from, 2).unwrap();
        assert!(placeholder.byte_range_offset > from);
        assert_eq!(&bytes[placeholder.contents_offset..], b"<0000>");
        assert_eq!(placeholder.byte_range_width, 34);
    }
}
