#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::xref::XrefType;
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
    Stream, StringFormat,
};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509NameBuilder};
use std::io::Cursor;

pub const PASSWORD: &str = "correct horse";

pub fn create_test_pdf(num_pages: usize) -> Vec<u8> {
    save(&mut build_test_document(num_pages))
}

/// Same layout, indexed by a cross-reference stream instead of a table
pub fn create_xref_stream_pdf(num_pages: usize) -> Vec<u8> {
    let mut doc = build_test_document(num_pages);
    doc.reference_table.cross_reference_type = XrefType::CrossReferenceStream;
    save(&mut doc)
}

/// Encrypted with an owner password only, so any reader can open it
pub fn create_owner_encrypted_pdf(num_pages: usize) -> Vec<u8> {
    let mut doc = build_test_document(num_pages);
    let file_id = Object::String(b"0123456789abcdef".to_vec(), StringFormat::Hexadecimal);
    doc.trailer
        .set("ID", Object::Array(vec![file_id.clone(), file_id]));

    let state = EncryptionState::try_from(EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password: "",
        key_length: 128,
        permissions: Permissions::PRINTABLE,
    })
    .unwrap();
    doc.encrypt(&state).unwrap();
    save(&mut doc)
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn build_test_document(num_pages: usize) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    // MediaBox lives on the page tree root and is inherited by every page
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));

    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn create_pkcs12(common_name: &str, password: &str) -> Vec<u8> {
    let rsa = Rsa::generate(2048).unwrap();
    let key = PKey::from_rsa(rsa).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    let cert = builder.build();

    Pkcs12::builder()
        .name(common_name)
        .pkey(&key)
        .cert(&cert)
        .build2(password)
        .unwrap()
        .to_der()
        .unwrap()
}

pub fn create_stamp_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(32, 16, |x, _| {
        if x < 16 {
            Rgba([0, 60, 160, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// A signature dictionary found in a signed file
pub struct FoundSignature {
    pub byte_range: Vec<usize>,
    pub contents: Vec<u8>,
    pub dict: Dictionary,
}

/// Every /Type /Sig dictionary in the document, ordered by object id
pub fn find_signatures(bytes: &[u8]) -> Vec<FoundSignature> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut found = Vec::new();
    for object in doc.objects.values() {
        let Ok(dict) = object.as_dict() else {
            continue;
        };
        if dict.get(b"Type").ok() != Some(&Object::Name(b"Sig".to_vec())) {
            continue;
        }
        let byte_range = dict
            .get(b"ByteRange")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n.as_i64().unwrap() as usize)
            .collect();
        let contents = match dict.get(b"Contents").unwrap() {
            Object::String(bytes, _) => bytes.clone(),
            other => panic!("unexpected /Contents {:?}", other),
        };
        found.push(FoundSignature {
            byte_range,
            contents,
            dict: dict.clone(),
        });
    }
    found
}

/// Length of the DER element at the start of `bytes`
fn der_length(bytes: &[u8]) -> usize {
    let first = bytes[1] as usize;
    if first & 0x80 == 0 {
        return 2 + first;
    }
    let count = first & 0x7F;
    let len = bytes[2..2 + count]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    2 + count + len
}

/// Check a signature's PKCS#7 blob against the bytes its /ByteRange covers
pub fn verify_signature(file: &[u8], signature: &FoundSignature) -> bool {
    let range = &signature.byte_range;
    assert_eq!(range.len(), 4);
    let mut covered = file[range[0]..range[0] + range[1]].to_vec();
    covered.extend_from_slice(&file[range[2]..range[2] + range[3]]);

    let der = &signature.contents[..der_length(&signature.contents)];
    let pkcs7 = Pkcs7::from_der(der).unwrap();
    let store = X509StoreBuilder::new().unwrap().build();
    pkcs7
        .verify(
            &Stack::<X509>::new().unwrap(),
            &store,
            Some(covered.as_slice()),
            None,
            Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
        )
        .is_ok()
}

/// Page object id of a 1-based page number
pub fn page_id(doc: &Document, page: u32) -> ObjectId {
    doc.get_pages()[&page]
}

/// The widget annotation of a named field
pub fn field_widget<'a>(doc: &'a Document, name: &str) -> &'a Dictionary {
    doc.objects
        .values()
        .filter_map(|o| o.as_dict().ok())
        .find(|d| {
            d.get(b"FT").ok() == Some(&Object::Name(b"Sig".to_vec()))
                && matches!(d.get(b"T"), Ok(Object::String(t, _)) if t == name.as_bytes())
        })
        .unwrap_or_else(|| panic!("no field named {}", name))
}

/// Names of the XObjects a page can draw
pub fn page_xobject_names(doc: &Document, page: u32) -> Vec<String> {
    let page = doc.get_dictionary(page_id(doc, page)).unwrap();
    let Ok(resources) = page.get(b"Resources").and_then(|r| r.as_dict()) else {
        return Vec::new();
    };
    let Ok(xobjects) = resources.get(b"XObject").and_then(|x| x.as_dict()) else {
        return Vec::new();
    };
    xobjects
        .iter()
        .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
        .collect()
}
