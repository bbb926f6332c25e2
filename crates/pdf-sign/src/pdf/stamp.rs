//! Appearance XObjects for stamps and signature widgets

use super::StampContent;
use crate::appearance::{StampImage, compose_stamp};
use crate::constants::{STAMP_FONT_RESOURCE, STAMP_IMAGE_RESOURCE};
use crate::types::{EngineError, Result};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

/// Add an Image XObject (with a soft mask for transparent images).
///
/// Returns the ids of every object created, image first.
pub(crate) fn add_image_xobject(doc: &mut Document, image: &StampImage) -> Result<Vec<ObjectId>> {
    let mut created = Vec::with_capacity(2);

    let smask = match &image.alpha {
        Some(alpha) => {
            let mut dict = image_dict(image, b"DeviceGray");
            dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            let id = doc.add_object(Stream::new(dict, deflate(alpha)?));
            created.push(id);
            Some(id)
        }
        None => None,
    };

    let mut dict = image_dict(image, b"DeviceRGB");
    dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    if let Some(smask) = smask {
        dict.set("SMask", Object::Reference(smask));
    }
    let image_id = doc.add_object(Stream::new(dict, deflate(&image.rgb)?));
    created.insert(0, image_id);

    Ok(created)
}

fn image_dict(image: &StampImage, color_space: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(image.size.width as i64));
    dict.set("Height", Object::Integer(image.size.height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Standard 14 Helvetica with WinAnsi encoding
pub(crate) fn helvetica() -> Dictionary {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    font
}

/// Form XObject drawing `content` into `[0 0 width height]`.
///
/// `image` and `font` are the already embedded resources the stream refers to.
pub(crate) fn appearance_form(
    width: f32,
    height: f32,
    content: &StampContent<'_>,
    image: Option<ObjectId>,
    font: ObjectId,
) -> Result<Stream> {
    let image_size = match (content.image, image) {
        (Some(img), Some(_)) => Some(img.size),
        (None, None) => None,
        _ => {
            return Err(EngineError::AppearanceRender(
                "stamp image was not embedded".to_string(),
            ));
        }
    };

    let ops = compose_stamp(width, height, image_size, content.caption, content.style)?;

    let mut resources = Dictionary::new();
    if let Some(image) = image {
        let mut xobjects = Dictionary::new();
        xobjects.set(STAMP_IMAGE_RESOURCE, Object::Reference(image));
        resources.set("XObject", Object::Dictionary(xobjects));
    }
    let mut fonts = Dictionary::new();
    fonts.set(STAMP_FONT_RESOURCE, Object::Reference(font));
    resources.set("Font", Object::Dictionary(fonts));
    resources.set(
        "ProcSet",
        Object::Array(vec![
            Object::Name(b"PDF".to_vec()),
            Object::Name(b"Text".to_vec()),
            Object::Name(b"ImageC".to_vec()),
        ]),
    );

    let mut dict = form_dict(width, height);
    dict.set("Resources", Object::Dictionary(resources));
    Ok(Stream::new(dict, ops.into_bytes()))
}

/// Form XObject with no content, for unsigned placeholder widgets
pub(crate) fn blank_form(width: f32, height: f32) -> Stream {
    Stream::new(form_dict(width, height), Vec::new())
}

fn form_dict(width: f32, height: f32) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Form".to_vec()));
    dict.set("FormType", Object::Integer(1));
    dict.set(
        "BBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width),
            Object::Real(height),
        ]),
    );
    dict
}

/// Content stream pieces that wrap existing page content and invoke the stamp
pub(crate) fn page_wrappers(xobject_name: &str, x: f32, y: f32) -> (Vec<u8>, Vec<u8>) {
    let before = b"q\n".to_vec();
    let after = format!("Q\nq 1 0 0 1 {} {} cm /{} Do Q\n", x, y, xobject_name).into_bytes();
    (before, after)
}
