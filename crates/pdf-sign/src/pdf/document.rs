use super::fields::{acroform, collect_fields, resolve};
use super::stamp::{add_image_xobject, appearance_form, blank_form, helvetica, page_wrappers};
use super::writer::Revision;
use super::{
    DocumentModel, IncrementalUpdate, SignatureFieldSpec, SignatureValue, StampContent,
};
use crate::appearance::{StampImage, encode_text_string};
use crate::constants::*;
use crate::types::*;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// A parsed PDF opened for incremental modification
pub struct PdfDocument {
    source: Vec<u8>,
    doc: Document,
    /// Page object ids, index 0 is page 1
    pages: Vec<ObjectId>,
    /// Objects changed or created since opening
    dirty: BTreeSet<ObjectId>,
    signature: Option<(ObjectId, SignatureValue)>,
    font: Option<ObjectId>,
    images: Vec<(u64, ObjectId)>,
}

impl PdfDocument {
    /// Parse `bytes` as a PDF.
    ///
    /// Input that is not a PDF, is truncated, is encrypted (even with an empty
    /// user password), or has no pages fails with `DocumentStructure`.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let header_window = &bytes[..bytes.len().min(1024)];
        if !header_window.windows(5).any(|w| w == b"%PDF-") {
            return Err(EngineError::DocumentStructure(
                "input is not a PDF document".to_string(),
            ));
        }

        let mut doc = Document::load_mem(&bytes)
            .map_err(|e| EngineError::DocumentStructure(format!("failed to parse PDF: {}", e)))?;

        // lopdf decrypts empty-user-password files while loading and drops /Encrypt
        if doc.is_encrypted() || doc.encryption_state.is_some() {
            return Err(EngineError::DocumentStructure(
                "encrypted documents are not supported".to_string(),
            ));
        }

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(EngineError::DocumentStructure(
                "document has no pages".to_string(),
            ));
        }

        let prev_size = doc
            .trailer
            .get(b"Size")
            .and_then(|s| s.as_i64())
            .ok()
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(doc.max_id + 1);
        // New objects must not reuse ids that the previous xref declared
        doc.max_id = doc.max_id.max(prev_size.saturating_sub(1));

        log::debug!(
            "Opened PDF {} with {} pages ({} bytes, previous xref at {})",
            doc.version,
            pages.len(),
            bytes.len(),
            doc.xref_start
        );

        Ok(Self {
            source: bytes,
            doc,
            pages,
            dirty: BTreeSet::new(),
            signature: None,
            font: None,
            images: Vec::new(),
        })
    }

    /// Underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.doc
    }

    /// Bytes the document was opened from
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let index = (page as usize).checked_sub(1);
        index
            .and_then(|i| self.pages.get(i))
            .copied()
            .ok_or_else(|| {
                InvalidInput::PageOutOfRange {
                    page,
                    page_count: self.page_count(),
                }
                .into()
            })
    }

    fn add(&mut self, obj: impl Into<Object>) -> ObjectId {
        let id = self.doc.add_object(obj);
        self.dirty.insert(id);
        id
    }

    fn replace(&mut self, id: ObjectId, obj: impl Into<Object>) {
        self.doc.objects.insert(id, obj.into());
        self.dirty.insert(id);
    }

    fn dictionary(&self, id: ObjectId) -> Result<Dictionary> {
        Ok(self.doc.get_dictionary(id)?.clone())
    }

    /// Look up a page attribute, following /Parent for inheritable keys
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
        let mut node = page_id;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.doc.get_dictionary(node)?;
            if let Ok(value) = dict.get(key) {
                return Ok(Some(resolve(&self.doc, value)?.clone()));
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => node = *parent,
                _ => return Ok(None),
            }
        }
        Ok(None)
    }

    fn font_id(&mut self) -> ObjectId {
        match self.font {
            Some(id) => id,
            None => {
                let id = self.add(helvetica());
                self.font = Some(id);
                id
            }
        }
    }

    /// Embed an image once per document, reusing it for later stamps
    fn image_id(&mut self, image: &StampImage) -> Result<ObjectId> {
        let mut hasher = DefaultHasher::new();
        image.size.width.hash(&mut hasher);
        image.size.height.hash(&mut hasher);
        image.rgb.hash(&mut hasher);
        image.alpha.hash(&mut hasher);
        let key = hasher.finish();

        if let Some((_, id)) = self.images.iter().find(|(k, _)| *k == key) {
            return Ok(*id);
        }

        let ids = add_image_xobject(&mut self.doc, image)?;
        self.dirty.extend(ids.iter().copied());
        let id = ids[0];
        self.images.push((key, id));
        Ok(id)
    }

    fn build_appearance(
        &mut self,
        width: f32,
        height: f32,
        content: &StampContent<'_>,
    ) -> Result<ObjectId> {
        let image = match content.image {
            Some(image) => Some(self.image_id(image)?),
            None => None,
        };
        let font = self.font_id();
        let form = appearance_form(width, height, content, image, font)?;
        Ok(self.add(form))
    }

    /// Register `form` in the page's XObject resources under a fresh name.
    ///
    /// Resources that are shared or inherited are copied into the page.
    fn register_xobject(&mut self, page_id: ObjectId, form: ObjectId) -> Result<(Dictionary, String)> {
        let mut page = self.dictionary(page_id)?;

        let mut resources = match self.inherited(page_id, b"Resources")? {
            Some(Object::Dictionary(dict)) => dict,
            _ => Dictionary::new(),
        };
        let mut xobjects = match resources.get(b"XObject") {
            Ok(obj) => resolve(&self.doc, obj)?.as_dict().cloned().unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };

        let mut counter = 1;
        let name = loop {
            let candidate = format!("{}{}", STAMP_XOBJECT_PREFIX, counter);
            if !xobjects.has(candidate.as_bytes()) {
                break candidate;
            }
            counter += 1;
        };

        xobjects.set(name.as_bytes().to_vec(), Object::Reference(form));
        resources.set("XObject", Object::Dictionary(xobjects));
        page.set("Resources", Object::Dictionary(resources));
        Ok((page, name))
    }

    /// Existing /Contents as a list of stream references
    fn content_refs(&self, page: &Dictionary) -> Result<Vec<Object>> {
        let Ok(contents) = page.get(b"Contents") else {
            return Ok(Vec::new());
        };
        let refs = match contents {
            Object::Reference(id) => match self.doc.get_object(*id)? {
                Object::Array(items) => items.clone(),
                _ => vec![contents.clone()],
            },
            Object::Array(items) => items.clone(),
            _ => {
                return Err(EngineError::DocumentStructure(
                    "page /Contents is neither a stream nor an array".to_string(),
                ));
            }
        };
        Ok(refs)
    }

    /// Append a widget reference to the page's /Annots
    fn append_annotation(&mut self, page_id: ObjectId, widget: ObjectId) -> Result<()> {
        let mut page = self.dictionary(page_id)?;
        match page.get(b"Annots") {
            Ok(Object::Reference(array_id)) => {
                let array_id = *array_id;
                let mut annots = self.doc.get_object(array_id)?.as_array()?.clone();
                annots.push(Object::Reference(widget));
                self.replace(array_id, annots);
                return Ok(());
            }
            Ok(Object::Array(existing)) => {
                let mut annots = existing.clone();
                annots.push(Object::Reference(widget));
                page.set("Annots", annots);
            }
            _ => page.set("Annots", vec![Object::Reference(widget)]),
        }
        self.replace(page_id, page);
        Ok(())
    }

    /// Add a field to the AcroForm /Fields, creating the AcroForm when missing
    fn register_field(&mut self, widget: ObjectId, signed: bool) -> Result<()> {
        let root_id = self
            .doc
            .trailer
            .get(b"Root")
            .and_then(|r| r.as_reference())
            .map_err(|_| EngineError::DocumentStructure("trailer has no /Root".to_string()))?;
        let mut catalog = self.dictionary(root_id)?;

        enum Location {
            Indirect(ObjectId),
            Inline,
            Missing,
        }
        let location = match catalog.get(b"AcroForm") {
            Ok(Object::Reference(id)) => Location::Indirect(*id),
            Ok(Object::Dictionary(_)) => Location::Inline,
            _ => Location::Missing,
        };

        let mut form = match location {
            Location::Indirect(id) => self.dictionary(id)?,
            Location::Inline => acroform(&self.doc)?.cloned().unwrap_or_default(),
            Location::Missing => Dictionary::new(),
        };

        match form.get(b"Fields") {
            Ok(Object::Reference(fields_id)) => {
                let fields_id = *fields_id;
                let mut fields = self.doc.get_object(fields_id)?.as_array()?.clone();
                fields.push(Object::Reference(widget));
                self.replace(fields_id, fields);
            }
            Ok(Object::Array(existing)) => {
                let mut fields = existing.clone();
                fields.push(Object::Reference(widget));
                form.set("Fields", fields);
            }
            _ => form.set("Fields", vec![Object::Reference(widget)]),
        }

        if signed {
            let flags = form
                .get(b"SigFlags")
                .and_then(|f| f.as_i64())
                .unwrap_or(0);
            form.set("SigFlags", Object::Integer(flags | SIG_FLAGS_SIGNED));
        }

        match location {
            Location::Indirect(id) => self.replace(id, form),
            Location::Inline => {
                catalog.set("AcroForm", form);
                self.replace(root_id, catalog);
            }
            Location::Missing => {
                let form_id = self.add(form);
                catalog.set("AcroForm", Object::Reference(form_id));
                self.replace(root_id, catalog);
            }
        }
        Ok(())
    }
}

impl DocumentModel for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_box(&self, page: u32) -> Result<PageBox> {
        let page_id = self.page_id(page)?;

        let numbers: Option<Vec<f32>> = match self.inherited(page_id, b"MediaBox")? {
            Some(Object::Array(items)) if items.len() == 4 => items
                .iter()
                .map(|item| resolve(&self.doc, item).ok().and_then(extract_number))
                .collect(),
            _ => None,
        };

        match numbers {
            Some(n) => {
                let (llx, urx) = (n[0].min(n[2]), n[0].max(n[2]));
                let (lly, ury) = (n[1].min(n[3]), n[1].max(n[3]));
                Ok(PageBox::new(llx, lly, urx - llx, ury - lly))
            }
            None => {
                log::warn!("Page {} has no usable MediaBox, assuming US Letter", page);
                Ok(PageBox::letter())
            }
        }
    }

    fn signature_fields(&self) -> Result<Vec<SignatureFieldInfo>> {
        Ok(collect_fields(&self.doc)?
            .into_iter()
            .filter(|f| f.is_signature())
            .map(|f| SignatureFieldInfo {
                name: f.name,
                signed: f.has_value,
            })
            .collect())
    }

    fn field_names(&self) -> Result<Vec<String>> {
        Ok(collect_fields(&self.doc)?
            .into_iter()
            .map(|f| f.name)
            .collect())
    }

    fn draw_stamp(
        &mut self,
        page: u32,
        rect: &DocumentSpaceRect,
        stamp: StampContent<'_>,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let form = self.build_appearance(rect.width, rect.height, &stamp)?;
        let (mut page_dict, name) = self.register_xobject(page_id, form)?;

        let (before, after) = page_wrappers(&name, rect.x, rect.y);
        let before_id = self.add(Stream::new(Dictionary::new(), before));
        let after_id = self.add(Stream::new(Dictionary::new(), after));

        let mut contents = vec![Object::Reference(before_id)];
        contents.extend(self.content_refs(&page_dict)?);
        contents.push(Object::Reference(after_id));
        page_dict.set("Contents", contents);

        self.replace(page_id, page_dict);
        log::debug!(
            "Drew stamp /{} on page {} at ({}, {})",
            name,
            page,
            rect.x,
            rect.y
        );
        Ok(())
    }

    fn add_signature_field(&mut self, field: SignatureFieldSpec<'_>) -> Result<()> {
        let page_id = self.page_id(field.page)?;
        let rect = field.rect;

        let appearance = match &field.appearance {
            Some(content) => self.build_appearance(rect.width, rect.height, content)?,
            None => self.add(blank_form(rect.width, rect.height)),
        };

        let mut widget = Dictionary::new();
        widget.set("Type", Object::Name(b"Annot".to_vec()));
        widget.set("Subtype", Object::Name(b"Widget".to_vec()));
        widget.set("FT", Object::Name(b"Sig".to_vec()));
        widget.set(
            "T",
            Object::String(encode_text_string(&field.name), StringFormat::Literal),
        );
        widget.set("F", Object::Integer(ANNOTATION_FLAG_PRINT));
        widget.set(
            "Rect",
            Object::Array(vec![
                Object::Real(rect.x),
                Object::Real(rect.y),
                Object::Real(rect.right()),
                Object::Real(rect.top()),
            ]),
        );
        widget.set("P", Object::Reference(page_id));
        let mut ap = Dictionary::new();
        ap.set("N", Object::Reference(appearance));
        widget.set("AP", Object::Dictionary(ap));

        let signed = field.signature.is_some();
        if let Some(value) = field.signature {
            if self.signature.is_some() {
                return Err(EngineError::SigningFailure(
                    "a signature value is already reserved in this revision".to_string(),
                ));
            }
            let sig_id = self.doc.new_object_id();
            widget.set("V", Object::Reference(sig_id));
            self.signature = Some((sig_id, value));
        }

        let widget_id = self.add(widget);
        self.append_annotation(page_id, widget_id)?;
        self.register_field(widget_id, signed)?;

        log::debug!(
            "Added signature field '{}' on page {} (signed: {})",
            field.name,
            field.page,
            signed
        );
        Ok(())
    }

    fn write_incremental(&self) -> Result<IncrementalUpdate> {
        let mut objects = BTreeMap::new();
        for id in &self.dirty {
            let obj = self.doc.get_object(*id)?;
            objects.insert(*id, obj);
        }

        let revision = Revision {
            source: &self.source,
            base: &self.doc,
            objects,
            signature: self.signature.as_ref().map(|(id, value)| (*id, value)),
        };

        let (bytes, placeholder) = revision.write()?;
        log::debug!(
            "Wrote incremental update: {} object(s), {} -> {} bytes",
            self.dirty.len() + usize::from(self.signature.is_some()),
            self.source.len(),
            bytes.len()
        );
        Ok(IncrementalUpdate { bytes, placeholder })
    }
}

/// Extract numeric value from a PDF object
fn extract_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
