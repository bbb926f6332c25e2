//! Interactive form field enumeration

use crate::constants::MAX_TREE_DEPTH;
use crate::types::{EngineError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

/// A form field found in the AcroForm field tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Fully qualified name (`parent.child`)
    pub name: String,
    /// Field type (`Sig`, `Tx`, ...), inherited from ancestors when absent
    pub field_type: Option<String>,
    /// Whether /V holds a value
    pub has_value: bool,
}

impl FieldInfo {
    pub fn is_signature(&self) -> bool {
        self.field_type.as_deref() == Some("Sig")
    }
}

/// Follow references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id)?,
            other => return Ok(other),
        }
    }
    Err(EngineError::DocumentStructure(
        "reference chain too long".to_string(),
    ))
}

/// The document catalog's AcroForm dictionary, if any
pub(crate) fn acroform(doc: &Document) -> Result<Option<&Dictionary>> {
    let catalog = doc.catalog()?;
    match catalog.get(b"AcroForm") {
        Ok(obj) => Ok(resolve(doc, obj)?.as_dict().ok()),
        Err(_) => Ok(None),
    }
}

/// Every named node of the field tree, depth first in document order.
pub fn collect_fields(doc: &Document) -> Result<Vec<FieldInfo>> {
    let mut fields = Vec::new();
    let Some(form) = acroform(doc)? else {
        return Ok(fields);
    };
    let Ok(roots) = form.get(b"Fields") else {
        return Ok(fields);
    };
    let Object::Array(roots) = resolve(doc, roots)? else {
        return Ok(fields);
    };

    let mut visited = HashSet::new();
    for root in roots {
        walk(doc, root, "", None, 0, &mut visited, &mut fields)?;
    }
    Ok(fields)
}

fn walk(
    doc: &Document,
    node: &Object,
    parent_name: &str,
    parent_type: Option<&str>,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    fields: &mut Vec<FieldInfo>,
) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        log::warn!("Field tree deeper than {} levels, stopping", MAX_TREE_DEPTH);
        return Ok(());
    }
    if let Object::Reference(id) = node {
        if !visited.insert(*id) {
            return Ok(());
        }
    }
    let Ok(dict) = resolve(doc, node)?.as_dict() else {
        return Ok(());
    };

    let partial = dict.get(b"T").ok().and_then(|t| match t {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    });
    let name = match &partial {
        Some(partial) if parent_name.is_empty() => partial.clone(),
        Some(partial) => format!("{}.{}", parent_name, partial),
        None => parent_name.to_string(),
    };

    let own_type = dict.get(b"FT").ok().and_then(|ft| match ft {
        Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
        _ => None,
    });
    let field_type = own_type.as_deref().or(parent_type);

    // Widgets without /T are parts of their parent field, not fields themselves
    if partial.is_some() {
        let has_value = dict
            .get(b"V")
            .ok()
            .is_some_and(|v| !matches!(v, Object::Null));
        fields.push(FieldInfo {
            name: name.clone(),
            field_type: field_type.map(str::to_string),
            has_value,
        });
    }

    if let Ok(kids) = dict.get(b"Kids") {
        if let Object::Array(kids) = resolve(doc, kids)? {
            for kid in kids {
                walk(doc, kid, &name, field_type, depth + 1, visited, fields)?;
            }
        }
    }

    Ok(())
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
