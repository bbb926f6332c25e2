//! Signature field naming

use crate::constants::SIGNATURE_FIELD_PREFIX;
use crate::types::{EngineError, Result};

/// Name for the next signature field: `Signature{count + 1}`.
///
/// `existing_names` must come from the live document, queried right before
/// the field is created. A clash with any existing field name is an error
/// rather than a reason to pick another number.
pub fn next_signature_field_name<S: AsRef<str>>(
    existing_signature_count: usize,
    existing_names: &[S],
) -> Result<String> {
    let name = format!("{}{}", SIGNATURE_FIELD_PREFIX, existing_signature_count + 1);
    ensure_unused(&name, existing_names)?;
    Ok(name)
}

/// Fail with `NameCollision` when `name` is already taken.
pub fn ensure_unused<S: AsRef<str>>(name: &str, existing_names: &[S]) -> Result<()> {
    if existing_names.iter().any(|n| n.as_ref() == name) {
        return Err(EngineError::NameCollision(format!(
            "a field named '{}' already exists",
            name
        )));
    }
    Ok(())
}
