use chrono::{DateTime, FixedOffset};

/// Lines of text shown in the right half of a stamp
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caption {
    pub lines: Vec<String>,
}

impl Caption {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Standard signature description: signer, date, reason, location.
    ///
    /// Absent parts are left out.
    pub fn for_signature(
        signer: Option<&str>,
        signed_at: DateTime<FixedOffset>,
        reason: Option<&str>,
        location: Option<&str>,
    ) -> Self {
        let mut lines = Vec::with_capacity(4);
        if let Some(name) = signer {
            lines.push(format!("Digitally signed by {}", name));
        }
        lines.push(format!("Date: {}", signed_at.format("%Y.%m.%d %H:%M:%S %:z")));
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            lines.push(format!("Reason: {}", reason));
        }
        if let Some(location) = location.filter(|l| !l.is_empty()) {
            lines.push(format!("Location: {}", location));
        }
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Escape text for a literal string in a content stream.
///
/// Characters outside WinAnsi (approximated by Latin-1) become `?`;
/// non-ASCII bytes are written as octal escapes so the result stays ASCII.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c if (c as u32) >= 0xA0 && (c as u32) <= 0xFF => {
                out.push_str(&format!("\\{:03o}", c as u32));
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Encode a text string for a dictionary value (/T, /Reason, ...).
///
/// ASCII stays as-is; anything else is written as UTF-16BE with a BOM.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
