//! Flat escaped-text codecs used for local persistence.
//!
//! Records are fields joined by `|`, record lists are joined by `\n`, and `\` escapes
//! any reserved character. Decoders never fail: malformed records are dropped and
//! missing input decodes to the empty/default value.

/// Delivery order snapshot codec
pub mod delivery;
/// Ratings and review aggregate codec
pub mod ratings;
/// Cart, promo, fee settings and string collection codec
pub mod safe;

pub(crate) const FIELD_SEP: char = '|';
pub(crate) const LINE_SEP: char = '\n';
pub(crate) const ESC: char = '\\';

/// Prefixes every character in `reserved` (and the escape char itself) with `\`.
#[must_use]
pub fn escape(raw: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch == ESC || reserved.contains(&ch) {
            out.push(ESC);
        }
        out.push(ch);
    }
    out
}

/// Reverses [`escape`]. A trailing lone `\` is kept as a literal backslash.
#[must_use]
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut escaping = false;
    for ch in raw.chars() {
        if escaping {
            out.push(ch);
            escaping = false;
        } else if ch == ESC {
            escaping = true;
        } else {
            out.push(ch);
        }
    }
    if escaping {
        out.push(ESC);
    }
    out
}

/// Splits on unescaped `sep`. Escape sequences are preserved in the pieces so that
/// nested separators survive until [`unescape`] is applied.
#[must_use]
pub fn split_escaped(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaping = false;

    for ch in input.chars() {
        if escaping {
            current.push(ch);
            escaping = false;
        } else if ch == ESC {
            current.push(ch);
            escaping = true;
        } else if ch == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }

    parts.push(current);
    parts
}

/// Byte index of the first unescaped `target`, if any.
#[must_use]
pub fn index_of_unescaped(input: &str, target: char) -> Option<usize> {
    let mut escaping = false;
    for (idx, ch) in input.char_indices() {
        if escaping {
            escaping = false;
        } else if ch == ESC {
            escaping = true;
        } else if ch == target {
            return Some(idx);
        }
    }
    None
}

/// Joins already-raw fields into a single escaped record.
pub(crate) fn join_fields<I, S>(fields: I, reserved: &[char]) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|field| escape(field.as_ref(), reserved))
        .collect::<Vec<_>>()
        .join(&FIELD_SEP.to_string())
}

/// Splits a record into unescaped fields.
pub(crate) fn split_fields(record: &str) -> Vec<String> {
    split_escaped(record, FIELD_SEP)
        .iter()
        .map(|part| unescape(part))
        .collect()
}

/// Non-blank records of a newline-delimited blob; escaped newlines stay inside their record.
pub(crate) fn records(encoded: &str) -> Vec<String> {
    split_escaped(encoded, LINE_SEP)
        .into_iter()
        .filter(|record| !record.trim().is_empty())
        .collect()
}

/// Strict `true`/`false` parse, case-insensitive.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
