use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One graded (or critiqued) criteria from a PATCH body.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub category_id: String,
    pub criteria_id: String,
    pub mark: f64,
    pub comment: String,
}

/// Escapes the characters that are significant in HTML.
#[must_use]
pub fn sanitize_comment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

pub fn object<'a>(body: &'a Value, field: &str) -> Result<&'a Map<String, Value>> {
    body.as_object()
        .ok_or_else(|| Error::validation(field, "expected an object"))
}

pub fn required_str(map: &Map<String, Value>, field: &str) -> Result<String> {
    match map.get(field) {
        None | Some(Value::Null) => Err(Error::validation(field, "is required")),
        Some(Value::String(s)) if s.is_empty() => Err(Error::validation(field, "cannot be empty")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::validation(field, "expected a string")),
    }
}

/// Missing or null reads as `false`.
pub fn optional_bool(map: &Map<String, Value>, field: &str) -> Result<bool> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(Error::validation(field, "expected a boolean")),
    }
}

/// Missing or null reads as `None`; strings come back sanitized.
pub fn optional_comment(map: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(sanitize_comment(s))),
        Some(_) => Err(Error::validation(field, "expected a string")),
    }
}

pub fn required_array<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a [Value]> {
    match map.get(field) {
        None | Some(Value::Null) => Err(Error::validation(field, "is required")),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::validation(field, "expected an array")),
    }
}

fn mark(map: &Map<String, Value>, field: &str) -> Result<f64> {
    let value = map
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::validation(field, "expected a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::validation(field, "must be between 0 and 1"));
    }
    Ok(value)
}

fn comment(map: &Map<String, Value>, field: &str) -> Result<String> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(sanitize_comment(s)),
        _ => Err(Error::validation(field, "expected a string")),
    }
}

/// Parses `items` as grade entries, reporting the first malformed field by
/// its path (`grades[1].mark`).
pub fn entries(field: &str, items: &[Value], mark_field: &str) -> Result<Vec<Entry>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = |name: &str| format!("{field}[{i}].{name}");
            let map = object(item, &format!("{field}[{i}]"))?;

            let category_id = match map.get("category_id") {
                Some(Value::String(s)) => s.clone(),
                _ => return Err(Error::validation(path("category_id"), "expected a string")),
            };
            let criteria_id = match map.get("criteria_id") {
                Some(Value::String(s)) => s.clone(),
                _ => return Err(Error::validation(path("criteria_id"), "expected a string")),
            };

            Ok(Entry {
                category_id,
                criteria_id,
                comment: comment(map, &path("comment"))?,
                mark: mark(map, &path(mark_field))?,
            })
        })
        .collect()
}
