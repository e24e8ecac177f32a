//! Field descriptions from a model's free-form documentation.
//!
//! Reads the Google-style argument section:
//!
//! ```text
//! Information about a person.
//!
//! Args:
//!     name (str): The person's full name.
//!     age: Age in whole
//!         years.
//! ```

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::{SchemaModel, TypeExpr};

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Args|Arguments|Attributes|Parameters|Params):\s*$").unwrap()
});

static ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>\*{0,2}[A-Za-z_][A-Za-z0-9_]*)\s*(\([^)]*\))?\s*:\s*(?P<text>.*)$")
        .unwrap()
});

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Field name -> description, in documentation order. Missing documentation
/// or a missing argument section yields an empty map.
pub fn field_descriptions(model: &SchemaModel) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let Some(doc) = model.doc.as_deref() else {
        return out;
    };

    let mut lines = doc.lines();
    let header_indent = loop {
        let Some(line) = lines.next() else { return out };
        if SECTION_HEADER.is_match(line.trim()) {
            break indent_of(line);
        }
    };

    let mut entry_indent: Option<usize> = None;
    let mut current: Option<(String, Vec<String>)> = None;
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        let indent = indent_of(line);
        if indent <= header_indent {
            break;
        }
        let at_entry_level = *entry_indent.get_or_insert(indent) == indent;
        if at_entry_level {
            if let Some(caps) = ENTRY.captures(trimmed) {
                flush(&mut out, current.take());
                let name = caps["name"].trim_start_matches('*').to_string();
                let text = caps["text"].trim();
                let parts = if text.is_empty() { Vec::new() } else { vec![text.to_string()] };
                current = Some((name, parts));
                continue;
            }
        }
        if let Some((_, parts)) = current.as_mut() {
            parts.push(trimmed.to_string());
        }
    }
    flush(&mut out, current);
    out
}

fn flush(out: &mut IndexMap<String, String>, entry: Option<(String, Vec<String>)>) {
    if let Some((name, parts)) = entry {
        out.insert(name, parts.join(" "));
    }
}

/// Copy documented descriptions onto fields that have none, descending into
/// nested records. Explicit descriptions always win.
pub fn fill_descriptions(model: &mut SchemaModel) {
    let documented = field_descriptions(model);
    for (name, field) in model.fields.iter_mut() {
        if field.description.is_none() {
            if let Some(text) = documented.get(name) {
                field.description = Some(text.clone());
            }
        }
        fill_nested(&mut field.ty);
    }
}

fn fill_nested(ty: &mut TypeExpr) {
    match ty {
        TypeExpr::Record(model) => fill_descriptions(model),
        TypeExpr::List { items: Some(items) } => fill_nested(items),
        TypeExpr::Dict { value: Some(value), .. } => fill_nested(value),
        TypeExpr::Union { members } => members.iter_mut().for_each(fill_nested),
        _ => {}
    }
}
