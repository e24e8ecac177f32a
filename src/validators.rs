//! Validator encoding: a field's rules become one `format` attribute and one
//! `on-fail-<rule>` attribute per resolved rule.

use indexmap::IndexMap;

use crate::ir::{Annotation, OnFail, ValidatorEntry};
use crate::markup::Element;

/// Separator between rule clauses in `format`.
pub const FORMAT_SEPARATOR: &str = "; ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedValidators {
    /// `None` when the field has no validators; never an empty string.
    pub format: Option<String>,
    /// rule alias -> action name, in first-seen order.
    pub on_fail: IndexMap<String, String>,
}

impl EncodedValidators {
    /// Attach to `element`: `format` first, then the `on-fail-*` entries.
    pub fn apply(self, element: &mut Element) {
        let Some(format) = self.format else { return };
        element.set("format", format);
        for (rule, action) in self.on_fail {
            element.set(format!("on-fail-{rule}"), action);
        }
    }
}

pub fn encode<A: Annotation + ?Sized>(field: &A) -> EncodedValidators {
    let mut clauses = Vec::new();
    let mut on_fail = IndexMap::new();
    for entry in field.validators() {
        match entry {
            ValidatorEntry::Raw(text) => clauses.push(text.clone()),
            ValidatorEntry::Spec(spec) => {
                clauses.push(spec.to_attribute());
                let action = spec.on_fail.as_ref().unwrap_or(&OnFail::Noop);
                on_fail.insert(spec.rule.clone(), action.name().to_string());
            }
        }
    }

    let format = if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(FORMAT_SEPARATOR))
    };
    EncodedValidators { format, on_fail }
}
