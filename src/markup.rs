//! Generic markup tree produced by the compiler.
//!
//! An [`Element`] is a tag, an ordered attribute map and ordered children.
//! Trees are assembled bottom-up and can be rendered as indented XML or
//! serialized to JSON.

use std::fmt::{self, Write as _};

use indexmap::IndexMap;
use serde::Serialize;

/// Node kind. The first nine double as the classifier's answer for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    String,
    Integer,
    Float,
    Bool,
    Date,
    Time,
    Url,
    List,
    Object,
    Choice,
    Case,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::String => "string",
            Tag::Integer => "integer",
            Tag::Float => "float",
            Tag::Bool => "bool",
            Tag::Date => "date",
            Tag::Time => "time",
            Tag::Url => "url",
            Tag::List => "list",
            Tag::Object => "object",
            Tag::Choice => "choice",
            Tag::Case => "case",
        }
    }

    pub fn is_scalar(self) -> bool {
        !matches!(self, Tag::List | Tag::Object | Tag::Choice | Tag::Case)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: Tag,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: IndexMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Element { tag, attrs: IndexMap::new(), children: Vec::new() }
    }

    /// Set an attribute. Re-setting keeps the original position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// First direct child carrying `name="..."`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name() == Some(name))
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out, 0);
        out
    }

    fn write_xml(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.tag);
        for (key, value) in &self.attrs {
            let _ = write!(out, " {key}=\"{}\"", escape_attr(value));
        }
        if self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push_str(">\n");
        for child in &self.children {
            child.write_xml(out, depth + 1);
        }
        let _ = writeln!(out, "{indent}</{}>", self.tag);
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

/// Attribute values are normalized by XML parsers, so the whitespace controls
/// go out as character references. The other C0 controls cannot appear in an
/// XML 1.0 document at all and become U+FFFD.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\u{0}'..='\u{1f}' => out.push(char::REPLACEMENT_CHARACTER),
            _ => out.push(ch),
        }
    }
    out
}
