//! Tag normalization and display labels.

use serde::{Deserialize, Deserializer};

pub const DEFAULT_DELIMITERS: [char; 3] = ['|', ',', ';'];

const SENTINELS: [&str; 6] = ["nan", "none", "null", "na", "<na>", "n/a"];

const PRETTY_SUBS: [(&str, &str); 5] = [
    ("Idm", "IDM"),
    ("Edm", "EDM"),
    ("Dnb", "DnB"),
    ("Uk ", "UK "),
    ("Dj ", "DJ "),
];

/// Splits a raw tag field into normalized tags.
///
/// Accepts delimited strings (`|`, `,`, `;`) and JSON array literals. Tags are
/// lowercased, inner whitespace is collapsed, and duplicates are dropped
/// keeping first-seen order.
pub fn split_tags(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "[]" {
        return Vec::new();
    }
    if SENTINELS.contains(&raw.to_lowercase().as_str()) {
        return Vec::new();
    }

    let joined;
    let mut text = raw;
    if raw.starts_with('[') && raw.ends_with(']') {
        if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            joined = items
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("|");
            text = &joined;
        }
    }

    let mut out: Vec<String> = Vec::new();
    for part in text.split(&DEFAULT_DELIMITERS[..]) {
        let tag = part.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        out.push(tag);
    }
    out
}

/// Converts a normalized tag into a display label ("uk garage" -> "UK Garage").
pub fn pretty_label(tag: &str) -> String {
    let mut titled = String::with_capacity(tag.len());
    let mut prev_alpha = false;
    for c in tag.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            titled.push(c);
            prev_alpha = false;
        }
    }
    let mut out = titled;
    for (from, to) in PRETTY_SUBS {
        out = out.replace(from, to);
    }
    out
}

/// Resolves display metadata for a tag the first time it is seen.
pub trait Labeler {
    fn label(&self, id: &str) -> String {
        id.to_string()
    }

    fn category(&self, _id: &str) -> Option<String> {
        None
    }
}

/// Label = id, no category.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Labeler for Identity {}

/// Title-cased labels with the usual genre acronyms restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyLabels;

impl Labeler for PrettyLabels {
    fn label(&self, id: &str) -> String {
        pretty_label(id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Text(String),
}

/// Serde helper: accepts either a list of tags or one delimited string.
pub fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawTags::deserialize(deserializer)? {
        RawTags::List(items) => split_tags(&items.join("|")),
        RawTags::Text(text) => split_tags(&text),
    })
}
