/*!
 * Timed-text markup reader.
 *
 * Pulls `<p begin=".." end=".." region="..">` paragraphs out of TTML-family
 * documents (DFXP captions, iTT subtitles) and turns them into raw records.
 * Inline styling tags are dropped, `<br/>` is kept for the normalizer, and
 * entities are left encoded so decoding happens in one place.
 */

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::errors::SourceError;
use crate::timecode::TimeValue;
use crate::timed_text::RawRecord;

// @const: Paragraph element, either with content or self-closing
static PARAGRAPH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[A-Za-z_][\w.-]*:)?p\b([^>]*?)(?:/>|>(.*?)</(?:[A-Za-z_][\w.-]*:)?p\s*>)").unwrap()
});

// @const: Attribute with single or double quotes
static ATTRIBUTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

// @const: Any tag inside a paragraph
static INLINE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*<(/?)([A-Za-z][\w:.-]*)[^>]*>\s*").unwrap()
});

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extract every timed paragraph of a TTML/DFXP/iTT document, in document order
pub fn parse_document(xml: &str) -> Result<Vec<RawRecord>, SourceError> {
    let mut records = Vec::new();

    for caps in PARAGRAPH_REGEX.captures_iter(xml) {
        let attributes = parse_attributes(caps.get(1).map_or("", |m| m.as_str()));
        let begin = required_attribute(&attributes, "begin")?;
        let end = required_attribute(&attributes, "end")?;
        let region = attributes.get("region").cloned();
        let text = paragraph_text(caps.get(2).map_or("", |m| m.as_str()));

        records.push(RawRecord {
            begin: TimeValue::Text(begin),
            end: TimeValue::Text(end),
            region,
            text,
        });
    }

    debug!("Parsed {} timed paragraph(s) from markup", records.len());

    Ok(records)
}

/// Attributes keyed by local name (namespace prefixes dropped)
fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTRIBUTE_REGEX
        .captures_iter(raw)
        .map(|caps| {
            let name = &caps[1];
            let local = name.rsplit(':').next().unwrap_or(name);
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            (local.to_string(), value.to_string())
        })
        .collect()
}

fn required_attribute(attributes: &HashMap<String, String>, name: &str) -> Result<String, SourceError> {
    attributes
        .get(name)
        .map(|value| value.trim().to_string())
        .ok_or_else(|| SourceError::MissingAttribute {
            attribute: name.to_string(),
            element: "p".to_string(),
        })
}

/// Paragraph content with layout whitespace collapsed and only `<br/>` kept
fn paragraph_text(inner: &str) -> String {
    let collapsed = WHITESPACE_REGEX.replace_all(inner, " ");
    let text = INLINE_TAG_REGEX.replace_all(&collapsed, |caps: &Captures| {
        let closing = !caps[1].is_empty();
        let name = caps[2].rsplit(':').next().unwrap_or(&caps[2]).to_ascii_lowercase();
        if name == "br" && !closing {
            "<br/>".to_string()
        } else {
            // Keep a word boundary where a tag stood between two words
            let had_space = caps[0].starts_with(char::is_whitespace) || caps[0].ends_with(char::is_whitespace);
            if had_space { " ".to_string() } else { String::new() }
        }
    });
    text.trim().to_string()
}
