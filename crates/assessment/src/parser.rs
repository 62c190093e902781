//! ResponseParser: free-form model output to structured advice.
//!
//! Parsing is total: any input string yields a well-formed
//! [`StructuredAdvice`]. Malformed model output is an expected condition and
//! degrades to fallback content, never to an error.
//!
//! JSON is located with a structural scanner that tracks brace depth and
//! string/escape state, so braces inside string values, prose around the
//! object, and several objects in one reply are all handled. Candidates are
//! tried in order; a candidate that fails to decode is skipped and scanning
//! resumes after it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub const MISSING_RECOMMENDATIONS: &str =
    "The model response did not include recommendations; see the raw output for details.";
pub const UNPARSEABLE_RESPONSE: &str =
    "The AI response could not be parsed into structured recommendations. Please review the raw output or try again.";

/// Keys that mark an object as advice rather than an incidental JSON fragment.
const ADVICE_KEYS: &[&str] = &[
    "recommendations",
    "resources",
    "rawLLMOutput",
    "rawSummary",
    "summary",
    "dataInsights",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAdvice {
    pub recommendations: Vec<String>,
    pub resources: Vec<Resource>,
    #[serde(rename = "rawLLMOutput")]
    pub raw_summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_insights: Vec<String>,
}

impl StructuredAdvice {
    /// The result when no usable JSON object was found.
    pub fn fallback(raw: &str) -> Self {
        Self {
            recommendations: vec![UNPARSEABLE_RESPONSE.to_string()],
            resources: Vec::new(),
            raw_summary: raw.to_string(),
            data_insights: Vec::new(),
        }
    }
}

/// Successive balanced `{...}` spans in `text`.
///
/// An opening brace that is never closed does not hide objects nested after
/// it. The scan that runs off the end of the text already saw every brace
/// pair after the unmatched one, so those spans are queued instead of
/// rescanning; the whole iteration is linear in the text length.
pub struct JsonObjects<'a> {
    text: &'a str,
    pos: usize,
    pending: std::vec::IntoIter<(usize, usize)>,
}

pub fn json_objects(text: &str) -> JsonObjects<'_> {
    JsonObjects { text, pos: 0, pending: Vec::new().into_iter() }
}

impl<'a> Iterator for JsonObjects<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if let Some((start, end)) = self.pending.next() {
            return Some(&self.text[start..end]);
        }
        let offset = self.text.get(self.pos..)?.find('{')?;
        let start = self.pos + offset;
        match scan(&self.text[start..]) {
            Scan::Closed(len) => {
                self.pos = start + len;
                Some(&self.text[start..start + len])
            }
            Scan::Unclosed(inner) => {
                self.pos = self.text.len();
                self.pending = inner
                    .into_iter()
                    .map(|(b, e)| (start + b, start + e))
                    .collect::<Vec<_>>()
                    .into_iter();
                self.pending.next().map(|(b, e)| &self.text[b..e])
            }
        }
    }
}

enum Scan {
    /// Byte length of the balanced object starting at `s[0]`.
    Closed(usize),
    /// The first brace never closes; outermost balanced spans found after it, in order.
    Unclosed(Vec<(usize, usize)>),
}

/// Scan from `s[0] == '{'`, tracking depth and string/escape state.
fn scan(s: &str) -> Scan {
    let mut open: Vec<usize> = Vec::new();
    let mut closed: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push(i),
            '}' => {
                if let Some(begin) = open.pop() {
                    if open.is_empty() {
                        return Scan::Closed(i + 1);
                    }
                    closed.push((begin, i + 1));
                }
            }
            _ => {}
        }
    }

    closed.sort_unstable_by_key(|&(begin, _)| begin);
    let mut last_end = 0;
    closed.retain(|&(begin, end)| {
        let outermost = begin >= last_end;
        if outermost {
            last_end = end;
        }
        outermost
    });
    Scan::Unclosed(closed)
}

/// The first balanced object in `text` that decodes as `T`.
pub fn first_decodable<T: serde::de::DeserializeOwned>(text: &str) -> Option<T> {
    json_objects(text).find_map(|span| serde_json::from_str(span).ok())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse model output. Never fails.
    pub fn parse(&self, raw: &str) -> StructuredAdvice {
        let mut first_object: Option<Map<String, Value>> = None;
        for span in json_objects(raw) {
            let Ok(Value::Object(map)) = serde_json::from_str::<Value>(span) else {
                debug!(chars = span.len(), "Skipping undecodable JSON candidate");
                continue;
            };
            if ADVICE_KEYS.iter().any(|k| map.contains_key(*k)) {
                return Self::from_object(&map, raw);
            }
            first_object.get_or_insert(map);
        }
        match first_object {
            Some(map) => Self::from_object(&map, raw),
            None => StructuredAdvice::fallback(raw),
        }
    }

    fn from_object(map: &Map<String, Value>, raw: &str) -> StructuredAdvice {
        let recommendations = match map.get("recommendations") {
            Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => vec![MISSING_RECOMMENDATIONS.to_string()],
        };

        let resources = match map.get("resources") {
            Some(Value::Array(items)) => items.iter().filter_map(resource).collect(),
            _ => Vec::new(),
        };

        let raw_summary = ["rawLLMOutput", "rawSummary", "summary"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(String::from)
            .unwrap_or_else(|| raw.to_string());

        let data_insights = match map.get("dataInsights") {
            Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
            _ => Vec::new(),
        };

        StructuredAdvice { recommendations, resources, raw_summary, data_insights }
    }
}

/// Strings are kept as-is; scalars and objects are rendered as JSON text.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn resource(value: &Value) -> Option<Resource> {
    let obj = value.as_object()?;
    let url = obj.get("url").and_then(Value::as_str)?.to_string();
    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| url.clone());
    Some(Resource { title, url })
}
