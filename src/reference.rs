//! Cross-node value references.
//!
//! A reference written in a node's configuration (`{"mode": "ref", "nodeId", "path"}`)
//! cannot be resolved at compile time, because the referenced value only exists once
//! the generated script runs. The compiler therefore encodes each reference as a
//! placeholder token, a plain string that survives being embedded in any quoted
//! literal. After the whole script has been assembled, [`resolve_placeholders`]
//! rewrites every quoted token into a runtime lookup call:
//!
//! ```text
//! 'FLOWREF-PAYLOAD'   ->   __flowLookup("n1", "user.email")
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// Fixed prefix that marks a placeholder token inside generated text.
pub const PLACEHOLDER_PREFIX: &str = "__FLOWREF__";

/// Runtime helper that reads a stored node output.
pub const LOOKUP_FUNCTION: &str = "__flowLookup";

/// Expression emitted for placeholders whose payload cannot be decoded.
pub const UNDEFINED_EXPRESSION: &str = "undefined";

const ESCAPED_PREFIX: &str = "\\u005f_FLOWREF__";

const QUOTES: [u8; 3] = [b'\'', b'"', b'`'];

/// "The value at `path` inside the output of node `node_id`."
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueReference {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(default)]
    pub path: String,
}

impl ValueReference {
    pub fn new(node_id: &str, path: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            path: path.to_string(),
        }
    }

    /// The runtime expression that reads this reference.
    pub fn to_lookup_expression(&self) -> String {
        format!(
            "{}({}, {})",
            LOOKUP_FUNCTION,
            js_string(&self.node_id),
            js_string(&normalize_path(&self.path))
        )
    }
}

/// Encodes a reference into a placeholder token.
pub fn encode(node_id: &str, path: &str) -> String {
    let payload = serde_json::json!({ "nodeId": node_id, "path": path }).to_string();
    format!("{}{}", PLACEHOLDER_PREFIX, URL_SAFE_NO_PAD.encode(payload))
}

/// Decodes a placeholder token (with or without its prefix).
///
/// Returns `None` for any malformed payload; callers turn that into `undefined`.
pub fn decode(token: &str) -> Option<ValueReference> {
    let payload = token.strip_prefix(PLACEHOLDER_PREFIX).unwrap_or(token);
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Whether `text` is exactly one placeholder token.
pub fn is_placeholder(text: &str) -> bool {
    text.strip_prefix(PLACEHOLDER_PREFIX)
        .is_some_and(|payload| !payload.is_empty() && payload.bytes().all(is_token_byte))
}

/// Strips the root marker and converts bracket indices to dotted segments.
///
/// `$`, `$.` and the empty string all mean "the whole output";
/// `$.items[0].name` becomes `items.0.name`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let without_root = trimmed.strip_prefix('$').unwrap_or(trimmed);
    without_root
        .replace('[', ".")
        .replace(']', "")
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Output of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText {
    pub text: String,
    pub resolved: usize,
    /// Placeholders that matched the quote rules but carried an undecodable payload.
    pub malformed: Vec<String>,
}

/// Rewrites every quoted placeholder token in `text` into a lookup expression.
///
/// A token only counts when the character right before the prefix is a quote and the
/// character right after its payload is the same quote. Anything else is ordinary text
/// and is copied through byte for byte.
pub fn resolve_placeholders(text: &str) -> ResolvedText {
    if !text.contains(PLACEHOLDER_PREFIX) {
        return ResolvedText {
            text: text.to_string(),
            resolved: 0,
            malformed: Vec::new(),
        };
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut search_from = 0;
    let mut resolved = 0;
    let mut malformed = Vec::new();

    while let Some(offset) = text[search_from..].find(PLACEHOLDER_PREFIX) {
        let start = search_from + offset;
        let payload_start = start + PLACEHOLDER_PREFIX.len();
        let mut end = payload_start;
        while end < bytes.len() && is_token_byte(bytes[end]) {
            end += 1;
        }

        let opening = start.checked_sub(1).map(|i| bytes[i]);
        let quoted = match opening {
            Some(quote) if QUOTES.contains(&quote) => bytes.get(end) == Some(&quote),
            _ => false,
        };

        if !quoted || end == payload_start {
            search_from = payload_start;
            continue;
        }

        let token = &text[start..end];
        let expression = match decode(token) {
            Some(reference) => reference.to_lookup_expression(),
            None => {
                malformed.push(token.to_string());
                UNDEFINED_EXPRESSION.to_string()
            }
        };

        out.push_str(&text[copied_to..start - 1]);
        out.push_str(&expression);
        copied_to = end + 1;
        search_from = end + 1;
        resolved += 1;
    }

    out.push_str(&text[copied_to..]);
    ResolvedText {
        text: out,
        resolved,
        malformed,
    }
}

/// Renders `value` as a double-quoted script string literal.
///
/// An embedded placeholder prefix is escaped (`\u005f` for its first underscore) so
/// identifiers the compiler writes itself can never be mistaken for a reference.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace(PLACEHOLDER_PREFIX, ESCAPED_PREFIX)
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
