//! Conversion between model identifiers and SBML SIds
//!
//! SIds only allow letters, digits and underscores and can't start with a digit. Identifiers
//! are written with a type prefix (`M_`, `R_`, `G_`) and every other character is escaped as
//! `__<code point>__`, so `s_0001[er]` is stored as `M_s_0001__91__er__93__`.
use std::sync::LazyLock;

use regex::{Captures, Regex};

pub const METABOLITE_PREFIX: &str = "M_";
pub const REACTION_PREFIX: &str = "R_";
pub const GENE_PREFIX: &str = "G_";

static ESCAPED_CHARACTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(\d+)__").expect("escaped character pattern is valid"));

/// Convert an SBML SId back into a model identifier
pub fn decode_sid(sid: &str, prefix: &str) -> String {
    let stripped = sid.strip_prefix(prefix).unwrap_or(sid);
    ESCAPED_CHARACTER
        .replace_all(stripped, |caps: &Captures| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Convert a model identifier into a valid SBML SId
///
/// An underscore followed by `_<digit>` is escaped too, so that text which already looks like an
/// escape (`pe__65__c`) isn't decoded into a different identifier.
pub fn encode_sid(id: &str, prefix: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let mut sid = String::with_capacity(prefix.len() + id.len());
    sid.push_str(prefix);
    for (i, &c) in chars.iter().enumerate() {
        let starts_escape = c == '_'
            && chars.get(i + 1) == Some(&'_')
            && chars.get(i + 2).is_some_and(char::is_ascii_digit);
        if c.is_ascii_alphanumeric() || (c == '_' && !starts_escape) {
            sid.push(c);
        } else {
            sid.push_str(&format!("__{}__", c as u32));
        }
    }
    sid
}
