//! Module providing the Model struct for representing a metabolic model.

use indexmap::IndexMap;

pub mod gene;
pub mod metabolite;
pub mod model;
pub mod reaction;

/// Cross references to external databases, keyed by provider (e.g. `bigg.metabolite`)
///
/// A provider can list more than one identifier, the order of the file is kept.
pub type Annotation = IndexMap<String, Vec<String>>;

/// Free form key/value notes attached to a model component
pub type Notes = IndexMap<String, String>;

/// Get the first identifier listed for `provider` in an annotation
pub fn first_annotation<'a>(annotation: &'a Annotation, provider: &str) -> Option<&'a str> {
    annotation
        .get(provider)
        .and_then(|ids| ids.first())
        .map(String::as_str)
}
