//! This module provides the Gene struct, representing a gene
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;

use crate::metabolic_model::{Annotation, Notes};

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default = "Notes::new()")]
    pub notes: Notes,
    /// Gene Annotations
    #[builder(default = "Annotation::new()")]
    pub annotation: Annotation,
}

impl Gene {
    /// Create a gene which only carries an id
    pub fn with_id(id: &str) -> Gene {
        Gene {
            id: id.to_string(),
            name: None,
            notes: Notes::new(),
            annotation: Annotation::new(),
        }
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
