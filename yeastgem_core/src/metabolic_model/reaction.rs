//! This module provides a struct for representing reactions
use super::model::Gpr;
use crate::configuration::read_configuration;
use crate::metabolic_model::{Annotation, Notes};
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction, reactants have negative coefficients
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "read_configuration().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "read_configuration().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "Notes::new()")]
    pub notes: Notes,
    /// Reaction Annotations
    #[builder(default = "Annotation::new()")]
    pub annotation: Annotation,
}

impl Reaction {
    /// A reaction is reversible when it can carry negative flux
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0f64
    }

    /// Iterate over the consumed metabolites and their (positive) stoichiometric coefficients
    pub fn reactants(&self) -> impl Iterator<Item = (&String, f64)> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef < 0f64)
            .map(|(id, coef)| (id, -*coef))
    }

    /// Iterate over the produced metabolites and their stoichiometric coefficients
    pub fn products(&self) -> impl Iterator<Item = (&String, f64)> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef > 0f64)
            .map(|(id, coef)| (id, *coef))
    }
}
