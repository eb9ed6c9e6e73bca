//! Module providing JSON IO for Models, using the COBRA JSON layout
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::io::gpr_parse::{parse_gpr, GprParseError};
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};
use crate::metabolic_model::{Annotation, Notes};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    genes: Vec<JsonGene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    name: Option<String>,
    compartment: Option<String>,
    charge: Option<i32>,
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
/// Annotation values are either a single identifier or a list of them
fn annotation_from_value(value: Option<Value>) -> Annotation {
    let mut annotation = Annotation::new();
    if let Some(Value::Object(providers)) = value {
        for (provider, ids) in providers {
            let ids = match ids {
                Value::String(id) => vec![id],
                Value::Array(ids) => ids
                    .into_iter()
                    .map(|id| match id {
                        Value::String(id) => id,
                        other => other.to_string(),
                    })
                    .collect(),
                other => vec![other.to_string()],
            };
            annotation.insert(provider, ids);
        }
    }
    annotation
}

fn annotation_to_value(annotation: &Annotation) -> Option<Value> {
    if annotation.is_empty() {
        return None;
    }
    let providers: Map<String, Value> = annotation
        .iter()
        .map(|(provider, ids)| {
            let value = match ids.as_slice() {
                [sbo] if provider == "sbo" => Value::String(sbo.clone()),
                ids => Value::Array(ids.iter().cloned().map(Value::String).collect()),
            };
            (provider.clone(), value)
        })
        .collect();
    Some(Value::Object(providers))
}

/* Notes are free form, values which aren't strings are kept as their JSON text and turned back
into JSON when written
 */
fn notes_from_value(value: Option<Value>) -> Notes {
    let mut notes = Notes::new();
    if let Some(Value::Object(entries)) = value {
        for (key, value) in entries {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            notes.insert(key, value);
        }
    }
    notes
}

fn notes_to_value(notes: &Notes) -> Option<Value> {
    if notes.is_empty() {
        return None;
    }
    let entries: Map<String, Value> = notes
        .iter()
        .map(|(key, value)| {
            let value = match serde_json::from_str::<Value>(value) {
                Ok(parsed @ (Value::Array(_) | Value::Object(_))) => parsed,
                _ => Value::String(value.clone()),
            };
            (key.clone(), value)
        })
        .collect();
    Some(Value::Object(entries))
}

impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: notes_from_value(g.notes),
            annotation: annotation_from_value(g.annotation),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            boundary_condition: false,
            notes: notes_from_value(m.notes),
            annotation: annotation_from_value(m.annotation),
        }
    }
}

impl From<&Gene> for JsonGene {
    fn from(g: &Gene) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            notes: notes_to_value(&g.notes),
            annotation: annotation_to_value(&g.annotation),
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            compartment: m.compartment.clone(),
            charge: Some(m.charge),
            formula: m.formula.clone(),
            notes: notes_to_value(&m.notes),
            annotation: annotation_to_value(&m.annotation),
        }
    }
}

impl Model {
    /// Read a Model from a COBRA JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let path = path.as_ref();
        let model_str = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) => return Err(JsonError::UnableToRead(format!("{:?}", err))),
        };
        let json_model = match serde_json::from_str::<JsonModel>(&model_str) {
            Ok(model) => model,
            Err(err) => return Err(JsonError::UnableToParse(format!("{:?}", err))),
        };
        let model = Model::from_json(json_model)?;
        info!("Read JSON model {}", path.display());
        Ok(model)
    }

    /// Write the Model to a COBRA JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let json_model = self.to_json();
        let model_string = serde_json::to_string(&json_model)?;
        fs::write(path.as_ref(), model_string)?;
        info!("Wrote JSON model {}", path.as_ref().display());
        Ok(())
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        model.id = json_model.id;
        model.name = json_model.name;
        model.compartments = json_model.compartments.unwrap_or_default();
        model.version = json_model.version;
        model.notes = notes_from_value(json_model.notes);
        model.annotation = annotation_from_value(json_model.annotation);

        // Start by converting the genes and metabolites using the From methods
        json_model.genes.into_iter().for_each(|g| {
            model.add_gene(Gene::from(g));
        });
        json_model.metabolites.into_iter().for_each(|m| {
            model.add_metabolite(Metabolite::from(m));
        });
        /* Now, iterate through the reactions, parsing GPRs, and adding to
        the objective along the way
        */
        for rxn in json_model.reactions {
            let gpr = if !rxn.gene_reaction_rule.trim().is_empty() {
                Some(parse_gpr(&rxn.gene_reaction_rule, &mut model.genes)?)
            } else {
                None
            };
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(notes_from_value(rxn.notes))
                .annotation(annotation_from_value(rxn.annotation))
                .build()?;
            model.add_reaction(new_reaction);
            // Add the reaction to the objective function if desired
            if let Some(coef) = rxn.objective_coefficient {
                if coef != 0f64 {
                    model.objective.insert(rxn.id, coef);
                }
            }
        }
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let reactions = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                gene_reaction_rule: r
                    .gpr
                    .as_ref()
                    .map(|rule| rule.to_string_id())
                    .unwrap_or_default(),
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                notes: notes_to_value(&r.notes),
                annotation: annotation_to_value(&r.annotation),
            })
            .collect();

        JsonModel {
            metabolites: self.metabolites.values().map(JsonMetabolite::from).collect(),
            reactions,
            genes: self.genes.values().map(JsonGene::from).collect(),
            id: self.id.clone(),
            name: self.name.clone(),
            compartments: Some(self.compartments.clone()),
            version: self.version.clone(),
            notes: notes_to_value(&self.notes),
            annotation: annotation_to_value(&self.annotation),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to parse a GPR rule during conversion from JSON")]
    GprParserError(#[from] GprParseError),
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Serde json parse error")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}

// endregion Conversions
