//! Conversion of model identifiers to the BiGG naming convention
//!
//! Metabolite ids become `<bigg id>_<compartment>` (or keep their own id with the bracketed
//! compartment turned into a suffix when no BiGG cross reference exists), reactions with a BiGG
//! cross reference take it as their id, and the compartments which have different codes in
//! BiGG are renamed. The previous id of every renamed component is kept in its notes.
use indexmap::IndexMap;
use log::{debug, info, warn};
use thiserror::Error;

use crate::metabolic_model::first_annotation;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

/// Notes key under which the pre-conversion identifier is kept
pub const ORIGINAL_ID_NOTE: &str = "Original ID";
/// Annotation provider holding the BiGG metabolite id
pub const BIGG_METABOLITE: &str = "bigg.metabolite";
/// Annotation provider holding the BiGG reaction id
pub const BIGG_REACTION: &str = "bigg.reaction";
/// A model containing this compartment already uses BiGG compartment codes
pub const COMPLIANCE_MARKER: &str = "x";

/// Compartments which are renamed, as (original code, BiGG code, BiGG name)
pub const COMPARTMENT_RENAMES: [(&str, &str, &str); 3] = [
    ("er", "r", "endoplasmic reticulum"),
    ("erm", "rm", "endoplasmic reticulum membrane"),
    ("p", "x", "peroxisome"),
];

fn renamed_compartment(code: &str) -> Option<&'static str> {
    COMPARTMENT_RENAMES
        .iter()
        .find(|(original, _, _)| *original == code)
        .map(|(_, bigg, _)| *bigg)
}

#[derive(Error, Debug, PartialEq)]
pub enum BiggError {
    #[error("Metabolites {first} and {second} would both be renamed to {id}")]
    DuplicateMetaboliteId {
        id: String,
        first: String,
        second: String,
    },
    #[error("Reactions {first} and {second} would both be renamed to {id}")]
    DuplicateReactionId {
        id: String,
        first: String,
        second: String,
    },
}

/// Work out the BiGG version of a metabolite, without touching the model
///
/// `compartment_names` is the compartment table before any renaming, used to drop the
/// ` [<compartment name>]` suffix from the display name.
fn convert_metabolite(
    metabolite: &Metabolite,
    compartment_names: &IndexMap<String, String>,
) -> Metabolite {
    let mut converted = metabolite.clone();
    converted
        .notes
        .insert(ORIGINAL_ID_NOTE.to_string(), metabolite.id.clone());

    let original_compartment = metabolite.compartment.clone().unwrap_or_default();
    if let (Some(name), Some(compartment_name)) = (
        converted.name.as_mut(),
        compartment_names.get(&original_compartment),
    ) {
        *name = name.replace(&format!(" [{compartment_name}]"), "");
    }

    let compartment = renamed_compartment(&original_compartment)
        .map(str::to_string)
        .unwrap_or_else(|| original_compartment.clone());
    if metabolite.compartment.is_some() {
        converted.compartment = Some(compartment.clone());
    }

    // Without a compartment there is no suffix to build the id with
    converted.id = match first_annotation(&metabolite.annotation, BIGG_METABOLITE) {
        _ if metabolite.compartment.is_none() => metabolite.id.clone(),
        Some(bigg_id) => {
            if metabolite.annotation[BIGG_METABOLITE].len() > 1 {
                warn!(
                    "Metabolite {} has several BiGG ids, using {bigg_id}",
                    metabolite.id
                );
            }
            format!("{bigg_id}_{compartment}")
        }
        None => metabolite
            .id
            .replace(&format!("[{original_compartment}]"), &format!("_{compartment}")),
    };
    debug!("Metabolite {} becomes {}", metabolite.id, converted.id);
    converted
}

/// Work out the BiGG version of a reaction, None if it has no BiGG cross reference
fn convert_reaction(reaction: &Reaction) -> Option<Reaction> {
    let bigg_id = first_annotation(&reaction.annotation, BIGG_REACTION)?;
    let mut converted = reaction.clone();
    converted
        .notes
        .insert(ORIGINAL_ID_NOTE.to_string(), reaction.id.clone());
    converted.id = bigg_id.to_string();
    debug!("Reaction {} becomes {}", reaction.id, converted.id);
    Some(converted)
}

/// Replace the renamed compartments in place, appending those which weren't present
fn convert_compartments(compartments: &IndexMap<String, String>) -> IndexMap<String, String> {
    let mut converted: IndexMap<String, String> = compartments
        .iter()
        .map(|(code, name)| {
            match COMPARTMENT_RENAMES
                .iter()
                .find(|(original, _, _)| original == code)
            {
                Some((_, bigg, bigg_name)) => (bigg.to_string(), bigg_name.to_string()),
                None => (code.clone(), name.clone()),
            }
        })
        .collect();
    for (_, bigg, bigg_name) in COMPARTMENT_RENAMES {
        converted.insert(bigg.to_string(), bigg_name.to_string());
    }
    converted
}

/// Look for two old ids mapping to the same new id
fn find_collision<'a>(
    renames: impl Iterator<Item = (&'a String, &'a String)>,
) -> Option<(String, String, String)> {
    let mut seen: IndexMap<&String, &String> = IndexMap::new();
    for (old, new) in renames {
        if let Some(first) = seen.insert(new, old) {
            return Some((new.clone(), first.clone(), old.clone()));
        }
    }
    None
}

impl Model {
    /// Whether the model already uses BiGG compartment codes
    pub fn is_bigg_compliant(&self) -> bool {
        self.compartments.contains_key(COMPLIANCE_MARKER)
    }

    /// Convert metabolite, reaction and compartment identifiers to the BiGG convention
    ///
    /// Nothing is changed if the model is already compliant (see [`Model::is_bigg_compliant`]).
    /// Stoichiometries and the objective follow the new identifiers. If two components would
    /// end up with the same identifier an error is returned and the model is left untouched.
    ///
    /// # Returns
    /// `Ok(true)` if the model was converted, `Ok(false)` if it was already compliant
    pub fn make_bigg_compliant(&mut self) -> Result<bool, BiggError> {
        if self.is_bigg_compliant() {
            debug!("Model is already BiGG compliant");
            return Ok(false);
        }

        let metabolites: IndexMap<String, Metabolite> = self
            .metabolites
            .iter()
            .map(|(old_id, met)| (old_id.clone(), convert_metabolite(met, &self.compartments)))
            .collect();
        if let Some((id, first, second)) =
            find_collision(metabolites.iter().map(|(old, met)| (old, &met.id)))
        {
            return Err(BiggError::DuplicateMetaboliteId { id, first, second });
        }
        let metabolite_renames: IndexMap<&str, &str> = metabolites
            .iter()
            .map(|(old, met)| (old.as_str(), met.id.as_str()))
            .collect();

        let mut reactions: IndexMap<String, Reaction> = IndexMap::new();
        for (old_id, reaction) in &self.reactions {
            let mut converted = convert_reaction(reaction).unwrap_or_else(|| reaction.clone());
            converted.metabolites = reaction
                .metabolites
                .iter()
                .map(|(met, coef)| {
                    let id = metabolite_renames
                        .get(met.as_str())
                        .copied()
                        .unwrap_or(met.as_str());
                    (id.to_string(), *coef)
                })
                .collect();
            reactions.insert(old_id.clone(), converted);
        }
        if let Some((id, first, second)) =
            find_collision(reactions.iter().map(|(old, rxn)| (old, &rxn.id)))
        {
            return Err(BiggError::DuplicateReactionId { id, first, second });
        }

        let objective: IndexMap<String, f64> = self
            .objective
            .iter()
            .map(|(rxn, coef)| {
                let id = reactions.get(rxn).map_or(rxn, |r| &r.id);
                (id.clone(), *coef)
            })
            .collect();

        let renamed_metabolites = metabolites
            .iter()
            .filter(|(old, met)| **old != met.id)
            .count();
        let renamed_reactions = reactions
            .iter()
            .filter(|(old, rxn)| **old != rxn.id)
            .count();

        self.compartments = convert_compartments(&self.compartments);
        self.metabolites = metabolites
            .into_values()
            .map(|met| (met.id.clone(), met))
            .collect();
        self.reactions = reactions
            .into_values()
            .map(|rxn| (rxn.id.clone(), rxn))
            .collect();
        self.objective = objective;

        info!(
            "Converted model to BiGG identifiers ({renamed_metabolites} metabolites and {renamed_reactions} reactions renamed)"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::metabolic_model::Annotation;
    use std::path::PathBuf;

    fn mini_yeast() -> Model {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("mini_yeast.xml");
        Model::read_sbml(path).unwrap()
    }

    fn bigg_annotation(provider: &str, id: &str) -> Annotation {
        let mut annotation = Annotation::new();
        annotation.insert(provider.to_string(), vec![id.to_string()]);
        annotation
    }

    fn er_model() -> Model {
        let mut model = Model::new_empty();
        model
            .compartments
            .insert("er".to_string(), "endoplasmic reticulum".to_string());
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("s_1000[er]".to_string())
                .name(Some("thing [endoplasmic reticulum]".to_string()))
                .compartment(Some("er".to_string()))
                .annotation(bigg_annotation(BIGG_METABOLITE, "x123"))
                .build()
                .unwrap(),
        );
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("s_1001[er]".to_string())
                .name(Some("other thing [endoplasmic reticulum]".to_string()))
                .compartment(Some("er".to_string()))
                .build()
                .unwrap(),
        );
        model
    }

    #[test]
    fn bigg_metabolite_annotation() {
        let mut model = er_model();
        assert!(model.make_bigg_compliant().unwrap());
        let met = &model.metabolites["x123_r"];
        assert_eq!(met.compartment.clone().unwrap(), "r");
        assert_eq!(met.name.clone().unwrap(), "thing");
        assert_eq!(met.notes[ORIGINAL_ID_NOTE], "s_1000[er]");
    }

    #[test]
    fn substitution_fallback() {
        let mut model = er_model();
        model.make_bigg_compliant().unwrap();
        let met = &model.metabolites["s_1001_r"];
        assert_eq!(met.name.clone().unwrap(), "other thing");
        assert_eq!(met.notes[ORIGINAL_ID_NOTE], "s_1001[er]");
        assert!(!model.metabolites.contains_key("s_1001[er]"));
    }

    #[test]
    fn no_compartment_keeps_id() {
        let mut model = er_model();
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("s_2000".to_string())
                .name(Some("unplaced".to_string()))
                .annotation(bigg_annotation(BIGG_METABOLITE, "unk"))
                .build()
                .unwrap(),
        );
        model.make_bigg_compliant().unwrap();
        let met = &model.metabolites["s_2000"];
        assert!(met.compartment.is_none());
        assert_eq!(met.notes[ORIGINAL_ID_NOTE], "s_2000");
        assert!(!model.metabolites.contains_key("unk_"));
    }

    #[test]
    fn compartments_renamed() {
        let mut model = mini_yeast();
        assert!(!model.is_bigg_compliant());
        model.make_bigg_compliant().unwrap();
        assert!(model.is_bigg_compliant());
        let compartments: Vec<(&str, &str)> = model
            .compartments
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            compartments,
            vec![
                ("c", "cytoplasm"),
                ("e", "extracellular"),
                ("r", "endoplasmic reticulum"),
                ("rm", "endoplasmic reticulum membrane"),
                ("x", "peroxisome"),
            ]
        );
        // Missing compartments are added anyway
        let mut model = er_model();
        model.make_bigg_compliant().unwrap();
        let codes: Vec<&str> = model.compartments.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["r", "rm", "x"]);
    }

    #[test]
    fn mini_yeast_conversion() {
        let mut model = mini_yeast();
        model.make_bigg_compliant().unwrap();

        let ids: Vec<&str> = model.metabolites.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec!["s_0001_r", "atp_c", "h2o_x", "s_0666_rm", "glc__D_e", "glc__D_c"]
        );
        assert_eq!(model.metabolites["h2o_x"].name.clone().unwrap(), "H2O");
        assert_eq!(model.metabolites["s_0666_rm"].name.clone().unwrap(), "ergosterol");
        assert_eq!(
            model.metabolites["s_0001_r"].name.clone().unwrap(),
            "(1->3)-beta-D-glucan"
        );
        // Notes which were already there are kept
        assert_eq!(model.metabolites["atp_c"].notes["BioCyc"], "ATP");
        // Every metabolite refers to a compartment of the converted model
        assert!(model
            .metabolites
            .values()
            .filter_map(|met| met.compartment.as_ref())
            .all(|c| model.compartments.contains_key(c)));

        let reactions: Vec<&str> = model.reactions.keys().map(String::as_str).collect();
        assert_eq!(reactions, vec!["GLCt1", "r_0100", "r_1757", "EX_glc__D_e"]);
        let transport = &model.reactions["GLCt1"];
        assert_eq!(transport.notes[ORIGINAL_ID_NOTE], "r_1166");
        assert_eq!(transport.notes["Confidence Level"], "3");
        assert!((transport.metabolites["glc__D_e"] + 1.0).abs() < 1e-25);
        assert!((transport.metabolites["glc__D_c"] - 1.0).abs() < 1e-25);
        // Reactions without a BiGG id are untouched, apart from their stoichiometry
        let hydrolysis = &model.reactions["r_0100"];
        assert!(!hydrolysis.notes.contains_key(ORIGINAL_ID_NOTE));
        assert!((hydrolysis.metabolites["h2o_x"] + 2.0).abs() < 1e-25);
        assert!(model.reactions["r_1757"].metabolites.contains_key("s_0666_rm"));

        assert!((model.objective["GLCt1"] - 1.0).abs() < 1e-25);
        assert_eq!(model.objective.len(), 1);
    }

    #[test]
    fn already_compliant() {
        let mut model = mini_yeast();
        model.make_bigg_compliant().unwrap();
        let converted = model.clone();
        assert!(!model.make_bigg_compliant().unwrap());
        assert_eq!(model, converted);
    }

    #[test]
    fn collision_leaves_model_untouched() {
        let mut model = er_model();
        model.add_metabolite(
            MetaboliteBuilder::default()
                .id("s_1002[er]".to_string())
                .compartment(Some("er".to_string()))
                .annotation(bigg_annotation(BIGG_METABOLITE, "x123"))
                .build()
                .unwrap(),
        );
        let original = model.clone();
        assert_eq!(
            model.make_bigg_compliant(),
            Err(BiggError::DuplicateMetaboliteId {
                id: "x123_r".to_string(),
                first: "s_1000[er]".to_string(),
                second: "s_1002[er]".to_string(),
            })
        );
        assert_eq!(model, original);

        let mut model = er_model();
        for id in ["r_0001", "r_0002"] {
            model.add_reaction(
                ReactionBuilder::default()
                    .id(id.to_string())
                    .annotation(bigg_annotation(BIGG_REACTION, "ATPM"))
                    .build()
                    .unwrap(),
            );
        }
        assert!(matches!(
            model.make_bigg_compliant(),
            Err(BiggError::DuplicateReactionId { .. })
        ));
    }
}
