//! Conversion of a parsed SBML document into a [`Model`]
use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, warn};

use super::annotation::{parse_annotation, parse_notes};
use super::sid::{decode_sid, GENE_PREFIX, METABOLITE_PREFIX, REACTION_PREFIX};
use super::xml::Element;
use super::{parse_number, SbmlError, VERSION_NOTE};
use crate::configuration::read_configuration;
use crate::metabolic_model::gene::{Gene, GeneBuilder};
use crate::metabolic_model::metabolite::{Metabolite, MetaboliteBuilder};
use crate::metabolic_model::model::{Gpr, GprOperatorType, Model};
use crate::metabolic_model::reaction::{Reaction, ReactionBuilder};
use crate::metabolic_model::Notes;

fn notes_of(component: &Element) -> Notes {
    component.child("notes").map(parse_notes).unwrap_or_default()
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

/// Build a model from the root `<sbml>` element of a document
pub(super) fn model_from_document(root: &Element) -> Result<Model, SbmlError> {
    if root.local_name() != "sbml" {
        return Err(SbmlError::MissingElement("sbml".to_string()));
    }
    let sbml_model = root
        .child("model")
        .ok_or_else(|| SbmlError::MissingElement("model".to_string()))?;

    let mut model = Model::new_empty();
    model.id = sbml_model.attr("id").map(|id| decode_sid(id, ""));
    model.name = sbml_model.attr("name").map(str::to_string);
    model.notes = notes_of(sbml_model);
    model.annotation = parse_annotation(sbml_model);
    model.version = model.notes.shift_remove(VERSION_NOTE);

    for compartment in sbml_model.list_items("listOfCompartments", "compartment") {
        let id = compartment.required_attr("id")?;
        let name = compartment.attr("name").unwrap_or(id);
        model.compartments.insert(id.to_string(), name.to_string());
    }

    for species in sbml_model.list_items("listOfSpecies", "species") {
        model.add_metabolite(read_species(species)?);
    }

    let mut parameters: HashMap<&str, f64> = HashMap::new();
    for parameter in sbml_model.list_items("listOfParameters", "parameter") {
        let id = parameter.required_attr("id")?;
        let value = parse_number(parameter.required_attr("value")?)?;
        parameters.insert(id, value);
    }

    for gene_product in sbml_model.list_items("listOfGeneProducts", "geneProduct") {
        model.add_gene(read_gene_product(gene_product)?);
    }

    for reaction in sbml_model.list_items("listOfReactions", "reaction") {
        let reaction = read_reaction(reaction, &parameters, &mut model.genes)?;
        model.add_reaction(reaction);
    }

    model.objective = read_objective(sbml_model)?;
    assign_subsystems(sbml_model, &mut model.reactions);

    debug!(
        "Parsed SBML model {:?} with {} compartments, {} metabolites, {} reactions and {} genes",
        model.id,
        model.compartments.len(),
        model.metabolites.len(),
        model.reactions.len(),
        model.genes.len()
    );
    Ok(model)
}

fn read_species(species: &Element) -> Result<Metabolite, SbmlError> {
    let charge = species
        .attr("charge")
        .map(|c| {
            c.trim().parse::<i32>().map_err(|source| SbmlError::InvalidInteger {
                value: c.to_string(),
                source,
            })
        })
        .transpose()?
        .unwrap_or_default();
    Ok(MetaboliteBuilder::default()
        .id(decode_sid(species.required_attr("id")?, METABOLITE_PREFIX))
        .name(species.attr("name").map(str::to_string))
        .compartment(species.attr("compartment").map(str::to_string))
        .charge(charge)
        .formula(species.attr("chemicalFormula").map(str::to_string))
        .boundary_condition(species.attr("boundaryCondition").is_some_and(parse_bool))
        .notes(notes_of(species))
        .annotation(parse_annotation(species))
        .build()?)
}

fn read_gene_product(gene_product: &Element) -> Result<Gene, SbmlError> {
    Ok(GeneBuilder::default()
        .id(decode_sid(gene_product.required_attr("id")?, GENE_PREFIX))
        .name(gene_product.attr("name").map(str::to_string))
        .notes(notes_of(gene_product))
        .annotation(parse_annotation(gene_product))
        .build()?)
}

fn read_reaction(
    reaction: &Element,
    parameters: &HashMap<&str, f64>,
    genes: &mut IndexMap<String, Gene>,
) -> Result<Reaction, SbmlError> {
    let id = decode_sid(reaction.required_attr("id")?, REACTION_PREFIX);

    let mut metabolites: IndexMap<String, f64> = IndexMap::new();
    for (list, sign) in [("listOfReactants", -1f64), ("listOfProducts", 1f64)] {
        for reference in reaction.list_items(list, "speciesReference") {
            let species = decode_sid(reference.required_attr("species")?, METABOLITE_PREFIX);
            let stoichiometry = match reference.attr("stoichiometry") {
                Some(value) => parse_number(value)?,
                None => 1f64,
            };
            *metabolites.entry(species).or_insert(0f64) += sign * stoichiometry;
        }
    }

    let reversible = reaction.attr("reversible").map_or(true, parse_bool);
    let bound = |attribute: &str| -> Result<Option<f64>, SbmlError> {
        match reaction.attr(attribute) {
            Some(parameter) => parameters
                .get(parameter)
                .copied()
                .map(Some)
                .ok_or_else(|| SbmlError::UnknownParameter(parameter.to_string())),
            None => Ok(None),
        }
    };
    let (default_lower, default_upper) = {
        let config = read_configuration();
        (config.lower_bound, config.upper_bound)
    };
    let lower_bound = bound("lowerFluxBound")?
        .unwrap_or(if reversible { default_lower } else { 0f64 });
    let upper_bound = bound("upperFluxBound")?.unwrap_or(default_upper);

    let gpr = match reaction
        .child("geneProductAssociation")
        .and_then(|association| association.children.first())
    {
        Some(root) => Some(read_association(root, genes)?),
        None => None,
    };

    Ok(ReactionBuilder::default()
        .id(id)
        .name(reaction.attr("name").map(str::to_string))
        .metabolites(metabolites)
        .lower_bound(lower_bound)
        .upper_bound(upper_bound)
        .gpr(gpr)
        .notes(notes_of(reaction))
        .annotation(parse_annotation(reaction))
        .build()?)
}

/// Convert an fbc association (`or`, `and`, `geneProductRef`) into a GPR tree
///
/// n-ary operations are folded left into nested binary operations.
fn read_association(
    element: &Element,
    genes: &mut IndexMap<String, Gene>,
) -> Result<Gpr, SbmlError> {
    let operator = match element.local_name() {
        "geneProductRef" => {
            let id = decode_sid(element.required_attr("geneProduct")?, GENE_PREFIX);
            if !genes.contains_key(&id) {
                warn!("Gene {id} is used in a gene product association but never declared");
                genes.insert(id.clone(), Gene::with_id(&id));
            }
            return Ok(Gpr::new_gene_node(&id));
        }
        "or" => GprOperatorType::Or,
        "and" => GprOperatorType::And,
        other => return Err(SbmlError::UnsupportedAssociation(other.to_string())),
    };
    let mut operands = element.children.iter();
    let first = operands
        .next()
        .ok_or_else(|| SbmlError::EmptyAssociation(element.name.clone()))?;
    let mut gpr = read_association(first, genes)?;
    for operand in operands {
        let right = read_association(operand, genes)?;
        gpr = Gpr::new_binary_operation(gpr, operator, right)?;
    }
    Ok(gpr)
}

/// Read the coefficients of the active objective, with minimization expressed as negative
/// coefficients
fn read_objective(sbml_model: &Element) -> Result<IndexMap<String, f64>, SbmlError> {
    let mut objective = IndexMap::new();
    let Some(objectives) = sbml_model.child("listOfObjectives") else {
        return Ok(objective);
    };
    let active = objectives.attr("activeObjective");
    let chosen = objectives
        .children_named("objective")
        .find(|o| active.is_none() || o.attr("id") == active)
        .or_else(|| objectives.children_named("objective").next());
    let Some(chosen) = chosen else {
        return Ok(objective);
    };
    let sign = if chosen.attr("type") == Some("minimize") {
        -1f64
    } else {
        1f64
    };
    for flux_objective in chosen.list_items("listOfFluxObjectives", "fluxObjective") {
        let reaction = decode_sid(flux_objective.required_attr("reaction")?, REACTION_PREFIX);
        let coefficient = parse_number(flux_objective.required_attr("coefficient")?)?;
        objective.insert(reaction, sign * coefficient);
    }
    Ok(objective)
}

/// Use the names of the groups as the subsystem of their member reactions
fn assign_subsystems(sbml_model: &Element, reactions: &mut IndexMap<String, Reaction>) {
    for group in sbml_model.list_items("listOfGroups", "group") {
        let Some(name) = group.attr("name").or_else(|| group.attr("id")) else {
            continue;
        };
        for member in group.list_items("listOfMembers", "member") {
            let Some(id_ref) = member.attr("idRef") else {
                continue;
            };
            let reaction_id = decode_sid(id_ref, REACTION_PREFIX);
            match reactions.get_mut(&reaction_id) {
                Some(reaction) if reaction.subsystem.is_none() => {
                    reaction.subsystem = Some(name.to_string())
                }
                Some(_) => debug!("Reaction {reaction_id} already has a subsystem, ignoring group {name}"),
                None => debug!("Group {name} member {id_ref} is not a reaction"),
            }
        }
    }
}
