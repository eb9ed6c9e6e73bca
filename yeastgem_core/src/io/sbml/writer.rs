//! Conversion of a [`Model`] into an SBML Level 3 Version 1 document (fbc v2, groups v1)
use indexmap::IndexMap;

use super::annotation::annotate;
use super::sid::{encode_sid, GENE_PREFIX, METABOLITE_PREFIX, REACTION_PREFIX};
use super::xml::Element;
use super::{format_number, SbmlError, FBC_NS, GROUPS_NS, SBML_NS, VERSION_NOTE};
use crate::configuration::read_configuration;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Gpr, GprOperation, Model};
use crate::metabolic_model::reaction::Reaction;

const DEFAULT_LOWER_BOUND_ID: &str = "cobra_default_lb";
const DEFAULT_UPPER_BOUND_ID: &str = "cobra_default_ub";
const ZERO_BOUND_ID: &str = "cobra_0_bound";
const OBJECTIVE_ID: &str = "obj";
/// SBO term for flux bound parameters
const FLUX_BOUND_SBO: &str = "SBO:0000626";

/// Flux bound parameters, shared between reactions wherever the value allows it
struct FluxBounds {
    default_lower: f64,
    default_upper: f64,
    parameters: IndexMap<String, f64>,
}

impl FluxBounds {
    fn new() -> Self {
        let config = read_configuration();
        let mut parameters = IndexMap::new();
        parameters.insert(DEFAULT_LOWER_BOUND_ID.to_string(), config.lower_bound);
        parameters.insert(DEFAULT_UPPER_BOUND_ID.to_string(), config.upper_bound);
        parameters.insert(ZERO_BOUND_ID.to_string(), 0f64);
        FluxBounds {
            default_lower: config.lower_bound,
            default_upper: config.upper_bound,
            parameters,
        }
    }

    /// Get the id of the parameter holding `value`, creating a reaction specific one if needed
    fn parameter_for(&mut self, reaction_sid: &str, side: &str, value: f64) -> String {
        if value == self.default_lower {
            return DEFAULT_LOWER_BOUND_ID.to_string();
        }
        if value == self.default_upper {
            return DEFAULT_UPPER_BOUND_ID.to_string();
        }
        if value == 0f64 {
            return ZERO_BOUND_ID.to_string();
        }
        let id = format!("{reaction_sid}_{side}_bound");
        self.parameters.insert(id.clone(), value);
        id
    }

    fn into_element(self) -> Element {
        let mut list = Element::new("listOfParameters");
        for (id, value) in self.parameters {
            list.push(
                Element::new("parameter")
                    .with_attr("sboTerm", FLUX_BOUND_SBO)
                    .with_attr("id", id)
                    .with_attr("value", format_number(value))
                    .with_attr("constant", "true"),
            );
        }
        list
    }
}

/// Build the `<sbml>` root element for a model
pub(super) fn model_to_document(model: &Model) -> Result<Element, SbmlError> {
    let model_sid = model
        .id
        .as_deref()
        .map_or_else(|| "model".to_string(), |id| encode_sid(id, ""));
    let mut sbml_model = Element::new("model");
    if model.id.is_some() {
        sbml_model = sbml_model.with_attr("id", model_sid.as_str());
    }
    if let Some(name) = &model.name {
        sbml_model = sbml_model.with_attr("name", name.as_str());
    }
    sbml_model = sbml_model.with_attr("fbc:strict", "true");

    let mut compartments = Element::new("listOfCompartments");
    for (id, name) in &model.compartments {
        compartments.push(
            Element::new("compartment")
                .with_attr("id", id.as_str())
                .with_attr("name", name.as_str())
                .with_attr("constant", "true"),
        );
    }
    sbml_model.push(compartments);

    let mut species = Element::new("listOfSpecies");
    for metabolite in model.metabolites.values() {
        species.push(species_element(metabolite));
    }
    sbml_model.push(species);

    let mut bounds = FluxBounds::new();
    let mut reactions = Element::new("listOfReactions");
    for reaction in model.reactions.values() {
        reactions.push(reaction_element(reaction, &mut bounds)?);
    }
    // Parameters precede reactions in an SBML model
    sbml_model.push(bounds.into_element());
    sbml_model.push(reactions);

    if !model.objective.is_empty() {
        sbml_model.push(objective_element(&model.objective));
    }

    let mut gene_products = Element::new("fbc:listOfGeneProducts");
    for gene in model.genes.values() {
        gene_products.push(gene_product_element(gene));
    }
    sbml_model.push(gene_products);

    if let Some(groups) = groups_element(model) {
        sbml_model.push(groups);
    }

    let mut notes = model.notes.clone();
    if let Some(version) = &model.version {
        notes.insert(VERSION_NOTE.to_string(), version.clone());
    }
    let sbml_model = annotate(sbml_model, &model_sid, &notes, &model.annotation);

    Ok(Element::new("sbml")
        .with_attr("xmlns", SBML_NS)
        .with_attr("xmlns:fbc", FBC_NS)
        .with_attr("xmlns:groups", GROUPS_NS)
        .with_attr("level", "3")
        .with_attr("version", "1")
        .with_attr("fbc:required", "false")
        .with_attr("groups:required", "false")
        .with_child(sbml_model))
}

fn species_element(metabolite: &Metabolite) -> Element {
    let sid = encode_sid(&metabolite.id, METABOLITE_PREFIX);
    let mut element = Element::new("species").with_attr("id", sid.as_str());
    if let Some(name) = &metabolite.name {
        element = element.with_attr("name", name.as_str());
    }
    if let Some(compartment) = &metabolite.compartment {
        element = element.with_attr("compartment", compartment.as_str());
    }
    element = element
        .with_attr("hasOnlySubstanceUnits", "false")
        .with_attr("boundaryCondition", metabolite.boundary_condition.to_string())
        .with_attr("constant", "false")
        .with_attr("fbc:charge", metabolite.charge.to_string());
    if let Some(formula) = &metabolite.formula {
        element = element.with_attr("fbc:chemicalFormula", formula.as_str());
    }
    annotate(element, &sid, &metabolite.notes, &metabolite.annotation)
}

fn reaction_element(reaction: &Reaction, bounds: &mut FluxBounds) -> Result<Element, SbmlError> {
    let sid = encode_sid(&reaction.id, REACTION_PREFIX);
    let lower = bounds.parameter_for(&sid, "lower", reaction.lower_bound);
    let upper = bounds.parameter_for(&sid, "upper", reaction.upper_bound);
    let mut element = Element::new("reaction").with_attr("id", sid.as_str());
    if let Some(name) = &reaction.name {
        element = element.with_attr("name", name.as_str());
    }
    let element = element
        .with_attr("reversible", reaction.is_reversible().to_string())
        .with_attr("fast", "false")
        .with_attr("fbc:lowerFluxBound", lower)
        .with_attr("fbc:upperFluxBound", upper);
    let mut element = annotate(element, &sid, &reaction.notes, &reaction.annotation);

    let species_references = |list: &str, refs: Vec<(&String, f64)>| -> Option<Element> {
        if refs.is_empty() {
            return None;
        }
        let mut list = Element::new(list);
        for (metabolite, stoichiometry) in refs {
            list.push(
                Element::new("speciesReference")
                    .with_attr("species", encode_sid(metabolite, METABOLITE_PREFIX))
                    .with_attr("stoichiometry", format_number(stoichiometry))
                    .with_attr("constant", "true"),
            );
        }
        Some(list)
    };
    // A species consumed and produced in equal amounts nets to zero, keep it as a reactant
    let net_zero = reaction
        .metabolites
        .iter()
        .filter(|(_, coef)| **coef == 0f64)
        .map(|(id, _)| (id, 0f64));
    element.children.extend(species_references(
        "listOfReactants",
        reaction.reactants().chain(net_zero).collect(),
    ));
    element.children.extend(species_references(
        "listOfProducts",
        reaction.products().collect(),
    ));

    if let Some(gpr) = &reaction.gpr {
        element.push(Element::new("fbc:geneProductAssociation").with_child(association_element(gpr)?));
    }
    Ok(element)
}

fn association_element(gpr: &Gpr) -> Result<Element, SbmlError> {
    match gpr {
        Gpr::GeneNode(gene) => Ok(Element::new("fbc:geneProductRef")
            .with_attr("fbc:geneProduct", encode_sid(gene, GENE_PREFIX))),
        Gpr::Operation(GprOperation::Or { left, right }) => Ok(Element::new("fbc:or")
            .with_child(association_element(left)?)
            .with_child(association_element(right)?)),
        Gpr::Operation(GprOperation::And { left, right }) => Ok(Element::new("fbc:and")
            .with_child(association_element(left)?)
            .with_child(association_element(right)?)),
        Gpr::Operation(GprOperation::Not { .. }) => {
            Err(SbmlError::UnsupportedGpr(gpr.to_string_id()))
        }
    }
}

fn objective_element(objective: &IndexMap<String, f64>) -> Element {
    let mut flux_objectives = Element::new("fbc:listOfFluxObjectives");
    for (reaction, coefficient) in objective {
        flux_objectives.push(
            Element::new("fbc:fluxObjective")
                .with_attr("fbc:reaction", encode_sid(reaction, REACTION_PREFIX))
                .with_attr("fbc:coefficient", format_number(*coefficient)),
        );
    }
    Element::new("fbc:listOfObjectives")
        .with_attr("fbc:activeObjective", OBJECTIVE_ID)
        .with_child(
            Element::new("fbc:objective")
                .with_attr("fbc:id", OBJECTIVE_ID)
                .with_attr("fbc:type", "maximize")
                .with_child(flux_objectives),
        )
}

fn gene_product_element(gene: &Gene) -> Element {
    let sid = encode_sid(&gene.id, GENE_PREFIX);
    let mut element = Element::new("fbc:geneProduct")
        .with_attr("fbc:id", sid.as_str())
        .with_attr("fbc:label", gene.id.as_str());
    if let Some(name) = &gene.name {
        element = element.with_attr("fbc:name", name.as_str());
    }
    annotate(element, &sid, &gene.notes, &gene.annotation)
}

/// One group per distinct subsystem, members in model order
fn groups_element(model: &Model) -> Option<Element> {
    let mut subsystems: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for reaction in model.reactions.values() {
        if let Some(subsystem) = &reaction.subsystem {
            subsystems
                .entry(subsystem.as_str())
                .or_default()
                .push(reaction.id.as_str());
        }
    }
    if subsystems.is_empty() {
        return None;
    }
    let mut groups = Element::new("groups:listOfGroups");
    for (n, (subsystem, members)) in subsystems.into_iter().enumerate() {
        let mut list = Element::new("groups:listOfMembers");
        for reaction in members {
            list.push(
                Element::new("groups:member")
                    .with_attr("groups:idRef", encode_sid(reaction, REACTION_PREFIX)),
            );
        }
        groups.push(
            Element::new("groups:group")
                .with_attr("groups:id", format!("g{}", n + 1))
                .with_attr("groups:name", subsystem)
                .with_attr("groups:kind", "partonomy")
                .with_child(list),
        );
    }
    Some(groups)
}
