//! Module providing SBML IO for Models
//!
//! Supports SBML Level 3 Version 1 documents using the flux balance constraints (fbc, version 2)
//! package for bounds, objectives and gene products, and the groups package (version 1) for
//! reaction subsystems.
use std::fs;
use std::num::{ParseFloatError, ParseIntError};
use std::path::Path;

use log::info;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

use crate::metabolic_model::gene::GeneBuilderError;
use crate::metabolic_model::metabolite::MetaboliteBuilderError;
use crate::metabolic_model::model::{GprError, Model};
use crate::metabolic_model::reaction::ReactionBuilderError;

mod annotation;
mod reader;
pub mod sid;
mod writer;
mod xml;

pub const SBML_NS: &str = "http://www.sbml.org/sbml/level3/version1/core";
pub const FBC_NS: &str = "http://www.sbml.org/sbml/level3/version1/fbc/version2";
pub const GROUPS_NS: &str = "http://www.sbml.org/sbml/level3/version1/groups/version1";
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const BQBIOL_NS: &str = "http://biomodels.net/biology-qualifiers/";

/// Model notes key holding [`Model::version`]
pub const VERSION_NOTE: &str = "Version";

/// Parse an SBML double, which spells infinity as `INF`
pub(crate) fn parse_number(value: &str) -> Result<f64, SbmlError> {
    let trimmed = value.trim();
    match trimmed {
        "INF" | "inf" | "Infinity" => Ok(f64::INFINITY),
        "-INF" | "-inf" | "-Infinity" => Ok(f64::NEG_INFINITY),
        _ => trimmed
            .parse::<f64>()
            .map_err(|source| SbmlError::InvalidNumber {
                value: value.to_string(),
                source,
            }),
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        format!("{}", value)
    }
}

impl Model {
    /// Read a Model from an SBML file
    ///
    /// # Examples
    /// ```rust,no_run
    /// use yeastgem_core::metabolic_model::model::Model;
    /// let model = Model::read_sbml("ModelFiles/xml/yeastGEM.xml").unwrap();
    /// println!("{} reactions", model.reactions.len());
    /// ```
    pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<Model, SbmlError> {
        let path = path.as_ref();
        let document = fs::read_to_string(path)?;
        let model = Model::from_sbml_str(&document)?;
        info!(
            "Read SBML model {} ({} metabolites, {} reactions)",
            path.display(),
            model.metabolites.len(),
            model.reactions.len()
        );
        Ok(model)
    }

    /// Parse a Model from the text of an SBML document
    pub fn from_sbml_str(document: &str) -> Result<Model, SbmlError> {
        let root = xml::parse_document(document)?;
        reader::model_from_document(&root)
    }

    /// Serialize the Model to the text of an SBML document
    pub fn to_sbml_string(&self) -> Result<String, SbmlError> {
        let root = writer::model_to_document(self)?;
        xml::write_document(&root)
    }

    /// Write the Model to an SBML file, replacing any previous contents
    pub fn write_sbml<P: AsRef<Path>>(&self, path: P) -> Result<(), SbmlError> {
        let path = path.as_ref();
        let document = self.to_sbml_string()?;
        fs::write(path, document)?;
        info!("Wrote SBML model {}", path.display());
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SbmlError {
    #[error("Unable to read or write SBML file")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse XML")]
    Xml(#[from] quick_xml::Error),
    #[error("Unable to parse XML attribute")]
    Attribute(#[from] AttrError),
    #[error("Serialized SBML is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Malformed XML document: {0}")]
    MalformedDocument(String),
    #[error("Missing required element <{0}>")]
    MissingElement(String),
    #[error("Element <{element}> is missing required attribute `{attribute}`")]
    MissingAttribute { element: String, attribute: String },
    #[error("Invalid number {value:?}")]
    InvalidNumber {
        value: String,
        source: ParseFloatError,
    },
    #[error("Invalid integer {value:?}")]
    InvalidInteger { value: String, source: ParseIntError },
    #[error("Flux bound refers to undefined parameter {0}")]
    UnknownParameter(String),
    #[error("Unsupported element <{0}> in gene product association")]
    UnsupportedAssociation(String),
    #[error("Gene product association <{0}> has no operands")]
    EmptyAssociation(String),
    #[error("GPR {0} uses `not`, which can't be expressed in SBML fbc")]
    UnsupportedGpr(String),
    #[error("Invalid GPR")]
    InvalidGpr(#[from] GprError),
    #[error("Unable to build metabolite")]
    UnableToBuildMetabolite(#[from] MetaboliteBuilderError),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Unable to build gene")]
    UnableToBuildGene(#[from] GeneBuilderError),
}

#[cfg(test)]
mod sbml_tests {
    use super::*;
    use crate::metabolic_model::model::{Gpr, GprOperation};
    use std::path::PathBuf;

    fn mini_yeast_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("mini_yeast.xml")
    }

    fn gene(id: &str) -> Box<Gpr> {
        Box::new(Gpr::GeneNode(id.to_string()))
    }

    #[test]
    fn read_sbml() {
        let model = Model::read_sbml(mini_yeast_path()).unwrap();

        // Model level information
        assert_eq!(model.id.clone().unwrap(), "yeastGEM_mini");
        assert_eq!(model.name.clone().unwrap(), "Reduced yeast-GEM");
        let compartments: Vec<&str> = model.compartments.keys().map(String::as_str).collect();
        assert_eq!(compartments, vec!["c", "e", "er", "erm", "p"]);
        assert_eq!(model.compartments["erm"], "endoplasmic reticulum membrane");

        // Metabolites
        assert_eq!(model.metabolites.len(), 6);
        let (_, first) = model.metabolites.first().unwrap();
        assert_eq!(first.id, "s_0001[er]");
        assert_eq!(
            first.name.clone().unwrap(),
            "(1->3)-beta-D-glucan [endoplasmic reticulum]"
        );
        assert_eq!(first.compartment.clone().unwrap(), "er");
        assert_eq!(first.annotation["sbo"], vec!["SBO:0000247".to_string()]);
        let atp = &model.metabolites["s_0434[c]"];
        assert_eq!(atp.charge, -4);
        assert_eq!(atp.formula.clone().unwrap(), "C10H12N5O13P3");
        assert_eq!(atp.notes["BioCyc"], "ATP");
        assert_eq!(atp.annotation["bigg.metabolite"], vec!["atp".to_string()]);
        assert_eq!(atp.annotation["kegg.compound"], vec!["C00002".to_string()]);

        // Reactions
        assert_eq!(model.reactions.len(), 4);
        let transport = &model.reactions["r_1166"];
        assert_eq!(transport.name.clone().unwrap(), "glucose transport");
        assert!((transport.lower_bound - 0.0).abs() < 1e-25);
        assert!((transport.upper_bound - 1000.0).abs() < 1e-25);
        assert!((transport.metabolites["s_0565[e]"] + 1.0).abs() < 1e-25);
        assert!((transport.metabolites["s_0563[c]"] - 1.0).abs() < 1e-25);
        assert_eq!(transport.subsystem.clone().unwrap(), "Transport");
        assert_eq!(transport.notes["Confidence Level"], "3");
        assert_eq!(
            transport.gpr.clone().unwrap(),
            Gpr::Operation(GprOperation::Or {
                left: Box::new(Gpr::Operation(GprOperation::Or {
                    left: gene("YDR342C"),
                    right: gene("YHR094C"),
                })),
                right: gene("YHR092C"),
            })
        );

        let hydrolysis = &model.reactions["r_0100"];
        assert!((hydrolysis.lower_bound + 1000.0).abs() < 1e-25);
        assert!((hydrolysis.metabolites["s_0803[p]"] + 2.0).abs() < 1e-25);
        assert_eq!(hydrolysis.gpr.clone().unwrap().to_string_id(), "(YDR342C and YHR094C)");
        assert!(hydrolysis.subsystem.is_none());

        let exchange = &model.reactions["r_1714"];
        assert!((exchange.lower_bound + 10.0).abs() < 1e-25);
        assert_eq!(exchange.annotation["sbo"], vec!["SBO:0000627".to_string()]);
        assert_eq!(
            exchange.annotation["bigg.reaction"],
            vec!["EX_glc__D_e".to_string()]
        );

        // Genes, the undeclared YHR092C is created from the association
        let genes: Vec<&str> = model.genes.keys().map(String::as_str).collect();
        assert_eq!(genes, vec!["YDR342C", "YHR094C", "YHR092C"]);
        assert_eq!(model.genes["YDR342C"].name.clone().unwrap(), "HXT7");

        // Objective
        assert_eq!(model.objective.len(), 1);
        assert!((model.objective["r_1166"] - 1.0).abs() < 1e-25);
    }

    #[test]
    fn write_then_read() {
        let model = Model::read_sbml(mini_yeast_path()).unwrap();
        let document = model.to_sbml_string().unwrap();
        let reread = Model::from_sbml_str(&document).unwrap();
        assert_eq!(reread.metabolite_ids(), model.metabolite_ids());
        assert_eq!(reread.reaction_ids(), model.reaction_ids());
        assert_eq!(reread.compartment_ids(), model.compartment_ids());
        assert_eq!(reread, model);
    }

    #[test]
    fn written_document() {
        let model = Model::read_sbml(mini_yeast_path()).unwrap();
        let document = model.to_sbml_string().unwrap();
        assert!(document.contains(r#"id="M_s_0001__91__er__93__""#));
        assert!(document.contains(r#"fbc:lowerFluxBound="R_r_1714_lower_bound""#));
        assert!(document.contains(r#"id="R_r_1714_lower_bound" value="-10""#));
        assert!(document.contains(r#"fbc:geneProduct="G_YHR092C""#));
        assert!(document.contains(r#"groups:name="Transport""#));
        assert!(document.contains("https://identifiers.org/bigg.metabolite/atp"));
    }

    #[test]
    fn write_sbml_file() {
        let model = Model::read_sbml(mini_yeast_path()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.xml");
        model.write_sbml(&path).unwrap();
        let reread = Model::read_sbml(&path).unwrap();
        assert_eq!(reread, model);
    }

    #[test]
    fn model_metadata() {
        let model = Model::read_sbml(mini_yeast_path()).unwrap();
        assert_eq!(
            model.notes["Description"],
            "Reduced version of yeast-GEM covering glucose uptake"
        );
        assert_eq!(model.version.clone().unwrap(), "8.6.0");
        // The version is held by the model, not duplicated in its notes
        assert!(!model.notes.contains_key(VERSION_NOTE));
        assert_eq!(model.annotation["taxonomy"], vec!["4932".to_string()]);

        let document = model.to_sbml_string().unwrap();
        assert!(document.contains("https://identifiers.org/taxonomy/4932"));
        assert!(document.contains("Description: Reduced version of yeast-GEM"));
        assert!(document.contains("Version: 8.6.0"));
        assert!(document.contains(r#"metaid="meta_yeastGEM_mini""#));

        let mut reread = Model::from_sbml_str(&document).unwrap();
        assert_eq!(reread.notes, model.notes);
        assert_eq!(reread.annotation, model.annotation);
        assert_eq!(reread.version, model.version);

        // A model without an id still keeps its metadata
        reread.id = None;
        let reread = Model::from_sbml_str(&reread.to_sbml_string().unwrap()).unwrap();
        assert!(reread.id.is_none());
        assert_eq!(reread.annotation["taxonomy"], vec!["4932".to_string()]);
        assert_eq!(reread.version.clone().unwrap(), "8.6.0");
    }

    #[test]
    fn net_zero_stoichiometry() {
        let document = format!(
            r#"<sbml xmlns="{SBML_NS}" level="3" version="1">
  <model id="cycle">
    <listOfSpecies>
      <species id="M_atp__91__c__93__" compartment="c"/>
      <species id="M_adp__91__c__93__" compartment="c"/>
    </listOfSpecies>
    <listOfReactions>
      <reaction id="R_r_0001" reversible="true" fast="false">
        <listOfReactants>
          <speciesReference species="M_atp__91__c__93__" stoichiometry="1"/>
        </listOfReactants>
        <listOfProducts>
          <speciesReference species="M_atp__91__c__93__" stoichiometry="1"/>
          <speciesReference species="M_adp__91__c__93__" stoichiometry="2"/>
        </listOfProducts>
      </reaction>
    </listOfReactions>
  </model>
</sbml>"#
        );
        let model = Model::from_sbml_str(&document).unwrap();
        let stoichiometry = &model.reactions["r_0001"].metabolites;
        assert_eq!(stoichiometry.len(), 2);
        assert!(stoichiometry["atp[c]"].abs() < 1e-25);

        let reread = Model::from_sbml_str(&model.to_sbml_string().unwrap()).unwrap();
        let stoichiometry = &reread.reactions["r_0001"].metabolites;
        assert!(stoichiometry.contains_key("atp[c]"));
        assert!((stoichiometry["adp[c]"] - 2.0).abs() < 1e-25);
        assert_eq!(reread, model);
    }

    #[test]
    fn missing_bounds_use_defaults() {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="{SBML_NS}" level="3" version="1">
  <model id="bounds">
    <listOfReactions>
      <reaction id="R_irreversible" reversible="false" fast="false"/>
      <reaction id="R_reversible" reversible="true" fast="false"/>
    </listOfReactions>
  </model>
</sbml>"#
        );
        let model = Model::from_sbml_str(&document).unwrap();
        assert!((model.reactions["irreversible"].lower_bound - 0.0).abs() < 1e-25);
        assert!((model.reactions["reversible"].lower_bound + 1000.0).abs() < 1e-25);
        assert!((model.reactions["reversible"].upper_bound - 1000.0).abs() < 1e-25);
    }

    #[test]
    fn undefined_bound_parameter() {
        let document = format!(
            r#"<sbml xmlns="{SBML_NS}" xmlns:fbc="{FBC_NS}" level="3" version="1">
  <model id="bounds">
    <listOfReactions>
      <reaction id="R_a" reversible="false" fast="false" fbc:lowerFluxBound="nowhere"/>
    </listOfReactions>
  </model>
</sbml>"#
        );
        assert!(matches!(
            Model::from_sbml_str(&document),
            Err(SbmlError::UnknownParameter(p)) if p == "nowhere"
        ));
    }

    #[test]
    fn not_a_model() {
        assert!(matches!(
            Model::from_sbml_str("<html><body/></html>"),
            Err(SbmlError::MissingElement(e)) if e == "sbml"
        ));
        assert!(matches!(
            Model::read_sbml("does/not/exist.xml"),
            Err(SbmlError::Io(_))
        ));
    }

    #[test]
    fn not_gpr_is_rejected() {
        let mut model = Model::read_sbml(mini_yeast_path()).unwrap();
        let reaction = model.reactions.get_mut("r_1757").unwrap();
        reaction.gpr = Some(Gpr::Operation(GprOperation::Not {
            val: gene("YDR342C"),
        }));
        assert!(matches!(
            model.to_sbml_string(),
            Err(SbmlError::UnsupportedGpr(_))
        ));
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("INF").unwrap(), f64::INFINITY);
        assert_eq!(parse_number(" -INF ").unwrap(), f64::NEG_INFINITY);
        assert!((parse_number("-1e3").unwrap() + 1000.0).abs() < 1e-25);
        assert!(parse_number("lots").is_err());
        assert_eq!(format_number(f64::NEG_INFINITY), "-INF");
        assert_eq!(format_number(-1000.0), "-1000");
        assert_eq!(format_number(0.5), "0.5");
    }
}
