//! XHTML notes and MIRIAM/RDF annotations of SBML components
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::xml::Element;
use super::{BQBIOL_NS, RDF_NS, XHTML_NS};
use crate::metabolic_model::{Annotation, Notes};

/// Annotation key holding the SBO term, stored in SBML as the `sboTerm` attribute
pub const SBO_KEY: &str = "sbo";

static IDENTIFIERS_ORG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://identifiers\.org/(.+?)[:/](.+)$")
        .expect("identifiers.org pattern is valid")
});

/// Read `KEY: value` paragraphs from a `<notes>` element
pub fn parse_notes(notes: &Element) -> Notes {
    let mut parsed = Notes::new();
    for paragraph in notes.descendants_named("p") {
        if let Some((key, value)) = paragraph.text.split_once(':') {
            parsed.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    parsed
}

pub fn notes_element(notes: &Notes) -> Option<Element> {
    if notes.is_empty() {
        return None;
    }
    let mut body = Element::new("body").with_attr("xmlns", XHTML_NS);
    for (key, value) in notes {
        body.push(Element::new("p").with_text(format!("{key}: {value}")));
    }
    Some(Element::new("notes").with_child(body))
}

/// Collect the annotation of a component from its `sboTerm` and its `<annotation>` element
pub fn parse_annotation(component: &Element) -> Annotation {
    let mut parsed = Annotation::new();
    if let Some(sbo) = component.attr("sboTerm") {
        parsed.insert(SBO_KEY.to_string(), vec![sbo.to_string()]);
    }
    let Some(annotation) = component.child("annotation") else {
        return parsed;
    };
    for item in annotation.descendants_named("li") {
        let Some(resource) = item.attr("resource") else {
            continue;
        };
        match IDENTIFIERS_ORG.captures(resource) {
            Some(caps) => {
                let ids = parsed.entry(caps[1].to_string()).or_default();
                if !ids.iter().any(|id| id == &caps[2]) {
                    ids.push(caps[2].to_string());
                }
            }
            None => debug!("Skipping annotation resource {resource}, not an identifiers.org URI"),
        }
    }
    parsed
}

/// The SBO term of an annotation, if any
pub fn sbo_term(annotation: &Annotation) -> Option<&str> {
    crate::metabolic_model::first_annotation(annotation, SBO_KEY)
}

/// Build the `<annotation>` element for a component with the given metaid
///
/// Returns None when there are no cross references besides the SBO term.
pub fn annotation_element(annotation: &Annotation, metaid: &str) -> Option<Element> {
    let mut bag = Element::new("rdf:Bag");
    for (provider, ids) in annotation.iter().filter(|(p, _)| p.as_str() != SBO_KEY) {
        for id in ids {
            bag.push(
                Element::new("rdf:li")
                    .with_attr("rdf:resource", format!("https://identifiers.org/{provider}/{id}")),
            );
        }
    }
    if bag.children.is_empty() {
        return None;
    }
    let description = Element::new("rdf:Description")
        .with_attr("rdf:about", format!("#{metaid}"))
        .with_child(Element::new("bqbiol:is").with_child(bag));
    let rdf = Element::new("rdf:RDF")
        .with_attr("xmlns:rdf", RDF_NS)
        .with_attr("xmlns:bqbiol", BQBIOL_NS)
        .with_child(description);
    Some(Element::new("annotation").with_child(rdf))
}

/// Add the SBO term, notes and annotation of a component to its element
///
/// `metaid` is only set when an annotation is written, as the RDF refers back to it.
pub fn annotate(mut element: Element, sid: &str, notes: &Notes, annotation: &Annotation) -> Element {
    if let Some(sbo) = sbo_term(annotation) {
        element.attributes.insert("sboTerm".to_string(), sbo.to_string());
    }
    let metaid = format!("meta_{sid}");
    let rdf = annotation_element(annotation, &metaid);
    if rdf.is_some() {
        element.attributes.shift_insert(0, "metaid".to_string(), metaid);
    }
    // SBase children come before any component specific children
    let mut children: Vec<Element> = notes_element(notes).into_iter().chain(rdf).collect();
    children.append(&mut element.children);
    element.children = children;
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sbml::xml::parse_document;

    const SPECIES: &str = r##"<species metaid="meta_M_atp_c" sboTerm="SBO:0000247" id="M_atp_c">
  <notes>
    <body xmlns="http://www.w3.org/1999/xhtml">
      <p>BioCyc: ATP</p>
      <p>Original ID: s_0434[c]</p>
      <p>no separator here</p>
    </body>
  </notes>
  <annotation>
    <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:bqbiol="http://biomodels.net/biology-qualifiers/">
      <rdf:Description rdf:about="#meta_M_atp_c">
        <bqbiol:is>
          <rdf:Bag>
            <rdf:li rdf:resource="https://identifiers.org/bigg.metabolite/atp"/>
            <rdf:li rdf:resource="https://identifiers.org/chebi/CHEBI:30616"/>
            <rdf:li rdf:resource="https://identifiers.org/chebi/CHEBI:15422"/>
            <rdf:li rdf:resource="http://example.org/not-an-identifier"/>
          </rdf:Bag>
        </bqbiol:is>
      </rdf:Description>
    </rdf:RDF>
  </annotation>
</species>"##;

    #[test]
    fn read_notes() {
        let species = parse_document(SPECIES).unwrap();
        let notes = parse_notes(species.child("notes").unwrap());
        assert_eq!(notes.len(), 2);
        assert_eq!(notes["BioCyc"], "ATP");
        assert_eq!(notes["Original ID"], "s_0434[c]");
    }

    #[test]
    fn read_annotation() {
        let species = parse_document(SPECIES).unwrap();
        let annotation = parse_annotation(&species);
        assert_eq!(annotation[SBO_KEY], vec!["SBO:0000247".to_string()]);
        assert_eq!(annotation["bigg.metabolite"], vec!["atp".to_string()]);
        assert_eq!(
            annotation["chebi"],
            vec!["CHEBI:30616".to_string(), "CHEBI:15422".to_string()]
        );
        assert_eq!(annotation.len(), 3);
    }

    #[test]
    fn annotate_then_read() {
        let mut notes = Notes::new();
        notes.insert("Original ID".to_string(), "s_0434[c]".to_string());
        let mut annotation = Annotation::new();
        annotation.insert(SBO_KEY.to_string(), vec!["SBO:0000247".to_string()]);
        annotation.insert("bigg.metabolite".to_string(), vec!["atp".to_string()]);

        let species = annotate(
            Element::new("species").with_attr("id", "M_atp_c"),
            "M_atp_c",
            &notes,
            &annotation,
        );
        assert_eq!(species.attr("metaid"), Some("meta_M_atp_c"));
        assert_eq!(species.children[0].local_name(), "notes");
        assert_eq!(species.children[1].local_name(), "annotation");
        assert_eq!(parse_notes(species.child("notes").unwrap()), notes);
        assert_eq!(parse_annotation(&species), annotation);
    }

    #[test]
    fn sbo_only_has_no_rdf() {
        let mut annotation = Annotation::new();
        annotation.insert(SBO_KEY.to_string(), vec!["SBO:0000176".to_string()]);
        let reaction = annotate(Element::new("reaction"), "R_r_0001", &Notes::new(), &annotation);
        assert_eq!(reaction.attr("sboTerm"), Some("SBO:0000176"));
        assert_eq!(reaction.attr("metaid"), None);
        assert!(reaction.children.is_empty());
    }
}
