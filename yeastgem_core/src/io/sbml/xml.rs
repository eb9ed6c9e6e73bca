//! Small owned XML element tree, enough to walk and rebuild SBML documents
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::SbmlError;

/// An XML element with its (prefixed) name, attributes, child elements and text content
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Element>,
    pub text: String,
}

/// Strip a namespace prefix, `fbc:geneProduct` becomes `geneProduct`
fn local_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Look up an attribute by local name, ignoring its prefix
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_name(key) == local && !key.starts_with("xmlns"))
            .map(|(_, value)| value.as_str())
    }

    /// Like [`Element::attr`], but a missing attribute is an error
    pub fn required_attr(&self, local: &str) -> Result<&str, SbmlError> {
        self.attr(local).ok_or_else(|| SbmlError::MissingAttribute {
            element: self.name.clone(),
            attribute: local.to_string(),
        })
    }

    /// First direct child with the given local name
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    /// Direct children with the given local name
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    /// Children of the list element `list` (e.g. the species of `listOfSpecies`)
    pub fn list_items<'a>(&'a self, list: &str, item: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child(list)
            .into_iter()
            .flat_map(move |l| l.children_named(item))
    }

    /// Every element below this one with the given local name, depth first
    pub fn descendants_named<'a>(&'a self, local: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(local, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, local: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.local_name() == local {
                found.push(child);
            }
            child.collect_descendants(local, found);
        }
    }
}

fn start_element(start: &BytesStart) -> Result<Element, SbmlError> {
    let mut element = Element::new(&String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

/// Attach a finished element to its parent, or make it the root
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None => *root = Some(element),
    }
}

/// Parse an XML document into its root element
pub fn parse_document(xml: &str) -> Result<Element, SbmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(start_element(&start)?),
            Event::Empty(start) => {
                let element = start_element(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    SbmlError::MalformedDocument(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    ))
                })?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if let Some(open) = stack.last() {
        return Err(SbmlError::MalformedDocument(format!(
            "element <{}> is never closed",
            open.name
        )));
    }
    root.ok_or_else(|| SbmlError::MalformedDocument("document has no root element".to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), SbmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() && element.text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    if !element.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&element.text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

/// Serialize an element tree as an indented, UTF-8 XML document
pub fn write_document(root: &Element) -> Result<String, SbmlError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nested() {
        let xml = r#"<?xml version="1.0"?>
<sbml xmlns:fbc="http://fbc" level="3">
  <model fbc:strict="true">
    <p>Original ID: s_0001[er]</p>
    <empty a="&lt;1&gt;"/>
  </model>
</sbml>"#;
        let root = parse_document(xml).unwrap();
        assert_eq!(root.local_name(), "sbml");
        assert_eq!(root.attr("level"), Some("3"));
        // Namespace declarations are not attributes
        assert_eq!(root.attr("fbc"), None);
        let model = root.child("model").unwrap();
        assert_eq!(model.attr("strict"), Some("true"));
        assert_eq!(model.child("p").unwrap().text, "Original ID: s_0001[er]");
        assert_eq!(model.child("empty").unwrap().attr("a"), Some("<1>"));
        assert_eq!(root.descendants_named("p").len(), 1);
    }

    #[test]
    fn unclosed_element() {
        assert!(parse_document("<sbml><model>").is_err());
    }

    #[test]
    fn write_then_parse() {
        let root = Element::new("sbml")
            .with_attr("level", "3")
            .with_child(
                Element::new("fbc:geneProduct")
                    .with_attr("fbc:id", "G_YDR342C")
                    .with_attr("fbc:name", "HXT7 & co"),
            )
            .with_child(Element::new("p").with_text("a < b"));
        let xml = write_document(&root).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        let parsed = parse_document(&xml).unwrap();
        assert_eq!(parsed, root);
    }
}
