//! Minimal XML element tree built from quick-xml events.
//!
//! Both `.stringsdict` (plist) and Android `strings.xml` need random access to
//! children and mixed content, which is simpler over a small tree than over a
//! raw event stream.

use quick_xml::{Reader, events::Event};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements, skipping text nodes.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// All descendant text concatenated, markup dropped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }
}

/// Parses a whole document into its root element.
///
/// Returns `Ok(None)` for input without any element (empty or whitespace).
pub(crate) fn parse_document(content: &str) -> Result<Option<Element>, Error> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(element_from(&e)?);
            }
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(Error::malformed("unexpected closing tag"));
                };
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e.unescape()?.into_owned();
                push_text(&mut stack, text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::malformed(format!(
            "unclosed element <{}>",
            open.name
        )));
    }
    Ok(root)
}

fn element_from(start: &quick_xml::events::BytesStart) -> Result<Element, Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::malformed(format!(
                "multiple root elements (found <{}>)",
                element.name
            )));
        }
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: String) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Text(text)),
        None if text.trim().is_empty() => {}
        None => return Err(Error::malformed("text outside of the root element")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements_and_text() {
        let root = parse_document(r#"<a x="1"><b>hi <i>there</i></b><c/></a>"#)
            .unwrap()
            .unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.attr("x"), Some("1"));
        let children: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(children, vec!["b", "c"]);
        assert_eq!(root.text(), "hi there");
    }

    #[test]
    fn test_entities_and_cdata() {
        let root = parse_document("<a>x &amp; y<![CDATA[<raw>]]></a>")
            .unwrap()
            .unwrap();
        assert_eq!(root.text(), "x & y<raw>");
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_document("").unwrap().is_none());
        assert!(parse_document("<?xml version=\"1.0\"?>\n").unwrap().is_none());
    }

    #[test]
    fn test_unbalanced_document_is_error() {
        assert!(parse_document("<a><b></a>").is_err());
        assert!(parse_document("<a><b></b>").is_err());
        assert!(parse_document("<a/><b/>").is_err());
    }
}
