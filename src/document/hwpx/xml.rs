//! Typed tag tree over quick-xml events
//!
//! Every node keeps the raw event it was parsed from, so writing an unedited
//! tree back out reproduces the input: attribute order and quoting, namespace
//! prefixes, whitespace text, entity spelling and `<a/>` vs `<a></a>`.
//! Callers should still compare [`XmlDocument::to_bytes`] against the input
//! before relying on that for a given part (see the editor's tier check).

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

const UTF8_BOM: &str = "\u{feff}";

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("{0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(BytesText<'static>),
    CData(BytesCData<'static>),
    /// Declarations, comments, processing instructions, doctype
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    pub start: BytesStart<'static>,
    pub children: Vec<XmlNode>,
    /// Written as `<name/>` while this is set and there are no children
    pub self_closing: bool,
    end: Option<BytesEnd<'static>>,
}

/// A parsed XML part: top-level nodes plus an optional leading BOM
#[derive(Debug, Clone)]
pub struct XmlDocument {
    bom: bool,
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, TreeError> {
        let (bom, body) = match xml.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, xml),
        };

        let mut reader = Reader::from_str(body);
        reader.trim_text(false);
        reader.check_end_names(true);
        reader.expand_empty_elements(false);

        let mut nodes: Vec<XmlNode> = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Eof => break,
                Event::Start(start) => {
                    stack.push(XmlElement {
                        start: start.into_owned(),
                        children: Vec::new(),
                        self_closing: false,
                        end: None,
                    });
                    continue;
                }
                Event::End(end) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        TreeError::UnexpectedEnd(String::from_utf8_lossy(end.name().as_ref()).into_owned())
                    })?;
                    element.end = Some(end.into_owned());
                    XmlNode::Element(element)
                }
                Event::Empty(start) => XmlNode::Element(XmlElement {
                    start: start.into_owned(),
                    children: Vec::new(),
                    self_closing: true,
                    end: None,
                }),
                Event::Text(text) => XmlNode::Text(text.into_owned()),
                Event::CData(cdata) => XmlNode::CData(cdata.into_owned()),
                other => XmlNode::Other(other.into_owned()),
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
        }

        if let Some(open) = stack.last() {
            return Err(TreeError::Unclosed(open.qualified_name()));
        }

        Ok(Self { bom, nodes })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TreeError> {
        let mut writer = Writer::new(Vec::new());
        if self.bom {
            writer.get_mut().extend_from_slice(UTF8_BOM.as_bytes());
        }
        for node in &self.nodes {
            node.write(&mut writer)?;
        }
        Ok(writer.into_inner())
    }

    /// Paths (child indices from the top level) of every element with the
    /// given local name, in document order
    pub fn find_paths(&self, local: &str) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        let mut path = Vec::new();
        collect_paths(&self.nodes, local.as_bytes(), &mut path, &mut found);
        found
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&XmlElement> {
        let (first, rest) = path.split_first()?;
        match self.nodes.get(*first)? {
            XmlNode::Element(element) => element.descendant_at(rest),
            _ => None,
        }
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let (first, rest) = path.split_first()?;
        match self.nodes.get_mut(*first)? {
            XmlNode::Element(element) => element.descendant_at_mut(rest),
            _ => None,
        }
    }

    /// Every element in document order
    pub fn elements(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        for node in &self.nodes {
            if let XmlNode::Element(element) = node {
                element.collect_elements(&mut out);
            }
        }
        out
    }
}

fn collect_paths(nodes: &[XmlNode], local: &[u8], path: &mut Vec<usize>, found: &mut Vec<Vec<usize>>) {
    for (idx, node) in nodes.iter().enumerate() {
        if let XmlNode::Element(element) = node {
            path.push(idx);
            if element.local_name() == local {
                found.push(path.clone());
            }
            collect_paths(&element.children, local, path, found);
            path.pop();
        }
    }
}

impl XmlNode {
    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), TreeError> {
        match self {
            XmlNode::Element(element) => element.write(writer)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(text.clone()))?,
            XmlNode::CData(cdata) => writer.write_event(Event::CData(cdata.clone()))?,
            XmlNode::Other(event) => writer.write_event(event.clone())?,
        }
        Ok(())
    }
}

impl XmlElement {
    /// A fresh element sharing this element's namespace prefix
    pub fn sibling_kind(&self, local: &str) -> XmlElement {
        let name = format!("{}{}", self.prefix(), local);
        XmlElement {
            start: BytesStart::new(name),
            children: Vec::new(),
            self_closing: false,
            end: None,
        }
    }

    pub fn local_name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local.as_bytes()
    }

    /// Namespace prefix including the colon, or an empty string
    pub fn prefix(&self) -> String {
        let name = self.qualified_name();
        match name.find(':') {
            Some(pos) => name[..=pos].to_string(),
            None => String::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }

    pub fn attribute(&self, key: &str) -> Option<String> {
        let attr = self.start.try_get_attribute(key).ok().flatten()?;
        attr.unescape_value().ok().map(|value| value.into_owned())
    }

    /// Concatenated text and CDATA children, unescaped
    pub fn direct_text(&self) -> String {
        let mut text = String::new();
        for child in &self.children {
            match child {
                XmlNode::Text(raw) => match raw.unescape() {
                    Ok(unescaped) => text.push_str(&unescaped),
                    Err(_) => text.push_str(&String::from_utf8_lossy(raw)),
                },
                XmlNode::CData(cdata) => text.push_str(&String::from_utf8_lossy(cdata)),
                _ => {}
            }
        }
        text
    }

    /// Concatenated direct text of every descendant element with this local name
    pub fn descendant_text(&self, local: &str) -> String {
        let mut elements = Vec::new();
        for child in &self.children {
            if let XmlNode::Element(element) = child {
                element.collect_elements(&mut elements);
            }
        }
        elements
            .into_iter()
            .filter(|element| element.is(local))
            .map(XmlElement::direct_text)
            .collect()
    }

    /// Replace all content with a single text node; the value is escaped
    pub fn set_text(&mut self, value: &str) {
        let escaped = partial_escape(value).into_owned();
        self.children.clear();
        self.children.push(XmlNode::Text(BytesText::from_escaped(escaped)));
        self.self_closing = false;
    }

    /// Append a child, expanding a self-closing element first
    pub fn append(&mut self, child: XmlElement) {
        self.self_closing = false;
        self.children.push(XmlNode::Element(child));
    }

    pub fn find_paths(&self, local: &str) -> Vec<Vec<usize>> {
        let mut found = Vec::new();
        let mut path = Vec::new();
        collect_paths(&self.children, local.as_bytes(), &mut path, &mut found);
        found
    }

    pub fn first_descendant(&self, local: &str) -> Option<&XmlElement> {
        let path = self.find_paths(local).into_iter().next()?;
        self.descendant_at(&path)
    }

    pub fn descendant_at(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for idx in path {
            current = match current.children.get(*idx)? {
                XmlNode::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn descendant_at_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for idx in path {
            current = match current.children.get_mut(*idx)? {
                XmlNode::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    fn collect_elements<'a>(&'a self, out: &mut Vec<&'a XmlElement>) {
        out.push(self);
        for child in &self.children {
            if let XmlNode::Element(element) = child {
                element.collect_elements(out);
            }
        }
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), TreeError> {
        if self.self_closing && self.children.is_empty() {
            writer.write_event(Event::Empty(self.start.clone()))?;
            return Ok(());
        }

        writer.write_event(Event::Start(self.start.clone()))?;
        for child in &self.children {
            child.write(writer)?;
        }
        match &self.end {
            Some(end) => writer.write_event(Event::End(end.clone()))?,
            None => writer.write_event(Event::End(self.start.to_end()))?,
        }
        Ok(())
    }
}
