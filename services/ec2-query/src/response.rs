use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::constants::FORCE_LIST_ELEMENTS;
use ec2sign_core::{Error, Result};

/// Key holding text that appears next to child elements.
const CONTENT_KEY: &str = "content";

/// Untyped tree parsed from a Query API XML response.
///
/// The root element itself is dropped, so the tree holds the root's content:
///
/// ```xml
/// <DescribeRegionsResponse>
///   <requestId>59dbff89</requestId>
///   <regionInfo>
///     <item><regionName>us-east-1</regionName></item>
///   </regionInfo>
/// </DescribeRegionsResponse>
/// ```
///
/// parses into `{"requestId": "59dbff89", "regionInfo": {"item": [{"regionName": "us-east-1"}]}}`.
///
/// `item` and `Errors` are always lists. Other elements become lists only
/// when they repeat.
///
/// Attributes are stored next to child elements under their own name. An
/// attribute named like a child element is stored as `@name` instead. Text
/// split by child elements is joined with a single space under `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseTree {
    /// Element holding only text. Empty elements hold an empty string.
    Text(String),
    /// Element with children or attributes.
    Map(BTreeMap<String, ResponseTree>),
    /// Repeated elements, or an `item`/`Errors` element.
    List(Vec<ResponseTree>),
}

impl ResponseTree {
    /// Parse an XML document.
    pub fn parse(xml: &str) -> Result<ResponseTree> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let event = reader.read_event().map_err(|e| {
                Error::unexpected(format!(
                    "failed to parse xml at position {}",
                    reader.buffer_position()
                ))
                .with_source(e)
            })?;

            match event {
                Event::Start(e) => stack.push(Frame::start(&e)?),
                Event::Empty(e) => {
                    let (name, value) = Frame::start(&e)?.finish();
                    match stack.last_mut() {
                        Some(parent) => parent.push_child(name, value),
                        None => return Ok(value),
                    }
                }
                Event::Text(e) => {
                    if let Some(frame) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| {
                            Error::unexpected("failed to unescape xml text").with_source(err)
                        })?;
                        frame.push_text(&text);
                    }
                }
                Event::CData(e) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.push_text(&String::from_utf8_lossy(&e));
                    }
                }
                Event::End(_) => {
                    let Some(frame) = stack.pop() else {
                        return Err(Error::unexpected("unexpected xml end tag"));
                    };
                    let (name, value) = frame.finish();
                    match stack.last_mut() {
                        Some(parent) => parent.push_child(name, value),
                        None => return Ok(value),
                    }
                }
                Event::Eof => {
                    return Err(match stack.last() {
                        Some(frame) => Error::unexpected(format!(
                            "xml element {} is not closed",
                            frame.name
                        )),
                        None => Error::unexpected("xml document has no root element"),
                    });
                }
                // Declarations, comments, processing instructions and doctypes carry no data.
                _ => {}
            }
        }
    }

    /// Look up a child of a map.
    pub fn get(&self, key: &str) -> Option<&ResponseTree> {
        match self {
            ResponseTree::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Text content, if this is a text node.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResponseTree::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Children, if this is a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, ResponseTree>> {
        match self {
            ResponseTree::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Elements, if this is a list.
    pub fn as_list(&self) -> Option<&[ResponseTree]> {
        match self {
            ResponseTree::List(l) => Some(l),
            _ => None,
        }
    }

    /// Check if this is a list.
    pub fn is_list(&self) -> bool {
        matches!(self, ResponseTree::List(_))
    }

    /// Elements of a list, or this node alone otherwise.
    pub fn items(&self) -> &[ResponseTree] {
        match self {
            ResponseTree::List(l) => l,
            other => std::slice::from_ref(other),
        }
    }

    /// The top-level `Errors` entry the service uses to report failures.
    pub fn errors(&self) -> Option<&[ResponseTree]> {
        self.get("Errors").map(ResponseTree::items)
    }

    /// `Code` and `Message` of the first reported error, if any.
    pub fn first_error(&self) -> Option<(Option<&str>, Option<&str>)> {
        let error = self.errors()?.first()?;
        // `<Errors><Error>..</Error></Errors>`, possibly with several `Error`s.
        let error = error.get("Error").map_or(error, |e| &e.items()[0]);

        Some((
            error.get("Code").and_then(ResponseTree::as_str),
            error.get("Message").and_then(ResponseTree::as_str),
        ))
    }
}

struct Frame {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<(String, ResponseTree)>,
    text: String,
    /// A child element was closed after the last text fragment.
    text_broken: bool,
}

impl Frame {
    fn start(e: &BytesStart) -> Result<Frame> {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();

        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| {
                Error::unexpected(format!("invalid attribute on xml element {name}"))
                    .with_source(err)
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let value = attr.unescape_value().map_err(|err| {
                Error::unexpected(format!("invalid attribute {key} on xml element {name}"))
                    .with_source(err)
            })?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Frame {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
            text_broken: false,
        })
    }

    fn push_child(&mut self, name: String, value: ResponseTree) {
        self.children.push((name, value));
        self.text_broken = true;
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.text_broken && !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
        self.text_broken = false;
    }

    fn finish(self) -> (String, ResponseTree) {
        let text = self.text.trim();
        if self.children.is_empty() && self.attributes.is_empty() {
            return (self.name, ResponseTree::Text(text.to_string()));
        }

        let mut map = BTreeMap::new();
        for (name, value) in self.children {
            match map.entry(name) {
                Entry::Vacant(e) => {
                    let value = if FORCE_LIST_ELEMENTS.contains(&e.key().as_str()) {
                        ResponseTree::List(vec![value])
                    } else {
                        value
                    };
                    e.insert(value);
                }
                // Element values are never lists, so a list here is a group of siblings.
                Entry::Occupied(mut e) => match e.get_mut() {
                    ResponseTree::List(items) => items.push(value),
                    slot => {
                        let first = std::mem::replace(slot, ResponseTree::List(Vec::new()));
                        *slot = ResponseTree::List(vec![first, value]);
                    }
                },
            }
        }
        for (key, value) in self.attributes {
            let key = if map.contains_key(&key) {
                format!("@{key}")
            } else {
                key
            };
            map.insert(key, ResponseTree::Text(value));
        }
        if !text.is_empty() {
            map.insert(CONTENT_KEY.to_string(), ResponseTree::Text(text.to_string()));
        }

        (self.name, ResponseTree::Map(map))
    }
}
