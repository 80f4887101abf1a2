// Copyright (c) The testplan-publish Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A small element tree over `quick-xml` events.

use quick_xml::{Reader, events::Event};
use std::borrow::Cow;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct XmlElement {
    pub(crate) name: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<XmlElement>,
    pub(crate) text: String,
}

impl XmlElement {
    /// Parses a document and returns its root element, or `None` for a document without one.
    pub(crate) fn parse(input: &str) -> quick_xml::Result<Option<Self>> {
        let mut reader = Reader::from_str(input);
        reader.trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    stack.push(Self::from_start(&start)?);
                }
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        push_text(&mut current.text, &text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        push_text(&mut current.text, &String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(root)
    }

    fn from_start(start: &quick_xml::events::BytesStart<'_>) -> quick_xml::Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Default::default()
        })
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a non-empty attribute.
    pub(crate) fn nonempty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|value| !value.is_empty())
    }

    pub(crate) fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub(crate) fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Collects every element named `name` at or below this one, in document order.
    pub(crate) fn descendants_named<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            out.push(self);
        }
        for child in &self.children {
            child.descendants_named(name, out);
        }
    }

    /// Returns the element's text, or `None` if it is empty.
    pub(crate) fn nonempty_text(&self) -> Option<&str> {
        Some(self.text.trim()).filter(|text| !text.is_empty())
    }

    pub(crate) fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Self::nonempty_text)
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(buf: &mut String, text: &Cow<'_, str>) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_tree() {
        let input = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <!-- generated -->
            <root a="1" b="x &amp; y">
                <child name="first">hello</child>
                <child name="second"/>
                <other><![CDATA[<raw>]]></other>
            </root>
        "#};
        let root = XmlElement::parse(input)
            .expect("parses")
            .expect("has a root");
        assert_eq!(root.name, "root");
        assert_eq!(root.attr("b"), Some("x & y"));
        assert_eq!(root.children_named("child").count(), 2);
        assert_eq!(root.child_text("child"), Some("hello"));
        assert_eq!(root.child_text("other"), Some("<raw>"));

        let mut found = Vec::new();
        root.descendants_named("child", &mut found);
        let names: Vec<_> = found.iter().filter_map(|c| c.attr("name")).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn mismatched_tags_are_an_error() {
        XmlElement::parse("<a><b></a>").expect_err("tags are mismatched");
    }

    #[test]
    fn empty_document_has_no_root() {
        assert_eq!(XmlElement::parse("").expect("parses"), None);
    }
}
