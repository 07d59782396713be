use std::borrow::Cow;

/// One node in an XML document tree
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    Cdata(String),
}

/// An XML element with ordered attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append an attribute; attributes render in insertion order.
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }

    /// Append a child element.
    pub fn child(mut self, element: Element) -> Self {
        self.children.push(XmlNode::Element(element));
        self
    }

    /// Append a text node; reserved characters are escaped when rendering.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Append a CDATA node; content is emitted literally.
    pub fn cdata(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Cdata(text.into()));
        self
    }
}

/// Escape the five reserved XML characters in text content
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Render a document with an XML declaration and pretty-printed body
pub fn render_document(root: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    render_element(root, 0, &mut out);
    out
}

const INDENT: &str = "  ";

fn render_element(element: &Element, depth: usize, out: &mut String) {
    push_indent(depth, out);
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
    }

    if element.children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    let has_element_children = element
        .children
        .iter()
        .any(|child| matches!(child, XmlNode::Element(_)));

    if !has_element_children {
        // Pure text/CDATA content stays on one line
        out.push('>');
        for child in &element.children {
            render_content(child, out);
        }
        out.push_str(&format!("</{}>\n", element.name));
        return;
    }

    out.push_str(">\n");
    for child in &element.children {
        match child {
            XmlNode::Element(child_element) => render_element(child_element, depth + 1, out),
            content => {
                push_indent(depth + 1, out);
                render_content(content, out);
                out.push('\n');
            }
        }
    }
    push_indent(depth, out);
    out.push_str(&format!("</{}>\n", element.name));
}

fn render_content(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Text(text) => out.push_str(&escape(text)),
        XmlNode::Cdata(text) => {
            out.push_str("<![CDATA[");
            // A literal "]]>" would terminate the section early; split it
            out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
            out.push_str("]]>");
        }
        XmlNode::Element(element) => render_element(element, 0, out),
    }
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
