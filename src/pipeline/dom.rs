//! Owned HTML tree.
//!
//! `tl` gives a borrowed, read-only view over the source buffer. Pages need
//! to be rewritten in place (link classes) and serialized again, so the parsed
//! tree is copied into plain owned nodes once.
//!
//! Text and attribute values are kept exactly as they appear in the source
//! (entities stay encoded), which makes parse → render lossless for
//! everything except attribute quoting.
//!
//! `tl` is not an HTML5 tree builder, so two things are done around it:
//!
//! - bodies of `script`, `style`, `textarea` and `title` are cut out before
//!   parsing and restored as single text nodes
//! - omitted end tags (`<li>a<li>b`, `<p>a<div>`) are closed the way a
//!   browser closes them, instead of nesting

use thiserror::Error;

use crate::utils::html::{closes_implicitly, is_text_only_element};

/// Delimits a placeholder for a text-only element body. Private use area.
const BODY_MARK: char = '\u{F8FF}';

/// Markup that `tl` refused to parse.
#[derive(Debug, Error)]
#[error("malformed html: {0}")]
pub struct ParseError(String);

/// A node in the owned tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Raw text, entities still encoded.
    Text(String),
    /// Comment body, without the `<!--` `-->` delimiters.
    Comment(String),
}

/// A single attribute. `value` is `None` for bare attributes (`<input disabled>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub name: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    /// Set `name` to `value`, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self.attrs.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attr {
                name: name.to_ascii_lowercase(),
                value,
            }),
        }
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attr("class")
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Append `class` to the class list unless it is already there.
    ///
    /// Returns whether the element changed.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let joined = match self.get_attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
        true
    }
}

/// A parsed HTML document or fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    /// Parse `html` into an owned tree.
    pub fn parse(html: &str) -> Result<Self, ParseError> {
        let (masked, bodies) = mask_text_bodies(html);
        let dom = tl::parse(&masked, tl::ParserOptions::default())
            .map_err(|e| ParseError(format!("{e:?}")))?;
        let parser = dom.parser();

        let mut children: Vec<Node> = dom
            .children()
            .iter()
            .filter_map(|handle| convert(*handle, parser, &bodies))
            .collect();
        close_omitted(&mut children);
        Ok(Self { children })
    }

    /// All elements in document order.
    #[cfg(test)]
    pub fn elements(&self) -> Vec<&Element> {
        fn collect<'a>(nodes: &'a [Node], out: &mut Vec<&'a Element>) {
            for node in nodes {
                if let Node::Element(el) = node {
                    out.push(el);
                    collect(&el.children, out);
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.children, &mut out);
        out
    }
}

/// Replace every text-only element body with a numbered placeholder.
///
/// Returns the masked source and the original bodies in order.
fn mask_text_bodies(html: &str) -> (String, Vec<String>) {
    let mut masked = String::with_capacity(html.len());
    let mut bodies = Vec::new();
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        let rest = &html[start..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            pos = comment
                .find("-->")
                .map_or(html.len(), |end| start + 4 + end + 3);
            continue;
        }

        let name_len = rest[1..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        if name_len == 0 {
            pos = start + 1;
            continue;
        }
        let Some(body_start) = start_tag_end(html, start + 1 + name_len) else {
            break;
        };
        pos = body_start;

        let name = rest[1..=name_len].to_ascii_lowercase();
        if !is_text_only_element(&name) {
            continue;
        }
        let body_end = end_tag_start(html, body_start, &name).unwrap_or(html.len());
        if body_end > body_start {
            masked.push_str(&html[copied..body_start]);
            masked.push(BODY_MARK);
            masked.push_str(&bodies.len().to_string());
            masked.push(BODY_MARK);
            bodies.push(html[body_start..body_end].to_string());
            copied = body_end;
        }
        pos = body_end;
    }

    masked.push_str(&html[copied..]);
    (masked, bodies)
}

/// Index just past the `>` closing a start tag, honouring quoted values.
fn start_tag_end(html: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    let mut after_eq = false;
    for (i, b) in html.bytes().enumerate().skip(from) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' if after_eq => quote = Some(b),
            b'>' => return Some(i + 1),
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            after_eq = b == b'=';
        }
    }
    None
}

/// Index of the `</name` that ends a text-only body starting at `from`.
fn end_tag_start(html: &str, from: usize, name: &str) -> Option<usize> {
    let lower = html[from..].to_ascii_lowercase();
    let needle = format!("</{name}");
    let mut search = 0;
    while let Some(found) = lower[search..].find(&needle) {
        let at = search + found;
        let after = lower.as_bytes().get(at + needle.len()).copied();
        if matches!(after, None | Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')) {
            return Some(from + at);
        }
        search = at + needle.len();
    }
    None
}

/// Original body for a placeholder produced by [`mask_text_bodies`].
fn unmask<'a>(text: &str, bodies: &'a [String]) -> Option<&'a str> {
    let index = text.strip_prefix(BODY_MARK)?.strip_suffix(BODY_MARK)?;
    bodies.get(index.parse::<usize>().ok()?).map(String::as_str)
}

/// Close elements whose end tag was omitted, bottom-up.
///
/// `tl` nests `<li>a<li>b` as `li(a, li(b))`; the inner `li` and everything
/// after it become following siblings instead.
fn close_omitted(nodes: &mut Vec<Node>) {
    let mut i = 0;
    while i < nodes.len() {
        let tail = match &mut nodes[i] {
            Node::Element(element) => split_omitted(element),
            _ => None,
        };
        if let Some(tail) = tail {
            nodes.splice(i + 1..i + 1, tail);
        }
        i += 1;
    }
}

/// Children from the first one that implicitly ends `element` onwards.
fn split_omitted(element: &mut Element) -> Option<Vec<Node>> {
    let split = element.children.iter().position(|child| {
        matches!(child, Node::Element(next) if closes_implicitly(&element.name, &next.name))
    })?;
    Some(element.children.drain(split..).collect())
}

fn convert(handle: tl::NodeHandle, parser: &tl::Parser, bodies: &[String]) -> Option<Node> {
    let node = handle.get(parser)?;

    match node {
        tl::Node::Tag(tag) => {
            let mut element = Element::new(tag.name().as_utf8_str());
            for (key, value) in tag.attributes().iter() {
                element.attrs.push(Attr {
                    name: key.to_ascii_lowercase(),
                    value: value.map(|v| v.into_owned()),
                });
            }

            for child in tag.children().top().iter() {
                if let Some(node) = convert(*child, parser, bodies) {
                    element.children.push(node);
                }
            }
            close_omitted(&mut element.children);
            Some(Node::Element(element))
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if let Some(body) = unmask(&text, bodies) {
                return Some(Node::Text(body.to_string()));
            }
            (!text.is_empty()).then(|| Node::Text(text.into_owned()))
        }
        tl::Node::Comment(bytes) => {
            let raw = bytes.as_utf8_str();
            let raw: &str = &raw;
            let body = raw.strip_prefix("<!--").unwrap_or(raw);
            let body = body.strip_suffix("-->").unwrap_or(body);
            Some(Node::Comment(body.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(doc: &Document) -> &Element {
        doc.elements()[0]
    }

    #[test]
    fn test_parse_nested() {
        let doc = Document::parse("<div><p>one <a href=\"/x\">two</a></p></div>").unwrap();
        let names: Vec<_> = doc.elements().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["div", "p", "a"]);
        assert_eq!(doc.elements()[2].get_attr("href"), Some("/x"));
    }

    #[test]
    fn test_tag_names_are_lowercased() {
        let doc = Document::parse("<A HREF=\"/x\">x</A>").unwrap();
        let a = first_element(&doc);
        assert!(a.is("a"));
        assert_eq!(a.get_attr("href"), Some("/x"));
    }

    #[test]
    fn test_bare_attribute() {
        let doc = Document::parse("<input disabled>").unwrap();
        let input = first_element(&doc);
        assert_eq!(input.get_attr("disabled"), Some(""));
    }

    #[test]
    fn test_text_keeps_entities() {
        let doc = Document::parse("<p>a &amp; b</p>").unwrap();
        let p = first_element(&doc);
        assert_eq!(p.children, vec![Node::Text("a &amp; b".to_string())]);
    }

    #[test]
    fn test_script_body_is_one_text_node() {
        let doc = Document::parse(
            "<script>if (a<b && c>d) { x = '<a href=\"zz\">'; }</script><p>after</p>",
        )
        .unwrap();
        let names: Vec<_> = doc.elements().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["script", "p"]);
        assert_eq!(
            doc.elements()[0].children,
            vec![Node::Text("if (a<b && c>d) { x = '<a href=\"zz\">'; }".to_string())]
        );
    }

    #[test]
    fn test_text_only_bodies() {
        let doc = Document::parse(concat!(
            "<style>p > a { x: 1 }</style>",
            "<textarea><b>raw</b></textarea>",
            "<title>a <b> c</title>",
        ))
        .unwrap();
        let els = doc.elements();
        assert_eq!(els.len(), 3);
        assert_eq!(els[0].children, vec![Node::Text("p > a { x: 1 }".to_string())]);
        assert_eq!(els[1].children, vec![Node::Text("<b>raw</b>".to_string())]);
        assert_eq!(els[2].children, vec![Node::Text("a <b> c".to_string())]);
    }

    #[test]
    fn test_mask_text_bodies() {
        let (masked, bodies) =
            mask_text_bodies("<SCRIPT data-x='a>b'>x</y</Script >z<script></script>");
        assert_eq!(bodies, ["x</y"]);
        assert_eq!(
            masked,
            format!("<SCRIPT data-x='a>b'>{BODY_MARK}0{BODY_MARK}</Script >z<script></script>")
        );
        assert_eq!(unmask(&format!("{BODY_MARK}0{BODY_MARK}"), &bodies), Some("x</y"));
        assert_eq!(unmask("0", &bodies), None);
    }

    #[test]
    fn test_unterminated_script_runs_to_end() {
        let (_, bodies) = mask_text_bodies("<script>a < b");
        assert_eq!(bodies, ["a < b"]);
    }

    #[test]
    fn test_script_in_comment_is_ignored() {
        let doc = Document::parse("<!-- <script> --><p><b>x</b></p>").unwrap();
        let names: Vec<_> = doc.elements().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["p", "b"]);
    }

    #[test]
    fn test_unclosed_list_items_are_siblings() {
        let doc = Document::parse("<ul><li>a<li>b<li>c</ul>").unwrap();
        let ul = first_element(&doc);
        let items: Vec<_> = ul
            .children
            .iter()
            .map(|n| match n {
                Node::Element(li) => {
                    assert!(li.is("li"));
                    li.children.clone()
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            items,
            vec![
                vec![Node::Text("a".into())],
                vec![Node::Text("b".into())],
                vec![Node::Text("c".into())],
            ]
        );
    }

    #[test]
    fn test_paragraph_closed_by_block() {
        let doc = Document::parse("<p>one<div>two</div>").unwrap();
        let names: Vec<_> = doc
            .children
            .iter()
            .map(|n| match n {
                Node::Element(el) => el.name.as_str(),
                _ => "#text",
            })
            .collect();
        assert_eq!(names, ["p", "div"]);
    }

    #[test]
    fn test_nested_list_is_kept() {
        let doc = Document::parse("<ul><li>a<ul><li>b</li></ul></li></ul>").unwrap();
        let names: Vec<_> = doc.elements().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["ul", "li", "ul", "li"]);
        assert_eq!(first_element(&doc).children.len(), 1);
    }

    #[test]
    fn test_add_class_to_bare_element() {
        let mut el = Element::new("a");
        assert!(el.add_class("broken-link"));
        assert_eq!(el.get_attr("class"), Some("broken-link"));
    }

    #[test]
    fn test_add_class_appends() {
        let mut el = Element::new("a");
        el.set_attr("class", "btn");
        assert!(el.add_class("external-link"));
        assert_eq!(el.get_attr("class"), Some("btn external-link"));
    }

    #[test]
    fn test_add_class_is_idempotent() {
        let mut el = Element::new("a");
        el.set_attr("class", "btn broken-link");
        assert!(!el.add_class("broken-link"));
        assert_eq!(el.get_attr("class"), Some("btn broken-link"));
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut el = Element::new("a");
        el.set_attr("href", "/a");
        el.set_attr("title", "t");
        el.set_attr("HREF", "/b");
        assert_eq!(el.attrs.len(), 2);
        assert_eq!(el.attrs[0].value.as_deref(), Some("/b"));
    }
}
