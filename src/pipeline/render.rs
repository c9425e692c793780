//! Serialize an owned tree back to HTML.
//!
//! Text and attribute values are written as stored (still entity-encoded), so
//! nothing is escaped twice. With `minify` on, the output additionally:
//!
//! - drops comments
//! - collapses whitespace runs in text outside `pre`, `textarea`, `script`
//!   and `style`
//! - minifies inline `<script>` and `<style>` bodies (left as-is if they do
//!   not parse)

use super::dom::{Attr, Document, Element, Node};
use super::minify::{minify_css, minify_js};
use crate::utils::html::{is_raw_text_element, is_void_element, preserves_whitespace};

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    pub minify: bool,
}

impl Document {
    pub fn render(&self, options: RenderOptions) -> String {
        let mut renderer = Renderer {
            out: String::with_capacity(4096),
            options,
        };
        for node in &self.children {
            renderer.node(node, false);
        }
        renderer.out
    }
}

struct Renderer {
    out: String,
    options: RenderOptions,
}

impl Renderer {
    fn node(&mut self, node: &Node, preserve: bool) {
        match node {
            Node::Element(element) => self.element(element, preserve),
            Node::Text(text) if self.options.minify && !preserve => {
                collapse_whitespace(text, &mut self.out);
            }
            Node::Text(text) => self.out.push_str(text),
            Node::Comment(_) if self.options.minify => {}
            Node::Comment(body) => {
                self.out.push_str("<!--");
                self.out.push_str(body);
                self.out.push_str("-->");
            }
        }
    }

    fn element(&mut self, element: &Element, preserve: bool) {
        self.out.push('<');
        self.out.push_str(&element.name);
        for attr in &element.attrs {
            self.attr(attr);
        }
        self.out.push('>');

        if is_void_element(&element.name) {
            return;
        }

        let minified =
            self.options.minify && is_raw_text_element(&element.name) && self.minified_body(element);
        if !minified {
            let preserve = preserve || preserves_whitespace(&element.name);
            for child in &element.children {
                self.node(child, preserve);
            }
        }

        self.out.push_str("</");
        self.out.push_str(&element.name);
        self.out.push('>');
    }

    fn attr(&mut self, attr: &Attr) {
        self.out.push(' ');
        self.out.push_str(&attr.name);
        let Some(value) = &attr.value else {
            return;
        };
        self.out.push('=');
        if value.contains('"') && !value.contains('\'') {
            self.out.push('\'');
            self.out.push_str(value);
            self.out.push('\'');
        } else {
            self.out.push('"');
            self.out.push_str(&value.replace('"', "&quot;"));
            self.out.push('"');
        }
    }

    /// Write the minified body of a `<script>` or `<style>`.
    ///
    /// Returns `false` without writing anything when the body is not
    /// something we can minify.
    fn minified_body(&mut self, element: &Element) -> bool {
        let mut source = String::new();
        for child in &element.children {
            match child {
                Node::Text(text) => source.push_str(text),
                Node::Comment(_) => {}
                Node::Element(_) => return false,
            }
        }
        if source.trim().is_empty() {
            return false;
        }

        let minified = if element.is("style") {
            minify_css(&source)
        } else if is_classic_script(element) {
            minify_js(&source)
        } else {
            None
        };

        match minified {
            Some(code) => {
                self.out.push_str(code.trim_end());
                true
            }
            None => false,
        }
    }
}

fn is_classic_script(element: &Element) -> bool {
    match element.get_attr("type") {
        None => true,
        Some(ty) => {
            let ty = ty.trim();
            ty.is_empty()
                || ty.eq_ignore_ascii_case("text/javascript")
                || ty.eq_ignore_ascii_case("application/javascript")
        }
    }
}

fn collapse_whitespace(text: &str, out: &mut String) {
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
}
