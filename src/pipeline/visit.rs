//! Depth-first element visitors.

use super::dom::{Document, Element, Node};

/// Called once per element, parents before children.
///
/// The visitor may mutate the element (attributes and children); the walk
/// continues into whatever children it leaves behind.
pub trait ElementVisitor {
    fn visit_element(&mut self, element: &mut Element);
}

impl<F: FnMut(&mut Element)> ElementVisitor for F {
    fn visit_element(&mut self, element: &mut Element) {
        self(element)
    }
}

impl Document {
    /// Walk every element of the document in document order.
    pub fn walk_mut<V: ElementVisitor + ?Sized>(&mut self, visitor: &mut V) {
        walk_nodes_mut(&mut self.children, visitor);
    }
}

fn walk_nodes_mut<V: ElementVisitor + ?Sized>(nodes: &mut [Node], visitor: &mut V) {
    for node in nodes {
        if let Node::Element(element) = node {
            visitor.visit_element(element);
            walk_nodes_mut(&mut element.children, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visits_in_document_order() {
        let mut doc = Document::parse("<ul><li><a>1</a></li><li>2</li></ul><p></p>").unwrap();
        let mut seen = Vec::new();
        doc.walk_mut(&mut |el: &mut Element| seen.push(el.name.clone()));
        assert_eq!(seen, ["ul", "li", "a", "li", "p"]);
    }

    #[test]
    fn test_mutations_stick() {
        let mut doc = Document::parse("<div><span>x</span></div>").unwrap();
        doc.walk_mut(&mut |el: &mut Element| {
            el.add_class("seen");
        });
        assert!(doc.elements().iter().all(|el| el.has_class("seen")));
    }
}
