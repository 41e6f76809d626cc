use crate::element::Element;
use crate::form::Form;
use crate::group::Group;
use crate::node::{Node, NodeVariant};

/// Visitor pattern for traversing a form tree depth-first
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
///
/// Children are snapshotted before they are visited, so a visitor may mutate
/// the nodes it is handed (freeze them, update values, set errors).
pub trait Visitor: Sized {
    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, _element: &Element) {
        // Leaf node, no children to walk
    }

    fn visit_group(&mut self, group: &Group) {
        walk_children(self, group);
    }

    fn visit_form(&mut self, form: &Form) {
        walk_children(self, form);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node.variant() {
        NodeVariant::Element(element) => visitor.visit_element(&element),
        NodeVariant::Group(group) => visitor.visit_group(&group),
        NodeVariant::Form(form) => visitor.visit_form(&form),
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, container: &Node) {
    for child in container.children() {
        visitor.visit_node(&child);
    }
}
