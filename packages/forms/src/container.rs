//! # Containers
//!
//! Shared behaviour of groups and forms: an ordered list of children with
//! single-parent ownership, plus the value and validation cascades.
//!
//! ## Structural rules
//!
//! - A node is attached to at most one container. Appending a node owned by
//!   another container detaches it there first.
//! - Re-appending a node this container already owns moves it to the end; it
//!   is never listed twice.
//! - Forms cannot be nested, and a container cannot be added to its own
//!   subtree.
//!
//! Every operation validates before it mutates, so a failed call leaves the
//! tree untouched.

use std::rc::Rc;

use formwork_common::value::{insert, ValueMap};
use formwork_common::{FormError, FormResult};
use tracing::debug;

use crate::element::Element;
use crate::form::Form;
use crate::group::Group;
use crate::node::Node;
use crate::visitor::{walk_children, Visitor};

#[derive(Default)]
pub(crate) struct ContainerState {
    pub(crate) children: Vec<Node>,
}

/// Operations shared by [`Group`] and [`Form`]
pub trait Container {
    fn node(&self) -> &Node;

    /// Children in insertion order (the render and validation order)
    fn children(&self) -> Vec<Node> {
        self.node().children()
    }

    fn len(&self) -> usize {
        self.node()
            .borrow()
            .container_state()
            .map_or(0, |state| state.children.len())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a child, detaching it from its previous container first.
    fn append_child(&self, child: impl Into<Node>) -> FormResult<Node> {
        append(self.node(), child.into())
    }

    /// Insert a child before `reference`, which must be a child of this
    /// container.
    fn insert_before(&self, child: impl Into<Node>, reference: &Node) -> FormResult<Node> {
        insert_before(self.node(), child.into(), reference)
    }

    /// Detach a child. Fails with `NotFound` if it is not a child.
    fn remove_child(&self, child: &Node) -> FormResult<Node> {
        remove(self.node(), child)
    }

    /// Find a descendant by element id, depth-first
    fn get_element_by_id(&self, id: &str) -> Option<Node> {
        let mut finder = Finder::new(|node: &Node| node.id().as_deref() == Some(id));
        walk_children(&mut finder, self.node());
        finder.found.into_iter().next()
    }

    /// Find all descendants with the given wire name, in tree order
    fn get_elements_by_name(&self, name: &str) -> Vec<Node> {
        let mut finder = Finder::new(|node: &Node| node.name().as_deref() == Some(name));
        walk_children(&mut finder, self.node());
        finder.found
    }
}

impl Container for Group {
    fn node(&self) -> &Node {
        &self.0
    }
}

impl Container for Form {
    fn node(&self) -> &Node {
        &self.0
    }
}

fn position_of(container: &Node, child: &Node) -> Option<usize> {
    container
        .borrow()
        .container_state()?
        .children
        .iter()
        .position(|c| c.ptr_eq(child))
}

fn owns(container: &Node, child: &Node) -> bool {
    child
        .container()
        .is_some_and(|current| current.ptr_eq(container))
}

fn check_can_adopt(container: &Node, child: &Node) -> FormResult<()> {
    if !container.is_container() {
        return Err(FormError::StructuralViolation(format!(
            "'{}' element cannot contain children",
            container.node_type()
        )));
    }
    if child.is_form() {
        return Err(FormError::StructuralViolation(
            "a form cannot be added to a container".to_string(),
        ));
    }
    if child.is_ancestor_of(container) {
        return Err(FormError::StructuralViolation(
            "cannot add a container to its own subtree".to_string(),
        ));
    }
    Ok(())
}

/// Attach a detached child at `index` (or at the end), renaming it first
/// when the container is a group.
fn adopt(container: &Node, child: &Node, index: Option<usize>) {
    if let Some(group) = container.as_group() {
        group.rename_child(child);
    }
    child.borrow_mut().container = Rc::downgrade(&container.0);
    {
        let mut data = container.borrow_mut();
        if let Some(state) = data.container_state_mut() {
            match index {
                Some(index) => state.children.insert(index, child.clone()),
                None => state.children.push(child.clone()),
            }
        }
    }
    debug!(
        container = ?container.name(),
        child = ?child.name(),
        "Attached child"
    );
    child.update_value();
}

/// Remove a child from its container's list without touching its name
fn unlink(container: &Node, child: &Node) {
    if let Some(state) = container.borrow_mut().container_state_mut() {
        state.children.retain(|c| !c.ptr_eq(child));
    }
}

pub(crate) fn append(container: &Node, child: Node) -> FormResult<Node> {
    check_can_adopt(container, &child)?;

    if owns(container, &child) {
        // Already prefixed for this container: only the position changes
        unlink(container, &child);
        if let Some(state) = container.borrow_mut().container_state_mut() {
            state.children.push(child.clone());
        }
        return Ok(child);
    }

    if let Some(previous) = child.container() {
        remove(&previous, &child)?;
    }
    adopt(container, &child, None);
    Ok(child)
}

pub(crate) fn insert_before(container: &Node, child: Node, reference: &Node) -> FormResult<Node> {
    check_can_adopt(container, &child)?;
    if position_of(container, reference).is_none() {
        return Err(FormError::NotFound(format!(
            "reference node {:?} is not a child of this container",
            reference.name()
        )));
    }
    if child.ptr_eq(reference) {
        return Ok(child);
    }

    if owns(container, &child) {
        unlink(container, &child);
        let index = position_of(container, reference).unwrap_or(0);
        if let Some(state) = container.borrow_mut().container_state_mut() {
            state.children.insert(index, child.clone());
        }
        return Ok(child);
    }

    if let Some(previous) = child.container() {
        remove(&previous, &child)?;
    }
    let index = position_of(container, reference);
    adopt(container, &child, index);
    Ok(child)
}

pub(crate) fn remove(container: &Node, child: &Node) -> FormResult<Node> {
    if position_of(container, child).is_none() {
        return Err(FormError::NotFound(format!(
            "node {:?} is not a child of this container",
            child.name()
        )));
    }
    unlink(container, child);
    child.borrow_mut().container = std::rc::Weak::new();
    if let Some(group) = container.as_group() {
        group.unprefix_child(child);
    }
    debug!(child = ?child.name(), "Detached child");
    Ok(child.clone())
}

struct Finder<F> {
    predicate: F,
    found: Vec<Node>,
}

impl<F: Fn(&Node) -> bool> Finder<F> {
    fn new(predicate: F) -> Self {
        Self {
            predicate,
            found: Vec::new(),
        }
    }
}

impl<F: Fn(&Node) -> bool> Visitor for Finder<F> {
    fn visit_node(&mut self, node: &Node) {
        if (self.predicate)(node) {
            self.found.push(node.clone());
        }
        crate::visitor::walk_node(self, node);
    }
}

/// Depth-first validation: a container's own rules, then each child in
/// order, AND-ed without short-circuiting.
pub(crate) struct ValidateVisitor {
    valid: bool,
}

impl ValidateVisitor {
    pub(crate) fn new() -> Self {
        Self { valid: true }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Visitor for ValidateVisitor {
    fn visit_element(&mut self, element: &Element) {
        self.valid = element.check_rules() && self.valid;
    }

    fn visit_group(&mut self, group: &Group) {
        self.valid = group.check_rules() && self.valid;
        walk_children(self, group);
    }

    fn visit_form(&mut self, form: &Form) {
        self.valid = form.check_rules() && self.valid;
        walk_children(self, form);
    }
}

/// Collects leaf values into a nested map keyed by wire name
pub(crate) struct ValueCollector {
    pub(crate) values: ValueMap,
    submitted_only: bool,
}

impl ValueCollector {
    pub(crate) fn new(submitted_only: bool) -> Self {
        Self {
            values: ValueMap::new(),
            submitted_only,
        }
    }

    pub(crate) fn collect(mut self, container: &Node) -> ValueMap {
        walk_children(&mut self, container);
        self.values
    }
}

impl Visitor for ValueCollector {
    fn visit_element(&mut self, element: &Element) {
        if self.submitted_only && !element.is_submittable() {
            return;
        }
        let Some(name) = element.name().filter(|name| !name.is_empty()) else {
            return;
        };
        if let Some(value) = element.value() {
            insert(&mut self.values, &name, value);
        }
    }
}
