//! # Nodes
//!
//! Every element of a form tree - leaf elements, groups and the form itself -
//! is a [`Node`]: a shared handle to one `NodeData` cell. Typed handles
//! ([`Element`], [`Group`], [`Form`]) wrap a `Node` and deref to it.
//!
//! ## Ownership
//!
//! A container holds strong handles to its children; a child holds a weak
//! back-reference to its container. The back-reference is only written by
//! the container operations (append, insert, remove), which keep each node
//! attached to at most one container and never create cycles.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use formwork_common::{FormError, FormResult};
use serde_json::Value;
use tracing::debug;

use crate::container::{ContainerState, ValidateVisitor};
use crate::element::{Element, ElementState};
use crate::form::{Form, FormState};
use crate::group::{Group, GroupState};
use crate::options::Options;
use crate::renderer::{RenderVisitor, Renderer};
use crate::rules::Rule;
use crate::visitor::{walk_node, Visitor};

pub(crate) type NodeCell = Rc<RefCell<NodeData>>;

/// Handle to a node of a form tree. Cloning the handle shares the node.
#[derive(Clone)]
pub struct Node(pub(crate) NodeCell);

pub(crate) struct NodeData {
    pub(crate) name: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) label: Option<String>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) frozen: bool,
    pub(crate) persistent_freeze: bool,
    pub(crate) container: Weak<RefCell<NodeData>>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) error: Option<String>,
    pub(crate) kind: NodeKind,
}

pub(crate) enum NodeKind {
    Element(ElementState),
    Group(GroupState),
    Form(FormState),
}

/// Typed view of a node, see [`Node::variant`]
#[derive(Debug, Clone)]
pub enum NodeVariant {
    Element(Element),
    Group(Group),
    Form(Form),
}

impl NodeData {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            id: None,
            label: None,
            attributes: BTreeMap::new(),
            frozen: false,
            persistent_freeze: false,
            container: Weak::new(),
            rules: Vec::new(),
            error: None,
            kind,
        }
    }

    pub(crate) fn container_state(&self) -> Option<&ContainerState> {
        match &self.kind {
            NodeKind::Group(state) => Some(&state.container),
            NodeKind::Form(state) => Some(&state.container),
            NodeKind::Element(_) => None,
        }
    }

    pub(crate) fn container_state_mut(&mut self) -> Option<&mut ContainerState> {
        match &mut self.kind {
            NodeKind::Group(state) => Some(&mut state.container),
            NodeKind::Form(state) => Some(&mut state.container),
            NodeKind::Element(_) => None,
        }
    }
}

impl Node {
    pub(crate) fn with_kind(kind: NodeKind) -> Self {
        Node(Rc::new(RefCell::new(NodeData::new(kind))))
    }

    pub(crate) fn borrow(&self) -> Ref<'_, NodeData> {
        self.0.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, NodeData> {
        self.0.borrow_mut()
    }

    /// Whether both handles point to the same node
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Type tag of the node: the element tag, `"group"` or `"form"`
    pub fn node_type(&self) -> &'static str {
        match &self.borrow().kind {
            NodeKind::Element(state) => state.kind.tag(),
            NodeKind::Group(_) => "group",
            NodeKind::Form(_) => "form",
        }
    }

    pub fn variant(&self) -> NodeVariant {
        match &self.borrow().kind {
            NodeKind::Element(_) => NodeVariant::Element(Element(self.clone())),
            NodeKind::Group(_) => NodeVariant::Group(Group(self.clone())),
            NodeKind::Form(_) => NodeVariant::Form(Form(self.clone())),
        }
    }

    pub fn as_element(&self) -> Option<Element> {
        match self.variant() {
            NodeVariant::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<Group> {
        match self.variant() {
            NodeVariant::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.borrow().container_state().is_some()
    }

    pub(crate) fn is_form(&self) -> bool {
        matches!(self.borrow().kind, NodeKind::Form(_))
    }

    // ---------------------------------------------------------------
    // Naming and attributes
    // ---------------------------------------------------------------

    pub fn name(&self) -> Option<String> {
        self.borrow().name.clone()
    }

    /// Set the node's name.
    ///
    /// Renaming a group rewrites the names of all its descendants. A form's
    /// name is fixed at construction.
    pub fn set_name(&self, name: &str) -> FormResult<()> {
        match self.variant() {
            NodeVariant::Element(element) => element.set_name(name),
            NodeVariant::Group(group) => group.set_name(name),
            NodeVariant::Form(_) => return Err(FormError::read_only("name")),
        }
        Ok(())
    }

    /// Name assignment coming from a parent group
    pub(crate) fn assign_name(&self, name: String) {
        match self.variant() {
            NodeVariant::Element(element) => element.set_name(&name),
            NodeVariant::Group(group) => group.set_name(&name),
            NodeVariant::Form(_) => debug!(name = %name, "Ignoring rename of a form"),
        }
    }

    pub fn id(&self) -> Option<String> {
        self.borrow().id.clone()
    }

    pub fn set_id(&self, id: &str) -> FormResult<()> {
        if self.is_form() {
            return Err(FormError::read_only("id"));
        }
        self.borrow_mut().id = (!id.is_empty()).then(|| id.to_string());
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.borrow().attributes.get(name).cloned()
    }

    /// Additional HTML attributes (name, id and value are kept separately)
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.borrow().attributes.clone()
    }

    /// Set an HTML attribute. `id` and `name` are routed to their setters.
    pub fn set_attribute(&self, name: &str, value: &str) -> FormResult<()> {
        match name {
            "id" => self.set_id(value),
            "name" => self.set_name(value),
            "method" if self.is_form() => Err(FormError::read_only("method")),
            _ => {
                self.borrow_mut()
                    .attributes
                    .insert(name.to_string(), value.to_string());
                Ok(())
            }
        }
    }

    pub fn remove_attribute(&self, name: &str) -> FormResult<Option<String>> {
        if self.is_form() && matches!(name, "id" | "method") {
            return Err(FormError::read_only(name));
        }
        Ok(self.borrow_mut().attributes.remove(name))
    }

    pub fn label(&self) -> Option<String> {
        self.borrow().label.clone()
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.borrow_mut().label = Some(label.into());
    }

    // ---------------------------------------------------------------
    // Tree position
    // ---------------------------------------------------------------

    /// The container this node is attached to, if any
    pub fn container(&self) -> Option<Node> {
        self.borrow().container.upgrade().map(Node)
    }

    pub(crate) fn root(&self) -> Node {
        let mut current = self.clone();
        while let Some(parent) = current.container() {
            current = parent;
        }
        current
    }

    /// Whether `self` is `other` or one of its ancestors
    pub(crate) fn is_ancestor_of(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.container();
        }
        false
    }

    /// Children in insertion order; empty for leaf elements.
    pub fn children(&self) -> Vec<Node> {
        self.borrow()
            .container_state()
            .map(|state| state.children.clone())
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------
    // Freezing
    // ---------------------------------------------------------------

    pub fn is_frozen(&self) -> bool {
        self.borrow().frozen
    }

    /// Freeze or unfreeze the node; containers cascade to every descendant.
    /// Values are re-resolved, as frozen leaves skip submitted data.
    pub fn freeze(&self, frozen: bool) {
        FreezeVisitor {
            frozen: Some(frozen),
            persistent: None,
        }
        .visit_node(self);
        self.update_value();
    }

    pub fn is_persistent_freeze(&self) -> bool {
        self.borrow().persistent_freeze
    }

    /// Whether a frozen node still submits its value (as a hidden field).
    /// Containers cascade to every descendant; values are re-resolved.
    pub fn set_persistent_freeze(&self, persistent: bool) {
        FreezeVisitor {
            frozen: None,
            persistent: Some(persistent),
        }
        .visit_node(self);
        self.update_value();
    }

    // ---------------------------------------------------------------
    // Values
    // ---------------------------------------------------------------

    /// Current value: an element's filtered value, a group's subtree relative
    /// to the group name, or a form's filtered value map.
    pub fn value(&self) -> Option<Value> {
        match self.variant() {
            NodeVariant::Element(element) => element.value(),
            NodeVariant::Group(group) => group.value(),
            NodeVariant::Form(form) => Some(Value::Object(form.value())),
        }
    }

    /// Set an element's default value. Containers take their values from
    /// data sources only.
    pub fn set_value(&self, value: Value) -> FormResult<()> {
        match self.variant() {
            NodeVariant::Element(element) => {
                element.set_value(value);
                Ok(())
            }
            NodeVariant::Group(_) => Err(FormError::UnsupportedOperation(
                "group values come from data sources".to_string(),
            )),
            NodeVariant::Form(_) => Err(FormError::UnsupportedOperation(
                "form values come from data sources".to_string(),
            )),
        }
    }

    /// Re-resolve the values of this node and its descendants from the data
    /// sources of the enclosing form.
    pub fn update_value(&self) {
        UpdateValueVisitor.visit_node(self);
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    pub fn add_rule(&self, rule: Rule) {
        self.borrow_mut().rules.push(rule);
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.borrow().rules.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.borrow().error.clone()
    }

    pub fn set_error(&self, error: Option<String>) {
        self.borrow_mut().error = error;
    }

    /// Check this node's own rules, storing the first failure as its error.
    pub(crate) fn check_rules(&self) -> bool {
        let rules = self.rules();
        self.set_error(None);
        if rules.is_empty() {
            return true;
        }
        let value = self.value();
        match rules.iter().find(|rule| !rule.check(value.as_ref())) {
            Some(failed) => {
                debug!(node = ?self.name(), rule = failed.name(), "Validation rule failed");
                self.set_error(Some(failed.message().to_string()));
                false
            }
            None => true,
        }
    }

    /// Validate this node, then every descendant in order.
    ///
    /// Failures do not short-circuit: every node is visited so that all
    /// error messages are populated.
    ///
    /// A form node goes through [`Form::validate`], so an unsubmitted form
    /// is never valid.
    pub fn validate(&self) -> bool {
        match self.variant() {
            NodeVariant::Form(form) => form.validate(),
            _ => self.validate_tree(),
        }
    }

    /// Run every rule in the subtree, without the submission check
    pub(crate) fn validate_tree(&self) -> bool {
        let mut visitor = ValidateVisitor::new();
        visitor.visit_node(self);
        visitor.is_valid()
    }

    // ---------------------------------------------------------------
    // Output
    // ---------------------------------------------------------------

    /// Push this node (and its subtree) into a renderer
    pub fn render(&self, renderer: &mut dyn Renderer) {
        RenderVisitor::new(renderer).visit_node(self);
    }

    /// Render as a string, joining children with the configured linebreak
    pub fn to_html(&self, options: &Options) -> String {
        match self.variant() {
            NodeVariant::Element(element) => element.to_html(),
            NodeVariant::Group(group) => group.to_html(options),
            NodeVariant::Form(form) => form.to_html(options),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.borrow();
        f.debug_struct("Node")
            .field("type", &self.node_type())
            .field("name", &data.name)
            .field("id", &data.id)
            .field("children", &data.container_state().map(|s| s.children.len()))
            .finish()
    }
}

struct FreezeVisitor {
    frozen: Option<bool>,
    persistent: Option<bool>,
}

impl Visitor for FreezeVisitor {
    fn visit_node(&mut self, node: &Node) {
        {
            let mut data = node.borrow_mut();
            if let Some(frozen) = self.frozen {
                data.frozen = frozen;
            }
            if let Some(persistent) = self.persistent {
                data.persistent_freeze = persistent;
            }
        }
        walk_node(self, node);
    }
}

struct UpdateValueVisitor;

impl Visitor for UpdateValueVisitor {
    fn visit_element(&mut self, element: &Element) {
        element.update_value();
    }
}
