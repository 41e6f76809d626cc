//! # Rendering
//!
//! Visitor-mode rendering: the form pushes itself into a [`Renderer`] in
//! tree order.
//!
//! ```text
//! start_form ─→ script_builder().set_form_id ─→ children ─→ client rules ─→ finish_form
//!                                                 │
//!                              group: start_group … children … finish_group
//!                              leaf:  render_element
//! ```

use formwork_common::FormResult;
use serde::Serialize;
use serde_json::Value;

use crate::element::Element;
use crate::form::Form;
use crate::group::Group;
use crate::node::Node;
use crate::visitor::{walk_children, walk_node, Visitor};

/// Output backend driven by the render cascade
pub trait Renderer {
    fn start_form(&mut self, form: &Form);

    fn finish_form(&mut self, form: &Form);

    fn start_group(&mut self, group: &Group);

    fn finish_group(&mut self, group: &Group);

    fn render_element(&mut self, element: &Element);

    /// Collector for client-side validation rules
    fn script_builder(&mut self) -> &mut ScriptBuilder;
}

/// Client-side rule descriptor handed to the browser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRule {
    pub field: String,
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<Value>,
    pub message: String,
}

/// Collects client-side rules for one form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptBuilder {
    #[serde(rename = "form")]
    form_id: Option<String>,
    rules: Vec<ClientRule>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_form_id(&mut self, form_id: Option<String>) {
        self.form_id = form_id;
    }

    pub fn form_id(&self) -> Option<&str> {
        self.form_id.as_deref()
    }

    pub fn add_rule(&mut self, rule: ClientRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[ClientRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// JSON payload describing the form's client-side rules
    pub fn to_json(&self) -> FormResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub(crate) struct RenderVisitor<'r> {
    renderer: &'r mut dyn Renderer,
}

impl<'r> RenderVisitor<'r> {
    pub(crate) fn new(renderer: &'r mut dyn Renderer) -> Self {
        Self { renderer }
    }
}

impl Visitor for RenderVisitor<'_> {
    fn visit_element(&mut self, element: &Element) {
        self.renderer.render_element(element);
    }

    fn visit_group(&mut self, group: &Group) {
        self.renderer.start_group(group);
        walk_children(self, group);
        self.renderer.finish_group(group);
    }

    fn visit_form(&mut self, form: &Form) {
        form.render(&mut *self.renderer);
    }
}

/// Hands every client-side rule in a subtree to a script builder
pub(crate) struct ClientRulesVisitor<'b> {
    builder: &'b mut ScriptBuilder,
}

impl<'b> ClientRulesVisitor<'b> {
    pub(crate) fn new(builder: &'b mut ScriptBuilder) -> Self {
        Self { builder }
    }
}

impl Visitor for ClientRulesVisitor<'_> {
    fn visit_node(&mut self, node: &Node) {
        let field = node.name().or_else(|| node.id()).unwrap_or_default();
        for rule in node.rules().iter().filter(|rule| rule.is_client_side()) {
            self.builder.add_rule(ClientRule {
                field: field.clone(),
                rule: rule.name().to_string(),
                argument: rule.argument(),
                message: rule.message().to_string(),
            });
        }
        walk_node(self, node);
    }
}
