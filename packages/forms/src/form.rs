//! # Forms
//!
//! The form is the root container. It owns the data sources, decides once at
//! construction whether it was submitted, and filters the aggregate value
//! map before handing it to the application.
//!
//! ## Submission detection
//!
//! With submit tracking on (the default, needs a non-empty id) the form adds
//! a hidden `_qf__<id>` field and counts as submitted when the request
//! carries that field. With tracking off, any request data for the form's
//! method counts. Either way a [`SubmitDataSource`] is attached, and
//! [`Form::is_submitted`] only checks for its presence.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use formwork_common::html::attributes_to_string;
use formwork_common::value::{lookup, ValueMap};
use formwork_common::{FormError, FormResult, INTERNAL_PREFIX};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::container::{Container, ContainerState, ValueCollector};
use crate::data_source::{ArrayDataSource, DataSource, DataSourceKind, SubmitDataSource};
use crate::factory;
use crate::filter::{self, skip_internal_fields, ValueFilter};
use crate::node::{Node, NodeKind};
use crate::options::Options;
use crate::renderer::{ClientRulesVisitor, RenderVisitor, Renderer, ScriptBuilder};
use crate::visitor::{walk_children, Visitor};

/// HTTP method used to submit a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    #[default]
    Post,
}

impl Method {
    /// Case-insensitive; anything but `get` means POST
    pub fn parse(method: &str) -> Self {
        if method.eq_ignore_ascii_case("get") {
            Method::Get
        } else {
            Method::Post
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
        }
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let method = String::deserialize(deserializer)?;
        Ok(Method::parse(&method))
    }
}

/// Already-parsed inbound request state
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestData {
    /// Query string values
    pub query: ValueMap,
    /// Form body values
    pub body: ValueMap,
    /// Uploaded files, keyed by field name
    pub files: ValueMap,
    /// URL of the current request, the default form action
    pub url: String,
}

impl RequestData {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: ValueMap) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: ValueMap) -> Self {
        self.body = body;
        self
    }

    pub fn with_files(mut self, files: ValueMap) -> Self {
        self.files = files;
        self
    }

    /// Whether the query or the body carries a value for `name`
    pub fn contains(&self, name: &str) -> bool {
        lookup(&self.query, name).is_some() || lookup(&self.body, name).is_some()
    }

    /// Whether any data arrived for the given method
    pub fn has_data_for(&self, method: Method) -> bool {
        match method {
            Method::Get => !self.query.is_empty(),
            Method::Post => !self.body.is_empty() || !self.files.is_empty(),
        }
    }
}

/// Construction-time settings of a [`Form`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub method: Method,
    /// Extra `<form>` attributes; `id` and `method` here are ignored
    pub attributes: BTreeMap<String, String>,
    /// Add the hidden `_qf__<id>` field and use it to detect submission
    pub track_submit: bool,
    /// Defaults to the request URL
    pub action: Option<String>,
    pub request: RequestData,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            method: Method::Post,
            attributes: BTreeMap::new(),
            track_submit: true,
            action: None,
            request: RequestData::default(),
        }
    }
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = Method::parse(method);
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn track_submit(mut self, track_submit: bool) -> Self {
        self.track_submit = track_submit;
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn request(mut self, request: RequestData) -> Self {
        self.request = request;
        self
    }

    pub fn from_json(json: &str) -> FormResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub(crate) struct FormState {
    pub(crate) container: ContainerState,
    pub(crate) method: Method,
    pub(crate) data_sources: Vec<Rc<dyn DataSource>>,
    pub(crate) filters: Vec<ValueFilter>,
}

/// Name of the hidden field tracking submission of form `id`
pub fn tracking_field_name(id: &str) -> String {
    format!("{}__{}", INTERNAL_PREFIX, id)
}

/// Handle to a form, the root of a tree
#[derive(Debug, Clone)]
pub struct Form(pub(crate) Node);

impl Form {
    /// Build a form. `id` and the method cannot be changed afterwards.
    pub fn new(id: &str, config: FormConfig) -> FormResult<Self> {
        let FormConfig {
            method,
            mut attributes,
            track_submit,
            action,
            request,
        } = config;

        let id = (!id.is_empty()).then(|| id.to_string());
        let track_submit = track_submit && id.is_some();

        attributes.remove("id");
        let action = action
            .or_else(|| attributes.remove("action"))
            .unwrap_or_else(|| request.url.clone());
        attributes.insert("action".to_string(), action);
        attributes.insert("method".to_string(), method.as_str().to_string());

        let node = Node::with_kind(NodeKind::Form(FormState {
            container: ContainerState::default(),
            method,
            data_sources: Vec::new(),
            filters: Vec::new(),
        }));
        {
            let mut data = node.borrow_mut();
            data.id = id.clone();
            data.attributes = attributes;
        }
        let form = Form(node);

        let submitted = match &id {
            Some(id) if track_submit => request.contains(&tracking_field_name(id)),
            _ => !track_submit && request.has_data_for(method),
        };
        info!(
            form = ?id,
            method = method.as_str(),
            track_submit,
            submitted,
            "Creating form"
        );
        if submitted {
            form.push_data_source(Rc::new(SubmitDataSource::from_request(&request, method)));
        }

        if let Some(id) = id.as_deref().filter(|_| track_submit) {
            let hidden = factory::create_element(
                "hidden",
                &tracking_field_name(id),
                BTreeMap::from([("id".to_string(), format!("qf:{}", id))]),
            )?;
            form.append_child(hidden)?;
        }

        form.add_filter(skip_internal_fields);
        Ok(form)
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    fn with_state<T>(&self, f: impl FnOnce(&FormState) -> T) -> T {
        match &self.0.borrow().kind {
            NodeKind::Form(state) => f(state),
            _ => unreachable!("form handle over a non-form node"),
        }
    }

    fn with_state_mut<T>(&self, f: impl FnOnce(&mut FormState) -> T) -> T {
        match &mut self.0.borrow_mut().kind {
            NodeKind::Form(state) => f(state),
            _ => unreachable!("form handle over a non-form node"),
        }
    }

    pub fn method(&self) -> Method {
        self.with_state(|state| state.method)
    }

    pub fn action(&self) -> Option<String> {
        self.attribute("action")
    }

    /// The form id is fixed at construction
    pub fn set_id(&self, _id: &str) -> FormResult<()> {
        Err(FormError::read_only("id"))
    }

    /// The form name is fixed at construction
    pub fn set_name(&self, _name: &str) -> FormResult<()> {
        Err(FormError::read_only("name"))
    }

    /// Form values come from data sources; direct assignment is rejected.
    pub fn set_value(&self, _value: Value) -> FormResult<()> {
        Err(FormError::UnsupportedOperation(
            "form values come from data sources".to_string(),
        ))
    }

    // ---------------------------------------------------------------
    // Data sources
    // ---------------------------------------------------------------

    fn push_data_source(&self, source: Rc<dyn DataSource>) {
        self.with_state_mut(|state| state.data_sources.push(source));
    }

    /// Append a data source (lowest priority) and re-resolve all values
    pub fn add_data_source(&self, source: impl DataSource + 'static) {
        debug!(source = ?source, "Adding data source");
        self.push_data_source(Rc::new(source));
        self.update_value();
    }

    /// Replace the data source list and re-resolve all values
    pub fn set_data_sources(&self, sources: Vec<Rc<dyn DataSource>>) {
        debug!(count = sources.len(), "Replacing data sources");
        self.with_state_mut(|state| state.data_sources = sources);
        self.update_value();
    }

    /// Replace the data sources with a JSON array of value maps.
    ///
    /// Every element must be an object; otherwise nothing changes and
    /// `InvalidInput` is returned.
    pub fn set_data_sources_json(&self, sources: Value) -> FormResult<()> {
        let Value::Array(items) = sources else {
            return Err(FormError::InvalidInput(
                "data sources must be given as an array".to_string(),
            ));
        };
        let sources = items
            .into_iter()
            .map(|item| {
                ArrayDataSource::from_json(item).map(|source| Rc::new(source) as Rc<dyn DataSource>)
            })
            .collect::<FormResult<Vec<_>>>()?;
        self.set_data_sources(sources);
        Ok(())
    }

    pub fn data_sources(&self) -> Vec<Rc<dyn DataSource>> {
        self.with_state(|state| state.data_sources.clone())
    }

    /// Whether a submission-kind data source is attached
    pub fn is_submitted(&self) -> bool {
        self.with_state(|state| {
            state
                .data_sources
                .iter()
                .any(|source| source.kind() == DataSourceKind::Submit)
        })
    }

    // ---------------------------------------------------------------
    // Values
    // ---------------------------------------------------------------

    /// Register a filter run on the aggregate value map after the
    /// previously registered ones
    pub fn add_filter(&self, filter: impl Fn(ValueMap) -> ValueMap + 'static) {
        self.with_state_mut(|state| state.filters.push(Rc::new(filter)));
    }

    fn filtered(&self, values: ValueMap) -> ValueMap {
        let filters = self.with_state(|state| state.filters.clone());
        filter::apply(&filters, values)
    }

    /// Values of all elements, nested by wire name and filtered
    pub fn value(&self) -> ValueMap {
        self.filtered(ValueCollector::new(false).collect(&self.0))
    }

    /// Values a browser would submit: frozen elements without persistent
    /// freeze are left out
    pub fn submitted_value(&self) -> ValueMap {
        self.filtered(ValueCollector::new(true).collect(&self.0))
    }

    // ---------------------------------------------------------------
    // Validation and output
    // ---------------------------------------------------------------

    /// Validate the whole tree. A form that was not submitted is never valid.
    pub fn validate(&self) -> bool {
        if !self.is_submitted() {
            debug!(form = ?self.id(), "Form not submitted, skipping validation");
            return false;
        }
        let valid = self.0.validate_tree();
        info!(form = ?self.id(), valid, "Form validated");
        valid
    }

    /// Push the form into a renderer: start, children, client rules, finish
    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.start_form(self);
        renderer.script_builder().set_form_id(self.id());
        {
            let mut visitor = RenderVisitor::new(&mut *renderer);
            walk_children(&mut visitor, &self.0);
        }
        self.render_client_rules(renderer.script_builder());
        renderer.finish_form(self);
    }

    fn render_client_rules(&self, builder: &mut ScriptBuilder) {
        ClientRulesVisitor::new(builder).visit_node(&self.0);
    }

    /// String rendering: the `<form>` tag around each child's markup
    pub fn to_html(&self, options: &Options) -> String {
        let mut attributes = self.attributes();
        if let Some(id) = self.id() {
            attributes.insert("id".to_string(), id);
        }
        let mut parts = vec![format!("<form{}>", attributes_to_string(&attributes))];
        parts.extend(self.children().iter().map(|child| child.to_html(options)));
        parts.push("</form>".to_string());
        parts.join(&options.linebreak)
    }
}

impl Node {
    /// Data sources of the form this node is the root of (none otherwise)
    pub(crate) fn form_data_sources(&self) -> Vec<Rc<dyn DataSource>> {
        match &self.borrow().kind {
            NodeKind::Form(state) => state.data_sources.clone(),
            _ => Vec::new(),
        }
    }
}

impl Deref for Form {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html(&Options::default()))
    }
}
