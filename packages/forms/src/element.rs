//! Leaf elements.
//!
//! An element owns a default value and a resolved value. Resolution asks the
//! enclosing form's data sources in order and falls back to the default:
//!
//! ```text
//! data source 1 ─┐
//! data source 2 ─┼─ first non-null hit ─→ value
//! default ───────┘   (else)
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use formwork_common::html::{attributes_to_string, escape_html};
use formwork_common::value::as_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::data_source::DataSourceKind;
use crate::filter::ElementFilter;
use crate::node::{Node, NodeKind};

/// Supported leaf element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Password,
    Hidden,
    Textarea,
    Submit,
    Button,
}

impl ElementKind {
    pub const ALL: [ElementKind; 6] = [
        ElementKind::Text,
        ElementKind::Password,
        ElementKind::Hidden,
        ElementKind::Textarea,
        ElementKind::Submit,
        ElementKind::Button,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Password => "password",
            ElementKind::Hidden => "hidden",
            ElementKind::Textarea => "textarea",
            ElementKind::Submit => "submit",
            ElementKind::Button => "button",
        }
    }
}

pub(crate) struct ElementState {
    pub(crate) kind: ElementKind,
    pub(crate) value: Option<Value>,
    pub(crate) default: Option<Value>,
    pub(crate) filters: Vec<ElementFilter>,
}

/// Handle to a leaf element
#[derive(Debug, Clone)]
pub struct Element(pub(crate) Node);

impl Element {
    pub fn new(kind: ElementKind, name: impl Into<String>) -> Self {
        let node = Node::with_kind(NodeKind::Element(ElementState {
            kind,
            value: None,
            default: None,
            filters: Vec::new(),
        }));
        node.borrow_mut().name = Some(name.into());
        Element(node)
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    fn with_state<T>(&self, f: impl FnOnce(&ElementState) -> T) -> T {
        match &self.0.borrow().kind {
            NodeKind::Element(state) => f(state),
            _ => unreachable!("element handle over a container node"),
        }
    }

    fn with_state_mut<T>(&self, f: impl FnOnce(&mut ElementState) -> T) -> T {
        match &mut self.0.borrow_mut().kind {
            NodeKind::Element(state) => f(state),
            _ => unreachable!("element handle over a container node"),
        }
    }

    pub fn element_kind(&self) -> ElementKind {
        self.with_state(|state| state.kind)
    }

    /// Rename the element and re-resolve its value under the new name
    pub fn set_name(&self, name: &str) {
        self.0.borrow_mut().name = Some(name.to_string());
        self.update_value();
    }

    /// Set the default value, used whenever no data source answers.
    pub fn set_value(&self, value: impl Into<Value>) {
        let value = value.into();
        self.with_state_mut(|state| state.default = Some(value));
        self.update_value();
    }

    pub fn default_value(&self) -> Option<Value> {
        self.with_state(|state| state.default.clone())
    }

    /// Resolved value before element filters
    pub fn raw_value(&self) -> Option<Value> {
        self.with_state(|state| state.value.clone())
    }

    /// Resolved value with every element filter applied in order
    pub fn value(&self) -> Option<Value> {
        let (value, filters) = self.with_state(|state| (state.value.clone(), state.filters.clone()));
        value.map(|value| filters.iter().fold(value, |acc, filter| filter(acc)))
    }

    pub fn add_filter(&self, filter: impl Fn(Value) -> Value + 'static) {
        self.with_state_mut(|state| state.filters.push(Rc::new(filter)));
    }

    /// Whether a browser would submit this element: not frozen, or frozen
    /// with persistent freeze.
    pub fn is_submittable(&self) -> bool {
        !self.is_frozen() || self.is_persistent_freeze()
    }

    /// Take the value from the first data source of the enclosing form that
    /// answers for this element's name, else fall back to the default.
    ///
    /// A frozen element without persistent freeze is never re-submitted, so
    /// submission-kind sources are skipped for it.
    pub fn update_value(&self) {
        let sources = self.0.root().form_data_sources();
        let name = self.name().unwrap_or_default();
        let submittable = self.is_submittable();

        let resolved = if name.is_empty() {
            None
        } else {
            sources
                .iter()
                .filter(|source| submittable || source.kind() != DataSourceKind::Submit)
                .find_map(|source| source.value(&name).filter(|value| !value.is_null()))
        };

        trace!(element = %name, found = resolved.is_some(), "Resolved element value");
        self.with_state_mut(|state| {
            state.value = resolved.or_else(|| state.default.clone());
        });
    }

    fn value_text(&self) -> String {
        self.value().as_ref().and_then(as_text).unwrap_or_default()
    }

    /// Render the element as HTML markup.
    ///
    /// Frozen elements render their value as text; with persistent freeze a
    /// hidden field carries the value along.
    pub fn to_html(&self) -> String {
        let kind = self.element_kind();
        let name = self.name().unwrap_or_default();
        let value = self.value_text();

        if self.is_frozen() {
            let hidden = if self.is_persistent_freeze() {
                hidden_input(&name, &value)
            } else {
                String::new()
            };
            return match kind {
                ElementKind::Hidden => hidden,
                ElementKind::Submit | ElementKind::Button => String::new(),
                ElementKind::Password if value.is_empty() => hidden,
                ElementKind::Password => format!("********{}", hidden),
                ElementKind::Text | ElementKind::Textarea => {
                    format!("{}{}", escape_html(&value), hidden)
                }
            };
        }

        let mut attributes = self.attributes();
        attributes.insert("name".to_string(), name);
        if let Some(id) = self.id() {
            attributes.insert("id".to_string(), id);
        }

        match kind {
            ElementKind::Textarea => format!(
                "<textarea{}>{}</textarea>",
                attributes_to_string(&attributes),
                escape_html(&value)
            ),
            ElementKind::Password => {
                attributes.insert("type".to_string(), kind.tag().to_string());
                format!("<input{} />", attributes_to_string(&attributes))
            }
            _ => {
                attributes.insert("type".to_string(), kind.tag().to_string());
                if !value.is_empty() {
                    attributes.insert("value".to_string(), value);
                }
                format!("<input{} />", attributes_to_string(&attributes))
            }
        }
    }
}

fn hidden_input(name: &str, value: &str) -> String {
    let attributes = BTreeMap::from([
        ("name".to_string(), name.to_string()),
        ("type".to_string(), "hidden".to_string()),
        ("value".to_string(), value.to_string()),
    ]);
    format!("<input{} />", attributes_to_string(&attributes))
}

impl Deref for Element {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        element.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
