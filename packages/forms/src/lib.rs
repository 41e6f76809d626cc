//! # Formwork Forms
//!
//! Composable HTML form trees.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ data sources: request body, defaults, ...   │
//! └─────────────────────────────────────────────┘
//!                     ↓ first hit wins
//! ┌─────────────────────────────────────────────┐
//! │ form: root container                        │
//! │  - submission detection                     │
//! │  - value filter pipeline                    │
//! │  - validate / render orchestration          │
//! │    group: rewrites descendant names         │
//! │      element: name, value, rules            │
//! └─────────────────────────────────────────────┘
//!                     ↓ visitor
//! ┌─────────────────────────────────────────────┐
//! │ renderer: HTML, client rule descriptors     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use formwork_forms::{Container, Element, ElementKind, Form, FormConfig, Group, RequestData};
//! use serde_json::json;
//!
//! let request = RequestData::new("/signup").with_body(
//!     json!({"_qf__f1": "", "addr": {"city": "Oslo"}})
//!         .as_object()
//!         .cloned()
//!         .unwrap(),
//! );
//! let form = Form::new("f1", FormConfig::new().method("POST").request(request)).unwrap();
//!
//! let addr = Group::named("addr");
//! let city = Element::new(ElementKind::Text, "city");
//! addr.append_child(city.clone()).unwrap();
//! form.append_child(addr).unwrap();
//!
//! assert!(form.is_submitted());
//! assert_eq!(city.name().as_deref(), Some("addr[city]"));
//! assert_eq!(city.value(), Some(json!("Oslo")));
//! ```
//!
//! Trees are request-scoped and single-threaded: handles are `Rc`-based and
//! must not be shared between request handlers.

mod container;
mod data_source;
mod element;
pub mod factory;
mod filter;
mod form;
mod group;
mod node;
mod options;
mod renderer;
mod rules;
pub mod visitor;

pub use container::Container;
pub use data_source::{ArrayDataSource, DataSource, DataSourceKind, SubmitDataSource};
pub use element::{Element, ElementKind};
pub use filter::{skip_internal_fields, ElementFilter, ValueFilter};
pub use form::{tracking_field_name, Form, FormConfig, Method, RequestData};
pub use group::Group;
pub use node::{Node, NodeVariant};
pub use options::Options;
pub use renderer::{ClientRule, Renderer, ScriptBuilder};
pub use rules::{Rule, RuleCallback, RuleKind};

// Re-export common types for convenience
pub use formwork_common::{FormError, FormResult, ValueMap, INTERNAL_PREFIX};
