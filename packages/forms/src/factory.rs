//! Element factory: builds nodes from a type tag.
//!
//! Recognised tags are the [`ElementKind`] tags plus `group`. The `id` and
//! `value` attributes are applied through their setters; everything else is
//! kept as a plain HTML attribute.

use std::collections::BTreeMap;

use formwork_common::{FormError, FormResult};
use serde_json::Value;

use crate::element::{Element, ElementKind};
use crate::group::Group;
use crate::node::Node;

pub fn is_registered(type_tag: &str) -> bool {
    type_tag.eq_ignore_ascii_case("group") || ElementKind::from_tag(type_tag).is_some()
}

/// Create a leaf element. Unknown or container tags fail with `InvalidInput`.
pub fn create_element(
    type_tag: &str,
    name: &str,
    attributes: BTreeMap<String, String>,
) -> FormResult<Element> {
    let kind = ElementKind::from_tag(type_tag).ok_or_else(|| {
        FormError::InvalidInput(format!("element type '{}' is not known", type_tag))
    })?;
    let element = Element::new(kind, name);
    apply_attributes(&element, attributes)?;
    Ok(element)
}

/// Create any registered node, including groups
pub fn create(type_tag: &str, name: &str, attributes: BTreeMap<String, String>) -> FormResult<Node> {
    if type_tag.eq_ignore_ascii_case("group") {
        let group = Group::named(name);
        apply_attributes(&group, attributes)?;
        return Ok(group.into());
    }
    create_element(type_tag, name, attributes).map(Node::from)
}

fn apply_attributes(node: &Node, attributes: BTreeMap<String, String>) -> FormResult<()> {
    for (key, value) in attributes {
        match key.as_str() {
            "value" => node.set_value(Value::String(value))?,
            _ => node.set_attribute(&key, &value)?,
        }
    }
    Ok(())
}
