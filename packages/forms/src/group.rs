//! # Groups
//!
//! A group is a container that prefixes its descendants' names with its own,
//! so that their values arrive as a nested structure:
//!
//! ```text
//! group "addr"                 wire names
//! ├── text "city"        →     addr[city]
//! └── group "geo"        →     addr[geo]
//!     └── text "lat"     →     addr[geo][lat]
//! ```
//!
//! ## Renaming
//!
//! `set_name` remembers the previous name and rewrites every child. A child
//! that already carries the previous prefix has it stripped (up to the last
//! occurrence of the previous name's final segment) before the new prefix is
//! applied, so renames never stack prefixes. Renaming a nested group
//! re-triggers the rewrite for its own children, which propagates a change
//! down the whole subtree.

use std::fmt;
use std::ops::Deref;

use formwork_common::naming::{self, tokenize};
use formwork_common::{FormError, FormResult};
use serde_json::Value;
use tracing::debug;

use crate::container::{Container, ContainerState, ValueCollector};
use crate::node::{Node, NodeKind};
use crate::options::Options;

#[derive(Default)]
pub(crate) struct GroupState {
    pub(crate) previous_name: Option<String>,
    pub(crate) container: ContainerState,
}

/// Handle to a group of elements
#[derive(Debug, Clone)]
pub struct Group(pub(crate) Node);

impl Group {
    /// Create an unnamed group; its children keep their own names.
    pub fn new() -> Self {
        Group(Node::with_kind(NodeKind::Group(GroupState::default())))
    }

    pub fn named(name: &str) -> Self {
        let group = Self::new();
        group.set_name(name);
        group
    }

    pub fn previous_name(&self) -> Option<String> {
        match &self.0.borrow().kind {
            NodeKind::Group(state) => state.previous_name.clone(),
            _ => None,
        }
    }

    /// Rename the group and rewrite the names of all descendants.
    ///
    /// An empty name unwraps the group: children lose the old prefix and
    /// keep only their relative names.
    pub fn set_name(&self, name: &str) {
        let previous = {
            let mut data = self.0.borrow_mut();
            let previous = data.name.replace(name.to_string());
            if let NodeKind::Group(state) = &mut data.kind {
                state.previous_name = previous.clone();
            }
            previous
        };
        debug!(group = %name, previous = ?previous, "Renaming group");

        for child in self.children() {
            self.rename_child(&child);
        }
    }

    /// Recompute a child's wire name from this group's current and previous
    /// names. The child may be attached already or about to be attached.
    pub(crate) fn rename_child(&self, child: &Node) {
        let current = child.name().unwrap_or_default();
        let already_child = child
            .container()
            .is_some_and(|container| container.ptr_eq(&self.0));
        let name = self.name();
        let previous = self.previous_name();

        if let Some(new_name) =
            naming::rename(&current, name.as_deref(), previous.as_deref(), already_child)
        {
            if new_name != current {
                debug!(from = %current, to = %new_name, "Renaming child");
            }
            child.assign_name(new_name);
        }
    }

    /// Strip this group's prefix from a child that was just detached
    pub(crate) fn unprefix_child(&self, child: &Node) {
        let Some(group_name) = self.name().filter(|name| !name.is_empty()) else {
            return;
        };
        let current = child.name().unwrap_or_default();
        let relative = naming::strip_group_prefix(&current, &group_name);
        if relative != current {
            child.assign_name(relative);
        }
    }

    /// Values of the subtree, relative to the group's own name.
    pub fn value(&self) -> Option<Value> {
        let values = ValueCollector::new(false).collect(&self.0);
        let mut current = Value::Object(values);
        if let Some(name) = self.name().filter(|name| !name.is_empty()) {
            for token in tokenize(&name) {
                current = match current {
                    Value::Object(mut map) => map.remove(&token)?,
                    _ => return None,
                };
            }
        }
        match &current {
            Value::Object(map) if map.is_empty() => None,
            _ => Some(current),
        }
    }

    /// Group values come from data sources; direct assignment is rejected.
    pub fn set_value(&self, _value: Value) -> FormResult<()> {
        Err(FormError::UnsupportedOperation(
            "group values come from data sources".to_string(),
        ))
    }

    /// Render each child independently, joined by the configured linebreak
    pub fn to_html(&self, options: &Options) -> String {
        self.children()
            .iter()
            .map(|child| child.to_html(options))
            .collect::<Vec<_>>()
            .join(&options.linebreak)
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Group {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        group.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html(&Options::default()))
    }
}
