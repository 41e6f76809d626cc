//! Validation rules attached to nodes.
//!
//! Length rules only look at non-empty values; emptiness is the business of
//! [`Rule::required`].

use std::fmt;
use std::rc::Rc;

use formwork_common::value::{as_text, is_empty};
use serde_json::{json, Value};

pub type RuleCallback = Rc<dyn Fn(Option<&Value>) -> bool>;

#[derive(Clone)]
pub enum RuleKind {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Equals(String),
    Callback(RuleCallback),
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Required => write!(f, "Required"),
            RuleKind::MinLength(n) => write!(f, "MinLength({})", n),
            RuleKind::MaxLength(n) => write!(f, "MaxLength({})", n),
            RuleKind::Equals(s) => write!(f, "Equals({:?})", s),
            RuleKind::Callback(_) => write!(f, "Callback"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    message: String,
    client_side: bool,
}

impl Rule {
    pub fn new(kind: RuleKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            client_side: false,
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(RuleKind::Required, message)
    }

    pub fn min_length(length: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MinLength(length), message)
    }

    pub fn max_length(length: usize, message: impl Into<String>) -> Self {
        Self::new(RuleKind::MaxLength(length), message)
    }

    pub fn equals(expected: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(RuleKind::Equals(expected.into()), message)
    }

    pub fn callback(
        check: impl Fn(Option<&Value>) -> bool + 'static,
        message: impl Into<String>,
    ) -> Self {
        Self::new(RuleKind::Callback(Rc::new(check)), message)
    }

    /// Also run this rule in the browser
    pub fn client_side(mut self) -> Self {
        self.client_side = true;
        self
    }

    pub fn is_client_side(&self) -> bool {
        self.client_side
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            RuleKind::Required => "required",
            RuleKind::MinLength(_) => "min_length",
            RuleKind::MaxLength(_) => "max_length",
            RuleKind::Equals(_) => "equals",
            RuleKind::Callback(_) => "callback",
        }
    }

    /// Argument passed to client-side checks, if the rule has one
    pub fn argument(&self) -> Option<Value> {
        match &self.kind {
            RuleKind::MinLength(n) | RuleKind::MaxLength(n) => Some(json!(n)),
            RuleKind::Equals(expected) => Some(json!(expected)),
            RuleKind::Required | RuleKind::Callback(_) => None,
        }
    }

    pub fn check(&self, value: Option<&Value>) -> bool {
        match &self.kind {
            RuleKind::Required => !is_empty(value),
            RuleKind::MinLength(min) => length(value).map_or(true, |len| len >= *min),
            RuleKind::MaxLength(max) => length(value).map_or(true, |len| len <= *max),
            RuleKind::Equals(expected) => {
                is_empty(value) || value.and_then(as_text).as_deref() == Some(expected.as_str())
            }
            RuleKind::Callback(check) => check(value),
        }
    }
}

/// Character count of text, item count of lists; `None` for empty values
fn length(value: Option<&Value>) -> Option<usize> {
    if is_empty(value) {
        return None;
    }
    match value? {
        Value::Array(items) => Some(items.len()),
        other => as_text(other).map(|text| text.chars().count()),
    }
}
