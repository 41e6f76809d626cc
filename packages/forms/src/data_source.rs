//! # Data sources
//!
//! Read-only providers of field values. A form asks its sources in list
//! order and the first non-null answer wins.
//!
//! A [`DataSourceKind::Submit`] source additionally marks the form as
//! submitted: its presence is the only signal distinguishing a submitted
//! form from a fresh one.

use std::fmt;

use formwork_common::value::{lookup, ValueMap};
use formwork_common::{FormError, FormResult};
use serde_json::Value;

use crate::form::{Method, RequestData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    /// Defaults, e.g. values loaded from a database record
    Default,
    /// Values submitted by the client
    Submit,
}

/// Provider of element values, looked up by wire name (`a[b]` is
/// `values["a"]["b"]`).
pub trait DataSource: fmt::Debug {
    fn value(&self, name: &str) -> Option<Value>;

    fn kind(&self) -> DataSourceKind {
        DataSourceKind::Default
    }
}

/// Data source over an in-memory value map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayDataSource {
    values: ValueMap,
}

impl ArrayDataSource {
    pub fn new(values: ValueMap) -> Self {
        Self { values }
    }

    /// Build from a JSON object; anything else is rejected.
    pub fn from_json(value: Value) -> FormResult<Self> {
        match value {
            Value::Object(values) => Ok(Self::new(values)),
            other => Err(FormError::InvalidInput(format!(
                "data source must be a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }
}

impl DataSource for ArrayDataSource {
    fn value(&self, name: &str) -> Option<Value> {
        lookup(&self.values, name).cloned()
    }
}

/// Values submitted with the request for the form's method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmitDataSource {
    values: ValueMap,
}

impl SubmitDataSource {
    pub fn new(values: ValueMap) -> Self {
        Self { values }
    }

    /// Capture the part of the request matching `method`: the query string
    /// for GET, the body for POST.
    pub fn from_request(request: &RequestData, method: Method) -> Self {
        let values = match method {
            Method::Get => request.query.clone(),
            Method::Post => request.body.clone(),
        };
        Self::new(values)
    }
}

impl DataSource for SubmitDataSource {
    fn value(&self, name: &str) -> Option<Value> {
        lookup(&self.values, name).cloned()
    }

    fn kind(&self) -> DataSourceKind {
        DataSourceKind::Submit
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
