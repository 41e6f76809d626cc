use std::rc::Rc;

use formwork_common::value::ValueMap;
use formwork_common::INTERNAL_PREFIX;
use serde_json::Value;

/// Transform applied to a form's aggregate value map
pub type ValueFilter = Rc<dyn Fn(ValueMap) -> ValueMap>;

/// Transform applied to a single element's value
pub type ElementFilter = Rc<dyn Fn(Value) -> Value>;

/// Apply filters in registration order
pub(crate) fn apply(filters: &[ValueFilter], values: ValueMap) -> ValueMap {
    filters.iter().fold(values, |acc, filter| filter(acc))
}

/// Drop every top-level key reserved for internal bookkeeping (`_qf...`).
///
/// Installed first on every form so submission-tracking fields never reach
/// application code.
pub fn skip_internal_fields(values: ValueMap) -> ValueMap {
    values
        .into_iter()
        .filter(|(key, _)| !key.starts_with(INTERNAL_PREFIX))
        .collect()
}
