pub mod error;
pub mod html;
pub mod naming;
pub mod result;
pub mod value;

pub use error::*;
pub use result::*;
pub use value::ValueMap;

/// Prefix reserved for internal bookkeeping fields such as `_qf__<form id>`.
pub const INTERNAL_PREFIX: &str = "_qf";
