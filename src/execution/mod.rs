//! Script execution adapter: bind inputs, run, harvest serializable outputs.

use std::collections::BTreeMap;

use rhai::EvalAltResult;
use thiserror::Error;

mod adapter;
pub mod convert;

pub use adapter::ScriptAdapter;
pub use convert::{is_dunder, is_excluded, is_type_error, Converter, ValueKind};

/// Harvested local bindings of one `exec` call.
pub type Outputs = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script raised, or coercion failed for a reason other than a type mismatch.
    #[error(transparent)]
    Interpreter(#[from] Box<EvalAltResult>),

    /// A value has no host representation.
    #[error("{message}")]
    Conversion {
        message: String,
        #[source]
        source: Box<EvalAltResult>,
    },

    /// A host value could not be coerced into the interpreter.
    #[error("cannot bind '{name}' in the script context")]
    Binding {
        name: String,
        #[source]
        source: Box<EvalAltResult>,
    },
}

impl ScriptError {
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// The underlying interpreter error, whatever the category.
    pub fn interpreter_error(&self) -> &EvalAltResult {
        match self {
            Self::Interpreter(err) => err,
            Self::Conversion { source, .. } | Self::Binding { source, .. } => source,
        }
    }
}
