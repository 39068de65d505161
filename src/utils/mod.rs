//! Utilities (script sources, input bindings).

pub mod bindings;
pub mod script;

pub use bindings::{parse_binding, read_bindings_file, Bindings};
pub use script::{read_script, read_scripts, ScriptSource};
