//! Command handlers: single session runs and concurrent batches.

pub mod batch;
pub mod exec;

use serde::Serialize;

use script_bridge::{ScriptAdapter, ScriptError, Session};

/// Bind every input into the session, in order.
pub fn bind_inputs<T: Serialize>(
    adapter: &ScriptAdapter,
    session: &mut Session,
    bindings: &[(String, T)],
) -> Result<(), ScriptError> {
    for (name, value) in bindings {
        adapter.set_value_in_context(session, name, value)?;
    }
    Ok(())
}
