use rhai::{Dynamic, Scope};
use serde::Serialize;
use serde_json::Value;

use super::{convert, Converter, Outputs, ScriptError};
use crate::{config::Config, session::Session};

/// Moves values across the host/interpreter boundary for one session at a time.
///
/// The adapter keeps no per-call state. Every operation takes the session
/// explicitly, and the caller decides when a session is reset with
/// [`ScriptAdapter::clean_interpreter`]; nothing here resets it implicitly.
#[derive(Debug, Clone, Default)]
pub struct ScriptAdapter {
    converter: Converter,
}

impl ScriptAdapter {
    pub fn new(converter: Converter) -> Self {
        Self { converter }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let depth = cfg.get_usize("SCRIPT_MAX_VALUE_DEPTH").unwrap_or(64);
        Self::new(Converter::new(depth))
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// See [`Converter::register`].
    pub fn register_serializable<T>(&mut self) -> &mut Self
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        self.converter.register::<T>();
        self
    }

    /// Drop every local binding of the session.
    pub fn clean_interpreter(&self, session: &mut Session) {
        session.set_locals(Scope::new());
    }

    pub fn set_value_in_context<T>(
        &self,
        session: &mut Session,
        name: &str,
        value: &T,
    ) -> Result<(), ScriptError>
    where
        T: Serialize + ?Sized,
    {
        let value = rhai::serde::to_dynamic(value)
            .map_err(|source| ScriptError::Binding { name: name.to_string(), source })?;
        session.set(name, value);
        Ok(())
    }

    /// Bind an interpreter-native value as is.
    pub fn set_dynamic_in_context(&self, session: &mut Session, name: &str, value: Dynamic) {
        session.set(name, value);
    }

    /// Unit when nothing is bound under `name`.
    pub fn get_value_from_context(&self, session: &Session, name: &str) -> Dynamic {
        session.get(name).unwrap_or(Dynamic::UNIT)
    }

    /// Run `script`, then harvest every user binding of the local namespace.
    ///
    /// Fails as a whole if any retained binding cannot be converted.
    pub fn exec(&self, session: &mut Session, script: &str) -> Result<Outputs, ScriptError> {
        session.exec(script)?;

        let names = session.local_names();
        let mut outputs = Outputs::new();
        for name in names {
            let value = self.get_value_from_context(session, &name);
            if convert::is_excluded(&name, &value) {
                tracing::trace!(name = %name, kind = %convert::ValueKind::of(&value), "skipping binding");
                continue;
            }
            let converted = self.resolve(&value, || exec_error_message(&name, &value))?;
            outputs.insert(name, converted);
        }

        tracing::debug!(outputs = outputs.len(), "script executed");
        Ok(outputs)
    }

    /// Evaluate one expression and convert its value.
    pub fn eval(&self, session: &mut Session, expression: &str) -> Result<Value, ScriptError> {
        let value = session.eval(expression)?;
        let converted = self.resolve(&value, || eval_error_message(expression, &value))?;
        tracing::debug!(expression, "expression evaluated");
        Ok(converted)
    }

    fn resolve(
        &self,
        value: &Dynamic,
        message: impl FnOnce() -> String,
    ) -> Result<Value, ScriptError> {
        self.converter.convert(value).map_err(|source| {
            if convert::is_type_error(&source) {
                let message = message();
                tracing::warn!("{message}");
                ScriptError::Conversion { message, source }
            } else {
                ScriptError::Interpreter(source)
            }
        })
    }
}

fn exec_error_message(name: &str, value: &Dynamic) -> String {
    format!(
        "Non-serializable values are not allowed in the output context of a script:\n\
         \tConversion failed for '{name}' ({value}),\n\
         \tThe error can be solved by removing the variable from the context in the script: \
         e.g. declare it inside a block, '{{ let {name} = ...; }}', so it is dropped before the script ends.\n"
    )
}

fn eval_error_message(expression: &str, value: &Dynamic) -> String {
    format!(
        "Evaluation result for a script expression should be serializable:\n\
         \tConversion failed for '{expression}' ({value}).\n"
    )
}
