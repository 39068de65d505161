//! Interpreter sessions: one Rhai engine plus its local namespace.

use rhai::{Dynamic, Engine, EvalAltResult, Position, Scope};

use crate::config::Config;

pub mod host;
pub mod pool;

pub use host::{FileHandle, RuntimeState};
pub use pool::{PooledSession, SessionPool};

/// Engine limits and switches a session is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// `0` disables the operation budget.
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
    pub strict_variables: bool,
    pub allow_files: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_operations: 1_000_000,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_string_size: 0,
            max_array_size: 0,
            max_map_size: 0,
            strict_variables: false,
            allow_files: false,
        }
    }
}

impl SessionOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let d = Self::default();
        Self {
            max_operations: cfg.get_u64("SCRIPT_MAX_OPERATIONS").unwrap_or(d.max_operations),
            max_call_levels: cfg.get_usize("SCRIPT_MAX_CALL_LEVELS").unwrap_or(d.max_call_levels),
            max_expr_depth: cfg.get_usize("SCRIPT_MAX_EXPR_DEPTH").unwrap_or(d.max_expr_depth),
            max_string_size: cfg.get_usize("SCRIPT_MAX_STRING_SIZE").unwrap_or(d.max_string_size),
            max_array_size: cfg.get_usize("SCRIPT_MAX_ARRAY_SIZE").unwrap_or(d.max_array_size),
            max_map_size: cfg.get_usize("SCRIPT_MAX_MAP_SIZE").unwrap_or(d.max_map_size),
            strict_variables: cfg.get_bool("SCRIPT_STRICT_VARIABLES"),
            allow_files: cfg.get_bool("SCRIPT_ALLOW_FILES"),
        }
    }
}

/// An embedded interpreter with a mutable local namespace.
///
/// A session is owned by exactly one caller at a time. Everything that
/// touches the namespace takes `&mut self`, so sharing one session between
/// concurrent executions does not type-check; use a [`SessionPool`] instead.
pub struct Session {
    engine: Engine,
    scope: Scope<'static>,
    options: SessionOptions,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(options.max_operations);
        engine.set_max_call_levels(options.max_call_levels);
        engine.set_max_expr_depths(options.max_expr_depth, options.max_expr_depth);
        engine.set_max_string_size(options.max_string_size);
        engine.set_max_array_size(options.max_array_size);
        engine.set_max_map_size(options.max_map_size);
        engine.set_strict_variables(options.strict_variables);
        // stdout belongs to the harvested results
        engine.on_print(|text| eprintln!("{text}"));
        engine.on_debug(|text, source, pos| {
            tracing::debug!(target: "script", source = source.unwrap_or(""), %pos, "{text}");
        });
        host::register(&mut engine, &options);

        Self { engine, scope: Scope::new(), options }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(SessionOptions::from_config(cfg))
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Register host functions or types before running scripts.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Run statements against the local namespace; top-level `let`s stay bound.
    pub fn exec(&mut self, script: &str) -> Result<(), Box<EvalAltResult>> {
        self.engine.run_with_scope(&mut self.scope, script)
    }

    /// Evaluate a single expression; statements are rejected by the parser.
    pub fn eval(&mut self, expression: &str) -> Result<Dynamic, Box<EvalAltResult>> {
        self.engine.eval_expression_with_scope::<Dynamic>(&mut self.scope, expression)
    }

    /// Innermost binding for `name`, if any.
    pub fn get(&self, name: &str) -> Option<Dynamic> {
        self.scope.get_value::<Dynamic>(name)
    }

    /// Bind `value` under `name`. Constants are shadowed rather than overwritten.
    pub fn set(&mut self, name: &str, value: Dynamic) {
        match self.scope.is_constant(name) {
            Some(false) => {
                self.scope.set_value(name, value);
            }
            _ => {
                self.scope.push_dynamic(name, value);
            }
        }
    }

    pub fn locals(&self) -> &Scope<'static> {
        &self.scope
    }

    pub fn set_locals(&mut self, scope: Scope<'static>) {
        self.scope = scope;
    }

    /// Detach the namespace, leaving an empty one behind.
    pub fn take_locals(&mut self) -> Scope<'static> {
        std::mem::take(&mut self.scope)
    }

    /// Distinct binding names, innermost-last order of first appearance.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.scope.len());
        for (name, _, _) in self.scope.iter_raw() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("bindings", &self.scope.len())
            .field("options", &self.options)
            .finish()
    }
}

pub(crate) fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(Dynamic::from(message.into()), Position::NONE))
}
