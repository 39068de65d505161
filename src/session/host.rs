//! Host objects exposed to scripts.
//!
//! These are interpreter machinery rather than data: harvesting skips
//! bindings that hold them, and converting one to a host value is a type
//! error.

use std::{fs, path::PathBuf};

use rhai::{Array, Dynamic, Engine, EvalAltResult, INT};

use super::{runtime_error, SessionOptions};

/// Read-only handle returned by `open(path)`.
#[derive(Debug, Clone)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Box<EvalAltResult>> {
        let path = path.into();
        if !path.is_file() {
            return Err(runtime_error(format!("cannot open '{}': not a file", path.display())));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn read(&mut self) -> Result<String, Box<EvalAltResult>> {
        fs::read_to_string(&self.path)
            .map_err(|e| runtime_error(format!("cannot read '{}': {e}", self.path.display())))
    }

    fn lines(&mut self) -> Result<Array, Box<EvalAltResult>> {
        Ok(self.read()?.lines().map(|l| Dynamic::from(l.to_string())).collect())
    }
}

/// Interpreter-global state, returned by `runtime()`.
#[derive(Debug, Clone)]
pub struct RuntimeState {
    max_operations: u64,
    max_call_levels: usize,
    strict_variables: bool,
}

impl RuntimeState {
    pub fn new(options: &SessionOptions) -> Self {
        Self {
            max_operations: options.max_operations,
            max_call_levels: options.max_call_levels,
            strict_variables: options.strict_variables,
        }
    }
}

pub(crate) fn register(engine: &mut Engine, options: &SessionOptions) {
    let state = RuntimeState::new(options);
    engine
        .register_type_with_name::<RuntimeState>("RuntimeState")
        .register_fn("runtime", move || state.clone())
        .register_get("version", |_: &mut RuntimeState| env!("CARGO_PKG_VERSION").to_string())
        .register_get("max_operations", |s: &mut RuntimeState| {
            INT::try_from(s.max_operations).unwrap_or(INT::MAX)
        })
        .register_get("max_call_levels", |s: &mut RuntimeState| {
            INT::try_from(s.max_call_levels).unwrap_or(INT::MAX)
        })
        .register_get("strict_variables", |s: &mut RuntimeState| s.strict_variables);

    if options.allow_files {
        engine
            .register_type_with_name::<FileHandle>("FileHandle")
            .register_fn("open", |path: &str| FileHandle::open(path))
            .register_fn("read", FileHandle::read)
            .register_fn("lines", FileHandle::lines)
            .register_get("path", |f: &mut FileHandle| f.path.display().to_string());
    }
}
