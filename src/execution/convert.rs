//! Interpreter value -> host value conversion and the binding exclusion rule.

use std::{any::type_name, fmt, sync::Arc};

use rhai::{Array, Blob, Dynamic, EvalAltResult, FnPtr, Map, Module, Position, Shared, FLOAT, INT};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::session::{FileHandle, RuntimeState};

/// What a `Dynamic` holds, as far as the host boundary cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    Char,
    Unit,
    Array,
    Map,
    Blob,
    Function,
    Module,
    FileHandle,
    RuntimeState,
    Other(&'static str),
}

impl ValueKind {
    pub fn of(value: &Dynamic) -> Self {
        if value.is::<bool>() {
            Self::Bool
        } else if value.is::<INT>() {
            Self::Int
        } else if value.is::<FLOAT>() {
            Self::Float
        } else if value.is_string() {
            Self::Str
        } else if value.is::<char>() {
            Self::Char
        } else if value.is_unit() {
            Self::Unit
        } else if value.is::<Array>() {
            Self::Array
        } else if value.is::<Map>() {
            Self::Map
        } else if value.is::<Blob>() {
            Self::Blob
        } else if value.is::<FnPtr>() {
            Self::Function
        } else if value.is::<Shared<Module>>() || value.is::<Module>() {
            Self::Module
        } else if value.is::<FileHandle>() {
            Self::FileHandle
        } else if value.is::<RuntimeState>() {
            Self::RuntimeState
        } else {
            Self::Other(value.type_name())
        }
    }

    /// Interpreter machinery that never counts as script output.
    pub fn is_machinery(&self) -> bool {
        matches!(self, Self::Function | Self::Module | Self::FileHandle | Self::RuntimeState)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Char => "char",
            Self::Unit => "()",
            Self::Array => "array",
            Self::Map => "map",
            Self::Blob => "blob",
            Self::Function => "function",
            Self::Module => "module",
            Self::FileHandle => "file handle",
            Self::RuntimeState => "runtime state",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// `__name__` style identifiers are reserved for the interpreter.
pub fn is_dunder(name: &str) -> bool {
    name.starts_with("__") && name.ends_with("__")
}

/// True when a local binding is not user data and must be left out of a harvest.
pub fn is_excluded(name: &str, value: &Dynamic) -> bool {
    is_dunder(name) || ValueKind::of(value).is_machinery()
}

/// Type-mismatch errors are the interpreter's "cannot convert" signal.
pub fn is_type_error(err: &EvalAltResult) -> bool {
    matches!(
        err,
        EvalAltResult::ErrorMismatchDataType(..) | EvalAltResult::ErrorMismatchOutputType(..)
    )
}

type SerializeFn = dyn Fn(&Dynamic) -> Option<serde_json::Result<Value>> + Send + Sync;

#[derive(Clone)]
struct Registered {
    name: &'static str,
    serialize: Arc<SerializeFn>,
}

/// Converts interpreter values into `serde_json::Value`.
#[derive(Clone)]
pub struct Converter {
    max_depth: usize,
    registered: Vec<Registered>,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(64)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("max_depth", &self.max_depth)
            .field("registered", &self.registered.iter().map(|r| r.name).collect::<Vec<_>>())
            .finish()
    }
}

impl Converter {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth, registered: Vec::new() }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Let custom Rust values stored in the interpreter cross the boundary via serde.
    pub fn register<T>(&mut self)
    where
        T: Clone + Serialize + Send + Sync + 'static,
    {
        let serialize = |value: &Dynamic| {
            value.read_lock::<T>().map(|v| serde_json::to_value(&*v))
        };
        self.registered.push(Registered { name: type_name::<T>(), serialize: Arc::new(serialize) });
    }

    /// Booleans first, then the generic bridge.
    ///
    /// Errors are the interpreter's own: type mismatches for values without a
    /// host mapping, stack overflow for values nested deeper than `max_depth`.
    pub fn convert(&self, value: &Dynamic) -> Result<Value, Box<EvalAltResult>> {
        if let Ok(b) = value.as_bool() {
            return Ok(Value::Bool(b));
        }
        self.bridge(value, 0)
    }

    fn bridge(&self, value: &Dynamic, depth: usize) -> Result<Value, Box<EvalAltResult>> {
        if depth > self.max_depth {
            return Err(Box::new(EvalAltResult::ErrorStackOverflow(Position::NONE)));
        }
        let value = value.flatten_clone();
        let kind = ValueKind::of(&value);
        match kind {
            ValueKind::Bool => value.as_bool().map(Value::Bool).map_err(|t| mismatch("bool", t)),
            ValueKind::Int => value.as_int().map(Value::from).map_err(|t| mismatch("int", t)),
            ValueKind::Float => {
                let f = value.as_float().map_err(|t| mismatch("float", t))?;
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| mismatch("finite number", &f.to_string()))
            }
            ValueKind::Str => value.into_string().map(Value::String).map_err(|t| mismatch("string", t)),
            ValueKind::Char => {
                value.as_char().map(|c| Value::String(c.to_string())).map_err(|t| mismatch("char", t))
            }
            ValueKind::Unit => Ok(Value::Null),
            ValueKind::Array => {
                let items = value.into_array().map_err(|t| mismatch("array", t))?;
                items
                    .iter()
                    .map(|item| self.bridge(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            ValueKind::Map => {
                let map = value.try_cast::<Map>().ok_or_else(|| mismatch("map", "?"))?;
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, item) in &map {
                    out.insert(key.to_string(), self.bridge(item, depth + 1)?);
                }
                Ok(Value::Object(out))
            }
            ValueKind::Blob => {
                let bytes = value.into_blob().map_err(|t| mismatch("blob", t))?;
                Ok(Value::Array(bytes.into_iter().map(Value::from).collect()))
            }
            ValueKind::Function | ValueKind::Module | ValueKind::FileHandle | ValueKind::RuntimeState => {
                Err(mismatch("serializable value", &kind.to_string()))
            }
            ValueKind::Other(name) => self.bridge_other(&value, name),
        }
    }

    fn bridge_other(&self, value: &Dynamic, name: &str) -> Result<Value, Box<EvalAltResult>> {
        for registered in &self.registered {
            if let Some(result) = (registered.serialize)(value) {
                return result.map_err(|e| {
                    mismatch("serializable value", &format!("{} ({e})", registered.name))
                });
            }
        }
        tracing::trace!(type_name = name, "falling back to generic serde bridge");
        rhai::serde::from_dynamic::<Value>(value)
    }
}

fn mismatch(expected: &str, actual: &str) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorMismatchDataType(
        expected.to_string(),
        actual.to_string(),
        Position::NONE,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[derive(Debug, Clone)]
    struct Opaque;

    fn nested(levels: usize) -> Dynamic {
        let mut value = Dynamic::from(1 as INT);
        for _ in 0..levels {
            value = Dynamic::from_array(vec![value]);
        }
        value
    }

    #[test]
    fn dunder_names() {
        assert!(is_dunder("__name__"));
        assert!(is_dunder("____"));
        assert!(is_dunder("___"));
        assert!(is_dunder("__"));
        assert!(!is_dunder("_"));
        assert!(!is_dunder("__private"));
        assert!(!is_dunder("trailing__"));
        assert!(!is_dunder("plain"));
    }

    #[test]
    fn classifies_machinery() {
        let fp = FnPtr::new("double").expect("valid function name");
        assert_eq!(ValueKind::of(&Dynamic::from(fp)), ValueKind::Function);
        let module = Dynamic::from(Shared::new(Module::new()));
        assert_eq!(ValueKind::of(&module), ValueKind::Module);
        assert!(ValueKind::Module.is_machinery());
        assert!(!ValueKind::Map.is_machinery());
        assert!(!ValueKind::of(&Dynamic::from(Opaque)).is_machinery());
    }

    #[test]
    fn booleans_stay_booleans() -> Result<(), Box<EvalAltResult>> {
        let converter = Converter::default();
        assert_eq!(converter.convert(&Dynamic::from(true))?, json!(true));
        assert_eq!(converter.convert(&Dynamic::from(false))?, json!(false));
        assert_eq!(
            converter.convert(&Dynamic::from_array(vec![Dynamic::from(true), Dynamic::from(0 as INT)]))?,
            json!([true, 0])
        );
        Ok(())
    }

    #[test]
    fn converts_compound_values() -> Result<(), Box<EvalAltResult>> {
        let converter = Converter::default();
        let mut map = Map::new();
        map.insert("name".into(), Dynamic::from("rhai".to_string()));
        map.insert("ratio".into(), Dynamic::from(0.5 as FLOAT));
        map.insert("initial".into(), Dynamic::from('r'));
        map.insert("nothing".into(), Dynamic::UNIT);
        map.insert("bytes".into(), Dynamic::from_blob(vec![1, 2, 255]));
        let value = converter.convert(&Dynamic::from_map(map))?;
        assert_eq!(
            value,
            json!({"name": "rhai", "ratio": 0.5, "initial": "r", "nothing": null, "bytes": [1, 2, 255]})
        );
        Ok(())
    }

    #[test]
    fn non_finite_floats_are_type_errors() {
        let converter = Converter::default();
        let err = converter.convert(&Dynamic::from(FLOAT::NAN)).unwrap_err();
        assert!(is_type_error(&err));
    }

    #[test]
    fn nested_function_is_type_error() {
        let converter = Converter::default();
        let fp = FnPtr::new("double").expect("valid function name");
        let err = converter
            .convert(&Dynamic::from_array(vec![Dynamic::from(1 as INT), Dynamic::from(fp)]))
            .unwrap_err();
        assert!(is_type_error(&err));
    }

    #[test]
    fn unregistered_custom_type_is_type_error() {
        let err = Converter::default().convert(&Dynamic::from(Opaque)).unwrap_err();
        assert!(is_type_error(&err), "unexpected error: {err}");
    }

    #[test]
    fn registered_custom_type_serializes() -> Result<(), Box<EvalAltResult>> {
        let mut converter = Converter::default();
        converter.register::<Point>();
        let value = converter.convert(&Dynamic::from(Point { x: 3, y: -4 }))?;
        assert_eq!(value, json!({"x": 3, "y": -4}));
        Ok(())
    }

    #[test]
    fn depth_overflow_is_not_a_type_error() {
        let converter = Converter::new(4);
        assert!(converter.convert(&nested(4)).is_ok());
        let err = converter.convert(&nested(5)).unwrap_err();
        assert!(!is_type_error(&err));
        assert!(matches!(*err, EvalAltResult::ErrorStackOverflow(..)));
    }
}
