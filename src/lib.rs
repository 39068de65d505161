//! Embedded Rhai script execution with serializable output harvesting.
//!
//! A [`Session`] owns one interpreter and its local namespace. The
//! [`ScriptAdapter`] binds host values into a session, runs scripts or
//! expressions, and converts what the script leaves behind into
//! `serde_json::Value`s.

pub mod config;
pub mod execution;
pub mod session;
pub mod utils;

pub use config::Config;
pub use execution::{Outputs, ScriptAdapter, ScriptError, ValueKind};
pub use session::{PooledSession, Session, SessionOptions, SessionPool};
