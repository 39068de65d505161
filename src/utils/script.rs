//! Loading script text from disk.

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

/// Script text together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    pub label: String,
    pub text: String,
}

impl ScriptSource {
    pub fn inline(text: impl Into<String>) -> Self {
        Self { label: "<inline>".to_string(), text: text.into() }
    }

    pub fn stdin(text: impl Into<String>) -> Self {
        Self { label: "<stdin>".to_string(), text: text.into() }
    }
}

/// Read multiple script files, in order.
///
/// Fails on the first file that cannot be read; nothing is executed before
/// every source is loaded. Results are keyed by path, so a path may only
/// appear once.
pub fn read_scripts(file_paths: &[String]) -> Result<Vec<ScriptSource>> {
    for (i, path) in file_paths.iter().enumerate() {
        if file_paths[..i].contains(path) {
            bail!("Script file '{}' is given more than once", path);
        }
    }

    file_paths
        .iter()
        .map(|path| {
            Ok(ScriptSource { label: path.clone(), text: read_script(path)? })
        })
        .collect()
}

/// Read a single script file.
/// Accepts `.rhai`, `.txt` and files without extension.
pub fn read_script(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);

    if !path.exists() {
        bail!("Script file '{}' does not exist", file_path);
    }

    if !path.is_file() {
        bail!("'{}' is not a file", file_path);
    }

    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "rhai" | "txt" | "" => fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", file_path, e)),
        _ => {
            bail!("Unsupported file type: .{}\nCurrently supported: .rhai, .txt, and files without extension", extension);
        }
    }
}
