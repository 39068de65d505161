//! Input bindings given on the command line or in a JSON file.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde_json::Value;

/// Name/value pairs in the order they were given; later entries win.
pub type Bindings = Vec<(String, Value)>;

/// Parse `NAME=VALUE`. The value is read as JSON; anything that is not
/// valid JSON is bound as a plain string.
pub fn parse_binding(arg: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = arg.split_once('=') else {
        bail!("invalid binding '{}': expected NAME=VALUE", arg);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid binding '{}': empty name", arg);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Read a JSON object whose entries become bindings.
pub fn read_bindings_file(path: impl AsRef<Path>) -> Result<Bindings> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading bindings file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing bindings file: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => bail!(
            "bindings file {} must hold a JSON object, found {}",
            path.display(),
            json_type(&other)
        ),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_and_plain_text() -> Result<()> {
        assert_eq!(parse_binding("n=42")?, ("n".to_string(), json!(42)));
        assert_eq!(parse_binding("flag=true")?, ("flag".to_string(), json!(true)));
        assert_eq!(parse_binding("xs=[1, 2]")?, ("xs".to_string(), json!([1, 2])));
        assert_eq!(parse_binding("who=world")?, ("who".to_string(), json!("world")));
        assert_eq!(parse_binding("eq=a=b")?, ("eq".to_string(), json!("a=b")));
        assert_eq!(parse_binding("empty=")?, ("empty".to_string(), json!("")));
        Ok(())
    }

    #[test]
    fn rejects_malformed_bindings() {
        assert!(parse_binding("novalue").is_err());
        assert!(parse_binding("=1").is_err());
    }

    #[test]
    fn bindings_file_must_be_an_object() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let good = dir.path().join("in.json");
        fs::write(&good, r#"{"a": 1, "b": {"c": [true]}}"#)?;
        let bindings = read_bindings_file(&good)?;
        assert_eq!(bindings.len(), 2);
        assert!(bindings.contains(&("b".to_string(), json!({"c": [true]}))));

        let bad = dir.path().join("list.json");
        fs::write(&bad, "[1, 2]")?;
        let err = read_bindings_file(&bad).unwrap_err();
        assert!(err.to_string().contains("an array"));
        Ok(())
    }
}
