//! Single-session handler: bind inputs, run one script, optionally evaluate.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use script_bridge::{utils::ScriptSource, ScriptAdapter, Session};

use super::bind_inputs;

/// Returns the evaluated expression when one is given, the harvested
/// variables of the script otherwise.
pub fn run<T: Serialize>(
    adapter: &ScriptAdapter,
    session: &mut Session,
    source: Option<&ScriptSource>,
    bindings: &[(String, T)],
    expression: Option<&str>,
) -> Result<Value> {
    bind_inputs(adapter, session, bindings).context("binding inputs")?;

    let mut outputs = None;
    if let Some(source) = source {
        let harvested = adapter
            .exec(session, &source.text)
            .with_context(|| format!("running {}", source.label))?;
        outputs = Some(harvested);
    }

    if let Some(expression) = expression {
        return adapter
            .eval(session, expression)
            .with_context(|| format!("evaluating '{}'", expression));
    }

    let outputs = outputs.unwrap_or_default();
    Ok(Value::Object(outputs.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use script_bridge::ScriptError;
    use serde_json::json;

    use super::*;

    fn inputs(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn evaluates_after_the_script() -> Result<()> {
        let adapter = ScriptAdapter::default();
        let mut session = Session::default();
        let source = ScriptSource::inline("let y = x + 1;");
        let bindings = inputs(&[("x", json!(2))]);
        let value = run(&adapter, &mut session, Some(&source), &bindings, Some("y * 2"))?;
        assert_eq!(value, json!(6));
        Ok(())
    }

    #[test]
    fn harvests_when_no_expression_is_given() -> Result<()> {
        let adapter = ScriptAdapter::default();
        let mut session = Session::default();
        let source = ScriptSource::inline("let y = x + 1;");
        let bindings = inputs(&[("x", json!(2))]);
        let value = run(&adapter, &mut session, Some(&source), &bindings, None)?;
        assert_eq!(value, json!({"x": 2, "y": 3}));
        Ok(())
    }

    #[test]
    fn evaluates_without_a_script() -> Result<()> {
        let adapter = ScriptAdapter::default();
        let mut session = Session::default();
        let bindings = inputs(&[("name", json!("rhai"))]);
        let value = run(&adapter, &mut session, None, &bindings, Some("name.len()"))?;
        assert_eq!(value, json!(4));

        let empty = run(&adapter, &mut session, None, &inputs(&[]), None)?;
        assert_eq!(empty, json!({}));
        Ok(())
    }

    #[test]
    fn binding_failures_carry_context() {
        let adapter = ScriptAdapter::default();
        let mut session = Session::default();
        let source = ScriptSource::inline("let never = 1;");
        let bindings = vec![("scores".to_string(), HashMap::from([(1_i64, 2_i64)]))];
        let err = run(&adapter, &mut session, Some(&source), &bindings, None).unwrap_err();
        assert_eq!(err.to_string(), "binding inputs");
        assert!(matches!(
            err.downcast_ref::<ScriptError>(),
            Some(ScriptError::Binding { name, .. }) if name == "scores"
        ));
        assert!(session.get("never").is_none());
    }
}
