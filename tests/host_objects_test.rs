use std::fs;

use anyhow::Result;
use pretty_assertions::assert_eq;
use rhai::EvalAltResult;
use serde_json::json;

use script_bridge::{Config, ScriptAdapter, Session, SessionOptions};

fn file_session() -> Session {
    Session::new(SessionOptions { allow_files: true, ..Default::default() })
}

#[test]
fn test_file_handles_are_read_but_not_harvested() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("names.txt");
    fs::write(&path, "ada\ngrace\n")?;

    let adapter = ScriptAdapter::default();
    let mut session = file_session();
    let path = path.to_string_lossy().into_owned();
    adapter.set_value_in_context(&mut session, "path", &path)?;
    let harvested = adapter.exec(
        &mut session,
        "let f = open(path); let names = f.lines(); let size = f.read().len;",
    )?;
    assert_eq!(harvested.len(), 3);
    assert_eq!(harvested["names"], json!(["ada", "grace"]));
    assert_eq!(harvested["size"], json!(10));
    assert_eq!(harvested["path"], json!(path));
    Ok(())
}

#[test]
fn test_file_handle_is_not_an_eval_result() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.txt");
    fs::write(&path, "x")?;

    let adapter = ScriptAdapter::default();
    let mut session = file_session();
    adapter.set_value_in_context(&mut session, "path", &path.to_string_lossy())?;
    let err = adapter.eval(&mut session, "open(path)").unwrap_err();
    assert!(err.is_conversion());
    Ok(())
}

#[test]
fn test_opening_missing_file_is_a_script_error() -> Result<()> {
    let adapter = ScriptAdapter::default();
    let mut session = file_session();
    let err = adapter.exec(&mut session, "let f = open(\"/definitely/not/here\");").unwrap_err();
    assert!(!err.is_conversion());
    assert!(err.to_string().contains("not a file"));
    Ok(())
}

#[test]
fn test_file_access_is_opt_in() -> Result<()> {
    let adapter = ScriptAdapter::default();
    let mut session = Session::default();
    let err = adapter.exec(&mut session, "let f = open(\"Cargo.toml\");").unwrap_err();
    assert!(matches!(err.interpreter_error(), EvalAltResult::ErrorFunctionNotFound(..)));
    Ok(())
}

#[test]
fn test_runtime_state_reflects_options() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rc = dir.path().join(".scriptrc");
    fs::write(&rc, "SCRIPT_MAX_CALL_LEVELS=12\nSCRIPT_STRICT_VARIABLES=true\n")?;
    let cfg = Config::from_file(&rc)?;

    let adapter = ScriptAdapter::from_config(&cfg);
    let mut session = Session::from_config(&cfg);
    let harvested = adapter.exec(
        &mut session,
        "let rt = runtime(); let levels = rt.max_call_levels; let strict = rt.strict_variables;",
    )?;
    assert_eq!(harvested.len(), 2);
    assert_eq!(harvested["levels"], json!(12));
    assert_eq!(harvested["strict"], json!(true));
    Ok(())
}
