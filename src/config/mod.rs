//! Layered configuration: defaults, then `.scriptrc`, then `SCRIPT_*` environment.

use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::BaseDirs;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let config_path = env::var("SCRIPT_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        let mut cfg = Self { inner: default_map(), config_path };

        // A broken rc file should not stop the CLI from starting
        let path = cfg.config_path.clone();
        if let Err(err) = cfg.overlay_file(&path) {
            eprintln!("Warning: ignoring config file {}: {:#}", path.display(), err);
        }

        // Environment takes precedence over the file
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }

        cfg
    }

    /// Defaults overlaid with a single rc file, without consulting the environment.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut cfg = Self { inner: default_map(), config_path: path.to_path_buf() };
        cfg.overlay_file(path)?;
        Ok(cfg)
    }

    fn overlay_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let file = fs::File::open(path)
            .with_context(|| format!("opening config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        for line in reader.lines() {
            let line = line.with_context(|| format!("reading config file: {}", path.display()))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((k, v)) = line.split_once('=') {
                self.inner.insert(k.trim().to_string(), v.trim().to_string());
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    /// Command-line overrides land here after loading.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.inner.insert(key.to_string(), value.into());
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    pub fn pool_size(&self) -> usize {
        self.get_usize("SCRIPT_POOL_SIZE").filter(|n| *n > 0).unwrap_or(4)
    }

    pub fn log_filter(&self) -> String {
        self.get("SCRIPT_LOG").unwrap_or_else(|| "warn".to_string())
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "SCRIPT_MAX_OPERATIONS",
        "SCRIPT_MAX_CALL_LEVELS",
        "SCRIPT_MAX_EXPR_DEPTH",
        "SCRIPT_MAX_STRING_SIZE",
        "SCRIPT_MAX_ARRAY_SIZE",
        "SCRIPT_MAX_MAP_SIZE",
        "SCRIPT_MAX_VALUE_DEPTH",
        "SCRIPT_STRICT_VARIABLES",
        "SCRIPT_ALLOW_FILES",
        "SCRIPT_POOL_SIZE",
        "SCRIPT_PRETTY_OUTPUT",
        "SCRIPT_LOG",
    ];

    // SCRIPT_* passes for forward-compat
    KEYS.contains(&k) || k.starts_with("SCRIPT_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("script_bridge").join(".scriptrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    // Interpreter limits
    m.insert("SCRIPT_MAX_OPERATIONS".into(), "1000000".into());
    m.insert("SCRIPT_MAX_CALL_LEVELS".into(), "64".into());
    m.insert("SCRIPT_MAX_EXPR_DEPTH".into(), "64".into());
    m.insert("SCRIPT_MAX_STRING_SIZE".into(), "0".into());
    m.insert("SCRIPT_MAX_ARRAY_SIZE".into(), "0".into());
    m.insert("SCRIPT_MAX_MAP_SIZE".into(), "0".into());
    m.insert("SCRIPT_MAX_VALUE_DEPTH".into(), "64".into());
    m.insert("SCRIPT_POOL_SIZE".into(), "4".into());

    // Bools as strings
    m.insert("SCRIPT_STRICT_VARIABLES".into(), "false".into());
    m.insert("SCRIPT_ALLOW_FILES".into(), "false".into());
    m.insert("SCRIPT_PRETTY_OUTPUT".into(), "true".into());

    m.insert("SCRIPT_LOG".into(), "warn".into());

    m
}
