mod cli;
mod handlers;
mod printer;

use std::{
    io::{self, Read},
    sync::Arc,
};

use anyhow::{bail, Result};
use is_terminal::IsTerminal;
use script_bridge::{
    utils::{parse_binding, read_bindings_file, read_scripts, ScriptSource},
    Config, ScriptAdapter, Session, SessionOptions, SessionPool,
};

use crate::printer::JsonPrinter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // Load config, then apply command-line overrides
    let mut cfg = Config::load();
    if args.strict {
        cfg.set("SCRIPT_STRICT_VARIABLES", "true");
    }
    if args.allow_files {
        cfg.set("SCRIPT_ALLOW_FILES", "true");
    }
    if let Some(n) = args.max_operations {
        cfg.set("SCRIPT_MAX_OPERATIONS", n.to_string());
    }
    init_tracing(args.verbose, &cfg);

    let pretty = if args.compact {
        false
    } else if args.pretty {
        true
    } else {
        cfg.get_bool("SCRIPT_PRETTY_OUTPUT")
    };
    let printer = JsonPrinter { pretty };

    // Inputs: bindings file first, then --set in order
    let mut bindings = match args.bindings.as_deref() {
        Some(path) => read_bindings_file(path)?,
        None => Vec::new(),
    };
    for arg in &args.set {
        bindings.push(parse_binding(arg)?);
    }

    // Sources: --exec, script files, or piped stdin
    let mut sources = match args.exec.as_deref() {
        Some(text) => vec![ScriptSource::inline(text)],
        None => read_scripts(&args.scripts)?,
    };
    if sources.is_empty() && args.eval.is_none() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            bail!("Provide a script file, --exec TEXT, --eval EXPR, or pipe a script via stdin");
        }
        let mut buf = String::new();
        stdin.lock().read_to_string(&mut buf)?;
        sources.push(ScriptSource::stdin(buf));
    }

    let adapter = ScriptAdapter::from_config(&cfg);
    let options = SessionOptions::from_config(&cfg);

    if sources.len() > 1 {
        if args.eval.is_some() {
            bail!("--eval cannot be combined with several script files");
        }
        let jobs = args.jobs.unwrap_or_else(|| cfg.pool_size());
        let pool = SessionPool::new(options, jobs);
        let runs = handlers::batch::run(adapter, pool, sources, Arc::new(bindings), jobs).await?;
        return handlers::batch::report(&runs, &printer);
    }

    let mut session = Session::new(options);
    let value = handlers::exec::run(
        &adapter,
        &mut session,
        sources.first(),
        bindings.as_slice(),
        args.eval.as_deref(),
    )?;
    printer.print(&value)?;
    Ok(())
}

/// Logs go to stderr so stdout only carries results.
fn init_tracing(verbose: bool, cfg: &Config) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let directive = if verbose { "debug".to_string() } else { cfg.log_filter() };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(filter)
        .init();
}
