use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "sbridge", about = "Run Rhai scripts and harvest their variables as JSON", version)]
#[command(group(ArgGroup::new("pretty_switch").args(["pretty", "compact"]).multiple(false)))]
pub struct Cli {
    /// Script files to run. Several files run concurrently, each in its own session.
    #[arg(value_name = "SCRIPT")]
    pub scripts: Vec<String>,

    /// Inline script text, run before evaluating `--eval`.
    #[arg(short = 'x', long = "exec", conflicts_with = "scripts")]
    pub exec: Option<String>,

    /// Evaluate an expression and print its value instead of the harvested variables.
    #[arg(long)]
    pub eval: Option<String>,

    /// Bind an input before running: NAME=JSON (plain text binds a string).
    /// Can be used multiple times: --set a=1 --set b='"x"'
    #[arg(long = "set", value_name = "NAME=VALUE", action = clap::ArgAction::Append)]
    pub set: Vec<String>,

    /// JSON object file whose entries are bound as inputs (before --set).
    #[arg(long = "bindings", value_name = "FILE")]
    pub bindings: Option<String>,

    /// Maximum number of scripts running at once (defaults to SCRIPT_POOL_SIZE).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Reject undeclared variables when compiling scripts.
    #[arg(long)]
    pub strict: bool,

    /// Allow scripts to read files with open(path).
    #[arg(long = "allow-files")]
    pub allow_files: bool,

    /// Operation budget per script, 0 for unlimited.
    #[arg(long = "max-operations", value_name = "N")]
    pub max_operations: Option<u64>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pub pretty: bool,
    /// Print JSON on a single line.
    #[arg(long)]
    pub compact: bool,

    /// Log debug details to stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
