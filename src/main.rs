//! Component Directive CLI
//!
//! Usage:
//!   component-directive [OPTIONS] [FILE]
//!
//! Options:
//!   -r, --root <DIR>         Component search root (repeatable)
//!   -n, --namespace <NAME>   Loader namespace for components
//!   -c, --config <FILE>      Compiler configuration (TOML format)
//!   -s, --scope <FILE>       Calling scope (YAML or JSON) to evaluate variables against
//!   -l, --list               List registered components and exit
//!   -v, --verbose            More logging (repeatable)
//!   -h, --help               Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use component_directive::{CompilerConfig, Extension, IncludeCall};

#[derive(Parser)]
#[command(name = "component-directive")]
#[command(about = "Resolve render directives in a template to include calls")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Component search root, added after any roots from --config
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,

    /// Loader namespace for components
    #[arg(short, long)]
    namespace: Option<String>,

    /// Compiler configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Calling scope (YAML or JSON) to evaluate composed variables against
    #[arg(short, long)]
    scope: Option<PathBuf>,

    /// List registered components and exit
    #[arg(short, long)]
    list: bool,

    /// More logging: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// One line of output: the include call and, with --scope, its variables
#[derive(Serialize)]
struct Resolved<'a> {
    #[serde(flatten)]
    call: &'a IncludeCall,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluated: Option<Value>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => match CompilerConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => fail(&format!("Error loading config '{}': {}", path.display(), e)),
        },
        None => CompilerConfig::default(),
    };
    if let Some(namespace) = &cli.namespace {
        config = config.with_namespace(namespace.clone());
    }
    for root in &cli.roots {
        config = config.with_root(root.clone());
    }
    debug!(?config, "Loaded compiler configuration");

    let extension = Extension::from_config(&config);

    if cli.list {
        match extension.registry().names() {
            Ok(names) => {
                for name in names {
                    println!("{}", name);
                }
            }
            Err(e) => fail(&format!("Error: {}", e)),
        }
        return;
    }

    let scope = match &cli.scope {
        Some(path) => match read_scope(path) {
            Ok(scope) => Some(scope),
            Err(message) => fail(&format!("Error loading scope '{}': {}", path.display(), message)),
        },
        None => None,
    };

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => fail(&format!("Error reading file '{}': {}", path.display(), e)),
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => fail(&format!("Error reading from stdin: {}", e)),
            }
        }
    };

    let calls = match extension.compile_template(&source) {
        Ok(calls) => calls,
        Err(e) => fail(&e.format(&source, &filename)),
    };

    let mut output = Vec::with_capacity(calls.len());
    for call in &calls {
        let evaluated = match &scope {
            Some(scope) => match call.evaluate(scope) {
                Ok(value) => Some(value),
                Err(e) => fail(&format!("Error evaluating {}: {}", call.template_id, e)),
            },
            None => None,
        };
        output.push(Resolved { call, evaluated });
    }

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("Error: {}", e)),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

/// Read a calling scope; `.json` files as JSON, anything else as YAML
fn read_scope(path: &Path) -> Result<Map<String, Value>, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: Value = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content).map_err(|e| e.to_string())?
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())?
    };
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err("scope must be a map".to_string()),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}
