//! Template Processor CLI
//!
//! Usage:
//!   template-processor [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>       Processor configuration (TOML format)
//!   -p, --param <NAME=VALUE>  Parameter value, may be repeated
//!   -l, --label <KEY=VALUE>   Extra label for every object, may be repeated
//!       --seed <N>            Seed for generated values
//!   -o, --output <FORMAT>     Output format: json or yaml
//!   -v, --verbose             Log resolution steps to stderr
//!   -h, --help                Print help

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use template_processor::codec::{to_json_string, to_yaml_string};
use template_processor::{ProcessError, Processor, ProcessorConfig, TemplateError};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Parser)]
#[command(name = "template-processor")]
#[command(about = "Resolve parameterized templates into configs")]
struct Cli {
    /// Template document, JSON or YAML (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Processor configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parameter value as NAME=VALUE
    #[arg(short, long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,

    /// Label added to every object as KEY=VALUE
    #[arg(short, long = "label", value_parser = parse_key_val)]
    labels: Vec<(String, String)>,

    /// Seed for generated values
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Log resolution steps to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => match ProcessorConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => ProcessorConfig::default(),
    };

    // Command line values win over the config file
    for (name, value) in cli.params {
        config = config.with_parameter(name, value);
    }
    for (key, value) in cli.labels {
        config = config.with_label(key, value);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    // Read input
    let (source, source_name) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let processor = Processor::new(config);
    let result = processor.process_document(&source).and_then(|config| {
        match cli.output {
            OutputFormat::Json => to_json_string(&config),
            OutputFormat::Yaml => to_yaml_string(&config),
        }
        .map_err(ProcessError::from)
    });

    match result {
        Ok(output) => {
            println!("{}", output);
        }
        Err(ProcessError::Template(TemplateError::InvalidGeneratorExpression {
            parameter,
            source,
        })) => {
            eprintln!("Error in '{}': parameter {}", source_name, parameter);
            eprint!("{}", source.format(&parameter));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error in '{}': {}", source_name, e);
            std::process::exit(1);
        }
    }
}
