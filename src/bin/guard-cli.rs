use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use input_guard::config::{load_config, GuardConfig};
use input_guard::guard::{FileDescriptor, InputGuard, InputKind};

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Run input guard checks from the command line", long_about = None)]
struct Cli {
    /// TOML configuration file supplying limits and allow lists.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and sanitize a string as the given kind
    Validate {
        #[arg(short, long, default_value = "shortText")]
        kind: InputKind,
        input: String,
    },
    /// Strip an HTML fragment to the allow list
    SanitizeHtml { input: String },
    /// Scrub a JSON document read from a file, or stdin with "-"
    SanitizeJson { path: PathBuf },
    /// Check upload metadata
    CheckFile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        size: u64,
        #[arg(long)]
        mime: String,
    },
    /// Print a fresh CSRF token
    CsrfToken,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    let guard = InputGuard::new(&config);

    let ok = match cli.command {
        Commands::Validate { kind, input } => {
            let result = guard.validate(&input, kind);
            print_json(&result)?;
            result.is_valid
        }
        Commands::SanitizeHtml { input } => {
            println!("{}", guard.sanitize_markup(&input));
            true
        }
        Commands::SanitizeJson { path } => {
            let text = if path.as_os_str() == "-" {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&path)?
            };
            let value: serde_json::Value = serde_json::from_str(&text)?;
            print_json(&guard.sanitize_json(&value))?;
            true
        }
        Commands::CheckFile { name, size, mime } => {
            let file = FileDescriptor {
                size_bytes: size,
                mime_type: mime,
                file_name: name,
            };
            let check = guard.validate_file_upload(Some(&file));
            print_json(&check)?;
            check.is_valid
        }
        Commands::CsrfToken => {
            println!("{}", guard.generate_csrf_token());
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
