use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use kiwi_bridge::host::{self, HostError};
use kiwi_bridge_compiler::{decode_binary_schema, WarningPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kbridge")]
#[command(version, about = "Parse Kiwi schemas and run code generators through the native bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a `.kiwi` schema into a binary `.bkfs` schema
    Parse {
        /// Input `.kiwi` file
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.bkfs` file (defaults to the input name with a `.bkfs` extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on every parser warning, field naming included
        #[arg(long)]
        strict: bool,
    },

    /// Decode a `.bkfs` file to JSON (printed to stdout)
    Decode {
        /// Input `.bkfs` file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run the code generators, e.g. `kbridge generate --rust -o out schema.kiwi`
    Generate {
        /// Generator flags and schema files
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => {}
        Err(e) => {
            let code = match e.downcast_ref::<HostError>() {
                Some(HostError::Exit { code, .. }) => *code,
                _ => 1,
            };
            eprintln!("error: {}", e);
            std::process::exit(code);
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Parse { input, output, strict } => {
            let policy = if strict { WarningPolicy::Strict } else { WarningPolicy::IgnoreNamingConvention };
            let binary = host::parse_schema_file_with(&input, policy)?;

            let out_path = output.unwrap_or_else(|| input.with_extension("bkfs"));
            fs::write(&out_path, &binary)?;
            println!("Parsed {} → {} ({} bytes)", input.display(), out_path.display(), binary.len());
            Ok(())
        }

        Commands::Decode { input } => {
            let data = fs::read(&input)?;
            let schema = decode_binary_schema(&data)?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }

        Commands::Generate { args } => {
            host::run_generator(&args)?;
            Ok(())
        }
    }
}
