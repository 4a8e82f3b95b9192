//! csv-tokens CLI - Convert CSV tables to Figma design-token collections
//!
//! # Commands
//!
//! ```bash
//! csv-tokens headers themes.csv                          # Show encoding, delimiter, columns
//! csv-tokens process themes.csv --mode-key Theme         # Print result JSON to stdout
//! csv-tokens process themes.csv -m Theme --out-dir out   # Write manifest + token files
//! csv-tokens process themes.csv -m Theme --zip out.zip   # Write the zip bundle
//! cat themes.csv | csv-tokens process - -m Theme         # Read pasted CSV from stdin
//! csv-tokens serve                                       # Start HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use csv_tokens::archive::{write_bundle, write_files};
use csv_tokens::config::Config;
use csv_tokens::parser::ParseOptions;
use csv_tokens::transform::{
    analyze_bytes, format_delimiter, process_bytes, process_file, ProcessOptions, ProcessOutput,
    TransformOptions,
};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csv-tokens")]
#[command(about = "Convert CSV tables to Figma design-token collections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect encoding and delimiter, list the columns
    Headers {
        /// Input CSV file (`-` for stdin)
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Keep every cell as text
        #[arg(long)]
        no_dynamic_typing: bool,
    },

    /// Generate the manifest and one token file per mode
    Process {
        /// Input CSV file (`-` for stdin)
        input: PathBuf,

        /// Mode column (comma-separated list accepted; only the first is used)
        #[arg(short, long)]
        mode_key: String,

        /// Collection name (default: the mode column name)
        #[arg(short, long)]
        collection: Option<String>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Write manifest and token files into this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Write every file into a zip archive
        #[arg(short, long)]
        zip: Option<PathBuf>,

        /// Replace path separators and control characters in file names
        #[arg(long)]
        sanitize: bool,

        /// Keep every cell as text
        #[arg(long)]
        no_dynamic_typing: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: CSV_TOKENS_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Headers {
            input,
            delimiter,
            no_dynamic_typing,
        } => cmd_headers(&input, parse_options(&config, delimiter, no_dynamic_typing)),

        Commands::Process {
            input,
            mode_key,
            collection,
            delimiter,
            out_dir,
            zip,
            sanitize,
            no_dynamic_typing,
        } => {
            let mut transform = TransformOptions::default()
                .with_mode_keys_str(&mode_key)
                .sanitized(sanitize || out_dir.is_some());
            if let Some(name) = collection {
                transform = transform.with_collection_name(name);
            }
            let options = ProcessOptions {
                parse: parse_options(&config, delimiter, no_dynamic_typing),
                transform,
            };
            cmd_process(&input, &options, out_dir.as_deref(), zip.as_deref())
        }

        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_options(config: &Config, delimiter: Option<char>, no_dynamic_typing: bool) -> ParseOptions {
    ParseOptions {
        delimiter,
        dynamic_typing: config.dynamic_typing && !no_dynamic_typing,
        ..ParseOptions::default()
    }
}

fn read_input(input: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if input.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        Ok(bytes)
    } else {
        Ok(fs::read(input)?)
    }
}

fn cmd_headers(input: &Path, options: ParseOptions) -> Result<(), Box<dyn std::error::Error>> {
    let info = analyze_bytes(&read_input(input)?, &options)?;

    println!("Encoding:  {}", info.encoding);
    println!("Delimiter: {}", format_delimiter(info.delimiter));
    println!("Rows:      {}", info.row_count);
    println!("Columns:");
    for header in &info.headers {
        println!("  {}", header);
    }

    Ok(())
}

fn cmd_process(
    input: &Path,
    options: &ProcessOptions,
    out_dir: Option<&Path>,
    zip: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ProcessOutput { result, .. } = if input.as_os_str() == "-" {
        process_bytes(&read_input(input)?, options)?
    } else {
        eprintln!("📄 Processing: {}", input.display());
        process_file(input, options)?
    };

    if let Some(dir) = out_dir {
        let written = write_files(&result, dir)?;
        eprintln!("💾 Wrote {} files to {}", written.len(), dir.display());
    }

    if let Some(path) = zip {
        write_bundle(&result, path)?;
        eprintln!("📦 Bundle saved to: {}", path.display());
    }

    if out_dir.is_none() && zip.is_none() {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

async fn cmd_serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    csv_tokens::server::start_server(config).await
}
