use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rill::error::Reporter;
use rill::interpreter::Interpreter;
use rill::parser::Parser;
use rill::resolver::Resolver;
use rill::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rill language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable logging to rill.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a script, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Runs a script through the full pipeline
    Run { filename: PathBuf },
}

/// Memory-map the script.  Empty files cannot be mapped, so they come back
/// as `None` and scan as an empty buffer.
fn map_source(filename: &Path) -> Result<Option<Mmap>> {
    info!("Mapping file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        return Ok(None);
    }

    // SAFETY: the script file is not expected to change underneath us.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", map.len(), filename);

    Ok(Some(map))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rill.log").context("Failed to create rill.log")?;

    // Write to file with module path and source line per record
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rill::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to rill.log");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.command {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");

            let source = map_source(&filename)?;
            let bytes: &[u8] = source.as_deref().unwrap_or(&[]);

            let mut reporter = Reporter::new();
            let tokens = Scanner::new(bytes).scan_tokens(&mut reporter);

            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for token in &tokens {
                    println!("{}", token);
                }
            }

            if reporter.had_errors() {
                for error in reporter.errors() {
                    eprintln!("{}", error);
                }

                debug!("Tokenization failed, exiting with code 65");

                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");

            let source = map_source(&filename)?;
            let bytes: &[u8] = source.as_deref().unwrap_or(&[]);

            let mut reporter = Reporter::new();

            let tokens = Scanner::new(bytes).scan_tokens(&mut reporter);
            let statements = Parser::new(&tokens).parse(&mut reporter);
            let locals = Resolver::new(&mut reporter).resolve(&statements);

            // Static diagnostics suppress execution entirely.
            if reporter.had_errors() {
                for error in reporter.errors() {
                    eprintln!("{}", error);
                }

                debug!("Static errors recorded, exiting with code 65");

                std::process::exit(65);
            }

            let mut interpreter = Interpreter::new(locals);

            if let Err(e) = interpreter.interpret(&statements) {
                eprintln!("{}", e);

                debug!("Runtime failure: {}", e);

                std::process::exit(70);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
