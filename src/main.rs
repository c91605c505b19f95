use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use treelox::ast_printer::AstPrinter;
use treelox::diag::Diagnostics;
use treelox::interpreter::Interpreter;
use treelox::parser::Parser;
use treelox::scanner::{self, Scanner};

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small scripting language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Emit the token stream as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its AST
    Parse { filename: PathBuf },

    /// Runs input from a file as a program
    Run { filename: PathBuf },
}

/// Memory-map the source file read-only.
fn map_file(filename: &PathBuf) -> Result<Mmap> {
    info!("Mapping file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    // SAFETY: the mapping is read-only and lives for the whole run; we accept
    // the usual mmap caveat that the file must not be truncated concurrently.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", mmap.len(), filename);

    Ok(mmap)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module path and source line
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
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

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print collected diagnostics to stderr.
fn report_all(diag: &Diagnostics) {
    for err in diag.iter() {
        eprintln!("{}", err);
    }
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

    match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");

            let mmap = map_file(&filename)?;
            let mut tokenized = true;

            if json {
                let mut tokens = Vec::new();

                for token in Scanner::new(&mmap) {
                    match token {
                        Ok(token) => tokens.push(token),
                        Err(e) => {
                            tokenized = false;
                            eprintln!("{}", e);
                        }
                    }
                }

                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for token in Scanner::new(&mmap) {
                    match token {
                        Ok(token) => {
                            debug!("Scanned token: {}", token);
                            println!("{}", token);
                        }

                        Err(e) => {
                            tokenized = false;
                            eprintln!("{}", e);
                        }
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");

            let mmap = map_file(&filename)?;
            let mut diag = Diagnostics::new();

            let tokens = scanner::scan(&mmap, &mut diag);
            let statements = Parser::new(&tokens, &mut diag).parse();

            if diag.had_error() {
                report_all(&diag);
                std::process::exit(65);
            }

            println!("{}", AstPrinter::print_program(&statements));

            info!("Parse subcommand completed");
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");

            let mmap = map_file(&filename)?;
            let mut diag = Diagnostics::new();
            let mut interpreter = Interpreter::new();

            let result = treelox::run(&mmap, &mut interpreter, &mut diag);

            if diag.had_error() {
                report_all(&diag);
                std::process::exit(65);
            }

            if let Err(e) = result {
                debug!("Runtime debug: {}", e);
                eprintln!("{}", e);
                std::process::exit(70);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
