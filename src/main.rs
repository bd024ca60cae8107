//! sheetcalc - spreadsheet computation engine on the command line

mod config;

use anyhow::{Context, bail};
use sheetcalc_core::Document;
use sheetcalc_core::storage::write_csv_string;
use sheetcalc_engine::engine::CellRef;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("Usage: sheetcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    CSV file to import");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula against the sheet and print it ('=' optional)");
    eprintln!("  -s, --set <REF=INPUT>     Apply an edit before output (can be repeated)");
    eprintln!("  -o, --output <FILE>       Export the sheet to a CSV file");
    eprintln!("  --config <FILE>           Settings file (default: <config dir>/sheetcalc/config.toml)");
    eprintln!("  --recalc <MODE>           Recalculation mode: topological | depth-first");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    command: Option<String>,
    edits: Vec<String>,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    recalc: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a formula");
                    return ExitCode::FAILURE;
                }
                options.command = Some(args[i].to_string());
            }
            "-s" | "--set" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --set requires REF=INPUT");
                    return ExitCode::FAILURE;
                }
                options.edits.push(args[i].to_string());
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    return ExitCode::FAILURE;
                }
                options.output_file = Some(PathBuf::from(&args[i]));
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    return ExitCode::FAILURE;
                }
                options.config_file = Some(PathBuf::from(&args[i]));
            }
            "--recalc" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --recalc requires a value");
                    return ExitCode::FAILURE;
                }
                options.recalc = Some(args[i].to_string());
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                return ExitCode::FAILURE;
            }
            _ => {
                if options.file_path.is_none() {
                    options.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    return ExitCode::FAILURE;
                }
            }
        }
        i += 1;
    }

    match run(options) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(options: Options) -> anyhow::Result<ExitCode> {
    let (mut settings, warnings) = config::load_settings(options.config_file.as_ref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(name) = options.recalc.as_deref() {
        let Some(mode) = config::parse_recalc_mode(name) else {
            bail!("unknown recalculation mode: {name}");
        };
        settings.recalc = mode;
    }

    let mut doc = Document::with_settings(settings.document_settings());

    if let Some(path) = &options.file_path {
        let count = doc
            .import_csv(path)
            .with_context(|| format!("failed to import {}", path.display()))?;
        log::info!("imported {} cells from {}", count, path.display());
    }

    for edit in &options.edits {
        let Some((reference, input)) = edit.split_once('=') else {
            bail!("expected REF=INPUT, got {edit:?}");
        };
        let cell_ref = CellRef::parse(reference.trim())
            .with_context(|| format!("in --set {edit:?}"))?;
        doc.set_cell_from_input(cell_ref, input);
    }

    let mut code = ExitCode::SUCCESS;

    if let Some(command) = options.command.as_deref() {
        let formula = if command.starts_with('=') {
            command.to_string()
        } else {
            format!("={command}")
        };
        let value = doc.evaluate(&formula);
        println!("{}", value.display());
        if value.is_error() {
            code = ExitCode::FAILURE;
        }
    }

    if let Some(output_path) = &options.output_file {
        doc.export_csv(output_path)
            .with_context(|| format!("failed to export {}", output_path.display()))?;
        eprintln!("Exported to {}", output_path.display());
    } else if options.command.is_none() {
        print!("{}", write_csv_string(&doc));
    }

    Ok(code)
}
