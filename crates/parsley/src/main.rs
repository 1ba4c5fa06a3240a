use parsley::{
    check_target, format_program, load_config, parse_file, parse_target, render_diagnostics,
    tokenize_file, ParsleyConfig, ParsleyError,
};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(ParsleyError::Diagnostics) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ParsleyError> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let (rest, config_path) = split_config_flag(args.collect())?;

    match command.as_str() {
        "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "parse" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let config = config_for(config_path.as_deref())?;
            let bundle = parse_target(target, &config.parse_options())?;
            print_json(&bundle)?;
            let mut had_errors = false;
            for file in &bundle.files {
                report(&file.path, file.diagnostics());
                had_errors |= file.program.has_errors();
            }
            if had_errors {
                return Err(ParsleyError::Diagnostics);
            }
            Ok(())
        }
        "tokens" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let config = config_for(config_path.as_deref())?;
            let file = tokenize_file(Path::new(target), &config.parse_options())?;
            print_json(&file)?;
            report(&file.path, &file.diagnostics);
            if parsley::diagnostics::has_errors(&file.diagnostics) {
                return Err(ParsleyError::Diagnostics);
            }
            Ok(())
        }
        "fmt" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let config = config_for(config_path.as_deref())?;
            let file = parse_file(Path::new(target), &config.parse_options())?;
            report(&file.path, file.diagnostics());
            if file.program.has_errors() {
                return Err(ParsleyError::Diagnostics);
            }
            print!("{}", format_program(&file.program, &config.format_options()));
            Ok(())
        }
        "check" => {
            let Some(target) = rest.first() else {
                print_help();
                return Ok(());
            };
            let config = config_for(config_path.as_deref())?;
            let diagnostics = check_target(target, &config.parse_options())?;
            let mut had_errors = false;
            for diag in diagnostics {
                report(&diag.path, std::slice::from_ref(&diag.diagnostic));
                had_errors |= diag.diagnostic.is_error();
            }
            if had_errors {
                return Err(ParsleyError::Diagnostics);
            }
            Ok(())
        }
        other => Err(ParsleyError::InvalidCommand(other.to_string())),
    }
}

fn print_help() {
    println!(
        "parsley\n\nUSAGE:\n  parsley <COMMAND> [--config <parsley.toml>]\n\nCOMMANDS:\n  parse <path|dir|dir/...>\n  tokens <path>\n  fmt <path>\n  check <path|dir|dir/...>\n\n  -h, --help"
    );
}

/// Removes `--config <path>` from the argument list.
fn split_config_flag(args: Vec<String>) -> Result<(Vec<String>, Option<PathBuf>), ParsleyError> {
    let mut rest = Vec::new();
    let mut config = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let Some(path) = iter.next() else {
                return Err(ParsleyError::InvalidCommand(
                    "--config requires a path".to_string(),
                ));
            };
            config = Some(PathBuf::from(path));
        } else if let Some(path) = arg.strip_prefix("--config=") {
            config = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }
    Ok((rest, config))
}

fn config_for(explicit: Option<&Path>) -> Result<ParsleyConfig, ParsleyError> {
    let cwd = env::current_dir()?;
    load_config(explicit, &cwd)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ParsleyError> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|err| ParsleyError::Io(std::io::Error::other(err)))?;
    println!("{output}");
    Ok(())
}

fn report(path: &str, diagnostics: &[parsley::Diagnostic]) {
    let rendered = render_diagnostics(path, diagnostics);
    if !rendered.is_empty() {
        eprintln!("{rendered}");
    }
}
