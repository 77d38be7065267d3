use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use cleave::{
    analyze, compile_program, decompose, file_diagnostics_have_errors, load_project_config,
    parse_program, parse_source, render, render_file_diagnostics, write_output, CleaveError,
    FileDiagnostic, Node, OutputFormat, Stage,
};
use log::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "cleave", version, about = "Split a program into serverless workers by shared state")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Log everything, including per-closure and per-group traces.
    #[arg(long, global = true)]
    debug_trace: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the parsed program as JSON.
    Parse { file: PathBuf },
    /// Report parse and module-level diagnostics.
    Check { file: PathBuf },
    /// Print the scope analysis as JSON.
    Analyze { file: PathBuf },
    /// Print the worker groups as JSON.
    Split { file: PathBuf },
    /// Render deployment configuration, or write it to a directory.
    Build(BuildArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
    file: PathBuf,
    /// Path to a cleave.toml; defaults to one beside the source or in the current directory.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Project name used in storage namespace ids.
    #[arg(long)]
    project: Option<String>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Write one directory per worker under the configured output directory.
    #[arg(long)]
    write: bool,
    /// Output directory; implies --write.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let CleaveError::Diagnostics { diagnostics, .. } = &err {
                print_diagnostics(diagnostics);
            }
            if err.stage().is_some() {
                eprintln!("{err}");
            } else {
                eprintln!("error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

fn log_level(cli: &Cli) -> LevelFilter {
    if cli.debug_trace {
        return LevelFilter::Trace;
    }
    match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Installs the process logger; `RUST_LOG` still overrides the flag-derived level.
fn init_logging(cli: &Cli) {
    env_logger::builder()
        .filter_module("cleave", log_level(cli))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(command: Command) -> Result<(), CleaveError> {
    match command {
        Command::Parse { file } => {
            let source = std::fs::read_to_string(&file)?;
            let (program, diagnostics) = parse_program(&file, &source);
            println!("{}", to_json(&program)?);
            if file_diagnostics_have_errors(&diagnostics) {
                return Err(CleaveError::Diagnostics {
                    stage: Stage::Parse,
                    diagnostics,
                });
            }
            print_diagnostics(&diagnostics);
            Ok(())
        }
        Command::Check { file } => {
            load(&file)?;
            Ok(())
        }
        Command::Analyze { file } => {
            let program = load(&file)?;
            let analysis = analyze(&program)?;
            println!("{}", to_json(&analysis)?);
            Ok(())
        }
        Command::Split { file } => {
            let program = load(&file)?;
            let groups = decompose(&analyze(&program)?);
            println!("{}", to_json(&groups)?);
            Ok(())
        }
        Command::Build(args) => cmd_build(args),
    }
}

fn cmd_build(args: BuildArgs) -> Result<(), CleaveError> {
    let mut project = load_project_config(args.config.as_deref(), &args.file)?;
    project.override_name(args.project);
    project.override_format(args.format);
    let write = args.write || args.out.is_some();
    project.override_out_dir(args.out);

    let program = load(&args.file)?;
    let compilation = compile_program(&program, &project.name)?;
    if write {
        for path in write_output(&project.build.out_dir, &compilation.config, &project.build)? {
            println!("{}", path.display());
        }
    } else {
        let rendered = render(&compilation.config, &project.build, project.build.format)?;
        print!("{rendered}");
    }
    Ok(())
}

/// Reads, parses, and checks a source file, printing any warnings.
fn load(file: &Path) -> Result<Node, CleaveError> {
    let source = std::fs::read_to_string(file)?;
    let (program, warnings) = parse_source(file, &source)?;
    print_diagnostics(&warnings);
    Ok(program)
}

fn print_diagnostics(diagnostics: &[FileDiagnostic]) {
    let rendered = render_file_diagnostics(diagnostics);
    if !rendered.is_empty() {
        eprintln!("{rendered}");
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CleaveError> {
    serde_json::to_string_pretty(value).map_err(|err| CleaveError::Io(std::io::Error::other(err)))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_flags_pick_the_log_level() {
        let level = |args: &[&str]| log_level(&Cli::parse_from(args));
        assert_eq!(level(&["cleave", "check", "a.js"]), LevelFilter::Warn);
        assert_eq!(level(&["cleave", "-v", "check", "a.js"]), LevelFilter::Info);
        assert_eq!(level(&["cleave", "check", "a.js", "-vv"]), LevelFilter::Debug);
        assert_eq!(
            level(&["cleave", "--debug-trace", "-v", "split", "a.js"]),
            LevelFilter::Trace
        );
    }
}
