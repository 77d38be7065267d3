mod check;
mod config;
mod decompose;
mod diagnostics;
mod ir;
mod lexer;
mod render;
mod scope;
mod surface;
mod syntax;

use std::fmt;
use std::path::Path;

pub use check::check_program;
pub use config::{
    find_config, load_project_config, project_name_from_path, read_cleave_toml,
    sanitize_project_name, BuildSettings, CleaveToml, CleaveTomlProject, OutputFormat,
    ProjectConfig, CONFIG_FILE_NAME,
};
pub use decompose::{decompose, WorkerGroup};
pub use diagnostics::{
    file_diagnostics_have_errors, render_diagnostic, render_diagnostics,
    render_file_diagnostics, Diagnostic, DiagnosticLabel, DiagnosticSeverity, FileDiagnostic,
    Position, Span,
};
pub use ir::{binding_identifier, namespace_id, to_ir, Binding, Config, Resource, Worker};
pub use lexer::{lex, Token, TokenKind};
pub use render::{
    render, render_json, render_text, render_toml, render_wrangler, write_output,
    UNIT_CONFIG_FILE_NAME,
};
pub use scope::{analyze, AnalysisError, AnalysisResult, ClosureInfo, ModuleVar};
pub use surface::{
    parse_program, DeclKind, Declarator, ExportSpecifier, Literal, Node, Pattern,
    PatternProperty, Property, SpannedName,
};

/// Pipeline stage a failure is attributed to when reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Type,
    Compile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Parse => write!(f, "parse error"),
            Stage::Type => write!(f, "type error"),
            Stage::Compile => write!(f, "compile error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CleaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("compile error: {0}")]
    Analysis(#[from] AnalysisError),
    /// The diagnostics have not been printed yet; callers render them.
    #[error("{stage}: aborting due to {}", error_count(.diagnostics))]
    Diagnostics {
        stage: Stage,
        diagnostics: Vec<FileDiagnostic>,
    },
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
    #[error("compile error: {0}")]
    Render(String),
}

impl CleaveError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CleaveError::Diagnostics { stage, .. } => Some(*stage),
            CleaveError::Analysis(_) | CleaveError::Render(_) => Some(Stage::Compile),
            CleaveError::Io(_) | CleaveError::Config(_) | CleaveError::InvalidCommand(_) => None,
        }
    }
}

fn error_count(diagnostics: &[FileDiagnostic]) -> String {
    let count = diagnostics
        .iter()
        .filter(|diag| diag.diagnostic.severity == DiagnosticSeverity::Error)
        .count();
    if count == 1 {
        "1 error".to_string()
    } else {
        format!("{count} errors")
    }
}

/// Output of the core pipeline for one program.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub analysis: AnalysisResult,
    pub groups: Vec<WorkerGroup>,
    pub config: Config,
    /// Non-fatal diagnostics from the front end.
    pub warnings: Vec<FileDiagnostic>,
}

/// Parses and checks `source`, returning the program and any warnings.
///
/// Errors from the parser are reported as [`Stage::Parse`], errors from the
/// module-level checks as [`Stage::Type`].
pub fn parse_source(
    path: &Path,
    source: &str,
) -> Result<(Node, Vec<FileDiagnostic>), CleaveError> {
    let (program, mut diagnostics) = parse_program(path, source);
    if file_diagnostics_have_errors(&diagnostics) {
        return Err(CleaveError::Diagnostics {
            stage: Stage::Parse,
            diagnostics,
        });
    }
    diagnostics.extend(check_program(path, &program));
    if file_diagnostics_have_errors(&diagnostics) {
        return Err(CleaveError::Diagnostics {
            stage: Stage::Type,
            diagnostics,
        });
    }
    Ok((program, diagnostics))
}

pub fn compile_program(program: &Node, project: &str) -> Result<Compilation, CleaveError> {
    let analysis = analyze(program)?;
    let groups = decompose(&analysis);
    let config = to_ir(&groups, &analysis, project);
    log::info!(
        "compiled {} closures into {} workers",
        analysis.closures.len(),
        config.workers().count()
    );
    Ok(Compilation {
        analysis,
        groups,
        config,
        warnings: Vec::new(),
    })
}

pub fn compile_file(path: &Path, project: &ProjectConfig) -> Result<Compilation, CleaveError> {
    let source = std::fs::read_to_string(path)?;
    let (program, warnings) = parse_source(path, &source)?;
    let mut compilation = compile_program(&program, &project.name)?;
    compilation.warnings = warnings;
    Ok(compilation)
}
