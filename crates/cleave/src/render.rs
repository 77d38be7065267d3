//! Textual forms of the resource graph: a human summary, JSON, and one wrangler-style
//! TOML document per worker.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use toml_edit::{value, Array, ArrayOfTables, DocumentMut, Item, Table};

use crate::config::{BuildSettings, OutputFormat};
use crate::ir::{Binding, Config, Resource, Worker};
use crate::CleaveError;

pub const UNIT_CONFIG_FILE_NAME: &str = "wrangler.toml";

pub fn render(
    config: &Config,
    settings: &BuildSettings,
    format: OutputFormat,
) -> Result<String, CleaveError> {
    match format {
        OutputFormat::Text => Ok(render_text(config)),
        OutputFormat::Json => render_json(config),
        OutputFormat::Toml => Ok(render_toml(config, settings)),
    }
}

pub fn render_text(config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "project {}", config.project);
    for resource in &config.resources {
        out.push('\n');
        match resource {
            Resource::Worker(worker) => render_worker_text(&mut out, worker),
            Resource::R2Bucket { name, bucket_name } => {
                let _ = writeln!(out, "r2 bucket {name} ({bucket_name})");
            }
            Resource::D1Database {
                name,
                database_name,
                database_id,
            } => {
                let _ = writeln!(out, "d1 database {name} ({database_name}, id {database_id})");
            }
            Resource::DurableObject {
                name,
                class_name,
                script_name,
            } => {
                let _ = writeln!(
                    out,
                    "durable object {name} (class {class_name} in worker {script_name})"
                );
            }
        }
    }
    out
}

fn render_worker_text(out: &mut String, worker: &Worker) {
    let _ = writeln!(out, "worker {}", worker.name);
    let _ = writeln!(out, "  functions: {}", worker.functions.join(", "));
    for binding in &worker.bindings {
        match binding {
            Binding::KvNamespace { binding, id, state } => {
                let _ = writeln!(out, "  kv {binding} -> {id} (state {state})");
            }
            Binding::Service { binding, service } => {
                let _ = writeln!(out, "  service {binding} -> {service}");
            }
        }
    }
    for route in &worker.routes {
        let _ = writeln!(out, "  route {route}");
    }
    out.push_str("  script:\n");
    for line in worker.script.lines() {
        if line.is_empty() {
            out.push_str("    |\n");
        } else {
            let _ = writeln!(out, "    | {line}");
        }
    }
}

pub fn render_json(config: &Config) -> Result<String, CleaveError> {
    serde_json::to_string_pretty(config).map_err(|err| CleaveError::Render(err.to_string()))
}

/// Deployment document for a single worker.
///
/// Durable object classes whose `script_name` is this worker are listed under
/// `[[durable_objects.bindings]]`.
pub fn render_wrangler(worker: &Worker, config: &Config, settings: &BuildSettings) -> String {
    let mut doc = DocumentMut::new();
    doc["name"] = value(worker.name.as_str());
    doc["main"] = value(settings.main.as_str());
    doc["compatibility_date"] = value(settings.compatibility_date.as_str());

    if !worker.routes.is_empty() {
        let mut routes = Array::new();
        for route in &worker.routes {
            routes.push(route.as_str());
        }
        doc["routes"] = value(routes);
    }

    let mut kv_namespaces = ArrayOfTables::new();
    for (binding, id) in worker.kv_namespaces() {
        let mut table = Table::new();
        table["binding"] = value(binding);
        table["id"] = value(id);
        kv_namespaces.push(table);
    }
    if !kv_namespaces.is_empty() {
        doc["kv_namespaces"] = Item::ArrayOfTables(kv_namespaces);
    }

    let mut services = ArrayOfTables::new();
    for (binding, service) in worker.services() {
        let mut table = Table::new();
        table["binding"] = value(binding);
        table["service"] = value(service);
        services.push(table);
    }
    if !services.is_empty() {
        doc["services"] = Item::ArrayOfTables(services);
    }

    let mut durable_bindings = ArrayOfTables::new();
    for resource in &config.resources {
        if let Resource::DurableObject {
            name,
            class_name,
            script_name,
        } = resource
        {
            if script_name == &worker.name {
                let mut table = Table::new();
                table["name"] = value(name.as_str());
                table["class_name"] = value(class_name.as_str());
                durable_bindings.push(table);
            }
        }
    }
    if !durable_bindings.is_empty() {
        let mut durable = Table::new();
        durable["bindings"] = Item::ArrayOfTables(durable_bindings);
        doc["durable_objects"] = Item::Table(durable);
    }

    doc.to_string()
}

pub fn render_toml(config: &Config, settings: &BuildSettings) -> String {
    let mut out = String::new();
    for worker in config.workers() {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "# --- {} ---", worker.name);
        out.push_str(&render_wrangler(worker, config, settings));
    }
    out
}

/// Writes `<dir>/<worker>/wrangler.toml` and the worker's handler script for every
/// worker, returning the written paths in order.
pub fn write_output(
    dir: &Path,
    config: &Config,
    settings: &BuildSettings,
) -> Result<Vec<PathBuf>, CleaveError> {
    let main = checked_relative(&settings.main)?;
    let mut written = Vec::new();
    for worker in config.workers() {
        let unit_dir = dir.join(&worker.name);
        std::fs::create_dir_all(&unit_dir)?;

        let unit_config = unit_dir.join(UNIT_CONFIG_FILE_NAME);
        std::fs::write(&unit_config, render_wrangler(worker, config, settings))?;
        written.push(unit_config);

        let script = unit_dir.join(main);
        if let Some(parent) = script.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&script, &worker.script)?;
        written.push(script);
    }
    log::info!("wrote {} files under {}", written.len(), dir.display());
    Ok(written)
}

fn checked_relative(main: &str) -> Result<&Path, CleaveError> {
    let path = Path::new(main);
    let escapes = path
        .components()
        .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
    if main.is_empty() || escapes {
        return Err(CleaveError::Config(format!(
            "build.main must be a relative path inside the unit directory, got `{main}`"
        )));
    }
    Ok(path)
}
