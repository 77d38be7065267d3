use std::path::Path;

use cleave::{
    compile_file, load_project_config, parse_source, render, render_toml, write_output,
    CleaveError, DiagnosticSeverity, OutputFormat, ProjectConfig, Stage, CONFIG_FILE_NAME,
};

const SHOP: &str = r#"
// Shopping cart with a shared store.
const store = new Map();
const carts = new Map();

const put = (k, v) => store.set(k, v);
const get = (k) => store.get(k);
const addItem = (user, item) => {
  const cart = carts.get(user) ?? [];
  carts.set(user, cart.concat([item]));
};
const checkout = async (user) => {
  const items = carts.get(user);
  store.set(user, items);
  return items;
};
const status = () => "ok";

export { get, checkout, status };
"#;

fn write_source(dir: &Path, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, source).expect("write source");
    path
}

#[test]
fn compile_file_runs_the_whole_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_source(dir.path(), "shop.js", SHOP);
    let project = ProjectConfig::for_source(&source);
    assert_eq!(project.name, "shop");

    let compilation = compile_file(&source, &project).expect("compile");
    let names: Vec<&str> = compilation.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["storage_carts", "status"]);
    assert_eq!(
        compilation.groups[0].functions,
        vec!["put", "get", "checkout", "addItem"]
    );

    let worker = compilation.config.worker("storage_carts").expect("worker");
    assert_eq!(
        worker.kv_namespaces().collect::<Vec<_>>(),
        vec![("STORE", "shop-store"), ("CARTS", "shop-carts")]
    );
    assert_eq!(worker.routes, vec!["/storage_carts".to_string()]);
    assert!(compilation.warnings.is_empty());
}

#[test]
fn every_format_renders_every_binding() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_source(
        dir.path(),
        "app.js",
        "const store = new Map();\nconst put = (k, v) => store.set(k, v);\nconst h = (k) => put(k, 1);\nexport { h };\n",
    );
    let project = ProjectConfig::for_source(&source);
    let compilation = compile_file(&source, &project).expect("compile");

    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Toml] {
        let out = render(&compilation.config, &project.build, format).expect("render");
        for needle in ["STORE", "app-store", "STORAGE", "/h"] {
            assert!(out.contains(needle), "{format:?} output lacks {needle}:\n{out}");
        }
    }
}

#[test]
fn parse_errors_are_reported_as_parse_stage() {
    let err = parse_source(Path::new("bad.js"), "const f = (k => k;\n").unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Parse));
    assert!(err.to_string().starts_with("parse error: aborting due to"));
    let CleaveError::Diagnostics { diagnostics, .. } = err else {
        panic!("expected diagnostics");
    };
    assert!(diagnostics
        .iter()
        .all(|d| d.path == "bad.js" && d.diagnostic.code.starts_with('E')));
}

#[test]
fn check_errors_are_reported_as_type_stage() {
    let err = parse_source(Path::new("dup.js"), "const a = 1;\nconst a = 2;\n").unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Type));
    assert_eq!(err.to_string(), "type error: aborting due to 1 error");
}

#[test]
fn warnings_do_not_stop_the_pipeline() {
    let (_, warnings) =
        parse_source(Path::new("warn.js"), "new Map();\nconst f = (x) => x;\n").expect("parse");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].diagnostic.severity, DiagnosticSeverity::Warning);
    assert_eq!(warnings[0].diagnostic.code, "E3003");
}

#[test]
fn project_config_drives_names_and_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_source(dir.path(), "index.js", SHOP);
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[project]\nname = \"cart\"\n[build]\nmain = \"worker.js\"\ncompatibility_date = \"2025-01-15\"\n",
    )
    .expect("write config");

    let project = load_project_config(None, &source).expect("config");
    assert_eq!(project.name, "cart");
    let compilation = compile_file(&source, &project).expect("compile");

    let toml = render_toml(&compilation.config, &project.build);
    assert!(toml.contains("# --- storage_carts ---"));
    assert!(toml.contains("compatibility_date = \"2025-01-15\""));
    assert!(toml.contains("id = \"cart-store\""));

    let out = dir.path().join("gen");
    let written = write_output(&out, &compilation.config, &project.build).expect("write");
    assert_eq!(written.len(), 4);
    let unit: toml::Value = toml::from_str(
        &std::fs::read_to_string(out.join("status").join("wrangler.toml")).expect("read"),
    )
    .expect("valid toml");
    assert_eq!(unit["main"].as_str(), Some("worker.js"));
    assert_eq!(unit["routes"][0].as_str(), Some("/status"));
    assert!(out.join("status").join("worker.js").is_file());
}

#[test]
fn missing_source_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("missing.js");
    let err = compile_file(&source, &ProjectConfig::for_source(&source)).unwrap_err();
    assert!(matches!(err, CleaveError::Io(_)));
    assert_eq!(err.stage(), None);
}
