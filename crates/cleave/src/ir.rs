use serde::{Deserialize, Serialize};

use crate::decompose::{NameAllocator, WorkerGroup};
use crate::scope::AnalysisResult;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub project: String,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum Resource {
    Worker(Worker),
    R2Bucket {
        name: String,
        bucket_name: String,
    },
    D1Database {
        name: String,
        database_name: String,
        database_id: String,
    },
    DurableObject {
        name: String,
        class_name: String,
        script_name: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Worker {
    pub name: String,
    pub functions: Vec<String>,
    pub script: String,
    pub bindings: Vec<Binding>,
    pub routes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Binding {
    KvNamespace {
        binding: String,
        id: String,
        state: String,
    },
    Service {
        binding: String,
        service: String,
    },
}

impl Binding {
    pub fn name(&self) -> &str {
        match self {
            Binding::KvNamespace { binding, .. } | Binding::Service { binding, .. } => binding,
        }
    }
}

impl Resource {
    pub fn name(&self) -> &str {
        match self {
            Resource::Worker(worker) => &worker.name,
            Resource::R2Bucket { name, .. }
            | Resource::D1Database { name, .. }
            | Resource::DurableObject { name, .. } => name,
        }
    }
}

impl Worker {
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.name() == name)
    }

    pub fn kv_namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().filter_map(|binding| match binding {
            Binding::KvNamespace { binding, id, .. } => Some((binding.as_str(), id.as_str())),
            Binding::Service { .. } => None,
        })
    }

    /// The binding identifier that carries `state` in this worker.
    pub fn state_binding(&self, state: &str) -> Option<&str> {
        state_binding(&self.bindings, state)
    }

    pub fn services(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().filter_map(|binding| match binding {
            Binding::Service { binding, service } => Some((binding.as_str(), service.as_str())),
            Binding::KvNamespace { .. } => None,
        })
    }
}

impl Config {
    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Worker(worker) => Some(worker),
            _ => None,
        })
    }

    pub fn worker(&self, name: &str) -> Option<&Worker> {
        self.workers().find(|worker| worker.name == name)
    }
}

/// Binding identifiers are the upper-cased group or state name, with anything outside
/// `[A-Z0-9_]` replaced by `_`. Names that collapse to the same identifier inside one
/// worker are told apart by `to_ir` with a numeric suffix.
pub fn binding_identifier(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub fn namespace_id(project: &str, state: &str) -> String {
    format!("{project}-{state}")
}

/// Lowers worker groups to one worker resource each.
pub fn to_ir(groups: &[WorkerGroup], analysis: &AnalysisResult, project: &str) -> Config {
    let resources = groups
        .iter()
        .map(|group| Resource::Worker(lower_group(group, analysis, project)))
        .collect();
    Config {
        project: project.to_string(),
        resources,
    }
}

fn lower_group(group: &WorkerGroup, analysis: &AnalysisResult, project: &str) -> Worker {
    let mut bindings = Vec::with_capacity(group.owned_state.len() + group.service_deps.len());
    let mut identifiers = NameAllocator::new("binding");
    for state in &group.owned_state {
        bindings.push(Binding::KvNamespace {
            binding: identifiers.allocate(binding_identifier(state)),
            id: namespace_id(project, state),
            state: state.clone(),
        });
    }
    for dep in &group.service_deps {
        bindings.push(Binding::Service {
            binding: identifiers.allocate(binding_identifier(dep)),
            service: dep.clone(),
        });
    }

    let routes = if group
        .functions
        .iter()
        .any(|function| analysis.is_exported(function))
    {
        vec![format!("/{}", group.name)]
    } else {
        Vec::new()
    };

    let script = handler_script(group, &bindings, analysis);
    Worker {
        name: group.name.clone(),
        functions: group.functions.clone(),
        script,
        bindings,
        routes,
    }
}

fn state_binding<'a>(bindings: &'a [Binding], state: &str) -> Option<&'a str> {
    bindings.iter().find_map(|binding| match binding {
        Binding::KvNamespace {
            binding,
            state: owned,
            ..
        } if owned == state => Some(binding.as_str()),
        _ => None,
    })
}

fn handler_script(group: &WorkerGroup, bindings: &[Binding], analysis: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("// worker: {}\n", group.name));
    out.push_str(&format!("// functions: {}\n", group.functions.join(", ")));
    for binding in bindings {
        match binding {
            Binding::KvNamespace { binding, id, state } => {
                out.push_str(&format!("// env.{binding}: kv namespace {id} (state `{state}`)\n"));
            }
            Binding::Service { binding, service } => {
                out.push_str(&format!("// env.{binding}: service {service}\n"));
            }
        }
    }
    out.push('\n');

    out.push_str("const callService = async (service, fn, args) => {\n");
    out.push_str("  const res = await service.fetch(\"https://internal/\" + fn, {\n");
    out.push_str("    method: \"POST\",\n");
    out.push_str("    body: JSON.stringify(args),\n");
    out.push_str("  });\n");
    out.push_str("  return res.json();\n");
    out.push_str("};\n\n");

    out.push_str("const handlers = (env) => ({\n");
    for function in &group.functions {
        out.push_str(&format!("  {function}: async (...args) => {{\n"));
        if let Some(closure) = analysis.closure(function) {
            for state in &closure.captures_mutable {
                let binding = state_binding(bindings, state)
                    .map(str::to_string)
                    .unwrap_or_else(|| binding_identifier(state));
                out.push_str(&format!("    const {state} = env.{binding};\n"));
            }
        }
        out.push_str(&format!(
            "    throw new Error(\"`{function}` is not implemented in this stub\");\n"
        ));
        out.push_str("  },\n");
    }
    out.push_str("});\n\n");

    out.push_str("export default {\n");
    out.push_str("  async fetch(request, env) {\n");
    out.push_str("    const fn = new URL(request.url).pathname.split(\"/\").pop();\n");
    out.push_str("    const handler = handlers(env)[fn];\n");
    out.push_str("    if (!handler) {\n");
    out.push_str("      return new Response(\"not found\", { status: 404 });\n");
    out.push_str("    }\n");
    out.push_str("    const args = request.method === \"POST\" ? await request.json() : [];\n");
    out.push_str("    return Response.json(await handler(...args));\n");
    out.push_str("  },\n");
    out.push_str("};\n");
    out
}
