//! Property-based tests for the partitioning invariants.
//!
//! Programs are generated as a handful of container states plus functions that touch
//! some of those states and call some of the other functions; a random subset of
//! functions is exported.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use proptest::prelude::*;

use cleave::{compile_program, parse_source, Compilation};

#[derive(Debug, Clone)]
struct FunctionSpec {
    captures: Vec<usize>,
    calls: Vec<usize>,
    exported: bool,
}

#[derive(Debug, Clone)]
struct ProgramSpec {
    states: usize,
    functions: Vec<FunctionSpec>,
}

impl ProgramSpec {
    fn state_name(&self, index: usize) -> String {
        // `store` is renamed to `storage`, which then clashes with a real `storage`.
        match index {
            0 => "store".to_string(),
            1 => "storage".to_string(),
            _ => format!("s{index}"),
        }
    }

    fn source(&self) -> String {
        let mut out = String::new();
        for state in 0..self.states {
            let _ = writeln!(out, "const {} = new Map();", self.state_name(state));
        }
        for (index, function) in self.functions.iter().enumerate() {
            let _ = writeln!(out, "const f{index} = (k) => {{");
            if self.states > 0 {
                for &state in &function.captures {
                    let _ = writeln!(out, "  {}.get(k);", self.state_name(state % self.states));
                }
            }
            for &call in &function.calls {
                let _ = writeln!(out, "  f{}(k);", call % self.functions.len());
            }
            out.push_str("  return k;\n};\n");
        }
        let exported: Vec<String> = self
            .functions
            .iter()
            .enumerate()
            .filter(|(_, function)| function.exported)
            .map(|(index, _)| format!("f{index}"))
            .collect();
        if !exported.is_empty() {
            let _ = writeln!(out, "export {{ {} }};", exported.join(", "));
        }
        out
    }
}

fn arb_program() -> impl Strategy<Value = ProgramSpec> {
    let function = (
        prop::collection::vec(0usize..5, 0..3),
        prop::collection::vec(0usize..10, 0..3),
        any::<bool>(),
    )
        .prop_map(|(captures, calls, exported)| FunctionSpec {
            captures,
            calls,
            exported,
        });
    (0usize..5, prop::collection::vec(function, 1..10))
        .prop_map(|(states, functions)| ProgramSpec { states, functions })
}

fn compile(spec: &ProgramSpec) -> Compilation {
    let source = spec.source();
    let (program, _) = parse_source(Path::new("gen.js"), &source)
        .unwrap_or_else(|err| panic!("generated program failed to parse: {err}\n{source}"));
    compile_program(&program, "prop").expect("compile")
}

fn owner_of(compilation: &Compilation) -> HashMap<&str, &str> {
    compilation
        .groups
        .iter()
        .flat_map(|group| {
            group
                .functions
                .iter()
                .map(move |function| (function.as_str(), group.name.as_str()))
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_function_is_in_exactly_one_group(spec in arb_program()) {
        let compilation = compile(&spec);
        let mut seen = HashSet::new();
        for group in &compilation.groups {
            for function in &group.functions {
                prop_assert!(seen.insert(function.clone()), "{} appears twice", function);
            }
        }
        prop_assert_eq!(seen.len(), spec.functions.len());
        prop_assert_eq!(compilation.analysis.closures.len(), spec.functions.len());
    }

    #[test]
    fn every_captured_state_is_owned_exactly_once(spec in arb_program()) {
        let compilation = compile(&spec);
        let captured: HashSet<&str> = compilation
            .analysis
            .closures
            .iter()
            .flat_map(|closure| closure.captures_mutable.iter().map(String::as_str))
            .collect();
        let mut owned = HashMap::new();
        for group in &compilation.groups {
            for state in &group.owned_state {
                *owned.entry(state.as_str()).or_insert(0usize) += 1;
            }
        }
        prop_assert_eq!(owned.len(), captured.len());
        for state in captured {
            prop_assert_eq!(owned.get(state).copied(), Some(1));
        }
    }

    #[test]
    fn closures_sharing_state_share_a_group(spec in arb_program()) {
        let compilation = compile(&spec);
        let owner = owner_of(&compilation);
        let closures = &compilation.analysis.closures;
        for a in closures {
            for b in closures {
                if a.captures_mutable.iter().any(|state| b.captures_mutable.contains(state)) {
                    prop_assert_eq!(owner[a.name.as_str()], owner[b.name.as_str()]);
                }
            }
        }
    }

    #[test]
    fn service_deps_follow_cross_group_calls(spec in arb_program()) {
        let compilation = compile(&spec);
        let owner = owner_of(&compilation);
        for group in &compilation.groups {
            prop_assert!(!group.service_deps.contains(&group.name));
            let mut expected: Vec<&str> = Vec::new();
            for function in &group.functions {
                let closure = compilation.analysis.closure(function).expect("closure");
                for callee in &closure.called_functions {
                    let target = owner[callee.as_str()];
                    if target != group.name && !expected.contains(&target) {
                        expected.push(target);
                    }
                }
            }
            let actual: Vec<&str> = group.service_deps.iter().map(String::as_str).collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn routes_exist_only_for_exported_groups(spec in arb_program()) {
        let compilation = compile(&spec);
        for group in &compilation.groups {
            let exported = group
                .functions
                .iter()
                .any(|function| compilation.analysis.is_exported(function));
            let worker = compilation.config.worker(&group.name).expect("worker");
            prop_assert_eq!(!worker.routes.is_empty(), exported);
            prop_assert_eq!(worker.bindings.len(), group.owned_state.len() + group.service_deps.len());
        }
    }

    #[test]
    fn binding_names_are_distinct_within_a_worker(spec in arb_program()) {
        let compilation = compile(&spec);
        for worker in compilation.config.workers() {
            let names: HashSet<&str> = worker.bindings.iter().map(|binding| binding.name()).collect();
            prop_assert_eq!(names.len(), worker.bindings.len(), "{:?}", worker.bindings);
            for binding in &worker.bindings {
                prop_assert_eq!(worker.binding(binding.name()), Some(binding));
            }
        }
    }

    #[test]
    fn compilation_is_deterministic(spec in arb_program()) {
        let first = compile(&spec);
        let second = compile(&spec);
        prop_assert_eq!(&first.groups, &second.groups);
        prop_assert_eq!(&first.config, &second.config);
    }
}
