//! Partitioning of closures into deployable worker groups.
//!
//! Functions that capture the same mutable container must live in the same group, and a
//! function capturing two containers forces both containers (and everything attached to
//! them) together. Functions capturing no container become singleton groups. Calls that
//! cross a group boundary become service dependencies.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::scope::AnalysisResult;

/// State variable that is renamed when it is the only state a group owns.
const DEFAULT_STATE_NAME: &str = "store";
const DEFAULT_STATE_GROUP_NAME: &str = "storage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerGroup {
    pub name: String,
    pub functions: Vec<String>,
    pub owned_state: Vec<String>,
    pub service_deps: Vec<String>,
}

impl WorkerGroup {
    pub fn contains_function(&self, name: &str) -> bool {
        self.functions.iter().any(|function| function == name)
    }
}

#[derive(Debug, Default)]
struct StateCluster {
    states: IndexSet<String>,
    functions: IndexSet<String>,
}

impl StateCluster {
    fn shares_function(&self, other: &StateCluster) -> bool {
        other
            .functions
            .iter()
            .any(|function| self.functions.contains(function))
    }

    fn absorb(&mut self, other: StateCluster) {
        self.states.extend(other.states);
        self.functions.extend(other.functions);
    }
}

/// Splits an analysis into worker groups. Total: an analysis without closures yields an
/// empty list.
pub fn decompose(analysis: &AnalysisResult) -> Vec<WorkerGroup> {
    let clusters = merge_clusters(seed_clusters(analysis));

    let mut names = NameAllocator::new("group name");
    let mut groups: Vec<WorkerGroup> = clusters
        .into_iter()
        .map(|cluster| WorkerGroup {
            name: names.allocate(group_name(&cluster.states)),
            functions: cluster.functions.into_iter().collect(),
            owned_state: cluster.states.into_iter().collect(),
            service_deps: Vec::new(),
        })
        .collect();

    let absorbed: IndexSet<&str> = groups
        .iter()
        .flat_map(|group| group.functions.iter().map(String::as_str))
        .collect();
    let singletons: Vec<WorkerGroup> = analysis
        .closures
        .iter()
        .filter(|closure| !absorbed.contains(closure.name.as_str()))
        .map(|closure| WorkerGroup {
            name: names.allocate(closure.name.clone()),
            functions: vec![closure.name.clone()],
            owned_state: Vec::new(),
            service_deps: Vec::new(),
        })
        .collect();
    groups.extend(singletons);

    resolve_service_deps(&mut groups, analysis);
    debug_assert_partition(&groups, analysis);

    log::debug!(
        "decomposition: {} closures into {} groups",
        analysis.closures.len(),
        groups.len()
    );
    for group in &groups {
        log::trace!(
            "group `{}`: functions {:?}, state {:?}, deps {:?}",
            group.name,
            group.functions,
            group.owned_state,
            group.service_deps
        );
    }

    groups
}

/// One candidate cluster per captured state variable, in first-capture order.
fn seed_clusters(analysis: &AnalysisResult) -> Vec<StateCluster> {
    let captured: IndexSet<&str> = analysis
        .closures
        .iter()
        .flat_map(|closure| closure.captures_mutable.iter().map(String::as_str))
        .collect();

    captured
        .into_iter()
        .map(|state| StateCluster {
            states: IndexSet::from([state.to_string()]),
            functions: analysis
                .closures
                .iter()
                .filter(|closure| closure.captures_mutable.contains(state))
                .map(|closure| closure.name.clone())
                .collect(),
        })
        .collect()
}

/// Folds candidates into merged clusters; clusters sharing a function are unioned.
///
/// A candidate may bridge several existing clusters at once, in which case all of them
/// collapse into the earliest one so the result stays transitively closed.
fn merge_clusters(candidates: Vec<StateCluster>) -> Vec<StateCluster> {
    let mut merged: Vec<StateCluster> = Vec::new();
    for candidate in candidates {
        let overlapping: Vec<usize> = merged
            .iter()
            .enumerate()
            .filter(|(_, cluster)| cluster.shares_function(&candidate))
            .map(|(index, _)| index)
            .collect();

        let Some((&target, rest)) = overlapping.split_first() else {
            merged.push(candidate);
            continue;
        };
        for &index in rest.iter().rev() {
            let cluster = merged.remove(index);
            merged[target].absorb(cluster);
        }
        merged[target].absorb(candidate);
    }
    merged
}

fn rename_state(state: &str) -> &str {
    if state == DEFAULT_STATE_NAME {
        DEFAULT_STATE_GROUP_NAME
    } else {
        state
    }
}

fn group_name(states: &IndexSet<String>) -> String {
    states
        .iter()
        .map(|state| rename_state(state))
        .collect::<Vec<_>>()
        .join("_")
}

/// Hands out unique names; a clash gets a numeric suffix.
pub(crate) struct NameAllocator {
    kind: &'static str,
    taken: IndexSet<String>,
}

impl NameAllocator {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            taken: IndexSet::new(),
        }
    }

    pub(crate) fn allocate(&mut self, preferred: String) -> String {
        if self.taken.insert(preferred.clone()) {
            return preferred;
        }
        let mut suffix = 2usize;
        loop {
            let candidate = format!("{preferred}_{suffix}");
            if self.taken.insert(candidate.clone()) {
                log::warn!(
                    "{} `{preferred}` already taken; using `{candidate}`",
                    self.kind
                );
                return candidate;
            }
            suffix += 1;
        }
    }
}

fn resolve_service_deps(groups: &mut [WorkerGroup], analysis: &AnalysisResult) {
    let owner: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .flat_map(|(index, group)| {
            group
                .functions
                .iter()
                .map(move |function| (function.as_str(), index))
        })
        .collect();

    let deps: Vec<Vec<String>> = groups
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let mut deps = IndexSet::new();
            for function in &group.functions {
                let Some(closure) = analysis.closure(function) else {
                    continue;
                };
                for callee in &closure.called_functions {
                    match owner.get(callee.as_str()) {
                        Some(&target) if target != index => {
                            deps.insert(groups[target].name.clone());
                        }
                        _ => {}
                    }
                }
            }
            deps.into_iter().collect()
        })
        .collect();

    for (group, deps) in groups.iter_mut().zip(deps) {
        group.service_deps = deps;
    }
}

fn debug_assert_partition(groups: &[WorkerGroup], analysis: &AnalysisResult) {
    if !cfg!(debug_assertions) {
        return;
    }
    let mut seen_functions = IndexSet::new();
    let mut seen_states = IndexSet::new();
    for group in groups {
        for function in &group.functions {
            assert!(
                seen_functions.insert(function.as_str()),
                "function `{function}` assigned to more than one group"
            );
        }
        for state in &group.owned_state {
            assert!(
                seen_states.insert(state.as_str()),
                "state `{state}` owned by more than one group"
            );
        }
        assert!(
            !group.service_deps.contains(&group.name),
            "group `{}` depends on itself",
            group.name
        );
    }
    assert_eq!(
        seen_functions.len(),
        analysis.closures.len(),
        "every closure must belong to exactly one group"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ClosureInfo;

    fn closure(name: &str, captures: &[&str], calls: &[&str]) -> ClosureInfo {
        let captures: IndexSet<String> = captures.iter().map(|s| s.to_string()).collect();
        let calls: IndexSet<String> = calls.iter().map(|s| s.to_string()).collect();
        ClosureInfo {
            name: name.to_string(),
            free_vars: captures.iter().chain(calls.iter()).cloned().collect(),
            called_functions: calls,
            captures_mutable: captures,
        }
    }

    fn analysis(closures: Vec<ClosureInfo>) -> AnalysisResult {
        AnalysisResult {
            closures,
            module_vars: Vec::new(),
            exports: Vec::new(),
        }
    }

    fn group_names(groups: &[WorkerGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn empty_analysis_yields_no_groups() {
        assert!(decompose(&analysis(Vec::new())).is_empty());
    }

    #[test]
    fn naming_renames_only_store() {
        let states = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        assert_eq!(group_name(&states(&["store"])), "storage");
        assert_eq!(group_name(&states(&["cache"])), "cache");
        assert_eq!(group_name(&states(&["store", "cache"])), "storage_cache");
        assert_eq!(group_name(&states(&["a", "b", "c"])), "a_b_c");
    }

    #[test]
    fn bridge_candidate_collapses_two_existing_clusters() {
        // Seeds a: {f, y}, b: {g, z}, c: {y, z}; only c links the first two.
        let groups = decompose(&analysis(vec![
            closure("f", &["a"], &[]),
            closure("g", &["b"], &[]),
            closure("y", &["c", "a"], &[]),
            closure("z", &["b", "c"], &[]),
        ]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].owned_state, vec!["a", "b", "c"]);
        assert_eq!(groups[0].functions, vec!["f", "y", "g", "z"]);
        assert_eq!(groups[0].name, "a_b_c");
    }

    #[test]
    fn function_capturing_two_states_merges_their_groups() {
        let groups = decompose(&analysis(vec![
            closure("f", &["a", "c"], &[]),
            closure("g", &["b", "c"], &[]),
        ]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].owned_state, vec!["a", "c", "b"]);
        assert_eq!(groups[0].functions, vec!["f", "g"]);
        assert_eq!(groups[0].name, "a_c_b");
    }

    #[test]
    fn singletons_follow_state_groups_in_closure_order() {
        let groups = decompose(&analysis(vec![
            closure("h", &[], &[]),
            closure("put", &["store"], &[]),
            closure("k", &[], &[]),
        ]));
        assert_eq!(group_names(&groups), vec!["storage", "h", "k"]);
    }

    #[test]
    fn clashing_group_names_get_suffixes() {
        let groups = decompose(&analysis(vec![
            closure("put", &["store"], &[]),
            closure("get", &["storage"], &[]),
            closure("storage", &[], &["put"]),
        ]));
        assert_eq!(
            group_names(&groups),
            vec!["storage", "storage_2", "storage_3"]
        );
        assert_eq!(groups[2].service_deps, vec!["storage"]);
    }

    #[test]
    fn service_deps_are_deduplicated_and_skip_self_and_unknown() {
        let groups = decompose(&analysis(vec![
            closure("put", &["store"], &[]),
            closure("get", &["store"], &["put"]),
            closure("h", &[], &["get", "put", "fetch", "h"]),
        ]));
        assert_eq!(groups[0].service_deps, Vec::<String>::new());
        assert_eq!(groups[1].name, "h");
        assert_eq!(groups[1].service_deps, vec!["storage"]);
    }
}
