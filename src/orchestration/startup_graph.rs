//! # Startup Graph
//!
//! Resolves a requested module set into start waves. Every module in a wave
//! depends only on modules from earlier waves, so a wave can start
//! concurrently once the previous one has completed.
//!
//! Requested modules pull in their declared dependencies transitively. The
//! bootstrap modules (`config`, `logging`) are kept out of the graph: they
//! always start first, and a dependency on them is already satisfied.

use super::errors::{SchedulerError, SchedulerResult};
use crate::constants::modules;
use crate::registry::ModuleRegistry;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupGraph {
    bootstrap: Vec<String>,
    waves: Vec<Vec<String>>,
}

impl StartupGraph {
    /// Resolve `requested` against `registry`. Fails before anything starts
    /// on an unknown module, an unknown dependency or a dependency cycle.
    pub fn build(registry: &ModuleRegistry, requested: &[String]) -> SchedulerResult<Self> {
        let bootstrap = modules::BOOTSTRAP
            .iter()
            .map(|name| {
                if registry.contains(name) {
                    Ok(name.to_string())
                } else {
                    Err(SchedulerError::UnknownModule {
                        name: name.to_string(),
                    })
                }
            })
            .collect::<SchedulerResult<Vec<_>>>()?;

        let dependencies = resolve_closure(registry, requested)?;
        let waves = layer(registry, &dependencies)?;

        Ok(Self { bootstrap, waves })
    }

    /// Bootstrap modules, in start order
    pub fn bootstrap(&self) -> &[String] {
        &self.bootstrap
    }

    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// Every module in start order: bootstrap first, then wave by wave
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.bootstrap
            .iter()
            .chain(self.waves.iter().flatten())
            .map(String::as_str)
    }

    pub fn wave_of(&self, name: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|m| m == name))
    }

    pub fn len(&self) -> usize {
        self.bootstrap.len() + self.waves.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Requested modules plus everything they depend on, each mapped to its
/// non-bootstrap dependencies.
fn resolve_closure(
    registry: &ModuleRegistry,
    requested: &[String],
) -> SchedulerResult<HashMap<String, BTreeSet<String>>> {
    let mut pending = Vec::new();
    for name in requested.iter().filter(|n| !modules::is_bootstrap(n)) {
        if !registry.contains(name) {
            return Err(SchedulerError::UnknownModule { name: name.clone() });
        }
        pending.push(name.clone());
    }

    let mut dependencies: HashMap<String, BTreeSet<String>> = HashMap::new();
    while let Some(name) = pending.pop() {
        if dependencies.contains_key(&name) {
            continue;
        }
        let Some(module) = registry.get(&name) else {
            return Err(SchedulerError::UnknownModule { name });
        };

        let mut edges = BTreeSet::new();
        for dependency in module.dependencies() {
            if modules::is_bootstrap(&dependency) {
                continue;
            }
            if !registry.contains(&dependency) {
                return Err(SchedulerError::UnknownDependency {
                    module: name,
                    dependency,
                });
            }
            if !dependencies.contains_key(&dependency) {
                pending.push(dependency.clone());
            }
            edges.insert(dependency);
        }
        dependencies.insert(name, edges);
    }

    Ok(dependencies)
}

/// Kahn's algorithm, one layer at a time. Within a wave modules keep their
/// registration order.
fn layer(
    registry: &ModuleRegistry,
    dependencies: &HashMap<String, BTreeSet<String>>,
) -> SchedulerResult<Vec<Vec<String>>> {
    let by_position = |names: &mut Vec<String>| {
        names.sort_by_key(|n| registry.position(n).unwrap_or(usize::MAX));
    };

    let mut remaining: HashMap<&str, usize> = dependencies
        .iter()
        .map(|(name, deps)| (name.as_str(), deps.len()))
        .collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (name, deps) in dependencies {
        for dep in deps {
            dependents.entry(dep.as_str()).or_default().push(name.as_str());
        }
    }

    let mut waves = Vec::new();
    let mut ready: Vec<String> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| name.to_string())
        .collect();

    while !ready.is_empty() {
        by_position(&mut ready);
        let mut next = Vec::new();
        for name in &ready {
            remaining.remove(name.as_str());
            for dependent in dependents.get(name.as_str()).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        next.push(dependent.to_string());
                    }
                }
            }
        }
        waves.push(std::mem::replace(&mut ready, next));
    }

    if remaining.is_empty() {
        Ok(waves)
    } else {
        let stuck: HashSet<&str> = remaining.keys().copied().collect();
        Err(SchedulerError::DependencyCycle {
            modules: find_cycle(registry, dependencies, &stuck),
        })
    }
}

/// Walk dependency edges among modules that never became ready until a
/// module repeats. Every such module still waits on another one, so the
/// walk always closes a loop.
fn find_cycle(
    registry: &ModuleRegistry,
    dependencies: &HashMap<String, BTreeSet<String>>,
    stuck: &HashSet<&str>,
) -> Vec<String> {
    let mut start: Vec<&str> = stuck.iter().copied().collect();
    start.sort_by_key(|n| registry.position(n).unwrap_or(usize::MAX));

    let mut path: Vec<&str> = Vec::new();
    let mut current = start.first().copied();
    while let Some(name) = current {
        if let Some(first) = path.iter().position(|n| *n == name) {
            let mut cycle: Vec<String> = path[first..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return cycle;
        }
        path.push(name);
        current = dependencies
            .get(name)
            .and_then(|deps| deps.iter().find(|d| stuck.contains(d.as_str())))
            .map(String::as_str);
    }

    path.into_iter().map(str::to_string).collect()
}
