//! proptest strategies.

use harbor_core::state_machine::PhaseFacts;
use proptest::prelude::*;

pub fn module_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}".prop_map(|s| format!("m-{s}"))
}

/// Random DAG over `m0..mN`: each module may only depend on lower-numbered
/// modules, so the result is acyclic by construction.
pub fn module_dag(max_modules: usize) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (1..=max_modules).prop_flat_map(|count| {
        let edges: Vec<_> = (0..count)
            .map(|index| proptest::collection::vec(any::<bool>(), index))
            .collect();
        edges.prop_map(move |edges| {
            edges
                .into_iter()
                .enumerate()
                .map(|(index, picks)| {
                    let dependencies = picks
                        .into_iter()
                        .enumerate()
                        .filter(|(_, picked)| *picked)
                        .map(|(dep, _)| format!("m{dep}"))
                        .collect();
                    (format!("m{index}"), dependencies)
                })
                .collect()
        })
    })
}

pub fn phase_facts() -> impl Strategy<Value = PhaseFacts> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(verified, prepared, registered, failed, ready)| PhaseFacts {
            verified,
            prepared,
            registered,
            failed,
            ready,
        },
    )
}

/// Class entries for a synthetic archive: (simple name, annotation) pairs
pub fn annotated_classes() -> impl Strategy<Value = Vec<(String, Option<&'static str>)>> {
    let annotation = prop_oneof![
        Just(None),
        Just(Some("jakarta.ws.rs.Path")),
        Just(Some("jakarta.servlet.annotation.WebServlet")),
        Just(Some("jakarta.inject.Singleton")),
    ];
    proptest::collection::vec(("[A-Z][a-z]{2,8}", annotation), 0..8)
}
