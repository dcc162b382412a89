//! End-to-end catalog behaviour against real (shell script) executables.
#![cfg(unix)]

mod common;

use common::{Sandbox, COPY_SCRIPT, FAILING_SCRIPT, SILENT_SCRIPT};
use serde_json::json;
use simdb::{Catalog, Error, ParamSet};
use std::collections::BTreeSet;

fn params(value: serde_json::Value) -> ParamSet {
    ParamSet::from_value(value).expect("parameter object")
}

#[test]
fn create_runs_once_then_selects_and_counts() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let p = params(json!({"n": 3, "Nx": 20}));

    let output = catalog.create(&p, 0).expect("create");
    assert_eq!(output, catalog.output_path(&p, 0).unwrap());
    assert!(output.is_file());

    let runs = sandbox.runs();
    assert_eq!(runs.len(), 1);
    let input = catalog.input_path(&p, 0).unwrap();
    assert_eq!(
        runs[0],
        format!("{} {}", input.display(), output.display())
    );

    assert_eq!(catalog.select(&p, 0).unwrap(), Some(output.clone()));
    assert_eq!(catalog.outfile(&p, 0).unwrap(), output);
    assert_eq!(catalog.count(&p).unwrap(), 1);
}

#[test]
fn create_is_idempotent_across_key_order() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let first = catalog
        .create(&params(json!({"n": 3, "Nx": 20})), 0)
        .expect("create");
    let second = catalog
        .create(&ParamSet::new().with("Nx", 20).with("n", 3), 0)
        .expect("create again");
    assert_eq!(first, second);
    assert_eq!(sandbox.runs().len(), 1);
}

#[test]
fn input_file_holds_the_canonical_encoding() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let p = params(json!({"b": [1, 2], "a": {"y": true, "x": null}}));
    catalog.create(&p, 0).expect("create");
    let stored = std::fs::read(catalog.input_path(&p, 0).unwrap()).expect("read input");
    assert_eq!(stored, simdb::canonical_bytes(&p).unwrap());
}

#[test]
fn restart_chain_must_be_created_in_order() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let p = params(json!({"n": 3, "Nx": 20}));

    match catalog.create(&p, 2) {
        Err(Error::MissingPredecessor { index, .. }) => assert_eq!(index, 2),
        other => panic!("expected MissingPredecessor, got {other:?}"),
    }
    assert!(matches!(
        catalog.create(&p, 1),
        Err(Error::MissingPredecessor { .. })
    ));
    assert!(sandbox.runs().is_empty());

    catalog.create(&p, 0).expect("create 0");
    catalog.create(&p, 1).expect("create 1");
    let last = catalog.create(&p, 2).expect("create 2");

    let runs = sandbox.runs();
    assert_eq!(runs.len(), 3);
    let previous = catalog.output_path(&p, 1).unwrap();
    assert!(runs[2].ends_with(&format!(
        "{} {}",
        last.display(),
        previous.display()
    )));
    assert_eq!(catalog.count(&p).unwrap(), 3);

    // Each restart appended its predecessor, so the chain grows.
    let sizes: Vec<u64> = (0..3)
        .map(|n| {
            std::fs::metadata(catalog.output_path(&p, n).unwrap())
                .unwrap()
                .len()
        })
        .collect();
    assert!(sizes[0] < sizes[1] && sizes[1] < sizes[2]);
}

#[test]
fn count_stops_at_gap() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let p = params(json!({"n": 3}));
    for n in 0..5 {
        catalog.create(&p, n).expect("create");
    }
    std::fs::remove_file(catalog.output_path(&p, 3).unwrap()).unwrap();
    assert_eq!(catalog.count(&p).unwrap(), 3);
    assert!(catalog.exists(&p, 4).unwrap());
}

#[test]
fn silent_success_is_an_execution_failure() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(SILENT_SCRIPT, "nc");
    let p = params(json!({"n": 3}));
    match catalog.create(&p, 0) {
        Err(Error::ExecutionFailure { output }) => {
            assert_eq!(output, catalog.output_path(&p, 0).unwrap());
        }
        other => panic!("expected ExecutionFailure, got {other:?}"),
    }
    assert!(catalog.input_path(&p, 0).unwrap().is_file());
    assert_eq!(catalog.select(&p, 0).unwrap(), None);
}

#[test]
fn nonzero_exit_keeps_input_and_drops_partial_output() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(FAILING_SCRIPT, "nc");
    let p = params(json!({"n": 3}));
    match catalog.create(&p, 0) {
        Err(Error::Execution { code, stderr }) => {
            assert_eq!(code, Some(2));
            assert_eq!(stderr, "diverged at step 7");
        }
        other => panic!("expected Execution, got {other:?}"),
    }
    assert!(catalog.input_path(&p, 0).unwrap().is_file());
    assert!(!catalog.output_path(&p, 0).unwrap().exists());
    // The claim is released, so a retry runs again.
    assert!(catalog.create(&p, 0).is_err());
    assert_eq!(sandbox.runs().len(), 2);
}

#[test]
fn table_has_one_row_per_parameter_set() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let sets = [
        params(json!({"n": 1, "Nx": 20})),
        params(json!({"n": 2, "Nx": 20})),
        params(json!({"n": 3, "Nx": 40})),
    ];
    for (i, p) in sets.iter().enumerate() {
        for n in 0..=i as u32 {
            catalog.create(p, n).expect("create");
        }
    }

    let table = catalog.table().expect("table");
    assert_eq!(table.len(), 3);
    for p in &sets {
        assert!(table.contains(p));
    }
    let filter = ParamSet::new().with("Nx", 20);
    assert_eq!(table.iter().filter(|row| row.matches(&filter)).count(), 2);

    let files = catalog.files().expect("files");
    assert_eq!(files.len(), 6);
    let keys: Vec<_> = files
        .iter()
        .map(|file| (file.fingerprint.clone(), file.n))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let scan = catalog.scan().expect("scan");
    let chain = scan
        .entries
        .iter()
        .find(|entry| entry.params == sets[2])
        .expect("third entry");
    assert_eq!(chain.outputs, BTreeSet::from([0, 1, 2]));
    assert_eq!(chain.inputs, BTreeSet::from([0, 1, 2]));
}

#[test]
fn entries_with_awkward_floats_stay_in_the_table() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let p = ParamSet::new()
        .with("n", 3)
        .with_float("dt", 1.0715660391465826e-75)
        .unwrap();
    catalog.create(&p, 0).expect("create");

    let scan = catalog.scan().expect("scan");
    assert!(scan.inconsistent.is_empty(), "{:?}", scan.inconsistent);
    assert_eq!(catalog.table().unwrap(), vec![p.clone()]);
    assert_eq!(catalog.files().unwrap().len(), 1);
}

#[test]
fn delete_removes_every_index_and_delete_all_resets() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let p = params(json!({"n": 3}));
    let q = params(json!({"n": 4}));
    for n in 0..3 {
        catalog.create(&p, n).expect("create p");
    }
    catalog.create(&q, 0).expect("create q");

    catalog.delete(&p, None).expect("delete p");
    for n in 0..3 {
        assert_eq!(catalog.select(&p, n).unwrap(), None);
        assert!(!catalog.input_path(&p, n).unwrap().exists());
    }
    assert_eq!(catalog.count(&p).unwrap(), 0);
    assert_eq!(catalog.table().unwrap(), vec![q.clone()]);

    let catalog: Catalog = catalog.delete_all().expect("delete all");
    assert!(catalog.table().unwrap().is_empty());
    assert_eq!(catalog.select(&q, 0).unwrap(), None);
    catalog.create(&q, 0).expect("create after reset");
}

#[test]
fn recreate_forces_a_rerun() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    let p = params(json!({"n": 3}));
    let first = catalog.create(&p, 0).expect("create");
    let second = catalog.recreate(&p, 0).expect("recreate");
    assert_eq!(first, second);
    assert_eq!(sandbox.runs().len(), 2);
}

#[test]
fn json_outputs_live_beside_json_inputs() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "json");
    let p = params(json!({"n": 3}));
    let output = catalog.create(&p, 0).expect("create");
    catalog.create(&p, 1).expect("restart");
    assert!(output.to_string_lossy().ends_with("_out.json"));
    assert_ne!(output, catalog.input_path(&p, 0).unwrap());

    let scan = catalog.scan().expect("scan");
    assert!(scan.inconsistent.is_empty());
    assert_eq!(scan.entries.len(), 1);
    assert_eq!(catalog.count(&p).unwrap(), 2);
}

#[test]
fn unencodable_parameters_never_touch_disk() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.catalog(COPY_SCRIPT, "nc");
    assert!(matches!(
        ParamSet::from_json_str("[1, 2]"),
        Err(Error::Serialization(_))
    ));
    assert!(matches!(
        ParamSet::new().with_float("dt", f64::NAN),
        Err(Error::Serialization(_))
    ));
    #[derive(serde::Serialize)]
    struct Run {
        n: u32,
        dt: f64,
    }
    assert!(matches!(
        ParamSet::from_serialize(&Run {
            n: 3,
            dt: f64::INFINITY
        }),
        Err(Error::Serialization(_))
    ));
    assert!(catalog.table().unwrap().is_empty());
    assert!(sandbox.runs().is_empty());
}
