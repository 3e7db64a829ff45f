//! Integration test: probe and lookup reports over the real dynamic loader.
//!
//! Run: cargo test -p optlib-harness --test probe_report_test

use optlib_harness::{HarnessError, LookupReport, ProbeReport};
use optlib_loader::{LibraryDescriptor, Registry, SystemLoader};

const ABSENT: &str = "liboptlib-not-installed.so";

fn libm_available() -> bool {
    let mut registry = Registry::new(SystemLoader, [LibraryDescriptor::new("libm.so.6")]);
    let report = registry.load();
    !report.degraded
}

#[test]
fn absent_library_is_reported_with_notice_and_error() {
    let mut registry = Registry::new(
        SystemLoader,
        [LibraryDescriptor::new(ABSENT).with_notice("running without extras")],
    );

    let report = ProbeReport::probe(&mut registry);

    assert!(report.degraded);
    assert_eq!(report.loaded_count(), 0);
    let lib = &report.libraries[0];
    assert_eq!(lib.id, 0);
    assert_eq!(lib.name, ABSENT);
    assert!(!lib.loaded);
    assert_eq!(lib.version, None);
    assert_eq!(lib.notice.as_deref(), Some("running without extras"));
    assert!(lib.error.as_deref().unwrap().contains(ABSENT));
}

#[test]
fn mixed_table_keeps_descriptor_order() {
    if !libm_available() {
        eprintln!("Skipping: libm.so.6 not loadable");
        return;
    }
    let mut registry = Registry::new(
        SystemLoader,
        [
            LibraryDescriptor::new("libm.so.6"),
            LibraryDescriptor::new(ABSENT),
            // libm.so.6 carries no full triple, so a required version fails.
            LibraryDescriptor::new("libm.so.6").requiring_version(),
        ],
    );

    let report = ProbeReport::probe(&mut registry);

    let names: Vec<_> = report.libraries.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["libm.so.6", ABSENT, "libm.so.6"]);
    assert!(report.degraded);

    assert!(report.libraries[0].loaded);
    assert_eq!(report.libraries[0].version.as_deref(), Some("0.0.0"));
    assert_eq!(report.libraries[0].error, None);

    assert!(!report.libraries[2].loaded);
    assert!(report.libraries[2].requires_version);
    assert!(
        report.libraries[2]
            .error
            .as_deref()
            .unwrap()
            .starts_with("failed to resolve `libm.so.6` version")
    );

    // Round trip through the on-disk format.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("probe.json");
    report.write_to(&path).unwrap();
    let back: ProbeReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back, report);
}

#[test]
fn lookup_report_resolves_libm_cos() {
    if !libm_available() {
        eprintln!("Skipping: libm.so.6 not loadable");
        return;
    }
    let mut registry = Registry::new(SystemLoader, [LibraryDescriptor::new("libm.so.6")]);

    let hit = LookupReport::run(&mut registry, "cos").unwrap();
    assert!(hit.loaded && hit.resolved);
    hit.require_resolved().unwrap();

    let miss = LookupReport::run(&mut registry, "optlib_no_such_fn").unwrap();
    assert!(miss.loaded && !miss.resolved);
    assert!(matches!(
        miss.require_resolved(),
        Err(HarnessError::Unresolved { .. })
    ));
}

#[test]
fn lookup_rejects_interior_nul() {
    let mut registry = Registry::new(SystemLoader, [LibraryDescriptor::new(ABSENT)]);
    assert!(matches!(
        LookupReport::run(&mut registry, "co\0s"),
        Err(HarnessError::InvalidSymbol { .. })
    ));
}
