use std::path::PathBuf;

use cs_process::TimeType;

fn demos_dir() -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    crate_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("demos")
}

#[test]
fn demos_load_and_compile() {
    for name in ["ebm.yaml", "column.json"] {
        let path = demos_dir().join(name);
        let config =
            cs_project::load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        cs_project::compile_model(&config)
            .unwrap_or_else(|e| panic!("Failed to compile {}: {}", name, e));
    }
}

#[test]
fn ebm_demo_reaches_equilibrium() {
    let config = cs_project::load_yaml(&demos_dir().join("ebm.yaml")).unwrap();
    let mut model = cs_project::compile_model(&config).unwrap();

    let types = model.process_types();
    assert_eq!(types.of(TimeType::Diagnostic).len(), 1);
    assert_eq!(types.of(TimeType::Implicit).len(), 1);
    assert_eq!(types.of(TimeType::Adjustment).len(), 1);

    let options = config.converge.as_ref().unwrap().options();
    let report = model.integrate_converge(&options).unwrap();
    assert!(report.delta <= options.crit);

    let ts = model.state().get("Ts").unwrap();
    // Warmer where more sunlight is absorbed, and above the ice floor.
    assert!(ts[0] > ts[1] && ts[1] > ts[2]);
    assert!(ts.iter().all(|t| *t > 230.0));
    assert!(model.timeave().contains("shortwave/insolation/ASR"));
}

#[test]
fn column_demo_keeps_humidity_non_negative() {
    let config = cs_project::load_json(&demos_dir().join("column.json")).unwrap();
    let mut model = cs_project::compile_model(&config).unwrap();
    model.integrate_years(1.0).unwrap();

    let q = model.state().get("q").unwrap();
    assert!(q.iter().all(|v| *v > -1e-15), "{q:?}");
    assert!(q[0].abs() < 1e-12);
}
