//! Integration test: a small energy-balance model built from the reference
//! processes, run to equilibrium.

use cs_core::units::days;
use cs_core::{Field, ProcessId};
use cs_process::{ConvergeOptions, Model, ProcessSpec, TimeType};
use cs_processes::{
    AbsorbedForcing, ConstantDiagnostic, Diffusion, FloorAdjustment, Profile, Relaxation,
};

const TAU_DAYS: f64 = 30.0;
const ASR: [f64; 3] = [300.0, 240.0, 180.0];

/// Heat capacity for which an absorbed flux of 240 W/m² holds the
/// equilibrium 10 K above the relaxation target.
fn heat_capacity() -> f64 {
    240.0 * TAU_DAYS * 86_400.0 / 10.0
}

fn ebm(diffusivity: Option<f64>) -> Model {
    let mut model = Model::new(
        ProcessSpec::coupler("ebm")
            .num_steps_per_year(365.0)
            .state("Ts", Field::from_element(3, 250.0)),
    )
    .unwrap();
    let root = ProcessId::ROOT;
    let sw = model
        .add_subprocess(root, ProcessSpec::coupler("shortwave"))
        .unwrap();
    model
        .add_subprocess(
            sw,
            ProcessSpec::new(
                "insolation",
                TimeType::Diagnostic,
                ConstantDiagnostic::new("ASR", Field::from_column_slice(&ASR)).unwrap(),
            ),
        )
        .unwrap();
    model
        .add_subprocess(
            sw,
            ProcessSpec::new(
                "absorption",
                TimeType::Explicit,
                AbsorbedForcing::new("Ts", "shortwave/insolation/ASR", heat_capacity()).unwrap(),
            ),
        )
        .unwrap();
    model
        .add_subprocess(
            root,
            ProcessSpec::new(
                "olr",
                TimeType::Explicit,
                Relaxation::new("Ts", Profile::Uniform(270.0), days(TAU_DAYS)).unwrap(),
            ),
        )
        .unwrap();
    if let Some(k) = diffusivity {
        model
            .add_subprocess(
                root,
                ProcessSpec::new("diffusion", TimeType::Implicit, Diffusion::new("Ts", k).unwrap()),
            )
            .unwrap();
    }
    model
        .add_subprocess(
            root,
            ProcessSpec::new(
                "freeze",
                TimeType::Adjustment,
                FloorAdjustment::new("Ts", 200.0).unwrap(),
            ),
        )
        .unwrap();
    model
}

fn converge(model: &mut Model) {
    let options = ConvergeOptions {
        crit: 1e-6,
        watch: Some("Ts".to_string()),
        max_years: 50,
    };
    model.integrate_converge(&options).unwrap();
}

#[test]
fn equilibrium_matches_analytic_balance() {
    let mut model = ebm(None);
    converge(&mut model);
    let ts = model.state().get("Ts").unwrap();
    for (t, asr) in ts.iter().zip(ASR) {
        let expected = 270.0 + asr * TAU_DAYS * 86_400.0 / heat_capacity();
        assert!((t - expected).abs() < 1e-4, "{t} vs {expected}");
    }
    let insolation = model.find("shortwave/insolation").unwrap();
    assert_eq!(model.path_of(insolation).unwrap(), "shortwave/insolation");
}

#[test]
fn diffusion_narrows_gradient_without_changing_mean() {
    let mut plain = ebm(None);
    let mut mixed = ebm(Some(1e-7));
    converge(&mut plain);
    converge(&mut mixed);

    let a = plain.state().get("Ts").unwrap();
    let b = mixed.state().get("Ts").unwrap();
    assert!(b[0] - b[2] < a[0] - a[2]);
    assert!((a.mean() - b.mean()).abs() < 1e-4);
}

#[test]
fn time_average_includes_published_flux() {
    let mut model = ebm(Some(1e-7));
    model.integrate_years(1.0).unwrap();
    let asr = model.timeave().get("shortwave/insolation/ASR").unwrap();
    assert_eq!(asr.len(), 3);
    assert!((asr[1] - 240.0).abs() < 1e-9);
    assert!(model.timeave().contains("Ts"));
}
