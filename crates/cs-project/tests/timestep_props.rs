use cs_project::schema::{
    ModelConfig, ProcessDef, ProcessKindDef, ProfileDef, TimeTypeDef, TimestepDef, TraversalDef,
};
use cs_project::{compile_model, validate_config};
use indexmap::IndexMap;
use proptest::prelude::*;

fn warming(timestep: TimestepDef) -> ModelConfig {
    ModelConfig {
        version: 2,
        name: "warming".to_string(),
        timestep,
        traversal: TraversalDef::TopDown,
        converge: None,
        state: IndexMap::from([("T".to_string(), vec![0.0, 1.0])]),
        processes: vec![ProcessDef {
            name: "heat".to_string(),
            time_type: TimeTypeDef::Explicit,
            traversal: TraversalDef::TopDown,
            timestep: None,
            kind: ProcessKindDef::ConstantTendency {
                var: "T".to_string(),
                rate: ProfileDef::Uniform(1e-3),
            },
            children: vec![],
        }],
    }
}

proptest! {
    #[test]
    fn compiled_timestep_matches_seconds(seconds in 3600.0f64..1.0e7) {
        let mut model = compile_model(&warming(TimestepDef::seconds(seconds))).unwrap();
        prop_assert!((model.timestep() - seconds).abs() <= 1e-9 * seconds);

        model.step_forward().unwrap();
        let t = model.state().get("T").unwrap();
        prop_assert!((t[0] - 1e-3 * seconds).abs() <= 1e-9 * seconds);
        prop_assert!((t[1] - (1.0 + 1e-3 * seconds)).abs() <= 1e-9 * seconds);
    }

    #[test]
    fn steps_per_year_round_trips_through_the_model(n in 1u32..2000) {
        let model = compile_model(&warming(TimestepDef::steps_per_year(f64::from(n)))).unwrap();
        prop_assert!((model.time().num_steps_per_year() - f64::from(n)).abs() < 1e-9);
    }

    #[test]
    fn non_positive_timesteps_are_rejected(seconds in -1.0e6f64..=0.0) {
        prop_assert!(validate_config(&warming(TimestepDef::seconds(seconds))).is_err());
        prop_assert!(validate_config(&warming(TimestepDef::steps_per_year(seconds))).is_err());
        prop_assert!(compile_model(&warming(TimestepDef::seconds(seconds))).is_err());
    }
}
