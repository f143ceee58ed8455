//! Seed-determinism of whole runs.
//!
//! Two identical runs (same initial tissue, same rules, same seed) must
//! produce bit-identical meshes, including every vertex coordinate created
//! by randomized rules.

use cytokinesis::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn rectangle() -> Vec<Point2> {
    vec![
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(2.0, 1.0),
        Point2::new(0.0, 1.0),
    ]
}

/// Runs `steps` division passes and returns the serialized mesh plus the
/// per-step rule names, a full fingerprint of the run.
fn run(seed: u64, steps: usize, rules: &[Box<dyn DivisionRule>]) -> (String, Vec<String>) {
    let (mut tissue, _) = Tissue::from_polygon(&rectangle()).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut names = Vec::new();
    for _ in 0..steps {
        let records = DivisionPass::step(&mut tissue, rules, &mut rng).unwrap();
        names.extend(records.into_iter().map(|r| r.rule));
    }
    tissue.validate().unwrap();
    (serde_json::to_string(&tissue).unwrap(), names)
}

fn random_direction_rules() -> Vec<Box<dyn DivisionRule>> {
    vec![
        build_rule(&RuleSpec::RandomDirection {
            v_threshold: 0.3,
            l_frac: 1.0,
            l_threshold: 0.02,
            split: SplitConfig::default(),
        })
        .unwrap(),
    ]
}

#[test]
fn random_direction_run_replays_bit_identically() {
    let rules = random_direction_rules();
    let a = run(1234, 3, &rules);
    let b = run(1234, 3, &rules);
    assert_eq!(a.0, b.0, "meshes must be bit-identical");
    assert_eq!(a.1, b.1);
}

#[test]
fn different_seeds_take_different_random_cuts() {
    let rules = random_direction_rules();
    let a = run(1, 1, &rules);
    let b = run(2, 1, &rules);
    // One uniform angle draw per division; two seeds agreeing to the last
    // bit would mean the RNG is not being consulted.
    assert_ne!(a.0, b.0);
}

#[test]
fn random_anchor_run_replays_bit_identically() {
    let rules: Vec<Box<dyn DivisionRule>> = vec![
        build_rule(&RuleSpec::ShortestPath {
            v_threshold: 0.3,
            l_frac: 1.0,
            l_threshold: 0.02,
            anchor: AnchorPolicy::RandomInterior,
            split: SplitConfig::default(),
        })
        .unwrap(),
    ];
    let a = run(99, 2, &rules);
    let b = run(99, 2, &rules);
    assert_eq!(a.0, b.0);
}

#[test]
fn deterministic_rules_ignore_the_seed() {
    let rules: Vec<Box<dyn DivisionRule>> = vec![
        build_rule(&RuleSpec::ShortestPath {
            v_threshold: 0.3,
            l_frac: 1.0,
            l_threshold: 0.02,
            anchor: AnchorPolicy::CenterOfMass,
            split: SplitConfig::default(),
        })
        .unwrap(),
    ];
    // A fully deterministic rule must not depend on the RNG stream at all.
    let a = run(0, 2, &rules);
    let b = run(31_337, 2, &rules);
    assert_eq!(a.0, b.0);
    assert_eq!(a.1, b.1);
}
