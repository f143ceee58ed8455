//! Property-based tests for the division engine.
//!
//! Random convex polygons are generated by placing angle-jittered vertices
//! on a circle and applying an anisotropic scale; for every polygon where
//! the search finds a cut, division must preserve total area and mesh
//! validity, and attribute apportioning must conserve extensive totals.

use cytokinesis::prelude::*;
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

/// A convex polygon around the origin: angle-jittered vertices on a unit
/// circle (strictly increasing angles keep it simple and convex), then an
/// anisotropic scale to vary the aspect ratio.
#[allow(clippy::cast_precision_loss)]
fn convex_polygon() -> impl Strategy<Value = Vec<Point2>> {
    (4_usize..=9)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(0.1..0.9_f64, n),
                0.5..1.5_f64,
                0.5..1.5_f64,
            )
        })
        .prop_map(|(jitter, sx, sy)| {
            let n = jitter.len();
            jitter
                .iter()
                .enumerate()
                .map(|(i, &j)| {
                    let theta = std::f64::consts::TAU * (i as f64 + j) / n as f64;
                    Point2::new(sx * theta.cos(), sy * theta.sin())
                })
                .collect()
        })
}

fn search_config() -> SearchConfig {
    SearchConfig::new(1.0, 1e-3, AnchorPolicy::CenterOfMass).unwrap()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    /// Any accepted cut divides the cell into two valid daughters whose
    /// areas sum to the mother's.
    #[test]
    fn division_preserves_area_and_validity(points in convex_polygon()) {
        let (mut tissue, cell) = Tissue::from_polygon(&points).unwrap();
        let mother_area = tissue.cell_area(cell).unwrap();
        let cfg = search_config();
        let anchor = tissue.cell_centroid(cell).unwrap();

        if let Some(candidate) = shortest_path_candidate(&tissue, cell, anchor, &cfg) {
            let outcome = divide(&mut tissue, cell, &candidate, &cfg, &SplitConfig::default());
            prop_assert!(outcome.is_ok(), "accepted cut failed: {:?}", outcome.err());
            let outcome = outcome.unwrap();

            prop_assert!(tissue.validate().is_ok());
            let a = tissue.cell_area(outcome.mother).unwrap();
            let b = tissue.cell_area(outcome.daughter).unwrap();
            prop_assert!(a > 0.0 && b > 0.0);
            prop_assert!(
                ((a + b) - mother_area).abs() <= 1e-9 * mother_area.max(1.0),
                "area not conserved: {a} + {b} != {mother_area}"
            );
        }
    }

    /// The candidate itself respects the clearance constraint.
    #[test]
    fn accepted_candidates_clear_host_vertices(points in convex_polygon()) {
        let (tissue, cell) = Tissue::from_polygon(&points).unwrap();
        let cfg = search_config();
        let anchor = tissue.cell_centroid(cell).unwrap();

        if let Some(candidate) = shortest_path_candidate(&tissue, cell, anchor, &cfg) {
            for (wall_key, point) in [
                (candidate.wall_a, candidate.point_a),
                (candidate.wall_b, candidate.point_b),
            ] {
                let (v0, v1) = tissue.wall(wall_key).unwrap().vertices();
                for v in [v0, v1] {
                    let vp = tissue.vertex(v).unwrap().position;
                    prop_assert!(point.distance(vp) >= cfg.l_threshold);
                }
            }
        }
    }

    /// Volume triggers are pure functions of the mesh.
    #[test]
    fn volume_trigger_is_idempotent(points in convex_polygon(), v_threshold in 0.1..5.0_f64) {
        let (tissue, cell) = Tissue::from_polygon(&points).unwrap();
        let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
        let first = trigger.evaluate(&tissue, cell);
        prop_assert_eq!(trigger.evaluate(&tissue, cell), first);
        prop_assert_eq!(first, tissue.cell_area(cell).unwrap() >= v_threshold);
    }

    /// Area-weighted apportioning conserves the extensive total.
    #[test]
    fn extensive_split_conserves_the_total(points in convex_polygon(), amount in 0.0..100.0_f64) {
        let (mut tissue, cell) = Tissue::from_polygon(&points).unwrap();
        tissue.set_cell_attrs(cell, vec![amount]).unwrap();
        let cfg = search_config();
        let anchor = tissue.cell_centroid(cell).unwrap();
        let split = SplitConfig::new(vec![0], ExtensiveSplit::ProportionalToArea).unwrap();

        if let Some(candidate) = shortest_path_candidate(&tissue, cell, anchor, &cfg) {
            let outcome = divide(&mut tissue, cell, &candidate, &cfg, &split);
            prop_assert!(outcome.is_ok());
            let outcome = outcome.unwrap();
            let got = tissue.cell(outcome.mother).unwrap().attrs[0]
                + tissue.cell(outcome.daughter).unwrap().attrs[0];
            prop_assert!((got - amount).abs() <= 1e-9 * amount.max(1.0));
        }
    }
}
