//! Scenario tests for the canonical hexagon division.
//!
//! A regular hexagon at twice its division volume, center-of-mass anchor,
//! `l_frac` 1.0 and `l_threshold` at 5% of the wall length must divide with
//! exactly one new wall and two new vertices, conserve its area, and honor
//! the clearance constraint.

use approx::assert_relative_eq;
use cytokinesis::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Regular hexagon with unit circumradius (side length 1).
fn regular_hexagon() -> Vec<Point2> {
    (0..6)
        .map(|i| {
            let theta = std::f64::consts::TAU * f64::from(i) / 6.0;
            Point2::new(theta.cos(), theta.sin())
        })
        .collect()
}

const WALL_LENGTH: f64 = 1.0;
const L_THRESHOLD: f64 = 0.05 * WALL_LENGTH;

fn hexagon_rule(v_threshold: f64) -> Box<dyn DivisionRule> {
    build_rule(&RuleSpec::ShortestPath {
        v_threshold,
        l_frac: 1.0,
        l_threshold: L_THRESHOLD,
        anchor: AnchorPolicy::CenterOfMass,
        split: SplitConfig::default(),
    })
    .unwrap()
}

#[test]
fn oversized_hexagon_divides_once() {
    let (mut tissue, cell) = Tissue::from_polygon(&regular_hexagon()).unwrap();
    let area = tissue.cell_area(cell).unwrap();
    // The hexagon sits at exactly twice the division volume.
    let rule = hexagon_rule(area / 2.0);
    let mut rng = StdRng::seed_from_u64(11);

    let records = DivisionPass::step(&mut tissue, &[rule], &mut rng).unwrap();

    assert_eq!(records.len(), 1);
    tissue.validate().unwrap();
    // Two wall splits (each net +1) plus the one new dividing wall.
    assert_eq!(tissue.number_of_walls(), 9);
    // Exactly two new vertices.
    assert_eq!(tissue.number_of_vertices(), 8);
    assert_eq!(tissue.number_of_cells(), 2);

    let record = &records[0];
    let area_a = tissue.cell_area(record.mother).unwrap();
    let area_b = tissue.cell_area(record.daughter).unwrap();
    assert_relative_eq!(area_a + area_b, area, epsilon = 1e-9);
    // The symmetric shortest path splits the hexagon in half.
    assert_relative_eq!(area_a, area / 2.0, epsilon = 1e-6);
}

#[test]
fn shortest_cut_runs_between_opposite_walls() {
    let (tissue, cell) = Tissue::from_polygon(&regular_hexagon()).unwrap();
    let cfg = SearchConfig::new(1.0, L_THRESHOLD, AnchorPolicy::CenterOfMass).unwrap();
    let anchor = tissue.cell_centroid(cell).unwrap();

    let candidate = shortest_path_candidate(&tissue, cell, anchor, &cfg).unwrap();
    // Opposite-wall midpoint cut: twice the apothem.
    assert_relative_eq!(candidate.distance, 3.0_f64.sqrt(), epsilon = 1e-6);
    // The midline passes through the center.
    let mid = Point2::midpoint(candidate.point_a, candidate.point_b);
    assert_relative_eq!(mid.x, anchor.x, epsilon = 1e-6);
    assert_relative_eq!(mid.y, anchor.y, epsilon = 1e-6);
}

#[test]
fn accepted_cut_points_honor_the_clearance() {
    let (tissue, cell) = Tissue::from_polygon(&regular_hexagon()).unwrap();
    let cfg = SearchConfig::new(1.0, L_THRESHOLD, AnchorPolicy::CenterOfMass).unwrap();
    let anchor = tissue.cell_centroid(cell).unwrap();
    let candidate = shortest_path_candidate(&tissue, cell, anchor, &cfg).unwrap();

    for (wall_key, point) in [
        (candidate.wall_a, candidate.point_a),
        (candidate.wall_b, candidate.point_b),
    ] {
        let (v0, v1) = tissue.wall(wall_key).unwrap().vertices();
        for v in [v0, v1] {
            let vertex = tissue.vertex(v).unwrap().position;
            assert!(
                point.distance(vertex) >= L_THRESHOLD,
                "cut point {point:?} too close to vertex {vertex:?}"
            );
        }
    }
}

#[test]
fn undersized_hexagon_never_divides() {
    let (mut tissue, cell) = Tissue::from_polygon(&regular_hexagon()).unwrap();
    let area = tissue.cell_area(cell).unwrap();
    // Threshold just above the current volume.
    let rule = hexagon_rule(area * 1.01);
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..10 {
        let records = DivisionPass::step(&mut tissue, std::slice::from_ref(&rule), &mut rng)
            .unwrap();
        assert!(records.is_empty());
    }
    assert_eq!(tissue.number_of_cells(), 1);
    assert_eq!(tissue.number_of_walls(), 6);
    tissue.validate().unwrap();
}
