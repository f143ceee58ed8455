//! Division-plane search: selecting the new wall for a triggered cell.
//!
//! Two search modes cover every rule variant:
//!
//! - **Pairwise shortest path** ([`shortest_path_candidate`]): every
//!   unordered pair of distinct boundary walls is considered. The cut on the
//!   first wall is parametrized by `s in [0, 1]`; the constraint that the
//!   path passes through the anchor point determines the paired point on the
//!   second wall, and the total path length is minimized per pair with a
//!   bounded 1-D minimizer (coarse grid bracket, then golden-section
//!   refinement). The globally shortest accepted candidate wins, ties broken
//!   by lowest wall-pair position on the boundary.
//! - **Directed cut** ([`directed_candidate`]): a fixed direction through
//!   the anchor is intersected with the boundary; the two crossing walls
//!   yield the cut points directly, with no 1-D search.
//!
//! Candidate rejection is always local: a degenerate wall, a cut point
//! closer than the clearance threshold to a host-wall vertex, or an anchor
//! the path cannot reach skips that candidate only. An anchor outside the
//! cell (a concave cell can place its centroid in the notch) yields no
//! candidate at all, and a cut chord that would leave the interior is
//! rejected, so the mutator only ever receives chords of the polygon. An
//! empty result defers the division to the next step; it is a normal
//! outcome, not an error.
//!
//! Determinism: given identical state (and, for the random-anchor policy, an
//! identical RNG draw) the search returns an identical candidate. Iteration
//! runs in boundary order, and the minimizer is derivative-free and
//! branch-stable.

use rand::Rng;

use crate::core::tissue::{CellKey, Tissue, VertexKey, WallKey};
use crate::division::config::{AnchorPolicy, SearchConfig};
use crate::geometry::point::Point2;
use crate::geometry::polygon::{self, line_segment_intersection};

/// Walls shorter than this are never cut.
const MIN_WALL_LENGTH: f64 = 1e-9;

/// Paths shorter than this are degenerate (cut collapses to a point).
const MIN_PATH_LENGTH: f64 = 1e-9;

/// Coarse grid resolution of the per-pair 1-D scan.
const GRID_SAMPLES: usize = 32;

/// Golden-section refinement iterations; enough for ~1e-12 brackets on a
/// unit interval.
const GOLDEN_ITERATIONS: usize = 60;

/// A proposed dividing path between two points on the cell boundary.
///
/// Transient: produced by the search, consumed immediately by the topology
/// mutator, never stored across steps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Total length of the cut path.
    pub distance: f64,
    /// Host wall of the first cut point.
    pub wall_a: WallKey,
    /// Host wall of the second cut point.
    pub wall_b: WallKey,
    /// First cut point, on `wall_a`.
    pub point_a: Point2,
    /// Second cut point, on `wall_b`.
    pub point_b: Point2,
}

/// A boundary wall with the endpoints ordered in the cell's traversal
/// direction.
#[derive(Clone, Copy, Debug)]
struct OrientedWall {
    key: WallKey,
    start_vertex: VertexKey,
    end_vertex: VertexKey,
    start: Point2,
    end: Point2,
}

impl OrientedWall {
    fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    fn point_at(&self, s: f64) -> Point2 {
        Point2::lerp(self.start, self.end, s)
    }

    /// The endpoint vertex within `tolerance` of `p`, if any.
    fn merge_vertex(&self, p: Point2, tolerance: f64) -> Option<VertexKey> {
        if p.distance(self.start) <= tolerance {
            Some(self.start_vertex)
        } else if p.distance(self.end) <= tolerance {
            Some(self.end_vertex)
        } else {
            None
        }
    }
}

/// The cell boundary as oriented walls, or `None` when the boundary is
/// unreadable (a skip, not an error, at search level).
fn oriented_boundary(tissue: &Tissue, cell: CellKey) -> Option<Vec<OrientedWall>> {
    let loop_vertices = tissue.cell_vertex_loop(cell).ok()?;
    let walls = tissue.cell(cell)?.walls();
    let n = walls.len();
    let mut boundary = Vec::with_capacity(n);
    for i in 0..n {
        let start_vertex = loop_vertices[i];
        let end_vertex = loop_vertices[(i + 1) % n];
        boundary.push(OrientedWall {
            key: walls[i],
            start_vertex,
            end_vertex,
            start: tissue.vertex(start_vertex)?.position,
            end: tissue.vertex(end_vertex)?.position,
        });
    }
    Some(boundary)
}

/// Resolves the anchor point for a search.
///
/// [`AnchorPolicy::CenterOfMass`] consumes no randomness;
/// [`AnchorPolicy::RandomInterior`] draws one uniform interior point from
/// `rng`. Returns `None` for degenerate cells.
pub fn resolve_anchor<R: Rng + ?Sized>(
    tissue: &Tissue,
    cell: CellKey,
    policy: AnchorPolicy,
    rng: &mut R,
) -> Option<Point2> {
    match policy {
        AnchorPolicy::CenterOfMass => tissue.cell_centroid(cell).ok(),
        AnchorPolicy::RandomInterior => {
            let points = tissue.cell_polygon(cell).ok()?;
            polygon::sample_interior(&points, rng).ok()
        }
    }
}

/// Path from `p` through `anchor`, extended to the supporting line of the
/// segment `c -> d`.
///
/// Returns `(t, q, distance)` where `q = lerp(c, d, t)` with `t in [0, 1]`,
/// and the anchor lies strictly between `p` and `q`. `None` when the
/// geometry makes the constraint unsatisfiable (parallel lines, anchor on
/// the wrong side, intersection off the segment).
fn path_through_anchor(
    p: Point2,
    anchor: Point2,
    c: Point2,
    d: Point2,
) -> Option<(f64, Point2, f64)> {
    let r = anchor - p;
    if r.norm_squared() < MIN_PATH_LENGTH * MIN_PATH_LENGTH {
        return None;
    }
    let e = d - c;
    let denom = r.cross(e);
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let cp = c - p;
    // p + lambda * r = c + t * e; anchor sits at lambda = 1, so the anchor
    // lies strictly between p and q exactly when lambda > 1.
    let lambda = cp.cross(e) / denom;
    let t = cp.cross(r) / denom;
    if lambda <= 1.0 || !(0.0..=1.0).contains(&t) {
        return None;
    }
    let q = Point2::lerp(c, d, t);
    Some((t, q, p.distance(q)))
}

/// Path length through the anchor for a cut at parameter `s` on `wall_a`,
/// or infinity when infeasible. The 1-D objective of the per-pair search.
fn pair_objective(wall_a: &OrientedWall, wall_b: &OrientedWall, anchor: Point2, s: f64) -> f64 {
    let p = wall_a.point_at(s);
    path_through_anchor(p, anchor, wall_b.start, wall_b.end)
        .map_or(f64::INFINITY, |(_, _, distance)| distance)
}

/// Bounded 1-D minimization of the per-pair objective: coarse grid to
/// bracket the feasible minimum, golden-section refinement inside the
/// bracket. Returns the minimizing `s`, or `None` when no grid sample is
/// feasible.
fn minimize_pair(wall_a: &OrientedWall, wall_b: &OrientedWall, anchor: Point2) -> Option<f64> {
    let mut best_index = None;
    let mut best_value = f64::INFINITY;
    for i in 0..=GRID_SAMPLES {
        #[allow(clippy::cast_precision_loss)]
        let s = i as f64 / GRID_SAMPLES as f64;
        let value = pair_objective(wall_a, wall_b, anchor, s);
        if value < best_value {
            best_value = value;
            best_index = Some(i);
        }
    }
    let best_index = best_index?;

    #[allow(clippy::cast_precision_loss)]
    let mut lo = best_index.saturating_sub(1) as f64 / GRID_SAMPLES as f64;
    #[allow(clippy::cast_precision_loss)]
    let mut hi = ((best_index + 1).min(GRID_SAMPLES)) as f64 / GRID_SAMPLES as f64;

    // Golden-section; infeasible evaluations return infinity, which simply
    // steers the bracket back toward the feasible grid sample.
    let inv_phi = 0.5 * (5.0_f64.sqrt() - 1.0);
    let mut x1 = hi - inv_phi * (hi - lo);
    let mut x2 = lo + inv_phi * (hi - lo);
    let mut f1 = pair_objective(wall_a, wall_b, anchor, x1);
    let mut f2 = pair_objective(wall_a, wall_b, anchor, x2);
    for _ in 0..GOLDEN_ITERATIONS {
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - inv_phi * (hi - lo);
            f1 = pair_objective(wall_a, wall_b, anchor, x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + inv_phi * (hi - lo);
            f2 = pair_objective(wall_a, wall_b, anchor, x2);
        }
    }
    let refined = 0.5 * (lo + hi);

    // Keep whichever of grid best and refined point is feasible and shorter.
    #[allow(clippy::cast_precision_loss)]
    let grid_s = best_index as f64 / GRID_SAMPLES as f64;
    let refined_value = pair_objective(wall_a, wall_b, anchor, refined);
    if refined_value.is_finite() && refined_value <= best_value {
        Some(refined)
    } else {
        Some(grid_s)
    }
}

/// Clearance test: the cut point must keep `l_threshold` distance from both
/// pre-existing vertices of its host wall.
fn clears_vertices(wall: &OrientedWall, p: Point2, l_threshold: f64) -> bool {
    p.distance(wall.start) >= l_threshold && p.distance(wall.end) >= l_threshold
}

/// Rejects cuts that would produce a two-wall daughter: both cut points
/// merging onto vertices that are already joined by a boundary wall.
fn forms_two_gon(
    boundary: &[OrientedWall],
    wall_a: &OrientedWall,
    wall_b: &OrientedWall,
    p: Point2,
    q: Point2,
    tolerance: f64,
) -> bool {
    let (Some(va), Some(vb)) = (
        wall_a.merge_vertex(p, tolerance),
        wall_b.merge_vertex(q, tolerance),
    ) else {
        return false;
    };
    if va == vb {
        return true;
    }
    boundary.iter().any(|w| {
        (w.start_vertex == va && w.end_vertex == vb)
            || (w.start_vertex == vb && w.end_vertex == va)
    })
}

/// Point-in-cell test on the oriented boundary. A concave cell can place
/// its centroid outside itself, and a path search from such an anchor would
/// cut straight through exterior space.
fn anchor_inside(boundary: &[OrientedWall], anchor: Point2) -> bool {
    let positions: Vec<Point2> = boundary.iter().map(|wall| wall.start).collect();
    polygon::contains(&positions, anchor)
}

/// True when the open chord `p -> q` crosses the boundary away from its own
/// endpoints. Such a cut leaves the cell interior (possible on concave
/// cells) and must be rejected; the mutator assumes interior chords.
fn chord_crosses_boundary(boundary: &[OrientedWall], p: Point2, q: Point2) -> bool {
    let direction = q - p;
    boundary.iter().any(|wall| {
        line_segment_intersection(p, direction, wall.start, wall.end).is_some_and(|(t, _)| {
            if !(0.0..=1.0).contains(&t) {
                return false;
            }
            // Touching the host walls at the cut points themselves is not a
            // crossing.
            let x = p + direction * t;
            x.distance(p) > MIN_PATH_LENGTH && x.distance(q) > MIN_PATH_LENGTH
        })
    })
}

/// Validates a fully-positioned cut against the acceptance constraints and
/// assembles the [`Candidate`].
fn accept(
    boundary: &[OrientedWall],
    wall_a: &OrientedWall,
    wall_b: &OrientedWall,
    p: Point2,
    q: Point2,
    cfg: &SearchConfig,
) -> Option<Candidate> {
    let distance = p.distance(q);
    if distance < MIN_PATH_LENGTH {
        return None;
    }
    if !clears_vertices(wall_a, p, cfg.l_threshold) || !clears_vertices(wall_b, q, cfg.l_threshold)
    {
        return None;
    }
    if forms_two_gon(boundary, wall_a, wall_b, p, q, cfg.vertex_merge_tolerance) {
        return None;
    }
    if chord_crosses_boundary(boundary, p, q) {
        return None;
    }
    Some(Candidate {
        distance,
        wall_a: wall_a.key,
        wall_b: wall_b.key,
        point_a: p,
        point_b: q,
    })
}

/// Pairwise shortest-path search through the anchor point.
///
/// Returns the accepted candidate with globally minimal path length, ties
/// broken by the lowest wall-pair position on the boundary, or `None` when
/// the anchor lies outside the cell or every pair is rejected (the division
/// is then deferred).
#[must_use]
pub fn shortest_path_candidate(
    tissue: &Tissue,
    cell: CellKey,
    anchor: Point2,
    cfg: &SearchConfig,
) -> Option<Candidate> {
    let boundary = oriented_boundary(tissue, cell)?;
    if !anchor_inside(&boundary, anchor) {
        return None;
    }
    let n = boundary.len();
    let mut best: Option<Candidate> = None;

    for i in 0..n {
        let wall_a = &boundary[i];
        if wall_a.length() < MIN_WALL_LENGTH {
            continue;
        }
        for wall_b in boundary.iter().skip(i + 1) {
            if wall_b.length() < MIN_WALL_LENGTH {
                continue;
            }
            let Some(s) = minimize_pair(wall_a, wall_b, anchor) else {
                continue;
            };
            let p = wall_a.point_at(s);
            let Some((_, q, _)) = path_through_anchor(p, anchor, wall_b.start, wall_b.end) else {
                continue;
            };
            let Some(candidate) = accept(&boundary, wall_a, wall_b, p, q, cfg) else {
                continue;
            };
            // Strict comparison keeps the earliest (lowest-index) pair on
            // ties, independent of later candidates.
            if best.is_none_or(|b| candidate.distance < b.distance) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Directed cut: intersects the line through `anchor` along `direction`
/// with the cell boundary and cuts the two crossing walls.
///
/// Returns `None` when the direction is degenerate, the anchor does not see
/// the boundary on both sides (e.g. it lies outside the cell), or the
/// crossing points violate the acceptance constraints.
#[must_use]
pub fn directed_candidate(
    tissue: &Tissue,
    cell: CellKey,
    anchor: Point2,
    direction: Point2,
    cfg: &SearchConfig,
) -> Option<Candidate> {
    let direction = direction.normalized()?;
    let boundary = oriented_boundary(tissue, cell)?;
    if !anchor_inside(&boundary, anchor) {
        return None;
    }

    // Closest boundary crossing on each side of the anchor. Crossings at a
    // shared vertex are reported by both incident walls; keeping the
    // closest one per side also dedupes those.
    let mut forward: Option<(usize, f64, Point2)> = None;
    let mut backward: Option<(usize, f64, Point2)> = None;
    for (i, wall) in boundary.iter().enumerate() {
        if wall.length() < MIN_WALL_LENGTH {
            continue;
        }
        let Some((t, _)) = line_segment_intersection(anchor, direction, wall.start, wall.end)
        else {
            continue;
        };
        let point = anchor + direction * t;
        if t > MIN_PATH_LENGTH {
            if forward.is_none_or(|(_, best_t, _)| t < best_t) {
                forward = Some((i, t, point));
            }
        } else if t < -MIN_PATH_LENGTH && backward.is_none_or(|(_, best_t, _)| t > best_t) {
            backward = Some((i, t, point));
        }
    }

    let (fi, _, fp) = forward?;
    let (bi, _, bp) = backward?;
    if fi == bi {
        return None;
    }
    // Order the candidate by boundary position for deterministic output.
    let ((ai, ap), (bj, bq)) = if fi < bi {
        ((fi, fp), (bi, bp))
    } else {
        ((bi, bp), (fi, fp))
    };
    accept(&boundary, &boundary[ai], &boundary[bj], ap, bq, cfg)
}
