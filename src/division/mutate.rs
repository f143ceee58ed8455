//! Topology mutation: carving one cell into two along an accepted cut.
//!
//! [`divide`] is the only entry point. It takes a [`Candidate`] fresh from
//! the search, splits (or reuses) a boundary vertex at each cut point,
//! inserts the dividing wall, partitions the mother's wall loop between the
//! mother (which keeps its key) and a newly inserted daughter, rewires
//! wall/cell incidence, and apportions the cell attributes.
//!
//! A successful call leaves the tissue structurally valid; both daughters
//! are re-validated before returning. A failed call means a candidate went
//! stale or a bug corrupted the mesh mid-surgery, and the tissue must be
//! considered unusable; callers treat [`DivisionError`] as fatal rather
//! than retrying.

use thiserror::Error;

/// Floor for the dividing wall's resting length, so a short cut under a
/// small `l_frac` never produces a mechanically inert wall.
const MIN_RESTING_LENGTH: f64 = 1e-9;

use crate::core::cell::{Cell, WallLoop};
use crate::core::tissue::{CellKey, Tissue, TissueValidationError, VertexKey, WallKey};
use crate::core::wall::{Wall, WallError};
use crate::division::config::{ExtensiveSplit, RestingLengthRule, SearchConfig, SplitConfig};
use crate::division::search::Candidate;
use crate::geometry::point::Point2;

/// Errors from applying a division cut.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DivisionError {
    /// The candidate references a wall that is dead or no longer on the
    /// cell's boundary. The tissue changed between search and apply.
    #[error("candidate wall {wall:?} is stale or not on the cell boundary")]
    StaleCandidate {
        /// The offending wall handle.
        wall: WallKey,
    },
    /// The two cut points resolve to the same vertex, or the cut would
    /// leave a daughter with fewer than three walls.
    #[error("division cut is degenerate (coincident or adjacent cut points)")]
    DegenerateCut,
    /// A configured attribute index does not exist on the cell.
    #[error("attribute index {index} out of bounds for {len} cell attributes")]
    AttributeIndexOutOfBounds {
        /// The index that was requested.
        index: usize,
        /// The cell's attribute count.
        len: usize,
    },
    /// A structural invariant failed during or after the mutation.
    #[error(transparent)]
    Topology(#[from] TissueValidationError),
    /// Wall incidence bookkeeping failed mid-surgery.
    #[error(transparent)]
    Incidence(#[from] WallError),
}

/// What a completed division produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivisionOutcome {
    /// The daughter that kept the mother's key.
    pub mother: CellKey,
    /// The newly inserted daughter.
    pub daughter: CellKey,
    /// The wall separating the two daughters.
    pub dividing_wall: WallKey,
    /// Vertices created by the cut: two when both cut points split a wall,
    /// fewer when a cut point merged onto an existing vertex.
    pub new_vertices: Vec<VertexKey>,
}

/// Resolves one cut point to a boundary vertex: merge onto an existing
/// endpoint when within tolerance, otherwise split the host wall.
fn resolve_cut(
    tissue: &mut Tissue,
    cell: CellKey,
    wall_key: WallKey,
    point: Point2,
    search: &SearchConfig,
    rule: RestingLengthRule,
    created: &mut Vec<VertexKey>,
) -> Result<VertexKey, DivisionError> {
    let wall = tissue
        .wall(wall_key)
        .ok_or(DivisionError::StaleCandidate { wall: wall_key })?;
    if !wall.has_cell(cell) {
        return Err(DivisionError::StaleCandidate { wall: wall_key });
    }
    let (v0, v1) = wall.vertices();
    let resting = wall.resting_length;
    let p0 = tissue
        .vertex(v0)
        .ok_or(DivisionError::StaleCandidate { wall: wall_key })?
        .position;
    let p1 = tissue
        .vertex(v1)
        .ok_or(DivisionError::StaleCandidate { wall: wall_key })?
        .position;

    if point.distance(p0) <= search.vertex_merge_tolerance {
        return Ok(v0);
    }
    if point.distance(p1) <= search.vertex_merge_tolerance {
        return Ok(v1);
    }

    let full = p0.distance(p1);
    if full < f64::EPSILON {
        return Err(DivisionError::DegenerateCut);
    }
    let (d0, d1) = (point.distance(p0), point.distance(p1));
    let sub_resting = match rule {
        RestingLengthRule::Arclength => (d0, d1),
        RestingLengthRule::Scaled => (resting * d0 / full, resting * d1 / full),
    };
    let split = tissue.split_wall(wall_key, point, sub_resting)?;
    created.push(split.vertex);
    Ok(split.vertex)
}

/// Element-wise average of two attribute vectors; the shorter one is
/// treated as zero-padded. Seeds the dividing wall's attributes from its
/// two host walls.
fn averaged_attrs(a: &[f64], b: &[f64]) -> Vec<f64> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0.0);
            let y = b.get(i).copied().unwrap_or(0.0);
            0.5 * (x + y)
        })
        .collect()
}

fn checked_index(index: usize, len: usize) -> Result<usize, DivisionError> {
    if index < len {
        Ok(index)
    } else {
        Err(DivisionError::AttributeIndexOutOfBounds { index, len })
    }
}

/// Splits `cell` in two along `candidate`.
///
/// The mother keeps its key and receives the boundary arc from the first
/// cut vertex to the second; the daughter is newly inserted and receives
/// the complementary arc. Both close with the dividing wall, whose resting
/// length is `l_frac` times its actual length (floored at a small positive
/// minimum) and whose attributes average those of the two cut host walls.
///
/// Attribute apportioning follows `split`: extensive attributes are divided
/// between the daughters (equal halves or in proportion to daughter areas),
/// a configured cell-age slot resets to zero in both, and a configured
/// birth-volume slot records each daughter's own area. All other attributes
/// are copied to the daughter unchanged.
///
/// # Errors
///
/// Returns [`DivisionError`] when the candidate is stale, the cut is
/// degenerate, an attribute index is out of bounds, or a structural
/// invariant fails. On error the tissue may be partially mutated; treat it
/// as unusable.
pub fn divide(
    tissue: &mut Tissue,
    cell: CellKey,
    candidate: &Candidate,
    search: &SearchConfig,
    split: &SplitConfig,
) -> Result<DivisionOutcome, DivisionError> {
    let attrs_before = tissue
        .cell(cell)
        .ok_or(TissueValidationError::UnknownCell { cell })?
        .attrs
        .clone();

    let mut new_vertices = Vec::with_capacity(2);
    let rule = split.resting_length_rule;
    let va = resolve_cut(
        tissue,
        cell,
        candidate.wall_a,
        candidate.point_a,
        search,
        rule,
        &mut new_vertices,
    )?;
    let vb = resolve_cut(
        tissue,
        cell,
        candidate.wall_b,
        candidate.point_b,
        search,
        rule,
        &mut new_vertices,
    )?;
    if va == vb {
        return Err(DivisionError::DegenerateCut);
    }

    // Locate the cut vertices on the (possibly just re-spliced) boundary.
    let loop_vertices = tissue.cell_vertex_loop(cell)?;
    let ia = loop_vertices
        .iter()
        .position(|&v| v == va)
        .ok_or(DivisionError::DegenerateCut)?;
    let ib = loop_vertices
        .iter()
        .position(|&v| v == vb)
        .ok_or(DivisionError::DegenerateCut)?;
    let (i, j) = if ia < ib { (ia, ib) } else { (ib, ia) };
    let n = loop_vertices.len();
    // Wall k runs from loop vertex k to k+1, so the arcs are walls [i, j)
    // and [j, n) + [0, i). Each daughter needs two boundary walls plus the
    // dividing wall to form a polygon.
    if j - i < 2 || n - (j - i) < 2 {
        return Err(DivisionError::DegenerateCut);
    }

    let walls: Vec<WallKey> = tissue
        .cell(cell)
        .ok_or(TissueValidationError::UnknownCell { cell })?
        .walls()
        .to_vec();

    let pa = tissue
        .vertex(loop_vertices[i])
        .ok_or(DivisionError::DegenerateCut)?
        .position;
    let pb = tissue
        .vertex(loop_vertices[j])
        .ok_or(DivisionError::DegenerateCut)?
        .position;
    let host_a = tissue
        .wall(walls[i])
        .ok_or(TissueValidationError::UnknownWall { wall: walls[i] })?;
    let host_b = tissue
        .wall(walls[j % n])
        .ok_or(TissueValidationError::UnknownWall { wall: walls[j % n] })?;
    let wall_attrs = averaged_attrs(&host_a.attrs, &host_b.attrs);

    let resting = (search.l_frac * pa.distance(pb)).max(MIN_RESTING_LENGTH);
    let mut dividing = Wall::new(loop_vertices[i], loop_vertices[j], resting)
        .map_err(|_| DivisionError::DegenerateCut)?;
    dividing.attrs = wall_attrs;
    let dividing_wall = tissue.insert_wall(dividing);

    let mother_loop: WallLoop = walls[i..j]
        .iter()
        .copied()
        .chain(std::iter::once(dividing_wall))
        .collect();
    let daughter_loop: WallLoop = walls[j..]
        .iter()
        .chain(walls[..i].iter())
        .copied()
        .chain(std::iter::once(dividing_wall))
        .collect();

    if let Some(c) = tissue.cell_mut(cell) {
        c.set_walls(mother_loop);
    }
    let daughter = tissue.insert_cell(Cell::with_attrs(daughter_loop.clone(), attrs_before.clone()));

    // Rewire incidence: the dividing wall borders both daughters; the
    // complementary arc now belongs to the new daughter.
    if let Some(w) = tissue.wall_mut(dividing_wall) {
        w.attach_cell(cell)?;
        w.attach_cell(daughter)?;
    }
    for &wall_key in daughter_loop.iter().filter(|&&w| w != dividing_wall) {
        tissue
            .wall_mut(wall_key)
            .ok_or(TissueValidationError::UnknownWall { wall: wall_key })?
            .replace_cell(cell, daughter)?;
    }

    tissue.validate_cell(cell)?;
    tissue.validate_cell(daughter)?;

    // Apportion attributes now that both polygons are measurable.
    let area_a = tissue.cell_area(cell)?;
    let area_b = tissue.cell_area(daughter)?;
    let mut attrs_a = attrs_before.clone();
    let mut attrs_b = attrs_before;
    for &index in &split.extensive_indices {
        let index = checked_index(index, attrs_a.len())?;
        let weight = match split.extensive_split {
            ExtensiveSplit::EqualHalves => 0.5,
            ExtensiveSplit::ProportionalToArea => {
                let total = area_a + area_b;
                if total > 0.0 { area_a / total } else { 0.5 }
            }
        };
        let total = attrs_a[index];
        attrs_a[index] = total * weight;
        attrs_b[index] = total * (1.0 - weight);
    }
    if let Some(index) = split.time_index {
        let index = checked_index(index, attrs_a.len())?;
        attrs_a[index] = 0.0;
        attrs_b[index] = 0.0;
    }
    if let Some(index) = split.birth_volume_index {
        let index = checked_index(index, attrs_a.len())?;
        attrs_a[index] = area_a;
        attrs_b[index] = area_b;
    }
    tissue.set_cell_attrs(cell, attrs_a)?;
    tissue.set_cell_attrs(daughter, attrs_b)?;

    Ok(DivisionOutcome {
        mother: cell,
        daughter,
        dividing_wall,
        new_vertices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::division::config::AnchorPolicy;
    use crate::division::search::{directed_candidate, shortest_path_candidate};
    use crate::geometry::point::Point2;
    use approx::assert_relative_eq;

    fn unit_square() -> (Tissue, CellKey) {
        Tissue::from_polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap()
    }

    fn search_cfg() -> SearchConfig {
        SearchConfig::new(1.0, 0.05, AnchorPolicy::CenterOfMass).unwrap()
    }

    #[test]
    fn midline_division_conserves_area_and_topology() {
        let (mut tissue, cell) = unit_square();
        let anchor = tissue.cell_centroid(cell).unwrap();
        let cfg = search_cfg();
        let candidate = shortest_path_candidate(&tissue, cell, anchor, &cfg).unwrap();

        let outcome = divide(&mut tissue, cell, &candidate, &cfg, &SplitConfig::default()).unwrap();

        tissue.validate().unwrap();
        assert_eq!(outcome.mother, cell);
        assert_eq!(tissue.number_of_cells(), 2);
        // Two wall splits plus one dividing wall.
        assert_eq!(tissue.number_of_walls(), 7);
        assert_eq!(tissue.number_of_vertices(), 6);
        assert_eq!(outcome.new_vertices.len(), 2);

        let area_a = tissue.cell_area(outcome.mother).unwrap();
        let area_b = tissue.cell_area(outcome.daughter).unwrap();
        assert_relative_eq!(area_a + area_b, 1.0, epsilon = 1e-9);
        assert_relative_eq!(area_a, 0.5, epsilon = 1e-6);

        let dw = tissue.wall(outcome.dividing_wall).unwrap();
        assert!(dw.has_cell(outcome.mother) && dw.has_cell(outcome.daughter));
        // With l_frac = 1 the dividing wall rests at its actual length.
        assert_relative_eq!(dw.resting_length, 1.0, epsilon = 1e-6);
        // Daughters are appended to the deterministic ordering.
        assert_eq!(tissue.cell_order(), &[outcome.mother, outcome.daughter]);
    }

    #[test]
    fn extensive_attribute_splits_in_equal_halves() {
        let (mut tissue, cell) = unit_square();
        tissue.set_cell_attrs(cell, vec![10.0]).unwrap();
        let anchor = tissue.cell_centroid(cell).unwrap();
        let cfg = search_cfg();
        let candidate = shortest_path_candidate(&tissue, cell, anchor, &cfg).unwrap();
        let split = SplitConfig::new(vec![0], ExtensiveSplit::EqualHalves).unwrap();

        let outcome = divide(&mut tissue, cell, &candidate, &cfg, &split).unwrap();
        assert_relative_eq!(tissue.cell(outcome.mother).unwrap().attrs[0], 5.0);
        assert_relative_eq!(tissue.cell(outcome.daughter).unwrap().attrs[0], 5.0);
    }

    #[test]
    fn extensive_attribute_splits_by_area() {
        let (mut tissue, cell) = unit_square();
        tissue.set_cell_attrs(cell, vec![8.0]).unwrap();
        let cfg = search_cfg();
        // Vertical cut at x = 0.25: areas 0.25 and 0.75.
        let candidate = directed_candidate(
            &tissue,
            cell,
            Point2::new(0.25, 0.5),
            Point2::new(0.0, 1.0),
            &cfg,
        )
        .unwrap();
        let split = SplitConfig::new(vec![0], ExtensiveSplit::ProportionalToArea).unwrap();

        let outcome = divide(&mut tissue, cell, &candidate, &cfg, &split).unwrap();
        let a = tissue.cell_area(outcome.mother).unwrap();
        let b = tissue.cell_area(outcome.daughter).unwrap();
        assert_relative_eq!(a + b, 1.0, epsilon = 1e-9);
        assert_relative_eq!(
            tissue.cell(outcome.mother).unwrap().attrs[0],
            8.0 * a,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            tissue.cell(outcome.daughter).unwrap().attrs[0],
            8.0 * b,
            epsilon = 1e-9
        );
    }

    #[test]
    fn age_resets_and_birth_volume_is_recorded() {
        let (mut tissue, cell) = unit_square();
        tissue.set_cell_attrs(cell, vec![3.5, 0.9, 42.0]).unwrap();
        let anchor = tissue.cell_centroid(cell).unwrap();
        let cfg = search_cfg();
        let candidate = shortest_path_candidate(&tissue, cell, anchor, &cfg).unwrap();
        let split = SplitConfig::default()
            .with_time_index(0)
            .with_birth_volume_index(1);

        let outcome = divide(&mut tissue, cell, &candidate, &cfg, &split).unwrap();
        for daughter in [outcome.mother, outcome.daughter] {
            let attrs = &tissue.cell(daughter).unwrap().attrs;
            assert_relative_eq!(attrs[0], 0.0);
            assert_relative_eq!(attrs[1], tissue.cell_area(daughter).unwrap(), epsilon = 1e-9);
            // Non-configured attributes are carried unchanged.
            assert_relative_eq!(attrs[2], 42.0);
        }
    }

    #[test]
    fn cut_points_on_corners_reuse_the_vertices() {
        let (mut tissue, cell) = unit_square();
        let walls = tissue.cell(cell).unwrap().walls().to_vec();
        // Diagonal cut reusing the (0,0) and (1,1) corners.
        let candidate = Candidate {
            distance: 2.0_f64.sqrt(),
            wall_a: walls[0],
            wall_b: walls[2],
            point_a: Point2::new(0.0, 0.0),
            point_b: Point2::new(1.0, 1.0),
        };
        let cfg = SearchConfig::new(1.0, 0.0, AnchorPolicy::CenterOfMass).unwrap();

        let outcome = divide(&mut tissue, cell, &candidate, &cfg, &SplitConfig::default()).unwrap();
        tissue.validate().unwrap();
        assert!(outcome.new_vertices.is_empty());
        assert_eq!(tissue.number_of_vertices(), 4);
        assert_eq!(tissue.number_of_walls(), 5);
        assert_relative_eq!(tissue.cell_area(outcome.mother).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(tissue.cell_area(outcome.daughter).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn coincident_cut_points_are_rejected() {
        let (mut tissue, cell) = unit_square();
        let walls = tissue.cell(cell).unwrap().walls().to_vec();
        let candidate = Candidate {
            distance: 0.0,
            wall_a: walls[0],
            wall_b: walls[1],
            point_a: Point2::new(1.0, 0.0),
            point_b: Point2::new(1.0, 0.0),
        };
        let cfg = SearchConfig::new(1.0, 0.0, AnchorPolicy::CenterOfMass).unwrap();
        assert_eq!(
            divide(&mut tissue, cell, &candidate, &cfg, &SplitConfig::default()),
            Err(DivisionError::DegenerateCut)
        );
    }

    #[test]
    fn stale_wall_handle_is_rejected() {
        let (mut tissue, cell) = unit_square();
        let wall = tissue.cell(cell).unwrap().walls()[0];
        let other = tissue.cell(cell).unwrap().walls()[2];
        tissue.split_wall(wall, Point2::new(0.5, 0.0), (0.5, 0.5)).unwrap();
        let candidate = Candidate {
            distance: 1.0,
            wall_a: wall,
            wall_b: other,
            point_a: Point2::new(0.5, 0.0),
            point_b: Point2::new(0.5, 1.0),
        };
        let cfg = search_cfg();
        assert_eq!(
            divide(&mut tissue, cell, &candidate, &cfg, &SplitConfig::default()),
            Err(DivisionError::StaleCandidate { wall })
        );
    }

    #[test]
    fn scaled_resting_lengths_follow_the_host_wall() {
        let (mut tissue, cell) = unit_square();
        let anchor = tissue.cell_centroid(cell).unwrap();
        let cfg = search_cfg();
        let candidate = shortest_path_candidate(&tissue, cell, anchor, &cfg).unwrap();
        // Pre-stress the first host wall: resting length twice the actual.
        tissue.wall_mut(candidate.wall_a).unwrap().resting_length = 2.0;
        let split = SplitConfig::default().with_resting_length_rule(RestingLengthRule::Scaled);

        divide(&mut tissue, cell, &candidate, &cfg, &split).unwrap();
        // The midpoint split shares the doubled resting length equally.
        let mut sub_restings: Vec<f64> = tissue
            .walls()
            .filter(|(_, w)| {
                let (v0, v1) = w.vertices();
                let p0 = tissue.vertex(v0).unwrap().position;
                let p1 = tissue.vertex(v1).unwrap().position;
                p0.y.abs() < 1e-9 && p1.y.abs() < 1e-9
            })
            .map(|(_, w)| w.resting_length)
            .collect();
        sub_restings.sort_by(f64::total_cmp);
        assert_eq!(sub_restings.len(), 2);
        assert_relative_eq!(sub_restings[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(sub_restings[1], 1.0, epsilon = 1e-6);
    }
}
