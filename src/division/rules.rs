//! The rule catalog: trigger + plane policy + apportioning, boxed behind
//! [`DivisionRule`].
//!
//! Every variant is one [`VariantRule`] value: a validated trigger policy, a
//! plane policy selecting how the cut is oriented, the search and split
//! configuration, and the optional giant-cell and flag-reset behaviors.
//! [`RuleSpec`] is the serializable construction surface; [`build_rule`]
//! validates a spec and boxes the resulting rule. Bad parameters are
//! rejected at construction with [`DivisionConfigError`], never at step
//! time.

use nalgebra::Matrix2;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::tissue::{CellKey, Tissue, TissueValidationError};
use crate::division::config::{
    AnchorPolicy, DivisionConfigError, GiantCellConfig, SearchConfig, SplitConfig,
};
use crate::division::mutate::{self, DivisionError, DivisionOutcome};
use crate::division::search::{self, Candidate};
use crate::division::trigger::{HillDirection, StaMode, TriggerPolicy};
use crate::geometry::point::Point2;

/// A division that could not be completed. Fatal: the tissue may be
/// partially mutated and the simulation cannot continue.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("division of cell {cell:?} under rule `{rule}` failed")]
pub struct InvariantViolation {
    /// The cell being divided.
    pub cell: CellKey,
    /// Name of the rule that was applying the cut.
    pub rule: String,
    /// The underlying failure.
    #[source]
    pub source: DivisionError,
}

/// One division rule: decides *whether* a cell divides, *where* the cut
/// goes, and *how* the cut is applied.
///
/// The step pass calls the three stages in order; `apply` always delegates
/// the actual surgery to [`mutate::divide`].
pub trait DivisionRule {
    /// The rule's catalog name, used in records and diagnostics.
    fn name(&self) -> &str;

    /// Whether this rule wants to divide `cell`. Pure; never mutates.
    fn flag(&self, tissue: &Tissue, cell: CellKey) -> bool;

    /// Searches for a cut, or `None` to defer the division to a later step.
    fn search(&self, tissue: &Tissue, cell: CellKey, rng: &mut StdRng) -> Option<Candidate>;

    /// Applies the cut and the rule's post-division bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation`] when the cut cannot be completed;
    /// the tissue must then be considered unusable.
    fn apply(
        &self,
        tissue: &mut Tissue,
        cell: CellKey,
        candidate: &Candidate,
        rng: &mut StdRng,
    ) -> Result<DivisionOutcome, InvariantViolation>;
}

/// How a rule orients the cut.
#[derive(Clone, Debug, PartialEq, Eq)]
enum PlanePolicy {
    /// Pairwise shortest-path search through the anchor.
    ShortestPath,
    /// Directed cut perpendicular to the longest boundary wall.
    LongestWall,
    /// Directed cut perpendicular to the shortest boundary wall.
    ShortestWall,
    /// Directed cut along one uniformly random direction.
    RandomDirection,
    /// Directed cut perpendicular to a vector stored in two attribute slots.
    CellVector {
        x_index: usize,
        y_index: usize,
    },
    /// Directed cut perpendicular to the principal axis of a stored
    /// symmetric 2x2 strain tensor.
    Strain {
        xx_index: usize,
        yy_index: usize,
        xy_index: usize,
    },
    /// Directed cut perpendicular to the boundary wall carrying the largest
    /// stored force magnitude.
    WallForce {
        force_index: usize,
    },
    /// Directed cut perpendicular to the vertex-cloud principal axis.
    MainAxis,
}

fn cell_attr(tissue: &Tissue, cell: CellKey, index: usize) -> Option<f64> {
    tissue.cell(cell)?.attrs.get(index).copied()
}

/// Principal eigenvector (largest eigenvalue) of a symmetric 2x2 matrix,
/// or `None` when it is numerically isotropic and no axis is preferred.
fn principal_axis(xx: f64, yy: f64, xy: f64) -> Option<Point2> {
    if !(xx.is_finite() && yy.is_finite() && xy.is_finite()) {
        return None;
    }
    let eigen = Matrix2::new(xx, xy, xy, yy).symmetric_eigen();
    let (column, spread) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
        (0, eigen.eigenvalues[0] - eigen.eigenvalues[1])
    } else {
        (1, eigen.eigenvalues[1] - eigen.eigenvalues[0])
    };
    if spread < f64::EPSILON {
        return None;
    }
    let v = eigen.eigenvectors.column(column);
    Point2::new(v[0], v[1]).normalized()
}

/// A concrete rule variant. Constructed through [`RuleSpec::build`].
#[derive(Clone, Debug, PartialEq)]
pub struct VariantRule {
    name: &'static str,
    trigger: TriggerPolicy,
    plane: PlanePolicy,
    search: SearchConfig,
    split: SplitConfig,
    giant: Option<GiantCellConfig>,
    reset_flag_index: Option<usize>,
}

impl VariantRule {
    /// The cut direction for the directed-cut plane policies. `None` means
    /// the direction is unavailable this step and the division defers.
    fn cut_direction(&self, tissue: &Tissue, cell: CellKey, rng: &mut StdRng) -> Option<Point2> {
        match self.plane {
            PlanePolicy::ShortestPath => None,
            PlanePolicy::LongestWall => extreme_wall_direction(tissue, cell, true),
            PlanePolicy::ShortestWall => extreme_wall_direction(tissue, cell, false),
            PlanePolicy::RandomDirection => {
                let theta = rng.random_range(0.0..std::f64::consts::TAU);
                Some(Point2::new(theta.cos(), theta.sin()))
            }
            PlanePolicy::CellVector { x_index, y_index } => {
                let v = Point2::new(
                    cell_attr(tissue, cell, x_index)?,
                    cell_attr(tissue, cell, y_index)?,
                );
                v.normalized().map(Point2::perp)
            }
            PlanePolicy::Strain {
                xx_index,
                yy_index,
                xy_index,
            } => principal_axis(
                cell_attr(tissue, cell, xx_index)?,
                cell_attr(tissue, cell, yy_index)?,
                cell_attr(tissue, cell, xy_index)?,
            )
            .map(Point2::perp),
            PlanePolicy::WallForce { force_index } => {
                max_force_wall_direction(tissue, cell, force_index)
            }
            PlanePolicy::MainAxis => {
                let polygon = tissue.cell_polygon(cell).ok()?;
                vertex_cloud_axis(&polygon).map(Point2::perp)
            }
        }
    }

    fn set_attr(
        &self,
        tissue: &mut Tissue,
        cell: CellKey,
        index: usize,
        value: f64,
    ) -> Result<(), InvariantViolation> {
        let violation = |source| InvariantViolation {
            cell,
            rule: self.name.to_owned(),
            source,
        };
        let attrs = &mut tissue
            .cell_mut(cell)
            .ok_or_else(|| {
                violation(DivisionError::Topology(TissueValidationError::UnknownCell {
                    cell,
                }))
            })?
            .attrs;
        let len = attrs.len();
        let slot = attrs
            .get_mut(index)
            .ok_or_else(|| violation(DivisionError::AttributeIndexOutOfBounds { index, len }))?;
        *slot = value;
        Ok(())
    }
}

/// Perpendicular of the longest (or shortest) boundary wall, first on ties.
fn extreme_wall_direction(tissue: &Tissue, cell: CellKey, longest: bool) -> Option<Point2> {
    let polygon = tissue.cell_polygon(cell).ok()?;
    let n = polygon.len();
    let mut best: Option<(f64, Point2)> = None;
    for i in 0..n {
        let edge = polygon[(i + 1) % n] - polygon[i];
        let len2 = edge.norm_squared();
        if len2 < f64::EPSILON {
            continue;
        }
        let better = best.is_none_or(|(b, _)| if longest { len2 > b } else { len2 < b });
        if better {
            best = Some((len2, edge));
        }
    }
    best.and_then(|(_, edge)| edge.normalized()).map(Point2::perp)
}

/// Perpendicular of the boundary wall carrying the largest `force_index`
/// attribute magnitude, first on ties. Walls without the slot do not
/// compete; `None` when no wall carries it or the winner is degenerate.
fn max_force_wall_direction(tissue: &Tissue, cell: CellKey, force_index: usize) -> Option<Point2> {
    let wall_keys = tissue.cell(cell)?.walls();
    let loop_vertices = tissue.cell_vertex_loop(cell).ok()?;
    let n = wall_keys.len();
    let mut best: Option<(f64, Point2)> = None;
    for i in 0..n {
        let wall = tissue.wall(wall_keys[i])?;
        let Some(&force) = wall.attrs.get(force_index) else {
            continue;
        };
        if !force.is_finite() {
            continue;
        }
        let a = tissue.vertex(loop_vertices[i])?.position;
        let b = tissue.vertex(loop_vertices[(i + 1) % n])?.position;
        let edge = b - a;
        if edge.norm_squared() < f64::EPSILON {
            continue;
        }
        let magnitude = force.abs();
        if best.is_none_or(|(m, _)| magnitude > m) {
            best = Some((magnitude, edge));
        }
    }
    best.and_then(|(_, edge)| edge.normalized()).map(Point2::perp)
}

/// Principal axis of the boundary vertex cloud (largest eigenvector of the
/// position covariance about the mean).
fn vertex_cloud_axis(polygon: &[Point2]) -> Option<Point2> {
    let n = polygon.len();
    if n < 3 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let inv = 1.0 / n as f64;
    let mean = polygon
        .iter()
        .fold(Point2::ORIGIN, |acc, &p| acc + p * inv);
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &p in polygon {
        let d = p - mean;
        sxx += d.x * d.x;
        syy += d.y * d.y;
        sxy += d.x * d.y;
    }
    principal_axis(sxx, syy, sxy)
}

impl DivisionRule for VariantRule {
    fn name(&self) -> &str {
        self.name
    }

    fn flag(&self, tissue: &Tissue, cell: CellKey) -> bool {
        if let Some(giant) = &self.giant {
            // A cell marked giant grows without ever dividing.
            let marked = cell_attr(tissue, cell, giant.flag_index)
                .is_some_and(|v| (v - 1.0).abs() < 0.5);
            if marked {
                return false;
            }
        }
        self.trigger.evaluate(tissue, cell)
    }

    fn search(&self, tissue: &Tissue, cell: CellKey, rng: &mut StdRng) -> Option<Candidate> {
        let anchor = search::resolve_anchor(tissue, cell, self.search.anchor, rng)?;
        if self.plane == PlanePolicy::ShortestPath {
            search::shortest_path_candidate(tissue, cell, anchor, &self.search)
        } else {
            let direction = self.cut_direction(tissue, cell, rng)?;
            search::directed_candidate(tissue, cell, anchor, direction, &self.search)
        }
    }

    fn apply(
        &self,
        tissue: &mut Tissue,
        cell: CellKey,
        candidate: &Candidate,
        rng: &mut StdRng,
    ) -> Result<DivisionOutcome, InvariantViolation> {
        let outcome = mutate::divide(tissue, cell, candidate, &self.search, &self.split).map_err(
            |source| InvariantViolation {
                cell,
                rule: self.name.to_owned(),
                source,
            },
        )?;
        if let Some(index) = self.reset_flag_index {
            for daughter in [outcome.mother, outcome.daughter] {
                self.set_attr(tissue, daughter, index, 0.0)?;
            }
        }
        if let Some(giant) = &self.giant {
            // One draw per daughter, mother first, drawn unconditionally to
            // keep the RNG stream independent of the outcomes.
            for daughter in [outcome.mother, outcome.daughter] {
                let marked = rng.random::<f64>() < giant.giant_fraction;
                if marked {
                    self.set_attr(tissue, daughter, giant.flag_index, 1.0)?;
                }
            }
        }
        Ok(outcome)
    }
}

/// A spatial gate restricting a volume trigger to cells near a reference
/// point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialGate {
    /// Maximum centroid distance from `reference` for the trigger to fire.
    pub max_distance: f64,
    /// The reference point.
    pub reference: Point2,
}

/// Serializable construction surface of the rule catalog.
///
/// The `rule` tag is the catalog name; each variant carries exactly its own
/// parameters. Deserializing an unknown name fails at the serde layer, and
/// [`RuleSpec::build`] validates everything else.
///
/// # Examples
///
/// ```rust
/// use cytokinesis::division::rules::{RuleSpec, build_rule};
///
/// let spec = RuleSpec::ShortestPath {
///     v_threshold: 2.0,
///     l_frac: 1.0,
///     l_threshold: 0.05,
///     anchor: Default::default(),
///     split: Default::default(),
/// };
/// let rule = build_rule(&spec).unwrap();
/// assert_eq!(rule.name(), "ShortestPath");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule")]
pub enum RuleSpec {
    /// Volume trigger, pairwise shortest-path search. The anchor policy
    /// selects the deterministic or randomized flavor.
    ShortestPath {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Where the path is constrained to pass.
        #[serde(default)]
        anchor: AnchorPolicy,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Hill-modulated volume trigger, pairwise shortest-path search.
    ShortestPathConcentration {
        /// Threshold at vanishing (increasing form) concentration.
        v_min: f64,
        /// Threshold at saturating concentration.
        v_max: f64,
        /// Hill half-saturation constant.
        k_hill: f64,
        /// Hill exponent.
        n_hill: f64,
        /// Attribute slot holding the concentration.
        concentration_index: usize,
        /// Whether the threshold grows or shrinks with concentration.
        direction: HillDirection,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Where the path is constrained to pass.
        #[serde(default)]
        anchor: AnchorPolicy,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Sizer/Timer/Adder trigger, pairwise shortest-path search. The age
    /// and birth-volume slots are wired into the split configuration so the
    /// mutator maintains them.
    StaShortestPath {
        /// Which size-control law gates the division.
        mode: StaMode,
        /// Threshold in the law's own quantity (volume, age, added volume).
        threshold: f64,
        /// Attribute slot holding time since division.
        time_index: usize,
        /// Attribute slot holding volume at birth.
        birth_volume_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Flag trigger (scripted division), pairwise shortest-path search;
    /// clears the flag on both daughters.
    FlagResetShortestPath {
        /// Attribute slot holding the division flag.
        flag_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Flag trigger (scripted division), directed cut perpendicular to the
    /// longest wall; clears the flag on both daughters.
    FlagResetLongestWall {
        /// Attribute slot holding the division flag.
        flag_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Volume trigger, directed cut perpendicular to the longest wall,
    /// optionally gated to a spatial region.
    LongestWall {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Optional spatial gate on the trigger.
        #[serde(default)]
        spatial: Option<SpatialGate>,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Volume trigger, directed cut perpendicular to the shortest wall.
    ShortestWall {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Volume trigger, directed cut along one uniformly random direction.
    RandomDirection {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Hill-modulated volume trigger, directed cut along one uniformly
    /// random direction.
    RandomDirectionConcentration {
        /// Threshold at vanishing (increasing form) concentration.
        v_min: f64,
        /// Threshold at saturating concentration.
        v_max: f64,
        /// Hill half-saturation constant.
        k_hill: f64,
        /// Hill exponent.
        n_hill: f64,
        /// Attribute slot holding the concentration.
        concentration_index: usize,
        /// Whether the threshold grows or shrinks with concentration.
        direction: HillDirection,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Volume trigger, directed cut perpendicular to a per-cell vector
    /// stored in two attribute slots.
    CellVectorDirection {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Attribute slot of the vector's x component.
        x_index: usize,
        /// Attribute slot of the vector's y component.
        y_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Volume trigger, directed cut perpendicular to the principal axis of
    /// a stored symmetric strain tensor.
    StrainDirection {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Attribute slot of the xx tensor component.
        xx_index: usize,
        /// Attribute slot of the yy tensor component.
        yy_index: usize,
        /// Attribute slot of the xy tensor component.
        xy_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Volume trigger, directed cut perpendicular to the boundary wall
    /// carrying the largest stored force magnitude.
    ForceDirection {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Wall attribute slot holding the force magnitude.
        force_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Volume trigger, directed cut perpendicular to the vertex-cloud
    /// principal axis.
    MainAxis {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Shortest-path division with giant-cell marking: flagged cells never
    /// divide; each daughter is marked giant with probability
    /// `giant_fraction`.
    ShortestPathGiantCells {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Probability of marking each daughter giant.
        giant_fraction: f64,
        /// Attribute slot holding the giant flag.
        flag_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Where the path is constrained to pass.
        #[serde(default)]
        anchor: AnchorPolicy,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
    /// Random-direction division with giant-cell marking.
    RandomDirectionGiantCells {
        /// Volume at which the cell divides.
        v_threshold: f64,
        /// Probability of marking each daughter giant.
        giant_fraction: f64,
        /// Attribute slot holding the giant flag.
        flag_index: usize,
        /// Resting-length fraction of the dividing wall.
        l_frac: f64,
        /// Minimum cut-point clearance from host-wall vertices.
        l_threshold: f64,
        /// Attribute apportioning.
        #[serde(default)]
        split: SplitConfig,
    },
}

fn ensure_distinct(
    name: &'static str,
    index: usize,
    others: &[usize],
) -> Result<(), DivisionConfigError> {
    if others.contains(&index) {
        Err(DivisionConfigError::IndexClash { name, index })
    } else {
        Ok(())
    }
}

impl RuleSpec {
    /// The catalog name this spec builds.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ShortestPath { .. } => "ShortestPath",
            Self::ShortestPathConcentration { .. } => "ShortestPathConcentration",
            Self::StaShortestPath { .. } => "StaShortestPath",
            Self::FlagResetShortestPath { .. } => "FlagResetShortestPath",
            Self::FlagResetLongestWall { .. } => "FlagResetLongestWall",
            Self::LongestWall { .. } => "LongestWall",
            Self::ShortestWall { .. } => "ShortestWall",
            Self::RandomDirection { .. } => "RandomDirection",
            Self::RandomDirectionConcentration { .. } => "RandomDirectionConcentration",
            Self::CellVectorDirection { .. } => "CellVectorDirection",
            Self::StrainDirection { .. } => "StrainDirection",
            Self::ForceDirection { .. } => "ForceDirection",
            Self::MainAxis { .. } => "MainAxis",
            Self::ShortestPathGiantCells { .. } => "ShortestPathGiantCells",
            Self::RandomDirectionGiantCells { .. } => "RandomDirectionGiantCells",
        }
    }

    /// Validates this spec and constructs the concrete rule.
    ///
    /// # Errors
    ///
    /// Returns [`DivisionConfigError`] for non-finite or out-of-range
    /// scalars and clashing attribute indices.
    #[allow(clippy::too_many_lines)]
    pub fn build(&self) -> Result<VariantRule, DivisionConfigError> {
        let name = self.name();
        let rule = match *self {
            Self::ShortestPath {
                v_threshold,
                l_frac,
                l_threshold,
                anchor,
                ref split,
            } => {
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::ShortestPath,
                    search: SearchConfig::new(l_frac, l_threshold, anchor)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::ShortestPathConcentration {
                v_min,
                v_max,
                k_hill,
                n_hill,
                concentration_index,
                direction,
                l_frac,
                l_threshold,
                anchor,
                ref split,
            } => {
                let trigger = TriggerPolicy::HillConcentration {
                    v_min,
                    v_max,
                    k_hill,
                    n_hill,
                    concentration_index,
                    direction,
                };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::ShortestPath,
                    search: SearchConfig::new(l_frac, l_threshold, anchor)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::StaShortestPath {
                mode,
                threshold,
                time_index,
                birth_volume_index,
                l_frac,
                l_threshold,
                ref split,
            } => {
                ensure_distinct("birth_volume_index", birth_volume_index, &[time_index])?;
                let trigger = TriggerPolicy::SizerTimerAdder {
                    mode,
                    threshold,
                    time_index,
                    birth_volume_index,
                };
                trigger.validate()?;
                // The mutator must maintain the slots the trigger reads.
                let split = split
                    .clone()
                    .with_time_index(time_index)
                    .with_birth_volume_index(birth_volume_index);
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::ShortestPath,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split,
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::FlagResetShortestPath {
                flag_index,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::Flag { flag_index };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::ShortestPath,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: Some(flag_index),
                }
            }
            Self::FlagResetLongestWall {
                flag_index,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::Flag { flag_index };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::LongestWall,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: Some(flag_index),
                }
            }
            Self::LongestWall {
                v_threshold,
                l_frac,
                l_threshold,
                spatial,
                ref split,
            } => {
                let trigger = match spatial {
                    Some(gate) => TriggerPolicy::VolumeThresholdSpatial {
                        v_threshold,
                        max_distance: gate.max_distance,
                        reference: gate.reference,
                    },
                    None => TriggerPolicy::VolumeThreshold { v_threshold },
                };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::LongestWall,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::ShortestWall {
                v_threshold,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::ShortestWall,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::RandomDirection {
                v_threshold,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::RandomDirection,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::RandomDirectionConcentration {
                v_min,
                v_max,
                k_hill,
                n_hill,
                concentration_index,
                direction,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::HillConcentration {
                    v_min,
                    v_max,
                    k_hill,
                    n_hill,
                    concentration_index,
                    direction,
                };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::RandomDirection,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::CellVectorDirection {
                v_threshold,
                x_index,
                y_index,
                l_frac,
                l_threshold,
                ref split,
            } => {
                ensure_distinct("y_index", y_index, &[x_index])?;
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::CellVector { x_index, y_index },
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::StrainDirection {
                v_threshold,
                xx_index,
                yy_index,
                xy_index,
                l_frac,
                l_threshold,
                ref split,
            } => {
                ensure_distinct("yy_index", yy_index, &[xx_index])?;
                ensure_distinct("xy_index", xy_index, &[xx_index, yy_index])?;
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::Strain {
                        xx_index,
                        yy_index,
                        xy_index,
                    },
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::ForceDirection {
                v_threshold,
                force_index,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::WallForce { force_index },
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::MainAxis {
                v_threshold,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::MainAxis,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: None,
                    reset_flag_index: None,
                }
            }
            Self::ShortestPathGiantCells {
                v_threshold,
                giant_fraction,
                flag_index,
                l_frac,
                l_threshold,
                anchor,
                ref split,
            } => {
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::ShortestPath,
                    search: SearchConfig::new(l_frac, l_threshold, anchor)?,
                    split: split.clone(),
                    giant: Some(GiantCellConfig::new(flag_index, giant_fraction)?),
                    reset_flag_index: None,
                }
            }
            Self::RandomDirectionGiantCells {
                v_threshold,
                giant_fraction,
                flag_index,
                l_frac,
                l_threshold,
                ref split,
            } => {
                let trigger = TriggerPolicy::VolumeThreshold { v_threshold };
                trigger.validate()?;
                VariantRule {
                    name,
                    trigger,
                    plane: PlanePolicy::RandomDirection,
                    search: SearchConfig::new(l_frac, l_threshold, AnchorPolicy::CenterOfMass)?,
                    split: split.clone(),
                    giant: Some(GiantCellConfig::new(flag_index, giant_fraction)?),
                    reset_flag_index: None,
                }
            }
        };
        Ok(rule)
    }
}

/// Validates `spec` and boxes the resulting rule for the step pass.
///
/// # Errors
///
/// Propagates [`RuleSpec::build`] failures.
pub fn build_rule(spec: &RuleSpec) -> Result<Box<dyn DivisionRule>, DivisionConfigError> {
    Ok(Box::new(spec.build()?))
}
