//! Validated division-rule configuration.
//!
//! The original model format supplied rule parameters positionally (a fixed
//! count of scalars followed by index groups); here every rule is configured
//! through typed structs that are validated exactly once, when the rule is
//! built. Malformed configuration is rejected with [`DivisionConfigError`]
//! before the simulation loop starts; nothing in this module is checked
//! again per step.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default tolerance below which a cut point is merged with an existing
/// vertex instead of inserting a new one.
pub const DEFAULT_VERTEX_MERGE_TOLERANCE: f64 = 1e-9;

/// Configuration errors, all fatal at rule construction time.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DivisionConfigError {
    /// A scalar parameter was NaN or infinite.
    #[error("parameter `{name}` must be finite, got {value}")]
    NonFinite {
        /// Parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// A scalar parameter fell outside its admissible range.
    #[error("parameter `{name}` = {value} out of range, expected {expected}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// The offending value.
        value: f64,
        /// Human-readable description of the admissible range.
        expected: &'static str,
    },
    /// The extensive index group names the same attribute slot twice, which
    /// would split it twice.
    #[error("attribute index {index} appears twice in the extensive group")]
    DuplicateExtensiveIndex {
        /// The repeated index.
        index: usize,
    },
    /// An index group names the same attribute slot in two roles.
    #[error("parameter `{name}` must name a distinct attribute slot, got {index}")]
    IndexClash {
        /// Parameter name.
        name: &'static str,
        /// The clashing index.
        index: usize,
    },
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64, DivisionConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DivisionConfigError::NonFinite { name, value })
    }
}

pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<f64, DivisionConfigError> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(DivisionConfigError::OutOfRange {
            name,
            value,
            expected: "> 0",
        })
    }
}

pub(crate) fn ensure_non_negative(
    name: &'static str,
    value: f64,
) -> Result<f64, DivisionConfigError> {
    ensure_finite(name, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(DivisionConfigError::OutOfRange {
            name,
            value,
            expected: ">= 0",
        })
    }
}

pub(crate) fn ensure_unit_interval(
    name: &'static str,
    value: f64,
) -> Result<f64, DivisionConfigError> {
    ensure_finite(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DivisionConfigError::OutOfRange {
            name,
            value,
            expected: "in [0, 1]",
        })
    }
}

/// Where the dividing path is constrained to pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorPolicy {
    /// Through the cell's center of mass.
    #[default]
    CenterOfMass,
    /// Through a uniformly sampled random interior point (one draw per
    /// search, from the shared seeded RNG).
    RandomInterior,
}

/// How extensive attributes are apportioned between the daughters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensiveSplit {
    /// Each daughter receives half, regardless of the resulting geometry.
    #[default]
    EqualHalves,
    /// Apportioned by the daughters' polygon areas after the cut.
    ProportionalToArea,
}

/// How the two sub-walls of a split wall get their resting lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestingLengthRule {
    /// Each sub-wall rests at its actual arclength, discarding any stored
    /// tension in the original wall.
    #[default]
    Arclength,
    /// The original resting length is shared between the sub-walls in
    /// proportion to their arclengths, preserving the stored tension.
    Scaled,
}

/// Geometric parameters of the division-plane search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Resting length of the new dividing wall as a fraction of its actual
    /// length (1.0 sets it to the distance between the cut points).
    pub l_frac: f64,
    /// Minimum allowed distance between a cut point and any pre-existing
    /// vertex of its host wall; candidates violating it are rejected.
    pub l_threshold: f64,
    /// Distance below which a cut point coincides with an existing vertex
    /// and reuses it instead of splitting the wall.
    pub vertex_merge_tolerance: f64,
    /// Anchor-point selection.
    pub anchor: AnchorPolicy,
}

impl SearchConfig {
    /// Builds and validates a search configuration with the default vertex
    /// merge tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`DivisionConfigError`] for non-finite or out-of-range
    /// parameters.
    pub fn new(
        l_frac: f64,
        l_threshold: f64,
        anchor: AnchorPolicy,
    ) -> Result<Self, DivisionConfigError> {
        ensure_positive("l_frac", l_frac)?;
        ensure_non_negative("l_threshold", l_threshold)?;
        Ok(Self {
            l_frac,
            l_threshold,
            vertex_merge_tolerance: DEFAULT_VERTEX_MERGE_TOLERANCE,
            anchor,
        })
    }

    /// Overrides the vertex merge tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`DivisionConfigError`] for a negative or non-finite
    /// tolerance.
    pub fn with_vertex_merge_tolerance(
        mut self,
        tolerance: f64,
    ) -> Result<Self, DivisionConfigError> {
        ensure_non_negative("vertex_merge_tolerance", tolerance)?;
        self.vertex_merge_tolerance = tolerance;
        Ok(self)
    }
}

/// What happens to per-cell state at division.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Attribute slots divided between the daughters (volume, molecular
    /// counts, and other extensive quantities). Every other slot is copied
    /// unchanged to both daughters.
    pub extensive_indices: Vec<usize>,
    /// Apportioning policy for the extensive slots.
    pub extensive_split: ExtensiveSplit,
    /// Resting-length policy for split sub-walls.
    pub resting_length_rule: RestingLengthRule,
    /// Attribute slot holding time-since-division; reset to zero on both
    /// daughters when configured.
    pub time_index: Option<usize>,
    /// Attribute slot recording each daughter's volume at birth (used by
    /// adder-style triggers); set to the daughter's post-division area when
    /// configured.
    pub birth_volume_index: Option<usize>,
}

impl SplitConfig {
    /// Builds and validates a split configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DivisionConfigError::DuplicateExtensiveIndex`] when the
    /// extensive group names a slot twice.
    pub fn new(
        extensive_indices: Vec<usize>,
        extensive_split: ExtensiveSplit,
    ) -> Result<Self, DivisionConfigError> {
        for (i, &index) in extensive_indices.iter().enumerate() {
            if extensive_indices[i + 1..].contains(&index) {
                return Err(DivisionConfigError::DuplicateExtensiveIndex { index });
            }
        }
        Ok(Self {
            extensive_indices,
            extensive_split,
            resting_length_rule: RestingLengthRule::default(),
            time_index: None,
            birth_volume_index: None,
        })
    }

    /// Sets the time-since-division slot.
    #[must_use]
    pub fn with_time_index(mut self, index: usize) -> Self {
        self.time_index = Some(index);
        self
    }

    /// Sets the birth-volume slot.
    #[must_use]
    pub fn with_birth_volume_index(mut self, index: usize) -> Self {
        self.birth_volume_index = Some(index);
        self
    }

    /// Sets the sub-wall resting-length policy.
    #[must_use]
    pub fn with_resting_length_rule(mut self, rule: RestingLengthRule) -> Self {
        self.resting_length_rule = rule;
        self
    }
}

/// Giant-cell bookkeeping shared by the `*GiantCells` variants.
///
/// A cell whose giant flag is set never divides; at each division every
/// daughter is independently marked giant with probability
/// `giant_fraction`, drawn from the shared RNG in daughter order (A, then
/// B) so replays are stable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GiantCellConfig {
    /// Attribute slot holding the giant flag (nonzero means giant).
    pub flag_index: usize,
    /// Probability that a freshly created daughter is marked giant.
    pub giant_fraction: f64,
}

impl GiantCellConfig {
    /// Builds and validates giant-cell configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DivisionConfigError`] when `giant_fraction` is outside
    /// `[0, 1]`.
    pub fn new(flag_index: usize, giant_fraction: f64) -> Result<Self, DivisionConfigError> {
        ensure_unit_interval("giant_fraction", giant_fraction)?;
        Ok(Self {
            flag_index,
            giant_fraction,
        })
    }
}
