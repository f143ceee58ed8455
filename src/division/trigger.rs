//! Trigger evaluation: the pure predicates deciding when a cell divides.
//!
//! Every policy is a function of the current tissue state only. Evaluation
//! mutates nothing and is idempotent: calling it twice on unchanged state
//! returns the same answer twice, which the step pass relies on when a
//! deferred division is re-evaluated the next step.
//!
//! A cell whose boundary is degenerate (unreadable polygon, attribute slot
//! out of bounds) simply does not trigger; degeneracy is a reason to skip,
//! never to abort.

use serde::{Deserialize, Serialize};

use crate::core::tissue::{CellKey, Tissue};
use crate::division::config::{
    DivisionConfigError, ensure_finite, ensure_non_negative, ensure_positive,
};
use crate::geometry::point::Point2;

/// Direction of the Hill modulation of the volume threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HillDirection {
    /// Threshold grows with concentration:
    /// `v_min + (v_max - v_min) * c^n / (K^n + c^n)`.
    Increasing,
    /// Threshold shrinks with concentration:
    /// `v_min + (v_max - v_min) * K^n / (K^n + c^n)`.
    Decreasing,
}

/// Which quantity a size-control trigger compares against its threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaMode {
    /// Divide when volume reaches the threshold.
    Sizer,
    /// Divide when time since the last division reaches the threshold.
    Timer,
    /// Divide when volume added since birth reaches the threshold.
    Adder,
}

/// A trigger policy: a pure predicate over one cell's state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TriggerPolicy {
    /// Fire when cell volume (polygon area) reaches a fixed threshold.
    VolumeThreshold {
        /// The volume threshold.
        v_threshold: f64,
    },
    /// Fire when the volume threshold is met *and* the cell centroid lies
    /// within `max_distance` of a reference point.
    VolumeThresholdSpatial {
        /// The volume threshold.
        v_threshold: f64,
        /// Spatial cutoff distance.
        max_distance: f64,
        /// The reference point (e.g. the tissue apex).
        reference: Point2,
    },
    /// Fire when volume reaches a threshold modulated by a Hill function of
    /// a stored concentration.
    HillConcentration {
        /// Threshold at vanishing (increasing) or saturating (decreasing)
        /// concentration.
        v_min: f64,
        /// Threshold at the other extreme.
        v_max: f64,
        /// Hill half-saturation constant.
        k_hill: f64,
        /// Hill coefficient.
        n_hill: f64,
        /// Attribute slot holding the concentration.
        concentration_index: usize,
        /// Increasing or decreasing modulation.
        direction: HillDirection,
    },
    /// Sizer/Timer/Adder size-control rule.
    SizerTimerAdder {
        /// Which quantity is compared.
        mode: StaMode,
        /// The threshold for that quantity.
        threshold: f64,
        /// Attribute slot holding time since division (Timer).
        time_index: usize,
        /// Attribute slot holding volume at birth (Adder).
        birth_volume_index: usize,
    },
    /// Fire when a stored flag attribute equals one (scripted or externally
    /// forced division).
    ///
    /// The flag lives in a float slot written by an external model, so the
    /// comparison accepts any value within 0.5 of 1.0 rather than exact
    /// equality; anything outside that band reads as unset.
    Flag {
        /// Attribute slot holding the flag.
        flag_index: usize,
    },
}

impl TriggerPolicy {
    /// Validates the policy's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DivisionConfigError`] for non-finite or out-of-range
    /// parameters; fatal at rule construction.
    pub fn validate(&self) -> Result<(), DivisionConfigError> {
        match *self {
            Self::VolumeThreshold { v_threshold } => {
                ensure_positive("v_threshold", v_threshold)?;
            }
            Self::VolumeThresholdSpatial {
                v_threshold,
                max_distance,
                reference,
            } => {
                ensure_positive("v_threshold", v_threshold)?;
                ensure_non_negative("max_distance", max_distance)?;
                ensure_finite("reference.x", reference.x)?;
                ensure_finite("reference.y", reference.y)?;
            }
            Self::HillConcentration {
                v_min,
                v_max,
                k_hill,
                n_hill,
                ..
            } => {
                ensure_positive("v_min", v_min)?;
                ensure_positive("v_max", v_max)?;
                if v_max < v_min {
                    return Err(DivisionConfigError::OutOfRange {
                        name: "v_max",
                        value: v_max,
                        expected: ">= v_min",
                    });
                }
                ensure_positive("k_hill", k_hill)?;
                ensure_positive("n_hill", n_hill)?;
            }
            Self::SizerTimerAdder { threshold, .. } => {
                ensure_positive("threshold", threshold)?;
            }
            Self::Flag { .. } => {}
        }
        Ok(())
    }

    /// Evaluates the policy for `cell`. Pure and idempotent.
    ///
    /// Returns `false` (instead of failing) for cells whose geometry or
    /// attribute layout cannot be read.
    #[must_use]
    pub fn evaluate(&self, tissue: &Tissue, cell: CellKey) -> bool {
        match *self {
            Self::VolumeThreshold { v_threshold } => tissue
                .cell_area(cell)
                .is_ok_and(|volume| volume >= v_threshold),
            Self::VolumeThresholdSpatial {
                v_threshold,
                max_distance,
                reference,
            } => {
                let Ok(volume) = tissue.cell_area(cell) else {
                    return false;
                };
                let Ok(com) = tissue.cell_centroid(cell) else {
                    return false;
                };
                volume >= v_threshold && com.distance(reference) <= max_distance
            }
            Self::HillConcentration {
                v_min,
                v_max,
                k_hill,
                n_hill,
                concentration_index,
                direction,
            } => {
                let Ok(volume) = tissue.cell_area(cell) else {
                    return false;
                };
                let Some(c) = attr(tissue, cell, concentration_index) else {
                    return false;
                };
                let cn = c.max(0.0).powf(n_hill);
                let kn = k_hill.powf(n_hill);
                let fraction = match direction {
                    HillDirection::Increasing => cn / (kn + cn),
                    HillDirection::Decreasing => kn / (kn + cn),
                };
                volume >= (v_max - v_min).mul_add(fraction, v_min)
            }
            Self::SizerTimerAdder {
                mode,
                threshold,
                time_index,
                birth_volume_index,
            } => match mode {
                StaMode::Sizer => tissue
                    .cell_area(cell)
                    .is_ok_and(|volume| volume >= threshold),
                StaMode::Timer => {
                    attr(tissue, cell, time_index).is_some_and(|t| t >= threshold)
                }
                StaMode::Adder => {
                    let Ok(volume) = tissue.cell_area(cell) else {
                        return false;
                    };
                    attr(tissue, cell, birth_volume_index)
                        .is_some_and(|birth| volume - birth >= threshold)
                }
            },
            Self::Flag { flag_index } => {
                attr(tissue, cell, flag_index).is_some_and(|flag| (flag - 1.0).abs() < 0.5)
            }
        }
    }
}

fn attr(tissue: &Tissue, cell: CellKey, index: usize) -> Option<f64> {
    tissue.cell(cell)?.attrs.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tissue::Tissue;

    fn square_tissue(side: f64) -> (Tissue, CellKey) {
        Tissue::from_polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ])
        .unwrap()
    }

    #[test]
    fn volume_threshold_fires_at_threshold() {
        let (tissue, cell) = square_tissue(2.0); // area 4
        let below = TriggerPolicy::VolumeThreshold { v_threshold: 4.5 };
        let at = TriggerPolicy::VolumeThreshold { v_threshold: 4.0 };
        assert!(!below.evaluate(&tissue, cell));
        assert!(at.evaluate(&tissue, cell));
    }

    #[test]
    fn trigger_is_idempotent() {
        let (tissue, cell) = square_tissue(2.0);
        let policy = TriggerPolicy::VolumeThreshold { v_threshold: 1.0 };
        let first = policy.evaluate(&tissue, cell);
        let second = policy.evaluate(&tissue, cell);
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn spatial_gate() {
        let (tissue, cell) = square_tissue(2.0); // centroid (1, 1)
        let near = TriggerPolicy::VolumeThresholdSpatial {
            v_threshold: 1.0,
            max_distance: 2.0,
            reference: Point2::new(0.0, 0.0),
        };
        let far = TriggerPolicy::VolumeThresholdSpatial {
            v_threshold: 1.0,
            max_distance: 1.0,
            reference: Point2::new(10.0, 10.0),
        };
        assert!(near.evaluate(&tissue, cell));
        assert!(!far.evaluate(&tissue, cell));
    }

    #[test]
    fn hill_threshold_moves_with_concentration() {
        let (mut tissue, cell) = square_tissue(2.0); // area 4
        let policy = TriggerPolicy::HillConcentration {
            v_min: 2.0,
            v_max: 8.0,
            k_hill: 1.0,
            n_hill: 2.0,
            concentration_index: 0,
            direction: HillDirection::Increasing,
        };
        // At c = K the threshold sits halfway: 2 + 6 * 0.5 = 5 > 4.
        tissue.set_cell_attrs(cell, vec![1.0]).unwrap();
        assert!(!policy.evaluate(&tissue, cell));
        // At c = 0 the threshold is v_min = 2 <= 4.
        tissue.set_cell_attrs(cell, vec![0.0]).unwrap();
        assert!(policy.evaluate(&tissue, cell));

        let decreasing = TriggerPolicy::HillConcentration {
            v_min: 2.0,
            v_max: 8.0,
            k_hill: 1.0,
            n_hill: 2.0,
            concentration_index: 0,
            direction: HillDirection::Decreasing,
        };
        // Decreasing direction at c = 0 gives the full v_max = 8 > 4.
        assert!(!decreasing.evaluate(&tissue, cell));
    }

    #[test]
    fn sizer_timer_adder_modes() {
        let (mut tissue, cell) = square_tissue(2.0); // area 4
        tissue.set_cell_attrs(cell, vec![7.0, 1.5]).unwrap(); // [time, birth volume]

        let sizer = TriggerPolicy::SizerTimerAdder {
            mode: StaMode::Sizer,
            threshold: 3.0,
            time_index: 0,
            birth_volume_index: 1,
        };
        let timer = TriggerPolicy::SizerTimerAdder {
            mode: StaMode::Timer,
            threshold: 5.0,
            time_index: 0,
            birth_volume_index: 1,
        };
        let adder = TriggerPolicy::SizerTimerAdder {
            mode: StaMode::Adder,
            threshold: 3.0,
            time_index: 0,
            birth_volume_index: 1,
        };
        assert!(sizer.evaluate(&tissue, cell));
        assert!(timer.evaluate(&tissue, cell));
        // Added volume: 4 - 1.5 = 2.5 < 3.
        assert!(!adder.evaluate(&tissue, cell));
    }

    #[test]
    fn flag_trigger_reads_stored_flag() {
        let (mut tissue, cell) = square_tissue(1.0);
        let policy = TriggerPolicy::Flag { flag_index: 2 };
        tissue.set_cell_attrs(cell, vec![0.0, 0.0, 0.0]).unwrap();
        assert!(!policy.evaluate(&tissue, cell));
        tissue.set_cell_attrs(cell, vec![0.0, 0.0, 1.0]).unwrap();
        assert!(policy.evaluate(&tissue, cell));
        // Values within 0.5 of 1.0 read as set, tolerating float drift in
        // the stored flag; the band edges themselves do not fire.
        tissue.set_cell_attrs(cell, vec![0.0, 0.0, 1.2]).unwrap();
        assert!(policy.evaluate(&tissue, cell));
        tissue.set_cell_attrs(cell, vec![0.0, 0.0, 0.5]).unwrap();
        assert!(!policy.evaluate(&tissue, cell));
        tissue.set_cell_attrs(cell, vec![0.0, 0.0, 2.0]).unwrap();
        assert!(!policy.evaluate(&tissue, cell));
        // Missing slot: skip, never fail.
        tissue.set_cell_attrs(cell, vec![0.0]).unwrap();
        assert!(!policy.evaluate(&tissue, cell));
    }

    #[test]
    fn validation_rejects_bad_parameters() {
        assert!(
            TriggerPolicy::VolumeThreshold { v_threshold: -1.0 }
                .validate()
                .is_err()
        );
        assert!(
            TriggerPolicy::HillConcentration {
                v_min: 5.0,
                v_max: 1.0,
                k_hill: 1.0,
                n_hill: 2.0,
                concentration_index: 0,
                direction: HillDirection::Increasing,
            }
            .validate()
            .is_err()
        );
        assert!(TriggerPolicy::Flag { flag_index: 0 }.validate().is_ok());
    }
}
