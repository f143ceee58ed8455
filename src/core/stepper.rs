//! The per-step division pass.
//!
//! Between integrator steps the simulation asks every cell whether it
//! divides now. [`DivisionPass::step`] walks the cells in ascending
//! creation order, gives each rule a chance in registry order, and applies
//! the first rule whose trigger fires. Daughters appended during the step
//! are not revisited until the next step, so one call divides each
//! pre-existing cell at most once.
//!
//! The pass is replayable: with the same tissue, rule list, and RNG seed it
//! performs the same divisions in the same order (see
//! [`crate::core::tissue`] on why iteration runs over `cell_order`).

use rand::rngs::StdRng;

use crate::core::tissue::{CellKey, Tissue, WallKey};
use crate::division::rules::{DivisionRule, InvariantViolation};

/// One completed division, reported to the caller after a step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivisionRecord {
    /// The daughter that kept the mother's key.
    pub mother: CellKey,
    /// The newly created daughter.
    pub daughter: CellKey,
    /// The wall separating the two daughters.
    pub dividing_wall: WallKey,
    /// Name of the rule that performed the division.
    pub rule: String,
}

/// Runs division rules over a tissue, one step at a time.
#[derive(Clone, Copy, Debug, Default)]
pub struct DivisionPass;

impl DivisionPass {
    /// Performs one division pass.
    ///
    /// For each cell alive at the start of the step, the first rule whose
    /// trigger fires claims the cell: if its search finds a candidate the
    /// cut is applied, otherwise the cell is deferred to the next step and
    /// no later rule is consulted for it.
    ///
    /// # Errors
    ///
    /// Propagates [`InvariantViolation`] from a failed cut; the tissue must
    /// then be considered unusable.
    pub fn step(
        tissue: &mut Tissue,
        rules: &[Box<dyn DivisionRule>],
        rng: &mut StdRng,
    ) -> Result<Vec<DivisionRecord>, InvariantViolation> {
        // Snapshot the eligible range: daughters appended below extend
        // cell_order past it and wait for the next step.
        let eligible = tissue.cell_order().len();
        let mut records = Vec::new();
        for index in 0..eligible {
            let cell = tissue.cell_order()[index];
            for rule in rules {
                if !rule.flag(tissue, cell) {
                    continue;
                }
                if let Some(candidate) = rule.search(tissue, cell, rng) {
                    let outcome = rule.apply(tissue, cell, &candidate, rng)?;
                    records.push(DivisionRecord {
                        mother: outcome.mother,
                        daughter: outcome.daughter,
                        dividing_wall: outcome.dividing_wall,
                        rule: rule.name().to_owned(),
                    });
                }
                break;
            }
        }
        Ok(records)
    }
}
