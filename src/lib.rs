//! # cytokinesis
//!
//! Cell-division engine for a vertex-based mechanical tissue simulator.
//!
//! A tissue is a planar mesh of polygonal cells: vertices carry positions,
//! walls connect vertex pairs and carry a mechanical resting length, cells
//! are closed loops of walls. An external solver moves the vertices; this
//! crate owns what happens when a cell grows large enough to divide: it
//! decides *when* a cell divides, *where* the new wall goes, and performs
//! the mesh surgery that turns one cell into two.
//!
//! # Features
//!
//! - Trigger policies: volume thresholds (plain, spatially gated,
//!   Hill-modulated by a stored concentration), Sizer/Timer/Adder size
//!   control, and scripted flags
//! - Division-plane search: pairwise shortest-path-through-anchor
//!   optimization, and directed cuts (longest/shortest wall, random,
//!   stored vector, most-loaded wall, strain or shape principal axis)
//! - Invariant-checked topology mutation with attribute apportioning
//!   between the daughters
//! - Deterministic, seed-replayable stepping over explicitly ordered cells
//! - Serialization of the whole mesh and of rule specifications with
//!   [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use cytokinesis::prelude::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! // A regular hexagon with unit circumradius, area ~2.598.
//! let points: Vec<Point2> = (0..6)
//!     .map(|i| {
//!         let theta = std::f64::consts::TAU * f64::from(i) / 6.0;
//!         Point2::new(theta.cos(), theta.sin())
//!     })
//!     .collect();
//! let (mut tissue, cell) = Tissue::from_polygon(&points).unwrap();
//!
//! // Divide at half the current volume: the hexagon is overdue.
//! let rule = build_rule(&RuleSpec::ShortestPath {
//!     v_threshold: tissue.cell_area(cell).unwrap() / 2.0,
//!     l_frac: 1.0,
//!     l_threshold: 0.05,
//!     anchor: AnchorPolicy::CenterOfMass,
//!     split: SplitConfig::default(),
//! })
//! .unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let records = DivisionPass::step(&mut tissue, &[rule], &mut rng).unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(tissue.number_of_cells(), 2);
//! assert!(tissue.validate().is_ok());
//!
//! // Division conserves the enclosed area.
//! let total: f64 = tissue
//!     .cell_order()
//!     .iter()
//!     .map(|&c| tissue.cell_area(c).unwrap())
//!     .sum();
//! assert!((total - 3.0 * 3.0_f64.sqrt() / 2.0).abs() < 1e-9);
//! ```
//!
//! # Structural Invariants
//!
//! Every completed division restores the invariants checked by
//! [`Tissue::validate`](core::tissue::Tissue::validate):
//!
//! - **Closure** – each cell boundary is a closed simple polygon;
//!   consecutive walls share exactly one vertex.
//! - **Incidence** – wall/cell incidence is mutual; each wall borders at
//!   most two cells.
//! - **No dangling references** – walls reference live vertices, cells
//!   reference live walls, and no vertex is orphaned.
//! - **Conservation** – the daughters' areas sum to the mother's area
//!   (the cut is a chord of the polygon, not a deformation).
//! - **Determinism** – cells divide in ascending creation order; all
//!   randomness flows through one caller-seeded RNG.
//!
//! A violated invariant after a mutation is a bug, reported as a fatal
//! error naming the cell and rule, never silently repaired.

/// Mesh state and stepping: entity types, the tissue arena, validation,
/// and the per-step division pass.
pub mod core {
    pub mod cell;
    pub mod stepper;
    pub mod tissue;
    pub mod vertex;
    pub mod wall;
}

/// Plain 2-D computational geometry used by the search and the mesh
/// measures.
pub mod geometry {
    pub mod point;
    pub mod polygon;
}

/// The division engine: configuration, triggers, plane search, topology
/// mutation, and the rule catalog.
pub mod division {
    pub mod config;
    pub mod mutate;
    pub mod rules;
    pub mod search;
    pub mod trigger;
}

/// Convenient access to the commonly used surface of the crate.
pub mod prelude {
    pub use crate::core::cell::Cell;
    pub use crate::core::stepper::{DivisionPass, DivisionRecord};
    pub use crate::core::tissue::{
        CellKey, Tissue, TissueBuildError, TissueValidationError, VertexKey, WallKey,
    };
    pub use crate::core::vertex::Vertex;
    pub use crate::core::wall::Wall;
    pub use crate::division::config::{
        AnchorPolicy, DivisionConfigError, ExtensiveSplit, GiantCellConfig, RestingLengthRule,
        SearchConfig, SplitConfig,
    };
    pub use crate::division::mutate::{DivisionError, DivisionOutcome, divide};
    pub use crate::division::rules::{
        DivisionRule, InvariantViolation, RuleSpec, SpatialGate, VariantRule, build_rule,
    };
    pub use crate::division::search::{
        Candidate, directed_candidate, resolve_anchor, shortest_path_candidate,
    };
    pub use crate::division::trigger::{HillDirection, StaMode, TriggerPolicy};
    pub use crate::geometry::point::Point2;
}
