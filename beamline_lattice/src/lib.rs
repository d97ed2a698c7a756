//! # Beamline Lattice
//!
//! Composition and geometry engine for linear accelerator lattices.
//!
//! Elements with 3-D placements are grouped into machine-area sections; the
//! sections of each beam path are concatenated and reconciled into an
//! ordered element sequence. On top of that sit range/type queries, drift
//! synthesis and cumulative s-positions.
//!
//! # Module Structure
//!
//! - [`placement`] - Entry/exit geometry (`PhysicalPlacement`)
//! - [`element`] - Element records and TOML catalogues
//! - [`section`] - Per-area ordered members
//! - [`layout`] - Beam paths and order reconciliation
//! - [`query`] - Class/type filters and range queries
//! - [`snapshot`] - Immutable registry + derived state
//! - [`drift`] - Drift insertion and s-positions
//! - [`machine`] - `MachineModel` and its shared, lock-guarded form
//! - [`loader`] - Machine directory loading
//! - [`error`] - Errors and build diagnostics
//!
//! # Data Flow
//!
//! ```text
//! elements ──► MachineModel::append
//!                   │
//!                   ▼
//!          build_sections (area order) ──► build_layouts (path order, reconcile)
//!                   │
//!                   ▼
//!          Arc<LatticeSnapshot> ──► elements_between / create_drifts / get_elements_s_pos
//! ```

pub mod drift;
pub mod element;
pub mod error;
pub mod layout;
pub mod loader;
pub mod machine;
pub mod placement;
pub mod query;
pub mod section;
pub mod snapshot;

pub use crate::drift::{Drift, LatticeItem};
pub use crate::element::{Element, ElementCatalog, Magnetic};
pub use crate::error::{BuildDiagnostic, LatticeError, LatticeResult};
pub use crate::layout::{Layout, LayoutView};
pub use crate::loader::load_machine_dir;
pub use crate::machine::{MachineModel, SharedMachineModel};
pub use crate::placement::{Physical, PhysicalPlacement};
pub use crate::query::{ElementFilter, ElementQuery};
pub use crate::section::Section;
pub use crate::snapshot::LatticeSnapshot;
