//! panel — state-year analysis panel assembly.
//!
//! Purpose
//! -------
//! Turn raw per-state-year macro records and per-nativity labor aggregates
//! into the balanced, ordered `[logY, logK, F, D]` matrix consumed by the
//! TFP model, and carry recovered productivity back as a `Z` column.
//!
//! Key behaviors
//! -------------
//! - [`assemble`] validates, aggregates, deflates and orders the inputs.
//! - [`Panel::to_tfp_data`] produces validated model input.
//! - [`Panel::attach_tfp`] stores `Z` row by row.
//!
//! Conventions
//! -----------
//! - Row order is state-major, year-minor, over sorted distinct state codes
//!   and years.
//! - Survey micro-data cleaning and person-weight aggregation happen
//!   upstream; this module starts from aggregated bodies.
pub mod assembler;
pub mod errors;

pub use self::assembler::{LaborRecord, MacroRecord, Nativity, Panel, PanelRow, assemble};
pub use self::errors::{PanelError, PanelResult};

pub mod prelude {
    pub use super::assembler::{LaborRecord, MacroRecord, Nativity, Panel, PanelRow, assemble};
    pub use super::errors::{PanelError, PanelResult};
}
