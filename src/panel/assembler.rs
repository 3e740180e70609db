//! panel::assembler — build the state-year analysis panel.
//!
//! Purpose
//! -------
//! Merge per-(state, year, nativity) labor aggregates with per-(state, year)
//! macro variables into one balanced analysis panel, compute real output
//! and capital with their logs, and hand the `[logY, logK, F, D]` matrix to
//! the TFP model. Recovered productivity is written back as a `Z` column.
//!
//! Key behaviors
//! -------------
//! - Labor bodies are summed per (state, year, nativity).
//! - `Y = nominal_output · 100 / price_deflator · 1e6` (nominal output is
//!   in millions) and `K = nominal_capital · 100 / investment_deflator` are
//!   computed per macro record. Duplicate records for one (state, year)
//!   contribute the mean of their real values.
//! - Rows are sorted state-major then year-minor, matching the model's
//!   observation order.
//!
//! Invariants & assumptions
//! ------------------------
//! - The panel is balanced: every state × year in the union of inputs has
//!   macro data and both nativity groups, else [`PanelError::MissingCell`].
//! - Deflators, `Y` and `K` are finite and strictly positive; labor bodies
//!   are finite and non-negative. Violations are
//!   [`PanelError::InvalidValue`].
use crate::{
    panel::errors::{PanelError, PanelResult},
    production::core::{data::TfpData, shape::PanelShape},
};
use ndarray::{Array1, Array2};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Nominal output is reported in millions.
pub const OUTPUT_UNIT_SCALE: f64 = 1e6;
/// Deflators are indexed to 100 in the base year.
pub const DEFLATOR_BASE: f64 = 100.0;

/// Macro variables for one state-year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroRecord {
    pub state: u32,
    pub year: i32,
    pub nominal_output: f64,
    pub nominal_capital: f64,
    pub price_deflator: f64,
    pub investment_deflator: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Nativity {
    Foreign,
    Domestic,
}

/// Labor aggregate for one state, year and nativity group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaborRecord {
    pub state: u32,
    pub year: i32,
    pub nativity: Nativity,
    pub bodies: f64,
}

/// One row of the analysis panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRow {
    pub state: u32,
    pub year: i32,
    pub output: f64,
    pub capital: f64,
    pub log_output: f64,
    pub log_capital: f64,
    pub foreign: f64,
    pub domestic: f64,
    pub tfp: Option<f64>,
}

/// Balanced state-year analysis panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub states: Vec<u32>,
    pub years: Vec<i32>,
    pub rows: Vec<PanelRow>,
}

/// Running sums of per-record real output and capital.
#[derive(Default)]
struct MacroSum {
    output: f64,
    capital: f64,
    count: usize,
}

/// Assemble the analysis panel from macro and labor records.
///
/// # Errors
/// - [`PanelError::Empty`] when both inputs are empty.
/// - [`PanelError::InvalidValue`] for non-finite inputs, non-positive
///   deflators, negative labor, or non-positive derived `Y` / `K`.
/// - [`PanelError::MissingCell`] for the first state-year (in panel order)
///   lacking macro data or a nativity group.
pub fn assemble(macros: &[MacroRecord], labor: &[LaborRecord]) -> PanelResult<Panel> {
    if macros.is_empty() && labor.is_empty() {
        return Err(PanelError::Empty);
    }

    let mut macro_cells: BTreeMap<(u32, i32), MacroSum> = BTreeMap::new();
    for m in macros {
        check_finite(m.state, m.year, "nominal_output", m.nominal_output)?;
        check_finite(m.state, m.year, "nominal_capital", m.nominal_capital)?;
        check_positive(m.state, m.year, "price_deflator", m.price_deflator)?;
        check_positive(m.state, m.year, "investment_deflator", m.investment_deflator)?;
        let cell = macro_cells.entry((m.state, m.year)).or_default();
        cell.output += real_output(m);
        cell.capital += real_capital(m);
        cell.count += 1;
    }

    let mut labor_cells: BTreeMap<(u32, i32, Nativity), f64> = BTreeMap::new();
    for l in labor {
        check_finite(l.state, l.year, "bodies", l.bodies)?;
        if l.bodies < 0.0 {
            return Err(PanelError::InvalidValue {
                state: l.state,
                year: l.year,
                field: "bodies",
                value: l.bodies,
            });
        }
        *labor_cells.entry((l.state, l.year, l.nativity)).or_insert(0.0) += l.bodies;
    }

    let states: BTreeSet<u32> = macros
        .iter()
        .map(|m| m.state)
        .chain(labor.iter().map(|l| l.state))
        .collect();
    let years: BTreeSet<i32> =
        macros.iter().map(|m| m.year).chain(labor.iter().map(|l| l.year)).collect();

    let mut rows = Vec::with_capacity(states.len() * years.len());
    for &state in &states {
        for &year in &years {
            let cell = macro_cells.get(&(state, year)).ok_or(PanelError::MissingCell {
                state,
                year,
                what: "macro data",
            })?;
            let foreign = *labor_cells.get(&(state, year, Nativity::Foreign)).ok_or(
                PanelError::MissingCell { state, year, what: "foreign labor" },
            )?;
            let domestic = *labor_cells.get(&(state, year, Nativity::Domestic)).ok_or(
                PanelError::MissingCell { state, year, what: "domestic labor" },
            )?;
            rows.push(build_row(state, year, cell, foreign, domestic)?);
        }
    }
    debug!(n_states = states.len(), n_years = years.len(), n_rows = rows.len(), "assembled panel");

    Ok(Panel { states: states.into_iter().collect(), years: years.into_iter().collect(), rows })
}

impl Panel {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// # Errors
    /// [`PanelError::Model`] if the panel is empty.
    pub fn shape(&self) -> PanelResult<PanelShape> {
        Ok(PanelShape::new(self.states.len(), self.years.len())?)
    }

    /// `[logY, logK, F, D]` in panel row order.
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((self.rows.len(), 4));
        for (mut dst, row) in out.rows_mut().into_iter().zip(self.rows.iter()) {
            dst[0] = row.log_output;
            dst[1] = row.log_capital;
            dst[2] = row.foreign;
            dst[3] = row.domestic;
        }
        out
    }

    /// Validated model input for this panel.
    ///
    /// # Errors
    /// [`PanelError::Model`] wrapping the data validation error.
    pub fn to_tfp_data(&self) -> PanelResult<TfpData> {
        Ok(TfpData::new(self.to_matrix(), self.shape()?)?)
    }

    /// Write recovered productivity into the `tfp` column.
    ///
    /// # Errors
    /// [`PanelError::LengthMismatch`] unless `z` has one value per row.
    pub fn attach_tfp(&mut self, z: &Array1<f64>) -> PanelResult<()> {
        if z.len() != self.rows.len() {
            return Err(PanelError::LengthMismatch { expected: self.rows.len(), actual: z.len() });
        }
        for (row, &value) in self.rows.iter_mut().zip(z.iter()) {
            row.tfp = Some(value);
        }
        Ok(())
    }
}

// ---- Helper methods ----

fn build_row(
    state: u32, year: i32, cell: &MacroSum, foreign: f64, domestic: f64,
) -> PanelResult<PanelRow> {
    let n = cell.count as f64;
    let output = cell.output / n;
    let capital = cell.capital / n;
    check_positive(state, year, "output", output)?;
    check_positive(state, year, "capital", capital)?;
    Ok(PanelRow {
        state,
        year,
        output,
        capital,
        log_output: output.ln(),
        log_capital: capital.ln(),
        foreign,
        domestic,
        tfp: None,
    })
}

fn real_output(m: &MacroRecord) -> f64 {
    m.nominal_output * DEFLATOR_BASE / m.price_deflator * OUTPUT_UNIT_SCALE
}

fn real_capital(m: &MacroRecord) -> f64 {
    m.nominal_capital * DEFLATOR_BASE / m.investment_deflator
}

fn check_finite(state: u32, year: i32, field: &'static str, value: f64) -> PanelResult<()> {
    if !value.is_finite() {
        return Err(PanelError::InvalidValue { state, year, field, value });
    }
    Ok(())
}

fn check_positive(state: u32, year: i32, field: &'static str, value: f64) -> PanelResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PanelError::InvalidValue { state, year, field, value });
    }
    Ok(())
}
