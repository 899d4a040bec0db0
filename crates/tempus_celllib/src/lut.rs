//! Lookup tables for delay, slew, and constraint characterization.
//!
//! A table is either scalar (a single value returned for any query) or a
//! one-/two-dimensional grid indexed by two template variables. Queries
//! inside the grid use bilinear interpolation on the bracketing rows and
//! columns; queries outside the grid extrapolate along the slope of the
//! last bracketing interval.

use serde::{Deserialize, Serialize};
use tempus_common::CLIP;

/// A template variable naming what a LUT axis is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LutVariable {
    /// Capacitive load seen by the driving pin.
    TotalOutputNetCapacitance,
    /// Transition time of the arriving input signal.
    InputNetTransition,
    /// Transition time at the constrained (data) pin of a timing check.
    ConstrainedPinTransition,
    /// Transition time at the related (clock) pin of a timing check.
    RelatedPinTransition,
}

/// A characterization lookup table with its template variables.
///
/// `table[i][j]` corresponds to `indices1[i]` on the first axis and
/// `indices2[j]` on the second. Scalar tables have a single value and no
/// template variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingLut {
    /// The variable indexing the first axis, if the table is not scalar.
    pub variable1: Option<LutVariable>,
    /// The variable indexing the second axis, if the table is not scalar.
    pub variable2: Option<LutVariable>,
    /// Ordered index values of the first axis.
    pub indices1: Vec<f64>,
    /// Ordered index values of the second axis.
    pub indices2: Vec<f64>,
    /// Table values, row-major over `(indices1, indices2)`.
    pub table: Vec<Vec<f64>>,
}

impl TimingLut {
    /// Creates a scalar table that returns `value` for any query.
    pub fn scalar(value: f64) -> Self {
        Self {
            variable1: None,
            variable2: None,
            indices1: vec![0.0],
            indices2: vec![0.0],
            table: vec![vec![value]],
        }
    }

    /// Creates a grid table.
    ///
    /// `indices1` and `indices2` must be strictly increasing and `table`
    /// must be `indices1.len() × indices2.len()`.
    pub fn grid(
        variable1: LutVariable,
        variable2: LutVariable,
        indices1: Vec<f64>,
        indices2: Vec<f64>,
        table: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(table.len(), indices1.len());
        debug_assert!(table.iter().all(|row| row.len() == indices2.len()));
        Self {
            variable1: Some(variable1),
            variable2: Some(variable2),
            indices1,
            indices2,
            table,
        }
    }

    /// Returns the size of the first axis.
    pub fn size1(&self) -> usize {
        self.indices1.len()
    }

    /// Returns the size of the second axis.
    pub fn size2(&self) -> usize {
        self.indices2.len()
    }

    /// Returns `true` for a 1×1 table.
    pub fn is_scalar(&self) -> bool {
        self.size1() == 1 && self.size2() == 1
    }

    /// Evaluates the table at `(val1, val2)`.
    ///
    /// Scalar tables return their single value. Grid queries locate the
    /// bracketing interval on each axis (clamped to the outermost
    /// interval), interpolate linearly inside it, and extrapolate along
    /// the same slope outside it. A query value beyond the clip bound is
    /// passed through unchanged.
    pub fn value(&self, val1: f64, val2: f64) -> f64 {
        if self.is_scalar() {
            return self.table[0][0];
        }

        let i1 = bracket(&self.indices1, val1);
        let i2 = bracket(&self.indices2, val2);

        if self.size1() == 1 {
            // 1 x N row.
            lerp(
                val2,
                self.indices2[i2 - 1],
                self.indices2[i2],
                self.table[0][i2 - 1],
                self.table[0][i2],
            )
        } else if self.size2() == 1 {
            // N x 1 column.
            lerp(
                val1,
                self.indices1[i1 - 1],
                self.indices1[i1],
                self.table[i1 - 1][0],
                self.table[i1][0],
            )
        } else {
            // N x N grid: interpolate along axis 1 at both bracketing
            // columns, then along axis 2.
            let lo = lerp(
                val1,
                self.indices1[i1 - 1],
                self.indices1[i1],
                self.table[i1 - 1][i2 - 1],
                self.table[i1][i2 - 1],
            );
            let hi = lerp(
                val1,
                self.indices1[i1 - 1],
                self.indices1[i1],
                self.table[i1 - 1][i2],
                self.table[i1][i2],
            );
            lerp(val2, self.indices2[i2 - 1], self.indices2[i2], lo, hi)
        }
    }
}

/// Returns the upper index of the bracketing interval for `val`, clamped
/// to `[1, indices.len() - 1]`.
fn bracket(indices: &[f64], val: f64) -> usize {
    let upper = indices.partition_point(|&x| x < val);
    upper.clamp(1, indices.len() - 1)
}

/// Linear inter-/extrapolation of `x` over `(x1, y1)..(x2, y2)`.
///
/// Values beyond the clip bound are passed through unchanged so undefined
/// sentinels survive table evaluation.
fn lerp(x: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    debug_assert!(x1 < x2);

    if x >= CLIP || x <= -CLIP {
        return x;
    }

    let slope = (y2 - y1) / (x2 - x1);

    if x < x1 {
        y1 - (x1 - x) * slope
    } else if x > x2 {
        y2 + (x - x2) * slope
    } else if x == x1 {
        y1
    } else if x == x2 {
        y2
    } else {
        y1 + (x - x1) * slope
    }
}
