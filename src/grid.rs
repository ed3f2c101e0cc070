use nalgebra::DMatrix;

/// Rectangular scalar field read back from the solver.
/// Row 0 is the first data line of the solver output.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureGrid {
    values: DMatrix<f64>,
}

impl TemperatureGrid {
    pub fn empty() -> Self {
        TemperatureGrid {
            values: DMatrix::zeros(0, 0),
        }
    }

    /// Build from row-major values, `values.len()` must equal `rows * cols`.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[f64]) -> Self {
        debug_assert_eq!(values.len(), rows * cols);
        TemperatureGrid {
            values: DMatrix::from_row_slice(rows, cols, values),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.row(row).iter().copied().collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows()).map(|r| self.row(r)).collect()
    }

    /// Smallest and largest finite value, `None` if there is none.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }
}
