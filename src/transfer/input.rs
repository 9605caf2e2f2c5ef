use ndarray::{Array2, Array3, ArrayD, ArrayViewD, Axis, Ix3};

use crate::core::error::{Error, Result};

/// Table whose cells hold sub-arrays, as produced by dataframe-style containers
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTable {
    rows: Vec<Vec<ArrayD<f64>>>,
}

impl ObjectTable {
    /// All rows must have the same number of cells
    pub fn from_rows(rows: Vec<Vec<ArrayD<f64>>>) -> Result<Self> {
        if let Some(first) = rows.first() {
            if let Some(row) = rows.iter().find(|row| row.len() != first.len()) {
                return Err(Error::Shape(format!(
                    "ragged table: rows have {} and {} columns",
                    first.len(),
                    row.len()
                )));
            }
        }
        Ok(ObjectTable { rows })
    }

    /// One-column table, one cell per row
    pub fn from_column(cells: Vec<ArrayD<f64>>) -> Self {
        ObjectTable {
            rows: cells.into_iter().map(|cell| vec![cell]).collect(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Anything that can be normalized into (n_matrices, n_channels, n_channels)
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixInput {
    /// Numeric array of any rank
    Array(ArrayD<f64>),
    /// Table of sub-arrays
    Table(ObjectTable),
}

impl From<Array3<f64>> for MatrixInput {
    fn from(x: Array3<f64>) -> Self {
        MatrixInput::Array(x.into_dyn())
    }
}

impl From<&Array3<f64>> for MatrixInput {
    fn from(x: &Array3<f64>) -> Self {
        MatrixInput::Array(x.clone().into_dyn())
    }
}

impl From<Array2<f64>> for MatrixInput {
    fn from(x: Array2<f64>) -> Self {
        MatrixInput::Array(x.into_dyn())
    }
}

impl From<ArrayD<f64>> for MatrixInput {
    fn from(x: ArrayD<f64>) -> Self {
        MatrixInput::Array(x)
    }
}

impl From<ObjectTable> for MatrixInput {
    fn from(table: ObjectTable) -> Self {
        MatrixInput::Table(table)
    }
}

/// Produce a (n_matrices, n_channels, n_channels) stack
///
/// - a 3-D array passes through unchanged;
/// - a 2-D array is a single square matrix and gains a leading axis;
/// - a one-column table has its cells stacked, and a resulting 2-D stack
///   (cells that are rows of one matrix) must be square and gains a leading axis.
///
/// Everything else is a shape error.
pub fn normalize_input(input: impl Into<MatrixInput>) -> Result<Array3<f64>> {
    match input.into() {
        MatrixInput::Array(x) => into_stack(x),
        MatrixInput::Table(table) => {
            if table.n_rows() == 0 {
                return Err(Error::Shape("empty table".to_string()));
            }
            if table.n_columns() != 1 {
                return Err(Error::Shape(format!(
                    "expected a single column of matrices, got {} columns",
                    table.n_columns()
                )));
            }

            let cells: Vec<ArrayViewD<f64>> = table.rows.iter().map(|row| row[0].view()).collect();
            let stacked = ndarray::stack(Axis(0), &cells)
                .map_err(|err| Error::Shape(format!("cannot stack table cells: {}", err)))?;
            into_stack(stacked)
        }
    }
}

fn into_stack(x: ArrayD<f64>) -> Result<Array3<f64>> {
    let x = match x.ndim() {
        3 => x,
        // single sample
        2 => x.insert_axis(Axis(0)),
        ndim => {
            return Err(Error::Shape(format!(
                "expected 2 or 3 dimensions, got {}",
                ndim
            )))
        }
    };

    let stack = x
        .into_dimensionality::<Ix3>()
        .map_err(|err| Error::Shape(err.to_string()))?;
    let (_, rows, cols) = stack.dim();
    if rows != cols {
        return Err(Error::Shape(format!(
            "matrices must be square, got {}x{}",
            rows, cols
        )));
    }
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, IxDyn};

    #[test]
    fn test_stack_passes_through() {
        let x = Array3::from_shape_fn((4, 3, 3), |(n, i, j)| (n + i + j) as f64);
        let out = normalize_input(x.clone()).unwrap();
        assert_eq!(out, x);
    }

    #[test]
    fn test_single_matrix_gains_leading_axis() {
        let x = arr2(&[[2.0, 0.1], [0.1, 1.0]]);
        let out = normalize_input(x.clone()).unwrap();
        assert_eq!(out.shape(), &[1, 2, 2]);
        assert_eq!(out.index_axis(Axis(0), 0), x);
    }

    #[test]
    fn test_non_square_single_matrix_rejected() {
        let x = Array2::<f64>::zeros((2, 3));
        assert!(matches!(normalize_input(x), Err(Error::Shape(_))));
    }

    #[test]
    fn test_unsupported_rank_rejected() {
        let x = ArrayD::<f64>::zeros(IxDyn(&[2, 2, 2, 2]));
        assert!(matches!(normalize_input(x), Err(Error::Shape(_))));
        let x = ArrayD::<f64>::zeros(IxDyn(&[5]));
        assert!(matches!(normalize_input(x), Err(Error::Shape(_))));
    }

    #[test]
    fn test_one_column_table_of_matrices() {
        let table = ObjectTable::from_column(vec![
            arr2(&[[1.0, 0.0], [0.0, 1.0]]).into_dyn(),
            arr2(&[[2.0, 0.5], [0.5, 2.0]]).into_dyn(),
            arr2(&[[3.0, 0.0], [0.0, 4.0]]).into_dyn(),
        ]);
        let out = normalize_input(table).unwrap();
        assert_eq!(out.shape(), &[3, 2, 2]);
        assert_eq!(out[[1, 0, 1]], 0.5);
    }

    #[test]
    fn test_table_of_rows_is_single_matrix() {
        let table = ObjectTable::from_column(vec![
            arr1(&[2.0, 0.3]).into_dyn(),
            arr1(&[0.3, 1.0]).into_dyn(),
        ]);
        let out = normalize_input(table).unwrap();
        assert_eq!(out.shape(), &[1, 2, 2]);
        assert_eq!(out[[0, 1, 0]], 0.3);
    }

    #[test]
    fn test_table_of_non_square_rows_rejected() {
        let table = ObjectTable::from_column(vec![
            arr1(&[1.0, 0.0, 0.0]).into_dyn(),
            arr1(&[0.0, 1.0, 0.0]).into_dyn(),
        ]);
        assert!(matches!(normalize_input(table), Err(Error::Shape(_))));
    }

    #[test]
    fn test_multi_column_table_rejected() {
        let cell = arr2(&[[1.0, 0.0], [0.0, 1.0]]).into_dyn();
        let table = ObjectTable::from_rows(vec![vec![cell.clone(), cell.clone()]]).unwrap();
        assert_eq!(table.n_columns(), 2);
        assert!(matches!(normalize_input(table), Err(Error::Shape(_))));
    }

    #[test]
    fn test_mismatched_cells_rejected() {
        let table = ObjectTable::from_column(vec![
            Array2::<f64>::eye(2).into_dyn(),
            Array2::<f64>::eye(3).into_dyn(),
        ]);
        assert!(matches!(normalize_input(table), Err(Error::Shape(_))));
    }

    #[test]
    fn test_ragged_table_rejected() {
        let cell = Array2::<f64>::eye(2).into_dyn();
        let rows = vec![vec![cell.clone()], vec![cell.clone(), cell]];
        assert!(matches!(ObjectTable::from_rows(rows), Err(Error::Shape(_))));
    }

    #[test]
    fn test_empty_table_rejected() {
        let table = ObjectTable::from_column(vec![]);
        assert!(matches!(normalize_input(table), Err(Error::Shape(_))));
    }
}
