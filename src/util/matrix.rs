use ordered_float::OrderedFloat;
use std::ops::{Index, IndexMut, Mul};
use thiserror::Error;

/// Pivots smaller than this are treated as zero.
pub const PIVOT_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("singular matrix: pivot {pivot:e} in column {column}")]
pub struct SingularMatrix {
	pub column: usize,
	pub pivot: f64,
}

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
	rows: usize,
	cols: usize,
	data: Vec<f64>,
}

impl Matrix {
	pub fn zeros(rows: usize, cols: usize) -> Self {
		Self {
			rows,
			cols,
			data: vec![0.0; rows * cols],
		}
	}

	pub fn identity(size: usize) -> Self {
		let mut m = Self::zeros(size, size);
		for i in 0..size {
			m[(i, i)] = 1.0;
		}
		m
	}

	/// Square matrix with `diagonal` on the main diagonal and `off_diagonal` directly above and
	/// below it.
	pub fn tridiagonal(size: usize, diagonal: f64, off_diagonal: f64) -> Self {
		let mut m = Self::zeros(size, size);
		for i in 0..size {
			m[(i, i)] = diagonal;
			if i > 0 {
				m[(i, i - 1)] = off_diagonal;
			}
			if i + 1 < size {
				m[(i, i + 1)] = off_diagonal;
			}
		}
		m
	}

	pub fn from_rows<const N: usize>(rows: impl IntoIterator<Item = [f64; N]>) -> Self {
		let data: Vec<f64> = rows.into_iter().flatten().collect();
		Self {
			rows: data.len() / N.max(1),
			cols: N,
			data,
		}
	}

	pub fn rows(&self) -> usize {
		self.rows
	}

	pub fn cols(&self) -> usize {
		self.cols
	}

	pub fn row(&self, row: usize) -> &[f64] {
		&self.data[row * self.cols..(row + 1) * self.cols]
	}

	fn swap_rows(&mut self, a: usize, b: usize) {
		if a == b {
			return;
		}
		for col in 0..self.cols {
			self.data.swap(a * self.cols + col, b * self.cols + col);
		}
	}

	/// Inverts a square matrix by Gauss-Jordan elimination, swapping in the largest-magnitude pivot
	/// of each column.
	pub fn inverse(&self) -> Result<Matrix, SingularMatrix> {
		assert_eq!(self.rows, self.cols, "only square matrices are invertible");
		let n = self.rows;
		let mut a = self.clone();
		let mut inverse = Matrix::identity(n);

		for column in 0..n {
			let pivot_row = (column..n)
				.max_by_key(|&row| OrderedFloat(a[(row, column)].abs()))
				.unwrap_or(column);
			let pivot = a[(pivot_row, column)];
			// Written so that NaN is also rejected.
			if !(pivot.abs() >= PIVOT_EPSILON) {
				Err(SingularMatrix { column, pivot })?;
			}
			a.swap_rows(column, pivot_row);
			inverse.swap_rows(column, pivot_row);

			let scale = pivot.recip();
			for col in 0..n {
				a[(column, col)] *= scale;
				inverse[(column, col)] *= scale;
			}

			for row in 0..n {
				if row == column {
					continue;
				}
				let factor = a[(row, column)];
				if factor == 0.0 {
					continue;
				}
				for col in 0..n {
					a[(row, col)] -= factor * a[(column, col)];
					inverse[(row, col)] -= factor * inverse[(column, col)];
				}
			}
		}

		Ok(inverse)
	}
}

impl Index<(usize, usize)> for Matrix {
	type Output = f64;
	fn index(&self, (row, col): (usize, usize)) -> &f64 {
		debug_assert!(row < self.rows && col < self.cols);
		&self.data[row * self.cols + col]
	}
}

impl IndexMut<(usize, usize)> for Matrix {
	fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
		debug_assert!(row < self.rows && col < self.cols);
		&mut self.data[row * self.cols + col]
	}
}

impl Mul<&Matrix> for &Matrix {
	type Output = Matrix;
	fn mul(self, rhs: &Matrix) -> Matrix {
		assert_eq!(self.cols, rhs.rows, "dimension mismatch");
		let mut out = Matrix::zeros(self.rows, rhs.cols);
		for row in 0..self.rows {
			for k in 0..self.cols {
				let lhs = self[(row, k)];
				if lhs == 0.0 {
					continue;
				}
				for col in 0..rhs.cols {
					out[(row, col)] += lhs * rhs[(k, col)];
				}
			}
		}
		out
	}
}
