use anyhow::{bail, Context, Result};
use std::io::BufRead;

/// Dense square matrix with owned, contiguous, row-major storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    size: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            data: vec![0.0; size * size],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            bail!("empty matrix");
        }

        let mut data = Vec::with_capacity(size * size);
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != size {
                bail!(
                    "matrix is not square: row {} has {} entries, expected {}",
                    idx,
                    row.len(),
                    size
                );
            }
            data.extend_from_slice(row);
        }

        Ok(Self { size, data })
    }

    /// Load a matrix from a whitespace-separated text file.
    ///
    /// One row per line; blank lines are skipped. Accepts plain or
    /// gzipped files, or `stdin`.
    pub fn from_file(infile: &str) -> Result<Self> {
        let reader = crate::reader(infile);

        let mut rows: Vec<Vec<f64>> = vec![];
        for (lineno, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("reading {}", infile))?;
            if line.trim().is_empty() {
                continue;
            }

            let row: Vec<f64> = line
                .split_whitespace()
                .map(|field| {
                    field
                        .parse::<f64>()
                        .with_context(|| format!("{}:{}: bad number {:?}", infile, lineno + 1, field))
                })
                .collect::<Result<_>>()?;
            rows.push(row);
        }

        Self::from_rows(rows).with_context(|| format!("parsing {}", infile))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] = value;
    }
}

/// The distance-to-diagonal matrix: entry (i,j) is |i-j|.
pub fn distance_matrix(size: usize) -> SquareMatrix {
    let mut mat = SquareMatrix::zeros(size);
    for i in 0..size {
        for j in 0..size {
            mat.set(i, j, (i as f64 - j as f64).abs());
        }
    }

    mat
}

/// A validated collection of replicate count matrices.
///
/// All replicates share one dimension and hold non-negative finite
/// entries; the engine assumes both, so construction is the only place
/// they are checked.
#[derive(Debug, Clone)]
pub struct ObservationSet {
    mats: Vec<SquareMatrix>,
}

impl ObservationSet {
    pub fn try_new(mats: Vec<SquareMatrix>) -> Result<Self> {
        if mats.is_empty() {
            bail!("no observation matrices given");
        }

        let size = mats[0].size();
        for (idx, mat) in mats.iter().enumerate() {
            if mat.size() != size {
                bail!(
                    "replicate {} is {}x{}, expected {}x{}",
                    idx,
                    mat.size(),
                    mat.size(),
                    size,
                    size
                );
            }
            for row in 0..size {
                for col in 0..size {
                    let value = mat.get(row, col);
                    if !value.is_finite() || value < 0.0 {
                        bail!(
                            "replicate {} entry ({},{}) is {}, counts must be non-negative",
                            idx,
                            row,
                            col,
                            value
                        );
                    }
                }
            }
        }

        Ok(Self { mats })
    }

    /// Matrix dimension n.
    pub fn size(&self) -> usize {
        self.mats[0].size()
    }

    /// Number of replicates m.
    pub fn len(&self) -> usize {
        self.mats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mats.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SquareMatrix> {
        self.mats.iter()
    }
}
