use super::error::SegError;
use crate::libs::matrix::SquareMatrix;

/// Reusable scratch buffers for the three blocks of an (i,j) split.
///
/// Capacities cover the worst case over all valid (i,j) for one matrix
/// dimension, so `partition` never reallocates. The filled lengths are
/// the vector lengths after a call, never the capacities.
pub struct BlockBuffers {
    pub top: Vec<f64>,
    pub tri: Vec<f64>,
    pub bot: Vec<f64>,
}

impl BlockBuffers {
    pub fn new(size: usize) -> Result<Self, SegError> {
        let rect_cap = (size + 1) * (size + 1) / 4;
        let tri_cap = size * (size + 1) / 2;

        Ok(Self {
            top: alloc(rect_cap)?,
            tri: alloc(tri_cap)?,
            bot: alloc(rect_cap)?,
        })
    }
}

fn alloc(cap: usize) -> Result<Vec<f64>, SegError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(cap).map_err(|_| SegError::Resource {
        what: "partition buffers",
        bytes: cap * std::mem::size_of::<f64>(),
    })?;

    Ok(buf)
}

/// Break columns [i, j] of `mat` into three blocks.
///
/// For each column c in [i, j]: rows 0..i go to `top`, rows i..c to
/// `tri` (the upper triangle of the segment, diagonal excluded), rows
/// j+1..n to `bot`. Filled lengths come out to i*(j-i+1),
/// (j-i)*(j-i+1)/2 and (n-j-1)*(j-i+1).
pub fn partition(mat: &SquareMatrix, i: usize, j: usize, blocks: &mut BlockBuffers) {
    let n = mat.size();
    debug_assert!(i < j && j < n);

    blocks.top.clear();
    blocks.tri.clear();
    blocks.bot.clear();

    for col in i..=j {
        // Empty when i is 0.
        for row in 0..i {
            blocks.top.push(mat.get(row, col));
        }

        // Empty when col is i.
        for row in i..col {
            blocks.tri.push(mat.get(row, col));
        }

        // Empty when j is n-1.
        for row in (j + 1)..n {
            blocks.bot.push(mat.get(row, col));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::matrix::distance_matrix;

    #[test]
    fn test_partition_counts() {
        let n = 9;
        let dis = distance_matrix(n);
        let mut blocks = BlockBuffers::new(n).unwrap();

        for i in 0..(n - 2) {
            for j in (i + 2)..n {
                partition(&dis, i, j, &mut blocks);
                let w = j - i + 1;
                assert_eq!(blocks.top.len(), i * w, "top at ({},{})", i, j);
                assert_eq!(blocks.tri.len(), (j - i) * w / 2, "tri at ({},{})", i, j);
                assert_eq!(blocks.bot.len(), (n - j - 1) * w, "bot at ({},{})", i, j);
            }
        }
    }

    #[test]
    fn test_partition_contents() {
        let n = 5;
        let mut mat = crate::libs::matrix::SquareMatrix::zeros(n);
        for r in 0..n {
            for c in 0..n {
                mat.set(r, c, (r * 10 + c) as f64);
            }
        }

        let mut blocks = BlockBuffers::new(n).unwrap();
        partition(&mat, 1, 3, &mut blocks);

        // Columns 1..=3, filled vertically.
        assert_eq!(blocks.top, vec![1.0, 2.0, 3.0]);
        assert_eq!(blocks.tri, vec![12.0, 13.0, 23.0]);
        assert_eq!(blocks.bot, vec![41.0, 42.0, 43.0]);
    }

    #[test]
    fn test_partition_is_deterministic() {
        let n = 7;
        let dis = distance_matrix(n);
        let mut blocks = BlockBuffers::new(n).unwrap();

        partition(&dis, 2, 5, &mut blocks);
        let first = (blocks.top.clone(), blocks.tri.clone(), blocks.bot.clone());
        partition(&dis, 2, 5, &mut blocks);
        assert_eq!(first, (blocks.top.clone(), blocks.tri.clone(), blocks.bot.clone()));
    }
}
