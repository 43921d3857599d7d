use rayon::prelude::*;
use std::collections::HashMap;

/// Bijective id <-> index assignment: unique raw ids sorted ascending and
/// numbered 0..n-1, with a hash map for O(1) reverse lookup. A map and any
/// matrix indexed by it belong to the same model generation and must only
/// be used together.
#[derive(Debug, Clone, Default)]
pub struct IndexMap {
    ids: Vec<i64>,
    positions: HashMap<i64, usize>,
}

impl IndexMap {
    pub fn from_ids(mut ids: Vec<i64>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        let positions = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        Self { ids, positions }
    }

    pub fn position(&self, id: i64) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn id_at(&self, index: usize) -> i64 {
        self.ids[index]
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sparse matrix in compressed sparse row form. Zero means "no observed
/// value"; explicit zeros are never stored. Memory scales with the number
/// of stored entries, not with `rows * cols`.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Build from (row, col, value) triples, one per cell.
    pub fn from_triples(rows: usize, cols: usize, mut triples: Vec<(usize, usize, f64)>) -> Self {
        triples.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(triples.len());
        let mut values = Vec::with_capacity(triples.len());

        for (r, c, v) in triples {
            debug_assert!(r < rows && c < cols);
            row_ptr[r + 1] += 1;
            col_idx.push(c);
            values.push(v);
        }
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    fn from_rows(rows: usize, cols: usize, row_entries: Vec<Vec<(usize, f64)>>) -> Self {
        let nnz = row_entries.iter().map(Vec::len).sum();
        let mut row_ptr = Vec::with_capacity(rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for entries in row_entries {
            for (c, v) in entries {
                col_idx.push(c);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Column indices and values of one row, both sorted by column.
    pub fn row(&self, r: usize) -> (&[usize], &[f64]) {
        let span = self.row_ptr[r]..self.row_ptr[r + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        let (cols, vals) = self.row(r);
        match cols.binary_search(&c) {
            Ok(k) => vals[k],
            Err(_) => 0.0,
        }
    }

    /// Raise one cell to `value` if it is larger than what is stored,
    /// inserting the cell if it was structurally absent. Returns the value
    /// now stored.
    pub fn set_max(&mut self, r: usize, c: usize, value: f64) -> f64 {
        let start = self.row_ptr[r];
        let end = self.row_ptr[r + 1];
        match self.col_idx[start..end].binary_search(&c) {
            Ok(k) => {
                let slot = &mut self.values[start + k];
                if value > *slot {
                    *slot = value;
                }
                *slot
            }
            Err(k) => {
                self.col_idx.insert(start + k, c);
                self.values.insert(start + k, value);
                for ptr in self.row_ptr[r + 1..].iter_mut() {
                    *ptr += 1;
                }
                value
            }
        }
    }

    pub fn transpose(&self) -> SparseMatrix {
        let mut row_entries = vec![Vec::new(); self.cols];
        for r in 0..self.rows {
            let (cols, vals) = self.row(r);
            for (&c, &v) in cols.iter().zip(vals) {
                row_entries[c].push((r, v));
            }
        }
        SparseMatrix::from_rows(self.cols, self.rows, row_entries)
    }

    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for (&c, &v) in self.col_idx.iter().zip(&self.values) {
            sums[c] += v;
        }
        sums
    }

    pub fn row_norms(&self) -> Vec<f64> {
        (0..self.rows)
            .map(|r| {
                let (_, vals) = self.row(r);
                vals.iter().map(|v| v * v).sum::<f64>().sqrt()
            })
            .collect()
    }
}

/// Row-wise cosine similarity of a sparse matrix, returned as a sparse
/// square matrix. Only strictly positive similarities are stored, plus an
/// explicit 1.0 diagonal for every row with at least one entry; consumers
/// ranking neighbors must skip the diagonal themselves.
///
/// Works column-by-column through the transpose so the cost scales with
/// co-rated columns rather than all row pairs. Rows are processed in
/// parallel.
pub fn cosine_similarity(matrix: &SparseMatrix) -> SparseMatrix {
    let n = matrix.rows();
    let norms = matrix.row_norms();
    let transpose = matrix.transpose();

    let row_entries: Vec<Vec<(usize, f64)>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let (cols_i, vals_i) = matrix.row(i);
            let mut dots: HashMap<usize, f64> = HashMap::new();
            for (&k, &v) in cols_i.iter().zip(vals_i) {
                let (peers, weights) = transpose.row(k);
                for (&j, &w) in peers.iter().zip(weights) {
                    *dots.entry(j).or_insert(0.0) += v * w;
                }
            }

            let mut entries: Vec<(usize, f64)> = dots
                .into_iter()
                .filter_map(|(j, dot)| {
                    if j == i {
                        return Some((j, 1.0));
                    }
                    let denom = norms[i] * norms[j];
                    if denom > 0.0 && dot / denom > 0.0 {
                        Some((j, dot / denom))
                    } else {
                        None
                    }
                })
                .collect();
            entries.sort_unstable_by_key(|&(j, _)| j);
            entries
        })
        .collect();

    SparseMatrix::from_rows(n, n, row_entries)
}
