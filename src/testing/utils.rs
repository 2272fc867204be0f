use nalgebra_sparse::CsrMatrix;
use single_utilities::traits::FloatOpsTS;

pub fn extract_unique_groups(group_ids: &[usize]) -> Vec<usize> {
    let mut unique_groups = group_ids.to_vec();
    unique_groups.sort_unstable();
    unique_groups.dedup();
    unique_groups
}

/// Per-group column sums of a cells x genes matrix, accumulated in one pass over the
/// stored entries. Implicit zeros only contribute to the group sizes.
#[derive(Debug, Clone)]
pub struct GroupStatistics {
    /// `sums[group][gene]`
    pub sums: Vec<Vec<f64>>,
    /// `sum_squares[group][gene]`
    pub sum_squares: Vec<Vec<f64>>,
    /// Number of cells in each group
    pub counts: Vec<usize>,
}

impl GroupStatistics {
    pub fn n_groups(&self) -> usize {
        self.counts.len()
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Sum and sum of squares of `gene` over every cell outside `group`.
    pub fn rest(&self, group: usize, gene: usize) -> (f64, f64) {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for g in (0..self.n_groups()).filter(|&g| g != group) {
            sum += self.sums[g][gene];
            sum_sq += self.sum_squares[g][gene];
        }
        (sum, sum_sq)
    }
}

/// `row_groups[row]` is the group index (`0..n_groups`) of each matrix row.
pub fn accumulate_group_statistics<T>(
    matrix: &CsrMatrix<T>,
    row_groups: &[usize],
    n_groups: usize,
) -> anyhow::Result<GroupStatistics>
where
    T: FloatOpsTS,
{
    if row_groups.len() != matrix.nrows() {
        return Err(anyhow::anyhow!(
            "Group assignment length {} does not match number of rows {}",
            row_groups.len(),
            matrix.nrows()
        ));
    }

    let n_cols = matrix.ncols();
    let mut sums = vec![vec![0.0; n_cols]; n_groups];
    let mut sum_squares = vec![vec![0.0; n_cols]; n_groups];
    let mut counts = vec![0usize; n_groups];

    for (row_idx, row) in matrix.row_iter().enumerate() {
        let group = row_groups[row_idx];
        if group >= n_groups {
            return Err(anyhow::anyhow!(
                "Row {} assigned to group {} but only {} groups exist",
                row_idx,
                group,
                n_groups
            ));
        }
        counts[group] += 1;
        for (&col, value) in row.col_indices().iter().zip(row.values().iter()) {
            let v = value.to_f64().unwrap_or(0.0);
            sums[group][col] += v;
            sum_squares[group][col] += v * v;
        }
    }

    Ok(GroupStatistics {
        sums,
        sum_squares,
        counts,
    })
}

/// Stored entries of each column as `(row, value)` pairs, for tests that need the full
/// per-gene distribution rather than sums.
pub fn column_entries<T>(matrix: &CsrMatrix<T>) -> Vec<Vec<(usize, f64)>>
where
    T: FloatOpsTS,
{
    let mut columns = vec![Vec::new(); matrix.ncols()];
    for (row_idx, row) in matrix.row_iter().enumerate() {
        for (&col, value) in row.col_indices().iter().zip(row.values().iter()) {
            columns[col].push((row_idx, value.to_f64().unwrap_or(0.0)));
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    fn small_matrix() -> CsrMatrix<f64> {
        // 4 cells x 2 genes
        let mut coo = CooMatrix::new(4, 2);
        coo.push(0, 0, 1.0);
        coo.push(1, 0, 3.0);
        coo.push(2, 1, 2.0);
        coo.push(3, 0, 4.0);
        coo.push(3, 1, 1.0);
        CsrMatrix::from(&coo)
    }

    #[test]
    fn test_unique_groups() {
        assert_eq!(extract_unique_groups(&[3, 1, 3, 0, 1]), vec![0, 1, 3]);
    }

    #[test]
    fn test_group_statistics() {
        let matrix = small_matrix();
        let stats = accumulate_group_statistics(&matrix, &[0, 0, 1, 1], 2).unwrap();
        assert_eq!(stats.counts, vec![2, 2]);
        assert_eq!(stats.sums[0], vec![4.0, 0.0]);
        assert_eq!(stats.sums[1], vec![4.0, 3.0]);
        assert_eq!(stats.sum_squares[0], vec![10.0, 0.0]);
        assert_eq!(stats.rest(0, 1), (3.0, 5.0));
        assert_eq!(stats.total_count(), 4);
    }

    #[test]
    fn test_group_statistics_length_mismatch() {
        let matrix = small_matrix();
        assert!(accumulate_group_statistics(&matrix, &[0, 1], 2).is_err());
        assert!(accumulate_group_statistics(&matrix, &[0, 1, 2, 0], 2).is_err());
    }

    #[test]
    fn test_column_entries() {
        let columns = column_entries(&small_matrix());
        assert_eq!(columns[0], vec![(0, 1.0), (1, 3.0), (3, 4.0)]);
        assert_eq!(columns[1], vec![(2, 2.0), (3, 1.0)]);
    }
}
