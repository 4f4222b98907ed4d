//! Row-parallel helpers for the stretch passes
//!
//! Each pass walks the raster one row at a time and may stop early (cancellation,
//! allocation failure). These helpers pick rayon or a plain loop depending on
//! the row count and propagate the first error either way.

use rayon::prelude::*;

use crate::error::StretchError;

/// Fallible fold/reduce over row indices with threshold-based dispatch.
///
/// This function abstracts the pattern:
/// ```ignore
/// if rows >= threshold {
///     (0..rows).into_par_iter()
///         .try_fold(|| init(), |acc, row| fold_fn(acc, row))
///         .try_reduce(|| init(), |a, b| Ok(reduce_fn(a, b)))
/// } else {
///     // sequential version
/// }
/// ```
///
/// `init` is called once per worker and should be cheap; expensive buffers
/// belong in `fold_fn`, where allocation failure can be reported.
///
/// # Arguments
/// * `rows` - Number of rows to visit
/// * `threshold` - Minimum row count for parallel execution
/// * `init` - Creates an empty accumulator
/// * `fold_fn` - Folds one row into the accumulator
/// * `reduce_fn` - Combines two accumulators
pub fn try_fold_rows<A, I, F, R>(
    rows: usize,
    threshold: usize,
    init: I,
    fold_fn: F,
    reduce_fn: R,
) -> Result<A, StretchError>
where
    A: Send,
    I: Fn() -> A + Sync + Send,
    F: Fn(A, usize) -> Result<A, StretchError> + Sync + Send,
    R: Fn(A, A) -> A + Sync + Send,
{
    if rows >= threshold {
        (0..rows)
            .into_par_iter()
            .try_fold(&init, &fold_fn)
            .try_reduce(&init, |a, b| Ok(reduce_fn(a, b)))
    } else {
        let mut acc = init();
        for row in 0..rows {
            acc = fold_fn(acc, row)?;
        }
        Ok(acc)
    }
}

/// Fallible for-each over mutable rows with threshold-based dispatch.
///
/// `data` is split into rows of `columns` elements; `f` receives the row index
/// and the row slice. Rows are disjoint, so workers never share output.
pub fn try_for_each_row_mut<T, F>(
    data: &mut [T],
    columns: usize,
    threshold: usize,
    f: F,
) -> Result<(), StretchError>
where
    T: Send,
    F: Fn(usize, &mut [T]) -> Result<(), StretchError> + Sync + Send,
{
    let rows = data.len() / columns.max(1);

    if rows >= threshold {
        data.par_chunks_exact_mut(columns)
            .enumerate()
            .try_for_each(|(row, chunk)| f(row, chunk))
    } else {
        for (row, chunk) in data.chunks_exact_mut(columns).enumerate() {
            f(row, chunk)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_of_rows(rows: usize, threshold: usize) -> u64 {
        try_fold_rows(
            rows,
            threshold,
            || 0u64,
            |acc, row| Ok(acc + row as u64),
            |a, b| a + b,
        )
        .unwrap()
    }

    #[test]
    fn test_try_fold_rows_sequential_and_parallel_agree() {
        let expected: u64 = (0..500u64).sum();
        assert_eq!(sum_of_rows(500, usize::MAX), expected);
        assert_eq!(sum_of_rows(500, 1), expected);
    }

    #[test]
    fn test_try_fold_rows_propagates_error() {
        for threshold in [1, usize::MAX] {
            let result = try_fold_rows(
                100,
                threshold,
                || 0usize,
                |acc, row| {
                    if row == 42 {
                        Err(StretchError::Cancelled)
                    } else {
                        Ok(acc + 1)
                    }
                },
                |a, b| a + b,
            );
            assert!(matches!(result, Err(StretchError::Cancelled)));
        }
    }

    #[test]
    fn test_try_for_each_row_mut_writes_disjoint_rows() {
        for threshold in [1, usize::MAX] {
            let mut data = vec![0usize; 12];
            try_for_each_row_mut(&mut data, 4, threshold, |row, chunk| {
                for value in chunk.iter_mut() {
                    *value = row;
                }
                Ok(())
            })
            .unwrap();
            assert_eq!(data, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
        }
    }

    #[test]
    fn test_try_for_each_row_mut_propagates_error() {
        let mut data = vec![0.0f64; 30];
        let result = try_for_each_row_mut(&mut data, 3, 1, |row, _| {
            if row == 5 {
                Err(StretchError::Cancelled)
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(StretchError::Cancelled)));
    }
}
