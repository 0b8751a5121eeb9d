//! Parallel iteration helpers
//!
//! Thin wrappers over Rayon used by the assembly passes. Every parallel
//! region in the solver maps independent index ranges to uniquely-owned
//! output buffers and combines them in fixed index order, so results are
//! bitwise identical for any thread count.

use rayon::prelude::*;

/// Parallel map over a range of indices, preserving index order
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    (0..count).into_par_iter().map(f).collect()
}

/// Parallel map over a slice, preserving order
pub fn parallel_map<T, U, F>(data: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    data.par_iter().map(f).collect()
}

/// Parallel mutable iteration over per-item chunks of equal length
///
/// `chunk_len` must evenly divide `data.len()`; chunk `i` is handed to `f`
/// together with its index.
pub fn parallel_for_chunks<T, F>(data: &mut [T], chunk_len: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    debug_assert_eq!(data.len() % chunk_len.max(1), 0);
    data.par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| f(i, chunk));
}
