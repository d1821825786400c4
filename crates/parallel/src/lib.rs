//! Declarative parallel/sequential execution utilities.
//!
//! Helpers that abstract over parallel vs sequential execution based on the
//! `parallel` feature flag. The `cfg` logic lives here in ONE place, keeping
//! call sites clean.
//!
//! # Runtime Override
//!
//! [`map_slice`] accepts a `force_sequential` parameter. When `true`,
//! execution is sequential even if the `parallel` feature is enabled. The
//! trainer exposes this as a config switch so candidate fits can be profiled
//! or debugged one at a time.
//!
//! # Example
//!
//! ```
//! let squares = parallel::map_slice(&[1, 2, 3], |x| x * x, false);
//! assert_eq!(squares, vec![1, 4, 9]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Map a function over a slice, potentially in parallel.
///
/// Results come back in input order regardless of execution mode.
#[inline]
pub fn map_slice<T, F, R>(slice: &[T], f: F, force_sequential: bool) -> Vec<R>
where
    T: Sync,
    F: Fn(&T) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        if force_sequential {
            slice.iter().map(f).collect()
        } else {
            slice.par_iter().map(f).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let _ = force_sequential;
        slice.iter().map(f).collect()
    }
}

/// Whether this build can execute in parallel at all.
pub const fn is_parallel_build() -> bool {
    cfg!(feature = "parallel")
}
