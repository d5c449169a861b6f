//! Arc-length tables and arc-length to parameter remapping.

use std::sync::OnceLock;

use cagd_core::{CagdError, Result};
use tracing::{debug, trace};

use super::Curve;

/// Samples used for arc-length tables unless a curve asks for another count.
pub const DEFAULT_ARC_LENGTH_DIVISIONS: usize = 200;

/// Lazily built cumulative arc-length table owned by a curve.
///
/// Filling the cache needs only a shared reference. Clearing it requires
/// `&mut`, so the owner decides when its shape has changed.
#[derive(Debug, Clone, Default)]
pub struct ArcLengthCache {
    table: OnceLock<Vec<f64>>,
}

impl ArcLengthCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&[f64]> {
        self.table.get().map(Vec::as_slice)
    }

    pub fn is_valid(&self) -> bool {
        self.table.get().is_some()
    }

    /// Return the cached table, building it with `build` first if empty.
    pub fn get_or_try_build(
        &self,
        build: impl FnOnce() -> Result<Vec<f64>>,
    ) -> Result<&[f64]> {
        if let Some(table) = self.table.get() {
            return Ok(table.as_slice());
        }
        let table = build()?;
        Ok(self.table.get_or_init(|| table).as_slice())
    }

    /// Drop the cached table; the next lookup rebuilds it.
    pub fn invalidate(&mut self) {
        if self.table.take().is_some() {
            trace!("arc-length table invalidated");
        }
    }
}

/// Sample `curve` at `divisions + 1` uniform parameters and accumulate chord lengths.
///
/// The first entry is `0.0` and the table is non-decreasing.
pub fn cumulative_lengths<C: Curve + ?Sized>(curve: &C, divisions: usize) -> Result<Vec<f64>> {
    if divisions == 0 {
        return Err(CagdError::InvalidArgument(
            "arc-length table needs at least one division".into(),
        ));
    }

    let mut lengths = Vec::with_capacity(divisions + 1);
    let mut last = curve.point_at(0.0)?;
    let mut sum = 0.0;
    lengths.push(sum);

    for i in 1..=divisions {
        let current = curve.point_at(i as f64 / divisions as f64)?;
        sum += current.distance(last);
        lengths.push(sum);
        last = current;
    }

    debug!(divisions, length = sum, "built arc-length table");
    Ok(lengths)
}

/// Map an absolute arc length onto the curve's native parameter in `[0, 1]`.
///
/// Finds the last sample whose cumulative length does not exceed `target` and
/// interpolates linearly inside the following segment. A target that lands on a
/// sample exactly returns that sample's parameter.
pub(crate) fn parameter_at_length(lengths: &[f64], target: f64) -> f64 {
    let last = lengths.len() - 1;
    if last == 0 {
        return 0.0;
    }

    let mut low = 0isize;
    let mut high = last as isize;
    while low <= high {
        let mid = low + (high - low) / 2;
        let comparison = lengths[mid as usize] - target;
        if comparison < 0.0 {
            low = mid + 1;
        } else if comparison > 0.0 {
            high = mid - 1;
        } else {
            high = mid;
            break;
        }
    }

    let i = high.max(0) as usize;
    if lengths[i] == target {
        return i as f64 / last as f64;
    }
    if i >= last {
        return 1.0;
    }

    let before = lengths[i];
    let after = lengths[i + 1];
    let fraction = (target - before) / (after - before);
    (i as f64 + fraction) / last as f64
}
