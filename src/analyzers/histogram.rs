//! Fixed-width bucketing of a numeric field.

use crate::record::{FlightRecord, TimeField};
use serde::Serialize;
use std::borrow::Borrow;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistogramError {
    #[error("bin width must be positive and finite, got {0}")]
    InvalidWidth(String),
}

/// A non-empty bucket. `bin` is the floor-aligned lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin<V> {
    pub bin: V,
    pub count: usize,
}

/// Numeric domain a histogram can be computed in.
///
/// Bucketing stays inside the domain: integers use Euclidean division, floats
/// use `floor`, and nothing is converted between the two.
pub trait BinValue: Copy + PartialEq + std::fmt::Display {
    fn is_valid_width(self) -> bool;

    /// Largest multiple of `width` that is `<= self`, or `None` when the value
    /// cannot be bucketed in this domain.
    fn bucket_start(self, width: Self) -> Option<Self>;

    fn cmp_total(&self, other: &Self) -> std::cmp::Ordering;
}

impl BinValue for i64 {
    fn is_valid_width(self) -> bool {
        self > 0
    }

    // Near i64::MIN the aligned bucket start is not representable.
    fn bucket_start(self, width: Self) -> Option<Self> {
        self.div_euclid(width).checked_mul(width)
    }

    fn cmp_total(&self, other: &Self) -> std::cmp::Ordering {
        self.cmp(other)
    }
}

impl BinValue for f64 {
    fn is_valid_width(self) -> bool {
        self.is_finite() && self > 0.0
    }

    fn bucket_start(self, width: Self) -> Option<Self> {
        if !self.is_finite() {
            return None;
        }
        // The quotient and the product both round, so the floored quotient
        // can be one off in either direction.
        let mut q = (self / width).floor();
        if q * width > self {
            q -= 1.0;
        } else if (q + 1.0) * width <= self {
            q += 1.0;
        }
        let start = q * width;
        (start.is_finite() && start <= self).then_some(start)
    }

    fn cmp_total(&self, other: &Self) -> std::cmp::Ordering {
        self.total_cmp(other)
    }
}

/// Counts `items` into buckets of `width`, sorted ascending by bucket start.
///
/// Empty buckets are not emitted. Values the domain cannot bucket (NaN or
/// infinite floats, integers whose bucket start would overflow) are skipped
/// with a warning.
///
/// # Errors
///
/// Returns [`HistogramError::InvalidWidth`] if `width` is not strictly positive.
pub fn make_histogram<T, V, F>(
    items: &[T],
    value_fn: F,
    width: V,
) -> Result<Vec<HistogramBin<V>>, HistogramError>
where
    V: BinValue,
    F: Fn(&T) -> V,
{
    if !width.is_valid_width() {
        return Err(HistogramError::InvalidWidth(width.to_string()));
    }

    let mut starts = Vec::with_capacity(items.len());
    let mut skipped = 0usize;
    for item in items {
        match value_fn(item).bucket_start(width) {
            Some(start) => starts.push(start),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "Skipped values that cannot be bucketed");
    }

    starts.sort_by(|a, b| a.cmp_total(b));

    let mut bins: Vec<HistogramBin<V>> = Vec::new();
    for start in starts {
        match bins.last_mut() {
            Some(last) if last.bin == start => last.count += 1,
            _ => bins.push(HistogramBin {
                bin: start,
                count: 1,
            }),
        }
    }

    Ok(bins)
}

/// Histogram of one of the integer time fields of `records`.
pub fn histogram_by_time_field<R>(
    records: &[R],
    field: TimeField,
    width: i64,
) -> Result<Vec<HistogramBin<i64>>, HistogramError>
where
    R: Borrow<FlightRecord>,
{
    make_histogram(records, |r| field.value(<R as Borrow<FlightRecord>>::borrow(r)), width)
}
