//! Fixed-length series shifting.
//!
//! Signals are lagged by one bar before they reach the backtest so that a
//! value dated `t` only reflects information complete at `t - 1`.

/// Shift `series` forward by `periods`: `periods` copies of `fill` are
/// inserted at the front and the same number of elements drop off the tail.
///
/// The result always has the same length as the input. When `periods` is
/// at least the length of the series, every element is `fill`.
pub fn shift_forward<T: Clone>(series: &[T], periods: usize, fill: T) -> Vec<T> {
    let len = series.len();
    let lead = periods.min(len);
    let mut shifted = Vec::with_capacity(len);
    shifted.extend(std::iter::repeat_n(fill, lead));
    shifted.extend_from_slice(&series[..len - lead]);
    shifted
}
