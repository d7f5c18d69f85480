//! Linear rescaling of raw weights into display sizes.

/// Display radius range for nodes
pub const NODE_SIZE_RANGE: (f32, f32) = (1.0, 7.0);

/// Display width range for edges
pub const EDGE_WIDTH_RANGE: (f32, f32) = (0.2, 0.5);

/// Observed (min, max) over the finite values, `None` when there are none
pub fn observed_range<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Map `value` from `observed` onto `target`.
///
/// A degenerate or missing observed range, or a non-finite value, yields the
/// midpoint of `target`. The result is always finite and inside `target`.
pub fn rescale(value: f64, observed: Option<(f64, f64)>, target: (f32, f32)) -> f32 {
    let (lo, hi) = target;
    let mid = (lo + hi) / 2.0;

    let Some((min, max)) = observed else {
        return mid;
    };
    let span = max - min;
    if !value.is_finite() || !span.is_finite() || span <= f64::EPSILON {
        return mid;
    }

    let t = ((value - min) / span).clamp(0.0, 1.0) as f32;
    lo + t * (hi - lo)
}
