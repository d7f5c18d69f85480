//! Re-grouping of daily counts into coarser periods.

use super::period::{BucketKey, Period};
use super::types::{Series, TimePoint};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Re-bucket date-ordered points under `period`.
///
/// Points sharing a bucket are summed into the first point seen for that
/// bucket, which keeps its date. Output order is the order in which buckets
/// first appear. `Period::Day` returns the input unchanged.
pub fn rebucket(points: &[TimePoint], period: Period) -> Vec<TimePoint> {
    if period == Period::Day {
        return points.to_vec();
    }

    let mut buckets: Vec<TimePoint> = Vec::new();
    let mut slots: HashMap<BucketKey, usize> = HashMap::new();

    for point in points {
        match slots.entry(period.bucket_key(point.x)) {
            Entry::Occupied(slot) => {
                let bucket = &mut buckets[*slot.get()];
                bucket.y = bucket.y.saturating_add(point.y);
            }
            Entry::Vacant(slot) => {
                slot.insert(buckets.len());
                buckets.push(*point);
            }
        }
    }

    buckets
}

/// Re-bucket every series independently, keeping labels and visibility
pub fn rebucket_all(series: &[Series], period: Period) -> Vec<Series> {
    series
        .iter()
        .map(|s| Series {
            label: s.label.clone(),
            hidden: s.hidden,
            data: rebucket(&s.data, period),
        })
        .collect()
}
