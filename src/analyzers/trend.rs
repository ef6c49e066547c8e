use crate::analyzers::aggregate::canonical_readings;
use crate::analyzers::types::TrendPoint;
use crate::analyzers::utility::average;
use crate::readings::Reading;
use std::collections::BTreeMap;

#[derive(Debug)]
struct Bucket {
    total_percentage: f64,
    sample_count: usize,
    peak_occupancy: f64,
}

/// Regroups readings by their exact timestamp string into a chart series.
///
/// Zone and floor are ignored; callers filter beforehand. Each point averages
/// the percentages of its bucket and takes the highest occupancy reported in
/// that bucket. Points come out in ascending lexical timestamp order, which
/// is chronological for zero-padded ISO-8601 strings.
pub fn group_by_timestamp(readings: &[Reading]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<&str, Bucket> = BTreeMap::new();

    for (reading, _) in canonical_readings(readings) {
        buckets
            .entry(reading.timestamp.as_str())
            .and_modify(|b| {
                b.total_percentage += reading.occupancy_percentage;
                b.sample_count += 1;
                b.peak_occupancy = b.peak_occupancy.max(reading.total_occupancy);
            })
            .or_insert(Bucket {
                total_percentage: reading.occupancy_percentage,
                sample_count: 1,
                peak_occupancy: reading.total_occupancy,
            });
    }

    buckets
        .into_iter()
        .map(|(timestamp, b)| TrendPoint {
            timestamp: timestamp.to_string(),
            average_occupancy_percentage: average(b.total_percentage, b.sample_count),
            peak_occupancy: b.peak_occupancy,
        })
        .collect()
}
