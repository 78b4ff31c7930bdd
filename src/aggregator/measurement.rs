//! Measurement aggregation math (spec §4.6): count/sum/min/max/stddev over
//! buffered samples, with NaN exclusion and `EnsureConcreteValue` clamping.

use super::buffered::Fold;
use crate::aggregate::AggregatePayload;

/// Running state accumulated across flushed buffers for one period.
pub struct MeasurementRunning {
    count: i64,
    sum: f64,
    min: f64,
    max: f64,
    sum_of_squares: f64,
}

impl Default for MeasurementRunning {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum_of_squares: 0.0,
        }
    }
}

/// Marker type selecting the Measurement fold/finalize behavior for
/// [`crate::aggregator::BufferedAggregation`].
pub struct MeasurementFold;

impl Fold for MeasurementFold {
    type Running = MeasurementRunning;

    const BUFFER_CAPACITY: usize = 500;
    const SPARE_BUFFER_POOL: usize = 3;
    const IS_COLLECT_SYNCHRONIZED: bool = false;

    fn can_collect(_value: f64) -> bool {
        true
    }

    fn fold_into(running: &mut MeasurementRunning, values: &[f64]) {
        // Initial min/max come from the first sample even if it is NaN;
        // the NaN-comparisons below then never move them, which is exactly
        // how the merge step reconciles a NaN-poisoned buffer (spec §4.6).
        let mut buf_count = 0i64;
        let mut buf_sum = 0.0_f64;
        let mut buf_sum_sq = 0.0_f64;
        let mut buf_min = values.first().copied().unwrap_or(f64::INFINITY);
        let mut buf_max = values.first().copied().unwrap_or(f64::NEG_INFINITY);

        for &v in values {
            if v.is_nan() {
                continue;
            }
            buf_count += 1;
            buf_sum += v;
            buf_sum_sq += v * v;
            if v < buf_min {
                buf_min = v;
            }
            if v > buf_max {
                buf_max = v;
            }
        }

        running.count += buf_count;
        running.sum += buf_sum;
        running.sum_of_squares += buf_sum_sq;
        if buf_min < running.min {
            running.min = buf_min;
        }
        if buf_max > running.max {
            running.max = buf_max;
        }
    }

    fn finalize(running: &MeasurementRunning) -> AggregatePayload {
        let std_dev = compute_std_dev(running.count, running.sum, running.sum_of_squares);
        AggregatePayload::Measurement {
            count: i32::try_from(running.count).unwrap_or(i32::MAX),
            sum: ensure_concrete(running.sum),
            min: ensure_concrete(running.min),
            max: ensure_concrete(running.max),
            std_dev: ensure_concrete(std_dev),
        }
    }
}

fn compute_std_dev(count: i64, sum: f64, sum_of_squares: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    if sum.is_infinite() || sum_of_squares.is_infinite() {
        return f64::NAN;
    }
    let n = count as f64;
    let mean = sum / n;
    let variance = (sum_of_squares / n) - mean * mean;
    variance.max(0.0).sqrt()
}

fn ensure_concrete(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-f64::MAX, f64::MAX)
    }
}
