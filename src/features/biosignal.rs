//! Biosignal feature extraction.
//!
//! HRV math (RMSSD, SDNN) is computed directly from the RR-interval series
//! carried on the latest `BiosignalSample`; other fields normalize a single
//! scalar reading into a bounded range. All formulas degrade to the `Default`
//! neutral value when their input is absent — see SPEC_FULL.md §4.3.

use crate::types::{BiosignalSample, ProcessedBiosignals};

// Literal offset/scale pair from SPEC_FULL.md §3: normalized_hr = clamp((hr−50)/70),
// normalized_hrv = clamp((hrv−20)/80).
const HR_OFFSET: f64 = 50.0;
const HR_SCALE: f64 = 70.0;
const HRV_OFFSET: f64 = 20.0;
const HRV_SCALE: f64 = 80.0;

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn normalize(value: f64, offset: f64, scale: f64) -> f64 {
    clamp01((value - offset) / scale)
}

/// Root mean square of successive RR-interval differences.
pub fn rmssd(rr_intervals: &[f64]) -> f64 {
    if rr_intervals.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = rr_intervals
        .windows(2)
        .map(|w| (w[1] - w[0]).powi(2))
        .sum();
    (sum_sq / (rr_intervals.len() - 1) as f64).sqrt()
}

/// Standard deviation of RR intervals.
pub fn sdnn(rr_intervals: &[f64]) -> f64 {
    if rr_intervals.is_empty() {
        return 0.0;
    }
    let mean = rr_intervals.iter().sum::<f64>() / rr_intervals.len() as f64;
    let sum_sq: f64 = rr_intervals.iter().map(|rr| (rr - mean).powi(2)).sum();
    (sum_sq / rr_intervals.len() as f64).sqrt()
}

/// Derive `ProcessedBiosignals` from the latest raw sample.
pub fn compute(sample: &BiosignalSample) -> ProcessedBiosignals {
    let rr_intervals = sample.rr_intervals.clone().unwrap_or_default();
    let motion_energy = sample
        .motion
        .as_ref()
        .and_then(|m| m.energy)
        .unwrap_or(0.0);

    ProcessedBiosignals {
        normalized_hr: sample.heart_rate.map_or(0.0, |hr| normalize(hr, HR_OFFSET, HR_SCALE)),
        normalized_hrv: sample.hrv.map_or(0.0, |hrv| normalize(hrv, HRV_OFFSET, HRV_SCALE)),
        rmssd: rmssd(&rr_intervals),
        sdnn: sdnn(&rr_intervals),
        motion_energy: clamp01(motion_energy),
        rr_intervals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rmssd_and_sdnn_match_known_values() {
        // rr deltas: 10, -10, 10 -> squared: 100, 100, 100 -> mean 100 -> sqrt 10
        let rr = vec![800.0, 810.0, 800.0, 810.0];
        assert!((rmssd(&rr) - 10.0).abs() < 1e-9);
        // mean = 805, deviations: -5, 5, -5, 5 -> sq: 25 each -> mean 25 -> sqrt 5
        assert!((sdnn(&rr) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn rmssd_and_sdnn_match_monotonic_rr_sequence() {
        // rr deltas: 10, 10, 10 -> squared: 100 each -> sum 300 / (n-1)=3 -> sqrt 10
        let rr = vec![800.0, 810.0, 820.0, 830.0];
        assert!((rmssd(&rr) - 10.0).abs() < 1e-9);
        // mean = 815, deviations: -15, -5, 5, 15 -> sq sum 500 / 4 = 125 -> sqrt ~11.1803
        assert!((sdnn(&rr) - 11.180_339_887_498_949).abs() < 1e-9);
    }

    #[test]
    fn constant_rr_sequence_yields_zero_hrv() {
        let rr = vec![800.0, 800.0, 800.0];
        assert_eq!(rmssd(&rr), 0.0);
        assert_eq!(sdnn(&rr), 0.0);
    }

    #[test]
    fn normalization_uses_spec_literal_offset_and_scale() {
        let sample = BiosignalSample {
            heart_rate: Some(120.0),
            hrv: Some(100.0),
            ..Default::default()
        };
        let processed = compute(&sample);
        assert!((processed.normalized_hr - (120.0 - 50.0) / 70.0).abs() < 1e-9);
        assert!((processed.normalized_hrv - (100.0 - 20.0) / 80.0).abs() < 1e-9);
    }

    #[test]
    fn empty_sample_yields_neutral_defaults() {
        let sample = BiosignalSample::default();
        let processed = compute(&sample);
        assert_eq!(processed.normalized_hr, 0.0);
        assert_eq!(processed.rmssd, 0.0);
        assert_eq!(processed.sdnn, 0.0);
    }
}
