use ndarray::ArrayView2;

use crate::consts::THRESHOLD_HISTOGRAM_BINS;
use crate::error::{CloudBandError, Result};

use super::config::ThresholdMethod;

/// Compute the threshold value using the configured method.
///
/// Automatic methods build their histogram over the finite values of the
/// snapshot, spanning its own minimum to maximum.
pub fn compute_threshold(data: ArrayView2<f32>, method: &ThresholdMethod) -> Result<f32> {
    match method {
        ThresholdMethod::Fixed(v) => Ok(*v),
        ThresholdMethod::Otsu => Ok(otsu_threshold(&histogram(data)?)),
        ThresholdMethod::Yen => Ok(yen_threshold(&histogram(data)?)),
    }
}

/// Equal-width histogram over `[min, max]` of the finite values.
#[derive(Clone, Debug)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub bin_centers: Vec<f64>,
}

pub fn histogram(data: ArrayView2<f32>) -> Result<Histogram> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in data.iter().filter(|v| v.is_finite()) {
        min = min.min(v as f64);
        max = max.max(v as f64);
    }
    if !min.is_finite() {
        return Err(CloudBandError::CorruptSnapshot {
            reason: "no finite values to build a histogram from".into(),
        });
    }
    if min == max {
        return Ok(Histogram {
            counts: vec![data.iter().filter(|v| v.is_finite()).count() as u64],
            bin_centers: vec![min],
        });
    }

    let bins = THRESHOLD_HISTOGRAM_BINS;
    let width = (max - min) / bins as f64;
    let mut counts = vec![0u64; bins];
    for &v in data.iter().filter(|v| v.is_finite()) {
        let bin = (((v as f64 - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    let bin_centers = (0..bins).map(|i| min + (i as f64 + 0.5) * width).collect();
    Ok(Histogram {
        counts,
        bin_centers,
    })
}

/// Otsu's thresholding: the bin center maximizing between-class variance.
pub fn otsu_threshold(hist: &Histogram) -> f32 {
    let n = hist.counts.len();
    if n == 1 {
        return hist.bin_centers[0] as f32;
    }

    let total: f64 = hist.counts.iter().map(|&c| c as f64).sum();
    let sum_all: f64 = hist
        .counts
        .iter()
        .zip(&hist.bin_centers)
        .map(|(&c, &x)| c as f64 * x)
        .sum();

    let mut weight_bg = 0.0_f64;
    let mut sum_bg = 0.0_f64;
    let mut best_variance = f64::NEG_INFINITY;
    let mut best_bin = 0usize;

    // Split after bin i: background = [0..=i], foreground = [i+1..n).
    for i in 0..n - 1 {
        let count = hist.counts[i] as f64;
        weight_bg += count;
        sum_bg += count * hist.bin_centers[i];
        let weight_fg = total - weight_bg;
        if weight_bg == 0.0 || weight_fg == 0.0 {
            continue;
        }
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let between_variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);

        if between_variance > best_variance {
            best_variance = between_variance;
            best_bin = i;
        }
    }

    hist.bin_centers[best_bin] as f32
}

/// Yen's thresholding: the bin center maximizing the entropic correlation
/// `ln[(P1 (1 - P1))^2 / (S1 * S2)]`, with `P1` the cumulative mass up to the
/// split and `S1`, `S2` the sums of squared masses on either side.
pub fn yen_threshold(hist: &Histogram) -> f32 {
    let n = hist.counts.len();
    if n == 1 {
        return hist.bin_centers[0] as f32;
    }

    let total: f64 = hist.counts.iter().map(|&c| c as f64).sum();
    let pmf: Vec<f64> = hist.counts.iter().map(|&c| c as f64 / total).collect();

    // Squared mass of bins [i..n).
    let mut tail_sq = vec![0.0_f64; n + 1];
    for i in (0..n).rev() {
        tail_sq[i] = tail_sq[i + 1] + pmf[i] * pmf[i];
    }

    let mut p1 = 0.0_f64;
    let mut head_sq = 0.0_f64;
    let mut best_crit = f64::NEG_INFINITY;
    let mut best_bin = 0usize;

    for i in 0..n - 1 {
        p1 += pmf[i];
        head_sq += pmf[i] * pmf[i];
        let spread = p1 * (1.0 - p1);
        let denom = head_sq * tail_sq[i + 1];
        if spread <= 0.0 || denom <= 0.0 {
            continue;
        }
        let crit = (spread * spread / denom).ln();
        if crit > best_crit {
            best_crit = crit;
            best_bin = i;
        }
    }

    hist.bin_centers[best_bin] as f32
}
