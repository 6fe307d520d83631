use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::history::MatchRecord;

const MIN_SIGNAL_LEN: usize = 4;
const DIRECTION_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyComponent {
    pub frequency: usize,
    pub amplitude: f64,
    pub phase: f64,
    pub period: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaveDirection {
    Rising,
    Falling,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveAnalysis {
    pub signal: Vec<f64>,
    pub reconstructed: Vec<f64>,
    pub dominant_frequencies: Vec<FrequencyComponent>,
    pub direction: WaveDirection,
    pub momentum: f64,
}

impl WaveAnalysis {
    fn flat(signal: Vec<f64>) -> Self {
        Self {
            reconstructed: signal.clone(),
            signal,
            dominant_frequencies: Vec::new(),
            direction: WaveDirection::Neutral,
            momentum: 0.0,
        }
    }
}

pub fn matches_to_signal(matches: &[MatchRecord], team: &str) -> Vec<f64> {
    matches.iter().map(|m| m.result_for(team)).collect()
}

/// Direct O(N^2) transform. Returns (real, imag), each of length N.
pub fn dft(signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = signal.len();
    let mut real = vec![0.0; n];
    let mut imag = vec![0.0; n];

    for k in 0..n {
        for (t, &x) in signal.iter().enumerate() {
            let angle = 2.0 * PI * (k * t) as f64 / n as f64;
            real[k] += x * angle.cos();
            imag[k] -= x * angle.sin();
        }
    }
    (real, imag)
}

pub fn idft(real: &[f64], imag: &[f64]) -> Vec<f64> {
    let n = real.len();
    let mut out = vec![0.0; n];

    for (t, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for k in 0..n {
            let angle = 2.0 * PI * (k * t) as f64 / n as f64;
            acc += real[k] * angle.cos() - imag[k] * angle.sin();
        }
        *slot = acc / n as f64;
    }
    out
}

pub fn analyze_form_wave(signal: &[f64], top_n: usize) -> WaveAnalysis {
    let n = signal.len();
    if n < MIN_SIGNAL_LEN {
        return WaveAnalysis::flat(signal.to_vec());
    }

    let (real, imag) = dft(signal);

    // k = 0 is the mean and is never ranked; neither is k = N/2.
    let mut components: Vec<FrequencyComponent> = (1..n / 2)
        .map(|k| FrequencyComponent {
            frequency: k,
            amplitude: (real[k].powi(2) + imag[k].powi(2)).sqrt() / n as f64,
            phase: imag[k].atan2(real[k]),
            period: n as f64 / k as f64,
        })
        .collect();

    // Stable sort keeps lower frequencies first on equal amplitude.
    components.sort_by(|a, b| b.amplitude.total_cmp(&a.amplitude));
    components.truncate(top_n);

    let mut kept_real = vec![0.0; n];
    let mut kept_imag = vec![0.0; n];
    kept_real[0] = real[0];
    for c in &components {
        kept_real[c.frequency] = real[c.frequency];
        kept_imag[c.frequency] = imag[c.frequency];
    }
    let reconstructed = idft(&kept_real, &kept_imag);

    let delta = reconstructed[n - 1] - reconstructed[n - 2];
    let direction = if delta > DIRECTION_THRESHOLD {
        WaveDirection::Rising
    } else if delta < -DIRECTION_THRESHOLD {
        WaveDirection::Falling
    } else {
        WaveDirection::Neutral
    };

    WaveAnalysis {
        signal: signal.to_vec(),
        reconstructed,
        dominant_frequencies: components,
        direction,
        momentum: (delta * 2.0).clamp(-1.0, 1.0),
    }
}

pub fn predict_next_wave_point(analysis: &WaveAnalysis) -> f64 {
    let n = analysis.signal.len();
    if n == 0 {
        return 0.0;
    }

    let cycles: f64 = analysis
        .dominant_frequencies
        .iter()
        .map(|f| {
            let angle = 2.0 * PI * (f.frequency * n) as f64 / n as f64;
            f.amplitude * (angle + f.phase).cos()
        })
        .sum();

    let mean = analysis.signal.iter().sum::<f64>() / n as f64;
    mean + cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_signals_are_passed_through() {
        for signal in [vec![], vec![1.0], vec![1.0, -1.0, 1.0]] {
            let w = analyze_form_wave(&signal, 3);
            assert_eq!(w.momentum, 0.0);
            assert_eq!(w.direction, WaveDirection::Neutral);
            assert_eq!(w.reconstructed, signal);
            assert!(w.dominant_frequencies.is_empty());
        }
    }

    #[test]
    fn two_match_cycle_has_period_four() {
        let signal = [1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0];
        let w = analyze_form_wave(&signal, 3);
        let top = w.dominant_frequencies[0];
        assert_eq!(top.frequency, 2);
        assert!((top.period - 4.0).abs() < 1e-12);
        assert!((top.amplitude - 0.5_f64.sqrt()).abs() < 1e-9);
        assert!(w.momentum.abs() < 1e-9);
    }

    #[test]
    fn half_length_bin_is_not_ranked() {
        // A strict win/loss alternation lives entirely in k = N/2.
        let signal = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let w = analyze_form_wave(&signal, 3);
        assert_eq!(w.dominant_frequencies.len(), 3);
        assert!(w.dominant_frequencies.iter().all(|f| f.frequency < 4));
        assert!(w.dominant_frequencies.iter().all(|f| f.amplitude < 1e-9));
        assert_eq!(w.direction, WaveDirection::Neutral);
        assert!(w.momentum.abs() < 1e-9);
    }

    #[test]
    fn odd_length_ranks_below_half() {
        // N = 9: k = 4 is an ordinary bin but still outside the ranked range.
        let signal = [1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        let w = analyze_form_wave(&signal, 3);
        let freqs: Vec<usize> = w.dominant_frequencies.iter().map(|f| f.frequency).collect();
        assert_eq!(freqs, vec![1, 3, 2]);
        assert!((w.dominant_frequencies[0].amplitude - 0.170232).abs() < 1e-6);
        assert_eq!(w.direction, WaveDirection::Falling);
        assert!((w.momentum - -0.287614).abs() < 1e-6);
    }

    #[test]
    fn reconstruction_keeps_length() {
        for n in 4..=20 {
            let signal: Vec<f64> = (0..n).map(|i| ((i * 7) % 3) as f64 - 1.0).collect();
            let w = analyze_form_wave(&signal, 3);
            assert_eq!(w.reconstructed.len(), n);
            assert!(w.dominant_frequencies.len() <= 3);
            assert!((-1.0..=1.0).contains(&w.momentum));
        }
    }

    #[test]
    fn constant_signal_is_neutral() {
        let w = analyze_form_wave(&[0.0; 10], 3);
        assert_eq!(w.direction, WaveDirection::Neutral);
        assert!(w.momentum.abs() < 1e-12);
        assert!(w.reconstructed.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn dft_then_idft_recovers_signal() {
        let signal = [1.0, 0.0, -1.0, 1.0, 1.0, 0.0];
        let (re, im) = dft(&signal);
        let back = idft(&re, &im);
        for (a, b) in signal.iter().zip(back) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn matches_map_to_results() {
        let matches = vec![
            MatchRecord::new("A", "B", 2, 0),
            MatchRecord::new("C", "A", 1, 1),
            MatchRecord::new("D", "A", 3, 1),
        ];
        assert_eq!(matches_to_signal(&matches, "A"), vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn next_point_of_flat_signal_is_its_mean() {
        let w = analyze_form_wave(&[1.0; 6], 3);
        assert!((predict_next_wave_point(&w) - 1.0).abs() < 1e-9);
    }
}
