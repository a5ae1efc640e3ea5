//! Common test utilities

#![allow(dead_code)]

/// Generate a sine test signal
pub fn generate_test_signal(
    length: usize,
    sample_rate: u32,
    frequency: f32,
    amplitude: f32,
) -> Vec<i16> {
    let mut signal = Vec::with_capacity(length);

    for i in 0..length {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * std::f32::consts::PI * frequency * t).sin() * amplitude;
        signal.push(sample.clamp(-32768.0, 32767.0) as i16);
    }

    signal
}

/// Largest sample-to-sample step in a signal
pub fn max_step(samples: &[i16]) -> i32 {
    samples
        .windows(2)
        .map(|w| (i32::from(w[1]) - i32::from(w[0])).abs())
        .max()
        .unwrap_or(0)
}

/// Root mean square level of a signal
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt()
}
