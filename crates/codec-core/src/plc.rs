//! Packet Loss Concealment (PLC) implementation
//!
//! Waveform-substitution concealment in the manner of ITU-T G.711 Appendix I.
//! The engine keeps a short history of decoded audio. When a frame is lost,
//! it estimates the pitch period of the most recent speech and repeats that
//! period, overlap-adding at every join so the synthetic signal has no
//! clicks.
//!
//! ## Frame timing
//!
//! The engine works on 10 ms frames. Output lags input by
//! [`Plc::delay_samples`] samples (3.75 ms). That slack lets the start of an
//! erasure be cross-faded into audio that has not been emitted yet.
//!
//! ## Long erasures
//!
//! - Frames 1 to 3 of an erasure use a pitch buffer of one, two, then three
//!   periods.
//! - From the second lost frame on, the output is faded linearly by
//!   [`PlcConfig::attenuation_per_frame`] per frame. It is silent once the
//!   gain reaches zero (60 ms with the default 20 %).
//! - The first good frame after an erasure is cross-faded with the synthetic
//!   continuation. The longer the erasure, the longer the cross-fade.
//!
//! All buffers are fixed-size arrays sized for the highest supported rate;
//! the engine never allocates after construction.

use crate::error::{CodecError, Result};
use crate::types::SampleRate;
use crate::utils::validation::{validate_block, validate_sample_rate};
use std::fmt;
use tracing::{debug, trace};

/// Sample rates the concealment engine can be configured for
pub const SUPPORTED_RATES: &[u32] = &[8000, 16000];

/// Default gain reduction per concealed frame
pub const DEFAULT_ATTENUATION_PER_FRAME: f32 = 0.2;

// Geometry at 8 kHz; everything scales with the rate
const PITCH_MIN_8K: usize = 40; // 200 Hz
const PITCH_MAX_8K: usize = 120; // 66.7 Hz
const CORR_LEN_8K: usize = 160; // 20 ms correlation window
const FRAME_SIZE_8K: usize = 80; // 10 ms
const EOVERLAP_INCR_8K: usize = 32; // 4 ms more cross-fade per lost frame
const NDEC_8K: usize = 2; // coarse pitch search decimation

/// Floor for the energy normalization in the pitch search
const CORR_MIN_POWER: f32 = 250.0;

const MAX_RATE_FACTOR: usize = 2;
const MAX_PITCH: usize = PITCH_MAX_8K * MAX_RATE_FACTOR;
const MAX_OVERLAP: usize = MAX_PITCH / 4;
const MAX_HISTORY: usize = 3 * MAX_PITCH + MAX_OVERLAP;
const MAX_FRAME: usize = FRAME_SIZE_8K * MAX_RATE_FACTOR;

/// Configuration options for PLC
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlcConfig {
    /// Sample rate of the concealed stream
    pub sample_rate: SampleRate,

    /// Fraction of full gain removed per concealed frame (0, 1]
    pub attenuation_per_frame: f32,
}

impl PlcConfig {
    /// Create a configuration for the given rate with default attenuation
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            attenuation_per_frame: DEFAULT_ATTENUATION_PER_FRAME,
        }
    }

    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: SampleRate) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the gain reduction per concealed frame
    pub fn with_attenuation_per_frame(mut self, attenuation: f32) -> Self {
        self.attenuation_per_frame = attenuation;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_sample_rate(self.sample_rate, SUPPORTED_RATES)?;

        let att = self.attenuation_per_frame;
        if !att.is_finite() || att <= 0.0 || att > 1.0 {
            return Err(CodecError::invalid_config(format!(
                "PLC attenuation per frame must be in (0, 1], got {}",
                att
            )));
        }

        Ok(())
    }
}

impl Default for PlcConfig {
    fn default() -> Self {
        Self::new(SampleRate::Rate8000)
    }
}

/// Concealment state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlcState {
    /// No good frame seen since configuration or reset
    NoHistory,
    /// Passing good frames through
    Normal,
    /// Synthesizing audio for lost frames
    Concealing {
        /// Lost frames so far in this erasure
        consecutive: u32,
    },
}

/// Running counters for one engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlcStats {
    /// Good frames processed
    pub good_frames: u64,
    /// Frames synthesized
    pub concealed_frames: u64,
    /// Erasures (runs of consecutive lost frames)
    pub concealment_events: u64,
    /// Longest erasure seen, in frames
    pub longest_erasure: u32,
    /// Pitch period chosen for the most recent erasure, in samples
    pub last_pitch: Option<usize>,
}

/// Rate-dependent sizes, fixed by `configure`
#[derive(Debug, Clone, Copy)]
struct Geometry {
    frame_size: usize,
    pitch_min: usize,
    pitch_max: usize,
    overlap_max: usize,
    history_len: usize,
    corr_len: usize,
    ndec: usize,
    eoverlap_incr: usize,
    attenuation: f32,
    attenuation_incr: f32,
    silent_after: u32,
}

impl Geometry {
    fn for_config(config: &PlcConfig) -> Result<Self> {
        config.validate()?;

        let factor = (config.sample_rate.hz() / 8000) as usize;
        let pitch_max = PITCH_MAX_8K * factor;
        let overlap_max = pitch_max >> 2;
        let frame_size = FRAME_SIZE_8K * factor;
        let attenuation = config.attenuation_per_frame;

        Ok(Self {
            frame_size,
            pitch_min: PITCH_MIN_8K * factor,
            pitch_max,
            overlap_max,
            history_len: 3 * pitch_max + overlap_max,
            corr_len: CORR_LEN_8K * factor,
            ndec: NDEC_8K * factor,
            eoverlap_incr: EOVERLAP_INCR_8K * factor,
            attenuation,
            attenuation_incr: attenuation / frame_size as f32,
            // Frame n of an erasure starts at gain 1 - (n - 1) * attenuation
            silent_after: (1.0 / attenuation).ceil() as u32,
        })
    }

    fn corr_buf_len(&self) -> usize {
        self.corr_len + self.pitch_max
    }

    fn gain_at(&self, erase_count: u32) -> f32 {
        (1.0 - erase_count.saturating_sub(1) as f32 * self.attenuation).max(0.0)
    }
}

/// Packet loss concealment engine
///
/// One engine serves exactly one inbound stream. Feed every frame through
/// either [`Plc::good_frame`] or [`Plc::bad_frame`], in order.
#[derive(Clone)]
pub struct Plc {
    config: PlcConfig,
    geometry: Option<Geometry>,

    /// Most recent output-domain audio, oldest first
    history: [i16; MAX_HISTORY],
    /// Float copy of the history, with the synthetic pitch periods at the end
    pitch_buf: [f32; MAX_HISTORY],
    /// Last quarter period of real audio before the erasure
    last_q: [f32; MAX_OVERLAP],

    erase_count: u32,
    pitch: usize,
    pitch_blen: usize,
    poffset: usize,
    poverlap: usize,
    has_history: bool,
    stats: PlcStats,
}

impl Plc {
    /// Create a configured engine
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidSampleRate`] for rates other than 8 and
    /// 16 kHz and [`CodecError::InvalidConfig`] for an attenuation outside
    /// (0, 1].
    pub fn new(config: PlcConfig) -> Result<Self> {
        let mut plc = Self::unconfigured(config);
        let rate = plc.config.sample_rate;
        plc.configure(rate)?;
        Ok(plc)
    }

    fn unconfigured(config: PlcConfig) -> Self {
        Self {
            config,
            geometry: None,
            history: [0; MAX_HISTORY],
            pitch_buf: [0.0; MAX_HISTORY],
            last_q: [0.0; MAX_OVERLAP],
            erase_count: 0,
            pitch: 0,
            pitch_blen: 0,
            poffset: 0,
            poverlap: 0,
            has_history: false,
            stats: PlcStats::default(),
        }
    }

    /// Fix the sample rate and derived sizes, discarding all history
    ///
    /// May be called again at any time; every call is a full reset.
    pub fn configure(&mut self, sample_rate: SampleRate) -> Result<()> {
        let config = self.config.clone().with_sample_rate(sample_rate);
        let geometry = Geometry::for_config(&config)?;

        debug!(
            "PLC configured for {} ({} samples/frame, pitch {}..{}, delay {})",
            sample_rate,
            geometry.frame_size,
            geometry.pitch_min,
            geometry.pitch_max,
            geometry.overlap_max
        );

        self.config = config;
        self.geometry = Some(geometry);
        self.reset();
        Ok(())
    }

    /// Discard all history and counters, keeping the configuration
    pub fn reset(&mut self) {
        self.history = [0; MAX_HISTORY];
        self.pitch_buf = [0.0; MAX_HISTORY];
        self.last_q = [0.0; MAX_OVERLAP];
        self.erase_count = 0;
        self.pitch = 0;
        self.pitch_blen = 0;
        self.poffset = 0;
        self.poverlap = 0;
        self.has_history = false;
        self.stats = PlcStats::default();
    }

    /// Current configuration
    pub fn config(&self) -> &PlcConfig {
        &self.config
    }

    /// Whether `configure` has succeeded
    pub fn is_configured(&self) -> bool {
        self.geometry.is_some()
    }

    /// Samples per frame, once configured
    pub fn frame_size(&self) -> Option<usize> {
        self.geometry.map(|g| g.frame_size)
    }

    /// How far output lags input, in samples, once configured
    pub fn delay_samples(&self) -> Option<usize> {
        self.geometry.map(|g| g.overlap_max)
    }

    /// Current concealment state
    pub fn state(&self) -> PlcState {
        if self.erase_count > 0 {
            PlcState::Concealing {
                consecutive: self.erase_count,
            }
        } else if self.has_history {
            PlcState::Normal
        } else {
            PlcState::NoHistory
        }
    }

    /// Running counters
    pub fn stats(&self) -> PlcStats {
        self.stats
    }

    /// Process a frame that arrived
    ///
    /// `input` is appended to the history and `output` receives the delayed
    /// stream. If an erasure was in progress, the start of `input` is
    /// cross-faded with the synthetic continuation.
    ///
    /// # Errors
    ///
    /// [`CodecError::NotConfigured`] before `configure`;
    /// [`CodecError::InvalidFrameSize`] if either slice is not one frame long.
    /// `output` is untouched on error.
    pub fn good_frame(&mut self, input: &[i16], output: &mut [i16]) -> Result<()> {
        let g = self.geometry.ok_or(CodecError::NotConfigured)?;
        validate_block(g.frame_size, input.len())?;
        validate_block(g.frame_size, output.len())?;

        let mut frame = [0i16; MAX_FRAME];
        let frame = &mut frame[..g.frame_size];
        frame.copy_from_slice(input);

        if self.erase_count > 0 {
            let olen = (self.poverlap + (self.erase_count as usize - 1) * g.eoverlap_incr)
                .min(g.frame_size);
            let mut synthetic = [0i16; MAX_FRAME];
            let synthetic = &mut synthetic[..olen];
            self.get_fe_speech(synthetic);
            overlap_add_at_end(&mut frame[..olen], synthetic, g.gain_at(self.erase_count));

            debug!(
                "PLC concealment ended after {} frames ({} sample cross-fade)",
                self.erase_count, olen
            );
            self.erase_count = 0;
        }

        self.save_speech(&g, frame, output);
        self.has_history = true;
        self.stats.good_frames += 1;
        trace!("PLC good frame");
        Ok(())
    }

    /// Synthesize a frame for one that was lost
    ///
    /// `output` receives the delayed stream, now continuing with synthetic
    /// audio.
    ///
    /// # Errors
    ///
    /// [`CodecError::NotConfigured`] before `configure`;
    /// [`CodecError::InvalidFrameSize`] if `output` is not one frame long.
    pub fn bad_frame(&mut self, output: &mut [i16]) -> Result<()> {
        let g = self.geometry.ok_or(CodecError::NotConfigured)?;
        validate_block(g.frame_size, output.len())?;

        let mut frame = [0i16; MAX_FRAME];
        let frame = &mut frame[..g.frame_size];

        match self.erase_count {
            0 => self.start_erasure(&g, frame),
            1 | 2 => {
                // Continue from where the last frame stopped, then widen the
                // pitch buffer by one period and blend the two
                let mut tail = [0i16; MAX_OVERLAP];
                let tail = &mut tail[..self.poverlap];
                let saved = self.poffset;
                self.get_fe_speech(tail);
                self.poffset = saved;
                while self.poffset > self.pitch {
                    self.poffset -= self.pitch;
                }

                self.pitch_blen += self.pitch;
                self.blend_pitch_buffer_head(&g);
                self.get_fe_speech(frame);
                overlap_add_samples(tail, frame);
                self.scale_speech(&g, frame);
            }
            n if n > g.silent_after => frame.fill(0),
            _ => {
                self.get_fe_speech(frame);
                self.scale_speech(&g, frame);
            }
        }

        self.erase_count += 1;
        self.save_speech(&g, frame, output);

        self.stats.concealed_frames += 1;
        self.stats.longest_erasure = self.stats.longest_erasure.max(self.erase_count);
        trace!("PLC concealed frame {} of erasure", self.erase_count);
        Ok(())
    }

    /// Process a run of received frames
    ///
    /// `input` and `output` must be the same whole number of frames long.
    /// Lengths are checked before any frame is processed.
    pub fn good_frames(&mut self, input: &[i16], output: &mut [i16]) -> Result<()> {
        let fs = self.whole_frames(input.len())?;
        validate_block(input.len(), output.len())?;

        for (frame_in, frame_out) in input.chunks_exact(fs).zip(output.chunks_exact_mut(fs)) {
            self.good_frame(frame_in, frame_out)?;
        }
        Ok(())
    }

    /// Synthesize a run of lost frames
    ///
    /// `output` must be a whole number of frames long.
    pub fn bad_frames(&mut self, output: &mut [i16]) -> Result<()> {
        let fs = self.whole_frames(output.len())?;

        for frame_out in output.chunks_exact_mut(fs) {
            self.bad_frame(frame_out)?;
        }
        Ok(())
    }

    fn whole_frames(&self, len: usize) -> Result<usize> {
        let fs = self.frame_size().ok_or(CodecError::NotConfigured)?;
        if len == 0 || len % fs != 0 {
            return Err(CodecError::frame_size(len.next_multiple_of(fs).max(fs), len));
        }
        Ok(fs)
    }

    /// First lost frame: find the pitch and build a one-period buffer
    fn start_erasure(&mut self, g: &Geometry, frame: &mut [i16]) {
        let hl = g.history_len;
        for (dst, &src) in self.pitch_buf[..hl].iter_mut().zip(&self.history[..hl]) {
            *dst = f32::from(src);
        }

        self.pitch = self.find_pitch(g);
        self.poverlap = self.pitch >> 2;
        let pov = self.poverlap;
        self.last_q[..pov].copy_from_slice(&self.pitch_buf[hl - pov..hl]);
        self.poffset = 0;
        self.pitch_blen = self.pitch;
        self.blend_pitch_buffer_head(g);

        // The blended tail has not been played yet; replace it in history
        for (dst, &src) in self.history[hl - pov..hl]
            .iter_mut()
            .zip(&self.pitch_buf[hl - pov..hl])
        {
            *dst = src as i16;
        }

        self.get_fe_speech(frame);

        self.stats.concealment_events += 1;
        self.stats.last_pitch = Some(self.pitch);
        debug!(
            "PLC concealment started, pitch {} samples ({:.1} Hz)",
            self.pitch,
            self.config.sample_rate.hz() as f32 / self.pitch as f32
        );
    }

    /// Overlap-add the saved last quarter period onto the quarter period
    /// preceding the pitch buffer, writing the result over the buffer's tail
    fn blend_pitch_buffer_head(&mut self, g: &Geometry) {
        let end = g.history_len;
        let pov = self.poverlap;
        let src = end - self.pitch_blen - pov;
        let dst = end - pov;

        let incr = 1.0 / pov as f32;
        let mut lw = 1.0 - incr;
        let mut rw = incr;
        for i in 0..pov {
            let t = lw * self.last_q[i] + rw * self.pitch_buf[src + i];
            self.pitch_buf[dst + i] = t.clamp(-32768.0, 32767.0);
            lw -= incr;
            rw += incr;
        }
    }

    /// Copy synthetic speech out of the pitch buffer, wrapping at its end
    fn get_fe_speech(&mut self, out: &mut [i16]) {
        if self.pitch_blen == 0 {
            out.fill(0);
            return;
        }

        let start = self.history_len() - self.pitch_blen;
        let mut written = 0;
        while written < out.len() {
            let cnt = (self.pitch_blen - self.poffset).min(out.len() - written);
            let from = start + self.poffset;
            for (dst, &src) in out[written..written + cnt]
                .iter_mut()
                .zip(&self.pitch_buf[from..from + cnt])
            {
                *dst = src as i16;
            }
            self.poffset += cnt;
            if self.poffset == self.pitch_blen {
                self.poffset = 0;
            }
            written += cnt;
        }
    }

    fn history_len(&self) -> usize {
        self.geometry.map_or(0, |g| g.history_len)
    }

    /// Apply the linear fade for the current erasure length
    fn scale_speech(&self, g: &Geometry, frame: &mut [i16]) {
        let mut gain = 1.0 - self.erase_count.saturating_sub(1) as f32 * g.attenuation;
        for sample in frame.iter_mut() {
            *sample = (f32::from(*sample) * gain.max(0.0)) as i16;
            gain -= g.attenuation_incr;
        }
    }

    /// Shift `frame` into history and emit the delayed frame
    fn save_speech(&mut self, g: &Geometry, frame: &[i16], output: &mut [i16]) {
        let hl = g.history_len;
        let fs = g.frame_size;
        self.history.copy_within(fs..hl, 0);
        self.history[hl - fs..hl].copy_from_slice(frame);

        let start = hl - fs - g.overlap_max;
        output.copy_from_slice(&self.history[start..start + fs]);
    }

    /// Estimate the pitch period of the end of the history
    ///
    /// Maximizes the energy-normalized cross-correlation between the last
    /// `corr_len` samples and earlier windows. Searches a decimated grid
    /// first, then refines around the best coarse match.
    fn find_pitch(&self, g: &Geometry) -> usize {
        let buf = &self.pitch_buf;
        let end = g.history_len;
        let l = end - g.corr_len;
        let r = end - g.corr_buf_len();
        let pitch_diff = g.pitch_max - g.pitch_min;
        let reference = &buf[l..end];

        let normalize = |corr: f32, energy: f32| corr / energy.max(CORR_MIN_POWER).sqrt();

        // Coarse search
        let mut rp = r;
        let mut energy = 0.0f32;
        for i in (0..g.corr_len).step_by(g.ndec) {
            energy += buf[rp + i] * buf[rp + i];
        }
        let corr = dot(&buf[rp..rp + g.corr_len], reference, g.ndec);
        let mut best_corr = normalize(corr, energy);
        let mut best_match = 0;

        let mut j = g.ndec;
        while j <= pitch_diff {
            energy -= buf[rp] * buf[rp];
            energy += buf[rp + g.corr_len] * buf[rp + g.corr_len];
            rp += g.ndec;
            let corr = normalize(dot(&buf[rp..rp + g.corr_len], reference, g.ndec), energy);
            if corr >= best_corr {
                best_corr = corr;
                best_match = j;
            }
            j += g.ndec;
        }

        // Fine search
        let lo = best_match.saturating_sub(g.ndec - 1);
        let hi = (best_match + g.ndec - 1).min(pitch_diff);
        let mut rp = r + lo;
        let mut energy = dot(&buf[rp..rp + g.corr_len], &buf[rp..rp + g.corr_len], 1);
        let mut best_corr = normalize(dot(&buf[rp..rp + g.corr_len], reference, 1), energy);
        let mut best_match = lo;

        for j in lo + 1..=hi {
            energy -= buf[rp] * buf[rp];
            energy += buf[rp + g.corr_len] * buf[rp + g.corr_len];
            rp += 1;
            let corr = normalize(dot(&buf[rp..rp + g.corr_len], reference, 1), energy);
            if corr > best_corr {
                best_corr = corr;
                best_match = j;
            }
        }

        g.pitch_max - best_match
    }
}

impl Default for Plc {
    /// An engine that must be configured before use
    fn default() -> Self {
        Self::unconfigured(PlcConfig::default())
    }
}

impl fmt::Debug for Plc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plc")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("pitch", &self.pitch)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn dot(a: &[f32], b: &[f32], step: usize) -> f32 {
    a.iter()
        .zip(b)
        .step_by(step)
        .map(|(x, y)| x * y)
        .sum()
}

/// Cross-fade from `head` into the start of `frame`, in place
fn overlap_add_samples(head: &[i16], frame: &mut [i16]) {
    let incr = 1.0 / head.len() as f32;
    let mut lw = 1.0 - incr;
    let mut rw = incr;
    for (out, &l) in frame.iter_mut().zip(head) {
        let t = lw * f32::from(l) + rw * f32::from(*out);
        *out = t.clamp(-32768.0, 32767.0) as i16;
        lw -= incr;
        rw += incr;
    }
}

/// Cross-fade from faded synthetic audio into the start of a real frame
fn overlap_add_at_end(frame: &mut [i16], synthetic: &[i16], gain: f32) {
    let incr = 1.0 / frame.len() as f32;
    let incr_gain = incr * gain;
    let mut lw = (1.0 - incr) * gain;
    let mut rw = incr;
    for (out, &f) in frame.iter_mut().zip(synthetic) {
        let t = lw * f32::from(f) + rw * f32::from(*out);
        *out = t.clamp(-32768.0, 32767.0) as i16;
        lw -= incr_gain;
        rw += incr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use rustfft::FftPlanner;
    use std::f32::consts::PI;

    fn sine(freq: f32, rate: f32, amplitude: f32, len: usize) -> Vec<i16> {
        (0..len)
            .map(|n| (amplitude * (2.0 * PI * freq * n as f32 / rate).sin()) as i16)
            .collect()
    }

    fn max_delta(samples: &[i16]) -> i32 {
        samples
            .windows(2)
            .map(|w| (i32::from(w[1]) - i32::from(w[0])).abs())
            .max()
            .unwrap_or(0)
    }

    fn rms(samples: &[i16]) -> f32 {
        let sum: f32 = samples.iter().map(|&s| f32::from(s) * f32::from(s)).sum();
        (sum / samples.len() as f32).sqrt()
    }

    /// Run `pattern` (true = good) over `signal`, returning the output stream
    fn run(plc: &mut Plc, signal: &[i16], pattern: &[bool]) -> Vec<i16> {
        let fs = plc.frame_size().unwrap();
        let mut out = vec![0i16; pattern.len() * fs];
        for (i, &good) in pattern.iter().enumerate() {
            let output = &mut out[i * fs..(i + 1) * fs];
            if good {
                plc.good_frame(&signal[i * fs..(i + 1) * fs], output).unwrap();
            } else {
                plc.bad_frame(output).unwrap();
            }
        }
        out
    }

    #[test]
    fn test_not_configured() {
        let mut plc = Plc::default();
        assert!(!plc.is_configured());
        assert_eq!(plc.frame_size(), None);

        let mut out = [1i16; 80];
        assert_eq!(plc.bad_frame(&mut out), Err(CodecError::NotConfigured));
        assert_eq!(
            plc.good_frame(&[0; 80], &mut out),
            Err(CodecError::NotConfigured)
        );
        assert_eq!(out, [1; 80]);

        plc.configure(SampleRate::Rate8000).unwrap();
        assert!(plc.good_frame(&[0; 80], &mut out).is_ok());
    }

    #[test]
    fn test_configure_rejects_unsupported_rate() {
        let mut plc = Plc::default();
        assert!(matches!(
            plc.configure(SampleRate::Rate48000),
            Err(CodecError::InvalidSampleRate { rate: 48000, .. })
        ));
        assert!(!plc.is_configured());

        assert!(Plc::new(PlcConfig::default().with_attenuation_per_frame(1.5)).is_err());
        assert!(Plc::new(PlcConfig::default().with_attenuation_per_frame(f32::NAN)).is_err());
    }

    #[test]
    fn test_frame_size_mismatch_leaves_output_alone() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let mut out = [7i16; 80];

        assert_eq!(
            plc.good_frame(&[0; 79], &mut out),
            Err(CodecError::frame_size(80, 79))
        );
        let mut long = [7i16; 81];
        assert!(plc.bad_frame(&mut long).is_err());
        assert_eq!(out, [7; 80]);
        assert!(long.iter().all(|&s| s == 7));
        assert_eq!(plc.state(), PlcState::NoHistory);
    }

    #[test]
    fn test_good_frames_are_delayed_copies() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let delay = plc.delay_samples().unwrap();
        assert_eq!(delay, 30);

        let signal: Vec<i16> = (0..800).map(|n| (n * 37 % 2000) as i16 - 1000).collect();
        let out = run(&mut plc, &signal, &[true; 10]);

        assert!(out[..delay].iter().all(|&s| s == 0));
        assert_eq!(&out[delay..], &signal[..800 - delay]);
        assert_eq!(plc.state(), PlcState::Normal);
    }

    #[test]
    fn test_state_machine() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let mut out = [0i16; 80];
        assert_eq!(plc.state(), PlcState::NoHistory);

        plc.good_frame(&[100; 80], &mut out).unwrap();
        assert_eq!(plc.state(), PlcState::Normal);

        plc.bad_frame(&mut out).unwrap();
        plc.bad_frame(&mut out).unwrap();
        assert_eq!(plc.state(), PlcState::Concealing { consecutive: 2 });

        plc.good_frame(&[100; 80], &mut out).unwrap();
        assert_eq!(plc.state(), PlcState::Normal);

        let stats = plc.stats();
        assert_eq!(stats.good_frames, 2);
        assert_eq!(stats.concealed_frames, 2);
        assert_eq!(stats.concealment_events, 1);
        assert_eq!(stats.longest_erasure, 2);
        assert!(stats.last_pitch.is_some());
    }

    #[test]
    fn test_bad_frame_without_history_is_silent() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let mut out = [1i16; 80];
        plc.bad_frame(&mut out).unwrap();
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_splice_continuity() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let signal = sine(440.0, 8000.0, 10000.0, 80 * 20);
        let clean = max_delta(&signal);

        let mut pattern = [true; 20];
        pattern[10] = false;
        pattern[11] = false;
        let out = run(&mut plc, &signal, &pattern);

        // Skip the startup edge where the delayed stream jumps in from zero
        let delta = max_delta(&out[200..]);
        assert!(
            delta <= 2 * clean,
            "discontinuity at splice: {} vs clean {}",
            delta,
            clean
        );
    }

    #[test]
    fn test_long_erasure_fades_to_silence() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let signal = sine(300.0, 8000.0, 12000.0, 80 * 10);
        run(&mut plc, &signal, &[true; 10]);

        let mut frames = Vec::new();
        for _ in 0..50 {
            let mut out = [0i16; 80];
            plc.bad_frame(&mut out).unwrap();
            frames.push(out);
        }

        assert!(rms(&frames[0]) > 1000.0);
        assert!(rms(&frames[5]) < rms(&frames[1]));
        for frame in &frames[7..] {
            assert!(frame.iter().all(|&s| s == 0));
        }
        assert_eq!(plc.state(), PlcState::Concealing { consecutive: 50 });
    }

    #[test]
    fn test_gentler_attenuation_lasts_longer() {
        let config = PlcConfig::default().with_attenuation_per_frame(0.1);
        let mut plc = Plc::new(config).unwrap();
        let signal = sine(300.0, 8000.0, 12000.0, 80 * 10);
        run(&mut plc, &signal, &[true; 10]);

        let mut out = [0i16; 80];
        for _ in 0..8 {
            plc.bad_frame(&mut out).unwrap();
        }
        assert!(out.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_concealed_audio_keeps_pitch() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let signal = sine(440.0, 8000.0, 10000.0, 80 * 24);
        let mut pattern = [true; 24];
        for lost in &mut pattern[20..] {
            *lost = false;
        }
        let out = run(&mut plc, &signal, &pattern);

        // First fully synthetic sample leaves the delay line 30 samples in
        let start = 20 * 80 + 30;
        let mut buffer: Vec<Complex<f32>> = out[start..start + 256]
            .iter()
            .map(|&s| Complex::new(f32::from(s), 0.0))
            .collect();
        let fft = FftPlanner::<f32>::new().plan_fft_forward(buffer.len());
        fft.process(&mut buffer);

        let peak = buffer[1..128]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
            .map(|(i, _)| i + 1)
            .unwrap();
        let peak_hz = peak as f32 * 8000.0 / 256.0;
        assert!((peak_hz - 440.0).abs() <= 35.0, "dominant {} Hz", peak_hz);
    }

    #[test]
    fn test_wideband() {
        let mut plc = Plc::new(PlcConfig::new(SampleRate::Rate16000)).unwrap();
        assert_eq!(plc.frame_size(), Some(160));
        assert_eq!(plc.delay_samples(), Some(60));

        let signal = sine(440.0, 16000.0, 8000.0, 160 * 20);
        let mut pattern = [true; 20];
        pattern[12] = false;
        let out = run(&mut plc, &signal, &pattern);

        assert_eq!(&out[60..160 * 12], &signal[..160 * 12 - 60]);
        let delta = max_delta(&out[400..]);
        assert!(delta <= 2 * max_delta(&signal));
    }

    #[test]
    fn test_reset_discards_history() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let signal = sine(440.0, 8000.0, 10000.0, 80 * 5);
        run(&mut plc, &signal, &[true; 5]);
        let mut out = [0i16; 80];
        plc.bad_frame(&mut out).unwrap();

        plc.reset();
        assert_eq!(plc.state(), PlcState::NoHistory);
        assert_eq!(plc.stats(), PlcStats::default());

        plc.bad_frame(&mut out).unwrap();
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_multi_frame_runs() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let signal = sine(440.0, 8000.0, 10000.0, 160);
        let mut out = [0i16; 160];
        plc.good_frames(&signal, &mut out).unwrap();
        assert_eq!(&out[30..], &signal[..130]);

        plc.bad_frames(&mut out).unwrap();
        assert_eq!(plc.state(), PlcState::Concealing { consecutive: 2 });

        let mut odd = [3i16; 120];
        assert_eq!(
            plc.bad_frames(&mut odd),
            Err(CodecError::frame_size(160, 120))
        );
        assert!(odd.iter().all(|&s| s == 3));
        assert!(plc.good_frames(&signal, &mut [0i16; 80]).is_err());
        assert!(plc.bad_frames(&mut []).is_err());
    }

    #[test]
    fn test_reconfigure_resets() {
        let mut plc = Plc::new(PlcConfig::default()).unwrap();
        let mut out = [0i16; 80];
        plc.good_frame(&[500; 80], &mut out).unwrap();

        plc.configure(SampleRate::Rate16000).unwrap();
        assert_eq!(plc.state(), PlcState::NoHistory);
        assert_eq!(plc.config().sample_rate, SampleRate::Rate16000);
        assert!(plc.good_frame(&[0; 80], &mut out).is_err());
    }
}
