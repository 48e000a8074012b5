//! Audio resampling using rubato
//!
//! Converts decoded audio to the output device's sample rate.

use crate::error::{Error, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

/// Resample interleaved audio from `input_rate` to `output_rate`.
///
/// Returns a copy when the rates already match.
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32, channels: u16) -> Result<Vec<f32>> {
    if input_rate == output_rate || input.is_empty() || channels == 0 {
        return Ok(input.to_vec());
    }

    debug!(
        "Resampling from {}Hz to {}Hz ({} channels)",
        input_rate, output_rate, channels
    );

    // rubato works on planar buffers
    let planar_input = deinterleave(input, channels);
    let input_frames = planar_input[0].len();

    let mut resampler = FastFixedIn::<f32>::new(
        output_rate as f64 / input_rate as f64,
        1.0,
        PolynomialDegree::Septic,
        input_frames,
        channels as usize,
    )
    .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

    let mut planar_output = resampler
        .process(&planar_input, None)
        .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

    // Drain the frames still inside the filter
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(|e| Error::Decode(format!("Resampler flush failed: {}", e)))?;

    let delay = resampler.output_delay();
    let expected = (input_frames as f64 * output_rate as f64 / input_rate as f64).round() as usize;
    for (channel, rest) in planar_output.iter_mut().zip(tail) {
        channel.extend(rest);
        channel.drain(..delay.min(channel.len()));
        channel.truncate(expected);
    }

    Ok(interleave(planar_output))
}

/// `[L, R, L, R, ...]` -> `[[L, L, ...], [R, R, ...]]`
fn deinterleave(samples: &[f32], channels: u16) -> Vec<Vec<f32>> {
    let num_channels = channels as usize;
    let num_frames = samples.len() / num_channels;
    let mut planar = vec![Vec::with_capacity(num_frames); num_channels];

    for frame in samples.chunks_exact(num_channels) {
        for (ch, sample) in frame.iter().enumerate() {
            planar[ch].push(*sample);
        }
    }

    planar
}

/// `[[L, L, ...], [R, R, ...]]` -> `[L, R, L, R, ...]`
fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
    let num_frames = planar.first().map_or(0, |ch| ch.len());
    let mut interleaved = Vec::with_capacity(num_frames * planar.len());

    for frame_idx in 0..num_frames {
        for channel in &planar {
            interleaved.push(channel[frame_idx]);
        }
    }

    interleaved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let planar = deinterleave(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2);
        assert_eq!(planar, vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]);
    }

    #[test]
    fn test_interleave() {
        let interleaved = interleave(vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]]);
        assert_eq!(interleaved, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_resample_same_rate() {
        let input = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample(&input, 48000, 48000, 2).unwrap(), input);
    }

    #[test]
    fn test_resample_keeps_whole_duration() {
        let input = vec![0.0f32; 44100 * 2];
        let output = resample(&input, 44100, 48000, 2).unwrap();

        assert_eq!(output.len() / 2, 48000);
    }

    #[test]
    fn test_resample_keeps_track_ending() {
        // Silence followed by a loud final 10ms
        let mut input = vec![0.0f32; 48000];
        input.extend(std::iter::repeat(0.8f32).take(480));
        let output = resample(&input, 48000, 44100, 1).unwrap();

        assert_eq!(output.len(), 44541);
        // The last few frames interpolate against the zero padding
        let ending = &output[output.len() - 200..output.len() - 20];
        assert!(ending.iter().all(|s| *s > 0.5), "final samples lost");
    }
}
