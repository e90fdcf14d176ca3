/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use tracing::warn;

    pub(super) const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_hurt: Arc<Vec<u8>>,
        sfx_fall: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("audio output unavailable: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_hurt: Arc::new(make_wav(&gen_hurt())),
                sfx_fall: Arc::new(make_wav(&gen_fall())),
                sfx_win: Arc::new(make_wav(&gen_win())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_jump(&self) { self.play(&self.sfx_jump); }
        pub fn play_hurt(&self) { self.play(&self.sfx_hurt); }
        pub fn play_fall(&self) { self.play(&self.sfx_fall); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(t: f32, freq: f32) -> f32 {
        (t * freq * 2.0 * std::f32::consts::PI).sin()
    }

    /// Jump: quick upward sweep, square-ish
    pub(super) fn gen_jump() -> Vec<f32> {
        let duration = 0.14;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 330.0 + t * 550.0; // 330Hz → 880Hz
                phase += freq / SAMPLE_RATE as f32;
                let wave = (phase * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (phase * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                let env = (1.0 - t).powf(0.7);
                wave * env * 0.25
            })
            .collect()
    }

    /// Hurt: noisy buzz with a falling pitch
    pub(super) fn gen_hurt() -> Vec<f32> {
        let duration = 0.3;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 - t * 120.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                // Simple LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone(ti, freq) * 0.6 + noise * 0.4) * env * 0.3
            })
            .collect()
    }

    /// Fall into a pit: long descending whistle
    pub(super) fn gen_fall() -> Vec<f32> {
        let duration = 0.45;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 - t * 750.0; // 900Hz → 150Hz
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                (phase * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Level clear: ascending fanfare C5→E5→G5→C6 with a held final note
    pub(super) fn gen_win() -> Vec<f32> {
        let notes = [(523.0_f32, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.35)];
        let mut samples = Vec::new();
        for &(freq, dur) in &notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = tone(t, freq) * 0.6
                    + tone(t, freq * 2.0) * 0.3
                    + tone(t, freq * 3.0) * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        // Final fade
        let total = samples.len();
        let fade_len = total / 5;
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade_len as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_jump(&self) {}
    pub fn play_hurt(&self) {}
    pub fn play_fall(&self) {}
    pub fn play_win(&self) {}
}

/// Map this tick's events to sound cues.
pub fn play_events(sound: &SoundEngine, events: &[GameEvent]) {
    for ev in events {
        match ev {
            GameEvent::Jumped => sound.play_jump(),
            GameEvent::HazardDeath => sound.play_hurt(),
            GameEvent::FellIntoPit => sound.play_fall(),
            GameEvent::LevelCleared => sound.play_win(),
        }
    }
}

#[cfg(all(test, feature = "sound"))]
mod tests {
    use super::inner::*;

    #[test]
    fn wav_header_matches_payload() {
        let samples = gen_jump();
        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
    }

    #[test]
    fn generated_cues_stay_in_range() {
        for samples in [gen_jump(), gen_hurt(), gen_fall(), gen_win()] {
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| s.abs() <= 1.0));
        }
    }

    #[test]
    fn clipped_samples_saturate() {
        let wav = make_wav(&[2.0, -2.0]);
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), 32767);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -32767);
    }
}
