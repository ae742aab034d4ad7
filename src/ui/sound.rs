/// Sound engine: procedural effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_caw: Arc<Vec<u8>>,
        sfx_groovey: Arc<Vec<u8>>,
        sfx_lever_pull: Arc<Vec<u8>>,
        sfx_lever_release: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_caw: Arc::new(make_wav(&gen_caw())),
                sfx_groovey: Arc::new(make_wav(&gen_groovey())),
                sfx_lever_pull: Arc::new(make_wav(&gen_lever(180.0))),
                sfx_lever_release: Arc::new(make_wav(&gen_lever(240.0))),
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

        /// Player died.
        pub fn play_caw(&self) { self.play(&self.sfx_caw); }

        /// Collectible picked. Pitch rises with each one.
        pub fn play_boop(&self, index: usize) {
            let buf = Arc::new(make_wav(&gen_boop(660.0 + 110.0 * index as f32)));
            self.play(&buf);
        }

        /// Last collectible picked.
        pub fn play_groovey(&self) { self.play(&self.sfx_groovey); }

        pub fn play_lever(&self, pulled: bool) {
            self.play(if pulled { &self.sfx_lever_pull } else { &self.sfx_lever_release });
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators, all mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Harsh falling squawk: square wave sweeping down with noise.
    pub(super) fn gen_caw() -> Vec<f32> {
        let n = samples_for(0.35);
        let mut rng: u32 = 777;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 - t * 550.0;
                phase = (phase + freq / SAMPLE_RATE as f32).fract();
                let square = if phase < 0.5 { 1.0 } else { -1.0 };
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                // Sharp attack, then a slower tail.
                let env = if t < 0.3 { 1.0 - t / 0.3 * 0.6 } else { (1.0 - t).powf(0.7) };
                (square * 0.6 + noise * 0.4) * env * 0.2
            })
            .collect()
    }

    /// Short sine blip falling from `freq`.
    pub(super) fn gen_boop(freq: f32) -> Vec<f32> {
        let n = samples_for(0.09);
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let f = freq * (1.0 - t * 0.35);
                (ti * f * TAU).sin() * (1.0 - t) * 0.3
            })
            .collect()
    }

    /// Swung arpeggio with a held top note.
    pub(super) fn gen_groovey() -> Vec<f32> {
        let notes = [(392.0_f32, 0.09), (494.0, 0.06), (587.0, 0.09), (740.0, 0.06), (784.0, 0.3)];
        let mut samples = Vec::new();
        for &(freq, dur) in &notes {
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.5;
                let wave = (t * freq * TAU).sin() * 0.6
                    + (t * freq * 2.0 * TAU).sin() * 0.25
                    + (t * freq * 3.0 * TAU).sin() * 0.15;
                samples.push(wave * env * 0.3);
            }
        }
        let fade = samples.len() / 5;
        let total = samples.len();
        for (k, s) in samples[total - fade..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade as f32;
        }
        samples
    }

    /// Mechanical clunk: two damped low clicks.
    pub(super) fn gen_lever(freq: f32) -> Vec<f32> {
        let n = samples_for(0.12);
        (0..n)
            .map(|i| {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let first = (-ti * 90.0).exp() * (ti * freq * TAU).sin();
                let second = if ti > 0.05 {
                    let d = ti - 0.05;
                    (-d * 120.0).exp() * (d * freq * 1.45 * TAU).sin()
                } else {
                    0.0
                };
                (first + second * 0.8) * 0.35
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

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
//  Public API, no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_caw(&self) {}
    pub fn play_boop(&self, _index: usize) {}
    pub fn play_groovey(&self) {}
    pub fn play_lever(&self, _pulled: bool) {}
}
