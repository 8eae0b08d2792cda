/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(not(feature = "sound"))]
use crate::sim::event::GameEvent;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use crate::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;

    // Ambience bed volume, and what pausing ducks it to
    const AMBIENCE_VOL: f32 = 0.35;
    const AMBIENCE_DUCKED_VOL: f32 = 0.08;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Looping wind bed; kept alive for the whole session.
        ambience: Sink,
        sfx_jump: Arc<Vec<u8>>,
        sfx_dash: Arc<Vec<u8>>,
        sfx_shoot: Arc<Vec<u8>>,
        sfx_strike: Arc<Vec<u8>>,
        sfx_hit: Arc<Vec<u8>>,
        sfx_deflect: Arc<Vec<u8>>,
        sfx_pickup: Arc<Vec<u8>>,
        sfx_kill: Arc<Vec<u8>>,
        sfx_boss_hit: Arc<Vec<u8>>,
        sfx_boss_down: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            let sfx_jump = Arc::new(make_wav(&gen_jump()));
            let sfx_dash = Arc::new(make_wav(&gen_dash()));
            let sfx_shoot = Arc::new(make_wav(&gen_shoot()));
            let sfx_strike = Arc::new(make_wav(&gen_strike()));
            let sfx_hit = Arc::new(make_wav(&gen_hit()));
            let sfx_deflect = Arc::new(make_wav(&gen_deflect()));
            let sfx_pickup = Arc::new(make_wav(&gen_pickup()));
            let sfx_kill = Arc::new(make_wav(&gen_kill()));
            let sfx_boss_hit = Arc::new(make_wav(&gen_boss_hit()));
            let sfx_boss_down = Arc::new(make_wav(&gen_boss_down()));
            let sfx_die = Arc::new(make_wav(&gen_die()));
            let sfx_clear = Arc::new(make_wav(&gen_clear()));

            // Ambience loops on its own sink so its volume can change later
            let ambience = Sink::try_new(&handle).ok()?;
            let cursor = Cursor::new(make_wav(&gen_ambience()));
            if let Ok(src) = rodio::Decoder::new(cursor) {
                ambience.append(src.repeat_infinite());
            }
            ambience.set_volume(AMBIENCE_VOL);

            Some(SoundEngine {
                _stream: stream,
                handle,
                ambience,
                sfx_jump,
                sfx_dash,
                sfx_shoot,
                sfx_strike,
                sfx_hit,
                sfx_deflect,
                sfx_pickup,
                sfx_kill,
                sfx_boss_hit,
                sfx_boss_down,
                sfx_die,
                sfx_clear,
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

        /// Pausing lowers the ambience bed instead of stopping it.
        pub fn set_ambience_ducked(&self, ducked: bool) {
            let vol = if ducked { AMBIENCE_DUCKED_VOL } else { AMBIENCE_VOL };
            self.ambience.set_volume(vol);
        }

        /// Map a simulation event to its effect and play it.
        pub fn play_event(&self, event: &GameEvent) {
            match event {
                GameEvent::Jump => self.play(&self.sfx_jump),
                GameEvent::Dash => self.play(&self.sfx_dash),
                GameEvent::Shoot => self.play(&self.sfx_shoot),
                GameEvent::Strike => self.play(&self.sfx_strike),
                GameEvent::PlayerHit => self.play(&self.sfx_hit),
                GameEvent::Deflect => self.play(&self.sfx_deflect),
                GameEvent::Pickup => self.play(&self.sfx_pickup),
                GameEvent::EnemyDied => self.play(&self.sfx_kill),
                GameEvent::BossHit => self.play(&self.sfx_boss_hit),
                GameEvent::BossDefeated => self.play(&self.sfx_boss_down),
                GameEvent::PlayerDied => self.play(&self.sfx_die),
                GameEvent::LevelClear => self.play(&self.sfx_clear),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Jump: quick rising sweep
    fn gen_jump() -> Vec<f32> {
        let duration = 0.1;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 300.0 + t * 500.0; // 300Hz → 800Hz
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.5);
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.25
            })
            .collect()
    }

    /// Dash: airy noise whoosh with a falling band
    fn gen_dash() -> Vec<f32> {
        let duration = 0.16;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 9871;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 - t * 600.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (t * std::f32::consts::PI).sin(); // swell then fade
                (tone * 0.3 + noise * 0.7) * env * 0.25
            })
            .collect()
    }

    /// Shuriken throw: short high zip
    fn gen_shoot() -> Vec<f32> {
        let duration = 0.07;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 1400.0 - t * 700.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - t;
                (ti * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.2
            })
            .collect()
    }

    /// Kunai strike: sharp metallic attack with fast decay
    fn gen_strike() -> Vec<f32> {
        let duration = 0.09;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(2.0);
                // Two detuned partials for a clang
                let wave = (ti * 1100.0 * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (ti * 1570.0 * 2.0 * std::f32::consts::PI).sin() * 0.4;
                wave * env * 0.3
            })
            .collect()
    }

    /// Player takes a hit: harsh low buzz
    fn gen_hit() -> Vec<f32> {
        let duration = 0.14;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 555;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * 150.0 * 2.0 * std::f32::consts::PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.7);
                (tone * 0.5 + noise * 0.5) * env * 0.35
            })
            .collect()
    }

    /// Deflect: bright ping
    fn gen_deflect() -> Vec<f32> {
        let duration = 0.08;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(1.5);
                (ti * 1900.0 * 2.0 * std::f32::consts::PI).sin() * env * 0.2
            })
            .collect()
    }

    /// Pickup: quick ascending arpeggio C6→E6→G6
    fn gen_pickup() -> Vec<f32> {
        let notes = [1047.0_f32, 1319.0, 1568.0]; // C6, E6, G6
        let note_dur = 0.045;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                // Square-ish wave (sine + 3rd harmonic) for retro feel
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Enemy killed: descending crunch
    fn gen_kill() -> Vec<f32> {
        let duration = 0.12;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 32451;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 500.0 - t * 350.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone * 0.5 + noise * 0.5) * env * 0.3
            })
            .collect()
    }

    /// Boss hit: heavy low thud
    fn gen_boss_hit() -> Vec<f32> {
        let duration = 0.15;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 - t * 120.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.6);
                let wave = (ti * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (ti * freq * 0.5 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                wave * env * 0.35
            })
            .collect()
    }

    /// Boss defeated: long descending rumble then a rising resolve
    fn gen_boss_down() -> Vec<f32> {
        let mut samples = Vec::new();
        let n = (SAMPLE_RATE as f32 * 0.3) as usize;
        let mut rng: u32 = 777;
        for i in 0..n {
            let t = i as f32 / n as f32;
            let freq = 180.0 - t * 120.0;
            let ti = i as f32 / SAMPLE_RATE as f32;
            let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
            rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
            let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
            samples.push((tone * 0.6 + noise * 0.4) * (1.0 - t) * 0.35);
        }
        let notes = [523.0_f32, 784.0]; // C5, G5
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * 0.12) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                samples.push((t * freq * 2.0 * std::f32::consts::PI).sin() * env * 0.3);
            }
        }
        samples
    }

    /// Death: sad descending tone
    fn gen_die() -> Vec<f32> {
        let notes = [440.0_f32, 370.0, 311.0, 261.0]; // A4→F#4→Eb4→C4
        let note_dur = 0.12;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin();
                samples.push(wave * env * 0.3);
            }
        }
        // Final fade
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    /// Stage clear: victory ascending fanfare
    fn gen_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5→E5→G5→C6
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        // Sustain the last note
        let last_freq = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32);
            let wave = (t * last_freq * 2.0 * std::f32::consts::PI).sin();
            samples.push(wave * env * 0.3);
        }
        samples
    }

    /// Ambience: slow lowpassed wind, swelling to silence at both ends so
    /// the loop seam does not click
    fn gen_ambience() -> Vec<f32> {
        let duration = 3.0;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 24681;
        let mut low = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                low += (noise - low) * 0.02;
                let swell = (t * std::f32::consts::PI).sin();
                low * swell * 0.5
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
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
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn ambience_loop_is_silent_at_the_seam() {
            let s = gen_ambience();
            assert!(!s.is_empty());
            assert!(s[0].abs() < 0.01);
            assert!(s[s.len() - 1].abs() < 0.01);
        }

        #[test]
        fn wav_header_matches_the_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5, 1.0]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 8);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size, 8);
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn set_ambience_ducked(&self, _ducked: bool) {}
    pub fn play_event(&self, _event: &GameEvent) {}
}
