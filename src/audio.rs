//! Sound cues
//!
//! The simulation only announces *that* something audible happened through
//! [`AudioCues`]. The browser build plays procedurally generated Web Audio
//! effects; native builds and tests use [`Silent`] or [`CueLog`].

use std::cell::RefCell;
use std::rc::Rc;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player fired a bullet
    Shot,
    /// Tank or Base destroyed
    Explosion,
    /// Bullet struck terrain
    Hit,
}

/// Audio capability injected into the simulation step
pub trait AudioCues {
    fn play_shot(&mut self);
    fn play_explosion(&mut self);
    fn play_hit(&mut self);

    fn play(&mut self, effect: SoundEffect) {
        match effect {
            SoundEffect::Shot => self.play_shot(),
            SoundEffect::Explosion => self.play_explosion(),
            SoundEffect::Hit => self.play_hit(),
        }
    }
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl AudioCues for Silent {
    fn play_shot(&mut self) {}
    fn play_explosion(&mut self) {}
    fn play_hit(&mut self) {}
}

/// Records cues in order (headless runs and tests)
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    pub cues: Vec<SoundEffect>,
}

impl CueLog {
    pub fn count(&self, effect: SoundEffect) -> usize {
        self.cues.iter().filter(|&&c| c == effect).count()
    }
}

impl AudioCues for CueLog {
    fn play_shot(&mut self) {
        self.cues.push(SoundEffect::Shot);
    }
    fn play_explosion(&mut self) {
        self.cues.push(SoundEffect::Explosion);
    }
    fn play_hit(&mut self) {
        self.cues.push(SoundEffect::Hit);
    }
}

/// Shared backends: the frame loop plays cues while input handlers keep a
/// handle to unlock or reconfigure the same backend.
impl<A: AudioCues + ?Sized> AudioCues for Rc<RefCell<A>> {
    fn play_shot(&mut self) {
        self.borrow_mut().play_shot();
    }
    fn play_explosion(&mut self) {
        self.borrow_mut().play_explosion();
    }
    fn play_hit(&mut self) {
        self.borrow_mut().play_hit();
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, BiquadFilterType, GainNode, OscillatorNode, OscillatorType};

    use super::AudioCues;

    /// Web Audio backend. The context is created lazily on the first user
    /// gesture because browsers refuse to start audio before one.
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            Self {
                ctx: None,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            }
        }

        /// Create or resume the audio context (call from an input handler)
        pub fn unlock(&mut self) {
            if self.ctx.is_none() {
                self.ctx = AudioContext::new().ok();
                if self.ctx.is_none() {
                    log::warn!("Failed to create AudioContext - audio disabled");
                }
            }
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }

        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_sfx_volume(&mut self, vol: f32) {
            self.sfx_volume = vol.clamp(0.0, 1.0);
        }

        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        /// Context and volume, or `None` when nothing should play
        fn output(&self) -> Option<(&AudioContext, f32)> {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return None;
            }
            self.ctx.as_ref().map(|ctx| (ctx, vol))
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }

    impl AudioCues for AudioManager {
        /// Falling square-wave blip
        fn play_shot(&mut self) {
            let Some((ctx, vol)) = self.output() else { return };
            let Some((osc, gain)) = Self::create_osc(ctx, 150.0, OscillatorType::Square) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(150.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(40.0, t + 0.1)
                .ok();
            gain.gain().set_value_at_time(vol * 0.1, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.1)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        /// Low-passed white noise burst
        fn play_explosion(&mut self) {
            let Some((ctx, vol)) = self.output() else { return };
            let sample_rate = ctx.sample_rate();
            let len = (sample_rate * 0.2) as u32;
            let Ok(buffer) = ctx.create_buffer(1, len, sample_rate) else {
                return;
            };
            let mut noise: Vec<f32> = (0..len)
                .map(|_| js_sys::Math::random() as f32 * 2.0 - 1.0)
                .collect();
            if buffer.copy_to_channel(&mut noise, 0).is_err() {
                return;
            }

            let (Ok(source), Ok(filter), Ok(gain)) = (
                ctx.create_buffer_source(),
                ctx.create_biquad_filter(),
                ctx.create_gain(),
            ) else {
                return;
            };
            let t = ctx.current_time();

            source.set_buffer(Some(&buffer));
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value_at_time(400.0, t).ok();
            filter
                .frequency()
                .exponential_ramp_to_value_at_time(10.0, t + 0.2)
                .ok();
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                .ok();

            if source.connect_with_audio_node(&filter).is_err()
                || filter.connect_with_audio_node(&gain).is_err()
                || gain.connect_with_audio_node(&ctx.destination()).is_err()
            {
                return;
            }
            source.start().ok();
        }

        /// Short sine thud
        fn play_hit(&mut self) {
            let Some((ctx, vol)) = self.output() else { return };
            let Some((osc, gain)) = Self::create_osc(ctx, 100.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.2, t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.05).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.05).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_log_records_in_order() {
        let mut log = CueLog::default();
        log.play(SoundEffect::Shot);
        log.play_hit();
        log.play(SoundEffect::Explosion);
        assert_eq!(
            log.cues,
            vec![SoundEffect::Shot, SoundEffect::Hit, SoundEffect::Explosion]
        );
        assert_eq!(log.count(SoundEffect::Hit), 1);
    }

    #[test]
    fn test_shared_backend_sees_cues() {
        let shared = Rc::new(RefCell::new(CueLog::default()));
        let mut handle: Box<dyn AudioCues> = Box::new(Rc::clone(&shared));
        handle.play_shot();
        handle.play_shot();
        assert_eq!(shared.borrow().count(SoundEffect::Shot), 2);
    }
}
