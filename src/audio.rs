//! Audio system
//!
//! Procedurally synthesized sound effects and a seed-driven music loop - no
//! external files needed. The Web Audio graph is built lazily on first use
//! and has to be unlocked from a user gesture before browsers let it play.
//! Every call is a silent no-op when no audio device is available.

use crate::consts::MUSIC_INTERVAL_SECS;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Menu blip, wall bounce, fire
    Ui,
    /// Impact
    Hit,
    /// Pickup or level up
    Power,
    /// Low-passed noise burst
    Explosion,
}

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// Which gain node a voice feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    Master,
    Music,
}

/// One enveloped oscillator voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub freq: f32,
    pub duration: f32,
    pub gain: f32,
    pub waveform: Waveform,
    pub attack: f32,
    pub release: f32,
    pub bus: Bus,
}

impl Tone {
    pub const fn new(freq: f32, duration: f32, gain: f32, waveform: Waveform) -> Self {
        Self {
            freq,
            duration,
            gain,
            waveform,
            attack: 0.01,
            release: 0.12,
            bus: Bus::Master,
        }
    }

    pub const fn envelope(mut self, attack: f32, release: f32) -> Self {
        self.attack = attack;
        self.release = release;
        self
    }

    /// Peak gain; exponential ramps cannot target zero
    pub fn peak(&self) -> f32 {
        self.gain.max(0.0002)
    }

    /// Seconds until the oscillator is stopped
    pub fn stop_after(&self) -> f32 {
        self.duration + self.release + 0.02
    }
}

/// Filtered white-noise burst
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBurst {
    pub duration: f32,
    pub cutoff: f32,
    pub gain: f32,
    pub stop_after: f32,
}

const UI_TONES: [Tone; 1] = [Tone::new(660.0, 0.05, 0.055, Waveform::Triangle).envelope(0.002, 0.05)];
const HIT_TONES: [Tone; 1] = [Tone::new(210.0, 0.08, 0.065, Waveform::Square).envelope(0.003, 0.07)];
const POWER_TONES: [Tone; 2] = [
    Tone::new(420.0, 0.1, 0.05, Waveform::Triangle).envelope(0.005, 0.08),
    Tone::new(740.0, 0.06, 0.03, Waveform::Sine).envelope(0.005, 0.05),
];

pub const EXPLOSION_NOISE: NoiseBurst = NoiseBurst {
    duration: 0.16,
    cutoff: 720.0,
    gain: 0.14,
    stop_after: 0.18,
};

impl SoundEffect {
    /// Oscillator voices for the effect (empty for pure noise)
    pub fn tones(&self) -> &'static [Tone] {
        match self {
            SoundEffect::Ui => &UI_TONES,
            SoundEffect::Hit => &HIT_TONES,
            SoundEffect::Power => &POWER_TONES,
            SoundEffect::Explosion => &[],
        }
    }

    pub fn noise(&self) -> Option<NoiseBurst> {
        match self {
            SoundEffect::Explosion => Some(EXPLOSION_NOISE),
            _ => None,
        }
    }
}

/// Master output level
pub const MASTER_GAIN: f32 = 0.45;
/// Music bus level (feeds master)
pub const MUSIC_GAIN: f32 = 0.16;

/// Music scale (A minor-ish, Hz)
pub const MUSIC_NOTES: [f32; 8] = [220.0, 246.94, 261.63, 293.66, 329.63, 392.0, 440.0, 493.88];

/// Backend lifecycle as seen by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    /// No graph built yet
    Uninitialized,
    /// Built but waiting for a user gesture
    Suspended,
    Running,
    /// No audio device; stays silent for the session
    Unavailable,
    Closed,
}

/// A sound output device
pub trait AudioBackend {
    fn state(&self) -> AudioState;
    /// Request playback; may complete asynchronously
    fn resume(&mut self);
    fn tone(&mut self, tone: &Tone);
    fn noise(&mut self, burst: &NoiseBurst);
    fn close(&mut self);
}

/// Builds a backend on first use; `None` means no device
pub type BackendFactory = Box<dyn FnMut() -> Option<Box<dyn AudioBackend>>>;

/// Fixed-interval note walker. Deterministic for a given seed.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicScheduler {
    beat: u32,
    jump: u32,
    elapsed: f32,
}

impl MusicScheduler {
    pub fn new(seed: u32) -> Self {
        Self {
            beat: seed % MUSIC_NOTES.len() as u32,
            jump: (seed % 4).max(1),
            elapsed: 0.0,
        }
    }

    /// Advance by `dt`, returning the notes that fell due. While `audible`
    /// is false due ticks are dropped without advancing the melody.
    pub fn advance(&mut self, dt: f32, audible: bool) -> Vec<f32> {
        let mut due = Vec::new();
        self.elapsed += dt;
        while self.elapsed >= MUSIC_INTERVAL_SECS {
            self.elapsed -= MUSIC_INTERVAL_SECS;
            if !audible {
                continue;
            }
            due.push(MUSIC_NOTES[(self.beat % MUSIC_NOTES.len() as u32) as usize]);
            self.beat = self.beat.wrapping_add(self.jump);
        }
        due
    }

    pub fn jump(&self) -> u32 {
        self.jump
    }
}

fn music_voice(freq: f32) -> Tone {
    Tone {
        freq,
        duration: 0.22,
        gain: 0.05,
        waveform: Waveform::Triangle,
        attack: 0.02,
        release: 0.02,
        bus: Bus::Music,
    }
}

/// Audio manager for one play session
pub struct AudioManager {
    factory: BackendFactory,
    backend: Option<Box<dyn AudioBackend>>,
    unavailable: bool,
    enabled: bool,
    music_enabled: bool,
    music: Option<MusicScheduler>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(platform_factory())
    }
}

impl AudioManager {
    pub fn new(factory: BackendFactory) -> Self {
        Self {
            factory,
            backend: None,
            unavailable: false,
            enabled: true,
            music_enabled: true,
            music: None,
        }
    }

    /// Manager with no device at all
    pub fn silent() -> Self {
        Self::new(Box::new(|| None))
    }

    pub fn state(&self) -> AudioState {
        match &self.backend {
            Some(backend) => backend.state(),
            None if self.unavailable => AudioState::Unavailable,
            None => AudioState::Uninitialized,
        }
    }

    fn ensure_backend(&mut self) -> Option<&mut Box<dyn AudioBackend>> {
        if self.backend.is_none() && !self.unavailable {
            match (self.factory)() {
                Some(backend) => self.backend = Some(backend),
                None => {
                    log::warn!("No audio device - audio disabled");
                    self.unavailable = true;
                }
            }
        }
        self.backend.as_mut()
    }

    /// Resume a suspended context. Call from a user-gesture handler.
    pub fn unlock(&mut self) {
        if let Some(backend) = self.ensure_backend() {
            if backend.state() == AudioState::Suspended {
                backend.resume();
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling music also stops the running loop
    pub fn set_music_enabled(&mut self, enabled: bool) {
        self.music_enabled = enabled;
        if !enabled {
            self.stop_music();
        }
    }

    pub fn is_music_enabled(&self) -> bool {
        self.music_enabled
    }

    pub fn tone(&mut self, tone: &Tone) {
        if !self.enabled {
            return;
        }
        if let Some(backend) = self.ensure_backend() {
            backend.tone(tone);
        }
    }

    pub fn play(&mut self, effect: SoundEffect) {
        if !self.enabled {
            return;
        }
        let Some(backend) = self.ensure_backend() else {
            return;
        };
        for tone in effect.tones() {
            backend.tone(tone);
        }
        if let Some(noise) = effect.noise() {
            backend.noise(&noise);
        }
    }

    /// Start the procedural loop. No-op if music is off, already running,
    /// or there is no device.
    pub fn start_music(&mut self, seed: u32) {
        if !self.music_enabled || self.music.is_some() {
            return;
        }
        if self.ensure_backend().is_none() {
            return;
        }
        log::debug!("Music started (seed {})", seed);
        self.music = Some(MusicScheduler::new(seed));
    }

    pub fn stop_music(&mut self) {
        if self.music.take().is_some() {
            log::debug!("Music stopped");
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.music.is_some()
    }

    /// Drive the music clock; the host calls this once per frame
    pub fn pump(&mut self, dt: f32) {
        let audible = self.enabled && self.music_enabled;
        let Some(music) = self.music.as_mut() else {
            return;
        };
        let due = music.advance(dt, audible);
        if due.is_empty() {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            for freq in due {
                backend.tone(&music_voice(freq));
            }
        }
    }

    /// Stop music and release the device. A later sound rebuilds it lazily.
    pub fn dispose(&mut self) {
        self.stop_music();
        if let Some(mut backend) = self.backend.take() {
            backend.close();
            log::info!("Audio released");
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn platform_factory() -> BackendFactory {
    Box::new(|| web::WebAudioBackend::create().map(|b| Box::new(b) as Box<dyn AudioBackend>))
}

#[cfg(not(target_arch = "wasm32"))]
fn platform_factory() -> BackendFactory {
    Box::new(|| None)
}

#[cfg(target_arch = "wasm32")]
pub mod web {
    //! Web Audio backend

    use wasm_bindgen_futures::JsFuture;
    use web_sys::{
        AudioContext, AudioContextState, BiquadFilterType, GainNode, OscillatorNode,
        OscillatorType,
    };

    use super::{AudioBackend, AudioState, Bus, MASTER_GAIN, MUSIC_GAIN, NoiseBurst, Tone, Waveform};

    pub struct WebAudioBackend {
        ctx: AudioContext,
        master: GainNode,
        music_bus: GainNode,
    }

    impl WebAudioBackend {
        /// Build the context with master and music gain nodes
        pub fn create() -> Option<Self> {
            let ctx = AudioContext::new().ok()?;
            let master = ctx.create_gain().ok()?;
            let music_bus = ctx.create_gain().ok()?;
            master.gain().set_value(MASTER_GAIN);
            music_bus.gain().set_value(MUSIC_GAIN);
            music_bus.connect_with_audio_node(&master).ok()?;
            master.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(Self {
                ctx,
                master,
                music_bus,
            })
        }

        /// Create an oscillator routed through its own gain into a bus
        fn create_osc(&self, tone: &Tone) -> Option<(OscillatorNode, GainNode)> {
            let osc = self.ctx.create_oscillator().ok()?;
            let gain = self.ctx.create_gain().ok()?;

            osc.set_type(match tone.waveform {
                Waveform::Sine => OscillatorType::Sine,
                Waveform::Square => OscillatorType::Square,
                Waveform::Triangle => OscillatorType::Triangle,
                Waveform::Sawtooth => OscillatorType::Sawtooth,
            });
            osc.connect_with_audio_node(&gain).ok()?;
            let bus = match tone.bus {
                Bus::Master => &self.master,
                Bus::Music => &self.music_bus,
            };
            gain.connect_with_audio_node(bus).ok()?;

            Some((osc, gain))
        }
    }

    impl AudioBackend for WebAudioBackend {
        fn state(&self) -> AudioState {
            match self.ctx.state() {
                AudioContextState::Running => AudioState::Running,
                AudioContextState::Closed => AudioState::Closed,
                _ => AudioState::Suspended,
            }
        }

        fn resume(&mut self) {
            let Ok(promise) = self.ctx.resume() else {
                log::warn!("Audio resume refused");
                return;
            };
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::warn!("Audio unlock failed: {:?}", e);
                }
            });
        }

        fn tone(&mut self, tone: &Tone) {
            let Some((osc, gain)) = self.create_osc(tone) else {
                return;
            };
            let t = self.ctx.current_time();
            let attack = tone.attack as f64;
            let end = (tone.duration + tone.release) as f64;

            osc.frequency().set_value_at_time(tone.freq, t).ok();
            gain.gain().set_value_at_time(0.0001, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(tone.peak(), t + attack)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.0001, t + end)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.stop_after() as f64).ok();
        }

        fn noise(&mut self, burst: &NoiseBurst) {
            let rate = self.ctx.sample_rate();
            let len = ((rate * burst.duration) as u32).max(1);
            let Ok(buffer) = self.ctx.create_buffer(1, len, rate) else {
                return;
            };
            let mut data: Vec<f32> = (0..len)
                .map(|i| (rand::random::<f32>() * 2.0 - 1.0) * (1.0 - i as f32 / len as f32))
                .collect();
            if buffer.copy_to_channel(&mut data[..], 0).is_err() {
                return;
            }

            let (Ok(source), Ok(filter), Ok(gain)) = (
                self.ctx.create_buffer_source(),
                self.ctx.create_biquad_filter(),
                self.ctx.create_gain(),
            ) else {
                return;
            };
            source.set_buffer(Some(&buffer));
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(burst.cutoff);
            gain.gain().set_value(burst.gain);

            if source.connect_with_audio_node(&filter).is_err()
                || filter.connect_with_audio_node(&gain).is_err()
                || gain.connect_with_audio_node(&self.master).is_err()
            {
                return;
            }

            let t = self.ctx.current_time();
            source.start().ok();
            source.stop_with_when(t + burst.stop_after as f64).ok();
        }

        fn close(&mut self) {
            let _ = self.ctx.close();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Played, Recorder};
    use super::*;

    #[test]
    fn test_lazy_construction() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        assert_eq!(audio.state(), AudioState::Uninitialized);
        assert_eq!(*rec.created.borrow(), 0);
        audio.play(SoundEffect::Ui);
        assert_eq!(audio.state(), AudioState::Suspended);
        audio.play(SoundEffect::Hit);
        assert_eq!(*rec.created.borrow(), 1);
    }

    #[test]
    fn test_unlock_resumes_suspended() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        audio.unlock();
        assert_eq!(audio.state(), AudioState::Running);
        audio.unlock();
        assert_eq!(rec.take(), vec![Played::Resume]);
    }

    #[test]
    fn test_disabled_is_silent() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        audio.set_enabled(false);
        audio.play(SoundEffect::Power);
        audio.play(SoundEffect::Explosion);
        assert!(rec.take().is_empty());
        assert_eq!(*rec.created.borrow(), 0);
    }

    #[test]
    fn test_effect_voices() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        audio.play(SoundEffect::Power);
        audio.play(SoundEffect::Explosion);
        let played = rec.take();
        assert_eq!(played.len(), 3);
        assert_eq!(played[2], Played::Noise);
        match played[0] {
            Played::Tone(t) => {
                assert_eq!(t.freq, 420.0);
                assert_eq!(t.waveform, Waveform::Triangle);
            }
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_music_walk_is_seeded() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        // seed 13: start at 13 % 8 = 5, jump 13 % 4 = 1
        audio.start_music(13);
        audio.pump(0.28 * 3.0 + 0.01);
        assert_eq!(rec.music_notes(), vec![392.0, 440.0, 493.88]);
    }

    #[test]
    fn test_start_music_twice_is_noop() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        audio.start_music(6);
        audio.pump(0.15);
        audio.start_music(6);
        audio.pump(0.15);
        // One scheduler: a single note at 0.30s
        assert_eq!(rec.music_notes().len(), 1);
    }

    #[test]
    fn test_disabled_music_skips_without_advancing() {
        let mut music = MusicScheduler::new(8);
        assert_eq!(music.jump(), 1);
        assert!(music.advance(0.3, false).is_empty());
        assert_eq!(music.advance(0.3, true), vec![MUSIC_NOTES[0]]);
    }

    #[test]
    fn test_music_toggle_stops_loop() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        audio.start_music(1);
        audio.set_music_enabled(false);
        assert!(!audio.is_music_playing());
        audio.start_music(1);
        assert!(!audio.is_music_playing());
    }

    #[test]
    fn test_dispose_releases_device() {
        let rec = Recorder::default();
        let mut audio = rec.manager();
        audio.start_music(3);
        audio.dispose();
        assert!(!audio.is_music_playing());
        assert_eq!(rec.take(), vec![Played::Close]);
        audio.dispose();
        assert!(rec.take().is_empty());
    }

    #[test]
    fn test_unavailable_device_stays_silent() {
        let mut audio = AudioManager::silent();
        audio.play(SoundEffect::Hit);
        audio.start_music(4);
        audio.pump(1.0);
        audio.unlock();
        assert_eq!(audio.state(), AudioState::Unavailable);
        assert!(!audio.is_music_playing());
    }
}
