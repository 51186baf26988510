//! Voice
//!
//! One polyphonic note: a gain node carrying the envelope, with one
//! oscillator bank per spectral layer behind it.
//!
//! Lifecycle is `ready → playing → used`. Misuse (playing or updating a used
//! voice, releasing one that never played) is logged and ignored so stale
//! references from the caller cannot break live playback.

use super::backend::{AudioBackend, Automation, NodeId, Param};
use super::bank::OscillatorBank;
use super::envelope::{schedule_fade, Envelope};
use super::lifecycle::PlayState;
use super::oscillator::Oscillator;
use crate::spectrum::{Partial, Spectrum};

/// Fade applied on release when no envelope is configured (seconds)
pub const MIN_RELEASE: f64 = 0.005;

#[derive(Debug, Clone)]
pub struct Voice {
    id: String,
    pitch: Option<f64>,
    velocity: f64,
    state: PlayState,
    gain: NodeId,
    banks: Vec<OscillatorBank>,
    envelope: Option<Envelope>,
    /// Time of the latest automation event scheduled on the gain node
    settles_at: f64,
}

impl Voice {
    /// Build a silent voice for `spectrum`, connected to `destination`
    pub fn new(
        id: impl Into<String>,
        spectrum: &Spectrum,
        envelope: Option<Envelope>,
        destination: NodeId,
        backend: &mut dyn AudioBackend,
    ) -> Self {
        let now = backend.current_time();
        let gain = backend.create_gain();
        backend.schedule(gain, Param::Gain, Automation::SetValue { value: 0.0, time: now });
        backend.connect(gain, destination);

        let mut banks = Vec::with_capacity(spectrum.len());
        for layer in spectrum.layers() {
            banks.push(OscillatorBank::new(layer, gain, backend));
        }

        Self {
            id: id.into(),
            pitch: None,
            velocity: 0.0,
            state: PlayState::Ready,
            gain,
            banks,
            envelope,
            settles_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pitch(&self) -> Option<f64> {
        self.pitch
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn gain_node(&self) -> NodeId {
        self.gain
    }

    pub fn banks(&self) -> &[OscillatorBank] {
        &self.banks
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// Envelope used by subsequent play and release calls
    pub fn set_envelope(&mut self, envelope: Option<Envelope>) {
        self.envelope = envelope;
    }

    /// Time after which no further gain automation is pending
    pub fn settles_at(&self) -> f64 {
        self.settles_at
    }

    /// Every oscillator of every bank, in layer order
    pub fn oscillators(&self) -> Vec<&Oscillator> {
        self.banks.iter().flat_map(|b| b.oscillators()).collect()
    }

    /// Partials currently rendered, in layer order
    pub fn partials(&self) -> Vec<Partial> {
        self.banks.iter().flat_map(|b| b.partials()).collect()
    }

    /// Current envelope gain
    pub fn gain_value(&self, backend: &dyn AudioBackend) -> f64 {
        backend.param_value(self.gain, Param::Gain)
    }

    /// Cancel pending gain automation and pin the current value
    fn hold_gain(&mut self, backend: &mut dyn AudioBackend) -> f64 {
        let now = backend.current_time();
        let value = self.gain_value(backend);
        backend.cancel_scheduled(self.gain, Param::Gain, now);
        backend.schedule(self.gain, Param::Gain, Automation::SetValue { value, time: now });
        value
    }

    /// Start (or retrigger) the note
    ///
    /// Pending gain automation is cancelled first. With an envelope the gain
    /// rises to `velocity` over `attack` and decays to `velocity · sustain`;
    /// without one it jumps to `velocity`.
    pub fn play(&mut self, pitch: f64, velocity: f64, time: f64, backend: &mut dyn AudioBackend) {
        if self.state.is_used() {
            tracing::debug!(voice = %self.id, "ignoring play on used voice");
            return;
        }

        let velocity = velocity.max(0.0);
        let from_value = self.hold_gain(backend);

        self.settles_at = match self.envelope {
            Some(envelope) => envelope.schedule_onset(backend, self.gain, velocity, from_value, time),
            None => {
                backend.schedule(self.gain, Param::Gain, Automation::SetValue { value: velocity, time });
                time
            }
        };

        self.pitch = Some(pitch);
        self.velocity = velocity;
        for bank in &mut self.banks {
            bank.play(pitch, time, backend);
        }
        self.state = PlayState::Playing;

        tracing::debug!(voice = %self.id, pitch, velocity, "voice playing");
    }

    /// Fade out and mark used
    ///
    /// Pending automation is cancelled, the gain ramps from its current value
    /// to zero over the release time, and every oscillator is scheduled to
    /// stop when the ramp ends. The graph stays connected until `destroy` so
    /// the tail remains audible.
    pub fn release(&mut self, time: f64, backend: &mut dyn AudioBackend) {
        if !self.state.is_playing() {
            tracing::debug!(voice = %self.id, state = %self.state, "ignoring release");
            return;
        }

        let from_value = self.hold_gain(backend);

        let end = match self.envelope {
            Some(envelope) => envelope.schedule_release(backend, self.gain, from_value, time),
            None => schedule_fade(backend, self.gain, from_value, time, MIN_RELEASE),
        };

        for bank in &mut self.banks {
            bank.stop(end, backend);
        }
        self.settles_at = end;
        self.state = PlayState::Used;

        tracing::debug!(voice = %self.id, until = end, "voice released");
    }

    /// Reconcile banks against a new spectrum by position
    ///
    /// Shared layers update in place, surplus banks are destroyed from the
    /// tail, and new banks are appended (and started if the voice is playing).
    pub fn update(&mut self, spectrum: &Spectrum, backend: &mut dyn AudioBackend) {
        if self.state.is_used() {
            tracing::debug!(voice = %self.id, "ignoring update on used voice");
            return;
        }

        for (bank, layer) in self.banks.iter_mut().zip(spectrum.layers()) {
            bank.update(layer, backend);
        }

        while self.banks.len() > spectrum.len() {
            if let Some(mut removed) = self.banks.pop() {
                removed.destroy(backend);
            }
        }

        let now = backend.current_time();
        for layer in spectrum.layers().iter().skip(self.banks.len()) {
            let mut bank = OscillatorBank::new(layer, self.gain, backend);
            if let (PlayState::Playing, Some(pitch)) = (self.state, self.pitch) {
                bank.play(pitch, now, backend);
            }
            self.banks.push(bank);
        }
    }

    /// Stop everything now and detach the voice from the graph
    pub fn destroy(&mut self, backend: &mut dyn AudioBackend) {
        let now = backend.current_time();
        backend.cancel_scheduled(self.gain, Param::Gain, now);
        for bank in &mut self.banks {
            bank.destroy(backend);
        }
        backend.disconnect(self.gain);
        self.state = PlayState::Used;
    }
}
