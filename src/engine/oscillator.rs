//! Oscillator
//!
//! One partial on the host graph: a sine oscillator node feeding a gain node
//! that carries the partial's amplitude.

use super::backend::{AudioBackend, Automation, NodeId, Param};
use super::lifecycle::PlayState;
use crate::spectrum::Partial;

/// Lowest frequency an oscillator is started at (Hz)
pub const MIN_FREQUENCY: f64 = 20.0;

/// Highest frequency an oscillator is started at (Hz)
pub const MAX_FREQUENCY: f64 = 20000.0;

/// True if `frequency` lies in the audible range
#[inline]
pub fn is_audible(frequency: f64) -> bool {
    (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency)
}

/// Per-partial tone generator
#[derive(Debug, Clone)]
pub struct Oscillator {
    partial: Partial,
    pitch: Option<f64>,
    osc: NodeId,
    gain: NodeId,
    state: PlayState,
}

impl Oscillator {
    /// Build the node pair and connect it to `destination`
    pub fn new(partial: Partial, destination: NodeId, backend: &mut dyn AudioBackend) -> Self {
        let now = backend.current_time();

        let gain = backend.create_gain();
        backend.schedule(
            gain,
            Param::Gain,
            Automation::SetValue {
                value: partial.amplitude,
                time: now,
            },
        );
        backend.connect(gain, destination);

        let osc = backend.create_oscillator(partial.phase.unwrap_or(0.0));
        backend.connect(osc, gain);

        Self {
            partial,
            pitch: None,
            osc,
            gain,
            state: PlayState::Ready,
        }
    }

    pub fn partial(&self) -> &Partial {
        &self.partial
    }

    pub fn rate(&self) -> f64 {
        self.partial.rate
    }

    pub fn amplitude(&self) -> f64 {
        self.partial.amplitude
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Oscillator node handle
    pub fn node(&self) -> NodeId {
        self.osc
    }

    pub fn gain_node(&self) -> NodeId {
        self.gain
    }

    /// Frequency in Hz at the current pitch
    pub fn frequency(&self) -> Option<f64> {
        self.pitch.map(|pitch| self.partial.rate * pitch)
    }

    /// Start at `pitch × rate`, or retarget if already playing
    ///
    /// Frequencies outside the audible range are not started. The pitch is
    /// kept so a later `update` into range can start the oscillator.
    pub fn play(&mut self, pitch: f64, time: f64, backend: &mut dyn AudioBackend) {
        if self.state.is_used() {
            tracing::debug!(node = %self.osc, "ignoring play on used oscillator");
            return;
        }

        self.pitch = Some(pitch);
        let frequency = self.partial.rate * pitch;
        if !is_audible(frequency) {
            tracing::warn!(frequency, rate = self.partial.rate, "oscillator frequency out of range");
            return;
        }

        match self.state {
            PlayState::Ready => self.start(frequency, time, backend),
            _ => backend.schedule(
                self.osc,
                Param::Frequency,
                Automation::ExponentialRamp {
                    value: frequency,
                    time,
                },
            ),
        }
    }

    fn start(&mut self, frequency: f64, time: f64, backend: &mut dyn AudioBackend) {
        backend.schedule(
            self.osc,
            Param::Frequency,
            Automation::SetValue {
                value: frequency,
                time,
            },
        );
        backend.start(self.osc, time);
        self.state = PlayState::Playing;
    }

    /// Replace the partial in place, retuning a playing oscillator
    ///
    /// An oscillator that was played out of range starts once the new
    /// partial brings it into the audible range.
    pub fn update(&mut self, partial: Partial, backend: &mut dyn AudioBackend) {
        if self.state.is_used() {
            return;
        }
        let now = backend.current_time();

        if partial.amplitude != self.partial.amplitude {
            backend.schedule(
                self.gain,
                Param::Gain,
                Automation::LinearRamp {
                    value: partial.amplitude,
                    time: now,
                },
            );
        }

        self.partial = partial;

        let Some(frequency) = self.frequency() else {
            return;
        };
        if !is_audible(frequency) {
            return;
        }

        match self.state {
            PlayState::Playing => backend.schedule(
                self.osc,
                Param::Frequency,
                Automation::ExponentialRamp {
                    value: frequency,
                    time: now,
                },
            ),
            PlayState::Ready => {
                tracing::debug!(node = %self.osc, frequency, "starting oscillator back in range");
                self.start(frequency, now, backend);
            }
            PlayState::Used => {}
        }
    }

    /// Stop at `time` and mark used
    pub fn stop(&mut self, time: f64, backend: &mut dyn AudioBackend) {
        if self.state.is_playing() {
            backend.stop(self.osc, time);
        }
        self.state = PlayState::Used;
    }

    /// Stop now and detach both nodes from the graph
    pub fn destroy(&mut self, backend: &mut dyn AudioBackend) {
        let now = backend.current_time();
        self.stop(now, backend);
        backend.disconnect(self.gain);
        backend.disconnect(self.osc);
    }
}
