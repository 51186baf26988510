//! Oscillator Bank
//!
//! One spectral layer on the host graph. Oscillator `i` always renders
//! partial `i` of the layer; updates reconcile by position.

use super::backend::{AudioBackend, Automation, NodeId, Param};
use super::lifecycle::PlayState;
use super::oscillator::Oscillator;
use crate::spectrum::{Partial, SpectralLayer};

#[derive(Debug, Clone)]
pub struct OscillatorBank {
    gain: NodeId,
    oscillators: Vec<Oscillator>,
    pitch: Option<f64>,
    state: PlayState,
}

impl OscillatorBank {
    /// Build one oscillator per partial behind a unity-gain node
    pub fn new(layer: &SpectralLayer, destination: NodeId, backend: &mut dyn AudioBackend) -> Self {
        let gain = backend.create_gain();
        let now = backend.current_time();
        backend.schedule(gain, Param::Gain, Automation::SetValue { value: 1.0, time: now });
        backend.connect(gain, destination);

        let mut oscillators = Vec::with_capacity(layer.partials.len());
        for partial in &layer.partials {
            oscillators.push(Oscillator::new(*partial, gain, backend));
        }

        Self {
            gain,
            oscillators,
            pitch: None,
            state: PlayState::Ready,
        }
    }

    pub fn oscillators(&self) -> &[Oscillator] {
        &self.oscillators
    }

    pub fn oscillator(&self, index: usize) -> Option<&Oscillator> {
        self.oscillators.get(index)
    }

    pub fn len(&self) -> usize {
        self.oscillators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oscillators.is_empty()
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn gain_node(&self) -> NodeId {
        self.gain
    }

    /// Current partials in oscillator order
    pub fn partials(&self) -> Vec<Partial> {
        self.oscillators.iter().map(|osc| *osc.partial()).collect()
    }

    pub fn play(&mut self, pitch: f64, time: f64, backend: &mut dyn AudioBackend) {
        if self.state.is_used() {
            return;
        }
        self.pitch = Some(pitch);
        for osc in &mut self.oscillators {
            osc.play(pitch, time, backend);
        }
        self.state = PlayState::Playing;
    }

    /// Reconcile against a new layer by position
    ///
    /// Shared indices update in place, surplus oscillators are destroyed from
    /// the tail, and missing ones are appended (and started if the bank is
    /// playing).
    pub fn update(&mut self, layer: &SpectralLayer, backend: &mut dyn AudioBackend) {
        if self.state.is_used() {
            return;
        }
        let target = layer.partials.len();

        for (osc, partial) in self.oscillators.iter_mut().zip(&layer.partials) {
            osc.update(*partial, backend);
        }

        while self.oscillators.len() > target {
            if let Some(mut removed) = self.oscillators.pop() {
                removed.destroy(backend);
            }
        }

        let now = backend.current_time();
        for partial in layer.partials.iter().skip(self.oscillators.len()) {
            let mut osc = Oscillator::new(*partial, self.gain, backend);
            if let (PlayState::Playing, Some(pitch)) = (self.state, self.pitch) {
                osc.play(pitch, now, backend);
            }
            self.oscillators.push(osc);
        }
    }

    /// Stop every oscillator at `time`
    pub fn stop(&mut self, time: f64, backend: &mut dyn AudioBackend) {
        for osc in &mut self.oscillators {
            osc.stop(time, backend);
        }
        self.state = PlayState::Used;
    }

    /// Stop now and detach the whole bank
    pub fn destroy(&mut self, backend: &mut dyn AudioBackend) {
        for osc in &mut self.oscillators {
            osc.destroy(backend);
        }
        backend.disconnect(self.gain);
        self.state = PlayState::Used;
    }
}
