//! Additive Synth
//!
//! Polyphonic front of the voice engine. Owns the host backend, the master
//! gain node and the registry of active voices.
//!
//! Released voices leave the active registry and wait in a releasing list
//! until their fade has finished; a garbage-collection sweep then destroys
//! them. Voices whose gain has decayed to nothing while still registered are
//! collected the same way.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::backend::{AudioBackend, Automation, NodeId, Param};
use super::buffer::SampleBuffer;
use super::envelope::Envelope;
use super::oscillator::Oscillator;
use super::render::{render_partials, RenderOptions};
use super::voice::Voice;
use crate::error::Result;
use crate::spectrum::Spectrum;

/// Gain below which a settled voice is considered silent
pub const SILENCE_THRESHOLD: f64 = 1e-5;

/// Default master gain
pub const DEFAULT_MASTER_GAIN: f64 = 0.75;

/// A note-on request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    /// Fundamental frequency of the note in Hz
    pub pitch: f64,
    pub velocity: f64,
    /// Existing voice to retrigger, or id for the new voice
    #[serde(default)]
    pub voice_id: Option<String>,
    /// Start time on the host clock; now when unset
    #[serde(default)]
    pub time: Option<f64>,
}

impl PlayRequest {
    pub fn new(pitch: f64, velocity: f64) -> Self {
        Self {
            pitch,
            velocity,
            voice_id: None,
            time: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.voice_id = Some(id.into());
        self
    }

    pub fn at(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }
}

pub struct AdditiveSynth<B: AudioBackend> {
    backend: B,
    spectrum: Spectrum,
    envelope: Option<Envelope>,
    master: NodeId,
    master_gain: f64,
    voices: HashMap<String, Voice>,
    releasing: Vec<Voice>,
}

impl<B: AudioBackend> AdditiveSynth<B> {
    /// Create a synth with its master gain connected to the destination
    pub fn new(mut backend: B, spectrum: Spectrum, envelope: Option<Envelope>) -> Self {
        let master = backend.create_gain();
        let destination = backend.destination();
        let now = backend.current_time();
        backend.schedule(
            master,
            Param::Gain,
            Automation::SetValue {
                value: DEFAULT_MASTER_GAIN,
                time: now,
            },
        );
        backend.connect(master, destination);

        Self {
            backend,
            spectrum,
            envelope,
            master,
            master_gain: DEFAULT_MASTER_GAIN,
            voices: HashMap::new(),
            releasing: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    pub fn master_node(&self) -> NodeId {
        self.master
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    pub fn voice(&self, id: &str) -> Option<&Voice> {
        self.voices.get(id)
    }

    /// Number of voices in the active registry
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Number of released voices still fading out
    pub fn releasing_voices(&self) -> usize {
        self.releasing.len()
    }

    /// Start a note and return the id of the voice playing it
    ///
    /// A request naming a registered voice retriggers that voice; otherwise a
    /// new voice is built from the current spectrum. Finished voices are
    /// collected first.
    pub fn play(&mut self, request: PlayRequest) -> String {
        self.collect_garbage();

        let time = request.time.unwrap_or_else(|| self.backend.current_time());
        let id = request
            .voice_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if !self.voices.contains_key(&id) {
            let voice = Voice::new(
                id.clone(),
                &self.spectrum,
                self.envelope,
                self.master,
                &mut self.backend,
            );
            self.voices.insert(id.clone(), voice);
        }

        if let Some(voice) = self.voices.get_mut(&id) {
            voice.play(request.pitch, request.velocity, time, &mut self.backend);
        }

        id
    }

    /// Release a voice; unknown ids are ignored
    pub fn release(&mut self, id: &str, time: Option<f64>) {
        let Some(mut voice) = self.voices.remove(id) else {
            tracing::debug!(voice = id, "release of unknown voice");
            return;
        };

        let time = time.unwrap_or_else(|| self.backend.current_time());
        voice.release(time, &mut self.backend);
        self.releasing.push(voice);
    }

    pub fn release_all(&mut self, time: Option<f64>) {
        let ids: Vec<String> = self.voices.keys().cloned().collect();
        for id in ids {
            self.release(&id, time);
        }
    }

    /// Replace the spectrum and reconcile one voice, or every active voice
    pub fn update(&mut self, spectrum: Spectrum, id: Option<&str>) {
        self.spectrum = spectrum;

        match id {
            Some(id) => match self.voices.get_mut(id) {
                Some(voice) => voice.update(&self.spectrum, &mut self.backend),
                None => tracing::debug!(voice = id, "update of unknown voice"),
            },
            None => {
                for voice in self.voices.values_mut() {
                    voice.update(&self.spectrum, &mut self.backend);
                }
            }
        }
    }

    /// Ramp the master gain to `value` at `time` (now when unset)
    pub fn set_master_gain(&mut self, value: f64, time: Option<f64>) {
        let value = value.max(0.0);
        let time = time.unwrap_or_else(|| self.backend.current_time());
        self.backend
            .schedule(self.master, Param::Gain, Automation::LinearRamp { value, time });
        self.master_gain = value;
    }

    /// Envelope for every subsequent play and release
    pub fn set_envelope(&mut self, envelope: Option<Envelope>) {
        self.envelope = envelope;
        for voice in self.voices.values_mut() {
            voice.set_envelope(envelope);
        }
    }

    fn is_finished(voice: &Voice, backend: &B) -> bool {
        backend.current_time() >= voice.settles_at() && voice.gain_value(backend) < SILENCE_THRESHOLD
    }

    /// Destroy every voice whose gain has settled below the silence threshold
    ///
    /// # Returns
    /// Number of voices collected.
    pub fn collect_garbage(&mut self) -> usize {
        let mut collected = 0;

        let ids: Vec<String> = self.voices.keys().cloned().collect();
        for id in ids {
            let finished = self
                .voices
                .get(&id)
                .is_some_and(|voice| Self::is_finished(voice, &self.backend));
            if !finished {
                continue;
            }
            if let Some(mut voice) = self.voices.remove(&id) {
                voice.destroy(&mut self.backend);
                collected += 1;
            }
        }

        let releasing = std::mem::take(&mut self.releasing);
        for mut voice in releasing {
            if Self::is_finished(&voice, &self.backend) {
                voice.destroy(&mut self.backend);
                collected += 1;
            } else {
                self.releasing.push(voice);
            }
        }

        if collected > 0 {
            let freed = self.backend.release_detached();
            tracing::debug!(collected, freed, remaining = self.voices.len(), "collected voices");
        }
        collected
    }

    /// Oscillators of every active voice, keyed by voice id
    pub fn oscillators(&self) -> HashMap<&str, Vec<&Oscillator>> {
        self.voices
            .iter()
            .map(|(id, voice)| (id.as_str(), voice.oscillators()))
            .collect()
    }

    /// Render the current spectrum offline at the backend sample rate
    ///
    /// The backend clock is resumed first, matching hosts that start
    /// suspended until a user gesture.
    pub fn render_sample(&mut self, duration: f64, fundamental: f64) -> Result<SampleBuffer> {
        if !self.backend.is_running() {
            self.backend.resume();
        }

        let options = RenderOptions {
            duration,
            fundamental,
            sample_rate: self.backend.sample_rate(),
            with_phases: true,
        };
        render_partials(&self.spectrum.all_partials(), &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::simulated::SimulatedBackend;
    use crate::spectrum::{generate, SeriesOptions, SpectralLayer};
    use approx::assert_relative_eq;

    fn spectrum(layers: &[usize]) -> Spectrum {
        Spectrum::new(
            layers
                .iter()
                .map(|&n| SpectralLayer::new(generate(&SeriesOptions::harmonic(n)).unwrap()))
                .collect(),
        )
    }

    fn synth(envelope: Option<Envelope>) -> AdditiveSynth<SimulatedBackend> {
        AdditiveSynth::new(SimulatedBackend::default(), spectrum(&[3]), envelope)
    }

    #[test]
    fn test_play_registers_voice_with_uuid() {
        let mut synth = synth(None);
        let id = synth.play(PlayRequest::new(220.0, 1.0));

        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(synth.active_voices(), 1);
        assert!(synth.voice(&id).unwrap().state().is_playing());
    }

    #[test]
    fn test_play_same_id_retriggers() {
        let mut synth = synth(None);
        synth.play(PlayRequest::new(220.0, 1.0).with_id("a"));
        synth.play(PlayRequest::new(330.0, 0.5).with_id("a"));

        assert_eq!(synth.active_voices(), 1);
        assert_eq!(synth.voice("a").unwrap().pitch(), Some(330.0));
    }

    #[test]
    fn test_release_moves_voice_and_gc_collects_after_fade() {
        let mut synth = synth(Some(Envelope::default()));
        let id = synth.play(PlayRequest::new(220.0, 1.0));
        let gain_node = synth.voice(&id).unwrap().gain_node();

        synth.backend_mut().set_time(1.0);
        synth.release(&id, None);
        assert_eq!(synth.active_voices(), 0);
        assert_eq!(synth.releasing_voices(), 1);

        synth.backend_mut().set_time(2.0);
        assert_eq!(synth.collect_garbage(), 0);

        synth.backend_mut().set_time(4.5);
        assert_eq!(synth.collect_garbage(), 1);
        assert_eq!(synth.releasing_voices(), 0);
        assert!(synth.backend().node(gain_node).is_none());
        assert!(synth.backend().node(synth.master_node()).is_some());
    }

    #[test]
    fn test_gc_collects_silent_active_voice() {
        let mut synth = synth(None);
        synth.play(PlayRequest::new(220.0, 0.0).with_id("quiet"));
        synth.play(PlayRequest::new(220.0, 1.0).with_id("loud"));

        assert!(synth.voice("quiet").is_none());
        assert!(synth.voice("loud").is_some());
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut synth = synth(None);
        synth.release("missing", None);
        synth.update(spectrum(&[2]), Some("missing"));
        assert_eq!(synth.active_voices(), 0);
        assert_eq!(synth.spectrum().len(), 1);
    }

    #[test]
    fn test_update_all_voices() {
        let mut synth = synth(None);
        synth.play(PlayRequest::new(110.0, 1.0).with_id("a"));
        synth.play(PlayRequest::new(220.0, 1.0).with_id("b"));

        synth.update(spectrum(&[3, 2]), None);

        let oscillators = synth.oscillators();
        assert_eq!(oscillators["a"].len(), 5);
        assert_eq!(oscillators["b"].len(), 5);
    }

    #[test]
    fn test_release_all() {
        let mut synth = synth(None);
        synth.play(PlayRequest::new(110.0, 1.0));
        synth.play(PlayRequest::new(220.0, 1.0));

        synth.release_all(None);
        assert_eq!(synth.active_voices(), 0);
        assert_eq!(synth.releasing_voices(), 2);
    }

    #[test]
    fn test_master_gain_and_envelope() {
        let mut synth = synth(None);
        assert_relative_eq!(
            synth.backend().param_value(synth.master_node(), Param::Gain),
            DEFAULT_MASTER_GAIN
        );

        synth.set_master_gain(0.5, None);
        assert_relative_eq!(synth.backend().param_value(synth.master_node(), Param::Gain), 0.5);

        let id = synth.play(PlayRequest::new(110.0, 1.0));
        synth.set_envelope(Some(Envelope::default()));
        assert_eq!(synth.voice(&id).unwrap().envelope(), Some(&Envelope::default()));
    }

    #[test]
    fn test_render_sample_resumes_backend() {
        let mut synth = synth(None);
        assert!(!synth.backend().is_running());

        let buffer = synth.render_sample(0.1, 440.0).unwrap();
        assert!(synth.backend().is_running());
        assert_eq!(buffer.len(), 4800);
        assert_relative_eq!(buffer.peak(), 0.7, epsilon = 1e-4);
    }
}
