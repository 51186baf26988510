//! Gain Envelope
//!
//! Attack/decay/sustain/release parameters and the automation they schedule
//! on a voice's gain node.

use serde::{Deserialize, Serialize};

use super::backend::{AudioBackend, Automation, NodeId, Param};
use crate::error::{Result, XenError};

/// ADSR envelope, times in seconds, sustain as a fraction of velocity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.03,
            decay: 1.6,
            sustain: 0.1,
            release: 3.0,
        }
    }
}

impl Envelope {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if value < 0.0 || !value.is_finite() {
                return Err(XenError::InvalidSettings {
                    reason: format!("envelope {name} cannot be negative, got {value}"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(XenError::InvalidSettings {
                reason: format!("envelope sustain should be within [0, 1], got {}", self.sustain),
            });
        }
        Ok(())
    }

    /// Schedule attack and decay starting at `time` from `from_value`
    ///
    /// # Returns
    /// Time at which the decay reaches the sustain level.
    pub fn schedule_onset(
        &self,
        backend: &mut dyn AudioBackend,
        node: NodeId,
        velocity: f64,
        from_value: f64,
        time: f64,
    ) -> f64 {
        let peak_at = time + self.attack;
        let sustain_at = peak_at + self.decay;

        backend.schedule(node, Param::Gain, Automation::SetValue { value: from_value, time });
        backend.schedule(
            node,
            Param::Gain,
            Automation::LinearRamp {
                value: velocity,
                time: peak_at,
            },
        );
        backend.schedule(
            node,
            Param::Gain,
            Automation::LinearRamp {
                value: velocity * self.sustain,
                time: sustain_at,
            },
        );

        sustain_at
    }

    /// Schedule the release ramp from `from_value` down to zero
    ///
    /// # Returns
    /// Time at which the gain reaches zero.
    pub fn schedule_release(
        &self,
        backend: &mut dyn AudioBackend,
        node: NodeId,
        from_value: f64,
        time: f64,
    ) -> f64 {
        schedule_fade(backend, node, from_value, time, self.release)
    }
}

/// Hold `from_value` at `time`, then ramp linearly to zero over `duration`
pub fn schedule_fade(
    backend: &mut dyn AudioBackend,
    node: NodeId,
    from_value: f64,
    time: f64,
    duration: f64,
) -> f64 {
    let end = time + duration.max(0.0);
    backend.schedule(node, Param::Gain, Automation::SetValue { value: from_value, time });
    backend.schedule(node, Param::Gain, Automation::LinearRamp { value: 0.0, time: end });
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::simulated::SimulatedBackend;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let env = Envelope::default();
        assert_eq!(env.attack, 0.03);
        assert_eq!(env.decay, 1.6);
        assert_eq!(env.sustain, 0.1);
        assert_eq!(env.release, 3.0);
        assert!(env.validate().is_ok());
    }

    #[test]
    fn test_invalid_envelopes() {
        let negative = Envelope {
            attack: -0.1,
            ..Envelope::default()
        };
        assert!(negative.validate().is_err());

        let loud_sustain = Envelope {
            sustain: 1.5,
            ..Envelope::default()
        };
        assert!(loud_sustain.validate().is_err());
    }

    #[test]
    fn test_onset_shape() {
        let mut backend = SimulatedBackend::default();
        let gain = backend.create_gain();
        let env = Envelope {
            attack: 1.0,
            decay: 2.0,
            sustain: 0.5,
            release: 1.0,
        };

        let end = env.schedule_onset(&mut backend, gain, 0.8, 0.0, 0.0);
        assert_relative_eq!(end, 3.0);
        assert_relative_eq!(backend.value_at(gain, Param::Gain, 0.5), 0.4, epsilon = 1e-12);
        assert_relative_eq!(backend.value_at(gain, Param::Gain, 1.0), 0.8, epsilon = 1e-12);
        assert_relative_eq!(backend.value_at(gain, Param::Gain, 2.0), 0.6, epsilon = 1e-12);
        assert_relative_eq!(backend.value_at(gain, Param::Gain, 10.0), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_release_reaches_zero() {
        let mut backend = SimulatedBackend::default();
        let gain = backend.create_gain();
        let env = Envelope::default();

        let end = env.schedule_release(&mut backend, gain, 0.6, 1.0);
        assert_relative_eq!(end, 4.0);
        assert_relative_eq!(backend.value_at(gain, Param::Gain, 2.5), 0.3, epsilon = 1e-12);
        assert_eq!(backend.value_at(gain, Param::Gain, 4.0), 0.0);
    }
}
