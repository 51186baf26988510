//! Audio Backend
//!
//! The host-provided tone-generation primitive: oscillator and gain nodes,
//! a scheduling clock and parameter automation. The voice engine only talks
//! to the host through [`AudioBackend`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a node in the host audio graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Automatable node parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Param {
    /// Linear gain of a gain node
    Gain,
    /// Frequency in Hz of an oscillator node
    Frequency,
}

impl Param {
    /// Value a parameter holds before any automation
    pub fn default_value(&self) -> f64 {
        match self {
            Param::Gain => 1.0,
            Param::Frequency => 440.0,
        }
    }
}

/// One scheduled parameter change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Automation {
    /// Jump to `value` at `time`
    SetValue { value: f64, time: f64 },
    /// Ramp linearly from the previous event, reaching `value` at `time`
    LinearRamp { value: f64, time: f64 },
    /// Ramp exponentially from the previous event, reaching `value` at `time`
    ExponentialRamp { value: f64, time: f64 },
}

impl Automation {
    pub fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. }
            | Automation::LinearRamp { time, .. }
            | Automation::ExponentialRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            Automation::SetValue { value, .. }
            | Automation::LinearRamp { value, .. }
            | Automation::ExponentialRamp { value, .. } => value,
        }
    }
}

/// Host audio graph consumed by the voice engine
///
/// Times are in seconds on the host clock. Node handles stay valid after
/// `disconnect` until `release_detached` is called; a disconnected node is
/// simply no longer audible.
pub trait AudioBackend {
    /// Current time of the scheduling clock
    fn current_time(&self) -> f64;

    fn sample_rate(&self) -> u32;

    /// Final output node
    fn destination(&self) -> NodeId;

    /// Create a sine oscillator starting at `phase` (fraction of a cycle)
    fn create_oscillator(&mut self, phase: f64) -> NodeId;

    fn create_gain(&mut self) -> NodeId;

    fn connect(&mut self, from: NodeId, to: NodeId);

    /// Detach a node from every output
    fn disconnect(&mut self, node: NodeId);

    fn schedule(&mut self, node: NodeId, param: Param, automation: Automation);

    /// Drop every event of `param` scheduled at or after `from`
    fn cancel_scheduled(&mut self, node: NodeId, param: Param, from: f64);

    /// Value of `param` at the current time
    fn param_value(&self, node: NodeId, param: Param) -> f64;

    fn start(&mut self, node: NodeId, time: f64);

    fn stop(&mut self, node: NodeId, time: f64);

    /// Resume a suspended clock
    fn resume(&mut self);

    fn is_running(&self) -> bool;

    /// Free nodes that are detached from the graph and can no longer sound
    ///
    /// Hosts with their own node garbage collection keep the default no-op.
    ///
    /// # Returns
    /// Number of nodes freed.
    fn release_detached(&mut self) -> usize {
        0
    }
}
