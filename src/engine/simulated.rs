//! Simulated Backend
//!
//! In-process [`AudioBackend`] with a manually advanced clock. It records the
//! node graph, every automation timeline and oscillator start/stop times, and
//! evaluates parameter values the way a real host would. Used by tests and by
//! headless consumers that only need the engine's bookkeeping.

use std::collections::HashMap;

use super::backend::{AudioBackend, Automation, NodeId, Param};
use super::buffer::DEFAULT_SAMPLE_RATE;

/// Kind of a simulated node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Destination,
    Gain,
    Oscillator { phase: f64 },
}

/// Recorded state of one node
#[derive(Debug, Clone)]
pub struct SimNode {
    pub kind: NodeKind,
    pub created_at: f64,
    pub outputs: Vec<NodeId>,
    pub start: Option<f64>,
    pub stop: Option<f64>,
    timelines: HashMap<Param, Vec<Automation>>,
}

impl SimNode {
    fn new(kind: NodeKind, created_at: f64) -> Self {
        Self {
            kind,
            created_at,
            outputs: Vec::new(),
            start: None,
            stop: None,
            timelines: HashMap::new(),
        }
    }

    /// Scheduled events of a parameter, ordered by time
    pub fn events(&self, param: Param) -> &[Automation] {
        self.timelines
            .get(&param)
            .map_or(&[] as &[Automation], Vec::as_slice)
    }

    /// Evaluate a parameter at time `t`
    pub fn value_at(&self, param: Param, t: f64) -> f64 {
        let mut prev_time = self.created_at;
        let mut prev_value = param.default_value();

        for event in self.events(param) {
            let (value, time) = (event.value(), event.time());
            if time <= t {
                prev_time = time;
                prev_value = value;
                continue;
            }

            return match event {
                Automation::SetValue { .. } => prev_value,
                Automation::LinearRamp { .. } => linear(prev_time, prev_value, time, value, t),
                Automation::ExponentialRamp { .. } => {
                    if prev_value > 0.0 && value > 0.0 {
                        exponential(prev_time, prev_value, time, value, t)
                    } else {
                        linear(prev_time, prev_value, time, value, t)
                    }
                }
            };
        }

        prev_value
    }
}

fn progress(t0: f64, t1: f64, t: f64) -> f64 {
    if t1 <= t0 {
        return 1.0;
    }
    ((t - t0) / (t1 - t0)).clamp(0.0, 1.0)
}

fn linear(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    v0 + (v1 - v0) * progress(t0, t1, t)
}

fn exponential(t0: f64, v0: f64, t1: f64, v1: f64, t: f64) -> f64 {
    v0 * (v1 / v0).powf(progress(t0, t1, t))
}

/// Backend with a manual clock
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    time: f64,
    sample_rate: u32,
    running: bool,
    next_id: u64,
    destination: NodeId,
    nodes: HashMap<NodeId, SimNode>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl SimulatedBackend {
    /// Create a suspended backend at time zero
    pub fn new(sample_rate: u32) -> Self {
        let destination = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(destination, SimNode::new(NodeKind::Destination, 0.0));

        Self {
            time: 0.0,
            sample_rate,
            running: false,
            next_id: 1,
            destination,
            nodes,
        }
    }

    /// Move the clock forward
    pub fn advance(&mut self, seconds: f64) {
        if seconds > 0.0 {
            self.time += seconds;
        }
    }

    /// Jump the clock to an absolute time; going backwards is ignored
    pub fn set_time(&mut self, time: f64) {
        if time > self.time {
            self.time = time;
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SimNode> {
        self.nodes.get(&id)
    }

    /// True if the node feeds at least one other node
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| !n.outputs.is_empty())
    }

    pub fn start_time(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(&id).and_then(|n| n.start)
    }

    pub fn stop_time(&self, id: NodeId) -> Option<f64> {
        self.nodes.get(&id).and_then(|n| n.stop)
    }

    /// True if the oscillator has started and not yet stopped at `time`
    pub fn is_sounding_at(&self, id: NodeId, time: f64) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let started = node.start.is_some_and(|s| s <= time);
        let stopped = node.stop.is_some_and(|s| s <= time);
        started && !stopped
    }

    pub fn events(&self, id: NodeId, param: Param) -> &[Automation] {
        self.nodes
            .get(&id)
            .map_or(&[] as &[Automation], |n| n.events(param))
    }

    pub fn value_at(&self, id: NodeId, param: Param, time: f64) -> f64 {
        self.nodes
            .get(&id)
            .map_or(param.default_value(), |n| n.value_at(param, time))
    }

    fn is_detached(&self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if id == self.destination || !node.outputs.is_empty() {
            return false;
        }
        if let NodeKind::Oscillator { .. } = node.kind {
            let silent = node.start.is_none() || node.stop.is_some_and(|s| s <= self.time);
            if !silent {
                return false;
            }
        }
        !self.nodes.values().any(|n| n.outputs.contains(&id))
    }

    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, SimNode::new(kind, self.time));
        id
    }
}

impl AudioBackend for SimulatedBackend {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_oscillator(&mut self, phase: f64) -> NodeId {
        self.add_node(NodeKind::Oscillator { phase })
    }

    fn create_gain(&mut self) -> NodeId {
        self.add_node(NodeKind::Gain)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) {
        if let Some(node) = self.nodes.get_mut(&from) {
            if !node.outputs.contains(&to) {
                node.outputs.push(to);
            }
        }
    }

    fn disconnect(&mut self, node: NodeId) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.outputs.clear();
        }
    }

    fn schedule(&mut self, node: NodeId, param: Param, automation: Automation) {
        let Some(node) = self.nodes.get_mut(&node) else {
            return;
        };
        let timeline = node.timelines.entry(param).or_default();
        let at = timeline.partition_point(|e| e.time() <= automation.time());
        timeline.insert(at, automation);
    }

    fn cancel_scheduled(&mut self, node: NodeId, param: Param, from: f64) {
        if let Some(timeline) = self
            .nodes
            .get_mut(&node)
            .and_then(|n| n.timelines.get_mut(&param))
        {
            timeline.retain(|e| e.time() < from);
        }
    }

    fn param_value(&self, node: NodeId, param: Param) -> f64 {
        self.value_at(node, param, self.time)
    }

    fn start(&mut self, node: NodeId, time: f64) {
        if let Some(node) = self.nodes.get_mut(&node) {
            if node.start.is_none() {
                node.start = Some(time);
            }
        }
    }

    fn stop(&mut self, node: NodeId, time: f64) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.stop = Some(time);
        }
    }

    fn resume(&mut self) {
        self.running = true;
    }

    /// Drop disconnected nodes nothing feeds into and that no longer sound
    ///
    /// Repeats until no node qualifies, so a chain detached at its tail is
    /// freed in full.
    fn release_detached(&mut self) -> usize {
        let mut freed = 0;
        loop {
            let detached: Vec<NodeId> = self
                .nodes
                .keys()
                .copied()
                .filter(|id| self.is_detached(*id))
                .collect();
            if detached.is_empty() {
                return freed;
            }
            for id in detached {
                self.nodes.remove(&id);
                freed += 1;
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
