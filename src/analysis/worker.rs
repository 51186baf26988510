//! Background analysis worker
//!
//! Runs curve and tuning computations off the caller's thread. Requests are
//! tagged with an id; when several requests are queued only the newest one is
//! computed, since a newer spectrum always supersedes the older ones.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use super::curve::{
    dissonance_curve, dissonance_curve_for_spectrum, multi_octave_curve, CurveOptions,
    DissonanceCurve, MultiOctaveOptions,
};
use super::tuning::{analyze_with_precision, Tuning};
use crate::error::{Result, XenError};
use crate::spectrum::Partial;

/// Work the analysis thread can perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisTask {
    Curve {
        partials: Vec<Partial>,
        options: CurveOptions,
    },
    SpectrumCurve {
        partials: Vec<Partial>,
        points: usize,
        fundamental: f64,
    },
    MultiOctave {
        partials: Vec<Partial>,
        options: MultiOctaveOptions,
    },
    Tuning {
        partials: Vec<Partial>,
        precision: u32,
    },
}

impl AnalysisTask {
    /// Run the task on the current thread
    pub fn run(&self) -> Result<AnalysisOutput> {
        match self {
            AnalysisTask::Curve { partials, options } => {
                dissonance_curve(partials, options).map(AnalysisOutput::Curve)
            }
            AnalysisTask::SpectrumCurve {
                partials,
                points,
                fundamental,
            } => dissonance_curve_for_spectrum(partials, *points, *fundamental)
                .map(AnalysisOutput::Curve),
            AnalysisTask::MultiOctave { partials, options } => {
                multi_octave_curve(partials, options).map(AnalysisOutput::Curve)
            }
            AnalysisTask::Tuning {
                partials,
                precision,
            } => Ok(AnalysisOutput::Tuning(analyze_with_precision(
                partials, *precision,
            ))),
        }
    }
}

/// Result payload of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisOutput {
    Curve(DissonanceCurve),
    Tuning(Tuning),
}

/// A tagged task sent to the worker
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub id: u64,
    pub task: AnalysisTask,
}

/// A tagged result posted back by the worker
#[derive(Debug, Clone)]
pub struct AnalysisResponse {
    pub id: u64,
    pub result: Result<AnalysisOutput>,
}

/// Worker loop: block for a request, drain the backlog, compute the newest
pub fn run(request_rx: Receiver<AnalysisRequest>, result_tx: Sender<AnalysisResponse>) {
    while let Ok(mut request) = request_rx.recv() {
        for newer in request_rx.try_iter() {
            tracing::trace!(superseded = request.id, by = newer.id, "dropping stale analysis request");
            request = newer;
        }

        let result = request.task.run();
        if result_tx
            .send(AnalysisResponse {
                id: request.id,
                result,
            })
            .is_err()
        {
            break;
        }
    }

    tracing::debug!("analysis worker stopped");
}

/// Handle to a running analysis thread
///
/// Dropping the handle closes the request channel and joins the thread.
pub struct AnalysisWorker {
    request_tx: Option<Sender<AnalysisRequest>>,
    result_rx: Receiver<AnalysisResponse>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
}

impl AnalysisWorker {
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("xenspectra-analysis".to_string())
            .spawn(move || run(request_rx, result_tx))
            .ok();
        if handle.is_none() {
            tracing::warn!("failed to spawn analysis thread");
        }

        Self {
            request_tx: Some(request_tx),
            result_rx,
            handle,
            next_id: 0,
        }
    }

    /// Queue a task and return its id
    ///
    /// # Errors
    /// `WorkerDisconnected` if the thread is gone.
    pub fn submit(&mut self, task: AnalysisTask) -> Result<u64> {
        let tx = self.request_tx.as_ref().ok_or(XenError::WorkerDisconnected)?;

        self.next_id += 1;
        let id = self.next_id;
        tx.send(AnalysisRequest { id, task })
            .map_err(|_| XenError::WorkerDisconnected)?;
        Ok(id)
    }

    /// Block until the next response arrives
    pub fn recv(&self) -> Result<AnalysisResponse> {
        self.result_rx
            .recv()
            .map_err(|_| XenError::WorkerDisconnected)
    }

    /// Newest response available without blocking
    pub fn latest(&self) -> Option<AnalysisResponse> {
        self.result_rx.try_iter().last()
    }

    /// Id that the most recent submission received
    pub fn last_submitted(&self) -> u64 {
        self.next_id
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
