//! Shared progress readout for long-running batch work.

use crate::domain::timeframe::Timeframe;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

const MAX_LOGS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub current: usize,
    pub total: usize,
    pub message: String,
    pub phase: Phase,
    pub timeframe: Option<Timeframe>,
    pub logs: Vec<String>,
}

struct State {
    current: usize,
    total: usize,
    message: String,
    phase: Phase,
    timeframe: Option<Timeframe>,
    logs: VecDeque<String>,
}

/// Mutated by pool workers and the scan loop, snapshot-readable from
/// anywhere. Log lines are capped at the most recent fifty.
pub struct ProgressTracker {
    state: Mutex<State>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                current: 0,
                total: 0,
                message: String::new(),
                phase: Phase::Idle,
                timeframe: None,
                logs: VecDeque::new(),
            }),
        }
    }

    pub fn begin(&self, total: usize, message: impl Into<String>, timeframe: Option<Timeframe>) {
        let mut state = self.state.lock();
        state.current = 0;
        state.total = total;
        state.message = message.into();
        state.phase = Phase::Running;
        state.timeframe = timeframe;
    }

    pub fn update(&self, current: usize) {
        let mut state = self.state.lock();
        state.current = current.min(state.total);
    }

    pub fn log(&self, line: impl Into<String>) {
        let mut state = self.state.lock();
        if state.logs.len() == MAX_LOGS {
            state.logs.pop_front();
        }
        state.logs.push_back(line.into());
    }

    pub fn finish(&self, message: impl Into<String>) {
        let mut state = self.state.lock();
        state.current = state.total;
        state.message = message.into();
        state.phase = Phase::Done;
    }

    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.state.lock();
        state.message = message.into();
        state.phase = Phase::Failed;
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.lock();
        ProgressSnapshot {
            current: state.current,
            total: state.total,
            message: state.message.clone(),
            phase: state.phase,
            timeframe: state.timeframe,
            logs: state.logs.iter().cloned().collect(),
        }
    }
}
