use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One completed observe -> decide -> act iteration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AgentStep {
    pub observation: String,
    pub thought: String,
    /// Button name from the fixed vocabulary, e.g. `"UP"`.
    pub action: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Receives steps in generation order, exactly one per loop iteration.
///
/// Implementations must not block the control loop: hand off and return.
pub trait StepSink: Send + Sync {
    fn on_step(&self, step: AgentStep);
}

impl StepSink for tokio::sync::mpsc::UnboundedSender<AgentStep> {
    fn on_step(&self, step: AgentStep) {
        // A closed receiver just drops the step; the producer never blocks.
        let _ = self.send(step);
    }
}

/// Bounded in-memory step history.
///
/// The producer never drops or reorders steps; this sink caps what it
/// retains, oldest first.
#[derive(Debug)]
pub struct StepLog {
    entries: Mutex<VecDeque<AgentStep>>,
    limit: usize,
}

impl StepLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            limit,
        }
    }

    /// Most recent `n` steps, oldest first.
    pub fn recent(&self, n: usize) -> Vec<AgentStep> {
        match self.entries.lock() {
            Ok(entries) => {
                let skip = entries.len().saturating_sub(n);
                entries.iter().skip(skip).cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StepSink for StepLog {
    fn on_step(&self, step: AgentStep) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push_back(step);
            while entries.len() > self.limit {
                entries.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u64) -> AgentStep {
        AgentStep {
            observation: format!("obs {n}"),
            thought: String::new(),
            action: "UP".to_string(),
            timestamp: n,
        }
    }

    #[test]
    fn log_caps_retained_history_oldest_first() {
        let log = StepLog::new(3);
        for n in 0..5 {
            log.on_step(step(n));
        }
        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert_eq!(
            recent.iter().map(|s| s.timestamp).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn recent_returns_last_n_in_order() {
        let log = StepLog::new(10);
        for n in 0..4 {
            log.on_step(step(n));
        }
        let recent = log.recent(2);
        assert_eq!(
            recent.iter().map(|s| s.timestamp).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }
}
