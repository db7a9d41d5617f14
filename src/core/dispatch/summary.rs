//! Run state and summary reporting

use crate::domain::EntityMapping;
use std::fmt;
use std::time::Duration;

/// Phase of one dispatch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing started yet
    Init,
    /// Sources are being fetched
    Fetching,
    /// The entity source produced no entities
    EarlyExit,
    /// Secondary sources are being mapped
    Matching,
    /// Run finished
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "INIT",
            RunState::Fetching => "FETCHING",
            RunState::EarlyExit => "EARLY_EXIT",
            RunState::Matching => "MATCHING",
            RunState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Summary of a dispatch run
#[derive(Debug, Clone)]
pub struct DispatchSummary {
    /// Mappings across all secondary sources, in source order
    pub mappings: Vec<EntityMapping>,

    /// Number of configured sources
    pub sources_total: usize,

    /// Sources whose fetch or mapping failed
    pub sources_failed: usize,

    /// Entities yielded by the entity source
    pub entity_count: usize,

    /// Links across all mappings
    pub link_count: usize,

    /// Wall time of the run
    pub duration: Duration,

    transitions: Vec<RunState>,
}

impl DispatchSummary {
    /// Create a summary for a run over `sources_total` sources
    pub fn new(sources_total: usize) -> Self {
        Self {
            mappings: Vec::new(),
            sources_total,
            sources_failed: 0,
            entity_count: 0,
            link_count: 0,
            duration: Duration::from_secs(0),
            transitions: vec![RunState::Init],
        }
    }

    /// Move the run to `state`
    pub fn transition(&mut self, state: RunState) {
        tracing::debug!(from = %self.state(), to = %state, "Dispatcher state change");
        self.transitions.push(state);
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.transitions.last().copied().unwrap_or(RunState::Init)
    }

    /// Every state the run passed through, in order
    pub fn transitions(&self) -> &[RunState] {
        &self.transitions
    }

    /// Whether the run ended early for lack of entities
    pub fn is_early_exit(&self) -> bool {
        self.transitions.contains(&RunState::EarlyExit)
    }

    /// Whether every source was fetched and mapped
    pub fn is_complete(&self) -> bool {
        self.sources_failed == 0
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Append mappings from one source
    pub fn add_mappings(&mut self, mappings: Vec<EntityMapping>) {
        self.link_count += mappings.iter().map(EntityMapping::link_count).sum::<usize>();
        self.mappings.extend(mappings);
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            state = %self.state(),
            sources_total = self.sources_total,
            sources_failed = self.sources_failed,
            entities = self.entity_count,
            mappings = self.mappings.len(),
            links = self.link_count,
            duration_ms = self.duration.as_millis() as u64,
            "Dispatch completed"
        );

        if self.sources_failed > 0 {
            tracing::warn!(
                sources_failed = self.sources_failed,
                "Dispatch completed with missing source data"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LinkRecord;
    use serde_json::json;

    #[test]
    fn test_transitions() {
        let mut summary = DispatchSummary::new(3);
        assert_eq!(summary.state(), RunState::Init);

        summary.transition(RunState::Fetching);
        summary.transition(RunState::EarlyExit);
        summary.transition(RunState::Done);

        assert_eq!(summary.state(), RunState::Done);
        assert!(summary.is_early_exit());
        assert_eq!(
            summary.transitions(),
            &[RunState::Init, RunState::Fetching, RunState::EarlyExit, RunState::Done]
        );
    }

    #[test]
    fn test_add_mappings_counts_links() {
        let mut summary = DispatchSummary::new(2);
        let link = LinkRecord {
            repository: "IDC".to_string(),
            url: "u".to_string(),
            metadata: json!([]),
        };
        summary.add_mappings(vec![
            EntityMapping {
                entity_id: json!("A"),
                links: vec![link.clone(), link.clone()],
            },
            EntityMapping {
                entity_id: json!("B"),
                links: vec![link],
            },
        ]);

        assert_eq!(summary.mappings.len(), 2);
        assert_eq!(summary.link_count, 3);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RunState::EarlyExit.to_string(), "EARLY_EXIT");
        assert_eq!(RunState::Matching.to_string(), "MATCHING");
    }
}
