use super::StringMapper;
use super::log_mapper::{LogField, LogMapper, LogMappingError};
use crate::domain::{Event, Log, LogBatch};
use std::collections::HashMap;
use thiserror::Error;

/// A log batch together with the positions of the events it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedLogBatch {
    pub batch: LogBatch,
    /// Indices into the publish batch, parallel to `batch.logs`.
    pub event_indices: Vec<usize>,
}

/// One event that could not be turned into a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMapping {
    pub event_index: usize,
    pub error: LogMappingError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingSummary {
    #[error("Mapping failed for all {total} logs. Errors: {causes}")]
    AllFailed { total: usize, causes: String },

    #[error("Mapping failed for {failed} out of {total} logs. Errors: {causes}")]
    PartiallyFailed {
        failed: usize,
        total: usize,
        causes: String,
    },
}

/// Outcome of one grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Batches in order of first appearance of their key.
    pub batches: Vec<MappedLogBatch>,
    pub failed: Vec<FailedMapping>,
}

impl Grouping {
    pub fn mapped_count(&self) -> usize {
        self.batches.iter().map(|b| b.batch.len()).sum()
    }

    pub fn all_failed(&self) -> bool {
        self.batches.is_empty() && !self.failed.is_empty()
    }

    pub fn causes(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.error.to_string()).collect()
    }

    /// Describes the mapping failures of a pass over `total` events, if any.
    pub fn summary(&self, total: usize) -> Result<(), MappingSummary> {
        if self.failed.is_empty() {
            return Ok(());
        }

        let causes = self.causes().join("\n");
        if self.failed.len() == total {
            Err(MappingSummary::AllFailed { total, causes })
        } else {
            Err(MappingSummary::PartiallyFailed {
                failed: self.failed.len(),
                total,
                causes,
            })
        }
    }
}

/// Partitions events into per-(application, tag) log batches.
#[derive(Debug, Clone)]
pub struct LogBatchMapper {
    pub application_name: StringMapper,
    pub tag: StringMapper,
    pub log: LogMapper,
}

impl LogBatchMapper {
    pub fn to_log_batches(&self, events: &[Event]) -> Grouping {
        let mut grouping = Grouping::default();
        let mut positions: HashMap<(String, String), usize> = HashMap::new();

        for (event_index, event) in events.iter().enumerate() {
            let (application_name, tag, log) = match self.map_event(event) {
                Ok(mapped) => mapped,
                Err(error) => {
                    grouping.failed.push(FailedMapping { event_index, error });
                    continue;
                }
            };

            let key = (application_name, tag);
            let position = match positions.get(&key) {
                Some(position) => *position,
                None => {
                    let position = grouping.batches.len();
                    grouping.batches.push(MappedLogBatch {
                        batch: LogBatch::new(key.0.clone(), key.1.clone()),
                        event_indices: Vec::new(),
                    });
                    positions.insert(key, position);
                    position
                }
            };

            let mapped = &mut grouping.batches[position];
            mapped.batch.logs.push(log);
            mapped.event_indices.push(event_index);
        }

        grouping
    }

    fn map_event(&self, event: &Event) -> Result<(String, String, Log), LogMappingError> {
        let application_name = self
            .application_name
            .map(event)
            .map_err(LogMappingError::mapping(LogField::ApplicationName))?;
        let tag = self
            .tag
            .map(event)
            .map_err(LogMappingError::mapping(LogField::Tag))?;
        let log = self.log.to_log(event)?;
        Ok((application_name, tag, log))
    }
}
