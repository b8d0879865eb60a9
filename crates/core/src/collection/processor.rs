//! Pass-through processor

use std::sync::Arc;

use dynmetric_domain::{DynMetricError, Result};
use tokio::sync::Mutex;

use super::ports::{CheckpointSet, Processor, Record};

/// Processor handle shared between the controller and outside readers.
pub type SharedProcessor = Arc<Mutex<Box<dyn Processor>>>;

pub fn shared_processor(processor: impl Processor + 'static) -> SharedProcessor {
    Arc::new(Mutex::new(Box::new(processor)))
}

/// Buffers every record of a round unchanged.
#[derive(Debug, Default)]
pub struct BasicProcessor {
    pending: Option<Vec<Record>>,
    checkpoint: CheckpointSet,
}

impl BasicProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_round(&self) -> bool {
        self.pending.is_some()
    }
}

impl Processor for BasicProcessor {
    fn start_collection(&mut self) {
        self.pending = Some(Vec::new());
        self.checkpoint = CheckpointSet::default();
    }

    fn process(&mut self, record: Record) -> Result<()> {
        match self.pending.as_mut() {
            Some(records) => {
                records.push(record);
                Ok(())
            }
            None => Err(DynMetricError::Collection(format!(
                "record '{}' processed outside a collection round",
                record.name
            ))),
        }
    }

    fn finish_collection(&mut self) -> Result<()> {
        let records = self.pending.take().ok_or_else(|| {
            DynMetricError::Collection("finish_collection without start_collection".to_string())
        })?;
        self.checkpoint = CheckpointSet::new(records);
        Ok(())
    }

    fn checkpoint_set(&self) -> &CheckpointSet {
        &self.checkpoint
    }
}
