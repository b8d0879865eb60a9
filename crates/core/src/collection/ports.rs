//! Port interfaces for metric collection
//!
//! The aggregation engine and exporters live outside this workspace; these
//! traits are the boundary the push controller drives.

use async_trait::async_trait;
use dynmetric_domain::{Resource, Result};

use crate::schedule::resolver::CollectionRule;

/// A single instrument snapshot handed from the accumulator to a processor.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub value: f64,
}

impl Record {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value }
    }
}

/// Records produced by one collection round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointSet {
    records: Vec<Record>,
}

impl CheckpointSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }
}

/// Walks registered instruments and snapshots the due ones
#[async_trait]
pub trait Accumulator: Send + Sync {
    /// Hand every instrument for which `rule.is_due` holds to `processor`.
    ///
    /// Returns the number of instruments collected.
    async fn collect(&self, rule: &CollectionRule<'_>, processor: &mut dyn Processor) -> usize;
}

/// Receives records during a collection round and builds a checkpoint set
pub trait Processor: Send + Sync {
    /// Begin a new round, discarding the previous checkpoint.
    fn start_collection(&mut self);

    fn process(&mut self, record: Record) -> Result<()>;

    /// Close the current round.
    ///
    /// # Errors
    /// `DynMetricError::Collection` when the round cannot be finalised.
    fn finish_collection(&mut self) -> Result<()>;

    /// Records of the last finished round.
    fn checkpoint_set(&self) -> &CheckpointSet;
}

/// Ships a checkpoint set somewhere
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, resource: &Resource, checkpoint_set: &CheckpointSet) -> Result<()>;
}
