//! Collection ports and the default processor
//!
//! One tick drives `Processor::start_collection`, then
//! `Accumulator::collect` with the tick's due rule, then
//! `Processor::finish_collection`, then `Exporter::export` on the resulting
//! checkpoint set.

pub mod ports;
pub mod processor;
