//! Schedule evaluation
//!
//! [`patterns`] decides whether a name is selected by a pattern list;
//! [`resolver`] turns the active schedule set into per-instrument periods,
//! a tick period, and per-tick due decisions.

pub mod patterns;
pub mod resolver;
