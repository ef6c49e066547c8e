//! Occupancy normalization and aggregation.
//!
//! Raw readings go through the zone normalizer, are folded into floor and
//! zone aggregates, and are then composed into building totals, a derived
//! ground floor, reconciled peaks and trend series. Every function here is a
//! pure transform over one batch of readings.

pub mod aggregate;
pub mod building;
pub mod derived;
pub mod peak;
pub mod trend;
pub mod types;
pub mod utility;
pub mod zone;
