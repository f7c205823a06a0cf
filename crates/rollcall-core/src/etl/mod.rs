//! Aggregation of the primary store into the secondary store.

mod aggregate;
mod loader;

pub use aggregate::{
    is_valid_state, ratio, AggregateReport, Aggregator, District, RepresentativeSummary,
    StateAggregate, StateTally, GENDERS, PARTIES, VALID_STATES,
};
pub use loader::{load, BatchWriter, LoadReport};
