//! Matching rules: crossing predicates and trade construction.

pub mod crossing;
pub mod executor;

pub use executor::MatchExecutor;
