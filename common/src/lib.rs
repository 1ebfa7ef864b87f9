//! Ratewise Common Types
//!
//! This crate contains the data model shared by the rate engine and its
//! collaborators: currency codes and pairs, cached exchange rates, conversion
//! results and history records.

pub mod identifiers;
pub mod monetary;
pub mod history;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use history::*;
pub use time::*;
