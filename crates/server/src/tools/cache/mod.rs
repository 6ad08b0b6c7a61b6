//! Cache inspection and maintenance tools.

pub mod purge;
pub mod regions;

pub use purge::{CachePurgeParams, purge_impl};
pub use regions::regions_impl;
