//! Domain building blocks shared by the RepairDesk server and client crates.
//!
//! Nothing in here touches the network or the database: the modules are
//! plain data types plus the in-process stores (rate-limit counters and TTL
//! caches) that the API layer owns through its application state.

pub mod cache;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod roles;
pub mod sanitize;
pub mod search;
pub mod types;
