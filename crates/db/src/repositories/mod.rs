//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. [`search_repo`] adds the generic
//! paginated search on top of the per-entity match queries.

pub mod customer_repo;
pub mod search_repo;
pub mod ticket_repo;

pub use customer_repo::CustomerRepo;
pub use search_repo::{CustomerSearch, SearchError, SearchRepo, SearchSource, TicketSearch};
pub use ticket_repo::TicketRepo;
