//! Client side of the RepairDesk search pipeline.
//!
//! - [`controller`] -- debounced, latest-request-wins search state machine.
//! - [`executor`] -- the search action invocation surface and its HTTP implementation.
//! - [`url_state`] -- list navigation driven entirely by the URL query string.

pub mod controller;
pub mod error;
pub mod executor;
pub mod url_state;

pub use controller::{SearchController, SearchEvent, SearchPhase, SearchSnapshot};
pub use error::ClientError;
pub use executor::{ClientConfig, HttpSearchExecutor, SearchExecutor};
pub use url_state::{Navigator, UrlPaginationController};
