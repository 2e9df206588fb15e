//! School bus route registry
//!
//! - `Route` / `RouteField`: typed record and its column table
//! - `HeaderSet`: schema discovered from the spreadsheet
//! - `RouteRegistry`: lookup, search, insert and update with rollback

mod errors;
mod headers;
mod record;
mod registry;

pub use errors::{RouteError, RouteResult};
pub use headers::{Column, HeaderSet, Slot};
pub use record::{Route, RouteField, RoutePatch};
pub use registry::{LoadState, RouteRegistry};
