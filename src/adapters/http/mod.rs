//! HTTP adapters - status endpoints and the assembled application router.

mod router;
mod status;

pub use router::{build_router, AppState};
pub use status::{status_routes, StatusAppState, StatusResponse};
