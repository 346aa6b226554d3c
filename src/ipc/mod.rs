mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use handlers::core::select_workspace;
pub use router::{flush_due, handle_request, pending_deadline};
pub use types::{AppState, Request};
