pub mod auth;
pub mod request_id;

pub use auth::{admin_gate, require_auth, watchlist_gate};
pub use request_id::{make_span_with_request_id, request_id_middleware, RequestId};
