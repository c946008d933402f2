//! API middleware.

mod problem_details;
mod request_id;

pub use problem_details::{handle_panic, problem_details_middleware};
pub use request_id::{incoming_request_id, request_id_middleware, RequestId};
