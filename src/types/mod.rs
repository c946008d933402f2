//! Shared response types.

mod problem;
mod response;

pub use problem::ProblemResponse;
pub use response::{ApiResponse, Created, NoContent};
