pub mod daemon;
pub mod error;
pub mod routes;
pub mod sse;
pub mod vnc;

pub use daemon::{build_router, start_gateway};
pub use error::{ApiError, ApiResponse};
