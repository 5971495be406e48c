//! JSON HTTP interface

pub mod handler;
pub mod server;

pub use handler::{ApiError, ApiResult};
pub use server::{router, HttpServer};
