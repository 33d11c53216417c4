//! Transport-neutral HTTP request and response types

mod method;
mod request;
mod response;

pub use method::HttpMethod;
pub use request::{ApiRequest, AUTHORIZATION};
pub use response::{ApiResponse, StatusCode};
