//! Backend collaborator: the contract, an HTTP implementation, and a mock.

pub mod client;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;

pub use client::HealthApi;
pub use error::ApiError;
pub use http::HttpHealthApi;
pub use mock::MockHealthApi;
pub use types::LoginResponse;
