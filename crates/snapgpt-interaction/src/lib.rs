//! HTTP implementation of the backend gateway.

pub mod api_client;

pub use api_client::BackendApiClient;
