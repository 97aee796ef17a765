pub mod config;
pub mod error;
pub mod response;
pub mod token;

pub mod database;
pub mod libs;
pub mod pages;
pub mod perm;
pub mod workflow;

pub use config::Config;
pub use error::WorkflowError;
pub use libs::{base64_decode, base64_encode};
pub use response::Response;

pub type ResponseResult = Result<Response, Response>;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the
/// configured default filter.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
