/// Infrastructure layer - external frameworks and tools
pub mod http_client;

pub use http_client::{ReqwestTransport, DEFAULT_POOL_SIZE};
