/// Adapters layer - converts wire formats into domain values
pub mod stream;

pub use stream::StreamDecoder;
