/// Domain layer - wire-independent models of requests, results and errors
/// This layer has no dependencies on outer layers

pub mod entities;
pub mod errors;
pub mod params;
pub mod repositories;
pub mod results;
pub mod url;

pub use entities::*;
pub use errors::*;
pub use params::*;
pub use repositories::*;
pub use results::*;
pub use url::*;
