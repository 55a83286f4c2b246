// Library exports following Clean Architecture principles

// Domain layer (request/response models, ports, errors)
pub mod domain;

// Use cases layer (request dispatch)
pub mod use_cases;

// Adapters layer (stream framing and decoding)
pub mod adapters;

// Infrastructure layer (HTTP transport)
pub mod infrastructure;

pub mod client;
pub mod config;

pub use client::{MetaOptions, ReadOptions, SearchOptions, WriteOptions, XapiandClient};
pub use config::ClientConfig;
pub use domain::{
    Action, ClientError, Document, Indexes, Metadata, Payload, RequestBody, Response, Results,
};
pub use use_cases::RequestOptions;
