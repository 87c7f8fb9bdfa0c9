pub mod app;
pub mod biosamples;
pub mod brapi;
pub mod config;
pub mod credentials;
pub mod decode;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod model;
pub mod output;
pub mod sample;
pub mod store;
pub mod transform;
