pub mod backend;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod push;
pub mod state;

#[cfg(test)]
mod testing;

pub use errors::IngestError;
