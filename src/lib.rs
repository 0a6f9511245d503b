pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod http;
pub mod parser;
pub mod prompts;
pub mod schemas;
pub mod upload;
