pub mod config;
pub mod document_fetch;
pub mod enrich;
pub mod error;
pub mod export;
pub mod filter;
pub mod http_client;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod state;
pub mod team_averages;
pub mod team_fetch;
pub mod worker;
