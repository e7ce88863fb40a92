pub mod cli;
pub mod client;
pub mod config;
pub mod dto;
pub mod provider;
pub mod providers;
pub mod resolver;
pub mod server;
pub mod transcript;
pub mod video_id;
