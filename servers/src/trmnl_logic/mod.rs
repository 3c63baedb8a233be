pub mod banner;
pub mod config;
pub mod downstream;
pub mod monitor;
pub mod state;
