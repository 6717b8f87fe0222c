pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod integrations;
pub mod models;
pub mod retry;
pub mod services;
pub mod session;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use session::{CollectOutcome, HostEvent, KittenSession, MessageLog, MessageSink};
