pub mod onchain;
pub mod relayer;

// Re-export for convenience
pub use onchain::{ChainLedger, KittenLedger};
pub use relayer::RelayerService;
