// Client-side integrations: the host's wallet and the relay endpoint.
pub mod relay_client;
pub mod wallet;

pub use relay_client::RelayClient;
pub use wallet::{RpcWallet, WalletProvider, WalletSession};
