/// Application constants

// Kitten counter bounds
pub const MIN_KITTENS: i64 = 0;
pub const MAX_KITTENS: i64 = 60;

// Counter slot allocation
pub const SLOT_RANGE_START: u32 = 1;
pub const SLOT_RANGE_END: u32 = 100;
/// Variable ids the game already uses for other state.
pub const RESERVED_SLOT_IDS: [u32; 11] = [2, 8, 9, 12, 18, 19, 21, 22, 23, 24, 25];
/// Reserved variable holding the wallet "connected" flag for menu rendering.
pub const WALLET_STATUS_SLOT: u32 = 12;

// Target network (Scroll Sepolia)
pub const EXPECTED_CHAIN_ID: u64 = 534_351;
pub const DEFAULT_CHAIN_RPC_URL: &str = "https://sepolia-rpc.scroll.io";
pub const DEFAULT_KITTEN_CONTRACT_ADDRESS: &str = "0xFee91cdC10A1663d69d6891d8b6621987aACe2EF";

// Relay gas policy
pub const DEFAULT_GAS_LIMIT: u64 = 100_000;
pub const DEFAULT_CONFIRMATIONS: usize = 1;
pub const DEFAULT_MIN_BALANCE_WEI: u128 = 1_000_000_000_000_000; // 0.001 ETH

// Readiness retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 50;
pub const RETRY_MAX_DELAY_MS: u64 = 1_000;
pub const RETRY_MAX_ATTEMPTS: u32 = 8;

// Relay client
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 30_000;

// HTTP routes
pub const ROUTE_SET_KITTENS: &str = "/api/setKittens";
pub const ROUTE_GET_KITTENS: &str = "/api/getKittens";
pub const ROUTE_HEALTH: &str = "/health";
