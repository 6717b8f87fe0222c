// Input validation shared by the relay client and the relay service

use ethers::types::Address;
use ethers::utils::to_checksum;
use std::str::FromStr;

use crate::constants::{MAX_KITTENS, MIN_KITTENS};

/// Syntactic address check: `0x` followed by exactly 40 hex digits, any case.
/// EIP-55 checksums are not enforced.
pub fn is_valid_address(value: &str) -> bool {
    let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) else {
        return false;
    };
    hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn parse_address(value: &str) -> Option<Address> {
    if !is_valid_address(value) {
        return None;
    }
    Address::from_str(&value[2..]).ok()
}

pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

pub fn is_valid_kitten_count(count: i64) -> bool {
    (MIN_KITTENS..=MAX_KITTENS).contains(&count)
}
