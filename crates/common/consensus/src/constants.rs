use alloy_primitives::{aliases::B32, fixed_bytes};

pub const DOMAIN_RANDAO: B32 = fixed_bytes!("0x02000000");

pub const GENESIS_SLOT: u64 = 0;
pub const GENESIS_EPOCH: u64 = 0;
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;

// Withdrawal prefixes
pub const BLS_WITHDRAWAL_PREFIX: &[u8] = &[0];
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: &[u8] = &[1];
