use std::cmp::min;

use alloy_primitives::{B256, aliases::B32};
use tree_hash::TreeHash;

use crate::{fork_data::ForkData, signing_data::SigningData};

pub mod checksummed_address {
    use alloy_primitives::Address;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&address.to_checksum(None))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: String = Deserialize::deserialize(deserializer)?;
        raw.parse::<Address>().map_err(D::Error::custom)
    }
}

/// Return the signing root of ``object`` under ``domain``.
pub fn compute_signing_root<T: TreeHash>(object: &T, domain: B256) -> B256 {
    SigningData {
        object_root: object.tree_hash_root(),
        domain,
    }
    .tree_hash_root()
}

/// Return the domain for ``domain_type`` on the chain identified by
/// ``fork_version`` and ``genesis_validators_root``.
pub fn compute_domain(
    domain_type: B32,
    fork_version: B32,
    genesis_validators_root: B256,
) -> B256 {
    let fork_data_root = ForkData {
        current_version: fork_version,
        genesis_validators_root,
    }
    .compute_fork_data_root();
    let domain_bytes = [&domain_type.0, &fork_data_root.0[..28]].concat();
    B256::from_slice(&domain_bytes)
}

pub fn xor<T: AsRef<[u8]>>(bytes_1: T, bytes_2: T) -> B256 {
    let mut result = B256::default();
    for i in 0..32 {
        result[i] = bytes_1.as_ref()[i] ^ bytes_2.as_ref()[i];
    }
    result
}

/// Quantize ``amount`` down to ``increment`` and clamp to ``max``.
pub fn compute_effective_balance(amount: u64, increment: u64, max: u64) -> u64 {
    min(amount - amount % increment, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_balance_is_quantized_and_clamped() {
        let increment = 1_000_000_000;
        let max = 32_000_000_000;
        assert_eq!(
            compute_effective_balance(31_900_000_000, increment, max),
            31_000_000_000
        );
        assert_eq!(
            compute_effective_balance(45_000_000_000, increment, max),
            32_000_000_000
        );
        assert_eq!(compute_effective_balance(0, increment, max), 0);
    }

    #[test]
    fn xor_is_bytewise() {
        let a = B256::repeat_byte(0b1010_1010);
        let b = B256::repeat_byte(0b0110_0110);
        assert_eq!(xor(a, b), B256::repeat_byte(0b1100_1100));
    }
}
