use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    convert::TryInto,
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

pub const ADDRESS_SIZE: usize = 32; // 32 bytes / 256 bits

// Account identifier used by the ledger and the vesting schedules.
// Externally owned accounts and contracts share the same namespace.
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Default)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    // The null identifier, never a valid recipient
    pub const fn zero() -> Self {
        Address::new([0; ADDRESS_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; ADDRESS_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Derive the address of a contract deployed by `deployer`
    ///
    /// The derivation is deterministic: the same deployer and nonce always
    /// produce the same address, and distinct nonces never collide in practice.
    pub fn derive_contract(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"AHA_CONTRACT:");
        hasher.update(deployer.as_bytes());
        hasher.update(&nonce.to_le_bytes());
        Address(hasher.finalize().into())
    }

    /// Derive an account address from a human readable label
    pub fn from_label(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"AHA_ACCOUNT:");
        hasher.update(label.as_bytes());
        Address(hasher.finalize().into())
    }
}

impl From<[u8; ADDRESS_SIZE]> for Address {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; ADDRESS_SIZE] = bytes.try_into().map_err(|_| "Invalid address")?;
        Ok(Address::new(bytes))
    }
}

impl AsRef<Address> for Address {
    fn as_ref(&self) -> &Address {
        self
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Address {
    fn deserialize<D: serde::Deserializer<'a>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Address::from_str(&hex).map_err(SerdeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address() {
        assert!(Address::zero().is_zero());
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn test_hex_parsing_accepts_prefix() {
        let address = Address::from_label("bob");
        let prefixed = format!("0x{}", address);
        assert_eq!(Address::from_str(&prefixed), Ok(address));
        assert_eq!(Address::from_str(&address.to_hex()), Ok(address));
        assert!(Address::from_str("0x1234").is_err());
    }

    #[test]
    fn test_contract_derivation_depends_on_nonce() {
        let deployer = Address::from_label("deployer");
        let first = Address::derive_contract(&deployer, 0);
        let second = Address::derive_contract(&deployer, 1);
        assert_ne!(first, second);
        assert_eq!(first, Address::derive_contract(&deployer, 0));
    }

    #[test]
    fn test_serde_uses_hex_string() -> Result<(), Box<dyn std::error::Error>> {
        let address = Address::from_label("carol");
        let json = serde_json::to_string(&address)?;
        assert_eq!(json, format!("\"{}\"", address.to_hex()));
        let decoded: Address = serde_json::from_str(&json)?;
        assert_eq!(decoded, address);
        Ok(())
    }
}
