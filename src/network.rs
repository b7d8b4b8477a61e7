//! Network descriptors
//!
//! Only the address prefix bytes are needed here. Descriptors are plain values
//! handed to the functions that need them; there is no process-wide default.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    pub name: &'static str,
    pub alias: &'static str,
    pub pubkeyhash: u8,
    pub scripthash: u8,
    pub privatekey: u8,
}

pub const LIVENET: Network = Network {
    name: "livenet",
    alias: "mainnet",
    pubkeyhash: 0x30,
    scripthash: 0x32,
    privatekey: 0xb0,
};

pub const TESTNET: Network = Network {
    name: "testnet",
    alias: "testnet",
    pubkeyhash: 0x6f,
    scripthash: 0x3a,
    privatekey: 0xef,
};

pub const REGTEST: Network = Network {
    name: "regtest",
    alias: "testnet",
    pubkeyhash: 0x6f,
    scripthash: 0x3a,
    privatekey: 0xef,
};

impl Network {
    /// Look a network up by name
    pub fn from_name(name: &str) -> Option<Network> {
        match name.trim() {
            "livenet" | "mainnet" | "LTC" => Some(LIVENET),
            "testnet" | "TESTNET" => Some(TESTNET),
            "regtest" | "REGTEST" => Some(REGTEST),
            _ => None,
        }
    }
}

/// Version byte and 20-byte hash of a standard output, ready for base58check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPayload {
    pub version: u8,
    pub hash: [u8; 20],
}
