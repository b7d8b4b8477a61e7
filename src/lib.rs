//! # Litecoin transaction authorization
//!
//! Builds, serializes and signs Litecoin spend transactions: locking and
//! unlocking scripts, protocol-exact signature hashes and multi-party
//! signature tracking for threshold (multisig) spends, including the
//! P2SH-wrapped segregated witness variant.
//!
//! ## Layout
//!
//! - [`script`], [`output`], [`unspent_output`], [`key`]: value types
//! - [`sighash`], [`sighash_witness`]: legacy and BIP143 digests
//! - [`input`]: signable inputs and their completion state
//! - [`transaction`]: wire encoding and the signing workflow
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: digests are pure functions of their inputs and
//!    signatures use RFC6979 nonces
//! 2. **Byte exact**: every wire format, including the SIGHASH_SINGLE
//!    one-valued digest, matches the network
//! 3. **Exact Version Pinning**: consensus-critical dependencies are pinned
//! 4. **No ambient network**: address prefixes come from an explicit [`Network`]
//!
//! ## Usage
//!
//! ```rust
//! use litecoin_tx_auth::{build_public_key_hash_out, Output, PublicKey, Transaction, UnspentOutput, SIGHASH_ALL};
//! use secp256k1::{Secp256k1, SecretKey};
//!
//! let secp = Secp256k1::new();
//! let secret_key = SecretKey::from_slice(&[1u8; 32]).unwrap();
//! let public_key = PublicKey::from_secret_key(&secp, &secret_key);
//! let locking = build_public_key_hash_out(&public_key.pubkey_hash());
//!
//! let utxo = UnspentOutput::new(
//!     "a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458",
//!     0,
//!     locking.clone(),
//!     100_000,
//!     None,
//! )
//! .unwrap();
//!
//! let mut tx = Transaction::new();
//! tx.from_unspent(&utxo).unwrap();
//! tx.add_output(Output::new(90_000, locking).unwrap());
//! tx.sign(&secret_key, SIGHASH_ALL).unwrap();
//! assert!(tx.is_fully_signed().unwrap());
//! ```

pub mod constants;
pub mod encode;
pub mod error;
pub mod hash;
pub mod input;
pub mod key;
pub mod network;
pub mod output;
pub mod script;
pub mod sighash;
pub mod sighash_witness;
pub mod signature;
pub mod transaction;
pub mod types;
pub mod unspent_output;

// Re-export commonly used types
pub use constants::*;
pub use error::{AuthError, Result};
pub use hash::{hash160, sha256, sha256sha256};
pub use input::{Input, MultiSigScriptHashInput, MultiSigScriptHashInputObject, PublicKeyHashInput, TxInput};
pub use key::PublicKey;
pub use network::{AddressPayload, Network, LIVENET, REGTEST, TESTNET};
pub use output::{Output, OutputObject};
pub use script::{
    build_data_push, build_multisig_out, build_p2sh_multisig_in, build_public_key_hash_out,
    build_script_hash_out, build_witness_multisig_out_from_script, Chunk, Script,
};
pub use signature::{TransactionSignature, TransactionSignatureObject};
pub use transaction::Transaction;
pub use types::*;
pub use unspent_output::{UnspentOutput, UnspentOutputData, UnspentOutputObject};
