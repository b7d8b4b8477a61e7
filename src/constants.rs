//! Litecoin protocol constants used by script construction and signing

/// Largest amount representable without precision loss: 2^53 - 1 litoshis
pub const MAX_SAFE_INTEGER: u64 = 0x1f_ffff_ffff_ffff;

/// Litoshis per LTC
pub const LITOSHIS_PER_LTC: u64 = 100_000_000;

/// Default transaction version
pub const DEFAULT_TX_VERSION: i32 = 1;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Value of the placeholder outputs that SIGHASH_SINGLE puts before the signed output
pub const NULL_OUTPUT_VALUE: u64 = 0xffff_ffff_ffff_ffff;

// Sighash types

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_NONE: u32 = 0x02;
pub const SIGHASH_SINGLE: u32 = 0x03;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Mask selecting the base type (ALL, NONE, SINGLE) of a sighash flag
pub const SIGHASH_BASE_MASK: u32 = 0x1f;

/// Digest returned for SIGHASH_SINGLE without a matching output.
///
/// Reference clients sign the integer one instead of failing; signatures over
/// it are valid on chain, so it is reproduced byte for byte.
pub const SIGHASH_SINGLE_BUG: [u8; 32] = {
    let mut digest = [0u8; 32];
    digest[0] = 1;
    digest
};

// Opcodes

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CODESEPARATOR: u8 = 0xab;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// Maximum number of public keys in a bare multisig script
pub const MAX_MULTISIG_KEYS: usize = 16;

// Size estimates for fee calculation

/// Multisig scriptSig overhead: serialized size (<=3) + OP_0 .. OP_N .. OP_M OP_CHECKMULTISIG
pub const MULTISIG_OPCODES_SIZE: usize = 7;

/// size (1) + DER (<=72) + sighash (1)
pub const SIGNATURE_SIZE: usize = 74;

/// size (1) + compressed public key (33)
pub const PUBKEY_SIZE: usize = 34;

/// Largest P2PKH scriptSig: signature push (73) + public key push (34)
pub const PUBLIC_KEY_HASH_SCRIPT_MAX_SIZE: usize = 107;
