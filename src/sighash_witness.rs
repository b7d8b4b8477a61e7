//! Witness v0 signature hashing (BIP143)

use crate::constants::*;
use crate::encode::BufferWriter;
use crate::error::{AuthError, Result};
use crate::hash::sha256sha256;
use crate::key::PublicKey;
use crate::sighash::{sign_digest, verify_digest};
use crate::transaction::Transaction;
use crate::types::Hash;
use log::trace;
use secp256k1::{ecdsa::Signature, SecretKey};

const ZERO_HASH: Hash = [0u8; 32];

/// Witness v0 signature hash of `tx` for the input at `input_index`.
///
/// `script_code` must already carry its varint length prefix (see
/// [`crate::sighash::script_code`]) and `litoshis` is the value of the
/// output being spent.
pub fn sighash(
    tx: &Transaction,
    hash_type: u32,
    input_index: usize,
    script_code: &[u8],
    litoshis: u64,
) -> Result<Hash> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(AuthError::InputIndexOutOfRange { index: input_index, count: tx.inputs.len() })?
        .base();

    let base_type = hash_type & SIGHASH_BASE_MASK;
    let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;

    let hash_prevouts = if anyone_can_pay {
        ZERO_HASH
    } else {
        let mut writer = BufferWriter::new();
        for other in &tx.inputs {
            other.base().prevout.to_writer(&mut writer);
        }
        sha256sha256(writer.as_bytes())
    };

    let hash_sequence = if anyone_can_pay || base_type == SIGHASH_SINGLE || base_type == SIGHASH_NONE {
        ZERO_HASH
    } else {
        let mut writer = BufferWriter::new();
        for other in &tx.inputs {
            writer.write_u32_le(other.base().sequence);
        }
        sha256sha256(writer.as_bytes())
    };

    let hash_outputs = if base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        let mut writer = BufferWriter::new();
        for output in &tx.outputs {
            output.to_writer(&mut writer);
        }
        sha256sha256(writer.as_bytes())
    } else if base_type == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        sha256sha256(&tx.outputs[input_index].to_bytes())
    } else {
        ZERO_HASH
    };

    let mut writer = BufferWriter::new();
    writer.write_i32_le(tx.version).write(&hash_prevouts).write(&hash_sequence);
    input.prevout.to_writer(&mut writer);
    writer
        .write(script_code)
        .write_u64_le(litoshis)
        .write_u32_le(input.sequence)
        .write(&hash_outputs)
        .write_u32_le(tx.lock_time)
        .write_u32_le(hash_type);

    let digest = sha256sha256(writer.as_bytes());
    trace!("witness sighash input {} type {:#04x}: {}", input_index, hash_type, hex::encode(digest));
    Ok(digest)
}

pub fn sign(
    tx: &Transaction,
    secret_key: &SecretKey,
    hash_type: u32,
    input_index: usize,
    script_code: &[u8],
    litoshis: u64,
) -> Result<Signature> {
    let digest = sighash(tx, hash_type, input_index, script_code, litoshis)?;
    sign_digest(&digest, secret_key)
}

pub fn verify(
    tx: &Transaction,
    signature: &Signature,
    hash_type: u32,
    public_key: &PublicKey,
    input_index: usize,
    script_code: &[u8],
    litoshis: u64,
) -> Result<bool> {
    let digest = sighash(tx, hash_type, input_index, script_code, litoshis)?;
    verify_digest(&digest, signature, &public_key.inner)
}
