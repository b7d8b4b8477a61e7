//! Legacy (pre-segwit) signature hashing
//!
//! The digest commits to a modified copy of the spending transaction: every
//! input script is cleared except the one being signed, which carries the
//! subscript, and the hash type decides which other inputs and outputs stay.

use crate::constants::*;
use crate::encode::BufferWriter;
use crate::error::{AuthError, Result};
use crate::hash::sha256sha256;
use crate::input::Input;
use crate::key::PublicKey;
use crate::output::Output;
use crate::script::Script;
use crate::transaction::Transaction;
use crate::types::{ByteString, Hash};
use log::{debug, trace};
use secp256k1::{ecdsa::Signature, Message, Secp256k1, SecretKey};

/// Script code committed to by witness signatures: `varint(len) || script`
///
/// Scripts containing OP_CODESEPARATOR are not supported.
pub fn script_code(script: &Script) -> Result<ByteString> {
    if script.has_code_separators()? {
        return Err(AuthError::CodeSeparatorNotSupported);
    }
    let mut writer = BufferWriter::new();
    writer.write_var_bytes(script.as_bytes());
    Ok(writer.into_bytes())
}

/// Legacy signature hash of `tx` for the input at `input_index`.
///
/// The result is in natural byte order, ready to be signed. With
/// SIGHASH_SINGLE and no output at `input_index` the historical
/// one-valued digest is returned instead of failing.
pub fn sighash(tx: &Transaction, hash_type: u32, input_index: usize, subscript: &Script) -> Result<Hash> {
    if input_index >= tx.inputs.len() {
        return Err(AuthError::InputIndexOutOfRange { index: input_index, count: tx.inputs.len() });
    }

    let subscript = match subscript.remove_code_separators() {
        Ok(script) => script,
        Err(e) => {
            debug!("subscript does not parse, hashing it unchanged: {}", e);
            subscript.clone()
        }
    };

    let mut txcopy = Transaction {
        version: tx.version,
        inputs: tx.inputs.iter().map(|input| Input::Raw(input.base().clone())).collect(),
        outputs: tx.outputs.clone(),
        lock_time: tx.lock_time,
    };

    for input in txcopy.inputs.iter_mut() {
        input.base_mut().script_sig = Script::new();
    }
    txcopy.inputs[input_index].base_mut().script_sig = subscript;

    let base_type = hash_type & SIGHASH_BASE_MASK;
    if base_type == SIGHASH_NONE || base_type == SIGHASH_SINGLE {
        for (i, input) in txcopy.inputs.iter_mut().enumerate() {
            if i != input_index {
                input.base_mut().sequence = 0;
            }
        }
    }

    if base_type == SIGHASH_NONE {
        txcopy.outputs.clear();
    } else if base_type == SIGHASH_SINGLE {
        if input_index >= txcopy.outputs.len() {
            debug!(
                "SIGHASH_SINGLE on input {} with only {} outputs",
                input_index,
                txcopy.outputs.len()
            );
            return Ok(SIGHASH_SINGLE_BUG);
        }
        txcopy.outputs.truncate(input_index + 1);
        for output in txcopy.outputs[..input_index].iter_mut() {
            *output = Output::from_wire(NULL_OUTPUT_VALUE, Script::new());
        }
    }

    if hash_type & SIGHASH_ANYONECANPAY != 0 {
        let own = txcopy.inputs.swap_remove(input_index);
        txcopy.inputs = vec![own];
    }

    let mut writer = BufferWriter::new();
    txcopy.write_legacy(&mut writer);
    writer.write_u32_le(hash_type);
    let digest = sha256sha256(writer.as_bytes());
    trace!("legacy sighash input {} type {:#04x}: {}", input_index, hash_type, hex::encode(digest));
    Ok(digest)
}

/// Sign input `input_index` with a deterministic low-S ECDSA signature
pub fn sign(
    tx: &Transaction,
    secret_key: &SecretKey,
    hash_type: u32,
    input_index: usize,
    subscript: &Script,
) -> Result<Signature> {
    let digest = sighash(tx, hash_type, input_index, subscript)?;
    sign_digest(&digest, secret_key)
}

/// Check a signature against the legacy digest; high-S signatures are
/// normalized first.
pub fn verify(
    tx: &Transaction,
    signature: &Signature,
    hash_type: u32,
    public_key: &PublicKey,
    input_index: usize,
    subscript: &Script,
) -> Result<bool> {
    let digest = sighash(tx, hash_type, input_index, subscript)?;
    verify_digest(&digest, signature, &public_key.inner)
}

pub(crate) fn sign_digest(digest: &Hash, secret_key: &SecretKey) -> Result<Signature> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest_slice(digest)?;
    Ok(secp.sign_ecdsa(&message, secret_key))
}

pub(crate) fn verify_digest(
    digest: &Hash,
    signature: &Signature,
    public_key: &secp256k1::PublicKey,
) -> Result<bool> {
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest_slice(digest)?;
    let mut normalized = *signature;
    normalized.normalize_s();
    Ok(secp.verify_ecdsa(&message, &normalized, public_key).is_ok())
}
