//! Spending P2SH multisig outputs, optionally through a nested P2WSH program
//!
//! Public keys keep the encoding they were given in (33 or 65 bytes) and are
//! sorted by those bytes. The redeem script, the key-to-slot mapping and the
//! unlocking data all derive from that order, so it is fixed once at
//! construction.

use crate::constants::{MULTISIG_OPCODES_SIZE, PUBKEY_SIZE, SIGNATURE_SIZE};
use crate::error::{AuthError, Result};
use crate::input::TxInput;
use crate::key::PublicKey;
use crate::output::Output;
use crate::script::{
    build_data_push, build_multisig_out, build_p2sh_multisig_in, build_script_hash_out,
    build_witness_multisig_out_from_script, Script,
};
use crate::signature::TransactionSignature;
use crate::transaction::Transaction;
use crate::types::{txid_from_hex, txid_to_hex, ByteString, OutPoint};
use crate::{sighash, sighash_witness};
use log::debug;
use secp256k1::{Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSigScriptHashInput {
    base: TxInput,
    public_keys: Vec<PublicKey>,
    threshold: usize,
    redeem_script: Script,
    public_key_index: BTreeMap<ByteString, usize>,
    signatures: Vec<Option<TransactionSignature>>,
    nested_witness: bool,
}

/// Plain object form of a [`MultiSigScriptHashInput`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSigScriptHashInputObject {
    pub prev_tx_id: String,
    pub output_index: u32,
    pub sequence_number: u32,
    pub script: Script,
    pub output: Output,
    pub threshold: usize,
    pub public_keys: Vec<String>,
    pub signatures: Vec<Option<TransactionSignature>>,
    pub nested_witness: bool,
}

impl MultiSigScriptHashInput {
    /// Build the input and check that the keys and threshold hash to the
    /// spent output's script.
    ///
    /// `signatures`, when given, must have one slot per public key in
    /// sorted key order.
    pub fn new(
        base: TxInput,
        public_keys: Vec<PublicKey>,
        threshold: usize,
        signatures: Option<Vec<Option<TransactionSignature>>>,
        nested_witness: bool,
    ) -> Result<Self> {
        let mut public_keys = public_keys;
        // byte order of serialized keys equals their lowercase hex order
        public_keys.sort_by_key(|key| key.to_bytes());

        let redeem_script = build_multisig_out(&public_keys, threshold)?;
        let expected = if nested_witness {
            build_script_hash_out(&build_witness_multisig_out_from_script(&redeem_script))
        } else {
            build_script_hash_out(&redeem_script)
        };
        let output = base.output()?;
        if *output.script() != expected {
            return Err(AuthError::ScriptHashMismatch(format!(
                "public keys hash to {} but the spent output is locked by {}",
                expected,
                output.script()
            )));
        }

        let mut public_key_index = BTreeMap::new();
        for (slot, key) in public_keys.iter().enumerate() {
            public_key_index.entry(key.to_bytes()).or_insert(slot);
        }

        let signatures = match signatures {
            Some(signatures) => {
                if signatures.len() != public_keys.len() {
                    return Err(AuthError::InvalidSignature(format!(
                        "expected {} signature slots, got {}",
                        public_keys.len(),
                        signatures.len()
                    )));
                }
                for (slot, signature) in signatures.iter().enumerate() {
                    if let Some(signature) = signature {
                        if signature.public_key != public_keys[slot] {
                            return Err(AuthError::UnknownPublicKey(format!(
                                "signature in slot {} belongs to {}",
                                slot,
                                signature.public_key.to_hex()
                            )));
                        }
                    }
                }
                signatures
            }
            None => vec![None; public_keys.len()],
        };

        let mut input = MultiSigScriptHashInput {
            base,
            public_keys,
            threshold,
            redeem_script,
            public_key_index,
            signatures,
            nested_witness,
        };
        input.update_script()?;
        Ok(input)
    }

    pub fn base(&self) -> &TxInput {
        &self.base
    }

    pub(crate) fn base_mut(&mut self) -> &mut TxInput {
        &mut self.base
    }

    /// Sorted public keys
    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn redeem_script(&self) -> &Script {
        &self.redeem_script
    }

    pub fn signatures(&self) -> &[Option<TransactionSignature>] {
        &self.signatures
    }

    pub fn nested_witness(&self) -> bool {
        self.nested_witness
    }

    /// Slot of `public_key`, if it is one of the signers
    pub fn public_key_slot(&self, public_key: &PublicKey) -> Option<usize> {
        self.public_key_index.get(&public_key.to_bytes()).copied()
    }

    /// Witness script code: `varint(len) || redeem script`
    pub fn script_code(&self) -> Result<ByteString> {
        sighash::script_code(&self.redeem_script)
    }

    /// Spent amount as the 8-byte LE buffer committed to by witness digests
    pub fn litoshis_buffer(&self) -> Result<[u8; 8]> {
        Ok(self.base.output()?.litoshis().to_le_bytes())
    }

    pub fn get_signatures(
        &self,
        tx: &Transaction,
        secret_key: &SecretKey,
        input_index: usize,
        sigtype: u32,
    ) -> Result<Vec<TransactionSignature>> {
        let secp = Secp256k1::new();
        let own_key = secp256k1::PublicKey::from_secret_key(&secp, secret_key);
        let mut results = Vec::new();
        // every slot holding this key, in whichever encoding it was given
        for public_key in self.public_keys.iter().filter(|key| key.inner == own_key) {
            let signature = if self.nested_witness {
                let litoshis = self.base.output()?.litoshis();
                sighash_witness::sign(tx, secret_key, sigtype, input_index, &self.script_code()?, litoshis)?
            } else {
                sighash::sign(tx, secret_key, sigtype, input_index, &self.redeem_script)?
            };
            results.push(TransactionSignature {
                public_key: *public_key,
                prev_tx_id: self.base.prevout.txid,
                output_index: self.base.prevout.index,
                input_index,
                signature,
                sigtype,
            });
        }
        Ok(results)
    }

    pub fn add_signature(&mut self, tx: &Transaction, signature: TransactionSignature) -> Result<()> {
        if self.is_fully_signed() {
            return Err(AuthError::AlreadyComplete);
        }
        self.base.check_outpoint(&signature)?;
        let slot = self
            .public_key_slot(&signature.public_key)
            .ok_or_else(|| AuthError::UnknownPublicKey(signature.public_key.to_hex()))?;
        if !self.is_valid_signature(tx, &signature)? {
            return Err(AuthError::InvalidSignature(format!(
                "signature for input {} does not verify",
                signature.input_index
            )));
        }
        debug!("input {} signature added in slot {}", signature.input_index, slot);
        let previous = self.signatures[slot].replace(signature);
        if let Err(e) = self.update_script() {
            self.signatures[slot] = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn clear_signatures(&mut self) -> Result<()> {
        self.signatures = vec![None; self.public_keys.len()];
        self.update_script()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.count_signatures() == self.threshold
    }

    pub fn count_signatures(&self) -> usize {
        self.signatures.iter().filter(|s| s.is_some()).count()
    }

    pub fn count_missing_signatures(&self) -> usize {
        self.threshold.saturating_sub(self.count_signatures())
    }

    pub fn public_keys_without_signature(&self) -> Vec<PublicKey> {
        self.public_keys
            .iter()
            .zip(&self.signatures)
            .filter(|(_, signature)| signature.is_none())
            .map(|(key, _)| *key)
            .collect()
    }

    pub fn is_valid_signature(&self, tx: &Transaction, signature: &TransactionSignature) -> Result<bool> {
        if self.nested_witness {
            sighash_witness::verify(
                tx,
                &signature.signature,
                signature.sigtype,
                &signature.public_key,
                signature.input_index,
                &self.script_code()?,
                self.base.output()?.litoshis(),
            )
        } else {
            sighash::verify(
                tx,
                &signature.signature,
                signature.sigtype,
                &signature.public_key,
                signature.input_index,
                &self.redeem_script,
            )
        }
    }

    /// Unlocking size once fully signed: opcodes, threshold signatures and
    /// every public key
    pub fn estimate_size(&self) -> usize {
        MULTISIG_OPCODES_SIZE + self.threshold * SIGNATURE_SIZE + self.public_keys.len() * PUBKEY_SIZE
    }

    fn signature_pushes(&self) -> Vec<ByteString> {
        self.signatures
            .iter()
            .flatten()
            .map(TransactionSignature::to_script_bytes)
            .collect()
    }

    /// Rebuild the unlocking data from the current signature slots
    fn update_script(&mut self) -> Result<()> {
        let pushes = self.signature_pushes();
        if self.nested_witness {
            let program = build_witness_multisig_out_from_script(&self.redeem_script);
            let mut stack = Vec::with_capacity(pushes.len() + 2);
            stack.push(Vec::new());
            stack.extend(pushes);
            stack.push(self.redeem_script.to_bytes());
            self.base.script_sig = build_data_push(program.as_bytes());
            self.base.witnesses = stack;
        } else {
            self.base.script_sig = build_p2sh_multisig_in(
                &self.public_keys,
                self.threshold,
                &pushes,
                Some(&self.redeem_script),
            )?;
        }
        Ok(())
    }

    pub fn to_object(&self) -> Result<MultiSigScriptHashInputObject> {
        Ok(MultiSigScriptHashInputObject {
            prev_tx_id: txid_to_hex(&self.base.prevout.txid),
            output_index: self.base.prevout.index,
            sequence_number: self.base.sequence,
            script: self.base.script_sig.clone(),
            output: self.base.output()?.clone(),
            threshold: self.threshold,
            public_keys: self.public_keys.iter().map(PublicKey::to_hex).collect(),
            signatures: self.signatures.clone(),
            nested_witness: self.nested_witness,
        })
    }

    pub fn from_object(obj: MultiSigScriptHashInputObject) -> Result<Self> {
        let prevout = OutPoint::new(txid_from_hex(&obj.prev_tx_id)?, obj.output_index);
        let mut base = TxInput::new(prevout, Some(obj.output));
        base.sequence = obj.sequence_number;
        base.script_sig = obj.script;

        let public_keys = obj
            .public_keys
            .iter()
            .map(|key| PublicKey::from_hex(key))
            .collect::<Result<Vec<_>>>()?;

        MultiSigScriptHashInput::new(base, public_keys, obj.threshold, Some(obj.signatures), obj.nested_witness)
    }
}
