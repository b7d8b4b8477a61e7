//! Transactions: wire encoding, input construction and signing
//!
//! A transaction tx = (v, ins, outs, lt). Inputs built from unspent outputs
//! know the output they spend and can be signed; inputs parsed off the wire
//! are carried as [`Input::Raw`].

use crate::constants::*;
use crate::encode::{BufferReader, BufferWriter};
use crate::error::{AuthError, Result};
use crate::hash::sha256sha256;
use crate::input::{Input, MultiSigScriptHashInput, PublicKeyHashInput, TxInput};
use crate::key::PublicKey;
use crate::output::Output;
use crate::signature::TransactionSignature;
use crate::types::{txid_to_hex, ByteString};
use crate::unspent_output::UnspentOutput;
use log::debug;
use secp256k1::SecretKey;
use std::collections::BTreeSet;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
}

impl Default for Transaction {
    fn default() -> Self {
        Transaction::new()
    }
}

impl Transaction {
    pub fn new() -> Self {
        Transaction { version: DEFAULT_TX_VERSION, inputs: Vec::new(), outputs: Vec::new(), lock_time: 0 }
    }

    /// Parse a transaction, with or without the segwit marker and witness
    /// stacks. Trailing bytes are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BufferReader::new(bytes);
        let version = reader.read_i32_le()?;

        let mut count = reader.read_varint()?;
        let mut has_witness = false;
        if count == SEGWIT_MARKER as u64 && reader.peek_u8() == Some(SEGWIT_FLAG) {
            reader.read_u8()?;
            has_witness = true;
            count = reader.read_varint()?;
        }

        let mut inputs = Vec::new();
        for _ in 0..count {
            inputs.push(TxInput::from_reader(&mut reader)?);
        }

        let output_count = reader.read_varint()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(Output::from_reader(&mut reader)?);
        }

        if has_witness {
            for input in inputs.iter_mut() {
                let items = reader.read_varint()?;
                let mut stack = Vec::new();
                for _ in 0..items {
                    stack.push(reader.read_var_bytes()?.to_vec());
                }
                input.witnesses = stack;
            }
        }

        let lock_time = reader.read_u32_le()?;
        if !reader.is_finished() {
            return Err(AuthError::Serialization(format!(
                "{} trailing bytes after transaction",
                reader.remaining()
            )));
        }

        Ok(Transaction {
            version,
            inputs: inputs.into_iter().map(Input::Raw).collect(),
            outputs,
            lock_time,
        })
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| AuthError::Serialization(format!("invalid hex: {}", e)))?;
        Transaction::from_bytes(&bytes)
    }

    pub fn has_witnesses(&self) -> bool {
        self.inputs.iter().any(|input| input.base().has_witnesses())
    }

    /// Serialization without witness data, as hashed for the txid
    pub(crate) fn write_legacy(&self, writer: &mut BufferWriter) {
        writer.write_i32_le(self.version);
        writer.write_varint(self.inputs.len() as u64);
        for input in &self.inputs {
            input.to_writer(writer);
        }
        writer.write_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.to_writer(writer);
        }
        writer.write_u32_le(self.lock_time);
    }

    pub fn to_legacy_bytes(&self) -> ByteString {
        let mut writer = BufferWriter::new();
        self.write_legacy(&mut writer);
        writer.into_bytes()
    }

    /// Full serialization; uses the witness layout when any input carries
    /// witness data
    pub fn to_bytes(&self) -> ByteString {
        if !self.has_witnesses() {
            return self.to_legacy_bytes();
        }
        let mut writer = BufferWriter::new();
        writer.write_i32_le(self.version).write_u8(SEGWIT_MARKER).write_u8(SEGWIT_FLAG);
        writer.write_varint(self.inputs.len() as u64);
        for input in &self.inputs {
            input.to_writer(&mut writer);
        }
        writer.write_varint(self.outputs.len() as u64);
        for output in &self.outputs {
            output.to_writer(&mut writer);
        }
        for input in &self.inputs {
            let witnesses = &input.base().witnesses;
            writer.write_varint(witnesses.len() as u64);
            for item in witnesses {
                writer.write_var_bytes(item);
            }
        }
        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Transaction id in display order
    pub fn txid(&self) -> String {
        txid_to_hex(&sha256sha256(&self.to_legacy_bytes()))
    }

    pub fn add_input(&mut self, input: Input) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn add_output(&mut self, output: Output) -> &mut Self {
        self.outputs.push(output);
        self
    }

    /// Spend an unspent output; P2PKH outputs become signable inputs
    pub fn from_unspent(&mut self, utxo: &UnspentOutput) -> Result<&mut Self> {
        let base = TxInput::from_unspent(utxo);
        let input = if utxo.script().is_public_key_hash_out() {
            Input::from(PublicKeyHashInput::new(base)?)
        } else {
            debug!("spending {} as a raw input", utxo);
            Input::Raw(base)
        };
        Ok(self.add_input(input))
    }

    /// Spend a P2SH (or P2SH-P2WSH when `nested_witness`) multisig output
    pub fn from_multisig_unspent(
        &mut self,
        utxo: &UnspentOutput,
        public_keys: Vec<PublicKey>,
        threshold: usize,
        nested_witness: bool,
    ) -> Result<&mut Self> {
        let base = TxInput::from_unspent(utxo);
        let input = MultiSigScriptHashInput::new(base, public_keys, threshold, None, nested_witness)?;
        Ok(self.add_input(input.into()))
    }

    /// Signatures `secret_key` can produce for every signable input
    pub fn get_signatures(&self, secret_key: &SecretKey, hash_type: u32) -> Result<Vec<TransactionSignature>> {
        let mut results = Vec::new();
        for (index, input) in self.inputs.iter().enumerate() {
            if let Input::Raw(_) = input {
                continue;
            }
            results.extend(input.get_signatures(self, secret_key, index, hash_type)?);
        }
        Ok(results)
    }

    pub fn apply_signature(&mut self, signature: TransactionSignature) -> Result<&mut Self> {
        let index = signature.input_index;
        if index >= self.inputs.len() {
            return Err(AuthError::InputIndexOutOfRange { index, count: self.inputs.len() });
        }
        let snapshot = self.clone();
        self.inputs[index].add_signature(&snapshot, signature)?;
        Ok(self)
    }

    /// Sign every input `secret_key` can sign
    pub fn sign(&mut self, secret_key: &SecretKey, hash_type: u32) -> Result<&mut Self> {
        for signature in self.get_signatures(secret_key, hash_type)? {
            self.apply_signature(signature)?;
        }
        Ok(self)
    }

    pub fn is_fully_signed(&self) -> Result<bool> {
        for input in &self.inputs {
            if !input.is_fully_signed()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Context-free sanity checks; returns the first problem found
    pub fn check(&self) -> Option<String> {
        if self.inputs.is_empty() {
            return Some("transaction txins empty".to_string());
        }
        if self.outputs.is_empty() {
            return Some("transaction txouts empty".to_string());
        }
        for (i, output) in self.outputs.iter().enumerate() {
            if let Some(problem) = output.invalid_litoshis() {
                return Some(format!("{} at index {}", problem, i));
            }
        }
        let mut seen = BTreeSet::new();
        for (i, input) in self.inputs.iter().enumerate() {
            if !seen.insert(input.base().prevout) {
                return Some(format!("transaction input {} duplicate input", i));
            }
        }
        None
    }
}
