//! Transaction inputs
//!
//! [`TxInput`] is the wire-level input shared by every variant. [`Input`]
//! adds the spending logic for the script templates that can be signed.

pub mod multisig_script_hash;
pub mod public_key_hash;

pub use multisig_script_hash::{MultiSigScriptHashInput, MultiSigScriptHashInputObject};
pub use public_key_hash::PublicKeyHashInput;

use crate::constants::SEQUENCE_FINAL;
use crate::encode::{BufferReader, BufferWriter};
use crate::error::{AuthError, Result};
use crate::output::Output;
use crate::script::Script;
use crate::signature::TransactionSignature;
use crate::transaction::Transaction;
use crate::types::{ByteString, OutPoint};
use crate::unspent_output::UnspentOutput;
use secp256k1::SecretKey;

/// Wire-level input: previous outpoint, unlocking script, sequence and
/// witness stack, plus the spent output when it is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub prevout: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
    pub witnesses: Vec<ByteString>,
    /// Output being spent; never serialized
    pub output: Option<Output>,
}

impl TxInput {
    pub fn new(prevout: OutPoint, output: Option<Output>) -> Self {
        TxInput {
            prevout,
            script_sig: Script::new(),
            sequence: SEQUENCE_FINAL,
            witnesses: Vec::new(),
            output,
        }
    }

    pub fn from_unspent(utxo: &UnspentOutput) -> Self {
        TxInput::new(utxo.outpoint(), Some(utxo.to_output()))
    }

    /// Read the non-witness part of an input
    pub fn from_reader(reader: &mut BufferReader<'_>) -> Result<Self> {
        let prevout = OutPoint::from_reader(reader)?;
        let script_sig = Script::from_bytes(reader.read_var_bytes()?);
        let sequence = reader.read_u32_le()?;
        Ok(TxInput { prevout, script_sig, sequence, witnesses: Vec::new(), output: None })
    }

    pub fn to_writer(&self, writer: &mut BufferWriter) {
        self.prevout.to_writer(writer);
        writer.write_var_bytes(self.script_sig.as_bytes());
        writer.write_u32_le(self.sequence);
    }

    pub fn has_witnesses(&self) -> bool {
        !self.witnesses.is_empty()
    }

    pub fn output(&self) -> Result<&Output> {
        self.output.as_ref().ok_or(AuthError::MissingOutput)
    }

    /// The signature must name the outpoint this input spends
    pub(crate) fn check_outpoint(&self, signature: &TransactionSignature) -> Result<()> {
        let signed = OutPoint::new(signature.prev_tx_id, signature.output_index);
        if signed != self.prevout {
            return Err(AuthError::InvalidSignature(format!(
                "signature is for outpoint {} but the input spends {}",
                signed, self.prevout
            )));
        }
        Ok(())
    }
}

/// A transaction input, tagged by how it can be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Parsed or otherwise opaque input; carried but never signed
    Raw(TxInput),
    PublicKeyHash(PublicKeyHashInput),
    MultiSigScriptHash(MultiSigScriptHashInput),
}

impl Input {
    pub fn base(&self) -> &TxInput {
        match self {
            Input::Raw(base) => base,
            Input::PublicKeyHash(input) => input.base(),
            Input::MultiSigScriptHash(input) => input.base(),
        }
    }

    /// Direct access to the wire fields; the variants rebuild their
    /// scripts only on signature changes.
    pub(crate) fn base_mut(&mut self) -> &mut TxInput {
        match self {
            Input::Raw(base) => base,
            Input::PublicKeyHash(input) => input.base_mut(),
            Input::MultiSigScriptHash(input) => input.base_mut(),
        }
    }

    pub fn get_signatures(
        &self,
        tx: &Transaction,
        secret_key: &SecretKey,
        input_index: usize,
        sigtype: u32,
    ) -> Result<Vec<TransactionSignature>> {
        match self {
            Input::Raw(_) => Err(unsupported(input_index)),
            Input::PublicKeyHash(input) => input.get_signatures(tx, secret_key, input_index, sigtype),
            Input::MultiSigScriptHash(input) => input.get_signatures(tx, secret_key, input_index, sigtype),
        }
    }

    pub fn add_signature(&mut self, tx: &Transaction, signature: TransactionSignature) -> Result<()> {
        match self {
            Input::Raw(_) => Err(unsupported(signature.input_index)),
            Input::PublicKeyHash(input) => input.add_signature(tx, signature),
            Input::MultiSigScriptHash(input) => input.add_signature(tx, signature),
        }
    }

    pub fn clear_signatures(&mut self) -> Result<()> {
        match self {
            Input::Raw(_) => Err(AuthError::UnsupportedInput("cannot clear signatures of a raw input".to_string())),
            Input::PublicKeyHash(input) => {
                input.clear_signatures();
                Ok(())
            }
            Input::MultiSigScriptHash(input) => input.clear_signatures(),
        }
    }

    pub fn is_fully_signed(&self) -> Result<bool> {
        match self {
            Input::Raw(base) => Err(AuthError::UnsupportedInput(format!(
                "unrecognized script kind for input spending {}",
                base.prevout
            ))),
            Input::PublicKeyHash(input) => Ok(input.is_fully_signed()),
            Input::MultiSigScriptHash(input) => Ok(input.is_fully_signed()),
        }
    }

    pub fn is_valid_signature(&self, tx: &Transaction, signature: &TransactionSignature) -> Result<bool> {
        match self {
            Input::Raw(_) => Err(unsupported(signature.input_index)),
            Input::PublicKeyHash(input) => input.is_valid_signature(tx, signature),
            Input::MultiSigScriptHash(input) => input.is_valid_signature(tx, signature),
        }
    }

    /// Upper bound for the unlocking data this input will carry once signed.
    ///
    /// Raw inputs report what they currently carry.
    pub fn estimate_size(&self) -> usize {
        match self {
            Input::Raw(base) => base.script_sig.len(),
            Input::PublicKeyHash(input) => input.estimate_size(),
            Input::MultiSigScriptHash(input) => input.estimate_size(),
        }
    }

    pub fn to_writer(&self, writer: &mut BufferWriter) {
        self.base().to_writer(writer);
    }
}

impl From<TxInput> for Input {
    fn from(base: TxInput) -> Self {
        Input::Raw(base)
    }
}

impl From<PublicKeyHashInput> for Input {
    fn from(input: PublicKeyHashInput) -> Self {
        Input::PublicKeyHash(input)
    }
}

impl From<MultiSigScriptHashInput> for Input {
    fn from(input: MultiSigScriptHashInput) -> Self {
        Input::MultiSigScriptHash(input)
    }
}

fn unsupported(input_index: usize) -> AuthError {
    AuthError::UnsupportedInput(format!("input {} has no signing template", input_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT_HEX: &str = "40c1ae9d6933e4a08594f814ba73a4e94d19c8a83f45784b1684b3a3f84ee666010000000251aefeffffff";

    #[test]
    fn test_txinput_wire_roundtrip() {
        let bytes = hex::decode(INPUT_HEX).unwrap();
        let mut reader = BufferReader::new(&bytes);
        let input = TxInput::from_reader(&mut reader).unwrap();
        assert!(reader.is_finished());
        assert_eq!(
            input.prevout.txid_hex(),
            "66e64ef8a3b384164b78453fa8c8194de9a473ba14f89485a0e433699daec140"
        );
        assert_eq!(input.prevout.index, 1);
        assert_eq!(input.script_sig.to_hex(), "51ae");
        assert_eq!(input.sequence, 0xfffffffe);

        let mut writer = BufferWriter::new();
        input.to_writer(&mut writer);
        assert_eq!(hex::encode(writer.as_bytes()), INPUT_HEX);
    }

    #[test]
    fn test_truncated_input() {
        let bytes = hex::decode(&INPUT_HEX[..70]).unwrap();
        assert!(TxInput::from_reader(&mut BufferReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_raw_input_is_not_signable() {
        let mut input = Input::from(TxInput::new(OutPoint::new([1u8; 32], 0), None));
        let tx = Transaction::new();
        assert!(matches!(input.is_fully_signed(), Err(AuthError::UnsupportedInput(_))));
        assert!(matches!(input.clear_signatures(), Err(AuthError::UnsupportedInput(_))));
        let mut key = [0u8; 32];
        key[31] = 1;
        let secret_key = SecretKey::from_slice(&key).unwrap();
        assert!(matches!(
            input.get_signatures(&tx, &secret_key, 0, 1),
            Err(AuthError::UnsupportedInput(_))
        ));
        assert_eq!(input.estimate_size(), 0);
    }

    #[test]
    fn test_missing_output() {
        let input = TxInput::new(OutPoint::new([1u8; 32], 0), None);
        assert!(matches!(input.output(), Err(AuthError::MissingOutput)));
        assert_eq!(input.sequence, SEQUENCE_FINAL);
        assert!(!input.has_witnesses());
    }
}
