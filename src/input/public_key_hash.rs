//! Spending pay-to-public-key-hash outputs

use crate::constants::PUBLIC_KEY_HASH_SCRIPT_MAX_SIZE;
use crate::error::{AuthError, Result};
use crate::input::TxInput;
use crate::key::PublicKey;
use crate::script::{build_data_push, Script};
use crate::sighash;
use crate::signature::TransactionSignature;
use crate::transaction::Transaction;
use secp256k1::{Secp256k1, SecretKey};

/// Input spending a P2PKH output: `<sig> <pubkey>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyHashInput {
    base: TxInput,
    signature: Option<TransactionSignature>,
}

impl PublicKeyHashInput {
    /// The spent output must be attached and be a P2PKH script
    pub fn new(base: TxInput) -> Result<Self> {
        if !base.output()?.script().is_public_key_hash_out() {
            return Err(AuthError::UnsupportedInput(format!(
                "output spent by {} is not pay-to-public-key-hash",
                base.prevout
            )));
        }
        Ok(PublicKeyHashInput { base, signature: None })
    }

    pub fn base(&self) -> &TxInput {
        &self.base
    }

    pub(crate) fn base_mut(&mut self) -> &mut TxInput {
        &mut self.base
    }

    pub fn signature(&self) -> Option<&TransactionSignature> {
        self.signature.as_ref()
    }

    fn subscript(&self) -> Result<&Script> {
        Ok(self.base.output()?.script())
    }

    fn matches_key(&self, public_key: &PublicKey) -> Result<bool> {
        let expected = self.subscript()?.public_key_hash();
        Ok(expected == Some(public_key.pubkey_hash()))
    }

    /// One signature when either encoding of the key hashes to the output's
    /// key hash, else none
    pub fn get_signatures(
        &self,
        tx: &Transaction,
        secret_key: &SecretKey,
        input_index: usize,
        sigtype: u32,
    ) -> Result<Vec<TransactionSignature>> {
        let secp = Secp256k1::new();
        let inner = secp256k1::PublicKey::from_secret_key(&secp, secret_key);
        let public_key = if self.matches_key(&PublicKey::new(inner))? {
            PublicKey::new(inner)
        } else if self.matches_key(&PublicKey::new_uncompressed(inner))? {
            PublicKey::new_uncompressed(inner)
        } else {
            return Ok(Vec::new());
        };
        let signature = sighash::sign(tx, secret_key, sigtype, input_index, self.subscript()?)?;
        Ok(vec![TransactionSignature {
            public_key,
            prev_tx_id: self.base.prevout.txid,
            output_index: self.base.prevout.index,
            input_index,
            signature,
            sigtype,
        }])
    }

    pub fn add_signature(&mut self, tx: &Transaction, signature: TransactionSignature) -> Result<()> {
        if self.is_fully_signed() {
            return Err(AuthError::AlreadyComplete);
        }
        self.base.check_outpoint(&signature)?;
        if !self.matches_key(&signature.public_key)? {
            return Err(AuthError::UnknownPublicKey(signature.public_key.to_hex()));
        }
        if !self.is_valid_signature(tx, &signature)? {
            return Err(AuthError::InvalidSignature(format!(
                "signature for input {} does not verify",
                signature.input_index
            )));
        }
        let mut script = build_data_push(&signature.to_script_bytes()).to_bytes();
        script.extend_from_slice(build_data_push(&signature.public_key.to_bytes()).as_bytes());
        self.base.script_sig = Script::from_bytes(script);
        self.signature = Some(signature);
        Ok(())
    }

    pub fn clear_signatures(&mut self) {
        self.signature = None;
        self.base.script_sig = Script::new();
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub fn is_valid_signature(&self, tx: &Transaction, signature: &TransactionSignature) -> Result<bool> {
        sighash::verify(
            tx,
            &signature.signature,
            signature.sigtype,
            &signature.public_key,
            signature.input_index,
            self.subscript()?,
        )
    }

    pub fn estimate_size(&self) -> usize {
        PUBLIC_KEY_HASH_SCRIPT_MAX_SIZE
    }
}
