//! Signatures bound to the input and public key they authorize

use crate::error::{AuthError, Result};
use crate::key::PublicKey;
use crate::types::{txid_from_hex, txid_to_hex, ByteString, Hash};
use secp256k1::ecdsa::Signature;
use serde::{Deserialize, Serialize};

/// A signature for one input, tagged with its sighash type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransactionSignatureObject", into = "TransactionSignatureObject")]
pub struct TransactionSignature {
    pub public_key: PublicKey,
    /// Previous transaction id, wire byte order
    pub prev_tx_id: Hash,
    pub output_index: u32,
    pub input_index: usize,
    pub signature: Signature,
    pub sigtype: u32,
}

/// Plain object form of a [`TransactionSignature`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSignatureObject {
    pub public_key: String,
    pub prev_tx_id: String,
    pub output_index: u32,
    pub input_index: usize,
    pub signature: String,
    pub sigtype: u32,
}

impl TransactionSignature {
    /// DER signature followed by the sighash type byte, as pushed in scripts
    pub fn to_script_bytes(&self) -> ByteString {
        let mut out = self.signature.serialize_der().to_vec();
        out.push(self.sigtype as u8);
        out
    }

    pub fn to_object(&self) -> TransactionSignatureObject {
        TransactionSignatureObject {
            public_key: self.public_key.to_hex(),
            prev_tx_id: txid_to_hex(&self.prev_tx_id),
            output_index: self.output_index,
            input_index: self.input_index,
            signature: hex::encode(self.signature.serialize_der().to_vec()),
            sigtype: self.sigtype,
        }
    }

    pub fn from_object(obj: TransactionSignatureObject) -> Result<Self> {
        let der = hex::decode(&obj.signature)
            .map_err(|e| AuthError::Serialization(format!("invalid signature hex: {}", e)))?;
        Ok(TransactionSignature {
            public_key: PublicKey::from_hex(&obj.public_key)?,
            prev_tx_id: txid_from_hex(&obj.prev_tx_id)?,
            output_index: obj.output_index,
            input_index: obj.input_index,
            signature: Signature::from_der(&der)?,
            sigtype: obj.sigtype,
        })
    }
}

impl TryFrom<TransactionSignatureObject> for TransactionSignature {
    type Error = AuthError;

    fn try_from(obj: TransactionSignatureObject) -> Result<Self> {
        TransactionSignature::from_object(obj)
    }
}

impl From<TransactionSignature> for TransactionSignatureObject {
    fn from(sig: TransactionSignature) -> Self {
        sig.to_object()
    }
}
