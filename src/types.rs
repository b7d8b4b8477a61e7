//! Core value types shared by scripts, inputs and transactions

use crate::encode::{BufferReader, BufferWriter};
use crate::error::{AuthError, Result};
use std::fmt;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// OutPoint: reference to an output of a previous transaction.
///
/// `txid` is kept in wire (internal) byte order; hex at the API boundary is
/// the byte-reversed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, index: u32) -> Self {
        OutPoint { txid, index }
    }

    /// Build an outpoint from a display-order hex transaction id
    pub fn from_txid_hex(txid: &str, index: u32) -> Result<Self> {
        Ok(OutPoint { txid: txid_from_hex(txid)?, index })
    }

    /// Transaction id in display order
    pub fn txid_hex(&self) -> String {
        txid_to_hex(&self.txid)
    }

    pub fn from_reader(reader: &mut BufferReader<'_>) -> Result<Self> {
        let txid = reader.read_hash()?;
        let index = reader.read_u32_le()?;
        Ok(OutPoint { txid, index })
    }

    /// 32-byte txid followed by the 4-byte LE index
    pub fn to_writer(&self, writer: &mut BufferWriter) {
        writer.write(&self.txid);
        writer.write_u32_le(self.index);
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid_hex(), self.index)
    }
}

/// Parse a 64-character display-order hex id into wire byte order
pub fn txid_from_hex(txid: &str) -> Result<Hash> {
    if txid.len() != 64 {
        return Err(AuthError::InvalidUnspentOutput(format!(
            "Invalid TXID length {}, expected 64 hex characters",
            txid.len()
        )));
    }
    let bytes = hex::decode(txid)
        .map_err(|e| AuthError::InvalidUnspentOutput(format!("Invalid TXID {}: {}", txid, e)))?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    hash.reverse();
    Ok(hash)
}

/// Render a wire-order hash as display-order hex
pub fn txid_to_hex(txid: &Hash) -> String {
    let mut reversed = *txid;
    reversed.reverse();
    hex::encode(reversed)
}
