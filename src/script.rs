//! Script values: chunk parsing, standard templates and recognizers
//!
//! A script is an immutable byte buffer. Chunks are parsed on demand and
//! builders always emit canonical (minimal push) encodings. There is no
//! interpreter here; only construction and pattern recognition.

use crate::constants::*;
use crate::error::{AuthError, Result};
use crate::hash::{hash160, sha256};
use crate::key::PublicKey;
use crate::network::{AddressPayload, Network};
use crate::types::ByteString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single parsed element of a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Non-push opcode (OP_0 included)
    Op(u8),
    /// Data push; `opcode` records the exact push form used
    Push { opcode: u8, data: ByteString },
}

impl Chunk {
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Chunk::Push { data, .. } => Some(data.as_slice()),
            Chunk::Op(OP_0) => Some(&[][..]),
            Chunk::Op(_) => None,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Chunk::Op(op) => out.push(*op),
            Chunk::Push { opcode, data } => {
                out.push(*opcode);
                match *opcode {
                    OP_PUSHDATA1 => out.push(data.len() as u8),
                    OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                    OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                    _ => {}
                }
                out.extend_from_slice(data);
            }
        }
    }
}

/// Script: ordered opcode/data chunks backed by their serialized bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(ByteString);

impl Script {
    pub fn new() -> Self {
        Script(Vec::new())
    }

    pub fn from_bytes(bytes: impl Into<ByteString>) -> Self {
        Script(bytes.into())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s)
            .map(Script)
            .map_err(|e| AuthError::InvalidScriptBuffer(format!("invalid hex: {}", e)))
    }

    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        let mut out = Vec::new();
        for chunk in chunks {
            chunk.write_to(&mut out);
        }
        Script(out)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> ByteString {
        self.0.clone()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse the buffer into chunks
    pub fn chunks(&self) -> Result<Vec<Chunk>> {
        let buf = &self.0;
        let mut chunks = Vec::new();
        let mut i = 0;
        while i < buf.len() {
            let opcode = buf[i];
            i += 1;
            let len = match opcode {
                0x01..=0x4b => opcode as usize,
                OP_PUSHDATA1 => {
                    let n = read_len(buf, i, 1)?;
                    i += 1;
                    n
                }
                OP_PUSHDATA2 => {
                    let n = read_len(buf, i, 2)?;
                    i += 2;
                    n
                }
                OP_PUSHDATA4 => {
                    let n = read_len(buf, i, 4)?;
                    i += 4;
                    n
                }
                _ => {
                    chunks.push(Chunk::Op(opcode));
                    continue;
                }
            };
            if buf.len() - i < len {
                return Err(AuthError::InvalidScriptBuffer(format!(
                    "push of {} bytes at offset {} runs past end of script",
                    len, i
                )));
            }
            chunks.push(Chunk::Push { opcode, data: buf[i..i + len].to_vec() });
            i += len;
        }
        Ok(chunks)
    }

    pub fn has_code_separators(&self) -> Result<bool> {
        Ok(self.chunks()?.iter().any(|c| *c == Chunk::Op(OP_CODESEPARATOR)))
    }

    /// Copy of the script with every OP_CODESEPARATOR dropped
    pub fn remove_code_separators(&self) -> Result<Script> {
        let chunks: Vec<Chunk> = self
            .chunks()?
            .into_iter()
            .filter(|c| *c != Chunk::Op(OP_CODESEPARATOR))
            .collect();
        Ok(Script::from_chunks(&chunks))
    }

    /// OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
    pub fn is_public_key_hash_out(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == 20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// OP_HASH160 <20> OP_EQUAL
    pub fn is_script_hash_out(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == 20 && b[22] == OP_EQUAL
    }

    /// OP_0 <32>
    pub fn is_witness_script_hash_out(&self) -> bool {
        let b = &self.0;
        b.len() == 34 && b[0] == OP_0 && b[1] == 32
    }

    /// OP_m <pubkey>... OP_n OP_CHECKMULTISIG
    pub fn is_multisig_out(&self) -> bool {
        let chunks = match self.chunks() {
            Ok(c) => c,
            Err(_) => return false,
        };
        if chunks.len() < 4 || chunks[chunks.len() - 1] != Chunk::Op(OP_CHECKMULTISIG) {
            return false;
        }
        let m = small_int(&chunks[0]);
        let n = small_int(&chunks[chunks.len() - 2]);
        let keys = &chunks[1..chunks.len() - 2];
        match (m, n) {
            (Some(m), Some(n)) => {
                m >= 1
                    && m <= n
                    && n == keys.len()
                    && keys.iter().all(|k| matches!(k, Chunk::Push { .. }))
            }
            _ => false,
        }
    }

    /// <signature> <pubkey>
    pub fn is_public_key_hash_in(&self) -> bool {
        let chunks = match self.chunks() {
            Ok(c) => c,
            Err(_) => return false,
        };
        if chunks.len() != 2 {
            return false;
        }
        let sig_ok = chunks[0].data().map_or(false, |d| d.len() >= 9 && d.len() <= 73);
        let key_ok = chunks[1].data().map_or(false, |d| match d.len() {
            33 => d[0] == 0x02 || d[0] == 0x03,
            65 => d[0] == 0x04,
            _ => false,
        });
        sig_ok && key_ok
    }

    /// Key hash committed to by a P2PKH output
    pub fn public_key_hash(&self) -> Option<[u8; 20]> {
        if !self.is_public_key_hash_out() {
            return None;
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[3..23]);
        Some(out)
    }

    /// Script hash committed to by a P2SH output
    pub fn script_hash(&self) -> Option<[u8; 20]> {
        if !self.is_script_hash_out() {
            return None;
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[2..22]);
        Some(out)
    }

    /// Prefix byte and hash for encoding this output's address on `network`
    pub fn address_payload(&self, network: &Network) -> Option<AddressPayload> {
        if let Some(hash) = self.public_key_hash() {
            return Some(AddressPayload { version: network.pubkeyhash, hash });
        }
        self.script_hash()
            .map(|hash| AddressPayload { version: network.scripthash, hash })
    }
}

fn read_len(buf: &[u8], at: usize, width: usize) -> Result<usize> {
    if buf.len() < at + width {
        return Err(AuthError::InvalidScriptBuffer(format!(
            "truncated push length at offset {}",
            at
        )));
    }
    let mut le = [0u8; 4];
    le[..width].copy_from_slice(&buf[at..at + width]);
    Ok(u32::from_le_bytes(le) as usize)
}

fn small_int(chunk: &Chunk) -> Option<usize> {
    match chunk {
        Chunk::Op(op) if (OP_1..=OP_16).contains(op) => Some((op - OP_1 + 1) as usize),
        _ => None,
    }
}

fn small_int_opcode(n: usize) -> u8 {
    OP_1 + (n as u8) - 1
}

/// Append a minimal push of `data`
fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len < OP_PUSHDATA1 as usize {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(OP_PUSHDATA1);
        out.push(len as u8);
    } else if len <= 0xffff {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
}

/// Script consisting of a single data push
pub fn build_data_push(data: &[u8]) -> Script {
    let mut out = Vec::with_capacity(data.len() + 5);
    push_data(&mut out, data);
    Script(out)
}

/// P2PKH output: OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG
pub fn build_public_key_hash_out(pubkey_hash: &[u8; 20]) -> Script {
    let mut out = Vec::with_capacity(25);
    out.push(OP_DUP);
    out.push(OP_HASH160);
    push_data(&mut out, pubkey_hash);
    out.push(OP_EQUALVERIFY);
    out.push(OP_CHECKSIG);
    Script(out)
}

/// P2SH output: OP_HASH160 <hash160(script)> OP_EQUAL
pub fn build_script_hash_out(script: &Script) -> Script {
    let mut out = Vec::with_capacity(23);
    out.push(OP_HASH160);
    push_data(&mut out, &hash160(script.as_bytes()));
    out.push(OP_EQUAL);
    Script(out)
}

/// Bare multisig: OP_threshold <pubkey>... OP_n OP_CHECKMULTISIG
///
/// Keys are emitted in the order given, each in its own encoding.
pub fn build_multisig_out(public_keys: &[PublicKey], threshold: usize) -> Result<Script> {
    check_threshold(public_keys.len(), threshold)?;
    let mut out = Vec::with_capacity(3 + public_keys.len() * 34);
    out.push(small_int_opcode(threshold));
    for key in public_keys {
        push_data(&mut out, &key.to_bytes());
    }
    out.push(small_int_opcode(public_keys.len()));
    out.push(OP_CHECKMULTISIG);
    Ok(Script(out))
}

/// Witness program for a script: OP_0 <sha256(script)>
pub fn build_witness_multisig_out_from_script(script: &Script) -> Script {
    let mut out = Vec::with_capacity(34);
    out.push(OP_0);
    push_data(&mut out, &sha256(script.as_bytes()));
    Script(out)
}

/// P2SH multisig scriptSig: OP_0 <sig>... <redeem script>
///
/// `signatures` are DER signatures with the sighash byte appended, already
/// in public key order. `cached_multisig` skips rebuilding the redeem script.
pub fn build_p2sh_multisig_in(
    public_keys: &[PublicKey],
    threshold: usize,
    signatures: &[ByteString],
    cached_multisig: Option<&Script>,
) -> Result<Script> {
    let redeem = match cached_multisig {
        Some(script) => script.clone(),
        None => build_multisig_out(public_keys, threshold)?,
    };
    let mut out = vec![OP_0];
    for signature in signatures {
        push_data(&mut out, signature);
    }
    push_data(&mut out, redeem.as_bytes());
    Ok(Script(out))
}

pub(crate) fn check_threshold(key_count: usize, threshold: usize) -> Result<()> {
    if key_count == 0 || key_count > MAX_MULTISIG_KEYS {
        return Err(AuthError::InvalidThreshold(format!(
            "multisig needs between 1 and {} public keys, got {}",
            MAX_MULTISIG_KEYS, key_count
        )));
    }
    if threshold == 0 || threshold > key_count {
        return Err(AuthError::InvalidThreshold(format!(
            "threshold {} not in 1..={}",
            threshold, key_count
        )));
    }
    Ok(())
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<ByteString> for Script {
    fn from(bytes: ByteString) -> Self {
        Script(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{LIVENET, TESTNET};

    fn keys() -> Vec<PublicKey> {
        [
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
            "02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
        ]
        .iter()
        .map(|h| PublicKey::from_hex(h).unwrap())
        .collect()
    }

    const REDEEM_2_OF_3: &str = "52210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f817982102c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee52102f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f953ae";

    #[test]
    fn test_build_multisig_out() {
        let script = build_multisig_out(&keys(), 2).unwrap();
        assert_eq!(script.to_hex(), REDEEM_2_OF_3);
        assert!(script.is_multisig_out());
    }

    #[test]
    fn test_build_multisig_out_keeps_key_encoding() {
        let uncompressed: Vec<PublicKey> = keys().iter().map(|k| PublicKey::new_uncompressed(k.inner)).collect();
        let script = build_multisig_out(&uncompressed, 2).unwrap();
        assert_eq!(script.len(), 3 + 3 * 66);
        assert_eq!(
            build_script_hash_out(&script).to_hex(),
            "a91423b3afe30030b189aff1bf3705b9551dc357cde687"
        );
        assert!(script.is_multisig_out());
    }

    #[test]
    fn test_build_multisig_out_bad_threshold() {
        assert!(matches!(build_multisig_out(&keys(), 0), Err(AuthError::InvalidThreshold(_))));
        assert!(matches!(build_multisig_out(&keys(), 4), Err(AuthError::InvalidThreshold(_))));
        assert!(matches!(build_multisig_out(&[], 1), Err(AuthError::InvalidThreshold(_))));
    }

    #[test]
    fn test_build_script_hash_out() {
        let redeem = build_multisig_out(&keys(), 2).unwrap();
        let p2sh = build_script_hash_out(&redeem);
        assert_eq!(p2sh.to_hex(), "a91415fc0754e73eb85d1cbce08786fadb7320ecb8dc87");
        assert!(p2sh.is_script_hash_out());
        assert!(!p2sh.is_public_key_hash_out());
    }

    #[test]
    fn test_build_witness_out_nested_in_p2sh() {
        let redeem = build_multisig_out(&keys(), 2).unwrap();
        let witness = build_witness_multisig_out_from_script(&redeem);
        assert_eq!(
            witness.to_hex(),
            "002012c2ffbc6ec1cf5d746dfbd49b1063356212ea55f43023ffc0145934af20c572"
        );
        assert!(witness.is_witness_script_hash_out());
        assert_eq!(
            build_script_hash_out(&witness).to_hex(),
            "a914c95ef7c9117a56571c2ddc44e5fd8ba29d45989387"
        );
    }

    #[test]
    fn test_build_public_key_hash_out() {
        let hash = hash160(&keys()[0].to_bytes());
        let script = build_public_key_hash_out(&hash);
        assert_eq!(script.to_hex(), "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac");
        assert_eq!(script.public_key_hash(), Some(hash));
        assert_eq!(script.script_hash(), None);
    }

    #[test]
    fn test_build_p2sh_multisig_in() {
        let redeem = build_multisig_out(&keys(), 2).unwrap();
        let sig = vec![0x30; 71];
        let script = build_p2sh_multisig_in(&keys(), 2, &[sig.clone()], Some(&redeem)).unwrap();
        let chunks = script.chunks().unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], Chunk::Op(OP_0));
        assert_eq!(chunks[1].data(), Some(&sig[..]));
        // 105-byte redeem script needs OP_PUSHDATA1
        assert_eq!(chunks[2], Chunk::Push { opcode: OP_PUSHDATA1, data: redeem.to_bytes() });

        let uncached = build_p2sh_multisig_in(&keys(), 2, &[sig], None).unwrap();
        assert_eq!(uncached, script);
    }

    #[test]
    fn test_chunks_roundtrip_non_minimal_push() {
        // PUSHDATA1 of 2 bytes is non-minimal but must survive a round trip
        let script = Script::from_hex("4c02abcd51").unwrap();
        let chunks = script.chunks().unwrap();
        assert_eq!(chunks[0], Chunk::Push { opcode: OP_PUSHDATA1, data: vec![0xab, 0xcd] });
        assert_eq!(chunks[1], Chunk::Op(OP_1));
        assert_eq!(Script::from_chunks(&chunks), script);
    }

    #[test]
    fn test_chunks_truncated_push() {
        let script = Script::from_hex("05abcd").unwrap();
        assert!(matches!(script.chunks(), Err(AuthError::InvalidScriptBuffer(_))));
        let script = Script::from_hex("4d01").unwrap();
        assert!(matches!(script.chunks(), Err(AuthError::InvalidScriptBuffer(_))));
        assert!(!script.is_multisig_out());
    }

    #[test]
    fn test_has_code_separators() {
        assert!(Script::from_hex("51ab51").unwrap().has_code_separators().unwrap());
        // 0xab inside push data is not an opcode
        assert!(!Script::from_hex("01ab51").unwrap().has_code_separators().unwrap());
    }

    #[test]
    fn test_remove_code_separators() {
        let script = Script::from_hex("ab51ab01ab").unwrap();
        assert_eq!(script.remove_code_separators().unwrap().to_hex(), "5101ab");
    }

    #[test]
    fn test_is_public_key_hash_in() {
        let mut bytes = vec![71u8];
        bytes.extend(vec![0x30; 71]);
        bytes.push(33);
        bytes.extend(keys()[0].to_bytes());
        assert!(Script::from_bytes(bytes).is_public_key_hash_in());
        assert!(!Script::new().is_public_key_hash_in());
    }

    #[test]
    fn test_address_payload() {
        let hash = hash160(&keys()[0].to_bytes());
        let pkh = build_public_key_hash_out(&hash);
        assert_eq!(pkh.address_payload(&LIVENET), Some(AddressPayload { version: 0x30, hash }));
        assert_eq!(pkh.address_payload(&TESTNET).unwrap().version, 0x6f);

        let p2sh = build_script_hash_out(&build_multisig_out(&keys(), 2).unwrap());
        assert_eq!(p2sh.address_payload(&LIVENET).unwrap().version, 0x32);
        assert_eq!(Script::from_hex("6a").unwrap().address_payload(&LIVENET), None);
    }

    #[test]
    fn test_large_push_uses_pushdata2() {
        let data = vec![0u8; 300];
        let script = build_data_push(&data);
        assert_eq!(script.as_bytes()[0], OP_PUSHDATA2);
        assert_eq!(script.chunks().unwrap()[0].data().unwrap().len(), 300);
    }

    #[test]
    fn test_serde_hex() {
        let script = Script::from_hex("76a914").unwrap();
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, "\"76a914\"");
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
