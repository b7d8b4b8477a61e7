//! Unspent output references used to seed transaction inputs

use crate::constants::{LITOSHIS_PER_LTC, MAX_SAFE_INTEGER};
use crate::error::{AuthError, Result};
use crate::output::Output;
use crate::script::Script;
use crate::types::{txid_from_hex, OutPoint};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Loosely typed description of an unspent output, as received from wallets
/// and block explorers. Every field is optional here so that missing data can
/// be reported with a precise message by [`UnspentOutput::from_data`].
///
/// `txId`, `outputIndex` and `script` are accepted as alternative spellings.
/// When a payload carries both, `txid`, `vout` and `scriptPubKey` win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnspentOutputData {
    pub txid: Option<String>,
    pub vout: Option<i64>,
    pub script_pub_key: Option<String>,
    /// Amount in LTC
    pub amount: Option<f64>,
    pub litoshis: Option<u64>,
    pub address: Option<String>,
}

/// Every accepted key, before the alternative spellings are merged
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnspentOutputFields {
    txid: Option<String>,
    tx_id: Option<String>,
    vout: Option<i64>,
    output_index: Option<i64>,
    script_pub_key: Option<String>,
    script: Option<String>,
    amount: Option<f64>,
    litoshis: Option<u64>,
    address: Option<String>,
}

impl<'de> Deserialize<'de> for UnspentOutputData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = UnspentOutputFields::deserialize(deserializer)?;
        Ok(UnspentOutputData {
            txid: fields.txid.or(fields.tx_id),
            vout: fields.vout.or(fields.output_index),
            script_pub_key: fields.script_pub_key.or(fields.script),
            amount: fields.amount,
            litoshis: fields.litoshis,
            address: fields.address,
        })
    }
}

/// Plain object form emitted by [`UnspentOutput::to_object`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnspentOutputObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: String,
    pub amount: f64,
}

/// UnspentOutput: a previous output together with the data needed to spend it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentOutput {
    tx_id: String,
    outpoint: OutPoint,
    script: Script,
    litoshis: u64,
    address: Option<String>,
}

impl UnspentOutput {
    pub fn new(
        tx_id: &str,
        output_index: u32,
        script: Script,
        litoshis: u64,
        address: Option<String>,
    ) -> Result<Self> {
        let txid = txid_from_hex(tx_id)?;
        if litoshis > MAX_SAFE_INTEGER {
            return Err(AuthError::InvalidUnspentOutput(format!(
                "Amount {} litoshis exceeds the safe integer range",
                litoshis
            )));
        }
        Ok(UnspentOutput {
            tx_id: tx_id.to_string(),
            outpoint: OutPoint::new(txid, output_index),
            script,
            litoshis,
            address,
        })
    }

    /// Validate loosely typed data; `amount` (LTC) wins over `litoshis`
    pub fn from_data(data: UnspentOutputData) -> Result<Self> {
        let tx_id = data
            .txid
            .ok_or_else(|| AuthError::InvalidUnspentOutput("Invalid TXID in object: missing".to_string()))?;
        let output_index = match data.vout {
            Some(v) => u32::try_from(v).map_err(|_| {
                AuthError::InvalidUnspentOutput(format!("Invalid outputIndex, received {}", v))
            })?,
            None => {
                return Err(AuthError::InvalidUnspentOutput(
                    "Invalid outputIndex, received nothing".to_string(),
                ))
            }
        };
        let script = match data.script_pub_key {
            Some(hex) => Script::from_hex(&hex)
                .map_err(|e| AuthError::InvalidUnspentOutput(format!("Invalid scriptPubKey: {}", e)))?,
            None => {
                return Err(AuthError::InvalidUnspentOutput(
                    "Must provide the scriptPubKey for that output!".to_string(),
                ))
            }
        };
        let litoshis = match (data.amount, data.litoshis) {
            (Some(amount), _) => ltc_to_litoshis(amount)?,
            (None, Some(litoshis)) => litoshis,
            (None, None) => {
                return Err(AuthError::InvalidUnspentOutput(
                    "Must provide an amount for the output".to_string(),
                ))
            }
        };
        UnspentOutput::new(&tx_id, output_index, script, litoshis, data.address)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let data: UnspentOutputData = serde_json::from_value(value)
            .map_err(|e| AuthError::InvalidUnspentOutput(e.to_string()))?;
        UnspentOutput::from_data(data)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let data: UnspentOutputData = serde_json::from_str(json)
            .map_err(|e| AuthError::InvalidUnspentOutput(e.to_string()))?;
        UnspentOutput::from_data(data)
    }

    /// Transaction id in display order, as supplied
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn output_index(&self) -> u32 {
        self.outpoint.index
    }

    pub fn outpoint(&self) -> OutPoint {
        self.outpoint
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn litoshis(&self) -> u64 {
        self.litoshis
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// The output this reference claims to spend
    pub fn to_output(&self) -> Output {
        Output::from_wire(self.litoshis, self.script.clone())
    }

    pub fn to_object(&self) -> UnspentOutputObject {
        UnspentOutputObject {
            address: self.address.clone(),
            txid: self.tx_id.clone(),
            vout: self.outpoint.index,
            script_pub_key: self.script.to_hex(),
            amount: litoshis_to_ltc(self.litoshis),
        }
    }
}

impl fmt::Display for UnspentOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.outpoint.index)
    }
}

/// Convert an LTC amount to litoshis, rounding to the nearest unit
pub fn ltc_to_litoshis(amount: f64) -> Result<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AuthError::InvalidAmount(format!("Amount must be a non-negative number, got {}", amount)));
    }
    let litoshis = (amount * LITOSHIS_PER_LTC as f64).round();
    if litoshis > MAX_SAFE_INTEGER as f64 {
        return Err(AuthError::InvalidAmount(format!("Amount {} LTC exceeds the safe integer range", amount)));
    }
    Ok(litoshis as u64)
}

pub fn litoshis_to_ltc(litoshis: u64) -> f64 {
    litoshis as f64 / LITOSHIS_PER_LTC as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TXID: &str = "a477af6b2667c29670467e4e0728b685ee07b240235771862318e29ddbe58458";
    const SCRIPT: &str = "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac";

    #[test]
    fn test_from_value_with_aliases() {
        let utxo = UnspentOutput::from_value(json!({
            "txId": TXID,
            "outputIndex": 2,
            "script": SCRIPT,
            "litoshis": 1_000_000u64,
        }))
        .unwrap();
        assert_eq!(utxo.tx_id(), TXID);
        assert_eq!(utxo.output_index(), 2);
        assert_eq!(utxo.script().to_hex(), SCRIPT);
        assert_eq!(utxo.litoshis(), 1_000_000);
        assert_eq!(utxo.address(), None);
    }

    #[test]
    fn test_both_spellings_prefer_primary_keys() {
        let other = "00".repeat(32);
        let utxo = UnspentOutput::from_value(json!({
            "txid": TXID,
            "txId": other,
            "vout": 1,
            "outputIndex": 7,
            "scriptPubKey": SCRIPT,
            "script": "51",
            "litoshis": 5u64,
        }))
        .unwrap();
        assert_eq!(utxo.tx_id(), TXID);
        assert_eq!(utxo.output_index(), 1);
        assert_eq!(utxo.script().to_hex(), SCRIPT);
    }

    #[test]
    fn test_amount_in_ltc() {
        let utxo = UnspentOutput::from_value(json!({
            "txid": TXID,
            "vout": 0,
            "scriptPubKey": SCRIPT,
            "amount": 0.01,
        }))
        .unwrap();
        assert_eq!(utxo.litoshis(), 1_000_000);
    }

    #[test]
    fn test_amount_rounding() {
        assert_eq!(ltc_to_litoshis(0.00000003).unwrap(), 3);
        assert_eq!(ltc_to_litoshis(1.1).unwrap(), 110_000_000);
        assert!(ltc_to_litoshis(-1.0).is_err());
        assert!(ltc_to_litoshis(f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_bad_txid() {
        let err = UnspentOutput::from_value(json!({
            "txid": "abcd",
            "vout": 0,
            "scriptPubKey": SCRIPT,
            "litoshis": 1,
        }));
        assert!(matches!(err, Err(AuthError::InvalidUnspentOutput(_))));

        let err = UnspentOutput::from_value(json!({
            "vout": 0,
            "scriptPubKey": SCRIPT,
            "litoshis": 1,
        }));
        assert!(matches!(err, Err(AuthError::InvalidUnspentOutput(_))));
    }

    #[test]
    fn test_rejects_bad_output_index() {
        let negative = UnspentOutput::from_value(json!({
            "txid": TXID, "vout": -1, "scriptPubKey": SCRIPT, "litoshis": 1,
        }));
        assert!(matches!(negative, Err(AuthError::InvalidUnspentOutput(_))));

        let not_a_number = UnspentOutput::from_value(json!({
            "txid": TXID, "vout": "0", "scriptPubKey": SCRIPT, "litoshis": 1,
        }));
        assert!(not_a_number.is_err());

        let missing = UnspentOutput::from_value(json!({
            "txid": TXID, "scriptPubKey": SCRIPT, "litoshis": 1,
        }));
        assert!(missing.is_err());
    }

    #[test]
    fn test_requires_script_and_amount() {
        let no_script = UnspentOutput::from_value(json!({ "txid": TXID, "vout": 0, "litoshis": 1 }));
        assert!(matches!(no_script, Err(AuthError::InvalidUnspentOutput(_))));

        let no_amount = UnspentOutput::from_value(json!({ "txid": TXID, "vout": 0, "scriptPubKey": SCRIPT }));
        assert!(matches!(no_amount, Err(AuthError::InvalidUnspentOutput(_))));
    }

    #[test]
    fn test_to_object_and_display() {
        let utxo = UnspentOutput::new(
            TXID,
            1,
            Script::from_hex(SCRIPT).unwrap(),
            150_000_000,
            Some("LdUm3ZLKbdNbhGu1sa3d4EGwVxmYHbYVMd".to_string()),
        )
        .unwrap();
        assert_eq!(utxo.to_string(), format!("{}:1", TXID));
        let obj = serde_json::to_value(utxo.to_object()).unwrap();
        assert_eq!(
            obj,
            json!({
                "address": "LdUm3ZLKbdNbhGu1sa3d4EGwVxmYHbYVMd",
                "txid": TXID,
                "vout": 1,
                "scriptPubKey": SCRIPT,
                "amount": 1.5,
            })
        );
    }

    #[test]
    fn test_to_output_and_outpoint() {
        let utxo = UnspentOutput::new(TXID, 4, Script::from_hex(SCRIPT).unwrap(), 42, None).unwrap();
        assert_eq!(utxo.to_output().litoshis(), 42);
        assert_eq!(utxo.outpoint().txid_hex(), TXID);
        assert_eq!(utxo.outpoint().index, 4);
    }
}
