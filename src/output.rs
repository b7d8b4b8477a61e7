//! Transaction outputs: an amount in litoshis locked by a script

use crate::constants::MAX_SAFE_INTEGER;
use crate::encode::{BufferReader, BufferWriter};
use crate::error::{AuthError, Result};
use crate::script::{Chunk, Script};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output: (litoshis, script)
///
/// Wire form: `u64 LE amount || varint(len) || script`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OutputObject", into = "OutputObject")]
pub struct Output {
    litoshis: u64,
    script: Script,
}

/// Plain object form of an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputObject {
    pub litoshis: u64,
    pub script: Script,
}

impl Output {
    /// Create an output, rejecting amounts that are not safe integers
    pub fn new(litoshis: u64, script: Script) -> Result<Self> {
        if litoshis > MAX_SAFE_INTEGER {
            return Err(AuthError::InvalidAmount(format!(
                "Output litoshis {} is not a natural number below 2^53",
                litoshis
            )));
        }
        Ok(Output { litoshis, script })
    }

    /// Create an output without the amount check, as read off the wire
    pub(crate) fn from_wire(litoshis: u64, script: Script) -> Self {
        Output { litoshis, script }
    }

    pub fn litoshis(&self) -> u64 {
        self.litoshis
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Parsed chunks of the locking script, or `None` if it does not parse.
    ///
    /// An unparsable script is still carried and re-serialized as is.
    pub fn script_chunks(&self) -> Option<Vec<Chunk>> {
        match self.script.chunks() {
            Ok(chunks) => Some(chunks),
            Err(e) => {
                debug!("output script {} is opaque: {}", self.script, e);
                None
            }
        }
    }

    /// Problem with the amount, if any; `None` when it is valid.
    ///
    /// Validation passes use this to collect every issue instead of
    /// stopping at the first one.
    pub fn invalid_litoshis(&self) -> Option<&'static str> {
        if (self.litoshis as i64) < 0 {
            return Some("transaction txout negative");
        }
        if self.litoshis > MAX_SAFE_INTEGER {
            return Some("transaction txout litoshis greater than max safe integer");
        }
        None
    }

    pub fn from_reader(reader: &mut BufferReader<'_>) -> Result<Self> {
        let litoshis = reader
            .read_u64_le()
            .map_err(|e| AuthError::MalformedOutput(e.to_string()))?;
        let script = reader
            .read_var_bytes()
            .map_err(|e| AuthError::MalformedOutput(e.to_string()))?;
        Ok(Output::from_wire(litoshis, Script::from_bytes(script)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Output::from_reader(&mut BufferReader::new(bytes))
    }

    pub fn to_writer(&self, writer: &mut BufferWriter) {
        writer.write_u64_le(self.litoshis);
        writer.write_var_bytes(self.script.as_bytes());
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BufferWriter::new();
        self.to_writer(&mut writer);
        writer.into_bytes()
    }

    pub fn to_object(&self) -> OutputObject {
        OutputObject { litoshis: self.litoshis, script: self.script.clone() }
    }
}

impl TryFrom<OutputObject> for Output {
    type Error = AuthError;

    fn try_from(obj: OutputObject) -> Result<Self> {
        Output::new(obj.litoshis, obj.script)
    }
}

impl From<Output> for OutputObject {
    fn from(output: Output) -> Self {
        OutputObject { litoshis: output.litoshis, script: output.script }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Output ({} sats) {}>", self.litoshis, self.script)
    }
}
