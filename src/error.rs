//! Error types for transaction authorization

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid script buffer: {0}")]
    InvalidScriptBuffer(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid unspent output: {0}")]
    InvalidUnspentOutput(String),

    #[error("Script hash mismatch: {0}")]
    ScriptHashMismatch(String),

    #[error("OP_CODESEPARATOR is not supported in a script code")]
    CodeSeparatorNotSupported,

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Input has no output to spend")]
    MissingOutput,

    #[error("All needed signatures have already been added")]
    AlreadyComplete,

    #[error("Signature has no matching public key: {0}")]
    UnknownPublicKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Input index {index} out of range ({count} inputs)")]
    InputIndexOutOfRange { index: usize, count: usize },

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] secp256k1::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
