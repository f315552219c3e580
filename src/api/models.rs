use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque reference to a ciphertext held by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub String);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public fields of one on-chain record, as returned by `getRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "publicValue1")]
    pub public_field1: u32,
    #[serde(default, alias = "publicValue2")]
    pub public_field2: u32,
    #[serde(alias = "timestamp")]
    pub created_at: u64,
    pub creator: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, alias = "decryptedValue")]
    pub verified_value: u64,
}

/// Ciphertext plus the zero-knowledge proof that it is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedInput {
    pub encrypted_data: String,
    pub proof: String,
}

/// Arguments of the `createRecord` write call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordArgs {
    pub id: String,
    pub name: String,
    pub encrypted_payload: String,
    pub proof: String,
    pub priority: u8,
    pub reserved_field: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxHandle {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
}

/// Cleartext values released by a decryption-verification handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionResult {
    pub clear_values: HashMap<Handle, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedDecryption {
    pub decryption_result: DecryptionResult,
}

impl VerifiedDecryption {
    pub fn clear_value(&self, handle: &Handle) -> Option<u64> {
        self.decryption_result.clear_values.get(handle).copied()
    }
}
