//! reqwest adapter for an FHE relayer that encrypts inputs with their proofs
//! and runs public decryption on behalf of the client.

use crate::api::fhe::{FheClient, FheResult, ProofSubmitter};
use crate::api::models::{DecryptionResult, EncryptedInput, Handle, VerifiedDecryption};
use crate::error::FheError;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyInfo {
    public_key_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicDecryptResponse {
    clear_values: HashMap<Handle, Value>,
    abi_encoded_clear_values: String,
    decryption_proof: String,
}

pub struct HttpFheClient {
    http: HttpClient,
    base: Url,
    keys: OnceCell<KeyInfo>,
}

impl HttpFheClient {
    pub fn new(relayer_url: &str) -> FheResult<Self> {
        let base = Url::parse(&format!("{}/", crate::utils::normalize_url(relayer_url)))
            .map_err(|e| FheError::Relayer(format!("invalid relayer url: {}", e)))?;
        Ok(Self {
            http: HttpClient::new(),
            base,
            keys: OnceCell::new(),
        })
    }

    fn endpoint(&self, path: &str) -> FheResult<Url> {
        self.base
            .join(&format!("v1/{}", path))
            .map_err(|e| FheError::Relayer(e.to_string()))
    }

    fn key_id(&self) -> FheResult<&str> {
        self.keys
            .get()
            .map(|k| k.public_key_id.as_str())
            .ok_or(FheError::NotInitialized)
    }

    async fn post(&self, path: &str, body: Value) -> FheResult<reqwest::Response> {
        let resp = self.http.post(self.endpoint(path)?).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(FheError::Relayer(format!("HTTP {}: {}", status, text)));
        }
        Ok(resp)
    }
}

/// Relayers report 64-bit cleartexts either as JSON numbers or decimal strings.
fn clear_value(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

#[async_trait]
impl FheClient for HttpFheClient {
    async fn initialize(&self) -> FheResult<()> {
        self.keys
            .get_or_try_init(|| async {
                let resp = self.http.get(self.endpoint("keyurl")?).send().await?;
                if !resp.status().is_success() {
                    return Err(FheError::Relayer(format!("HTTP {}", resp.status())));
                }
                let keys = resp.json::<KeyInfo>().await?;
                log::info!("FHE key material {} loaded", keys.public_key_id);
                Ok::<_, FheError>(keys)
            })
            .await?;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.keys.initialized()
    }

    async fn encrypt(
        &self,
        contract_address: &str,
        caller_address: &str,
        value: u64,
    ) -> FheResult<EncryptedInput> {
        let key_id = self.key_id()?;
        let body = serde_json::json!({
            "publicKeyId": key_id,
            "contractAddress": contract_address,
            "userAddress": caller_address,
            "values": [{ "type": "euint64", "value": value.to_string() }],
        });
        let json: Value = self.post("input-proof", body).await?.json().await?;
        let encrypted_data = json
            .get("handles")
            .and_then(|h| h.as_array())
            .and_then(|h| h.first())
            .and_then(|h| h.as_str())
            .ok_or_else(|| FheError::Encryption("relayer returned no handle".into()))?;
        let proof = json
            .get("inputProof")
            .and_then(|p| p.as_str())
            .ok_or_else(|| FheError::Encryption("relayer returned no input proof".into()))?;
        Ok(EncryptedInput {
            encrypted_data: encrypted_data.to_string(),
            proof: proof.to_string(),
        })
    }

    async fn verify_decryption(
        &self,
        handles: &[Handle],
        contract_address: &str,
        submitter: &dyn ProofSubmitter,
    ) -> FheResult<VerifiedDecryption> {
        self.key_id()?;
        let body = serde_json::json!({
            "handles": handles,
            "contractAddress": contract_address,
        });
        let decrypted: PublicDecryptResponse = self.post("public-decrypt", body).await?.json().await?;
        settle(decrypted, submitter).await
    }
}

/// Hands the decryption proof to `submitter` once every clear value parses.
/// A malformed response never reaches the chain.
async fn settle(
    decrypted: PublicDecryptResponse,
    submitter: &dyn ProofSubmitter,
) -> FheResult<VerifiedDecryption> {
    let mut clear_values = HashMap::new();
    for (handle, raw) in decrypted.clear_values {
        let value = clear_value(&raw).ok_or_else(|| FheError::MissingClearValue(handle.to_string()))?;
        clear_values.insert(handle, value);
    }

    submitter
        .submit(&decrypted.abi_encoded_clear_values, &decrypted.decryption_proof)
        .await?;

    Ok(VerifiedDecryption {
        decryption_result: DecryptionResult { clear_values },
    })
}
