//! reqwest adapter for a contract bridge service that fronts the address-book
//! contract with JSON endpoints under `/api/v1/contracts/<address>`.

use crate::api::contract::{ContactContract, ContractGateway, ContractResult};
use crate::api::models::{CreateRecordArgs, Handle, RecordData, TxHandle, TxReceipt};
use crate::api::session::SessionProvider;
use crate::error::ContractError;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Wallet error code for a declined signature request.
const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
            max_attempts: 80,
        }
    }
}

pub struct HttpContractGateway {
    http: HttpClient,
    base: Url,
    contract_address: String,
    session: Arc<dyn SessionProvider>,
    policy: ConfirmationPolicy,
}

impl HttpContractGateway {
    pub fn new(
        base_url: &str,
        contract_address: &str,
        session: Arc<dyn SessionProvider>,
        policy: ConfirmationPolicy,
    ) -> ContractResult<Self> {
        let base = Url::parse(&crate::utils::normalize_url(base_url))
            .map_err(|e| ContractError::Transport(format!("invalid gateway url: {}", e)))?;
        Ok(Self {
            http: HttpClient::new(),
            base,
            contract_address: contract_address.to_string(),
            session,
            policy,
        })
    }

    fn handle(&self, signer: Option<String>) -> Arc<dyn ContactContract> {
        Arc::new(BridgeContract {
            http: self.http.clone(),
            base: self.base.clone(),
            address: self.contract_address.clone(),
            signer,
            policy: self.policy.clone(),
        })
    }
}

#[async_trait]
impl ContractGateway for HttpContractGateway {
    async fn read_only(&self) -> ContractResult<Arc<dyn ContactContract>> {
        Ok(self.handle(None))
    }

    async fn with_signer(&self) -> ContractResult<Arc<dyn ContactContract>> {
        let account = self.session.account().ok_or(ContractError::NoSigner)?;
        Ok(self.handle(Some(account)))
    }
}

struct BridgeContract {
    http: HttpClient,
    base: Url,
    address: String,
    signer: Option<String>,
    policy: ConfirmationPolicy,
}

impl BridgeContract {
    fn endpoint(&self, segments: &[&str]) -> ContractResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ContractError::Transport("gateway url cannot be a base".into()))?
            .pop_if_empty()
            .extend(["api", "v1", "contracts", self.address.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn signer(&self) -> ContractResult<&str> {
        self.signer.as_deref().ok_or(ContractError::NoSigner)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> ContractResult<T> {
        let resp = self.http.get(self.endpoint(segments)?).send().await?;
        Self::decode(resp).await
    }

    async fn post_json<T: DeserializeOwned>(&self, segments: &[&str], body: Value) -> ContractResult<T> {
        let resp = self.http.post(self.endpoint(segments)?).json(&body).send().await?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> ContractResult<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        Err(classify_failure(status.as_u16(), &body))
    }

    async fn send_tx(&self, segments: &[&str], mut body: Value) -> ContractResult<TxHandle> {
        body["from"] = Value::String(self.signer()?.to_string());
        let json: Value = self.post_json(segments, body).await?;
        let hash = json
            .get("txHash")
            .or_else(|| json.get("hash"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| ContractError::Decode("no transaction hash in response".into()))?;
        Ok(TxHandle { hash: hash.to_string() })
    }
}

/// Maps an error response of the bridge onto the contract error taxonomy.
fn classify_failure(status: u16, body: &Value) -> ContractError {
    let message = body
        .get("error")
        .or_else(|| body.get("message"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let code = body.get("code").and_then(|v| v.as_i64());
    if code == Some(USER_REJECTED_CODE) || message.contains("user rejected") {
        ContractError::UserRejected
    } else if body.get("reverted").and_then(|v| v.as_bool()).unwrap_or(false)
        || message.contains("revert")
        || message.contains("already verified")
    {
        ContractError::Reverted(message)
    } else if message.is_empty() {
        ContractError::Transport(format!("HTTP {}", status))
    } else {
        ContractError::Transport(format!("HTTP {}: {}", status, message))
    }
}

#[async_trait]
impl ContactContract for BridgeContract {
    fn address(&self) -> &str {
        &self.address
    }

    async fn get_all_record_ids(&self) -> ContractResult<Vec<String>> {
        let json: Value = self.get_json(&["records"]).await?;
        let list = json
            .as_array()
            .cloned()
            .or_else(|| json.get("ids").and_then(|v| v.as_array()).cloned())
            .ok_or_else(|| ContractError::Decode("record id list missing".into()))?;
        Ok(list
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    async fn get_record(&self, id: &str) -> ContractResult<RecordData> {
        self.get_json(&["records", id]).await
    }

    async fn get_encrypted_handle(&self, id: &str) -> ContractResult<Handle> {
        let json: Value = self.get_json(&["records", id, "handle"]).await?;
        json.get("handle")
            .and_then(|v| v.as_str())
            .map(|h| Handle(h.to_string()))
            .ok_or_else(|| ContractError::Decode(format!("no handle for {}", id)))
    }

    async fn is_available(&self) -> ContractResult<bool> {
        let json: Value = self.get_json(&["available"]).await?;
        Ok(json
            .get("available")
            .and_then(|v| v.as_bool())
            .or_else(|| json.as_bool())
            .unwrap_or(false))
    }

    async fn create_record(&self, args: CreateRecordArgs) -> ContractResult<TxHandle> {
        let body = serde_json::to_value(&args).map_err(|e| ContractError::Decode(e.to_string()))?;
        self.send_tx(&["records"], body).await
    }

    async fn verify_decryption(
        &self,
        id: &str,
        encoded_clear_values: &str,
        proof: &str,
    ) -> ContractResult<TxHandle> {
        let body = serde_json::json!({
            "abiEncodedClearValues": encoded_clear_values,
            "decryptionProof": proof,
        });
        self.send_tx(&["records", id, "verify"], body).await
    }

    async fn wait_for_confirmation(&self, tx: &TxHandle) -> ContractResult<TxReceipt> {
        for _ in 0..self.policy.max_attempts {
            let resp = self
                .http
                .get(self.endpoint(&["tx", tx.hash.as_str()])?)
                .send()
                .await?;
            let json: Value = Self::decode(resp).await?;
            match json.get("status").and_then(|v| v.as_str()).unwrap_or("pending") {
                "confirmed" | "success" => {
                    return Ok(TxReceipt {
                        hash: tx.hash.clone(),
                        block_number: json.get("blockNumber").and_then(|v| v.as_u64()),
                    });
                }
                "failed" | "reverted" => {
                    let reason = json
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("transaction reverted");
                    return Err(ContractError::Reverted(reason.to_string()));
                }
                _ => tokio::time::sleep(self.policy.poll_interval).await,
            }
        }
        Err(ContractError::Timeout(tx.hash.clone()))
    }
}
