//! Soroban JSON-RPC client.
//!
//! # Responsibilities
//! - `simulateTransaction` for zero-fee dry runs
//! - `getLedgerEntries` for the signer's live account sequence
//! - Map transport failures, timeouts and malformed replies to `RpcError`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::timeout;

use stellar_xdr::curr::{self as xdr, Limits, ReadXdr, ScVal, WriteXdr};

use crate::soroban::address::Address;
use crate::soroban::codec;
use crate::soroban::types::{CodecError, CodecResult, RpcError, RpcResult, SorobanConfig};

/// Account fields the envelope builder needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountEntry {
    pub account: Address,
    pub balance: i64,
    pub sequence: i64,
}

/// Result of a `simulateTransaction` call that reached the node.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
    /// Host function returned a value.
    Success { retval: ScVal, latest_ledger: u64 },
    /// Node reported an error, or no result came back.
    Failed { error: String },
}

/// Soroban RPC operations used by the coordinator.
#[async_trait]
pub trait SorobanRpc: Send + Sync {
    /// Dry-run a base64 envelope against current ledger state.
    async fn simulate_transaction(&self, envelope_xdr: &str) -> RpcResult<SimulationOutcome>;

    /// Fetch an account's ledger entry.
    async fn get_account(&self, account: &Address) -> RpcResult<AccountEntry>;
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResult {
    error: Option<String>,
    #[serde(default)]
    results: Option<Vec<HostFunctionResult>>,
    #[serde(default)]
    latest_ledger: u64,
}

#[derive(Debug, Deserialize)]
struct HostFunctionResult {
    xdr: String,
}

#[derive(Debug, Deserialize)]
struct LedgerEntriesResult {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryResult>>,
}

#[derive(Debug, Deserialize)]
struct LedgerEntryResult {
    xdr: String,
}

/// HTTP JSON-RPC 2.0 client for a Soroban RPC node.
pub struct HttpRpcClient {
    http: reqwest::Client,
    url: url::Url,
    timeout_secs: u64,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(config: &SorobanConfig) -> RpcResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            RpcError::Transport(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        tracing::info!(rpc_url = %url, timeout_secs = config.rpc_timeout_secs, "Soroban RPC client initialized");
        Ok(Self {
            http: reqwest::Client::new(),
            url,
            timeout_secs: config.rpc_timeout_secs,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let request = async {
            let response = self
                .http
                .post(self.url.clone())
                .json(&body)
                .send()
                .await
                .map_err(|e| RpcError::Transport(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(RpcError::Transport(format!("HTTP status {}", status)));
            }
            response
                .json::<JsonRpcResponse>()
                .await
                .map_err(|e| RpcError::Malformed(e.to_string()))
        };

        let reply = timeout(Duration::from_secs(self.timeout_secs), request)
            .await
            .map_err(|_| RpcError::Timeout(self.timeout_secs))??;

        if let Some(err) = reply.error {
            return Err(RpcError::Server {
                code: err.code,
                message: err.message,
            });
        }
        reply
            .result
            .ok_or_else(|| RpcError::Malformed(format!("{} reply has no result", method)))
    }
}

impl std::fmt::Debug for HttpRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRpcClient")
            .field("url", &self.url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[async_trait]
impl SorobanRpc for HttpRpcClient {
    async fn simulate_transaction(&self, envelope_xdr: &str) -> RpcResult<SimulationOutcome> {
        let result = self
            .call("simulateTransaction", json!({ "transaction": envelope_xdr }))
            .await?;
        let result: SimulateResult =
            serde_json::from_value(result).map_err(|e| RpcError::Malformed(e.to_string()))?;
        parse_simulation(result)
    }

    async fn get_account(&self, account: &Address) -> RpcResult<AccountEntry> {
        let key = account_ledger_key(account)?;
        let result = self
            .call("getLedgerEntries", json!({ "keys": [key] }))
            .await?;
        let result: LedgerEntriesResult =
            serde_json::from_value(result).map_err(|e| RpcError::Malformed(e.to_string()))?;

        let entry = result
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::AccountNotFound(account.to_string()))?;
        Ok(decode_account_entry(&entry.xdr)?)
    }
}

fn parse_simulation(result: SimulateResult) -> RpcResult<SimulationOutcome> {
    if let Some(error) = result.error {
        return Ok(SimulationOutcome::Failed { error });
    }
    let first = result.results.and_then(|r| r.into_iter().next());
    let Some(host) = first else {
        return Ok(SimulationOutcome::Failed {
            error: "simulation returned no result".to_string(),
        });
    };
    // The node answered; a return value we cannot read is a failed read
    match codec::decode_value(&host.xdr) {
        Ok(retval) => Ok(SimulationOutcome::Success {
            retval,
            latest_ledger: result.latest_ledger,
        }),
        Err(e) => Ok(SimulationOutcome::Failed {
            error: format!("undecodable return value: {}", e),
        }),
    }
}

/// Base64 `LedgerKey::Account` for a G address.
pub fn account_ledger_key(account: &Address) -> CodecResult<String> {
    let account_id = account
        .to_account_id()
        .ok_or_else(|| CodecError::InvalidAddress {
            input: account.to_string(),
            reason: "only accounts have account ledger entries",
        })?;
    let key = xdr::LedgerKey::Account(xdr::LedgerKeyAccount { account_id });
    Ok(key.to_xdr_base64(Limits::none())?)
}

/// Decode a base64 `LedgerEntryData::Account`.
pub fn decode_account_entry(encoded: &str) -> CodecResult<AccountEntry> {
    match xdr::LedgerEntryData::from_xdr_base64(encoded.trim(), codec::decode_limits())? {
        xdr::LedgerEntryData::Account(entry) => Ok(AccountEntry {
            account: Address::from(&entry.account_id),
            balance: entry.balance,
            sequence: entry.seq_num.0,
        }),
        other => Err(CodecError::TypeMismatch {
            expected: "account entry",
            found: other.name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const SIGNER: &str = "GAEE73IIXF4K6TL5DFVHIRVINNMABHTDNNQR3MLCCG3FVGVN74U4LKDO";

    fn client_for(server: &MockServer, timeout_secs: u64) -> HttpRpcClient {
        let config = SorobanConfig {
            rpc_url: server.url("/"),
            rpc_timeout_secs: timeout_secs,
            ..SorobanConfig::default()
        };
        HttpRpcClient::new(&config).unwrap()
    }

    fn account_entry_xdr(account: &Address, balance: i64, sequence: i64) -> String {
        let entry = xdr::LedgerEntryData::Account(xdr::AccountEntry {
            account_id: account.to_account_id().unwrap(),
            balance,
            seq_num: xdr::SequenceNumber(sequence),
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: xdr::String32(xdr::StringM::default()),
            thresholds: xdr::Thresholds([1, 0, 0, 0]),
            signers: xdr::VecM::default(),
            ext: xdr::AccountEntryExt::V0,
        });
        entry.to_xdr_base64(Limits::none()).unwrap()
    }

    fn simulation_reply(retval_xdr: &str) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "results": [{ "auth": [], "xdr": retval_xdr }],
                "latestLedger": 1234
            }
        })
    }

    #[test]
    fn test_account_ledger_key_layout() {
        let addr: Address = SIGNER.parse().unwrap();
        let key = account_ledger_key(&addr).unwrap();
        let decoded = xdr::LedgerKey::from_xdr_base64(&key, Limits::none()).unwrap();
        assert_eq!(
            decoded,
            xdr::LedgerKey::Account(xdr::LedgerKeyAccount {
                account_id: addr.to_account_id().unwrap()
            })
        );

        let contract: Address = "CDGIGIOWG5OESTIEH7OQEYHSDPAOYUO2ZSPWVO37SCONZUYEDN4L7FVM"
            .parse()
            .unwrap();
        assert!(account_ledger_key(&contract).is_err());
    }

    #[test]
    fn test_decode_account_entry() {
        let addr: Address = SIGNER.parse().unwrap();
        let entry = decode_account_entry(&account_entry_xdr(&addr, 500, 77)).unwrap();
        assert_eq!(entry.account, addr);
        assert_eq!(entry.balance, 500);
        assert_eq!(entry.sequence, 77);
    }

    #[test]
    fn test_decode_rejects_other_entry_kinds() {
        let ttl = xdr::LedgerEntryData::Ttl(xdr::TtlEntry {
            key_hash: xdr::Hash([0; 32]),
            live_until_ledger_seq: 10,
        })
        .to_xdr_base64(Limits::none())
        .unwrap();
        assert!(matches!(
            decode_account_entry(&ttl),
            Err(CodecError::TypeMismatch { expected: "account entry", .. })
        ));
    }

    #[tokio::test]
    async fn test_simulate_success() {
        let server = MockServer::start_async().await;
        let retval = ScVal::U64(3).to_xdr_base64(Limits::none()).unwrap();
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("simulateTransaction");
                then.status(200).json_body(simulation_reply(&retval));
            })
            .await;

        let outcome = client_for(&server, 5)
            .simulate_transaction("AAAA")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(
            outcome,
            SimulationOutcome::Success {
                retval: ScVal::U64(3),
                latest_ledger: 1234
            }
        );
    }

    #[tokio::test]
    async fn test_undecodable_retval_is_failed_outcome() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                // truncated SCV_U64
                then.status(200).json_body(simulation_reply("AAAABQAA"));
            })
            .await;

        let outcome = client_for(&server, 5)
            .simulate_transaction("AAAA")
            .await
            .unwrap();
        assert!(
            matches!(&outcome, SimulationOutcome::Failed { error } if error.contains("undecodable")),
            "got {:?}",
            outcome
        );
    }

    #[tokio::test]
    async fn test_simulate_host_error_is_failed_outcome() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "error": "HostError: Error(Contract, #1)",
                        "latestLedger": 1234
                    }
                }));
            })
            .await;

        let outcome = client_for(&server, 5)
            .simulate_transaction("AAAA")
            .await
            .unwrap();
        assert!(matches!(outcome, SimulationOutcome::Failed { error } if error.contains("HostError")));
    }

    #[tokio::test]
    async fn test_simulate_without_results_is_failed_outcome() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200)
                    .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": { "latestLedger": 9 } }));
            })
            .await;

        let outcome = client_for(&server, 5)
            .simulate_transaction("AAAA")
            .await
            .unwrap();
        assert!(matches!(outcome, SimulationOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_json_rpc_error_object() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": -32602, "message": "invalid params" }
                }));
            })
            .await;

        let err = client_for(&server, 5)
            .simulate_transaction("AAAA")
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Server { code: -32602, .. }));
    }

    #[tokio::test]
    async fn test_http_failure_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(503);
            })
            .await;

        let err = client_for(&server, 5)
            .simulate_transaction("AAAA")
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Transport(_)));
    }

    #[tokio::test]
    async fn test_slow_node_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
            })
            .await;

        let err = client_for(&server, 1)
            .simulate_transaction("AAAA")
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_get_account() {
        let server = MockServer::start_async().await;
        let addr: Address = SIGNER.parse().unwrap();
        let entry = account_entry_xdr(&addr, 10_000, 4_200);
        server
            .mock_async(|when, then| {
                when.method(POST).path("/").body_includes("getLedgerEntries");
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": {
                        "entries": [{ "key": "", "xdr": entry, "lastModifiedLedgerSeq": 5 }],
                        "latestLedger": 6
                    }
                }));
            })
            .await;

        let account = client_for(&server, 5).get_account(&addr).await.unwrap();
        assert_eq!(account.sequence, 4_200);
    }

    #[tokio::test]
    async fn test_get_account_missing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "entries": [], "latestLedger": 6 }
                }));
            })
            .await;

        let addr: Address = SIGNER.parse().unwrap();
        let err = client_for(&server, 5).get_account(&addr).await.unwrap_err();
        assert!(matches!(err, RpcError::AccountNotFound(_)));
    }
}
