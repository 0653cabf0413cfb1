//! Shared utilities for integration testing.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stellar_xdr::curr::{
    self as xdr, HostFunction, Int128Parts, InvokeContractArgs, InvokeHostFunctionOp, Limits,
    OperationBody, ReadXdr, ScMap, ScMapEntry, ScString, ScSymbol, ScVec, Transaction,
    TransactionEnvelope, WriteXdr,
};
use tower::ServiceExt;

use grant_coordinator::config::CoordinatorConfig;
use grant_coordinator::grants::GrantReconciler;
use grant_coordinator::http::{build_router, AppState};
use grant_coordinator::soroban::rpc::{account_ledger_key, AccountEntry, SimulationOutcome};
use grant_coordinator::soroban::{Address, EnvelopeBuilder, RpcError, ScVal, SorobanRpc};
use grant_coordinator::store::{GrantStore, SqliteStore};

pub const CONTRACT: &str = "CDGIGIOWG5OESTIEH7OQEYHSDPAOYUO2ZSPWVO37SCONZUYEDN4L7FVM";
pub const F: &str = "GBF7KERPGRCVJRJ33YXLXDGSW7R5CYAK2YY4HBNF27GOEPDXQVCZUCHR";
pub const M: &str = "GDN4DNGJAD76JDKXLNO2LRRYAQASL5S5WD7D4JCJJN3OVGDEK7MYM5Z2";
pub const S: &str = "GAEE73IIXF4K6TL5DFVHIRVINNMABHTDNNQR3MLCCG3FVGVN74U4LKDO";
pub const R: &str = "GDSS3HCQRRICGRZUJWGAPLMRZPLANCX4OX7WFEXQMKQJZI4BZCPHC2ZT";
pub const X: &str = "GDTXXGU25HRQWDN5W32RBITE56O6PAKQDV5WXEVORHVQLHC2W5B5X5FK";

/// Sequence every known account reports.
pub const SEQUENCE: i64 = 41;

pub fn config_for(rpc_url: &str) -> CoordinatorConfig {
    let mut config = CoordinatorConfig::default();
    config.soroban.contract_id = CONTRACT.to_string();
    config.soroban.rpc_url = rpc_url.to_string();
    config.soroban.rpc_timeout_secs = 2;
    config.store.path = ":memory:".to_string();
    config
}

pub fn address(text: &str) -> ScVal {
    let address: Address = text.parse().unwrap();
    ScVal::Address(address.to_sc_address())
}

pub fn symbol(name: &str) -> ScVal {
    ScVal::Symbol(ScSymbol(name.try_into().unwrap()))
}

pub fn string(text: &str) -> ScVal {
    ScVal::String(ScString(text.try_into().unwrap()))
}

pub fn amount(value: i128) -> ScVal {
    ScVal::I128(Int128Parts {
        hi: (value >> 64) as i64,
        lo: value as u64,
    })
}

fn field(name: &str, val: ScVal) -> ScMapEntry {
    ScMapEntry {
        key: symbol(name),
        val,
    }
}

fn map(entries: Vec<ScMapEntry>) -> ScVal {
    ScVal::Map(Some(ScMap(entries.try_into().unwrap())))
}

fn vec(items: Vec<ScVal>) -> ScVal {
    ScVal::Vec(Some(ScVec(items.try_into().unwrap())))
}

/// `get_grant` reply for the standard F/M/S/R participants.
pub fn grant_value(name: &str, total_amount: i128, total_milestones: u32) -> ScVal {
    map(vec![
        field("claimed_amount", amount(0)),
        field("creation_timestamp", ScVal::U64(1_700_000_000)),
        field("funder", address(F)),
        field("manager", address(M)),
        field("name", string(name)),
        field("registered_milestones", ScVal::U32(1)),
        field("researcher", address(R)),
        field("supervisor", address(S)),
        field("total_amount", amount(total_amount)),
        field("total_milestones", ScVal::U32(total_milestones)),
    ])
}

/// `get_milestone` reply with the given approvers.
pub fn milestone_value(approvers: &[&str], status: &str) -> ScVal {
    map(vec![
        field("approvers", vec(approvers.iter().map(|a| address(a)).collect())),
        field("description", string("Collect samples")),
        field("name", string("Fieldwork")),
        field("paid", ScVal::Bool(false)),
        field("status", vec(vec![symbol(status)])),
    ])
}

pub fn create_body(name: &str, total_amount: &str, total_milestones: u32) -> Value {
    json!({
        "funder": F,
        "manager": M,
        "supervisor": S,
        "researcher": R,
        "name": name,
        "total_amount": total_amount,
        "total_milestones": total_milestones,
        "funderInstitutionName": "Open Science Fund",
        "managerName": "Mara",
        "managerEmail": "mara@example.org",
        "supervisorName": "Sol",
        "supervisorEmail": "sol@example.org",
        "researcherName": "Rin",
        "researcherEmail": "rin@example.org",
    })
}

/// Decode a returned unsigned envelope to its transaction.
pub fn decode_envelope(envelope_xdr: &str) -> Transaction {
    match TransactionEnvelope::from_xdr_base64(envelope_xdr, Limits::none()).unwrap() {
        TransactionEnvelope::Tx(envelope) => {
            assert!(envelope.signatures.is_empty());
            envelope.tx
        }
        other => panic!("unexpected envelope {:?}", other),
    }
}

/// The single contract invocation a built envelope carries.
pub fn invocation(tx: &Transaction) -> &InvokeContractArgs {
    assert_eq!(tx.operations.len(), 1);
    match &tx.operations[0].body {
        OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(args),
            ..
        }) => args,
        other => panic!("unexpected operation {:?}", other),
    }
}

pub fn function_name(tx: &Transaction) -> String {
    invocation(tx).function_name.to_utf8_string_lossy()
}

pub fn args(tx: &Transaction) -> Vec<ScVal> {
    invocation(tx).args.to_vec()
}

/// Source account of a built envelope, as a strkey.
pub fn source(tx: &Transaction) -> String {
    tx.source_account.to_string()
}

/// In-process ledger: simulation replies keyed by contract function name.
#[derive(Default)]
pub struct Ledger {
    replies: Mutex<HashMap<String, SimulationOutcome>>,
    calls: Mutex<Vec<String>>,
}

impl Ledger {
    pub fn reply(&self, function: &str, retval: ScVal) {
        self.replies.lock().unwrap().insert(
            function.to_string(),
            SimulationOutcome::Success {
                retval,
                latest_ledger: 100,
            },
        );
    }

    pub fn fail(&self, function: &str, error: &str) {
        self.replies.lock().unwrap().insert(
            function.to_string(),
            SimulationOutcome::Failed {
                error: error.to_string(),
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SorobanRpc for Ledger {
    async fn simulate_transaction(
        &self,
        envelope_xdr: &str,
    ) -> Result<SimulationOutcome, RpcError> {
        let function = function_name(&decode_envelope(envelope_xdr));
        self.calls.lock().unwrap().push(function.clone());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .get(&function)
            .cloned()
            .unwrap_or(SimulationOutcome::Failed {
                error: format!("HostError: no reply for {}", function),
            }))
    }

    async fn get_account(&self, account: &Address) -> Result<AccountEntry, RpcError> {
        if account.to_string() == X {
            return Err(RpcError::AccountNotFound(account.to_string()));
        }
        Ok(AccountEntry {
            account: *account,
            balance: 10_000_000,
            sequence: SEQUENCE,
        })
    }
}

/// Router and store wired the way `main` wires them.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteStore>,
}

impl TestApp {
    pub fn with_rpc(config: &CoordinatorConfig, rpc: Arc<dyn SorobanRpc>) -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let builder = Arc::new(EnvelopeBuilder::new(&config.soroban).unwrap());
        let reconciler = GrantReconciler::new(builder, rpc, store.clone() as Arc<dyn GrantStore>);
        Self {
            router: build_router(config, AppState { reconciler }),
            store,
        }
    }

    pub fn with_ledger(ledger: Arc<Ledger>) -> Self {
        Self::with_rpc(&config_for("http://127.0.0.1:1/"), ledger)
    }

    pub fn with_node(server: &MockServer) -> Self {
        let config = config_for(&server.url("/"));
        let rpc = grant_coordinator::soroban::HttpRpcClient::new(&config.soroban).unwrap();
        Self::with_rpc(&config, Arc::new(rpc))
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Base64 `LedgerEntryData::Account` as a node returns it.
pub fn account_entry_xdr(account: &str, balance: i64, sequence: i64) -> String {
    let address: Address = account.parse().unwrap();
    let entry = xdr::LedgerEntryData::Account(xdr::AccountEntry {
        account_id: address.to_account_id().unwrap(),
        balance,
        seq_num: xdr::SequenceNumber(sequence),
        num_sub_entries: 0,
        inflation_dest: None,
        flags: 0,
        home_domain: xdr::String32::default(),
        thresholds: xdr::Thresholds([1, 0, 0, 0]),
        signers: Default::default(),
        ext: xdr::AccountEntryExt::V0,
    });
    entry.to_xdr_base64(Limits::none()).unwrap()
}

/// Serve `getLedgerEntries` for `account` on a mock node.
pub async fn mock_account<'a>(
    server: &'a MockServer,
    account: &str,
    sequence: i64,
) -> httpmock::Mock<'a> {
    let key = account_ledger_key(&account.parse().unwrap()).unwrap();
    let entry = account_entry_xdr(account, 10_000_000, sequence);
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .body_includes("getLedgerEntries")
                .body_includes(key.as_str());
            then.status(200).json_body(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "entries": [{ "key": key, "xdr": entry, "lastModifiedLedgerSeq": 90 }],
                    "latestLedger": 100
                }
            }));
        })
        .await
}

/// Serve every `simulateTransaction` with `retval`.
pub async fn mock_simulation<'a>(server: &'a MockServer, retval: &ScVal) -> httpmock::Mock<'a> {
    mock_simulation_xdr(server, &retval.to_xdr_base64(Limits::none()).unwrap()).await
}

/// Serve every `simulateTransaction` with a raw base64 return value.
pub async fn mock_simulation_xdr<'a>(server: &'a MockServer, xdr: &str) -> httpmock::Mock<'a> {
    let xdr = xdr.to_string();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/").body_includes("simulateTransaction");
            then.status(200).json_body(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "results": [{ "auth": [], "xdr": xdr }],
                    "latestLedger": 100
                }
            }));
        })
        .await
}
