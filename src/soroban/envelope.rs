//! Unsigned transaction envelope assembly.
//!
//! # Responsibilities
//! - Wrap one `InvokeHostFunction(InvokeContract)` operation in a
//!   `TransactionV1Envelope` with no signatures
//! - Apply the read/write source-account and fee policy
//! - Stamp every envelope with a `[0, now + window]` time bound
//! - Compute the network transaction hash
//!
//! # Design Decisions
//! - Building is pure apart from the live-account fetch on the write path,
//!   so repeated builds are safe

use sha2::{Digest, Sha256};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use stellar_xdr::curr::{
    Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount,
    Operation, OperationBody, Preconditions, ScVal, SequenceNumber, TimeBounds, TimePoint,
    Transaction, TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, Uint256, VecM, WriteXdr,
};
use thiserror::Error;

use crate::observability::metrics;
use crate::soroban::address::Address;
use crate::soroban::codec;
use crate::soroban::rpc::SorobanRpc;
use crate::soroban::types::{CodecError, CodecResult, Intent, RpcError, SorobanConfig};

/// Errors from envelope assembly.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Live source account could not be fetched.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Envelope ready to hand to an external signer.
#[derive(Debug, Clone)]
pub struct BuiltEnvelope {
    /// Base64 XDR of the unsigned envelope.
    pub xdr: String,
    pub hash: [u8; 32],
    pub transaction: Transaction,
}

impl BuiltEnvelope {
    pub fn hash_hex(&self) -> String {
        to_hex(&self.hash)
    }
}

/// `sha256(passphrase)`.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// `sha256(TransactionSignaturePayload)` for `tx` on the given network.
pub fn transaction_hash(tx: &Transaction, network_id: &[u8; 32]) -> CodecResult<[u8; 32]> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(*network_id),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    Ok(Sha256::digest(payload.to_xdr(Limits::none())?).into())
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Builds read and write envelopes for one deployed contract.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    contract: Address,
    network_id: [u8; 32],
    write_fee: u32,
    validity_window: Duration,
}

impl EnvelopeBuilder {
    pub fn new(config: &SorobanConfig) -> CodecResult<Self> {
        let contract: Address = config.contract_id.parse()?;
        if contract.is_account() {
            return Err(CodecError::InvalidAddress {
                input: config.contract_id.clone(),
                reason: "expected a contract address",
            });
        }
        Ok(Self {
            contract,
            network_id: network_id(&config.network_passphrase),
            write_fee: config.write_fee,
            validity_window: Duration::from_secs(config.validity_window_secs),
        })
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    /// Zero-fee envelope sourced from the contract-derived placeholder account.
    pub fn build_read(&self, function: &str, args: Vec<ScVal>) -> CodecResult<BuiltEnvelope> {
        let placeholder = MuxedAccount::Ed25519(Uint256(*self.contract.key_bytes()));
        self.assemble(Intent::Read, placeholder, 0, 0, function, args)
    }

    /// Fee-bearing envelope for a source whose current sequence is known.
    pub fn build_write_with_sequence(
        &self,
        source: &Address,
        sequence: i64,
        function: &str,
        args: Vec<ScVal>,
    ) -> CodecResult<BuiltEnvelope> {
        let account = source
            .to_account_id()
            .ok_or_else(|| CodecError::InvalidAddress {
                input: source.to_string(),
                reason: "source account must be a G address",
            })?;
        self.assemble(
            Intent::Write,
            MuxedAccount::from(account),
            self.write_fee,
            sequence,
            function,
            args,
        )
    }

    /// Fee-bearing envelope for a source whose sequence is fetched from the ledger.
    pub async fn build_write(
        &self,
        rpc: &dyn SorobanRpc,
        source: &Address,
        function: &str,
        args: Vec<ScVal>,
    ) -> Result<BuiltEnvelope, EnvelopeError> {
        let account = rpc.get_account(source).await?;
        tracing::debug!(
            source_account = %source,
            sequence = account.sequence,
            function,
            "Fetched live source account"
        );
        Ok(self.build_write_with_sequence(source, account.sequence, function, args)?)
    }

    fn assemble(
        &self,
        intent: Intent,
        source_account: MuxedAccount,
        fee: u32,
        sequence: i64,
        function: &str,
        args: Vec<ScVal>,
    ) -> CodecResult<BuiltEnvelope> {
        let function_name = codec::symbol(function)?;

        let seq_num = sequence
            .checked_add(1)
            .ok_or_else(|| CodecError::IntegerOutOfRange {
                input: sequence.to_string(),
                kind: "sequence number",
            })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let invoke = InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(InvokeContractArgs {
                contract_address: self.contract.to_sc_address(),
                function_name,
                args: args.try_into()?,
            }),
            // Auth entries are attached by the signer
            auth: VecM::default(),
        };

        let tx = Transaction {
            source_account,
            fee,
            seq_num: SequenceNumber(seq_num),
            cond: Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(now + self.validity_window.as_secs()),
            }),
            memo: Memo::None,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::InvokeHostFunction(invoke),
            }]
            .try_into()?,
            ext: TransactionExt::V0,
        };

        let hash = transaction_hash(&tx, &self.network_id)?;
        let xdr = TransactionEnvelope::from(&tx).to_xdr_base64(Limits::none())?;

        metrics::record_envelope_built(function, intent);

        Ok(BuiltEnvelope {
            xdr,
            hash,
            transaction: tx,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::soroban::rpc::{AccountEntry, SimulationOutcome};
    use crate::soroban::types::RpcResult;
    use async_trait::async_trait;

    const CONTRACT: &str = "CDGIGIOWG5OESTIEH7OQEYHSDPAOYUO2ZSPWVO37SCONZUYEDN4L7FVM";
    const SIGNER: &str = "GAEE73IIXF4K6TL5DFVHIRVINNMABHTDNNQR3MLCCG3FVGVN74U4LKDO";

    fn builder() -> EnvelopeBuilder {
        let config = SorobanConfig {
            contract_id: CONTRACT.to_string(),
            ..SorobanConfig::default()
        };
        EnvelopeBuilder::new(&config).unwrap()
    }

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    fn time_bounds(tx: &Transaction) -> &TimeBounds {
        match &tx.cond {
            Preconditions::Time(bounds) => bounds,
            other => panic!("unexpected preconditions {:?}", other),
        }
    }

    struct FixedAccount(i64);

    #[async_trait]
    impl SorobanRpc for FixedAccount {
        async fn simulate_transaction(&self, _envelope: &str) -> RpcResult<SimulationOutcome> {
            unreachable!("not used")
        }

        async fn get_account(&self, account: &Address) -> RpcResult<AccountEntry> {
            Ok(AccountEntry {
                account: *account,
                balance: 100,
                sequence: self.0,
            })
        }
    }

    struct MissingAccount;

    #[async_trait]
    impl SorobanRpc for MissingAccount {
        async fn simulate_transaction(&self, _envelope: &str) -> RpcResult<SimulationOutcome> {
            unreachable!("not used")
        }

        async fn get_account(&self, account: &Address) -> RpcResult<AccountEntry> {
            Err(RpcError::AccountNotFound(account.to_string()))
        }
    }

    #[test]
    fn test_testnet_network_id() {
        let id = network_id("Test SDF Network ; September 2015");
        assert_eq!(
            to_hex(&id),
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
    }

    #[test]
    fn test_read_envelope_policy() {
        let b = builder();
        let built = b.build_read("get_grant", vec![ScVal::U64(1)]).unwrap();
        let tx = decode(&built.xdr);

        assert_eq!(tx, built.transaction);
        assert_eq!(tx.fee, 0);
        assert_eq!(tx.seq_num, SequenceNumber(1));
        assert_eq!(
            tx.source_account,
            MuxedAccount::Ed25519(Uint256(*b.contract().key_bytes()))
        );
        assert_eq!(tx.memo, Memo::None);

        let bounds = time_bounds(&tx);
        assert_eq!(bounds.min_time, TimePoint(0));
        let start = now();
        assert!(bounds.max_time.0 >= start + 29 && bounds.max_time.0 <= start + 31);

        let invoke = invocation(&tx);
        assert_eq!(function(&tx), "get_grant");
        assert_eq!(invoke.args.to_vec(), vec![ScVal::U64(1)]);
        assert_eq!(invoke.contract_address.to_string(), CONTRACT);
    }

    #[test]
    fn test_write_envelope_policy() {
        let signer: Address = SIGNER.parse().unwrap();
        let args = vec![codec::address(&signer), ScVal::U64(1), ScVal::U32(0)];
        let built = builder()
            .build_write_with_sequence(&signer, 41, "approve_milestone", args.clone())
            .unwrap();
        let tx = decode(&built.xdr);

        assert_eq!(tx.fee, 1_000_000);
        assert_eq!(tx.seq_num, SequenceNumber(42));
        assert_eq!(tx.source_account.to_string(), SIGNER);
        assert_eq!(invocation(&tx).args.to_vec(), args);
        assert_eq!(tx.operations[0].source_account, None);
        match &tx.operations[0].body {
            OperationBody::InvokeHostFunction(op) => assert!(op.auth.is_empty()),
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_write_rejects_contract_source() {
        let contract: Address = CONTRACT.parse().unwrap();
        let err = builder()
            .build_write_with_sequence(&contract, 1, "claim_payment", vec![])
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidAddress { .. }));
    }

    #[test]
    fn test_sequence_overflow() {
        let signer: Address = SIGNER.parse().unwrap();
        assert!(builder()
            .build_write_with_sequence(&signer, i64::MAX, "claim_payment", vec![])
            .is_err());
    }

    #[test]
    fn test_invalid_function_name() {
        assert!(matches!(
            builder().build_read("get grant", vec![]),
            Err(CodecError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_hash_covers_network_and_transaction() {
        let b = builder();
        let built = b.build_read("get_grant", vec![ScVal::U64(7)]).unwrap();

        // networkId ‖ ENVELOPE_TYPE_TX ‖ tx
        let mut payload = network_id(&SorobanConfig::default().network_passphrase).to_vec();
        payload.extend_from_slice(&2i32.to_be_bytes());
        payload.extend_from_slice(&built.transaction.to_xdr(Limits::none()).unwrap());
        let expected: [u8; 32] = Sha256::digest(&payload).into();
        assert_eq!(built.hash, expected);
        assert_eq!(built.hash_hex().len(), 64);

        let other_network = transaction_hash(&built.transaction, &network_id("other")).unwrap();
        assert_ne!(other_network, built.hash);
    }

    #[test]
    fn test_rejects_account_as_contract_id() {
        let config = SorobanConfig {
            contract_id: SIGNER.to_string(),
            ..SorobanConfig::default()
        };
        assert!(EnvelopeBuilder::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_build_write_fetches_live_sequence() {
        let signer: Address = SIGNER.parse().unwrap();
        let args = vec![
            codec::encode_address(SIGNER).unwrap(),
            codec::encode_string("Plan").unwrap(),
        ];
        let built = builder()
            .build_write(&FixedAccount(99), &signer, "register_milestone", args)
            .await
            .unwrap();
        assert_eq!(built.transaction.seq_num, SequenceNumber(100));
    }

    #[tokio::test]
    async fn test_build_write_surfaces_account_failure() {
        let signer: Address = SIGNER.parse().unwrap();
        let err = builder()
            .build_write(&MissingAccount, &signer, "claim_payment", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, EnvelopeError::Rpc(RpcError::AccountNotFound(_))));
    }
}
