//! Composite grant views and transaction builders.
//!
//! # Responsibilities
//! - Create-grant: register participants, persist the record, build the
//!   `create_grant` envelope and remember it for confirmation
//! - Grant and milestone detail views merging on-chain and off-chain state
//! - Pass-through builders for register/approve/claim
//! - Link a confirmed on-chain id back to its local record
//!
//! # Design Decisions
//! - On-chain reads happen before off-chain lookups, so a missing record
//!   is reported as `NotFound` only after the simulation succeeded
//! - Rows written before a failed envelope build are left in place

use std::sync::Arc;

use crate::grants::error::{CoordinatorError, CoordinatorResult};
use crate::grants::registry::ParticipantRegistry;
use crate::grants::types::{
    ApproveMilestoneRequest, ApproverView, ClaimPaymentRequest, ConfirmGrantResponse,
    CreateGrantRequest, CreateGrantResponse, GrantDetails, GrantId, MilestoneDetails, MilestoneId,
    OffChainGrant, ParticipantsView, RegisterMilestoneRequest, Role, RoleHolder,
    TransactionResponse,
};
use crate::soroban::codec::{self, OnChainGrant};
use crate::soroban::{Address, BuiltEnvelope, EnvelopeBuilder, ReadSimulator, ScVal, SorobanRpc};
use crate::store::{GrantRecord, GrantStore, NewGrantRecord, Participant, PendingCreation, StoreError};

/// The coordinator core, wired once at startup.
#[derive(Clone)]
pub struct GrantReconciler {
    builder: Arc<EnvelopeBuilder>,
    simulator: ReadSimulator,
    rpc: Arc<dyn SorobanRpc>,
    store: Arc<dyn GrantStore>,
    registry: ParticipantRegistry,
}

impl GrantReconciler {
    pub fn new(
        builder: Arc<EnvelopeBuilder>,
        rpc: Arc<dyn SorobanRpc>,
        store: Arc<dyn GrantStore>,
    ) -> Self {
        Self {
            simulator: ReadSimulator::new(builder.clone(), rpc.clone()),
            registry: ParticipantRegistry::new(store.clone()),
            builder,
            rpc,
            store,
        }
    }

    async fn build_write(
        &self,
        source: &Address,
        function: &'static str,
        args: Vec<ScVal>,
    ) -> CoordinatorResult<BuiltEnvelope> {
        let built = self
            .builder
            .build_write(self.rpc.as_ref(), source, function, args)
            .await?;
        tracing::debug!(
            function,
            source_account = %source,
            tx_hash = %built.hash_hex(),
            "Write envelope built"
        );
        Ok(built)
    }

    /// Persist the off-chain grant and build its unsigned `create_grant` envelope.
    pub async fn create_grant(&self, req: CreateGrantRequest) -> CoordinatorResult<CreateGrantResponse> {
        let manager = self
            .registry
            .resolve(&req.manager_email, req.manager_name.as_str())?;
        let supervisor = self
            .registry
            .resolve(&req.supervisor_email, req.supervisor_name.as_str())?;
        let researcher = self
            .registry
            .resolve(&req.researcher_email, req.researcher_name.as_str())?;

        let record = self.store.create_grant_record(&NewGrantRecord {
            institution_name: req.funder_institution_name.as_str().to_string(),
            manager_id: manager.id,
            supervisor_id: supervisor.id,
            researcher_id: researcher.id,
        })?;
        tracing::info!(local_id = record.id, "Grant record created");

        let args = vec![
            codec::address(&req.funder.0),
            codec::address(&req.manager.0),
            codec::address(&req.supervisor.0),
            codec::address(&req.researcher.0),
            codec::encode_string(req.name.as_str())?,
            codec::encode_amount(req.total_amount.value())?,
            ScVal::U32(req.total_milestones),
        ];
        let built = self.build_write(&req.funder.0, "create_grant", args).await?;

        self.store.save_pending_creation(&PendingCreation {
            local_id: record.id,
            funder: req.funder.to_string(),
            manager: req.manager.to_string(),
            supervisor: req.supervisor.to_string(),
            researcher: req.researcher.to_string(),
            name: req.name.as_str().to_string(),
            total_amount: req.total_amount.value(),
            total_milestones: req.total_milestones,
            tx_hash: built.hash_hex(),
        })?;

        tracing::info!(
            local_id = record.id,
            tx_hash = %built.hash_hex(),
            "Create-grant envelope ready for signing"
        );

        Ok(CreateGrantResponse {
            database_id: record.id,
            tx_hash: built.hash_hex(),
            transaction: built.xdr,
        })
    }

    fn off_chain_view(&self, record: GrantRecord) -> CoordinatorResult<OffChainGrant> {
        Ok(OffChainGrant {
            id: record.id,
            on_chain_id: record.on_chain_id,
            funder_institution_name: record.institution_name,
            manager: self.registry.get(record.manager_id)?,
            supervisor: self.registry.get(record.supervisor_id)?,
            researcher: self.registry.get(record.researcher_id)?,
        })
    }

    fn linked_record(&self, grant_id: GrantId) -> CoordinatorResult<GrantRecord> {
        self.store
            .find_grant_by_on_chain_id(grant_id.0)?
            .ok_or_else(|| {
                CoordinatorError::NotFound(format!("Off-chain grant data not found for grant {}", grant_id))
            })
    }

    /// On-chain grant state next to its off-chain record.
    pub async fn get_grant(&self, grant_id: GrantId) -> CoordinatorResult<GrantDetails> {
        let on_chain = self.simulator.get_grant(grant_id.0).await?;
        let record = self.linked_record(grant_id)?;
        tracing::debug!(grant_id = grant_id.0, local_id = record.id, "Grant details resolved");
        Ok(GrantDetails {
            on_chain,
            off_chain: self.off_chain_view(record)?,
        })
    }

    /// Milestone state with approvers labeled by their role in the grant.
    pub async fn get_milestone(
        &self,
        grant_id: GrantId,
        milestone_id: MilestoneId,
    ) -> CoordinatorResult<MilestoneDetails> {
        let grant = self.simulator.get_grant(grant_id.0).await?;
        let milestone = self
            .simulator
            .get_milestone(grant_id.0, milestone_id.0)
            .await?;
        let off_chain = self.off_chain_view(self.linked_record(grant_id)?)?;

        let approvers = milestone
            .approvers
            .iter()
            .map(|address| label_approver(address, &grant, &off_chain))
            .collect();

        Ok(MilestoneDetails {
            name: milestone.name,
            description: milestone.description,
            status: milestone.status,
            paid: milestone.paid,
            approvers,
            participants: ParticipantsView {
                manager: holder(grant.manager, &off_chain.manager),
                supervisor: holder(grant.supervisor, &off_chain.supervisor),
                researcher: holder(grant.researcher, &off_chain.researcher),
            },
        })
    }

    pub async fn build_register_milestone(
        &self,
        req: RegisterMilestoneRequest,
    ) -> CoordinatorResult<TransactionResponse> {
        let args = vec![
            codec::address(&req.manager.0),
            ScVal::U64(req.grant_id.0),
            codec::encode_string(req.name.as_str())?,
            codec::encode_string(req.description.as_str())?,
        ];
        let built = self
            .build_write(&req.manager.0, "register_milestone", args)
            .await?;
        Ok(TransactionResponse {
            transaction: built.xdr,
        })
    }

    pub async fn build_approve_milestone(
        &self,
        req: ApproveMilestoneRequest,
    ) -> CoordinatorResult<TransactionResponse> {
        let args = vec![
            codec::address(&req.signer.0),
            ScVal::U64(req.grant_id.0),
            ScVal::U32(req.milestone_id.0),
        ];
        let built = self
            .build_write(&req.signer.0, "approve_milestone", args)
            .await?;
        Ok(TransactionResponse {
            transaction: built.xdr,
        })
    }

    pub async fn build_claim_payment(
        &self,
        req: ClaimPaymentRequest,
    ) -> CoordinatorResult<TransactionResponse> {
        let args = vec![
            codec::address(&req.claimer.0),
            ScVal::U64(req.grant_id.0),
            ScVal::U32(req.milestone_id.0),
        ];
        let built = self
            .build_write(&req.claimer.0, "claim_payment", args)
            .await?;
        Ok(TransactionResponse {
            transaction: built.xdr,
        })
    }

    /// Attach the on-chain id reported for a signed `create_grant` to its local record.
    ///
    /// `tx_hash`, when given, must be the hash returned with the envelope.
    pub async fn confirm_grant(
        &self,
        local_id: i64,
        on_chain_id: GrantId,
        tx_hash: Option<&str>,
    ) -> CoordinatorResult<ConfirmGrantResponse> {
        let record = self
            .store
            .find_grant_by_local_id(local_id)?
            .ok_or_else(|| CoordinatorError::NotFound(format!("Grant record {} not found", local_id)))?;

        match record.on_chain_id {
            Some(existing) if existing == on_chain_id.0 => {
                tracing::debug!(local_id, grant_id = existing, "Grant already confirmed");
                return Ok(ConfirmGrantResponse {
                    local_id,
                    on_chain_id: existing,
                    tx_hash: None,
                });
            }
            Some(existing) => {
                return Err(CoordinatorError::Validation(format!(
                    "Grant record {} is already linked to on-chain grant {}",
                    local_id, existing
                )))
            }
            None => {}
        }

        let pending = self.store.find_pending_creation(local_id)?.ok_or_else(|| {
            CoordinatorError::NotFound(format!("No pending creation for grant record {}", local_id))
        })?;

        if let Some(claimed) = tx_hash {
            if !claimed.trim().eq_ignore_ascii_case(&pending.tx_hash) {
                tracing::warn!(
                    local_id,
                    tx_hash = %pending.tx_hash,
                    claimed = %claimed,
                    "Confirmation names a different transaction"
                );
                return Err(CoordinatorError::Validation(format!(
                    "Transaction {} was not issued for grant record {}",
                    claimed, local_id
                )));
            }
        }

        let on_chain = self.simulator.get_grant(on_chain_id.0).await?;
        let mismatched = mismatched_fields(&pending, &on_chain);
        if !mismatched.is_empty() {
            tracing::warn!(
                local_id,
                grant_id = on_chain_id.0,
                tx_hash = %pending.tx_hash,
                fields = ?mismatched,
                "On-chain grant does not match pending creation"
            );
            return Err(CoordinatorError::Validation(format!(
                "On-chain grant {} does not match grant record {}: {} differ",
                on_chain_id,
                local_id,
                mismatched.join(", ")
            )));
        }

        // The record may have been linked while the simulation was in flight
        match self.store.link_on_chain_id(local_id, on_chain_id.0) {
            Ok(()) => {}
            Err(e @ StoreError::Duplicate { .. }) => {
                tracing::warn!(local_id, grant_id = on_chain_id.0, error = %e, "Grant link rejected");
                return Err(CoordinatorError::Validation(format!(
                    "Cannot link grant record {} to on-chain grant {}: {}",
                    local_id, on_chain_id, e
                )));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            local_id,
            grant_id = on_chain_id.0,
            tx_hash = %pending.tx_hash,
            "Grant confirmed"
        );
        Ok(ConfirmGrantResponse {
            local_id,
            on_chain_id: on_chain_id.0,
            tx_hash: Some(pending.tx_hash),
        })
    }
}

impl std::fmt::Debug for GrantReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantReconciler")
            .field("simulator", &self.simulator)
            .finish_non_exhaustive()
    }
}

fn holder(address: Address, participant: &Participant) -> RoleHolder {
    RoleHolder {
        address,
        name: participant.name.clone(),
    }
}

fn label_approver(address: &Address, grant: &OnChainGrant, off_chain: &OffChainGrant) -> ApproverView {
    let (role, name) = if *address == grant.manager {
        (Role::Manager, Some(off_chain.manager.name.clone()))
    } else if *address == grant.supervisor {
        (Role::Supervisor, Some(off_chain.supervisor.name.clone()))
    } else if *address == grant.researcher {
        (Role::Researcher, Some(off_chain.researcher.name.clone()))
    } else {
        (Role::Unknown, None)
    };
    ApproverView {
        address: *address,
        role,
        name,
    }
}

fn mismatched_fields(pending: &PendingCreation, on_chain: &OnChainGrant) -> Vec<&'static str> {
    let checks = [
        ("funder", pending.funder == on_chain.funder.to_string()),
        ("manager", pending.manager == on_chain.manager.to_string()),
        ("supervisor", pending.supervisor == on_chain.supervisor.to_string()),
        ("researcher", pending.researcher == on_chain.researcher.to_string()),
        ("name", pending.name == on_chain.name),
        ("total_amount", pending.total_amount == on_chain.total_amount),
        ("total_milestones", pending.total_milestones == on_chain.total_milestones),
    ];
    checks
        .iter()
        .filter(|(_, matches)| !matches)
        .map(|(field, _)| *field)
        .collect()
}
