//! Request and response records for coordinator operations.
//!
//! Request fields are typed to their semantic kind so malformed input is
//! rejected during deserialization, before any store or RPC work.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::grants::error::CoordinatorError;
use crate::soroban::codec::{self, MilestoneStatus, OnChainGrant};
use crate::soroban::Address;
use crate::store::Participant;

/// G… account or C… contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StellarAddress(pub Address);

impl FromStr for StellarAddress {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Address>()
            .map(StellarAddress)
            .map_err(|e| CoordinatorError::Validation(e.to_string()))
    }
}

impl fmt::Display for StellarAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Non-negative token amount in stroops, carried as decimal text on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Amount(i128);

impl Amount {
    pub fn value(&self) -> i128 {
        self.0
    }
}

impl TryFrom<String> for Amount {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        codec::parse_amount(&value)
            .map(Amount)
            .map_err(|e| e.to_string())
    }
}

/// Either JSON form an id may arrive in.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum TextOrNumber {
    Number(u64),
    Text(String),
}

/// On-chain grant id (`u64`), accepted as a JSON number or decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TextOrNumber")]
pub struct GrantId(pub u64);

impl TryFrom<TextOrNumber> for GrantId {
    type Error = String;

    fn try_from(value: TextOrNumber) -> Result<Self, Self::Error> {
        match value {
            TextOrNumber::Number(n) => Ok(GrantId(n)),
            TextOrNumber::Text(s) => s.parse::<GrantId>().map_err(|e| e.to_string()),
        }
    }
}

impl FromStr for GrantId {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::parse_u64(s)
            .map(GrantId)
            .map_err(|e| CoordinatorError::Validation(format!("Invalid grant id: {}", e)))
    }
}

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Milestone index (`u32`), accepted as a JSON number or decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TextOrNumber")]
pub struct MilestoneId(pub u32);

impl TryFrom<TextOrNumber> for MilestoneId {
    type Error = String;

    fn try_from(value: TextOrNumber) -> Result<Self, Self::Error> {
        match value {
            TextOrNumber::Number(n) => u32::try_from(n)
                .map(MilestoneId)
                .map_err(|_| format!("Invalid milestone id: {} exceeds u32", n)),
            TextOrNumber::Text(s) => s.parse::<MilestoneId>().map_err(|e| e.to_string()),
        }
    }
}

impl FromStr for MilestoneId {
    type Err = CoordinatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::parse_u32(s)
            .map(MilestoneId)
            .map_err(|e| CoordinatorError::Validation(format!("Invalid milestone id: {}", e)))
    }
}

/// Participant email, compared by exact equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Email(String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !value.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Email(value))
        } else {
            Err(format!("Invalid email address '{}'", value))
        }
    }
}

/// Text that must contain at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            Err("value must not be empty".to_string())
        } else {
            Ok(NonEmptyText(value))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrantRequest {
    pub funder: StellarAddress,
    pub manager: StellarAddress,
    pub supervisor: StellarAddress,
    pub researcher: StellarAddress,
    pub name: NonEmptyText,
    #[serde(rename = "total_amount")]
    pub total_amount: Amount,
    #[serde(rename = "total_milestones")]
    pub total_milestones: u32,
    pub funder_institution_name: NonEmptyText,
    pub manager_name: NonEmptyText,
    pub manager_email: Email,
    pub supervisor_name: NonEmptyText,
    pub supervisor_email: Email,
    pub researcher_name: NonEmptyText,
    pub researcher_email: Email,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterMilestoneRequest {
    pub manager: StellarAddress,
    pub grant_id: GrantId,
    pub name: NonEmptyText,
    pub description: NonEmptyText,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveMilestoneRequest {
    pub signer: StellarAddress,
    pub grant_id: GrantId,
    pub milestone_id: MilestoneId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimPaymentRequest {
    pub claimer: StellarAddress,
    pub grant_id: GrantId,
    pub milestone_id: MilestoneId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmGrantRequest {
    pub on_chain_id: GrantId,
    /// Hash from the create-grant response; must match the issued envelope.
    #[serde(default)]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrantResponse {
    pub database_id: i64,
    pub transaction: String,
    pub tx_hash: String,
}

/// Unsigned envelope for an external signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionResponse {
    pub transaction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmGrantResponse {
    pub local_id: i64,
    pub on_chain_id: u64,
    /// Hash of the creation envelope; absent on a repeated confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Grant record with its participants resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OffChainGrant {
    pub id: i64,
    pub on_chain_id: Option<u64>,
    pub funder_institution_name: String,
    pub manager: Participant,
    pub supervisor: Participant,
    pub researcher: Participant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantDetails {
    pub on_chain: OnChainGrant,
    pub off_chain: OffChainGrant,
}

/// Role of an address relative to one grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Manager,
    Supervisor,
    Researcher,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApproverView {
    pub address: Address,
    pub role: Role,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleHolder {
    pub address: Address,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantsView {
    pub manager: RoleHolder,
    pub supervisor: RoleHolder,
    pub researcher: RoleHolder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneDetails {
    pub name: String,
    pub description: String,
    pub status: MilestoneStatus,
    pub paid: bool,
    pub approvers: Vec<ApproverView>,
    pub participants: ParticipantsView,
}
