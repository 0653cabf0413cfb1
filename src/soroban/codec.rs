//! Conversion between native grant values and contract values.
//!
//! # Responsibilities
//! - Encode request-level text (addresses, names, amounts, ids) into `ScVal`
//! - Decode `get_grant` / `get_milestone` return values into typed records
//!
//! # Design Decisions
//! - Amounts travel as base-10 text and are encoded as `I128` parts to
//!   match the contract's `i128` fields; negative input is rejected
//! - Records decode strictly: map keys must appear exactly in the
//!   contract's field order with no extras

use serde::Serialize;
use stellar_xdr::curr::{
    Int128Parts, Limits, ReadXdr, ScMapEntry, ScString, ScSymbol, ScVal, StringM,
};

use crate::soroban::address::Address;
use crate::soroban::types::{CodecError, CodecResult};

/// Maximum byte length of an `SCSymbol`.
pub const SC_SYMBOL_MAX_LEN: usize = 32;

/// Reader depth bound for values received from the node. Each XDR type
/// along the path counts, so a nested record uses several levels.
pub const MAX_DECODE_DEPTH: u32 = 128;

/// Limits for decoding untrusted XDR.
pub fn decode_limits() -> Limits {
    Limits::depth(MAX_DECODE_DEPTH)
}

/// Decode a base64 contract value.
pub fn decode_value(encoded: &str) -> CodecResult<ScVal> {
    Ok(ScVal::from_xdr_base64(encoded.trim(), decode_limits())?)
}

/// Contract function or field name, checked for length and character set.
pub fn symbol(name: &str) -> CodecResult<ScSymbol> {
    if name.len() > SC_SYMBOL_MAX_LEN {
        return Err(CodecError::LengthExceeded {
            what: "symbol",
            len: name.len(),
            max: SC_SYMBOL_MAX_LEN,
        });
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(CodecError::InvalidSymbol(name.to_string()));
    }
    Ok(ScSymbol(StringM::try_from(name)?))
}

pub fn address(address: &Address) -> ScVal {
    ScVal::Address(address.to_sc_address())
}

/// Encode strkey text as an address value.
pub fn encode_address(input: &str) -> CodecResult<ScVal> {
    Ok(address(&input.parse()?))
}

/// Encode text as a contract string value.
pub fn encode_string(input: &str) -> CodecResult<ScVal> {
    Ok(ScVal::String(ScString(StringM::try_from(input)?)))
}

/// Parse a non-negative base-10 amount that fits the contract's `i128`.
pub fn parse_amount(input: &str) -> CodecResult<i128> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidAmount(input.to_string()));
    }
    let value: u128 = input
        .parse()
        .map_err(|_| CodecError::InvalidAmount(input.to_string()))?;
    i128::try_from(value).map_err(|_| CodecError::InvalidAmount(input.to_string()))
}

/// Encode a non-negative amount as `I128` high/low parts.
pub fn encode_amount(value: i128) -> CodecResult<ScVal> {
    if value < 0 {
        return Err(CodecError::InvalidAmount(value.to_string()));
    }
    Ok(ScVal::I128(Int128Parts {
        hi: (value >> 64) as i64,
        lo: value as u64,
    }))
}

/// Parse and encode amount text in one step.
pub fn encode_amount_str(input: &str) -> CodecResult<ScVal> {
    encode_amount(parse_amount(input)?)
}

fn parse_unsigned<T: std::str::FromStr>(input: &str, kind: &'static str) -> CodecResult<T> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidInteger {
            input: input.to_string(),
            kind,
        });
    }
    // Digits-only text can only fail to parse by overflowing
    input.parse().map_err(|_| CodecError::IntegerOutOfRange {
        input: input.to_string(),
        kind,
    })
}

pub fn parse_u32(input: &str) -> CodecResult<u32> {
    parse_unsigned(input, "u32")
}

pub fn parse_u64(input: &str) -> CodecResult<u64> {
    parse_unsigned(input, "u64")
}

/// Milestone lifecycle state as stored by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MilestoneStatus {
    Pending,
    Approved,
    Rejected,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "Pending",
            MilestoneStatus::Approved => "Approved",
            MilestoneStatus::Rejected => "Rejected",
        }
    }

    /// Approved and Rejected are final for a milestone.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MilestoneStatus::Pending)
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grant state returned by `get_grant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnChainGrant {
    #[serde(with = "amount_string")]
    pub claimed_amount: i128,
    pub creation_timestamp: u64,
    pub funder: Address,
    pub manager: Address,
    pub name: String,
    pub registered_milestones: u32,
    pub researcher: Address,
    pub supervisor: Address,
    #[serde(with = "amount_string")]
    pub total_amount: i128,
    pub total_milestones: u32,
}

/// Milestone state returned by `get_milestone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnChainMilestone {
    pub approvers: Vec<Address>,
    pub description: String,
    pub name: String,
    pub paid: bool,
    pub status: MilestoneStatus,
}

/// Types reconstructed from a contract value.
pub trait FromScVal: Sized {
    fn from_scval(value: &ScVal) -> CodecResult<Self>;
}

impl FromScVal for MilestoneStatus {
    fn from_scval(value: &ScVal) -> CodecResult<Self> {
        let name = match as_vec(value)? {
            [ScVal::Symbol(name)] => name.to_utf8_string_lossy(),
            [other] => return Err(mismatch("symbol", other)),
            _ => {
                return Err(CodecError::TypeMismatch {
                    expected: "single-symbol vec",
                    found: "Vec",
                })
            }
        };
        match name.as_str() {
            "Pending" => Ok(MilestoneStatus::Pending),
            "Approved" => Ok(MilestoneStatus::Approved),
            "Rejected" => Ok(MilestoneStatus::Rejected),
            _ => Err(CodecError::UnknownVariant {
                enum_name: "MilestoneStatus",
                variant: name,
            }),
        }
    }
}

impl FromScVal for OnChainGrant {
    fn from_scval(value: &ScVal) -> CodecResult<Self> {
        let mut fields = RecordFields::new(value)?;
        let grant = OnChainGrant {
            claimed_amount: as_i128(fields.next("claimed_amount")?)?,
            creation_timestamp: as_u64(fields.next("creation_timestamp")?)?,
            funder: as_address(fields.next("funder")?)?,
            manager: as_address(fields.next("manager")?)?,
            name: as_string(fields.next("name")?)?,
            registered_milestones: as_u32(fields.next("registered_milestones")?)?,
            researcher: as_address(fields.next("researcher")?)?,
            supervisor: as_address(fields.next("supervisor")?)?,
            total_amount: as_i128(fields.next("total_amount")?)?,
            total_milestones: as_u32(fields.next("total_milestones")?)?,
        };
        fields.finish()?;
        Ok(grant)
    }
}

impl FromScVal for OnChainMilestone {
    fn from_scval(value: &ScVal) -> CodecResult<Self> {
        let mut fields = RecordFields::new(value)?;
        let milestone = OnChainMilestone {
            approvers: as_vec(fields.next("approvers")?)?
                .iter()
                .map(as_address)
                .collect::<CodecResult<_>>()?,
            description: as_string(fields.next("description")?)?,
            name: as_string(fields.next("name")?)?,
            paid: as_bool(fields.next("paid")?)?,
            status: MilestoneStatus::from_scval(fields.next("status")?)?,
        };
        fields.finish()?;
        Ok(milestone)
    }
}

/// Walks a record map in declared field order.
struct RecordFields<'a> {
    entries: std::slice::Iter<'a, ScMapEntry>,
    position: usize,
}

impl<'a> RecordFields<'a> {
    fn new(value: &'a ScVal) -> CodecResult<Self> {
        let entries: &'a [ScMapEntry] = match value {
            ScVal::Map(Some(map)) => map.as_slice(),
            // An absent map pointer decodes as empty
            ScVal::Map(None) => &[],
            other => return Err(mismatch("map", other)),
        };
        Ok(Self {
            entries: entries.iter(),
            position: 0,
        })
    }

    fn next(&mut self, expected: &'static str) -> CodecResult<&'a ScVal> {
        let position = self.position;
        self.position += 1;
        match self.entries.next() {
            Some(ScMapEntry {
                key: ScVal::Symbol(name),
                val,
            }) if name.as_slice() == expected.as_bytes() => Ok(val),
            Some(entry) => Err(CodecError::FieldMismatch {
                expected,
                position,
                found: Some(describe_key(&entry.key)),
            }),
            None => Err(CodecError::FieldMismatch {
                expected,
                position,
                found: None,
            }),
        }
    }

    fn finish(mut self) -> CodecResult<()> {
        match self.entries.next() {
            None => Ok(()),
            Some(entry) => Err(CodecError::FieldMismatch {
                expected: "end of record",
                position: self.position,
                found: Some(describe_key(&entry.key)),
            }),
        }
    }
}

fn describe_key(key: &ScVal) -> String {
    match key {
        ScVal::Symbol(name) => name.to_utf8_string_lossy(),
        other => other.name().to_string(),
    }
}

fn mismatch(expected: &'static str, found: &ScVal) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        found: found.name(),
    }
}

fn as_address(value: &ScVal) -> CodecResult<Address> {
    match value {
        ScVal::Address(addr) => Ok(Address::from(addr)),
        other => Err(mismatch("address", other)),
    }
}

fn as_string(value: &ScVal) -> CodecResult<String> {
    match value {
        ScVal::String(s) => Ok(s.to_utf8_string()?),
        other => Err(mismatch("string", other)),
    }
}

fn as_bool(value: &ScVal) -> CodecResult<bool> {
    match value {
        ScVal::Bool(b) => Ok(*b),
        other => Err(mismatch("bool", other)),
    }
}

fn as_u32(value: &ScVal) -> CodecResult<u32> {
    match value {
        ScVal::U32(v) => Ok(*v),
        other => Err(mismatch("u32", other)),
    }
}

fn as_u64(value: &ScVal) -> CodecResult<u64> {
    match value {
        ScVal::U64(v) => Ok(*v),
        other => Err(mismatch("u64", other)),
    }
}

fn as_i128(value: &ScVal) -> CodecResult<i128> {
    match value {
        ScVal::I128(Int128Parts { hi, lo }) => Ok(((*hi as i128) << 64) | *lo as i128),
        other => Err(mismatch("i128", other)),
    }
}

fn as_vec(value: &ScVal) -> CodecResult<&[ScVal]> {
    match value {
        ScVal::Vec(Some(items)) => Ok(items.as_slice()),
        // An absent vector pointer decodes as empty
        ScVal::Vec(None) => Ok(&[]),
        other => Err(mismatch("vec", other)),
    }
}

/// Serialize 128-bit amounts as decimal strings so JSON clients keep precision.
pub mod amount_string {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }
}
