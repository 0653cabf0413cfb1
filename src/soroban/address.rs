//! Account and contract addresses.
//!
//! Text form is the Stellar strkey (`G…` accounts, `C…` contracts). Other
//! strkey kinds (muxed accounts, seeds, pre-auth hashes) are rejected.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use stellar_strkey::{ed25519, Contract, Strkey};
use stellar_xdr::curr as xdr;

use crate::soroban::types::CodecError;

/// Address of a grant participant or of the contract itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// Ed25519 account public key.
    Account(ed25519::PublicKey),
    /// Contract id hash.
    Contract(Contract),
}

impl Address {
    /// Raw 32-byte key or hash.
    pub fn key_bytes(&self) -> &[u8; 32] {
        match self {
            Address::Account(ed25519::PublicKey(k)) | Address::Contract(Contract(k)) => k,
        }
    }

    pub fn is_account(&self) -> bool {
        matches!(self, Address::Account(_))
    }

    pub fn to_sc_address(&self) -> xdr::ScAddress {
        match self {
            Address::Account(key) => xdr::ScAddress::Account(account_id(key)),
            Address::Contract(Contract(hash)) => xdr::ScAddress::Contract(xdr::Hash(*hash)),
        }
    }

    /// Ledger account id; contracts have none.
    pub fn to_account_id(&self) -> Option<xdr::AccountId> {
        match self {
            Address::Account(key) => Some(account_id(key)),
            Address::Contract(_) => None,
        }
    }
}

fn account_id(key: &ed25519::PublicKey) -> xdr::AccountId {
    xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(key.0)))
}

impl From<&xdr::ScAddress> for Address {
    fn from(address: &xdr::ScAddress) -> Self {
        match address {
            xdr::ScAddress::Account(id) => Address::from(id),
            xdr::ScAddress::Contract(xdr::Hash(hash)) => Address::Contract(Contract(*hash)),
        }
    }
}

impl From<&xdr::AccountId> for Address {
    fn from(id: &xdr::AccountId) -> Self {
        let xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(key))) = id;
        Address::Account(ed25519::PublicKey(*key))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Account(key) => f.write_str(&key.to_string()),
            Address::Contract(contract) => f.write_str(&contract.to_string()),
        }
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| CodecError::InvalidAddress {
            input: s.to_string(),
            reason,
        };
        match Strkey::from_string(s).map_err(|_| invalid("not a valid strkey"))? {
            Strkey::PublicKeyEd25519(key) => Ok(Address::Account(key)),
            Strkey::Contract(contract) => Ok(Address::Contract(contract)),
            _ => Err(invalid("expected a G account or C contract address")),
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
