//! Core types shared by every claim kind.

use alloy_primitives::{FixedBytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    BASE_INDEX_LEN, CLAIM_LABEL_ASSIGN_NAME, CLAIM_LABEL_AUTHORIZE_KSIGN, CLAIM_LABEL_DEFAULT,
    CLAIM_LABEL_SET_ROOT, CLAIM_TYPE_ASSIGN_NAME, CLAIM_TYPE_AUTHORIZE_KSIGN, CLAIM_TYPE_DEFAULT,
    CLAIM_TYPE_LEN, CLAIM_TYPE_SET_ROOT, DEFAULT_NAMESPACE_HASH, NAMESPACE_LEN,
};
use crate::error::{CoreError, Result};

// Re-export Alloy types for convenience
pub use alloy_primitives::Address as EthAddress;
pub use alloy_primitives::B256 as Hash;

/// 24-byte claim-type discriminant.
pub type ClaimType = FixedBytes<CLAIM_TYPE_LEN>;

/// The closed set of claim kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimKind {
    /// Namespaced generic assertion with free-form data.
    #[serde(rename = "default")]
    Generic,
    /// Binding of a name to an address.
    AssignName,
    /// Authorization of a signing key.
    AuthorizeKSign,
    /// Publication of another tree's root.
    SetRoot,
}

impl ClaimKind {
    /// All kinds, in discriminant-table order.
    pub const ALL: [ClaimKind; 4] = [
        ClaimKind::Generic,
        ClaimKind::AssignName,
        ClaimKind::AuthorizeKSign,
        ClaimKind::SetRoot,
    ];

    /// The type label hashed into the discriminant.
    pub const fn label(&self) -> &'static str {
        match self {
            ClaimKind::Generic => CLAIM_LABEL_DEFAULT,
            ClaimKind::AssignName => CLAIM_LABEL_ASSIGN_NAME,
            ClaimKind::AuthorizeKSign => CLAIM_LABEL_AUTHORIZE_KSIGN,
            ClaimKind::SetRoot => CLAIM_LABEL_SET_ROOT,
        }
    }

    /// The 24-byte discriminant written in the base index.
    pub const fn claim_type(&self) -> ClaimType {
        match self {
            ClaimKind::Generic => CLAIM_TYPE_DEFAULT,
            ClaimKind::AssignName => CLAIM_TYPE_ASSIGN_NAME,
            ClaimKind::AuthorizeKSign => CLAIM_TYPE_AUTHORIZE_KSIGN,
            ClaimKind::SetRoot => CLAIM_TYPE_SET_ROOT,
        }
    }

    /// Look up the kind of a discriminant.
    pub fn from_claim_type(claim_type: &ClaimType) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.claim_type() == *claim_type)
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Header embedded at the start of every claim.
///
/// `index_length` counts bytes of the encoding that belong to the index
/// (including this header); `version` is hashed into the index so bumping
/// it relocates the claim to a new tree coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseIndex {
    /// keccak256 of the namespace string.
    pub namespace: B256,
    /// Claim-type discriminant.
    pub claim_type: ClaimType,
    /// Length in bytes of the index prefix of the encoding.
    pub index_length: u32,
    /// Claim version.
    pub version: u32,
}

impl BaseIndex {
    /// Base index in the default namespace for one of the catalog kinds.
    pub const fn for_kind(kind: ClaimKind, index_length: u32) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE_HASH,
            claim_type: kind.claim_type(),
            index_length,
            version: 0,
        }
    }

    /// Append the 64-byte header to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.namespace.as_slice());
        out.extend_from_slice(self.claim_type.as_slice());
        out.extend_from_slice(&self.index_length.to_be_bytes());
        out.extend_from_slice(&self.version.to_be_bytes());
    }

    /// Parse the header from the front of a claim encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < BASE_INDEX_LEN {
            return Err(CoreError::InvalidEncoding(format!(
                "claim shorter than base index: {} < {}",
                bytes.len(),
                BASE_INDEX_LEN
            )));
        }

        let type_start = NAMESPACE_LEN;
        let length_start = type_start + CLAIM_TYPE_LEN;
        let version_start = length_start + 4;

        Ok(Self {
            namespace: B256::from_slice(&bytes[..type_start]),
            claim_type: ClaimType::from_slice(&bytes[type_start..length_start]),
            index_length: read_u32(&bytes[length_start..version_start]),
            version: read_u32(&bytes[version_start..BASE_INDEX_LEN]),
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminants_round_trip() {
        for kind in ClaimKind::ALL {
            assert_eq!(ClaimKind::from_claim_type(&kind.claim_type()), Some(kind));
        }
        assert_eq!(ClaimKind::from_claim_type(&ClaimType::ZERO), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ClaimKind::AuthorizeKSign.to_string(), "authorizeksign");
        assert_eq!(ClaimKind::Generic.to_string(), "default");
    }

    #[test]
    fn test_base_index_layout() {
        let base = BaseIndex {
            namespace: DEFAULT_NAMESPACE_HASH,
            claim_type: CLAIM_TYPE_SET_ROOT,
            index_length: 84,
            version: 7,
        };
        let mut out = Vec::new();
        base.write_to(&mut out);

        assert_eq!(out.len(), BASE_INDEX_LEN);
        assert_eq!(&out[56..60], &[0, 0, 0, 84]);
        assert_eq!(&out[60..64], &[0, 0, 0, 7]);
        assert_eq!(BaseIndex::from_bytes(&out).unwrap(), base);
    }

    #[test]
    fn test_base_index_too_short() {
        let result = BaseIndex::from_bytes(&[0u8; 63]);
        assert!(matches!(result, Err(CoreError::InvalidEncoding(_))));
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ClaimKind::AssignName).unwrap();
        assert_eq!(json, "\"assignname\"");
        let kind: ClaimKind = serde_json::from_str("\"setroot\"").unwrap();
        assert_eq!(kind, ClaimKind::SetRoot);
    }
}
