//! Claim catalog: the concrete claim kinds and their fixed layouts.
//!
//! Every kind encodes as `base index || index fields || value fields`.
//! Field semantics (e.g. whether an authorization window is currently
//! open) are a caller concern; the codec only fixes the bytes.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::codec::{ClaimEncoding, FieldReader};
use crate::constants::{
    ASSIGN_NAME_INDEX_LEN, ASSIGN_NAME_LEN, AUTHORIZE_KSIGN_INDEX_LEN, AUTHORIZE_KSIGN_LEN,
    BASE_INDEX_LEN, SET_ROOT_INDEX_LEN, SET_ROOT_LEN, VALID_UNTIL_UNBOUNDED,
};
use crate::error::{CoreError, Result};
use crate::hashing::{claim_type_from_label, keccak256};
use crate::types::{BaseIndex, ClaimKind};

/// Generic namespaced claim.
///
/// `data` is part of the index, `extra_data` is value only. This is the one
/// kind whose width varies; the boundary is carried by `index_length`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericClaim {
    /// Base index header.
    pub base_index: BaseIndex,
    /// Index data block.
    pub data: Bytes,
    /// Value data block.
    pub extra_data: Bytes,
}

impl GenericClaim {
    /// Create a generic claim.
    ///
    /// # Example
    ///
    /// ```
    /// use claimtree_core::{ClaimEncoding, GenericClaim};
    ///
    /// let claim = GenericClaim::new("iden3.io", "default", b"c1", &[]).unwrap();
    /// assert_eq!(claim.index_length(), 66);
    /// ```
    ///
    /// Fails when the index (header plus `data`) does not fit a u32 length.
    pub fn new(
        namespace: &str,
        type_label: &str,
        data: &[u8],
        extra_data: &[u8],
    ) -> Result<Self> {
        Ok(Self {
            base_index: BaseIndex {
                namespace: keccak256(namespace.as_bytes()),
                claim_type: claim_type_from_label(type_label),
                index_length: generic_index_length(data.len())?,
                version: 0,
            },
            data: Bytes::copy_from_slice(data),
            extra_data: Bytes::copy_from_slice(extra_data),
        })
    }

    /// Strict decoder. Accepts any claim-type label.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let base_index = BaseIndex::from_bytes(bytes)?;
        let index_length = base_index.index_length as usize;

        if index_length < BASE_INDEX_LEN || index_length > bytes.len() {
            return Err(CoreError::InvalidEncoding(format!(
                "generic index length {} outside {}..={}",
                index_length,
                BASE_INDEX_LEN,
                bytes.len()
            )));
        }

        Ok(Self {
            base_index,
            data: Bytes::copy_from_slice(&bytes[BASE_INDEX_LEN..index_length]),
            extra_data: Bytes::copy_from_slice(&bytes[index_length..]),
        })
    }
}

/// Index length of a generic claim carrying `data_len` bytes of index data.
fn generic_index_length(data_len: usize) -> Result<u32> {
    BASE_INDEX_LEN
        .checked_add(data_len)
        .and_then(|len| u32::try_from(len).ok())
        .ok_or_else(|| {
            CoreError::InvalidEncoding(format!(
                "generic data of {} bytes exceeds the u32 index length",
                data_len
            ))
        })
}

impl ClaimEncoding for GenericClaim {
    fn base_index(&self) -> &BaseIndex {
        &self.base_index
    }

    fn base_index_mut(&mut self) -> &mut BaseIndex {
        &mut self.base_index
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BASE_INDEX_LEN + self.data.len() + self.extra_data.len());
        self.base_index.write_to(&mut out);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.extra_data);
        out
    }
}

/// Binds the hash of a name within a namespace to an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignNameClaim {
    /// Base index header.
    pub base_index: BaseIndex,
    /// keccak256 of the name.
    pub name_hash: B256,
    /// keccak256 of the name's namespace.
    pub namespace_hash: B256,
    /// Address the name resolves to (value field).
    pub eth_id: Address,
}

impl AssignNameClaim {
    /// Create an assign-name claim from precomputed hashes.
    pub const fn new(name_hash: B256, namespace_hash: B256, eth_id: Address) -> Self {
        Self {
            base_index: BaseIndex::for_kind(ClaimKind::AssignName, ASSIGN_NAME_INDEX_LEN),
            name_hash,
            namespace_hash,
            eth_id,
        }
    }

    /// Create an assign-name claim hashing the name and namespace strings.
    pub fn from_names(name: &str, namespace: &str, eth_id: Address) -> Self {
        Self::new(
            keccak256(name.as_bytes()),
            keccak256(namespace.as_bytes()),
            eth_id,
        )
    }

    /// Strict decoder.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = FieldReader::new(bytes, ClaimKind::AssignName, ASSIGN_NAME_LEN)?;
        let base_index = reader.base_index(ASSIGN_NAME_INDEX_LEN)?;
        let claim = Self {
            base_index,
            name_hash: reader.hash()?,
            namespace_hash: reader.hash()?,
            eth_id: reader.address()?,
        };
        reader.finish()?;
        Ok(claim)
    }
}

impl ClaimEncoding for AssignNameClaim {
    fn base_index(&self) -> &BaseIndex {
        &self.base_index
    }

    fn base_index_mut(&mut self) -> &mut BaseIndex {
        &mut self.base_index
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ASSIGN_NAME_LEN);
        self.base_index.write_to(&mut out);
        out.extend_from_slice(self.name_hash.as_slice());
        out.extend_from_slice(self.namespace_hash.as_slice());
        out.extend_from_slice(self.eth_id.as_slice());
        out
    }
}

/// Authorizes a signing key for an application within a validity window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeKSignClaim {
    /// Base index header.
    pub base_index: BaseIndex,
    /// Address of the authorized signing key.
    pub key_to_authorize: Address,
    /// keccak256 of the application name (zero for operational keys).
    pub application_name: B256,
    /// keccak256 of the application authorization label (zero for operational keys).
    pub application_authz: B256,
    /// Start of validity, unix seconds.
    pub valid_from: u64,
    /// End of validity, unix seconds.
    pub valid_until: u64,
}

impl AuthorizeKSignClaim {
    /// Create an authorization for an application.
    pub fn new(
        key_to_authorize: Address,
        application_name: &str,
        application_authz: &str,
        valid_from: u64,
        valid_until: u64,
    ) -> Self {
        Self {
            base_index: BaseIndex::for_kind(ClaimKind::AuthorizeKSign, AUTHORIZE_KSIGN_INDEX_LEN),
            key_to_authorize,
            application_name: keccak256(application_name.as_bytes()),
            application_authz: keccak256(application_authz.as_bytes()),
            valid_from,
            valid_until,
        }
    }

    /// Create an operational key authorization, valid until explicitly revoked.
    pub const fn new_operational(key_to_authorize: Address) -> Self {
        Self {
            base_index: BaseIndex::for_kind(ClaimKind::AuthorizeKSign, AUTHORIZE_KSIGN_INDEX_LEN),
            key_to_authorize,
            application_name: B256::ZERO,
            application_authz: B256::ZERO,
            valid_from: 0,
            valid_until: VALID_UNTIL_UNBOUNDED,
        }
    }

    /// Whether this authorization has no expiry.
    pub const fn is_operational(&self) -> bool {
        self.valid_until == VALID_UNTIL_UNBOUNDED
    }

    /// Whether `timestamp` falls inside the validity window (inclusive).
    pub const fn is_valid_at(&self, timestamp: u64) -> bool {
        self.valid_from <= timestamp && timestamp <= self.valid_until
    }

    /// Strict decoder.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader =
            FieldReader::new(bytes, ClaimKind::AuthorizeKSign, AUTHORIZE_KSIGN_LEN)?;
        let base_index = reader.base_index(AUTHORIZE_KSIGN_INDEX_LEN)?;
        let claim = Self {
            base_index,
            key_to_authorize: reader.address()?,
            application_name: reader.hash()?,
            application_authz: reader.hash()?,
            valid_from: reader.u64()?,
            valid_until: reader.u64()?,
        };
        reader.finish()?;
        Ok(claim)
    }
}

impl ClaimEncoding for AuthorizeKSignClaim {
    fn base_index(&self) -> &BaseIndex {
        &self.base_index
    }

    fn base_index_mut(&mut self) -> &mut BaseIndex {
        &mut self.base_index
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(AUTHORIZE_KSIGN_LEN);
        self.base_index.write_to(&mut out);
        out.extend_from_slice(self.key_to_authorize.as_slice());
        out.extend_from_slice(self.application_name.as_slice());
        out.extend_from_slice(self.application_authz.as_slice());
        out.extend_from_slice(&self.valid_from.to_be_bytes());
        out.extend_from_slice(&self.valid_until.to_be_bytes());
        out
    }
}

/// Publishes the root of an identity's tree into another tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRootClaim {
    /// Base index header.
    pub base_index: BaseIndex,
    /// Address of the identity publishing its root.
    pub eth_id: Address,
    /// The published root.
    pub root: B256,
}

impl SetRootClaim {
    /// Create a set-root claim.
    pub const fn new(eth_id: Address, root: B256) -> Self {
        Self {
            base_index: BaseIndex::for_kind(ClaimKind::SetRoot, SET_ROOT_INDEX_LEN),
            eth_id,
            root,
        }
    }

    /// Strict decoder.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = FieldReader::new(bytes, ClaimKind::SetRoot, SET_ROOT_LEN)?;
        let base_index = reader.base_index(SET_ROOT_INDEX_LEN)?;
        let claim = Self {
            base_index,
            eth_id: reader.address()?,
            root: reader.hash()?,
        };
        reader.finish()?;
        Ok(claim)
    }
}

impl ClaimEncoding for SetRootClaim {
    fn base_index(&self) -> &BaseIndex {
        &self.base_index
    }

    fn base_index_mut(&mut self) -> &mut BaseIndex {
        &mut self.base_index
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SET_ROOT_LEN);
        self.base_index.write_to(&mut out);
        out.extend_from_slice(self.eth_id.as_slice());
        out.extend_from_slice(self.root.as_slice());
        out
    }
}
