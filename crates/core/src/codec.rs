//! Claim codec: byte encoding, kind detection and the index/total hashes.

use alloy_primitives::{hex, Address, B256};
use serde::{Deserialize, Serialize};

use crate::catalog::{AssignNameClaim, AuthorizeKSignClaim, GenericClaim, SetRootClaim};
use crate::constants::{ADDRESS_LEN, BASE_INDEX_LEN, HASH_LEN, TIMESTAMP_LEN};
use crate::error::{CoreError, Result};
use crate::hashing::keccak256;
use crate::types::{BaseIndex, ClaimKind};

/// Byte encoding shared by every claim.
///
/// Implementors provide the base index and the full encoding; the index
/// hash `hi`, total hash `ht` and version accessors derive from those.
pub trait ClaimEncoding {
    /// Base index header.
    fn base_index(&self) -> &BaseIndex;

    /// Mutable base index header.
    fn base_index_mut(&mut self) -> &mut BaseIndex;

    /// Full canonical encoding.
    fn to_bytes(&self) -> Vec<u8>;

    /// Number of leading bytes of the encoding that form the index.
    fn index_length(&self) -> u32 {
        self.base_index().index_length
    }

    /// Claim version.
    fn version(&self) -> u32 {
        self.base_index().version
    }

    /// Overwrite the claim version.
    fn set_version(&mut self, version: u32) {
        self.base_index_mut().version = version;
    }

    /// Index hash: keccak256 of the index prefix. Determines the tree position.
    fn hi(&self) -> B256 {
        let bytes = self.to_bytes();
        let end = (self.index_length() as usize).min(bytes.len());
        keccak256(&bytes[..end])
    }

    /// Total hash: keccak256 of the full encoding. Stored at the leaf.
    fn ht(&self) -> B256 {
        keccak256(&self.to_bytes())
    }
}

/// Any claim of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Claim {
    /// Generic claim.
    #[serde(rename = "default")]
    Generic(GenericClaim),
    /// Assign-name claim.
    AssignName(AssignNameClaim),
    /// Authorize-ksign claim.
    AuthorizeKSign(AuthorizeKSignClaim),
    /// Set-root claim.
    SetRoot(SetRootClaim),
}

impl Claim {
    /// Decode a claim, dispatching on its claim-type discriminant.
    ///
    /// Generic claims with labels other than `default` are not recognised
    /// here; decode them with [`GenericClaim::from_bytes`].
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let claim = match parse_kind(bytes)? {
            ClaimKind::Generic => Claim::Generic(GenericClaim::from_bytes(bytes)?),
            ClaimKind::AssignName => Claim::AssignName(AssignNameClaim::from_bytes(bytes)?),
            ClaimKind::AuthorizeKSign => {
                Claim::AuthorizeKSign(AuthorizeKSignClaim::from_bytes(bytes)?)
            }
            ClaimKind::SetRoot => Claim::SetRoot(SetRootClaim::from_bytes(bytes)?),
        };
        Ok(claim)
    }

    /// Decode a claim from a hex string (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| CoreError::InvalidHex)?;
        Self::parse(&bytes)
    }

    /// Hex encoding with `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode_prefixed(self.to_bytes())
    }

    /// Kind of this claim.
    pub const fn kind(&self) -> ClaimKind {
        match self {
            Claim::Generic(_) => ClaimKind::Generic,
            Claim::AssignName(_) => ClaimKind::AssignName,
            Claim::AuthorizeKSign(_) => ClaimKind::AuthorizeKSign,
            Claim::SetRoot(_) => ClaimKind::SetRoot,
        }
    }

    /// Copy of this claim at `version`.
    pub fn with_version(mut self, version: u32) -> Self {
        self.set_version(version);
        self
    }
}

impl ClaimEncoding for Claim {
    fn base_index(&self) -> &BaseIndex {
        match self {
            Claim::Generic(c) => c.base_index(),
            Claim::AssignName(c) => c.base_index(),
            Claim::AuthorizeKSign(c) => c.base_index(),
            Claim::SetRoot(c) => c.base_index(),
        }
    }

    fn base_index_mut(&mut self) -> &mut BaseIndex {
        match self {
            Claim::Generic(c) => c.base_index_mut(),
            Claim::AssignName(c) => c.base_index_mut(),
            Claim::AuthorizeKSign(c) => c.base_index_mut(),
            Claim::SetRoot(c) => c.base_index_mut(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            Claim::Generic(c) => c.to_bytes(),
            Claim::AssignName(c) => c.to_bytes(),
            Claim::AuthorizeKSign(c) => c.to_bytes(),
            Claim::SetRoot(c) => c.to_bytes(),
        }
    }
}

impl From<GenericClaim> for Claim {
    fn from(claim: GenericClaim) -> Self {
        Claim::Generic(claim)
    }
}

impl From<AssignNameClaim> for Claim {
    fn from(claim: AssignNameClaim) -> Self {
        Claim::AssignName(claim)
    }
}

impl From<AuthorizeKSignClaim> for Claim {
    fn from(claim: AuthorizeKSignClaim) -> Self {
        Claim::AuthorizeKSign(claim)
    }
}

impl From<SetRootClaim> for Claim {
    fn from(claim: SetRootClaim) -> Self {
        Claim::SetRoot(claim)
    }
}

/// Identify the kind of an encoded claim from its discriminant.
///
/// Fails with [`CoreError::InvalidEncoding`] on input shorter than the base
/// index and [`CoreError::UnknownClaimType`] on a discriminant outside the
/// kind table.
pub fn parse_kind(bytes: &[u8]) -> Result<ClaimKind> {
    let base = BaseIndex::from_bytes(bytes)?;
    ClaimKind::from_claim_type(&base.claim_type)
        .ok_or_else(|| CoreError::UnknownClaimType(hex::encode(base.claim_type)))
}

/// Cursor over the fixed-width fields of a catalog claim.
pub(crate) struct FieldReader<'a> {
    bytes: &'a [u8],
    kind: ClaimKind,
    pos: usize,
}

impl<'a> FieldReader<'a> {
    /// Check total length and discriminant before any field is read.
    pub(crate) fn new(bytes: &'a [u8], kind: ClaimKind, expected_len: usize) -> Result<Self> {
        if bytes.len() != expected_len {
            return Err(CoreError::InvalidEncoding(format!(
                "{} claim must be {} bytes, got {}",
                kind,
                expected_len,
                bytes.len()
            )));
        }
        Ok(Self {
            bytes,
            kind,
            pos: 0,
        })
    }

    /// Read the base index, enforcing the kind's discriminant and index length.
    pub(crate) fn base_index(&mut self, index_length: u32) -> Result<BaseIndex> {
        let base = BaseIndex::from_bytes(self.bytes)?;
        if base.claim_type != self.kind.claim_type() {
            return Err(CoreError::InvalidEncoding(format!(
                "claim type 0x{} is not {}",
                hex::encode(base.claim_type),
                self.kind
            )));
        }
        if base.index_length != index_length {
            return Err(CoreError::IndexLengthMismatch {
                expected: index_length,
                found: base.index_length,
            });
        }
        self.pos = BASE_INDEX_LEN;
        Ok(base)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let field = self.bytes.get(self.pos..end).ok_or_else(|| {
            CoreError::InvalidEncoding(format!("{} claim truncated at byte {}", self.kind, self.pos))
        })?;
        self.pos = end;
        Ok(field)
    }

    pub(crate) fn hash(&mut self) -> Result<B256> {
        self.take(HASH_LEN).map(B256::from_slice)
    }

    pub(crate) fn address(&mut self) -> Result<Address> {
        self.take(ADDRESS_LEN).map(Address::from_slice)
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        let field = self.take(TIMESTAMP_LEN)?;
        let mut buf = [0u8; TIMESTAMP_LEN];
        buf.copy_from_slice(field);
        Ok(u64::from_be_bytes(buf))
    }

    /// Every byte must have been consumed.
    pub(crate) fn finish(self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(CoreError::InvalidEncoding(format!(
                "{} trailing bytes after {} claim",
                self.bytes.len() - self.pos,
                self.kind
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    const GENERIC_C1: &str = "0x3cfc3a1edbf691316fec9b75970fbfb2b0e8d8edfc6ec7628db77c4969403074cfee7c08a98f4b565d124c7e4e28acc52e1bc780e3887db000000042000000006331";

    #[test]
    fn test_parse_kind_of_catalog() {
        let key = address!("101d2fa51f8259df207115af9eaa73f3f4e52e60");
        let claims: [Claim; 4] = [
            GenericClaim::new("iden3.io", "default", b"c1", &[]).unwrap().into(),
            AssignNameClaim::from_names("john", "iden3.io", key).into(),
            AuthorizeKSignClaim::new_operational(key).into(),
            SetRootClaim::new(key, B256::ZERO).into(),
        ];
        for claim in claims {
            assert_eq!(parse_kind(&claim.to_bytes()).unwrap(), claim.kind());
            assert_eq!(Claim::parse(&claim.to_bytes()).unwrap(), claim);
        }
    }

    #[test]
    fn test_parse_kind_errors() {
        assert!(matches!(
            parse_kind(&[0u8; 10]),
            Err(CoreError::InvalidEncoding(_))
        ));
        assert!(matches!(
            parse_kind(&[0u8; 64]),
            Err(CoreError::UnknownClaimType(_))
        ));

        // Generic claims with a custom label are outside the table
        let custom = GenericClaim::new("iden3.io", "membership", b"x", &[]).unwrap();
        assert!(matches!(
            Claim::parse(&custom.to_bytes()),
            Err(CoreError::UnknownClaimType(_))
        ));
    }

    #[test]
    fn test_from_hex() {
        let claim = Claim::from_hex(GENERIC_C1).unwrap();
        assert_eq!(claim.kind(), ClaimKind::Generic);
        assert_eq!(claim.index_length(), 0x42);
        assert_eq!(claim.to_hex(), GENERIC_C1);
        assert_eq!(
            claim.ht(),
            b256!("0fce11cbd33e15d137a3a1953cda71aa81898ee8b917c21615073b59cd4dca8c")
        );

        assert_eq!(Claim::from_hex("0xzz"), Err(CoreError::InvalidHex));
    }

    #[test]
    fn test_generic_with_header_only_index() {
        // Index length 0x40: the data block is entirely value
        let claim = Claim::from_hex(
            "0x3cfc3a1edbf691316fec9b75970fbfb2b0e8d8edfc6ec7628db77c4969403074cfee7c08a98f4b565d124c7e4e28acc52e1bc780e3887db000000040000000006331",
        )
        .unwrap();
        match claim {
            Claim::Generic(ref generic) => {
                assert!(generic.data.is_empty());
                assert_eq!(generic.extra_data.as_ref(), b"c1");
            }
            _ => panic!("expected generic claim"),
        }
    }

    #[test]
    fn test_version_relocates_claim() {
        let claim: Claim =
            AuthorizeKSignClaim::new_operational(address!("ee602447b5a75cf4f25367f5d199b860844d10c4"))
                .into();
        let bumped = claim.clone().with_version(1);

        assert_eq!(bumped.version(), 1);
        assert_ne!(bumped.hi(), claim.hi());
        assert_eq!(
            bumped.hi(),
            b256!("eab0608b8891dcca4f421c69244b17f208fbed899b540d01115ca7d907cbf6a5")
        );
    }

    #[test]
    fn test_claim_serde_is_tagged() {
        let claim: Claim = SetRootClaim::new(Address::ZERO, B256::ZERO).into();
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["kind"], "setroot");
        assert_eq!(json["baseIndex"]["indexLength"], 84);

        let back: Claim = serde_json::from_value(json).unwrap();
        assert_eq!(back, claim);
    }

    #[test]
    fn test_kind_names_agree() {
        let claim: Claim = GenericClaim::new("iden3.io", "default", b"c1", &[])
            .unwrap()
            .into();
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["kind"], "default");

        for kind in ClaimKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.to_string());
            assert_eq!(kind.to_string(), kind.label());
        }

        let back: Claim = serde_json::from_value(json).unwrap();
        assert_eq!(back, claim);
    }
}
