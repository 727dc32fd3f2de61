use alloy_primitives::{Address, B256};
use anyhow::Result;
use clap::{Args, Subcommand};
use claimtree_core::{
    AssignNameClaim, AuthorizeKSignClaim, Claim, ClaimEncoding, ClaimKind, GenericClaim,
    SetRootClaim, CLAIM_LABEL_DEFAULT,
};
use claimtree_service::config::Config;
use serde::Serialize;

use super::{decode_hex, print_json};

#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// Claim version
    #[arg(long, default_value_t = 0, global = true)]
    pub claim_version: u32,

    #[command(subcommand)]
    pub kind: EncodeKind,
}

#[derive(Debug, Subcommand)]
pub enum EncodeKind {
    /// Namespaced claim with free-form data.
    Generic {
        /// Namespace (defaults to the configured namespace)
        #[arg(long)]
        namespace: Option<String>,

        /// Claim type label
        #[arg(long, default_value = CLAIM_LABEL_DEFAULT)]
        label: String,

        /// Indexed data, hex
        #[arg(long, default_value = "")]
        data: String,

        /// Non-indexed data, hex
        #[arg(long, default_value = "")]
        extra: String,
    },
    /// Bind a name in a namespace to an address.
    AssignName {
        #[arg(long)]
        name: String,

        /// Namespace (defaults to the configured namespace)
        #[arg(long)]
        namespace: Option<String>,

        #[arg(long)]
        address: Address,
    },
    /// Authorize a signing key for an application.
    AuthorizeKsign {
        #[arg(long)]
        key: Address,

        #[arg(long)]
        app: String,

        #[arg(long)]
        authz: String,

        /// Start of validity, unix seconds
        #[arg(long, default_value_t = 0)]
        valid_from: u64,

        /// End of validity, unix seconds
        #[arg(long, default_value_t = u64::MAX)]
        valid_until: u64,
    },
    /// Authorize an operational key with no expiry.
    OperationalKsign {
        #[arg(long)]
        key: Address,
    },
    /// Publish an identity's root.
    SetRoot {
        #[arg(long)]
        identity: Address,

        #[arg(long)]
        root: B256,
    },
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Hex-encoded claim
    pub claim: String,
}

/// Claim fields together with its encoding and hashes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSummary {
    pub kind: ClaimKind,
    pub hex: String,
    pub hi: B256,
    pub ht: B256,
    pub index_length: u32,
    pub version: u32,
    pub claim: Claim,
}

impl From<Claim> for ClaimSummary {
    fn from(claim: Claim) -> Self {
        Self {
            kind: claim.kind(),
            hex: claim.to_hex(),
            hi: claim.hi(),
            ht: claim.ht(),
            index_length: claim.index_length(),
            version: claim.version(),
            claim,
        }
    }
}

pub fn run_encode(args: EncodeArgs, config: &Config) -> Result<()> {
    let namespace_or_default =
        |namespace: Option<String>| namespace.unwrap_or_else(|| config.tree.namespace.clone());

    let claim: Claim = match args.kind {
        EncodeKind::Generic {
            namespace,
            label,
            data,
            extra,
        } => GenericClaim::new(
            &namespace_or_default(namespace),
            &label,
            &decode_hex(&data)?,
            &decode_hex(&extra)?,
        )?
        .into(),
        EncodeKind::AssignName {
            name,
            namespace,
            address,
        } => AssignNameClaim::from_names(&name, &namespace_or_default(namespace), address).into(),
        EncodeKind::AuthorizeKsign {
            key,
            app,
            authz,
            valid_from,
            valid_until,
        } => {
            if valid_from > valid_until {
                anyhow::bail!("valid-from {} is after valid-until {}", valid_from, valid_until);
            }
            AuthorizeKSignClaim::new(key, &app, &authz, valid_from, valid_until).into()
        }
        EncodeKind::OperationalKsign { key } => AuthorizeKSignClaim::new_operational(key).into(),
        EncodeKind::SetRoot { identity, root } => SetRootClaim::new(identity, root).into(),
    };

    print_json(&ClaimSummary::from(claim.with_version(args.claim_version)))
}

pub fn run_inspect(args: InspectArgs) -> Result<()> {
    print_json(&ClaimSummary::from(decode_claim(&args.claim)?))
}

/// Decode a hex claim, falling back to a generic claim for unknown labels.
pub fn decode_claim(input: &str) -> Result<Claim> {
    let bytes = decode_hex(input)?;
    match Claim::parse(&bytes) {
        Ok(claim) => Ok(claim),
        Err(err) => GenericClaim::from_bytes(&bytes)
            .map(Claim::Generic)
            .map_err(|_| err.into()),
    }
}
