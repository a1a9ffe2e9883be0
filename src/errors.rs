use thiserror::Error;

use crate::models::{AssetType, ObjectId};

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("invalid withdrawal: {0}")]
    Validation(#[from] ValidationError),

    #[error("vault not resolved: {0}")]
    Resolution(#[from] ResolutionError),

    // single object or metadata read, the rest of the view survives
    #[error("partial fetch failure: {0}")]
    PartialFetch(String),

    #[error("Failed to withdraw: {0}")]
    Submission(String),
}

/// Bad user input. Nothing is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid amount to withdraw")]
    MissingAmount,

    #[error("amount {0:?} is not a number")]
    NotNumeric(String),

    #[error("amount {0:?} must be greater than zero")]
    NonPositive(String),

    #[error("amount {amount:?} is smaller than the asset's precision of {decimals} decimals")]
    BelowPrecision { amount: String, decimals: u8 },

    #[error("amount {0:?} does not fit in u64 smallest units")]
    AmountOverflow(String),

    // never guess a precision
    #[error("decimals unknown for {0}")]
    MissingDecimals(String),

    #[error("no asset type known for row {0}")]
    MissingAssetType(ObjectId),

    #[error("no vault row for object {0}")]
    UnknownRow(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no account connected")]
    NotConnected,

    #[error("no vault capability owned by {owner}")]
    NotFound { owner: String },

    #[error("{} capability objects owned, pick one explicitly: {}", .candidates.len(), join_ids(.candidates))]
    Ambiguous { candidates: Vec<ObjectId> },

    #[error("capability {0} carries no vault id")]
    MalformedCapability(ObjectId),

    #[error("vault has not been resolved yet")]
    Unresolved,
}

impl ValidationError {
    pub fn missing_decimals(asset_type: Option<&AssetType>) -> Self {
        Self::MissingDecimals(
            asset_type
                .map(|t| t.to_string())
                .unwrap_or_else(|| crate::utils::asset_type::UNKNOWN_ASSET.to_string()),
        )
    }
}

fn join_ids(ids: &[ObjectId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
}
