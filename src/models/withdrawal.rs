use serde::{Deserialize, Serialize};

use super::asset::{AssetType, ObjectId};

/// Everything the vault's withdraw entry point needs. Built per submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalIntent {
    pub vault_id: ObjectId,
    pub capability_id: ObjectId,
    /// Normalized; the vault keys its balances by this type.
    pub asset_type: AssetType,
    pub amount_smallest_units: u64,
}

/// A built, unsigned transaction ready for the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionIntent {
    /// `package::module::function`
    pub target: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

/// What the executor reports for a landed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub digest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Result of one withdraw action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalOutcome {
    Submitted {
        intent: WithdrawalIntent,
        digest: String,
    },
    /// Another withdrawal was still in flight; nothing was done.
    Ignored,
}

/// Delivered to event handlers after each submission attempt.
#[derive(Debug, Clone)]
pub struct WithdrawalReport {
    pub object_id: ObjectId,
    pub intent: Option<WithdrawalIntent>,
    pub result: Result<String, String>,
}
