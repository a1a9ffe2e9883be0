use serde_json::json;

use crate::models::{TransactionIntent, WithdrawalIntent};
use crate::traits::transaction::TransactionBuilder;

pub const DEFAULT_WITHDRAW_FUNCTION: &str = "take_coin";

/// Builds the vault withdraw entry call:
/// `package::module::function<T>(cap, vault, type_name, amount)`.
#[derive(Debug, Clone)]
pub struct MoveCallBuilder {
    package_id: String,
    module: String,
    function: String,
}

impl MoveCallBuilder {
    pub fn new(package_id: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            module: module.into(),
            function: DEFAULT_WITHDRAW_FUNCTION.to_string(),
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package_id, self.module, self.function)
    }
}

impl TransactionBuilder for MoveCallBuilder {
    fn build_withdrawal(&self, intent: &WithdrawalIntent) -> anyhow::Result<TransactionIntent> {
        if self.package_id.is_empty() {
            anyhow::bail!("no vault package configured");
        }
        if intent.amount_smallest_units == 0 {
            anyhow::bail!("refusing to build a zero withdrawal");
        }

        let asset_type = intent.asset_type.as_str();
        Ok(TransactionIntent {
            target: self.target(),
            type_arguments: vec![asset_type.to_string()],
            arguments: vec![
                json!(intent.capability_id.as_str()),
                json!(intent.vault_id.as_str()),
                // the vault keys balances by the type name string
                json!(asset_type),
                // u64 travels as a string to keep full precision
                json!(intent.amount_smallest_units.to_string()),
            ],
        })
    }
}
