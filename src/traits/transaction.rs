use async_trait::async_trait;

use crate::models::{ExecutionResult, TransactionIntent, WithdrawalIntent};

/// Builds the vault's withdraw call.
pub trait TransactionBuilder: Send + Sync {
    fn build_withdrawal(&self, intent: &WithdrawalIntent) -> anyhow::Result<TransactionIntent>;
}

/// Signs a transaction with the connected wallet and submits it.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn sign_and_execute(
        &self,
        transaction: TransactionIntent,
        chain: &str,
    ) -> anyhow::Result<ExecutionResult>;
}
