use berith_consensus::deposit::Deposit;

/// View over the indexed deposit-contract log. Implementations must be
/// deterministic: the same range always yields the same deposits.
pub trait DepositStore {
    /// Deposits with contract indices in ``[start_index, start_index + count)``,
    /// in ascending index order.
    fn range(&self, start_index: u64, count: u64) -> anyhow::Result<Vec<Deposit>>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryDepositStore {
    deposits: Vec<Deposit>,
}

impl InMemoryDepositStore {
    pub fn new(mut deposits: Vec<Deposit>) -> Self {
        deposits.sort_by_key(|deposit| deposit.index);
        Self { deposits }
    }
}

impl DepositStore for InMemoryDepositStore {
    fn range(&self, start_index: u64, count: u64) -> anyhow::Result<Vec<Deposit>> {
        Ok(self
            .deposits
            .iter()
            .filter(|deposit| {
                deposit.index >= start_index && deposit.index < start_index.saturating_add(count)
            })
            .cloned()
            .collect())
    }
}
