use super::crypto::Address;
use super::transaction::Transaction;

/// Holds transactions that were accepted but not yet committed to a block
///
/// Arrival order is preserved. The pool does no deduplication and no balance checks;
/// admission rules live in the chain.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        TransactionPool {
            transactions: Vec::new(),
        }
    }

    /// Appends a transaction to the pool
    pub fn submit(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    /// Returns an independent copy of the pooled transactions
    ///
    /// Later changes to the pool do not affect the returned vector.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    /// Empties the pool
    pub fn clear(&mut self) {
        self.transactions.clear();
    }

    /// Removes the first `count` transactions after a block captured them
    ///
    /// Transactions submitted after the snapshot was taken stay in the pool.
    pub fn commit(&mut self, count: usize) {
        if count >= self.transactions.len() {
            self.clear();
        } else {
            self.transactions.drain(..count);
        }
    }

    /// Net change the pooled transactions will apply to `address` once mined
    pub fn pending_delta(&self, address: &Address) -> f64 {
        self.transactions
            .iter()
            .map(|transaction| transaction.balance_delta(address))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(from: &str, to: &str, amount: f64) -> Transaction {
        Transaction::new(Address::from(from), Address::from(to), amount)
    }

    #[test]
    fn test_submit_keeps_arrival_order() {
        let mut pool = TransactionPool::new();
        pool.submit(transfer("C", "D", 2.0));
        pool.submit(transfer("X", "Y", 3.0));
        pool.submit(transfer("C", "D", 2.0));

        let amounts: Vec<f64> = pool.iter().map(|t| t.amount()).collect();
        assert_eq!(amounts, vec![2.0, 3.0, 2.0]);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut pool = TransactionPool::new();
        pool.submit(transfer("A", "B", 1.0));

        let snapshot = pool.snapshot();
        pool.submit(transfer("A", "B", 5.0));
        pool.clear();

        assert_eq!(snapshot, vec![transfer("A", "B", 1.0)]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_commit_keeps_late_arrivals() {
        let mut pool = TransactionPool::new();
        pool.submit(transfer("A", "B", 1.0));
        pool.submit(transfer("A", "B", 2.0));

        let snapshot = pool.snapshot();
        pool.submit(transfer("A", "B", 3.0));

        pool.commit(snapshot.len());
        assert_eq!(pool.snapshot(), vec![transfer("A", "B", 3.0)]);

        pool.commit(10);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pending_delta() {
        let mut pool = TransactionPool::new();
        pool.submit(transfer("A", "B", 1.0));
        pool.submit(transfer("C", "A", 0.25));
        pool.submit(transfer("A", "D", 2.0));

        assert_eq!(pool.pending_delta(&Address::from("A")), -2.75);
        assert_eq!(pool.pending_delta(&Address::from("B")), 1.0);
        assert_eq!(pool.pending_delta(&Address::from("E")), 0.0);
    }
}
