//! Unspent output set
//!
//! The set is the one piece of mutable ledger state. Validation never
//! touches it directly: changes are staged in a [`UtxoDelta`] through a
//! [`StagedUtxos`] view over a shared borrow, and only a fully validated
//! delta is applied with [`UtxoDelta::apply`].

use crate::core::transaction::{OutPoint, TransactionOutput};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A single unspent output together with its reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    #[serde(flatten)]
    pub outpoint: OutPoint,
    #[serde(flatten)]
    pub output: TransactionOutput,
}

/// Mapping from `(tx_id, output_index)` to the output it names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Utxo>", into = "Vec<Utxo>")]
pub struct UnspentOutputSet {
    entries: HashMap<OutPoint, TransactionOutput>,
}

impl UnspentOutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TransactionOutput> {
        self.entries.get(outpoint)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.entries.contains_key(outpoint)
    }

    pub fn insert(&mut self, outpoint: OutPoint, output: TransactionOutput) {
        self.entries.insert(outpoint, output);
    }

    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<TransactionOutput> {
        self.entries.remove(outpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TransactionOutput)> {
        self.entries.iter()
    }

    /// Outputs owned by `owner`, ordered by outpoint
    pub fn owned_by(&self, owner: &str) -> Vec<Utxo> {
        let mut owned: Vec<Utxo> = self
            .entries
            .iter()
            .filter(|(_, output)| output.is_owned_by(owner))
            .map(|(outpoint, output)| Utxo {
                outpoint: outpoint.clone(),
                output: output.clone(),
            })
            .collect();
        owned.sort_by(|a, b| a.outpoint.cmp(&b.outpoint));
        owned
    }
}

impl From<Vec<Utxo>> for UnspentOutputSet {
    fn from(utxos: Vec<Utxo>) -> Self {
        Self {
            entries: utxos
                .into_iter()
                .map(|utxo| (utxo.outpoint, utxo.output))
                .collect(),
        }
    }
}

impl From<UnspentOutputSet> for Vec<Utxo> {
    fn from(set: UnspentOutputSet) -> Self {
        let mut utxos: Vec<Utxo> = set
            .entries
            .into_iter()
            .map(|(outpoint, output)| Utxo { outpoint, output })
            .collect();
        utxos.sort_by(|a, b| a.outpoint.cmp(&b.outpoint));
        utxos
    }
}

/// Pending changes to an [`UnspentOutputSet`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoDelta {
    spent: HashSet<OutPoint>,
    created: HashMap<OutPoint, TransactionOutput>,
}

impl UtxoDelta {
    /// Outpoints this delta consumes
    pub fn spent(&self) -> impl Iterator<Item = &OutPoint> {
        self.spent.iter()
    }

    /// Outputs this delta adds
    pub fn created(&self) -> impl Iterator<Item = (&OutPoint, &TransactionOutput)> {
        self.created.iter()
    }

    /// Commit every staged change to `set`
    pub fn apply(self, set: &mut UnspentOutputSet) {
        for outpoint in &self.spent {
            set.remove(outpoint);
        }
        for (outpoint, output) in self.created {
            set.insert(outpoint, output);
        }
    }
}

/// Read-through view of a set plus the changes staged so far
#[derive(Debug)]
pub struct StagedUtxos<'a> {
    base: &'a UnspentOutputSet,
    delta: UtxoDelta,
}

impl<'a> StagedUtxos<'a> {
    pub fn new(base: &'a UnspentOutputSet) -> Self {
        Self {
            base,
            delta: UtxoDelta::default(),
        }
    }

    /// Resolve an outpoint as if the staged changes were applied
    pub fn get(&self, outpoint: &OutPoint) -> Option<&TransactionOutput> {
        if self.delta.spent.contains(outpoint) {
            return None;
        }
        self.delta
            .created
            .get(outpoint)
            .or_else(|| self.base.get(outpoint))
    }

    /// Whether an earlier staged transaction already consumed `outpoint`
    pub fn is_spent(&self, outpoint: &OutPoint) -> bool {
        self.delta.spent.contains(outpoint)
    }

    pub fn spend(&mut self, outpoint: &OutPoint) {
        self.delta.created.remove(outpoint);
        self.delta.spent.insert(outpoint.clone());
    }

    pub fn create(&mut self, outpoint: OutPoint, output: TransactionOutput) {
        self.delta.created.insert(outpoint, output);
    }

    pub fn into_delta(self) -> UtxoDelta {
        self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(n: u32) -> OutPoint {
        OutPoint::new("11".repeat(32), n)
    }

    #[test]
    fn test_staging_leaves_base_untouched() {
        let mut set = UnspentOutputSet::new();
        set.insert(op(0), TransactionOutput::new("alice", 10));

        let mut staged = StagedUtxos::new(&set);
        staged.spend(&op(0));
        staged.create(op(1), TransactionOutput::new("bob", 10));

        assert!(staged.get(&op(0)).is_none());
        assert!(staged.is_spent(&op(0)));
        assert_eq!(staged.get(&op(1)).unwrap().owner, "bob");

        let delta = staged.into_delta();
        assert!(set.contains(&op(0)));
        assert!(!set.contains(&op(1)));

        delta.apply(&mut set);
        assert!(!set.contains(&op(0)));
        assert_eq!(set.get(&op(1)).unwrap().amount, 10);
    }

    #[test]
    fn test_spending_a_staged_output() {
        let set = UnspentOutputSet::new();
        let mut staged = StagedUtxos::new(&set);
        staged.create(op(3), TransactionOutput::new("carol", 4));
        staged.spend(&op(3));

        assert!(staged.get(&op(3)).is_none());

        let mut target = UnspentOutputSet::new();
        staged.into_delta().apply(&mut target);
        assert!(target.is_empty());
    }

    #[test]
    fn test_owned_by_is_sorted() {
        let mut set = UnspentOutputSet::new();
        set.insert(op(2), TransactionOutput::new("alice", 2));
        set.insert(op(0), TransactionOutput::new("alice", 1));
        set.insert(op(1), TransactionOutput::new("bob", 5));

        let owned = set.owned_by("alice");
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].outpoint, op(0));
        assert_eq!(owned[1].outpoint, op(2));
    }

    #[test]
    fn test_json_is_a_flat_list() {
        let mut set = UnspentOutputSet::new();
        set.insert(op(0), TransactionOutput::new("alice", 7));

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json[0]["txId"], op(0).tx_id);
        assert_eq!(json[0]["outputIndex"], 0);
        assert_eq!(json[0]["amount"], 7);
        assert_eq!(json[0]["owner"], "alice");

        let back: UnspentOutputSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }
}
