use crate::standardized_types::symbol::Symbol;
use std::collections::HashSet;

/// Securities added to or removed from the universe within one frontier window.
///
/// A monoid under "disjoint union with cancellation": merging two changesets treats
/// the second as happening after the first, so an add in the later changeset cancels
/// a removal of the same security in the earlier one (and vice versa). Outside of
/// that cancellation, added and removed stay disjoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecurityChanges {
    pub added: HashSet<Symbol>,
    pub removed: HashSet<Symbol>,
}

impl SecurityChanges {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn added_only(added: HashSet<Symbol>) -> Self {
        Self {
            added,
            removed: HashSet::new(),
        }
    }

    pub fn removed_only(removed: HashSet<Symbol>) -> Self {
        Self {
            added: HashSet::new(),
            removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Combines `self` followed by `later`. Associative: `a.merge(b).merge(c) ==
    /// a.merge(b.merge(c))` for any chain of changesets produced by real feed activity.
    pub fn merge(&self, later: &SecurityChanges) -> SecurityChanges {
        let removed: HashSet<Symbol> = self
            .removed
            .union(&later.removed)
            .filter(|s| !later.added.contains(*s))
            .cloned()
            .collect();
        let added: HashSet<Symbol> = self
            .added
            .difference(&later.removed)
            .cloned()
            .chain(later.added.iter().cloned())
            .collect();
        SecurityChanges { added, removed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standardized_types::symbol::SecurityType;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name, SecurityType::Equity, "NYSE")
    }

    #[test]
    fn add_cancels_prior_remove_of_same_security() {
        let first = SecurityChanges::removed_only(HashSet::from([sym("AAPL")]));
        let second = SecurityChanges::added_only(HashSet::from([sym("AAPL")]));
        let merged = first.merge(&second);
        assert!(merged.added.contains(&sym("AAPL")));
        assert!(!merged.removed.contains(&sym("AAPL")));
    }

    #[test]
    fn remove_cancels_prior_add_of_same_security() {
        let first = SecurityChanges::added_only(HashSet::from([sym("MSFT")]));
        let second = SecurityChanges::removed_only(HashSet::from([sym("MSFT")]));
        let merged = first.merge(&second);
        assert!(!merged.added.contains(&sym("MSFT")));
        assert!(merged.removed.contains(&sym("MSFT")));
    }

    #[test]
    fn merge_is_associative_over_three_changesets() {
        let a = SecurityChanges::added_only(HashSet::from([sym("AAPL")]));
        let b = SecurityChanges::removed_only(HashSet::from([sym("AAPL")]));
        let c = SecurityChanges::added_only(HashSet::from([sym("AAPL"), sym("MSFT")]));

        let left = a.merge(&b).merge(&c);
        let right = a.merge(&b.merge(&c));
        assert_eq!(left, right);
    }

    #[test]
    fn disjoint_changes_stay_disjoint() {
        let first = SecurityChanges::added_only(HashSet::from([sym("AAPL")]));
        let second = SecurityChanges::removed_only(HashSet::from([sym("MSFT")]));
        let merged = first.merge(&second);
        assert!(merged.added.contains(&sym("AAPL")));
        assert!(merged.removed.contains(&sym("MSFT")));
    }
}
