//! Merge-policy filtering
//!
//! A rule may declare a policy against one sibling rule. After a reduction
//! round, each frontier node created by such a rule is kept or discarded
//! depending on whether the sibling also reduced during the round. A
//! discarded node's derivation is covered by a competing interpretation of
//! the same span, so nothing is reported.

use crate::glr::stack::{Frontier, Gss, NodeId};
use crate::tables::{MergePolicy, ParseTables, RuleId};
use hashbrown::HashSet;

/// Whether a node created by a rule with `policy` must be dropped, given
/// whether its sibling fired in the same round.
#[must_use]
pub const fn should_discard(policy: MergePolicy, sibling_present: bool) -> bool {
    match policy {
        MergePolicy::NoMerge => false,
        MergePolicy::ForbiddenIfSiblingPresent => true,
        MergePolicy::AllowedOnlyIfSiblingAbsent => sibling_present,
        MergePolicy::AllowedOnlyIfSiblingPresent => !sibling_present,
    }
}

/// Remove nodes created this round whose merge policy is violated.
///
/// Only `created` nodes are candidates; nodes that were already on the
/// frontier before the round keep their place. Returns the discarded nodes
/// in frontier order.
pub fn filter_failed_merges(
    tables: &ParseTables,
    gss: &Gss,
    frontier: &mut Frontier,
    created: &[NodeId],
    present: &HashSet<RuleId>,
) -> Vec<NodeId> {
    let mut discarded = Vec::new();
    for &node in frontier.nodes() {
        if !created.contains(&node) {
            continue;
        }
        let Some(rule) = gss.node(node).rule() else {
            continue;
        };
        let merge = tables.merge(rule);
        if merge.is_none() {
            continue;
        }
        if should_discard(merge.policy(), present.contains(&merge.sibling())) {
            discarded.push(node);
        }
    }
    if !discarded.is_empty() {
        frontier.retain(gss, |n| !discarded.contains(&n));
    }
    discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::TableBuilder;

    #[test]
    fn test_policy_table() {
        use MergePolicy::*;
        assert!(!should_discard(NoMerge, true));
        assert!(should_discard(ForbiddenIfSiblingPresent, false));
        assert!(should_discard(AllowedOnlyIfSiblingAbsent, true));
        assert!(!should_discard(AllowedOnlyIfSiblingAbsent, false));
        assert!(should_discard(AllowedOnlyIfSiblingPresent, false));
        assert!(!should_discard(AllowedOnlyIfSiblingPresent, true));
    }

    /// Rule 0 is allowed only with rule 1 present, rule 1 only with rule 0
    /// absent.
    fn sibling_tables() -> ParseTables {
        TableBuilder::new(1)
            .shift(0, 0, 1)
            .rule(0, 1)
            .rule(1, 1)
            .rule(2, 1)
            .merge(0, 1, MergePolicy::AllowedOnlyIfSiblingPresent)
            .merge(1, 0, MergePolicy::AllowedOnlyIfSiblingAbsent)
            .build()
            .unwrap()
    }

    fn round(fired: &[RuleId]) -> Vec<RuleId> {
        let tables = sibling_tables();
        let mut gss = Gss::new();
        let mut frontier = Frontier::new();
        let mut created = Vec::new();
        for (state, &rule) in (10..).zip(fired) {
            let (node, _) = frontier.find_or_create(&mut gss, state, Some(rule));
            created.push(node);
        }
        let present: HashSet<RuleId> = fired.iter().copied().collect();
        filter_failed_merges(&tables, &gss, &mut frontier, &created, &present);
        frontier
            .nodes()
            .iter()
            .filter_map(|&n| gss.node(n).rule())
            .collect()
    }

    #[test]
    fn test_only_absent_sibling_fires() {
        assert_eq!(round(&[1]), vec![1]);
    }

    #[test]
    fn test_both_fire() {
        assert_eq!(round(&[0, 1]), vec![0]);
    }

    #[test]
    fn test_only_present_sibling_fires() {
        assert_eq!(round(&[0]), Vec::<RuleId>::new());
    }

    #[test]
    fn test_rules_without_policy_survive() {
        assert_eq!(round(&[2]), vec![2]);
    }

    #[test]
    fn test_old_nodes_are_kept() {
        let tables = sibling_tables();
        let mut gss = Gss::new();
        let mut frontier = Frontier::new();
        frontier.find_or_create(&mut gss, 3, Some(0));
        let discarded =
            filter_failed_merges(&tables, &gss, &mut frontier, &[], &HashSet::new());
        assert!(discarded.is_empty());
        assert_eq!(frontier.len(), 1);
    }
}
