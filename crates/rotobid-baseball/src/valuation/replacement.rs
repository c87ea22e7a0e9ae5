// Replacement-level selection and z-score rebasing.
//
// The replacement player is the last one a full league would start: with
// `slots` roster spots per owner for a group and `owners` owners, the player
// at 0-based index `slots × owners` of the sorted pool.

use rotobid_core::config::{CategoryGroup, LeagueSettings};
use serde::{Deserialize, Serialize};

use crate::valuation::ValuationIssue;

/// The marginal player a group's values are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    /// Position in the sorted pool (`slots × owners`).
    pub rank_index: usize,
    /// Index of the replacement player in the unsorted pool slice.
    pub pool_index: usize,
    /// The replacement player's total z-score.
    pub total_z: f64,
}

/// Pool indices sorted descending by total z. Ties keep load order.
pub fn rank_order(totals: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by(|&a, &b| totals[b].total_cmp(&totals[a]));
    order
}

/// 1-based rank for each pool index, from a `rank_order` result.
pub fn category_ranks(order: &[usize]) -> Vec<usize> {
    let mut ranks = vec![0; order.len()];
    for (position, &pool_index) in order.iter().enumerate() {
        ranks[pool_index] = position + 1;
    }
    ranks
}

/// Sorted-pool index of the replacement player for a group.
pub fn replacement_index(settings: &LeagueSettings, group: CategoryGroup) -> usize {
    settings.slots_for(group) * settings.owner_count
}

/// Pick the replacement player.
///
/// Fails with `PoolTooSmall` when the pool does not reach the replacement
/// index; a short pool means the settings and the loaded data disagree.
pub fn select_replacement(
    order: &[usize],
    totals: &[f64],
    settings: &LeagueSettings,
    group: CategoryGroup,
) -> Result<Replacement, ValuationIssue> {
    let rank_index = replacement_index(settings, group);
    let Some(&pool_index) = order.get(rank_index) else {
        return Err(ValuationIssue::PoolTooSmall {
            group,
            required: rank_index + 1,
            available: order.len(),
        });
    };
    Ok(Replacement {
        rank_index,
        pool_index,
        total_z: totals[pool_index],
    })
}

/// `total - replacement_z` for every player.
pub fn rebase(totals: &[f64], replacement_z: f64) -> Vec<f64> {
    totals.iter().map(|t| t - replacement_z).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(owners: usize, hitting_slots: usize) -> LeagueSettings {
        let mut s = LeagueSettings::default();
        s.owner_count = owners;
        s.hitting_slots = [("U".to_string(), hitting_slots)].into_iter().collect();
        s
    }

    #[test]
    fn rank_order_is_descending_and_stable() {
        let totals = [1.0, 3.0, 1.0, -2.0, 3.0];
        assert_eq!(rank_order(&totals), vec![1, 4, 0, 2, 3]);
        assert_eq!(category_ranks(&rank_order(&totals)), vec![3, 1, 4, 5, 2]);
    }

    #[test]
    fn replacement_index_is_slots_times_owners() {
        let s = LeagueSettings::default();
        assert_eq!(replacement_index(&s, CategoryGroup::Hitting), 168);
        assert_eq!(replacement_index(&s, CategoryGroup::Pitching), 108);
    }

    #[test]
    fn five_player_pool_with_index_two() {
        let totals = [0.5, 2.0, -1.0, 4.0, 1.0];
        let order = rank_order(&totals);
        let s = settings(2, 1);

        let repl = select_replacement(&order, &totals, &s, CategoryGroup::Hitting).unwrap();
        assert_eq!(repl.rank_index, 2);
        // Sorted: 4.0, 2.0, 1.0, 0.5, -1.0. Third is pool index 4.
        assert_eq!(repl.pool_index, 4);

        let rebased = rebase(&totals, repl.total_z);
        assert_eq!(rebased[repl.pool_index], 0.0);
        assert!(rebased[0] < 0.0);
        assert!(rebased[2] < 0.0);
        assert!(rebased[1] > 0.0 && rebased[3] > 0.0);
    }

    #[test]
    fn pool_equal_to_index_is_too_small() {
        let totals = [3.0, 2.0];
        let order = rank_order(&totals);
        let err = select_replacement(&order, &totals, &settings(2, 1), CategoryGroup::Hitting)
            .unwrap_err();
        assert_eq!(
            err,
            ValuationIssue::PoolTooSmall {
                group: CategoryGroup::Hitting,
                required: 3,
                available: 2,
            }
        );
    }

    #[test]
    fn zero_slots_selects_the_top_player() {
        let totals = [1.0, 5.0];
        let order = rank_order(&totals);
        let repl = select_replacement(&order, &totals, &settings(3, 0), CategoryGroup::Hitting)
            .unwrap();
        assert_eq!(repl.pool_index, 1);
        assert!(rebase(&totals, repl.total_z).iter().all(|z| *z <= 0.0));
    }
}
