// Auction dollar value conversion.
//
// Each group's share of the league's money is spread over the players above
// replacement level in proportion to their rebased z-score.

use rotobid_core::config::{CategoryGroup, LeagueSettings};
use serde::{Deserialize, Serialize};

use crate::valuation::ValuationIssue;

/// Conversion factors for one category-group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuctionValues {
    /// `owner_count × budget × group_split`.
    pub pool: f64,
    /// Sum of rebased z over players above replacement.
    pub sum_positive_z: f64,
    /// Dollars per unit of rebased z.
    pub cost_per_z: f64,
}

/// Compute the dollar conversion for one group.
///
/// Algorithm:
/// 1. `pool` = `owner_count × budget × group_split`
/// 2. `sum_positive_z` = sum of rebased z where rebased z > 0
/// 3. `cost_per_z` = `pool / sum_positive_z`
///
/// Fails with `NoPlayersAboveReplacement` when nobody beats replacement.
pub fn compute_auction_values(
    rebased: &[f64],
    settings: &LeagueSettings,
    group: CategoryGroup,
) -> Result<AuctionValues, ValuationIssue> {
    let pool = settings.group_pool(group);
    let sum_positive_z: f64 = rebased.iter().filter(|z| **z > 0.0).sum();

    if sum_positive_z <= 0.0 {
        return Err(ValuationIssue::NoPlayersAboveReplacement { group });
    }

    Ok(AuctionValues {
        pool,
        sum_positive_z,
        cost_per_z: pool / sum_positive_z,
    })
}

/// `rebased_z × cost_per_z`. Negative below replacement; never clipped here.
pub fn dollar_estimate(rebased_z: f64, auction: &AuctionValues) -> f64 {
    rebased_z * auction.cost_per_z
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn positive_estimates_sum_to_pool() {
        let settings = LeagueSettings::default();
        let rebased = [3.2, 1.1, 0.0, -0.4, 2.7, 0.05, -2.0];
        let auction = compute_auction_values(&rebased, &settings, CategoryGroup::Hitting).unwrap();

        assert!(approx_eq(auction.pool, 12.0 * 260.0 * 0.70, 1e-9));
        let total: f64 = rebased
            .iter()
            .map(|z| dollar_estimate(*z, &auction).max(0.0))
            .sum();
        assert!(approx_eq(total, auction.pool, 1e-9));
    }

    #[test]
    fn pitching_uses_complementary_split() {
        let settings = LeagueSettings::default();
        let auction = compute_auction_values(&[1.0], &settings, CategoryGroup::Pitching).unwrap();
        assert!(approx_eq(auction.pool, 12.0 * 260.0 * 0.30, 1e-9));
        assert!(approx_eq(dollar_estimate(1.0, &auction), auction.pool, 1e-9));
    }

    #[test]
    fn sub_replacement_estimates_are_negative() {
        let settings = LeagueSettings::default();
        let auction = compute_auction_values(&[2.0, -1.0], &settings, CategoryGroup::Hitting).unwrap();
        assert!(dollar_estimate(-1.0, &auction) < 0.0);
        assert_eq!(dollar_estimate(0.0, &auction), 0.0);
    }

    #[test]
    fn nobody_above_replacement_is_an_issue() {
        let settings = LeagueSettings::default();
        let err = compute_auction_values(&[0.0, -1.0, -3.0], &settings, CategoryGroup::Pitching)
            .unwrap_err();
        assert_eq!(
            err,
            ValuationIssue::NoPlayersAboveReplacement {
                group: CategoryGroup::Pitching
            }
        );
    }
}
