// Valuation engine: projections -> z-scores -> replacement level -> dollars.

pub mod auction;
pub mod inflation;
pub mod replacement;
pub mod stats;
pub mod zscore;

use std::collections::HashMap;

use rotobid_core::config::{Category, CategoryGroup, LeagueSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::player::{Player, PlayerId};
use auction::{compute_auction_values, dollar_estimate, AuctionValues};
use replacement::{category_ranks, rank_order, rebase, select_replacement, Replacement};
use zscore::{compute_group_zscores, CategoryScores};

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// A recoverable problem found during a valuation pass. The pass still
/// completes, with zeros wherever the problem made a value undefined.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ValuationIssue {
    #[error("{category} has zero spread across the {} pool; its z-scores are 0", .group.label())]
    DegenerateStat {
        group: CategoryGroup,
        category: Category,
    },

    #[error(
        "{} pool has {available} players but replacement level needs {required}; dollar values are 0",
        .group.label()
    )]
    PoolTooSmall {
        group: CategoryGroup,
        required: usize,
        available: usize,
    },

    #[error("no {} are above replacement level; dollar values are 0", .group.label())]
    NoPlayersAboveReplacement { group: CategoryGroup },
}

impl ValuationIssue {
    /// Settings/data mismatch, as opposed to a degenerate statistic.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, ValuationIssue::DegenerateStat { .. })
    }

    pub fn group(&self) -> CategoryGroup {
        match self {
            ValuationIssue::DegenerateStat { group, .. }
            | ValuationIssue::PoolTooSmall { group, .. }
            | ValuationIssue::NoPlayersAboveReplacement { group } => *group,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Derived values for one player. Rebuilt on every pass, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub player: PlayerId,
    pub group: CategoryGroup,
    pub z: CategoryScores,
    pub total_z: f64,
    pub rebased_z: f64,
    /// 1-based rank within the group by total z.
    pub category_rank: usize,
    /// Unclipped dollar estimate.
    pub dollars: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: CategoryGroup,
    pub pool_size: usize,
    pub replacement: Option<Replacement>,
    pub auction: Option<AuctionValues>,
}

/// Output of one full valuation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Valuations {
    calculations: Vec<Calculation>,
    by_id: HashMap<PlayerId, usize>,
    pub hitting: GroupSummary,
    pub pitching: GroupSummary,
    pub issues: Vec<ValuationIssue>,
}

impl Valuations {
    /// Calculations in the same order as the players passed to [`recompute`].
    pub fn calculations(&self) -> &[Calculation] {
        &self.calculations
    }

    pub fn get(&self, player: PlayerId) -> Option<&Calculation> {
        self.by_id.get(&player).map(|&i| &self.calculations[i])
    }

    pub fn summary(&self, group: CategoryGroup) -> &GroupSummary {
        match group {
            CategoryGroup::Hitting => &self.hitting,
            CategoryGroup::Pitching => &self.pitching,
        }
    }

    /// The player's estimate, or 0 if it is not part of this pass.
    pub fn dollars(&self, player: PlayerId) -> f64 {
        self.get(player).map_or(0.0, |c| c.dollars)
    }

    pub fn has_configuration_errors(&self) -> bool {
        self.issues.iter().any(|i| i.is_configuration_error())
    }
}

// ---------------------------------------------------------------------------
// Pipeline entry point
// ---------------------------------------------------------------------------

/// Run the full valuation pipeline over a pool.
///
/// 1. Split the pool into hitters and pitchers (load order preserved).
/// 2. Standardize every category and total the enabled ones.
/// 3. Rank by total, pick the replacement player, rebase.
/// 4. Convert rebased z into dollars.
///
/// Draft state is ignored: values describe the whole pool. A group whose
/// replacement or dollar step fails keeps its z-scores and ranks, with
/// rebased z and dollars left at 0, and the failure is listed in `issues`.
pub fn recompute(players: &[Player], settings: &LeagueSettings) -> Valuations {
    let mut calculations: Vec<Calculation> = players
        .iter()
        .map(|p| Calculation {
            player: p.id,
            group: p.group(),
            z: CategoryScores::default(),
            total_z: 0.0,
            rebased_z: 0.0,
            category_rank: 0,
            dollars: 0.0,
        })
        .collect();
    let mut issues = Vec::new();

    let hitting = value_group(players, settings, CategoryGroup::Hitting, &mut calculations, &mut issues);
    let pitching = value_group(players, settings, CategoryGroup::Pitching, &mut calculations, &mut issues);

    for issue in &issues {
        warn!("{issue}");
    }

    let by_id = calculations
        .iter()
        .enumerate()
        .map(|(i, c)| (c.player, i))
        .collect();

    Valuations {
        calculations,
        by_id,
        hitting,
        pitching,
        issues,
    }
}

fn value_group(
    players: &[Player],
    settings: &LeagueSettings,
    group: CategoryGroup,
    calculations: &mut [Calculation],
    issues: &mut Vec<ValuationIssue>,
) -> GroupSummary {
    let members: Vec<usize> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.group() == group)
        .map(|(i, _)| i)
        .collect();
    let pool: Vec<&Player> = members.iter().map(|&i| &players[i]).collect();

    let zscores = compute_group_zscores(&pool, group, settings);
    issues.extend(
        zscores
            .degenerate
            .iter()
            .map(|&category| ValuationIssue::DegenerateStat { group, category }),
    );

    let order = rank_order(&zscores.totals);
    let ranks = category_ranks(&order);

    for (k, &i) in members.iter().enumerate() {
        let calc = &mut calculations[i];
        calc.z = zscores.scores[k];
        calc.total_z = zscores.totals[k];
        calc.category_rank = ranks[k];
    }

    let mut summary = GroupSummary {
        group,
        pool_size: pool.len(),
        replacement: None,
        auction: None,
    };

    let replacement = match select_replacement(&order, &zscores.totals, settings, group) {
        Ok(r) => r,
        Err(issue) => {
            issues.push(issue);
            return summary;
        }
    };
    summary.replacement = Some(replacement);

    let rebased = rebase(&zscores.totals, replacement.total_z);
    let auction = match compute_auction_values(&rebased, settings, group) {
        Ok(a) => a,
        Err(issue) => {
            issues.push(issue);
            return summary;
        }
    };
    summary.auction = Some(auction);

    for (k, &i) in members.iter().enumerate() {
        let calc = &mut calculations[i];
        calc.rebased_z = rebased[k];
        calc.dollars = dollar_estimate(rebased[k], &auction);
    }

    debug!(
        group = group.label(),
        pool = pool.len(),
        replacement_z = replacement.total_z,
        cost_per_z = auction.cost_per_z,
        "valued group"
    );

    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{HittingLine, PitchingLine};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn small_league() -> LeagueSettings {
        let mut s = LeagueSettings::default();
        s.owner_count = 2;
        s.budget = 100;
        s.hitting_split = 0.6;
        s.hitting_slots = [("U".to_string(), 2)].into_iter().collect();
        s.pitching_slots = [("P".to_string(), 1)].into_iter().collect();
        s
    }

    fn pool() -> Vec<Player> {
        let mut players = Vec::new();
        let hitters = [
            (500, 150, 30, 90, 95, 5),
            (550, 140, 15, 80, 60, 25),
            (450, 120, 22, 70, 75, 10),
            (600, 170, 10, 100, 55, 30),
            (400, 96, 8, 45, 40, 3),
            (520, 135, 25, 85, 88, 12),
        ];
        for (i, (ab, h, hr, r, rbi, sb)) in hitters.into_iter().enumerate() {
            players.push(Player::hitter(
                i as u32 + 1,
                &format!("H{i}"),
                "BOS",
                HittingLine {
                    pa: ab + 60,
                    ab,
                    h,
                    hr,
                    r,
                    rbi,
                    sb,
                },
            ));
        }
        let pitchers = [
            (200.0, 170, 50, 70, 210, 15, 0),
            (70.0, 55, 20, 20, 80, 4, 35),
            (160.0, 160, 55, 80, 130, 9, 0),
            (180.0, 165, 45, 65, 190, 13, 0),
        ];
        for (i, (ip, h, bb, er, so, w, sv)) in pitchers.into_iter().enumerate() {
            players.push(Player::pitcher(
                100 + i as u32,
                &format!("P{i}"),
                "LAD",
                PitchingLine {
                    ip,
                    h,
                    bb,
                    er,
                    so,
                    w,
                    sv,
                },
            ));
        }
        players
    }

    #[test]
    fn dollars_conserve_each_group_pool() {
        let settings = small_league();
        let players = pool();
        let vals = recompute(&players, &settings);
        assert!(vals.issues.is_empty(), "{:?}", vals.issues);

        for group in CategoryGroup::ALL {
            let total: f64 = vals
                .calculations()
                .iter()
                .filter(|c| c.group == group)
                .map(|c| c.dollars.max(0.0))
                .sum();
            assert!(approx_eq(total, settings.group_pool(group), 1e-9), "{group:?}: {total}");
        }
    }

    #[test]
    fn replacement_player_rebases_to_zero() {
        let settings = small_league();
        let players = pool();
        let vals = recompute(&players, &settings);

        for group in CategoryGroup::ALL {
            let repl = vals.summary(group).replacement.unwrap();
            let replacement_calc = vals
                .calculations()
                .iter()
                .filter(|c| c.group == group)
                .nth(repl.pool_index)
                .unwrap();
            assert_eq!(replacement_calc.rebased_z, 0.0);
            assert_eq!(replacement_calc.category_rank, repl.rank_index + 1);
        }
    }

    #[test]
    fn ranks_are_a_permutation_per_group() {
        let vals = recompute(&pool(), &small_league());
        let mut hitter_ranks: Vec<usize> = vals
            .calculations()
            .iter()
            .filter(|c| c.group == CategoryGroup::Hitting)
            .map(|c| c.category_rank)
            .collect();
        hitter_ranks.sort();
        assert_eq!(hitter_ranks, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn recompute_is_idempotent() {
        let players = pool();
        let settings = small_league();
        assert_eq!(recompute(&players, &settings), recompute(&players, &settings));
    }

    #[test]
    fn drafted_state_does_not_change_values() {
        let settings = small_league();
        let mut players = pool();
        let before = recompute(&players, &settings);
        players[0].draft.owner = 1;
        players[0].draft.amount_paid = 40;
        assert_eq!(before, recompute(&players, &settings));
    }

    #[test]
    fn short_pool_keeps_ranks_but_zeroes_dollars() {
        let mut settings = small_league();
        settings.pitching_slots = [("P".to_string(), 2)].into_iter().collect();
        let vals = recompute(&pool(), &settings);

        assert_eq!(
            vals.issues,
            vec![ValuationIssue::PoolTooSmall {
                group: CategoryGroup::Pitching,
                required: 5,
                available: 4,
            }]
        );
        assert!(vals.has_configuration_errors());
        assert!(vals.pitching.replacement.is_none());
        for c in vals.calculations().iter().filter(|c| c.group == CategoryGroup::Pitching) {
            assert_eq!(c.dollars, 0.0);
            assert_eq!(c.rebased_z, 0.0);
            assert!(c.category_rank >= 1);
        }
        // Hitters are unaffected.
        assert!(vals.hitting.auction.is_some());
    }

    #[test]
    fn empty_pool_is_safe() {
        let vals = recompute(&[], &small_league());
        assert!(vals.calculations().is_empty());
        assert_eq!(vals.issues.len(), 2);
        assert!(vals.issues.iter().all(|i| i.is_configuration_error()));
    }

    #[test]
    fn lookup_by_id() {
        let vals = recompute(&pool(), &small_league());
        let calc = vals.get(101).unwrap();
        assert_eq!(calc.group, CategoryGroup::Pitching);
        assert_eq!(vals.dollars(9999), 0.0);
    }
}
