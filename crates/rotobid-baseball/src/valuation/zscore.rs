// Z-score calculation with exposure-weighted rate stats.

use rotobid_core::config::{Category, CategoryGroup, LeagueSettings};
use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::valuation::stats::standardize;

// ---------------------------------------------------------------------------
// Per-category score storage
// ---------------------------------------------------------------------------

/// Per-category z-scores for one player, indexed by [`Category`]. Categories
/// outside the player's group stay 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores([f64; 10]);

impl CategoryScores {
    pub fn get(&self, category: Category) -> f64 {
        self.0[category as usize]
    }

    pub fn set(&mut self, category: Category, value: f64) {
        self.0[category as usize] = value;
    }

    /// `(category, z)` pairs for one group, in display order.
    pub fn for_group(&self, group: CategoryGroup) -> impl Iterator<Item = (Category, f64)> + '_ {
        group.categories().iter().map(move |c| (*c, self.get(*c)))
    }
}

/// Z-scores for a whole category-group pool, aligned with the input slice.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupZScores {
    pub scores: Vec<CategoryScores>,
    /// Weighted sum over enabled categories.
    pub totals: Vec<f64>,
    /// Enabled categories whose spread was zero (z forced to 0).
    pub degenerate: Vec<Category>,
}

// ---------------------------------------------------------------------------
// Category z-scores
// ---------------------------------------------------------------------------

/// Plain z-scores for a counting stat. The flag is false when the pool's
/// spread is zero, in which case every score is 0.
pub fn counting_zscores(values: &[f64]) -> (Vec<f64>, bool) {
    standardize(values)
}

/// Two-pass exposure-weighted z-scores for a rate stat.
///
/// 1. Standardize the raw rate across the pool.
/// 2. Multiply each z by the player's exposure (AB or IP).
/// 3. Standardize the weighted values again.
/// 4. Negate when lower raw values are better (ERA, WHIP).
///
/// A single low-exposure player with an extreme rate lands near the middle
/// after step 2, which a one-pass z would not do.
pub fn rate_zscores(rates: &[f64], exposures: &[f64], lower_is_better: bool) -> (Vec<f64>, bool) {
    let (first, defined) = standardize(rates);
    if !defined {
        return (first, false);
    }

    let weighted: Vec<f64> = first
        .iter()
        .zip(exposures)
        .map(|(z, exposure)| z * exposure)
        .collect();

    let (mut final_z, defined) = standardize(&weighted);
    if defined && lower_is_better {
        for z in &mut final_z {
            *z = -*z;
        }
    }
    (final_z, defined)
}

/// Compute every category z-score and the weighted total for one group.
///
/// Players are expected to all belong to `group`; a player from the other
/// group contributes 0 to every stat.
pub fn compute_group_zscores(
    players: &[&Player],
    group: CategoryGroup,
    settings: &LeagueSettings,
) -> GroupZScores {
    let n = players.len();
    let mut scores = vec![CategoryScores::default(); n];
    let mut degenerate = Vec::new();

    let exposures: Vec<f64> = players.iter().map(|p| p.projection.exposure()).collect();

    for &category in group.categories() {
        let values: Vec<f64> = players
            .iter()
            .map(|p| p.projection.stat(category).unwrap_or(0.0))
            .collect();

        let (z, defined) = if category.is_rate() {
            rate_zscores(&values, &exposures, category.lower_is_better())
        } else {
            counting_zscores(&values)
        };

        if !defined && n > 0 && settings.categories.contains(category) {
            degenerate.push(category);
        }

        for (score, value) in scores.iter_mut().zip(z) {
            score.set(category, value);
        }
    }

    let totals = scores
        .iter()
        .map(|s| {
            settings
                .categories
                .in_group(group)
                .map(|c| settings.weights.get(c) * s.get(c))
                .sum::<f64>()
        })
        .collect();

    GroupZScores {
        scores,
        totals,
        degenerate,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
