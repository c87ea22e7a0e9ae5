// Live price inflation during a draft.
//
// Compares the money still unspent with the projected value still on the
// board. When owners overpay, less money chases the same remaining value and
// the multiplier drops below 1.0; bargains push it above 1.0.

use rotobid_core::config::LeagueSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::player::Player;
use crate::valuation::Valuations;

/// Lower clamp on the multiplier.
pub const MIN_INFLATION: f64 = 0.5;
/// Upper clamp on the multiplier.
pub const MAX_INFLATION: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerState {
    /// No draft activity since the last update.
    Steady,
    /// A draft or return happened and the multiplier is stale.
    Recalculating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflationTracker {
    state: TrackerState,
    /// `owner_count × budget`.
    pub total_budget: f64,
    /// Sum of amounts paid for drafted players.
    pub total_spent: f64,
    /// Sum of dollar estimates of drafted players.
    pub drafted_value: f64,
    pub cost_remaining: f64,
    pub value_remaining: f64,
    /// Clamped to `[MIN_INFLATION, MAX_INFLATION]`.
    pub inflation: f64,
}

/// `cost_remaining / value_remaining`, clamped. 1.0 when no value remains.
pub fn inflation_rate(cost_remaining: f64, value_remaining: f64) -> f64 {
    if value_remaining == 0.0 {
        return 1.0;
    }
    (cost_remaining / value_remaining).clamp(MIN_INFLATION, MAX_INFLATION)
}

impl InflationTracker {
    pub fn new() -> Self {
        InflationTracker {
            state: TrackerState::Steady,
            total_budget: 0.0,
            total_spent: 0.0,
            drafted_value: 0.0,
            cost_remaining: 0.0,
            value_remaining: 0.0,
            inflation: 1.0,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Flag the multiplier stale after a draft or return.
    pub fn mark_dirty(&mut self) {
        self.state = TrackerState::Recalculating;
    }

    /// Recompute the multiplier from the current draft state.
    ///
    /// 1. `cost_remaining` = `owner_count × budget - Σ amount_paid` (drafted)
    /// 2. `value_remaining` = `owner_count × budget - Σ estimate` (drafted)
    /// 3. `inflation` = `cost_remaining / value_remaining`, clamped
    pub fn update(&mut self, players: &[Player], valuations: &Valuations, settings: &LeagueSettings) {
        let drafted = players.iter().filter(|p| p.is_drafted());

        let mut spent = 0.0;
        let mut value = 0.0;
        for player in drafted {
            spent += player.draft.amount_paid as f64;
            value += valuations.dollars(player.id);
        }

        self.total_budget = settings.total_budget();
        self.total_spent = spent;
        self.drafted_value = value;
        self.cost_remaining = self.total_budget - spent;
        self.value_remaining = self.total_budget - value;
        self.inflation = inflation_rate(self.cost_remaining, self.value_remaining);
        self.state = TrackerState::Steady;

        debug!(
            spent,
            drafted_value = value,
            inflation = self.inflation,
            "inflation updated"
        );
    }

    /// Price to show for a player: what was paid if drafted, otherwise the
    /// estimate scaled by the current multiplier.
    pub fn display_price(&self, player: &Player, valuations: &Valuations) -> f64 {
        if player.is_drafted() {
            player.draft.amount_paid as f64
        } else {
            valuations.dollars(player.id) * self.inflation
        }
    }
}

impl Default for InflationTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{HittingLine, Player};
    use crate::valuation::recompute;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn settings() -> LeagueSettings {
        let mut s = LeagueSettings::default();
        s.owner_count = 2;
        s.budget = 50;
        s.hitting_split = 1.0;
        s.hitting_slots = [("U".to_string(), 1)].into_iter().collect();
        s.pitching_slots.clear();
        s
    }

    fn hitters() -> Vec<Player> {
        [(30, 5), (22, 12), (15, 20), (8, 2), (5, 1)]
            .into_iter()
            .enumerate()
            .map(|(i, (hr, sb))| {
                Player::hitter(
                    i as u32 + 1,
                    &format!("H{i}"),
                    "CHC",
                    HittingLine {
                        pa: 600,
                        ab: 540,
                        h: 140 + i as u32,
                        hr,
                        r: 80,
                        rbi: 70 + hr,
                        sb,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn rate_is_one_before_any_draft() {
        let players = hitters();
        let s = settings();
        let vals = recompute(&players, &s);
        let mut tracker = InflationTracker::new();
        tracker.update(&players, &vals, &s);
        assert_eq!(tracker.inflation, 1.0);
        assert_eq!(tracker.cost_remaining, 100.0);
    }

    #[test]
    fn zero_value_remaining_is_neutral() {
        assert_eq!(inflation_rate(40.0, 0.0), 1.0);
    }

    #[test]
    fn rate_is_clamped() {
        assert_eq!(inflation_rate(1000.0, 10.0), MAX_INFLATION);
        assert_eq!(inflation_rate(1.0, 10.0), MIN_INFLATION);
        assert_eq!(inflation_rate(-5.0, 10.0), MIN_INFLATION);
        assert!(approx_eq(inflation_rate(90.0, 80.0), 1.125, 1e-12));
    }

    #[test]
    fn overpay_deflates_underpay_inflates() {
        let s = settings();
        let vals = recompute(&hitters(), &s);
        let top = vals.calculations().iter().find(|c| c.category_rank == 1).unwrap();
        let estimate = top.dollars;

        let mut players = hitters();
        let idx = players.iter().position(|p| p.id == top.player).unwrap();
        players[idx].draft.owner = 1;
        players[idx].draft.amount_paid = estimate.ceil() as u32 + 5;

        let mut tracker = InflationTracker::new();
        tracker.mark_dirty();
        assert_eq!(tracker.state(), TrackerState::Recalculating);
        tracker.update(&players, &vals, &s);
        assert_eq!(tracker.state(), TrackerState::Steady);
        assert!(tracker.inflation < 1.0);

        players[idx].draft.amount_paid = 1;
        tracker.update(&players, &vals, &s);
        assert!(tracker.inflation > 1.0);
        let expected = (100.0 - 1.0) / (100.0 - estimate);
        assert!(approx_eq(tracker.inflation, expected.min(MAX_INFLATION), 1e-12));
    }

    #[test]
    fn display_price_uses_paid_amount_for_drafted() {
        let s = settings();
        let mut players = hitters();
        let vals = recompute(&players, &s);
        players[0].draft.owner = 2;
        players[0].draft.amount_paid = 17;

        let mut tracker = InflationTracker::new();
        tracker.update(&players, &vals, &s);

        assert_eq!(tracker.display_price(&players[0], &vals), 17.0);
        let undrafted = &players[1];
        assert!(approx_eq(
            tracker.display_price(undrafted, &vals),
            vals.dollars(undrafted.id) * tracker.inflation,
            1e-12
        ));
    }
}
