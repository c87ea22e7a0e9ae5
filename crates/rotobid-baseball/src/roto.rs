// Rotisserie standings from owners' drafted players.

use std::collections::BTreeMap;

use rotobid_core::config::{Category, LeagueSettings};
use serde::{Deserialize, Serialize};

use crate::player::{OwnerId, Player, Projection};

// ---------------------------------------------------------------------------
// Owner totals
// ---------------------------------------------------------------------------

/// Summed projected stats for one owner's roster. Rate stats are derived
/// from the summed components, not averaged per player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnerTotals {
    pub owner: OwnerId,
    pub ab: u64,
    pub h: u64,
    pub r: u64,
    pub hr: u64,
    pub rbi: u64,
    pub sb: u64,
    pub ip: f64,
    pub hits_allowed: u64,
    pub bb: u64,
    pub er: u64,
    pub so: u64,
    pub w: u64,
    pub sv: u64,
}

impl OwnerTotals {
    pub fn add(&mut self, projection: &Projection) {
        match projection {
            Projection::Hitting(line) => {
                self.ab += line.ab as u64;
                self.h += line.h as u64;
                self.r += line.r as u64;
                self.hr += line.hr as u64;
                self.rbi += line.rbi as u64;
                self.sb += line.sb as u64;
            }
            Projection::Pitching(line) => {
                self.ip += line.ip;
                self.hits_allowed += line.h as u64;
                self.bb += line.bb as u64;
                self.er += line.er as u64;
                self.so += line.so as u64;
                self.w += line.w as u64;
                self.sv += line.sv as u64;
            }
        }
    }

    /// Raw category value. Rate stats are 0 with no AB/IP.
    pub fn value(&self, category: Category) -> f64 {
        match category {
            Category::AVG => ratio(self.h as f64, self.ab as f64),
            Category::R => self.r as f64,
            Category::HR => self.hr as f64,
            Category::RBI => self.rbi as f64,
            Category::SB => self.sb as f64,
            Category::ERA => ratio(9.0 * self.er as f64, self.ip),
            Category::WHIP => ratio((self.hits_allowed + self.bb) as f64, self.ip),
            Category::W => self.w as f64,
            Category::SO => self.so as f64,
            Category::SV => self.sv as f64,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den <= 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Totals for owners `1..=owner_count`, indexed by `owner - 1`. Players owned
/// by ids outside that range are ignored.
pub fn aggregate_owner_totals(players: &[Player], owner_count: usize) -> Vec<OwnerTotals> {
    let mut totals: Vec<OwnerTotals> = (1..=owner_count)
        .map(|id| OwnerTotals {
            owner: id as OwnerId,
            ..Default::default()
        })
        .collect();

    for player in players.iter().filter(|p| p.is_drafted()) {
        let slot = player.draft.owner as usize;
        if let Some(t) = totals.get_mut(slot.wrapping_sub(1)) {
            t.add(&player.projection);
        }
    }
    totals
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Points per owner for one category.
///
/// Owners are ranked 1..N ascending by raw value; ties keep owner order, so
/// the ranks are always a permutation. Lower-is-better categories are
/// inverted (`N - rank + 1`) so the best owner still gets N.
pub fn rank_category(values: &[f64], lower_is_better: bool) -> Vec<usize> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0; n];
    for (position, &owner_index) in order.iter().enumerate() {
        let rank = position + 1;
        ranks[owner_index] = if lower_is_better { n - rank + 1 } else { rank };
    }
    ranks
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerStanding {
    pub owner: OwnerId,
    pub totals: OwnerTotals,
    /// Points earned in each enabled category.
    pub category_points: BTreeMap<Category, usize>,
    pub total_points: usize,
    /// 1-based final place.
    pub place: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    /// Indexed by `owner - 1`.
    pub owners: Vec<OwnerStanding>,
}

impl Standings {
    pub fn owner(&self, owner: OwnerId) -> Option<&OwnerStanding> {
        (owner as usize)
            .checked_sub(1)
            .and_then(|i| self.owners.get(i))
    }

    /// Standings sorted by final place.
    pub fn by_place(&self) -> Vec<&OwnerStanding> {
        let mut sorted: Vec<&OwnerStanding> = self.owners.iter().collect();
        sorted.sort_by_key(|s| s.place);
        sorted
    }
}

/// Full standings recompute over the enabled categories.
///
/// 1. Sum each owner's drafted players.
/// 2. Rank owners per category (inverting ERA/WHIP) and sum the points.
/// 3. Order owners by points descending, ties by owner id, for final place.
pub fn compute_standings(players: &[Player], settings: &LeagueSettings) -> Standings {
    let totals = aggregate_owner_totals(players, settings.owner_count);

    let mut owners: Vec<OwnerStanding> = totals
        .iter()
        .map(|t| OwnerStanding {
            owner: t.owner,
            totals: *t,
            category_points: BTreeMap::new(),
            total_points: 0,
            place: 0,
        })
        .collect();

    for category in settings.categories.iter() {
        let values: Vec<f64> = totals.iter().map(|t| t.value(category)).collect();
        let ranks = rank_category(&values, category.lower_is_better());
        for (standing, rank) in owners.iter_mut().zip(ranks) {
            standing.category_points.insert(category, rank);
            standing.total_points += rank;
        }
    }

    let mut order: Vec<usize> = (0..owners.len()).collect();
    order.sort_by(|&a, &b| owners[b].total_points.cmp(&owners[a].total_points));
    for (position, &i) in order.iter().enumerate() {
        owners[i].place = position + 1;
    }

    Standings { owners }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
