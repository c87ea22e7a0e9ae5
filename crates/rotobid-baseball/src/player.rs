// Player records: identity, projected stat line, and per-player draft state.

use rotobid_core::config::{Category, CategoryGroup};
use serde::{Deserialize, Serialize};

use crate::draft::position::Position;

pub type PlayerId = u32;
pub type OwnerId = u32;

/// Owner id reserved for "not drafted".
pub const UNOWNED: OwnerId = 0;

// ---------------------------------------------------------------------------
// Projection lines
// ---------------------------------------------------------------------------

/// Projected season stats for a hitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HittingLine {
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub hr: u32,
    pub r: u32,
    pub rbi: u32,
    pub sb: u32,
}

impl HittingLine {
    /// `H / AB`, or 0 with no at-bats.
    pub fn avg(&self) -> f64 {
        if self.ab == 0 {
            0.0
        } else {
            self.h as f64 / self.ab as f64
        }
    }
}

/// Projected season stats for a pitcher. IP stays fractional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchingLine {
    pub ip: f64,
    pub h: u32,
    pub bb: u32,
    pub er: u32,
    pub so: u32,
    pub w: u32,
    pub sv: u32,
}

impl PitchingLine {
    /// `9 × ER / IP`, or 0 with no innings.
    pub fn era(&self) -> f64 {
        if self.ip <= 0.0 {
            0.0
        } else {
            9.0 * self.er as f64 / self.ip
        }
    }

    /// `(H + BB) / IP`, or 0 with no innings.
    pub fn whip(&self) -> f64 {
        if self.ip <= 0.0 {
            0.0
        } else {
            (self.h + self.bb) as f64 / self.ip
        }
    }
}

/// Category-specific projection payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "group", rename_all = "lowercase")]
pub enum Projection {
    Hitting(HittingLine),
    Pitching(PitchingLine),
}

impl Projection {
    pub fn group(&self) -> CategoryGroup {
        match self {
            Projection::Hitting(_) => CategoryGroup::Hitting,
            Projection::Pitching(_) => CategoryGroup::Pitching,
        }
    }

    /// Raw value of a category for this line. Categories from the other
    /// group yield `None`.
    pub fn stat(&self, category: Category) -> Option<f64> {
        match (self, category) {
            (Projection::Hitting(h), Category::AVG) => Some(h.avg()),
            (Projection::Hitting(h), Category::R) => Some(h.r as f64),
            (Projection::Hitting(h), Category::HR) => Some(h.hr as f64),
            (Projection::Hitting(h), Category::RBI) => Some(h.rbi as f64),
            (Projection::Hitting(h), Category::SB) => Some(h.sb as f64),
            (Projection::Pitching(p), Category::ERA) => Some(p.era()),
            (Projection::Pitching(p), Category::WHIP) => Some(p.whip()),
            (Projection::Pitching(p), Category::W) => Some(p.w as f64),
            (Projection::Pitching(p), Category::SO) => Some(p.so as f64),
            (Projection::Pitching(p), Category::SV) => Some(p.sv as f64),
            _ => None,
        }
    }

    /// Playing-time weight for rate stats: AB for hitters, IP for pitchers.
    pub fn exposure(&self) -> f64 {
        match self {
            Projection::Hitting(h) => h.ab as f64,
            Projection::Pitching(p) => p.ip,
        }
    }
}

// ---------------------------------------------------------------------------
// Draft state
// ---------------------------------------------------------------------------

/// Who owns a player and what they paid. Changes as a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub owner: OwnerId,
    pub amount_paid: u32,
    pub position: Option<Position>,
}

impl DraftState {
    pub fn undrafted() -> Self {
        Self::default()
    }

    pub fn is_drafted(&self) -> bool {
        self.owner != UNOWNED
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub age: Option<u32>,
    pub experience: Option<u32>,
    pub positions: Vec<Position>,
    pub projection: Projection,
    #[serde(default)]
    pub draft: DraftState,
}

impl Player {
    pub fn hitter(id: PlayerId, name: &str, team: &str, line: HittingLine) -> Self {
        Player {
            id,
            name: name.to_string(),
            team: team.to_string(),
            age: None,
            experience: None,
            positions: Vec::new(),
            projection: Projection::Hitting(line),
            draft: DraftState::undrafted(),
        }
    }

    pub fn pitcher(id: PlayerId, name: &str, team: &str, line: PitchingLine) -> Self {
        Player {
            id,
            name: name.to_string(),
            team: team.to_string(),
            age: None,
            experience: None,
            positions: vec![Position::Pitcher],
            projection: Projection::Pitching(line),
            draft: DraftState::undrafted(),
        }
    }

    pub fn group(&self) -> CategoryGroup {
        self.projection.group()
    }

    pub fn is_drafted(&self) -> bool {
        self.draft.is_drafted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_stats_zero_on_zero_denominator() {
        assert_eq!(HittingLine::default().avg(), 0.0);
        let p = PitchingLine::default();
        assert_eq!(p.era(), 0.0);
        assert_eq!(p.whip(), 0.0);
    }

    #[test]
    fn rate_stats_from_components() {
        let h = HittingLine {
            ab: 500,
            h: 150,
            ..Default::default()
        };
        assert!((h.avg() - 0.300).abs() < 1e-12);

        let p = PitchingLine {
            ip: 180.0,
            h: 150,
            bb: 48,
            er: 60,
            ..Default::default()
        };
        assert!((p.era() - 3.0).abs() < 1e-12);
        assert!((p.whip() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn stat_is_none_for_other_group() {
        let proj = Projection::Hitting(HittingLine::default());
        assert!(proj.stat(Category::HR).is_some());
        assert!(proj.stat(Category::ERA).is_none());
        assert_eq!(proj.group(), CategoryGroup::Hitting);
    }

    #[test]
    fn new_players_are_undrafted() {
        let p = Player::pitcher(7, "Ace", "SEA", PitchingLine::default());
        assert!(!p.is_drafted());
        assert_eq!(p.draft.owner, UNOWNED);
        assert_eq!(p.group(), CategoryGroup::Pitching);
    }
}
