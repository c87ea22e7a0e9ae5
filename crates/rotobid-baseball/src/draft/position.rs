// Roster positions a drafted player can be slotted into.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Baseball positions and roster meta-slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Catcher,
    FirstBase,
    SecondBase,
    ThirdBase,
    ShortStop,
    CornerInfield,
    MiddleInfield,
    Outfield,
    Utility,
    Pitcher,
    StartingPitcher,
    ReliefPitcher,
    Bench,
}

impl Position {
    /// Parse a position abbreviation.
    ///
    /// - "LF"/"CF"/"RF" -> Outfield
    /// - "U"/"UT"/"UTIL"/"DH" -> Utility
    /// - "BE"/"BN"/"RES" -> Bench
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" => Some(Position::Catcher),
            "1B" => Some(Position::FirstBase),
            "2B" => Some(Position::SecondBase),
            "3B" => Some(Position::ThirdBase),
            "SS" => Some(Position::ShortStop),
            "CI" => Some(Position::CornerInfield),
            "MI" => Some(Position::MiddleInfield),
            "OF" | "LF" | "CF" | "RF" => Some(Position::Outfield),
            "U" | "UT" | "UTIL" | "DH" => Some(Position::Utility),
            "P" => Some(Position::Pitcher),
            "SP" => Some(Position::StartingPitcher),
            "RP" => Some(Position::ReliefPitcher),
            "BE" | "BN" | "RES" => Some(Position::Bench),
            _ => None,
        }
    }

    /// Parse a multi-position eligibility string such as "SS/2B" or "1B,OF".
    /// Unknown tokens are dropped.
    pub fn parse_list(s: &str) -> Vec<Self> {
        let mut out = Vec::new();
        for token in s.split(['/', ',', ' ']) {
            if let Some(pos) = Self::from_str_pos(token) {
                if !out.contains(&pos) {
                    out.push(pos);
                }
            }
        }
        out
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Catcher => "C",
            Position::FirstBase => "1B",
            Position::SecondBase => "2B",
            Position::ThirdBase => "3B",
            Position::ShortStop => "SS",
            Position::CornerInfield => "CI",
            Position::MiddleInfield => "MI",
            Position::Outfield => "OF",
            Position::Utility => "U",
            Position::Pitcher => "P",
            Position::StartingPitcher => "SP",
            Position::ReliefPitcher => "RP",
            Position::Bench => "BE",
        }
    }

    /// Whether this is a hitting slot. Bench is neither hitting nor pitching.
    pub fn is_hitter(&self) -> bool {
        matches!(
            self,
            Position::Catcher
                | Position::FirstBase
                | Position::SecondBase
                | Position::ThirdBase
                | Position::ShortStop
                | Position::CornerInfield
                | Position::MiddleInfield
                | Position::Outfield
                | Position::Utility
        )
    }

    pub fn is_pitcher(&self) -> bool {
        matches!(
            self,
            Position::Pitcher | Position::StartingPitcher | Position::ReliefPitcher
        )
    }

    /// Deterministic ordering index for roster display.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Catcher => 0,
            Position::FirstBase => 1,
            Position::SecondBase => 2,
            Position::ThirdBase => 3,
            Position::ShortStop => 4,
            Position::CornerInfield => 5,
            Position::MiddleInfield => 6,
            Position::Outfield => 7,
            Position::Utility => 8,
            Position::Pitcher => 9,
            Position::StartingPitcher => 10,
            Position::ReliefPitcher => 11,
            Position::Bench => 12,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}
