// Projection loading (hitter and pitcher CSVs) and eligibility filtering.
//
// Counting stats may be fractional in the source and are rounded; IP stays
// fractional. Rows with missing or invalid numbers are skipped with a warning.

use std::io::Read;
use std::path::Path;

use rotobid_core::config::{DataPaths, LeagueSettings, LeagueType};
use serde::Deserialize;
use tracing::{info, warn};

use crate::draft::position::Position;
use crate::player::{HittingLine, PitchingLine, Player, PlayerId, Projection};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV rows (private)
// ---------------------------------------------------------------------------

/// Hitter CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawHitter {
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(default, alias = "Pos")]
    POS: String,
    #[serde(default)]
    Age: Option<f64>,
    #[serde(default, alias = "Experience")]
    Exp: Option<f64>,
    #[serde(default)]
    PA: f64,
    AB: f64,
    H: f64,
    HR: f64,
    R: f64,
    RBI: f64,
    SB: f64,
}

/// Pitcher CSV row. `K` is accepted for `SO`.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawPitcher {
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(default, alias = "Pos")]
    POS: String,
    #[serde(default)]
    Age: Option<f64>,
    #[serde(default, alias = "Experience")]
    Exp: Option<f64>,
    IP: f64,
    H: f64,
    BB: f64,
    ER: f64,
    #[serde(alias = "K")]
    SO: f64,
    W: f64,
    SV: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// All values finite and non-negative.
fn all_valid(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite() && *v >= 0.0)
}

fn count(v: f64) -> u32 {
    v.round() as u32
}

fn optional_count(v: Option<f64>) -> Option<u32> {
    v.filter(|x| x.is_finite() && *x >= 0.0).map(count)
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

/// Parse hitters, assigning ids from `first_id` upward in row order.
pub fn load_hitters_from_reader<R: Read>(rdr: R, first_id: PlayerId) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut hitters = Vec::new();
    for result in reader.deserialize::<RawHitter>() {
        match result {
            Ok(raw) => {
                let name = raw.Name.trim();
                if !all_valid(&[raw.PA, raw.AB, raw.H, raw.HR, raw.R, raw.RBI, raw.SB]) {
                    warn!("skipping hitter '{}': missing, negative or non-finite stat", name);
                    continue;
                }
                let line = HittingLine {
                    pa: count(raw.PA),
                    ab: count(raw.AB),
                    h: count(raw.H),
                    hr: count(raw.HR),
                    r: count(raw.R),
                    rbi: count(raw.RBI),
                    sb: count(raw.SB),
                };
                hitters.push(Player {
                    id: first_id + hitters.len() as PlayerId,
                    name: name.to_string(),
                    team: raw.Team.trim().to_uppercase(),
                    age: optional_count(raw.Age),
                    experience: optional_count(raw.Exp),
                    positions: Position::parse_list(&raw.POS),
                    projection: Projection::Hitting(line),
                    draft: Default::default(),
                });
            }
            Err(e) => {
                warn!("skipping malformed hitter row: {}", e);
            }
        }
    }
    Ok(hitters)
}

/// Parse pitchers, assigning ids from `first_id` upward in row order.
pub fn load_pitchers_from_reader<R: Read>(rdr: R, first_id: PlayerId) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut pitchers = Vec::new();
    for result in reader.deserialize::<RawPitcher>() {
        match result {
            Ok(raw) => {
                let name = raw.Name.trim();
                if !all_valid(&[raw.IP, raw.H, raw.BB, raw.ER, raw.SO, raw.W, raw.SV]) {
                    warn!("skipping pitcher '{}': missing, negative or non-finite stat", name);
                    continue;
                }
                let line = PitchingLine {
                    ip: raw.IP,
                    h: count(raw.H),
                    bb: count(raw.BB),
                    er: count(raw.ER),
                    so: count(raw.SO),
                    w: count(raw.W),
                    sv: count(raw.SV),
                };
                let mut positions: Vec<Position> = Position::parse_list(&raw.POS)
                    .into_iter()
                    .filter(|p| p.is_pitcher())
                    .collect();
                if positions.is_empty() {
                    positions.push(Position::Pitcher);
                }
                pitchers.push(Player {
                    id: first_id + pitchers.len() as PlayerId,
                    name: name.to_string(),
                    team: raw.Team.trim().to_uppercase(),
                    age: optional_count(raw.Age),
                    experience: optional_count(raw.Exp),
                    positions,
                    projection: Projection::Pitching(line),
                    draft: Default::default(),
                });
            }
            Err(e) => {
                warn!("skipping malformed pitcher row: {}", e);
            }
        }
    }
    Ok(pitchers)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

pub fn load_hitter_projections(path: &Path, first_id: PlayerId) -> Result<Vec<Player>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_hitters_from_reader(file, first_id).map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_pitcher_projections(path: &Path, first_id: PlayerId) -> Result<Vec<Player>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_pitchers_from_reader(file, first_id).map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load both files: hitters get ids from 1, pitchers continue after them.
pub fn load_all(paths: &DataPaths) -> Result<Vec<Player>, ProjectionError> {
    let mut players = load_hitter_projections(Path::new(&paths.hitters), 1)?;
    if players.is_empty() {
        return Err(ProjectionError::Validation(
            "hitter CSV produced zero valid rows".into(),
        ));
    }

    let next_id = players.len() as PlayerId + 1;
    let pitchers = load_pitcher_projections(Path::new(&paths.pitchers), next_id)?;
    if pitchers.is_empty() {
        return Err(ProjectionError::Validation(
            "pitcher CSV produced zero valid rows".into(),
        ));
    }

    info!(
        "loaded {} hitters and {} pitchers",
        players.len(),
        pitchers.len()
    );
    players.extend(pitchers);
    Ok(players)
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

const AL_TEAMS: &[&str] = &[
    "BAL", "BOS", "NYY", "TB", "TBR", "TOR", "CWS", "CHW", "CLE", "DET", "KC", "KCR", "MIN",
    "HOU", "LAA", "OAK", "ATH", "SEA", "TEX",
];

const NL_TEAMS: &[&str] = &[
    "ATL", "MIA", "NYM", "PHI", "WSH", "WAS", "WSN", "CHC", "CIN", "MIL", "PIT", "STL", "ARI",
    "AZ", "COL", "LAD", "SD", "SDP", "SF", "SFG",
];

/// Whether a team abbreviation belongs to the league's player universe.
pub fn team_in_league(team: &str, league_type: LeagueType) -> bool {
    let team = team.trim().to_uppercase();
    match league_type {
        LeagueType::Mixed => true,
        LeagueType::AL => AL_TEAMS.contains(&team.as_str()),
        LeagueType::NL => NL_TEAMS.contains(&team.as_str()),
    }
}

/// Keep players meeting the AB/IP minimums and the league type. Load order
/// is preserved.
pub fn eligible(players: Vec<Player>, settings: &LeagueSettings) -> Vec<Player> {
    let before = players.len();
    let kept: Vec<Player> = players
        .into_iter()
        .filter(|p| team_in_league(&p.team, settings.league_type))
        .filter(|p| match &p.projection {
            Projection::Hitting(h) => h.ab >= settings.min_ab,
            Projection::Pitching(pl) => pl.ip >= settings.min_ip,
        })
        .collect();
    if kept.len() < before {
        info!("eligibility filter kept {} of {} players", kept.len(), before);
    }
    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rotobid_core::config::CategoryGroup;

    fn hitting(p: &Player) -> HittingLine {
        match p.projection {
            Projection::Hitting(h) => h,
            _ => panic!("expected hitter"),
        }
    }

    fn pitching(p: &Player) -> PitchingLine {
        match p.projection {
            Projection::Pitching(l) => l,
            _ => panic!("expected pitcher"),
        }
    }

    #[test]
    fn hitter_csv_parses_rows_in_order() {
        let csv_data = "\
Name,Team,POS,Age,PA,AB,H,HR,R,RBI,SB
Aaron Judge,nyy,OF,33,700,600,180,50,120,130,5
Bobby Witt,KC,SS/3B,25,690,620,190,30,110,100,35";

        let hitters = load_hitters_from_reader(csv_data.as_bytes(), 1).unwrap();
        assert_eq!(hitters.len(), 2);
        assert_eq!(hitters[0].id, 1);
        assert_eq!(hitters[1].id, 2);
        assert_eq!(hitters[0].name, "Aaron Judge");
        assert_eq!(hitters[0].team, "NYY");
        assert_eq!(hitters[0].age, Some(33));
        assert_eq!(hitters[0].positions, vec![Position::Outfield]);
        assert_eq!(hitters[1].positions, vec![Position::ShortStop, Position::ThirdBase]);

        let line = hitting(&hitters[0]);
        assert_eq!(line.ab, 600);
        assert_eq!(line.hr, 50);
        assert!((line.avg() - 0.300).abs() < 1e-12);
    }

    #[test]
    fn hitter_fractional_stats_rounded() {
        let csv_data = "\
Name,Team,PA,AB,H,HR,R,RBI,SB
Aaron Judge,NYY,699.6,600.4,180.3,50.7,120.1,130.9,5.2";
        let hitters = load_hitters_from_reader(csv_data.as_bytes(), 1).unwrap();
        let line = hitting(&hitters[0]);
        assert_eq!(line.pa, 700);
        assert_eq!(line.ab, 600);
        assert_eq!(line.hr, 51);
        assert_eq!(line.rbi, 131);
        assert!(hitters[0].positions.is_empty());
    }

    #[test]
    fn extra_columns_ignored() {
        let csv_data = "\
Name,Team,PA,AB,H,HR,R,RBI,SB,OBP,SLG
Aaron Judge,NYY,700,600,180,50,120,130,5,0.420,0.650";
        let hitters = load_hitters_from_reader(csv_data.as_bytes(), 1).unwrap();
        assert_eq!(hitters.len(), 1);
    }

    #[test]
    fn malformed_and_negative_rows_skipped() {
        let csv_data = "\
Name,Team,PA,AB,H,HR,R,RBI,SB
Good,NYY,700,600,180,50,120,130,5
Bad,NYY,abc,600,180,50,120,130,5
Negative,NYY,700,-10,180,50,120,130,5
Also Good,BOS,600,500,150,20,80,70,10";
        let hitters = load_hitters_from_reader(csv_data.as_bytes(), 1).unwrap();
        let names: Vec<&str> = hitters.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Good", "Also Good"]);
        assert_eq!(hitters[1].id, 2);
    }

    #[test]
    fn pitcher_csv_keeps_fractional_ip_and_k_alias() {
        let csv_data = "\
Name,Team,POS,IP,H,BB,ER,K,W,SV
Tarik Skubal,DET,SP,191.2,150,40,55,230,15,0
Emmanuel Clase,CLE,RP,70,50,15,15,70,4,40";
        let pitchers = load_pitchers_from_reader(csv_data.as_bytes(), 10).unwrap();
        assert_eq!(pitchers.len(), 2);
        assert_eq!(pitchers[0].id, 10);
        let line = pitching(&pitchers[0]);
        assert!((line.ip - 191.2).abs() < 1e-12);
        assert_eq!(line.so, 230);
        assert_eq!(pitchers[0].positions, vec![Position::StartingPitcher]);
        assert_eq!(pitchers[1].positions, vec![Position::ReliefPitcher]);
        assert_eq!(pitchers[1].group(), CategoryGroup::Pitching);
    }

    #[test]
    fn pitcher_without_pos_is_generic() {
        let csv_data = "\
Name,Team,IP,H,BB,ER,SO,W,SV
Arm,SEA,100,90,30,40,100,6,0";
        let pitchers = load_pitchers_from_reader(csv_data.as_bytes(), 1).unwrap();
        assert_eq!(pitchers[0].positions, vec![Position::Pitcher]);
    }

    #[test]
    fn empty_csv_returns_empty_vec() {
        let csv_data = "Name,Team,PA,AB,H,HR,R,RBI,SB\n";
        assert!(load_hitters_from_reader(csv_data.as_bytes(), 1).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_hitter_projections(Path::new("/nonexistent/rotobid/hitters.csv"), 1)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::Io { .. }));
    }

    #[test]
    fn eligibility_applies_minimums_and_league_type() {
        let mut players = Vec::new();
        players.push(Player::hitter(
            1,
            "Regular",
            "NYY",
            HittingLine {
                ab: 500,
                ..Default::default()
            },
        ));
        players.push(Player::hitter(
            2,
            "Bench Bat",
            "NYY",
            HittingLine {
                ab: 90,
                ..Default::default()
            },
        ));
        players.push(Player::hitter(
            3,
            "Dodger",
            "LAD",
            HittingLine {
                ab: 550,
                ..Default::default()
            },
        ));
        players.push(Player::pitcher(
            4,
            "Opener",
            "TB",
            PitchingLine {
                ip: 20.0,
                ..Default::default()
            },
        ));
        players.push(Player::pitcher(
            5,
            "Starter",
            "BOS",
            PitchingLine {
                ip: 160.0,
                ..Default::default()
            },
        ));

        let mut settings = LeagueSettings::default();
        settings.min_ab = 100;
        settings.min_ip = 40.0;

        let mixed: Vec<PlayerId> = eligible(players.clone(), &settings).iter().map(|p| p.id).collect();
        assert_eq!(mixed, vec![1, 3, 5]);

        settings.league_type = LeagueType::AL;
        let al: Vec<PlayerId> = eligible(players.clone(), &settings).iter().map(|p| p.id).collect();
        assert_eq!(al, vec![1, 5]);

        settings.league_type = LeagueType::NL;
        let nl: Vec<PlayerId> = eligible(players, &settings).iter().map(|p| p.id).collect();
        assert_eq!(nl, vec![3]);
    }
}
