// Draft session: player arena, live draft state, and the derived views
// (valuations, inflation, owner budgets, standings) kept in step with it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rotobid_core::config::{CategoryGroup, ConfigError, LeagueSettings, OwnerConfig};
use rotobid_core::db::{ActionKind, ActionRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::position::Position;
use crate::player::{DraftState, OwnerId, Player, PlayerId, UNOWNED};
use crate::roto::{compute_standings, Standings};
use crate::valuation::inflation::InflationTracker;
use crate::valuation::zscore::CategoryScores;
use crate::valuation::{recompute, Valuations};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A draft action that cannot be applied to the current state. Nothing is
/// mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error("unknown player id {0}")]
    UnknownPlayer(PlayerId),

    #[error("owner id 0 is reserved for undrafted players")]
    ReservedOwner,

    #[error("unknown owner id {owner} (league has {owner_count} owners)")]
    UnknownOwner { owner: OwnerId, owner_count: usize },

    #[error("player {player} is already owned by owner {owner}")]
    AlreadyDrafted { player: PlayerId, owner: OwnerId },

    #[error("player {0} is not drafted")]
    NotDrafted(PlayerId),

    #[error("unrecognized position '{0}'")]
    UnknownPosition(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("duplicate player id {0} in pool")]
    DuplicatePlayer(PlayerId),

    #[error("snapshot references unknown player id {0}")]
    UnknownSnapshotPlayer(PlayerId),

    #[error("owner {owner} holds players but the league has {owner_count} owners")]
    OwnerOutOfRange { owner: OwnerId, owner_count: usize },

    #[error("failed to replay action {seq}: {source}")]
    Replay { seq: u32, source: DraftError },
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The two mutations a draft supports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DraftAction {
    Draft {
        player: PlayerId,
        owner: OwnerId,
        amount_paid: u32,
        position: Position,
    },
    Return {
        player: PlayerId,
    },
}

impl DraftAction {
    pub fn player(&self) -> PlayerId {
        match self {
            DraftAction::Draft { player, .. } | DraftAction::Return { player } => *player,
        }
    }

    pub fn to_record(&self, seq: u32) -> ActionRecord {
        match *self {
            DraftAction::Draft {
                player,
                owner,
                amount_paid,
                position,
            } => ActionRecord {
                seq,
                kind: ActionKind::Draft,
                player_id: player,
                owner_id: owner,
                amount_paid,
                position: Some(position.display_str().to_string()),
            },
            DraftAction::Return { player } => ActionRecord {
                seq,
                kind: ActionKind::Return,
                player_id: player,
                owner_id: UNOWNED,
                amount_paid: 0,
                position: None,
            },
        }
    }

    pub fn from_record(record: &ActionRecord) -> Result<Self, DraftError> {
        match record.kind {
            ActionKind::Draft => {
                let raw = record.position.as_deref().unwrap_or("");
                let position = Position::from_str_pos(raw)
                    .ok_or_else(|| DraftError::UnknownPosition(raw.to_string()))?;
                Ok(DraftAction::Draft {
                    player: record.player_id,
                    owner: record.owner_id,
                    amount_paid: record.amount_paid,
                    position,
                })
            }
            ActionKind::Return => Ok(DraftAction::Return {
                player: record.player_id,
            }),
        }
    }
}

/// Result of an applied action.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftOutcome {
    pub action: DraftAction,
    /// The player's draft state before the action.
    pub previous: DraftState,
    /// Inflation multiplier after the action.
    pub inflation: f64,
    /// The price exceeded the owner's maximum legal bid. Recorded, not refused.
    pub over_max_bid: bool,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// An owner's roster and budget, derived from player draft states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerView {
    pub id: OwnerId,
    pub name: String,
    pub abbreviation: String,
    pub players: Vec<PlayerId>,
    pub spent: u32,
    /// Budget minus spent. Negative if the owner has overspent.
    pub remaining: i64,
    pub hitters: usize,
    pub pitchers: usize,
    pub spots_to_fill: usize,
    /// `remaining - spots_to_fill + 1`: the most an owner can bid while
    /// keeping $1 for each other open spot. 0 with a full roster.
    pub max_bid: i64,
}

impl OwnerView {
    pub fn filled(&self) -> usize {
        self.players.len()
    }
}

/// One row of ranked output for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub team: String,
    pub group: CategoryGroup,
    pub positions: Vec<Position>,
    pub category_rank: usize,
    pub z: CategoryScores,
    pub total_z: f64,
    pub rebased_z: f64,
    /// Unclipped dollar estimate.
    pub estimate: f64,
    /// Paid amount if drafted, otherwise `estimate × inflation`.
    pub display_price: f64,
    pub owner: OwnerId,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub player: PlayerId,
    pub owner: OwnerId,
    pub amount_paid: u32,
    pub position: Option<Position>,
}

/// Enough state to rebuild a session over the same player pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub settings: LeagueSettings,
    pub saved_at: DateTime<Utc>,
    pub pool_size: usize,
    /// Drafted players only; everyone else is undrafted.
    pub drafted: Vec<SnapshotEntry>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owns the player pool for the lifetime of a draft.
///
/// Valuations are recomputed in full on construction and on settings
/// changes. Draft and return actions only refresh the inflation multiplier
/// and the standings.
#[derive(Debug, Clone)]
pub struct DraftSession {
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
    settings: LeagueSettings,
    valuations: Valuations,
    inflation: InflationTracker,
    standings: Standings,
    log: Vec<DraftAction>,
}

impl DraftSession {
    /// Build a session. Any draft state already on the players is kept.
    pub fn new(players: Vec<Player>, settings: LeagueSettings) -> Result<Self, SessionError> {
        settings.validate()?;

        let mut index = HashMap::with_capacity(players.len());
        for (i, p) in players.iter().enumerate() {
            if index.insert(p.id, i).is_some() {
                return Err(SessionError::DuplicatePlayer(p.id));
            }
        }
        check_owner_range(&players, settings.owner_count)?;

        let valuations = recompute(&players, &settings);
        let mut session = DraftSession {
            players,
            index,
            settings,
            valuations,
            inflation: InflationTracker::new(),
            standings: Standings::default(),
            log: Vec::new(),
        };
        session.refresh_draft_views();
        Ok(session)
    }

    /// Rebuild a session from a snapshot over a freshly loaded pool.
    pub fn restore(mut players: Vec<Player>, snapshot: &DraftSnapshot) -> Result<Self, SessionError> {
        let positions: HashMap<PlayerId, usize> =
            players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
        for p in &mut players {
            p.draft = DraftState::undrafted();
        }
        for entry in &snapshot.drafted {
            let &i = positions
                .get(&entry.player)
                .ok_or(SessionError::UnknownSnapshotPlayer(entry.player))?;
            players[i].draft = DraftState {
                owner: entry.owner,
                amount_paid: entry.amount_paid,
                position: entry.position,
            };
        }
        if snapshot.pool_size != players.len() {
            warn!(
                "snapshot was taken over {} players, restoring onto {}",
                snapshot.pool_size,
                players.len()
            );
        }
        Self::new(players, snapshot.settings.clone())
    }

    // --- accessors ---

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.index.get(&id).map(|&i| &self.players[i])
    }

    /// Find a player by exact name, case-insensitively. First match in load order.
    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        let name = name.trim();
        self.players.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn settings(&self) -> &LeagueSettings {
        &self.settings
    }

    pub fn valuations(&self) -> &Valuations {
        &self.valuations
    }

    pub fn inflation(&self) -> &InflationTracker {
        &self.inflation
    }

    pub fn standings(&self) -> &Standings {
        &self.standings
    }

    /// Actions applied since construction, in order.
    pub fn log(&self) -> &[DraftAction] {
        &self.log
    }

    // --- mutations ---

    /// Replace the league settings and recompute everything.
    pub fn apply_settings(&mut self, settings: LeagueSettings) -> Result<(), SessionError> {
        settings.validate()?;
        check_owner_range(&self.players, settings.owner_count)?;
        self.settings = settings;
        self.valuations = recompute(&self.players, &self.settings);
        self.refresh_draft_views();
        info!(
            owners = self.settings.owner_count,
            budget = self.settings.budget,
            "settings applied, valuations recomputed"
        );
        Ok(())
    }

    /// Assign an undrafted player to an owner.
    pub fn draft(
        &mut self,
        player: PlayerId,
        owner: OwnerId,
        amount_paid: u32,
        position: Position,
    ) -> Result<DraftOutcome, DraftError> {
        self.apply(DraftAction::Draft {
            player,
            owner,
            amount_paid,
            position,
        })
    }

    /// Put a drafted player back in the pool.
    pub fn return_to_pool(&mut self, player: PlayerId) -> Result<DraftOutcome, DraftError> {
        self.apply(DraftAction::Return { player })
    }

    /// Validate and apply one action. Exactly one player's draft state changes.
    pub fn apply(&mut self, action: DraftAction) -> Result<DraftOutcome, DraftError> {
        let idx = *self
            .index
            .get(&action.player())
            .ok_or(DraftError::UnknownPlayer(action.player()))?;
        let previous = self.players[idx].draft;

        let (next, over_max_bid) = match action {
            DraftAction::Draft {
                player,
                owner,
                amount_paid,
                position,
            } => {
                if owner == UNOWNED {
                    return Err(DraftError::ReservedOwner);
                }
                if owner as usize > self.settings.owner_count {
                    return Err(DraftError::UnknownOwner {
                        owner,
                        owner_count: self.settings.owner_count,
                    });
                }
                if previous.is_drafted() {
                    return Err(DraftError::AlreadyDrafted {
                        player,
                        owner: previous.owner,
                    });
                }
                let max_bid = self.owner_view(owner).map_or(0, |v| v.max_bid);
                let over = amount_paid as i64 > max_bid;
                if over {
                    warn!(
                        "owner {owner} paid ${amount_paid} for player {player}, above max bid ${max_bid}"
                    );
                }
                (
                    DraftState {
                        owner,
                        amount_paid,
                        position: Some(position),
                    },
                    over,
                )
            }
            DraftAction::Return { player } => {
                if !previous.is_drafted() {
                    return Err(DraftError::NotDrafted(player));
                }
                (DraftState::undrafted(), false)
            }
        };

        self.players[idx].draft = next;
        self.log.push(action);
        self.refresh_draft_views();

        let p = &self.players[idx];
        match action {
            DraftAction::Draft {
                owner, amount_paid, position, ..
            } => info!(
                "{} ({}) drafted by owner {owner} for ${amount_paid} at {position}",
                p.name, p.id
            ),
            DraftAction::Return { .. } => info!(
                "{} ({}) returned to pool from owner {}",
                p.name, p.id, previous.owner
            ),
        }

        Ok(DraftOutcome {
            action,
            previous,
            inflation: self.inflation.inflation,
            over_max_bid,
        })
    }

    /// Apply persisted actions in order. Stops at the first one that fails.
    pub fn replay(&mut self, records: &[ActionRecord]) -> Result<usize, SessionError> {
        for record in records {
            let action = DraftAction::from_record(record).map_err(|source| SessionError::Replay {
                seq: record.seq,
                source,
            })?;
            self.apply(action).map_err(|source| SessionError::Replay {
                seq: record.seq,
                source,
            })?;
        }
        Ok(records.len())
    }

    fn refresh_draft_views(&mut self) {
        self.inflation.mark_dirty();
        self.inflation
            .update(&self.players, &self.valuations, &self.settings);
        self.standings = compute_standings(&self.players, &self.settings);
    }

    // --- derived views ---

    /// Player indices per owner id, slot 0 holding nothing.
    fn ownership_index(&self) -> Vec<Vec<usize>> {
        let mut owned = vec![Vec::new(); self.settings.owner_count + 1];
        for (i, p) in self.players.iter().enumerate() {
            if p.is_drafted() {
                if let Some(list) = owned.get_mut(p.draft.owner as usize) {
                    list.push(i);
                }
            }
        }
        owned
    }

    fn build_owner_view(&self, id: OwnerId, indices: &[usize], names: &[OwnerConfig]) -> OwnerView {
        let roster: Vec<&Player> = indices.iter().map(|&i| &self.players[i]).collect();
        let spent: u32 = roster.iter().map(|p| p.draft.amount_paid).sum();
        let hitters = roster
            .iter()
            .filter(|p| p.group() == CategoryGroup::Hitting)
            .count();
        let remaining = self.settings.budget as i64 - spent as i64;
        let spots_to_fill = self.settings.roster_size().saturating_sub(roster.len());
        let max_bid = if spots_to_fill == 0 {
            0
        } else {
            (remaining - spots_to_fill as i64 + 1).max(0)
        };
        let display = names.get(id as usize - 1);

        OwnerView {
            id,
            name: display.map(|o| o.name.clone()).unwrap_or_default(),
            abbreviation: display.map(|o| o.abbreviation.clone()).unwrap_or_default(),
            players: roster.iter().map(|p| p.id).collect(),
            spent,
            remaining,
            hitters,
            pitchers: roster.len() - hitters,
            spots_to_fill,
            max_bid,
        }
    }

    /// Views for owners `1..=owner_count`.
    pub fn owners(&self) -> Vec<OwnerView> {
        let owned = self.ownership_index();
        let names = self.settings.owner_list();
        (1..=self.settings.owner_count)
            .map(|id| self.build_owner_view(id as OwnerId, &owned[id], &names))
            .collect()
    }

    pub fn owner_view(&self, id: OwnerId) -> Option<OwnerView> {
        if id == UNOWNED || id as usize > self.settings.owner_count {
            return None;
        }
        let owned = self.ownership_index();
        let names = self.settings.owner_list();
        Some(self.build_owner_view(id, &owned[id as usize], &names))
    }

    /// Live price for a player, or `None` for an unknown id.
    pub fn display_price(&self, id: PlayerId) -> Option<f64> {
        self.player(id)
            .map(|p| self.inflation.display_price(p, &self.valuations))
    }

    /// A group's players in rank order.
    pub fn ranked(&self, group: CategoryGroup, include_drafted: bool) -> Vec<RankedPlayer> {
        let mut rows: Vec<RankedPlayer> = self
            .players
            .iter()
            .filter(|p| p.group() == group && (include_drafted || !p.is_drafted()))
            .filter_map(|p| {
                let calc = self.valuations.get(p.id)?;
                Some(RankedPlayer {
                    id: p.id,
                    name: p.name.clone(),
                    team: p.team.clone(),
                    group,
                    positions: p.positions.clone(),
                    category_rank: calc.category_rank,
                    z: calc.z,
                    total_z: calc.total_z,
                    rebased_z: calc.rebased_z,
                    estimate: calc.dollars,
                    display_price: self.inflation.display_price(p, &self.valuations),
                    owner: p.draft.owner,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.category_rank);
        rows
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            settings: self.settings.clone(),
            saved_at: Utc::now(),
            pool_size: self.players.len(),
            drafted: self
                .players
                .iter()
                .filter(|p| p.is_drafted())
                .map(|p| SnapshotEntry {
                    player: p.id,
                    owner: p.draft.owner,
                    amount_paid: p.draft.amount_paid,
                    position: p.draft.position,
                })
                .collect(),
        }
    }
}

fn check_owner_range(players: &[Player], owner_count: usize) -> Result<(), SessionError> {
    for p in players.iter().filter(|p| p.is_drafted()) {
        let owner = p.draft.owner;
        if owner as usize > owner_count {
            return Err(SessionError::OwnerOutOfRange { owner, owner_count });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
