//! JSON output for the headless runner.
//!
//! Every output record is one JSON object on its own line on stdout.
//!
//! # Example Session
//!
//! ```text
//! $ harvest_headless decide --scenario midgame
//! {"type":"turn","turn":150,"player":0,"actions":{"1":"NORTH","3":"WEST","base-1":"SPAWN"},...}
//! $ harvest_headless verify --scenario midgame --runs 3
//! {"type":"verify","runs":3,"turns":1,"deterministic":true,"hashes":[...]}
//! ```
//!
//! Actions use the host's vocabulary: units map to `NORTH`, `SOUTH`,
//! `EAST`, `WEST` or `CONVERT`; bases map to `SPAWN`. Units that hold and
//! idle bases are left out, as the host expects.

use std::collections::BTreeMap;

use harvest_core::actions::{BaseAction, TurnActions, UnitAction};
use harvest_core::geometry::Direction;
use harvest_core::orchestrator::TurnReport;
use serde::{Deserialize, Serialize};

/// Host action word for a unit, or `None` when it holds.
#[must_use]
pub fn unit_word(action: UnitAction) -> Option<&'static str> {
    match action {
        UnitAction::Hold => None,
        UnitAction::Move(Direction::North) => Some("NORTH"),
        UnitAction::Move(Direction::South) => Some("SOUTH"),
        UnitAction::Move(Direction::East) => Some("EAST"),
        UnitAction::Move(Direction::West) => Some("WEST"),
        UnitAction::Convert => Some("CONVERT"),
    }
}

/// Encode a turn's actions as the host's id → action map.
///
/// Unit entries are keyed by the bare host id; base entries by
/// `base-<id>` so the two id spaces cannot collide.
#[must_use]
pub fn encode_actions(actions: &TurnActions) -> BTreeMap<String, String> {
    let mut encoded = BTreeMap::new();
    for (id, action) in &actions.units {
        if let Some(word) = unit_word(*action) {
            encoded.insert(id.0.to_string(), word.to_string());
        }
    }
    for (id, action) in &actions.bases {
        if *action == BaseAction::Spawn {
            encoded.insert(id.to_string(), "SPAWN".to_string());
        }
    }
    encoded
}

/// Output records written by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    /// One decided turn.
    Turn(TurnOutput),
    /// A determinism check.
    Verify(VerifyOutput),
    /// Something went wrong.
    Error {
        /// What went wrong.
        message: String,
    },
}

impl Output {
    /// Serialize to a JSON line (with trailing newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

/// Actions and diagnostics for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutput {
    /// Turn index.
    pub turn: u32,
    /// Player the actions belong to.
    pub player: u32,
    /// Host-shaped actions.
    pub actions: BTreeMap<String, String>,
    /// Strategy state per unit id.
    pub states: BTreeMap<String, String>,
    /// Why production was skipped, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_error: Option<String>,
    /// Whether end-game mode was active.
    pub endgame: bool,
}

impl TurnOutput {
    /// Summarize an engine report.
    #[must_use]
    pub fn from_report(turn: u32, player: u32, report: &TurnReport) -> Self {
        Self {
            turn,
            player,
            actions: encode_actions(&report.actions),
            states: report
                .states
                .iter()
                .map(|(id, state)| (id.0.to_string(), state.to_string()))
                .collect(),
            scheduling_error: report.scheduling_error.clone(),
            endgame: report.endgame,
        }
    }
}

/// Outcome of repeated seeded runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutput {
    /// Number of runs.
    pub runs: u32,
    /// Turns played per run.
    pub turns: u32,
    /// Policy seed.
    pub seed: u64,
    /// Whether every run hashed the same.
    pub deterministic: bool,
    /// Hash of each run.
    pub hashes: Vec<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::board::{BaseId, UnitId};

    fn sample() -> TurnActions {
        let mut actions = TurnActions::default();
        actions.units.insert(UnitId(1), UnitAction::Move(Direction::North));
        actions.units.insert(UnitId(2), UnitAction::Hold);
        actions.units.insert(UnitId(3), UnitAction::Convert);
        actions.bases.insert(BaseId(1), BaseAction::Spawn);
        actions.bases.insert(BaseId(2), BaseAction::Idle);
        actions
    }

    #[test]
    fn test_idle_entries_are_omitted() {
        let encoded = encode_actions(&sample());
        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded["1"], "NORTH");
        assert_eq!(encoded["3"], "CONVERT");
        assert_eq!(encoded["base-1"], "SPAWN");
        assert!(!encoded.contains_key("2"));
    }

    #[test]
    fn test_every_direction_has_a_word() {
        for d in Direction::ALL {
            assert!(unit_word(UnitAction::Move(d)).is_some());
        }
        assert_eq!(unit_word(UnitAction::Hold), None);
    }

    #[test]
    fn test_output_is_tagged_json_line() {
        let line = Output::Verify(VerifyOutput {
            runs: 2,
            turns: 1,
            seed: 0,
            deterministic: true,
            hashes: vec![7, 7],
        })
        .to_json_line();
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["type"], "verify");
        assert_eq!(value["deterministic"], true);
    }

    #[test]
    fn test_error_output() {
        let line = Output::Error {
            message: "boom".to_string(),
        }
        .to_json_line();
        assert_eq!(line, "{\"type\":\"error\",\"message\":\"boom\"}\n");
    }
}
