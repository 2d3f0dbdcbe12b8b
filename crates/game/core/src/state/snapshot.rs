//! Serialization contract for save and peer sync.
//!
//! JSON is the interchange form; bincode gives compact bytes whose SHA-256
//! digest identifies a state for replay checks.

use crate::error::{ErrorSeverity, GameError};

use super::GameState;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("json snapshot rejected: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary snapshot rejected: {0}")]
    Binary(#[from] bincode::Error),
}

impl GameError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        // A snapshot that fails to parse cannot be played from.
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            SnapshotError::Json(_) => "SNAPSHOT_JSON",
            SnapshotError::Binary(_) => "SNAPSHOT_BINARY",
        }
    }
}

impl GameState {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a JSON snapshot. A snapshot missing either player record fails.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bincode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bincode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// SHA-256 over the bincode form.
    pub fn digest(&self) -> Result<[u8; 32], SnapshotError> {
        use sha2::{Digest, Sha256};

        let bytes = self.to_bincode()?;
        Ok(Sha256::digest(&bytes).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MineId, PlayerId, UnitId, UnitType};

    fn state_with_sets() -> GameState {
        let mut state = GameState::new(11);
        let quest = &mut state.players[PlayerId::P1].quest;
        quest.ranger_mines_moved_this_round.insert(MineId(3));
        quest.ranger_mines_moved_this_round.insert(MineId(1));
        quest
            .flag_spirit_damage_taken_this_turn
            .insert(UnitId::new(PlayerId::P2, UnitType::Ranger));
        state
    }

    #[test]
    fn json_round_trip_keeps_sets() {
        let state = state_with_sets();
        let json = state.to_json().expect("serialize");
        assert!(json.contains(r#""ranger_mines_moved_this_round":["m-1","m-3"]"#));
        assert!(json.contains(r#""flag_spirit_damage_taken_this_turn":["p2-ranger"]"#));

        let back = GameState::from_json(&json).expect("deserialize");
        assert_eq!(back, state);
    }

    #[test]
    fn binary_round_trip_and_digest() {
        let state = state_with_sets();
        let bytes = state.to_bincode().expect("serialize");
        let back = GameState::from_bincode(&bytes).expect("deserialize");
        assert_eq!(back, state);
        assert_eq!(back.digest().expect("digest"), state.digest().expect("digest"));
        assert_eq!(hex::encode(state.digest().expect("digest")).len(), 64);
    }

    #[test]
    fn missing_player_record_is_rejected() {
        let state = GameState::new(5);
        let mut value: serde_json::Value =
            serde_json::from_str(&state.to_json().expect("serialize")).expect("json");
        value["players"]
            .as_object_mut()
            .expect("players object")
            .remove("P1");
        let err = GameState::from_json(&value.to_string()).expect_err("must fail closed");
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
    }
}
