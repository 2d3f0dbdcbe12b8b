//! Structural validation at the network boundary.
//!
//! Peers exchange JSON packets. Before a payload reaches the engine it is
//! parsed into a typed [`Action`]: field presence, primitive types,
//! integer-ness, board bounds and enum membership are all checked here, so a
//! malformed payload never touches game rules. Rule legality is still the
//! engine's job.
//!
//! Wire names follow the peer protocol: camelCase fields (`unitId`,
//! `mineType`, `actedUnitId`) and SCREAMING_SNAKE action kinds.
use std::str::FromStr;

use minefront_core::{
    Action, ActionTag, AttackAction, Branch, BuildingKind, ConvertMineAction, DetonateTowerAction,
    DisarmAction, DropFlagAction, DropMineAction, EndTurnAction, EvolveAction,
    FinishPlacementAction, GameState, MineType, MoveAction, MoveMineAction, PickupFlagAction,
    PickupMineAction, PlaceBuildingAction, PlaceMineAction, PlaceSetupMineAction, PlayerId,
    Position, ReadyAction, ScanAction, SensorScanAction, SkipTurnAction, StealthAction,
    TeleportAction, ThrowMineAction, UnitId, UnitType, Variant,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A payload that failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    Missing(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field `{0}` must not be negative")]
    Negative(&'static str),

    #[error("cell ({r}, {c}) is outside the board")]
    OutOfBounds { r: i64, c: i64 },

    #[error("unknown {kind} `{value}`")]
    UnknownValue { kind: &'static str, value: String },

    #[error("{sender} may not command {unit}")]
    ForeignUnit { unit: UnitId, sender: PlayerId },

    #[error("{sender} may not speak for {claimed}")]
    ForeignPlayer { claimed: PlayerId, sender: PlayerId },

    #[error("unsupported action kind `{0}`")]
    UnsupportedKind(String),

    #[error("state snapshot rejected: {0}")]
    Snapshot(String),
}

type Fields = Map<String, Value>;

fn object(payload: &Value) -> Result<&Fields, PayloadError> {
    payload.as_object().ok_or(PayloadError::NotAnObject)
}

fn field<'a>(fields: &'a Fields, name: &'static str) -> Result<&'a Value, PayloadError> {
    fields.get(name).ok_or(PayloadError::Missing(name))
}

fn string<'a>(fields: &'a Fields, name: &'static str) -> Result<&'a str, PayloadError> {
    field(fields, name)?.as_str().ok_or(PayloadError::WrongType {
        field: name,
        expected: "a string",
    })
}

fn boolean(fields: &Fields, name: &'static str) -> Result<bool, PayloadError> {
    field(fields, name)?.as_bool().ok_or(PayloadError::WrongType {
        field: name,
        expected: "a boolean",
    })
}

/// Integral JSON number. `2.0` counts as an integer, `2.5` does not.
fn integer(fields: &Fields, name: &'static str) -> Result<i64, PayloadError> {
    let value = field(fields, name)?;
    let wrong = PayloadError::WrongType {
        field: name,
        expected: "an integer",
    };
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(wrong),
    }
}

fn cell_at(fields: &Fields, row: &'static str, col: &'static str) -> Result<Position, PayloadError> {
    let r = integer(fields, row)?;
    let c = integer(fields, col)?;
    let pos = i32::try_from(r)
        .ok()
        .zip(i32::try_from(c).ok())
        .map(|(r, c)| Position::new(r, c))
        .filter(|p| p.in_bounds());
    pos.ok_or(PayloadError::OutOfBounds { r, c })
}

fn cell(fields: &Fields) -> Result<Position, PayloadError> {
    cell_at(fields, "r", "c")
}

fn parse_enum<T: FromStr>(
    fields: &Fields,
    name: &'static str,
    kind: &'static str,
) -> Result<T, PayloadError> {
    let raw = string(fields, name)?;
    raw.parse().map_err(|_| PayloadError::UnknownValue {
        kind,
        value: raw.to_string(),
    })
}

fn unit(fields: &Fields, name: &'static str) -> Result<UnitId, PayloadError> {
    parse_enum(fields, name, "unit id")
}

/// Parses the payload of an action packet sent by `sender`.
///
/// `kind` is the packet type (`MOVE`, `PLACE_MINE`, ...). The building kinds
/// also accept the `PLACE_TOWER` / `PLACE_HUB` / `PLACE_FACTORY` shorthands.
/// A payload naming a unit of the other side is rejected; attack targets are
/// the only foreign ids allowed.
pub fn parse_action(sender: PlayerId, kind: &str, payload: &Value) -> Result<Action, PayloadError> {
    let action = parse_fields(sender, kind, payload)?;
    if let Some(unit) = action.actor().filter(|unit| unit.owner != sender) {
        return Err(PayloadError::ForeignUnit { unit, sender });
    }
    if action.player() != sender {
        return Err(PayloadError::ForeignPlayer {
            claimed: action.player(),
            sender,
        });
    }
    Ok(action)
}

fn parse_fields(sender: PlayerId, kind: &str, payload: &Value) -> Result<Action, PayloadError> {
    let shorthand = match kind {
        "PLACE_TOWER" => Some(BuildingKind::Tower),
        "PLACE_HUB" => Some(BuildingKind::Hub),
        "PLACE_FACTORY" => Some(BuildingKind::Factory),
        _ => None,
    };
    if let Some(building) = shorthand {
        let fields = object(payload)?;
        return Ok(PlaceBuildingAction::new(unit(fields, "unitId")?, building).into());
    }

    let tag = ActionTag::from_str(kind).map_err(|_| PayloadError::UnsupportedKind(kind.into()))?;
    let fields = object(payload)?;

    let action = match tag {
        ActionTag::Move => {
            let cost = integer(fields, "cost")?;
            let cost = u32::try_from(cost).map_err(|_| PayloadError::Negative("cost"))?;
            let mut action = MoveAction::new(unit(fields, "unitId")?, cell(fields)?);
            action.quoted_cost = Some(cost);
            action.into()
        }
        ActionTag::Attack => {
            AttackAction::new(unit(fields, "attackerId")?, unit(fields, "targetId")?).into()
        }
        ActionTag::Scan => ScanAction {
            unit: unit(fields, "unitId")?,
            target: cell(fields)?,
        }
        .into(),
        ActionTag::SensorScan => SensorScanAction {
            unit: unit(fields, "unitId")?,
            target: cell(fields)?,
        }
        .into(),
        ActionTag::PlaceMine => PlaceMineAction {
            unit: unit(fields, "unitId")?,
            target: cell(fields)?,
            mine_type: parse_enum::<MineType>(fields, "mineType", "mine type")?,
        }
        .into(),
        ActionTag::Disarm => DisarmAction {
            unit: unit(fields, "unitId")?,
            target: cell(fields)?,
        }
        .into(),
        ActionTag::MoveMine => MoveMineAction {
            unit: unit(fields, "unitId")?,
            from: cell_at(fields, "fromR", "fromC")?,
            to: cell_at(fields, "toR", "toC")?,
        }
        .into(),
        ActionTag::ConvertMine => ConvertMineAction {
            unit: unit(fields, "unitId")?,
            target: cell(fields)?,
        }
        .into(),
        ActionTag::PickupMine => PickupMineAction {
            unit: unit(fields, "unitId")?,
            target: cell(fields)?,
        }
        .into(),
        ActionTag::DropMine => DropMineAction {
            unit: unit(fields, "unitId")?,
        }
        .into(),
        ActionTag::ThrowMine => ThrowMineAction {
            unit: unit(fields, "unitId")?,
            target: cell(fields)?,
        }
        .into(),
        ActionTag::PlaceBuilding => PlaceBuildingAction::new(
            unit(fields, "unitId")?,
            parse_enum::<BuildingKind>(fields, "building", "building")?,
        )
        .into(),
        ActionTag::DetonateTower => DetonateTowerAction {
            unit: unit(fields, "unitId")?,
        }
        .into(),
        ActionTag::Teleport => TeleportAction {
            unit: unit(fields, "unitId")?,
        }
        .into(),
        ActionTag::PickupFlag => PickupFlagAction {
            unit: unit(fields, "unitId")?,
        }
        .into(),
        ActionTag::DropFlag => DropFlagAction {
            unit: unit(fields, "unitId")?,
        }
        .into(),
        ActionTag::Stealth => StealthAction {
            unit: unit(fields, "unitId")?,
            active: boolean(fields, "active")?,
        }
        .into(),
        ActionTag::Evolve => {
            let unit_type = parse_enum::<UnitType>(fields, "unitType", "unit type")?;
            let branch = parse_branch(fields)?;
            let mut action = EvolveAction::new(sender, unit_type, branch);
            if fields.get("variant").is_some_and(|v| !v.is_null()) {
                let raw = integer(fields, "variant")?;
                let variant = u8::try_from(raw)
                    .ok()
                    .and_then(Variant::from_number)
                    .ok_or(PayloadError::UnknownValue {
                        kind: "variant",
                        value: raw.to_string(),
                    })?;
                action = action.with_variant(variant);
            }
            action.into()
        }
        ActionTag::EndTurn => match field(fields, "actedUnitId")? {
            Value::Null => EndTurnAction::new(sender).into(),
            Value::String(raw) => {
                let id = raw.parse::<UnitId>().map_err(|_| PayloadError::UnknownValue {
                    kind: "unit id",
                    value: raw.clone(),
                })?;
                EndTurnAction::for_unit(id).into()
            }
            _ => {
                return Err(PayloadError::WrongType {
                    field: "actedUnitId",
                    expected: "a string or null",
                });
            }
        },
        ActionTag::SkipTurn => SkipTurnAction { player: sender }.into(),
        ActionTag::Ready => ReadyAction { player: sender }.into(),
        ActionTag::PlaceSetupMine => PlaceSetupMineAction {
            player: sender,
            target: cell(fields)?,
        }
        .into(),
        ActionTag::FinishPlacement => FinishPlacementAction { player: sender }.into(),
    };
    Ok(action)
}

/// Only the lowercase `a` / `b` forms are accepted on the wire.
fn parse_branch(fields: &Fields) -> Result<Branch, PayloadError> {
    match string(fields, "branch")? {
        "a" => Ok(Branch::A),
        "b" => Ok(Branch::B),
        other => Err(PayloadError::UnknownValue {
            kind: "branch",
            value: other.to_string(),
        }),
    }
}

/// Phase a `PLAYER_READY` packet refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReadyPhase {
    Placement,
    Thinking,
}

/// Validated `PLAYER_READY` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadyPayload {
    pub player: PlayerId,
    pub phase: ReadyPhase,
    /// Setup mines announced with a placement-phase ready.
    pub setup_mines: Vec<Position>,
}

impl ReadyPayload {
    /// The ready player is always `sender`. An explicit `playerId` must agree
    /// with it.
    pub fn parse(sender: PlayerId, payload: &Value) -> Result<Self, PayloadError> {
        let fields = object(payload)?;
        if fields.get("playerId").is_some_and(|v| !v.is_null()) {
            let claimed = parse_enum::<PlayerId>(fields, "playerId", "player")?;
            if claimed != sender {
                return Err(PayloadError::ForeignPlayer { claimed, sender });
            }
        }
        let player = sender;
        let phase = parse_enum::<ReadyPhase>(fields, "phase", "ready phase")?;

        let setup_mines = match fields.get("setupMines") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| object(item).and_then(cell))
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(PayloadError::WrongType {
                    field: "setupMines",
                    expected: "an array of cells",
                });
            }
        };
        Ok(Self {
            player,
            phase,
            setup_mines,
        })
    }

    /// Engine actions that realise this ready signal, in order.
    pub fn into_actions(self) -> Vec<Action> {
        match self.phase {
            ReadyPhase::Placement => self
                .setup_mines
                .into_iter()
                .map(|target| {
                    PlaceSetupMineAction {
                        player: self.player,
                        target,
                    }
                    .into()
                })
                .chain(std::iter::once(
                    FinishPlacementAction {
                        player: self.player,
                    }
                    .into(),
                ))
                .collect(),
            ReadyPhase::Thinking => vec![ReadyAction {
                player: self.player,
            }
            .into()],
        }
    }
}

/// Full-state resync sent by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateSync {
    pub reason: String,
    pub state: GameState,
}

impl StateSync {
    /// A snapshot missing either player record is rejected, never defaulted.
    pub fn parse(payload: &Value) -> Result<Self, PayloadError> {
        let fields = object(payload)?;
        let reason = string(fields, "reason")?.to_string();
        let state = GameState::deserialize(field(fields, "state")?)
            .map_err(|e| PayloadError::Snapshot(e.to_string()))?;
        Ok(Self { reason, state })
    }
}

/// Envelope of every peer message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPacket {
    #[serde(rename = "type")]
    pub kind: String,
    pub match_id: String,
    pub turn: u32,
    #[serde(default)]
    pub payload: Value,
    /// Sender wall clock, milliseconds since the epoch.
    pub ts: i64,
    pub seq: u64,
}

impl ActionPacket {
    pub const ACK: &'static str = "ACK";

    /// Builds a packet stamped with the current wall clock.
    pub fn new(
        kind: impl Into<String>,
        match_id: impl Into<String>,
        turn: u32,
        payload: Value,
        seq: u64,
    ) -> Self {
        Self {
            kind: kind.into(),
            match_id: match_id.into(),
            turn,
            payload,
            ts: chrono::Utc::now().timestamp_millis(),
            seq,
        }
    }

    /// Acknowledgement of `seq`.
    pub fn ack(match_id: impl Into<String>, turn: u32, ack_for: u64, seq: u64) -> Self {
        Self::new(
            Self::ACK,
            match_id,
            turn,
            serde_json::json!({ "ackFor": ack_for }),
            seq,
        )
    }

    /// Checks the envelope fields of an untyped message.
    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        let fields = object(value)?;
        let kind = string(fields, "type")?.to_string();
        let match_id = string(fields, "matchId")?.to_string();
        let turn = u32::try_from(integer(fields, "turn")?).map_err(|_| PayloadError::Negative("turn"))?;
        let ts = field(fields, "ts")?
            .as_f64()
            .ok_or(PayloadError::WrongType {
                field: "ts",
                expected: "a number",
            })? as i64;
        let seq = u64::try_from(integer(fields, "seq")?).map_err(|_| PayloadError::Negative("seq"))?;
        Ok(Self {
            kind,
            match_id,
            turn,
            payload: fields.get("payload").cloned().unwrap_or(Value::Null),
            ts,
            seq,
        })
    }

    /// Sequence number acknowledged by an `ACK` packet.
    pub fn ack_for(&self) -> Option<u64> {
        if self.kind != Self::ACK {
            return None;
        }
        self.payload.get("ackFor")?.as_u64()
    }

    /// Parses the payload, logging a rejected one against the packet.
    pub fn to_action(&self, sender: PlayerId) -> Result<Action, PayloadError> {
        parse_action(sender, &self.kind, &self.payload).inspect_err(|error| {
            tracing::warn!(
                %sender,
                kind = %self.kind,
                seq = self.seq,
                match_id = %self.match_id,
                %error,
                "rejected action payload"
            );
        })
    }
}
