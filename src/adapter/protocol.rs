//! Protocol module - JSON message types for the roll-stream adapter
//!
//! Line-delimited JSON. A controller client pushes rolls into the game; any
//! number of observer clients receive score observations. All messages have:
//! type, seq (sequence number), ts (timestamp in ms).

use serde::{Deserialize, Serialize};

use arrayvec::ArrayVec;

use crate::core::snapshot::GameSnapshot;
use crate::types::{Phase, RollEvent, RollKind, MAX_ROLLS};

/// Protocol version spoken by this build.
pub const PROTOCOL_VERSION: &str = "1.0.0";

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    Hello,
}

impl Default for HelloType {
    fn default() -> Self {
        Self::Hello
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollType {
    #[serde(rename = "roll")]
    Roll,
}

impl Default for RollType {
    fn default() -> Self {
        Self::Roll
    }
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    /// Whether the client wants the score observation stream.
    #[serde(rename = "stream_scores")]
    pub stream_scores: bool,
    /// Optional role request; unknown requests degrade to observer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RequestedRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestedRole {
    Auto,
    Controller,
    Observer,
}

impl<'de> Deserialize<'de> for RequestedRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else if s.eq_ignore_ascii_case("controller") {
            Ok(Self::Controller)
        } else if s.eq_ignore_ascii_case("observer") {
            Ok(Self::Observer)
        } else {
            Err(serde::de::Error::custom("invalid requested role"))
        }
    }
}

impl Serialize for RequestedRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RequestedRole::Auto => serializer.serialize_str("auto"),
            RequestedRole::Controller => serializer.serialize_str("controller"),
            RequestedRole::Observer => serializer.serialize_str("observer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Roll message (controller only): one roll of the ball.
#[derive(Debug, Clone, Deserialize)]
pub struct RollMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: RollType,
    pub seq: u64,
    pub ts: u64,
    pub pins: u8,
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "invalid_roll")]
    InvalidRoll,
    #[serde(rename = "game_finished")]
    GameFinished,
    #[serde(rename = "backpressure")]
    Backpressure,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    pub game_id: String,
}

/// Acknowledgment for an applied roll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

/// Score observation (streamed to clients after every accepted roll)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub score: u32,
    pub frame: u8,
    #[serde(rename = "roll_in_frame")]
    pub roll_in_frame: u8,
    pub phase: PhaseLower,
    pub finished: bool,
    pub rolls: RollHistory,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "last_roll")]
    pub last_roll: Option<LastRoll>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseLower {
    #[serde(rename = "first_roll")]
    FirstRoll,
    #[serde(rename = "second_roll")]
    SecondRoll,
    #[serde(rename = "bonus_roll")]
    BonusRoll,
    #[serde(rename = "game_over")]
    GameOver,
}

impl PhaseLower {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseLower::FirstRoll => "first_roll",
            PhaseLower::SecondRoll => "second_roll",
            PhaseLower::BonusRoll => "bonus_roll",
            PhaseLower::GameOver => "game_over",
        }
    }
}

impl From<Phase> for PhaseLower {
    fn from(value: Phase) -> Self {
        match value {
            Phase::FirstRoll => Self::FirstRoll,
            Phase::SecondRoll => Self::SecondRoll,
            Phase::BonusRoll => Self::BonusRoll,
            Phase::GameOver => Self::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollKindLower {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "strike")]
    Strike,
    #[serde(rename = "spare")]
    Spare,
    #[serde(rename = "bonus")]
    Bonus,
}

impl From<RollKind> for RollKindLower {
    fn from(value: RollKind) -> Self {
        match value {
            RollKind::Open => Self::Open,
            RollKind::Strike => Self::Strike,
            RollKind::Spare => Self::Spare,
            RollKind::Bonus => Self::Bonus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRoll {
    pub pins: u8,
    pub frame: u8,
    pub kind: RollKindLower,
    pub awarded: u32,
}

impl From<RollEvent> for LastRoll {
    fn from(value: RollEvent) -> Self {
        Self {
            pins: value.pins,
            frame: value.frame,
            kind: value.kind.into(),
            awarded: value.awarded,
        }
    }
}

/// Bounded roll history (a game has at most 21 rolls; no heap allocation).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RollHistory(pub ArrayVec<u8, MAX_ROLLS>);

impl Serialize for RollHistory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for pins in &self.0 {
            seq.serialize_element(pins)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for RollHistory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = RollHistory;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of pin counts")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<u8, MAX_ROLLS>::new();
                while let Some(pins) = seq.next_element::<u8>()? {
                    out.try_push(pins)
                        .map_err(|_| serde::de::Error::custom("too many rolls"))?;
                }
                Ok(RollHistory(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "roll")]
        Roll(RollMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Roll(m)) => Ok(ParsedMessage::Roll(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if msg_type != "hello" && msg_type != "roll" {
                #[derive(Debug, Deserialize)]
                struct SeqOnly {
                    seq: Option<u64>,
                }
                let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
                return Ok(ParsedMessage::Unknown(UnknownMessage { seq }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Roll(RollMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities {
            stream_scores: true,
            role: Some(RequestedRole::Auto),
        },
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        game_id: "tenpin".to_string(),
    }
}

/// Create an acknowledgment for an applied roll
pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Build a score observation from a game snapshot
pub fn create_observation(seq: u64, snapshot: &GameSnapshot) -> ObservationMessage {
    let mut rolls = ArrayVec::<u8, MAX_ROLLS>::new();
    rolls.extend(snapshot.rolls().iter().copied());

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        score: snapshot.score,
        frame: snapshot.frame,
        roll_in_frame: snapshot.roll_in_frame,
        phase: snapshot.phase.into(),
        finished: snapshot.finished,
        rolls: RollHistory(rolls),
        last_roll: snapshot.last_event.map(LastRoll::from),
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
