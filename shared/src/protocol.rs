//! Text wire format spoken between the server and its clients.
//!
//! Client to server:
//! - `cz` connect as an agent, `c<other>` connect as a bot
//! - `u<dir>[magnitude][|reward]` move, `dir` is one of `u`, `l`, `r`, `i`
//! - `d` disconnect
//! - `r` respawn everyone
//!
//! Server to client: `x,y,a,t|x,y,a,t|...|map_index`, the recipient first.

use crate::{Actor, ClassTag, Pose};
use std::fmt::Write;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("datagram is not valid UTF-8")]
    InvalidUtf8,

    #[error("empty datagram")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(char),

    #[error("connect command is missing the class character")]
    MissingClass,

    #[error("move command is missing a direction")]
    MissingDirection,

    #[error("unknown move direction '{0}'")]
    InvalidDirection(char),

    #[error("'{0}' is not a finite number")]
    InvalidNumber(String),

    #[error("unexpected trailing data '{0}'")]
    TrailingData(String),

    #[error("pose record has {found} fields, expected 4")]
    FieldCount { found: usize },

    #[error("unknown class tag '{0}'")]
    InvalidTag(String),

    #[error("invalid map index '{0}'")]
    InvalidMapIndex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    TurnLeft,
    TurnRight,
    Idle,
}

impl Direction {
    fn from_char(c: char) -> Result<Self, ProtocolError> {
        match c {
            'u' => Ok(Direction::Forward),
            'l' => Ok(Direction::TurnLeft),
            'r' => Ok(Direction::TurnRight),
            'i' => Ok(Direction::Idle),
            other => Err(ProtocolError::InvalidDirection(other)),
        }
    }

    fn as_char(self) -> char {
        match self {
            Direction::Forward => 'u',
            Direction::TurnLeft => 'l',
            Direction::TurnRight => 'r',
            Direction::Idle => 'i',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    pub direction: Direction,
    /// Step length or rotation in radians; class defaults apply when absent.
    pub magnitude: Option<f32>,
    /// Most recent reward of the sender, kept for visualisation only.
    pub reward: Option<f32>,
}

impl MoveCommand {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            magnitude: None,
            reward: None,
        }
    }
}

/// Every message a client can send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Connect { class: ClassTag },
    Move(MoveCommand),
    Disconnect,
    Reset,
}

impl Command {
    pub fn decode(datagram: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(datagram).map_err(|_| ProtocolError::InvalidUtf8)?;
        text.parse()
    }

    pub fn encode(&self) -> String {
        match self {
            Command::Connect { class: ClassTag::Agent } => "cz".to_string(),
            Command::Connect { class: ClassTag::Bot } => "cb".to_string(),
            Command::Move(mv) => {
                let mut out = String::from("u");
                out.push(mv.direction.as_char());
                if let Some(magnitude) = mv.magnitude {
                    let _ = write!(out, "{}", magnitude);
                }
                if let Some(reward) = mv.reward {
                    let _ = write!(out, "|{}", reward);
                }
                out
            }
            Command::Disconnect => "d".to_string(),
            Command::Reset => "r".to_string(),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let mut chars = text.chars();
        let head = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();

        match head {
            'c' => match rest.chars().next() {
                Some('z') => Ok(Command::Connect { class: ClassTag::Agent }),
                Some(_) => Ok(Command::Connect { class: ClassTag::Bot }),
                None => Err(ProtocolError::MissingClass),
            },
            'u' => parse_move(rest).map(Command::Move),
            'd' => expect_bare(rest, Command::Disconnect),
            'r' => expect_bare(rest, Command::Reset),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

fn expect_bare(rest: &str, command: Command) -> Result<Command, ProtocolError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ProtocolError::TrailingData(rest.to_string()))
    }
}

fn parse_move(rest: &str) -> Result<MoveCommand, ProtocolError> {
    let mut chars = rest.chars();
    let direction = Direction::from_char(chars.next().ok_or(ProtocolError::MissingDirection)?)?;
    let tail = chars.as_str();

    let (magnitude, reward) = match tail.split_once('|') {
        Some((magnitude, reward)) => (magnitude, Some(reward)),
        None => (tail, None),
    };

    let magnitude = if magnitude.is_empty() {
        None
    } else {
        Some(parse_number(magnitude)?)
    };
    let reward = reward.map(parse_number).transpose()?;

    Ok(MoveCommand {
        direction,
        magnitude,
        reward,
    })
}

fn parse_number(token: &str) -> Result<f32, ProtocolError> {
    match token.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ProtocolError::InvalidNumber(token.to_string())),
    }
}

/// One broadcast as seen by a single recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The recipient's own entry comes first.
    pub actors: Vec<Actor>,
    pub map_index: usize,
}

impl Snapshot {
    pub fn own(&self) -> Option<&Actor> {
        self.actors.first()
    }

    pub fn others(&self) -> &[Actor] {
        self.actors.get(1..).unwrap_or(&[])
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        for actor in &self.actors {
            let _ = write!(
                out,
                "{},{},{},{}|",
                actor.pose.x,
                actor.pose.y,
                actor.pose.heading,
                actor.class.tag()
            );
        }
        let _ = write!(out, "{}", self.map_index);
        out
    }

    pub fn decode(datagram: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(datagram).map_err(|_| ProtocolError::InvalidUtf8)?;
        text.parse()
    }
}

impl FromStr for Snapshot {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut fields: Vec<&str> = text.split('|').collect();
        let map_field = fields.pop().unwrap_or_default();
        let map_index = map_field
            .trim()
            .parse::<usize>()
            .map_err(|_| ProtocolError::InvalidMapIndex(map_field.to_string()))?;

        let actors = fields
            .into_iter()
            .map(parse_actor)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Snapshot { actors, map_index })
    }
}

fn parse_actor(record: &str) -> Result<Actor, ProtocolError> {
    let parts: Vec<&str> = record.split(',').collect();
    if parts.len() != 4 {
        return Err(ProtocolError::FieldCount { found: parts.len() });
    }
    let x = parse_number(parts[0])?;
    let y = parse_number(parts[1])?;
    let heading = parse_number(parts[2])?;
    let class = parts[3]
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(ClassTag::from_tag)
        .ok_or_else(|| ProtocolError::InvalidTag(parts[3].to_string()))?;

    Ok(Actor::new(Pose::new(x, y, heading), class))
}
