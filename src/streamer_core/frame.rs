//! Pub/sub frame decoding
//!
//! A frame from the node's notifier is a multi-part message:
//! `[topic, payload, optional 4-byte little-endian sequence]`.

use std::fmt;

/// Raw multi-part message as delivered by the transport
pub type Frame = Vec<Vec<u8>>;

/// Size of a serialized block header; `rawblock` payloads are logged/audited
/// truncated to this length.
pub const BLOCK_HEADER_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    TxHash,
    TxHashLock,
    RawTx,
    RawTxLock,
    BlockHash,
    RawBlock,
    GovernanceObject,
    GovernanceVote,
    GovernanceObjectHash,
    GovernanceVoteHash,
    /// Topic string not published by the node's notifier table
    Other(String),
}

impl Topic {
    /// Every topic the node publishes
    pub const ALL: [Topic; 10] = [
        Topic::TxHash,
        Topic::TxHashLock,
        Topic::RawTx,
        Topic::RawTxLock,
        Topic::BlockHash,
        Topic::RawBlock,
        Topic::GovernanceObject,
        Topic::GovernanceVote,
        Topic::GovernanceObjectHash,
        Topic::GovernanceVoteHash,
    ];

    pub fn from_wire(name: &str) -> Self {
        match name {
            "hashtx" => Topic::TxHash,
            "hashtxlock" => Topic::TxHashLock,
            "rawtx" => Topic::RawTx,
            "rawtxlock" => Topic::RawTxLock,
            "hashblock" => Topic::BlockHash,
            "rawblock" => Topic::RawBlock,
            "rawgovernanceobject" => Topic::GovernanceObject,
            "rawgovernancevote" => Topic::GovernanceVote,
            "hashgovernanceobject" => Topic::GovernanceObjectHash,
            "hashgovernancevote" => Topic::GovernanceVoteHash,
            other => Topic::Other(other.to_string()),
        }
    }

    /// Wire name as received, also used as the audit record's topic column
    pub fn as_str(&self) -> &str {
        match self {
            Topic::TxHash => "hashtx",
            Topic::TxHashLock => "hashtxlock",
            Topic::RawTx => "rawtx",
            Topic::RawTxLock => "rawtxlock",
            Topic::BlockHash => "hashblock",
            Topic::RawBlock => "rawblock",
            Topic::GovernanceObject => "rawgovernanceobject",
            Topic::GovernanceVote => "rawgovernancevote",
            Topic::GovernanceObjectHash => "hashgovernanceobject",
            Topic::GovernanceVoteHash => "hashgovernancevote",
            Topic::Other(name) => name,
        }
    }

    /// Human-readable banner used in log lines
    pub fn label(&self) -> &str {
        match self {
            Topic::TxHash => "HASH TX",
            Topic::TxHashLock => "HASH TX LOCK",
            Topic::RawTx => "RAW TX",
            Topic::RawTxLock => "RAW TX LOCK",
            Topic::BlockHash => "HASH BLOCK",
            Topic::RawBlock => "RAW BLOCK HEADER",
            Topic::GovernanceObject => "RAW GOVERNANCE OBJECT",
            Topic::GovernanceVote => "RAW GOVERNANCE VOTE",
            Topic::GovernanceObjectHash => "HASH GOVERNANCE OBJECT",
            Topic::GovernanceVoteHash => "HASH GOVERNANCE VOTE",
            Topic::Other(_) => "UNRECOGNIZED",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifier sequence number; advisory only, never used for ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Known(u32),
    Unknown,
}

impl Sequence {
    fn from_trailer(part: &[u8]) -> Self {
        match <[u8; 4]>::try_from(part) {
            Ok(bytes) => Sequence::Known(u32::from_le_bytes(bytes)),
            Err(_) => Sequence::Unknown,
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sequence::Known(n) => write!(f, "{}", n),
            Sequence::Unknown => f.write_str("Unknown"),
        }
    }
}

/// One decoded pub/sub message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub topic: Topic,
    pub payload: Vec<u8>,
    pub sequence: Sequence,
}

impl Event {
    /// Hex encoding of the payload as exposed to downstream consumers.
    /// Raw blocks are reduced to their header.
    pub fn payload_hex(&self) -> String {
        match self.topic {
            Topic::RawBlock => {
                let end = self.payload.len().min(BLOCK_HEADER_LEN);
                hex::encode(&self.payload[..end])
            }
            _ => hex::encode(&self.payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame lacks the topic and/or payload part
    TooFewParts(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TooFewParts(n) => {
                write!(f, "frame has {} part(s), expected at least 2", n)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode one raw frame.
///
/// The sequence is read from the *last* part when it is exactly 4 bytes,
/// so a two-part frame with a 4-byte payload reports that payload as its
/// sequence too.
pub fn decode_frame(frame: &[Vec<u8>]) -> Result<Event, DecodeError> {
    let (topic_bytes, payload, last) = match frame {
        [topic, payload, ..] => (topic, payload, &frame[frame.len() - 1]),
        _ => return Err(DecodeError::TooFewParts(frame.len())),
    };

    let topic = Topic::from_wire(&String::from_utf8_lossy(topic_bytes));

    Ok(Event {
        topic,
        payload: payload.clone(),
        sequence: Sequence::from_trailer(last),
    })
}
