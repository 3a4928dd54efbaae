//! # Fountain (UR-style) Codec
//!
//! A payload is wrapped in a typed envelope and split into `seq_len` equal
//! fragments. Parts `1..=seq_len` carry the plain fragments; every later part
//! is the XOR of a pseudo-random subset of fragments (see [`super::random`]).
//! The receiver can therefore start scanning at any point of the animation and
//! still converge, in any order, tolerating duplicates.
//!
//! ## Wire Format
//!
//! ```text
//! single part:  UR:<TYPE>/<HEX(message)>
//! multi part:   UR:<TYPE>/<seq_num>-<seq_len>/<HEX(bincode(FountainPart))>
//! ```
//!
//! Frames are uppercased so they fit the QR alphanumeric mode. Decoding is
//! case-insensitive.

use super::decoder::{DecodeStatus, Decoder};
use super::errors::CodecError;
use super::frame::{FrameSource, QrScheme};
use super::random::choose_fragments;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Envelope scheme prefix.
pub const UR_SCHEME: &str = "ur";

/// Largest message a [`FountainDecoder`] accepts unless told otherwise.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 64 * 1024;

/// One self-describing fountain part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FountainPart {
    /// 1-based part number. Unbounded.
    pub seq_num: u32,
    /// Number of fragments the message was split into.
    pub seq_len: u32,
    /// Length of the unpadded message in bytes.
    pub message_len: u32,
    /// CRC-32 of the whole message.
    pub checksum: u32,
    /// Fragment data, or the XOR of several fragments.
    pub data: Vec<u8>,
}

/// Parameters identifying one message; every part of a transfer shares them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MessageParams {
    seq_len: usize,
    message_len: usize,
    checksum: u32,
    fragment_len: usize,
}

impl MessageParams {
    fn of(part: &FountainPart) -> Self {
        Self {
            seq_len: part.seq_len as usize,
            message_len: part.message_len as usize,
            checksum: part.checksum,
            fragment_len: part.data.len(),
        }
    }
}

fn validate_ur_type(ur_type: &str) -> Result<(), CodecError> {
    let valid = !ur_type.is_empty()
        && ur_type
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CodecError::Malformed(format!("invalid UR type '{ur_type}'")))
    }
}

fn xor_into(target: &mut [u8], other: &[u8]) {
    for (t, o) in target.iter_mut().zip(other) {
        *t ^= o;
    }
}

/// Truncate scanned values in error messages.
fn preview(value: &str) -> String {
    const MAX: usize = 32;
    if value.chars().count() <= MAX {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX).collect();
        format!("{head}...")
    }
}

/// Encoder producing an unbounded sequence of fountain parts.
#[derive(Debug, Clone)]
pub struct FountainEncoder {
    ur_type: String,
    message: Vec<u8>,
    checksum: u32,
    fragments: Vec<Vec<u8>>,
    seq_num: u32,
}

impl FountainEncoder {
    /// Prepare `message` for transfer as `ur_type`.
    ///
    /// Fragments are at most `max_fragment_len` bytes; the length is evened out
    /// across fragments and the last one is zero-padded.
    ///
    /// # Errors
    ///
    /// `EmptyPayload`, `InvalidFragmentSize`, or `Malformed` for a UR type that
    /// is not lowercase alphanumeric with dashes.
    pub fn new(ur_type: &str, message: &[u8], max_fragment_len: usize) -> Result<Self, CodecError> {
        validate_ur_type(ur_type)?;
        if message.is_empty() {
            return Err(CodecError::EmptyPayload);
        }
        if max_fragment_len == 0 {
            return Err(CodecError::InvalidFragmentSize(max_fragment_len));
        }

        let seq_len = message.len().div_ceil(max_fragment_len);
        let fragment_len = message.len().div_ceil(seq_len);

        let mut padded = message.to_vec();
        padded.resize(seq_len * fragment_len, 0);
        let fragments = padded.chunks(fragment_len).map(<[u8]>::to_vec).collect();

        Ok(Self {
            ur_type: ur_type.to_string(),
            message: message.to_vec(),
            checksum: crc32fast::hash(message),
            fragments,
            seq_num: 0,
        })
    }

    /// Number of plain fragments.
    #[must_use]
    pub fn seq_len(&self) -> usize {
        self.fragments.len()
    }

    /// True when the whole message fits in one part.
    #[must_use]
    pub fn is_single_part(&self) -> bool {
        self.fragments.len() == 1
    }

    /// CRC-32 of the message.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Build part `seq_num` (1-based) without advancing the encoder.
    #[must_use]
    pub fn part(&self, seq_num: u32) -> FountainPart {
        let indexes = choose_fragments(seq_num, self.fragments.len(), self.checksum);
        let mut data = vec![0u8; self.fragments[0].len()];
        for index in indexes {
            xor_into(&mut data, &self.fragments[index]);
        }

        FountainPart {
            seq_num,
            seq_len: self.fragments.len() as u32,
            message_len: self.message.len() as u32,
            checksum: self.checksum,
            data,
        }
    }

    /// Next part in sequence.
    pub fn next_part(&mut self) -> FountainPart {
        self.seq_num = self.seq_num.wrapping_add(1).max(1);
        self.part(self.seq_num)
    }

    /// Render the frame for `seq_num`.
    ///
    /// # Errors
    ///
    /// `Malformed` if the part cannot be serialized.
    pub fn frame(&self, seq_num: u32) -> Result<String, CodecError> {
        if self.is_single_part() {
            return Ok(self.single_frame());
        }
        self.part_frame(&self.part(seq_num))
    }

    fn single_frame(&self) -> String {
        format!("{UR_SCHEME}:{}/{}", self.ur_type, hex::encode_upper(&self.message)).to_uppercase()
    }

    fn part_frame(&self, part: &FountainPart) -> Result<String, CodecError> {
        let body = bincode::serialize(part).map_err(|e| CodecError::Malformed(e.to_string()))?;
        Ok(format!(
            "{UR_SCHEME}:{}/{}-{}/{}",
            self.ur_type,
            part.seq_num,
            part.seq_len,
            hex::encode_upper(body)
        )
        .to_uppercase())
    }
}

impl FrameSource for FountainEncoder {
    fn next_frame(&mut self) -> String {
        if self.is_single_part() {
            return self.single_frame();
        }
        let part = self.next_part();
        match self.part_frame(&part) {
            Ok(frame) => frame,
            Err(e) => {
                // bincode cannot fail on plain integers and byte vectors.
                tracing::error!(error = %e, seq_num = part.seq_num, "Failed to serialize fountain part");
                self.single_frame()
            }
        }
    }

    fn is_static(&self) -> bool {
        self.is_single_part()
    }

    fn reset(&mut self) {
        self.seq_num = 0;
    }

    fn scheme(&self) -> QrScheme {
        QrScheme::Fountain
    }
}

/// Order-independent fountain decoder.
#[derive(Debug, Clone)]
pub struct FountainDecoder {
    expected_type: String,
    max_message_len: usize,
    params: Option<MessageParams>,
    simple: BTreeMap<usize, Vec<u8>>,
    mixed: Vec<(BTreeSet<usize>, Vec<u8>)>,
    seen: HashSet<u32>,
    result: Option<Vec<u8>>,
}

impl FountainDecoder {
    /// Decoder accepting only parts of type `expected_type`.
    ///
    /// # Errors
    ///
    /// `Malformed` for an invalid UR type.
    pub fn new(expected_type: &str) -> Result<Self, CodecError> {
        Self::with_max_message_len(expected_type, DEFAULT_MAX_MESSAGE_LEN)
    }

    /// Decoder rejecting parts that announce a message longer than
    /// `max_message_len` bytes.
    ///
    /// # Errors
    ///
    /// `Malformed` for an invalid UR type or a zero limit.
    pub fn with_max_message_len(expected_type: &str, max_message_len: usize) -> Result<Self, CodecError> {
        validate_ur_type(expected_type)?;
        if max_message_len == 0 {
            return Err(CodecError::Malformed("message length limit must be positive".to_string()));
        }
        Ok(Self {
            expected_type: expected_type.to_string(),
            max_message_len,
            params: None,
            simple: BTreeMap::new(),
            mixed: Vec::new(),
            seen: HashSet::new(),
            result: None,
        })
    }

    /// Number of fragments of the message being received, once known.
    #[must_use]
    pub fn expected_part_count(&self) -> Option<usize> {
        self.params.map(|p| p.seq_len)
    }

    /// Number of distinct parts accepted so far.
    #[must_use]
    pub fn parts_seen(&self) -> usize {
        self.seen.len()
    }

    fn mismatch(&self, found: &str) -> CodecError {
        CodecError::ProtocolMismatch {
            expected: format!("{UR_SCHEME}:{}", self.expected_type),
            found: preview(found),
        }
    }

    fn receive_part(&mut self, part: FountainPart) -> Result<DecodeStatus, CodecError> {
        if part.seq_len == 0 || part.seq_num == 0 || part.data.is_empty() {
            return Err(CodecError::Malformed("empty fountain part".to_string()));
        }
        let params = MessageParams::of(&part);
        // Checked before anything is sized from the announced fragment count.
        if params.message_len > self.max_message_len {
            return Err(CodecError::Malformed(format!(
                "message length {} exceeds limit {}",
                params.message_len, self.max_message_len
            )));
        }
        if params.seq_len != params.message_len.div_ceil(params.fragment_len) {
            return Err(CodecError::Malformed(format!(
                "{} fragments of {} bytes cannot carry {} bytes",
                params.seq_len, params.fragment_len, params.message_len
            )));
        }

        match self.params {
            None => self.params = Some(params),
            Some(current) if current != params => {
                return Err(CodecError::InconsistentPart(format!(
                    "part {} has checksum {:#010x} and length {}, expected {:#010x} and {}",
                    part.seq_num, params.checksum, params.message_len, current.checksum, current.message_len
                )));
            }
            Some(_) => {}
        }

        if !self.seen.insert(part.seq_num) {
            return Ok(DecodeStatus::NeedMore);
        }

        let mut indexes: BTreeSet<usize> =
            choose_fragments(part.seq_num, params.seq_len, params.checksum)
                .into_iter()
                .collect();
        let mut data = part.data;

        // Reduce by every fragment already known.
        let known: Vec<usize> = indexes.iter().copied().filter(|i| self.simple.contains_key(i)).collect();
        for index in known {
            if let Some(fragment) = self.simple.get(&index) {
                xor_into(&mut data, fragment);
            }
            indexes.remove(&index);
        }

        if indexes.len() > 1 {
            self.mixed.push((indexes, data));
        } else if let Some(index) = indexes.into_iter().next() {
            self.propagate(index, data);
        }

        self.try_assemble(params)
    }

    /// Record a newly recovered fragment and peel it out of every mixed part.
    fn propagate(&mut self, index: usize, data: Vec<u8>) {
        let mut queue = vec![(index, data)];

        while let Some((index, data)) = queue.pop() {
            if self.simple.contains_key(&index) {
                continue;
            }

            let mut remaining = Vec::with_capacity(self.mixed.len());
            for (mut indexes, mut mixed) in self.mixed.drain(..) {
                if indexes.remove(&index) {
                    xor_into(&mut mixed, &data);
                }
                match indexes.len() {
                    0 => {}
                    1 => {
                        if let Some(single) = indexes.into_iter().next() {
                            queue.push((single, mixed));
                        }
                    }
                    _ => remaining.push((indexes, mixed)),
                }
            }
            self.mixed = remaining;
            self.simple.insert(index, data);
        }
    }

    fn try_assemble(&mut self, params: MessageParams) -> Result<DecodeStatus, CodecError> {
        if self.simple.len() < params.seq_len {
            return Ok(DecodeStatus::NeedMore);
        }

        let mut message: Vec<u8> = self.simple.values().flatten().copied().collect();
        message.truncate(params.message_len);

        let actual = crc32fast::hash(&message);
        if actual != params.checksum {
            self.reset();
            return Err(CodecError::ChecksumMismatch {
                expected: params.checksum,
                actual,
            });
        }

        tracing::debug!(
            ur_type = %self.expected_type,
            parts = self.seen.len(),
            bytes = message.len(),
            "Fountain message reassembled"
        );
        self.result = Some(message);
        Ok(DecodeStatus::Complete)
    }

    fn reset(&mut self) {
        self.params = None;
        self.simple.clear();
        self.mixed.clear();
        self.seen.clear();
    }
}

impl Decoder for FountainDecoder {
    type Output = Vec<u8>;

    fn receive(&mut self, fragment: &str) -> Result<DecodeStatus, CodecError> {
        if self.result.is_some() {
            return Ok(DecodeStatus::Complete);
        }

        let normalized = fragment.trim().to_ascii_lowercase();
        let rest = normalized
            .strip_prefix(UR_SCHEME)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or_else(|| self.mismatch(fragment))?;

        let components: Vec<&str> = rest.split('/').collect();
        if components[0] != self.expected_type {
            return Err(self.mismatch(fragment));
        }

        match components.as_slice() {
            [_, body] => {
                let message = hex::decode(body).map_err(|e| CodecError::Malformed(e.to_string()))?;
                if message.is_empty() {
                    return Err(CodecError::Malformed("empty single-part body".to_string()));
                }
                self.result = Some(message);
                Ok(DecodeStatus::Complete)
            }
            [_, sequence, body] => {
                let (seq_num, seq_len) = sequence
                    .split_once('-')
                    .and_then(|(n, l)| Some((n.parse::<u32>().ok()?, l.parse::<u32>().ok()?)))
                    .ok_or_else(|| CodecError::Malformed(format!("bad sequence '{sequence}'")))?;

                let bytes = hex::decode(body).map_err(|e| CodecError::Malformed(e.to_string()))?;
                let part: FountainPart =
                    bincode::deserialize(&bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;

                if part.seq_num != seq_num || part.seq_len != seq_len {
                    return Err(CodecError::Malformed(format!(
                        "header {seq_num}-{seq_len} disagrees with body {}-{}",
                        part.seq_num, part.seq_len
                    )));
                }
                self.receive_part(part)
            }
            _ => Err(CodecError::Malformed(format!("unexpected UR shape '{}'", preview(fragment)))),
        }
    }

    fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    fn result(&self) -> Option<Vec<u8>> {
        self.result.clone()
    }

    fn progress(&self) -> f64 {
        if self.result.is_some() {
            return 1.0;
        }
        match self.params {
            Some(p) => self.simple.len() as f64 / p.seq_len as f64,
            None => 0.0,
        }
    }
}
