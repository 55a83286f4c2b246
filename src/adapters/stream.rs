//! Streamed response decoding
//!
//! Streamed bodies are framed as chunks separated by blank lines. The server
//! writes them as an incrementally built JSON document, so individual frames
//! carry array artifacts that must be repaired before parsing:
//!
//! * a frame made only of closing brackets (`]}}`) is skipped
//! * a frame ending in `[` is the opening record; its open brackets are closed
//! * any other frame loses trailing commas and whitespace, then any brackets
//!   it still leaves open are closed

use crate::domain::errors::ClientError;
use crate::domain::repositories::{BodyChunks, RecordSource};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;

const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Number of frames buffered per refill
pub const BATCH_SIZE: usize = 100;

/// Splits a chunked body on blank-line separators
pub struct FrameReader {
    body: Box<dyn BodyChunks>,
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a delimiter
    scanned: usize,
    eof: bool,
}

impl FrameReader {
    pub fn new(body: Box<dyn BodyChunks>) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            scanned: 0,
            eof: false,
        }
    }

    fn take_frame(&mut self) -> Option<Vec<u8>> {
        // a delimiter may straddle the previous scan boundary
        let start = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);
        let found = self.buffer[start..]
            .windows(FRAME_DELIMITER.len())
            .position(|window| window == FRAME_DELIMITER);
        let Some(offset) = found else {
            self.scanned = self.buffer.len();
            return None;
        };
        let position = start + offset;
        let frame = self.buffer[..position].to_vec();
        self.buffer.drain(..position + FRAME_DELIMITER.len());
        self.scanned = 0;
        Some(frame)
    }

    /// Next raw frame, possibly empty; `None` once the body is exhausted
    pub async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        loop {
            if let Some(frame) = self.take_frame() {
                return Ok(Some(frame));
            }
            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                self.scanned = 0;
                return Ok(Some(std::mem::take(&mut self.buffer)));
            }
            match self.body.next_chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => self.eof = true,
            }
        }
    }
}

/// Brackets needed to close every `{`/`[` left open in `text`, innermost first
pub fn closing_fragment(text: &str) -> String {
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }

    open.iter().rev().collect()
}

/// Decode one non-empty frame. `None` means the frame is an artifact to skip.
pub fn decode_frame(frame: &str, is_json: bool) -> Option<Result<Value, ClientError>> {
    if !is_json {
        return Some(Ok(Value::String(frame.to_string())));
    }

    if frame.trim_start().starts_with(']') {
        return None;
    }
    let trimmed = if frame.trim_end().ends_with('[') {
        frame.trim_end()
    } else {
        frame.trim_end().trim_end_matches(',').trim_end()
    };
    let text = format!("{}{}", trimmed, closing_fragment(trimmed));

    Some(
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Decode(format!("Invalid stream chunk {:?}: {}", text, e))),
    )
}

/// Lazily decodes a streamed body into records, `BATCH_SIZE` frames at a time
pub struct StreamDecoder {
    frames: FrameReader,
    is_json: bool,
    batch: VecDeque<String>,
    done: bool,
}

impl StreamDecoder {
    pub fn new(body: Box<dyn BodyChunks>, is_json: bool) -> Self {
        Self {
            frames: FrameReader::new(body),
            is_json,
            batch: VecDeque::with_capacity(BATCH_SIZE),
            done: false,
        }
    }

    /// Refill the batch with up to `BATCH_SIZE` frames, dropping empty ones
    async fn refill(&mut self) -> Result<(), ClientError> {
        for _ in 0..BATCH_SIZE {
            match self.frames.next_frame().await? {
                Some(frame) => {
                    let frame = String::from_utf8_lossy(&frame).into_owned();
                    if !frame.trim().is_empty() {
                        self.batch.push_back(frame);
                    }
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSource for StreamDecoder {
    async fn next_record(&mut self) -> Option<Result<Value, ClientError>> {
        loop {
            while let Some(frame) = self.batch.pop_front() {
                if let Some(record) = decode_frame(&frame, self.is_json) {
                    return Some(record);
                }
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.refill().await {
                self.done = true;
                self.batch.clear();
                return Some(Err(e));
            }
        }
    }
}
