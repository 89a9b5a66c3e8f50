// crates/deckhand-server/src/frame.rs
// ============================================================================
// Module: Deckhand Frame Reader
// Description: Bounded newline-framed reads over a buffered stream.
// Purpose: Enforce the wire frame cap before any byte reaches the decoder.
// Dependencies: deckhand-core, tokio
// ============================================================================

//! ## Overview
//! Frames are newline-terminated lines capped at
//! [`deckhand_core::MAX_FRAME_BYTES`] including the terminator. The reader
//! reports oversize frames without buffering them; the connection loop emits
//! the rejection, then resynchronizes by discarding through the next newline
//! so the connection stays usable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;

use deckhand_core::MAX_FRAME_BYTES;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;

// ============================================================================
// SECTION: Frame Outcomes
// ============================================================================

/// Result of one framed read.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A complete frame within the size cap, terminator stripped.
    Frame(Vec<u8>),
    /// The frame exceeded the cap.
    ///
    /// `synchronized` is true when the terminator was already consumed;
    /// otherwise the caller must call [`discard_to_newline`] after writing
    /// the rejection.
    TooLarge {
        /// Whether the oversize frame's terminator was consumed.
        synchronized: bool,
    },
    /// The peer closed the connection before completing a frame.
    Closed,
}

/// Reads one newline-terminated frame, enforcing the size cap.
///
/// The cap counts the terminator: a frame of `MAX_FRAME_BYTES - 1` content
/// bytes plus `\n` is the largest accepted.
///
/// # Errors
///
/// Returns [`io::Error`] when the underlying read fails.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<FrameOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut frame = Vec::new();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(FrameOutcome::Closed);
        }
        if let Some(position) = available.iter().position(|byte| *byte == b'\n') {
            if frame.len() + position + 1 > MAX_FRAME_BYTES {
                reader.consume(position + 1);
                return Ok(FrameOutcome::TooLarge {
                    synchronized: true,
                });
            }
            frame.extend_from_slice(&available[..position]);
            reader.consume(position + 1);
            return Ok(FrameOutcome::Frame(frame));
        }
        let chunk = available.len();
        if frame.len() + chunk + 1 > MAX_FRAME_BYTES {
            reader.consume(chunk);
            return Ok(FrameOutcome::TooLarge {
                synchronized: false,
            });
        }
        frame.extend_from_slice(available);
        reader.consume(chunk);
    }
}

/// Discards buffered bytes through the next newline.
///
/// Used to resynchronize after an oversize frame. Returns quietly when the
/// peer closes before a newline arrives.
///
/// # Errors
///
/// Returns [`io::Error`] when the underlying read fails.
pub async fn discard_to_newline<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        if let Some(position) = available.iter().position(|byte| *byte == b'\n') {
            reader.consume(position + 1);
            return Ok(());
        }
        let chunk = available.len();
        reader.consume(chunk);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
