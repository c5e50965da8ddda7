//! Range header parsing and chunk planning.
//!
//! Parsing is deliberately permissive: the first run of ASCII digits in the
//! header value is taken as the start offset and everything else is ignored.
//! `bytes=500-999` and `bytes=500-` both start at 500, a suffix range such as
//! `bytes=-300` starts at 300, and a value without any digits starts at 0.
//! The client's requested end is never honoured; every window is capped at
//! [`CHUNK_CEILING`] bytes and clients page through a file with successive
//! requests.

use reelmark_common::{Error, Result};

/// Maximum bytes served by a single partial response.
pub const CHUNK_CEILING: u64 = 1_000_000;

/// Inclusive byte window `[start, end]` of one partial response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: u64,
    pub end: u64,
    pub content_length: u64,
}

impl RangeWindow {
    /// Value of the `Content-Range` header for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Extract the start offset from a raw `Range` header value.
///
/// Fails with `MissingRange` when no header was sent and with
/// `RangeNotSatisfiable` when the digits do not fit in a `u64`.
pub fn parse_start(header: Option<&str>, size: u64) -> Result<u64> {
    let header = header.ok_or(Error::MissingRange)?;

    let digits: String = header
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return Ok(0);
    }

    digits
        .parse::<u64>()
        .map_err(|_| Error::RangeNotSatisfiable { start: u64::MAX, size })
}

/// Compute the window served for a request starting at `start`.
pub fn plan(start: u64, size: u64) -> Result<RangeWindow> {
    if start >= size {
        return Err(Error::RangeNotSatisfiable { start, size });
    }

    let end = start.saturating_add(CHUNK_CEILING).min(size - 1);
    Ok(RangeWindow {
        start,
        end,
        content_length: end - start + 1,
    })
}

/// Parse and plan in one step.
pub fn plan_request(header: Option<&str>, size: u64) -> Result<RangeWindow> {
    let start = parse_start(header, size)?;
    plan(start, size)
}
