/// Bounded wait for a command response.
///
/// Each poll pulls whatever the transport has into the accumulator and
/// searches the *cumulative* buffer, so a token split across reads is still
/// found. The expected token is checked before the error token: when a single
/// read completes both, the transaction succeeds.

use embedded_hal::delay::DelayNs;

use crate::accumulator::StreamAccumulator;
use crate::error::Error;
use crate::transport::{ByteSource, READ_CHUNK};

/// Timeout expressed as a number of polls and a delay between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    /// Number of reads before giving up. A budget of 0 still reads once.
    pub max_polls: u32,
    /// Delay between consecutive reads, in milliseconds.
    pub poll_delay_ms: u32,
}

impl PollBudget {
    pub const fn new(max_polls: u32, poll_delay_ms: u32) -> Self {
        Self {
            max_polls,
            poll_delay_ms,
        }
    }

    /// Approximate wall-clock bound, ignoring read time.
    pub const fn approx_timeout_ms(&self) -> u64 {
        self.max_polls.saturating_sub(1) as u64 * self.poll_delay_ms as u64
    }
}

/// What a wait is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction<'a> {
    pub expected: &'a str,
    pub error: Option<&'a str>,
    pub budget: PollBudget,
}

impl<'a> PendingTransaction<'a> {
    pub const fn new(expected: &'a str, error: Option<&'a str>, budget: PollBudget) -> Self {
        Self {
            expected,
            error,
            budget,
        }
    }
}

/// Outcome of searching the buffer once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Matched,
    Failed,
    Pending,
}

fn scan<const N: usize>(acc: &StreamAccumulator<N>, txn: &PendingTransaction<'_>) -> Scan {
    if acc.contains(txn.expected.as_bytes()) {
        Scan::Matched
    } else if txn.error.is_some_and(|e| acc.contains(e.as_bytes())) {
        Scan::Failed
    } else {
        Scan::Pending
    }
}

/// Drive `source` into `acc` until `txn` resolves.
///
/// On success the returned text is the buffered response: the whole buffer,
/// or if line noise left invalid UTF-8 in it, the valid run holding the
/// expected token. Bytes read from the source are consumed; callers clear the
/// accumulator once they are done with the text.
pub fn await_response<'b, S, D, const N: usize>(
    source: &mut S,
    delay: &mut D,
    acc: &'b mut StreamAccumulator<N>,
    txn: &PendingTransaction<'_>,
) -> Result<&'b str, Error<S::Error>>
where
    S: ByteSource,
    D: DelayNs,
{
    let mut chunk = [0u8; READ_CHUNK];
    let mut polls: u32 = 0;

    let outcome = loop {
        let n = source.read(&mut chunk).map_err(Error::Transport)?;
        if n > 0 {
            log::trace!("Poll {}: received {} bytes", polls + 1, n);
            acc.append(&chunk[..n]);
        }
        polls += 1;

        match scan(acc, txn) {
            Scan::Pending => {}
            resolved => break resolved,
        }

        if polls >= txn.budget.max_polls {
            break Scan::Pending;
        }
        delay.delay_ms(txn.budget.poll_delay_ms);
    };

    let acc: &'b StreamAccumulator<N> = acc;
    match outcome {
        Scan::Matched => {
            log::debug!("Got {:?} after {} polls", txn.expected, polls);
            Ok(acc
                .text_containing(txn.expected)
                .unwrap_or_else(|| acc.as_text()))
        }
        Scan::Failed => Err(Error::Protocol),
        Scan::Pending => Err(Error::Timeout { polls }),
    }
}
