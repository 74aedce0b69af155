/// Test doubles for the transport and the poll delay.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;

use crate::transport::ByteSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockFault;

/// Delivers one scripted chunk per read, then nothing.
#[derive(Default)]
pub struct ScriptedSource {
    chunks: VecDeque<Vec<u8>>,
    pub written: Vec<u8>,
    pub reads: u32,
    pub fail_read_at: Option<u32>,
    pub fail_write: bool,
}

impl ScriptedSource {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.chunks.push_back(chunk.to_vec());
    }
}

impl ByteSource for ScriptedSource {
    type Error = MockFault;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, MockFault> {
        self.reads += 1;
        if self.fail_read_at == Some(self.reads) {
            return Err(MockFault);
        }
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.chunks.push_front(chunk);
        }
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), MockFault> {
        if self.fail_write {
            return Err(MockFault);
        }
        self.written.extend_from_slice(bytes);
        Ok(())
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub calls: u32,
    pub total_ns: u64,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}
