/// Command/response link to one UART peripheral.
///
/// A [`Link`] owns the transport, the poll delay and the receive buffer, so
/// the buffer's lifetime is tied to the device it serves. Everything runs on
/// the caller's thread; [`Link::transact`] and [`Link::wait_for`] are the only
/// calls that block, and only for their poll budget.
///
/// Failures are logged here and returned; nothing panics or aborts. Whether to
/// retry is the caller's decision.

use embedded_hal::delay::DelayNs;

use crate::accumulator::StreamAccumulator;
use crate::config::LinkConfig;
use crate::defaults::DeviceProfile;
use crate::error::{Error, FieldError};
use crate::sentence::ParsedSentence;
use crate::transport::{ByteSource, READ_CHUNK};
use crate::waiter::{await_response, PendingTransaction};

/// Receive buffer size used by the module drivers.
pub const DEFAULT_CAPACITY: usize = 500;

pub struct Link<S, D, const N: usize = DEFAULT_CAPACITY> {
    source: S,
    delay: D,
    acc: StreamAccumulator<N>,
    config: LinkConfig,
}

impl<S, D, const N: usize> Link<S, D, N>
where
    S: ByteSource,
    D: DelayNs,
{
    pub fn new(source: S, delay: D, config: LinkConfig) -> Self {
        Self {
            source,
            delay,
            acc: StreamAccumulator::new(),
            config,
        }
    }

    /// Link using a device profile's terminator and poll budget.
    pub fn with_profile(source: S, delay: D, profile: &DeviceProfile) -> Self {
        Self::new(source, delay, profile.into())
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LinkConfig) {
        self.config = config;
    }

    pub fn accumulator(&self) -> &StreamAccumulator<N> {
        &self.acc
    }

    /// Drop everything buffered so far.
    pub fn clear(&mut self) {
        self.acc.clear();
    }

    /// Give back the transport and delay.
    pub fn release(self) -> (S, D) {
        (self.source, self.delay)
    }

    /// Transaction using this link's configured poll budget.
    pub fn transaction<'a>(
        &self,
        expected: &'a str,
        error: Option<&'a str>,
    ) -> PendingTransaction<'a> {
        PendingTransaction::new(expected, error, self.config.budget())
    }

    /// Write `line` followed by the configured terminator.
    pub fn send(&mut self, line: &str) -> Result<(), Error<S::Error>> {
        log::debug!("-> {}", line);
        let result = self
            .source
            .write(line.as_bytes())
            .and_then(|()| self.source.write(self.config.terminator.as_bytes()))
            .map_err(Error::Transport);
        if let Err(e) = &result {
            log::warn!("Failed to send {:?}: {}", line, e);
        }
        result
    }

    /// Send `line`, wait for `txn` to resolve, and hand the buffered response
    /// to `f`. Stale bytes are discarded before sending; the buffer is
    /// cleared again once the transaction completes, successfully or not.
    pub fn transact<R>(
        &mut self,
        line: &str,
        txn: &PendingTransaction<'_>,
        f: impl FnOnce(&str) -> R,
    ) -> Result<R, Error<S::Error>> {
        self.acc.clear();
        self.send(line)?;
        self.wait_for(txn, f)
    }

    /// Wait for `txn` without sending anything (boot banners, unsolicited
    /// prompts). Bytes already buffered count toward the match.
    pub fn wait_for<R>(
        &mut self,
        txn: &PendingTransaction<'_>,
        f: impl FnOnce(&str) -> R,
    ) -> Result<R, Error<S::Error>> {
        let result = await_response(&mut self.source, &mut self.delay, &mut self.acc, txn).map(f);
        if let Err(e) = &result {
            log::warn!("Waiting for {:?}: {}", txn.expected, e);
        }
        self.acc.clear();
        result
    }

    /// Read whatever the transport has into the buffer once.
    pub fn poll(&mut self) -> Result<usize, Error<S::Error>> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.source.read(&mut chunk).map_err(|e| {
            log::warn!("Transport read failed: {:?}", e);
            Error::Transport(e)
        })?;
        if n > 0 {
            log::trace!("Received {} bytes", n);
            self.acc.append(&chunk[..n]);
        }
        Ok(n)
    }

    /// Poll once, then copy field `index` of the buffered sentence tagged
    /// `tag` into `out`. Returns the field length; 0 means the field is
    /// present but empty.
    ///
    /// The buffer is left intact so a sentence still arriving can be retried
    /// on the next call; clear it after a successful read to move on to the
    /// next sentence.
    pub fn poll_field(
        &mut self,
        tag: &str,
        index: usize,
        delimiter: char,
        out: &mut [u8],
    ) -> Result<usize, Error<S::Error>> {
        self.poll()?;

        // Noise bytes split the buffer into valid runs; a sentence never
        // spans one, so each run is searched on its own.
        let mut missing = FieldError::NotFound;
        for run in self.acc.text_runs() {
            let copied =
                ParsedSentence::locate(run, tag, delimiter).and_then(|s| s.copy_field(index, out));
            match copied {
                Ok(n) => return Ok(n),
                Err(FieldError::NotFound) => {}
                Err(FieldError::FieldAbsent) => missing = FieldError::FieldAbsent,
                Err(e) => return Err(e.into()),
            }
        }
        Err(missing.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{format, query, CommandKind};
    use crate::defaults::{gga, BLUETOOTH_AT, NMEA_DELIMITER, SUBGHZ_RADIO};
    use crate::mock::{MockFault, RecordingDelay, ScriptedSource};
    use crate::transport::Terminator;

    type TestLink = Link<ScriptedSource, RecordingDelay, 128>;

    fn link(chunks: &[&[u8]]) -> TestLink {
        Link::new(
            ScriptedSource::new(chunks),
            RecordingDelay::default(),
            LinkConfig::new(),
        )
    }

    #[test]
    fn send_appends_terminator() {
        let mut link = link(&[]);
        let line = format("AT+NAME", Some("ClickBoard")).unwrap();
        link.send(&line).unwrap();
        let (src, _) = link.release();
        assert_eq!(src.written, b"AT+NAME=ClickBoard\r\n");
    }

    #[test]
    fn send_uses_configured_terminator() {
        let mut link = link(&[]);
        link.set_config(LinkConfig {
            terminator: Terminator::Cr,
            ..LinkConfig::new()
        });
        link.send("AT").unwrap();
        let (src, _) = link.release();
        assert_eq!(src.written, b"AT\r");
    }

    #[test]
    fn send_failure_is_transport_error() {
        let mut link = link(&[]);
        link.source.fail_write = true;
        assert_eq!(link.send("AT"), Err(Error::Transport(MockFault)));
    }

    #[test]
    fn transact_returns_response_and_clears() {
        let mut link = link(&[b"+NAME:", b"ClickBoard\r\nO", b"K\r\n"]);
        let line = query(CommandKind::Query, "AT+NAME").unwrap();
        let name = link
            .transact(&line, &BLUETOOTH_AT.transaction(), |text| {
                text.contains("ClickBoard")
            })
            .unwrap();
        assert!(name);
        assert!(link.accumulator().is_empty());
    }

    #[test]
    fn transact_discards_stale_bytes() {
        let mut link = link(&[b"stale ERR\r\n"]);
        link.poll().unwrap();
        link.source.push(b"OK\r\n");
        let txn = link.transaction("OK", Some("ERR"));
        assert_eq!(link.transact("AT", &txn, |t| t.len()), Ok(4));
    }

    #[test]
    fn transact_protocol_error_clears_buffer() {
        let mut link = link(&[b"ERR\r\n"]);
        let txn = link.transaction("OK", Some("ERR"));
        assert_eq!(link.transact("AT+BAD", &txn, |_| ()), Err(Error::Protocol));
        assert!(link.accumulator().is_empty());
    }

    #[test]
    fn transact_times_out_with_configured_budget() {
        let mut link = link(&[]);
        link.set_config(LinkConfig {
            max_polls: 4,
            poll_delay_ms: 3,
            ..LinkConfig::new()
        });
        let txn = link.transaction("OK", None);
        let result = link.transact("AT", &txn, |_| ());
        assert_eq!(result, Err(Error::Timeout { polls: 4 }));
        let (src, delay) = link.release();
        assert_eq!(src.reads, 4);
        assert_eq!(delay.calls, 3);
    }

    #[test]
    fn wait_for_prompt_without_sending() {
        let mut link = link(&[b"boot...\r\n", b"COM", b"1>"]);
        let result = link.wait_for(&SUBGHZ_RADIO.transaction(), |t| t.ends_with("COM1>"));
        assert_eq!(result, Ok(true));
        let (src, _) = link.release();
        assert!(src.written.is_empty());
    }

    #[test]
    fn wait_for_counts_already_buffered_bytes() {
        let mut link = link(&[b"Rea"]);
        link.poll().unwrap();
        link.source.push(b"dy\r\n");
        let txn = link.transaction("Ready", None);
        assert_eq!(link.wait_for(&txn, |_| ()), Ok(()));
    }

    #[test]
    fn poll_field_reads_gga_latitude() {
        let mut link = link(&[b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n"]);
        let mut out = [0u8; 16];
        let n = link
            .poll_field(gga::TAG, gga::LATITUDE, NMEA_DELIMITER, &mut out)
            .unwrap();
        assert_eq!(&out[..n], b"4807.038");
    }

    #[test]
    fn poll_field_waits_for_split_sentence() {
        let mut link = link(&[b"$GPGGA,123519,48", b"07.038,N,"]);
        let mut out = [0u8; 16];
        assert_eq!(
            link.poll_field("GGA", 3, ',', &mut out),
            Err(Error::Field(FieldError::FieldAbsent))
        );
        let n = link.poll_field("GGA", 3, ',', &mut out).unwrap();
        assert_eq!(&out[..n], b"4807.038");
    }

    #[test]
    fn poll_field_without_sentence_is_not_found() {
        let mut link = link(&[b"$GPGSV,3,1,11*00\r\n"]);
        let mut out = [0u8; 16];
        assert_eq!(
            link.poll_field("GGA", 2, ',', &mut out),
            Err(Error::Field(FieldError::NotFound))
        );
    }

    #[test]
    fn poll_field_empty_field_reads_zero_bytes() {
        let mut link = link(&[b"$GPGGA,,,,,,0,00,99.99,,,,,,*48\r\n"]);
        let mut out = [0u8; 16];
        assert_eq!(link.poll_field("GGA", 3, ',', &mut out), Ok(0));
    }

    #[test]
    fn poll_field_finds_sentence_before_trailing_noise() {
        let mut link = link(&[
            b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n",
            b"\xFF",
        ]);
        link.poll().unwrap();
        let mut out = [0u8; 16];
        let n = link.poll_field("GGA", 3, ',', &mut out).unwrap();
        assert_eq!(&out[..n], b"4807.038");
    }

    #[test]
    fn poll_field_skips_truncated_sentence_cut_by_noise() {
        let mut link = link(&[b"$GPGGA,1235\xFF$GPGGA,123519,4807.038,N*00\r\n"]);
        let mut out = [0u8; 16];
        let n = link.poll_field("GGA", 3, ',', &mut out).unwrap();
        assert_eq!(&out[..n], b"4807.038");
    }

    #[test]
    fn poll_field_reads_past_span_table() {
        let mut line = std::string::String::from("+LIST");
        for i in 2..=40 {
            line.push_str(&std::format!(",{i}"));
        }
        line.push_str("\r\n");
        let mut link = link(&[line.as_bytes()]);
        let mut out = [0u8; 4];
        let n = link.poll_field("+LIST", 35, ',', &mut out).unwrap();
        assert_eq!(&out[..n], b"35");
    }

    #[test]
    fn profile_link_sends_profile_terminator() {
        let mut link: TestLink = Link::with_profile(
            ScriptedSource::new(&[b"COM1>"]),
            RecordingDelay::default(),
            &SUBGHZ_RADIO,
        );
        assert_eq!(link.config().terminator, Terminator::Cr);
        let txn = link.transaction("COM1>", Some("ERR"));
        assert_eq!(txn.budget, SUBGHZ_RADIO.budget);
        assert_eq!(link.transact("ATR", &txn, |_| ()), Ok(()));
        let (src, _) = link.release();
        assert_eq!(src.written, b"ATR\r");
    }

    #[test]
    fn poll_read_failure_is_transport_error() {
        let mut link = link(&[]);
        link.source.fail_read_at = Some(1);
        assert_eq!(link.poll(), Err(Error::Transport(MockFault)));
    }
}
