/// Byte source/sink boundary to the UART (or I2C/SPI bridge) driver.
///
/// The peripheral driver itself lives outside this crate; anything that can
/// hand over already-received bytes without blocking and push bytes out can
/// drive a [`Link`](crate::link::Link).

use serde::Deserialize;

/// Largest single read requested from the transport per poll.
pub const READ_CHUNK: usize = 200;

/// A non-blocking byte source and sink.
pub trait ByteSource {
    /// Transport-specific failure.
    type Error: core::fmt::Debug;

    /// Copy up to `buf.len()` already-received bytes into `buf`.
    /// Returns 0 when nothing is pending; must not block waiting for data.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Send all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    type Error = T::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }
}

/// Line ending appended by the send step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terminator {
    /// `\r\n`: the common case across the module families
    CrLf,
    /// `\r` only
    Cr,
    /// `\n` only
    Lf,
    /// Send the line verbatim
    None,
}

impl Terminator {
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            Terminator::CrLf => b"\r\n",
            Terminator::Cr => b"\r",
            Terminator::Lf => b"\n",
            Terminator::None => b"",
        }
    }
}
