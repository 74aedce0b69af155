/// Bounded receive buffer.
///
/// Absorbs arbitrarily sized reads from the transport into one logical
/// buffer. When a read would exceed capacity the oldest bytes are shifted out,
/// so the content is always the most recent up-to-`N` bytes in arrival order.
/// Bytes are copied verbatim, zero bytes included.

use core::cell::RefCell;

use critical_section::Mutex;

/// Fixed-capacity byte buffer with a derived text view.
pub struct StreamAccumulator<const N: usize> {
    buf: [u8; N],
    len: usize,
    evicted: usize,
}

impl<const N: usize> StreamAccumulator<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            evicted: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes discarded by overflow eviction since the last [`clear`](Self::clear).
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Append newly received bytes, evicting the oldest on overflow.
    pub fn append(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        let mut dropped = 0;

        // A read larger than the whole buffer keeps only its newest N bytes.
        let bytes = if bytes.len() > N {
            let skip = bytes.len() - N;
            dropped += self.len + skip;
            self.len = 0;
            &bytes[skip..]
        } else {
            bytes
        };

        let total = self.len + bytes.len();
        if total > N {
            let overflow = total - N;
            self.buf.copy_within(overflow..self.len, 0);
            self.len -= overflow;
            dropped += overflow;
        }

        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();

        if dropped > 0 {
            self.evicted += dropped;
            log::warn!("Receive buffer overflow, evicted {} oldest bytes", dropped);
        }
    }

    /// Reset to empty and zero-fill the storage.
    pub fn clear(&mut self) {
        self.buf.fill(0);
        self.len = 0;
        self.evicted = 0;
    }

    /// The occupied portion as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Read-only text view of the occupied portion.
    ///
    /// Line noise or an eviction that split a multi-byte character can leave
    /// invalid UTF-8 in the buffer; the view is then the newest non-empty
    /// valid run. Use [`text_runs`](Self::text_runs) or
    /// [`text_containing`](Self::text_containing) to reach older runs.
    pub fn as_text(&self) -> &str {
        self.text_runs().last().unwrap_or("")
    }

    /// Valid UTF-8 runs of the buffer, oldest first, split at invalid bytes.
    /// A multi-byte character still arriving at the end is held back.
    pub fn text_runs(&self) -> TextRuns<'_> {
        TextRuns {
            rest: self.as_bytes(),
        }
    }

    /// The oldest valid run containing `needle`.
    pub fn text_containing(&self, needle: &str) -> Option<&str> {
        self.text_runs().find(|run| run.contains(needle))
    }

    /// Whether `needle` occurs anywhere in the buffered bytes.
    pub fn contains(&self, needle: &[u8]) -> bool {
        find_bytes(self.as_bytes(), needle).is_some()
    }
}

impl<const N: usize> Default for StreamAccumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulator guarded by a critical section, for when an interrupt handler
/// feeds bytes while the main loop searches and clears.
pub struct SharedAccumulator<const N: usize> {
    inner: Mutex<RefCell<StreamAccumulator<N>>>,
}

impl<const N: usize> SharedAccumulator<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(StreamAccumulator::new())),
        }
    }

    pub fn append(&self, bytes: &[u8]) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).append(bytes));
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).clear());
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, needle: &[u8]) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).contains(needle))
    }

    /// Run `f` over the text view with appends held off.
    pub fn with_text<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        critical_section::with(|cs| f(self.inner.borrow_ref(cs).as_text()))
    }
}

impl<const N: usize> Default for SharedAccumulator<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Iterator over the non-empty valid UTF-8 runs of a byte buffer.
pub struct TextRuns<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for TextRuns<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while !self.rest.is_empty() {
            let (run, skip) = match core::str::from_utf8(self.rest) {
                Ok(text) => (text, self.rest.len()),
                Err(e) => {
                    let valid = e.valid_up_to();
                    // error_len None: truncated trailing character, still arriving.
                    let bad = e.error_len().unwrap_or(self.rest.len() - valid);
                    let run = core::str::from_utf8(&self.rest[..valid]).unwrap_or("");
                    (run, valid + bad)
                }
            };
            self.rest = &self.rest[skip..];
            if !run.is_empty() {
                return Some(run);
            }
        }
        None
    }
}
