/// Positional field extraction from tagged, delimited sentences.
///
/// NMEA-style lines look like `$GPGGA,123519,4807.038,N,...,*47\r\n`. Fields
/// are numbered from 1, starting at the tag: in the line above, tag `"GGA"`
/// makes field 1 `GGA`, field 2 `123519`, field 3 `4807.038`. A field runs up
/// to the next delimiter or end token (`*`, `\r`, `\n`).
///
/// An empty field is a successful result, not an error: receivers emit empty
/// fields until they have data (e.g. no position fix yet). A field past the
/// end of the sentence is [`FieldError::FieldAbsent`], as is a field whose
/// terminator has not arrived yet.
///
/// Extraction is a single forward scan with no backtracking, cheap enough to
/// run on every poll.

use heapless::Vec;

use crate::error::FieldError;

/// Field spans a [`ParsedSentence`] caches; later fields are found by
/// rescanning the sentence.
pub const MAX_FIELDS: usize = 32;

fn is_end(c: char) -> bool {
    matches!(c, '*' | '\r' | '\n')
}

/// Extract field `index` of the first sentence containing `tag`.
pub fn parse_field<'a>(
    text: &'a str,
    tag: &str,
    index: usize,
    delimiter: char,
) -> Result<&'a str, FieldError> {
    if index == 0 {
        return Err(FieldError::InvalidIndex);
    }
    let start = text.find(tag).ok_or(FieldError::NotFound)?;
    let sentence = &text[start..];
    let span = field_span(sentence, index, delimiter)?;
    Ok(&sentence[span.start..span.end()])
}

/// Locate field `index` (1-based) in `sentence`, which starts at its tag.
fn field_span(sentence: &str, index: usize, delimiter: char) -> Result<Span, FieldError> {
    let mut current = 1;
    let mut field_start = 0;
    for (i, c) in sentence.char_indices() {
        let delim = c == delimiter;
        if !delim && !is_end(c) {
            continue;
        }
        if current == index {
            return Ok(Span {
                start: field_start,
                len: i - field_start,
            });
        }
        if !delim {
            return Err(FieldError::FieldAbsent);
        }
        current += 1;
        field_start = i + c.len_utf8();
    }

    Err(FieldError::FieldAbsent)
}

/// Byte range of one field within a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Field layout of one sentence, as offsets into the text it was found in.
///
/// Only fields whose terminator has arrived are counted. The first
/// [`MAX_FIELDS`] spans are cached; fields past that are still reachable.
#[derive(Debug, Clone)]
pub struct ParsedSentence<'a> {
    text: &'a str,
    delimiter: char,
    spans: Vec<Span, MAX_FIELDS>,
    count: usize,
    complete: bool,
}

impl<'a> ParsedSentence<'a> {
    /// Find the first sentence containing `tag` and record its field spans.
    pub fn locate(text: &'a str, tag: &str, delimiter: char) -> Result<Self, FieldError> {
        let start = text.find(tag).ok_or(FieldError::NotFound)?;
        let text = &text[start..];

        let mut spans = Vec::new();
        let mut count = 0;
        let mut complete = false;
        let mut field_start = 0;
        for (i, c) in text.char_indices() {
            let delim = c == delimiter;
            if !delim && !is_end(c) {
                continue;
            }
            // Table full: keep counting, span() rescans for these.
            let _ = spans.push(Span {
                start: field_start,
                len: i - field_start,
            });
            count += 1;
            if !delim {
                complete = true;
                break;
            }
            field_start = i + c.len_utf8();
        }

        Ok(Self {
            text,
            delimiter,
            spans,
            count,
            complete,
        })
    }

    /// Number of terminated fields, tag field included.
    pub fn field_count(&self) -> usize {
        self.count
    }

    /// Whether the sentence's end token was seen.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn span(&self, index: usize) -> Result<Span, FieldError> {
        if index == 0 {
            return Err(FieldError::InvalidIndex);
        }
        if index > self.count {
            return Err(FieldError::FieldAbsent);
        }
        match self.spans.get(index - 1) {
            Some(span) => Ok(*span),
            None => field_span(self.text, index, self.delimiter),
        }
    }

    /// Field `index` (1-based) as text.
    pub fn field(&self, index: usize) -> Result<&'a str, FieldError> {
        let span = self.span(index)?;
        Ok(&self.text[span.start..span.end()])
    }

    /// Copy field `index` into `out`, returning the number of bytes written.
    pub fn copy_field(&self, index: usize, out: &mut [u8]) -> Result<usize, FieldError> {
        let field = self.field(index)?.as_bytes();
        if field.len() > out.len() {
            return Err(FieldError::BufferTooSmall {
                needed: field.len(),
            });
        }
        out[..field.len()].copy_from_slice(field);
        Ok(field.len())
    }
}

/// Check the `*XX` checksum of the first `$`-sentence in `text`.
///
/// The checksum is the XOR of every byte between `$` and `*`, written as two
/// hex digits. Returns `Ok(false)` on mismatch or malformed digits.
pub fn verify_checksum(text: &str) -> Result<bool, FieldError> {
    let start = text.find('$').ok_or(FieldError::NotFound)?;
    let body = &text[start + 1..];
    let star = body.find('*').ok_or(FieldError::FieldAbsent)?;
    let digits = body
        .get(star + 1..star + 3)
        .ok_or(FieldError::FieldAbsent)?;

    // from_str_radix would also take a sign ("+7").
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(false);
    }
    let Ok(expected) = u8::from_str_radix(digits, 16) else {
        return Ok(false);
    };
    let actual = body.as_bytes()[..star].iter().fold(0u8, |acc, b| acc ^ b);
    Ok(actual == expected)
}
