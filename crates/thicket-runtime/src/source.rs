//! Read-only access to the text being parsed.
//!
//! The lexer never needs the text as one contiguous buffer; it asks for the
//! chunk containing an offset and walks forward from there.

use std::borrow::Cow;
use std::ops::Range;

/// Text the parser reads from.
pub trait Source {
    /// Total length in bytes.
    fn len(&self) -> usize;

    /// The bytes from `offset` to the end of the chunk containing it.
    ///
    /// Returns an empty slice at or past the end of the text. Never empty
    /// before the end.
    fn chunk_at(&self, offset: usize) -> &[u8];

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.chunk_at(offset).first().copied()
    }

    /// Bytes of `range`, clamped to the text. Borrowed when the range lies
    /// within one chunk.
    fn slice(&self, range: Range<usize>) -> Cow<'_, [u8]> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let first = self.chunk_at(start);
        if first.len() >= end - start {
            return Cow::Borrowed(&first[..end - start]);
        }
        let mut out = Vec::with_capacity(end - start);
        let mut offset = start;
        while offset < end {
            let chunk = self.chunk_at(offset);
            if chunk.is_empty() {
                break;
            }
            let take = chunk.len().min(end - offset);
            out.extend_from_slice(&chunk[..take]);
            offset += take;
        }
        Cow::Owned(out)
    }
}

impl Source for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.get(offset..).unwrap_or_default()
    }
}

impl Source for str {
    fn len(&self) -> usize {
        str::len(self)
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.as_bytes().chunk_at(offset)
    }
}

impl Source for String {
    fn len(&self) -> usize {
        String::len(self)
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.as_bytes().chunk_at(offset)
    }
}

impl Source for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        self.as_slice().chunk_at(offset)
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        (**self).chunk_at(offset)
    }
}

/// Text held as a sequence of pieces, never concatenated.
#[derive(Clone, Debug, Default)]
pub struct ChunkedSource {
    chunks: Vec<Vec<u8>>,
    /// Start offset of each chunk.
    starts: Vec<usize>,
    len: usize,
}

impl ChunkedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a piece. Empty pieces are ignored.
    pub fn push(&mut self, chunk: impl Into<Vec<u8>>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        self.starts.push(self.len);
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

impl<C: Into<Vec<u8>>> FromIterator<C> for ChunkedSource {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        let mut source = ChunkedSource::new();
        for chunk in iter {
            source.push(chunk);
        }
        source
    }
}

impl Source for ChunkedSource {
    fn len(&self) -> usize {
        self.len
    }

    fn chunk_at(&self, offset: usize) -> &[u8] {
        if offset >= self.len {
            return &[];
        }
        let index = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        &self.chunks[index][offset - self.starts[index]..]
    }
}

/// Forward byte iterator over a source, chunk by chunk.
pub(crate) struct Bytes<'s, S: Source + ?Sized> {
    source: &'s S,
    offset: usize,
    chunk: &'s [u8],
}

impl<'s, S: Source + ?Sized> Bytes<'s, S> {
    pub fn new(source: &'s S, offset: usize) -> Self {
        Self {
            source,
            offset,
            chunk: source.chunk_at(offset),
        }
    }
}

impl<S: Source + ?Sized> Iterator for Bytes<'_, S> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.chunk.is_empty() {
            self.chunk = self.source.chunk_at(self.offset);
        }
        let (&byte, rest) = self.chunk.split_first()?;
        self.chunk = rest;
        self.offset += 1;
        Some(byte)
    }
}

/// Length of `range` of the source.
pub(crate) fn measure<S: Source + ?Sized>(source: &S, range: Range<usize>) -> crate::Length {
    let mut length = crate::Length::ZERO;
    let mut offset = range.start;
    while offset < range.end {
        let chunk = source.chunk_at(offset);
        if chunk.is_empty() {
            break;
        }
        let take = chunk.len().min(range.end - offset);
        length.extend(&chunk[..take]);
        offset += take;
    }
    length
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_lookup() {
        let source: ChunkedSource = ["mod", "ule ", "", "M"].into_iter().collect();
        assert_eq!(source.len(), 8);
        assert_eq!(source.chunk_count(), 3);
        assert_eq!(source.chunk_at(0), b"mod");
        assert_eq!(source.chunk_at(3), b"ule ");
        assert_eq!(source.chunk_at(4), b"le ");
        assert_eq!(source.chunk_at(7), b"M");
        assert_eq!(source.chunk_at(8), b"");
        assert_eq!(&*source.slice(1..7), b"odule ");
        assert!(matches!(source.slice(3..5), Cow::Borrowed(_)));
    }

    #[test]
    fn bytes_cross_chunks() {
        let source: ChunkedSource = ["ab", "c", "de"].into_iter().collect();
        let collected: Vec<u8> = Bytes::new(&source, 1).collect();
        assert_eq!(collected, b"bcde");
    }

    #[test]
    fn measure_counts_rows() {
        let text = "a\nbc\n";
        let length = measure(text, 0..text.len());
        assert_eq!(length.bytes, 5);
        assert_eq!(length.extent, crate::Point::new(2, 0));
    }
}
