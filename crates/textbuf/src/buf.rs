//! The buffer descriptor and its in-place mutation engine.

use bstr::ByteSlice;
use core::fmt;

use crate::{ascii, error::CapacityError, index, search, utf8};

/// A fixed-capacity text buffer over caller-owned storage.
///
/// The descriptor borrows a mutable byte slice; the slice's length is the
/// physical capacity, *including* one reserved byte for the NUL terminator.
/// Two invariants hold after every operation:
///
/// - `len() < capacity()` — content never uses the terminator slot, and
/// - the byte at `len()` is `0` — the storage always carries a terminated
///   C string.
///
/// Content is conventionally UTF-8 but not enforced: byte-oriented
/// operations can leave invalid sequences behind (each documents when), and
/// [`sanitize`](Self::sanitize) repairs them in place. Capacity exhaustion
/// is a soft failure everywhere: operations clamp their effect and
/// re-terminate, and the only signal is the returned length falling short
/// of what unbounded growth would have produced. The `try_` variants report
/// overflow instead of clamping.
pub struct TextBuf<'a> {
    storage: &'a mut [u8],
    len: usize,
    peak: usize,
}

impl<'a> TextBuf<'a> {
    /// Creates an empty buffer over `storage` and writes the terminator.
    ///
    /// # Panics
    ///
    /// Panics if `storage` is empty: one byte is reserved for the
    /// terminator, so the smallest usable capacity is 1 (an always-empty
    /// string).
    #[must_use]
    pub fn new(storage: &'a mut [u8]) -> Self {
        assert!(
            !storage.is_empty(),
            "TextBuf storage must hold at least the terminator byte"
        );
        storage[0] = 0;
        Self {
            storage,
            len: 0,
            peak: 0,
        }
    }

    /// Adopts storage that already holds a NUL-terminated string.
    ///
    /// Content length is the offset of the first NUL byte; if none is found
    /// within the writable range the content is truncated to `capacity - 1`
    /// and a terminator is forced.
    ///
    /// # Panics
    ///
    /// Panics if `storage` is empty, as for [`new`](Self::new).
    #[must_use]
    pub fn from_existing(storage: &'a mut [u8]) -> Self {
        assert!(
            !storage.is_empty(),
            "TextBuf storage must hold at least the terminator byte"
        );
        let cap = storage.len();
        let len = storage[..cap - 1].find_byte(0).unwrap_or(cap - 1);
        storage[len] = 0;
        Self {
            storage,
            len,
            peak: len,
        }
    }

    /// Physical capacity in bytes, including the terminator slot.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Current content length in bytes (not codepoints).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds no content.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` when no further byte can be appended.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity() - 1
    }

    /// Writable bytes left before the buffer is full.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity() - 1 - self.len
    }

    /// The content bytes, excluding the terminator.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    /// The content as `&str`, or `None` if it is not valid UTF-8.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    /// Number of codepoints in the content.
    #[must_use]
    pub fn char_count(&self) -> usize {
        index::char_count(self.as_bytes())
    }

    /// Is the content valid UTF-8?
    #[must_use]
    pub fn validate(&self) -> bool {
        utf8::validate(self.as_bytes())
    }

    /// Current buffer usage as a percentage of the writable capacity.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn utilization(&self) -> f32 {
        if self.capacity() <= 1 {
            return 0.0;
        }
        (self.len as f32 / (self.capacity() - 1) as f32) * 100.0
    }

    /// Highest usage percentage reached since the descriptor was created.
    ///
    /// The high-water mark survives [`clear`](Self::clear); it exists to
    /// answer "was this buffer sized generously enough?" after a run.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn peak_utilization(&self) -> f32 {
        if self.capacity() <= 1 {
            return 0.0;
        }
        (self.peak as f32 / (self.capacity() - 1) as f32) * 100.0
    }

    /// Empties the buffer in O(1). Capacity and high-water mark are kept.
    pub fn clear(&mut self) {
        self.set_len(0);
    }

    /// Re-terminates at `new_len` and updates the high-water mark. Every
    /// mutation funnels through here so the invariants hold in one place.
    pub(crate) fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len < self.capacity());
        self.storage[new_len] = 0;
        self.len = new_len;
        if new_len > self.peak {
            self.peak = new_len;
        }
    }

    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        self.storage
    }

    /// Replaces the content with `src`, truncating to fit. Returns the new
    /// length.
    pub fn assign(&mut self, src: &[u8]) -> usize {
        self.set_len(0);
        self.append(src)
    }

    /// Appends `src`, copying at most the remaining capacity. Returns the
    /// new length.
    ///
    /// Truncation is silent and byte-oriented: cutting inside a multi-byte
    /// sequence is possible and left to an explicit
    /// [`sanitize`](Self::sanitize) call, mirroring the soft-fail model.
    pub fn append(&mut self, src: &[u8]) -> usize {
        let n = core::cmp::min(src.len(), self.remaining());
        if n > 0 {
            self.storage[self.len..self.len + n].copy_from_slice(&src[..n]);
            self.set_len(self.len + n);
        }
        self.len
    }

    /// Appends all of `src` or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError`] without touching the buffer when `src` does
    /// not fit in the remaining capacity.
    pub fn try_append(&mut self, src: &[u8]) -> Result<(), CapacityError> {
        if src.len() > self.remaining() {
            return Err(CapacityError {
                needed: src.len(),
                available: self.remaining(),
            });
        }
        self.append(src);
        Ok(())
    }

    /// Appends one codepoint, or nothing if its encoding does not fit.
    /// Returns the new length.
    pub fn push_char(&mut self, c: char) -> usize {
        let mut enc = [0u8; 4];
        let encoded = c.encode_utf8(&mut enc);
        if encoded.len() <= self.remaining() {
            self.append(encoded.as_bytes());
        }
        self.len
    }

    /// Strips ASCII whitespace and control characters from both ends in
    /// place. Returns the new length.
    ///
    /// Trailing whitespace is dropped by re-terminating; leading whitespace
    /// relocates the surviving content to the front with a block move. An
    /// all-whitespace buffer becomes empty.
    pub fn trim(&mut self) -> usize {
        let content = self.as_bytes();
        let Some(start) = content.iter().position(|&b| !ascii::is_space(b)) else {
            self.set_len(0);
            return 0;
        };
        // position() succeeding guarantees rposition() does; the fallback
        // only keeps this unwrap-free.
        let end = content
            .iter()
            .rposition(|&b| !ascii::is_space(b))
            .unwrap_or(start)
            + 1;
        let new_len = end - start;
        if start > 0 {
            self.storage.copy_within(start..end, 0);
        }
        self.set_len(new_len);
        new_len
    }

    /// Inserts `src` before the codepoint at logical index `char_idx`,
    /// shifting the tail right. Returns the new length.
    ///
    /// An index past the end appends. If the result would exceed capacity
    /// the inserted span is clamped so the final string always fits; a
    /// clamp can split a multi-byte sequence, so the buffer is sanitized
    /// afterwards in that case.
    pub fn insert(&mut self, char_idx: usize, src: &[u8]) -> usize {
        if src.is_empty() {
            return self.len;
        }
        let at = index::byte_offset_of_char(self.as_bytes(), char_idx);
        let n = core::cmp::min(src.len(), self.remaining());
        if n == 0 {
            return self.len;
        }
        let clamped = n < src.len();
        self.storage.copy_within(at..self.len, at + n);
        self.storage[at..at + n].copy_from_slice(&src[..n]);
        self.set_len(self.len + n);
        if clamped {
            self.sanitize();
        }
        self.len
    }

    /// Removes `char_count` codepoints starting at logical index
    /// `char_idx`, closing the gap with a block move. Returns the new
    /// length. Out-of-range indices clamp to the end of the content.
    pub fn remove(&mut self, char_idx: usize, char_count: usize) -> usize {
        let content = self.as_bytes();
        let start = index::byte_offset_of_char(content, char_idx);
        if start >= self.len {
            return self.len;
        }
        let end = index::byte_offset_of_char(content, char_idx.saturating_add(char_count));
        self.storage.copy_within(end..self.len, start);
        self.set_len(self.len - (end - start));
        self.len
    }

    /// Copies the codepoint range `[left, right)` into `dest`, replacing its
    /// content. Returns the number of bytes written.
    ///
    /// `right == 0` means "to the end"; a non-zero `right <= left` yields an
    /// empty result. If the range exceeds `dest`'s capacity the copy is
    /// clamped at a codepoint boundary, so `dest` never receives a split
    /// sequence.
    pub fn substring(&self, dest: &mut TextBuf<'_>, left: usize, right: usize) -> usize {
        dest.set_len(0);
        let content = self.as_bytes();
        let start = index::byte_offset_of_char(content, left);
        if start >= self.len {
            return 0;
        }
        let end = if right == 0 {
            self.len
        } else {
            if right <= left {
                return 0;
            }
            // Relative scan from the start offset avoids re-walking the
            // prefix.
            start + index::byte_offset_of_char(&content[start..], right - left)
        };
        if end <= start {
            return 0;
        }
        let span = &content[start..end];
        let n = index::floor_char_boundary(span, 0, core::cmp::min(span.len(), dest.remaining()));
        dest.append(&span[..n]);
        dest.len
    }

    /// Copies the byte range `[start_byte, end_byte)` into `dest`,
    /// replacing its content. Returns `dest`'s resulting length.
    ///
    /// `end_byte == 0` (or past the end) means "to the end". Byte offsets
    /// can cut a multi-byte sequence, so the destination is passed through
    /// the sanitizer before returning; a deliberately binary payload should
    /// be copied out with [`as_bytes`](Self::as_bytes) slicing instead.
    pub fn byte_substring(&self, dest: &mut TextBuf<'_>, start_byte: usize, end_byte: usize) -> usize {
        dest.set_len(0);
        if start_byte >= self.len {
            return 0;
        }
        let end = if end_byte == 0 || end_byte > self.len {
            self.len
        } else {
            end_byte
        };
        if end <= start_byte {
            return 0;
        }
        dest.append(&self.as_bytes()[start_byte..end]);
        dest.sanitize()
    }

    /// Replaces every occurrence of `from` with `to`, growing or shrinking
    /// the tail per occurrence with block moves. Returns the new length.
    ///
    /// Replacement stops once growth would exceed capacity; the buffer is
    /// then sanitized so a previously split sequence cannot survive. An
    /// empty `from` is a no-op.
    pub fn replace(&mut self, from: &[u8], to: &[u8], ignore_case: bool) -> usize {
        if from.is_empty() {
            return self.len;
        }
        let mut len = self.len;
        let mut pos = 0;
        let mut truncated = false;
        while let Some(hit) = search::find_bytes(&self.storage[pos..len], from, ignore_case) {
            let at = pos + hit;
            if to.len() > from.len() {
                let diff = to.len() - from.len();
                if len + diff >= self.capacity() {
                    truncated = true;
                    break;
                }
                self.storage.copy_within(at + from.len()..len, at + to.len());
                len += diff;
            } else if to.len() < from.len() {
                self.storage.copy_within(at + from.len()..len, at + to.len());
                len -= from.len() - to.len();
            }
            self.storage[at..at + to.len()].copy_from_slice(to);
            pos = at + to.len();
        }
        self.set_len(len);
        if truncated { self.sanitize() } else { self.len }
    }

    /// Repairs invalid UTF-8 in place, replacing each offending byte with
    /// U+FFFD (or `?` when fewer than three bytes of capacity remain).
    /// Returns the new length. Idempotent; valid content is untouched.
    pub fn sanitize(&mut self) -> usize {
        let new_len = utf8::sanitize_in_place(self.storage, self.len);
        self.set_len(new_len);
        new_len
    }

    /// Uppercases ASCII letters in place; multi-byte sequences are
    /// untouched.
    pub fn to_uppercase(&mut self) {
        for b in &mut self.storage[..self.len] {
            *b = ascii::to_upper(*b);
        }
    }

    /// Lowercases ASCII letters in place; multi-byte sequences are
    /// untouched.
    pub fn to_lowercase(&mut self) {
        for b in &mut self.storage[..self.len] {
            *b = ascii::to_lower(*b);
        }
    }
}

impl fmt::Debug for TextBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuf")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("content", &self.as_bytes().as_bstr())
            .finish()
    }
}

impl fmt::Display for TextBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_bytes().as_bstr(), f)
    }
}

impl PartialEq for TextBuf<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<[u8]> for TextBuf<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&str> for TextBuf<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_terminates_dirty_storage() {
        let mut storage = [0xAAu8; 8];
        let buf = TextBuf::new(&mut storage);
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 8);
        drop(buf);
        assert_eq!(storage[0], 0);
    }

    #[test]
    fn from_existing_adopts_terminated_content() {
        let mut storage = *b"hello\0\xAA\xAA";
        let buf = TextBuf::from_existing(&mut storage);
        assert_eq!(buf.as_str(), Some("hello"));
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn from_existing_forces_terminator() {
        let mut storage = *b"abcdefgh";
        let buf = TextBuf::from_existing(&mut storage);
        assert_eq!(buf.len(), 7);
        assert_eq!(buf.as_bytes(), b"abcdefg");
    }

    #[test]
    fn append_truncates_and_terminates() {
        let mut storage = [0u8; 16];
        let mut buf = TextBuf::new(&mut storage);
        buf.append(b"Hello");
        let len = buf.append(b" World!!!!!");
        assert_eq!(len, 15);
        assert_eq!(buf.as_str(), Some("Hello World!!!!"));
        assert!(buf.is_full());
        drop(buf);
        assert_eq!(storage[15], 0);
    }

    #[test]
    fn try_append_is_all_or_nothing() {
        let mut storage = [0u8; 8];
        let mut buf = TextBuf::new(&mut storage);
        buf.try_append(b"abcd").unwrap();
        let err = buf.try_append(b"efgh").unwrap_err();
        assert_eq!(
            err,
            CapacityError {
                needed: 4,
                available: 3
            }
        );
        assert_eq!(buf.as_str(), Some("abcd"));
    }

    #[test]
    fn push_char_never_splits() {
        let mut storage = [0u8; 5];
        let mut buf = TextBuf::new(&mut storage);
        buf.push_char('한'); // 3 bytes
        assert_eq!(buf.len(), 3);
        buf.push_char('한'); // would need 3, only 1 left: dropped whole
        assert_eq!(buf.len(), 3);
        buf.push_char('!');
        assert_eq!(buf.as_str(), Some("한!"));
    }

    #[test]
    fn trim_relocates_with_block_move() {
        let mut storage = [0u8; 32];
        let mut buf = TextBuf::new(&mut storage);
        buf.append(b"\t  data point \r\n");
        assert_eq!(buf.trim(), 10);
        assert_eq!(buf.as_str(), Some("data point"));

        buf.assign(b" \t\r\n ");
        assert_eq!(buf.trim(), 0);
        assert!(buf.is_empty());

        buf.assign(b"clean");
        assert_eq!(buf.trim(), 5);
    }

    #[test]
    fn insert_at_codepoint_boundary() {
        let mut storage = [0u8; 32];
        let mut buf = TextBuf::new(&mut storage);
        buf.append("안녕하세요".as_bytes());
        buf.insert(2, b", ");
        assert_eq!(buf.as_str(), Some("안녕, 하세요"));
        // Past-the-end index appends.
        buf.insert(99, b"!");
        assert_eq!(buf.as_str(), Some("안녕, 하세요!"));
    }

    #[test]
    fn insert_clamps_and_repairs() {
        let mut storage = [0u8; 7];
        let mut buf = TextBuf::new(&mut storage);
        buf.append(b"abcd");
        // Two writable bytes remain, so the clamp cuts "안" after two of its
        // three bytes; the buffer is already full, so the sanitizer falls
        // back to `?` per broken byte.
        buf.insert(2, "안녕".as_bytes());
        assert_eq!(buf.as_str(), Some("ab??cd"));
        assert!(buf.validate());
    }

    #[test]
    fn remove_codepoint_range() {
        let mut storage = [0u8; 32];
        let mut buf = TextBuf::new(&mut storage);
        buf.append("a안b녕c".as_bytes());
        buf.remove(1, 2);
        assert_eq!(buf.as_str(), Some("a녕c"));
        buf.remove(2, 99);
        assert_eq!(buf.as_str(), Some("a녕"));
        // Start past the end is a no-op.
        assert_eq!(buf.remove(5, 1), 4);
    }

    #[test]
    fn substring_clamps_at_codepoint_boundary() {
        let mut src_storage = [0u8; 32];
        let mut src = TextBuf::new(&mut src_storage);
        src.append("안녕하세요".as_bytes());

        let mut dest_storage = [0u8; 32];
        let mut dest = TextBuf::new(&mut dest_storage);
        assert_eq!(src.substring(&mut dest, 0, 2), 6);
        assert_eq!(dest.as_str(), Some("안녕"));

        // right == 0: to the end.
        assert_eq!(src.substring(&mut dest, 3, 0), 6);
        assert_eq!(dest.as_str(), Some("세요"));

        // Degenerate range.
        assert_eq!(src.substring(&mut dest, 3, 2), 0);
        assert!(dest.is_empty());

        // Destination too small for two codepoints: one survives whole.
        let mut tiny_storage = [0u8; 5];
        let mut tiny = TextBuf::new(&mut tiny_storage);
        assert_eq!(src.substring(&mut tiny, 0, 2), 3);
        assert_eq!(tiny.as_str(), Some("안"));
    }

    #[test]
    fn byte_substring_sanitizes_cut_sequences() {
        let mut src_storage = [0u8; 32];
        let mut src = TextBuf::new(&mut src_storage);
        src.append("x안y".as_bytes());

        let mut dest_storage = [0u8; 32];
        let mut dest = TextBuf::new(&mut dest_storage);
        // Cut lands mid-"안": the partial sequence becomes two markers.
        src.byte_substring(&mut dest, 0, 3);
        assert!(dest.validate());
        assert_eq!(dest.as_str(), Some("x\u{FFFD}\u{FFFD}"));

        // Clean byte range passes through verbatim.
        assert_eq!(src.byte_substring(&mut dest, 1, 4), 3);
        assert_eq!(dest.as_str(), Some("안"));

        // end_byte == 0: to the end.
        assert_eq!(src.byte_substring(&mut dest, 4, 0), 1);
        assert_eq!(dest.as_str(), Some("y"));
    }

    #[test]
    fn replace_grows_and_shrinks() {
        let mut storage = [0u8; 32];
        let mut buf = TextBuf::new(&mut storage);
        buf.assign(b"a-b-c");
        buf.replace(b"-", b"::", false);
        assert_eq!(buf.as_str(), Some("a::b::c"));
        buf.replace(b"::", b"", false);
        assert_eq!(buf.as_str(), Some("abc"));
        buf.replace(b"B", b"x", true);
        assert_eq!(buf.as_str(), Some("axc"));
        // Replacement text containing the pattern does not loop.
        buf.assign(b"aaa");
        buf.replace(b"a", b"aa", false);
        assert_eq!(buf.as_str(), Some("aaaaaa"));
    }

    #[test]
    fn replace_stops_at_capacity() {
        let mut storage = [0u8; 8];
        let mut buf = TextBuf::new(&mut storage);
        buf.assign(b"a.b.c.d");
        let len = buf.replace(b".", b"--", false);
        // Even the first substitution would need 8 bytes of content, one
        // past the writable 7, so replacement stops with the buffer intact.
        assert_eq!(len, 7);
        assert_eq!(buf.as_str(), Some("a.b.c.d"));
        assert!(buf.validate());
    }

    #[test]
    fn case_conversion_skips_multibyte() {
        let mut storage = [0u8; 32];
        let mut buf = TextBuf::new(&mut storage);
        buf.assign("mix한MIX".as_bytes());
        buf.to_uppercase();
        assert_eq!(buf.as_str(), Some("MIX한MIX"));
        buf.to_lowercase();
        assert_eq!(buf.as_str(), Some("mix한mix"));
    }

    #[test]
    fn peak_tracks_high_water_mark() {
        let mut storage = [0u8; 11];
        let mut buf = TextBuf::new(&mut storage);
        buf.append(b"12345");
        assert!((buf.utilization() - 50.0).abs() < f32::EPSILON);
        buf.clear();
        assert!(buf.utilization().abs() < f32::EPSILON);
        assert!((buf.peak_utilization() - 50.0).abs() < f32::EPSILON);
        buf.append(b"123");
        assert!((buf.peak_utilization() - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn display_is_lossy_on_invalid_content() {
        use std::string::ToString;
        let mut storage = [0u8; 8];
        let mut buf = TextBuf::new(&mut storage);
        buf.append(b"a\xFFb");
        assert_eq!(buf.to_string(), "a\u{FFFD}b");
    }
}
