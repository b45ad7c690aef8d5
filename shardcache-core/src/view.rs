//! Immutable byte container used as the cached value type.
//!
//! A [`ByteView`] can only be created by taking ownership of a buffer or by
//! copying a borrowed one, and it never hands out mutable access. Whatever a
//! caller does with the data it reads out cannot change what the cache holds.
//!
//! ```
//! use shardcache_core::ByteView;
//!
//! let mut source = b"630".to_vec();
//! let view = ByteView::copy_from_slice(&source);
//! source[0] = b'9';
//!
//! let mut copy = view.to_vec();
//! copy[1] = b'0';
//!
//! assert_eq!(view.as_text(), "630");
//! ```

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;

/// Byte size accounting for values held by a bounded cache.
///
/// The size of a cache entry is the key length plus the weight of its value.
pub trait Weighted {
    /// Number of bytes this value is charged for.
    fn weight(&self) -> usize;
}

impl Weighted for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weighted for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weighted for Bytes {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// An immutable view over cached bytes.
///
/// Cloning is cheap (reference counted) and never exposes a mutable alias of
/// the underlying storage.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    data: Bytes,
}

impl ByteView {
    /// Creates an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a view by copying a borrowed buffer.
    ///
    /// The owner of `data` may reuse or mutate it afterwards.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }

    /// Length of the payload in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a freshly allocated copy of the payload.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Returns the payload as text, replacing invalid UTF-8 sequences.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Returns a cheap immutable handle to the payload, e.g. for a response body.
    pub fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }
}

impl Weighted for ByteView {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }
}

impl From<Bytes> for ByteView {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl From<String> for ByteView {
    fn from(data: String) -> Self {
        Self { data: data.into() }
    }
}

impl From<&'static str> for ByteView {
    fn from(data: &'static str) -> Self {
        Self {
            data: Bytes::from_static(data.as_bytes()),
        }
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView").field(&self.data).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_from_slice_detaches_from_source() {
        let mut source = vec![1u8, 2, 3];
        let view = ByteView::copy_from_slice(&source);
        source[0] = 42;
        assert_eq!(view.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn to_vec_returns_independent_copy() {
        let view = ByteView::from("630");
        let mut copy = view.to_vec();
        copy.clear();
        copy.extend_from_slice(b"xyz");
        assert_eq!(view.as_text(), "630");
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn text_conversion_is_lossy_for_invalid_utf8() {
        let view = ByteView::from(vec![b'o', b'k', 0xff]);
        assert_eq!(view.as_text(), "ok\u{fffd}");
        assert_eq!(view.to_string(), "ok\u{fffd}");
    }

    #[test]
    fn weight_matches_length() {
        assert_eq!(ByteView::from("abcd").weight(), 4);
        assert_eq!(ByteView::new().weight(), 0);
        assert!(ByteView::new().is_empty());
    }
}
