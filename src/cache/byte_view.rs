use bytes::Bytes;

/// An immutable view over cached bytes.
///
/// `ByteView` is the only value type the cache stores. It is backed by
/// [`Bytes`], so cloning is a reference-count bump and the underlying
/// storage can never be mutated through a view. Callers that need a
/// mutable copy detach one with [`ByteView::to_vec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    data: Bytes,
}

impl ByteView {
    /// Number of bytes in the view, used for cache budget accounting.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrows the bytes without copying.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns a detached copy the caller owns and may mutate freely.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }
}

impl From<&[u8]> for ByteView {
    fn from(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }
}

impl From<String> for ByteView {
    fn from(data: String) -> Self {
        Self { data: data.into() }
    }
}

impl From<&str> for ByteView {
    fn from(data: &str) -> Self {
        Self {
            data: Bytes::copy_from_slice(data.as_bytes()),
        }
    }
}

impl std::fmt::Display for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.data))
    }
}
