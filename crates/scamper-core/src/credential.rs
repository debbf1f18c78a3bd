// ABOUTME: Opaque wallet credential blob persisted between process runs.
// ABOUTME: Only the wallet adapter that produced a blob interprets its contents.

use std::fmt;

/// Serialized wallet state, treated as an opaque token everywhere except the
/// wallet adapter. The Debug impl never prints the contents.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBlob(String);

impl CredentialBlob {
    pub fn new(contents: impl Into<String>) -> Self {
        Self(contents.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for CredentialBlob {
    fn from(contents: String) -> Self {
        Self(contents)
    }
}

impl fmt::Debug for CredentialBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialBlob({} bytes)", self.0.len())
    }
}
