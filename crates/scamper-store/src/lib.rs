// ABOUTME: Persistence layer for scamper, holding the wallet credential file.
// ABOUTME: Provides atomic save and exact read-back of the opaque credential blob.

pub mod credentials;

pub use credentials::{CredentialStore, CredentialStoreError};
