//! Domain types for the Quill note client.
//!
//! These are the objects the local persistence layer stores. Each one is
//! serialized as JSON, so every field tolerates being absent on read and
//! unknown fields are ignored. That keeps files written by older or newer
//! builds readable.
//!
//! # Key Types
//!
//! - [`Settings`] -- user preferences plus the legacy OAuth token slot
//! - [`Credential`] -- a named secret for one note service account
//! - [`Note`] / [`Notebook`] -- cached copies of remote note metadata
//! - [`NotebookCacheList`] -- timestamped notebook listing

pub mod credential;
pub mod error;
pub mod note;
pub mod settings;

pub use credential::{Credential, CredentialKind};
pub use error::TypeError;
pub use note::{Note, Notebook, NotebookCacheList};
pub use settings::Settings;
