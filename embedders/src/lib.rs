//! Clients for the text embedding providers used by shelf.

pub mod error;

#[cfg(feature = "fe-local")]
pub mod fastembed;

#[cfg(feature = "openai")]
pub mod openai;
