//! Array file and archive format internals
//!
//! - [`error`] - error types and failure classes
//! - [`config`] - save modes and codec settings
//! - [`cursor`] - little-endian byte reader and writer
//! - [`dtype`] - element descriptors and the [`Element`](dtype::Element) registry
//! - [`buffer`] - owned, shaped array data
//! - [`header`] - array header encode/decode
//! - [`io`] - single-array file writer and reader
//! - [`compression`] - inflate for compressed archive members
//! - [`validation`] - archive member names
//! - [`archive`] - container framing, directory bookkeeping and scanning

pub mod archive;
pub mod buffer;
pub mod compression;
pub mod config;
pub mod cursor;
pub mod dtype;
pub mod error;
pub mod header;
pub mod io;
pub mod validation;

mod integration_tests;
