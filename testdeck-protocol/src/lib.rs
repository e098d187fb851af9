// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Wire types shared between the testdeck engine and its consumers.
//!
//! This crate defines both sides of the engine's line-delimited JSON
//! protocols:
//!
//! * the **runner protocol**: events emitted by the external test-execution
//!   process on its error stream, one `{"event": ..., "data": ...}` object
//!   per line, decoded with [`decode_line`];
//! * the **viewer protocol**: [`ClientMessage`] values pushed to every
//!   connected viewer over a persistent channel.
//!
//! The engine itself lives in the `testdeck-engine` crate; this crate is
//! kept dependency-light so that external tools consuming either protocol
//! don't need to pull in the engine.

mod client;
mod errors;
mod events;

pub use client::*;
pub use errors::*;
pub use events::*;

use newtype_uuid::{TypedUuid, TypedUuidKind, TypedUuidTag};

/// The kind tag for [`RunUuid`] instances.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RunUuidKind {}

impl TypedUuidKind for RunUuidKind {
    #[inline]
    fn tag() -> TypedUuidTag {
        const TAG: TypedUuidTag = TypedUuidTag::new("testdeck_run");
        TAG
    }
}

/// A unique identifier for one execution of the test-runner subprocess.
///
/// Minted when a run is requested, and valid until the run has been reaped
/// after exit or stop.
pub type RunUuid = TypedUuid<RunUuidKind>;
