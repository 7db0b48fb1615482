//! Adapters implementing the port traits.
//!
//! `live` talks to real services, `recording` wraps live adapters and
//! captures cassettes, `replaying` serves cassettes back, and `instant`
//! holds the zero-wait sleeper used with replay.

pub mod instant;
pub mod live;
pub mod recording;
pub mod replaying;
