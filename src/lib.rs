//! Rank-date projection engine for qualified beatmap sets.
//!
//! See `SPEC_FULL.md` at the repository root for the full specification.
//! The pure projection core lives in [`distributions`], [`probability`],
//! [`events`] and [`projector`]. Everything else is the ambient I/O
//! boundary (`config`, `platform`, `store`, `cycle`) that drives the core
//! with real or fixture data.

pub mod config;
pub mod constants;
pub mod cycle;
pub mod distributions;
pub mod events;
pub mod model;
pub mod platform;
pub mod probability;
pub mod projector;
pub mod store;
