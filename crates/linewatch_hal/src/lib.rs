//! Line I/O capability layer.
//!
//! Everything the scan engine needs from the outside world lives behind two
//! traits: [`traits::LineBackend`] (sample inputs, drive outputs) and
//! [`clock::Clock`] (a monotonic, wrapping tick counter). [`sim::SimBackend`]
//! implements the backend in memory for CI and demos; [`config::LineMap`]
//! maps symbolic line names to ids from TOML.

pub mod clock;
pub mod config;
pub mod sim;
pub mod traits;
