//! Test fixtures for pkgrun.
//!
//! - [`transcripts`] - recorded output of apt, dpkg, wget, unzip and flatpak
//! - [`helpers`] - shell command builders, temp directories, config files
//! - `pkgrun-fake-tool` - binary that replays a transcript with delays
//!
//! # Example
//!
//! ```ignore
//! use pkgrun_fixtures::{shell_printf_command_tagged, transcripts::DPKG_INSTALL};
//!
//! // A command that prints the dpkg transcript, tagged so it reads as dpkg
//! let command = shell_printf_command_tagged("dpkg", DPKG_INSTALL);
//! ```

// Test fixtures crate - relaxed lints for test utilities
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod helpers;
pub mod transcripts;

pub use helpers::{
    shell_printf_command, shell_printf_command_tagged, shell_quote, transcript_for, write_config,
};
