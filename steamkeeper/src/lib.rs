//! Steamkeeper - SteamCMD install and dedicated-server update pipeline
//!
//! This library detects the host platform, makes sure the SteamCMD updater
//! tool is installed (downloading, extracting and permissioning it when it
//! is not), and then runs it to update the game server content. A failed
//! installation never leaves a half-populated install directory behind.

pub mod config;
pub mod logging;
pub mod notify;
pub mod updater;
