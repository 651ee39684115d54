//! Install-and-update pipeline for the SteamCMD updater tool.
//!
//! This module provides:
//! - Host platform detection and install targets (`platform`)
//! - Bounded-time archive download (`acquire`)
//! - tar.gz and zip extraction with path containment (`extract`)
//! - Executable bits and binary verification (`prepare`)
//! - Linux system library installation (`deps`)
//! - The install state machine with rollback (`installer`)
//! - Update command construction and execution (`invoke`)
//! - The end-to-end facade (`pipeline`)
//!
//! # Architecture
//!
//! ```text
//! UpdaterPipeline
//!         │
//!         ├── Installer (state machine, RollbackGuard)
//!         │       ├── SystemPackages (trait) ── AptPackages
//!         │       ├── Acquirer ── HttpClient (trait) ── ReqwestClient
//!         │       ├── ArchiveFormat ── ArchiveExtractor (trait)
//!         │       └── prepare (chmod, verify)
//!         │
//!         └── ToolRunner (trait) ── ProcessRunner
//! ```
//!
//! # Example
//!
//! ```ignore
//! use steamkeeper::logging::Verbosity;
//! use steamkeeper::updater::{InstallTarget, UpdaterPipeline};
//!
//! let target = InstallTarget::detect()?;
//! let outcome = UpdaterPipeline::new(target, Verbosity::Normal)?.run();
//! println!("{}", outcome.summary());
//! ```

pub mod acquire;
pub mod deps;
pub mod error;
pub mod extract;
pub mod installer;
pub mod invoke;
pub mod pipeline;
pub mod platform;
pub mod prepare;

pub use acquire::{validate_url, Acquirer, ArchivePayload, HttpClient, ReqwestClient};
pub use deps::{AptPackages, SystemPackages, REQUIRED_LIBRARIES};
pub use error::{UpdaterError, UpdaterResult};
pub use extract::{ArchiveExtractor, ArchiveFormat, ExtractSummary, TarGzExtractor, ZipExtractor};
pub use installer::{InstallProgressCallback, InstallStage, InstallStatus, Installer, RollbackGuard};
pub use invoke::{ProcessRunner, ToolRunner, UpdateCommand, DEFAULT_APP_ID};
pub use pipeline::{PipelineOutcome, UpdaterPipeline};
pub use platform::{InstallTarget, InstallationState, Platform};
