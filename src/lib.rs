//! Build and publish themed HTML design bundles.
//!
//! This crate assembles a front-end design workspace from a base design
//! archive plus per-module override archives, applies user customization
//! (style variables, a raw code block, a favicon), runs an external build
//! tool over the result, and publishes the compiled files into a
//! hierarchical destination repository.
//!
//! # Architecture
//!
//! ```text
//! package bytes
//!     │
//!     ├── module override archives ──▶ workspace (merge files unioned)
//!     ├── base design archive ───────▶ workspace (overwrites)
//!     └── variables + code block ────▶ custom overrides file
//!                                          │
//!                                    build tool (subprocess)
//!                                          │
//!                                     dist/ output tree
//!                                          │
//!                                    container resolution ──▶ published artifacts
//! ```
//!
//! The pipeline is strictly sequential and a run is all-or-nothing: any
//! stage failure propagates immediately, and the workspace is removed on
//! every exit path unless cleanup is explicitly suppressed.
//!
//! The destination repository is only reached through the narrow
//! [`ContainerResolver`] capability; pipeline inputs come from a
//! [`DesignSource`]. Both have filesystem-backed implementations used by
//! the CLI and the tests.

pub mod archive;
pub mod build;
pub mod config;
pub mod error;
pub mod merge;
pub mod overlay;
pub mod pipeline;
pub mod publish;
pub mod workspace;

pub use config::{
    ActiveModule, Attachment, DesignPackage, DesignSource, FileDesignSource, StyleVariable,
};
pub use error::PipelineError;
pub use pipeline::{run, version_report, PipelineResult};
pub use publish::resolver::{ContainerResolver, FsContainerResolver};
pub use workspace::Workspace;
