//! # hostinfo
//!
//! Read-only probes of a Linux host: distribution release, CPU, memory,
//! uptime, graphics adapters, accounts and network link state.
//!
//! Every probe is a pure parser over the relevant file or command output
//! plus a small function that reads the live system, so the parsers can be
//! tested against captured fixtures.
//!
//! ## Example
//!
//! ```no_run
//! use hostinfo::{ReportInput, collect_report};
//!
//! let input = ReportInput {
//!     user: "student".to_string(),
//!     ..ReportInput::default()
//! };
//! for line in collect_report(&input) {
//!     println!("{line}");
//! }
//! ```

pub mod error;
pub mod gpu;
pub mod passwd;
pub mod proc;
pub mod release;
pub mod report;

pub use error::{Error, Result};
pub use gpu::Graphics;
pub use proc::{CpuInfo, is_virtual_machine, kernel_release};
pub use release::LsbRelease;
pub use report::{Report, ReportInput, collect_report};
