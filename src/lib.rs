//! # Hostward
//!
//! Lifecycle manager for one long-running service on one host: provisions
//! its runtime account, hands it ownership of its files, registers it with
//! systemd, tears all of that down again, and pulls snapshots of its data
//! directory from a remote host.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use hostward::config::ServiceConfig;
//! use hostward::exec::SystemRunner;
//! use hostward::identity::SystemAccounts;
//! use hostward::lifecycle::Lifecycle;
//! use hostward::supervisor::Systemctl;
//!
//! let config = ServiceConfig::load(None)?;
//! let runner = SystemRunner;
//! let accounts = SystemAccounts::new(&runner);
//! let systemctl = Systemctl::new(&runner);
//! let report = Lifecycle::new(&config, &accounts, &systemctl).install()?;
//! print!("{report}");
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod backup;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod identity;
pub mod lifecycle;
pub mod permissions;
pub mod secrets;
pub mod supervisor;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
