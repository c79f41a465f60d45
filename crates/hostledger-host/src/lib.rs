//! # hostledger-host
//!
//! Host-facing snapshot sources for the hostledger agents.
//!
//! ## Overview
//!
//! | domain   | windows                                   | linux                      |
//! |----------|-------------------------------------------|----------------------------|
//! | files    | recursive SHA-256 walk of the scan roots  | same                       |
//! | network  | `netstat -ano`                            | `ss -H -tuln -p`           |
//! | accounts | `net user`, `net localgroup administrators` | `/etc/passwd`, `/etc/group` |
//!
//! Every source returns a complete snapshot or an error. Decoders never drop
//! a row they do not understand; they fail instead.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hostledger_host::{build_monitors, HostFlavor, SystemCommandRunner};
//!
//! let monitors = build_monitors(HostFlavor::current(), scope, Arc::new(SystemCommandRunner));
//! ```

pub mod accounts;
pub mod command;
pub mod files;
pub mod platform;
pub mod ports;

pub use command::{CommandRunner, SystemCommandRunner};
pub use files::FsHashSource;
pub use platform::{build_monitors, HostFlavor};

// ── Tests ─────────────────────────────────────────────────────────────────────
