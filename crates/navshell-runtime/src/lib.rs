//! navshell-runtime: async side of the navigation shell.
//! Owns the announcement feed controller (refresh and acknowledgment timers),
//! the host-event loop that drives the panel coordinator, and configuration.

pub mod config;
pub mod controller;
pub mod shell;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, ConfigOverrides, FeedConfig, ShellConfig};
pub use controller::{AnnouncementFeed, ControllerError, Lifecycle};
pub use shell::{HostEvent, HostEvents, ShellError, ShellHandle, ShellStatus, spawn_shell};
