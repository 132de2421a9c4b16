//! # archtidy
//!
//! Routine maintenance for Arch and EndeavourOS systems.
//!
//! archtidy runs ordered maintenance plans against pacman, an AUR helper and
//! the usual system utilities. It features:
//!
//! - **Updates with reboot detection**: official + AUR + Flatpak upgrades, with
//!   a reboot offered only when the installed kernel packages changed
//! - **Bulk installs**: idempotent application installs through the AUR helper
//! - **Disk cleanup**: package and AUR caches, orphans, stale kernel modules,
//!   temp files, journal, thumbnails, Flatpak runtimes and SSD TRIM, with the
//!   space freed added up into one report
//! - **Explicit failure policy**: every step is fatal or warn-and-continue
//! - **Dry run**: show what would run without touching the system

pub mod accounting;
pub mod cli;
pub mod common;
pub mod gate;
pub mod plans;
pub mod report;
pub mod runner;
pub mod snapshot;
pub mod system;
