//! sysusers - a typed view of the system's users and groups, and the
//! reconciliation needed to manage them.
//!
//! [`Directory`] parses `/etc/passwd` and `/etc/group` into [`User`] and
//! [`Group`] entities and cross-references them both ways: a user knows its
//! groups, a group knows its member users. [`Reconciler`] then drives an
//! entity toward a target [`UserState`] by invoking the system account tools
//! (`useradd`, `usermod`, `userdel`, `groupadd`, `groupdel`) through the
//! [`AccountTool`] seam.
//!
//! ```no_run
//! use sysusers::{Directory, Reconciler, UserState};
//!
//! fn disable_snap_login() -> Result<(), sysusers::Error> {
//!     let mut directory = Directory::open()?;
//!     let reconciler = Reconciler::new();
//!     let user = directory.user_mut("snap")?;
//!     reconciler.ensure_state(user, UserState::NoLogin)?;
//!     Ok(())
//! }
//! ```
//!
//! Everything is synchronous and blocking; the directory is a plain value,
//! concurrent callers serialize externally.

pub mod directory;
pub mod error;
pub mod group;
pub mod reconcile;
pub mod record;
pub mod tool;
pub mod user;

pub use directory::Directory;
pub use error::{Error, Result};
pub use group::Group;
pub use reconcile::Reconciler;
pub use tool::{AccountTool, SystemTool, ToolError, UserSpec};
pub use user::{PrimaryGroup, User, UserState};
