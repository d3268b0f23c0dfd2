//! Reconciliation: the minimal tool invocations that move an account to a
//! target state.
//!
//! The state machine is deliberately small. `Present`, `Disabled` and
//! `NoLogin` are reachable through [`Reconciler::ensure_state`]; `Absent` is
//! not a transition, removal is the explicit [`Reconciler::remove`] operation.
//! "Already in the desired condition" is success, not an error: adding a
//! present user is a no-op, and the lock and login-disable paths create the
//! account first if it does not exist yet.
//!
//! Multi-step transitions are not atomic. If unlocking succeeds and the
//! following shell change fails during Disabled -> NoLogin, the account is
//! left unlocked with its old shell and the error surfaces as-is; there is no
//! rollback and no retry.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;

use crate::directory::PASSWD_PATH;
use crate::error::{Error, Result};
use crate::group::Group;
use crate::tool::{AccountTool, SystemTool, UserSpec};
use crate::user::{User, UserState};

pub struct Reconciler<T: AccountTool = SystemTool> {
    tool: T,
    passwd_path: PathBuf,
}

impl Reconciler<SystemTool> {
    pub fn new() -> Self {
        Self::with_tool(SystemTool)
    }
}

impl Default for Reconciler<SystemTool> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: AccountTool> Reconciler<T> {
    /// Reconcile through a custom [`AccountTool`]. Tests pass a recording
    /// fake here.
    pub fn with_tool(tool: T) -> Self {
        Self {
            tool,
            passwd_path: PathBuf::from(PASSWD_PATH),
        }
    }

    /// Override the passwd file consulted by the presence check.
    pub fn with_passwd_path(mut self, path: impl AsRef<Path>) -> Self {
        self.passwd_path = path.as_ref().to_path_buf();
        self
    }

    /// Drive `user` to `target`, invoking only the tool calls the transition
    /// needs. On success the entity's cached state is set to the target.
    pub fn ensure_state(&self, user: &mut User, target: UserState) -> Result<()> {
        match target {
            UserState::NoLogin => {
                if user.state() == UserState::Disabled {
                    self.enable_account(user)?;
                    // the unlock restored the plain password marker; presence
                    // checks from here on must expect `x`, not `!`
                    user.set_state(UserState::Present);
                }
                self.disable_login(user)?;
            }
            UserState::Disabled => self.disable_account(user)?,
            UserState::Present => {
                if user.state() == UserState::Disabled {
                    self.enable_account(user)?;
                } else {
                    self.add(user)?;
                }
            }
            UserState::Absent => {
                return Err(Error::User(format!(
                    "cannot ensure state 'absent' for user '{}': removal is the explicit \
                     remove operation",
                    user.name()
                )));
            }
        }
        user.set_state(target);
        Ok(())
    }

    /// Add the user to the system. A no-op if the passwd file already holds a
    /// matching record.
    pub fn add(&self, user: &mut User) -> Result<()> {
        if self.is_present(user)? {
            return Ok(());
        }
        debug!("user {user} not found, adding");

        self.tool.create_user(&spec_for(user)).map_err(|err| {
            Error::User(format!(
                "Could not add user '{}' to the system: {err}",
                user.name()
            ))
        })?;

        if user.uid().is_none() {
            self.refresh_uid(user);
        }
        Ok(())
    }

    /// Remove the user from the system. A no-op if the account is already
    /// absent. The entity stays in its directory; callers reload for a fresh
    /// view.
    pub fn remove(&self, user: &mut User) -> Result<()> {
        if !self.is_present(user)? {
            user.set_state(UserState::Absent);
            return Ok(());
        }

        self.tool.remove_user(user.name()).map_err(|err| {
            Error::User(format!(
                "Could not remove user '{}' from the system: {err}",
                user.name()
            ))
        })?;
        user.set_state(UserState::Absent);
        Ok(())
    }

    fn disable_login(&self, user: &mut User) -> Result<()> {
        self.add(user)?;
        self.tool.set_nologin_shell(user.name()).map_err(|err| {
            Error::User(format!(
                "Could not disable login for user account {}: {err}",
                user.name()
            ))
        })
    }

    fn disable_account(&self, user: &mut User) -> Result<()> {
        self.add(user)?;
        self.tool.lock(user.name()).map_err(|err| {
            Error::User(format!(
                "Could not disable user account {}: {err}",
                user.name()
            ))
        })
    }

    fn enable_account(&self, user: &User) -> Result<()> {
        self.tool.unlock(user.name()).map_err(|err| {
            Error::User(format!(
                "Could not enable user account {}: {err}",
                user.name()
            ))
        })
    }

    /// Point-in-time presence check against the passwd file, not the cached
    /// state: a record built from the entity's expected fields must match a
    /// line of the file. External mutation shows up here.
    pub fn is_present(&self, user: &User) -> Result<bool> {
        let Some(matcher) = passwd_matcher(user) else {
            // without a uid and primary gid no record can match
            return Ok(false);
        };
        let regex = Regex::new(&matcher)
            .map_err(|err| Error::User(format!("invalid presence matcher: {err}")))?;

        let content = fs::read_to_string(&self.passwd_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::FileMissing(self.passwd_path.clone())
            } else {
                Error::Io(err)
            }
        })?;

        Ok(content.lines().any(|line| regex.is_match(line.trim())))
    }

    /// Add the group to the system, passing a gid only if one is set.
    pub fn add_group(&self, group: &Group) -> Result<()> {
        self.tool
            .create_group(group.name(), group.gid())
            .map_err(|err| Error::Group(format!("Could not add group {}: {err}", group.name())))
    }

    /// Remove the group from the system.
    pub fn remove_group(&self, group: &Group) -> Result<()> {
        self.tool
            .remove_group(group.name())
            .map_err(|err| Error::Group(format!("Could not delete group {}: {err}", group.name())))
    }

    /// Pick up the uid the tool assigned during creation.
    fn refresh_uid(&self, user: &mut User) {
        let Ok(content) = fs::read_to_string(&self.passwd_path) else {
            return;
        };
        let uid = content.lines().find_map(|line| {
            let record = crate::record::PasswdRecord::parse(line).ok()?;
            (record.name == user.name()).then_some(record.uid)
        });
        if let Some(uid) = uid {
            user.set_uid(uid);
        }
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }
}

fn spec_for(user: &User) -> UserSpec {
    UserSpec {
        name: user.name().to_string(),
        uid: user.uid(),
        gid: user.primary_group().map(|primary| primary.gid()),
        gecos: user.gecos().to_string(),
        home: user.home().to_string(),
        shell: user.shell().to_string(),
    }
}

/// Anchored matcher for the record this entity expects to find in the passwd
/// file. The password marker is `!` while the account is considered locked,
/// `x` otherwise. `None` when the uid or primary gid is not yet known.
fn passwd_matcher(user: &User) -> Option<String> {
    let uid = user.uid()?;
    let gid = user.primary_group()?.gid();
    let marker = if user.state() == UserState::Disabled {
        "!"
    } else {
        "x"
    };
    Some(format!(
        "^{}:{}:{uid}:{gid}:{}:{}:{}$",
        regex::escape(user.name()),
        regex::escape(marker),
        regex::escape(user.gecos()),
        regex::escape(user.home()),
        regex::escape(user.shell()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new("alice", UserState::Present)
            .with_uid(1001)
            .with_primary_gid(1001)
            .with_home("/home/alice")
            .with_shell("/bin/bash")
            .with_gecos("Alice")
    }

    #[test]
    fn matcher_matches_expected_line() {
        let matcher = passwd_matcher(&alice()).unwrap();
        let regex = Regex::new(&matcher).unwrap();
        assert!(regex.is_match("alice:x:1001:1001:Alice:/home/alice:/bin/bash"));
        assert!(!regex.is_match("alice:x:1002:1001:Alice:/home/alice:/bin/bash"));
        assert!(!regex.is_match("malice:x:1001:1001:Alice:/home/alice:/bin/bash"));
    }

    #[test]
    fn matcher_uses_lock_marker_when_disabled() {
        let mut user = alice();
        user.set_state(UserState::Disabled);
        let matcher = passwd_matcher(&user).unwrap();
        let regex = Regex::new(&matcher).unwrap();
        assert!(regex.is_match("alice:!:1001:1001:Alice:/home/alice:/bin/bash"));
        assert!(!regex.is_match("alice:x:1001:1001:Alice:/home/alice:/bin/bash"));
    }

    #[test]
    fn matcher_requires_uid_and_primary_group() {
        let user = User::new("alice", UserState::Present).with_uid(1001);
        assert!(passwd_matcher(&user).is_none());
        let user = User::new("alice", UserState::Present).with_primary_gid(1001);
        assert!(passwd_matcher(&user).is_none());
    }
}
