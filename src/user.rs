//! The user entity and its lifecycle states.

use std::fmt;

use crate::group::Group;
use crate::record::PasswdRecord;

/// The state of a user on the system or in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Present,
    Absent,
    Disabled,
    NoLogin,
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
            Self::Disabled => write!(f, "disabled"),
            Self::NoLogin => write!(f, "nologin"),
        }
    }
}

/// A user's primary-group reference.
///
/// The two variants are the two distinct construction paths: a raw gid
/// straight out of a passwd record, and a reference resolved against a
/// directory's group set during load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryGroup {
    /// Unresolved gid as parsed from the passwd file.
    Gid(u32),
    /// Resolved against the directory that loaded this user.
    Resolved { name: String, gid: u32 },
}

impl PrimaryGroup {
    pub fn gid(&self) -> u32 {
        match self {
            Self::Gid(gid) => *gid,
            Self::Resolved { gid, .. } => *gid,
        }
    }

    /// The group name, once resolved.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Gid(_) => None,
            Self::Resolved { name, .. } => Some(name),
        }
    }
}

/// A user account and its attributes.
///
/// Instances come out of [`crate::Directory`] loads or are built by callers
/// through the constructor methods. The `state` field is only mutated by the
/// reconciler; removing an account from the system does not remove the entity
/// from the directory, callers reload for that.
#[derive(Debug, Clone)]
pub struct User {
    name: String,
    uid: Option<u32>,
    primary_group: Option<PrimaryGroup>,
    groups: Vec<String>,
    home: String,
    shell: String,
    gecos: String,
    state: UserState,
}

impl User {
    pub fn new(name: impl Into<String>, state: UserState) -> Self {
        Self {
            name: name.into(),
            uid: None,
            primary_group: None,
            groups: Vec::new(),
            home: String::new(),
            shell: String::new(),
            gecos: String::new(),
            state,
        }
    }

    pub(crate) fn from_record(record: &PasswdRecord) -> Self {
        Self {
            name: record.name.clone(),
            uid: Some(record.uid),
            primary_group: Some(PrimaryGroup::Gid(record.gid)),
            groups: Vec::new(),
            home: record.home.clone(),
            shell: record.shell.clone(),
            gecos: record.gecos.clone(),
            state: record.derived_state(),
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_gecos(mut self, gecos: impl Into<String>) -> Self {
        self.gecos = gecos.into();
        self
    }

    /// Primary group from a raw gid; resolved later against a directory.
    pub fn with_primary_gid(mut self, gid: u32) -> Self {
        self.primary_group = Some(PrimaryGroup::Gid(gid));
        self
    }

    /// Primary group from an already resolved [`Group`]. The group needs a
    /// gid; one without is skipped, a passwd record cannot reference it yet.
    pub fn with_primary_group(mut self, group: &Group) -> Self {
        self.primary_group = group.gid().map(|gid| PrimaryGroup::Resolved {
            name: group.name().to_string(),
            gid,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uid(&self) -> Option<u32> {
        self.uid
    }

    pub fn primary_group(&self) -> Option<&PrimaryGroup> {
        self.primary_group.as_ref()
    }

    /// Names of the groups this user is a secondary member of, in the order
    /// the directory realized them.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn gecos(&self) -> &str {
        &self.gecos
    }

    pub fn state(&self) -> UserState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: UserState) {
        self.state = state;
    }

    pub(crate) fn set_uid(&mut self, uid: u32) {
        self.uid = Some(uid);
    }

    pub(crate) fn resolve_primary(&mut self, name: &str, gid: u32) {
        self.primary_group = Some(PrimaryGroup::Resolved {
            name: name.to_string(),
            gid,
        });
    }

    pub(crate) fn clear_groups(&mut self) {
        self.groups.clear();
    }

    pub(crate) fn push_group(&mut self, name: String) {
        if !self.groups.contains(&name) {
            self.groups.push(name);
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.uid {
            Some(uid) => write!(f, "{} (uid {uid}, {})", self.name, self.state),
            None => write!(f, "{} (no uid, {})", self.name, self.state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let user = User::new("alice", UserState::Present)
            .with_uid(1001)
            .with_primary_gid(1001)
            .with_home("/home/alice")
            .with_shell("/bin/bash")
            .with_gecos("Alice");
        assert_eq!(user.name(), "alice");
        assert_eq!(user.uid(), Some(1001));
        assert_eq!(user.primary_group().map(PrimaryGroup::gid), Some(1001));
        assert_eq!(user.primary_group().and_then(PrimaryGroup::name), None);
    }

    #[test]
    fn primary_group_from_resolved_group() {
        let group = Group::new("staff", Some(50));
        let user = User::new("bob", UserState::Present).with_primary_group(&group);
        let primary = user.primary_group().unwrap();
        assert_eq!(primary.name(), Some("staff"));
        assert_eq!(primary.gid(), 50);
    }

    #[test]
    fn primary_group_without_gid_is_skipped() {
        let group = Group::new("pending", None);
        let user = User::new("bob", UserState::Present).with_primary_group(&group);
        assert!(user.primary_group().is_none());
    }
}
