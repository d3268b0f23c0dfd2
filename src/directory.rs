//! The directory: one load cycle's view of the identity files.
//!
//! A [`Directory`] owns both entity sets and is the single point of lookup by
//! name or id. Users and groups reference each other through stable name
//! keys resolved via the directory, never through owning cycles. The graph is
//! built in two passes: `load` parses both files and eagerly resolves each
//! user's primary group by gid, `realize` resolves group member names against
//! the full user set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Error, Result};
use crate::group::Group;
use crate::reconcile::Reconciler;
use crate::record::{GroupRecord, PasswdRecord};
use crate::tool::AccountTool;
use crate::user::{User, UserState};

pub const PASSWD_PATH: &str = "/etc/passwd";
pub const GROUP_PATH: &str = "/etc/group";

#[derive(Debug)]
pub struct Directory {
    passwd_path: PathBuf,
    group_path: PathBuf,
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, Group>,
}

impl Directory {
    /// Load and realize the system's identity files.
    pub fn open() -> Result<Self> {
        Self::open_at(PASSWD_PATH, GROUP_PATH)
    }

    /// Load and realize from explicit file paths. Tests build their own
    /// directory from fixture files this way.
    pub fn open_at(passwd: impl AsRef<Path>, group: impl AsRef<Path>) -> Result<Self> {
        let mut directory = Self {
            passwd_path: passwd.as_ref().to_path_buf(),
            group_path: group.as_ref().to_path_buf(),
            users: BTreeMap::new(),
            groups: BTreeMap::new(),
        };
        directory.load()?;
        directory.realize();
        Ok(directory)
    }

    /// Parse both identity files into entities keyed by name.
    ///
    /// Groups load first so every user's primary group resolves eagerly by
    /// gid; a passwd record referencing an unknown gid fails the load with
    /// [`Error::GroupNotFound`]. Both maps are rebuilt from scratch, so
    /// repeating a load never duplicates entries.
    pub fn load(&mut self) -> Result<()> {
        let groups = load_groups(&self.group_path)?;
        let users = load_users(&self.passwd_path, &groups)?;
        self.groups = groups;
        self.users = users;
        Ok(())
    }

    /// Second pass: resolve each group's raw member names against the user
    /// set, and mirror the memberships onto the user side.
    ///
    /// A member name with no matching user is tolerated: it stays in the raw
    /// list, is logged, and is excluded from the realized list.
    pub fn realize(&mut self) {
        for user in self.users.values_mut() {
            user.clear_groups();
        }

        for group in self.groups.values_mut() {
            let mut realized = Vec::new();
            for member in group.raw_members() {
                if self.users.contains_key(member) {
                    realized.push(member.clone());
                } else {
                    warn!(
                        "group '{}' references unknown user '{member}'",
                        group.name()
                    );
                }
            }
            group.set_realized(realized);
        }

        let memberships: Vec<(String, String)> = self
            .groups
            .values()
            .flat_map(|group| {
                group
                    .members()
                    .iter()
                    .map(|member| (member.clone(), group.name().to_string()))
            })
            .collect();
        for (user_name, group_name) in memberships {
            if let Some(user) = self.users.get_mut(&user_name) {
                user.push_group(group_name);
            }
        }
    }

    pub fn user(&self, name: &str) -> Result<&User> {
        self.users
            .get(name)
            .ok_or_else(|| Error::UserNotFound(format!("'{name}'")))
    }

    pub fn user_mut(&mut self, name: &str) -> Result<&mut User> {
        self.users
            .get_mut(name)
            .ok_or_else(|| Error::UserNotFound(format!("'{name}'")))
    }

    pub fn group(&self, name: &str) -> Result<&Group> {
        self.groups
            .get(name)
            .ok_or_else(|| Error::GroupNotFound(format!("'{name}'")))
    }

    /// Linear scan over the known groups.
    pub fn group_by_gid(&self, gid: u32) -> Result<&Group> {
        group_by_gid(&self.groups, gid)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Realized members of a group, as references into this directory's user
    /// set.
    pub fn members_of(&self, group: &Group) -> Vec<&User> {
        group
            .members()
            .iter()
            .filter_map(|name| self.users.get(name))
            .collect()
    }

    pub fn primary_group_of(&self, user: &User) -> Result<&Group> {
        match user.primary_group() {
            Some(primary) => self.group_by_gid(primary.gid()),
            None => Err(Error::GroupNotFound(format!(
                "user '{}' has no primary group",
                user.name()
            ))),
        }
    }

    /// The passwd path this directory loaded from; handy for building a
    /// [`crate::Reconciler`] whose presence check reads the same file.
    pub fn passwd_path(&self) -> &Path {
        &self.passwd_path
    }

    /// Ensure a caller-built user is present on the system, then cache the
    /// entity in this directory.
    pub fn add_user<T: AccountTool>(
        &mut self,
        reconciler: &Reconciler<T>,
        mut user: User,
    ) -> Result<()> {
        reconciler.ensure_state(&mut user, UserState::Present)?;
        self.users.insert(user.name().to_string(), user);
        Ok(())
    }

    /// Create a caller-built group on the system, then cache the entity in
    /// this directory.
    pub fn add_group<T: AccountTool>(
        &mut self,
        reconciler: &Reconciler<T>,
        group: Group,
    ) -> Result<()> {
        reconciler.add_group(&group)?;
        self.groups.insert(group.name().to_string(), group);
        Ok(())
    }
}

fn load_groups(path: &Path) -> Result<BTreeMap<String, Group>> {
    if !path.is_file() {
        return Err(Error::FileMissing(path.to_path_buf()));
    }

    let mut groups = BTreeMap::new();
    let mut gids: BTreeMap<u32, String> = BTreeMap::new();
    for line in fs::read_to_string(path)?.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let record = GroupRecord::parse(line)?;
        if let Some(previous) = gids.insert(record.gid, record.name.clone()) {
            return Err(Error::MalformedRecord {
                line: line.to_string(),
                reason: format!("gid {} already used by group '{previous}'", record.gid),
            });
        }
        groups.insert(record.name.clone(), Group::from_record(&record));
    }

    Ok(groups)
}

fn load_users(path: &Path, groups: &BTreeMap<String, Group>) -> Result<BTreeMap<String, User>> {
    if !path.is_file() {
        return Err(Error::FileMissing(path.to_path_buf()));
    }

    let mut users = BTreeMap::new();
    let mut uids: BTreeMap<u32, String> = BTreeMap::new();
    for line in fs::read_to_string(path)?.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let record = PasswdRecord::parse(line)?;
        if let Some(previous) = uids.insert(record.uid, record.name.clone()) {
            return Err(Error::MalformedRecord {
                line: line.to_string(),
                reason: format!("uid {} already used by user '{previous}'", record.uid),
            });
        }

        let primary = group_by_gid(groups, record.gid)?;
        let mut user = User::from_record(&record);
        user.resolve_primary(primary.name(), record.gid);
        users.insert(record.name.clone(), user);
    }

    Ok(users)
}

fn group_by_gid(groups: &BTreeMap<String, Group>, gid: u32) -> Result<&Group> {
    groups
        .values()
        .find(|group| group.gid() == Some(gid))
        .ok_or_else(|| Error::GroupNotFound(format!("gid {gid}")))
}
