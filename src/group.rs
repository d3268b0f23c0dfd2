//! The group entity and its membership lists.

use std::fmt;

use crate::record::GroupRecord;

/// A group and its member users.
///
/// Two membership lists are carried: the raw member names exactly as parsed
/// from the group file, and the realized list filled in by
/// [`crate::Directory::realize`] once the full user set is known. The realized
/// list only holds names that resolve to users in the same directory.
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    gid: Option<u32>,
    raw_members: Vec<String>,
    members: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, gid: Option<u32>) -> Self {
        Self {
            name: name.into(),
            gid,
            raw_members: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Raw member names for a caller-built group, before realization.
    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.raw_members = members;
        self
    }

    pub(crate) fn from_record(record: &GroupRecord) -> Self {
        Self {
            name: record.name.clone(),
            gid: Some(record.gid),
            raw_members: record.members.clone(),
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gid(&self) -> Option<u32> {
        self.gid
    }

    /// Member names exactly as parsed, resolved or not.
    pub fn raw_members(&self) -> &[String] {
        &self.raw_members
    }

    /// Realized member names; empty until the directory's realize pass ran.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub(crate) fn set_realized(&mut self, members: Vec<String>) {
        self.members = members;
    }
}

/// Equality is the (name, gid) pair, matching how accounts tools identify
/// groups.
impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        (&self.name, self.gid) == (&other.name, other.gid)
    }
}

impl Eq for Group {}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.gid {
            Some(gid) => write!(f, "{} (gid {gid})", self.name),
            None => write!(f, "{} (no gid)", self.name),
        }
    }
}
