//! Line-level parsing of the passwd and group file formats.
//!
//! Both formats are colon-separated with a fixed field count; fields never
//! contain the delimiter. Parsing is strict: a line with the wrong field
//! count or a non-numeric id is a [`Error::MalformedRecord`], not a silent
//! skip. Records format back to their exact line form via `Display`, so
//! parse-then-format round-trips every field.

use std::fmt;

use crate::error::{Error, Result};
use crate::user::UserState;

/// The shell that marks an account as login-disabled in the passwd file.
pub const NOLOGIN_SHELL: &str = "/usr/sbin/nologin";

/// One line of the passwd file: `name:passwd:uid:gid:gecos:home:shell`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdRecord {
    pub name: String,
    pub passwd: String,
    pub uid: u32,
    pub gid: u32,
    pub gecos: String,
    pub home: String,
    pub shell: String,
}

impl PasswdRecord {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches('\n');
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 7 {
            return Err(malformed(
                line,
                format!("expected 7 fields, got {}", fields.len()),
            ));
        }

        Ok(Self {
            name: fields[0].to_string(),
            passwd: fields[1].to_string(),
            uid: parse_id(line, fields[2], "uid")?,
            gid: parse_id(line, fields[3], "gid")?,
            gecos: fields[4].to_string(),
            home: fields[5].to_string(),
            shell: fields[6].trim_end().to_string(),
        })
    }

    /// The state the shell field implies for a freshly parsed user.
    pub fn derived_state(&self) -> UserState {
        if self.shell == NOLOGIN_SHELL {
            UserState::NoLogin
        } else {
            UserState::Present
        }
    }
}

impl fmt::Display for PasswdRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}:{}",
            self.name, self.passwd, self.uid, self.gid, self.gecos, self.home, self.shell
        )
    }
}

/// One line of the group file: `name:passwd:gid:member1,member2,...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub passwd: String,
    pub gid: u32,
    pub members: Vec<String>,
}

impl GroupRecord {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches('\n');
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 4 {
            return Err(malformed(
                line,
                format!("expected 4 fields, got {}", fields.len()),
            ));
        }

        let members = fields[3]
            .trim_end()
            .split(',')
            .filter(|member| !member.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            name: fields[0].to_string(),
            passwd: fields[1].to_string(),
            gid: parse_id(line, fields[2], "gid")?,
            members,
        })
    }
}

impl fmt::Display for GroupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.name,
            self.passwd,
            self.gid,
            self.members.join(",")
        )
    }
}

fn parse_id(line: &str, field: &str, what: &str) -> Result<u32> {
    field
        .trim()
        .parse()
        .map_err(|_| malformed(line, format!("{what} '{field}' is not numeric")))
}

fn malformed(line: &str, reason: String) -> Error {
    Error::MalformedRecord {
        line: line.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwd_line_round_trips() {
        let line = "alice:x:1001:1001:Alice:/home/alice:/bin/bash";
        let record = PasswdRecord::parse(line).unwrap();
        assert_eq!(record.name, "alice");
        assert_eq!(record.uid, 1001);
        assert_eq!(record.gid, 1001);
        assert_eq!(record.gecos, "Alice");
        assert_eq!(record.home, "/home/alice");
        assert_eq!(record.shell, "/bin/bash");
        assert_eq!(record.to_string(), line);
    }

    #[test]
    fn passwd_line_with_trailing_newline() {
        let record = PasswdRecord::parse("alice:x:1001:1001::/home/alice:/bin/bash\n").unwrap();
        assert_eq!(record.shell, "/bin/bash");
        assert_eq!(record.gecos, "");
    }

    #[test]
    fn passwd_wrong_field_count_is_malformed() {
        let err = PasswdRecord::parse("alice:x:1001").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn passwd_non_numeric_uid_is_malformed() {
        let err = PasswdRecord::parse("alice:x:abc:1001::/home/alice:/bin/bash").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn nologin_shell_derives_nologin_state() {
        let record =
            PasswdRecord::parse("daemon:x:1:1::/usr/sbin:/usr/sbin/nologin").unwrap();
        assert_eq!(record.derived_state(), UserState::NoLogin);
    }

    #[test]
    fn other_shells_derive_present_state() {
        let record = PasswdRecord::parse("alice:x:1001:1001::/home/alice:/bin/zsh").unwrap();
        assert_eq!(record.derived_state(), UserState::Present);
    }

    #[test]
    fn group_line_round_trips() {
        let line = "wheel:x:998:alice,bob";
        let record = GroupRecord::parse(line).unwrap();
        assert_eq!(record.name, "wheel");
        assert_eq!(record.gid, 998);
        assert_eq!(record.members, vec!["alice", "bob"]);
        assert_eq!(record.to_string(), line);
    }

    #[test]
    fn group_with_empty_member_field() {
        let record = GroupRecord::parse("alice:x:1001:").unwrap();
        assert!(record.members.is_empty());
    }

    #[test]
    fn group_wrong_field_count_is_malformed() {
        let err = GroupRecord::parse("wheel:x:998:alice:extra").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }
}
