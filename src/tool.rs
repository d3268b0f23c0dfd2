//! The narrow seam to the system's account-management binaries.
//!
//! [`AccountTool`] is one method per primitive; [`SystemTool`] implements it
//! by spawning the shadow-utils binaries as child processes, blocking until
//! they exit. Nonzero exit captures stderr into a [`ToolError`]; zero exit is
//! success with no output parsing.

use std::process::Command;

use thiserror::Error;

/// A failed invocation of an account-management binary.
#[derive(Debug, Error)]
#[error("{program} failed with status {code:?}: {stderr}")]
pub struct ToolError {
    pub program: String,
    pub code: Option<i32>,
    pub stderr: String,
}

/// The fields a user creation hands to `useradd`. Empty or unset fields omit
/// the corresponding flag so the tool picks its own defaults.
#[derive(Debug, Clone, Default)]
pub struct UserSpec {
    pub name: String,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub gecos: String,
    pub home: String,
    pub shell: String,
}

pub trait AccountTool {
    fn create_user(&self, spec: &UserSpec) -> Result<(), ToolError>;
    fn remove_user(&self, name: &str) -> Result<(), ToolError>;
    /// Set the login-disabling shell on an existing account.
    fn set_nologin_shell(&self, name: &str) -> Result<(), ToolError>;
    /// Lock password-based login without removing the account.
    fn lock(&self, name: &str) -> Result<(), ToolError>;
    fn unlock(&self, name: &str) -> Result<(), ToolError>;
    fn create_group(&self, name: &str, gid: Option<u32>) -> Result<(), ToolError>;
    fn remove_group(&self, name: &str) -> Result<(), ToolError>;
}

/// Spawns the real `useradd`/`usermod`/`userdel`/`groupadd`/`groupdel`
/// binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTool;

impl SystemTool {
    fn run(&self, program: &str, args: &[String]) -> Result<(), ToolError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| ToolError {
                program: program.to_string(),
                code: None,
                stderr: err.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        Err(ToolError {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl AccountTool for SystemTool {
    fn create_user(&self, spec: &UserSpec) -> Result<(), ToolError> {
        self.run("useradd", &useradd_args(spec))
    }

    fn remove_user(&self, name: &str) -> Result<(), ToolError> {
        self.run("userdel", &[name.to_string()])
    }

    fn set_nologin_shell(&self, name: &str) -> Result<(), ToolError> {
        self.run(
            "usermod",
            &["-s".to_string(), "/sbin/nologin".to_string(), name.to_string()],
        )
    }

    fn lock(&self, name: &str) -> Result<(), ToolError> {
        self.run("usermod", &["-L".to_string(), name.to_string()])
    }

    fn unlock(&self, name: &str) -> Result<(), ToolError> {
        self.run("usermod", &["-U".to_string(), name.to_string()])
    }

    fn create_group(&self, name: &str, gid: Option<u32>) -> Result<(), ToolError> {
        self.run("groupadd", &groupadd_args(name, gid))
    }

    fn remove_group(&self, name: &str) -> Result<(), ToolError> {
        self.run("groupdel", &[name.to_string()])
    }
}

fn useradd_args(spec: &UserSpec) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(gid) = spec.gid {
        args.push("-g".to_string());
        args.push(gid.to_string());
    }
    if !spec.shell.is_empty() {
        args.push("-s".to_string());
        args.push(spec.shell.clone());
    }
    if !spec.home.is_empty() {
        args.push("-d".to_string());
        args.push(spec.home.clone());
    }
    if let Some(uid) = spec.uid {
        args.push("-u".to_string());
        args.push(uid.to_string());
    }
    if !spec.gecos.is_empty() {
        args.push("-c".to_string());
        args.push(spec.gecos.clone());
    }
    // uids below 1000 are system accounts
    if spec.uid.is_some_and(|uid| uid < 1000) {
        args.push("-r".to_string());
    }
    args.push(spec.name.clone());
    args
}

fn groupadd_args(name: &str, gid: Option<u32>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(gid) = gid {
        args.push("-g".to_string());
        args.push(gid.to_string());
    }
    args.push(name.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn useradd_args_with_all_fields() {
        let spec = UserSpec {
            name: "alice".to_string(),
            uid: Some(1001),
            gid: Some(1001),
            gecos: "Alice".to_string(),
            home: "/home/alice".to_string(),
            shell: "/bin/bash".to_string(),
        };
        assert_eq!(
            useradd_args(&spec),
            vec![
                "-g", "1001", "-s", "/bin/bash", "-d", "/home/alice", "-u", "1001", "-c",
                "Alice", "alice",
            ]
        );
    }

    #[test]
    fn useradd_args_omit_unset_fields() {
        let spec = UserSpec {
            name: "alice".to_string(),
            ..UserSpec::default()
        };
        assert_eq!(useradd_args(&spec), vec!["alice"]);
    }

    #[test]
    fn useradd_args_mark_system_accounts() {
        let spec = UserSpec {
            name: "svc".to_string(),
            uid: Some(999),
            ..UserSpec::default()
        };
        assert_eq!(useradd_args(&spec), vec!["-u", "999", "-r", "svc"]);
    }

    #[test]
    fn groupadd_args_with_and_without_gid() {
        assert_eq!(groupadd_args("wheel", Some(998)), vec!["-g", "998", "wheel"]);
        assert_eq!(groupadd_args("wheel", None), vec!["wheel"]);
    }
}
