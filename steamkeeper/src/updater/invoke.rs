//! Running the updater tool against the managed game server.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::error::{UpdaterError, UpdaterResult};
use super::platform::InstallTarget;

/// Steam app id of the dedicated server content.
pub const DEFAULT_APP_ID: u32 = 600760;

/// A fully constructed update command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl UpdateCommand {
    /// Build the update-and-quit invocation for a target.
    ///
    /// `content_dir` is where the game server content is installed.
    pub fn new(target: &InstallTarget, content_dir: &Path, app_id: u32) -> Self {
        let args = vec![
            OsString::from("+force_install_dir"),
            content_dir.as_os_str().to_os_string(),
            OsString::from("+login"),
            OsString::from("anonymous"),
            OsString::from("+app_update"),
            OsString::from(app_id.to_string()),
            OsString::from("+quit"),
        ];

        Self {
            program: target.tool_path(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Arguments as a lossy string list, for logging and assertions.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for UpdateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Trait for executing the update command.
pub trait ToolRunner: Send + Sync {
    /// Run the command to completion.
    fn run(&self, command: &UpdateCommand) -> UpdaterResult<()>;
}

/// Runs the updater as a child process on the operator's console.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &UpdateCommand) -> UpdaterResult<()> {
        let status = Command::new(command.program())
            .args(command.args())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| UpdaterError::ProcessSpawnFailure {
                program: command.program().to_path_buf(),
                source: e,
            })?;

        if !status.success() {
            return Err(UpdaterError::ProcessExitFailure {
                program: command.program().to_path_buf(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::updater::platform::Platform;
    use std::sync::Mutex;

    /// Records every command it is asked to run.
    #[derive(Default)]
    pub struct MockRunner {
        pub exit_code: Option<i32>,
        pub commands: Mutex<Vec<UpdateCommand>>,
    }

    impl MockRunner {
        pub fn call_count(&self) -> usize {
            self.commands.lock().unwrap().len()
        }
    }

    impl ToolRunner for MockRunner {
        fn run(&self, command: &UpdateCommand) -> UpdaterResult<()> {
            self.commands.lock().unwrap().push(command.clone());
            match self.exit_code {
                Some(code) if code != 0 => Err(UpdaterError::ProcessExitFailure {
                    program: command.program().to_path_buf(),
                    code: Some(code),
                }),
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn test_linux_command_line() {
        let target = InstallTarget::for_platform(Platform::Linux);
        let command = UpdateCommand::new(&target, Path::new("/srv/game"), DEFAULT_APP_ID);

        assert_eq!(command.program(), Path::new("./steamcmd/steamcmd.sh"));
        assert_eq!(
            command.arg_strings(),
            vec![
                "+force_install_dir",
                "/srv/game",
                "+login",
                "anonymous",
                "+app_update",
                "600760",
                "+quit"
            ]
        );
    }

    #[test]
    fn test_windows_program_extension() {
        let target = InstallTarget::for_platform(Platform::Windows);
        let command = UpdateCommand::new(&target, Path::new("D:\\game"), DEFAULT_APP_ID);

        assert!(command
            .program()
            .to_string_lossy()
            .ends_with("steamcmd.exe"));
    }

    #[test]
    fn test_custom_app_id() {
        let target = InstallTarget::for_platform(Platform::Linux);
        let command = UpdateCommand::new(&target, Path::new("."), 896660);
        assert!(command.to_string().contains("+app_update 896660"));
    }

    #[test]
    fn test_spawn_failure_for_missing_program() {
        let temp = tempfile::TempDir::new().unwrap();
        let target =
            InstallTarget::for_platform(Platform::Linux).with_install_dir(temp.path().join("none"));
        let command = UpdateCommand::new(&target, temp.path(), DEFAULT_APP_ID);

        let err = ProcessRunner.run(&command).unwrap_err();
        assert!(matches!(err, UpdaterError::ProcessSpawnFailure { .. }));
        assert!(!err.triggers_rollback());
    }
}
