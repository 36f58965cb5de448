//! Process table, process termination and program launch.

use crate::errors::AutomationError;
use serde::Serialize;
use std::process::{Command, Stdio};
use sysinfo::{ProcessesToUpdate, System};
use tracing::{debug, info, warn};

/// Captured output of a script run to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Host process primitives used by the lifecycle keywords.
pub trait ProcessHost: Send + Sync {
    /// Image names of all running processes.
    fn process_names(&self) -> Result<Vec<String>, AutomationError>;

    /// Kills every process whose image name is `name` and returns how many were killed.
    fn kill_by_name(&self, name: &str) -> Result<usize, AutomationError>;

    /// Starts a program without waiting for it. `params` is split on whitespace.
    fn run_application(&self, app: &str, params: Option<&str>) -> Result<(), AutomationError>;

    /// Runs a script to completion. `params` is passed as a single argument.
    fn run_script(&self, script: &str, params: Option<&str>)
        -> Result<ScriptOutput, AutomationError>;
}

/// `true` if any running process name contains `name`.
pub fn is_running(host: &dyn ProcessHost, name: &str) -> Result<bool, AutomationError> {
    Ok(host.process_names()?.iter().any(|p| p.contains(name)))
}

fn same_image(process_name: &str, wanted: &str) -> bool {
    let strip = |s: &str| {
        let lower = s.to_lowercase();
        lower.strip_suffix(".exe").map(str::to_string).unwrap_or(lower)
    };
    strip(process_name) == strip(wanted)
}

/// [`ProcessHost`] over the local operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessHost;

impl SystemProcessHost {
    fn snapshot() -> System {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);
        system
    }
}

impl ProcessHost for SystemProcessHost {
    fn process_names(&self) -> Result<Vec<String>, AutomationError> {
        let system = Self::snapshot();
        Ok(system
            .processes()
            .values()
            .map(|p| p.name().to_string_lossy().into_owned())
            .collect())
    }

    fn kill_by_name(&self, name: &str) -> Result<usize, AutomationError> {
        let system = Self::snapshot();
        let mut killed = 0;
        let mut failed = Vec::new();
        for (pid, process) in system.processes() {
            let process_name = process.name().to_string_lossy();
            if !same_image(&process_name, name) {
                continue;
            }
            if process.kill() {
                info!("Killed {} (PID {})", process_name, pid.as_u32());
                killed += 1;
            } else {
                warn!("Failed to kill {} (PID {})", process_name, pid.as_u32());
                failed.push(pid.as_u32());
            }
        }

        if !failed.is_empty() {
            return Err(AutomationError::ProcessTermination {
                name: name.to_string(),
                reason: format!(
                    "could not kill PIDs {failed:?} (may require elevated permissions)"
                ),
            });
        }
        if killed == 0 {
            return Err(AutomationError::ProcessTermination {
                name: name.to_string(),
                reason: "no process has exactly this image name".to_string(),
            });
        }
        Ok(killed)
    }

    fn run_application(&self, app: &str, params: Option<&str>) -> Result<(), AutomationError> {
        let mut command = Command::new(app);
        if let Some(params) = params {
            command.args(params.split_whitespace());
        }
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to start {app}: {e}")))?;
        debug!("Started {} as PID {}", app, child.id());
        Ok(())
    }

    fn run_script(
        &self,
        script: &str,
        params: Option<&str>,
    ) -> Result<ScriptOutput, AutomationError> {
        let mut command = Command::new(script);
        if let Some(params) = params {
            command.arg(params);
        }
        let output = command
            .output()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to run {script}: {e}")))?;
        debug!("{} exited with {}", script, output.status);
        Ok(ScriptOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
