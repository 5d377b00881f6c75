//! Container runtime adapter driving the `docker` CLI.

use std::ffi::OsString;
use std::process::Command;
use svcplus_domain::{ComposeRequest, ContainerSpec};
use svcplus_ports::{ContainerId, ContainerRuntimePort};
use svcplus_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};

/// Compose variable carrying the broker user.
pub const RABBITMQ_USER_VAR: &str = "RABBITMQ_DEFAULT_USER";
/// Compose variable carrying the broker password.
pub const RABBITMQ_PASSWORD_VAR: &str = "RABBITMQ_DEFAULT_PASS";

/// Invokes the container tool binary once per operation.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: Box<str>,
}

impl DockerCli {
    /// Drive `binary` (usually `docker`).
    pub fn new(binary: impl Into<Box<str>>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(
        &self,
        args: &[OsString],
        envs: &[(&str, &str)],
    ) -> std::result::Result<String, ToolError> {
        let mut command = Command::new(&*self.binary);
        command.args(args);
        for (key, value) in envs {
            command.env(key, value);
        }

        tracing::debug!(
            binary = &*self.binary,
            args = %display_args(args),
            "running container tool"
        );
        let output = command.output().map_err(|error| ToolError {
            kind: if error.kind() == std::io::ErrorKind::NotFound {
                ToolErrorKind::NotFound
            } else {
                ToolErrorKind::Spawn
            },
            message: format!("failed to run {}: {error}", self.binary),
            command: display_args(args),
        })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(ToolError {
            kind: ToolErrorKind::Failed,
            message: format!(
                "{} {} failed ({}): {}",
                self.binary,
                display_args(args),
                output.status,
                stderr.trim()
            ),
            command: display_args(args),
        })
    }

    fn run_checked(&self, args: &[OsString], envs: &[(&str, &str)]) -> Result<String> {
        self.run(args, envs).map_err(|error| error.into_envelope(&self.binary))
    }
}

impl ContainerRuntimePort for DockerCli {
    fn check_available(&self) -> Result<()> {
        self.run(&os_args(["ps", "--quiet"]), &[]).map_err(|error| match error.kind {
            ToolErrorKind::NotFound => error.into_envelope(&self.binary),
            ToolErrorKind::Spawn | ToolErrorKind::Failed => ErrorEnvelope::expected(
                ErrorCode::new("container", "daemon_unavailable"),
                format!("Please start {} correctly", self.binary),
            )
            .with_metadata("detail", error.message),
        })?;

        self.run(&os_args(["compose", "version"]), &[])
            .map_err(|error| {
                ErrorEnvelope::expected(
                    ErrorCode::new("container", "compose_missing"),
                    format!("Please install {}-compose first", self.binary),
                )
                .with_metadata("detail", error.message)
            })?;
        Ok(())
    }

    fn compose_up(&self, request: &ComposeRequest) -> Result<()> {
        let envs = compose_env(request);
        self.run_checked(&compose_args(request, &["up", "--detach"]), &env_refs(&envs))?;
        Ok(())
    }

    fn compose_down(&self, request: &ComposeRequest) -> Result<()> {
        let envs = compose_env(request);
        self.run_checked(&compose_args(request, &["down"]), &env_refs(&envs))?;
        Ok(())
    }

    fn run_container(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let stdout = self.run_checked(&run_args(spec), &[])?;
        Ok(ContainerId::new(&stdout))
    }

    fn remove_container(&self, name: &str) -> Result<()> {
        self.run_checked(&os_args(["rm", "--force", name]), &[])?;
        Ok(())
    }

    fn create_network(&self, name: &str) -> Result<()> {
        self.run_checked(
            &os_args(["network", "create", "--driver", "bridge", name]),
            &[],
        )?;
        Ok(())
    }

    fn remove_network(&self, name: &str) -> Result<()> {
        self.run_checked(&os_args(["network", "rm", name]), &[])?;
        Ok(())
    }
}

/// Arguments for a detached `run` of `spec`.
#[must_use]
pub fn run_args(spec: &ContainerSpec) -> Vec<OsString> {
    let mut args = os_args([
        "run",
        "--detach",
        "--name",
        &*spec.name,
        "--hostname",
        &*spec.name,
        "--restart",
        "always",
        "--interactive",
        "--tty",
        "--pull",
        "missing",
    ]);
    for port in &spec.ports {
        args.push("--publish".into());
        args.push(port.to_string().into());
    }
    for volume in &spec.volumes {
        args.push("--volume".into());
        let mut mount = volume.host.clone().into_os_string();
        mount.push(format!(":{}:rw", volume.container));
        args.push(mount);
    }
    for network in &spec.networks {
        args.push("--network".into());
        args.push(OsString::from(&**network));
    }
    args.push(OsString::from(&*spec.image));
    args.extend(spec.command.iter().map(|arg| OsString::from(&**arg)));
    args
}

/// Arguments for `compose -f <file> <action...>`.
#[must_use]
pub fn compose_args(request: &ComposeRequest, action: &[&str]) -> Vec<OsString> {
    let mut args = os_args(["compose", "--file"]);
    args.push(request.file.clone().into_os_string());
    args.extend(action.iter().map(OsString::from));
    args
}

fn compose_env(request: &ComposeRequest) -> Vec<(&'static str, String)> {
    request
        .credentials
        .as_ref()
        .map(|credentials| {
            vec![
                (RABBITMQ_USER_VAR, credentials.user.to_string()),
                (
                    RABBITMQ_PASSWORD_VAR,
                    credentials.password.expose().to_owned(),
                ),
            ]
        })
        .unwrap_or_default()
}

fn env_refs<'a>(envs: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    envs.iter().map(|(key, value)| (*key, value.as_str())).collect()
}

fn os_args<'a>(args: impl IntoIterator<Item = &'a str>) -> Vec<OsString> {
    args.into_iter().map(OsString::from).collect()
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolErrorKind {
    NotFound,
    Spawn,
    Failed,
}

#[derive(Debug)]
struct ToolError {
    kind: ToolErrorKind,
    message: String,
    command: String,
}

impl ToolError {
    fn into_envelope(self, binary: &str) -> ErrorEnvelope {
        match self.kind {
            ToolErrorKind::NotFound => ErrorEnvelope::expected(
                ErrorCode::new("container", "tool_missing"),
                format!("Please install {binary} first"),
            )
            .with_metadata("binary", binary.to_owned()),
            ToolErrorKind::Spawn | ToolErrorKind::Failed => ErrorEnvelope::unexpected(
                ErrorCode::new("container", "command_failed"),
                self.message,
                ErrorClass::NonRetriable,
            )
            .with_metadata("binary", binary.to_owned())
            .with_metadata("command", self.command),
        }
    }
}
