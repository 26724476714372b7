use super::InterpreterConfig;
use crate::error::SessionError;
use std::io::{self, PipeReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tempfile::TempPath;
use tracing::debug;

const ARTIFACT_HEADER: &str = "# -*- coding: utf-8 -*-\n";

/// Returns the first candidate command that answers `--version` successfully.
pub(super) fn resolve_interpreter(candidates: &[String]) -> Result<String, SessionError> {
    candidates
        .iter()
        .find(|candidate| answers_version(candidate))
        .cloned()
        .ok_or_else(|| SessionError::InterpreterUnavailable {
            candidates: candidates.to_vec(),
        })
}

fn answers_version(command: &str) -> bool {
    let available = Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false);
    debug!(command, available, "Checked interpreter");
    available
}

/// Writes prelude and program into one temporary file, removed when the path is dropped.
pub(super) fn write_artifact(
    prelude: &str,
    source: &str,
    dir: Option<&Path>,
) -> Result<TempPath, SessionError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("turtcd-").suffix(".py");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(SessionError::Artifact)?;

    let mut contents = String::with_capacity(ARTIFACT_HEADER.len() + prelude.len() + source.len() + 1);
    contents.push_str(ARTIFACT_HEADER);
    contents.push_str(prelude);
    contents.push_str(source);
    if !contents.ends_with('\n') {
        contents.push('\n');
    }

    file.write_all(contents.as_bytes())
        .and_then(|_| file.flush())
        .map_err(SessionError::Artifact)?;
    Ok(file.into_temp_path())
}

/// Spawns the interpreter on the artifact with stderr joined into stdout.
///
/// Both output streams share the write end of one pipe, so the returned reader sees them
/// interleaved exactly as the child wrote them.
pub(super) fn spawn(
    interpreter: &str,
    config: &InterpreterConfig,
    working_dir: Option<&Path>,
    artifact: &Path,
) -> Result<(Child, PipeReader), SessionError> {
    let spawn_err = |source: io::Error| SessionError::Spawn {
        command: interpreter.to_string(),
        source,
    };

    let (reader, writer) = io::pipe().map_err(spawn_err)?;
    let writer_for_stderr = writer.try_clone().map_err(spawn_err)?;

    let mut command = Command::new(interpreter);
    command
        .args(&config.args)
        .arg(artifact)
        .envs(&config.env)
        .stdin(Stdio::piped())
        .stdout(writer)
        .stderr(writer_for_stderr);
    if let Some(dir) = working_dir {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(spawn_err)?;
    // The command owns the parent's copies of the write end; EOF only arrives once they close.
    drop(command);
    Ok((child, reader))
}
