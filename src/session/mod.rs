//! Interactive execution sessions for generated programs.
//!
//! Each session is one interpreter child process. A background thread per session drains
//! the child's merged output into an unbounded queue; callers poll it with
//! [`SessionManager::read`], feed input with [`SessionManager::write`] and end it with
//! [`SessionManager::stop`]. Sessions are independent of each other.

mod process;
mod reader;

use crate::error::SessionError;
use crate::sandbox::{EngineRoots, PolicyLevel, build_prelude};
use ahash::AHashMap;
use crossbeam::channel::Receiver;
use parking_lot::{Mutex, RwLock};
use reader::OutputEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempPath;
use tracing::{info, warn};

/// Opaque session token. Freshly generated for every session and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated,
}

/// How to find and invoke the interpreter for generated programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Tried in order with `--version`; the first that succeeds is used.
    pub candidates: Vec<String>,
    /// Arguments placed before the program path.
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            candidates: vec!["python".to_string(), "py".to_string(), "python3".to_string()],
            args: vec!["-u".to_string()],
            env: BTreeMap::from([
                ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
                ("PYTHONIOENCODING".to_string(), "utf-8".to_string()),
            ]),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub interpreter: InterpreterConfig,
    pub roots: EngineRoots,
    /// Working directory of spawned programs; inherits the host's when unset.
    pub working_dir: Option<PathBuf>,
    /// Where program artifacts are written; the system temp dir when unset.
    pub artifact_dir: Option<PathBuf>,
}

struct Session {
    id: SessionId,
    child: Mutex<Child>,
    stdin: Mutex<Option<ChildStdin>>,
    output: Receiver<OutputEvent>,
    drained: AtomicBool,
    _artifact: TempPath,
}

impl Session {
    fn drain(&self) -> String {
        let mut out = String::new();
        for event in self.output.try_iter() {
            match event {
                OutputEvent::Chunk(text) => out.push_str(&text),
                OutputEvent::EndOfStream => self.drained.store(true, Ordering::Release),
            }
        }
        out
    }

    fn has_exited(&self) -> io::Result<bool> {
        Ok(self.child.lock().try_wait()?.is_some())
    }

    fn send_line(&self, text: &str) -> io::Result<()> {
        let mut stdin = self.stdin.lock();
        let pipe = stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin is closed"))?;
        pipe.write_all(format!("{}\n", text).as_bytes())?;
        pipe.flush()
    }

    /// Kills the child if it is still alive and reaps it.
    fn terminate(&self) {
        {
            let mut child = self.child.lock();
            if !matches!(child.try_wait(), Ok(Some(_))) {
                if let Err(e) = child.kill() {
                    warn!(session_id = %self.id, error = %e, "Failed to kill session process");
                }
                let _ = child.wait();
            }
        }
        // Taken after the kill so a writer blocked on a full pipe has already been released.
        self.stdin.lock().take();
    }
}

/// Owns the table of running sessions.
///
/// All methods take `&self`; share the manager between threads with an `Arc`.
/// Dropping the manager terminates every session still in the table.
pub struct SessionManager {
    config: SessionConfig,
    sessions: RwLock<AHashMap<SessionId, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(AHashMap::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Spawns `source` behind the sandbox prelude for `policy` and registers the session.
    ///
    /// Nothing is registered when any step fails.
    pub fn start(
        &self,
        source: &str,
        policy: PolicyLevel,
        trusted_project_path: &Path,
    ) -> Result<SessionId, SessionError> {
        let prelude = build_prelude(policy, trusted_project_path, &self.config.roots);
        let artifact =
            process::write_artifact(&prelude, source, self.config.artifact_dir.as_deref())?;
        let interpreter = process::resolve_interpreter(&self.config.interpreter.candidates)?;
        let (mut child, output) = process::spawn(
            &interpreter,
            &self.config.interpreter,
            self.config.working_dir.as_deref(),
            &artifact,
        )?;

        let id = SessionId::new();
        let queue = match reader::spawn_reader(&id, output) {
            Ok(queue) => queue,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SessionError::Spawn {
                    command: "session output reader".to_string(),
                    source,
                });
            }
        };

        let stdin = child.stdin.take();
        let session = Arc::new(Session {
            id: id.clone(),
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            output: queue,
            drained: AtomicBool::new(false),
            _artifact: artifact,
        });
        self.sessions.write().insert(id.clone(), session);

        info!(session_id = %id, %interpreter, %policy, "Started session");
        Ok(id)
    }

    /// Returns everything queued since the last call, without blocking.
    pub fn read(&self, id: &SessionId) -> Result<String, SessionError> {
        Ok(self.get(id)?.drain())
    }

    /// Sends `text` plus a line terminator to the program's input.
    pub fn write(&self, id: &SessionId, text: &str) -> Result<(), SessionError> {
        let session = self.get(id)?;
        let io_err = |source| SessionError::Io {
            session_id: id.clone(),
            source,
        };

        if session.has_exited().map_err(io_err)? {
            return Err(SessionError::ProcessFinished(id.clone()));
        }
        session.send_line(text).map_err(io_err)
    }

    /// Removes the session from the table, then kills its process if still running.
    pub fn stop(&self, id: &SessionId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .write()
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        session.terminate();
        info!(session_id = %id, "Stopped session");
        Ok(())
    }

    /// `Terminated` once the process has exited and its output has been fully read.
    pub fn state(&self, id: &SessionId) -> Result<SessionState, SessionError> {
        let session = self.get(id)?;
        let exited = session.has_exited().map_err(|source| SessionError::Io {
            session_id: id.clone(),
            source,
        })?;
        if exited && session.drained.load(Ordering::Acquire) {
            Ok(SessionState::Terminated)
        } else {
            Ok(SessionState::Running)
        }
    }

    pub fn pid(&self, id: &SessionId) -> Result<u32, SessionError> {
        Ok(self.get(id)?.child.lock().id())
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn get(&self, id: &SessionId) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        for (_, session) in self.sessions.get_mut().drain() {
            session.terminate();
        }
    }
}
