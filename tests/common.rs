//! Common test utilities for building catalogs, projects and sessions.
use serde_json::Value;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use turtcd::catalog::FieldDescriptor;
use turtcd::prelude::*;
use turtcd::session::InterpreterConfig;

fn field(name: &str) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        label: name.to_string(),
        kind: "text".to_string(),
        required: false,
        placeholder: String::new(),
    }
}

#[allow(dead_code)]
pub fn definition(id: &str, block_type: BlockType, code: &str, fields: &[&str]) -> BlockDefinition {
    BlockDefinition {
        id: id.to_string(),
        name: id.to_string(),
        block_type,
        color: "#000000".to_string(),
        fields: fields.iter().map(|f| field(f)).collect(),
        code: code.to_string(),
        width: None,
        height: None,
    }
}

/// A catalog with one block of every structural type.
///
/// - `start`: header, `print("start")`
/// - `say`: classic, `print("{text}")`
/// - `repeat`: loop, `for i in range({count}):`
/// - `when`: condition, `if {expr}:`
#[allow(dead_code)]
pub fn create_test_catalog() -> Catalog {
    Catalog::new(vec![Category {
        id: "test".to_string(),
        name: "Test".to_string(),
        color: "#ffffff".to_string(),
        collapsed: false,
        blocks: vec![
            definition("start", BlockType::Header, "print(\"start\")\n", &[]),
            definition("say", BlockType::Classic, "print(\"{text}\")\n", &["text"]),
            definition("repeat", BlockType::Loop, "for i in range({count}):\n", &["count"]),
            definition("when", BlockType::Condition, "if {expr}:\n", &["expr"]),
        ],
        mod_id: None,
        mod_name: None,
    }])
}

#[allow(dead_code)]
pub fn block(id: &str, template: &str) -> BlockInstance {
    BlockInstance {
        id: id.to_string(),
        template: template.to_string(),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn block_with(id: &str, template: &str, fields: &[(&str, Value)]) -> BlockInstance {
    BlockInstance {
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        ..block(id, template)
    }
}

#[allow(dead_code)]
pub fn link(from: &str, connector: Connector, to: &str) -> Connection {
    Connection {
        from: from.to_string(),
        from_connector: connector,
        to: to.to_string(),
    }
}

#[allow(dead_code)]
pub fn create_project(blocks: Vec<BlockInstance>, connections: Vec<Connection>) -> Project {
    Project {
        blocks,
        connections,
    }
}

/// Returns `true` when `command --version` runs successfully.
#[allow(dead_code)]
pub fn command_available(command: &str) -> bool {
    Command::new(command)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// First Python interpreter found on this machine, if any.
#[allow(dead_code)]
pub fn find_python() -> Option<String> {
    ["python3", "python"]
        .into_iter()
        .find(|c| command_available(c))
        .map(str::to_string)
}

/// Session config that runs programs with bash, for tests that don't involve the prelude.
#[allow(dead_code)]
pub fn bash_session_config() -> SessionConfig {
    SessionConfig {
        interpreter: InterpreterConfig {
            candidates: vec!["bash".to_string()],
            args: Vec::new(),
            env: Default::default(),
        },
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn python_session_config(python: &str, roots: EngineRoots) -> SessionConfig {
    SessionConfig {
        interpreter: InterpreterConfig {
            candidates: vec![python.to_string()],
            ..Default::default()
        },
        roots,
        ..Default::default()
    }
}

/// Polls `read` until the session reports `Terminated`, returning everything read.
#[allow(dead_code)]
pub fn collect_until_terminated(
    sessions: &SessionManager,
    id: &SessionId,
    timeout: Duration,
) -> String {
    let deadline = Instant::now() + timeout;
    let mut output = String::new();
    loop {
        output.push_str(&sessions.read(id).expect("read running session"));
        if sessions.state(id).expect("session state") == SessionState::Terminated {
            output.push_str(&sessions.read(id).expect("final read"));
            return output;
        }
        assert!(
            Instant::now() < deadline,
            "session did not terminate in time; output so far: {:?}",
            output
        );
        thread::sleep(Duration::from_millis(20));
    }
}

/// Polls `read` until the accumulated output contains `needle`.
#[allow(dead_code)]
pub fn read_until(
    sessions: &SessionManager,
    id: &SessionId,
    needle: &str,
    timeout: Duration,
) -> String {
    let deadline = Instant::now() + timeout;
    let mut output = String::new();
    while !output.contains(needle) {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {:?}; output so far: {:?}",
            needle,
            output
        );
        output.push_str(&sessions.read(id).expect("read running session"));
        thread::sleep(Duration::from_millis(20));
    }
    output
}
