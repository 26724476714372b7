use clap::{Parser, Subcommand, ValueEnum};
use crossbeam::channel::{self, Receiver, TryRecvError};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use turtcd::prelude::*;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Compile block programs and run them in sandboxed sessions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to an engine configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a project and print (or write) the generated source
    Compile {
        /// Path to the project JSON file
        project: PathBuf,
        /// Write the source to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compile a project and run it interactively
    Run {
        /// Path to the project JSON file
        project: PathBuf,
        /// Sandbox policy for the running program
        #[arg(short, long, value_enum, default_value_t = PolicyCli::Limited)]
        policy: PolicyCli,
        /// Directory the program may not modify; defaults to the project file's directory
        #[arg(short, long)]
        trusted: Option<PathBuf>,
    },
    /// List the blocks available in the catalog
    Blocks,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyCli {
    Full,
    Limited,
    Restricted,
}

impl From<PolicyCli> for PolicyLevel {
    fn from(policy: PolicyCli) -> Self {
        match policy {
            PolicyCli::Full => PolicyLevel::Full,
            PolicyCli::Limited => PolicyLevel::Limited,
            PolicyCli::Restricted => PolicyLevel::Restricted,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Compile { project, output } => run_compile(&config, &project, output.as_deref()),
        Command::Run {
            project,
            policy,
            trusted,
        } => run_session(&config, &project, policy.into(), trusted),
        Command::Blocks => list_blocks(&config),
    }
}

fn load_catalog(config: &EngineConfig) -> Catalog {
    Catalog::load(&config.catalog)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load block catalog: {}", e)))
}

fn compile_project(config: &EngineConfig, project_path: &Path) -> String {
    let catalog = load_catalog(config);
    let project = UiProject::from_file(project_path)
        .and_then(IntoProject::into_project)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load project: {}", e)));

    let output = Compiler::builder(&catalog)
        .with_config(&config.compiler)
        .build()
        .compile_with_diagnostics(&project);
    for diagnostic in &output.diagnostics {
        tracing::warn!(%diagnostic, "Compilation degraded");
    }
    output.source
}

fn run_compile(config: &EngineConfig, project_path: &Path, output: Option<&Path>) {
    let source = compile_project(config, project_path);
    match output {
        Some(path) => fs::write(path, format!("{}\n", source)).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write '{}': {}", path.display(), e))
        }),
        None => println!("{}", source),
    }
}

fn run_session(
    config: &EngineConfig,
    project_path: &Path,
    policy: PolicyLevel,
    trusted: Option<PathBuf>,
) {
    let source = compile_project(config, project_path);
    let trusted = trusted.unwrap_or_else(|| {
        project_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });

    let sessions = SessionManager::new(config.session.clone());
    let id = sessions
        .start(&source, policy, &trusted)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to start program: {}", e)));
    let input = forward_stdin();
    let mut stdout = io::stdout();

    loop {
        let chunk = sessions
            .read(&id)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        if let Err(e) = forward_output(&mut stdout, &chunk) {
            // Nobody is reading any more (closed pipe or similar).
            let _ = sessions.stop(&id);
            exit_with_error(&format!("Failed to write program output: {}", e));
        }

        match sessions.state(&id) {
            Ok(SessionState::Terminated) => break,
            Ok(SessionState::Running) => {}
            Err(e) => exit_with_error(&e.to_string()),
        }

        loop {
            match input.try_recv() {
                Ok(line) => {
                    if let Err(e) = sessions.write(&id, &line) {
                        debug!(error = %e, "Dropped input line");
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    if let Err(e) = sessions.stop(&id) {
        exit_with_error(&e.to_string());
    }
}

fn forward_output<W: Write>(out: &mut W, chunk: &str) -> io::Result<()> {
    if chunk.is_empty() {
        return Ok(());
    }
    out.write_all(chunk.as_bytes())?;
    out.flush()
}

/// Reads our own stdin on a side thread so polling never blocks on it.
fn forward_stdin() -> Receiver<String> {
    let (tx, rx) = channel::unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn list_blocks(config: &EngineConfig) {
    let catalog = load_catalog(config);
    println!("{:<24} | {:<20} | {:<16} | type", "name", "id", "category");
    for (category, block) in catalog.blocks() {
        println!(
            "{:<24} | {:<20} | {:<16} | {:?}",
            block.name, block.id, category.name, block.block_type
        );
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn forward_output_writes_chunk() {
        let mut out = Vec::new();
        forward_output(&mut out, "hello\n").unwrap();
        forward_output(&mut out, "").unwrap();
        assert_eq!(out, b"hello\n");
    }

    #[test]
    fn forward_output_reports_closed_pipe() {
        let err = forward_output(&mut ClosedPipe, "lost").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        // Empty chunks never touch the writer.
        assert!(forward_output(&mut ClosedPipe, "").is_ok());
    }
}
