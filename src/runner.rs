//! Process Runner
//!
//! Builds and launches the external solver. The solver's stdout is
//! captured verbatim into the output file for the parser.

use crate::config::RunConfig;
use crate::error::*;
use log::{debug, info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of a solver run that exited successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub exit_code: i32,
    pub duration_seconds: f64,
    pub raw_output_path: PathBuf,
}

/// Shared flag used to stop a running solver from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The line written to the execution time file.
pub fn duration_line(seconds: f64) -> String {
    format!("Execution time: {seconds:.4} seconds")
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("creating {parent:?}"), e))?;
        }
    }
    Ok(())
}

fn kill_child(child: &mut Child) {
    if let Err(e) = child.kill() {
        warn!("Failed to kill solver process {}: {}", child.id(), e);
    }
    // Reap so the process does not linger as a zombie.
    let _ = child.wait();
}

/// Wait for `child`, polling when a timeout or cancel token is in play.
fn wait_child(
    child: &mut Child,
    timeout: Option<Duration>,
    cancel: Option<&CancelToken>,
) -> Result<ExitStatus> {
    let wait_err = |e: std::io::Error| Error::io("waiting for solver", e);
    if timeout.is_none() && cancel.is_none() {
        return child.wait().map_err(wait_err);
    }

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().map_err(wait_err)? {
            return Ok(status);
        }
        if cancel.is_some_and(|c| c.is_cancelled()) {
            warn!("Cancelling solver process {}", child.id());
            kill_child(child);
            return Err(Error::ExecutionCancelled);
        }
        if let Some(limit) = timeout {
            if start.elapsed() >= limit {
                warn!(
                    "Solver process {} exceeded {:?}, killing it",
                    child.id(),
                    limit
                );
                kill_child(child);
                return Err(Error::ExecutionTimedOut {
                    seconds: limit.as_secs_f64(),
                });
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Build the solver executable from source, returns its path.
pub fn compile(config: &RunConfig) -> Result<PathBuf> {
    profiling::scope!("runner::compile");
    let source = config.source_path();
    let executable = config.executable_path();
    create_parent_dir(&executable)?;

    let mut command = Command::new(&config.compile.compiler);
    command
        .args(&config.compile.flags)
        .arg("-o")
        .arg(&executable)
        .arg(&source);
    info!("Compiling: {:?}", command);

    let status = command
        .status()
        .map_err(|e| {
            Error::io(format!("running compiler {:?}", config.compile.compiler), e)
        })?;
    if !status.success() {
        return Err(Error::CompilationFailed {
            code: status.code(),
        });
    }
    debug!("Compiled {:?}", executable);
    Ok(executable)
}

/// Run the solver with the configured grid size and tolerance,
/// capturing stdout into the configured output file.
///
/// On success the measured duration is also written to the
/// execution time file next to the output.
pub fn run<P: AsRef<Path>>(
    executable: &P,
    config: &RunConfig,
    cancel: Option<&CancelToken>,
) -> Result<RunResult> {
    profiling::scope!("runner::run");
    let executable = executable.as_ref();
    if !executable.is_file() {
        return Err(Error::SolverNotFound(executable.to_path_buf()));
    }

    let output_path = config.output_path();
    create_parent_dir(&output_path)?;
    let output_file = File::create(&output_path)
        .map_err(|e| Error::io(format!("creating {output_path:?}"), e))?;

    let args = config.solver_args();
    info!("Running: {:?} {}", executable, args.join(" "));

    let start = Instant::now();
    let mut child = Command::new(executable)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(output_file))
        .spawn()
        .map_err(|e| Error::io(format!("launching {executable:?}"), e))?;
    let status = wait_child(&mut child, config.timeout, cancel)?;
    let duration_seconds = start.elapsed().as_secs_f64();

    let exit_code = match status.code() {
        Some(0) => 0,
        code => return Err(Error::ExecutionFailed { code }),
    };

    let line = duration_line(duration_seconds);
    info!("{}", line);
    let time_path = config.time_path();
    std::fs::write(&time_path, format!("{line}\n"))
        .map_err(|e| Error::io(format!("writing {time_path:?}"), e))?;

    Ok(RunResult {
        exit_code,
        duration_seconds,
        raw_output_path: output_path,
    })
}
