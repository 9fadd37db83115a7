//! External process runner behind the `cmd` and `cmd_kill` commands.
//!
//! Runs one shell command line at a time. Output from stdout and stderr is
//! read line by line as it arrives, so a concurrent [`ProcessRunner::kill`]
//! can stop a long-running command and still return what it printed.
//!
//! At most one process is tracked. A start while one is running is refused
//! with [`ProcessError::Busy`] instead of replacing the tracked handle.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::config::RunnerConfig;

/// Returned when a command finished without printing anything.
pub const SUCCESS_MESSAGE: &str = "command executed successfully";
/// Returned by `kill` after stopping the tracked process.
pub const CANCELLED_MESSAGE: &str = "command cancelled";
/// Returned by `kill` when nothing is running.
pub const NOTHING_TO_CANCEL: &str = "no active command to cancel";

/// Shell exit statuses meaning "program not found".
const NOT_FOUND_STATUS: &[i32] = if cfg!(windows) { &[9009] } else { &[127] };

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("command not found: {0}. Make sure it is installed and available on PATH")]
    NotFound(String),
    #[error("a command is already running: {running}")]
    Busy { running: String },
    #[error("failed to run command: {0}")]
    Io(#[from] io::Error),
}

/// The process currently tracked as cancellable.
struct ActiveProcess {
    id: u64,
    command: String,
    /// Asks the run loop to terminate; the loop answers once the child exited.
    kill_tx: mpsc::Sender<oneshot::Sender<()>>,
}

/// Runs shell command lines and tracks the one in flight.
pub struct ProcessRunner {
    config: RunnerConfig,
    active: Mutex<Option<ActiveProcess>>,
    next_id: AtomicU64,
}

impl ProcessRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Whether a process is currently tracked.
    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Command line of the tracked process, if any.
    pub async fn active_command(&self) -> Option<String> {
        self.active.lock().await.as_ref().map(|a| a.command.clone())
    }

    /// Run `command_line` through the shell and collect its merged output.
    ///
    /// Surrounding quotes are stripped first. Returns the output lines, or
    /// [`SUCCESS_MESSAGE`] when there were none. If the run is cancelled,
    /// the partial output (or [`CANCELLED_MESSAGE`]) is returned.
    pub async fn run(&self, command_line: &str) -> Result<String, ProcessError> {
        let line = strip_quotes(command_line.trim()).to_string();

        let (id, child, kill_rx) = {
            let mut slot = self.active.lock().await;
            if let Some(active) = slot.as_ref() {
                return Err(ProcessError::Busy {
                    running: active.command.clone(),
                });
            }
            let child = self.spawn(&line).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ProcessError::NotFound(program_name(&line)),
                _ => ProcessError::Io(e),
            })?;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let (kill_tx, kill_rx) = mpsc::channel(1);
            *slot = Some(ActiveProcess {
                id,
                command: line.clone(),
                kill_tx,
            });
            (id, child, kill_rx)
        };

        tracing::info!(command = %line, pid = ?child.id(), "process started");
        let result = self.drive(child, &line, kill_rx).await;
        self.release(id).await;
        result
    }

    /// Stop the tracked process: graceful signal first, forced after the
    /// configured grace period.
    ///
    /// The slot stays occupied until the child has been reaped, so a start
    /// during the grace period is refused as busy.
    pub async fn kill(&self) -> String {
        let (id, command, kill_tx) = match self.active.lock().await.as_ref() {
            Some(active) => (active.id, active.command.clone(), active.kill_tx.clone()),
            None => return NOTHING_TO_CANCEL.to_string(),
        };

        tracing::debug!(%command, "cancelling process");
        let (done_tx, done_rx) = oneshot::channel();
        if kill_tx.send(done_tx).await.is_ok() {
            // The run loop drops the sender without answering only if it
            // finished on its own in the meantime.
            let _ = done_rx.await;
        }
        self.release(id).await;
        CANCELLED_MESSAGE.to_string()
    }

    fn spawn(&self, line: &str) -> io::Result<Child> {
        let argv = self.config.shell_argv();
        let (program, flags) = match argv.split_first() {
            Some(split) => split,
            None => return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty shell")),
        };

        let mut cmd = Command::new(program);
        cmd.args(flags)
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = self.augmented_path() {
            cmd.env("PATH", path);
        }
        // Own process group, so termination reaches everything the shell forks.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.spawn()
    }

    /// Inherited `PATH` with the platform system directories and configured
    /// extra directories appended, skipping ones already present.
    pub fn augmented_path(&self) -> Option<OsString> {
        let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();

        let system: &[&str] = if cfg!(windows) {
            &[r"C:\Windows\System32"]
        } else {
            &["/usr/bin", "/bin"]
        };
        let extra = system
            .iter()
            .map(PathBuf::from)
            .chain(self.config.extra_path.iter().cloned());
        for dir in extra {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }

        std::env::join_paths(dirs).ok()
    }

    /// Read output until the child exits or a kill request arrives.
    async fn drive(
        &self,
        mut child: Child,
        line: &str,
        mut kill_rx: mpsc::Receiver<oneshot::Sender<()>>,
    ) -> Result<String, ProcessError> {
        let mut stdout = child.stdout.take().map(LineReader::new);
        let mut stderr = child.stderr.take().map(LineReader::new);
        let mut output = String::new();

        let mut kill_request = loop {
            if stdout.is_none() && stderr.is_none() {
                break None;
            }
            tokio::select! {
                next = next_line(&mut stdout), if stdout.is_some() => {
                    if !collect(next, &mut output) {
                        stdout = None;
                    }
                }
                next = next_line(&mut stderr), if stderr.is_some() => {
                    if !collect(next, &mut output) {
                        stderr = None;
                    }
                }
                Some(done) = kill_rx.recv() => break Some(done),
            }
        };

        let mut status = None;
        if kill_request.is_none() {
            tokio::select! {
                exited = child.wait() => status = Some(exited?),
                Some(done) = kill_rx.recv() => kill_request = Some(done),
            }
        }

        if let Some(done) = kill_request {
            let status = self.terminate(&mut child).await;
            tracing::info!(command = %line, ?status, "process cancelled");
            let _ = done.send(());
            let partial = output.trim_end();
            return Ok(if partial.is_empty() {
                CANCELLED_MESSAGE.to_string()
            } else {
                partial.to_string()
            });
        }

        let status = match status {
            Some(status) => status,
            None => child.wait().await?,
        };
        tracing::info!(command = %line, %status, "process exited");

        if status.code().is_some_and(|c| NOT_FOUND_STATUS.contains(&c)) {
            return Err(ProcessError::NotFound(program_name(line)));
        }
        let text = output.trim_end();
        Ok(if text.is_empty() {
            SUCCESS_MESSAGE.to_string()
        } else {
            text.to_string()
        })
    }

    /// Graceful stop, then forced kill once the grace period runs out.
    async fn terminate(&self, child: &mut Child) -> io::Result<ExitStatus> {
        request_stop(child)?;
        match tokio::time::timeout(self.config.kill_grace(), child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                tracing::warn!(pid = ?child.id(), "process ignored stop request, killing");
                force_kill(child);
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "start_kill after group kill");
                }
                child.wait().await
            }
        }
    }

    /// Clear the slot if it still tracks run `id`.
    async fn release(&self, id: u64) {
        let mut slot = self.active.lock().await;
        if slot.as_ref().is_some_and(|a| a.id == id) {
            *slot = None;
        }
    }
}

impl std::fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: nix::sys::signal::Signal) -> io::Result<()> {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|p| i32::try_from(p).ok()) else {
        return Ok(());
    };
    match killpg(Pid::from_raw(pid), signal) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(errno) => Err(io::Error::from(errno)),
    }
}

#[cfg(unix)]
fn request_stop(child: &mut Child) -> io::Result<()> {
    signal_group(child, nix::sys::signal::Signal::SIGTERM)
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

#[cfg(unix)]
fn force_kill(child: &mut Child) {
    if let Err(e) = signal_group(child, nix::sys::signal::Signal::SIGKILL) {
        tracing::warn!(error = %e, "failed to kill process group");
    }
}

#[cfg(not(unix))]
fn force_kill(_child: &mut Child) {}

/// Splits a pipe into lines, decoding invalid UTF-8 lossily.
///
/// A partial line survives a read cancelled by `select!` and is completed
/// by the next call.
struct LineReader<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }
        let mut line = std::mem::take(&mut self.pending);
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}

async fn next_line<R>(reader: &mut Option<LineReader<R>>) -> io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.next_line().await,
        None => Ok(None),
    }
}

/// Append one read result to `output`; false once the stream is finished.
fn collect(next: io::Result<Option<String>>, output: &mut String) -> bool {
    match next {
        Ok(Some(line)) => {
            tracing::trace!(%line, "process output");
            output.push_str(&line);
            output.push('\n');
            true
        }
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read process output");
            false
        }
    }
}

/// Remove one pair of matching surrounding quotes.
pub fn strip_quotes(line: &str) -> &str {
    crate::literal::strip_quotes(line).unwrap_or(line)
}

/// First word of a command line, for not-found diagnostics.
fn program_name(line: &str) -> String {
    line.split_whitespace().next().unwrap_or(line).to_string()
}
