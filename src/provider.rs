//! Sources of graph snapshots.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::pw_dump;
use crate::snapshot::Snapshot;

/// Anything that can produce one snapshot of the graph.
///
/// Implementations must return within a bounded time; the panel calls
/// this every refresh.
pub trait SnapshotProvider {
    fn snapshot(&self) -> Result<Snapshot>;
}

impl<F> SnapshotProvider for F
where
    F: Fn() -> Result<Snapshot>,
{
    fn snapshot(&self) -> Result<Snapshot> {
        self()
    }
}

/// Runs `pw-dump` (or a compatible program) and parses its output.
#[derive(Debug, Clone)]
pub struct PwDump {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PwDump {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Dump the graph of a remote other than the default.
    pub fn with_remote(self, remote: Option<&str>) -> Self {
        match remote {
            Some(remote) => self.arg("--remote").arg(remote),
            None => self,
        }
    }

    fn run(&self) -> Result<Vec<u8>> {
        let deadline = Instant::now() + self.timeout;

        debug!("Running {} {:?}", self.program, self.args);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("could not start")?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Whatever happens below, don't leave the child running or
        // unreaped.
        let mut child = scopeguard::guard(child, |mut child| {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        });

        // The pipes are drained off this thread so a large dump can't fill
        // a pipe buffer while we wait on the deadline.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(read_pipes(stdout, stderr));
        });

        let (output, errors) = match rx.recv_timeout(self.timeout) {
            Ok(result) => result.context("could not read output")?,
            Err(RecvTimeoutError::Timeout) => {
                bail!("timed out after {} ms", self.timeout.as_millis())
            }
            Err(RecvTimeoutError::Disconnected) => {
                bail!("output reader exited unexpectedly")
            }
        };

        let status = wait_until(&mut child, deadline, self.timeout)?;
        debug!("{} exited with {status}, {} bytes", self.program, output.len());

        if !status.success() {
            let errors = String::from_utf8_lossy(&errors);
            let errors = errors.trim();
            if errors.is_empty() {
                bail!("{status}");
            }
            bail!("{status}: {errors}");
        }

        Ok(output)
    }
}

impl SnapshotProvider for PwDump {
    fn snapshot(&self) -> Result<Snapshot> {
        let output = self
            .run()
            .with_context(|| format!("Failed to run '{}'", self.program))?;
        pw_dump::parse(&output)
    }
}

/// Reads both pipes to the end. stderr gets its own thread, otherwise a
/// child that is chatty on stderr blocks before it closes stdout.
fn read_pipes(
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let errors = thread::spawn(move || -> io::Result<Vec<u8>> {
        let mut errors = Vec::new();
        if let Some(mut stderr) = stderr {
            stderr.read_to_end(&mut errors)?;
        }
        Ok(errors)
    });

    let mut output = Vec::new();
    if let Some(mut stdout) = stdout {
        stdout.read_to_end(&mut output)?;
    }

    let errors = errors
        .join()
        .map_err(|_| io::Error::other("stderr reader panicked"))??;
    Ok((output, errors))
}

/// The pipes can close before the process actually exits, so keep
/// honoring the deadline while reaping.
fn wait_until(
    child: &mut Child,
    deadline: Instant,
    timeout: Duration,
) -> Result<ExitStatus> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            bail!("timed out after {} ms", timeout.as_millis());
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Reads a saved `pw-dump` from a file, or from stdin for `-`.
#[derive(Debug, Clone)]
pub struct DumpFile {
    path: PathBuf,
}

impl DumpFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotProvider for DumpFile {
    fn snapshot(&self) -> Result<Snapshot> {
        let json = if self.path == Path::new("-") {
            let mut json = Vec::new();
            io::stdin()
                .read_to_end(&mut json)
                .context("Failed to read graph dump from stdin")?;
            json
        } else {
            fs::read(&self.path).with_context(|| {
                format!(
                    "Failed to read graph dump from '{}'",
                    self.path.display()
                )
            })?
        };
        pw_dump::parse(&json)
    }
}
