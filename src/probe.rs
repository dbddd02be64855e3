//! Compile probing
//!
//! One probe writes a generated fragment into the fixed C skeleton, asks the
//! configured compiler to compile (not link) it, and cleans up after itself:
//! a surviving `.c` file means the probe succeeded, and an object file never
//! survives either way.
//!
//! Probe failure is data, not an error: non-zero exits, launch failures, and
//! timeouts all fold into a failed [`ProbeOutcome`] so that the worker loop
//! can keep hammering. Timed-out compilers get SIGTERM, a short grace
//! window, then SIGKILL, the child never outlives the probe.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;

/// Skeleton the random fragment is embedded into, before the fragment.
const C_PRELUDE: &str = r#"#include <stdio.h>
#include <stdlib.h>
#include <string.h>
#include <math.h>
#include <ctype.h>
#include <time.h>
#include <assert.h>
#include <errno.h>
#include <float.h>
#include <limits.h>
#include <locale.h>
#include <setjmp.h>
#include <signal.h>
#include <stdarg.h>
#include <stddef.h>
#include <unistd.h>
#include <fcntl.h>
#include <sys/types.h>
#include <sys/stat.h>
#include <pthread.h>
#include <dirent.h>
#include <termios.h>

int main(int argc, char **argv) {
"#;

/// Skeleton after the fragment.
const C_EPILOGUE: &str = "\n    return 0;\n}\n";

/// How often a running compiler is checked against the deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long a SIGTERM'd compiler gets before SIGKILL.
const TERM_GRACE: Duration = Duration::from_millis(50);

/// Internal probe mechanics that are not compiler verdicts.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The compiler executable could not be launched at all.
    #[error("failed to launch compiler: {0}")]
    Launch(io::Error),

    /// The compiler outlived the per-attempt timeout and was killed.
    #[error("compiler timed out after {0:?}")]
    Timeout(Duration),

    /// I/O trouble while supervising the child.
    #[error("probe I/O error: {0}")]
    Io(io::Error),
}

/// Result of one compile attempt.
#[derive(Debug)]
pub struct ProbeOutcome {
    /// The generated fragment that was probed.
    pub content: String,
    /// Whether the compiler accepted it.
    pub success: bool,
    /// Where the accepted source was kept. Present only on success.
    pub saved_path: Option<PathBuf>,
    /// Compiler stderr (or launch/timeout message). Present only on failure.
    pub error: Option<String>,
}

impl ProbeOutcome {
    fn failed(content: &str, error: String) -> Self {
        Self {
            content: content.to_string(),
            success: false,
            saved_path: None,
            error: Some(error),
        }
    }
}

/// Embed a fragment in the C skeleton.
pub fn render_source(content: &str) -> String {
    format!("{C_PRELUDE}{content}{C_EPILOGUE}")
}

/// Unique per-probe file stem: process id plus a random hex suffix, so
/// concurrent probes (and concurrent harness processes sharing a results
/// directory) never collide on a path.
pub fn unique_stem<R: Rng>(process_id: u32, rng: &mut R) -> String {
    format!("{}_{:08x}", process_id, rng.gen::<u32>())
}

/// Invokes the compiler against generated fragments.
#[derive(Debug, Clone)]
pub struct Prober {
    compiler: String,
    timeout: Duration,
    results_dir: PathBuf,
}

impl Prober {
    /// Create a prober, making sure the results directory exists.
    pub fn new(
        compiler: impl Into<String>,
        timeout: Duration,
        results_dir: impl Into<PathBuf>,
    ) -> io::Result<Self> {
        let results_dir = results_dir.into();
        fs::create_dir_all(&results_dir)?;
        Ok(Self {
            compiler: compiler.into(),
            timeout,
            results_dir,
        })
    }

    /// Directory where accepted sources are kept.
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Write `content` into the skeleton and attempt a compile-only
    /// invocation. Always returns an outcome; never propagates compiler
    /// trouble as an error.
    pub fn probe<R: Rng>(&self, content: &str, rng: &mut R) -> ProbeOutcome {
        let stem = unique_stem(std::process::id(), rng);
        let c_path = self.results_dir.join(format!("{stem}.c"));
        let o_path = self.results_dir.join(format!("{stem}.o"));

        if let Err(e) = fs::write(&c_path, render_source(content)) {
            return ProbeOutcome::failed(content, format!("failed to write source: {e}"));
        }

        let outcome = match self.run_compiler(&c_path) {
            Ok(out) if out.status.success() => ProbeOutcome {
                content: content.to_string(),
                success: true,
                saved_path: Some(c_path.clone()),
                error: None,
            },
            Ok(out) => ProbeOutcome::failed(
                content,
                String::from_utf8_lossy(&out.stderr).into_owned(),
            ),
            Err(e) => {
                tracing::debug!(compiler = %self.compiler, error = %e, "probe aborted");
                ProbeOutcome::failed(content, e.to_string())
            }
        };

        if !outcome.success {
            let _ = fs::remove_file(&c_path);
        }
        // Object files are never kept, even for accepted sources.
        let _ = fs::remove_file(&o_path);

        outcome
    }

    /// Run `<compiler> -c <file>` with the results directory as the child's
    /// working directory, bounded by the configured timeout.
    ///
    /// Both pipes are drained on dedicated threads for the whole lifetime of
    /// the child: a compiler that floods stderr past the OS pipe buffer must
    /// not block on write and turn a plain rejection into a timeout.
    fn run_compiler(&self, source: &Path) -> Result<CompilerOutput, ProbeError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| ProbeError::Io(io::Error::new(io::ErrorKind::InvalidInput, "no file name")))?;

        let mut child = Command::new(&self.compiler)
            .arg("-c")
            .arg(file_name)
            .current_dir(&self.results_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ProbeError::Launch)?;

        let stdout_reader = spawn_drain(child.stdout.take());
        let stderr_reader = spawn_drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait().map_err(ProbeError::Io)? {
                Some(status) => {
                    let _ = stdout_reader.join();
                    let stderr = stderr_reader.join().unwrap_or_default();
                    return Ok(CompilerOutput { status, stderr });
                }
                None if Instant::now() >= deadline => {
                    let _ = send_sigterm(child.id());
                    thread::sleep(TERM_GRACE);
                    if child.try_wait().map_err(ProbeError::Io)?.is_none() {
                        let _ = child.kill();
                    }
                    let _ = child.wait();
                    // Not joined: a surviving grandchild of the killed
                    // compiler can hold the pipe open past our deadline.
                    // The drain threads exit once every writer is gone.
                    drop(stdout_reader);
                    drop(stderr_reader);
                    return Err(ProbeError::Timeout(self.timeout));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        }
    }
}

/// Exit status plus captured stderr of one compiler invocation.
struct CompilerOutput {
    status: ExitStatus,
    stderr: Vec<u8>,
}

/// Drain a child pipe to completion on its own thread.
fn spawn_drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Send SIGTERM to a process. Returns `Err` if the signal could not be
/// delivered (the child may already be gone).
fn send_sigterm(pid: u32) -> Result<(), io::Error> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
