// Command runner
//
// One `p4` subprocess per call. Builds the argument vector from the
// connection, feeds or drains the marshal stream, classifies each record's
// severity, and always reaps the child before returning -- on the error
// paths too.

use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace, warn};

use crate::connection::Connection;
use crate::error::Error;
use crate::marshal::{self, RecordReader};
use crate::record::{MarshalCode, Record, RecordExt, Severity};

/// Binary looked up on `PATH` when no explicit program is configured.
pub const DEFAULT_PROGRAM: &str = "p4";

/// Makes `p4` read and write marshalled dictionaries.
const WIRE_FLAG: &str = "-G";

/// Text of the diagnostic the server sends when the ticket is gone.
const PASSWORD_INVALID: &str = "Perforce password (P4PASSWD) invalid or unset.";

/// The seam between command operations and the `p4` process.
///
/// [`Runner`] is the real implementation; tests substitute scripted ones.
pub trait Execute {
    /// Run `command` and collect the records at or below `max_severity`.
    ///
    /// With `stdin` set, the record is written to the process and no output
    /// is read; the `-i` form of form-editing commands emits no records.
    fn execute(
        &self,
        connection: &Connection,
        command: &[String],
        stdin: Option<&Record>,
        max_severity: Severity,
    ) -> Result<Vec<Record>, Error>;

    /// Obtain a ticket by feeding `password` to `p4 login`.
    fn login(&self, connection: &Connection, password: &SecretString) -> Result<(), Error>;
}

/// Spawns the `p4` binary, one process per call.
#[derive(Debug, Clone)]
pub struct Runner {
    program: PathBuf,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// A runner using `p4` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// A runner using an explicit binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument vector, program first.
    ///
    /// Order matters: global flags must precede the command name.
    pub fn args(&self, connection: &Connection, command: &[String]) -> Vec<String> {
        let mut args = vec![
            self.program.to_string_lossy().into_owned(),
            WIRE_FLAG.to_owned(),
            "-p".to_owned(),
            connection.port().to_owned(),
        ];
        if let Some(user) = connection.user() {
            args.extend(["-u".to_owned(), user.to_owned()]);
        }
        if let Some(client) = connection.client() {
            args.extend(["-c".to_owned(), client.to_owned()]);
        }
        args.extend(command.iter().cloned());
        args
    }

    /// Run a command. See [`Execute::execute`].
    pub fn run(
        &self,
        connection: &Connection,
        command: &[String],
        stdin: Option<&Record>,
        max_severity: Severity,
    ) -> Result<Vec<Record>, Error> {
        let args = self.args(connection, command);
        debug!(command = %args.join(" "), "running p4");

        let mut process = Command::new(&self.program);
        process.args(&args[1..]).stderr(Stdio::piped());
        if stdin.is_some() {
            process.stdin(Stdio::piped()).stdout(Stdio::null());
        } else {
            process.stdin(Stdio::null()).stdout(Stdio::piped());
        }

        let mut guard = self.spawn(&mut process)?;

        let mut records = Vec::new();
        let mut write_result = Ok(());
        if let Some(input) = stdin {
            let payload = marshal::encode(input)?;
            if let Some(mut pipe) = guard.take_stdin() {
                write_result = pipe.write_all(&payload);
            }
        } else if let Some(stdout) = guard.take_stdout() {
            for item in RecordReader::new(BufReader::new(stdout)) {
                let record = item?;
                trace!(code = record.get("code").map(String::as_str), "decoded record");

                if record.code() == Some(MarshalCode::Error) && record.severity() > max_severity {
                    let message = record.message().to_owned();
                    warn!(severity = ?record.severity(), %message, "p4 reported an error");
                    if message == PASSWORD_INVALID {
                        return Err(Error::SessionExpired);
                    }
                    return Err(Error::CommandExecution {
                        message,
                        command: args,
                        record: Some(record),
                    });
                }
                records.push(record);
            }
        }

        let stderr = guard.finish()?;
        if !stderr.is_empty() {
            return Err(Error::CommandExecution {
                message: String::from_utf8_lossy(&stderr).trim().to_owned(),
                command: args,
                record: None,
            });
        }
        write_result?;

        Ok(records)
    }

    /// Log in. See [`Execute::login`].
    ///
    /// Uses the plain (non-marshal) protocol: the password goes to stdin as
    /// is, and only stderr is inspected.
    pub fn login(&self, connection: &Connection, password: &SecretString) -> Result<(), Error> {
        let mut args = vec!["-p".to_owned(), connection.port().to_owned()];
        if let Some(user) = connection.user() {
            args.extend(["-u".to_owned(), user.to_owned()]);
        }
        args.push("login".to_owned());
        debug!(port = connection.port(), user = ?connection.user(), "logging in");

        let mut process = Command::new(&self.program);
        process
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut guard = self.spawn(&mut process)?;
        let write_result = match guard.take_stdin() {
            Some(mut pipe) => pipe.write_all(password.expose_secret().as_bytes()),
            None => Ok(()),
        };

        let stderr = guard.finish()?;
        if !stderr.is_empty() {
            return Err(Error::Authentication {
                message: String::from_utf8_lossy(&stderr).trim().to_owned(),
            });
        }
        write_result?;

        debug!("login successful");
        Ok(())
    }

    fn spawn(&self, process: &mut Command) -> Result<ChildGuard, Error> {
        let child = process.spawn().map_err(|source| Error::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        Ok(ChildGuard::new(child))
    }
}

impl Execute for Runner {
    fn execute(
        &self,
        connection: &Connection,
        command: &[String],
        stdin: Option<&Record>,
        max_severity: Severity,
    ) -> Result<Vec<Record>, Error> {
        self.run(connection, command, stdin, max_severity)
    }

    fn login(&self, connection: &Connection, password: &SecretString) -> Result<(), Error> {
        Runner::login(self, connection, password)
    }
}

// ── Process guard ────────────────────────────────────────────────────

/// Owns a running child. Dropping it without [`finish`](Self::finish)
/// closes the pipes, kills the process, and reaps it.
struct ChildGuard {
    child: Child,
    stderr: Option<JoinHandle<io::Result<Vec<u8>>>>,
    reaped: bool,
}

impl ChildGuard {
    fn new(mut child: Child) -> Self {
        // Drained on its own thread so a chatty stderr cannot stall stdout.
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).map(|_| buf)
            })
        });
        Self {
            child,
            stderr,
            reaped: false,
        }
    }

    fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Close stdin, wait for exit, and return everything written to stderr.
    fn finish(&mut self) -> Result<Vec<u8>, Error> {
        drop(self.child.stdin.take());
        let status = self.child.wait()?;
        self.reaped = true;
        if !status.success() {
            debug!(%status, "p4 exited unsuccessfully");
        }
        self.join_stderr()
    }

    fn join_stderr(&mut self) -> Result<Vec<u8>, Error> {
        match self.stderr.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::Io(io::Error::other("stderr reader panicked")))?
                .map_err(Error::Io),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        drop(self.child.stdin.take());
        drop(self.child.stdout.take());
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        let _ = self.join_stderr();
    }
}
