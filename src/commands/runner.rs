use crate::analysis::test_output::TestRunTally;
use crate::error::{PipelineError, Result};
use crate::models::test_summary::{TestCountMode, TestSummary};
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Run a tool with inherited stdio and wait for it. A non-zero exit status is
/// logged, not returned as an error.
pub async fn run_standard_command<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    dir: &Path,
) -> Result<ExitStatus> {
    log::info!("Running {program} in {}", dir.display());
    let status = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|source| process_error(program, source))?;

    log_exit(program, status);
    Ok(status)
}

/// Run the build tool's test goal, echoing its output while tallying every
/// `Tests run:` line on stdout.
pub async fn run_test_command<S: AsRef<OsStr>>(
    program: &str,
    args: &[S],
    dir: &Path,
    mode: TestCountMode,
) -> Result<TestSummary> {
    log::info!("Running tests with {program} in {}", dir.display());
    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| process_error(program, source))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| process_error(program, io::Error::other("stdout not captured")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| process_error(program, io::Error::other("stderr not captured")))?;

    let mut tally = TestRunTally::new()?;
    let stdout_task = tokio::spawn(async move {
        for_each_line(stdout, |line| {
            println!("{line}");
            tally.observe(line);
        })
        .await?;
        Ok::<_, io::Error>(tally)
    });
    let stderr_task = tokio::spawn(for_each_line(stderr, |line| eprintln!("{line}")));

    let (stdout_result, stderr_result) = tokio::join!(stdout_task, stderr_task);
    let tally = stdout_result
        .map_err(|e| process_error(program, io::Error::other(e)))?
        .map_err(|source| process_error(program, source))?;
    if let Err(e) = stderr_result.map_err(io::Error::other).and_then(|r| r) {
        log::warn!("Lost stderr of {program}: {e}");
    }

    let status = child
        .wait()
        .await
        .map_err(|source| process_error(program, source))?;
    log_exit(program, status);

    Ok(tally.finish(mode))
}

/// Feed every line of `stream` to `handle`, lossily decoded.
async fn for_each_line<R, F>(stream: R, mut handle: F) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut segments = BufReader::new(stream).split(b'\n');
    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment);
        handle(line.trim_end_matches('\r'));
    }
    Ok(())
}

fn log_exit(program: &str, status: ExitStatus) {
    match status.code() {
        Some(0) => log::info!("{program} exited with code 0"),
        Some(code) => log::warn!("{program} exited with code {code}"),
        None => log::warn!("{program} was terminated by a signal"),
    }
}

fn process_error(program: &str, source: io::Error) -> PipelineError {
    PipelineError::Process {
        program: program.to_string(),
        source,
    }
}
