//! Bulk loading through `dgraph live`.
//!
//! The loader is an external process. Its stdout is relayed line by line to
//! the log; stderr lines are relayed as warnings. Output is relayed byte-wise
//! until EOF, with invalid UTF-8 replaced, so the pipes never close early.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use ecargraph_config::AppConfig;
use ecargraph_core::{Error, GraphError, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Invocation settings for the live loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveLoader {
    binary: String,
    alpha: String,
    zero: String,
    xidmap: PathBuf,
    format: String,
}

/// What a finished load reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub stdout_lines: usize,
    pub stderr_lines: usize,
}

impl LiveLoader {
    pub fn new(
        binary: impl Into<String>,
        alpha: impl Into<String>,
        zero: impl Into<String>,
        xidmap: impl Into<PathBuf>,
    ) -> Self {
        Self {
            binary: binary.into(),
            alpha: alpha.into(),
            zero: zero.into(),
            xidmap: xidmap.into(),
            format: "rdf".into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.loader.binary.clone(),
            config.alpha.clone(),
            config.zero.clone(),
            config.loader.xidmap.clone(),
        )
        .with_format(config.loader.format.clone())
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Arguments passed to the loader for `file`.
    pub fn command_args(&self, file: &Path) -> Vec<String> {
        vec![
            "live".into(),
            "-f".into(),
            file.display().to_string(),
            format!("--format={}", self.format),
            format!("--xidmap={}", self.xidmap.display()),
            format!("--alpha={}", self.alpha),
            format!("--zero={}", self.zero),
        ]
    }

    /// Run the loader on `file` and wait for it to finish.
    ///
    /// Cancelling `cancel` kills the child and returns [`Error::Cancelled`].
    pub async fn load(&self, file: &Path, cancel: &CancellationToken) -> Result<LoadReport> {
        let args = self.command_args(file);
        debug!(binary = %self.binary, args = ?args, "Starting bulk loader");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GraphError::LoaderSpawn {
                binary: self.binary.clone(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let run = async {
            let (stdout_lines, stderr_lines) =
                tokio::join!(relay(stdout, log_stdout), relay(stderr, log_stderr));
            let status = child.wait().await;
            (stdout_lines, stderr_lines, status)
        };

        let (stdout_lines, stderr_lines, status) = tokio::select! {
            result = run => result,
            _ = cancel.cancelled() => {
                warn!(file = %file.display(), "Bulk load cancelled, stopping loader");
                return Err(Error::Cancelled);
            }
        };

        let status = status.map_err(|e| GraphError::LoaderFailed {
            status: e.to_string(),
        })?;
        if !status.success() {
            return Err(GraphError::LoaderFailed {
                status: status.to_string(),
            }
            .into());
        }

        info!(file = %file.display(), lines = stdout_lines, "Bulk load finished");
        Ok(LoadReport {
            stdout_lines,
            stderr_lines,
        })
    }
}

fn log_stdout(line: &str) {
    info!(target: "ecargraph::loader", "{line}");
}

fn log_stderr(line: &str) {
    warn!(target: "ecargraph::loader", "{line}");
}

/// Forward every line of `stream` to `emit` until EOF; returns the line count.
async fn relay<R>(stream: Option<R>, emit: fn(&str)) -> usize
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return 0;
    };
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                emit(line.trim_end_matches(['\n', '\r']));
                count += 1;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "Loader output unreadable");
                break;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(binary: &str) -> LiveLoader {
        LiveLoader::new(binary, "alpha:9080", "zero:6080", "xid_uid")
    }

    #[test]
    fn args_follow_live_loader_flags() {
        let args = loader("dgraph").command_args(Path::new("events.json.txt"));
        assert_eq!(
            args,
            vec![
                "live",
                "-f",
                "events.json.txt",
                "--format=rdf",
                "--xidmap=xid_uid",
                "--alpha=alpha:9080",
                "--zero=zero:6080",
            ]
        );
    }

    #[test]
    fn from_config_uses_loader_section() {
        let mut config = AppConfig::default();
        config.loader.binary = "/opt/dgraph/bin/dgraph".into();
        config.loader.format = "json".into();
        let loader = LiveLoader::from_config(&config);
        assert_eq!(loader.binary(), "/opt/dgraph/bin/dgraph");
        let args = loader.command_args(Path::new("f"));
        assert!(args.contains(&"--format=json".to_string()));
        assert!(args.contains(&"--alpha=localhost:9080".to_string()));
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let err = loader("ecargraph-no-such-loader")
            .load(Path::new("f.txt"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Graph(GraphError::LoaderSpawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_relayed() {
        // `echo` prints its arguments as one line and exits 0.
        let report = loader("echo")
            .load(Path::new("f.txt"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.stdout_lines, 1);
        assert_eq!(report.stderr_lines, 0);
    }

    #[tokio::test]
    async fn relay_survives_invalid_utf8() {
        let bytes: &[u8] = b"ok\n\xff\xfe bad\nlast line without newline";
        assert_eq!(relay(Some(bytes), log_stdout).await, 3);
        assert_eq!(relay(None::<&[u8]>, log_stdout).await, 0);
    }

    /// Writes a shell script standing in for the loader.
    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-loader");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_output_does_not_break_the_load() {
        let dir = tempfile::tempdir().unwrap();
        // Enough output after the bad bytes to fill a pipe buffer several times.
        let binary = script(
            dir.path(),
            r#"printf '\377\377\n'
printf '\377 warn\n' >&2
i=0
while [ $i -lt 20000 ]; do echo "progress line $i"; i=$((i+1)); done
exit 0"#,
        );

        let report = loader(&binary)
            .load(Path::new("f.txt"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.stdout_lines, 20001);
        assert_eq!(report.stderr_lines, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_loader_is_reported() {
        let err = loader("false")
            .load(Path::new("f.txt"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Graph(GraphError::LoaderFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancelled_load_returns_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        // `yes` never exits on its own.
        let err = loader("yes")
            .load(Path::new("f.txt"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
