// src/ingest/producer.rs
//! "External producer of raw bytes": the pulsar adapter does not care whether its
//! payload comes from HTTP, a file on disk or a generator script's stdout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::ingest::error::FetchError;
use crate::ingest::fetch::{Expect, SourceLocation, SourceReader};

#[async_trait]
pub trait RawProducer: Send + Sync {
    async fn produce(&self) -> Result<String, FetchError>;
    fn describe(&self) -> String;
}

/// One-shot child process; stdout is the payload.
#[derive(Debug, Clone)]
pub struct CommandProducer {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Duration,
}

impl CommandProducer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            timeout: Duration::from_secs(120),
        }
    }

    /// Run a script through the interpreter its extension implies.
    pub fn for_script(script: &Path, python: &str) -> Self {
        let script_arg = script.display().to_string();
        match script.extension().and_then(|e| e.to_str()) {
            Some("py") => Self::new(python, vec![script_arg]),
            Some("sh") => Self::new("sh", vec![script_arg]),
            _ => Self::new(script_arg, Vec::new()),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion, returning stdout. Non-zero exit is an error.
    pub async fn run(&self) -> Result<String, FetchError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout.as_millis() as u64))??;

        if !output.status.success() {
            tracing::warn!(
                target: "dss",
                program = %self.program,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "producer failed"
            );
            return Err(FetchError::Subprocess {
                program: self.program.clone(),
                status: output.status.to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl RawProducer for CommandProducer {
    async fn produce(&self) -> Result<String, FetchError> {
        self.run().await
    }

    fn describe(&self) -> String {
        format!("command `{} {}`", self.program, self.args.join(" "))
    }
}

/// Remote body, any content type.
pub struct HttpProducer {
    reader: SourceReader,
    url: String,
}

impl HttpProducer {
    pub fn new(reader: SourceReader, url: impl Into<String>) -> Self {
        Self {
            reader,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RawProducer for HttpProducer {
    async fn produce(&self) -> Result<String, FetchError> {
        self.reader.http_get(&self.url, Expect::Any).await
    }

    fn describe(&self) -> String {
        format!("http {}", self.url)
    }
}

/// Local file; when absent everywhere, the generator is run once to create it.
pub struct FileProducer {
    reader: SourceReader,
    path: PathBuf,
    generator: Option<CommandProducer>,
}

impl FileProducer {
    pub fn new(reader: SourceReader, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            generator: None,
        }
    }

    /// The generator runs inside the directory the file should appear in.
    pub fn with_generator(mut self, generator: CommandProducer) -> Self {
        self.generator = Some(generator);
        self
    }
}

#[async_trait]
impl RawProducer for FileProducer {
    async fn produce(&self) -> Result<String, FetchError> {
        match self.reader.read_local(&self.path).await {
            Err(FetchError::NotFound(tried)) => {
                let Some(generator) = &self.generator else {
                    return Err(FetchError::NotFound(tried));
                };
                let target = self.reader.paths().preferred(&self.path);
                let dir = match target.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                tracing::info!(
                    target: "dss",
                    path = %target.display(),
                    generator = %generator.describe(),
                    "local data missing, running generator"
                );
                generator.clone().in_dir(&dir).run().await?;
                self.reader.read_local(&target).await
            }
            other => other,
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Pick the producer a configured location calls for.
pub fn producer_for(
    loc: &SourceLocation,
    reader: &SourceReader,
    python: &str,
    generator: Option<CommandProducer>,
    timeout: Duration,
) -> Box<dyn RawProducer> {
    match loc {
        SourceLocation::Remote(url) => Box::new(HttpProducer::new(reader.clone(), url.clone())),
        SourceLocation::Script(script) => {
            let resolved = reader
                .paths()
                .resolve(script)
                .unwrap_or_else(|_| script.clone());
            Box::new(CommandProducer::for_script(&resolved, python).with_timeout(timeout))
        }
        SourceLocation::LocalFile(path) => {
            let fp = FileProducer::new(reader.clone(), path.clone());
            match generator {
                Some(g) => Box::new(fp.with_generator(g.with_timeout(timeout))),
                None => Box::new(fp),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_follows_extension() {
        let py = CommandProducer::for_script(Path::new("fetch_pulsars.py"), "python3");
        assert_eq!(py.program, "python3");
        assert_eq!(py.args, vec!["fetch_pulsars.py".to_string()]);

        let sh = CommandProducer::for_script(Path::new("gen.sh"), "python3");
        assert_eq!(sh.program, "sh");

        let bin = CommandProducer::for_script(Path::new("./gen"), "python3");
        assert_eq!(bin.program, "./gen");
        assert!(bin.args.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_returned_and_failures_are_typed() {
        let ok = CommandProducer::new("sh", vec!["-c".into(), "echo '[1]'".into()]);
        assert_eq!(ok.run().await.unwrap().trim(), "[1]");

        let bad = CommandProducer::new("sh", vec!["-c".into(), "exit 3".into()]);
        assert_eq!(bad.run().await.unwrap_err().kind(), "subprocess");

        let slow = CommandProducer::new("sh", vec!["-c".into(), "sleep 5".into()])
            .with_timeout(Duration::from_millis(50));
        assert_eq!(slow.run().await.unwrap_err().kind(), "timeout");
    }
}
