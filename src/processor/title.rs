use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use super::structure::HeadingClassifier;

pub const TITLE_PREVIEW_CHARS: usize = 200;

const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub trait TitleResolver: Send + Sync {
    fn resolve(&self, preview: &str) -> Result<String>;
}

pub fn title_preview(first_page: &str) -> String {
    let head = first_page.chars().take(TITLE_PREVIEW_CHARS).collect::<String>();
    format!("{head}...")
}

pub fn resolve_title(resolver: Arc<dyn TitleResolver>, preview: String, timeout: Duration) -> String {
    let (sender, receiver) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("title-resolver".to_string())
        .spawn(move || {
            let _ = sender.send(resolver.resolve(&preview));
        });

    if let Err(err) = spawned {
        warn!(error = %err, "failed to start title resolver; continuing without title");
        return String::new();
    }

    match receiver.recv_timeout(timeout) {
        Ok(Ok(answer)) => {
            let title = first_title_line(&answer);
            if title.is_empty() {
                warn!("title resolver returned an empty answer");
            } else {
                debug!(title = %title, "resolved instrument title");
            }
            title
        }
        Ok(Err(err)) => {
            warn!(error = %err, "title resolution failed; continuing without title");
            String::new()
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "title resolution timed out; continuing without title"
            );
            String::new()
        }
        Err(RecvTimeoutError::Disconnected) => {
            warn!("title resolver stopped without an answer; continuing without title");
            String::new()
        }
    }
}

fn first_title_line(answer: &str) -> String {
    answer
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoTitleResolver;

impl TitleResolver for NoTitleResolver {
    fn resolve(&self, _preview: &str) -> Result<String> {
        Ok(String::new())
    }
}

#[derive(Debug)]
pub struct HeadingTitleResolver {
    classifier: HeadingClassifier,
}

impl HeadingTitleResolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: HeadingClassifier::new()?,
        })
    }
}

impl TitleResolver for HeadingTitleResolver {
    fn resolve(&self, preview: &str) -> Result<String> {
        let preview = preview.strip_suffix("...").unwrap_or(preview);

        let title = preview
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| !line.starts_with('[') && !line.starts_with('<'))
            .filter(|line| !line.chars().all(|character| character.is_ascii_digit()))
            .find(|line| !self.classifier.is_hierarchy_line(line))
            .unwrap_or("");

        Ok(title.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CommandTitleResolver {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTitleResolver {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn wait_until_deadline(&self, child: &mut Child) -> Result<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to poll title command {}", self.program))?
            {
                return Ok(status);
            }

            if Instant::now() >= deadline {
                if let Err(err) = child.kill() {
                    warn!(error = %err, program = %self.program, "failed to kill title command");
                }
                child
                    .wait()
                    .with_context(|| format!("failed to reap title command {}", self.program))?;
                bail!(
                    "title command {} timed out after {} ms",
                    self.program,
                    self.timeout.as_millis()
                );
            }

            thread::sleep(COMMAND_POLL_INTERVAL);
        }
    }
}

impl TitleResolver for CommandTitleResolver {
    fn resolve(&self, preview: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to start title command {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(preview.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err)
                    .with_context(|| format!("failed to send preview to {}", self.program));
            }
        }

        let status = self.wait_until_deadline(&mut child)?;

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_string(&mut stdout)
                .with_context(|| format!("failed to read output of {}", self.program))?;
        }

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            bail!(
                "title command {} returned non-zero exit status: {}",
                self.program,
                stderr.trim()
            );
        }

        Ok(stdout.trim().to_string())
    }
}
