//! Execution context handed to the trigger executor.
//!
//! Everything an execution needs from its host -- which run it belongs to
//! and where its log lines go -- is passed in explicitly as plain values.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokentrigger_types::credential::CredentialScope;

/// Identity of the run performing a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    pub job: String,
    pub number: u64,
}

impl RunIdentity {
    pub fn new(job: impl Into<String>, number: u64) -> Self {
        Self {
            job: job.into(),
            number,
        }
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.job, self.number)
    }
}

/// On whose behalf a credential lookup happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupContext {
    /// A job execution. Only sees globally scoped credentials.
    Run(RunIdentity),
    /// The host itself (administration, validation). Sees everything.
    System,
}

impl LookupContext {
    pub fn visible_scopes(&self) -> &'static [CredentialScope] {
        match self {
            LookupContext::Run(_) => &[CredentialScope::Global],
            LookupContext::System => &[CredentialScope::Global, CredentialScope::System],
        }
    }
}

/// Sink for the lines an execution writes to its run log.
pub trait LogSink: Send + Sync {
    fn line(&self, line: &str);

    /// Render `text` linking to `url`. Plain text unless the sink supports links.
    fn hyperlink(&self, url: &str, text: &str) -> String {
        format!("{text} ({url})")
    }
}

/// Log sink that keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl LogSink for MemoryLogSink {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Context for one trigger execution.
#[derive(Clone)]
pub struct ExecutionContext {
    run: RunIdentity,
    log: Arc<dyn LogSink>,
}

impl ExecutionContext {
    pub fn new(run: RunIdentity, log: Arc<dyn LogSink>) -> Self {
        Self { run, log }
    }

    pub fn run(&self) -> &RunIdentity {
        &self.run
    }

    pub fn log(&self) -> &dyn LogSink {
        self.log.as_ref()
    }

    /// Credential lookups made by this execution act on behalf of its run.
    pub fn lookup_context(&self) -> LookupContext {
        LookupContext::Run(self.run.clone())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}
