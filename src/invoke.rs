//! Running the packaging tool and turning its status into ours.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

use crate::artifact;
use crate::config::PackConfig;
use crate::launch::LaunchStrategy;

/// Exit code used when the child ended without a numeric status.
pub const FALLBACK_EXIT_CODE: i32 = 1;

#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// One fully resolved tool invocation.
#[derive(Debug, Clone)]
pub struct PackInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub output_path: PathBuf,
    /// Working directory for the child; `None` inherits ours.
    pub working_dir: Option<PathBuf>,
    pub strategy: LaunchStrategy,
}

impl PackInvocation {
    /// `<tool> <tool_args...> <config_flag> <config_file> <output_flag> <output_path>`
    pub fn new(config: &PackConfig, version: &str) -> Self {
        let output_path = artifact::output_path(
            &config.out_dir,
            &config.prefix,
            version,
            &config.extension,
        );
        let mut args = config.tool_args.clone();
        args.extend([
            config.config_flag.clone(),
            config.config_file.clone(),
            config.output_flag.clone(),
            output_path.to_string_lossy().into_owned(),
        ]);
        Self {
            program: config.tool.clone(),
            args,
            output_path,
            working_dir: None,
            strategy: LaunchStrategy::for_host(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_strategy(mut self, strategy: LaunchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The command as it will actually be launched on this host.
    pub fn display_line(&self) -> String {
        self.strategy.display(&self.program, &self.args)
    }

    /// Start the tool with inherited stdio and block until it exits.
    /// No timeout: a hung tool hangs the invoker.
    pub fn run(&self) -> Result<ExitStatus, InvokeError> {
        let mut cmd = self.strategy.command(&self.program, &self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(
            program = %self.program,
            output = %self.output_path.display(),
            cwd = %self.working_dir.as_deref().unwrap_or(Path::new(".")).display(),
            line = %self.display_line(),
            "starting packaging tool"
        );

        let status = cmd.status().map_err(|source| InvokeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if status.success() {
            tracing::debug!(output = %self.output_path.display(), "packaging tool finished");
        } else {
            tracing::info!(
                program = %self.program,
                code = ?status.code(),
                "packaging tool failed"
            );
        }
        Ok(status)
    }
}

/// Our exit code for a finished child: `0` on success, otherwise the child's
/// code, or [`FALLBACK_EXIT_CODE`] when there is none (killed by a signal).
pub fn exit_code(status: &ExitStatus) -> i32 {
    if status.success() {
        return 0;
    }
    match status.code() {
        Some(0) | None => FALLBACK_EXIT_CODE,
        Some(code) => code,
    }
}
