//! How the packaging tool gets started on this host.
//!
//! Package-manager entry points such as `npx` are `.cmd` shims on Windows,
//! which `CreateProcess` cannot start on its own. Hosts with that limitation
//! launch the tool through the command interpreter; everywhere else the tool
//! is exec'd directly with the argument vector untouched.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::process::Command;

/// What the host's process-launching facility can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Script shims must be started through a shell.
    pub requires_shell_launch: bool,
}

impl HostCapabilities {
    pub fn detect() -> Self {
        Self {
            requires_shell_launch: cfg!(windows),
        }
    }
}

/// Launch method for the child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Exec the program with its arguments as-is.
    Direct,
    /// Hand a single command line to a shell: `<program> <flags...> "<line>"`.
    Shell {
        program: String,
        flags: Vec<String>,
    },
}

impl LaunchStrategy {
    pub fn for_host() -> Self {
        Self::for_capabilities(HostCapabilities::detect())
    }

    pub fn for_capabilities(caps: HostCapabilities) -> Self {
        if caps.requires_shell_launch {
            Self::windows_shell()
        } else {
            Self::Direct
        }
    }

    /// `cmd.exe /d /s /c`: skip AutoRun, keep the quoted line intact.
    pub fn windows_shell() -> Self {
        Self::Shell {
            program: "cmd".to_string(),
            flags: vec!["/d".into(), "/s".into(), "/c".into()],
        }
    }

    /// Build the `Command` for `program args...`. Stdio is left at the
    /// default, so a `status()` call inherits the parent's streams.
    pub fn command<S: AsRef<str>>(&self, program: &str, args: &[S]) -> Command {
        match self {
            Self::Direct => {
                let mut cmd = Command::new(program);
                cmd.args(args.iter().map(|a| OsStr::new(a.as_ref())));
                cmd
            }
            Self::Shell {
                program: shell,
                flags,
            } => {
                let mut cmd = Command::new(shell);
                cmd.args(flags);
                push_shell_line(&mut cmd, &cmd_line(program, args));
                cmd
            }
        }
    }

    /// What would be launched, rendered for humans (`--dry-run`, logs).
    pub fn display<S: AsRef<str>>(&self, program: &str, args: &[S]) -> String {
        match self {
            Self::Direct => display_line(program, args),
            Self::Shell {
                program: shell,
                flags,
            } => format!("{shell} {} \"{}\"", flags.join(" "), cmd_line(program, args)),
        }
    }
}

// `/s /c` strips exactly one pair of outer quotes, so the line goes through
// verbatim; std's own argument quoting would escape the inner quotes.
#[cfg(windows)]
fn push_shell_line(cmd: &mut Command, line: &str) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(format!("\"{line}\""));
}

#[cfg(not(windows))]
fn push_shell_line(cmd: &mut Command, line: &str) {
    cmd.arg(line);
}

/// Single-line rendering of `program args...`, quoted for a POSIX shell.
pub fn display_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    shell_words::join(std::iter::once(program).chain(args.iter().map(|a| a.as_ref())))
}

/// Single line for `cmd.exe`, each word quoted by [`cmd_quote`].
pub fn cmd_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(|a| a.as_ref()))
        .map(cmd_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

const CMD_SPECIAL: &[char] = &['"', '&', '|', '<', '>', '^', '(', ')', '%', '!', ',', ';', '='];

/// Quote one word for `cmd.exe` and the MSVC argv parser behind it.
///
/// Words without whitespace or cmd metacharacters pass through untouched, so
/// `dist\gma2-workers-v1.2.3.lua` stays as-is. Others are wrapped in double
/// quotes; embedded quotes become `\"` and backslashes in front of a quote
/// are doubled. `%` inside quotes is still expanded by cmd.
pub fn cmd_quote(word: &str) -> Cow<'_, str> {
    let needs_quotes = word.is_empty()
        || word
            .chars()
            .any(|c| c.is_whitespace() || CMD_SPECIAL.contains(&c));
    if !needs_quotes {
        return Cow::Borrowed(word);
    }

    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for c in word.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            _ => {
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat_n('\\', backslashes * 2));
    out.push('"');
    Cow::Owned(out)
}
