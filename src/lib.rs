pub mod artifact;
pub mod config;
pub mod invoke;
pub mod launch;
pub mod manifest;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing_subscriber::EnvFilter;

use config::{Overrides, PackConfig};
use invoke::PackInvocation;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "PACK_LOG";

/// Command-line interface. Running with no arguments packs the project in
/// the current directory.
#[derive(Parser, Debug)]
#[command(
    name = "pack",
    version,
    about = "Bundle the project with luapack into dist/<prefix><version>.lua"
)]
pub struct Cli {
    /// Project directory holding the manifest, pack.toml and the luapack config
    #[arg(short = 'C', long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Use the prefix of a `[targets.<name>]` entry in pack.toml
    #[arg(long, env = "PACK_TARGET")]
    pub target: Option<String>,

    /// Output file name prefix (overrides pack.toml and --target)
    #[arg(long, env = "PACK_PREFIX")]
    pub prefix: Option<String>,

    /// Packaging program to launch instead of `npx`
    #[arg(long, env = "PACK_TOOL")]
    pub tool: Option<String>,

    /// Print the command that would run, then exit without running it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            target: self.target.clone(),
            prefix: self.prefix.clone(),
            tool: self.tool.clone(),
        }
    }
}

static LONG_VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{}\nbuilt: {}\ntarget: {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown"),
    )
});

/// Parse process arguments, exiting on `--help`, `--version` or usage errors.
pub fn parse_cli() -> Cli {
    let matches = Cli::command()
        .long_version(LONG_VERSION.as_str())
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Load `<project_dir>/.env`; variables already set in the environment win.
/// Returns whether a file was found.
pub fn load_project_env(project_dir: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(project_dir.join(".env")) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Install the stderr tracing subscriber. `PACK_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time()
        .with_target(false)
        .try_init();
}

/// Resolve everything, run the packaging tool, and return the exit code to
/// terminate with.
pub fn run(cli: &Cli) -> Result<i32> {
    let invocation = resolve(cli)?;

    if cli.dry_run {
        println!("{}", invocation.display_line());
        return Ok(0);
    }

    let status = invocation.run()?;
    Ok(invoke::exit_code(&status))
}

/// Build the invocation for `cli` without starting anything.
pub fn resolve(cli: &Cli) -> Result<PackInvocation> {
    let mut config = PackConfig::load(&cli.project_dir)?;
    config.apply_overrides(&cli.overrides())?;

    let manifest_path = cli.project_dir.join(&config.manifest);
    let version = manifest::read_version(&manifest_path)
        .with_context(|| format!("reading version for {}", cli.project_dir.display()))?;

    Ok(PackInvocation::new(&config, &version).with_working_dir(&cli.project_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn cli_for(dir: &Path, extra: &[&str]) -> Cli {
        let mut argv = vec!["pack", "-C", dir.to_str().unwrap()];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn zero_arguments_is_valid() {
        let cli = Cli::try_parse_from(["pack"]).unwrap();
        assert_eq!(cli.project_dir, PathBuf::from("."));
        assert!(!cli.dry_run);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_builds_default_invocation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version":"1.2.3"}"#).unwrap();

        let inv = resolve(&cli_for(dir.path(), &[])).unwrap();
        assert_eq!(inv.program, "npx");
        assert_eq!(
            inv.output_path,
            Path::new("dist").join("gma2-workers-v1.2.3.lua")
        );
        assert_eq!(inv.working_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn resolve_applies_target_then_prefix_flag() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version":"2.0.0"}"#).unwrap();
        fs::write(
            dir.path().join("pack.toml"),
            "[targets.onpc]\nprefix = \"gma2-onpc-v\"\n",
        )
        .unwrap();

        let inv = resolve(&cli_for(dir.path(), &["--target", "onpc"])).unwrap();
        assert_eq!(inv.output_path, Path::new("dist").join("gma2-onpc-v2.0.0.lua"));

        let inv = resolve(&cli_for(dir.path(), &["--target", "onpc", "--prefix", "x-"])).unwrap();
        assert_eq!(inv.output_path, Path::new("dist").join("x-2.0.0.lua"));
    }

    #[test]
    fn resolve_reports_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = resolve(&cli_for(dir.path(), &[])).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("reading version"), "message: {msg}");
        assert!(msg.contains("package.json"), "message: {msg}");
    }

    #[test]
    fn project_env_is_optional() {
        let dir = TempDir::new().unwrap();
        assert!(!load_project_env(dir.path()).unwrap());
    }

    #[test]
    fn project_env_is_loaded_from_project_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".env"),
            "PACK_UNIT_DOTENV_7C2E=from-project\n",
        )
        .unwrap();
        assert!(load_project_env(dir.path()).unwrap());
        assert_eq!(
            std::env::var("PACK_UNIT_DOTENV_7C2E").as_deref(),
            Ok("from-project")
        );
    }

    #[test]
    fn dry_run_does_not_spawn() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"version":"1.0.0"}"#).unwrap();
        let cli = cli_for(
            dir.path(),
            &["--dry-run", "--tool", "definitely-not-a-real-packaging-tool-5f1c"],
        );
        assert_eq!(run(&cli).unwrap(), 0);
    }
}
