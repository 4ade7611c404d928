use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Stand-in for `npx luapack`: records argv and cwd, writes the bundle,
/// then exits with `$FAKE_PACK_EXIT` or kills itself with `$FAKE_PACK_SIGNAL`.
const FAKE_TOOL: &str = r#"#!/bin/sh
printf '%s\n' "$@" > pack-args.txt
pwd > pack-cwd.txt
echo "fake-luapack: bundling"
echo "fake-luapack: diagnostics" >&2
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--output" ]; then out="$2"; fi
  shift
done
if [ -n "$FAKE_PACK_SIGNAL" ]; then
  kill -"$FAKE_PACK_SIGNAL" $$
fi
if [ -n "$out" ]; then
  mkdir -p "$(dirname "$out")"
  echo "-- bundled" > "$out"
fi
exit "${FAKE_PACK_EXIT:-0}"
"#;

pub const FAKE_TOOL_NAME: &str = "fake-luapack.sh";

/// Temporary project with a manifest, a luapack config and a `pack.toml`
/// pointing at the fake tool.
#[allow(dead_code)]
pub struct Project {
    _tmp: TempDir,
    pub root: PathBuf,
}

#[allow(dead_code)]
impl Project {
    pub fn new(version: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().join("workers");
        fs::create_dir_all(&root).expect("create project dir");

        fs::write(
            root.join("package.json"),
            serde_json::json!({
                "name": "gma2-workers",
                "version": version,
                "scripts": {"pack": "pack"}
            })
            .to_string(),
        )
        .expect("write package.json");
        fs::write(root.join("luapack.config.json"), r#"{"entry":"src/main.lua"}"#)
            .expect("write luapack config");
        fs::write(root.join(FAKE_TOOL_NAME), FAKE_TOOL).expect("write fake tool");

        let project = Self { _tmp: tmp, root };
        project.write_pack_toml("");
        project
    }

    /// Rewrite `pack.toml`; `extra` is appended after the tool section.
    pub fn write_pack_toml(&self, extra: &str) {
        let body = format!(
            "[pack]\ntool = \"sh\"\ntool_args = [\"{FAKE_TOOL_NAME}\"]\n{extra}"
        );
        fs::write(self.root.join("pack.toml"), body).expect("write pack.toml");
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Arguments the fake tool received, excluding the script name.
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(self.path("pack-args.txt"))
            .expect("fake tool ran")
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn recorded_cwd(&self) -> PathBuf {
        let raw = fs::read_to_string(self.path("pack-cwd.txt")).expect("fake tool ran");
        PathBuf::from(raw.trim())
    }

    pub fn tool_ran(&self) -> bool {
        self.path("pack-args.txt").exists()
    }
}

/// The `pack` binary with no inherited `PACK_*` settings.
pub fn pack_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pack"));
    for key in ["PACK_PREFIX", "PACK_TARGET", "PACK_TOOL", "PACK_LOG"] {
        cmd.env_remove(key);
    }
    cmd.env_remove("FAKE_PACK_EXIT").env_remove("FAKE_PACK_SIGNAL");
    cmd
}

/// `pack -C <project>`.
pub fn pack_in(project: &Path) -> Command {
    let mut cmd = pack_cmd();
    cmd.arg("-C").arg(project);
    cmd
}
