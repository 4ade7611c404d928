//! Output artifact naming.
//!
//! The bundle lands at `<out_dir>/<prefix><version>.<extension>`. Nothing
//! here touches the filesystem: the packaging tool writes the file, and the
//! directory is not created in advance.

use std::path::{Path, PathBuf};

/// File name of the bundle, e.g. `gma2-workers-v1.2.3.lua`.
pub fn file_name(prefix: &str, version: &str, extension: &str) -> String {
    format!("{prefix}{version}.{extension}")
}

/// Path the packaging tool is told to write to.
pub fn output_path(
    out_dir: impl AsRef<Path>,
    prefix: &str,
    version: &str,
    extension: &str,
) -> PathBuf {
    out_dir
        .as_ref()
        .join(file_name(prefix, version, extension))
}
