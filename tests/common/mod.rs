//! Stub solvers and compilers for integration tests.
//!
//! Every stub is a small shell script placed in a fresh temporary
//! directory laid out the way the pipeline expects.

#![allow(dead_code)]

use heatrun::config::ResultLayout;
use heatrun::plot::RenderOptions;
use heatrun::RunConfig;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const METHOD: &str = "gauss";

/// Prints the same header the gauss solver prints, then a 2 x 2 grid.
pub const GOOD_SOLVER: &str = r#"#!/bin/sh
echo "$1 $2 $3"
echo "iter = 5  difmax = 0.001"
echo ""
echo "1.0 2.0 "
echo "3.0 4.0 "
"#;

/// Writes partial output, then fails.
pub const FAILING_SOLVER: &str = r#"#!/bin/sh
echo "$1 $2 $3"
echo "partial"
exit 1
"#;

pub const GARBAGE_SOLVER: &str = r#"#!/bin/sh
echo "$1 $2 $3"
echo "iter = 1  difmax = 0"
echo ""
echo "1.0 2.0"
echo "nan? 4.0"
"#;

/// A valid header followed by a byte that is not UTF-8.
pub const BINARY_SOLVER: &str = r#"#!/bin/sh
echo "$1 $2 $3"
echo "iter = 1  difmax = 0"
echo ""
printf '1.0 \377\n'
"#;

pub const SLEEPING_SOLVER: &str = r#"#!/bin/sh
exec sleep 30
"#;

pub const KILLED_SOLVER: &str = r#"#!/bin/sh
kill -9 $$
"#;

/// Copies the "source" to the `-o` target, like a compiler would.
pub const COPY_COMPILER: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) src="$1"; shift ;;
  esac
done
cp "$src" "$out" && chmod 755 "$out"
"#;

pub const BROKEN_COMPILER: &str = r#"#!/bin/sh
echo "syntax error" >&2
exit 2
"#;

pub fn write_script(path: &Path, body: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Small, fast rendering for tests.
pub fn test_render_options() -> RenderOptions {
    RenderOptions {
        dpi: 40,
        ..Default::default()
    }
}

/// A configuration rooted in a new temporary directory.
pub fn rooted_config(rows: usize, cols: usize) -> (TempDir, RunConfig) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RunConfig::new(METHOD, rows, cols, 0.01).unwrap();
    config.layout = ResultLayout::rooted(dir.path());
    config.render = test_render_options();
    (dir, config)
}

/// Install `body` as the prebuilt solver for `config`.
pub fn install_solver(config: &RunConfig, body: &str) -> PathBuf {
    let exe = config.executable_path();
    write_script(&exe, body);
    exe
}
