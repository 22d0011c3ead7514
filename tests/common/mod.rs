//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tempfile::TempDir;

/// Stands in for `cargo`: records its arguments, then either fails or writes
/// a `bootstrap` script where `cargo lambda build` would put the binary.
///
/// Behaviour is steered through the build environment:
/// - `STUB_FAIL` set: print diagnostics to both streams and exit 101
/// - `STUB_TARGET_DIR`: directory to write to instead of `./target`
/// - `STUB_SKIP_OUTPUT` set: succeed without producing a binary
/// - `STUB_HANG`: fork a background job that touches this path after a
///   second, then wait for it
const STUB_CARGO: &str = r#"#!/bin/sh
echo "$@" > .last-cargo-args
bin=""
while [ $# -gt 0 ]; do
  if [ "$1" = "--bin" ]; then
    bin="$2"
    shift
  fi
  shift
done

if [ -n "$STUB_HANG" ]; then
  (sleep 1; touch "$STUB_HANG") &
  wait
fi

if [ -n "$STUB_FAIL" ]; then
  echo "error[E0425]: cannot find value \`x\` in this scope" >&2
  echo "error: could not compile \`$bin\`"
  exit 101
fi

if [ -n "$STUB_SKIP_OUTPUT" ]; then
  exit 0
fi

target="${STUB_TARGET_DIR:-target}"
mkdir -p "$target/lambda/$bin"
cat > "$target/lambda/$bin/bootstrap" <<SCRIPT
#!/bin/sh
echo "$bin listening on \$AWS_LAMBDA_RUNTIME_API"
echo "$bin warning" >&2
SCRIPT
chmod 755 "$target/lambda/$bin/bootstrap"
echo "Finished release [optimized] target(s)"
"#;

static STUB_DIR: OnceLock<TempDir> = OnceLock::new();

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Path of the stub cargo program, written once per test binary
pub fn stub_cargo() -> PathBuf {
    let dir = STUB_DIR.get_or_init(|| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cargo");
        fs::write(&path, STUB_CARGO).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        dir
    });
    dir.path().join("cargo")
}

/// A cargo project with an `orders` bin requiring two features and a
/// `health` bin requiring none
pub fn create_project(root: &Path) {
    fs::create_dir_all(root.join("src/bin")).unwrap();
    fs::write(
        root.join("Cargo.toml"),
        r#"[package]
name = "functions"
version = "0.1.0"
edition = "2021"

[features]
default = ["tracing"]
tracing = []
db = []
queue = []

[[bin]]
name = "orders"
path = "src/bin/orders.rs"
required-features = ["db", "queue"]

[[bin]]
name = "health"
path = "src/bin/health.rs"
"#,
    )
    .unwrap();
    fs::write(root.join("src/bin/orders.rs"), "fn main() {}\n").unwrap();
    fs::write(root.join("src/bin/health.rs"), "fn main() {}\n").unwrap();
}

pub fn last_cargo_args(project: &Path) -> String {
    fs::read_to_string(project.join(".last-cargo-args"))
        .unwrap()
        .trim_end()
        .to_string()
}
