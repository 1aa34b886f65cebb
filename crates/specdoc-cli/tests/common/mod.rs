#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variables that would leak host configuration into a run.
const SCRUBBED_ENV: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "SPECDOC_OUTPUT",
    "SPECDOC_FILES_PER_BATCH",
    "SPECDOC_MAX_CHARS",
    "SPECDOC_MAX_TOKENS",
    "SPECDOC_MODEL",
    "SPECDOC_REASONING_EFFORT",
    "SPECDOC_BATCH_DELAY",
    "SPECDOC_PATTERN",
    "SPECDOC_API",
    "SPECDOC_TIMEOUT",
    "SPECDOC_CONCURRENCY",
];

/// Create a `specdoc` command with a clean environment, run from `workdir`
/// so no stray `.env` file is picked up.
#[allow(dead_code)]
pub fn specdoc_cmd(workdir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("specdoc"));
    cmd.timeout(CMD_TIMEOUT);
    for var in SCRUBBED_ENV {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd.current_dir(workdir);
    cmd
}

/// `specdoc_cmd` pointed at a mock backend with a test credential.
#[allow(dead_code)]
pub fn specdoc_with_backend(workdir: &Path, base_uri: &str) -> Command {
    let mut cmd = specdoc_cmd(workdir);
    cmd.env("OPENAI_API_KEY", "sk-test");
    cmd.env("OPENAI_BASE_URL", format!("{base_uri}/v1"));
    cmd
}

/// Write a spec file under `root`, creating parent directories.
#[allow(dead_code)]
pub fn write_spec(root: &Path, rel: &str, body: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    path
}

/// Structured-response body carrying `text` in the primary slot.
#[allow(dead_code)]
pub fn responses_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "output": [{ "type": "message", "content": [{ "type": "output_text", "text": text }] }]
    })
}
