//! Runs the command-line automation tools (`xdotool`, `osascript`).

use std::process::Command;

use tracing::{debug, warn};

use crate::error::{PtsError, Result};

/// Run `program` with `args`, returning trimmed stdout.
///
/// A tool that cannot be spawned or exits non-zero is a delivery failure.
pub(crate) fn run_tool(program: &str, args: &[&str]) -> Result<String> {
    let step = format!("{} {}", program, args.first().copied().unwrap_or_default());
    debug!("Running {} {:?}", program, args);

    let output = Command::new(program).args(args).output().map_err(|e| {
        PtsError::delivery_failed(&step, format!("could not run {program}: {e}"))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("{} failed ({}): {}", step, output.status, stderr.trim());
        return Err(PtsError::delivery_failed(
            step,
            format!("{} {}", output.status, stderr.trim()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
