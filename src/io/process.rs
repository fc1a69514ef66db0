use std::process::{Command, Output};

use tracing::{debug, info};

use crate::{
    error::{Result, TranscribeError},
    io::progress::emit_tool_output,
};

/// Run `cmd` to completion with stdout/stderr captured.
///
/// Captured output is echoed line by line to the tool-output callback and the
/// log, stdout first. A non-zero exit becomes `ToolFailed` carrying the
/// tool's stderr.
pub fn run_captured(tool: &str, cmd: &mut Command) -> Result<Output> {
    debug!(tool, command = ?cmd, "running external tool");

    let output = cmd.output().map_err(|source| TranscribeError::ToolLaunch {
        tool: tool.to_string(),
        source,
    })?;

    echo(tool, &output.stdout);
    echo(tool, &output.stderr);

    if !output.status.success() {
        return Err(TranscribeError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

fn echo(tool: &str, bytes: &[u8]) {
    for line in String::from_utf8_lossy(bytes).lines() {
        let line = line.trim_end();
        if !line.is_empty() {
            info!(tool, "{line}");
            emit_tool_output(tool, line);
        }
    }
}
