//! Typst rendering engine.
//!
//! Handles the low-level details of writing Typst source to a temporary
//! directory, invoking the compiler, and reading back the output PDF.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::tempdir;
use tokio::process::Command;

use super::traits::DocumentEngine;
use super::EngineError;

const SOURCE_FILE: &str = "wage_slip.typ";
const OUTPUT_FILE: &str = "wage_slip.pdf";

/// Compiles Typst source by shelling out to the `typst` CLI.
#[derive(Debug, Clone)]
pub struct TypstRenderEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl TypstRenderEngine {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DocumentEngine for TypstRenderEngine {
    async fn compile(&self, source: &str) -> Result<Vec<u8>, EngineError> {
        let temp_dir = tempdir().map_err(EngineError::TempDir)?;
        let typ_path = temp_dir.path().join(SOURCE_FILE);
        let output_path = temp_dir.path().join(OUTPUT_FILE);

        tokio::fs::write(&typ_path, source)
            .await
            .map_err(EngineError::WriteTypst)?;

        let child = Command::new(&self.binary)
            .arg("compile")
            .arg(&typ_path)
            .arg(&output_path)
            .current_dir(temp_dir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(EngineError::TypstIo)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| EngineError::Timeout(self.timeout))?
            .map_err(EngineError::TypstIo)?;

        if !output.status.success() {
            return Err(EngineError::TypstExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tokio::fs::read(&output_path)
            .await
            .map_err(EngineError::ReadPdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let engine = TypstRenderEngine::new(
            "/nonexistent/typst-binary",
            Duration::from_secs(5),
        );
        let result = engine.compile("= Hello").await;
        assert!(matches!(result, Err(EngineError::TypstIo(_))));
    }
}
