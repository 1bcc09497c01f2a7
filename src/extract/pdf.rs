//! PDF text via Poppler's `pdftotext`.

use std::path::Path;
use std::process::Command;

use super::ExtractionError;

/// Handle command output, extracting stdout on success or returning a short error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let cause = stderr
                .lines()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("no diagnostic output");
            Err(ExtractionError::ExtractionFailed(format!(
                "{} exited with {}: {}",
                tool_name, output.status, cause
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
            ExtractionError::ExtractionFailed(format!("{} is not installed", tool_name)),
        ),
        Err(e) => Err(ExtractionError::ExtractionFailed(format!(
            "{}: {}",
            tool_name, e
        ))),
    }
}

/// Location of `pdftotext` on PATH, if installed.
pub fn pdftotext_path() -> Option<std::path::PathBuf> {
    which::which("pdftotext").ok()
}

/// Extract the text layer of a PDF.
pub fn extract_pdf_text(path: &Path) -> Result<String, ExtractionError> {
    if !path.exists() {
        return Err(ExtractionError::ExtractionFailed(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let output = Command::new("pdftotext")
        .args(["-layout", "-enc", "UTF-8"])
        .arg(path)
        .arg("-")
        .output();

    handle_cmd_output(output, "pdftotext")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_extraction_failure() {
        let err = extract_pdf_text(Path::new("/nonexistent/lease.pdf")).unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(ref m) if m.contains("not found")));
    }

    #[test]
    fn test_missing_tool_maps_to_extraction_failure() {
        let result = Command::new("documind-no-such-tool").output();
        let err = handle_cmd_output(result, "documind-no-such-tool").unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailed(ref m) if m.contains("not installed")));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_reports_first_stderr_line() {
        let result = Command::new("sh")
            .args(["-c", "echo 'Syntax Error: bad xref' >&2; echo more >&2; exit 1"])
            .output();
        let err = handle_cmd_output(result, "pdftotext").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Syntax Error: bad xref"));
        assert!(!msg.contains("more"));
    }
}
