use crate::Result;
use std::path::Path;

use std::process::Command;

/// Tries to format the generated code in the given file with `rustfmt`.
/// A failing `rustfmt` leaves the file unformatted.
pub(crate) fn try_format(path_to_file: &Path) -> Result<()> {
    let status = Command::new("rustfmt")
        .args(["--edition", "2021"])
        .arg(path_to_file)
        .status()
        .map_err(|e| std::io::Error::new(e.kind(), format!("Failed to run rustfmt: {}", e)))?;
    if !status.success() {
        log::warn!(
            "rustfmt failed on {} with {}",
            path_to_file.display(),
            status
        );
    }
    Ok(())
}
