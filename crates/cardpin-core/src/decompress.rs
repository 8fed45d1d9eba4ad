//! Single-file gzip unwrapping

use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::archive::ends_with_ignore_case;
use crate::error::{InstallError, Result};

/// Decompress `path` in place when its name ends in `.gz`
///
/// The decompressed file replaces the original at the same path minus the
/// `.gz` suffix. Any other path is returned unchanged.
pub fn decompress_in_place(path: &Path) -> Result<PathBuf> {
    let Some(target) = strip_gz_suffix(path) else {
        return Ok(path.to_path_buf());
    };

    let failed = |message: String| InstallError::DecompressionFailed {
        path: path.display().to_string(),
        message,
    };

    let compressed = std::fs::read(path).map_err(|e| failed(e.to_string()))?;
    let mut decoded = Vec::new();
    if let Err(e) = GzDecoder::new(compressed.as_slice()).read_to_end(&mut decoded) {
        // a corrupt download is never left behind in the asset folder
        if let Err(rm) = std::fs::remove_file(path) {
            tracing::debug!(path = %path.display(), error = %rm, "cannot remove corrupt archive");
        }
        return Err(failed(e.to_string()));
    }

    std::fs::write(&target, &decoded).map_err(|e| failed(e.to_string()))?;
    std::fs::remove_file(path).map_err(|e| failed(e.to_string()))?;

    tracing::debug!(
        from = %path.display(),
        to = %target.display(),
        bytes = decoded.len(),
        "decompressed"
    );
    Ok(target)
}

fn strip_gz_suffix(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    if !ends_with_ignore_case(name, ".gz") {
        return None;
    }
    let stem = name.get(..name.len() - ".gz".len())?;
    (!stem.is_empty()).then(|| path.with_file_name(stem))
}
