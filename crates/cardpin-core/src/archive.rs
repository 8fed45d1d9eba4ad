//! Script extraction from zip archives
//!
//! Candidates are plain `.js` entries first and `.js.gz` entries second.
//! Within each list an entry matching the name pattern wins, otherwise the
//! first entry of the list is taken.

use regex::Regex;
use std::io::{Cursor, Read};

use crate::error::{InstallError, Result};

/// A script pulled out of an archive, bytes unmodified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedScript {
    /// Base name of the archive entry, extension preserved
    pub file_name: String,
    /// Full path of the entry inside the archive
    pub entry_path: String,
    pub data: Vec<u8>,
}

/// Extract the best-matching script from zip bytes
pub fn extract_script(archive: &[u8], pattern: &Regex) -> Result<ExtractedScript> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;

    let mut names = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        if !entry.is_dir() {
            names.push(entry.name().to_string());
        }
    }

    let chosen = select_entry(&names, pattern)
        .ok_or_else(|| InstallError::ExtractionFailed {
            message: format!(
                "no .js or .js.gz entry among {} file(s) (pattern {})",
                names.len(),
                pattern.as_str()
            ),
        })?
        .to_string();

    let mut data = Vec::new();
    zip.by_name(&chosen)?
        .read_to_end(&mut data)
        .map_err(|e| InstallError::ExtractionFailed {
            message: format!("cannot read {}: {}", chosen, e),
        })?;

    tracing::debug!(entry = %chosen, bytes = data.len(), "extracted script");

    Ok(ExtractedScript {
        file_name: base_name(&chosen).to_string(),
        entry_path: chosen,
        data,
    })
}

/// Pick an entry name: `.js` list first, then `.js.gz`
pub fn select_entry<'a>(names: &'a [String], pattern: &Regex) -> Option<&'a str> {
    let plain: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| ends_with_ignore_case(n, ".js"))
        .collect();
    let gzipped: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|n| ends_with_ignore_case(n, ".js.gz"))
        .collect();

    prefer_matching(&plain, pattern).or_else(|| prefer_matching(&gzipped, pattern))
}

fn prefer_matching<'a>(candidates: &[&'a str], pattern: &Regex) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|name| pattern.is_match(base_name(name)) || pattern.is_match(name))
        .or_else(|| candidates.first().copied())
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub(crate) fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Build a zip archive in memory from (path, contents) pairs
    pub(crate) fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn pattern() -> Regex {
        Regex::new(r"mini-graph-card.*\.js(\.gz)?$").unwrap()
    }

    #[test]
    fn test_matching_js_beats_first_js() {
        let entries = names(&["repo/rollup.config.js", "repo/dist/mini-graph-card-bundle.js"]);
        assert_eq!(
            select_entry(&entries, &pattern()),
            Some("repo/dist/mini-graph-card-bundle.js")
        );
    }

    #[test]
    fn test_any_js_beats_matching_gz() {
        let entries = names(&["repo/mini-graph-card.js.gz", "repo/other.js"]);
        assert_eq!(select_entry(&entries, &pattern()), Some("repo/other.js"));
    }

    #[test]
    fn test_gz_fallback() {
        let entries = names(&["repo/a.js.gz", "repo/mini-graph-card.js.gz", "README.md"]);
        assert_eq!(
            select_entry(&entries, &pattern()),
            Some("repo/mini-graph-card.js.gz")
        );

        let unmatched = names(&["repo/a.js.gz", "repo/b.js.gz"]);
        assert_eq!(select_entry(&unmatched, &pattern()), Some("repo/a.js.gz"));
    }

    #[test]
    fn test_suffix_case_insensitive() {
        let entries = names(&["repo/CARD.JS"]);
        assert_eq!(select_entry(&entries, &pattern()), Some("repo/CARD.JS"));
    }

    #[test]
    fn test_no_candidates() {
        let entries = names(&["README.md", "card.js.map", "package.json"]);
        assert_eq!(select_entry(&entries, &pattern()), None);
    }

    #[test]
    fn test_extract_script_bytes_unmodified() {
        let archive = build_zip(&[
            ("mini-graph-card-0.13.0/", b""),
            ("mini-graph-card-0.13.0/src/main.js", b"src"),
            ("mini-graph-card-0.13.0/dist/mini-graph-card-bundle.js", b"bundle"),
        ]);

        let script = extract_script(&archive, &pattern()).unwrap();
        assert_eq!(script.file_name, "mini-graph-card-bundle.js");
        assert_eq!(script.entry_path, "mini-graph-card-0.13.0/dist/mini-graph-card-bundle.js");
        assert_eq!(script.data, b"bundle");
    }

    #[test]
    fn test_extract_keeps_gz_extension() {
        let archive = build_zip(&[("dist/mini-graph-card.js.gz", &[0x1f, 0x8b, 0x08])]);

        let script = extract_script(&archive, &pattern()).unwrap();
        assert_eq!(script.file_name, "mini-graph-card.js.gz");
        assert_eq!(script.data, vec![0x1f, 0x8b, 0x08]);
    }

    #[test]
    fn test_extract_fails_without_scripts() {
        let archive = build_zip(&[("README.md", b"# card")]);
        let err = extract_script(&archive, &pattern()).unwrap_err();
        assert!(matches!(err, InstallError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let err = extract_script(b"definitely not a zip", &pattern()).unwrap_err();
        assert!(matches!(err, InstallError::ExtractionFailed { .. }));
    }
}
