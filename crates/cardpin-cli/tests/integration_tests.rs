//! Integration tests for CLI commands

use std::path::Path;
use std::process::Command;

/// Nothing listens here, so every request fails fast
const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Helper to run cardpin command
fn cardpin(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_cardpin"))
        .args(args)
        .env_remove("GITHUB_TOKEN")
        .env_remove("CARDPIN_CATALOG")
        .env_remove("CARDPIN_CONFIG_DIR")
        .env_remove("RUST_LOG")
        .env("CLICOLOR", "0")
        .output()
        .expect("Failed to execute cardpin")
}

/// Run `install` against an unreachable host
fn install_offline(config_dir: &Path, extra: &[&str]) -> std::process::Output {
    let config_dir = config_dir.to_string_lossy().to_string();
    let mut args = vec![
        "install",
        "--config-dir",
        &config_dir,
        "--api-base",
        UNREACHABLE,
        "--web-base",
        UNREACHABLE,
    ];
    args.extend_from_slice(extra);
    cardpin(&args)
}

mod install_command {
    use super::*;

    #[test]
    fn test_full_outage_reports_every_failure() {
        let dir = tempfile::tempdir().unwrap();

        let output = install_offline(dir.path(), &[]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("0 installed, 12 failed (of 12)"));
        assert!(stdout.contains("Manual installation required"));
        assert!(stdout.contains("kalkih/mini-graph-card"));
        assert!(stdout.contains("thomasloven/lovelace-card-mod"));
        assert!(!dir.path().join(".storage").join("lovelace_resources").exists());
    }

    #[test]
    fn test_outage_logs_each_failure() {
        let dir = tempfile::tempdir().unwrap();

        let output = install_offline(dir.path(), &[]);

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(stderr.matches("dependency install failed").count(), 12);
        assert!(stderr.contains("12 of 12 dependencies failed to install"));
    }

    #[test]
    fn test_outage_leaves_existing_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join(".storage");
        std::fs::create_dir_all(&storage).unwrap();
        let original =
            r#"{"data": {"items": [{"id": 1, "type": "module", "url": "/local/a.js"}]}}"#;
        std::fs::write(storage.join("lovelace_resources"), original).unwrap();

        let output = install_offline(dir.path(), &[]);

        assert_eq!(output.status.code(), Some(2));
        assert_eq!(
            std::fs::read_to_string(storage.join("lovelace_resources")).unwrap(),
            original
        );
        assert_eq!(std::fs::read_dir(&storage).unwrap().count(), 1);
    }

    #[test]
    fn test_outage_in_yaml_mode() {
        let dir = tempfile::tempdir().unwrap();

        let output = install_offline(dir.path(), &["--yaml-mode"]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("YAML mode"));
        assert!(!dir.path().join(".storage").exists());
    }

    #[test]
    fn test_override_catalog_is_installed() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, r#"[{"repository": "owner/gauge", "tag": "v1.0.0"}]"#).unwrap();
        let catalog = catalog.to_string_lossy().to_string();

        let output = install_offline(dir.path(), &["--catalog", &catalog]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("0 installed, 1 failed (of 1)"));
        assert!(stdout.contains("owner/gauge"));
    }

    #[test]
    fn test_invalid_api_base_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().to_string_lossy().to_string();

        let output = cardpin(&[
            "install",
            "--config-dir",
            &config_dir,
            "--api-base",
            "ftp://mirror",
        ]);

        assert_eq!(output.status.code(), Some(64));
        assert!(!dir.path().join("www").exists());
    }
}

mod catalog_command {
    use super::*;

    #[test]
    fn test_catalog_lists_builtin_entries() {
        let output = cardpin(&["catalog"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("RomRider/apexcharts-card"));
        assert!(stdout.contains("default branch"));
        assert!(stdout.contains("12 entries"));
    }

    #[test]
    fn test_catalog_json_output() {
        let output = cardpin(&["catalog", "--json"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value =
            serde_json::from_str(&stdout).expect("Output should be valid JSON");

        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 12);
        assert_eq!(entries[0]["repository"], "kalkih/mini-graph-card");
        assert_eq!(entries[0]["strategy"]["kind"], "tagged_release");
        assert_eq!(entries[11]["strategy"]["kind"], "default_branch_archive");
    }

    #[test]
    fn test_catalog_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(
            &catalog,
            r#"[{"repository": "owner/gauge"}, {"name": "no repository"}]"#,
        )
        .unwrap();
        let catalog = catalog.to_string_lossy().to_string();

        let output = cardpin(&["catalog", "--json", "--catalog", &catalog]);

        let stdout = String::from_utf8_lossy(&output.stdout);
        let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["installFolder"], "gauge");
        assert_eq!(entries[0]["strategy"]["kind"], "default_branch_archive");
    }

    #[test]
    fn test_missing_override_falls_back_to_builtin() {
        let output = cardpin(&["catalog", "--json", "--catalog", "/nonexistent/catalog.json"]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 12);
    }
}

mod usage {
    use super::*;

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let output = cardpin(&["install", "--no-such-flag"]);
        assert_eq!(output.status.code(), Some(64));
    }

    #[test]
    fn test_help_succeeds() {
        let output = cardpin(&["--help"]);
        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("install"));
    }
}
