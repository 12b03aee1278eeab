use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the standard `~/.sensor-report/` directory hierarchy exists.
///
/// Creates the following directories if absent (including any missing
/// parents):
/// - `~/.sensor-report/`
/// - `~/.sensor-report/logs/`
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let report_dir = home.join(".sensor-report");
    std::fs::create_dir_all(&report_dir)?;
    std::fs::create_dir_all(report_dir.join("logs"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised.
///
/// The `log_file` parameter is accepted for forward-compatibility but file
/// logging is not yet wired – all output currently goes to stderr.
pub fn setup_logging(log_level: &str, _log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    // Settings carry uppercase level names; tracing uses lowercase.
    let upper = log_level.to_uppercase();
    let normalised = match upper.as_str() {
        "DEBUG" | "CRITICAL" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" => "error",
        other => other,
    };

    let filter = EnvFilter::try_new(normalised).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Input discovery ────────────────────────────────────────────────────────────

/// Attempt to locate the sensor log when `--input` was not given.
///
/// Checks the following paths in order and returns the first that exists:
/// 1. `./devices_mqtt_data/devices.csv`
/// 2. `./devices.csv`
///
/// Returns `None` when neither path exists.
pub fn discover_input_path() -> Option<PathBuf> {
    discover_input_path_in(Path::new("."))
}

/// Same as [`discover_input_path`] but rooted at `base_dir` (used for
/// testing).
pub fn discover_input_path_in(base_dir: &Path) -> Option<PathBuf> {
    let candidates = [
        base_dir.join("devices_mqtt_data").join("devices.csv"),
        base_dir.join("devices.csv"),
    ];
    candidates.into_iter().find(|p| p.is_file())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── test_ensure_directories ───────────────────────────────────────────────

    #[test]
    fn test_ensure_directories() {
        let tmp = TempDir::new().expect("tempdir");

        // Override HOME so that dirs::home_dir() resolves to our temp dir.
        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", tmp.path());

        let result = ensure_directories();

        // Restore HOME.
        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }

        result.expect("ensure_directories should succeed");

        let report_dir = tmp.path().join(".sensor-report");
        assert!(report_dir.is_dir(), ".sensor-report dir must exist");
        assert!(report_dir.join("logs").is_dir(), "logs subdir must exist");
    }

    // ── test_discover_input_path ──────────────────────────────────────────────

    #[test]
    fn test_discover_input_path_returns_none_when_absent() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(discover_input_path_in(tmp.path()).is_none());
    }

    #[test]
    fn test_discover_input_path_prefers_data_dir() {
        let tmp = TempDir::new().expect("tempdir");
        let data_dir = tmp.path().join("devices_mqtt_data");
        std::fs::create_dir_all(&data_dir).expect("create data dir");
        std::fs::write(data_dir.join("devices.csv"), "header\n").expect("write");
        std::fs::write(tmp.path().join("devices.csv"), "header\n").expect("write");

        assert_eq!(
            discover_input_path_in(tmp.path()),
            Some(data_dir.join("devices.csv"))
        );
    }

    #[test]
    fn test_discover_input_path_falls_back_to_cwd_file() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::write(tmp.path().join("devices.csv"), "header\n").expect("write");

        assert_eq!(
            discover_input_path_in(tmp.path()),
            Some(tmp.path().join("devices.csv"))
        );
    }

    #[test]
    fn test_discover_input_path_ignores_directories() {
        let tmp = TempDir::new().expect("tempdir");
        // A directory named like the input file must not be picked up.
        std::fs::create_dir_all(tmp.path().join("devices.csv")).expect("mkdir");

        assert!(discover_input_path_in(tmp.path()).is_none());
    }
}
