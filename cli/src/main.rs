//! `binary-wheel-builder` entrypoint.
//!
//! Loads a wheel configuration, builds one wheel per selected platform, and
//! prints each wheel's checksum and path. Exits non-zero when any platform
//! fails.

mod cli;

use binary_wheel_builder::build::{BuildResult, build};
use binary_wheel_builder::checksum::Sha256Digest;
use binary_wheel_builder::config::{ConfigError, WheelConfig};
use binary_wheel_builder::inspect::{self, InspectError};
use binary_wheel_builder::platform::well_known;
use binary_wheel_builder::spec::PackageSpec;
use camino::Utf8Path;
use clap::Parser;
use cli::Cli;
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;

/// Errors that end a CLI run.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{failed} of {total} platform builds failed")]
    Build { failed: usize, total: usize },

    #[error("verification of {path} failed: {source}")]
    Verify {
        path: PathBuf,
        #[source]
        source: InspectError,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to encode result: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level())
        .with_target(false)
        .without_time()
        .init();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<(), CliError> {
    if cli.list_platforms {
        return list_platforms(stdout);
    }

    let config = WheelConfig::load(&cli.config)?;
    let base_dir = cli
        .config
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let spec = config.to_package_spec(base_dir, &cli.platforms)?;

    let total = spec.platforms().len();
    let mut failed = 0;
    for outcome in build(&spec, cli.output_dir.as_std_path()) {
        let reported = outcome
            .map_err(|err| write_stderr_line(stderr, err))
            .and_then(|result| {
                if cli.verify {
                    verify_wheel(&spec, &result).map_err(|err| write_stderr_line(stderr, err))?;
                }
                Ok(result)
            });
        match reported {
            Ok(result) => write_result(stdout, &result, cli.json)?,
            Err(()) => {
                failed += 1;
                if cli.fail_fast {
                    break;
                }
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Build { failed, total });
    }
    Ok(())
}

/// Read a built wheel back and check it against the package definition.
fn verify_wheel(spec: &PackageSpec, result: &BuildResult) -> Result<(), CliError> {
    let verify_error = |source| CliError::Verify {
        path: result.file_path.clone(),
        source,
    };
    let bytes = fs::read(&result.file_path)
        .map_err(|err| verify_error(InspectError::Io(err)))?;
    if Sha256Digest::of_bytes(&bytes) != result.checksum {
        return Err(verify_error(InspectError::Malformed {
            path: result.file_path.display().to_string(),
            reason: format!("checksum differs from reported {}", result.checksum),
        }));
    }
    let entries = inspect::read_wheel_from(Cursor::new(bytes)).map_err(verify_error)?;
    if spec.write_record() {
        inspect::verify_record(&entries).map_err(verify_error)?;
    }
    let metadata = inspect::wheel_metadata(&entries).map_err(verify_error)?;
    if metadata.get("Name") != Some(spec.name()) || metadata.get("Version") != Some(spec.version())
    {
        return Err(verify_error(InspectError::Malformed {
            path: "METADATA".to_owned(),
            reason: "name or version does not match the configuration".to_owned(),
        }));
    }
    log::info!("verified {}", result.file_path.display());
    Ok(())
}

fn write_result(stdout: &mut dyn Write, result: &BuildResult, json: bool) -> Result<(), CliError> {
    if json {
        writeln!(stdout, "{}", serde_json::to_string(result)?)?;
    } else {
        writeln!(stdout, "{}  {}", result.checksum, result.file_path.display())?;
    }
    Ok(())
}

fn list_platforms(stdout: &mut dyn Write) -> Result<(), CliError> {
    for name in well_known::names() {
        if let Some(platform) = well_known::by_name(name) {
            writeln!(stdout, "{name:<16}{}", platform.platform())?;
        }
    }
    Ok(())
}

fn exit_code_for_run_result(result: Result<(), CliError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    struct Workspace {
        _temp_dir: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn workspace() -> Workspace {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf())
            .expect("utf-8 temp dir");
        fs::write(root.join("tool-linux"), b"linux binary").expect("write linux binary");
        fs::write(root.join("tool-mac"), b"mac binary").expect("write mac binary");
        fs::write(
            root.join("wheel.toml"),
            r#"
name = "my-tool"
version = "1.0.0"
package = "my_tool"
executable = "tool"
platforms = ["linux-x86_64", "windows-x86_64", "macos-arm64"]

[source.local.files]
linux-x86_64 = "tool-linux"
windows-x86_64 = "tool-missing.exe"
macos-arm64 = "tool-mac"
"#,
        )
        .expect("write config");
        Workspace {
            _temp_dir: temp_dir,
            root,
        }
    }

    fn cli_for(workspace: &Workspace, extra: &[&str]) -> Cli {
        let config = workspace.root.join("wheel.toml");
        let output = workspace.root.join("dist");
        let mut args = vec![
            "binary-wheel-builder",
            "--config",
            config.as_str(),
            "--output-dir",
            output.as_str(),
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("arguments parse")
    }

    fn run_captured(cli: &Cli) -> (Result<(), CliError>, String, String) {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let result = run(cli, &mut stdout, &mut stderr);
        (
            result,
            String::from_utf8(stdout).expect("utf-8 stdout"),
            String::from_utf8(stderr).expect("utf-8 stderr"),
        )
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(
            Err(CliError::Build {
                failed: 1,
                total: 3,
            }),
            &mut stderr,
        );
        assert_eq!(exit_code, 1);
        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("1 of 3 platform builds failed"));
    }

    #[rstest]
    fn builds_remaining_platforms_after_failure(workspace: Workspace) {
        let (result, stdout, stderr) = run_captured(&cli_for(&workspace, &["--verify"]));

        assert!(matches!(result, Err(CliError::Build { failed: 1, total: 3 })));
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.contains("my_tool-1.0.0-py3-none-")));
        assert_eq!(
            stderr
                .matches("failed to build my-tool 1.0.0 for py3-none-win_amd64")
                .count(),
            1
        );
    }

    #[rstest]
    fn fail_fast_stops_at_first_failure(workspace: Workspace) {
        let (result, stdout, _) = run_captured(&cli_for(&workspace, &["--fail-fast"]));

        assert!(matches!(result, Err(CliError::Build { failed: 1, .. })));
        assert_eq!(stdout.lines().count(), 1);
        assert!(
            !workspace
                .root
                .join("dist/my_tool-1.0.0-py3-none-macosx_11_0_arm64.whl")
                .exists()
        );
    }

    #[rstest]
    fn platform_filter_selects_subset(workspace: Workspace) {
        let (result, stdout, stderr) =
            run_captured(&cli_for(&workspace, &["-p", "macos-arm64", "--verify"]));

        assert!(result.is_ok(), "unexpected failure: {stderr}");
        let line = stdout.lines().next().expect("one result line");
        let (checksum, path) = line.split_once("  ").expect("checksum and path");
        assert_eq!(checksum.len(), 64);
        assert!(path.ends_with("my_tool-1.0.0-py3-none-macosx_11_0_arm64.whl"));
    }

    #[rstest]
    fn json_output_is_one_object_per_wheel(workspace: Workspace) {
        let (result, stdout, _) =
            run_captured(&cli_for(&workspace, &["-p", "linux-x86_64", "--json"]));

        assert!(result.is_ok());
        let value: serde_json::Value =
            serde_json::from_str(stdout.trim()).expect("valid JSON line");
        assert_eq!(value["checksum"].as_str().map(str::len), Some(64));
        assert!(value["file_path"].is_string());
    }

    #[rstest]
    fn verify_rejects_stale_checksum(workspace: Workspace) {
        let cli = cli_for(&workspace, &["-p", "linux-x86_64"]);
        let spec = WheelConfig::load(&cli.config)
            .expect("config loads")
            .to_package_spec(&workspace.root, &cli.platforms)
            .expect("valid spec");
        let mut result = build(&spec, cli.output_dir.as_std_path())
            .next()
            .expect("one platform")
            .expect("linux builds");
        verify_wheel(&spec, &result).expect("fresh wheel verifies");

        result.checksum = Sha256Digest::of_bytes(b"something else");
        let err = verify_wheel(&spec, &result).expect_err("stale checksum");
        assert!(matches!(
            err,
            CliError::Verify {
                source: InspectError::Malformed { .. },
                ..
            }
        ));
    }

    #[rstest]
    fn missing_config_is_reported(workspace: Workspace) {
        let cli = Cli::try_parse_from([
            "binary-wheel-builder",
            "--config",
            workspace.root.join("absent.toml").as_str(),
        ])
        .expect("arguments parse");
        let (result, _, _) = run_captured(&cli);
        assert!(matches!(result, Err(CliError::Config(ConfigError::Read { .. }))));
    }

    #[rstest]
    fn lists_catalogue() {
        let cli = Cli::try_parse_from(["binary-wheel-builder", "--list-platforms"])
            .expect("arguments parse");
        let (result, stdout, _) = run_captured(&cli);
        assert!(result.is_ok());
        assert_eq!(stdout.lines().count(), well_known::names().count());
        assert!(stdout.contains("win_amd64"));
    }
}
