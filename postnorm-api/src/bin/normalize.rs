//! postnorm-normalize - Print normalized posts without running the server
//!
//! Usage:
//!   postnorm-normalize Telegram
//!   postnorm-normalize Telegram --input ./exports/telegram-2024-05.json
//!   postnorm-normalize --all
//!
//! Stdout carries only the JSON output; log lines go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use postnorm_common::config::{load_toml_config, ConfigOverrides, ServiceConfig, TomlConfig};
use postnorm_common::normalizer::{load_raw_records, normalize};
use postnorm_common::registry::{load_all_configs, Registry};
use postnorm_common::{NormalizedRecord, PostService};
use postnorm_api::logging;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "postnorm-normalize")]
#[command(about = "Normalize platform posts from the command line")]
#[command(version)]
struct Args {
    /// Platform whose mapping is applied
    platform: Option<String>,

    /// Normalize every platform in the registry
    #[arg(long, conflicts_with_all = ["platform", "input"])]
    all: bool,

    /// Raw data file to normalize instead of the platform's configured one
    #[arg(short, long, requires = "platform")]
    input: Option<PathBuf>,

    /// Registry document (platform mappings JSON)
    #[arg(short, long, env = "POSTNORM_REGISTRY")]
    registry: Option<PathBuf>,

    /// Directory that relative data file paths are resolved against
    #[arg(long, env = "POSTNORM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Emit one compact JSON object per line
    #[arg(long)]
    lines: bool,

    /// Log level written to stderr
    #[arg(long, env = "POSTNORM_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// TOML config file
    #[arg(short, long, env = "POSTNORM_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn resolve(&self, file_config: &TomlConfig) -> ServiceConfig {
        ServiceConfig::resolve(
            &ConfigOverrides {
                registry_path: self.registry.clone(),
                base_dir: self.data_dir.clone(),
                log_level: Some(self.log_level.clone()),
                ..Default::default()
            },
            file_config,
        )
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = load_toml_config(args.config.as_deref())
        .context("Failed to load configuration file")?;
    let config = args.resolve(&file_config);
    logging::init_tracing(&config.log_level, io::stderr);

    let stdout = io::stdout();
    run(&args, &config, &mut stdout.lock())
}

/// Load the registry, normalize, and write the result to `out`
fn run<W: Write>(args: &Args, config: &ServiceConfig, out: &mut W) -> Result<()> {
    let registry = load_all_configs(&config.registry_path, config.base_dir.as_deref())
        .context("Failed to load platform mappings")?;

    let posts = collect_posts(args, registry)?;
    write_posts(&posts, args.lines, out)
}

fn collect_posts(args: &Args, registry: Registry) -> Result<Vec<NormalizedRecord>> {
    let posts = match (&args.platform, &args.input, args.all) {
        (_, _, true) => PostService::new(Arc::new(registry)).normalize_all()?,
        (Some(platform), Some(input), false) => {
            let mapping = &registry.resolve(platform)?.mapping;
            info!("Normalizing {} with the {} mapping", input.display(), platform);
            normalize(&load_raw_records(input)?, mapping)
        }
        (Some(platform), None, false) => {
            PostService::new(Arc::new(registry)).normalize_platform(platform)?
        }
        (None, _, false) => bail!("Specify a platform or --all"),
    };
    Ok(posts)
}

fn write_posts<W: Write>(posts: &[NormalizedRecord], lines: bool, out: &mut W) -> Result<()> {
    if lines {
        for post in posts {
            writeln!(out, "{}", serde_json::to_string(post)?)?;
        }
    } else {
        writeln!(out, "{}", serde_json::to_string_pretty(posts)?)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tracing_subscriber::EnvFilter;

    const REGISTRY: &str = r#"{
        "Telegram": {
            "file_path": "telegram.json",
            "mapping": {"text": "tel_text", "summary": "tel_text_summary"}
        }
    }"#;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    /// Registry plus Telegram export in a temp dir, and args pointing at them
    fn fixture(registry: &str, extra: &[&str]) -> (TempDir, Args, ServiceConfig) {
        let dir = TempDir::new().unwrap();
        let registry_path = dir.path().join("mappings.json");
        fs::write(&registry_path, registry).unwrap();
        fs::write(
            dir.path().join("telegram.json"),
            r#"[{"tel_text": "first"}, {"tel_text": "second", "tel_text_summary": "2"}]"#,
        )
        .unwrap();

        let mut argv = vec![
            "postnorm-normalize".to_string(),
            "--registry".to_string(),
            registry_path.display().to_string(),
            "--data-dir".to_string(),
            dir.path().display().to_string(),
        ];
        argv.extend(extra.iter().map(|a| a.to_string()));
        let args = Args::try_parse_from(&argv).unwrap();
        let config = args.resolve(&TomlConfig::default());
        (dir, args, config)
    }

    fn load(config: &ServiceConfig) -> Registry {
        load_all_configs(&config.registry_path, config.base_dir.as_deref()).unwrap()
    }

    // ========================================================================
    // Argument parsing
    // ========================================================================

    #[test]
    fn test_all_conflicts_with_input() {
        let err = Args::try_parse_from(["postnorm-normalize", "--all", "--input", "raw.json"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_all_conflicts_with_platform() {
        let err = Args::try_parse_from(["postnorm-normalize", "Telegram", "--all"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_input_requires_platform() {
        let err =
            Args::try_parse_from(["postnorm-normalize", "--input", "raw.json"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_log_level_defaults_to_warn() {
        let args = parse(&["postnorm-normalize", "Telegram"]);
        assert_eq!(args.resolve(&TomlConfig::default()).log_level, "warn");
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    #[test]
    fn test_no_platform_and_no_all_is_rejected() {
        let (_dir, args, config) = fixture(REGISTRY, &[]);
        let err = collect_posts(&args, load(&config)).unwrap_err();
        assert!(err.to_string().contains("Specify a platform or --all"));
    }

    #[test]
    fn test_platform_uses_configured_source() {
        let (_dir, args, config) = fixture(REGISTRY, &["Telegram"]);
        let posts = collect_posts(&args, load(&config)).unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0]["text"], json!("first"));
        assert_eq!(posts[0]["summary"], json!(""));
    }

    #[test]
    fn test_input_file_uses_platform_mapping() {
        let exports = TempDir::new().unwrap();
        let input = exports.path().join("export.json");
        fs::write(&input, r#"[{"tel_text": "adhoc", "unmapped": true}]"#).unwrap();

        let (_dir, args, config) = fixture(
            REGISTRY,
            &["Telegram", "--input", input.to_str().unwrap()],
        );
        let posts = collect_posts(&args, load(&config)).unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(
            Value::Object(posts[0].clone()),
            json!({"text": "adhoc", "summary": ""})
        );
    }

    #[test]
    fn test_input_with_unknown_platform_fails() {
        let (_dir, args, config) = fixture(REGISTRY, &["Zoom", "--input", "raw.json"]);
        let err = collect_posts(&args, load(&config)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<postnorm_common::Error>(),
            Some(postnorm_common::Error::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn test_all_concatenates_registry_platforms() {
        let (_dir, args, config) = fixture(REGISTRY, &["--all"]);
        let posts = collect_posts(&args, load(&config)).unwrap();
        assert_eq!(posts.len(), 2);
    }

    // ========================================================================
    // Output
    // ========================================================================

    #[test]
    fn test_lines_writes_one_object_per_line() {
        let (_dir, args, config) = fixture(REGISTRY, &["Telegram", "--lines"]);
        let mut out = Vec::new();
        run(&args, &config, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: Value = serde_json::from_str(line).unwrap();
            assert!(value.is_object());
        }
    }

    #[test]
    fn test_default_output_is_a_pretty_array() {
        let (_dir, args, config) = fixture(REGISTRY, &["Telegram"]);
        let mut out = Vec::new();
        run(&args, &config, &mut out).unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert!(String::from_utf8(out).unwrap().contains("\n  "));
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_warnings_stay_out_of_output() {
        let registry = r#"{
            "Telegram": {"file_path": "telegram.json", "mapping": {"text": "tel_text"}},
            "Zoom": {"file_path": "zoom.json", "mapping": {"text": "body"}}
        }"#;
        let (_dir, args, config) = fixture(registry, &["Telegram"]);

        let logs = Capture::default();
        let sink = logs.clone();
        let filter = EnvFilter::new(logging::default_directives("warn"));
        let subscriber = logging::subscriber(filter, move || sink.clone());

        let mut out = Vec::new();
        tracing::subscriber::with_default(subscriber, || run(&args, &config, &mut out)).unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, json!([{"text": "first"}, {"text": "second"}]));

        let logged = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("outside the allow-list"));
    }
}
