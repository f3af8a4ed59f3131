//! Engine argv construction from task configuration.

use crate::config::EngineDefaults;
use crate::task::TaskConfig;
use std::path::PathBuf;

/// Resolves the engine binary for a task (per-task override, else default).
pub fn engine_binary(cfg: &TaskConfig, defaults: &EngineDefaults) -> PathBuf {
    cfg.engine_path
        .clone()
        .unwrap_or_else(|| defaults.engine_path.clone())
}

/// Builds the full engine argv for one task, URL last.
///
/// `-c` is always passed: with no control file next to the output the engine
/// starts fresh, with one it resumes, so start and resume share one argv.
/// `--summary-interval=1` keeps the piped readout at one line per second
/// (the engine's default on a pipe is one per minute).
pub fn build_args(cfg: &TaskConfig, defaults: &EngineDefaults) -> Vec<String> {
    let mut args = vec![
        "-c".to_string(),
        format!("--file-allocation={}", defaults.file_allocation),
        format!("--split={}", cfg.split),
        format!("--max-connection-per-server={}", cfg.max_connections),
        format!("--max-tries={}", cfg.max_tries),
        format!("--retry-wait={}", cfg.retry_wait_secs),
        "--summary-interval=1".to_string(),
    ];

    if let Some(limit) = &cfg.max_download_limit {
        args.push(format!("--max-download-limit={limit}"));
    }
    if let Some(limit) = &cfg.max_upload_limit {
        args.push(format!("--max-upload-limit={limit}"));
    }
    if let Some(referer) = &cfg.referer {
        args.push(format!("--referer={referer}"));
    }
    if let Some(agent) = &cfg.user_agent {
        args.push(format!("--user-agent={agent}"));
    }
    for header in &cfg.headers {
        args.push(format!("--header={header}"));
    }

    // The output name is fixed at add time; never let the engine rename it.
    args.push("--allow-overwrite=true".to_string());
    args.push("--auto-file-renaming=false".to_string());

    args.push("-d".to_string());
    args.push(cfg.dir.to_string_lossy().into_owned());
    args.push("-o".to_string());
    args.push(cfg.out.clone());

    args.extend(cfg.extra_args.iter().cloned());
    args.push(cfg.url.clone());
    args
}

/// Splits a raw extra-arguments string into argv entries, honoring single
/// and double quotes. An unterminated quote swallows the rest as one entry.
pub fn split_args(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quote: Option<char> = None;
    for c in s.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    cur.push(c);
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                c if c.is_whitespace() => {
                    if !cur.is_empty() {
                        out.push(std::mem::take(&mut cur));
                    }
                }
                _ => cur.push(c),
            },
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> EngineDefaults {
        EngineDefaults::default()
    }

    #[test]
    fn default_argv_shape() {
        let cfg = TaskConfig::new("https://example.com/a/file.iso", "/tmp/dl", &defaults());
        let args = build_args(&cfg, &defaults());
        assert_eq!(
            args,
            vec![
                "-c",
                "--file-allocation=none",
                "--split=4",
                "--max-connection-per-server=4",
                "--max-tries=5",
                "--retry-wait=0",
                "--summary-interval=1",
                "--allow-overwrite=true",
                "--auto-file-renaming=false",
                "-d",
                "/tmp/dl",
                "-o",
                "file.iso",
                "https://example.com/a/file.iso",
            ]
        );
    }

    #[test]
    fn optional_flags_and_headers() {
        let mut cfg = TaskConfig::new("https://example.com/f.bin", "/tmp", &defaults());
        cfg.max_download_limit = Some("500K".to_string());
        cfg.max_upload_limit = Some("1K".to_string());
        cfg.referer = Some("https://example.com/".to_string());
        cfg.user_agent = Some("a2dm/0.1".to_string());
        cfg.headers.push("Accept: */*".to_string());
        cfg.headers.push("X-Token: abc".to_string());

        let args = build_args(&cfg, &defaults());
        assert!(args.contains(&"--max-download-limit=500K".to_string()));
        assert!(args.contains(&"--max-upload-limit=1K".to_string()));
        assert!(args.contains(&"--referer=https://example.com/".to_string()));
        assert!(args.contains(&"--user-agent=a2dm/0.1".to_string()));
        assert!(args.contains(&"--header=Accept: */*".to_string()));
        assert!(args.contains(&"--header=X-Token: abc".to_string()));
    }

    #[test]
    fn extra_args_precede_url() {
        let mut cfg = TaskConfig::new("https://example.com/f.bin", "/tmp", &defaults());
        cfg.extra_args = vec!["--check-certificate=false".to_string()];
        let args = build_args(&cfg, &defaults());
        let n = args.len();
        assert_eq!(args[n - 2], "--check-certificate=false");
        assert_eq!(args[n - 1], "https://example.com/f.bin");
    }

    #[test]
    fn per_task_engine_override() {
        let mut cfg = TaskConfig::new("https://example.com/f.bin", "/tmp", &defaults());
        assert_eq!(engine_binary(&cfg, &defaults()), PathBuf::from("aria2c"));
        cfg.engine_path = Some(PathBuf::from("/opt/aria2/bin/aria2c"));
        assert_eq!(
            engine_binary(&cfg, &defaults()),
            PathBuf::from("/opt/aria2/bin/aria2c")
        );
    }

    #[test]
    fn split_args_handles_quotes() {
        assert_eq!(split_args(""), Vec::<String>::new());
        assert_eq!(split_args("--foo --bar=1"), vec!["--foo", "--bar=1"]);
        assert_eq!(
            split_args(r#"--header "X: a b" --foo"#),
            vec!["--header", "X: a b", "--foo"]
        );
        assert_eq!(
            split_args("--out='two words'"),
            vec!["--out=two words"]
        );
        // Unterminated quote keeps the tail as one entry.
        assert_eq!(split_args(r#"--a "b c"#), vec!["--a", "b c"]);
    }
}
