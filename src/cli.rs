//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use gogdl_core::config::Overrides;
use gogdl_core::http::DEFAULT_BASE_URL;

/// Download installers, patches and extras of titles you own on GOG.
///
/// Searches your library, lets you pick a title and its files, and downloads
/// them into a per-title folder. Interrupted downloads resume on the next run.
#[derive(Parser, Debug)]
#[command(name = "gogdl")]
#[command(author, version, about)]
pub struct Args {
    /// Search text (3+ characters); omit to list every owned title
    pub query: Option<String>,

    /// Item platform: windows/win, linux, mac/osx
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Item language: en, cz, de, es, fr, it, hu, nl, pl, pt, br, sv, tr, uk, ru, ar, ko, cn, jp, all
    #[arg(short, long)]
    pub language: Option<String>,

    /// Title folder template, e.g. "{{title}} [GOG]" or "{{titlePeriods}}.GOG"
    #[arg(short = 't', long = "template")]
    pub template: Option<String>,

    /// Include goodies (manuals, soundtracks, artwork)
    #[arg(short, long)]
    pub goodies: bool,

    /// Where to download to; created if missing
    #[arg(short, long = "out-path")]
    pub out_path: Option<PathBuf>,

    /// Exported browser cookies (JSON)
    #[arg(short, long)]
    pub cookies: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/gogdl/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Catalog origin
    #[arg(long, hide = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Command-line values to merge over the file configuration.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            query: self.query.clone(),
            platform: self.platform.clone(),
            language: self.language.clone(),
            folder_template: self.template.clone(),
            goodies: self.goodies,
            output_dir: self.out_path.clone(),
            cookies_file: self.cookies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["gogdl"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.goodies);
        assert!(args.query.is_none());
        assert_eq!(args.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_cli_short_flags_map_to_overrides() {
        let args = Args::try_parse_from([
            "gogdl", "witcher", "-p", "win", "-l", "en", "-t", "{{titlePeriods}}", "-g", "-o",
            "/tmp/out", "-c", "my-cookies.json",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.query.as_deref(), Some("witcher"));
        assert_eq!(overrides.platform.as_deref(), Some("win"));
        assert_eq!(overrides.language.as_deref(), Some("en"));
        assert_eq!(overrides.folder_template.as_deref(), Some("{{titlePeriods}}"));
        assert!(overrides.goodies);
        assert_eq!(overrides.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(overrides.cookies_file, Some(PathBuf::from("my-cookies.json")));
    }

    #[test]
    fn test_cli_long_flags() {
        let args = Args::try_parse_from([
            "gogdl",
            "--platform",
            "linux",
            "--language",
            "all",
            "--template",
            "x",
            "--goodies",
            "--out-path",
            "dl",
            "--cookies",
            "c.json",
            "--config",
            "gogdl.toml",
        ])
        .unwrap();
        assert_eq!(args.platform.as_deref(), Some("linux"));
        assert_eq!(args.config, Some(PathBuf::from("gogdl.toml")));
        assert!(args.goodies);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["gogdl", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["gogdl", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["gogdl", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["gogdl", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["gogdl", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        let err = Args::try_parse_from(["gogdl", "--concurrency", "4"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
