//! CLI argument definitions.

use camino::Utf8PathBuf;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

/// Build reproducible Python wheels that wrap prebuilt executables.
#[derive(Parser, Debug)]
#[command(name = "binary-wheel-builder")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build reproducible Python wheels that wrap prebuilt executables.\n\n",
    "Reads a TOML configuration naming the distribution, its metadata, the target ",
    "platforms, and where each platform's binary comes from, then writes one wheel ",
    "per platform. Identical inputs always produce byte-identical wheels.\n\n",
    "Each built wheel is printed as `<sha256>  <path>` on stdout. Failures are ",
    "reported on stderr; remaining platforms are still built unless --fail-fast ",
    "is given.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build every configured platform into ./dist:\n",
    "    $ binary-wheel-builder --config wheel.toml\n\n",
    "  Build only Linux x86_64 and check the result:\n",
    "    $ binary-wheel-builder -p linux-x86_64 --verify\n\n",
    "  Show the platform catalogue:\n",
    "    $ binary-wheel-builder --list-platforms",
))]
pub struct Cli {
    /// Wheel configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "wheel.toml")]
    pub config: Utf8PathBuf,

    /// Directory to write wheels into.
    #[arg(short, long, value_name = "DIR", default_value = "dist")]
    pub output_dir: Utf8PathBuf,

    /// Build only this platform (can be repeated).
    #[arg(short, long = "platform", value_name = "NAME")]
    pub platforms: Vec<String>,

    /// Stop at the first failed platform.
    #[arg(long)]
    pub fail_fast: bool,

    /// Read each wheel back and check its RECORD and METADATA.
    #[arg(long)]
    pub verify: bool,

    /// Print results as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Print the platform catalogue and exit.
    #[arg(long)]
    pub list_platforms: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Map `-q` and `-v` flags to a log level.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
