//! Command line converter for Maya geometry caches

// standard library
use std::error::Error as _;
use std::process::ExitCode;

// external crates
use clap::Parser;
use log::info;
use mctools_description::CacheDescriptor;
use mctools_mcc::{convert_cache, host_swap_policy, inspect_cache, ConvertOptions, Error};

/// Convert a Maya cache from float to double vector arrays
#[derive(Parser, Debug)]
#[command(name = "cacheconvert", version, about, arg_required_else_help = true)]
struct Cli {
    /// Cache description file (.xml) to convert
    #[arg(short = 'f', long = "file", value_name = "metadataFile")]
    file: String,

    /// Base name of the converted description and data files
    #[arg(
        short = 'o',
        long = "output",
        value_name = "outputBaseName",
        required_unless_present = "inspect"
    )]
    output: Option<String>,

    /// Byte swap values, defaults to true on Windows and Linux hosts
    #[arg(long, value_name = "true|false")]
    swap: Option<bool>,

    /// Convert per-frame files in parallel
    #[arg(long)]
    parallel: bool,

    /// Print the structure of the data files instead of converting
    #[arg(long)]
    inspect: bool,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence logging and the progress bar
    #[arg(short, long)]
    quiet: bool,
}

/// Exit status for every failed conversion, the same as a usage error
const FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(&e),
    }
}

/// Print an error with its sources and give the exit status
fn fatal(e: &Error) -> ExitCode {
    // printed directly so the diagnostic survives --quiet
    eprintln!("error: {e}");
    let mut source = e.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    ExitCode::from(FATAL)
}

fn run(cli: &Cli) -> Result<(), Error> {
    let cache = CacheDescriptor::from_file(&cli.file)?;
    let options = ConvertOptions {
        swap_bytes: cli.swap.unwrap_or_else(host_swap_policy),
        parallel: cli.parallel,
        progress: !cli.quiet && cli.verbose == 0,
    };

    if cli.inspect {
        println!("{cache}");
        for (path, summary) in inspect_cache(&cache, options.swap_bytes)? {
            println!("{}", path.display());
            print!("{summary}");
        }
        return Ok(());
    }

    // clap guarantees an output name outside of inspect mode
    let output = cli.output.as_deref().unwrap_or_default();
    let report = convert_cache(&cache, output, &options)?;
    info!(
        "Converted {} channels across {} samples in {} files",
        report.converted_channels(),
        report.samples(),
        report.files.len()
    );
    Ok(())
}

fn init_logging(cli: &Cli) {
    // errors and warnings by default, info and above with -v
    let result = stderrlog::new()
        .module(module_path!())
        .module("mctools_mcc")
        .module("mctools_description")
        .quiet(cli.quiet)
        .verbosity(cli.verbose as usize + 1)
        .show_level(false)
        .timestamp(stderrlog::Timestamp::Off)
        .init();

    if let Err(e) = result {
        eprintln!("unable to initialise logging: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_convert_arguments() {
        let cli = Cli::try_parse_from([
            "cacheconvert",
            "-f",
            "cache.xml",
            "-o",
            "double",
            "--swap",
            "false",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.file, "cache.xml");
        assert_eq!(cli.output.as_deref(), Some("double"));
        assert_eq!(cli.swap, Some(false));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.parallel);
    }

    #[test]
    fn test_output_required_unless_inspecting() {
        let error = Cli::try_parse_from(["cacheconvert", "-f", "cache.xml"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(error.exit_code(), 2);

        let cli = Cli::try_parse_from(["cacheconvert", "-f", "cache.xml", "--inspect"]).unwrap();
        assert!(cli.inspect);
        assert_eq!(cli.output, None);
    }

    #[test]
    fn test_fatal_errors_exit_with_usage_status() {
        let errors = [
            Error::UnsupportedVersion(3.0),
            Error::UnknownCacheType("OneFilePerObject".into()),
            Error::MissingFile("cache.mc".into()),
            Error::InvalidFrameName("baseFrameX".into()),
            Error::MalformedCache {
                expected: "FOR4".into(),
                found: "end of file".into(),
                offset: 48,
            },
            std::io::Error::other("disk full").into(),
        ];
        for e in &errors {
            assert_eq!(fatal(e), ExitCode::from(2), "{e}");
        }
    }

    #[test]
    fn test_invalid_swap_value() {
        let args = ["cacheconvert", "-f", "a", "-o", "b", "--swap", "maybe"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
