//! adsim CLI
//!
//! Shows which destination URLs a set of filter lists or hosts files would
//! block when requested from a source page.

mod report;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};
use regex::Regex;

use adsim::{Decisions, FilterFormat, Simulator, SimulatorConfig};

use report::{write_json, write_text, TextFilter};

#[derive(Parser, Debug)]
#[command(name = "adsim", version)]
#[command(about = "Simulate how filter lists treat requests from a source page")]
#[command(disable_help_flag = true)]
#[command(group(ArgGroup::new("lists").required(true).multiple(true).args(["filters", "hosts"])))]
struct Cli {
    /// Filter list file or inline rules (repeatable)
    #[arg(short = 'f', value_name = "FILTERS")]
    filters: Vec<String>,

    /// Hosts file or inline hosts entries (repeatable)
    #[arg(short = 'h', value_name = "HOSTS")]
    hosts: Vec<String>,

    /// Source page URL, or a file containing it
    #[arg(short = 's', value_name = "SOURCE")]
    source: String,

    /// Destination URL, or a file with one URL per line (repeatable)
    #[arg(short = 'd', value_name = "DESTINATION", required = true)]
    destinations: Vec<String>,

    /// Only report destinations matching this regex
    #[arg(short = 'r', value_name = "REGEX")]
    regex: Option<String>,

    /// Print results as JSON
    #[arg(short = 'j')]
    json: bool,

    /// Print allowed destinations only
    #[arg(short = 'a')]
    allowed_only: bool,

    /// Print blocked destinations only
    #[arg(short = 'b')]
    blocked_only: bool,

    /// Public suffix list to use instead of the bundled one
    #[arg(long, value_name = "FILE")]
    psl: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let decisions = simulate(cli)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = if cli.json {
        write_json(&mut out, &decisions)
    } else {
        let filter = TextFilter {
            allowed_only: cli.allowed_only,
            blocked_only: cli.blocked_only,
        };
        write_text(&mut out, &decisions, filter)
    };

    written
        .and_then(|()| out.flush())
        .map_err(|e| format!("writing results failed: {e}"))
}

/// Load every list, run the simulation and apply `-r`.
fn simulate(cli: &Cli) -> Result<Decisions, String> {
    let pattern = cli
        .regex
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| format!("invalid -r pattern: {e}"))?;

    let config = SimulatorConfig {
        psl_path: cli.psl.clone(),
    };
    let mut sim = Simulator::with_config(config).map_err(|e| format!("loading public suffix list failed: {e}"))?;

    if !cli.filters.is_empty() {
        sim.add_filter_list(&cli.filters, FilterFormat::Standard)
            .map_err(|e| format!("adding filter list failed: {e}"))?;
    }
    if !cli.hosts.is_empty() {
        sim.add_hosts(&cli.hosts)
            .map_err(|e| format!("adding hosts failed: {e}"))?;
    }

    let mut decisions = sim
        .simulate(&cli.source, cli.destinations.as_slice())
        .map_err(|e| format!("simulation failed: {e}"))?;
    log::info!("simulated {} destinations", decisions.len());

    if let Some(pattern) = &pattern {
        decisions.retain_matching(pattern);
    }

    Ok(decisions)
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("adsim").chain(args.iter().copied()))
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn requires_a_list() {
        let err = parse(&["-s", "site.test", "-d", "ads.test"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn short_h_means_hosts() {
        let cli = parse(&["-h", "0.0.0.0 ads.test", "-h", "b.test", "-s", "site.test", "-d", "ads.test"]).unwrap();
        assert_eq!(cli.hosts, vec!["0.0.0.0 ads.test", "b.test"]);
        assert!(cli.filters.is_empty());
    }

    #[test]
    fn regex_keeps_matching_keys() {
        let cli = parse(&["-f", "||bar.com^", "-s", "site.test", "-d", "foo.com", "-d", "bar.com", "-r", "bar"]).unwrap();
        let decisions = simulate(&cli).unwrap();
        assert_eq!(decisions.iter().collect::<Vec<_>>(), vec![("http://bar.com", false)]);
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let cli = parse(&["-f", "||bar.com^", "-s", "site.test", "-d", "bar.com", "-r", "(unclosed"]).unwrap();
        let err = simulate(&cli).unwrap_err();
        assert!(err.starts_with("invalid -r pattern"));
    }

    #[test]
    fn failures_carry_context() {
        let cli = parse(&["-f", "/[/", "-s", "site.test", "-d", "bar.com"]).unwrap();
        let err = simulate(&cli).unwrap_err();
        assert!(err.starts_with("adding filter list failed: "), "{err}");
    }

    #[test]
    fn filters_and_hosts_combine() {
        let cli = parse(&["-f", "||ads.test^", "-h", "0.0.0.0 tracker.test", "-s", "site.test", "-d", "ads.test", "-d", "tracker.test", "-d", "ok.test"]).unwrap();
        let decisions = simulate(&cli).unwrap();
        assert_eq!(decisions.get("http://ads.test"), Some(false));
        assert_eq!(decisions.get("http://tracker.test"), Some(false));
        assert_eq!(decisions.get("http://ok.test"), Some(true));
    }
}
