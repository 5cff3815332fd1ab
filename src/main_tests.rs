//! Tests for main.rs functionality

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::*;
    use clap::Parser;

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());

        #[cfg(debug_assertions)]
        assert!(version.ends_with("-UNRELEASED"));

        #[cfg(not(debug_assertions))]
        assert!(!version.contains("UNRELEASED"));
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["pfx2asn", "prefixes.csv"]).unwrap();
        assert_eq!(args.input_file, PathBuf::from("prefixes.csv"));
        assert_eq!(args.output, PathBuf::from("asn_results.csv"));
        assert_eq!(args.workers, 10);
        assert_eq!(args.cache_size, 1000);
        assert_eq!(args.timeout_ms, 5000);
        assert_eq!(args.rdap_url, "https://rdap.org");
        assert!(!args.sort);
        assert!(!args.no_progress);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_short_flags() {
        let args =
            Args::try_parse_from(["pfx2asn", "in.csv", "-o", "out.json", "-w", "25", "-vv"])
                .unwrap();
        assert_eq!(args.output, PathBuf::from("out.json"));
        assert_eq!(args.workers, 25);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_args_require_input() {
        assert!(Args::try_parse_from(["pfx2asn"]).is_err());
        assert!(Args::try_parse_from(["pfx2asn", "in.csv", "-w", "many"]).is_err());
    }

    #[test]
    fn test_build_config() {
        let args = Args::try_parse_from([
            "pfx2asn",
            "in.csv",
            "--workers",
            "3",
            "--cache-size",
            "20",
            "--timeout-ms",
            "250",
            "--rdap-url",
            "https://rdap.apnic.net",
        ])
        .unwrap();

        let config = build_config(&args).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.cache_size, 20);
        assert_eq!(config.lookup_timeout, Duration::from_millis(250));
        assert_eq!(config.rdap_base_url, "https://rdap.apnic.net");
    }

    #[test]
    fn test_build_config_rejects_zero_workers() {
        let args = Args::try_parse_from(["pfx2asn", "in.csv", "-w", "0"]).unwrap();
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("workers must be at least 1"));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), Level::ERROR);
        assert_eq!(log_level(1), Level::INFO);
        assert_eq!(log_level(2), Level::DEBUG);
        assert_eq!(log_level(7), Level::TRACE);
    }

    #[test]
    fn test_bar_reporter_tracks_position() {
        let reporter = BarReporter(ProgressBar::hidden());
        reporter.on_progress(2, 5);
        assert_eq!(reporter.0.position(), 2);
        assert_eq!(reporter.0.length(), Some(5));
    }

    #[test]
    fn test_bar_reporter_knows_total_before_first_completion() {
        let reporter = BarReporter(progress_bar(true));
        reporter.on_progress(0, 40);
        assert_eq!(reporter.0.position(), 0);
        assert_eq!(reporter.0.length(), Some(40));
    }
}
