use std::error::Error;

use sidepipe::cli::LogLevel;
use sidepipe::logging::filter_directives;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn cli_level_beats_environment() -> TestResult {
    assert_eq!(
        filter_directives(Some(LogLevel::Debug), Some("sidepipe=trace")),
        "debug"
    );
    Ok(())
}

#[test]
fn environment_directives_pass_through() -> TestResult {
    assert_eq!(
        filter_directives(None, Some(" warn,sidepipe::invoke=trace ")),
        "warn,sidepipe::invoke=trace"
    );
    Ok(())
}

#[test]
fn defaults_to_info() -> TestResult {
    assert_eq!(filter_directives(None, None), "info");
    assert_eq!(filter_directives(None, Some("  ")), "info");
    Ok(())
}
