use std::error::Error;
use std::time::Duration;

use sidepipe::errors::InvocationError;
use sidepipe::invoke::{EngineOptions, invoke, invoke_with};
use sidepipe_test_utils::builders::shell_request;
use sidepipe_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn large_transfers_on_all_channels_do_not_deadlock() -> TestResult {
    init_tracing();

    // 3 MiB in, 3 MiB back on stdout, 4 MiB on the side channel, all
    // concurrently. Every one of these is far beyond a pipe buffer.
    let input: Vec<u8> = (0..3 * 1024 * 1024)
        .map(|i| b'a' + (i % 26) as u8)
        .collect();
    let req = shell_request(r#"head -c 4194304 /dev/zero > "$1" & cat; wait"#)
        .with_input(input.clone())
        .with_timeout(Duration::from_secs(5));

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.text.as_bytes(), &input[..]);
    assert_eq!(result.binary.len(), 4 * 1024 * 1024);
    assert!(result.binary.iter().all(|&b| b == 0));
    Ok(())
}

#[tokio::test]
async fn interleaved_writes_keep_per_channel_order() -> TestResult {
    init_tracing();

    let req = shell_request(
        r#"exec 3>"$1"
for i in 1 2 3 4; do
  printf "t$i"
  printf "b$i" >&3
  sleep 0.05
done"#,
    );

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.text, "t1t2t3t4");
    assert_eq!(result.binary, b"b1b2b3b4");
    Ok(())
}

#[tokio::test]
async fn empty_input_closes_stdin_immediately() -> TestResult {
    init_tracing();

    let req = shell_request("cat; printf done").with_timeout(Duration::from_secs(2));

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.text, "done");
    assert!(result.binary.is_empty());
    Ok(())
}

#[tokio::test]
async fn tool_that_ignores_stdin_still_succeeds() -> TestResult {
    init_tracing();

    // The child exits without reading; the unsent input is discarded.
    let req = shell_request("printf ignored")
        .with_input(vec![b'x'; 1024 * 1024])
        .with_timeout(Duration::from_secs(2));

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.text, "ignored");
    Ok(())
}

#[tokio::test]
async fn early_exit_with_unsent_input_reports_exit_code() -> TestResult {
    init_tracing();

    let req = shell_request("exit 3")
        .with_input(vec![b'x'; 1024 * 1024])
        .with_timeout(Duration::from_secs(2));

    match with_timeout(invoke(&req)).await {
        Err(InvocationError::ToolFailure { exit_code, .. }) => assert_eq!(exit_code, 3),
        other => panic!("expected ToolFailure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_text_is_decoded_lossily() -> TestResult {
    init_tracing();

    let req = shell_request(r"printf '\377\376ok'");

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.text, "\u{FFFD}\u{FFFD}ok");
    Ok(())
}

#[tokio::test]
async fn binary_side_channel_is_byte_exact() -> TestResult {
    init_tracing();

    let req = shell_request(r#"printf '\000\377\012\015' > "$1""#);

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.binary, vec![0x00, 0xff, 0x0a, 0x0d]);
    assert!(result.text.is_empty());
    Ok(())
}

#[tokio::test]
async fn merged_stderr_lands_on_text_channel() -> TestResult {
    init_tracing();

    let req = shell_request("printf out; printf err >&2").with_merge_stderr(true);

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.text, "outerr");
    Ok(())
}

#[tokio::test]
async fn kind_placeholder_is_substituted() -> TestResult {
    init_tracing();

    let req = shell_request(r#"printf '%s' "$2""#).with_side_channel_kind("png16m");

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.text, "png16m");
    Ok(())
}

#[tokio::test]
async fn side_channel_is_a_dev_fd_path() -> TestResult {
    init_tracing();

    let req = shell_request(r#"printf '%s' "$1""#);

    let result = with_timeout(invoke(&req)).await?;

    let fd: u32 = result
        .text
        .strip_prefix("/dev/fd/")
        .ok_or("side channel path should start with /dev/fd/")?
        .parse()?;
    assert!(fd > 2);
    Ok(())
}

#[tokio::test]
async fn slow_but_steady_tool_is_not_timed_out() -> TestResult {
    init_tracing();

    // Total runtime well above the budget; every gap well below it.
    let req = shell_request("for i in 1 2 3 4 5 6 7 8; do printf .; sleep 0.1; done")
        .with_timeout(Duration::from_millis(400));

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.text, "........");
    Ok(())
}

#[tokio::test]
async fn side_channel_closed_early_does_not_end_invocation() -> TestResult {
    init_tracing();

    let req = shell_request(
        r#"exec 3>"$1"
printf payload >&3
exec 3>&-
sleep 0.1
printf finished"#,
    );

    let result = with_timeout(invoke(&req)).await?;

    assert_eq!(result.binary, b"payload");
    assert_eq!(result.text, "finished");
    Ok(())
}

#[tokio::test]
async fn killed_by_signal_reports_shell_style_code() -> TestResult {
    init_tracing();

    let req = shell_request("printf before; kill -9 $$");

    match with_timeout(invoke(&req)).await {
        Err(InvocationError::ToolFailure { exit_code, partial }) => {
            assert_eq!(exit_code, 137);
            assert_eq!(partial.text, "before");
        }
        other => panic!("expected ToolFailure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn small_read_chunk_still_collects_everything() -> TestResult {
    init_tracing();

    let options = EngineOptions {
        read_chunk: 7,
        ..EngineOptions::default()
    };
    let input = b"the quick brown fox jumps over the lazy dog".repeat(100);
    let req = shell_request(r#"tee "$1""#).with_input(input.clone());

    let result = with_timeout(invoke_with(&req, &options)).await?;

    assert_eq!(result.text.as_bytes(), &input[..]);
    assert_eq!(result.binary, input);
    Ok(())
}
