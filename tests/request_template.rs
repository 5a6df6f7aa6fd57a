use std::error::Error;
use std::time::Duration;

use sidepipe::invoke::InvocationRequest;
use sidepipe::invoke::request::fd_path;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn placeholders_are_substituted_everywhere() -> TestResult {
    let req = InvocationRequest::new(["tool", "--out={side_channel}", "{side_channel_kind}:{side_channel}"])
        .with_side_channel_kind("png16m");

    assert!(req.references_side_channel());
    assert_eq!(
        req.resolve_argv(&fd_path(5)),
        vec![
            "tool".to_string(),
            "--out=/dev/fd/5".to_string(),
            "png16m:/dev/fd/5".to_string(),
        ]
    );
    // The template itself is unchanged.
    assert_eq!(req.argv()[1], "--out={side_channel}");
    Ok(())
}

#[test]
fn builder_sets_every_field() -> TestResult {
    let req = InvocationRequest::new(vec!["cat".to_string()])
        .with_input(b"hello".to_vec())
        .with_timeout(Duration::from_secs(2))
        .with_max_runtime(Duration::from_secs(30))
        .with_merge_stderr(true);

    assert_eq!(req.program(), "cat");
    assert_eq!(req.input(), b"hello");
    assert_eq!(req.timeout(), Some(Duration::from_secs(2)));
    assert_eq!(req.max_runtime(), Some(Duration::from_secs(30)));
    assert!(req.merge_stderr());
    assert!(!req.references_side_channel());
    assert_eq!(req.side_channel_kind(), "");

    let cleared = req.with_timeout(None);
    assert_eq!(cleared.timeout(), None);
    Ok(())
}

#[test]
fn empty_template_has_empty_program() -> TestResult {
    let req = InvocationRequest::new(Vec::<String>::new());
    assert_eq!(req.program(), "");
    assert!(req.resolve_argv("/dev/fd/3").is_empty());
    Ok(())
}
