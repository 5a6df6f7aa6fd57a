use proptest::prelude::*;

use sidepipe::invoke::invoke;
use sidepipe_test_utils::builders::shell_request;
use sidepipe_test_utils::init_tracing;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build tokio runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Whatever goes in on stdin comes back unchanged on the side channel.
    #[test]
    fn side_channel_preserves_arbitrary_bytes(
        payload in prop::collection::vec(any::<u8>(), 0..200_000)
    ) {
        init_tracing();
        let rt = runtime();

        let req = shell_request(r#"cat > "$1""#).with_input(payload.clone());
        let result = rt.block_on(invoke(&req));

        let result = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(result.exit_code, 0);
        prop_assert!(result.text.is_empty());
        prop_assert_eq!(result.binary, payload);
    }

    /// Text that is valid UTF-8 survives the text channel unchanged.
    #[test]
    fn text_channel_preserves_utf8(text in "\\PC{0,2000}") {
        init_tracing();
        let rt = runtime();

        let req = shell_request("cat").with_input(text.clone().into_bytes());
        let result = rt.block_on(invoke(&req));

        let result = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(result.text, text);
        prop_assert!(result.binary.is_empty());
    }
}
