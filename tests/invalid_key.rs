//! Lives in its own test binary so the process-wide connect counters start
//! at zero and nothing else in the run moves them.

use frostfs_perf::connect;
use frostfs_perf::error::Error;
use frostfs_perf::net::CONNECT;

#[tokio::test]
async fn invalid_key_aborts_before_any_dial() {
    let result = connect("127.0.0.1:1", "definitely not hex", 1, 1).await;
    assert!(matches!(result, Err(Error::InvalidKey(_))));

    // no dial attempt was made
    assert_eq!(CONNECT.value(), 0);
}
