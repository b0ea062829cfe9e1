//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap origin connects and socket reads with an optional deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - `None` means wait forever, which is the default for every operation
//! - Elapsed deadlines surface as `io::ErrorKind::TimedOut`

use std::future::Future;
use std::io;
use std::time::Duration;

/// Await `fut`, failing with `TimedOut` if `limit` elapses first.
pub async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("operation timed out after {:?}", limit),
            )),
        },
        None => fut.await,
    }
}
