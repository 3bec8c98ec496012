use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThreadConfig {
    /// Remote calls taking longer than this fail like a network error would
    pub request_timeout: Duration,
}

impl Default for ThreadConfig {
    fn default() -> ThreadConfig {
        ThreadConfig {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
