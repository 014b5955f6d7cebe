use std::time::Duration;

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default size of the input and output buffers, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Connection configuration.
///
/// Built with chained setters in the builder style:
///
/// ```
/// use std::time::Duration;
/// use respline::ClientConfig;
///
/// let config = ClientConfig::new()
///     .connect_timeout(Duration::from_secs(1))
///     .read_timeout(Some(Duration::from_secs(5)))
///     .input_buffer_size(16 * 1024);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    /// Maximum time to wait for a TCP connect (per resolved address).
    pub connect_timeout: Duration,
    /// Socket-level read timeout; `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Wrap the stream in TLS after connecting.
    pub use_tls: bool,
    /// Capacity of the inbound buffer.
    pub input_buffer_size: usize,
    /// Capacity of the outbound buffer.
    pub output_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: Some(DEFAULT_TIMEOUT),
            use_tls: false,
            input_buffer_size: DEFAULT_BUFFER_SIZE,
            output_buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with the defaults: 2000 ms timeouts and
    /// 8 KiB buffers.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connect timeout.
    #[inline]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the socket read timeout. `None` means block indefinitely.
    #[inline]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Enables or disables TLS.
    #[inline]
    pub fn tls(mut self, enabled: bool) -> Self {
        self.use_tls = enabled;
        self
    }

    /// Sets the inbound buffer capacity.
    #[inline]
    pub fn input_buffer_size(mut self, size: usize) -> Self {
        self.input_buffer_size = size;
        self
    }

    /// Sets the outbound buffer capacity.
    #[inline]
    pub fn output_buffer_size(mut self, size: usize) -> Self {
        self.output_buffer_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new();
        assert_eq!(config.connect_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.read_timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(config.input_buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.output_buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(!config.use_tls);
    }

    #[test]
    fn test_builder_chaining() {
        let config = ClientConfig::new()
            .connect_timeout(Duration::from_secs(1))
            .read_timeout(None)
            .tls(true)
            .input_buffer_size(1024)
            .output_buffer_size(512);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.read_timeout, None);
        assert!(config.use_tls);
        assert_eq!(config.input_buffer_size, 1024);
        assert_eq!(config.output_buffer_size, 512);
    }
}
