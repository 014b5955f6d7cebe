use bytes::Bytes;

/// A command ready to be sent to the server.
///
/// An ordered, non-empty sequence of binary-safe arguments whose first
/// element is always the command name's raw bytes. Argument lengths are
/// computed from the bytes themselves at encode time.
///
/// # Example
///
/// ```
/// use respline::Cmd;
///
/// let cmd = Cmd::new("SET").arg("key").arg("value");
/// assert_eq!(cmd.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Cmd {
    args: Vec<Bytes>,
}

impl Cmd {
    /// Creates a new command with the given name.
    #[inline]
    pub fn new(name: impl Into<Bytes>) -> Self {
        Self {
            args: vec![name.into()],
        }
    }

    /// Appends an argument to the command.
    #[inline]
    pub fn arg<T: Into<Bytes>>(mut self, arg: T) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Number of arguments, including the command name. Always at least 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Always false: a command carries at least its name.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the raw argument blobs in order.
    #[inline]
    pub fn args(&self) -> impl Iterator<Item = &Bytes> {
        self.args.iter()
    }
}

/// Creates a PING command.
#[inline]
pub fn ping() -> Cmd {
    Cmd::new("PING")
}

/// Creates an ECHO command.
#[inline]
pub fn echo(msg: impl Into<Bytes>) -> Cmd {
    Cmd::new("ECHO").arg(msg)
}

/// Creates an ASKING command, sent to the target of an ASK redirect before
/// retrying the redirected command.
#[inline]
pub fn asking() -> Cmd {
    Cmd::new("ASKING")
}
