use std::fmt;

/// An error produced by a [`Process`][crate::process::Process].
///
/// Every variant carries the process [`name`][Error::kind] and, where
/// applicable, the offending port or configuration key, so that a pipeline
/// assembler can report a failure without needing to re-derive which
/// process and port it came from.
#[non_exhaustive]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Get the kind of error.
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[inline]
    pub(crate) fn connect_to_initialized_process(process: String, port: String) -> Self {
        Self::new(ErrorKind::ConnectToInitializedProcess { process, port })
    }

    #[inline]
    pub(crate) fn port_reconnect(process: String, port: String) -> Self {
        Self::new(ErrorKind::PortReconnect { process, port })
    }

    #[inline]
    pub(crate) fn no_such_port(process: String, port: String) -> Self {
        Self::new(ErrorKind::NoSuchPort { process, port })
    }

    #[inline]
    pub(crate) fn missing_connection(process: String, port: String) -> Self {
        Self::new(ErrorKind::MissingConnection { process, port })
    }

    #[inline]
    pub(crate) fn reinitialization(process: String) -> Self {
        Self::new(ErrorKind::Reinitialization { process })
    }

    #[inline]
    pub(crate) fn uninitialized(process: String) -> Self {
        Self::new(ErrorKind::Uninitialized { process })
    }

    #[inline]
    pub(crate) fn unknown_configuration_value(process: String, key: String) -> Self {
        Self::new(ErrorKind::UnknownConfigurationValue { process, key })
    }

    #[inline]
    pub(crate) fn invalid_configuration_value(
        process: String,
        key: String,
        expected: &'static str,
    ) -> Self {
        Self::new(ErrorKind::InvalidConfigurationValue {
            process,
            key,
            expected,
        })
    }

    #[inline]
    pub(crate) fn missing_required_input(process: String, port: String) -> Self {
        Self::new(ErrorKind::MissingRequiredInput { process, port })
    }

    #[inline]
    pub(crate) fn declaration_after_init(process: String, name: String) -> Self {
        Self::new(ErrorKind::DeclarationAfterInit { process, name })
    }
}

/// The distinct, inspectable failure kinds a [`Process`][crate::process::Process]
/// can raise.
///
/// A null process config and a null edge/port connection have no Rust
/// equivalent here: both are expressed in terms of `Arc<dyn Trait>` handles,
/// which cannot be null, so the corresponding guard is structurally
/// unreachable and is not represented as a variant.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Input connect called on a process that is already initialized.
    ConnectToInitializedProcess { process: String, port: String },
    /// An input port already has a live edge connected to it.
    PortReconnect { process: String, port: String },
    /// The named port is not declared on this process.
    NoSuchPort { process: String, port: String },
    /// Data was requested from a declared input port with no connected edge.
    MissingConnection { process: String, port: String },
    /// `init()` was called on an already-initialized process.
    Reinitialization { process: String },
    /// `step()` was called before `init()`.
    Uninitialized { process: String },
    /// The configuration key was queried but never declared.
    UnknownConfigurationValue { process: String, key: String },
    /// The configuration value could not be converted to the requested type.
    InvalidConfigurationValue {
        process: String,
        key: String,
        expected: &'static str,
    },
    /// `init()` was called while a `_required` input port has no live edge.
    MissingRequiredInput { process: String, port: String },
    /// A port or configuration key was declared after `init()`.
    DeclarationAfterInit { process: String, name: String },
}

impl std::error::Error for Error {}

impl fmt::Debug for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::ConnectToInitializedProcess { process, port } => write!(
                f,
                "process `{process}`: cannot connect input port `{port}`, process is already initialized"
            ),
            ErrorKind::PortReconnect { process, port } => write!(
                f,
                "process `{process}`: input port `{port}` already has a live edge connected"
            ),
            ErrorKind::NoSuchPort { process, port } => {
                write!(f, "process `{process}`: no such port `{port}`")
            }
            ErrorKind::MissingConnection { process, port } => write!(
                f,
                "process `{process}`: data was requested from unconnected port `{port}`"
            ),
            ErrorKind::Reinitialization { process } => {
                write!(f, "process `{process}`: already initialized")
            }
            ErrorKind::Uninitialized { process } => {
                write!(f, "process `{process}`: step() called before init()")
            }
            ErrorKind::UnknownConfigurationValue { process, key } => write!(
                f,
                "process `{process}`: unknown configuration key `{key}`"
            ),
            ErrorKind::InvalidConfigurationValue {
                process,
                key,
                expected,
            } => write!(
                f,
                "process `{process}`: configuration key `{key}` could not be converted to {expected}"
            ),
            ErrorKind::MissingRequiredInput { process, port } => write!(
                f,
                "process `{process}`: required input port `{port}` has no connected edge"
            ),
            ErrorKind::DeclarationAfterInit { process, name } => write!(
                f,
                "process `{process}`: `{name}` was declared after init()"
            ),
        }
    }
}
