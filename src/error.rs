use std::fmt;

/// Engine-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the engine.
///
/// Most operations accumulate per-resource failures into [`Error::Multi`] and
/// continue; a single fatal condition (bad function argument, broken path
/// syntax) aborts the invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A path expression or WHERE filter failed to parse. Carries the
    /// offending substring so callers can point at it.
    #[error("syntax error in {context}: unexpected input at '{offending}'")]
    Syntax {
        context: &'static str,
        offending: String,
    },

    /// An argument or scalar had the wrong type.
    #[error("type error: {0}")]
    Type(String),

    /// A delete/upsert target or function registration was missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A document was structurally unusable (no kind, malformed name, bad
    /// YAML), attributed to the file it came from.
    #[error("malformed resource in {file}: {detail}")]
    Schema { file: String, detail: String },

    /// Template or regex compilation failure. Fatal.
    #[error("internal error: {0}")]
    Internal(String),

    /// Several independent failures, joined.
    #[error("{0}")]
    Multi(MultiError),
}

impl Error {
    pub fn type_mismatch(expected: &str, got: &str, at: &str) -> Error {
        Error::Type(format!("expected {} at {}, got {}", expected, at, got))
    }
}

/// Accumulator for collect-and-continue flows. Empty means success.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<Error>,
}

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: Error) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Finish an accumulation: `ok` when nothing was collected, otherwise the
    /// joined error.
    pub fn into_result<T>(self, ok: T) -> Result<T> {
        if self.is_empty() {
            Ok(ok)
        } else {
            Err(Error::Multi(self))
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
            first = false;
        }
        Ok(())
    }
}

impl From<MultiError> for Error {
    fn from(multi: MultiError) -> Error {
        Error::Multi(multi)
    }
}
