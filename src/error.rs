//! Module containing the error produced when building a multipart body.
use std::fmt::{self, Display};
use std::io;

use failure::{Fail, Context, Backtrace};

/// The kind of failure which aborted the encoding of a body.
#[derive(Copy, Clone, Debug, Fail, PartialEq, Eq, Hash)]
pub enum EncodingErrorKind {
    /// The configured boundary prefix can not be used for a boundary,
    /// i.e. it contains characters not allowed by rfc2046 or is too long.
    #[fail(display = "can not generate a boundary from the configured prefix")]
    InvalidBoundary,

    /// The sink refused to accept a request body.
    #[fail(display = "the sink refused to accept a request body")]
    PrepareFailed,

    /// The byte source of an attachment could not be opened.
    #[fail(display = "opening the attachment stream failed")]
    OpenFailed,

    /// The byte source of an attachment failed while it was copied.
    #[fail(display = "reading from the attachment stream failed")]
    ReadFailed,

    /// The sink rejected a write.
    #[fail(display = "writing to the sink failed")]
    WriteFailed,

    /// Releasing the output layer of the sink failed.
    #[fail(display = "closing the sink failed")]
    CloseFailed,
}

/// The part of the multipart body which was being produced when
/// an error occurred.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Place {
    /// boundary generation and declaring the body to the sink
    Prepare,
    HeaderField { name: String },
    FormField { name: String },
    Attachment { name: String, file_name: String },
    /// the closing boundary delimiter and the final flush
    Terminator,
    /// releasing the sink after the body was written (or failed)
    Cleanup,
}

impl Display for Place {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        use self::Place::*;
        match *self {
            Prepare => write!(fter, "preparation"),
            HeaderField { ref name } => write!(fter, "header field {:?}", name),
            FormField { ref name } => write!(fter, "form field {:?}", name),
            Attachment { ref name, ref file_name } =>
                write!(fter, "attachment {:?} (file {:?})", name, file_name),
            Terminator => write!(fter, "closing delimiter"),
            Cleanup => write!(fter, "cleanup"),
        }
    }
}

/// Error returned by `MultipartEncoder::build`.
///
/// The underlying `io::Error` (if there is one) is available through
/// `Fail::cause` or `EncodingError::io_error`.
#[derive(Debug)]
pub struct EncodingError {
    inner: Context<EncodingErrorKind>,
    place: Option<Place>,
}

impl EncodingError {

    pub fn kind(&self) -> EncodingErrorKind {
        *self.inner.get_context()
    }

    pub fn place(&self) -> Option<&Place> {
        self.place.as_ref()
    }

    /// sets the place if no place was set before
    pub fn with_place_or_else<F>(mut self, func: F) -> Self
        where F: FnOnce() -> Option<Place>
    {
        if self.place.is_none() {
            self.place = func();
        }
        self
    }

    /// returns the io error which caused this error, if there is one
    pub fn io_error(&self) -> Option<&io::Error> {
        self.inner.cause()
            .and_then(|cause| cause.downcast_ref::<io::Error>())
    }
}

impl Fail for EncodingError {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for EncodingError {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        match self.place {
            Some(ref place) => write!(fter, "{} (in {})", self.inner, place),
            None => Display::fmt(&self.inner, fter)
        }
    }
}

impl From<EncodingErrorKind> for EncodingError {
    fn from(kind: EncodingErrorKind) -> Self {
        EncodingError::from(Context::new(kind))
    }
}

impl From<Context<EncodingErrorKind>> for EncodingError {
    fn from(inner: Context<EncodingErrorKind>) -> Self {
        EncodingError { inner, place: None }
    }
}
