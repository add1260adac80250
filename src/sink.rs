//! The contract between the encoder and whatever carries the body,
//! normally the output half of a http request.
//!
//! Establishing the connection, sending the request and reading the
//! response are not done by this crate.
use std::io::{self, Write};

/// Output for a multipart body.
///
/// The body itself is written through the `io::Write` impl.
pub trait Sink: Write {

    /// Announces that a request body with the given content type follows.
    ///
    /// This is called once per build before anything is written. For a
    /// http transport this is where the `Content-Type` header is set and
    /// the request is switched to carry an output body.
    fn declare_body(&mut self, content_type: &str) -> io::Result<()>;

    /// Releases the output layer.
    ///
    /// This is called exactly once per build, whether writing the body
    /// succeeded or not. It only needs to release the body, not the
    /// underlying transport.
    fn close_body(&mut self) -> io::Result<()>;
}

impl<'a, S: Sink + ?Sized> Sink for &'a mut S {
    fn declare_body(&mut self, content_type: &str) -> io::Result<()> {
        (**self).declare_body(content_type)
    }

    fn close_body(&mut self) -> io::Result<()> {
        (**self).close_body()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn declare_body(&mut self, content_type: &str) -> io::Result<()> {
        (**self).declare_body(content_type)
    }

    fn close_body(&mut self) -> io::Result<()> {
        (**self).close_body()
    }
}

/// Turns any `io::Write` (a buffer, a file, a socket) into a `Sink`.
///
/// The declared content type is recorded so it can be passed on to the
/// transport. Closing flushes the writer, any write after that fails.
///
/// ```
/// use std::io::Write;
/// use multipart_data_builder::{Sink, WriterSink};
///
/// let mut sink = WriterSink::new(Vec::new());
/// sink.declare_body("multipart/form-data; boundary=xyz").unwrap();
/// sink.write_all(b"--xyz--\r\n").unwrap();
/// sink.close_body().unwrap();
///
/// assert!(sink.is_closed());
/// assert_eq!(sink.content_type(), Some("multipart/form-data; boundary=xyz"));
/// assert_eq!(sink.into_inner(), b"--xyz--\r\n".to_vec());
/// ```
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
    content_type: Option<String>,
    closed: bool,
}

impl<W: Write> WriterSink<W> {

    pub fn new(inner: W) -> Self {
        WriterSink {
            inner,
            content_type: None,
            closed: false,
        }
    }

    /// the content type passed to `declare_body`
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_ref().map(|ct| &**ct)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "body was already closed"))
        } else {
            Ok(())
        }
    }
}

impl<W: Write> Write for WriterSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.inner.flush()
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn declare_body(&mut self, content_type: &str) -> io::Result<()> {
        self.check_open()?;
        self.content_type = Some(content_type.to_owned());
        Ok(())
    }

    fn close_body(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.inner.flush()
    }
}
