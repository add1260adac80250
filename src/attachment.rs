//! Binary fields ("attachments") of a multipart body.
//!
//! An `Attachment` couples the file name announced in the
//! `Content-Disposition` of its part with a `StreamSource`, which
//! is asked to open a byte stream only when the part is written.
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mime::Mime;
use mime_guess;

/// the stream an attachment is copied from
pub type ByteStream = Box<dyn Read + Send>;

/// Something an attachment can open a byte stream on.
///
/// `open_stream` is called at most once per build. After the bytes
/// were copied the stream is handed back through `close_stream`, which
/// by default drops (and through this closes) it. Sources which want to
/// keep a shared stream alive can override `close_stream`.
pub trait StreamSource: Send {
    fn open_stream(&mut self) -> io::Result<ByteStream>;

    fn close_stream(&mut self, stream: ByteStream) -> io::Result<()> {
        drop(stream);
        Ok(())
    }
}

/// Opens a file from the file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSource {
    path: PathBuf
}

impl PathSource {

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        PathSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// the last component of the path, `""` if there is none
    pub fn file_name(&self) -> String {
        self.path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl StreamSource for PathSource {
    fn open_stream(&mut self) -> io::Result<ByteStream> {
        let file = File::open(&self.path)?;
        Ok(Box::new(file))
    }
}

/// Opens streams by calling a closure, e.g. to read from an
/// asset bundle, a network resource or memory.
pub struct FnSource<F> {
    opener: F
}

impl<F> FnSource<F> {
    pub fn new(opener: F) -> Self {
        FnSource { opener }
    }
}

impl<F, R> StreamSource for FnSource<F>
    where F: FnMut() -> io::Result<R> + Send,
          R: Read + Send + 'static
{
    fn open_stream(&mut self) -> io::Result<ByteStream> {
        let reader = (self.opener)()?;
        Ok(Box::new(reader))
    }
}

/// Hands out an already open reader, this can only be opened once.
pub struct ReaderSource<R> {
    reader: Option<R>
}

impl<R> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        ReaderSource { reader: Some(reader) }
    }
}

impl<R> StreamSource for ReaderSource<R>
    where R: Read + Send + 'static
{
    fn open_stream(&mut self) -> io::Result<ByteStream> {
        match self.reader.take() {
            Some(reader) => Ok(Box::new(reader)),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "the reader of this attachment was already consumed"
            ))
        }
    }
}

/// A binary field of a multipart body.
pub struct Attachment {
    file_name: String,
    content_type: Option<Mime>,
    source: Box<dyn StreamSource>,
    stream: Option<ByteStream>,
}

impl Attachment {

    pub fn new<N, S>(file_name: N, source: S) -> Self
        where N: Into<String>, S: StreamSource + 'static
    {
        Attachment {
            file_name: file_name.into(),
            content_type: None,
            source: Box::new(source),
            stream: None,
        }
    }

    /// an attachment reading the file at `path`, named like the file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let source = PathSource::new(path.as_ref());
        Attachment::new(source.file_name(), source)
    }

    /// an attachment reading the file at `path`, announced with a different name
    pub fn from_path_with_name<P, N>(path: P, file_name: N) -> Self
        where P: AsRef<Path>, N: Into<String>
    {
        Attachment::new(file_name, PathSource::new(path.as_ref()))
    }

    /// an attachment which calls `opener` to get its stream
    ///
    /// ```
    /// use std::io::{self, Cursor};
    /// use multipart_data_builder::Attachment;
    ///
    /// let attachment = Attachment::from_fn("testfile.txt", || {
    ///     Ok::<_, io::Error>(Cursor::new(b"hello".to_vec()))
    /// });
    /// assert_eq!(attachment.file_name(), "testfile.txt");
    /// ```
    pub fn from_fn<N, F, R>(file_name: N, opener: F) -> Self
        where N: Into<String>,
              F: FnMut() -> io::Result<R> + Send + 'static,
              R: Read + Send + 'static
    {
        Attachment::new(file_name, FnSource::new(opener))
    }

    /// an attachment with in memory content
    pub fn from_bytes<N, B>(file_name: N, data: B) -> Self
        where N: Into<String>, B: Into<Vec<u8>>
    {
        let data: Vec<u8> = data.into();
        let data: Arc<[u8]> = Arc::from(data);
        Attachment::from_fn(file_name, move || {
            Ok::<_, io::Error>(Cursor::new(data.clone()))
        })
    }

    /// an attachment reading from an already open reader
    ///
    /// As the reader can not be rewound the attachment can only be
    /// written once.
    pub fn from_reader<N, R>(file_name: N, reader: R) -> Self
        where N: Into<String>, R: Read + Send + 'static
    {
        Attachment::new(file_name, ReaderSource::new(reader))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name<N: Into<String>>(&mut self, file_name: N) {
        self.file_name = file_name.into();
    }

    pub fn with_file_name<N: Into<String>>(mut self, file_name: N) -> Self {
        self.set_file_name(file_name);
        self
    }

    /// uses the given content type instead of guessing one from the file name
    pub fn with_content_type(mut self, content_type: Mime) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// the explicitly set content type or the one guessed from the file name
    pub fn content_type(&self) -> Mime {
        match self.content_type {
            Some(ref content_type) => content_type.clone(),
            None => guess_content_type(&self.file_name)
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// returns the stream of this attachment, opening it if necessary
    ///
    /// Calling this multiple times returns the same stream until `close`
    /// is called.
    pub fn stream(&mut self) -> io::Result<&mut ByteStream> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.source.open_stream()?
        };
        Ok(self.stream.get_or_insert(stream))
    }

    /// hands the open stream back to the source, a no-op if it was never opened
    pub fn close(&mut self) -> io::Result<()> {
        match self.stream.take() {
            Some(stream) => self.source.close_stream(stream),
            None => Ok(())
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        fter.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("is_open", &self.is_open())
            .finish()
    }
}

/// guesses the media type based on the extension of `file_name`
///
/// Falls back to `application/octet-stream`.
pub fn guess_content_type(file_name: &str) -> Mime {
    mime_guess::from_path(file_name).first_or_octet_stream()
}
