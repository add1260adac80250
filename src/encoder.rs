//! Module containing the `MultipartEncoder`.
use std::io::{self, Read, Write};
use std::path::Path;

use failure::{Fail, ResultExt};
use indexmap::IndexMap;

use attachment::Attachment;
use boundary::Boundary;
use config::EncoderConfig;
use error::{EncodingError, EncodingErrorKind, Place};
use sink::Sink;

/// Writes header fields, text fields and attachments as a
/// `multipart/form-data` body into a `Sink`.
///
/// Fields are only registered until `build` is called, which then
/// writes the body part by part. Attachments are streamed in chunks,
/// so their size does not matter.
///
/// Fields are kept in the order they were added, adding a field with an
/// already used name replaces the value but keeps the position.
///
/// An encoder is meant to be used once, `build` consumes it. It is not
/// meant to be shared between threads while building, but can be moved
/// to another thread before.
///
/// # Example
///
/// ```
/// use std::io;
/// use multipart_data_builder::{MultipartEncoder, Attachment, WriterSink};
///
/// let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
///     .add_form_field("Form1", "I am Form 1")
///     .add_form_field("Form2", "I am Form 2")
///     .add_attachment("FormFile1", Attachment::from_fn("testfile.txt", || {
///         Ok::<_, io::Error>(io::Cursor::new(b"hello".to_vec()))
///     }))
///     .build()
///     .unwrap();
///
/// assert!(sink.is_closed());
/// assert!(sink.content_type().unwrap().starts_with("multipart/form-data; boundary="));
/// let body = String::from_utf8(sink.into_inner()).unwrap();
/// assert!(body.contains("filename=\"testfile.txt\"\r\nContent-Type: text/plain\r\n"));
/// ```
pub struct MultipartEncoder<S> {
    sink: S,
    config: EncoderConfig,
    header_fields: IndexMap<String, String>,
    form_fields: IndexMap<String, String>,
    attachments: IndexMap<String, Attachment>,
}

impl<S: Sink> MultipartEncoder<S> {

    /// creates an encoder writing into `sink`, announcing text fields with the given charset
    pub fn new<C: Into<String>>(sink: S, charset: C) -> Self {
        MultipartEncoder::with_config(sink, EncoderConfig::default().with_charset(charset))
    }

    pub fn with_config(sink: S, config: EncoderConfig) -> Self {
        MultipartEncoder {
            sink,
            config,
            header_fields: IndexMap::new(),
            form_fields: IndexMap::new(),
            attachments: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// adds a `Name: Value` line written before the multipart body
    ///
    /// Neither name nor value are validated.
    pub fn add_header_field<N, V>(mut self, name: N, value: V) -> Self
        where N: Into<String>, V: Into<String>
    {
        self.header_fields.insert(name.into(), value.into());
        self
    }

    /// adds a text field
    pub fn add_form_field<N, V>(mut self, name: N, value: V) -> Self
        where N: Into<String>, V: Into<String>
    {
        self.form_fields.insert(name.into(), value.into());
        self
    }

    /// adds a binary field
    pub fn add_attachment<N: Into<String>>(mut self, name: N, attachment: Attachment) -> Self {
        self.attachments.insert(name.into(), attachment);
        self
    }

    /// adds the file at `path` as binary field, announced with its own file name
    ///
    /// The file is only opened when the body is written.
    pub fn add_file<N, P>(self, name: N, path: P) -> Self
        where N: Into<String>, P: AsRef<Path>
    {
        self.add_attachment(name, Attachment::from_path(path))
    }

    /// adds the file at `path` as binary field, announced as `file_name`
    pub fn add_file_as<N, P, F>(self, name: N, path: P, file_name: F) -> Self
        where N: Into<String>, P: AsRef<Path>, F: Into<String>
    {
        self.add_attachment(name, Attachment::from_path_with_name(path, file_name))
    }

    pub fn header_fields<'a>(&'a self) -> impl Iterator<Item=(&'a str, &'a str)> + 'a {
        self.header_fields.iter().map(|(name, value)| (&**name, &**value))
    }

    pub fn form_fields<'a>(&'a self) -> impl Iterator<Item=(&'a str, &'a str)> + 'a {
        self.form_fields.iter().map(|(name, value)| (&**name, &**value))
    }

    pub fn attachments<'a>(&'a self) -> impl Iterator<Item=(&'a str, &'a Attachment)> + 'a {
        self.attachments.iter().map(|(name, attachment)| (&**name, attachment))
    }

    /// writes the whole body into the sink
    ///
    /// Generates a new boundary, declares the body to the sink, writes the
    /// header fields, the text fields, the attachments and the closing
    /// delimiter. Afterwards `Sink::close_body` is called, this also happens
    /// if writing the body failed.
    ///
    /// On success the sink is returned, e.g. to read the response from it.
    /// Use a `&mut` sink to keep access to it if the build fails.
    ///
    /// # Error
    ///
    /// The first failure (opening or reading an attachment, writing to the
    /// sink, ...) aborts the build and is returned. Already written bytes
    /// are not rolled back. A failure to close the sink is only returned if
    /// nothing else failed before.
    pub fn build(self) -> Result<S, EncodingError> {
        let MultipartEncoder {
            mut sink, config, header_fields, form_fields, mut attachments
        } = self;

        let result = {
            let mut body = OpenBody::new(&mut sink);
            let written = write_body(
                body.sink(), &config, &header_fields, &form_fields, &mut attachments
            );
            close_leftover_streams(&mut attachments);
            let closed = body.finish();

            match (written, closed) {
                (Ok(()), Ok(())) => Ok(()),
                (Ok(()), Err(err)) => Err(failed(err, EncodingErrorKind::CloseFailed, Place::Cleanup)),
                (Err(err), Ok(())) => Err(err),
                (Err(err), Err(close_err)) => {
                    warn!("closing the sink failed after an aborted body ({}): {}", err, close_err);
                    Err(err)
                }
            }
        };

        result.map(|()| sink)
    }
}

/// Guard releasing the output layer of the sink.
///
/// If it is dropped without `finish` being called (e.g. while unwinding)
/// the body is closed on drop.
struct OpenBody<'a, S: Sink + 'a> {
    sink: &'a mut S,
    closed: bool
}

impl<'a, S: Sink + 'a> OpenBody<'a, S> {

    fn new(sink: &'a mut S) -> Self {
        OpenBody { sink, closed: false }
    }

    fn sink(&mut self) -> &mut S {
        &mut *self.sink
    }

    fn finish(&mut self) -> io::Result<()> {
        self.closed = true;
        self.sink.close_body()
    }
}

impl<'a, S: Sink + 'a> Drop for OpenBody<'a, S> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.finish() {
                warn!("closing the sink of an unfinished body failed: {}", err);
            }
        }
    }
}

fn failed(err: io::Error, kind: EncodingErrorKind, place: Place) -> EncodingError {
    EncodingError::from(err.context(kind))
        .with_place_or_else(|| Some(place))
}

fn write_body<S: Sink + ?Sized>(
    sink: &mut S,
    config: &EncoderConfig,
    header_fields: &IndexMap<String, String>,
    form_fields: &IndexMap<String, String>,
    attachments: &mut IndexMap<String, Attachment>
) -> Result<(), EncodingError> {
    let boundary = config.boundary().generate()
        .map_err(|err| err.with_place_or_else(|| Some(Place::Prepare)))?;

    debug!("writing multipart body with boundary {:?} ({} header fields, {} form fields, {} attachments)",
        boundary.as_str(), header_fields.len(), form_fields.len(), attachments.len());

    sink.declare_body(&boundary.content_type())
        .map_err(|err| failed(err, EncodingErrorKind::PrepareFailed, Place::Prepare))?;

    for (name, value) in header_fields.iter() {
        write_line!(sink, "{}: {}", name, value)
            .map_err(|err| failed(err, EncodingErrorKind::WriteFailed,
                Place::HeaderField { name: name.clone() }))?;
    }

    for (name, value) in form_fields.iter() {
        write_form_field(sink, &boundary, config.charset(), name, value)
            .map_err(|err| failed(err, EncodingErrorKind::WriteFailed,
                Place::FormField { name: name.clone() }))?;
        trace!("wrote form field {:?}", name);
    }

    let mut total = 0u64;
    if !attachments.is_empty() {
        let mut buffer = vec![0u8; config.chunk_size()];
        for (name, attachment) in attachments.iter_mut() {
            total += write_attachment(sink, &boundary, name, attachment, &mut buffer)?;
        }
    }

    write_line!(sink, "{}", boundary.close_delimiter())
        .and_then(|()| sink.flush())
        .map_err(|err| failed(err, EncodingErrorKind::WriteFailed, Place::Terminator))?;

    debug!("multipart body with boundary {:?} written, {} attachment bytes", boundary.as_str(), total);
    Ok(())
}

fn write_form_field<W: Write + ?Sized>(
    out: &mut W,
    boundary: &Boundary,
    charset: &str,
    name: &str,
    value: &str
) -> io::Result<()> {
    write_line!(out, "{}", boundary.delimiter())?;
    write_line!(out, "Content-Disposition: form-data; name=\"{}\"", name)?;
    write_line!(out, "Content-Type: text/plain; charset={}", charset)?;
    write_line!(out, "")?;
    write_line!(out, "{}", value)
}

/// writes one attachment part, returns the number of copied content bytes
///
/// The stream of the attachment is closed once the content was copied or
/// copying failed.
fn write_attachment<W: Write + ?Sized>(
    out: &mut W,
    boundary: &Boundary,
    name: &str,
    attachment: &mut Attachment,
    buffer: &mut [u8]
) -> Result<u64, EncodingError> {
    let file_name = attachment.file_name().to_owned();
    let place = || Place::Attachment { name: name.to_owned(), file_name: file_name.clone() };

    write_line!(out, "{}", boundary.delimiter())
        .and_then(|()| write_line!(out,
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"", name, file_name))
        .and_then(|()| write_line!(out, "Content-Type: {}", attachment.content_type()))
        .and_then(|()| write_line!(out, "Content-Transfer-Encoding: binary"))
        .and_then(|()| write_line!(out, ""))
        .map_err(|err| failed(err, EncodingErrorKind::WriteFailed, place()))?;

    let copied = match attachment.stream() {
        Ok(stream) => copy_chunked(stream, out, buffer)
            .map_err(|err| err.with_place_or_else(|| Some(place()))),
        Err(err) => return Err(failed(err, EncodingErrorKind::OpenFailed, place()))
    };

    if let Err(err) = attachment.close() {
        warn!("closing the stream of attachment {:?} failed: {}", name, err);
    }

    let copied = copied?;
    write_line!(out, "")
        .map_err(|err| failed(err, EncodingErrorKind::WriteFailed, place()))?;

    trace!("wrote attachment {:?} ({:?}, {} bytes)", name, file_name, copied);
    Ok(copied)
}

/// copies `reader` into `writer` reading at most `buffer.len()` bytes at once
fn copy_chunked<R, W>(reader: &mut R, writer: &mut W, buffer: &mut [u8])
    -> Result<u64, EncodingError>
    where R: Read + ?Sized, W: Write + ?Sized
{
    let mut copied = 0u64;
    loop {
        let read = match reader.read(buffer) {
            Ok(0) => return Ok(copied),
            Ok(read) => read,
            Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.context(EncodingErrorKind::ReadFailed).into())
        };
        writer.write_all(&buffer[..read])
            .context(EncodingErrorKind::WriteFailed)?;
        copied += read as u64;
    }
}

/// closes streams which are still open, e.g. because they were opened
/// before `build` and the build was aborted before reaching them
fn close_leftover_streams(attachments: &mut IndexMap<String, Attachment>) {
    for (name, attachment) in attachments.iter_mut() {
        if attachment.is_open() {
            if let Err(err) = attachment.close() {
                warn!("closing the stream of attachment {:?} failed: {}", name, err);
            }
        }
    }
}
