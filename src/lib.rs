//! A streaming `multipart/form-data` encoder.
//!
//! Header fields, text fields and file attachments are registered on a
//! `MultipartEncoder` and written part by part into a `Sink` (normally the
//! output half of a http request) once `build` is called. Attachments are
//! copied in fixed size chunks, so they are never loaded into memory as a
//! whole.
//!
//! ```
//! use multipart_data_builder::{MultipartEncoder, WriterSink};
//!
//! let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
//!     .add_header_field("Authorization", "Bearer xyz")
//!     .add_form_field("Form1", "I am Form 1")
//!     .add_file("FormFile1", concat!(env!("CARGO_MANIFEST_DIR"), "/test_resources/testfile.txt"))
//!     .build()
//!     .unwrap();
//!
//! let body = String::from_utf8(sink.into_inner()).unwrap();
//! assert!(body.starts_with("Authorization: Bearer xyz\r\n"));
//! assert!(body.contains("filename=\"testfile.txt\""));
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate failure;
extern crate rand;
extern crate chrono;
extern crate soft_ascii_string;
extern crate mime;
extern crate mime_guess;
extern crate indexmap;
#[cfg(feature="serde-impl")]
extern crate serde;


#[macro_use]
mod macros;
pub mod error;
pub mod boundary;
pub mod config;
pub mod attachment;
pub mod sink;
pub mod encoder;


pub use self::encoder::MultipartEncoder;
pub use self::attachment::{
    Attachment, StreamSource,
    PathSource, FnSource, ReaderSource,
    ByteStream
};
pub use self::sink::{Sink, WriterSink};
pub use self::config::{EncoderConfig, BoundaryStrategy};
pub use self::boundary::Boundary;
pub use self::error::{EncodingError, EncodingErrorKind, Place};
