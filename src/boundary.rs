//! Generation of multipart boundaries.
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use rand::{self, Rng};
use soft_ascii_string::SoftAsciiString;

use error::{EncodingError, EncodingErrorKind};

/// rfc2046 limits a boundary to 70 characters
pub const MAX_BOUNDARY_LENGTH: usize = 70;

/// the maximal boundary with which ` boundary="..."` fits into 78 chars line length limit
const RANDOM_BOUNDARY_LENGTH: usize = 66;

/// The last stamp handed out by `next_stamp`.
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// A multipart boundary.
///
/// A boundary is only valid for a single body, a new one is generated
/// for every `MultipartEncoder::build` call.
#[derive(Debug, Clone)]
pub struct Boundary {
    inner: SoftAsciiString
}

impl Boundary {

    /// creates a boundary of the form `***<prefix><millis>***`
    ///
    /// `<millis>` are the milliseconds since the unix epoch, but never the same
    /// value twice in one process. If the clock did not advance since the
    /// last boundary was created the previous value plus one is used.
    ///
    /// # Error
    ///
    /// Fails with `InvalidBoundary` if the prefix contains characters which
    /// are not `bcharsnospace` or the boundary would exceed 70 characters.
    pub fn timestamped(prefix: &str) -> Result<Boundary, EncodingError> {
        if !prefix.chars().all(is_bchar_no_space) {
            return Err(EncodingErrorKind::InvalidBoundary.into());
        }
        Boundary::from_string(format!("***{}{}***", prefix, next_stamp()))
    }

    /// creates a random boundary based on the rfc2046 grammar
    ///
    /// The boundary (excluding quotations) will start with `"=_"` which is neither
    /// valid for base64 nor quoted-printable encoding and will be 66 chars long.
    ///
    /// The remaining characters will be picked based one the grammar defined in rfc2046,
    /// whichs relevant part is:
    ///
    /// ```BNF
    /// boundary := 0*69<bchars> bcharsnospace
    /// bchars := bcharsnospace / " "
    /// bcharsnospace := DIGIT / ALPHA / "'" / "(" / ")" /
    ///                  "+" / "_" / "," / "-" / "." /
    ///                  "/" / ":" / "=" / "?"
    /// ```
    ///
    /// As it can contain characters which are not valid in a token it
    /// might be quoted in the content type.
    pub fn random() -> Result<Boundary, EncodingError> {
        // boundary chars based on rfc2046, excluding " "
        // (it can be used in any place _except_ the last)
        static CHARS: &[char] = &[
            ' ',                               '\'',
            '(', ')',      '+', ',', '-', '.', '/',
            '0', '1', '2', '3', '4', '5', '6', '7',
            '8', '9', ':',           '=',      '?',
                 'A', 'B', 'C', 'D', 'E', 'F', 'G',
            'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
            'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W',
            'X', 'Y', 'Z',                     '_',
                 'a', 'b', 'c', 'd', 'e', 'f', 'g',
            'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
            'p', 'q', 'r', 's', 't', 'u', 'v', 'w',
            'x', 'y', 'z',
        ];

        let mut out = String::with_capacity(RANDOM_BOUNDARY_LENGTH);
        out.push_str("=_");
        let mut rng = rand::thread_rng();
        for _ in 2..(RANDOM_BOUNDARY_LENGTH - 1) {
            out.push(CHARS[rng.gen_range(0..CHARS.len())]);
        }

        debug_assert!(CHARS[0] == ' ');
        out.push(CHARS[rng.gen_range(1..CHARS.len())]);
        Boundary::from_string(out)
    }

    fn from_string(boundary: String) -> Result<Boundary, EncodingError> {
        if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LENGTH {
            return Err(EncodingErrorKind::InvalidBoundary.into());
        }
        let inner = SoftAsciiString::from_string(boundary)
            .map_err(|_| EncodingError::from(EncodingErrorKind::InvalidBoundary))?;
        Ok(Boundary { inner })
    }

    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// the line starting each part, without the line ending
    pub fn delimiter(&self) -> String {
        format!("--{}", self.as_str())
    }

    /// the line terminating the body, without the line ending
    pub fn close_delimiter(&self) -> String {
        format!("--{}--", self.as_str())
    }

    /// the value for the `Content-Type` header of the request
    ///
    /// The boundary parameter is only quoted if it is not a valid token.
    pub fn content_type(&self) -> String {
        if self.as_str().chars().all(is_token_char) {
            format!("multipart/form-data; boundary={}", self.as_str())
        } else {
            format!("multipart/form-data; boundary=\"{}\"", self.as_str())
        }
    }
}

impl Display for Boundary {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        fter.write_str(self.as_str())
    }
}

impl PartialEq for Boundary {
    fn eq(&self, other: &Boundary) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Boundary {}

fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::SeqCst);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_STAMP.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => last = actual
        }
    }
}

fn is_bchar_no_space(ch: char) -> bool {
    match ch {
        'a'..='z' | 'A'..='Z' | '0'..='9' => true,
        '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' => true,
        _ => false
    }
}

/// `token` as defined by rfc2045
fn is_token_char(ch: char) -> bool {
    match ch {
        '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' |
        '/' | '[' | ']' | '?' | '=' => false,
        ch => ch.is_ascii() && !ch.is_ascii_control() && ch != ' '
    }
}
