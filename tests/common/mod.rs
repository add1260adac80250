#![allow(dead_code)]
//! A minimal multipart/form-data parser used to read back encoded bodies.
//!
//! It is deliberately strict: it panics unless the body ends with the
//! closing delimiter, every part starts with `--<boundary>\r\n`, part
//! headers end with an empty line and every part content is followed by
//! `\r\n`. No preamble other than `Name: Value` header lines is accepted.
use std::str;

use multipart_data_builder::WriterSink;

#[derive(Debug)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub headers: Vec<(String, String)>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|&&(ref key, _)| key.eq_ignore_ascii_case(name))
            .map(|&(_, ref value)| &**value)
    }

    pub fn text(&self) -> &str {
        str::from_utf8(&self.data).expect("utf-8 part content")
    }
}

#[derive(Debug)]
pub struct ParsedBody {
    pub boundary: String,
    pub header_fields: Vec<(String, String)>,
    pub parts: Vec<Part>,
}

impl ParsedBody {
    pub fn part(&self, name: &str) -> &Part {
        let mut iter = self.parts.iter().filter(|part| part.name == name);
        let part = iter.next().unwrap_or_else(|| panic!("no part named {:?}", name));
        assert!(iter.next().is_none(), "part {:?} appears more than once", name);
        part
    }

    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|part| &*part.name).collect()
    }
}

/// the (unquoted) boundary parameter of a multipart/form-data content type
pub fn boundary_from_content_type(content_type: &str) -> String {
    let mut params = content_type.split(';');
    let main = params.next().unwrap_or("").trim();
    assert!(main.eq_ignore_ascii_case("multipart/form-data"), "unexpected content type {:?}", content_type);

    for param in params {
        let param = param.trim();
        if let Some(idx) = param.find('=') {
            if param[..idx].trim().eq_ignore_ascii_case("boundary") {
                return unquote(&param[idx + 1..]);
            }
        }
    }
    panic!("content type without boundary: {:?}", content_type)
}

/// parses the content of a closed `WriterSink`
pub fn parse_sink(sink: WriterSink<Vec<u8>>) -> ParsedBody {
    assert!(sink.is_closed(), "sink was not closed");
    let content_type = sink.content_type().expect("declared content type").to_owned();
    parse(&content_type, &sink.into_inner())
}

pub fn parse(content_type: &str, body: &[u8]) -> ParsedBody {
    let boundary = boundary_from_content_type(content_type);
    let delimiter = format!("--{}\r\n", boundary).into_bytes();
    let separator = format!("\r\n--{}\r\n", boundary).into_bytes();
    let terminator = format!("--{}--\r\n", boundary).into_bytes();

    assert!(body.ends_with(&terminator), "body does not end with the closing delimiter");
    let body = &body[..body.len() - terminator.len()];

    let first = find(body, &delimiter, 0).unwrap_or(body.len());
    let header_fields = parse_header_lines(&body[..first]);

    let mut parts = Vec::new();
    let mut pos = first;
    while pos < body.len() {
        assert!(body[pos..].starts_with(&delimiter), "expected delimiter at {}", pos);
        let start = pos + delimiter.len();
        let end = match find(body, &separator, start) {
            Some(idx) => {
                pos = idx + 2;
                idx
            },
            None => {
                assert!(body.ends_with(b"\r\n"), "last part is not terminated by CRLF");
                pos = body.len();
                body.len() - 2
            }
        };
        parts.push(parse_part(&body[start..end]));
    }

    ParsedBody { boundary, header_fields, parts }
}

fn parse_part(raw: &[u8]) -> Part {
    let header_end = find(raw, b"\r\n\r\n", 0).expect("end of part headers");
    let headers = parse_header_lines(&raw[..header_end + 2]);
    let data = raw[header_end + 4..].to_vec();

    let (name, file_name) = {
        let disposition = headers.iter()
            .find(|&&(ref key, _)| key.eq_ignore_ascii_case("content-disposition"))
            .map(|&(_, ref value)| &**value)
            .expect("part without Content-Disposition");
        parse_content_disposition(disposition)
    };

    Part { name, file_name, headers, data }
}

fn parse_header_lines(raw: &[u8]) -> Vec<(String, String)> {
    let raw = str::from_utf8(raw).expect("utf-8 header lines");
    raw.split("\r\n")
        .filter(|line| !line.is_empty())
        .map(|line| {
            let idx = line.find(':').unwrap_or_else(|| panic!("malformed header line {:?}", line));
            (line[..idx].trim().to_owned(), line[idx + 1..].trim().to_owned())
        })
        .collect()
}

fn parse_content_disposition(value: &str) -> (String, Option<String>) {
    let mut name = None;
    let mut file_name = None;

    for param in value.split(';') {
        let param = param.trim();
        if param.eq_ignore_ascii_case("form-data") {
            continue;
        }
        if let Some(idx) = param.find('=') {
            let key = param[..idx].trim();
            if key.eq_ignore_ascii_case("name") {
                name = Some(unquote(&param[idx + 1..]));
            } else if key.eq_ignore_ascii_case("filename") {
                file_name = Some(unquote(&param[idx + 1..]));
            }
        }
    }

    (name.expect("Content-Disposition without name"), file_name)
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].to_owned()
    } else {
        value.to_owned()
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (from..haystack.len() - needle.len() + 1)
        .find(|&idx| &haystack[idx..idx + needle.len()] == needle)
}
