extern crate multipart_data_builder;

mod common;

use std::env;
use std::fs::{self, File};
use std::io::{self, Write, Cursor};
use std::path::{Path, PathBuf};
use std::process;

use multipart_data_builder::{
    MultipartEncoder, Attachment, WriterSink,
    EncoderConfig, BoundaryStrategy
};

use common::parse_sink;

fn test_file() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_resources/testfile.txt")
}

fn temp_file(name: &str, content: &[u8]) -> PathBuf {
    let path = env::temp_dir().join(format!("multipart-data-builder-{}-{}", process::id(), name));
    let mut file = File::create(&path).unwrap();
    file.write_all(content).unwrap();
    path
}

#[test]
fn form_fields_and_file_round_trip() {
    let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
        .add_form_field("Form1", "I am Form 1")
        .add_form_field("Form2", "I am Form 2")
        .add_file("FormFile1", test_file())
        .build()
        .unwrap();

    let body = parse_sink(sink);
    assert!(body.boundary.starts_with("***MultipartDataBuilder"));
    assert!(body.header_fields.is_empty());
    assert_eq!(body.names(), vec!["Form1", "Form2", "FormFile1"]);

    let form1 = body.part("Form1");
    assert_eq!(form1.text(), "I am Form 1");
    assert_eq!(form1.file_name, None);
    assert_eq!(form1.header("Content-Type"), Some("text/plain; charset=UTF-8"));

    assert_eq!(body.part("Form2").text(), "I am Form 2");

    let file = body.part("FormFile1");
    assert_eq!(file.file_name.as_ref().map(|name| &**name), Some("testfile.txt"));
    assert_eq!(file.header("Content-Type"), Some("text/plain"));
    assert_eq!(file.header("Content-Transfer-Encoding"), Some("binary"));
    assert_eq!(file.text(), "hello");
}

#[test]
fn header_fields_come_before_the_first_part() {
    let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
        .add_header_field("Authorization", "Bearer abc")
        .add_header_field("X-Client", "uploader/1.0")
        .add_form_field("a", "1")
        .build()
        .unwrap();

    let body = parse_sink(sink);
    assert_eq!(body.header_fields, vec![
        ("Authorization".to_owned(), "Bearer abc".to_owned()),
        ("X-Client".to_owned(), "uploader/1.0".to_owned()),
    ]);
    assert_eq!(body.names(), vec!["a"]);
}

#[test]
fn every_entry_appears_exactly_once() {
    let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
        .add_form_field("one", "1")
        .add_form_field("two", "2")
        .add_form_field("one", "uno")
        .add_attachment("file_a", Attachment::from_bytes("a.bin", vec![1u8, 2, 3]))
        .add_attachment("file_b", Attachment::from_bytes("b.json", &b"{}"[..]))
        .add_attachment("file_a", Attachment::from_bytes("a2.bin", vec![4u8]))
        .build()
        .unwrap();

    let body = parse_sink(sink);
    assert_eq!(body.names(), vec!["one", "two", "file_a", "file_b"]);
    assert_eq!(body.part("one").text(), "uno");
    assert_eq!(body.part("file_a").data, vec![4u8]);
    assert_eq!(body.part("file_a").file_name.as_ref().map(|name| &**name), Some("a2.bin"));
    assert_eq!(body.part("file_b").header("Content-Type"), Some("application/json"));
}

#[test]
fn binary_content_is_kept_byte_for_byte() {
    let content: Vec<u8> = (0..100_000u32).map(|idx| (idx * 7 % 256) as u8).collect();
    let path = temp_file("binary.bin", &content);

    let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
        .add_file_as("upload", &path, "photo.jpg")
        .build()
        .unwrap();
    fs::remove_file(&path).unwrap();

    let body = parse_sink(sink);
    let part = body.part("upload");
    assert_eq!(part.file_name.as_ref().map(|name| &**name), Some("photo.jpg"));
    assert_eq!(part.header("Content-Type"), Some("image/jpeg"));
    assert_eq!(part.data.len(), content.len());
    assert!(part.data == content);
}

#[test]
fn non_ascii_values_are_written_as_utf8() {
    let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
        .add_form_field("greeting", "Grüße, 世界")
        .build()
        .unwrap();

    let body = parse_sink(sink);
    assert_eq!(body.part("greeting").text(), "Grüße, 世界");
}

#[test]
fn empty_values_and_attachments() {
    let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
        .add_form_field("empty", "")
        .add_attachment("nothing", Attachment::from_reader("empty.txt", io::empty()))
        .build()
        .unwrap();

    let body = parse_sink(sink);
    assert_eq!(body.part("empty").text(), "");
    assert!(body.part("nothing").data.is_empty());
}

#[test]
fn nothing_registered_yields_only_the_terminator() {
    let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
        .build()
        .unwrap();

    let body = parse_sink(sink);
    assert!(body.parts.is_empty());
    assert!(body.header_fields.is_empty());
}

#[test]
fn random_boundaries_round_trip() {
    let config = EncoderConfig::default()
        .with_boundary(BoundaryStrategy::Random)
        .with_chunk_size(7);

    let sink = MultipartEncoder::with_config(WriterSink::new(Vec::new()), config)
        .add_form_field("field", "value")
        .add_attachment("file", Attachment::from_reader("notes.txt", Cursor::new(b"some longer content".to_vec())))
        .build()
        .unwrap();

    let body = parse_sink(sink);
    assert!(body.boundary.starts_with("=_"));
    assert_eq!(body.part("field").text(), "value");
    assert_eq!(body.part("file").text(), "some longer content");
}

#[test]
fn successive_builds_use_different_boundaries() {
    let build = || {
        let sink = MultipartEncoder::new(WriterSink::new(Vec::new()), "UTF-8")
            .add_form_field("a", "b")
            .build()
            .unwrap();
        parse_sink(sink).boundary
    };

    let first = build();
    let second = build();
    assert_ne!(first, second);
}

#[test]
#[should_panic(expected = "closing delimiter")]
fn parser_rejects_a_body_without_terminator() {
    let content_type = "multipart/form-data; boundary=xyz";
    let body = b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nb\r\n";
    common::parse(content_type, body);
}

#[test]
#[should_panic(expected = "not terminated by CRLF")]
fn parser_rejects_a_part_without_trailing_crlf() {
    let content_type = "multipart/form-data; boundary=xyz";
    let body = b"--xyz\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nb--xyz--\r\n";
    common::parse(content_type, body);
}
