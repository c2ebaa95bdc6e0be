#![cfg(feature = "std")]

mod support;

use std::io::Cursor;

use csv::ReaderBuilder;
use sprocket::{
    DecodeOptions, Field, FromMessage, FromMessages, Standard,
    avec::{Source, Stream},
};

const EXPECTED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/activity.csv");

#[test]
fn decode_slice_activity() {
    let data = support::activity().build();
    let file = sprocket::decode_slice(&data).unwrap();

    let mut validator = Validator::new(EXPECTED);
    file.publish(&mut validator);
    validator.finish();
}

#[test]
fn decode_reader_activity() {
    let data = support::activity().build();
    let file = sprocket::decode_reader(&mut Cursor::new(data)).unwrap();

    let mut validator = Validator::new(EXPECTED);
    file.publish(&mut validator);
    validator.finish();
}

#[test]
fn stream_activity() {
    let data = support::activity().build();
    let whole = sprocket::decode_slice(&data).unwrap();

    let source: &[u8] = &data;
    let stream = Stream::new(source, &Standard, DecodeOptions::new()).unwrap();
    assert_eq!(stream.header(), &whole.header);

    let messages = stream.collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(messages, whole.messages);
}

#[test]
fn stream_reads_sources() {
    fn stream<S: Source>(source: S) -> usize {
        Stream::new(source, &Standard, DecodeOptions::new())
            .unwrap()
            .map(Result::unwrap)
            .count()
    }

    let data = support::activity().build();
    let slice: &[u8] = &data;
    assert_eq!(stream(slice), 7);
    assert_eq!(stream(sprocket::avec::IoSource(Cursor::new(&data))), 7);
}

/// Checks published messages against rows of
/// `global[,time,timestamp][,field,value]...`.
struct Validator {
    expected: Vec<Vec<String>>,
    row: Vec<String>,
}

impl Validator {
    fn new(path: &str) -> Self {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .unwrap();

        let mut expected: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect();
        expected.reverse();

        Self {
            expected,
            row: vec![],
        }
    }

    fn next(&mut self) -> String {
        assert!(!self.row.is_empty(), "more values published than expected");
        self.row.remove(0)
    }

    fn finish(&mut self) {
        assert_eq!(self.row, Vec::<String>::new());
        assert!(self.expected.is_empty(), "{:?}", self.expected);
    }
}

impl FromMessages for Validator {
    fn add_message(&mut self, global: u16) -> Option<&mut dyn FromMessage> {
        assert_eq!(self.row, Vec::<String>::new());
        self.row = self.expected.pop().unwrap();
        assert_eq!(self.next(), global.to_string());
        Some(self)
    }
}

impl FromMessage for Validator {
    fn add_timestamp(&mut self, timestamp: u32) {
        assert_eq!(self.next(), "time");
        assert_eq!(self.next(), timestamp.to_string());
    }

    fn add_field(&mut self, field: &Field) {
        assert_eq!(self.next(), field.number.to_string());
        assert_eq!(self.next(), field.value.to_string());
    }
}
