// Marshal wire codec
//
// `p4 -G` reads and writes the Python `marshal` object format. Every object
// on the wire is a flat dictionary; the server emits byte strings and small
// integers and only accepts version 0 on input.

use std::io::{self, Read, Write};

use bytes::{BufMut, BytesMut};
use thiserror::Error;

use crate::record::Record;

const TYPE_NULL: u8 = b'0';
const TYPE_NONE: u8 = b'N';
const TYPE_FALSE: u8 = b'F';
const TYPE_TRUE: u8 = b'T';
const TYPE_INT: u8 = b'i';
const TYPE_STRING: u8 = b's';
const TYPE_INTERNED: u8 = b't';
const TYPE_UNICODE: u8 = b'u';
const TYPE_ASCII: u8 = b'a';
const TYPE_ASCII_INTERNED: u8 = b'A';
const TYPE_SHORT_ASCII: u8 = b'z';
const TYPE_SHORT_ASCII_INTERNED: u8 = b'Z';
const TYPE_DICT: u8 = b'{';
const FLAG_REF: u8 = 0x80;

/// Failures while reading or writing the marshal stream.
#[derive(Debug, Error)]
pub enum WireError {
    /// The stream ended inside a record.
    #[error("marshal stream ended in the middle of a record")]
    UnexpectedEof,

    /// A type byte this codec does not understand.
    #[error("unsupported marshal type byte 0x{0:02x}")]
    UnsupportedType(u8),

    /// A top-level object that is not a dictionary.
    #[error("expected a marshal dictionary, found type byte 0x{0:02x}")]
    NotADictionary(u8),

    /// A negative length prefix.
    #[error("invalid marshal length {0}")]
    InvalidLength(i32),

    /// A value too large for the 32-bit length prefix.
    #[error("value of {0} bytes is too long to marshal")]
    TooLong(usize),

    #[error("marshal I/O error: {0}")]
    Io(#[source] io::Error),
}

impl From<io::Error> for WireError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof
        } else {
            Self::Io(err)
        }
    }
}

// ── Encoding ─────────────────────────────────────────────────────────

/// Encode one record as a version 0 marshal dictionary of text values.
pub fn encode(record: &Record) -> Result<Vec<u8>, WireError> {
    let capacity = record.iter().map(|(k, v)| k.len() + v.len() + 10).sum::<usize>() + 2;
    let mut buf = BytesMut::with_capacity(capacity);

    buf.put_u8(TYPE_DICT);
    for (key, value) in record {
        put_text(&mut buf, key)?;
        put_text(&mut buf, value)?;
    }
    buf.put_u8(TYPE_NULL);

    Ok(buf.to_vec())
}

/// Encode `record` and write it to `writer`.
pub fn write_record<W: Write>(writer: &mut W, record: &Record) -> Result<(), WireError> {
    writer.write_all(&encode(record)?)?;
    writer.flush()?;
    Ok(())
}

fn put_text(buf: &mut BytesMut, text: &str) -> Result<(), WireError> {
    let len = i32::try_from(text.len()).map_err(|_| WireError::TooLong(text.len()))?;
    buf.put_u8(TYPE_UNICODE);
    buf.put_i32_le(len);
    buf.put_slice(text.as_bytes());
    Ok(())
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Lazily decodes records from a marshal stream.
///
/// End of input on a record boundary ends the iteration normally. After the
/// first error the reader is exhausted.
pub struct RecordReader<R> {
    inner: R,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }

    /// Read the type byte of the next record, `None` on a clean end of stream.
    fn next_tag(&mut self) -> Result<Option<u8>, WireError> {
        let mut tag = [0u8; 1];
        loop {
            match self.inner.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(tag[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(WireError::Io(e)),
            }
        }
    }

    fn read_dict(&mut self, tag: u8) -> Result<Record, WireError> {
        if tag & !FLAG_REF != TYPE_DICT {
            return Err(WireError::NotADictionary(tag));
        }

        let mut record = Record::new();
        loop {
            let key_tag = self.read_u8()?;
            if key_tag & !FLAG_REF == TYPE_NULL {
                return Ok(record);
            }
            let key = self.read_value(key_tag)?.into_text();
            let value_tag = self.read_u8()?;
            let value = self.read_value(value_tag)?.into_text();
            record.insert(key, value);
        }
    }

    fn read_value(&mut self, tag: u8) -> Result<Value, WireError> {
        let value = match tag & !FLAG_REF {
            TYPE_STRING => Value::Bytes(self.read_sized()?),
            TYPE_UNICODE | TYPE_INTERNED | TYPE_ASCII | TYPE_ASCII_INTERNED => {
                Value::Text(decode_text(self.read_sized()?))
            }
            TYPE_SHORT_ASCII | TYPE_SHORT_ASCII_INTERNED => {
                let len = usize::from(self.read_u8()?);
                Value::Text(decode_text(self.read_exact(len)?))
            }
            TYPE_INT => Value::Int(self.read_i32()?),
            TYPE_NONE => Value::None,
            TYPE_TRUE => Value::Bool(true),
            TYPE_FALSE => Value::Bool(false),
            other => return Err(WireError::UnsupportedType(other)),
        };
        Ok(value)
    }

    fn read_sized(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_i32()?;
        let len = usize::try_from(len).map_err(|_| WireError::InvalidLength(len))?;
        self.read_exact(len)
    }

    fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        // Grow with the bytes actually present, not the declared length.
        let mut buf = Vec::new();
        let limit = u64::try_from(len).unwrap_or(u64::MAX);
        (&mut self.inner).take(limit).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(WireError::UnexpectedEof);
        }
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8, WireError> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_i32(&mut self) -> Result<i32, WireError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = match self.next_tag() {
            Ok(None) => {
                self.done = true;
                return None;
            }
            Ok(Some(tag)) => self.read_dict(tag),
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

/// Decode every record in `bytes`.
pub fn decode_all(bytes: &[u8]) -> Result<Vec<Record>, WireError> {
    RecordReader::new(bytes).collect()
}

/// A scalar as it appears inside a record.
enum Value {
    Bytes(Vec<u8>),
    Text(String),
    Int(i32),
    Bool(bool),
    None,
}

impl Value {
    fn into_text(self) -> String {
        match self {
            Self::Bytes(bytes) => decode_text(bytes),
            Self::Text(text) => text,
            Self::Int(i) => i.to_string(),
            Self::Bool(true) => "True".to_owned(),
            Self::Bool(false) => "False".to_owned(),
            Self::None => String::new(),
        }
    }
}

/// UTF-8 when valid, otherwise Latin-1.
///
/// Some fields (user full names in particular) are stored in whatever
/// encoding the submitting client used; Latin-1 maps every byte and matches
/// what the vendor's GUI shows.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}
