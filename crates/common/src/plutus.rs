//! Plutus Data Codec
//!
//! Datums are CBOR-encoded Plutus data: integers, byte strings, lists, maps,
//! and constructors (an alternative index plus ordered fields). The bytes
//! carry no type names, so every record type declares its constructor tag
//! and arity up front and decoding dispatches on the expected type at each
//! call site.
//!
//! ## Constructor Encoding
//!
//! ```text
//! alternative 0..=6     tag 121..=127   over [fields]
//! alternative 7..=127   tag 1280..=1400 over [fields]
//! any alternative       tag 102         over [alternative, [fields]]
//! ```
//!
//! Big integers use tags 2 and 3 over big-endian magnitude bytes.

use core::fmt;

use ciborium::value::Value;
use ciborium_ll::{Encoder, Header};

use crate::constants::plutus::*;
use crate::errors::{FeedError, FeedResult, MalformedReason};
use crate::types::RawDatum;

// ============ Data Model ============

/// A decoded Plutus data value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    /// Constructor alternative with ordered fields
    Constr { tag: u64, fields: Vec<PlutusData> },
    /// Ordered key/value pairs, as found on the wire
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Integer(i128),
    Bytes(Vec<u8>),
}

/// Kind of a Plutus data value, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Constr,
    Map,
    List,
    Integer,
    Bytes,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constr => "constructor",
            Self::Map => "map",
            Self::List => "list",
            Self::Integer => "integer",
            Self::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

impl PlutusData {
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr { tag, fields }
    }

    pub fn kind(&self) -> DataKind {
        match self {
            Self::Constr { .. } => DataKind::Constr,
            Self::Map(_) => DataKind::Map,
            Self::List(_) => DataKind::List,
            Self::Integer(_) => DataKind::Integer,
            Self::Bytes(_) => DataKind::Bytes,
        }
    }

    /// Parse a single Plutus data value; trailing bytes are rejected
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, MalformedReason> {
        let mut reader = bytes;
        let value: Value = ciborium::de::from_reader(&mut reader)
            .map_err(|e| MalformedReason::InvalidCbor(e.to_string()))?;
        if !reader.is_empty() {
            return Err(MalformedReason::TrailingBytes {
                remaining: reader.len(),
            });
        }
        from_value(value)
    }

    /// Canonical encoding: indefinite-length non-empty lists, definite maps,
    /// byte strings over 64 bytes split into chunks
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut encoder = Encoder::from(&mut buf);
        if let Err(err) = self.write(&mut encoder) {
            unreachable!("writing CBOR into a Vec failed: {err}");
        }
        buf
    }

    fn write(&self, encoder: &mut Encoder<&mut Vec<u8>>) -> std::io::Result<()> {
        match self {
            Self::Constr { tag, fields } => {
                match *tag {
                    alt @ 0..=6 => encoder.push(Header::Tag(CONSTR_TAG_BASE + alt))?,
                    alt @ CONSTR_EXT_FIRST_ALT..=CONSTR_EXT_LAST_ALT => encoder
                        .push(Header::Tag(CONSTR_TAG_EXT_BASE + alt - CONSTR_EXT_FIRST_ALT))?,
                    alt => {
                        encoder.push(Header::Tag(CONSTR_TAG_GENERAL))?;
                        encoder.push(Header::Array(Some(2)))?;
                        encoder.push(Header::Positive(alt))?;
                    }
                }
                write_list(fields, encoder)
            }
            Self::Map(entries) => {
                encoder.push(Header::Map(Some(entries.len())))?;
                for (key, value) in entries {
                    key.write(encoder)?;
                    value.write(encoder)?;
                }
                Ok(())
            }
            Self::List(items) => write_list(items, encoder),
            Self::Integer(value) => write_integer(*value, encoder),
            Self::Bytes(bytes) => write_bytes(bytes, encoder),
        }
    }
}

fn write_list(items: &[PlutusData], encoder: &mut Encoder<&mut Vec<u8>>) -> std::io::Result<()> {
    if items.is_empty() {
        return encoder.push(Header::Array(Some(0)));
    }
    encoder.push(Header::Array(None))?;
    for item in items {
        item.write(encoder)?;
    }
    encoder.push(Header::Break)
}

fn write_integer(value: i128, encoder: &mut Encoder<&mut Vec<u8>>) -> std::io::Result<()> {
    if value >= 0 {
        match u64::try_from(value) {
            Ok(small) => encoder.push(Header::Positive(small)),
            Err(_) => {
                encoder.push(Header::Tag(BIGNUM_POS_TAG))?;
                write_bytes(&magnitude_bytes(value as u128), encoder)
            }
        }
    } else {
        // CBOR negative integers store -1 - n
        let magnitude = (-1 - value) as u128;
        match u64::try_from(magnitude) {
            Ok(small) => encoder.push(Header::Negative(small)),
            Err(_) => {
                encoder.push(Header::Tag(BIGNUM_NEG_TAG))?;
                write_bytes(&magnitude_bytes(magnitude), encoder)
            }
        }
    }
}

fn write_bytes(bytes: &[u8], encoder: &mut Encoder<&mut Vec<u8>>) -> std::io::Result<()> {
    if bytes.len() <= BYTES_CHUNK_SIZE {
        return encoder.bytes(bytes, None);
    }
    encoder.push(Header::Bytes(None))?;
    for chunk in bytes.chunks(BYTES_CHUNK_SIZE) {
        encoder.bytes(chunk, None)?;
    }
    encoder.push(Header::Break)
}

fn magnitude_bytes(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

// ============ CBOR Value Conversion ============

fn from_value(value: Value) -> Result<PlutusData, MalformedReason> {
    match value {
        Value::Integer(integer) => Ok(PlutusData::Integer(i128::from(integer))),
        Value::Bytes(bytes) => Ok(PlutusData::Bytes(bytes)),
        Value::Array(items) => items
            .into_iter()
            .map(from_value)
            .collect::<Result<Vec<_>, _>>()
            .map(PlutusData::List),
        Value::Map(entries) => entries
            .into_iter()
            .map(|(key, value)| -> Result<_, MalformedReason> {
                Ok((from_value(key)?, from_value(value)?))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(PlutusData::Map),
        Value::Tag(tag, inner) => from_tagged(tag, *inner),
        Value::Text(_) => Err(MalformedReason::UnsupportedValue { found: "text" }),
        Value::Float(_) => Err(MalformedReason::UnsupportedValue { found: "float" }),
        Value::Bool(_) => Err(MalformedReason::UnsupportedValue { found: "bool" }),
        Value::Null => Err(MalformedReason::UnsupportedValue { found: "null" }),
        _ => Err(MalformedReason::UnsupportedValue { found: "simple value" }),
    }
}

fn from_tagged(tag: u64, inner: Value) -> Result<PlutusData, MalformedReason> {
    match tag {
        BIGNUM_POS_TAG | BIGNUM_NEG_TAG => match inner {
            Value::Bytes(bytes) => bignum(tag == BIGNUM_NEG_TAG, &bytes),
            // some decoders fold small bignums into plain integers
            Value::Integer(integer) => Ok(PlutusData::Integer(i128::from(integer))),
            other => Err(MalformedReason::InvalidCbor(format!(
                "big integer tag {tag} over {}",
                value_name(&other)
            ))),
        },
        CONSTR_TAG_BASE..=CONSTR_TAG_BASE_END => constr(tag - CONSTR_TAG_BASE, inner),
        CONSTR_TAG_EXT_BASE..=CONSTR_TAG_EXT_END => {
            constr(tag - CONSTR_TAG_EXT_BASE + CONSTR_EXT_FIRST_ALT, inner)
        }
        CONSTR_TAG_GENERAL => match inner {
            Value::Array(mut pair) if pair.len() == 2 => {
                let fields = pair.pop().unwrap_or(Value::Null);
                let alternative = match pair.pop() {
                    Some(Value::Integer(alt)) => u64::try_from(i128::from(alt))
                        .map_err(|_| MalformedReason::IntegerOutOfRange { target: "u64" })?,
                    _ => {
                        return Err(MalformedReason::InvalidCbor(
                            "general constructor alternative must be an integer".into(),
                        ))
                    }
                };
                constr(alternative, fields)
            }
            other => Err(MalformedReason::InvalidCbor(format!(
                "general constructor over {}",
                value_name(&other)
            ))),
        },
        other => Err(MalformedReason::UnknownTag { tag: other }),
    }
}

fn constr(tag: u64, fields: Value) -> Result<PlutusData, MalformedReason> {
    match fields {
        Value::Array(items) => Ok(PlutusData::Constr {
            tag,
            fields: items
                .into_iter()
                .map(from_value)
                .collect::<Result<Vec<_>, _>>()?,
        }),
        other => Err(MalformedReason::InvalidCbor(format!(
            "constructor {tag} fields must be an array, found {}",
            value_name(&other)
        ))),
    }
}

fn bignum(negative: bool, bytes: &[u8]) -> Result<PlutusData, MalformedReason> {
    let significant = match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => &[],
    };
    if significant.len() > 16 {
        return Err(MalformedReason::IntegerOutOfRange { target: "i128" });
    }
    let magnitude = significant
        .iter()
        .fold(0u128, |acc, byte| (acc << 8) | u128::from(*byte));
    let magnitude =
        i128::try_from(magnitude).map_err(|_| MalformedReason::IntegerOutOfRange { target: "i128" })?;
    Ok(PlutusData::Integer(if negative { -1 - magnitude } else { magnitude }))
}

fn value_name(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "integer",
        Value::Bytes(_) => "bytes",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Tag(..) => "tag",
        Value::Text(_) => "text",
        Value::Float(_) => "float",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        _ => "simple value",
    }
}

// ============ Typed Records ============

/// A datum record with a fixed constructor tag and field layout
///
/// `from_plutus` checks the tag and the arity before any field is read, so
/// `decode_fields` only has to consume fields in declaration order.
pub trait PlutusRecord: Sized {
    /// Record name used in decode errors
    const NAME: &'static str;
    const CONSTR_TAG: u64;
    const ARITY: usize;

    fn decode_fields(fields: &mut Fields<'_>) -> FeedResult<Self>;

    fn encode_fields(&self) -> Vec<PlutusData>;

    fn from_plutus(data: &PlutusData) -> FeedResult<Self> {
        let (tag, items) = match data {
            PlutusData::Constr { tag, fields } => (*tag, fields),
            other => {
                return Err(FeedError::malformed(
                    Self::NAME,
                    MalformedReason::UnexpectedKind {
                        expected: DataKind::Constr,
                        found: other.kind(),
                    },
                ))
            }
        };
        if tag != Self::CONSTR_TAG {
            return Err(FeedError::malformed(
                Self::NAME,
                MalformedReason::UnexpectedTag {
                    expected: Self::CONSTR_TAG,
                    found: tag,
                },
            ));
        }
        if items.len() != Self::ARITY {
            return Err(FeedError::malformed(
                Self::NAME,
                MalformedReason::UnexpectedArity {
                    expected: Self::ARITY,
                    found: items.len(),
                },
            ));
        }
        Self::decode_fields(&mut Fields::new(Self::NAME, items))
    }

    fn to_plutus(&self) -> PlutusData {
        PlutusData::constr(Self::CONSTR_TAG, self.encode_fields())
    }
}

/// Cursor over the fields of a constructor being decoded
pub struct Fields<'a> {
    record: &'static str,
    items: &'a [PlutusData],
    index: usize,
}

impl<'a> Fields<'a> {
    pub fn new(record: &'static str, items: &'a [PlutusData]) -> Self {
        Self {
            record,
            items,
            index: 0,
        }
    }

    fn error(&self, reason: MalformedReason) -> FeedError {
        FeedError::malformed(self.record, reason)
    }

    fn next(&mut self) -> FeedResult<&'a PlutusData> {
        let item = self
            .items
            .get(self.index)
            .ok_or_else(|| self.error(MalformedReason::MissingField { index: self.index }))?;
        self.index += 1;
        Ok(item)
    }

    fn unexpected(&self, expected: DataKind, found: &PlutusData) -> FeedError {
        self.error(MalformedReason::UnexpectedKind {
            expected,
            found: found.kind(),
        })
    }

    /// Next field as a 64-bit integer
    pub fn integer(&mut self) -> FeedResult<i64> {
        match self.next()? {
            PlutusData::Integer(value) => self.narrow(*value),
            other => Err(self.unexpected(DataKind::Integer, other)),
        }
    }

    /// Next field as a byte string
    pub fn bytes(&mut self) -> FeedResult<Vec<u8>> {
        match self.next()? {
            PlutusData::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(self.unexpected(DataKind::Bytes, other)),
        }
    }

    /// Next field as a list of byte strings, order preserved
    pub fn bytes_list(&mut self) -> FeedResult<Vec<Vec<u8>>> {
        match self.next()? {
            PlutusData::List(items) => items
                .iter()
                .map(|item| match item {
                    PlutusData::Bytes(bytes) => Ok(bytes.clone()),
                    other => Err(self.unexpected(DataKind::Bytes, other)),
                })
                .collect(),
            other => Err(self.unexpected(DataKind::List, other)),
        }
    }

    /// Next field as a map
    pub fn map(&mut self) -> FeedResult<&'a [(PlutusData, PlutusData)]> {
        match self.next()? {
            PlutusData::Map(entries) => Ok(entries),
            other => Err(self.unexpected(DataKind::Map, other)),
        }
    }

    /// Next field as a nested record
    pub fn record<T: PlutusRecord>(&mut self) -> FeedResult<T> {
        T::from_plutus(self.next()?)
    }

    /// Integer-keyed map holding every key of `keys`; values are returned in
    /// the order of `keys`. Entries under other keys are skipped.
    pub fn integer_map<const N: usize>(&mut self, keys: [i128; N]) -> FeedResult<[i64; N]> {
        let entries = self.map()?;
        let mut values: [Option<i64>; N] = [None; N];
        for (key, value) in entries {
            let slot = match key {
                PlutusData::Integer(key) => keys.iter().position(|k| k == key),
                _ => None,
            };
            let Some(slot) = slot else { continue };
            if values[slot].is_some() {
                return Err(self.error(MalformedReason::DuplicateKey { key: keys[slot] }));
            }
            values[slot] = Some(match value {
                PlutusData::Integer(value) => self.narrow(*value)?,
                other => return Err(self.unexpected(DataKind::Integer, other)),
            });
        }
        let mut out = [0i64; N];
        for (slot, value) in values.iter().enumerate() {
            out[slot] = value.ok_or_else(|| self.error(MalformedReason::MissingKey { key: keys[slot] }))?;
        }
        Ok(out)
    }

    fn narrow(&self, value: i128) -> FeedResult<i64> {
        i64::try_from(value).map_err(|_| self.error(MalformedReason::IntegerOutOfRange { target: "i64" }))
    }
}

// ============ Entry Points ============

/// Decode a raw datum into the record type `T`
pub fn decode<T: PlutusRecord>(raw: &RawDatum) -> FeedResult<T> {
    let data =
        PlutusData::from_cbor(raw.as_bytes()).map_err(|reason| FeedError::malformed(T::NAME, reason))?;
    T::from_plutus(&data)
}

/// Encode a record as a raw datum
pub fn encode<T: PlutusRecord>(record: &T) -> RawDatum {
    RawDatum::new(record.to_plutus().to_cbor())
}
