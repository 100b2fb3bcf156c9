//! Binary stream format for run-length encoded stores.
//!
//! Layout, in order:
//! - 8-byte magic tag `RLEARRAY`
//! - run count (varint)
//! - row count (varint)
//! - per run: start row (varint), length (varint), tagged value
//!
//! Every value starts with a one-byte kind tag so the stream can be decoded
//! without knowing which type wrote it.

use std::convert::TryFrom;
use std::io::{self, Read, Write};

use super::options::{DecodeLimits, MAX_PREALLOC_RUNS};
use super::run::Run;
use super::value::{StoredValue, Value};
use crate::primitives::bytes::var;
use crate::types::{Result, RleError};

/// Magic tag written at the start of every stream.
pub const MAGIC: &[u8; 8] = b"RLEARRAY";

const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_UINT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STRING: u8 = 0x05;
const TAG_BYTES: u8 = 0x06;
const TAG_RECORD: u8 = 0x07;
const TAG_LIST: u8 = 0x08;

/// Runs and row count decoded from a stream, already validated.
#[derive(Debug)]
pub struct Decoded<V> {
    /// Runs in ascending row order.
    pub runs: Vec<Run<V>>,
    /// Total rows covered by `runs`.
    pub row_count: u64,
}

/// Writes a full store image.
///
/// Each run is staged in a scratch buffer so unbuffered writers see one
/// `write_all` per run.
pub fn encode_runs<V, W>(w: &mut W, runs: &[Run<V>], row_count: u64) -> Result<()>
where
    V: StoredValue,
    W: Write + ?Sized,
{
    w.write_all(MAGIC)?;
    var::write_u64(w, runs.len() as u64)?;
    var::write_u64(w, row_count)?;

    let mut scratch = Vec::with_capacity(64);
    for run in runs {
        scratch.clear();
        var::write_u64(&mut scratch, run.start_row)?;
        var::write_u64(&mut scratch, run.length)?;
        run.value.encode(&mut scratch)?;
        w.write_all(&scratch)?;
    }
    Ok(())
}

/// Reads a full store image, checking every store invariant on the way.
///
/// Nothing is returned unless the whole image decodes, so callers can swap
/// the result in without a partial state ever becoming visible.
pub fn decode_runs<V, R>(r: &mut R, limits: &DecodeLimits) -> Result<Decoded<V>>
where
    V: StoredValue,
    R: Read + ?Sized,
{
    read_magic(r)?;

    let run_count = var::read_u64(r, "run count")?;
    let row_count = var::read_u64(r, "row count")?;
    if run_count > row_count || (run_count == 0) != (row_count == 0) {
        return Err(RleError::Corruption(format!(
            "{run_count} runs cannot cover {row_count} rows"
        )));
    }
    let run_count = usize::try_from(run_count)
        .map_err(|_| RleError::Corruption("run count exceeds address space".into()))?;

    let mut runs: Vec<Run<V>> = Vec::with_capacity(run_count.min(MAX_PREALLOC_RUNS));
    let mut next_row = 0u64;
    for _ in 0..run_count {
        let start_row = var::read_u64(r, "run start")?;
        let length = var::read_u64(r, "run length")?;
        let value = V::decode(r, limits)?;

        if length == 0 {
            return Err(RleError::Corruption(format!(
                "zero-length run at row {start_row}"
            )));
        }
        if start_row != next_row {
            return Err(RleError::Corruption(format!(
                "run starts at row {start_row}, expected {next_row}"
            )));
        }
        if let Some(prev) = runs.last() {
            if prev.value.identical(&value) {
                return Err(RleError::Corruption(format!(
                    "adjacent runs at row {start_row} hold equal values"
                )));
            }
        }
        next_row = next_row
            .checked_add(length)
            .ok_or_else(|| RleError::Corruption("row count overflow".into()))?;
        runs.push(Run {
            start_row,
            length,
            value,
        });
    }

    if next_row != row_count {
        return Err(RleError::Corruption(format!(
            "runs cover {next_row} rows but header declares {row_count}"
        )));
    }
    Ok(Decoded { runs, row_count })
}

fn read_magic<R: Read + ?Sized>(r: &mut R) -> Result<()> {
    let mut magic = [0u8; 8];
    match r.read_exact(&mut magic) {
        Ok(()) if &magic == MAGIC => Ok(()),
        Ok(()) => Err(RleError::BadMagic),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(RleError::BadMagic),
        Err(err) => Err(RleError::Io(err)),
    }
}

pub(crate) fn write_value<W: Write + ?Sized>(w: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Null => {
            w.write_all(&[TAG_NULL])?;
            Ok(())
        }
        Value::Bool(v) => write_bool(w, *v),
        Value::Int(v) => write_int(w, *v),
        Value::UInt(v) => write_uint(w, *v),
        Value::Float(v) => write_float(w, *v),
        Value::String(s) => write_string(w, s),
        Value::Bytes(b) => write_bytes(w, b),
        Value::Record(fields) => {
            w.write_all(&[TAG_RECORD])?;
            var::write_u64(w, fields.len() as u64)?;
            for (name, field) in fields {
                write_len_prefixed(w, name.as_bytes())?;
                write_value(w, field)?;
            }
            Ok(())
        }
        Value::List(items) => {
            w.write_all(&[TAG_LIST])?;
            var::write_u64(w, items.len() as u64)?;
            for item in items {
                write_value(w, item)?;
            }
            Ok(())
        }
    }
}

pub(crate) fn write_bool<W: Write + ?Sized>(w: &mut W, v: bool) -> Result<()> {
    w.write_all(&[TAG_BOOL, u8::from(v)])?;
    Ok(())
}

pub(crate) fn write_int<W: Write + ?Sized>(w: &mut W, v: i64) -> Result<()> {
    w.write_all(&[TAG_INT])?;
    var::write_i64(w, v)
}

pub(crate) fn write_uint<W: Write + ?Sized>(w: &mut W, v: u64) -> Result<()> {
    w.write_all(&[TAG_UINT])?;
    var::write_u64(w, v)
}

pub(crate) fn write_float<W: Write + ?Sized>(w: &mut W, v: f64) -> Result<()> {
    w.write_all(&[TAG_FLOAT])?;
    w.write_all(&v.to_bits().to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_string<W: Write + ?Sized>(w: &mut W, v: &str) -> Result<()> {
    w.write_all(&[TAG_STRING])?;
    write_len_prefixed(w, v.as_bytes())
}

pub(crate) fn write_bytes<W: Write + ?Sized>(w: &mut W, v: &[u8]) -> Result<()> {
    w.write_all(&[TAG_BYTES])?;
    write_len_prefixed(w, v)
}

fn write_len_prefixed<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> Result<()> {
    var::write_u64(w, bytes.len() as u64)?;
    w.write_all(bytes)?;
    Ok(())
}

pub(crate) fn read_value<R: Read + ?Sized>(r: &mut R, limits: &DecodeLimits) -> Result<Value> {
    read_value_at(r, limits, 0)
}

fn read_value_at<R: Read + ?Sized>(
    r: &mut R,
    limits: &DecodeLimits,
    depth: usize,
) -> Result<Value> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag)
        .map_err(|err| RleError::from_read(err, "value tag"))?;
    match tag[0] {
        TAG_NULL => Ok(Value::Null),
        TAG_BOOL => {
            let mut byte = [0u8; 1];
            r.read_exact(&mut byte)
                .map_err(|err| RleError::from_read(err, "bool payload"))?;
            match byte[0] {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                other => Err(RleError::Corruption(format!(
                    "invalid boolean encoding: {other}"
                ))),
            }
        }
        TAG_INT => Ok(Value::Int(var::read_i64(r, "int payload")?)),
        TAG_UINT => Ok(Value::UInt(var::read_u64(r, "uint payload")?)),
        TAG_FLOAT => {
            let mut bytes = [0u8; 8];
            r.read_exact(&mut bytes)
                .map_err(|err| RleError::from_read(err, "float payload"))?;
            Ok(Value::Float(f64::from_bits(u64::from_le_bytes(bytes))))
        }
        TAG_STRING => Ok(Value::String(read_string(r, limits)?)),
        TAG_BYTES => Ok(Value::Bytes(read_len_prefixed(r, limits, "bytes payload")?)),
        TAG_RECORD => {
            check_depth(limits, depth)?;
            let count = read_len(r, limits, "record field count")?;
            let mut fields = Vec::with_capacity(count.min(MAX_PREALLOC_RUNS));
            for _ in 0..count {
                let name = read_string(r, limits)?;
                let field = read_value_at(r, limits, depth + 1)?;
                fields.push((name, field));
            }
            Ok(Value::Record(fields))
        }
        TAG_LIST => {
            check_depth(limits, depth)?;
            let count = read_len(r, limits, "list length")?;
            let mut items = Vec::with_capacity(count.min(MAX_PREALLOC_RUNS));
            for _ in 0..count {
                items.push(read_value_at(r, limits, depth + 1)?);
            }
            Ok(Value::List(items))
        }
        other => Err(RleError::UnknownTag(other)),
    }
}

fn check_depth(limits: &DecodeLimits, depth: usize) -> Result<()> {
    if depth >= limits.max_depth {
        return Err(RleError::Corruption(format!(
            "value nesting exceeds {} levels",
            limits.max_depth
        )));
    }
    Ok(())
}

fn read_len<R: Read + ?Sized>(
    r: &mut R,
    limits: &DecodeLimits,
    context: &'static str,
) -> Result<usize> {
    let len = var::read_u64(r, context)?;
    if len > limits.max_len {
        return Err(RleError::Corruption(format!(
            "{context} {len} exceeds limit {}",
            limits.max_len
        )));
    }
    usize::try_from(len)
        .map_err(|_| RleError::Corruption(format!("{context} {len} exceeds address space")))
}

fn read_len_prefixed<R: Read + ?Sized>(
    r: &mut R,
    limits: &DecodeLimits,
    context: &'static str,
) -> Result<Vec<u8>> {
    let len = read_len(r, limits, context)?;
    let mut buf = Vec::new();
    Read::take(&mut *r, len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(RleError::Truncated(context));
    }
    Ok(buf)
}

fn read_string<R: Read + ?Sized>(r: &mut R, limits: &DecodeLimits) -> Result<String> {
    let bytes = read_len_prefixed(r, limits, "string payload")?;
    String::from_utf8(bytes).map_err(|_| RleError::Corruption("invalid UTF-8 string".into()))
}
