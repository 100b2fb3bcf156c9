#![forbid(unsafe_code)]
//! Varint utilities shared by the store codec.

pub mod var {
    //! Unsigned LEB128 varints and ZigZag signed integers over byte streams.

    use std::io::{Read, Write};

    use crate::types::{Result, RleError};

    /// Maximum encoded length of a u64 varint.
    pub const MAX_VARINT_LEN: usize = 10;

    /// Writes a u64 varint to a stream.
    pub fn write_u64<W: Write + ?Sized>(w: &mut W, v: u64) -> Result<()> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let mut len = 0;
        let mut rest = v;
        loop {
            let byte = (rest & 0x7f) as u8;
            rest >>= 7;
            if rest == 0 {
                buf[len] = byte;
                len += 1;
                break;
            }
            buf[len] = byte | 0x80;
            len += 1;
        }
        w.write_all(&buf[..len])?;
        Ok(())
    }

    /// Reads a u64 varint from a stream.
    ///
    /// `context` names the field being read and ends up in the
    /// [`RleError::Truncated`] message when the stream runs out.
    pub fn read_u64<R: Read + ?Sized>(r: &mut R, context: &'static str) -> Result<u64> {
        let mut result = 0u64;
        let mut shift = 0u32;
        for i in 0..MAX_VARINT_LEN {
            let mut byte = [0u8; 1];
            r.read_exact(&mut byte)
                .map_err(|err| RleError::from_read(err, context))?;
            let byte = byte[0];
            let payload = (byte & 0x7f) as u64;
            if i == MAX_VARINT_LEN - 1 && payload > 1 {
                return Err(RleError::Corruption(format!(
                    "varint overflow while reading {context}"
                )));
            }
            result |= payload << shift;
            if (byte & 0x80) == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(RleError::Corruption(format!(
            "varint too long while reading {context}"
        )))
    }

    /// Maps an i64 onto the ZigZag unsigned space.
    pub fn zigzag(v: i64) -> u64 {
        ((v << 1) ^ (v >> 63)) as u64
    }

    /// Inverse of [`zigzag`].
    pub fn unzigzag(v: u64) -> i64 {
        ((v >> 1) as i64) ^ (-((v & 1) as i64))
    }

    /// Writes an i64 as a ZigZag-encoded varint.
    pub fn write_i64<W: Write + ?Sized>(w: &mut W, v: i64) -> Result<()> {
        write_u64(w, zigzag(v))
    }

    /// Reads a ZigZag-encoded i64 varint.
    pub fn read_i64<R: Read + ?Sized>(r: &mut R, context: &'static str) -> Result<i64> {
        read_u64(r, context).map(unzigzag)
    }
}
