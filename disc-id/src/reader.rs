//! Random-access byte reader over a disc image file.

use disc_id_core::ReadSeek;
use std::io::{Read, Seek, SeekFrom};

/// A positioned view over a disc image. Wraps any [`ReadSeek`] and adds
/// the handful of access patterns the UDF/ISO9660/scanner readers need:
/// bounded positioned reads and a chunked sequential scan.
pub struct ByteReader<'a> {
    inner: &'a mut dyn ReadSeek,
    size: u64,
}

impl<'a> ByteReader<'a> {
    pub fn new(inner: &'a mut dyn ReadSeek) -> std::io::Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, size })
    }

    /// Total size of the underlying image, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read up to `n` bytes starting at `offset`. Requests that run past
    /// the end of the file return whatever bytes were available rather
    /// than erroring — callers treat a short read as "not found".
    pub fn read_at(&mut self, offset: u64, n: usize) -> std::io::Result<Vec<u8>> {
        if offset >= self.size {
            return Ok(Vec::new());
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        let available = (self.size - offset).min(n as u64) as usize;
        let mut buf = vec![0u8; available];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Scan the file sequentially in `chunk_size`-byte buffers, invoking
    /// `callback` with each buffer's starting offset and contents. The
    /// final chunk may be shorter than `chunk_size`. Scanning stops when
    /// `callback` returns `Some(_)`, which becomes the scan's result.
    pub fn sequential_scan<T>(
        &mut self,
        chunk_size: usize,
        mut callback: impl FnMut(u64, &[u8]) -> Option<T>,
    ) -> std::io::Result<Option<T>> {
        self.inner.seek(SeekFrom::Start(0))?;
        let mut offset = 0u64;
        let mut buf = vec![0u8; chunk_size];
        loop {
            let n = read_up_to(self.inner, &mut buf)?;
            if n == 0 {
                return Ok(None);
            }
            if let Some(result) = callback(offset, &buf[..n]) {
                return Ok(Some(result));
            }
            offset += n as u64;
            if n < chunk_size {
                return Ok(None);
            }
        }
    }
}

fn read_up_to(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_at_bounds() {
        let mut data = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let mut reader = ByteReader::new(&mut data).unwrap();
        assert_eq!(reader.size(), 5);
        assert_eq!(reader.read_at(0, 3).unwrap(), vec![1, 2, 3]);
        assert_eq!(reader.read_at(3, 10).unwrap(), vec![4, 5]);
        assert_eq!(reader.read_at(5, 10).unwrap(), Vec::<u8>::new());
        assert_eq!(reader.read_at(100, 10).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn sequential_scan_visits_all_chunks() {
        let mut data = Cursor::new(vec![0u8; 10]);
        let mut reader = ByteReader::new(&mut data).unwrap();
        let mut offsets = Vec::new();
        reader
            .sequential_scan(4, |offset, _chunk| {
                offsets.push(offset);
                None::<()>
            })
            .unwrap();
        assert_eq!(offsets, vec![0, 4, 8]);
    }

    #[test]
    fn sequential_scan_stops_on_hit() {
        let mut data = Cursor::new(vec![0u8, 0, 1, 0, 0, 0]);
        let mut reader = ByteReader::new(&mut data).unwrap();
        let result = reader
            .sequential_scan(2, |offset, chunk| {
                chunk.iter().position(|&b| b == 1).map(|i| offset + i as u64)
            })
            .unwrap();
        assert_eq!(result, Some(2));
    }
}
