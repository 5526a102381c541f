use std::{
    convert::TryInto,
    fs::{File, OpenOptions},
    io::{self, prelude::*, SeekFrom},
    mem::size_of,
    path::Path,
    sync::Mutex,
};

use crate::utils::HandyMutex;

/// A file that is read and written at byte offsets. All accesses are
/// serialized, so a page is always read or written as a whole.
pub struct SmallFile {
    file: Mutex<File>,
}

impl SmallFile {
    /// Open the file at the given path with read and write mode.
    ///
    /// If the file doesn't exist, it will be created. Existing content is
    /// kept.
    pub fn open<P: AsRef<Path>>(file_path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .open(file_path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut file = self.file.ml();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }

    /// Write the buffer at the given offset and wait until the bytes reach
    /// the disk.
    pub fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let mut file = self.file.ml();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        file.flush()?;
        file.sync_data()
    }

    pub fn get_size(&self) -> io::Result<u64> {
        Ok(self.file.ml().metadata()?.len())
    }
}

/// Reads values out of an in-memory byte slice, front to back.
pub struct SmallReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> SmallReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    pub fn read_exact(&mut self, bytes_count: usize) -> &'a [u8] {
        let start = self.cursor;
        let end = self.cursor + bytes_count;

        // boundary check
        if end > self.buf.len() {
            panic!(
                "read out of boundary, cursor: {}, want: {}, len: {}",
                self.cursor,
                bytes_count,
                self.buf.len()
            );
        }

        self.cursor = end;
        &self.buf[start..end]
    }

    pub fn skip(&mut self, bytes_count: usize) {
        self.read_exact(bytes_count);
    }
}

pub struct SmallWriter {
    buf: Vec<u8>,
}

impl SmallWriter {
    /// Create a new `SmallWriter` with a buffer of the given capacity.
    pub fn new_reserved(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn write<T: Encodeable>(&mut self, obj: &T) {
        obj.encode(self);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pad the buffer with zeros to the given size and hand it out.
    pub fn to_padded_bytes(mut self, size: usize) -> Vec<u8> {
        if self.buf.len() > size {
            panic!(
                "buffer size is larger than the given size: {} > {}",
                self.buf.len(),
                size
            );
        }

        self.buf.resize(size, 0);
        self.buf
    }
}

pub trait Encodeable {
    fn encode(&self, writer: &mut SmallWriter);
}

pub trait Decodeable {
    fn decode_from(reader: &mut SmallReader) -> Self;
}

/// Integers are stored in network byte order (big endian), which is what
/// existing table files use.
macro_rules! impl_serialization {
    (for $($t:ty),+) => {
        $(
            impl Encodeable for $t {
                fn encode(&self, writer: &mut SmallWriter) {
                    writer.write_bytes(&self.to_be_bytes());
                }
            }

            impl Decodeable for $t {
                fn decode_from(reader: &mut SmallReader) -> Self {
                    let bytes = reader.read_exact(size_of::<Self>());
                    Self::from_be_bytes(bytes.try_into().unwrap())
                }
            }
        )*
    }
}

impl_serialization!(for u32, i32);
