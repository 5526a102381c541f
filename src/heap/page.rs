use std::{fmt, sync::Arc};

use bit_vec::BitVec;

use super::HeapPageID;
use crate::{
    error::SmallError,
    io::{SmallReader, SmallWriter},
    storage::{RecordId, Schema, Tuple},
    transaction::Transaction,
    types::SmallResult,
    utils::{ceil_div, floor_div},
};

/// The in-memory form of a heap page.
///
/// # Format
///
/// - header: one bit per slot, slot `i` lives in bit `i % 8` (least
///   significant bit first) of byte `i / 8`, set if the slot is occupied
/// - slots: `slot_count` fixed-size tuples, empty slots are zero bytes
/// - padding: zero bytes up to the page size
pub struct HeapPage {
    pid: HeapPageID,

    schema: Arc<Schema>,

    page_size: usize,

    slot_count: usize,

    // indicate slots' status: true means occupied, false means empty
    header: BitVec<u32>,

    // one entry per slot, `None` for empty slots
    tuples: Vec<Option<Tuple>>,

    // the transaction that dirtied the page, `None` for a clean page
    dirty: Option<Transaction>,
}

impl HeapPage {
    /// Decode a page from its on-disk bytes. The page size is the length
    /// of `bytes`.
    pub fn new(
        pid: &HeapPageID,
        bytes: &[u8],
        schema: &Arc<Schema>,
    ) -> Result<Self, SmallError> {
        let page_size = bytes.len();
        let slot_count = Self::calculate_slots_count(schema, page_size);
        if slot_count == 0 {
            return Err(SmallError::new(&format!(
                "page size {} is too small for tuples of {} bytes",
                page_size,
                schema.get_size()
            )));
        }
        let header_size = Self::calculate_header_size(slot_count);

        let header_bytes: Vec<u8> =
            bytes[..header_size].iter().map(|b| b.reverse_bits()).collect();
        let mut header = BitVec::from_bytes(&header_bytes);
        header.truncate(slot_count);

        let tuple_size = schema.get_size();
        let mut tuples = Vec::with_capacity(slot_count);
        for i in 0..slot_count {
            if !header[i] {
                tuples.push(None);
                continue;
            }

            let start = header_size + i * tuple_size;
            let mut reader = SmallReader::new(&bytes[start..start + tuple_size]);
            let mut tuple = Tuple::decode_from(&mut reader, schema);
            tuple.set_record_id(Some(RecordId::new(*pid, i)));
            tuples.push(Some(tuple));
        }

        Ok(Self {
            pid: *pid,
            schema: Arc::clone(schema),
            page_size,
            slot_count,
            header,
            tuples,
            dirty: None,
        })
    }

    /// The bytes of a page with no tuples in it. Used to add new pages to
    /// a file.
    pub fn empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0; page_size]
    }

    /// Retrieve the maximum number of tuples a page can hold, every tuple
    /// costs its own size plus one header bit.
    pub fn calculate_slots_count(schema: &Schema, page_size: usize) -> usize {
        let bits_per_tuple_including_header = schema.get_size() * 8 + 1;
        floor_div(page_size * 8, bits_per_tuple_including_header)
    }

    pub fn calculate_header_size(slot_count: usize) -> usize {
        ceil_div(slot_count, 8)
    }
}

impl HeapPage {
    pub fn get_pid(&self) -> HeapPageID {
        self.pid
    }

    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get_slots_count(&self) -> usize {
        self.slot_count
    }

    pub fn is_slot_used(&self, slot_index: usize) -> bool {
        self.header.get(slot_index).unwrap_or(false)
    }

    pub fn empty_slots_count(&self) -> usize {
        self.header.iter().filter(|used| !used).count()
    }

    /// Returns the number of tuples currently stored on this page
    pub fn tuples_count(&self) -> usize {
        self.slot_count - self.empty_slots_count()
    }

    /// Put the tuple into the first empty slot, return where it was
    /// stored.
    pub fn insert_tuple(&mut self, tuple: &Tuple) -> Result<RecordId, SmallError> {
        if !tuple.matches(&self.schema) {
            return Err(SmallError::new(&format!(
                "tuple {} doesn't match schema {}",
                tuple, self.schema
            )));
        }

        let slot = (0..self.slot_count)
            .find(|i| !self.is_slot_used(*i))
            .ok_or_else(|| SmallError::new(&format!("page {:?} is full", self.pid)))?;

        let record_id = RecordId::new(self.pid, slot);
        let mut stored = tuple.clone();
        stored.set_record_id(Some(record_id));

        self.header.set(slot, true);
        self.tuples[slot] = Some(stored);
        Ok(record_id)
    }

    /// Remove the tuple from the slot its record id points to.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> SmallResult {
        let record_id = tuple
            .get_record_id()
            .ok_or_else(|| SmallError::new("tuple has no record id"))?;

        if record_id.page_id != self.pid {
            return Err(SmallError::new(&format!(
                "tuple {:?} is not on page {:?}",
                tuple, self.pid
            )));
        }

        if !self.is_slot_used(record_id.slot_number) {
            return Err(SmallError::new(&format!(
                "slot {} of page {:?} is already empty",
                record_id.slot_number, self.pid
            )));
        }

        self.header.set(record_id.slot_number, false);
        self.tuples[record_id.slot_number] = None;
        Ok(())
    }

    /// Iterate over the stored tuples in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(|t| t.as_ref())
    }

    /// Encode the page into exactly `page_size` bytes.
    pub fn get_page_data(&self) -> Vec<u8> {
        let mut writer = SmallWriter::new_reserved(self.page_size);

        let header: Vec<u8> =
            self.header.to_bytes().iter().map(|b| b.reverse_bits()).collect();
        writer.write_bytes(&header);

        let empty_tuple = vec![0; self.schema.get_size()];
        for tuple in &self.tuples {
            match tuple {
                Some(t) => writer.write(t),
                None => writer.write_bytes(&empty_tuple),
            }
        }

        writer.to_padded_bytes(self.page_size)
    }

    /// Mark the page as dirtied (or cleaned) by the given transaction.
    pub fn mark_dirty(&mut self, dirty: bool, tx: &Transaction) {
        if dirty {
            self.dirty = Some(*tx);
        } else {
            self.dirty = None;
        }
    }

    /// The transaction that last dirtied the page, `None` if the page is
    /// clean.
    pub fn is_dirty(&self) -> Option<Transaction> {
        self.dirty
    }
}

impl fmt::Debug for HeapPage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "HeapPage {{ pid: {:?}, tuples: {}/{}, header: {}, dirty: {:?} }}",
            self.pid,
            self.tuples_count(),
            self.slot_count,
            hex::encode(self.header.to_bytes()),
            self.dirty,
        )
    }
}
