use std::fmt;

use crate::{
    heap::HeapPageID,
    io::{Encodeable, SmallReader, SmallWriter},
    storage::{Cell, Schema},
};

/// A reference to a specific slot on a specific page of a specific table.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct RecordId {
    pub page_id: HeapPageID,
    pub slot_number: usize,
}

impl RecordId {
    pub fn new(page_id: HeapPageID, slot_number: usize) -> Self {
        Self {
            page_id,
            slot_number,
        }
    }
}

#[derive(Clone)]
pub struct Tuple {
    cells: Vec<Cell>,

    /// Where the tuple is stored, `None` if the tuple hasn't been written
    /// to any page yet.
    record_id: Option<RecordId>,
}

// constructors
impl Tuple {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            record_id: None,
        }
    }

    /// A tuple with `width` int cells, all of them set to `value`.
    pub fn new_int_tuple(value: i32, width: usize) -> Self {
        Self::new(vec![Cell::Int(value); width])
    }

    pub(crate) fn decode_from(reader: &mut SmallReader, schema: &Schema) -> Self {
        let cells = schema
            .get_fields()
            .iter()
            .map(|field| Cell::decode_from(reader, &field.t))
            .collect();
        Self::new(cells)
    }

    /// Concatenate the cells of two tuples, used by joins.
    pub fn merge(left: &Tuple, right: &Tuple) -> Self {
        let mut cells = left.cells.clone();
        cells.extend(right.cells.iter().cloned());
        Self::new(cells)
    }
}

impl Tuple {
    pub fn get_cell(&self, i: usize) -> &Cell {
        &self.cells[i]
    }

    pub fn get_cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn set_cell(&mut self, i: usize, cell: Cell) {
        self.cells[i] = cell;
    }

    pub fn get_record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Whether the cells of the tuple have the types the schema asks for.
    pub fn matches(&self, schema: &Schema) -> bool {
        self.cells.len() == schema.fields_count()
            && self
                .cells
                .iter()
                .zip(schema.get_fields())
                .all(|(cell, field)| cell.get_type() == field.t)
    }
}

impl Encodeable for Tuple {
    fn encode(&self, writer: &mut SmallWriter) {
        for cell in &self.cells {
            writer.write(cell);
        }
    }
}

/// Tuples are compared by content, the location is ignored.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut content: String = "{".to_owned();
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                content.push_str(", ");
            }
            content.push_str(&cell.to_string());
        }
        content.push('}');
        write!(f, "{}", content)
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.record_id {
            Some(rid) => write!(f, "{}@{:?}#{}", self, rid.page_id, rid.slot_number),
            None => write!(f, "{}", self),
        }
    }
}
