use std::{cmp::Ordering, fmt};

use crate::{
    io::{Decodeable, Encodeable, SmallReader, SmallWriter},
    operator::Op,
    storage::{Type, STRING_LEN},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Int(i32),
    String(String),
}

impl Cell {
    pub fn get_type(&self) -> Type {
        match self {
            Cell::Int(_) => Type::Int,
            Cell::String(_) => Type::String,
        }
    }

    /// Compare the cell with another one using the given operator. Cells of
    /// different types never satisfy any operator.
    pub fn compare(&self, op: &Op, other: &Cell) -> bool {
        let ord = match self.partial_cmp(other) {
            Some(ord) => ord,
            None => return false,
        };

        match op {
            Op::Equals => ord == Ordering::Equal,
            Op::NotEquals => ord != Ordering::Equal,
            Op::GreaterThan => ord == Ordering::Greater,
            Op::GreaterThanOrEq => ord != Ordering::Less,
            Op::LessThan => ord == Ordering::Less,
            Op::LessThanOrEq => ord != Ordering::Greater,
            Op::Like => match (self, other) {
                (Cell::String(a), Cell::String(b)) => a.contains(b.as_str()),
                _ => ord == Ordering::Equal,
            },
        }
    }

    pub fn decode_from(reader: &mut SmallReader, t: &Type) -> Self {
        match t {
            Type::Int => Cell::Int(i32::decode_from(reader)),
            Type::String => {
                let size = (u32::decode_from(reader) as usize).min(STRING_LEN);
                let bytes = reader.read_exact(size);
                reader.skip(STRING_LEN - size);
                Cell::String(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => a.partial_cmp(b),
            (Cell::String(a), Cell::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Encodeable for Cell {
    fn encode(&self, writer: &mut SmallWriter) {
        match self {
            Cell::Int(v) => writer.write(v),
            Cell::String(v) => {
                // strings longer than the fixed width are truncated
                let bytes = &v.as_bytes()[..v.len().min(STRING_LEN)];
                writer.write(&(bytes.len() as u32));
                writer.write_bytes(bytes);
                writer.write_bytes(&vec![0; STRING_LEN - bytes.len()]);
            }
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{}", v),
            Cell::String(v) => write!(f, "{}", v),
        }
    }
}
