use rand::prelude::*;
use small_heap::{
    operator::SeqScan, Cell, Database, HeapPage, HeapPageID, OpIterator, Schema, Transaction,
    Tuple,
};

pub fn new_int_table(db: &Database, name: &str, columns: usize) -> u32 {
    db.create_table(name, Schema::small_int_schema(columns))
        .unwrap()
}

/// A table with `pages` empty pages.
pub fn new_paged_table(db: &Database, name: &str, pages: usize) -> (u32, Vec<HeapPageID>) {
    let table_id = new_int_table(db, name, 2);
    let file = db.get_file(table_id).unwrap();
    let pids = (0..pages).map(|_| file.allocate_page().unwrap()).collect();
    (table_id, pids)
}

pub fn new_random_rows(rows: usize, columns: usize) -> Vec<Vec<i32>> {
    let mut rng = rand::thread_rng();
    (0..rows)
        .map(|_| (0..columns).map(|_| rng.gen_range(-1000, 1000)).collect())
        .collect()
}

pub fn to_tuple(row: &[i32]) -> Tuple {
    Tuple::new(row.iter().map(|v| Cell::Int(*v)).collect())
}

pub fn to_row(tuple: &Tuple) -> Vec<i32> {
    tuple
        .get_cells()
        .iter()
        .map(|cell| match cell {
            Cell::Int(v) => *v,
            other => panic!("not an int cell: {}", other),
        })
        .collect()
}

/// Insert the rows in a single transaction and commit it.
pub fn insert_rows(db: &Database, table_id: u32, rows: &[Vec<i32>]) {
    let tx = Transaction::new();
    for row in rows {
        db.buffer_pool()
            .insert_tuple(&tx, table_id, &to_tuple(row))
            .unwrap();
    }
    tx.commit(db.buffer_pool()).unwrap();
}

/// Read all tuples of the table as part of `tx`.
pub fn scan_all(db: &Database, tx: &Transaction, table_id: u32) -> Vec<Tuple> {
    let mut scan = SeqScan::new(tx, db.catalog(), db.buffer_pool(), table_id, "t").unwrap();
    scan.open().unwrap();

    let mut tuples = Vec::new();
    while scan.has_next().unwrap() {
        tuples.push(scan.next().unwrap());
    }
    scan.close();
    tuples
}

/// Rows of the table as seen by a new transaction, sorted.
pub fn committed_rows(db: &Database, table_id: u32) -> Vec<Vec<i32>> {
    let tx = Transaction::new();
    let mut rows: Vec<Vec<i32>> = scan_all(db, &tx, table_id).iter().map(to_row).collect();
    tx.commit(db.buffer_pool()).unwrap();

    rows.sort();
    rows
}

pub fn sorted(rows: &[Vec<i32>]) -> Vec<Vec<i32>> {
    let mut rows = rows.to_vec();
    rows.sort();
    rows
}

pub fn slots_per_page(db: &Database, table_id: u32) -> usize {
    let schema = db.catalog().get_schema(table_id).unwrap();
    HeapPage::calculate_slots_count(&schema, db.config().page_size)
}
