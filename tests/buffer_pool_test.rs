mod test_utils;

use small_heap::{utils::HandyRwLock, HeapPageID, Permission, SmallError, Transaction, Tuple};
use test_utils::{
    committed_rows, default_config, insert_rows, new_int_table, new_paged_table,
    new_random_rows, setup, setup_with, slots_per_page, sorted, to_tuple,
};

#[test]
fn test_evict_least_recent_clean_page() {
    let db = setup_with(default_config().buffer_pool_pages(2));
    let (_, pids) = new_paged_table(&db, "paged", 3);
    let pool = db.buffer_pool();

    let tx = Transaction::new();
    pool.get_page(&tx, Permission::ReadOnly, &pids[0]).unwrap();
    pool.get_page(&tx, Permission::ReadOnly, &pids[1]).unwrap();
    assert_eq!(pool.resident_pages(), vec![pids[0], pids[1]]);

    pool.get_page(&tx, Permission::ReadOnly, &pids[2]).unwrap();
    assert_eq!(pool.resident_pages(), vec![pids[1], pids[2]]);
    assert_eq!(pool.pages_count_cached(), 2);

    tx.commit(pool).unwrap();
}

#[test]
fn test_cache_hit_refreshes_recency() {
    let db = setup_with(default_config().buffer_pool_pages(2));
    let (_, pids) = new_paged_table(&db, "paged", 3);
    let pool = db.buffer_pool();

    let tx = Transaction::new();
    pool.get_page(&tx, Permission::ReadOnly, &pids[0]).unwrap();
    pool.get_page(&tx, Permission::ReadOnly, &pids[1]).unwrap();
    pool.get_page(&tx, Permission::ReadOnly, &pids[0]).unwrap();
    pool.get_page(&tx, Permission::ReadOnly, &pids[2]).unwrap();
    assert_eq!(pool.resident_pages(), vec![pids[0], pids[2]]);

    tx.commit(pool).unwrap();
}

#[test]
fn test_exclusive_locked_page_not_evicted() {
    let db = setup_with(default_config().buffer_pool_pages(2));
    let (_, pids) = new_paged_table(&db, "paged", 3);
    let pool = db.buffer_pool();

    let writer = Transaction::new();
    pool.get_page(&writer, Permission::ReadWrite, &pids[0]).unwrap();

    let reader = Transaction::new();
    pool.get_page(&reader, Permission::ReadOnly, &pids[1]).unwrap();
    pool.get_page(&reader, Permission::ReadOnly, &pids[2]).unwrap();
    assert_eq!(pool.resident_pages(), vec![pids[0], pids[2]]);

    writer.commit(pool).unwrap();
    reader.commit(pool).unwrap();
}

#[test]
fn test_exclusive_locked_clean_pages_pinned() {
    let db = setup_with(default_config().buffer_pool_pages(2));
    let (_, pids) = new_paged_table(&db, "paged", 3);
    let pool = db.buffer_pool();

    let writer = Transaction::new();
    for pid in &pids[..2] {
        pool.get_page(&writer, Permission::ReadWrite, pid).unwrap();
    }

    // both resident pages are clean, but the writer may still dirty them
    let reader = Transaction::new();
    let result = pool.get_page(&reader, Permission::ReadOnly, &pids[2]);
    assert!(matches!(result, Err(SmallError::ResourceExhausted(_))));
    assert_eq!(pool.resident_pages(), vec![pids[0], pids[1]]);

    writer.commit(pool).unwrap();
    pool.get_page(&reader, Permission::ReadOnly, &pids[2]).unwrap();
    assert_eq!(pool.resident_pages(), vec![pids[1], pids[2]]);
    reader.commit(pool).unwrap();
}

#[test]
fn test_all_pages_dirty() {
    let db = setup_with(default_config().buffer_pool_pages(2));
    let (table_id, pids) = new_paged_table(&db, "paged", 3);
    let pool = db.buffer_pool();

    let writer = Transaction::new();
    for pid in &pids[..2] {
        let pod = pool.get_page(&writer, Permission::ReadWrite, pid).unwrap();
        let mut page = pod.wl();
        page.insert_tuple(&Tuple::new_int_tuple(1, 2)).unwrap();
        page.mark_dirty(true, &writer);
    }

    // nothing can be evicted, the uncommitted pages stay in the cache
    let reader = Transaction::new();
    let result = pool.get_page(&reader, Permission::ReadOnly, &pids[2]);
    assert!(matches!(result, Err(SmallError::ResourceExhausted(_))));
    assert_eq!(pool.resident_pages(), vec![pids[0], pids[1]]);

    // once the writer commits its pages are clean and can be evicted
    writer.commit(pool).unwrap();
    pool.get_page(&reader, Permission::ReadOnly, &pids[2]).unwrap();
    assert_eq!(pool.resident_pages(), vec![pids[1], pids[2]]);
    reader.commit(pool).unwrap();

    assert_eq!(committed_rows(&db, table_id).len(), 2);
}

#[test]
fn test_commit_forces_pages() {
    let db = setup();
    let table_id = new_int_table(&db, "t", 2);
    let pool = db.buffer_pool();
    let file = db.get_file(table_id).unwrap();

    let rows = new_random_rows(100, 2);
    let tx = Transaction::new();
    for row in &rows {
        pool.insert_tuple(&tx, table_id, &to_tuple(row)).unwrap();
    }

    let slots = slots_per_page(&db, table_id);
    let pages_count = file.pages_count().unwrap();
    assert_eq!(pages_count, (rows.len() + slots - 1) / slots);

    // no uncommitted tuple reaches the disk
    for i in 0..pages_count {
        let page = file.read_page(&HeapPageID::new(table_id, i as u32)).unwrap();
        assert_eq!(page.tuples_count(), 0);
    }

    tx.commit(pool).unwrap();

    // the disk copy of every page is the same as the cached one
    let checker = Transaction::new();
    for i in 0..pages_count {
        let pid = HeapPageID::new(table_id, i as u32);
        let pod = pool.get_page(&checker, Permission::ReadOnly, &pid).unwrap();
        let page = pod.rl();
        assert!(page.is_dirty().is_none());
        assert_eq!(page.get_page_data(), file.read_page_data(&pid).unwrap());
    }
    checker.commit(pool).unwrap();

    assert_eq!(committed_rows(&db, table_id), sorted(&rows));
}

#[test]
fn test_abort_restores_pages() {
    let db = setup();
    let table_id = new_int_table(&db, "t", 2);
    let pool = db.buffer_pool();
    let file = db.get_file(table_id).unwrap();

    let initial = new_random_rows(40, 2);
    insert_rows(&db, table_id, &initial);

    let pages_count = file.pages_count().unwrap();
    let before: Vec<Vec<u8>> = (0..pages_count)
        .map(|i| {
            file.read_page_data(&HeapPageID::new(table_id, i as u32))
                .unwrap()
        })
        .collect();

    let tx = Transaction::new();
    let tuples = test_utils::scan_all(&db, &tx, table_id);
    for tuple in tuples.iter().take(10) {
        pool.delete_tuple(&tx, tuple).unwrap();
    }
    for row in new_random_rows(50, 2) {
        pool.insert_tuple(&tx, table_id, &to_tuple(&row)).unwrap();
    }
    tx.abort(pool).unwrap();

    // both the disk and the cache hold the content from before the
    // transaction
    let checker = Transaction::new();
    for (i, data) in before.iter().enumerate() {
        let pid = HeapPageID::new(table_id, i as u32);
        assert_eq!(&file.read_page_data(&pid).unwrap(), data);

        let pod = pool.get_page(&checker, Permission::ReadOnly, &pid).unwrap();
        let page = pod.rl();
        assert!(page.is_dirty().is_none());
        assert_eq!(&page.get_page_data(), data);
    }
    checker.commit(pool).unwrap();

    assert_eq!(committed_rows(&db, table_id), sorted(&initial));
}

#[test]
fn test_locks_released_at_end() {
    let db = setup();
    let table_id = new_int_table(&db, "t", 2);
    let pool = db.buffer_pool();

    let tx = Transaction::new();
    for row in new_random_rows(80, 2) {
        pool.insert_tuple(&tx, table_id, &to_tuple(&row)).unwrap();
    }

    let pages = pool.get_lock_manager().hold_pages(&tx);
    assert!(!pages.is_empty());
    for pid in &pages {
        assert!(pool.holds_lock(&tx, pid));
    }

    tx.commit(pool).unwrap();

    for pid in &pages {
        assert!(!pool.holds_lock(&tx, pid));
    }
    assert!(pool.get_lock_manager().hold_pages(&tx).is_empty());
}

#[test]
fn test_insert_allocates_page_when_full() {
    let db = setup();
    let table_id = new_int_table(&db, "t", 2);
    let pool = db.buffer_pool();
    let file = db.get_file(table_id).unwrap();

    let slots = slots_per_page(&db, table_id);
    insert_rows(&db, table_id, &new_random_rows(slots, 2));
    assert_eq!(file.pages_count().unwrap(), 1);

    let tx = Transaction::new();
    let record_id = pool
        .insert_tuple(&tx, table_id, &Tuple::new_int_tuple(7, 2))
        .unwrap();
    assert_eq!(record_id.page_id, HeapPageID::new(table_id, 1));
    assert_eq!(record_id.slot_number, 0);
    assert_eq!(file.pages_count().unwrap(), 2);

    // the full page keeps its lock until the transaction ends
    let page_0 = HeapPageID::new(table_id, 0);
    assert!(pool.holds_lock(&tx, &page_0));
    assert_eq!(pool.get_lock_manager().exclusive_holder(&page_0), Some(tx));
    tx.commit(pool).unwrap();
    assert!(!pool.holds_lock(&tx, &page_0));

    assert_eq!(committed_rows(&db, table_id).len(), slots + 1);
}

#[test]
fn test_insert_reuses_deleted_slot() {
    let db = setup();
    let table_id = new_int_table(&db, "t", 2);
    let pool = db.buffer_pool();

    let slots = slots_per_page(&db, table_id);
    insert_rows(&db, table_id, &new_random_rows(slots, 2));

    let tx = Transaction::new();
    let victim = test_utils::scan_all(&db, &tx, table_id).remove(3);
    pool.delete_tuple(&tx, &victim).unwrap();
    let record_id = pool
        .insert_tuple(&tx, table_id, &Tuple::new_int_tuple(7, 2))
        .unwrap();
    assert_eq!(Some(record_id), victim.get_record_id());
    tx.commit(pool).unwrap();

    assert_eq!(db.get_file(table_id).unwrap().pages_count().unwrap(), 1);
}

#[test]
fn test_invalid_tuples() {
    let db = setup();
    let table_id = new_int_table(&db, "t", 2);
    let pool = db.buffer_pool();

    let tx = Transaction::new();
    // wrong width
    assert!(pool
        .insert_tuple(&tx, table_id, &Tuple::new_int_tuple(1, 3))
        .is_err());
    // never stored, so there is nothing to delete
    assert!(pool.delete_tuple(&tx, &Tuple::new_int_tuple(1, 2)).is_err());
    // unknown table
    assert!(matches!(
        pool.insert_tuple(&tx, table_id.wrapping_add(1), &Tuple::new_int_tuple(1, 2)),
        Err(SmallError::NotFound(_))
    ));
    tx.commit(pool).unwrap();
}

#[test]
fn test_flush_all_pages() {
    let db = setup();
    let (table_id, pids) = new_paged_table(&db, "paged", 1);
    let pool = db.buffer_pool();
    let file = db.get_file(table_id).unwrap();

    let tx = Transaction::new();
    pool.insert_tuple(&tx, table_id, &Tuple::new_int_tuple(1, 2))
        .unwrap();
    assert_eq!(file.read_page(&pids[0]).unwrap().tuples_count(), 0);

    pool.flush_all_pages().unwrap();
    assert_eq!(file.read_page(&pids[0]).unwrap().tuples_count(), 1);
    {
        let pod = pool.get_page(&tx, Permission::ReadOnly, &pids[0]).unwrap();
        assert!(pod.rl().is_dirty().is_none());
    }

    tx.commit(pool).unwrap();
}

#[test]
fn test_discard_page() {
    let db = setup();
    let (_, pids) = new_paged_table(&db, "paged", 2);
    let pool = db.buffer_pool();

    let tx = Transaction::new();
    pool.get_page(&tx, Permission::ReadOnly, &pids[0]).unwrap();
    pool.get_page(&tx, Permission::ReadOnly, &pids[1]).unwrap();

    assert!(pool.discard_page(&pids[0]));
    assert!(!pool.discard_page(&pids[0]));
    assert_eq!(pool.resident_pages(), vec![pids[1]]);

    // the lock is not affected
    assert!(pool.holds_lock(&tx, &pids[0]));
    tx.commit(pool).unwrap();
}
