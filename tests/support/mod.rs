//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rusqlite::{params, Connection};

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        let n = NEXT.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "snapload-it-{}-{}-{}",
            label,
            std::process::id(),
            n
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn join_str(&self, name: &str) -> String {
        self.join(name).to_string_lossy().into_owned()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let p = self.join(name);
        fs::write(&p, contents).expect("write fixture");
        p
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Shop database: `orders` (incremental on `updated_at`) and `countries`.
///
/// `orders` gets `old_orders` rows stamped 2023 and `new_orders` rows stamped
/// after 2024-01-01 00:00:00; `countries` gets `countries` rows.
pub fn create_shop_db(path: &Path, old_orders: usize, new_orders: usize, countries: usize) {
    let conn = Connection::open(path).expect("open sqlite");
    conn.execute_batch(
        "CREATE TABLE orders (id INTEGER PRIMARY KEY, amount REAL, updated_at TEXT);
         CREATE TABLE countries (code TEXT, name TEXT);",
    )
    .expect("create tables");

    let mut id = 0i64;
    for i in 0..old_orders {
        id += 1;
        conn.execute(
            "INSERT INTO orders VALUES (?1, ?2, ?3)",
            params![id, 10.0 + i as f64, format!("2023-11-{:02} 09:00:00", (i % 28) + 1)],
        )
        .expect("insert old order");
    }
    for i in 0..new_orders {
        id += 1;
        conn.execute(
            "INSERT INTO orders VALUES (?1, ?2, ?3)",
            params![id, 99.5, format!("2024-01-{:02} 12:00:00", (i % 28) + 2)],
        )
        .expect("insert new order");
    }
    for i in 0..countries {
        conn.execute(
            "INSERT INTO countries VALUES (?1, ?2)",
            params![format!("C{:02}", i), format!("Country {}", i)],
        )
        .expect("insert country");
    }
}

/// Append one order to an existing shop database.
pub fn insert_order(path: &Path, amount: f64, updated_at: &str) {
    let conn = Connection::open(path).expect("open sqlite");
    conn.execute(
        "INSERT INTO orders (amount, updated_at) VALUES (?1, ?2)",
        params![amount, updated_at],
    )
    .expect("insert order");
}

/// Number of data lines in a CSV file (header excluded).
pub fn csv_rows(path: &Path) -> usize {
    let text = fs::read_to_string(path).expect("read csv");
    text.lines().count().saturating_sub(1)
}
