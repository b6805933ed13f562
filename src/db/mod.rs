// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Database module for persistent storage

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, debug};

use crate::config::DatabaseConfig;
use crate::sensors::SensorReading;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sensor_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id TEXT NOT NULL,
        shadow_name TEXT,
        sub_id TEXT,
        type TEXT,
        organization TEXT,
        session_id TEXT,
        heap_size INTEGER,
        rssi INTEGER,
        temp_esp REAL,
        target_temp REAL,
        presence INTEGER,
        temp REAL,
        sauna_status INTEGER,
        battery_load_v REAL,
        reset_cnt INTEGER,
        hum REAL,
        battery_voltage REAL,
        time_to_target INTEGER,
        sensor_timestamp TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_sensor_logs_session ON sensor_logs(session_id);

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT,
        money INTEGER NOT NULL DEFAULT 0,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP,
        updated_at TEXT DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        price INTEGER NOT NULL,
        item_type TEXT NOT NULL,
        asset_url TEXT,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS owned_products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL REFERENCES products(id),
        user_id TEXT NOT NULL REFERENCES users(id),
        purchase_date TEXT DEFAULT CURRENT_TIMESTAMP,
        in_use INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_owned_products_user ON owned_products(user_id);

    CREATE TABLE IF NOT EXISTS wellness_results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        result_text TEXT NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
"#;

const DROP_ALL: &str = r#"
    DROP TABLE IF EXISTS owned_products;
    DROP TABLE IF EXISTS products;
    DROP TABLE IF EXISTS users;
    DROP TABLE IF EXISTS sensor_logs;
    DROP TABLE IF EXISTS wellness_results;
"#;

const DEMO_PRODUCTS: &[(&str, &str, i64, &str, &str)] = &[
    ("Birch Vihta", "Fresh birch whisk for the classic sauna experience", 20, "vihta", "/assets/vihta-birch.png"),
    ("Oak Vihta", "Sturdy oak whisk with a deeper scent", 35, "vihta", "/assets/vihta-oak.png"),
    ("Wool Sauna Hat", "Keeps your head cool on the top bench", 15, "hat", "/assets/hat-wool.png"),
    ("Felt Viking Hat", "For the serious löyly thrower", 40, "hat", "/assets/hat-viking.png"),
    ("Wooden Ladle", "Traditional pine ladle", 10, "ladle", "/assets/ladle-wood.png"),
    ("Copper Ladle", "Throws löyly like a champion", 25, "ladle", "/assets/ladle-copper.png"),
];

/// What the housekeeping engine needs from storage
pub trait SensorLogStore: Send + Sync {
    /// Humidity of the most recently logged reading, from any device or session
    fn last_humidity(&self) -> Result<Option<f64>>;

    /// Append one raw reading
    fn log_reading(&self, reading: &SensorReading) -> Result<()>;
}

impl<T: SensorLogStore + ?Sized> SensorLogStore for Arc<T> {
    fn last_humidity(&self) -> Result<Option<f64>> {
        (**self).last_humidity()
    }

    fn log_reading(&self, reading: &SensorReading) -> Result<()> {
        (**self).log_reading(reading)
    }
}

/// Purchase failures callers branch on
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds { price: i64, balance: i64, shortfall: i64 },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum OwnedProductError {
    #[error("Owned product not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Database manager
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create database
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&config.path)?;

        conn.execute_batch(r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        "#)?;

        let db = Self::with_connection(conn, config.seed_demo_data)?;
        info!("Database opened at {:?}", config.path);
        Ok(db)
    }

    /// Fresh seeded in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::with_connection(conn, true)
    }

    fn with_connection(conn: Connection, seed: bool) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };

        db.create_tables()?;
        if seed {
            db.seed_demo_data()?;
        }
        Ok(db)
    }

    // A panic mid-statement leaves no open transaction behind, so a poisoned
    // lock still guards a usable connection.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn create_tables(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn seed_demo_data(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let products: i64 = tx.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        if products == 0 {
            for (name, description, price, item_type, asset_url) in DEMO_PRODUCTS {
                tx.execute(
                    "INSERT INTO products (name, description, price, item_type, asset_url) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![name, description, price, item_type, asset_url],
                )?;
            }
        }

        let users: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if users == 0 {
            tx.execute(
                "INSERT INTO users (id, username, email, money) VALUES ('demo', 'demo', 'demo@example.com', 100)",
                [],
            )?;
        }

        tx.commit()?;
        debug!("Demo data present");
        Ok(())
    }

    /// Drop every table, recreate the schema and reseed
    pub fn reset(&self) -> Result<()> {
        self.conn().execute_batch(DROP_ALL)?;
        self.create_tables()?;
        self.seed_demo_data()?;
        info!("Database reinitialized");
        Ok(())
    }

    /// Latest logged readings, newest first
    pub fn recent_readings(&self, limit: usize) -> Result<Vec<StoredReading>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, device_id, session_id, temp, hum, presence, sauna_status, sensor_timestamp, created_at
             FROM sensor_logs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(StoredReading {
                id: row.get(0)?,
                device_id: row.get(1)?,
                session_id: row.get(2)?,
                temp: row.get(3)?,
                hum: row.get(4)?,
                presence: row.get(5)?,
                sauna_status: row.get(6)?,
                sensor_timestamp: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM products ORDER BY id", Product::COLUMNS))?;
        let rows = stmt.query_map([], Product::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn product(&self, id: i64) -> Result<Option<Product>> {
        let conn = self.conn();
        let product = conn
            .query_row(
                &format!("SELECT {} FROM products WHERE id = ?1", Product::COLUMNS),
                params![id],
                Product::from_row,
            )
            .optional()?;
        Ok(product)
    }

    pub fn user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        let user = conn
            .query_row(
                "SELECT id, username, email, money, created_at, updated_at FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        money: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    pub fn create_user(&self, id: &str, username: &str, email: Option<&str>, money: i64) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, username, email, money) VALUES (?1, ?2, ?3, ?4)",
            params![id, username, email, money],
        )?;
        Ok(())
    }

    /// Buy `product_id` for `user_id`: debit the balance and record ownership
    /// in one transaction. Nothing changes when the balance is short.
    pub fn purchase(&self, user_id: &str, product_id: i64) -> Result<Purchase, PurchaseError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let product = tx
            .query_row(
                &format!("SELECT {} FROM products WHERE id = ?1", Product::COLUMNS),
                params![product_id],
                Product::from_row,
            )
            .optional()?
            .ok_or(PurchaseError::ProductNotFound)?;

        let balance: i64 = tx
            .query_row("SELECT money FROM users WHERE id = ?1", params![user_id], |row| row.get(0))
            .optional()?
            .ok_or(PurchaseError::UserNotFound)?;

        if balance < product.price {
            return Err(PurchaseError::InsufficientFunds {
                price: product.price,
                balance,
                shortfall: product.price - balance,
            });
        }

        tx.execute(
            "UPDATE users SET money = money - ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![product.price, user_id],
        )?;
        tx.execute(
            "INSERT INTO owned_products (product_id, user_id) VALUES (?1, ?2)",
            params![product_id, user_id],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!("User {} bought product {} for {}", user_id, product.name, product.price);

        Ok(Purchase {
            id,
            product_id,
            user_id: user_id.to_string(),
            balance: balance - product.price,
            product,
        })
    }

    /// Everything a user owns, newest purchase first
    pub fn owned_by_user(&self, user_id: &str) -> Result<Vec<OwnedProduct>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT op.id, op.product_id, op.user_id, op.purchase_date, op.in_use,
                    p.name, p.description, p.price, p.item_type, p.asset_url
             FROM owned_products op
             JOIN products p ON op.product_id = p.id
             WHERE op.user_id = ?1
             ORDER BY op.purchase_date DESC, op.id DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(OwnedProduct {
                id: row.get(0)?,
                product_id: row.get(1)?,
                user_id: row.get(2)?,
                purchase_date: row.get(3)?,
                in_use: row.get::<_, i64>(4)? == 1,
                product_name: row.get(5)?,
                product_description: row.get(6)?,
                product_price: row.get(7)?,
                product_type: row.get(8)?,
                asset_url: row.get(9)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Flip `in_use`. Switching an item on switches off the owner's other
    /// items of the same type.
    pub fn toggle_in_use(&self, owned_id: i64) -> Result<bool, OwnedProductError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let (user_id, item_type, in_use): (String, String, i64) = tx
            .query_row(
                "SELECT op.user_id, p.item_type, op.in_use
                 FROM owned_products op JOIN products p ON op.product_id = p.id
                 WHERE op.id = ?1",
                params![owned_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
            .ok_or(OwnedProductError::NotFound)?;

        let now_in_use = in_use != 1;

        if now_in_use {
            tx.execute(
                "UPDATE owned_products SET in_use = 0
                 WHERE user_id = ?1 AND id != ?2
                   AND product_id IN (SELECT id FROM products WHERE item_type = ?3)",
                params![user_id, owned_id, item_type],
            )?;
        }

        tx.execute(
            "UPDATE owned_products SET in_use = ?1 WHERE id = ?2",
            params![i64::from(now_in_use), owned_id],
        )?;
        tx.commit()?;

        Ok(now_in_use)
    }

    pub fn remove_owned(&self, owned_id: i64) -> Result<(), OwnedProductError> {
        let deleted = self
            .conn()
            .execute("DELETE FROM owned_products WHERE id = ?1", params![owned_id])?;

        if deleted == 0 {
            return Err(OwnedProductError::NotFound);
        }
        Ok(())
    }

    pub fn add_wellness_result(&self, session_id: &str, result_text: &str) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO wellness_results (session_id, result_text) VALUES (?1, ?2)",
            params![session_id, result_text],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Latest wellness assessments, newest first
    pub fn wellness_results(&self, limit: usize) -> Result<Vec<WellnessResult>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, result_text, created_at FROM wellness_results ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], WellnessResult::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn wellness_for_session(&self, session_id: &str) -> Result<Vec<WellnessResult>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, result_text, created_at FROM wellness_results
             WHERE session_id = ?1 ORDER BY id DESC",
        )?;
        let rows = stmt.query_map(params![session_id], WellnessResult::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl SensorLogStore for Database {
    fn last_humidity(&self) -> Result<Option<f64>> {
        let conn = self.conn();
        let hum = conn
            .query_row(
                "SELECT hum FROM sensor_logs ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()?;
        Ok(hum.flatten())
    }

    fn log_reading(&self, reading: &SensorReading) -> Result<()> {
        let d = &reading.data;
        self.conn().execute(
            r#"INSERT INTO sensor_logs (
                device_id, shadow_name, sub_id, type, organization, session_id,
                heap_size, rssi, temp_esp, target_temp, presence, temp,
                sauna_status, battery_load_v, reset_cnt, hum, battery_voltage,
                time_to_target, sensor_timestamp
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"#,
            params![
                reading.device_id,
                reading.shadow_name,
                reading.sub_id,
                reading.kind,
                reading.organization,
                reading.session_id,
                d.heap_size,
                d.rssi,
                d.temp_esp,
                d.target_temp,
                d.presence,
                d.temp,
                d.sauna_status,
                d.battery_load_v,
                d.reset_cnt,
                d.hum,
                d.battery_voltage,
                d.time_to_target,
                reading.timestamp
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredReading {
    pub id: i64,
    pub device_id: String,
    pub session_id: Option<String>,
    pub temp: Option<f64>,
    pub hum: Option<f64>,
    pub presence: Option<i64>,
    pub sauna_status: Option<i64>,
    pub sensor_timestamp: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub item_type: String,
    pub asset_url: Option<String>,
    pub created_at: String,
}

impl Product {
    const COLUMNS: &'static str = "id, name, description, price, item_type, asset_url, created_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            item_type: row.get(4)?,
            asset_url: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub money: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnedProduct {
    pub id: i64,
    pub product_id: i64,
    pub user_id: String,
    pub purchase_date: String,
    pub in_use: bool,
    pub product_name: String,
    pub product_description: Option<String>,
    pub product_price: i64,
    pub product_type: String,
    pub asset_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub id: i64,
    pub product_id: i64,
    pub user_id: String,
    /// Balance left after the purchase
    pub balance: i64,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize)]
pub struct WellnessResult {
    pub id: i64,
    pub session_id: String,
    pub result_text: String,
    pub created_at: String,
}

impl WellnessResult {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            result_text: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
