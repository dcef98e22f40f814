use super::{LogbookRun, LogbookStore};
use crate::config::LogbookConfig;
use crate::error::{LogbookError, LogbookResult};
use crate::record::ShiftRecord;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::{Mutex, MutexGuard};

/// Archives the most recent run; saving replaces what was stored before.
pub struct SqliteLogbookStore {
    connection: Mutex<Connection>,
}

impl SqliteLogbookStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> LogbookResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> LogbookResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> LogbookResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS run_config (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                config_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS shift_records (
                shift_number INTEGER PRIMARY KEY,
                shift_date TEXT NOT NULL,
                kind TEXT NOT NULL,
                record_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> LogbookResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| LogbookError::invalid("sqlite connection lock poisoned"))
    }

    fn save_config(tx: &rusqlite::Transaction, config: &LogbookConfig) -> LogbookResult<()> {
        let json = serde_json::to_string(config)?;
        tx.execute("DELETE FROM run_config", [])?;
        tx.execute(
            "INSERT INTO run_config (id, config_json) VALUES (1, ?1)",
            params![json],
        )?;
        Ok(())
    }

    fn save_records(tx: &rusqlite::Transaction, records: &[ShiftRecord]) -> LogbookResult<()> {
        tx.execute("DELETE FROM shift_records", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO shift_records (shift_number, shift_date, kind, record_json) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for record in records {
            let json = serde_json::to_string(record)?;
            stmt.execute(params![
                record.shift_number(),
                record.slot.date.format("%Y-%m-%d").to_string(),
                record.slot.kind,
                json
            ])?;
        }
        Ok(())
    }
}

impl LogbookStore for SqliteLogbookStore {
    fn save_run(&self, run: &LogbookRun) -> LogbookResult<()> {
        super::validate_records(&run.records)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::save_config(&tx, &run.config)?;
        Self::save_records(&tx, &run.records)?;
        tx.commit()?;
        Ok(())
    }

    fn load_run(&self) -> LogbookResult<Option<LogbookRun>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT config_json FROM run_config WHERE id = 1")?;
        let config_json: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
        let Some(config_json) = config_json else {
            return Ok(None);
        };
        let config: LogbookConfig = serde_json::from_str(&config_json)?;

        let mut stmt =
            conn.prepare("SELECT record_json FROM shift_records ORDER BY shift_number ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str::<ShiftRecord>(&json?)?);
        }
        super::validate_records(&records)?;

        Ok(Some(LogbookRun::new(config, records)))
    }
}
