// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference `HistorianBackend` implementation backed by SQLite.
//!
//! Schema: one index table `channel_defs(obj, var, type, table_name)` keyed
//! on `(obj, var)`, plus one data table per channel with
//! `(time INTEGER PRIMARY KEY, diffDB INTEGER, quality INTEGER, data TEXT)`.

use mediator_core::quality::Quality;
use mediator_core::refs::ChannelId;
use mediator_core::work_item::{ModifyMode, QualityFilter};
use mediator_core::{MediatorError, Timestamp, VariableRef, Vttq};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::historian_backend::HistorianBackend;

/// Opens (or creates) a SQLite historian database at `path`, ensuring the
/// channel index table exists.
pub struct SqliteHistorianBackend {
    conn: Connection,
}

impl SqliteHistorianBackend {
    pub fn open(path: &Path) -> Result<Self, MediatorError> {
        let conn = Connection::open(path)
            .map_err(|e| MediatorError::internal_with_source("failed to open historian db", e))?;
        conn.execute(CREATE_CHANNEL_DEFS, []).map_err(to_internal)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, MediatorError> {
        let conn = Connection::open_in_memory().map_err(to_internal)?;
        conn.execute(CREATE_CHANNEL_DEFS, []).map_err(to_internal)?;
        Ok(Self { conn })
    }

    fn table_name(channel: &ChannelId) -> String {
        format!("ch_{}", channel.as_str().replace(['-', '.'], "_"))
    }

    fn lookup_table(&self, channel: ChannelId) -> Result<String, MediatorError> {
        let channel_id = channel.as_str();
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT table_name FROM channel_defs WHERE channel_id = ?1",
                params![channel_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_internal)?;
        exists.ok_or_else(|| MediatorError::Request(format!("unknown channel {channel}")))
    }
}

const CREATE_CHANNEL_DEFS: &str = "CREATE TABLE IF NOT EXISTS channel_defs (
    obj TEXT NOT NULL,
    var TEXT NOT NULL,
    type TEXT NOT NULL,
    channel_id TEXT NOT NULL UNIQUE,
    table_name TEXT NOT NULL,
    PRIMARY KEY (obj, var)
)";

fn to_internal(e: rusqlite::Error) -> MediatorError {
    MediatorError::internal_with_source("historian db error", e)
}

fn quality_to_int(q: Quality) -> i64 {
    match q {
        Quality::Good => 0,
        Quality::Uncertain => 1,
        Quality::Bad => 2,
    }
}

fn quality_from_int(i: i64) -> Quality {
    match i {
        0 => Quality::Good,
        1 => Quality::Uncertain,
        _ => Quality::Bad,
    }
}

fn row_to_vttq(
    time: i64,
    diff_db: i64,
    quality: i64,
    data: String,
) -> Result<Vttq, MediatorError> {
    let value: mediator_core::vtq::VariableValue =
        serde_json::from_str(&data).map_err(|e| MediatorError::internal_with_source("corrupt historian row", e))?;
    Ok(Vttq {
        value,
        timestamp: Timestamp::from_millis(time),
        transaction_timestamp: Timestamp::from_millis(diff_db),
        quality: quality_from_int(quality),
    })
}

impl HistorianBackend for SqliteHistorianBackend {
    fn ensure_channel(&mut self, variable: &VariableRef) -> Result<ChannelId, MediatorError> {
        let obj = variable.object.to_string();
        let var = variable.name.clone();
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT channel_id FROM channel_defs WHERE obj = ?1 AND var = ?2",
                params![obj, var],
                |row| row.get(0),
            )
            .optional()
            .map_err(to_internal)?;
        if let Some(channel_id) = existing {
            return Ok(ChannelId::new(channel_id));
        }

        let channel = ChannelId::new(uuid::Uuid::new_v4().to_string());
        let table_name = Self::table_name(&channel);
        let tx = self.conn.transaction().map_err(to_internal)?;
        tx.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    time INTEGER PRIMARY KEY,
                    diffDB INTEGER NOT NULL,
                    quality INTEGER NOT NULL,
                    data TEXT NOT NULL
                )"
            ),
            [],
        )
        .map_err(to_internal)?;
        tx.execute(
            "INSERT INTO channel_defs (obj, var, type, channel_id, table_name) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![obj, var, "unknown", channel.as_str(), table_name],
        )
        .map_err(to_internal)?;
        tx.commit().map_err(to_internal)?;
        Ok(channel)
    }

    fn append(&mut self, channel: ChannelId, rows: &[Vttq]) -> Result<(), MediatorError> {
        let table_name = self.lookup_table(channel)?;
        let tx = self.conn.transaction().map_err(to_internal)?;
        for row in rows {
            let data = serde_json::to_string(&row.value)
                .map_err(|e| MediatorError::internal_with_source("serialize historian row", e))?;
            tx.execute(
                &format!(
                    "INSERT OR REPLACE INTO {table_name} (time, diffDB, quality, data) VALUES (?1, ?2, ?3, ?4)"
                ),
                params![
                    row.timestamp.as_millis(),
                    row.transaction_timestamp.as_millis(),
                    quality_to_int(row.quality),
                    data
                ],
            )
            .map_err(to_internal)?;
        }
        tx.commit().map_err(to_internal)?;
        Ok(())
    }

    fn read_raw(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
        quality_filter: QualityFilter,
    ) -> Result<Vec<Vttq>, MediatorError> {
        let table_name = self.lookup_table(channel)?;
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT time, diffDB, quality, data FROM {table_name} WHERE time >= ?1 AND time <= ?2 ORDER BY time ASC"
            ))
            .map_err(to_internal)?;
        let rows = stmt
            .query_map(params![start.as_millis(), end.as_millis()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(to_internal)?;
        let mut out = Vec::new();
        for row in rows {
            let (time, diff_db, quality, data) = row.map_err(to_internal)?;
            if !quality_filter.accepts(quality_from_int(quality)) {
                continue;
            }
            out.push(row_to_vttq(time, diff_db, quality, data)?);
        }
        Ok(out)
    }

    fn count(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
        quality_filter: QualityFilter,
    ) -> Result<usize, MediatorError> {
        Ok(self.read_raw(channel, start, end, quality_filter)?.len())
    }

    fn delete_interval(
        &mut self,
        channel: ChannelId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<(), MediatorError> {
        let table_name = self.lookup_table(channel)?;
        self.conn
            .execute(
                &format!("DELETE FROM {table_name} WHERE time >= ?1 AND time <= ?2"),
                params![start.as_millis(), end.as_millis()],
            )
            .map_err(to_internal)?;
        Ok(())
    }

    fn get_latest(&mut self, channel: ChannelId) -> Result<Option<Vttq>, MediatorError> {
        let table_name = self.lookup_table(channel)?;
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT time, diffDB, quality, data FROM {table_name} ORDER BY time DESC LIMIT 1"
                ),
                [],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(to_internal)?;
        row.map(|(time, diff_db, quality, data)| row_to_vttq(time, diff_db, quality, data))
            .transpose()
    }

    fn modify(
        &mut self,
        channel: ChannelId,
        mode: ModifyMode,
        rows: &[Vttq],
    ) -> Result<(), MediatorError> {
        let table_name = self.lookup_table(channel)?;
        let tx = self.conn.transaction().map_err(to_internal)?;

        match mode {
            ModifyMode::Insert => {
                for row in rows {
                    let exists: bool = tx
                        .query_row(
                            &format!("SELECT 1 FROM {table_name} WHERE time = ?1"),
                            params![row.timestamp.as_millis()],
                            |_| Ok(true),
                        )
                        .optional()
                        .map_err(to_internal)?
                        .unwrap_or(false);
                    if exists {
                        return Err(MediatorError::Conflict(format!(
                            "timestamp {} already exists",
                            row.timestamp.as_millis()
                        )));
                    }
                    insert_row(&tx, &table_name, row)?;
                }
            }
            ModifyMode::Update => {
                for row in rows {
                    let affected = tx
                        .execute(
                            &format!(
                                "UPDATE {table_name} SET diffDB = ?2, quality = ?3, data = ?4 WHERE time = ?1"
                            ),
                            params![
                                row.timestamp.as_millis(),
                                row.transaction_timestamp.as_millis(),
                                quality_to_int(row.quality),
                                serde_json::to_string(&row.value).map_err(|e| {
                                    MediatorError::internal_with_source("serialize historian row", e)
                                })?
                            ],
                        )
                        .map_err(to_internal)?;
                    if affected == 0 {
                        return Err(MediatorError::Conflict(format!(
                            "timestamp {} does not exist",
                            row.timestamp.as_millis()
                        )));
                    }
                }
            }
            ModifyMode::Upsert => {
                for row in rows {
                    insert_row(&tx, &table_name, row)?;
                }
            }
            ModifyMode::ReplaceAll => {
                tx.execute(&format!("DELETE FROM {table_name}"), [])
                    .map_err(to_internal)?;
                for row in rows {
                    insert_row(&tx, &table_name, row)?;
                }
            }
            ModifyMode::Delete => {
                for row in rows {
                    tx.execute(
                        &format!("DELETE FROM {table_name} WHERE time = ?1"),
                        params![row.timestamp.as_millis()],
                    )
                    .map_err(to_internal)?;
                }
            }
        }

        tx.commit().map_err(to_internal)?;
        Ok(())
    }

    fn delete_channel(&mut self, channel: ChannelId) -> Result<(), MediatorError> {
        let table_name = self.lookup_table(channel)?;
        let tx = self.conn.transaction().map_err(to_internal)?;
        tx.execute(&format!("DROP TABLE IF EXISTS {table_name}"), [])
            .map_err(to_internal)?;
        tx.execute(
            "DELETE FROM channel_defs WHERE table_name = ?1",
            params![table_name],
        )
        .map_err(to_internal)?;
        tx.commit().map_err(to_internal)?;
        Ok(())
    }
}

fn insert_row(
    tx: &rusqlite::Transaction<'_>,
    table_name: &str,
    row: &Vttq,
) -> Result<(), MediatorError> {
    let data = serde_json::to_string(&row.value)
        .map_err(|e| MediatorError::internal_with_source("serialize historian row", e))?;
    tx.execute(
        &format!(
            "INSERT OR REPLACE INTO {table_name} (time, diffDB, quality, data) VALUES (?1, ?2, ?3, ?4)"
        ),
        params![
            row.timestamp.as_millis(),
            row.transaction_timestamp.as_millis(),
            quality_to_int(row.quality),
            data
        ],
    )
    .map_err(to_internal)?;
    Ok(())
}

#[cfg(test)]
#[path = "sqlite_backend_tests.rs"]
mod tests;
