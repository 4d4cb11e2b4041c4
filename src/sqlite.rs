//! SQLite-backed [`TreeStore`].
//!
//! SQL is rendered as raw parameterized statements from the configured
//! column names; no query-builder layer is involved. Scope conditions are
//! appended to every statement so independent forests sharing the table
//! never interact.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use crate::config::TreeConfig;
use crate::error::Result;
use crate::store::{
    Boundary, BoundaryCond, NewNode, NodeId, NodeRow, NodeUpdate, ShiftDirection, SiblingSide,
    TreeStore,
};

/// [`TreeStore`] implementation over a [`rusqlite::Connection`].
pub struct SqliteStore {
    conn: Connection,
    config: TreeConfig,
}

impl SqliteStore {
    /// Opens (creating if needed) a database file and bootstraps the
    /// governed table and its indexes.
    pub fn open(path: impl AsRef<Path>, config: TreeConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Self::with_connection(conn, config)
    }

    /// In-memory store, mainly for tests.
    pub fn open_in_memory(config: TreeConfig) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, config)
    }

    /// Wraps an existing connection, creating the table if missing.
    pub fn with_connection(conn: Connection, config: TreeConfig) -> Result<Self> {
        let store = Self { conn, config };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        let c = &self.config;
        let level_column = match &c.level {
            Some(level) => format!("{level} INTEGER,\n                "),
            None => String::new(),
        };
        let scope_columns: String = c
            .scope
            .iter()
            .map(|(column, _)| format!("{column} INTEGER NOT NULL DEFAULT 0,\n                "))
            .collect();
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                {pk} INTEGER PRIMARY KEY,
                {parent} INTEGER REFERENCES {table} ({pk}),
                {lft} INTEGER NOT NULL,
                {rght} INTEGER NOT NULL,
                {level_column}{scope_columns}{label} TEXT NOT NULL DEFAULT ''
            )",
                table = c.table,
                pk = c.primary_key,
                parent = c.parent,
                lft = c.left,
                rght = c.right,
                label = c.label,
            ),
            [],
        )?;

        for column in [&c.parent, &c.left, &c.right] {
            self.conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} ({column})",
                    table = c.table,
                ),
                [],
            )?;
        }
        Ok(())
    }

    /// Select list matching [`Self::read_row`]. The depth slot is a NULL
    /// literal when depth tracking is disabled.
    fn select_list(&self) -> String {
        let c = &self.config;
        let level = c.level.as_deref().unwrap_or("NULL");
        format!(
            "{pk}, {parent}, {lft}, {rght}, {level}, {label}",
            pk = c.primary_key,
            parent = c.parent,
            lft = c.left,
            rght = c.right,
            label = c.label,
        )
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
        Ok(NodeRow {
            id: row.get(0)?,
            parent: row.get(1)?,
            lft: row.get(2)?,
            rght: row.get(3)?,
            level: row.get(4)?,
            label: row.get(5)?,
        })
    }

    /// Appends ` AND column = ?` per scope condition.
    fn push_scope(&self, sql: &mut String, params: &mut Vec<Value>) {
        for (column, value) in &self.config.scope {
            sql.push_str(" AND ");
            sql.push_str(column);
            sql.push_str(" = ?");
            params.push(Value::Integer(*value));
        }
    }

    fn query_rows(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<NodeRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params), Self::read_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn query_first(&mut self, sql: &str, params: Vec<Value>) -> Result<Option<NodeRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query_map(params_from_iter(params), Self::read_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    fn query_count(&mut self, sql: &str, params: Vec<Value>) -> Result<u64> {
        let mut stmt = self.conn.prepare(sql)?;
        let count: i64 = stmt.query_row(params_from_iter(params), |row| row.get(0))?;
        Ok(count as u64)
    }

    fn boundary_column(&self, field: Boundary) -> &str {
        match field {
            Boundary::Left => &self.config.left,
            Boundary::Right => &self.config.right,
        }
    }
}

impl TreeStore for SqliteStore {
    fn config(&self) -> &TreeConfig {
        &self.config
    }

    fn node_row(&mut self, id: NodeId) -> Result<Option<NodeRow>> {
        let mut sql = format!(
            "SELECT {list} FROM {table} WHERE {pk} = ?",
            list = self.select_list(),
            table = self.config.table,
            pk = self.config.primary_key,
        );
        let mut params = vec![Value::Integer(id)];
        self.push_scope(&mut sql, &mut params);
        self.query_first(&sql, params)
    }

    fn max_right(&mut self, exclude: Option<NodeId>) -> Result<i64> {
        let mut sql = format!(
            "SELECT {rght} FROM {table} WHERE 1 = 1",
            rght = self.config.right,
            table = self.config.table,
        );
        let mut params = Vec::new();
        if let Some(id) = exclude {
            sql.push_str(&format!(" AND {pk} != ?", pk = self.config.primary_key));
            params.push(Value::Integer(id));
        }
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(
            " ORDER BY {rght} DESC LIMIT 1",
            rght = self.config.right
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params_from_iter(params), |row| row.get::<_, i64>(0))?;
        match rows.next() {
            Some(value) => Ok(value?),
            None => Ok(0),
        }
    }

    fn shift_boundary(
        &mut self,
        field: Boundary,
        shift: i64,
        dir: ShiftDirection,
        cond: BoundaryCond,
        mark: bool,
    ) -> Result<u64> {
        let column = self.boundary_column(field).to_string();
        let operator = match dir {
            ShiftDirection::Add => "+",
            ShiftDirection::Subtract => "-",
        };
        let movement = if mark {
            format!("-({column} {operator} ?)")
        } else {
            format!("{column} {operator} ?")
        };
        let mut params = vec![Value::Integer(shift)];
        let mut sql = format!(
            "UPDATE {table} SET {column} = {movement} WHERE ",
            table = self.config.table,
        );
        match cond {
            BoundaryCond::AtLeast(value) => {
                sql.push_str(&format!("{column} >= ?"));
                params.push(Value::Integer(value));
            }
            BoundaryCond::GreaterThan(value) => {
                sql.push_str(&format!("{column} > ?"));
                params.push(Value::Integer(value));
            }
            BoundaryCond::Between(low, high) => {
                sql.push_str(&format!("{column} BETWEEN ? AND ?"));
                params.push(Value::Integer(low));
                params.push(Value::Integer(high));
            }
        }
        self.push_scope(&mut sql, &mut params);
        let affected = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(affected as u64)
    }

    fn unmark_boundaries(&mut self) -> Result<u64> {
        let c = &self.config;
        let mut sql = format!(
            "UPDATE {table} SET {lft} = {lft} * -1, {rght} = {rght} * -1 WHERE {lft} < 0",
            table = c.table,
            lft = c.left,
            rght = c.right,
        );
        let mut params = Vec::new();
        self.push_scope(&mut sql, &mut params);
        let affected = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(affected as u64)
    }

    fn sibling_at(
        &mut self,
        parent: Option<NodeId>,
        pivot: i64,
        side: SiblingSide,
        offset: u64,
    ) -> Result<Option<NodeRow>> {
        let c = &self.config;
        let (comparison, order) = match side {
            SiblingSide::Before => (format!("{} < ?", c.right), "DESC"),
            SiblingSide::After => (format!("{} > ?", c.left), "ASC"),
        };
        let mut sql = format!(
            "SELECT {list} FROM {table} WHERE {parent} IS ? AND {comparison}",
            list = self.select_list(),
            table = c.table,
            parent = c.parent,
        );
        let mut params = vec![opt_id(parent), Value::Integer(pivot)];
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(
            " ORDER BY {lft} {order} LIMIT 1 OFFSET ?",
            lft = self.config.left
        ));
        params.push(Value::Integer(offset as i64));
        self.query_first(&sql, params)
    }

    fn outermost_sibling(
        &mut self,
        parent: Option<NodeId>,
        pivot: i64,
        side: SiblingSide,
    ) -> Result<Option<NodeRow>> {
        let c = &self.config;
        // The farthest eligible sibling sits at the opposite end of the
        // ordering used by sibling_at.
        let (comparison, order) = match side {
            SiblingSide::Before => (format!("{} < ?", c.right), "ASC"),
            SiblingSide::After => (format!("{} > ?", c.left), "DESC"),
        };
        let mut sql = format!(
            "SELECT {list} FROM {table} WHERE {parent} IS ? AND {comparison}",
            list = self.select_list(),
            table = c.table,
            parent = c.parent,
        );
        let mut params = vec![opt_id(parent), Value::Integer(pivot)];
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(
            " ORDER BY {lft} {order} LIMIT 1",
            lft = self.config.left
        ));
        self.query_first(&sql, params)
    }

    fn rows_between(&mut self, lft: i64, rght: i64) -> Result<Vec<NodeRow>> {
        let c = &self.config;
        let mut sql = format!(
            "SELECT {list} FROM {table} WHERE {left} > ? AND {right} < ?",
            list = self.select_list(),
            table = c.table,
            left = c.left,
            right = c.right,
        );
        let mut params = vec![Value::Integer(lft), Value::Integer(rght)];
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(" ORDER BY {lft} ASC", lft = self.config.left));
        self.query_rows(&sql, params)
    }

    fn rows_containing(&mut self, lft: i64, rght: i64) -> Result<Vec<NodeRow>> {
        let c = &self.config;
        let mut sql = format!(
            "SELECT {list} FROM {table} WHERE {left} <= ? AND {right} >= ?",
            list = self.select_list(),
            table = c.table,
            left = c.left,
            right = c.right,
        );
        let mut params = vec![Value::Integer(lft), Value::Integer(rght)];
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(" ORDER BY {lft} ASC", lft = self.config.left));
        self.query_rows(&sql, params)
    }

    fn count_containing(&mut self, lft: i64, rght: i64) -> Result<u64> {
        let c = &self.config;
        let mut sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {left} < ? AND {right} > ?",
            table = c.table,
            left = c.left,
            right = c.right,
        );
        let mut params = vec![Value::Integer(lft), Value::Integer(rght)];
        self.push_scope(&mut sql, &mut params);
        self.query_count(&sql, params)
    }

    fn children_rows(&mut self, parent: Option<NodeId>) -> Result<Vec<NodeRow>> {
        let c = &self.config;
        let mut sql = format!(
            "SELECT {list} FROM {table} WHERE {parent_col} IS ?",
            list = self.select_list(),
            table = c.table,
            parent_col = c.parent,
        );
        let mut params = vec![opt_id(parent)];
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(" ORDER BY {lft} ASC", lft = self.config.left));
        self.query_rows(&sql, params)
    }

    fn count_children(&mut self, parent: NodeId) -> Result<u64> {
        let c = &self.config;
        let mut sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {parent_col} = ?",
            table = c.table,
            parent_col = c.parent,
        );
        let mut params = vec![Value::Integer(parent)];
        self.push_scope(&mut sql, &mut params);
        self.query_count(&sql, params)
    }

    fn all_rows(&mut self) -> Result<Vec<NodeRow>> {
        let mut sql = format!(
            "SELECT {list} FROM {table} WHERE 1 = 1",
            list = self.select_list(),
            table = self.config.table,
        );
        let mut params = Vec::new();
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(" ORDER BY {lft} ASC", lft = self.config.left));
        self.query_rows(&sql, params)
    }

    fn child_ids(&mut self, parent: Option<NodeId>) -> Result<Vec<NodeId>> {
        let c = &self.config;
        let mut sql = format!(
            "SELECT {pk} FROM {table} WHERE {parent_col} IS ?",
            pk = c.primary_key,
            table = c.table,
            parent_col = c.parent,
        );
        let mut params = vec![opt_id(parent)];
        self.push_scope(&mut sql, &mut params);
        sql.push_str(&format!(
            " ORDER BY {order} ASC",
            order = self.config.recover_order_column()
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| row.get::<_, NodeId>(0))?;
        let mut out = Vec::new();
        for id in rows {
            out.push(id?);
        }
        Ok(out)
    }

    fn insert_node(&mut self, row: &NewNode) -> Result<NodeId> {
        let c = &self.config;
        let mut columns = vec![
            c.parent.clone(),
            c.left.clone(),
            c.right.clone(),
            c.label.clone(),
        ];
        let mut params = vec![
            opt_id(row.parent),
            Value::Integer(row.lft),
            Value::Integer(row.rght),
            Value::Text(row.label.clone()),
        ];
        if let Some(level_col) = &c.level {
            columns.push(level_col.clone());
            params.push(match row.level {
                Some(level) => Value::Integer(level),
                None => Value::Null,
            });
        }
        for (column, value) in &c.scope {
            columns.push(column.clone());
            params.push(Value::Integer(*value));
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({columns}) VALUES ({placeholders})",
            table = c.table,
            columns = columns.join(", "),
        );
        self.conn.execute(&sql, params_from_iter(params))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_node(&mut self, id: NodeId, update: &NodeUpdate) -> Result<()> {
        let c = &self.config;
        let mut assignments = Vec::new();
        let mut params = Vec::new();
        if let Some(parent) = &update.parent {
            assignments.push(format!("{} = ?", c.parent));
            params.push(opt_id(*parent));
        }
        if let Some(lft) = update.lft {
            assignments.push(format!("{} = ?", c.left));
            params.push(Value::Integer(lft));
        }
        if let Some(rght) = update.rght {
            assignments.push(format!("{} = ?", c.right));
            params.push(Value::Integer(rght));
        }
        if let Some(level) = update.level {
            if let Some(level_col) = &c.level {
                assignments.push(format!("{level_col} = ?"));
                params.push(Value::Integer(level));
            }
        }
        if let Some(label) = &update.label {
            assignments.push(format!("{} = ?", c.label));
            params.push(Value::Text(label.clone()));
        }
        if assignments.is_empty() {
            return Ok(());
        }
        let mut sql = format!(
            "UPDATE {table} SET {assignments} WHERE {pk} = ?",
            table = c.table,
            assignments = assignments.join(", "),
            pk = c.primary_key,
        );
        params.push(Value::Integer(id));
        self.push_scope(&mut sql, &mut params);
        self.conn.execute(&sql, params_from_iter(params))?;
        Ok(())
    }

    fn reassign_children(&mut self, from: NodeId, to: Option<NodeId>) -> Result<u64> {
        let c = &self.config;
        let mut sql = format!(
            "UPDATE {table} SET {parent} = ? WHERE {parent} = ?",
            table = c.table,
            parent = c.parent,
        );
        let mut params = vec![opt_id(to), Value::Integer(from)];
        self.push_scope(&mut sql, &mut params);
        let affected = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(affected as u64)
    }

    fn delete_range(&mut self, lft_from: i64, lft_to: i64) -> Result<u64> {
        let c = &self.config;
        let mut sql = format!(
            "DELETE FROM {table} WHERE {lft} BETWEEN ? AND ?",
            table = c.table,
            lft = c.left,
        );
        let mut params = vec![Value::Integer(lft_from), Value::Integer(lft_to)];
        self.push_scope(&mut sql, &mut params);
        let affected = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(affected as u64)
    }

    fn delete_node(&mut self, id: NodeId) -> Result<bool> {
        let c = &self.config;
        let mut sql = format!(
            "DELETE FROM {table} WHERE {pk} = ?",
            table = c.table,
            pk = c.primary_key,
        );
        let mut params = vec![Value::Integer(id)];
        self.push_scope(&mut sql, &mut params);
        let affected = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(affected > 0)
    }

    fn adjust_levels(&mut self, delta: i64, lft_from: i64, lft_to: i64) -> Result<u64> {
        let c = &self.config;
        let Some(level_col) = &c.level else {
            return Ok(0);
        };
        let mut sql = format!(
            "UPDATE {table} SET {level_col} = {level_col} + ? WHERE {lft} BETWEEN ? AND ?",
            table = c.table,
            lft = c.left,
        );
        let mut params = vec![
            Value::Integer(delta),
            Value::Integer(lft_from),
            Value::Integer(lft_to),
        ];
        self.push_scope(&mut sql, &mut params);
        let affected = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(affected as u64)
    }

    fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

fn opt_id(id: Option<NodeId>) -> Value {
    match id {
        Some(id) => Value::Integer(id),
        None => Value::Null,
    }
}
