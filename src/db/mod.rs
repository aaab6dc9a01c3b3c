use crate::errors::{AppError, AppResult};
use crate::models::{Folder, FolderQuery, LinkedEntityType, NewFolder, NewPage, Page, PageQuery};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const FOLDER_COLUMNS: &str =
    "id, team_id, season_id, name, parent_folder_id, color, sort_order, created_by, created_at";
const PAGE_COLUMNS: &str = "id, team_id, season_id, folder_id, title, linked_entity_type, linked_entity_id, created_by, updated_by, created_at, updated_at";

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn list_folders(&self, query: &FolderQuery) -> AppResult<Vec<Folder>> {
        let conn = self.lock()?;
        let mut sql = format!(
            "SELECT {} FROM folders WHERE team_id = ? AND season_id = ?",
            FOLDER_COLUMNS
        );
        let mut params_vec: Vec<String> = vec![query.team_id.clone(), query.season_id.clone()];

        if let Some(name) = &query.name {
            sql.push_str(" AND name = ?");
            params_vec.push(name.clone());
        }
        if query.root_only {
            sql.push_str(" AND parent_folder_id IS NULL");
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), parse_folder_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn insert_folder(&self, folder: &NewFolder, created_at: DateTime<Utc>) -> AppResult<Folder> {
        let id = Uuid::new_v4().to_string();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO folders (id, team_id, season_id, name, parent_folder_id, color, sort_order, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                folder.team_id,
                folder.season_id,
                folder.name,
                folder.parent_folder_id,
                folder.color,
                folder.sort_order,
                folder.created_by,
                format_time(created_at),
            ],
        )?;

        Ok(Folder {
            id,
            team_id: folder.team_id.clone(),
            season_id: folder.season_id.clone(),
            name: folder.name.clone(),
            parent_folder_id: folder.parent_folder_id.clone(),
            color: folder.color.clone(),
            sort_order: folder.sort_order,
            created_by: folder.created_by.clone(),
            created_at: truncate_time(created_at),
        })
    }

    pub fn delete_folder(&self, folder_id: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM folders WHERE id = ?1", [folder_id])?;
        Ok(affected > 0)
    }

    pub fn list_pages(&self, query: &PageQuery) -> AppResult<Vec<Page>> {
        let conn = self.lock()?;
        let mut sql = format!(
            "SELECT {} FROM pages WHERE team_id = ? AND season_id = ?",
            PAGE_COLUMNS
        );
        let mut params_vec: Vec<String> = vec![query.team_id.clone(), query.season_id.clone()];

        if let Some(folder_id) = &query.folder_id {
            sql.push_str(" AND folder_id = ?");
            params_vec.push(folder_id.clone());
        }
        if let Some(linked) = &query.linked_entity {
            sql.push_str(" AND linked_entity_type = ? AND linked_entity_id = ?");
            params_vec.push(linked.entity_type.as_str().to_string());
            params_vec.push(linked.entity_id.clone());
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC");

        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map(rusqlite::params_from_iter(params_vec.iter()), parse_page_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn insert_page(&self, page: &NewPage, created_at: DateTime<Utc>) -> AppResult<Page> {
        let id = Uuid::new_v4().to_string();
        let created_at = truncate_time(created_at);
        let (entity_type, entity_id) = match &page.linked_entity {
            Some(linked) => (Some(linked.entity_type), Some(linked.entity_id.clone())),
            None => (None, None),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO pages (
               id, team_id, season_id, folder_id, title, linked_entity_type, linked_entity_id,
               created_by, updated_by, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9, ?9)",
            params![
                id,
                page.team_id,
                page.season_id,
                page.folder_id,
                page.title,
                entity_type.map(LinkedEntityType::as_str),
                entity_id,
                page.created_by,
                format_time(created_at),
            ],
        )?;

        Ok(Page {
            id,
            team_id: page.team_id.clone(),
            season_id: page.season_id.clone(),
            folder_id: page.folder_id.clone(),
            title: page.title.clone(),
            linked_entity_type: entity_type,
            linked_entity_id: entity_id,
            created_by: page.created_by.clone(),
            updated_by: page.created_by.clone(),
            created_at,
            updated_at: created_at,
        })
    }

    pub fn reassign_pages(&self, from_folder_id: &str, to_folder_id: &str) -> AppResult<usize> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE pages SET folder_id = ?1, updated_at = ?2 WHERE folder_id = ?3",
            params![to_folder_id, format_time(Utc::now()), from_folder_id],
        )?;
        Ok(affected)
    }

    pub fn delete_page(&self, page_id: &str) -> AppResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute("DELETE FROM pages WHERE id = ?1", [page_id])?;
        Ok(affected > 0)
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }
}

fn parse_folder_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        team_id: row.get(1)?,
        season_id: row.get(2)?,
        name: row.get(3)?,
        parent_folder_id: row.get(4)?,
        color: row.get(5)?,
        sort_order: row.get(6)?,
        created_by: row.get(7)?,
        created_at: parse_time(&row.get::<_, String>(8)?)?,
    })
}

fn parse_page_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        team_id: row.get(1)?,
        season_id: row.get(2)?,
        folder_id: row.get(3)?,
        title: row.get(4)?,
        linked_entity_type: row
            .get::<_, Option<String>>(5)?
            .map(|raw| parse_entity_type(&raw))
            .transpose()?,
        linked_entity_id: row.get(6)?,
        created_by: row.get(7)?,
        updated_by: row.get(8)?,
        created_at: parse_time(&row.get::<_, String>(9)?)?,
        updated_at: parse_time(&row.get::<_, String>(10)?)?,
    })
}

fn parse_entity_type(raw: &str) -> rusqlite::Result<LinkedEntityType> {
    raw.parse::<LinkedEntityType>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
        )
    })
}

// Fixed width, so text order matches time order.
fn format_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn truncate_time(value: DateTime<Utc>) -> DateTime<Utc> {
    parse_time(&format_time(value)).unwrap_or(value)
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
            )
        })
}
