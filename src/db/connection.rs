use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;
use tracing::debug;

use crate::error::DeployError;

use super::migrations;

/// Find the .git root by walking up from the current directory.
pub fn find_git_root() -> Result<PathBuf, DeployError> {
    let mut dir = env::current_dir()?;
    loop {
        if dir.join(".git").exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(DeployError::not_found(
                "a git repository (tdp requires one to locate its state directory)",
            ));
        }
    }
}

fn state_dir() -> Result<PathBuf, DeployError> {
    Ok(find_git_root()?.join(".tdp"))
}

pub fn db_path() -> Result<PathBuf, DeployError> {
    Ok(state_dir()?.join("tdp.db"))
}

pub fn collections_path() -> Result<PathBuf, DeployError> {
    Ok(state_dir()?.join("collections.yaml"))
}

pub fn vars_path() -> Result<PathBuf, DeployError> {
    Ok(state_dir()?.join("vars.yaml"))
}

/// Open a connection to the database. Fails if `tdp init` has not been run.
pub fn open_db() -> Result<Connection, DeployError> {
    let path = db_path()?;
    if !path.exists() {
        return Err(DeployError::not_found(
            "tdp database (run `tdp init` first)",
        ));
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Initialize the database: create directories, the database file, and run migrations.
pub fn init_db() -> Result<PathBuf, DeployError> {
    let path = db_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    debug!(path = %path.display(), "initialized tdp database");
    Ok(path)
}

fn configure_connection(conn: &Connection) -> Result<(), DeployError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}
