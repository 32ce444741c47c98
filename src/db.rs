use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, Params, Result, Row};

use crate::error::{is_constraint_violation, AppError};
use crate::models::{Board, BoardSummary, List, Session, Task, User, Workspace};

pub type DbPool = Arc<Mutex<Connection>>;

pub const DEFAULT_WORKSPACE_NAME: &str = "My Workspace";

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        created_at INTEGER DEFAULT (strftime('%s', 'now'))
    );

    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at INTEGER DEFAULT (strftime('%s', 'now')),
        expires_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workspaces (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at INTEGER DEFAULT (strftime('%s', 'now'))
    );

    CREATE TABLE IF NOT EXISTS boards (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
        position INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER DEFAULT (strftime('%s', 'now'))
    );

    CREATE TABLE IF NOT EXISTS lists (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        color TEXT NOT NULL,
        board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        position INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER DEFAULT (strftime('%s', 'now'))
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY,
        list_id INTEGER NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        position INTEGER NOT NULL DEFAULT 0,
        completed INTEGER DEFAULT 0,
        created_by INTEGER NOT NULL REFERENCES users(id),
        created_at INTEGER DEFAULT (strftime('%s', 'now')),
        updated_at INTEGER DEFAULT (strftime('%s', 'now'))
    );
";

const BOARD_COLUMNS: &str = "b.id, b.name, b.workspace_id, b.position, b.created_at";
const LIST_COLUMNS: &str = "l.id, l.title, l.color, l.board_id, l.position, l.created_at";
const TASK_COLUMNS: &str =
    "t.id, t.list_id, t.title, t.description, t.position, t.completed, t.created_by, t.created_at, t.updated_at";

const OWNED_BOARD: &str = "SELECT 1 FROM boards b
    JOIN workspaces w ON w.id = b.workspace_id
    WHERE b.id = ?1 AND w.owner_id = ?2";
const OWNED_LIST: &str = "SELECT 1 FROM lists l
    JOIN boards b ON b.id = l.board_id
    JOIN workspaces w ON w.id = b.workspace_id
    WHERE l.id = ?1 AND w.owner_id = ?2";
const OWNED_TASK: &str = "SELECT 1 FROM tasks t
    JOIN lists l ON l.id = t.list_id
    JOIN boards b ON b.id = l.board_id
    JOIN workspaces w ON w.id = b.workspace_id
    WHERE t.id = ?1 AND w.owner_id = ?2";

pub fn init_db(path: impl AsRef<Path>) -> Result<DbPool> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_in_memory() -> Result<DbPool> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn lock(pool: &DbPool) -> MutexGuard<'_, Connection> {
    pool.lock().unwrap_or_else(PoisonError::into_inner)
}

fn exists<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<bool, AppError> {
    Ok(conn.query_row(sql, params, |_| Ok(())).optional()?.is_some())
}

fn user_from_row(row: &Row) -> Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn board_from_row(row: &Row) -> Result<Board> {
    Ok(Board {
        id: row.get(0)?,
        name: row.get(1)?,
        workspace_id: row.get(2)?,
        position: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn list_from_row(row: &Row) -> Result<List> {
    Ok(List {
        id: row.get(0)?,
        title: row.get(1)?,
        color: row.get(2)?,
        board_id: row.get(3)?,
        position: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn task_from_row(row: &Row) -> Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        list_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        position: row.get(4)?,
        completed: row.get::<_, i32>(5)? != 0,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

// User operations
pub fn create_user(pool: &DbPool, username: &str, password_hash: &str) -> Result<User, AppError> {
    let conn = lock(pool);
    if let Err(err) = conn.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        (username, password_hash),
    ) {
        if is_constraint_violation(&err) {
            return Err(AppError::Conflict("Username already taken"));
        }
        return Err(err.into());
    }
    let id = conn.last_insert_rowid();
    let user = conn.query_row(
        "SELECT id, username, created_at FROM users WHERE id = ?1",
        [id],
        user_from_row,
    )?;
    Ok(user)
}

/// Returns the user together with their stored password hash.
pub fn get_user_with_hash(pool: &DbPool, username: &str) -> Result<Option<(User, String)>, AppError> {
    let conn = lock(pool);
    let found = conn
        .query_row(
            "SELECT id, username, created_at, password_hash FROM users WHERE username = ?1",
            [username],
            |row| Ok((user_from_row(row)?, row.get(3)?)),
        )
        .optional()?;
    Ok(found)
}

/// Renames a user. Returns `None` when the user no longer exists.
pub fn update_username(pool: &DbPool, user_id: i64, username: &str) -> Result<Option<User>, AppError> {
    let conn = lock(pool);
    match conn.execute("UPDATE users SET username = ?1 WHERE id = ?2", (username, user_id)) {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(err) if is_constraint_violation(&err) => {
            return Err(AppError::Conflict("Username already taken"))
        }
        Err(err) => return Err(err.into()),
    }
    let user = conn
        .query_row(
            "SELECT id, username, created_at FROM users WHERE id = ?1",
            [user_id],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_password_hash(pool: &DbPool, user_id: i64) -> Result<Option<String>, AppError> {
    let conn = lock(pool);
    let hash = conn
        .query_row("SELECT password_hash FROM users WHERE id = ?1", [user_id], |row| row.get(0))
        .optional()?;
    Ok(hash)
}

pub fn set_password_hash(pool: &DbPool, user_id: i64, password_hash: &str) -> Result<bool, AppError> {
    let conn = lock(pool);
    let rows = conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE id = ?2",
        (password_hash, user_id),
    )?;
    Ok(rows > 0)
}

// Session operations
pub fn create_session(pool: &DbPool, session: &Session) -> Result<(), AppError> {
    let conn = lock(pool);
    conn.execute(
        "INSERT INTO sessions (id, user_id, expires_at) VALUES (?1, ?2, ?3)",
        (&session.id, session.user_id, session.expires_at),
    )?;
    Ok(())
}

pub fn get_session(pool: &DbPool, id: &str) -> Result<Option<Session>, AppError> {
    let conn = lock(pool);
    let session = conn
        .query_row(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?1",
            [id],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    created_at: row.get(2)?,
                    expires_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(session)
}

pub fn delete_session(pool: &DbPool, id: &str) -> Result<(), AppError> {
    let conn = lock(pool);
    conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
    Ok(())
}

pub fn cleanup_expired_sessions(pool: &DbPool) -> Result<usize, AppError> {
    let conn = lock(pool);
    let removed = conn.execute("DELETE FROM sessions WHERE expires_at < ?1", [unix_now()])?;
    Ok(removed)
}

// Workspace operations
fn ensure_workspace(conn: &Connection, owner_id: i64) -> Result<Workspace, AppError> {
    let select = "SELECT id, name, owner_id, created_at FROM workspaces
        WHERE owner_id = ?1 ORDER BY id ASC LIMIT 1";
    let from_row = |row: &Row| -> Result<Workspace> {
        Ok(Workspace {
            id: row.get(0)?,
            name: row.get(1)?,
            owner_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    };

    if let Some(workspace) = conn.query_row(select, [owner_id], from_row).optional()? {
        return Ok(workspace);
    }

    conn.execute(
        "INSERT INTO workspaces (name, owner_id) VALUES (?1, ?2)",
        (DEFAULT_WORKSPACE_NAME, owner_id),
    )?;
    tracing::info!(owner_id, "Created default workspace");
    Ok(conn.query_row(select, [owner_id], from_row)?)
}

// Board operations
/// Boards of `user_id`, optionally filtered to names containing `query`
/// (case-insensitive).
pub fn list_boards(
    pool: &DbPool,
    user_id: i64,
    query: Option<&str>,
) -> Result<Vec<BoardSummary>, AppError> {
    let conn = lock(pool);
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOARD_COLUMNS}, COUNT(t.id), COALESCE(SUM(t.completed), 0)
         FROM boards b
         JOIN workspaces w ON w.id = b.workspace_id
         LEFT JOIN lists l ON l.board_id = b.id
         LEFT JOIN tasks t ON t.list_id = l.id
         WHERE w.owner_id = ?1 AND (?2 IS NULL OR instr(lower(b.name), lower(?2)) > 0)
         GROUP BY b.id
         ORDER BY b.position ASC, b.id ASC"
    ))?;
    let boards = stmt
        .query_map((user_id, query), |row| {
            Ok(BoardSummary {
                board: board_from_row(row)?,
                total_tasks: row.get(5)?,
                completed_tasks: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(boards)
}

pub fn create_board(pool: &DbPool, user_id: i64, name: &str) -> Result<Board, AppError> {
    let conn = lock(pool);
    let workspace = ensure_workspace(&conn, user_id)?;

    let last: Option<i64> = conn.query_row(
        "SELECT MAX(position) FROM boards WHERE workspace_id = ?1",
        [workspace.id],
        |row| row.get(0),
    )?;
    let position = last.map_or(0, |p| p + 1);

    conn.execute(
        "INSERT INTO boards (name, workspace_id, position) VALUES (?1, ?2, ?3)",
        (name, workspace.id, position),
    )?;
    let id = conn.last_insert_rowid();

    Ok(conn.query_row(
        &format!("SELECT {BOARD_COLUMNS} FROM boards b WHERE b.id = ?1"),
        [id],
        board_from_row,
    )?)
}

pub fn get_board(pool: &DbPool, user_id: i64, id: i64) -> Result<Option<Board>, AppError> {
    let conn = lock(pool);
    get_board_internal(&conn, user_id, id)
}

fn get_board_internal(conn: &Connection, user_id: i64, id: i64) -> Result<Option<Board>, AppError> {
    let board = conn
        .query_row(
            &format!(
                "SELECT {BOARD_COLUMNS} FROM boards b
                 JOIN workspaces w ON w.id = b.workspace_id
                 WHERE b.id = ?1 AND w.owner_id = ?2"
            ),
            (id, user_id),
            board_from_row,
        )
        .optional()?;
    Ok(board)
}

pub fn rename_board(pool: &DbPool, user_id: i64, id: i64, name: &str) -> Result<Option<Board>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_BOARD, (id, user_id))? {
        return Ok(None);
    }
    conn.execute("UPDATE boards SET name = ?1 WHERE id = ?2", (name, id))?;
    get_board_internal(&conn, user_id, id)
}

pub fn delete_board(pool: &DbPool, user_id: i64, id: i64) -> Result<bool, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_BOARD, (id, user_id))? {
        return Ok(false);
    }
    let rows = conn.execute("DELETE FROM boards WHERE id = ?1", [id])?;
    Ok(rows > 0)
}

// List operations
pub fn list_lists(pool: &DbPool, user_id: i64, board_id: i64) -> Result<Option<Vec<List>>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_BOARD, (board_id, user_id))? {
        return Ok(None);
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {LIST_COLUMNS} FROM lists l WHERE l.board_id = ?1 ORDER BY l.position ASC, l.id ASC"
    ))?;
    let lists = stmt
        .query_map([board_id], list_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(lists))
}

pub fn create_list(
    pool: &DbPool,
    user_id: i64,
    board_id: i64,
    title: &str,
    color: &str,
) -> Result<Option<List>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_BOARD, (board_id, user_id))? {
        return Ok(None);
    }

    let last: Option<i64> = conn.query_row(
        "SELECT MAX(position) FROM lists WHERE board_id = ?1",
        [board_id],
        |row| row.get(0),
    )?;
    let position = last.map_or(0, |p| p + 1);

    conn.execute(
        "INSERT INTO lists (title, color, board_id, position) VALUES (?1, ?2, ?3, ?4)",
        (title, color, board_id, position),
    )?;
    let id = conn.last_insert_rowid();
    get_list_internal(&conn, id)
}

fn get_list_internal(conn: &Connection, id: i64) -> Result<Option<List>, AppError> {
    let list = conn
        .query_row(
            &format!("SELECT {LIST_COLUMNS} FROM lists l WHERE l.id = ?1"),
            [id],
            list_from_row,
        )
        .optional()?;
    Ok(list)
}

pub fn update_list(
    pool: &DbPool,
    user_id: i64,
    id: i64,
    title: Option<&str>,
    color: Option<&str>,
) -> Result<Option<List>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_LIST, (id, user_id))? {
        return Ok(None);
    }

    let mut updates = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(t) = title {
        updates.push("title = ?");
        params.push(Box::new(t.to_string()));
    }
    if let Some(c) = color {
        updates.push("color = ?");
        params.push(Box::new(c.to_string()));
    }

    if !updates.is_empty() {
        params.push(Box::new(id));
        let query = format!("UPDATE lists SET {} WHERE id = ?", updates.join(", "));
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.execute(&query, params_refs.as_slice())?;
    }

    get_list_internal(&conn, id)
}

pub fn delete_list(pool: &DbPool, user_id: i64, id: i64) -> Result<bool, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_LIST, (id, user_id))? {
        return Ok(false);
    }
    let rows = conn.execute("DELETE FROM lists WHERE id = ?1", [id])?;
    Ok(rows > 0)
}

// Task operations
pub fn list_tasks(pool: &DbPool, user_id: i64, list_id: i64) -> Result<Option<Vec<Task>>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_LIST, (list_id, user_id))? {
        return Ok(None);
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.list_id = ?1 ORDER BY t.position ASC, t.id ASC"
    ))?;
    let tasks = stmt
        .query_map([list_id], task_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(tasks))
}

pub fn create_task(
    pool: &DbPool,
    user_id: i64,
    list_id: i64,
    title: &str,
    description: &str,
) -> Result<Option<Task>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_LIST, (list_id, user_id))? {
        return Ok(None);
    }

    // Append after the current last task; an empty list starts at zero.
    let last: Option<i64> = conn.query_row(
        "SELECT MAX(position) FROM tasks WHERE list_id = ?1",
        [list_id],
        |row| row.get(0),
    )?;
    let position = last.map_or(0, |p| p + 1);

    conn.execute(
        "INSERT INTO tasks (list_id, title, description, position, created_by) VALUES (?1, ?2, ?3, ?4, ?5)",
        (list_id, title, description, position, user_id),
    )?;
    let id = conn.last_insert_rowid();
    get_task_internal(&conn, id)
}

pub fn get_task(pool: &DbPool, user_id: i64, id: i64) -> Result<Option<Task>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_TASK, (id, user_id))? {
        return Ok(None);
    }
    get_task_internal(&conn, id)
}

fn get_task_internal(conn: &Connection, id: i64) -> Result<Option<Task>, AppError> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
            [id],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

pub fn update_task(
    pool: &DbPool,
    user_id: i64,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    completed: Option<bool>,
) -> Result<Option<Task>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_TASK, (id, user_id))? {
        return Ok(None);
    }

    let mut updates = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(t) = title {
        updates.push("title = ?");
        params.push(Box::new(t.to_string()));
    }
    if let Some(d) = description {
        updates.push("description = ?");
        params.push(Box::new(d.to_string()));
    }
    if let Some(c) = completed {
        updates.push("completed = ?");
        params.push(Box::new(c as i32));
    }

    if updates.is_empty() {
        return get_task_internal(&conn, id);
    }

    updates.push("updated_at = strftime('%s', 'now')");
    params.push(Box::new(id));

    let query = format!("UPDATE tasks SET {} WHERE id = ?", updates.join(", "));

    let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    conn.execute(&query, params_refs.as_slice())?;

    get_task_internal(&conn, id)
}

/// Moves a task to `position` inside `list_id`. Both the task and the target
/// list must belong to `user_id`.
pub fn update_task_position(
    pool: &DbPool,
    user_id: i64,
    id: i64,
    position: i64,
    list_id: i64,
) -> Result<Option<Task>, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_TASK, (id, user_id))? || !exists(&conn, OWNED_LIST, (list_id, user_id))? {
        return Ok(None);
    }

    conn.execute(
        "UPDATE tasks SET position = ?1, list_id = ?2, updated_at = strftime('%s', 'now') WHERE id = ?3",
        (position, list_id, id),
    )?;
    get_task_internal(&conn, id)
}

pub fn delete_task(pool: &DbPool, user_id: i64, id: i64) -> Result<bool, AppError> {
    let conn = lock(pool);
    if !exists(&conn, OWNED_TASK, (id, user_id))? {
        return Ok(false);
    }
    let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (DbPool, i64) {
        let pool = init_in_memory().unwrap();
        let user = create_user(&pool, "maja", "hash").unwrap();
        (pool, user.id)
    }

    #[test]
    fn first_board_creates_default_workspace() {
        let (pool, user) = setup();
        let first = create_board(&pool, user, "Hive").unwrap();
        let second = create_board(&pool, user, "Garden").unwrap();

        assert_eq!(first.workspace_id, second.workspace_id);
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);

        let conn = lock(&pool);
        let name: String = conn
            .query_row("SELECT name FROM workspaces WHERE owner_id = ?1", [user], |r| r.get(0))
            .unwrap();
        assert_eq!(name, DEFAULT_WORKSPACE_NAME);
    }

    #[test]
    fn duplicate_username_is_a_conflict() {
        let (pool, _) = setup();
        assert!(matches!(
            create_user(&pool, "maja", "other"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn renaming_a_user_respects_uniqueness() {
        let (pool, user) = setup();
        create_user(&pool, "willy", "hash").unwrap();

        let renamed = update_username(&pool, user, "maja2").unwrap().unwrap();
        assert_eq!(renamed.username, "maja2");
        assert!(matches!(
            update_username(&pool, user, "willy"),
            Err(AppError::Conflict(_))
        ));
        assert!(update_username(&pool, 999, "ghost").unwrap().is_none());
    }

    #[test]
    fn password_hash_can_be_replaced() {
        let (pool, user) = setup();
        assert!(set_password_hash(&pool, user, "new-hash").unwrap());
        assert_eq!(get_password_hash(&pool, user).unwrap().as_deref(), Some("new-hash"));
        assert!(get_password_hash(&pool, 999).unwrap().is_none());
    }

    #[test]
    fn board_search_matches_names_case_insensitively() {
        let (pool, user) = setup();
        create_board(&pool, user, "Hive Repairs").unwrap();
        create_board(&pool, user, "Garden").unwrap();
        create_board(&pool, user, "Beehive").unwrap();

        let names = |query: Option<&str>| {
            list_boards(&pool, user, query)
                .unwrap()
                .into_iter()
                .map(|b| b.board.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Some("HIVE")), vec!["Hive Repairs", "Beehive"]);
        assert!(names(Some("orchard")).is_empty());
        assert_eq!(names(None).len(), 3);
    }

    #[test]
    fn task_positions_start_at_zero_and_append() {
        let (pool, user) = setup();
        let board = create_board(&pool, user, "Hive").unwrap();
        let list = create_list(&pool, user, board.id, "Todo", "#f59e0b").unwrap().unwrap();

        let a = create_task(&pool, user, list.id, "a", "").unwrap().unwrap();
        let b = create_task(&pool, user, list.id, "b", "").unwrap().unwrap();
        assert_eq!(a.position, 0);
        assert_eq!(b.position, 1);
        assert!(!a.completed);
        assert_eq!(a.created_by, user);
    }

    #[test]
    fn board_summary_counts_tasks_across_lists() {
        let (pool, user) = setup();
        let board = create_board(&pool, user, "Hive").unwrap();
        let todo = create_list(&pool, user, board.id, "Todo", "red").unwrap().unwrap();
        let done = create_list(&pool, user, board.id, "Done", "green").unwrap().unwrap();
        create_task(&pool, user, todo.id, "a", "").unwrap();
        let b = create_task(&pool, user, done.id, "b", "").unwrap().unwrap();
        update_task(&pool, user, b.id, None, None, Some(true)).unwrap();
        create_board(&pool, user, "Empty").unwrap();

        let boards = list_boards(&pool, user, None).unwrap();
        assert_eq!(boards.len(), 2);
        assert_eq!(boards[0].total_tasks, 2);
        assert_eq!(boards[0].completed_tasks, 1);
        assert_eq!(boards[1].total_tasks, 0);
        assert_eq!(boards[1].completed_tasks, 0);
    }

    #[test]
    fn deleting_a_list_cascades_to_tasks() {
        let (pool, user) = setup();
        let board = create_board(&pool, user, "Hive").unwrap();
        let list = create_list(&pool, user, board.id, "Todo", "red").unwrap().unwrap();
        let task = create_task(&pool, user, list.id, "a", "").unwrap().unwrap();

        assert!(delete_list(&pool, user, list.id).unwrap());
        assert!(get_task(&pool, user, task.id).unwrap().is_none());
    }

    #[test]
    fn position_update_moves_between_lists() {
        let (pool, user) = setup();
        let board = create_board(&pool, user, "Hive").unwrap();
        let from = create_list(&pool, user, board.id, "Todo", "red").unwrap().unwrap();
        let to = create_list(&pool, user, board.id, "Done", "green").unwrap().unwrap();
        let task = create_task(&pool, user, from.id, "a", "").unwrap().unwrap();

        let moved = update_task_position(&pool, user, task.id, 3, to.id).unwrap().unwrap();
        assert_eq!(moved.list_id, to.id);
        assert_eq!(moved.position, 3);
        assert!(list_tasks(&pool, user, from.id).unwrap().unwrap().is_empty());
    }

    #[test]
    fn other_users_cannot_see_or_touch_entities() {
        let (pool, owner) = setup();
        let stranger = create_user(&pool, "willi", "hash").unwrap().id;
        let board = create_board(&pool, owner, "Hive").unwrap();
        let list = create_list(&pool, owner, board.id, "Todo", "red").unwrap().unwrap();
        let task = create_task(&pool, owner, list.id, "a", "").unwrap().unwrap();

        assert!(list_boards(&pool, stranger, None).unwrap().is_empty());
        assert!(list_lists(&pool, stranger, board.id).unwrap().is_none());
        assert!(get_task(&pool, stranger, task.id).unwrap().is_none());
        assert!(!delete_task(&pool, stranger, task.id).unwrap());
        assert!(update_task_position(&pool, stranger, task.id, 0, list.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn init_db_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskbees.db");
        {
            let pool = init_db(&path).unwrap();
            create_user(&pool, "maja", "hash").unwrap();
        }
        let pool = init_db(&path).unwrap();
        assert!(get_user_with_hash(&pool, "maja").unwrap().is_some());
    }

    #[test]
    fn expired_sessions_are_cleaned_up() {
        let (pool, user) = setup();
        let expired = Session {
            id: "old".to_string(),
            user_id: user,
            created_at: 0,
            expires_at: 1,
        };
        create_session(&pool, &expired).unwrap();
        assert_eq!(cleanup_expired_sessions(&pool).unwrap(), 1);
        assert!(get_session(&pool, "old").unwrap().is_none());
    }
}
