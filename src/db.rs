// ==========================================
// 洪涝风险监测系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供 area / config_kv 表的建表脚本 (幂等)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 schema（幂等）
///
/// 说明：
/// - area: 监测区域, 几何以 JSON 文本存储 (编解码见 repository::geometry_codec)
/// - config_kv: 全局配置
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS area (
            area_id TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            geometry TEXT NOT NULL,

            elevation_m REAL NOT NULL,
            slope TEXT NOT NULL,
            soil TEXT NOT NULL,
            drainage TEXT NOT NULL,
            surface TEXT NOT NULL,

            water_body TEXT NOT NULL,
            water_distance_m REAL NOT NULL CHECK (water_distance_m >= 0),
            flood_history TEXT NOT NULL,

            population INTEGER NOT NULL CHECK (population >= 0),
            vulnerable_groups TEXT NOT NULL DEFAULT '[]',
            critical_assets TEXT NOT NULL DEFAULT '[]',
            building_type TEXT NOT NULL,

            ground_condition TEXT NOT NULL,

            rainfall_mm_hr REAL NOT NULL DEFAULT 0,
            forecast_rainfall_mm REAL NOT NULL DEFAULT 0,
            wind_speed_kmh REAL NOT NULL DEFAULT 0,
            temperature_c REAL NOT NULL DEFAULT 0,
            storm_alert TEXT,

            risk_level TEXT NOT NULL DEFAULT 'VERY_LOW',
            last_risk_update TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_area_risk_level ON area(risk_level);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 FLOOD_MONITOR_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FLOOD_MONITOR_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./flood_monitor.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("flood-risk-monitor");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("flood_monitor.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        let area_tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='area'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(area_tables, 1);
    }
}
