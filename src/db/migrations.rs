//! Database migrations module
//!
//! Code-based migrations for the Digital Ledger schema. All migrations are
//! embedded directly in Rust code as SQL strings, supporting both SQLite
//! and MySQL databases for single-binary deployment.
//!
//! # Usage
//!
//! ```ignore
//! use digital_ledger::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Each migration is a `Migration` struct with a unique `version`, a
//! human-readable `name` and the SQL for each supported driver.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for the Digital Ledger schema, embedded in the binary.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create users table
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'member',
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);
            CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'member',
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_users_username ON users(username);
            CREATE INDEX idx_users_email ON users(email);
        "#,
    },
    // Migration 2: Create sessions table
    Migration {
        version: 2,
        name: "create_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id VARCHAR(64) PRIMARY KEY,
                user_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_sessions_user_id ON sessions(user_id);
            CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
        "#,
    },
    // Migration 3: Create news_categories table
    Migration {
        version: 3,
        name: "create_news_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS news_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_news_categories_slug ON news_categories(slug);
            INSERT OR IGNORE INTO news_categories (slug, name, description)
            VALUES ('general', 'General', 'Default category for uncategorized content');
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS news_categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                name VARCHAR(100) NOT NULL,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_news_categories_slug ON news_categories(slug);
            INSERT IGNORE INTO news_categories (slug, name, description)
            VALUES ('general', 'General', 'Default category for uncategorized content');
        "#,
    },
    // Migration 4: Create news_articles table
    Migration {
        version: 4,
        name: "create_news_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS news_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                content_html TEXT NOT NULL,
                cover_image VARCHAR(500),
                author_id INTEGER NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                view_count INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_news_articles_slug ON news_articles(slug);
            CREATE INDEX IF NOT EXISTS idx_news_articles_author_id ON news_articles(author_id);
            CREATE INDEX IF NOT EXISTS idx_news_articles_status ON news_articles(status);
            CREATE INDEX IF NOT EXISTS idx_news_articles_published_at ON news_articles(published_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS news_articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                summary TEXT NOT NULL,
                content TEXT NOT NULL,
                content_html TEXT NOT NULL,
                cover_image VARCHAR(500),
                author_id BIGINT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                view_count BIGINT NOT NULL DEFAULT 0,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_news_articles_slug ON news_articles(slug);
            CREATE INDEX idx_news_articles_author_id ON news_articles(author_id);
            CREATE INDEX idx_news_articles_status ON news_articles(status);
            CREATE INDEX idx_news_articles_published_at ON news_articles(published_at);
        "#,
    },
    // Migration 5: Create article_categories junction table
    Migration {
        version: 5,
        name: "create_article_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS article_categories (
                article_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, category_id),
                FOREIGN KEY (article_id) REFERENCES news_articles(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES news_categories(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_article_categories_article_id ON article_categories(article_id);
            CREATE INDEX IF NOT EXISTS idx_article_categories_category_id ON article_categories(category_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS article_categories (
                article_id BIGINT NOT NULL,
                category_id BIGINT NOT NULL,
                PRIMARY KEY (article_id, category_id),
                FOREIGN KEY (article_id) REFERENCES news_articles(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES news_categories(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_article_categories_article_id ON article_categories(article_id);
            CREATE INDEX idx_article_categories_category_id ON article_categories(category_id);
        "#,
    },
    // Migration 6: Create podcast_episodes table
    Migration {
        version: 6,
        name: "create_podcast_episodes",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS podcast_episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                audio_url VARCHAR(500) NOT NULL,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                episode_number INTEGER NOT NULL DEFAULT 0,
                host_name VARCHAR(100) NOT NULL DEFAULT '',
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_podcast_episodes_slug ON podcast_episodes(slug);
            CREATE INDEX IF NOT EXISTS idx_podcast_episodes_status ON podcast_episodes(status);
            CREATE INDEX IF NOT EXISTS idx_podcast_episodes_published_at ON podcast_episodes(published_at);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS podcast_episodes (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(255) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                audio_url VARCHAR(500) NOT NULL,
                duration_seconds BIGINT NOT NULL DEFAULT 0,
                episode_number INT NOT NULL DEFAULT 0,
                host_name VARCHAR(100) NOT NULL DEFAULT '',
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                published_at TIMESTAMP NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_podcast_episodes_slug ON podcast_episodes(slug);
            CREATE INDEX idx_podcast_episodes_status ON podcast_episodes(status);
            CREATE INDEX idx_podcast_episodes_published_at ON podcast_episodes(published_at);
        "#,
    },
    // Migration 7: Create episode_categories junction table
    Migration {
        version: 7,
        name: "create_episode_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS episode_categories (
                episode_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                PRIMARY KEY (episode_id, category_id),
                FOREIGN KEY (episode_id) REFERENCES podcast_episodes(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES news_categories(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_episode_categories_episode_id ON episode_categories(episode_id);
            CREATE INDEX IF NOT EXISTS idx_episode_categories_category_id ON episode_categories(category_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS episode_categories (
                episode_id BIGINT NOT NULL,
                category_id BIGINT NOT NULL,
                PRIMARY KEY (episode_id, category_id),
                FOREIGN KEY (episode_id) REFERENCES podcast_episodes(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES news_categories(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_episode_categories_episode_id ON episode_categories(episode_id);
            CREATE INDEX idx_episode_categories_category_id ON episode_categories(category_id);
        "#,
    },
    // Migration 8: Create forum tables
    Migration {
        version: 8,
        name: "create_forum",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS forum_discussions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                body_html TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                is_locked BOOLEAN NOT NULL DEFAULT 0,
                is_pinned BOOLEAN NOT NULL DEFAULT 0,
                reply_count INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_forum_discussions_author_id ON forum_discussions(author_id);
            CREATE TABLE IF NOT EXISTS forum_replies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                discussion_id INTEGER NOT NULL,
                body TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (discussion_id) REFERENCES forum_discussions(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_forum_replies_discussion_id ON forum_replies(discussion_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS forum_discussions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                body_html TEXT NOT NULL,
                author_id BIGINT NOT NULL,
                is_locked BOOLEAN NOT NULL DEFAULT FALSE,
                is_pinned BOOLEAN NOT NULL DEFAULT FALSE,
                reply_count BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_forum_discussions_author_id ON forum_discussions(author_id);
            CREATE TABLE IF NOT EXISTS forum_replies (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                discussion_id BIGINT NOT NULL,
                body TEXT NOT NULL,
                author_id BIGINT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (discussion_id) REFERENCES forum_discussions(id) ON DELETE CASCADE,
                FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_forum_replies_discussion_id ON forum_replies(discussion_id);
        "#,
    },
    // Migration 9: Create resources table
    Migration {
        version: 9,
        name: "create_resources",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                url VARCHAR(500) NOT NULL,
                kind VARCHAR(20) NOT NULL DEFAULT 'link',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS resources (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT NOT NULL,
                url VARCHAR(500) NOT NULL,
                kind VARCHAR(20) NOT NULL DEFAULT 'link',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
        "#,
    },
    // Migration 10: Create poll tables
    Migration {
        version: 10,
        name: "create_polls",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS polls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question VARCHAR(500) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS poll_options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                poll_id INTEGER NOT NULL,
                label VARCHAR(255) NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                vote_count INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_poll_options_poll_id ON poll_options(poll_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS polls (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                question VARCHAR(500) NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS poll_options (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                poll_id BIGINT NOT NULL,
                label VARCHAR(255) NOT NULL,
                position INT NOT NULL DEFAULT 0,
                vote_count BIGINT NOT NULL DEFAULT 0,
                FOREIGN KEY (poll_id) REFERENCES polls(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_poll_options_poll_id ON poll_options(poll_id);
        "#,
    },
    // Migration 11: Create subscribers table
    Migration {
        version: 11,
        name: "create_subscribers",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS subscribers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                confirmed BOOLEAN NOT NULL DEFAULT 0,
                subscribed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_subscribers_email ON subscribers(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS subscribers (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                confirmed BOOLEAN NOT NULL DEFAULT FALSE,
                subscribed_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_subscribers_email ON subscribers(email);
        "#,
    },
    // Migration 12: Create user_invitations table
    Migration {
        version: 12,
        name: "create_user_invitations",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS user_invitations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL,
                token VARCHAR(64) NOT NULL UNIQUE,
                role VARCHAR(20) NOT NULL DEFAULT 'member',
                invited_by INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                accepted_at TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (invited_by) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_user_invitations_token ON user_invitations(token);
            CREATE INDEX IF NOT EXISTS idx_user_invitations_email ON user_invitations(email);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS user_invitations (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL,
                token VARCHAR(64) NOT NULL UNIQUE,
                role VARCHAR(20) NOT NULL DEFAULT 'member',
                invited_by BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                accepted_at TIMESTAMP NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (invited_by) REFERENCES users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_user_invitations_token ON user_invitations(token);
            CREATE INDEX idx_user_invitations_email ON user_invitations(email);
        "#,
    },
    // Migration 13: Create menu_settings table with the default entries
    Migration {
        version: 13,
        name: "create_menu_settings",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS menu_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key VARCHAR(50) NOT NULL UNIQUE,
                label VARCHAR(100) NOT NULL,
                is_visible BOOLEAN NOT NULL DEFAULT 1,
                sort_order INTEGER NOT NULL DEFAULT 0
            );
            INSERT OR IGNORE INTO menu_settings (key, label, is_visible, sort_order) VALUES
                ('news', 'News', 1, 0),
                ('podcasts', 'Podcasts', 1, 1),
                ('forum', 'Forum', 1, 2),
                ('resources', 'Resources', 1, 3),
                ('polls', 'Polls', 1, 4);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS menu_settings (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                menu_key VARCHAR(50) NOT NULL UNIQUE,
                label VARCHAR(100) NOT NULL,
                is_visible BOOLEAN NOT NULL DEFAULT TRUE,
                sort_order INT NOT NULL DEFAULT 0
            );
            INSERT IGNORE INTO menu_settings (menu_key, label, is_visible, sort_order) VALUES
                ('news', 'News', TRUE, 0),
                ('podcasts', 'Podcasts', TRUE, 1),
                ('forum', 'Forum', TRUE, 2),
                ('resources', 'Resources', TRUE, 3),
                ('polls', 'Polls', TRUE, 4);
        "#,
    },
    // Migration 14: Create settings table
    Migration {
        version: 14,
        name: "create_settings",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS settings (
                key VARCHAR(100) PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS settings (
                setting_key VARCHAR(100) PRIMARY KEY,
                value TEXT NOT NULL
            );
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations that were applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(pool.as_sqlite().unwrap()).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(pool.as_mysql().unwrap()).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(pool.as_sqlite().unwrap(), migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(pool.as_mysql().unwrap(), migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

/// Check if a statement consists only of SQL comments
fn is_comment_only(stmt: &str) -> bool {
    stmt.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[test]
    fn test_migration_versions_are_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version,
                (i + 1) as i32,
                "Migration versions must be sequential"
            );
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n-- comment\nCREATE TABLE b (id INT);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
    }

    #[tokio::test]
    async fn test_run_migrations_from_scratch() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        let count = run_migrations(&pool).await.expect("Migrations failed");
        assert_eq!(count, MIGRATIONS.len());
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        let count = run_migrations(&pool).await.expect("Migrations failed");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_migrations_seed_defaults() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");

        let sqlite = pool.as_sqlite().unwrap();
        let row = sqlx::query("SELECT COUNT(*) as count FROM news_categories")
            .fetch_one(sqlite)
            .await
            .unwrap();
        let count: i64 = row.get("count");
        assert_eq!(count, 1);

        let row = sqlx::query("SELECT COUNT(*) as count FROM menu_settings")
            .fetch_one(sqlite)
            .await
            .unwrap();
        let count: i64 = row.get("count");
        assert_eq!(count, 5);
    }
}
