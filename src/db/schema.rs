//! Schema migrations. Append only: a shipped entry is never edited, new
//! changes get a new version.

use sqlx::PgPool;

pub struct Migration {
    pub version: i32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "content_tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS services (
            id BIGSERIAL PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            banner_url TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS service_features (
            id BIGSERIAL PRIMARY KEY,
            service_id BIGINT NOT NULL REFERENCES services(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_service_features_service_id
            ON service_features(service_id);

        CREATE TABLE IF NOT EXISTS process_steps (
            id BIGSERIAL PRIMARY KEY,
            service_id BIGINT NOT NULL REFERENCES services(id) ON DELETE CASCADE,
            step_order INTEGER NOT NULL DEFAULT 0,
            title TEXT NOT NULL,
            description TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_process_steps_service_id
            ON process_steps(service_id, step_order);

        CREATE TABLE IF NOT EXISTS gallery_items (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            description TEXT,
            event_name TEXT,
            taken_on DATE,
            image_url TEXT NOT NULL,
            service_id BIGINT REFERENCES services(id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        CREATE INDEX IF NOT EXISTS idx_gallery_items_category ON gallery_items(category);

        CREATE TABLE IF NOT EXISTS slides (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            subtitle TEXT,
            description TEXT,
            image_url TEXT NOT NULL,
            primary_cta_text TEXT,
            primary_cta_link TEXT,
            secondary_cta_text TEXT,
            secondary_cta_link TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            active BOOLEAN NOT NULL DEFAULT true,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS technologies (
            id BIGSERIAL PRIMARY KEY,
            icon TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            display_order INTEGER NOT NULL DEFAULT 0,
            active BOOLEAN NOT NULL DEFAULT true,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS testimonials (
            id BIGSERIAL PRIMARY KEY,
            content TEXT NOT NULL,
            author_name TEXT NOT NULL,
            author_title TEXT,
            author_avatar TEXT,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            active BOOLEAN NOT NULL DEFAULT true,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS about (
            id BIGSERIAL PRIMARY KEY,
            mission TEXT NOT NULL,
            vision TEXT NOT NULL,
            history TEXT NOT NULL DEFAULT '',
            team_description TEXT NOT NULL DEFAULT '',
            quality_description TEXT NOT NULL DEFAULT '',
            images TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS about_team (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            bio TEXT,
            image_url TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS about_values (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            icon TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS stats (
            id BIGSERIAL PRIMARY KEY,
            label TEXT NOT NULL,
            value INTEGER NOT NULL DEFAULT 0,
            suffix TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS blog_posts (
            id BIGSERIAL PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            excerpt TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL,
            author_name TEXT NOT NULL,
            author_avatar TEXT,
            author_bio TEXT,
            publish_date DATE NOT NULL DEFAULT CURRENT_DATE,
            category TEXT NOT NULL DEFAULT 'General',
            image_url TEXT,
            tags TEXT[] NOT NULL DEFAULT '{}',
            active BOOLEAN NOT NULL DEFAULT true,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        CREATE INDEX IF NOT EXISTS idx_blog_posts_publish_date
            ON blog_posts(publish_date DESC);
        CREATE INDEX IF NOT EXISTS idx_blog_posts_category ON blog_posts(category);
        CREATE INDEX IF NOT EXISTS idx_blog_posts_tags ON blog_posts USING GIN(tags);
        "#,
    },
    Migration {
        version: 2,
        name: "inquiries_and_events",
        sql: r#"
        CREATE TABLE IF NOT EXISTS contact_submissions (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            event_type TEXT NOT NULL,
            message TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'New'
                CHECK (status IN ('New', 'pending', 'in-progress', 'completed')),
            response TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        CREATE INDEX IF NOT EXISTS idx_contact_submissions_status
            ON contact_submissions(status);

        CREATE TABLE IF NOT EXISTS events (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            event_type TEXT NOT NULL,
            event_date DATE NOT NULL,
            location TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Upcoming'
                CHECK (status IN ('Upcoming', 'pending', 'in-progress', 'completed', 'cancelled')),
            client_name TEXT,
            client_email TEXT,
            client_phone TEXT,
            budget TEXT,
            cover_image TEXT,
            images TEXT[] NOT NULL DEFAULT '{}',
            notes TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        CREATE INDEX IF NOT EXISTS idx_events_event_date ON events(event_date DESC);
        "#,
    },
    Migration {
        version: 3,
        name: "users_and_sessions",
        sql: r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT 'admin',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS sessions (
            sid TEXT PRIMARY KEY,
            sess JSONB NOT NULL,
            expire TIMESTAMPTZ NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_expire ON sessions(expire);
        "#,
    },
    Migration {
        version: 4,
        name: "about_singleton",
        sql: r#"
        DELETE FROM about WHERE id > (SELECT MIN(id) FROM about);
        ALTER TABLE about ADD COLUMN IF NOT EXISTS singleton BOOLEAN NOT NULL DEFAULT true;
        ALTER TABLE about DROP CONSTRAINT IF EXISTS about_singleton_key;
        ALTER TABLE about ADD CONSTRAINT about_singleton_key UNIQUE (singleton);
        ALTER TABLE about DROP CONSTRAINT IF EXISTS about_singleton_check;
        ALTER TABLE about ADD CONSTRAINT about_singleton_check CHECK (singleton);
        "#,
    },
];

/// Apply every migration newer than the recorded version, each in its own
/// transaction.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current: Option<i32> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    let current = current.unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_strictly_increase() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn test_about_is_guarded_as_a_singleton() {
        let guard = MIGRATIONS
            .iter()
            .find(|m| m.name == "about_singleton")
            .unwrap();
        assert!(guard.sql.contains("UNIQUE (singleton)"));
        assert!(guard.sql.contains("CHECK (singleton)"));
    }

    #[test]
    fn test_every_content_table_is_created() {
        let all: String = MIGRATIONS.iter().map(|m| m.sql).collect();
        for table in [
            "services",
            "service_features",
            "process_steps",
            "gallery_items",
            "slides",
            "technologies",
            "testimonials",
            "about",
            "about_team",
            "about_values",
            "stats",
            "blog_posts",
            "contact_submissions",
            "events",
            "users",
            "sessions",
        ] {
            assert!(
                all.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }
}
