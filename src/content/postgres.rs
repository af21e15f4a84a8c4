use crate::content::{ContentRecord, ContentRepository, EntityKind};
use crate::i18n::Locale;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

/// Where one entity kind lives in the content database.
struct TableLayout {
    table: &'static str,
    has_slug: bool,
    /// `(emitted key, base column)` pairs. Localized values live in
    /// `<column>_<locale>` next to the base column.
    columns: &'static [(&'static str, &'static str)],
    order_by: &'static str,
}

fn table_layout(kind: EntityKind) -> TableLayout {
    match kind {
        EntityKind::Service => TableLayout {
            table: "services_service",
            has_slug: true,
            columns: &[("name", "name"), ("description", "short_description")],
            order_by: "\"order\", id",
        },
        EntityKind::ProjectCategory => TableLayout {
            table: "projects_projectcategory",
            has_slug: true,
            columns: &[("name", "name"), ("description", "description")],
            order_by: "\"order\", id",
        },
        EntityKind::Project => TableLayout {
            table: "projects_project",
            has_slug: true,
            columns: &[("title", "title"), ("description", "short_description")],
            order_by: "project_date DESC, id",
        },
        EntityKind::JobPosition => TableLayout {
            table: "jobs_jobposition",
            has_slug: true,
            columns: &[("title", "title"), ("location", "location")],
            order_by: "created_at DESC, id",
        },
        EntityKind::HomePage => TableLayout {
            table: "content_homepage",
            has_slug: false,
            columns: &[
                ("company_description", "company_description"),
                ("mission_text", "mission_text"),
                ("values_text", "values_text"),
            ],
            order_by: "id",
        },
    }
}

/// Build the select for one kind and locale.
///
/// Column names are interpolated, never bound, so only codes from the locale
/// registry may reach this function.
fn select_sql(kind: EntityKind, locale: Locale) -> String {
    let layout = table_layout(kind);
    let code = locale.code();

    let mut columns = vec!["id::BIGINT AS id".to_string()];
    if layout.has_slug {
        columns.push("slug".to_string());
    } else {
        columns.push("NULL::TEXT AS slug".to_string());
    }
    for (key, column) in layout.columns {
        columns.push(format!(
            "COALESCE(NULLIF({column}_{code}, ''), {column})::TEXT AS {key}",
            column = column,
            code = code,
            key = key,
        ));
    }

    format!(
        "SELECT {} FROM {} WHERE is_active ORDER BY {} LIMIT $1",
        columns.join(", "),
        layout.table,
        layout.order_by
    )
}

fn record_from_row(kind: EntityKind, row: &PgRow) -> Result<ContentRecord> {
    let id: i64 = row.try_get("id").context("Missing id column")?;
    let slug: Option<String> = row.try_get("slug").context("Missing slug column")?;

    let mut fields = Vec::new();
    for (key, _) in table_layout(kind).columns {
        let value: Option<String> = row
            .try_get(*key)
            .context(format!("Missing {} column", key))?;
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            fields.push((key.to_string(), value));
        }
    }

    let slug = match kind {
        EntityKind::HomePage => Some("home".to_string()),
        _ => slug,
    };

    Ok(ContentRecord { id, slug, fields })
}

/// Content repository over the site's PostgreSQL database.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to content database")?;

        info!("Connected to content database");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn active_records(
        &self,
        kind: EntityKind,
        locale: Locale,
        limit: usize,
    ) -> Result<Vec<ContentRecord>> {
        let sql = select_sql(kind, locale);
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .context(format!("Failed to query {}", table_layout(kind).table))?;

        rows.iter().map(|row| record_from_row(kind, row)).collect()
    }
}
