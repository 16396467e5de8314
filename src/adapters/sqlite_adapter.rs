//! SQLite data adapter.
//!
//! Local stand-in for the hosted database. Besides the read side of
//! [`DataPort`] it carries the write paths the CLI needs: schema creation,
//! bulk import, customers with their PICs, projects and their history notes,
//! BD log entries and display names.

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use crate::domain::bd_update::{BdUpdateDraft, BdWeeklyUpdate};
use crate::domain::customer::{attach_pics, Customer, CustomerDraft, CustomerPic, Sector};
use crate::domain::error::SalesTrackError;
use crate::domain::filter::{authorize_project, BdUpdateFilter, ProjectFilter, Viewer};
use crate::domain::format::parse_timestamp;
use crate::domain::profile::Profile;
use crate::domain::project::{NewProject, ProgressType, Project, Prospect};
use crate::domain::project_update::{note_content, ProjectUpdate};
use crate::domain::week::WeekSpec;
use crate::ports::data_port::DataPort;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        email TEXT,
        full_name TEXT,
        display_name TEXT,
        role TEXT NOT NULL DEFAULT 'sales' CHECK (role IN ('admin', 'sales'))
    );
    CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        sector TEXT,
        created_at TEXT
    );
    CREATE TABLE IF NOT EXISTS customer_pics (
        id TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL,
        nama TEXT,
        email TEXT,
        no_hp TEXT,
        jabatan TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_customer_pics_customer ON customer_pics(customer_id);
    CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        created_at TEXT NOT NULL,
        no_quote TEXT NOT NULL,
        project_name TEXT NOT NULL,
        customer_id TEXT NOT NULL,
        value REAL,
        progress_type TEXT,
        prospect TEXT,
        weekly_update TEXT,
        sales_id TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_projects_sales ON projects(sales_id);
    CREATE INDEX IF NOT EXISTS idx_projects_created ON projects(created_at);
    CREATE TABLE IF NOT EXISTS bd_weekly_updates (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        year INTEGER NOT NULL,
        week_number INTEGER NOT NULL CHECK (week_number >= 1),
        customer_id TEXT,
        content TEXT,
        created_at TEXT,
        updated_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_bd_updates_year_week ON bd_weekly_updates(year, week_number);
    CREATE INDEX IF NOT EXISTS idx_bd_updates_user ON bd_weekly_updates(user_id);
    CREATE TABLE IF NOT EXISTS project_updates (
        id TEXT PRIMARY KEY,
        project_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        created_by TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_project_updates_project ON project_updates(project_id);";

const PROJECT_COLUMNS: &str = "
    SELECT p.id, p.created_at, p.no_quote, p.project_name, p.customer_id, c.name,
           p.value, p.progress_type, p.prospect, p.weekly_update, p.sales_id
    FROM projects p LEFT JOIN customers c ON c.id = p.customer_id";

/// Full table contents moved in one `import` call.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub profiles: Vec<Profile>,
    pub customers: Vec<Customer>,
    pub projects: Vec<Project>,
    pub bd_updates: Vec<BdWeeklyUpdate>,
    pub project_updates: Vec<ProjectUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportCounts {
    pub profiles: usize,
    pub customers: usize,
    pub customer_pics: usize,
    pub projects: usize,
    pub bd_updates: usize,
    pub project_updates: usize,
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn open(path: &str, pool_size: u32) -> Result<Self, SalesTrackError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| SalesTrackError::Database {
                reason: e.to_string(),
            })?;
        tracing::debug!(path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    /// Single-connection pool: every in-memory connection is its own database.
    pub fn in_memory() -> Result<Self, SalesTrackError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SalesTrackError::Database {
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, SalesTrackError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| SalesTrackError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), SalesTrackError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_error)?;
        Ok(())
    }

    /// Upserts every row of `batch` in one transaction.
    pub fn import(&self, batch: &ImportBatch) -> Result<ImportCounts, SalesTrackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        let mut counts = ImportCounts::default();

        for p in &batch.profiles {
            tx.execute(
                "INSERT OR REPLACE INTO profiles (id, email, full_name, display_name, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![p.id, p.email, p.full_name, p.display_name, p.role.as_str()],
            )
            .map_err(query_error)?;
            counts.profiles += 1;
        }

        for c in &batch.customers {
            tx.execute(
                "INSERT OR REPLACE INTO customers (id, name, sector, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    c.id,
                    c.name,
                    c.sector.map(|s| s.as_str()),
                    c.created_at.map(timestamp_text)
                ],
            )
            .map_err(query_error)?;
            counts.customers += 1;

            for pic in &c.pics {
                insert_pic_row(&tx, pic, &c.id)?;
                counts.customer_pics += 1;
            }
        }

        for p in &batch.projects {
            insert_project_row(&tx, p)?;
            counts.projects += 1;
        }

        for u in &batch.bd_updates {
            tx.execute(
                "INSERT OR REPLACE INTO bd_weekly_updates
                     (id, user_id, year, week_number, customer_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    u.id,
                    u.user_id,
                    u.year,
                    u.week_number,
                    u.customer_id,
                    u.content,
                    u.created_at.map(timestamp_text),
                    u.updated_at.map(timestamp_text)
                ],
            )
            .map_err(query_error)?;
            counts.bd_updates += 1;
        }

        for n in &batch.project_updates {
            insert_project_update_row(&tx, n)?;
            counts.project_updates += 1;
        }

        tx.commit().map_err(query_error)?;
        tracing::info!(?counts, "import committed");
        Ok(counts)
    }

    /// Inserts a project owned by `sales_id` and returns it as stored.
    pub fn create_project(
        &self,
        sales_id: &str,
        project: &NewProject,
        now: DateTime<Utc>,
    ) -> Result<Project, SalesTrackError> {
        project.validate()?;
        let conn = self.conn()?;
        let customer_name = customer_name(&conn, &project.customer_id)?;

        let stored = Project {
            customer_name: Some(customer_name),
            ..stored_project(new_record_id(), now, sales_id.to_string(), project)
        };
        insert_project_row(&conn, &stored)?;
        tracing::info!(id = %stored.id, sales_id, "project created");
        Ok(stored)
    }

    /// Files a new BD log entry and returns it as stored.
    pub fn create_bd_update(
        &self,
        draft: &BdUpdateDraft,
        now: DateTime<Utc>,
    ) -> Result<BdWeeklyUpdate, SalesTrackError> {
        let conn = self.conn()?;
        let customer_name = customer_name(&conn, &draft.customer_id)?;

        let stored = BdWeeklyUpdate {
            id: new_record_id(),
            user_id: draft.user_id.clone(),
            year: draft.week.year,
            week_number: draft.week.week,
            customer_id: Some(draft.customer_id.clone()),
            customer_name: Some(customer_name),
            content: draft.content.clone(),
            created_at: Some(now),
            updated_at: None,
        };
        conn.execute(
            "INSERT INTO bd_weekly_updates
                 (id, user_id, year, week_number, customer_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
            params![
                stored.id,
                stored.user_id,
                stored.year,
                stored.week_number,
                stored.customer_id,
                stored.content,
                timestamp_text(now)
            ],
        )
        .map_err(query_error)?;
        tracing::info!(id = %stored.id, week = %draft.week, "BD update filed");
        Ok(stored)
    }

    /// Changes the customer and content of an existing entry. Only the
    /// author may edit it.
    pub fn edit_bd_update(
        &self,
        id: &str,
        editor: &Viewer,
        customer_id: &str,
        content: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SalesTrackError> {
        let conn = self.conn()?;
        let existing: Option<(String, i32, u32)> = conn
            .query_row(
                "SELECT user_id, year, week_number FROM bd_weekly_updates WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(query_error)?;

        let Some((owner, year, week_number)) = existing else {
            return Err(SalesTrackError::invalid_record(
                "bd update",
                format!("no entry with id {id}"),
            ));
        };
        if owner != editor.user_id {
            return Err(SalesTrackError::Forbidden {
                reason: format!("BD update {id} belongs to another user"),
            });
        }

        let week = WeekSpec::unchecked(year, week_number);
        let draft = BdUpdateDraft::new(owner, week, customer_id, content)?;
        customer_name(&conn, &draft.customer_id)?;

        conn.execute(
            "UPDATE bd_weekly_updates SET customer_id = ?1, content = ?2, updated_at = ?3
             WHERE id = ?4",
            params![draft.customer_id, draft.content, timestamp_text(now), id],
        )
        .map_err(query_error)?;
        tracing::info!(id, "BD update edited");
        Ok(())
    }

    /// Inserts a customer and its non-blank PICs.
    pub fn create_customer(
        &self,
        draft: &CustomerDraft,
        now: DateTime<Utc>,
    ) -> Result<Customer, SalesTrackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        let customer_id = new_record_id();
        tx.execute(
            "INSERT INTO customers (id, name, sector, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                customer_id,
                draft.name,
                draft.sector.map(|s| s.as_str()),
                timestamp_text(now)
            ],
        )
        .map_err(query_error)?;

        let mut pics = Vec::new();
        for pic in draft.pics.iter().filter(|p| !p.is_blank()) {
            let pic = pic.clone().into_pic(new_record_id(), &customer_id);
            insert_pic_row(&tx, &pic, &customer_id)?;
            pics.push(pic);
        }
        tx.commit().map_err(query_error)?;

        tracing::info!(id = %customer_id, pics = pics.len(), "customer created");
        Ok(Customer {
            id: customer_id,
            name: draft.name.clone(),
            sector: draft.sector,
            created_at: Some(now),
            pics,
        })
    }

    /// Replaces a customer's name, sector and PIC list.
    ///
    /// Existing PICs missing from the draft are deleted, PICs with an id are
    /// updated in place and the rest are inserted. A PIC id that belongs to
    /// another customer is rejected.
    pub fn update_customer(&self, id: &str, draft: &CustomerDraft) -> Result<(), SalesTrackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        let changed = tx
            .execute(
                "UPDATE customers SET name = ?1, sector = ?2 WHERE id = ?3",
                params![draft.name, draft.sector.map(|s| s.as_str()), id],
            )
            .map_err(query_error)?;
        if changed == 0 {
            return Err(unknown_customer(id));
        }

        let existing: Vec<String> = {
            let mut stmt = tx
                .prepare("SELECT id FROM customer_pics WHERE customer_id = ?1")
                .map_err(query_error)?;
            let ids = stmt
                .query_map(params![id], |row| row.get(0))
                .map_err(query_error)?
                .collect::<Result<Vec<String>, _>>()
                .map_err(query_error)?;
            ids
        };
        let kept: Vec<&str> = draft.pics.iter().filter_map(|p| p.id.as_deref()).collect();
        let mut removed = 0;
        for stale in existing.iter().filter(|e| !kept.contains(&e.as_str())) {
            tx.execute("DELETE FROM customer_pics WHERE id = ?1", params![stale])
                .map_err(query_error)?;
            removed += 1;
        }

        for pic in draft.pics.iter().filter(|p| !p.is_blank()) {
            match pic.id.as_deref() {
                Some(pic_id) => {
                    let updated = tx
                        .execute(
                            "UPDATE customer_pics SET nama = ?1, email = ?2, no_hp = ?3, jabatan = ?4
                             WHERE id = ?5 AND customer_id = ?6",
                            params![pic.name, pic.email, pic.phone, pic.position, pic_id, id],
                        )
                        .map_err(query_error)?;
                    if updated == 0 {
                        return Err(SalesTrackError::invalid_record(
                            "customer pic",
                            format!("no PIC {pic_id} on customer {id}"),
                        ));
                    }
                }
                None => {
                    let row = pic.clone().into_pic(new_record_id(), id);
                    insert_pic_row(&tx, &row, id)?;
                }
            }
        }
        tx.commit().map_err(query_error)?;
        tracing::info!(id, removed, "customer updated");
        Ok(())
    }

    /// Deletes a customer and its PICs. BD updates that named it keep their
    /// text and lose the customer link. Customers with projects are kept.
    pub fn delete_customer(&self, id: &str) -> Result<(), SalesTrackError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        let projects: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM projects WHERE customer_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(query_error)?;
        if projects > 0 {
            return Err(SalesTrackError::invalid_record(
                "customer",
                format!("customer {id} still has {projects} project(s)"),
            ));
        }

        let deleted = tx
            .execute("DELETE FROM customers WHERE id = ?1", params![id])
            .map_err(query_error)?;
        if deleted == 0 {
            return Err(unknown_customer(id));
        }
        tx.execute("DELETE FROM customer_pics WHERE customer_id = ?1", params![id])
            .map_err(query_error)?;
        tx.execute(
            "UPDATE bd_weekly_updates SET customer_id = NULL WHERE customer_id = ?1",
            params![id],
        )
        .map_err(query_error)?;
        tx.commit().map_err(query_error)?;
        tracing::info!(id, "customer deleted");
        Ok(())
    }

    /// Rewrites the editable fields of a project. The owner and admins may
    /// edit; creation time and owner stay as they were.
    pub fn edit_project(
        &self,
        id: &str,
        editor: &Viewer,
        project: &NewProject,
    ) -> Result<Project, SalesTrackError> {
        project.validate()?;
        let existing = self
            .find_project(id)?
            .ok_or_else(|| SalesTrackError::invalid_record("project", format!("no project with id {id}")))?;
        authorize_project(editor, &existing)?;

        let conn = self.conn()?;
        let customer_name = customer_name(&conn, &project.customer_id)?;
        let stored = Project {
            customer_name: Some(customer_name),
            ..stored_project(existing.id, existing.created_at, existing.sales_id, project)
        };
        insert_project_row(&conn, &stored)?;
        tracing::info!(id, editor = %editor.user_id, "project edited");
        Ok(stored)
    }

    /// Sets or clears (blank input) a profile's display name.
    pub fn set_display_name(
        &self,
        user_id: &str,
        display_name: Option<&str>,
    ) -> Result<(), SalesTrackError> {
        let value = display_name.map(str::trim).filter(|d| !d.is_empty());
        let changed = self
            .conn()?
            .execute(
                "UPDATE profiles SET display_name = ?1 WHERE id = ?2",
                params![value, user_id],
            )
            .map_err(query_error)?;
        if changed == 0 {
            return Err(SalesTrackError::UnknownUser {
                user_id: user_id.to_string(),
            });
        }
        tracing::info!(user_id, cleared = value.is_none(), "display name set");
        Ok(())
    }

    /// Appends a history note to a project the author can see.
    pub fn add_project_update(
        &self,
        project_id: &str,
        author: &Viewer,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<ProjectUpdate, SalesTrackError> {
        let content = note_content(content)?;
        let project = self.find_project(project_id)?.ok_or_else(|| {
            SalesTrackError::invalid_record("project", format!("no project with id {project_id}"))
        })?;
        authorize_project(author, &project)?;

        let note = ProjectUpdate {
            id: new_record_id(),
            project_id: project.id,
            content,
            created_at: now,
            created_by: Some(author.user_id.clone()),
        };
        insert_project_update_row(&*self.conn()?, &note)?;
        tracing::info!(id = %note.id, project_id, "project update added");
        Ok(note)
    }
}

impl DataPort for SqliteAdapter {
    fn list_profiles(&self) -> Result<Vec<Profile>, SalesTrackError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, email, full_name, display_name, role FROM profiles ORDER BY id")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(query_error)?;

        let mut profiles = Vec::new();
        for row in rows {
            let (id, email, full_name, display_name, role) = row.map_err(query_error)?;
            profiles.push(Profile {
                id,
                email,
                full_name,
                display_name,
                role: role.parse()?,
            });
        }
        Ok(profiles)
    }

    fn list_customers(&self) -> Result<Vec<Customer>, SalesTrackError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, name, sector, created_at FROM customers
                 ORDER BY name COLLATE NOCASE",
            )
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    sector: row
                        .get::<_, Option<String>>(2)?
                        .as_deref()
                        .and_then(Sector::from_stored),
                    created_at: optional_timestamp_column(row, 3)?,
                    pics: Vec::new(),
                })
            })
            .map_err(query_error)?;
        let mut customers = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, customer_id, nama, email, no_hp, jabatan FROM customer_pics
                 ORDER BY rowid",
            )
            .map_err(query_error)?;
        let pics = stmt
            .query_map([], |row| {
                Ok(CustomerPic {
                    id: row.get(0)?,
                    customer_id: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                    phone: row.get(4)?,
                    position: row.get(5)?,
                })
            })
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;

        attach_pics(&mut customers, pics);
        Ok(customers)
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, SalesTrackError> {
        let mut sql = format!("{PROJECT_COLUMNS} WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();
        if let Some(t) = filter.progress_type {
            sql.push_str(" AND p.progress_type = ?");
            values.push(Value::Text(t.as_str().to_string()));
        }
        if let Some(p) = filter.prospect {
            sql.push_str(" AND p.prospect = ?");
            values.push(Value::Text(p.as_str().to_string()));
        }
        if let Some(ref sales_id) = filter.sales_id {
            sql.push_str(" AND p.sales_id = ?");
            values.push(Value::Text(sales_id.clone()));
        }
        sql.push_str(" ORDER BY p.created_at DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let projects = stmt
            .query_map(params_from_iter(values.iter()), project_row)
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;

        tracing::debug!(count = projects.len(), ?filter, "projects fetched");
        Ok(projects)
    }

    fn find_project(&self, project_id: &str) -> Result<Option<Project>, SalesTrackError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("{PROJECT_COLUMNS} WHERE p.id = ?1"),
            params![project_id],
            project_row,
        )
        .optional()
        .map_err(query_error)
    }

    fn list_bd_updates(
        &self,
        filter: &BdUpdateFilter,
    ) -> Result<Vec<BdWeeklyUpdate>, SalesTrackError> {
        let mut sql = String::from(
            "SELECT u.id, u.user_id, u.year, u.week_number, u.customer_id, c.name,
                    u.content, u.created_at, u.updated_at
             FROM bd_weekly_updates u LEFT JOIN customers c ON c.id = u.customer_id
             WHERE u.year = ?",
        );
        let mut values: Vec<Value> = vec![Value::Integer(i64::from(filter.year))];
        if let Some(from) = filter.week_from {
            sql.push_str(" AND u.week_number >= ?");
            values.push(Value::Integer(i64::from(from)));
        }
        if let Some(to) = filter.week_to {
            sql.push_str(" AND u.week_number <= ?");
            values.push(Value::Integer(i64::from(to)));
        }
        if let Some(ref sales_id) = filter.sales_id {
            sql.push_str(" AND u.user_id = ?");
            values.push(Value::Text(sales_id.clone()));
        }
        if let Some(ref customer_id) = filter.customer_id {
            sql.push_str(" AND u.customer_id = ?");
            values.push(Value::Text(customer_id.clone()));
        }
        sql.push_str(" ORDER BY u.week_number DESC, u.rowid");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql).map_err(query_error)?;
        let updates = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(BdWeeklyUpdate {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    year: row.get(2)?,
                    week_number: row.get(3)?,
                    customer_id: row.get(4)?,
                    customer_name: row.get(5)?,
                    content: row.get(6)?,
                    created_at: optional_timestamp_column(row, 7)?,
                    updated_at: optional_timestamp_column(row, 8)?,
                })
            })
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;

        tracing::debug!(count = updates.len(), ?filter, "BD updates fetched");
        Ok(updates)
    }

    fn list_project_updates(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectUpdate>, SalesTrackError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, project_id, content, created_at, created_by FROM project_updates
                 WHERE project_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(query_error)?;
        let updates = stmt
            .query_map(params![project_id], |row| {
                Ok(ProjectUpdate {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    content: row.get(2)?,
                    created_at: timestamp_column(row, 3)?,
                    created_by: row.get(4)?,
                })
            })
            .map_err(query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)?;
        Ok(updates)
    }
}

fn query_error(e: rusqlite::Error) -> SalesTrackError {
    SalesTrackError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn insert_project_row(conn: &rusqlite::Connection, p: &Project) -> Result<(), SalesTrackError> {
    conn.execute(
        "INSERT OR REPLACE INTO projects
             (id, created_at, no_quote, project_name, customer_id, value,
              progress_type, prospect, weekly_update, sales_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            p.id,
            timestamp_text(p.created_at),
            p.no_quote,
            p.project_name,
            p.customer_id,
            p.value,
            p.progress_type.map(|t| t.as_str()),
            p.prospect.map(|t| t.as_str()),
            p.weekly_update,
            p.sales_id
        ],
    )
    .map_err(query_error)?;
    Ok(())
}

fn project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        created_at: timestamp_column(row, 1)?,
        no_quote: row.get(2)?,
        project_name: row.get(3)?,
        customer_id: row.get(4)?,
        customer_name: row.get(5)?,
        value: row.get(6)?,
        progress_type: row
            .get::<_, Option<String>>(7)?
            .as_deref()
            .and_then(ProgressType::from_stored),
        prospect: row
            .get::<_, Option<String>>(8)?
            .as_deref()
            .and_then(Prospect::from_stored),
        weekly_update: row.get(9)?,
        sales_id: row.get(10)?,
    })
}

/// Project row as written from form input: text trimmed, blank weekly
/// update stored as NULL. The customer name is left for the caller.
fn stored_project(
    id: String,
    created_at: DateTime<Utc>,
    sales_id: String,
    project: &NewProject,
) -> Project {
    Project {
        id,
        created_at,
        no_quote: project.no_quote.trim().to_string(),
        project_name: project.project_name.trim().to_string(),
        customer_id: project.customer_id.clone(),
        customer_name: None,
        value: Some(project.value),
        progress_type: Some(project.progress_type),
        prospect: Some(project.prospect),
        weekly_update: project
            .weekly_update
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string),
        sales_id,
    }
}

fn insert_pic_row(
    conn: &rusqlite::Connection,
    pic: &CustomerPic,
    customer_id: &str,
) -> Result<(), SalesTrackError> {
    conn.execute(
        "INSERT OR REPLACE INTO customer_pics (id, customer_id, nama, email, no_hp, jabatan)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![pic.id, customer_id, pic.name, pic.email, pic.phone, pic.position],
    )
    .map_err(query_error)?;
    Ok(())
}

fn insert_project_update_row(
    conn: &rusqlite::Connection,
    note: &ProjectUpdate,
) -> Result<(), SalesTrackError> {
    conn.execute(
        "INSERT OR REPLACE INTO project_updates (id, project_id, content, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            note.id,
            note.project_id,
            note.content,
            timestamp_text(note.created_at),
            note.created_by
        ],
    )
    .map_err(query_error)?;
    Ok(())
}

fn unknown_customer(id: &str) -> SalesTrackError {
    SalesTrackError::invalid_record("customer", format!("no customer with id {id}"))
}

/// Name of an existing customer; unknown ids are rejected.
fn customer_name(conn: &rusqlite::Connection, customer_id: &str) -> Result<String, SalesTrackError> {
    conn.query_row(
        "SELECT name FROM customers WHERE id = ?1",
        params![customer_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(query_error)?
    .ok_or_else(|| unknown_customer(customer_id))
}

/// RFC 3339 in UTC, which also sorts chronologically as text.
fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("bad timestamp {raw:?}").into(),
        )
    })
}

fn optional_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(_) => timestamp_column(row, idx).map(Some),
    }
}

fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
