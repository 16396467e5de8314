//! PostgreSQL data adapter.
//!
//! Reads the hosted tables in the `public` schema directly. Read-only: the
//! hosted application owns writes.

use chrono::{DateTime, Utc};
use postgres::types::ToSql;
use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;

use crate::domain::bd_update::BdWeeklyUpdate;
use crate::domain::config_validation::pool_size;
use crate::domain::customer::{attach_pics, Customer, CustomerPic, Sector};
use crate::domain::error::SalesTrackError;
use crate::domain::filter::{BdUpdateFilter, ProjectFilter};
use crate::domain::profile::Profile;
use crate::domain::project::{ProgressType, Project, Prospect};
use crate::domain::project_update::ProjectUpdate;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

type Manager = PostgresConnectionManager<NoTls>;

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SalesTrackError> {
        let connection_string = config.require_string("postgres", "connection_string")?;
        let pool_size = pool_size(config, "postgres")?;
        Self::connect(&connection_string, pool_size)
    }

    pub fn connect(connection_string: &str, pool_size: u32) -> Result<Self, SalesTrackError> {
        let pg_config = connection_string
            .parse::<postgres::Config>()
            .map_err(|e| SalesTrackError::ConfigInvalid {
                section: "postgres".into(),
                key: "connection_string".into(),
                reason: e.to_string(),
            })?;
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| SalesTrackError::Database {
                reason: e.to_string(),
            })?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, SalesTrackError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| SalesTrackError::Database {
                reason: e.to_string(),
            })
    }
}

fn query_error(e: postgres::Error) -> SalesTrackError {
    SalesTrackError::DatabaseQuery {
        reason: e.to_string(),
    }
}

/// Week bounds as the `integer` column type. `None` when no stored week can
/// match; a lower bound past `i32::MAX` excludes every row and an upper
/// bound past it excludes none.
fn week_bounds(filter: &BdUpdateFilter) -> Option<(Option<i32>, Option<i32>)> {
    let from = match filter.week_from {
        Some(w) => Some(i32::try_from(w).ok()?),
        None => None,
    };
    let to = filter.week_to.and_then(|w| i32::try_from(w).ok());
    Some((from, to))
}

/// Appends `AND {column} {op} $n` and records the parameter.
fn push_condition<'a>(
    sql: &mut String,
    params: &mut Vec<&'a (dyn ToSql + Sync)>,
    column: &str,
    op: &str,
    value: &'a (dyn ToSql + Sync),
) {
    params.push(value);
    sql.push_str(&format!(" AND {column} {op} ${}", params.len()));
}

impl DataPort for PostgresAdapter {
    fn list_profiles(&self) -> Result<Vec<Profile>, SalesTrackError> {
        let rows = self
            .conn()?
            .query(
                "SELECT id::text, email, full_name, display_name, role::text
                 FROM public.profiles ORDER BY id",
                &[],
            )
            .map_err(query_error)?;

        rows.into_iter()
            .map(|row| {
                let role: String = row.get(4);
                Ok(Profile {
                    id: row.get(0),
                    email: row.get(1),
                    full_name: row.get(2),
                    display_name: row.get(3),
                    role: role.parse()?,
                })
            })
            .collect()
    }

    fn list_customers(&self) -> Result<Vec<Customer>, SalesTrackError> {
        let mut conn = self.conn()?;
        let customer_rows = conn
            .query(
                "SELECT id::text, name, sector::text, created_at
                 FROM public.customers ORDER BY lower(name)",
                &[],
            )
            .map_err(query_error)?;
        let mut customers: Vec<Customer> = customer_rows
            .into_iter()
            .map(|row| Customer {
                id: row.get(0),
                name: row.get(1),
                sector: row
                    .get::<_, Option<String>>(2)
                    .as_deref()
                    .and_then(Sector::from_stored),
                created_at: row.get::<_, Option<DateTime<Utc>>>(3),
                pics: Vec::new(),
            })
            .collect();

        let pic_rows = conn
            .query(
                "SELECT id::text, customer_id::text, nama, email, no_hp, jabatan
                 FROM public.customer_pics ORDER BY id",
                &[],
            )
            .map_err(query_error)?;
        let pics = pic_rows
            .into_iter()
            .map(|row| CustomerPic {
                id: row.get(0),
                customer_id: row.get(1),
                name: row.get(2),
                email: row.get(3),
                phone: row.get(4),
                position: row.get(5),
            })
            .collect();

        attach_pics(&mut customers, pics);
        Ok(customers)
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, SalesTrackError> {
        let progress_type = filter.progress_type.map(|t| t.as_str());
        let prospect = filter.prospect.map(|p| p.as_str());

        let mut sql = String::from(
            "SELECT p.id::text, p.created_at, p.no_quote, p.project_name,
                    p.customer_id::text, c.name, p.value::double precision,
                    p.progress_type::text, p.prospect::text, p.weekly_update, p.sales_id::text
             FROM public.projects p
             LEFT JOIN public.customers c ON c.id = p.customer_id
             WHERE TRUE",
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        if let Some(ref t) = progress_type {
            push_condition(&mut sql, &mut params, "p.progress_type::text", "=", t);
        }
        if let Some(ref p) = prospect {
            push_condition(&mut sql, &mut params, "p.prospect::text", "=", p);
        }
        if let Some(ref sales_id) = filter.sales_id {
            push_condition(&mut sql, &mut params, "p.sales_id::text", "=", sales_id);
        }
        sql.push_str(" ORDER BY p.created_at DESC");

        let rows = self
            .conn()?
            .query(sql.as_str(), &params)
            .map_err(query_error)?;

        let projects: Vec<Project> = rows
            .into_iter()
            .map(|row| Project {
                id: row.get(0),
                created_at: row.get(1),
                no_quote: row.get(2),
                project_name: row.get(3),
                customer_id: row.get(4),
                customer_name: row.get(5),
                value: row.get(6),
                progress_type: row
                    .get::<_, Option<String>>(7)
                    .as_deref()
                    .and_then(ProgressType::from_stored),
                prospect: row
                    .get::<_, Option<String>>(8)
                    .as_deref()
                    .and_then(Prospect::from_stored),
                weekly_update: row.get(9),
                sales_id: row.get(10),
            })
            .collect();

        tracing::debug!(count = projects.len(), ?filter, "projects fetched");
        Ok(projects)
    }

    fn list_bd_updates(
        &self,
        filter: &BdUpdateFilter,
    ) -> Result<Vec<BdWeeklyUpdate>, SalesTrackError> {
        let Some((week_from, week_to)) = week_bounds(filter) else {
            tracing::debug!(?filter, "week range starts past any stored week");
            return Ok(Vec::new());
        };

        let mut sql = String::from(
            "SELECT u.id::text, u.user_id::text, u.year, u.week_number,
                    u.customer_id::text, c.name, u.content, u.created_at, u.updated_at
             FROM public.bd_weekly_updates u
             LEFT JOIN public.customers c ON c.id = u.customer_id
             WHERE TRUE",
        );
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        push_condition(&mut sql, &mut params, "u.year", "=", &filter.year);
        if let Some(ref from) = week_from {
            push_condition(&mut sql, &mut params, "u.week_number", ">=", from);
        }
        if let Some(ref to) = week_to {
            push_condition(&mut sql, &mut params, "u.week_number", "<=", to);
        }
        if let Some(ref sales_id) = filter.sales_id {
            push_condition(&mut sql, &mut params, "u.user_id::text", "=", sales_id);
        }
        if let Some(ref customer_id) = filter.customer_id {
            push_condition(&mut sql, &mut params, "u.customer_id::text", "=", customer_id);
        }
        sql.push_str(" ORDER BY u.week_number DESC, u.created_at");

        let rows = self
            .conn()?
            .query(sql.as_str(), &params)
            .map_err(query_error)?;

        let updates = rows
            .into_iter()
            .map(|row| {
                let week_number: i32 = row.get(3);
                let week_number = u32::try_from(week_number).map_err(|_| {
                    SalesTrackError::invalid_record(
                        "bd_weekly_updates",
                        format!("negative week number {week_number}"),
                    )
                })?;
                Ok(BdWeeklyUpdate {
                    id: row.get(0),
                    user_id: row.get(1),
                    year: row.get(2),
                    week_number,
                    customer_id: row.get(4),
                    customer_name: row.get(5),
                    content: row.get(6),
                    created_at: row.get(7),
                    updated_at: row.get(8),
                })
            })
            .collect::<Result<Vec<_>, SalesTrackError>>()?;

        tracing::debug!(count = updates.len(), ?filter, "BD updates fetched");
        Ok(updates)
    }

    fn list_project_updates(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectUpdate>, SalesTrackError> {
        let rows = self
            .conn()?
            .query(
                "SELECT id::text, project_id::text, content, created_at, created_by::text
                 FROM public.project_updates
                 WHERE project_id::text = $1
                 ORDER BY created_at DESC",
                &[&project_id],
            )
            .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|row| ProjectUpdate {
                id: row.get(0),
                project_id: row.get(1),
                content: row.get(2),
                created_at: row.get(3),
                created_by: row.get(4),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_connection_string() {
        match PostgresAdapter::from_config(&EmptyConfig) {
            Err(SalesTrackError::ConfigMissing { section, key }) => {
                assert_eq!(section, "postgres");
                assert_eq!(key, "connection_string");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn malformed_connection_string_is_config_error() {
        let result = PostgresAdapter::connect("host=localhost port=notaport", 1);
        assert!(matches!(result, Err(SalesTrackError::ConfigInvalid { .. })));
    }

    struct PoolSizeConfig(i64);

    impl ConfigPort for PoolSizeConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            Some("host=localhost user=sales".into())
        }
        fn get_int(&self, _section: &str, _key: &str, _default: i64) -> i64 {
            self.0
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn oversized_pool_size_is_rejected_not_truncated() {
        for size in [4_294_967_296, 0, -3] {
            match PostgresAdapter::from_config(&PoolSizeConfig(size)) {
                Err(SalesTrackError::ConfigInvalid { key, .. }) => assert_eq!(key, "pool_size"),
                Err(other) => panic!("expected ConfigInvalid, got: {other}"),
                Ok(_) => panic!("pool size {size} accepted"),
            }
        }
    }

    #[test]
    fn week_bounds_never_wrap() {
        let mut filter = BdUpdateFilter::for_year(2026);
        assert_eq!(week_bounds(&filter), Some((None, None)));

        filter.week_from = Some(4_294_967_295);
        assert_eq!(week_bounds(&filter), None);

        filter.week_from = Some(3);
        filter.week_to = Some(u32::MAX);
        assert_eq!(week_bounds(&filter), Some((Some(3), None)));

        filter.week_to = Some(2_147_483_647);
        assert_eq!(week_bounds(&filter), Some((Some(3), Some(i32::MAX))));
    }

    #[test]
    fn push_condition_numbers_placeholders() {
        let mut sql = String::from("WHERE TRUE");
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let year = 2026i32;
        let user = "u1".to_string();
        push_condition(&mut sql, &mut params, "year", "=", &year);
        push_condition(&mut sql, &mut params, "user_id", "=", &user);
        assert_eq!(sql, "WHERE TRUE AND year = $1 AND user_id = $2");
        assert_eq!(params.len(), 2);
    }
}
