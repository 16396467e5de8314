//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Settings resolution from real INI files on disk
//! - Viewer resolution and role scoping
//! - Metrics, BD update listing, project history and export through
//!   MockDataPort
//! - The csv backend opened through `open_data_port`

mod common;

use common::*;
use salestrack::adapters::csv_export_adapter::CsvExportAdapter;
use salestrack::cli::{self, BdFilterArgs, ProjectFilterArgs};
use salestrack::domain::error::SalesTrackError;
use salestrack::domain::export::ExportKind;
use salestrack::domain::filter::Viewer;
use salestrack::domain::profile::SalesDirectory;
use salestrack::domain::settings::{Backend, Settings};
use salestrack::ports::export_port::ExportPort;
use std::io::Write;
use std::path::PathBuf;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const CSV_INI: &str = r#"
[reporting]
year = 2026
strict_weeks = true

[data]
backend = csv

[csv]
dir = /var/lib/salestrack/data

[export]
dir = /tmp/salestrack-exports
"#;

fn settings_2026(strict_weeks: bool) -> Settings {
    Settings {
        reporting_year: 2026,
        strict_weeks,
        backend: Backend::Csv {
            dir: PathBuf::from("unused"),
        },
        export_dir: PathBuf::from("."),
    }
}

fn sales(user_id: &str) -> Viewer {
    Viewer {
        user_id: user_id.to_string(),
        role: UserRole::Sales,
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn load_settings_from_ini() {
        let file = write_temp_ini(CSV_INI);
        let (_, settings) = cli::load_settings(file.path()).unwrap();
        assert_eq!(settings.reporting_year, 2026);
        assert!(settings.strict_weeks);
        assert_eq!(
            settings.backend,
            Backend::Csv {
                dir: PathBuf::from("/var/lib/salestrack/data")
            }
        );
        assert_eq!(settings.export_dir, PathBuf::from("/tmp/salestrack-exports"));
    }

    #[test]
    fn missing_config_file_is_parse_error() {
        let err = cli::load_settings(std::path::Path::new("/nonexistent/salestrack.ini"))
            .unwrap_err();
        assert!(matches!(err, SalesTrackError::ConfigParse { .. }));
    }

    #[test]
    fn csv_backend_without_dir_is_missing() {
        let file = write_temp_ini("[data]\nbackend = csv\n");
        match cli::load_settings(file.path()) {
            Err(SalesTrackError::ConfigMissing { section, key }) => {
                assert_eq!(section, "csv");
                assert_eq!(key, "dir");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn out_of_range_year_is_invalid() {
        let file = write_temp_ini("[reporting]\nyear = 99999\n[csv]\ndir = data\n");
        let err = cli::load_settings(file.path()).unwrap_err();
        assert!(matches!(err, SalesTrackError::ConfigInvalid { .. }));
    }

    #[test]
    fn pool_size_past_u32_is_invalid() {
        let file = write_temp_ini(
            "[data]\nbackend = sqlite\n[sqlite]\npath = sales.db\npool_size = 4294967297\n",
        );
        match cli::load_settings(file.path()) {
            Err(SalesTrackError::ConfigInvalid { key, .. }) => assert_eq!(key, "pool_size"),
            Err(other) => panic!("expected ConfigInvalid, got: {other}"),
            Ok((_, settings)) => panic!("accepted {:?}", settings.backend),
        }
    }

    #[test]
    fn summary_mentions_week_count() {
        let file = write_temp_ini(CSV_INI);
        let (_, settings) = cli::load_settings(file.path()).unwrap();
        let lines = cli::settings_summary(&settings);
        assert_eq!(lines[0], "reporting year: 2026 (53 weeks)");
        assert!(lines[2].starts_with("backend:        csv ("));
    }
}

mod viewer_resolution {
    use super::*;

    #[test]
    fn no_user_is_operator() {
        let port = seeded_port();
        let viewer = cli::resolve_viewer(&port, None).unwrap();
        assert!(viewer.is_admin());
    }

    #[test]
    fn known_user_takes_profile_role() {
        let port = seeded_port();
        let viewer = cli::resolve_viewer(&port, Some("u1")).unwrap();
        assert_eq!(viewer.user_id, "u1");
        assert_eq!(viewer.role, UserRole::Sales);
    }

    #[test]
    fn unknown_user_is_rejected() {
        let port = seeded_port();
        match cli::resolve_viewer(&port, Some("ghost")) {
            Err(SalesTrackError::UnknownUser { user_id }) => assert_eq!(user_id, "ghost"),
            other => panic!("expected UnknownUser, got: {other:?}"),
        }
    }

    #[test]
    fn port_failure_propagates() {
        let port = MockDataPort::new().with_error("connection refused");
        let err = cli::resolve_viewer(&port, Some("u1")).unwrap_err();
        assert!(matches!(err, SalesTrackError::Database { .. }));
    }
}

mod metrics_pipeline {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn admin_sees_every_project() {
        let port = seeded_port();
        let filter =
            cli::build_project_filter(&ProjectFilterArgs::default(), &Viewer::operator()).unwrap();
        let m = cli::compute_metrics(&port, &filter).unwrap();

        assert_eq!(m.total_count, 4);
        assert_relative_eq!(m.total_value, 15_000.0);
        assert_relative_eq!(m.total_value_excluding_lose, 13_000.0);
        assert_relative_eq!(m.total_value_win, 1_000.0);
        assert_relative_eq!(m.total_value_hot_leads_excluding_lose, 9_000.0);
        assert_eq!(m.hot_prospect_count, 3);
        assert_eq!(m.hot_prospect_win_ratio, Some(33));
    }

    #[test]
    fn sales_user_is_scoped_to_own_projects() {
        let port = seeded_port();
        let args = ProjectFilterArgs {
            sales_id: Some("u2".into()),
            ..Default::default()
        };
        let filter = cli::build_project_filter(&args, &sales("u1")).unwrap();
        assert_eq!(filter.sales_id.as_deref(), Some("u1"));

        let m = cli::compute_metrics(&port, &filter).unwrap();
        assert_eq!(m.total_count, 2);
        assert_eq!(m.win_count, 1);
        assert_eq!(m.lose_count, 1);
        assert_eq!(m.hot_prospect_win_ratio, Some(50));
    }

    #[test]
    fn progress_filter_is_passed_to_port() {
        let port = seeded_port();
        let args = ProjectFilterArgs {
            progress_type: Some("Tender".into()),
            ..Default::default()
        };
        let filter = cli::build_project_filter(&args, &Viewer::operator()).unwrap();
        let m = cli::compute_metrics(&port, &filter).unwrap();
        assert_eq!(m.total_count, 1);
        assert_eq!(m.tender_count, 1);
        assert_eq!(port.project_filters.borrow().len(), 1);
    }

    #[test]
    fn project_line_shows_owner_name() {
        let port = seeded_port();
        let directory = SalesDirectory::from_profiles(&port.profiles);
        let project = make_project("p1", "u1", 1_000.0, ProgressType::Win, Prospect::HotProspect);
        assert_eq!(
            cli::project_line(&project, &directory),
            "01 Feb 2026 | Q-p1 | Project p1 | PT Sinar | Rp 1.000 | Win | Hot Prospect | Andi"
        );
    }

    #[test]
    fn empty_result_has_no_win_rate() {
        let port = MockDataPort::new();
        let filter =
            cli::build_project_filter(&ProjectFilterArgs::default(), &Viewer::operator()).unwrap();
        let m = cli::compute_metrics(&port, &filter).unwrap();
        assert_eq!(m.total_count, 0);
        assert_eq!(m.hot_prospect_win_ratio, None);
        let lines = cli::metrics_lines(&m);
        assert!(lines.last().unwrap().ends_with('—'));
    }
}

mod project_history {
    use super::*;

    #[test]
    fn owner_sees_notes_newest_first() {
        let port = seeded_port();
        let (project, notes) = cli::fetch_project_history(&port, &sales("u1"), "p1").unwrap();
        assert_eq!(project.id, "p1");
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n1"]);

        let directory = SalesDirectory::from_profiles(&port.profiles);
        let lines = cli::project_update_lines(&notes, &directory);
        assert_eq!(lines[0], "  09 Mar 2026, 09:00 | — | note n2");
        assert_eq!(lines[1], "  03 Mar 2026, 09:00 | Andi | note n1");
    }

    #[test]
    fn other_sales_user_is_forbidden() {
        let port = seeded_port();
        let err = cli::fetch_project_history(&port, &sales("u2"), "p1").unwrap_err();
        assert!(matches!(err, SalesTrackError::Forbidden { .. }));
        assert!(cli::fetch_project_history(&port, &Viewer::operator(), "p1").is_ok());
    }

    #[test]
    fn unknown_project_is_invalid_record() {
        let port = seeded_port();
        let err = cli::fetch_project_history(&port, &Viewer::operator(), "p9").unwrap_err();
        assert!(matches!(err, SalesTrackError::InvalidRecord { .. }));
    }

    #[test]
    fn project_without_notes_shows_placeholder() {
        let port = seeded_port();
        let (_, notes) = cli::fetch_project_history(&port, &sales("u2"), "p3").unwrap();
        let directory = SalesDirectory::from_profiles(&port.profiles);
        assert_eq!(cli::project_update_lines(&notes, &directory), vec!["  —"]);
    }
}

mod bd_updates {
    use super::*;

    #[test]
    fn sales_user_cannot_monitor() {
        let port = seeded_port();
        let err = cli::fetch_bd_updates(
            &port,
            &settings_2026(true),
            &sales("u1"),
            &BdFilterArgs::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, SalesTrackError::Forbidden { .. }));
        assert!(port.bd_filters.borrow().is_empty());
    }

    #[test]
    fn mine_lists_own_entries_for_reporting_year() {
        let port = seeded_port();
        let updates = cli::fetch_bd_updates(
            &port,
            &settings_2026(true),
            &sales("u1"),
            &BdFilterArgs::default(),
            true,
        )
        .unwrap();
        let ids: Vec<&str> = updates.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["b1"]);
    }

    #[test]
    fn admin_monitoring_sees_all_users() {
        let port = seeded_port();
        let updates = cli::fetch_bd_updates(
            &port,
            &settings_2026(true),
            &Viewer::operator(),
            &BdFilterArgs::default(),
            false,
        )
        .unwrap();
        let ids: Vec<&str> = updates.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b1"]);
    }

    #[test]
    fn week_bounds_narrow_results() {
        let port = seeded_port();
        let args = BdFilterArgs {
            week_from: Some("11".into()),
            ..Default::default()
        };
        let updates = cli::fetch_bd_updates(
            &port,
            &settings_2026(true),
            &Viewer::operator(),
            &args,
            false,
        )
        .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].week_number, 12);
    }

    #[test]
    fn strict_weeks_rejects_out_of_year_bound() {
        let port = seeded_port();
        let args = BdFilterArgs {
            week_to: Some("54".into()),
            ..Default::default()
        };
        match cli::fetch_bd_updates(&port, &settings_2026(true), &Viewer::operator(), &args, false)
        {
            Err(SalesTrackError::InvalidWeek { year, week, max }) => {
                assert_eq!((year, week, max), (2026, 54, 53));
            }
            other => panic!("expected InvalidWeek, got: {other:?}"),
        }
    }

    #[test]
    fn lenient_weeks_accepts_out_of_year_bound() {
        let port = seeded_port();
        let args = BdFilterArgs {
            week_to: Some("54".into()),
            ..Default::default()
        };
        let updates =
            cli::fetch_bd_updates(&port, &settings_2026(false), &Viewer::operator(), &args, false)
                .unwrap();
        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn all_weeks_lists_empty_weeks_too() {
        let updates = vec![make_bd_update("b1", "u1", 2026, 10)];
        let directory =
            SalesDirectory::from_profiles(&[make_profile("u1", "Andi", UserRole::Sales)]);

        let lines = cli::bd_update_lines(&updates, &directory, 2026, true);
        // 53 labels, 52 placeholders, one entry
        assert_eq!(lines.len(), 106);
        let at = lines
            .iter()
            .position(|l| l == "Week 10 (2 - 6 Mar)")
            .unwrap();
        assert!(lines[at + 1].contains("Andi"));
        assert!(lines[at + 1].contains("update b1"));
    }

    #[test]
    fn grouped_lines_skip_empty_weeks() {
        let updates = vec![
            make_bd_update("b2", "u2", 2026, 12),
            make_bd_update("b1", "u1", 2026, 10),
        ];
        let directory = SalesDirectory::from_profiles(&[]);
        let lines = cli::bd_update_lines(&updates, &directory, 2026, false);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Week 12 "));
        assert!(lines[2].starts_with("Week 10 "));
    }
}

mod export {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn project_export_for_sales_user_is_scoped() {
        let port = seeded_port();
        let table = cli::build_export_table(
            &port,
            &settings_2026(true),
            &sales("u2"),
            ExportKind::Projects,
        )
        .unwrap();
        assert_eq!(table.rows.len(), 2);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.csv");
        CsvExportAdapter.write(&table, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next().unwrap(),
            "No Quote,Project Name,Customer,Value,Progress Type,Prospect,Sales,Date"
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn bd_export_uses_reporting_year() {
        let port = seeded_port();
        let table = cli::build_export_table(
            &port,
            &settings_2026(true),
            &Viewer::operator(),
            ExportKind::BdUpdates,
        )
        .unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn empty_customer_export_is_refused() {
        let port = MockDataPort::new();
        let table = cli::build_export_table(
            &port,
            &settings_2026(true),
            &Viewer::operator(),
            ExportKind::Customers,
        )
        .unwrap();
        let dir = TempDir::new().unwrap();
        let err = CsvExportAdapter
            .write(&table, &dir.path().join("customers.csv"))
            .unwrap_err();
        assert!(matches!(err, SalesTrackError::EmptyExport { .. }));
    }
}

mod csv_backend {
    use super::*;
    use salestrack::domain::filter::ProjectFilter;
    use tempfile::TempDir;

    fn write_data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("profiles.csv"),
            "id,email,full_name,display_name,role\n\
             u1,andi@example.com,Andi,,sales\n\
             a1,citra@example.com,Citra,,admin\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("customers.csv"),
            "id,name,sector,created_at\nc1,PT Sinar,Industrial,2026-01-05\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("projects.csv"),
            "id,created_at,no_quote,project_name,customer_id,value,progress_type,prospect,weekly_update,sales_id\n\
             p1,2026-02-01T09:00:00Z,Q-1,Genset,c1,1000,Win,Hot Prospect,,u1\n\
             p2,2026-02-03T09:00:00Z,Q-2,UPS,c1,500,Tender,Normal,,u1\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn open_data_port_reads_csv_directory() {
        let data = write_data_dir();
        let ini = format!("[data]\nbackend = csv\n[csv]\ndir = {}\n", data.path().display());
        let file = write_temp_ini(&ini);
        let (config, settings) = cli::load_settings(file.path()).unwrap();

        let port = cli::open_data_port(&config, &settings).unwrap();
        assert_eq!(port.list_profiles().unwrap().len(), 2);

        let projects = port.list_projects(&ProjectFilter::default()).unwrap();
        let ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert_eq!(projects[0].customer_name.as_deref(), Some("PT Sinar"));

        let viewer = cli::resolve_viewer(port.as_ref(), Some("u1")).unwrap();
        let filter = cli::build_project_filter(&ProjectFilterArgs::default(), &viewer).unwrap();
        let m = cli::compute_metrics(port.as_ref(), &filter).unwrap();
        assert_eq!(m.total_count, 2);
        assert_eq!(m.hot_prospect_win_ratio, Some(100));
    }

    #[test]
    fn missing_directory_fails_on_read() {
        let ini = "[data]\nbackend = csv\n[csv]\ndir = /nonexistent/salestrack-data\n";
        let file = write_temp_ini(ini);
        let (config, settings) = cli::load_settings(file.path()).unwrap();
        let port = cli::open_data_port(&config, &settings).unwrap();
        assert!(matches!(
            port.list_profiles(),
            Err(SalesTrackError::Database { .. })
        ));
    }
}
