//! Dashboard metrics over project records.

use super::project::{ProgressType, ProjectRecord, Prospect};

/// Derived numbers for the dashboard cards. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsSnapshot {
    pub total_count: usize,
    pub total_value: f64,
    pub total_value_excluding_lose: f64,
    pub total_value_win: f64,
    pub total_value_hot_leads_excluding_lose: f64,
    pub budgetary_count: usize,
    pub tender_count: usize,
    pub hot_prospect_count: usize,
    pub hot_prospect_win_count: usize,
    /// Whole percent; `None` when there are no hot prospects.
    pub hot_prospect_win_ratio: Option<u32>,
    pub win_count: usize,
    pub lose_count: usize,
}

impl MetricsSnapshot {
    /// Single pass over `records`. A missing value counts as 0; a record with
    /// an unknown progress type or prospect fails every categorical test
    /// (including "not Lose") and only lands in the two totals.
    pub fn aggregate(records: &[ProjectRecord]) -> Self {
        let mut m = MetricsSnapshot {
            total_count: records.len(),
            ..Default::default()
        };

        for record in records {
            let value = record.value.unwrap_or(0.0);
            let progress = record.progress_type;
            let hot = record.prospect == Some(Prospect::HotProspect);
            let not_lose = matches!(progress, Some(t) if t != ProgressType::Lose);

            m.total_value += value;

            if not_lose {
                m.total_value_excluding_lose += value;
            }
            if hot && not_lose {
                m.total_value_hot_leads_excluding_lose += value;
            }
            if hot {
                m.hot_prospect_count += 1;
            }

            match progress {
                Some(ProgressType::Budgetary) => m.budgetary_count += 1,
                Some(ProgressType::Tender) => m.tender_count += 1,
                Some(ProgressType::Win) => {
                    m.win_count += 1;
                    m.total_value_win += value;
                    if hot {
                        m.hot_prospect_win_count += 1;
                    }
                }
                Some(ProgressType::Lose) => m.lose_count += 1,
                None => {}
            }
        }

        m.hot_prospect_win_ratio = win_ratio(m.hot_prospect_win_count, m.hot_prospect_count);
        m
    }

    pub fn count_for(&self, progress_type: ProgressType) -> usize {
        match progress_type {
            ProgressType::Budgetary => self.budgetary_count,
            ProgressType::Tender => self.tender_count,
            ProgressType::Win => self.win_count,
            ProgressType::Lose => self.lose_count,
        }
    }
}

fn win_ratio(wins: usize, total: usize) -> Option<u32> {
    if total == 0 {
        return None;
    }
    Some((wins as f64 * 100.0 / total as f64).round() as u32)
}

/// Value shown on a dashboard card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardValue {
    Currency(f64),
    Count(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardCard {
    pub title: &'static str,
    pub caption: Option<&'static str>,
    pub value: CardValue,
}

/// The seven cards of the main dashboard, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardCards {
    pub cards: Vec<DashboardCard>,
}

impl From<&MetricsSnapshot> for DashboardCards {
    fn from(m: &MetricsSnapshot) -> Self {
        let currency = |title, caption, value| DashboardCard {
            title,
            caption: Some(caption),
            value: CardValue::Currency(value),
        };
        let count = |title, value| DashboardCard {
            title,
            caption: None,
            value: CardValue::Count(value),
        };
        Self {
            cards: vec![
                currency(
                    "Total Value Project",
                    "all projects, excluding Lose",
                    m.total_value_excluding_lose,
                ),
                currency("Total Value Win", "value of Win projects", m.total_value_win),
                currency(
                    "Total Value Hot Leads",
                    "Hot Prospect value, excluding Lose",
                    m.total_value_hot_leads_excluding_lose,
                ),
                count("Total Projects", m.total_count),
                count("Total Budgetary", m.budgetary_count),
                count("Total Tender", m.tender_count),
                count("Total Hot Prospect", m.hot_prospect_count),
            ],
        }
    }
}
