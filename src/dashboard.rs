use crate::client::AssessmentApi;
use crate::errors::ApiError;
use crate::form::{summary_tags, BusyFlag, TagFlags};
use crate::models::{counter, AssessmentRecord, PriorityCount, TodayStats};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const STATS_FAILED: &str = "Failed to load stats.";
pub const ROWS_FAILED: &str = "Failed to load today's entries.";
pub const DASHBOARD_UNREACHABLE: &str = "Failed to load dashboard. Check backend/API base URL.";
pub const EXPORT_FAILED: &str = "Failed to download Excel file.";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MAX_TOP_PRIORITIES: usize = 5;

// (key, label, tone), top to bottom
const NEEDS: [(&str, &str, &str); 5] = [
    ("repairs", "Repairs", "emerald"),
    ("bedding", "Bedding", "sky"),
    ("cooking", "Cooking items", "violet"),
    ("water", "Water", "teal"),
    ("sanitation", "Sanitation", "amber"),
];

// (key, label, icon), in grid order
const CARDS: [(&str, &str, &str); 12] = [
    ("total_households", "Total households", "mdi:account-group"),
    ("structural_damage", "Structural damage", "mdi:home-alert"),
    ("temporary_shelter", "Temporary shelter", "mdi:home-city"),
    ("not_enough_food", "Not enough food", "mdi:food-off"),
    ("no_support_yet", "No support yet", "mdi:hand-heart"),
    ("elderly_present", "Elderly present", "mdi:account-heart"),
    ("children_under_5", "Children <5", "mdi:baby-face-outline"),
    ("pregnant_lactating", "Pregnant/Lactating", "mdi:human-pregnant"),
    ("water_needed", "Water needed", "mdi:water"),
    ("sanitation_needed", "Sanitation needed", "mdi:toilet"),
    ("medicine_needed", "Medicine needed", "mdi:medical-bag"),
    ("unable_to_work", "Unable to work", "mdi:briefcase-remove"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeedBar {
    pub key: &'static str,
    pub label: &'static str,
    pub tone: &'static str,
    pub value: i64,
    pub percent: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeedsChart {
    pub bars: Vec<NeedBar>,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatCard {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub value: i64,
}

pub fn bar_percent(value: i64, max: i64) -> i64 {
    if max <= 0 {
        return 0;
    }
    let pct = (value as f64 / max as f64 * 100.0).round() as i64;
    pct.clamp(0, 100)
}

pub fn needs_breakdown(stats: Option<&TodayStats>) -> NeedsChart {
    let values: Vec<i64> = NEEDS
        .iter()
        .map(|(key, _, _)| stats.map_or(0, |s| counter(&s.charts.needs_breakdown, key)))
        .collect();
    let max = values.iter().copied().max().unwrap_or(0).max(0);

    let bars = NEEDS
        .iter()
        .zip(values)
        .map(|(&(key, label, tone), value)| NeedBar {
            key,
            label,
            tone,
            value,
            percent: bar_percent(value, max),
        })
        .collect();

    NeedsChart { bars, max }
}

pub fn stat_cards(stats: Option<&TodayStats>) -> Vec<StatCard> {
    CARDS
        .iter()
        .map(|&(key, label, icon)| StatCard {
            key,
            label,
            icon,
            value: stats.map_or(0, |s| counter(&s.cards, key)),
        })
        .collect()
}

pub fn top_priorities(stats: Option<&TodayStats>) -> Vec<PriorityCount> {
    stats
        .map(|s| {
            s.charts
                .top_priorities
                .iter()
                .take(MAX_TOP_PRIORITIES)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn record_matches(record: &AssessmentRecord, needle: &str) -> bool {
    let optional = [
        &record.priority_1,
        &record.priority_2,
        &record.priority_3,
        &record.token_number,
    ];
    [record.name.as_str(), record.contact_number.as_str()]
        .into_iter()
        .chain(optional.into_iter().filter_map(|v| v.as_deref()))
        .any(|haystack| haystack.to_lowercase().contains(needle))
}

pub fn filter_rows<'a>(rows: &'a [AssessmentRecord], query: &str) -> Vec<&'a AssessmentRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|record| record_matches(record, &needle))
        .collect()
}

pub fn find_record<'a>(rows: &'a [AssessmentRecord], key: &str) -> Option<&'a AssessmentRecord> {
    rows.iter().find(|r| {
        r.id.as_deref() == Some(key) || r.token_number.as_deref() == Some(key)
    })
}

pub fn format_collected_at(raw: Option<&str>) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S";
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "-".to_string();
    };

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at.with_timezone(&Local).format(DISPLAY).to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive.format(DISPLAY).to_string(),
        Err(_) => "-".to_string(),
    }
}

fn dash_if_blank(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: Option<String>,
    pub token: String,
    pub name: String,
    pub contact_number: String,
    pub family_members: u32,
    pub collected_at: String,
    pub priorities: [String; 3],
    pub tags: Vec<&'static str>,
}

impl RowView {
    pub fn from_record(record: &AssessmentRecord) -> Self {
        Self {
            id: record.id.clone(),
            token: dash_if_blank(record.token_number.as_deref()),
            name: record.name.clone(),
            contact_number: record.contact_number.clone(),
            family_members: record.family_members,
            collected_at: format_collected_at(record.collected_at.as_deref()),
            priorities: [
                dash_if_blank(record.priority_1.as_deref()),
                dash_if_blank(record.priority_2.as_deref()),
                dash_if_blank(record.priority_3.as_deref()),
            ],
            tags: summary_tags(TagFlags::from_record(record)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDetail {
    #[serde(flatten)]
    pub row: RowView,
    pub notes: Option<String>,
    pub indicators: Vec<Indicator>,
}

pub fn record_detail(record: &AssessmentRecord) -> RecordDetail {
    let flag = |label, value: bool| Indicator {
        label,
        value: yes_no(value).to_string(),
    };

    RecordDetail {
        row: RowView::from_record(record),
        notes: record
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned),
        indicators: vec![
            flag("Structural damage", record.house_structurally_damaged),
            flag("Furniture lost", record.furniture_lost),
            Indicator {
                label: "Enough daily food",
                value: dash_if_blank(record.enough_daily_food.as_deref()),
            },
            flag("Clean drinking water", record.clean_drinking_water_available),
            flag("No support yet", record.support_none),
            flag("Unable to work", record.unable_to_work_currently),
        ],
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

pub fn display_date(date: NaiveDate) -> String {
    format!(
        "{}{} {}",
        date.day(),
        ordinal_suffix(date.day()),
        date.format("%B %Y")
    )
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("household_assessments_{}.xlsx", date.format("%Y-%m-%d"))
}

#[derive(Debug)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    Busy,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub loading: bool,
    pub loaded: bool,
    pub cards: Vec<StatCard>,
    pub needs: NeedsChart,
    pub top_priorities: Vec<PriorityCount>,
    pub rows: Vec<RowView>,
    pub total_rows: usize,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardViewModel {
    stats: Option<TodayStats>,
    rows: Vec<AssessmentRecord>,
    loaded: bool,
    notices: Vec<String>,
}

impl DashboardViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Option<&TodayStats> {
        self.stats.as_ref()
    }

    pub fn rows(&self) -> &[AssessmentRecord] {
        &self.rows
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    fn begin_fetch(&mut self) {
        self.notices.clear();
    }

    fn notice(&mut self, message: String) {
        if !self.notices.contains(&message) {
            self.notices.push(message);
        }
    }

    // a failed half keeps what was shown before
    pub fn apply_stats(&mut self, result: Result<TodayStats, ApiError>) {
        match result {
            Ok(stats) => self.stats = Some(stats),
            Err(err) => {
                log_fetch_failure("stats", &err);
                self.notice(err.user_message(STATS_FAILED, DASHBOARD_UNREACHABLE));
            }
        }
    }

    pub fn apply_rows(&mut self, result: Result<Vec<AssessmentRecord>, ApiError>) {
        match result {
            Ok(rows) => self.rows = rows,
            Err(err) => {
                log_fetch_failure("rows", &err);
                self.notice(err.user_message(ROWS_FAILED, DASHBOARD_UNREACHABLE));
            }
        }
    }

    fn finish_fetch(&mut self) {
        self.loaded = true;
    }

    pub fn filtered_rows(&self, query: &str) -> Vec<RowView> {
        filter_rows(&self.rows, query)
            .into_iter()
            .map(RowView::from_record)
            .collect()
    }

    pub fn view(&self, date: NaiveDate, query: &str, loading: bool) -> DashboardView {
        let stats = self.stats.as_ref();
        DashboardView {
            title: format!("{} Flood Relief Dashboard", display_date(date)),
            loading,
            loaded: self.loaded,
            cards: stat_cards(stats),
            needs: needs_breakdown(stats),
            top_priorities: top_priorities(stats),
            rows: self.filtered_rows(query),
            total_rows: self.rows.len(),
            notices: self.notices.clone(),
        }
    }
}

fn log_fetch_failure(resource: &str, err: &ApiError) {
    if err.is_rejection() {
        warn!(resource, "backend refused dashboard request: {err}");
    } else {
        error!(resource, "dashboard request failed: {err}");
    }
}

#[derive(Debug)]
pub struct DashboardSession {
    view: Mutex<DashboardViewModel>,
    refresh_gate: Mutex<()>,
    loading: AtomicBool,
    downloading: AtomicBool,
    collection_date: NaiveDate,
}

impl DashboardSession {
    pub fn new(collection_date: NaiveDate) -> Self {
        Self {
            view: Mutex::new(DashboardViewModel::new()),
            refresh_gate: Mutex::new(()),
            loading: AtomicBool::new(false),
            downloading: AtomicBool::new(false),
            collection_date,
        }
    }

    pub fn collection_date(&self) -> NaiveDate {
        self.collection_date
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading.load(Ordering::SeqCst)
    }

    /// Fetches stats and rows together. `loading` stays up until both have
    /// settled, and each half lands on its own. A refresh requested while one
    /// is running waits for that one instead of fetching again.
    pub async fn refresh<A>(&self, api: &A)
    where
        A: AssessmentApi + ?Sized,
    {
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            drop(self.refresh_gate.lock().await);
            return;
        };
        let Some(_loading) = BusyFlag::raise(&self.loading) else {
            return;
        };

        self.view.lock().await.begin_fetch();
        let (stats, rows) = tokio::join!(api.today_stats(), api.today_assessments());

        let mut view = self.view.lock().await;
        view.apply_stats(stats);
        view.apply_rows(rows);
        view.finish_fetch();
        info!(
            rows = view.rows().len(),
            has_stats = view.stats().is_some(),
            "dashboard refreshed"
        );
    }

    pub async fn view(&self, query: &str) -> DashboardView {
        self.view
            .lock()
            .await
            .view(self.collection_date, query, self.is_loading())
    }

    pub async fn rows(&self, query: &str) -> Vec<RowView> {
        self.view.lock().await.filtered_rows(query)
    }

    pub async fn record(&self, key: &str) -> Option<RecordDetail> {
        let view = self.view.lock().await;
        find_record(view.rows(), key).map(record_detail)
    }

    pub async fn export<A>(&self, api: &A) -> Result<ExportFile, ExportError>
    where
        A: AssessmentApi + ?Sized,
    {
        let Some(downloading) = BusyFlag::raise(&self.downloading) else {
            return Err(ExportError::Busy);
        };
        let result = api.export_today().await;
        drop(downloading);

        match result {
            Ok(bytes) => {
                let filename = export_filename(self.collection_date);
                info!(%filename, bytes = bytes.len(), "export ready");
                Ok(ExportFile {
                    filename,
                    content_type: XLSX_CONTENT_TYPE,
                    bytes,
                })
            }
            Err(err) => {
                error!("failed to download export: {err}");
                Err(ExportError::Failed(EXPORT_FAILED.to_string()))
            }
        }
    }
}
