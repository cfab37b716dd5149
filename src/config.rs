//! Static dashboard configuration.
//!
//! Everything here is fixed at process start and passed into the pipeline
//! explicitly; nothing is read from files or the environment.

use crate::view::Panel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://54.179.164.123:8099/query/sql";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The page re-runs the whole pipeline on this interval.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

/// What to do when one of the four panels fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Any panel failure fails the whole refresh cycle.
    #[default]
    AbortCycle,
    /// A failing panel is replaced by an error placeholder.
    IsolatePanel,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub queries: Queries,
    pub country_codes: CountryCodes,
    pub page: PageConfig,
    pub theme: Theme,
    pub failure_mode: FailureMode,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            queries: Queries::default(),
            country_codes: CountryCodes::default(),
            page: PageConfig::default(),
            theme: Theme::default(),
            failure_mode: FailureMode::default(),
        }
    }
}

/// The four fixed query texts, one per panel.
#[derive(Debug, Clone)]
pub struct Queries {
    pub by_country: String,
    pub by_category: String,
    pub by_hour: String,
    pub by_gender: String,
}

impl Queries {
    pub fn for_panel(&self, panel: Panel) -> &str {
        match panel {
            Panel::CountryMap => &self.by_country,
            Panel::ProductTable => &self.by_category,
            Panel::HourlyLine => &self.by_hour,
            Panel::GenderRing => &self.by_gender,
        }
    }
}

impl Default for Queries {
    fn default() -> Self {
        Self {
            by_country: "SELECT COUNTRY, SUM(TOTAL_PRICE) AS totalSales \
                         FROM 5_join_group \
                         GROUP BY COUNTRY \
                         ORDER BY totalSales DESC"
                .to_string(),
            by_category: "SELECT TYPE, SUM(QUANTITY) AS totalQuantity, SUM(TOTAL_PRICE) AS totalSales \
                          FROM 5_join_group \
                          GROUP BY TYPE \
                          ORDER BY totalQuantity DESC"
                .to_string(),
            by_hour: "SELECT SUBSTR(ORDER_TIMESTAMP, 0, 13) AS hour, SUM(TOTAL_PRICE) AS totalSales \
                      FROM 5_join_group \
                      GROUP BY hour \
                      ORDER BY hour"
                .to_string(),
            by_gender: "SELECT gender, COUNT(*) AS userCount \
                        FROM 2_users \
                        GROUP BY gender \
                        ORDER BY userCount DESC"
                .to_string(),
        }
    }
}

/// Display country name -> ISO-3166-1 alpha-3 code.
#[derive(Debug, Clone)]
pub struct CountryCodes(BTreeMap<String, String>);

impl CountryCodes {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn lookup(&self, country: &str) -> Option<&str> {
        self.0.get(country).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CountryCodes {
    fn default() -> Self {
        Self::new([
            ("Thailand", "THA"),
            ("China", "CHN"),
            ("Singapore", "SGP"),
            ("Hong Kong", "HKG"),
            ("Japan", "JPN"),
            ("Malaysia", "MYS"),
            ("Korea", "KOR"),
            ("Vietnam", "VNM"),
            ("Australia", "AUS"),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Wide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heading {
    pub text: String,
    pub color: String,
    pub font_size_px: u32,
}

/// Page header shown above the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageConfig {
    pub layout: LayoutMode,
    pub title: Heading,
    pub subtitle: Heading,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Wide,
            title: Heading {
                text: "NANAS ARTTOYS 🧸".to_string(),
                color: "#FF6347".to_string(),
                font_size_px: 48,
            },
            subtitle: Heading {
                text: "- The Art of Play -".to_string(),
                color: "#32CD32".to_string(),
                font_size_px: 24,
            },
        }
    }
}

/// Colors shared by every chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub font_color: String,
    pub grid_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        // plotly_dark
        Self {
            paper_bgcolor: "rgb(17,17,17)".to_string(),
            plot_bgcolor: "rgb(17,17,17)".to_string(),
            font_color: "#f2f5fa".to_string(),
            grid_color: "#283442".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_has_nine_entries() {
        let codes = CountryCodes::default();
        assert_eq!(codes.len(), 9);
        assert!(!codes.is_empty());
        assert!(CountryCodes::new(Vec::<(&str, &str)>::new()).is_empty());
        assert_eq!(codes.lookup("Hong Kong"), Some("HKG"));
        assert_eq!(codes.lookup("France"), None);
    }

    #[test]
    fn hour_query_keeps_full_date_prefix() {
        // Broker SUBSTR is 0-based with an exclusive end: (0, 13) -> "YYYY-MM-DDTHH".
        assert!(Queries::default().by_hour.contains("SUBSTR(ORDER_TIMESTAMP, 0, 13)"));
    }

    #[test]
    fn queries_are_read_only_selects() {
        let q = Queries::default();
        for panel in Panel::ALL {
            assert!(q.for_panel(panel).starts_with("SELECT "), "{panel}");
        }
    }
}
