//! View composer: one refresh cycle from queries to a 2x2 dashboard.
//!
//! Panel order is fixed:
//!   row 0: country map | product table
//!   row 1: hourly line | gender ring

use crate::chart::{self, ChartSpec};
use crate::config::{DashboardConfig, FailureMode, PageConfig, REFRESH_INTERVAL};
use crate::error::{Error, ShapeError};
use crate::model::{TabularResult, transforms};
use crate::query::{QueryService, Row};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    CountryMap,
    ProductTable,
    HourlyLine,
    GenderRing,
}

impl Panel {
    /// Grid order, row-major.
    pub const ALL: [Panel; 4] = [
        Panel::CountryMap,
        Panel::ProductTable,
        Panel::HourlyLine,
        Panel::GenderRing,
    ];
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Panel::CountryMap => "country map",
            Panel::ProductTable => "product table",
            Panel::HourlyLine => "hourly line",
            Panel::GenderRing => "gender ring",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PanelContent {
    Chart { figure: ChartSpec },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub panel: Panel,
    #[serde(flatten)]
    pub content: PanelContent,
}

/// Everything the page needs to draw one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub page: PageConfig,
    pub refresh_ms: u64,
    pub grid: [[PanelView; 2]; 2],
}

/// Run one refresh cycle: query, aggregate and build all four panels.
///
/// The four queries run concurrently; the grid order does not depend on
/// which finishes first. With `FailureMode::AbortCycle` the first failing
/// panel (in grid order) fails the cycle.
pub async fn refresh<Q: QueryService>(
    service: &Q,
    config: &DashboardConfig,
) -> Result<Dashboard, Error> {
    let started = Instant::now();

    let [p00, p01, p10, p11] = Panel::ALL;
    let (country, product, hourly, gender) = tokio::join!(
        build_panel(service, config, p00),
        build_panel(service, config, p01),
        build_panel(service, config, p10),
        build_panel(service, config, p11),
    );

    let [country, product, hourly, gender] =
        [country, product, hourly, gender].map(|r| settle(r, config.failure_mode));
    let dashboard = compose(&config.page, [[country?, product?], [hourly?, gender?]]);

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "refresh cycle complete"
    );
    Ok(dashboard)
}

/// Lay four panels out in the fixed grid.
pub fn compose(page: &PageConfig, grid: [[PanelView; 2]; 2]) -> Dashboard {
    Dashboard {
        page: page.clone(),
        refresh_ms: REFRESH_INTERVAL.as_millis() as u64,
        grid,
    }
}

async fn build_panel<Q: QueryService>(
    service: &Q,
    config: &DashboardConfig,
    panel: Panel,
) -> Result<PanelView, Error> {
    let result = service
        .execute(config.queries.for_panel(panel))
        .await
        .map_err(|source| Error::Query { panel, source })?;
    debug!(%panel, rows = result.rows.len(), columns = ?result.columns, "fetched");

    let table = shape(panel, &result.rows, config).map_err(|source| Error::Shape { panel, source })?;
    if table.is_empty() {
        debug!(%panel, "no rows; panel will be empty");
    }
    debug!(
        %panel,
        groups = table.len(),
        columns = ?table.column_names().collect::<Vec<_>>(),
        "shaped"
    );

    let theme = &config.theme;
    let figure = match panel {
        Panel::CountryMap => chart::build_choropleth(&table, theme),
        Panel::ProductTable => chart::build_table(&table, theme),
        Panel::HourlyLine => chart::build_line(&table, theme),
        Panel::GenderRing => chart::build_ring(&table, theme),
    };
    Ok(PanelView {
        panel,
        content: PanelContent::Chart { figure },
    })
}

fn shape(
    panel: Panel,
    rows: &[Row],
    config: &DashboardConfig,
) -> Result<TabularResult, ShapeError> {
    match panel {
        Panel::CountryMap => transforms::by_country(rows, &config.country_codes),
        Panel::ProductTable => transforms::by_category(rows),
        Panel::HourlyLine => transforms::by_hour(rows),
        Panel::GenderRing => transforms::by_gender(rows),
    }
}

fn settle(result: Result<PanelView, Error>, mode: FailureMode) -> Result<PanelView, Error> {
    match (result, mode) {
        (Ok(view), _) => Ok(view),
        (Err(err), FailureMode::AbortCycle) => Err(err),
        (Err(err), FailureMode::IsolatePanel) => {
            warn!(panel = %err.panel(), error = %err, "panel failed; rendering placeholder");
            Ok(PanelView {
                panel: err.panel(),
                content: PanelContent::Failed {
                    error: err.to_string(),
                },
            })
        }
    }
}
