//! Chart builders: tabular result + theme -> chart specification.
//!
//! Builders are pure and never fail; a missing or empty column simply yields
//! an empty trace.

use crate::chart::*;
use crate::config::Theme;
use crate::model::TabularResult;
use crate::model::transforms::{
    COUNTRY, COUNTRY_CODE, GENDER, HOUR, TOTAL_QUANTITY, TOTAL_SALES, TYPE, USER_COUNT,
};
use crate::query::Scalar;

const TABLE_HEADERS: [&str; 3] = ["Product Type", "Total Quantity", "Total Sales"];
const TABLE_HEADER_FILL: &str = "#4CAF50";
const TABLE_BANDS: [&str; 2] = ["#FFFFFF", "#E8F5E9"];
const TABLE_CELL_FONT: &str = "#111111";

const LINE_COLOR: &str = "blue";
const LINE_MARKER_SIZE: u32 = 8;

const RING_HOLE: f64 = 0.3;
const RING_COLORS: [&str; 2] = ["#FF9999", "#66B3FF"];

/// Country totals on a world map, colored on a continuous scale.
pub fn build_choropleth(table: &TabularResult, theme: &Theme) -> ChartSpec {
    let trace = ChoroplethTrace {
        locations: table.column_or_empty(COUNTRY_CODE).to_vec(),
        z: table.column_or_empty(TOTAL_SALES).to_vec(),
        hovertext: table.column_or_empty(COUNTRY).to_vec(),
        locationmode: "ISO-3".to_string(),
        colorscale: "Viridis".to_string(),
        colorbar: ColorBar {
            title: Title::new(TOTAL_SALES),
        },
    };

    let mut layout = base_layout(theme, Title::new("Total Sales by Country"), None);
    layout.geo = Some(Geo {
        bgcolor: theme.plot_bgcolor.clone(),
        showframe: false,
        showcoastlines: true,
    });

    ChartSpec {
        data: vec![Trace::Choropleth(trace)],
        layout,
    }
}

/// Product types with quantity and sales, rows banded independent of data.
pub fn build_table(table: &TabularResult, theme: &Theme) -> ChartSpec {
    let columns = [TYPE, TOTAL_QUANTITY, TOTAL_SALES];
    let bands: Vec<String> = (0..table.len())
        .map(|i| TABLE_BANDS[i % TABLE_BANDS.len()].to_string())
        .collect();

    let trace = TableTrace {
        header: TableSection {
            values: TABLE_HEADERS.iter().map(|h| h.to_string()).collect(),
            fill: Fill {
                color: FillColor::Solid(TABLE_HEADER_FILL.to_string()),
            },
            align: "center".to_string(),
            font: Font {
                color: Some("white".to_string()),
                size: Some(14),
            },
        },
        cells: TableSection {
            values: columns
                .iter()
                .map(|c| table.column_or_empty(c).to_vec())
                .collect(),
            fill: Fill {
                color: FillColor::PerCell(vec![bands; columns.len()]),
            },
            align: "center".to_string(),
            font: Font {
                color: Some(TABLE_CELL_FONT.to_string()),
                size: Some(12),
            },
        },
    };

    ChartSpec {
        data: vec![Trace::Table(trace)],
        layout: base_layout(
            theme,
            Title::centered("Total Quantity and Sales by Product Type"),
            Some(400),
        ),
    }
}

/// Hourly sales as a line with markers. The x axis is categorical and keeps
/// the order it is given.
pub fn build_line(table: &TabularResult, theme: &Theme) -> ChartSpec {
    let trace = ScatterTrace {
        x: table.column_or_empty(HOUR).to_vec(),
        y: table.column_or_empty(TOTAL_SALES).to_vec(),
        mode: "lines+markers".to_string(),
        name: "Total Sales".to_string(),
        line: Line {
            color: LINE_COLOR.to_string(),
        },
        marker: Marker {
            size: Some(LINE_MARKER_SIZE),
            colors: None,
        },
    };

    let mut layout = base_layout(theme, Title::new("Hourly Total Sales"), Some(500));
    layout.xaxis = Some(Axis {
        title: Title::new("Times"),
        kind: Some("category".to_string()),
        gridcolor: theme.grid_color.clone(),
    });
    layout.yaxis = Some(Axis {
        title: Title::new("Total Sales"),
        kind: None,
        gridcolor: theme.grid_color.clone(),
    });

    ChartSpec {
        data: vec![Trace::Scatter(trace)],
        layout,
    }
}

/// User counts as a ring chart with per-slice percentages.
pub fn build_ring(table: &TabularResult, theme: &Theme) -> ChartSpec {
    let values = table.column_or_empty(USER_COUNT);
    let text = percentages(values)
        .into_iter()
        .map(|p| format!("{:.1}%", p))
        .collect();

    let trace = PieTrace {
        labels: table.column_or_empty(GENDER).to_vec(),
        values: values.to_vec(),
        text,
        textinfo: "label+text".to_string(),
        hole: RING_HOLE,
        marker: Marker {
            size: None,
            colors: Some(RING_COLORS.iter().map(|c| c.to_string()).collect()),
        },
    };

    ChartSpec {
        data: vec![Trace::Pie(trace)],
        layout: base_layout(theme, Title::new("Gender Distribution of Users"), Some(500)),
    }
}

/// Share of the total for each value, in percent. Non-numeric values count
/// as zero; an all-zero column yields all zeros.
pub fn percentages(values: &[Scalar]) -> Vec<f64> {
    let nums: Vec<f64> = values.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect();
    let total: f64 = nums.iter().sum();
    if total <= 0.0 {
        return vec![0.0; nums.len()];
    }
    nums.iter().map(|v| v / total * 100.0).collect()
}

fn base_layout(theme: &Theme, title: Title, height: Option<u32>) -> Layout {
    Layout {
        title,
        height,
        autosize: true,
        paper_bgcolor: theme.paper_bgcolor.clone(),
        plot_bgcolor: theme.plot_bgcolor.clone(),
        font: Font {
            color: Some(theme.font_color.clone()),
            size: None,
        },
        xaxis: None,
        yaxis: None,
        geo: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CountryCodes;
    use crate::model::transforms;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn t(s: &str) -> Scalar {
        Scalar::text(s)
    }

    fn n(x: f64) -> Scalar {
        Scalar::Number(x)
    }

    #[test]
    fn choropleth_leaves_unknown_codes_null() {
        let rows = vec![vec![t("Japan"), n(30.0)], vec![t("Atlantis"), n(10.0)]];
        let table = transforms::by_country(&rows, &CountryCodes::default()).unwrap();
        let spec = build_choropleth(&table, &Theme::default());

        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["data"][0]["type"], json!("choropleth"));
        assert_eq!(v["data"][0]["locations"], json!(["JPN", null]));
        assert_eq!(v["data"][0]["z"], json!([30.0, 10.0]));
        assert_eq!(v["data"][0]["hovertext"], json!(["Japan", "Atlantis"]));
        assert_eq!(v["layout"]["title"]["text"], json!("Total Sales by Country"));
    }

    #[test]
    fn empty_table_builds_empty_specs() {
        let theme = Theme::default();
        let codes = CountryCodes::default();

        let table = build_table(&transforms::by_category(&[]).unwrap(), &theme);
        let v = serde_json::to_value(&table).unwrap();
        assert_eq!(v["data"][0]["cells"]["values"], json!([[], [], []]));
        assert_eq!(v["data"][0]["cells"]["fill"]["color"], json!([[], [], []]));
        assert_eq!(
            v["data"][0]["header"]["values"],
            json!(["Product Type", "Total Quantity", "Total Sales"])
        );

        let map = build_choropleth(&transforms::by_country(&[], &codes).unwrap(), &theme);
        assert_eq!(serde_json::to_value(&map).unwrap()["data"][0]["locations"], json!([]));

        let line = build_line(&transforms::by_hour(&[]).unwrap(), &theme);
        assert_eq!(serde_json::to_value(&line).unwrap()["data"][0]["x"], json!([]));

        let ring = build_ring(&transforms::by_gender(&[]).unwrap(), &theme);
        assert_eq!(serde_json::to_value(&ring).unwrap()["data"][0]["text"], json!([]));
    }

    #[test]
    fn table_bands_alternate_per_row() {
        let rows = vec![
            vec![t("Figure"), n(3.0), n(30.0)],
            vec![t("Plush"), n(2.0), n(20.0)],
            vec![t("Keychain"), n(1.0), n(10.0)],
        ];
        let spec = build_table(&transforms::by_category(&rows).unwrap(), &Theme::default());
        let Trace::Table(trace) = &spec.data[0] else {
            panic!("expected a table trace");
        };

        let band = vec![
            "#FFFFFF".to_string(),
            "#E8F5E9".to_string(),
            "#FFFFFF".to_string(),
        ];
        assert_eq!(trace.cells.fill.color, FillColor::PerCell(vec![band; 3]));
        assert_eq!(trace.cells.values[2], vec![t("30.00"), t("20.00"), t("10.00")]);
        assert_eq!(spec.layout.title, Title::centered("Total Quantity and Sales by Product Type"));
    }

    #[test]
    fn line_keeps_supplied_order_on_category_axis() {
        let rows = vec![
            vec![t("2024-05-01T09"), n(1.0)],
            vec![t("2024-05-01T13"), n(4.0)],
        ];
        let spec = build_line(&transforms::by_hour(&rows).unwrap(), &Theme::default());
        let v = serde_json::to_value(&spec).unwrap();

        assert_eq!(v["data"][0]["type"], json!("scatter"));
        assert_eq!(v["data"][0]["x"], json!(["09:00", "13:00"]));
        assert_eq!(v["data"][0]["y"], json!([1.0, 4.0]));
        assert_eq!(v["data"][0]["mode"], json!("lines+markers"));
        assert_eq!(v["data"][0]["marker"], json!({ "size": 8 }));
        assert_eq!(v["layout"]["xaxis"]["type"], json!("category"));
        assert_eq!(v["layout"]["xaxis"]["title"]["text"], json!("Times"));
    }

    #[test]
    fn ring_has_hole_and_percentages() {
        let rows = vec![vec![t("F"), n(5.0)], vec![t("M"), n(3.0)]];
        let spec = build_ring(&transforms::by_gender(&rows).unwrap(), &Theme::default());
        let Trace::Pie(trace) = &spec.data[0] else {
            panic!("expected a pie trace");
        };

        assert_eq!(trace.hole, 0.3);
        assert_eq!(trace.text, vec!["62.5%", "37.5%"]);
        assert_eq!(trace.labels, vec![t("F"), t("M")]);
    }

    #[test]
    fn percentages_of_zero_total() {
        assert_eq!(percentages(&[n(0.0), n(0.0)]), vec![0.0, 0.0]);
        assert_eq!(percentages(&[n(1.0), n(3.0)]), vec![25.0, 75.0]);
    }

    #[test]
    fn builders_are_deterministic() {
        let rows = vec![vec![t("F"), n(2.0)], vec![t("M"), n(2.0)]];
        let table = transforms::by_gender(&rows).unwrap();
        let theme = Theme::default();
        assert_eq!(build_ring(&table, &theme), build_ring(&table, &theme));
    }
}
