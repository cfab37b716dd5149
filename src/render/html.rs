use crate::config::{PageConfig, REFRESH_INTERVAL};
use crate::view::Dashboard;
use serde::Serialize;

/// Render a self-contained HTML report (dashboard embedded as JSON).
pub fn render_html_report(dashboard: &Dashboard) -> anyhow::Result<String> {
    fill_template(&dashboard.page, Some(dashboard))
}

/// Render the live page shell; it polls `/api/dashboard` on the refresh
/// interval and redraws the grid.
pub fn render_live_page(page: &PageConfig) -> anyhow::Result<String> {
    fill_template(page, None)
}

/// Substitutes `__PAGE__`, `__DATA__` and `__REFRESH_MS__` by plain string
/// replacement; the page script is full of braces `format!()` would choke on.
fn fill_template(page: &PageConfig, dashboard: Option<&Dashboard>) -> anyhow::Result<String> {
    Ok(TEMPLATE
        .replace("__PAGE__", &embed(page)?)
        .replace("__DATA__", &embed(&dashboard)?)
        .replace("__REFRESH_MS__", &REFRESH_INTERVAL.as_millis().to_string()))
}

/// JSON safe to drop inside a <script> element.
fn embed<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Sales Dashboard</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; background: #0e1117; color: #fafafa; }
  .page { margin: 0 auto; padding: 16px 24px; }
  .page.wide { max-width: none; }
  .title, .subheader { font-weight: bold; text-align: center; margin: 4px 0; }
  .status { text-align: right; font-size: 12px; color: #888; min-height: 16px; }
  .status.error { color: #ff6b6b; }
  .grid { display: grid; grid-template-columns: repeat(2, minmax(0, 1fr)); gap: 16px; }
  .panel { min-height: 420px; }
  .panel.failed { display: flex; align-items: center; justify-content: center; border: 1px dashed #ff6b6b; border-radius: 6px; color: #ff6b6b; padding: 16px; }
</style>
</head>
<body>
<div class="page" id="page">
  <p class="title" id="title"></p>
  <p class="subheader" id="subtitle"></p>
  <div class="status" id="status"></div>
  <div class="grid">
    <div class="panel" id="panel-0-0"></div>
    <div class="panel" id="panel-0-1"></div>
    <div class="panel" id="panel-1-0"></div>
    <div class="panel" id="panel-1-1"></div>
  </div>
</div>

<script>
const PAGE = __PAGE__;
// Embedded dashboard (report mode) or null (live mode).
const DATA = __DATA__;
const REFRESH_MS = __REFRESH_MS__;

function renderHeader(page) {
  document.getElementById("page").classList.add(page.layout);
  for (const [id, h] of [["title", page.title], ["subtitle", page.subtitle]]) {
    const el = document.getElementById(id);
    el.textContent = h.text;
    el.style.color = h.color;
    el.style.fontSize = h.font_size_px + "px";
  }
}

function setStatus(text, isError) {
  const el = document.getElementById("status");
  el.textContent = text;
  el.className = "status" + (isError ? " error" : "");
}

function drawPanel(el, view) {
  if (view.status === "failed") {
    Plotly.purge(el);
    el.className = "panel failed";
    el.textContent = view.error;
    return;
  }
  if (el.classList.contains("failed")) {
    el.className = "panel";
    el.textContent = "";
  }
  Plotly.react(el, view.figure.data, view.figure.layout, { responsive: true, displaylogo: false });
}

function draw(dashboard) {
  dashboard.grid.forEach((row, r) => {
    row.forEach((view, c) => drawPanel(document.getElementById(`panel-${r}-${c}`), view));
  });
}

async function tick() {
  try {
    const resp = await fetch("/api/dashboard", { cache: "no-store" });
    const body = await resp.json();
    if (!resp.ok) throw new Error(body.error || resp.statusText);
    draw(body);
    setStatus("updated " + new Date().toLocaleTimeString(), false);
  } catch (e) {
    // Keep the last good panels; the next tick tries again.
    setStatus("refresh failed: " + e.message, true);
  } finally {
    setTimeout(tick, REFRESH_MS);
  }
}

renderHeader(PAGE);
if (DATA) {
  draw(DATA);
} else {
  tick();
}
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{PanelContent, PanelView, Panel, compose};

    fn failed(panel: Panel) -> PanelView {
        PanelView {
            panel,
            content: PanelContent::Failed {
                error: "</script><b>boom</b>".to_string(),
            },
        }
    }

    #[test]
    fn report_embeds_dashboard() {
        let page = PageConfig::default();
        let d = compose(
            &page,
            [
                [failed(Panel::CountryMap), failed(Panel::ProductTable)],
                [failed(Panel::HourlyLine), failed(Panel::GenderRing)],
            ],
        );
        let html = render_html_report(&d).unwrap();

        assert!(html.contains(r#""panel":"gender_ring""#));
        assert!(html.contains("NANAS ARTTOYS"));
        assert!(html.contains("const REFRESH_MS = 5000;"));
        assert!(!html.contains("__DATA__"));
        // Embedded strings cannot close the script element.
        assert!(!html.contains("</script><b>"));
    }

    #[test]
    fn live_page_has_no_embedded_data() {
        let html = render_live_page(&PageConfig::default()).unwrap();
        assert!(html.contains("const DATA = null;"));
        for placeholder in ["__PAGE__", "__DATA__", "__REFRESH_MS__"] {
            assert!(!html.contains(placeholder), "{placeholder} left in page");
        }
        assert!(html.contains(r##""color":"#FF6347""##));
    }
}
