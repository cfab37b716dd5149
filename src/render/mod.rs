//! HTML rendering of a composed dashboard.

pub mod html;

pub use html::{render_html_report, render_live_page};
