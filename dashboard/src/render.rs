//! HTML rendering of a rate report.
//!
//! Pure functions of the report: no I/O, no clock. Every absent value is
//! rendered as an explicit "unavailable" marker instead of a number.

use ratewatch_common::{Forecast, PrimaryRate, RateSnapshot, ReferenceRates};
use ratewatch_fx::RateReport;
use rust_decimal::Decimal;

const UNAVAILABLE: &str =
    r#"<span class="unavailable" title="data unavailable, try refreshing">unavailable</span>"#;

const HINT: &str = r#"<p class="hint">Some data unavailable, try refreshing.</p>"#;

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 42rem; margin: 2rem auto; color: #222; }
h1 { font-size: 1.4rem; }
section { border: 1px solid #ddd; border-radius: 6px; padding: 0.8rem 1rem; margin: 1rem 0; }
table { width: 100%; border-collapse: collapse; }
td { padding: 0.2rem 0; }
td.label { color: #666; }
.headline { font-size: 2rem; font-weight: bold; }
.value { font-variant-numeric: tabular-nums; }
.unavailable { color: #a33; font-style: italic; }
.hint { color: #a33; }
.up { color: #2a7; }
.down { color: #c44; }
button { font-size: 1rem; padding: 0.4rem 1.2rem; }
";

/// Render the full dashboard page.
pub fn page(report: &RateReport) -> String {
    let snapshot = &report.snapshot;
    let hint = if has_gaps(report) { HINT } else { "" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>RateWatch EUR/RUB</title>
<style>{STYLE}</style>
</head>
<body>
<h1>RateWatch: EUR/RUB</h1>
{hint}
{primary}
{forecast}
{reference}
{sources}
<form method="post" action="/refresh"><button type="submit">Refresh</button></form>
<p class="meta">Fetched {fetched} &middot; {available} of 4 sources answered</p>
</body>
</html>
"#,
        primary = primary_section(report.primary.as_ref()),
        forecast = forecast_section(report.forecast.as_ref()),
        reference = reference_section(snapshot.reference.as_ref()),
        sources = sources_section(snapshot),
        fetched = snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        available = snapshot.available_sources(),
    )
}

fn has_gaps(report: &RateReport) -> bool {
    report.primary.is_none()
        || report.forecast.is_none()
        || report.snapshot.available_sources() < 4
}

fn primary_section(primary: Option<&PrimaryRate>) -> String {
    let (headline, source) = match primary {
        Some(rate) => (
            format!(r#"<span class="value">{:.2} &#8381;</span>"#, rate.value),
            format!("from {}", rate.source.label()),
        ),
        None => (UNAVAILABLE.to_string(), String::new()),
    };
    format!(
        r#"<section id="primary"><div class="label">Market rate</div><div class="headline">{headline}</div><div class="label">{source}</div></section>"#
    )
}

fn forecast_section(forecast: Option<&Forecast>) -> String {
    let rows = [
        ("Estimate", forecast.map(|f| format!("{:.2}", f.estimate))),
        (
            "Interval",
            forecast.map(|f| format!("{:.2} to {:.2}", f.low, f.high)),
        ),
    ];
    section("forecast", "Next official rate", &rows)
}

fn reference_section(reference: Option<&ReferenceRates>) -> String {
    let rows = [
        ("EUR", reference.map(|r| format!("{:.4}", r.eur))),
        ("Change", reference.and_then(|r| r.daily_change()).map(change)),
        ("USD", reference.map(|r| format!("{:.4}", r.usd))),
        ("CNY", reference.map(|r| format!("{:.4}", r.cny))),
        ("Date", reference.map(|r| r.date.format("%Y-%m-%d").to_string())),
    ];
    section("reference", "Official rates", &rows)
}

fn sources_section(snapshot: &RateSnapshot) -> String {
    let rows = [
        ("CNY/RUB exchange", snapshot.cross.cny_rub.map(|v| format!("{v:.4}"))),
        ("EUR/CNY conversion", snapshot.cross.eur_cny.map(|v| format!("{v:.4}"))),
        ("EUR/RUB cross", snapshot.cross.value.map(|v| format!("{v:.2}"))),
        ("EUR/RUB market page", snapshot.scraped.map(|v| format!("{v:.2}"))),
    ];
    section("sources", "Sources", &rows)
}

fn section(id: &str, title: &str, rows: &[(&str, Option<String>)]) -> String {
    let body: String = rows
        .iter()
        .map(|(label, value)| {
            let cell = match value {
                Some(v) => format!(r#"<span class="value">{v}</span>"#),
                None => UNAVAILABLE.to_string(),
            };
            format!(r#"<tr><td class="label">{label}</td><td>{cell}</td></tr>"#)
        })
        .collect();
    format!(r#"<section id="{id}"><h2>{title}</h2><table>{body}</table></section>"#)
}

fn change(delta: Decimal) -> String {
    if delta.is_sign_positive() && !delta.is_zero() {
        format!(r#"<span class="up">+{delta:.4}</span>"#)
    } else if delta.is_sign_negative() && !delta.is_zero() {
        format!(r#"<span class="down">{delta:.4}</span>"#)
    } else {
        format!("{delta:.4}")
    }
}
