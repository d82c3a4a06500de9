use chrono::NaiveDate;
use sqlx::AnyPool;
use swing_core::SwingError;

/// Plain-text per-ticker report: current state, last 5 reason-code
/// decisions, and current state-attrs. This is not a reporting subsystem —
/// just the minimal consumer needed to exercise the persisted rows
/// end-to-end (spec §10.6), in the style of `validation`'s comparison
/// summaries.
pub async fn render_report(pool: &AnyPool, ticker: &str, as_of: NaiveDate) -> Result<String, SwingError> {
    let mut out = String::new();
    out.push_str(&format!("== {ticker} as of {as_of} ==\n"));

    let recent = swing_storage::state_store::fetch_recent_state_daily(pool, ticker, as_of, 5).await?;
    let Some(latest) = recent.first() else {
        out.push_str("  (no evaluations recorded)\n");
        return Ok(out);
    };

    out.push_str(&format!("  state: {}\n", latest.state));
    out.push_str(&format!("  age:   {}\n", latest.age));

    match &latest.state_attrs_json {
        Some(attrs) => out.push_str(&format!("  attrs: {attrs}\n")),
        None => out.push_str("  attrs: (none)\n"),
    }

    out.push_str("  recent decisions:\n");
    for row in &recent {
        let reasons: Vec<&str> = row.reasons.iter().map(|r| r.code()).collect();
        out.push_str(&format!("    {} {} <- {}\n", row.date, row.state, reasons.join(", ")));
    }

    if let Some((fastpass, rolling, _legacy)) =
        swing_storage::ew_score_store::fetch_scores(pool, ticker, as_of).await?
    {
        out.push_str("  ew scores:\n");
        if let Some(s) = fastpass {
            out.push_str(&format!("    fastpass: {s:.4}\n"));
        }
        if let Some(s) = rolling {
            out.push_str(&format!("    rolling:  {s:.4}\n"));
        }
    }

    Ok(out)
}
