use anyhow::{Context, Result};

/// Open the dashboard (or any URL) in the user's default browser
///
/// # Errors
/// Returns error if no browser can be launched, e.g. on a headless host
pub fn open_url(url: &str) -> Result<()> {
    tracing::debug!(url, "opening browser");
    webbrowser::open(url).with_context(|| format!("Failed to open browser for {}", url))?;
    Ok(())
}

/// Dashboard URL for a bind address; wildcard binds are opened via localhost
pub fn dashboard_url(bind: &str, port: u16) -> String {
    let host = match bind {
        "0.0.0.0" | "::" | "[::]" | "" => "127.0.0.1",
        other => other,
    };
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{}]:{}/", host, port)
    } else {
        format!("http://{}:{}/", host, port)
    }
}
