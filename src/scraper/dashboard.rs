use super::parse::parse_count;
use super::session::{BrowserLauncher, BrowserSession, ElementRef};
use super::{DashboardSource, ScrapeError};
use crate::snapshot_store::{CountryValue, DashboardSnapshot, Metric};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_DASHBOARD_URL: &str = "https://coronavirus.app/map";

const LABEL_XPATH: &str = r#"//div[@class="map-sidebar-section-item"]/div[2]/div[1]"#;
const VALUE_XPATH: &str = r#"//div[@class="map-sidebar-section-item"]/div[3]"#;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Scrapes the sidebar of the coronavirus.app world map.
///
/// The page opens on total cases; deaths are reached through the metric
/// selector in the sidebar header.
pub struct CoronavirusAppSource {
    launcher: Box<dyn BrowserLauncher>,
    dashboard_url: String,
    switch_timeout: Duration,
}

impl CoronavirusAppSource {
    pub fn new(
        launcher: Box<dyn BrowserLauncher>,
        dashboard_url: impl Into<String>,
        switch_timeout: Duration,
    ) -> Self {
        Self {
            launcher,
            dashboard_url: dashboard_url.into(),
            switch_timeout,
        }
    }

    fn scrape(&self, session: &dyn BrowserSession) -> Result<DashboardSnapshot, ScrapeError> {
        session.navigate(&self.dashboard_url)?;

        let totals = extract_rows(session)?;
        debug!("Extracted {} total rows", totals.len());

        self.switch_metric(session, Metric::Total, Metric::Death)?;

        let deaths = extract_rows(session)?;
        debug!("Extracted {} death rows", deaths.len());

        Ok(DashboardSnapshot { totals, deaths })
    }

    fn switch_metric(
        &self,
        session: &dyn BrowserSession,
        from: Metric,
        to: Metric,
    ) -> Result<(), ScrapeError> {
        let menu_xpath = format!(r#"//span[text()="{}"]"#, from.label());
        let option_xpath = format!(r#"//div[text()="{}"]"#, to.label());
        let selected_xpath = format!(r#"//span[text()="{}"]"#, to.label());

        let menu = session
            .find_elements(&menu_xpath)?
            .into_iter()
            .next()
            .ok_or(ScrapeError::ElementNotFound(menu_xpath))?;
        session.click(&menu)?;

        let option = wait_for(session, &option_xpath, self.switch_timeout, |s, e| {
            Ok(s.is_displayed(e)? && s.is_enabled(e)?)
        })?;
        session.click(&option)?;

        wait_for(session, &selected_xpath, self.switch_timeout, |s, e| {
            s.is_displayed(e)
        })?;
        Ok(())
    }
}

impl DashboardSource for CoronavirusAppSource {
    fn name(&self) -> &str {
        "coronavirus.app"
    }

    fn fetch(&self) -> Result<DashboardSnapshot, ScrapeError> {
        let mut session = self.launcher.launch()?;
        let result = self.scrape(session.as_ref());
        if let Err(e) = session.close() {
            warn!("Failed to close browser session: {}", e);
        }

        if let Ok(snapshot) = &result {
            info!(
                "Scraped {}: {} totals, {} deaths",
                self.dashboard_url,
                snapshot.totals.len(),
                snapshot.deaths.len()
            );
        }
        result
    }
}

/// Pair the sidebar labels with the sidebar values by position.
fn extract_rows(session: &dyn BrowserSession) -> Result<Vec<CountryValue>, ScrapeError> {
    let labels = session.find_elements(LABEL_XPATH)?;
    let values = session.find_elements(VALUE_XPATH)?;
    if labels.len() != values.len() {
        return Err(ScrapeError::CountMismatch {
            labels: labels.len(),
            values: values.len(),
        });
    }

    labels
        .iter()
        .zip(values.iter())
        .map(|(label, value)| {
            let name = session.text(label)?.trim().to_string();
            let count = parse_count(&session.text(value)?)?;
            Ok(CountryValue::new(name, count))
        })
        .collect()
}

/// Poll until the first element matching `xpath` satisfies `ready`.
fn wait_for<F>(
    session: &dyn BrowserSession,
    xpath: &str,
    timeout: Duration,
    ready: F,
) -> Result<ElementRef, ScrapeError>
where
    F: Fn(&dyn BrowserSession, &ElementRef) -> Result<bool, ScrapeError>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(element) = session.find_elements(xpath)?.into_iter().next() {
            if ready(session, &element)? {
                return Ok(element);
            }
        }
        if Instant::now() >= deadline {
            return Err(ScrapeError::Timeout {
                xpath: xpath.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
