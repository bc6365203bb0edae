use super::ScrapeError;

/// Opaque handle to an element of the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

/// The handful of browser operations the dashboard scrape needs.
pub trait BrowserSession: Send {
    fn navigate(&self, url: &str) -> Result<(), ScrapeError>;

    /// All elements matching `xpath`, in document order. No match is not an error.
    fn find_elements(&self, xpath: &str) -> Result<Vec<ElementRef>, ScrapeError>;

    fn text(&self, element: &ElementRef) -> Result<String, ScrapeError>;

    fn is_displayed(&self, element: &ElementRef) -> Result<bool, ScrapeError>;

    fn is_enabled(&self, element: &ElementRef) -> Result<bool, ScrapeError>;

    fn click(&self, element: &ElementRef) -> Result<(), ScrapeError>;

    /// Tear down the browser. Called exactly once per session.
    fn close(&mut self) -> Result<(), ScrapeError>;
}

/// Starts a new browser session for each scrape.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}
