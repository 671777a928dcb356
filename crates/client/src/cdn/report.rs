//! Per-provider purge outcomes.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Provider {
    Cloudflare,
    Netlify,
    Vercel,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Cloudflare => "Cloudflare",
            Provider::Netlify => "Netlify",
            Provider::Vercel => "Vercel",
        })
    }
}

/// Outcome of one provider's purge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderResult {
    pub provider: Provider,
    pub success: bool,
    /// HTTP status, absent when the request never completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ProviderResult {
    pub fn succeeded(provider: Provider, status: u16) -> Self {
        Self { provider, success: true, status: Some(status), errors: Vec::new() }
    }

    pub fn failed(provider: Provider, status: Option<u16>, errors: Vec<String>) -> Self {
        Self { provider, success: false, status, errors }
    }
}

impl fmt::Display for ProviderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            return write!(f, "{}: Success", self.provider);
        }
        write!(f, "{}: Failed", self.provider)?;
        for error in &self.errors {
            write!(f, "\n   Error: {error}")?;
        }
        Ok(())
    }
}

/// Results of one `invalidate_all` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    pub results: Vec<ProviderResult>,
    /// Providers without credentials; they are not counted as failures.
    pub skipped: Vec<Provider>,
}

impl InvalidationReport {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.success_count() == self.results.len()
    }
}

impl fmt::Display for InvalidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "{result}")?;
        }
        for provider in &self.skipped {
            writeln!(f, "{provider}: Skipped (not configured)")?;
        }
        write!(f, "Completed: {}/{} providers successful", self.success_count(), self.results.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_and_display() {
        let report = InvalidationReport {
            results: vec![
                ProviderResult::succeeded(Provider::Cloudflare, 200),
                ProviderResult::failed(Provider::Netlify, Some(401), vec!["Unauthorized".into()]),
            ],
            skipped: vec![Provider::Vercel],
        };
        assert_eq!(report.success_count(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(
            report.to_string(),
            "Cloudflare: Success\nNetlify: Failed\n   Error: Unauthorized\nVercel: Skipped (not configured)\nCompleted: 1/2 providers successful"
        );
    }

    #[test]
    fn test_empty_report() {
        let report = InvalidationReport::default();
        assert_eq!(report.success_count(), 0);
        assert!(report.all_succeeded());
    }
}
