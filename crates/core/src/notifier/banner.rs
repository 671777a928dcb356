//! Update banner copy for both notifier variants.

use std::fmt;

/// Text of the update prompt shown to a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner {
    pub title: &'static str,
    pub message: &'static str,
    /// Reload/update action.
    pub primary: &'static str,
    /// Postpone action.
    pub secondary: &'static str,
}

impl Banner {
    /// Shown when polling `version.json` found a new build.
    pub const fn polling() -> Self {
        Self {
            title: "Site Updated!",
            message: "A new version of the site is available with improvements and new features.",
            primary: "Reload Now",
            secondary: "Later",
        }
    }

    /// Shown when the offline worker reports a new build.
    pub const fn worker() -> Self {
        Self {
            title: "New Version Available!",
            message: "We've updated the site with new features and improvements.",
            primary: "Update Now",
            secondary: "Later",
        }
    }
}

impl fmt::Display for Banner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.message)?;
        write!(f, "[{}]  [{}]", self.primary, self.secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let text = Banner::polling().to_string();
        assert_eq!(
            text,
            "Site Updated!\nA new version of the site is available with improvements and new features.\n[Reload Now]  [Later]"
        );
        assert!(Banner::worker().to_string().ends_with("[Update Now]  [Later]"));
    }
}
