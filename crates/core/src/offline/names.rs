//! Versioned cache partition names.

use super::route::Partition;

/// The two cache names owned by one worker version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    prefix: String,
    version: String,
}

impl CacheNames {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), version: version.into() }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Build-time assets: fonts, styles, scripts, precached pages.
    pub fn static_name(&self) -> String {
        format!("{}-static-{}", self.prefix, self.version)
    }

    /// Runtime-fetched resources: images and navigations.
    pub fn dynamic_name(&self) -> String {
        format!("{}-dynamic-{}", self.prefix, self.version)
    }

    pub fn name_for(&self, partition: Partition) -> String {
        match partition {
            Partition::Static => self.static_name(),
            Partition::Dynamic => self.dynamic_name(),
        }
    }

    /// A cache survives activation only if it carries one of the current names.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name() || name == self.dynamic_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let names = CacheNames::new("james-oliver-wedding", "v4");
        assert_eq!(names.static_name(), "james-oliver-wedding-static-v4");
        assert_eq!(names.dynamic_name(), "james-oliver-wedding-dynamic-v4");
        assert_eq!(names.name_for(Partition::Dynamic), names.dynamic_name());
    }

    #[test]
    fn test_is_current() {
        let names = CacheNames::new("site", "v2");
        assert!(names.is_current("site-static-v2"));
        assert!(names.is_current("site-dynamic-v2"));
        assert!(!names.is_current("site-static-v1"));
        assert!(!names.is_current("james-oliver-wedding-v1"));
    }
}
