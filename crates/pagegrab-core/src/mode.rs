use serde::{Deserialize, Serialize};

/// Whether the editing loop is allowed to run.
///
/// The endpoint mutates source files through the assistant, so anything that
/// isn't explicitly `Development` is treated as a deployed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Development => "development",
            RunMode::Production => "production",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(RunMode::Development),
            "production" | "prod" => Some(RunMode::Production),
            _ => None,
        }
    }

    pub fn is_development(&self) -> bool {
        *self == RunMode::Development
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RunMode::Development => "Development (editing enabled)",
            RunMode::Production => "Production (editing disabled)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_short_names() {
        assert_eq!(RunMode::from_str("dev"), Some(RunMode::Development));
        assert_eq!(RunMode::from_str(" Development "), Some(RunMode::Development));
        assert_eq!(RunMode::from_str("prod"), Some(RunMode::Production));
        assert_eq!(RunMode::from_str("staging"), None);
    }

    #[test]
    fn test_default_is_production() {
        assert!(!RunMode::default().is_development());
    }
}
