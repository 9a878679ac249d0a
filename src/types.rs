use std::str::FromStr;
use serde::Deserialize;

/// What to do with a task input that no task in the run produces and that
/// does not exist on disk when the graph is built.
///
/// - `Warn`: log it and emit a warning diagnostic; the task still runs and
///   will most likely fail on its own (default behaviour).
/// - `Error`: treat it as a structural error; nothing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingInputPolicy {
    Warn,
    Error,
}

impl Default for MissingInputPolicy {
    fn default() -> Self {
        MissingInputPolicy::Warn
    }
}

impl FromStr for MissingInputPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "warn" => Ok(MissingInputPolicy::Warn),
            "error" => Ok(MissingInputPolicy::Error),
            other => Err(format!(
                "invalid missing_inputs: {other} (expected \"warn\" or \"error\")"
            )),
        }
    }
}

/// Severity of a [`crate::diagnostics::Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_policy_case_insensitively() {
        assert_eq!("WARN".parse::<MissingInputPolicy>(), Ok(MissingInputPolicy::Warn));
        assert_eq!(" error ".parse::<MissingInputPolicy>(), Ok(MissingInputPolicy::Error));
        assert!("strict".parse::<MissingInputPolicy>().is_err());
    }
}
