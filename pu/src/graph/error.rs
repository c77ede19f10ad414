//! Graph error types

use thiserror::Error;

/// Errors that can occur while ordering pipelines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Cyclic dependency detected: {}", format_cycle(.members))]
    CyclicDependency { members: Vec<String> },
}

impl GraphError {
    /// Pipelines on the detected cycle, in edge order
    pub fn cycle(&self) -> &[String] {
        match self {
            GraphError::CyclicDependency { members } => members,
        }
    }
}

fn format_cycle(members: &[String]) -> String {
    match members.first() {
        Some(first) => format!("{} -> {}", members.join(" -> "), first),
        None => "(unknown members)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_display_closes_the_loop() {
        let err = GraphError::CyclicDependency {
            members: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: A -> B -> A");
        assert_eq!(err.cycle(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_self_cycle_display() {
        let err = GraphError::CyclicDependency {
            members: vec!["A".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: A -> A");
    }
}
