//! Table detection parameters.

/// Tunable parameters for border-cluster table detection.
///
/// A config is scoped to one extraction call: the engine copies its base
/// config, applies any per-call overrides, and passes the result down by
/// value. There is no process-wide mutable state to reset afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionConfig {
    /// Minimum member-cell count for a border cluster to survive the noise
    /// filter. A lone border segment should not become a table.
    pub min_cluster_size: usize,

    /// Minimum non-empty-cell ratio a boundary row/column needs to be kept
    /// during trimming. 0.0 disables the ratio check.
    pub min_non_empty_ratio: f64,

    /// When true, boundary rows/columns without any inside-border segment are
    /// trimmed as well.
    pub require_inside_border: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 4,
            min_non_empty_ratio: 0.0,
            require_inside_border: false,
        }
    }
}

impl DetectionConfig {
    /// Config with the given minimum cluster size.
    pub fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Config with the given non-empty-ratio threshold.
    pub fn with_min_non_empty_ratio(mut self, ratio: f64) -> Self {
        self.min_non_empty_ratio = ratio;
        self
    }

    /// Config requiring inside borders on kept rows/columns.
    pub fn with_require_inside_border(mut self, required: bool) -> Self {
        self.require_inside_border = required;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.min_cluster_size, 4);
        assert_eq!(config.min_non_empty_ratio, 0.0);
        assert!(!config.require_inside_border);
    }

    #[test]
    fn test_builder_overrides() {
        let config = DetectionConfig::default()
            .with_min_cluster_size(9)
            .with_min_non_empty_ratio(0.5)
            .with_require_inside_border(true);
        assert_eq!(config.min_cluster_size, 9);
        assert_eq!(config.min_non_empty_ratio, 0.5);
        assert!(config.require_inside_border);
    }
}
