//! Grid search over unwrapping parameters.
//!
//! Every combination of `angle_threshold` and `min_island_faces` in a
//! [`ParameterGrid`] is unwrapped and scored with a [`Metric`]. Combinations
//! whose unwrap fails are logged and skipped.

use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};

use super::metrics::QualityMetrics;
use super::unwrap::{unwrap, UnwrapOptions};
use super::Progress;
use crate::error::{MeshError, Result};
use crate::mesh::TriMesh;

/// Quality measure to optimize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Minimize the maximum stretch.
    #[default]
    Stretch,
    /// Maximize the covered fraction of the unit square.
    Coverage,
}

impl Metric {
    /// Extract this metric's value.
    ///
    /// A layout with collapsed triangles has unbounded stretch, so its
    /// stretch value is infinite.
    pub fn value(self, metrics: &QualityMetrics) -> f64 {
        match self {
            Metric::Stretch if metrics.has_collapsed_triangles() => f64::INFINITY,
            Metric::Stretch => metrics.max_stretch,
            Metric::Coverage => metrics.coverage,
        }
    }

    /// Whether `candidate` strictly improves on `best`.
    pub fn is_better(self, candidate: f64, best: f64) -> bool {
        match self {
            Metric::Stretch => candidate < best,
            Metric::Coverage => candidate > best,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Stretch => write!(f, "stretch"),
            Metric::Coverage => write!(f, "coverage"),
        }
    }
}

impl FromStr for Metric {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stretch" => Ok(Metric::Stretch),
            "coverage" => Ok(Metric::Coverage),
            _ => Err(MeshError::invalid_param("metric", s, "expected 'stretch' or 'coverage'")),
        }
    }
}

/// Values to try for each tuned parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    /// Candidate angle thresholds in degrees.
    pub angle_thresholds: Vec<f64>,
    /// Candidate minimum island sizes.
    pub min_island_faces: Vec<usize>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            angle_thresholds: vec![20.0, 30.0, 40.0],
            min_island_faces: vec![3, 5, 10],
        }
    }
}

impl ParameterGrid {
    /// Set the angle thresholds to try.
    pub fn with_angle_thresholds(mut self, values: Vec<f64>) -> Self {
        self.angle_thresholds = values;
        self
    }

    /// Set the minimum island sizes to try.
    pub fn with_min_island_faces(mut self, values: Vec<usize>) -> Self {
        self.min_island_faces = values;
        self
    }

    /// Number of combinations.
    pub fn len(&self) -> usize {
        self.angle_thresholds.len() * self.min_island_faces.len()
    }

    /// Whether the grid has no combinations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All combinations, angle-major.
    pub fn combinations(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.angle_thresholds
            .iter()
            .flat_map(move |&angle| self.min_island_faces.iter().map(move |&faces| (angle, faces)))
    }
}

/// One evaluated combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    /// Angle threshold used.
    pub angle_threshold: f64,
    /// Minimum island size used.
    pub min_island_faces: usize,
    /// Metric value reached.
    pub value: f64,
}

/// Outcome of a grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct TuneResult {
    /// Metric that was optimized.
    pub metric: Metric,
    /// Best trial, or `None` if every combination failed.
    pub best: Option<Trial>,
    /// Every successful trial in evaluation order.
    pub trials: Vec<Trial>,
    /// Number of combinations whose unwrap failed.
    pub failures: usize,
}

impl TuneResult {
    /// `base` with the best parameters applied, if any trial succeeded.
    pub fn best_options(&self, base: &UnwrapOptions) -> Option<UnwrapOptions> {
        self.best.map(|t| {
            base.clone()
                .with_angle_threshold(t.angle_threshold)
                .with_min_island_faces(t.min_island_faces)
        })
    }
}

/// Search `grid` for the parameters that optimize `metric`.
///
/// `base` supplies every option that is not tuned. Metrics are always
/// computed. On ties the earliest combination wins.
///
/// # Errors
///
/// Returns [`MeshError::InvalidParameter`] if the grid is empty.
pub fn optimize(
    mesh: &TriMesh,
    grid: &ParameterGrid,
    metric: Metric,
    base: &UnwrapOptions,
) -> Result<TuneResult> {
    optimize_with_progress(mesh, grid, metric, base, &Progress::none())
}

/// Like [`optimize`], reporting after each combination.
///
/// # Errors
///
/// Same as [`optimize`].
pub fn optimize_with_progress(
    mesh: &TriMesh,
    grid: &ParameterGrid,
    metric: Metric,
    base: &UnwrapOptions,
    progress: &Progress,
) -> Result<TuneResult> {
    if grid.is_empty() {
        return Err(MeshError::invalid_param("grid", grid.len(), "must contain at least one combination"));
    }

    let total = grid.len();
    let mut trials = Vec::with_capacity(total);
    let mut best: Option<Trial> = None;
    let mut failures = 0;

    for (i, (angle, min_faces)) in grid.combinations().enumerate() {
        progress.report(i, total, "Evaluating parameters");
        let options = base
            .clone()
            .with_angle_threshold(angle)
            .with_min_island_faces(min_faces)
            .with_metrics(true);

        match unwrap(mesh, &options) {
            Ok((_, result)) => {
                let trial = Trial {
                    angle_threshold: angle,
                    min_island_faces: min_faces,
                    value: metric.value(&result.metrics),
                };
                debug!(
                    "[{}/{}] angle {:.1}, min faces {} -> {} {:.4}",
                    i + 1,
                    total,
                    angle,
                    min_faces,
                    metric,
                    trial.value
                );
                if best.map_or(true, |b| metric.is_better(trial.value, b.value)) {
                    best = Some(trial);
                }
                trials.push(trial);
            }
            Err(e) => {
                warn!("[{}/{}] angle {}, min faces {} failed: {}", i + 1, total, angle, min_faces, e);
                failures += 1;
            }
        }
    }
    progress.report(total, total, "Done");

    if let Some(b) = best {
        info!(
            "best parameters: angle {:.1}, min faces {} ({} {:.4})",
            b.angle_threshold, b.min_island_faces, metric, b.value
        );
    }

    Ok(TuneResult {
        metric,
        best,
        trials,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;

    #[test]
    fn test_default_grid() {
        let grid = ParameterGrid::default();
        assert_eq!(grid.len(), 9);
        let combos: Vec<_> = grid.combinations().collect();
        assert_eq!(combos[0], (20.0, 3));
        assert_eq!(combos[1], (20.0, 5));
        assert_eq!(combos[8], (40.0, 10));
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("stretch".parse::<Metric>().unwrap(), Metric::Stretch);
        assert_eq!("Coverage".parse::<Metric>().unwrap(), Metric::Coverage);
        assert!("speed".parse::<Metric>().is_err());
        assert_eq!(Metric::Coverage.to_string(), "coverage");
    }

    #[test]
    fn test_direction() {
        assert!(Metric::Stretch.is_better(1.1, 1.5));
        assert!(!Metric::Stretch.is_better(1.5, 1.5));
        assert!(Metric::Coverage.is_better(0.6, 0.5));
    }

    #[test]
    fn test_collapsed_layout_has_infinite_stretch() {
        let mut metrics = QualityMetrics::placeholder();
        assert_eq!(Metric::Stretch.value(&metrics), 1.0);

        metrics.collapsed_triangles = 3;
        assert_eq!(Metric::Stretch.value(&metrics), f64::INFINITY);
        assert_eq!(Metric::Coverage.value(&metrics), 0.0);
        assert!(Metric::Stretch.is_better(4.0, Metric::Stretch.value(&metrics)));
    }

    #[test]
    fn test_ties_keep_first_combination() {
        let mesh = primitives::grid(3, 3).unwrap();
        let result = optimize(
            &mesh,
            &ParameterGrid::default(),
            Metric::Stretch,
            &UnwrapOptions::default(),
        )
        .unwrap();

        assert_eq!(result.trials.len(), 9);
        assert_eq!(result.failures, 0);
        let best = result.best.unwrap();
        assert_eq!((best.angle_threshold, best.min_island_faces), (20.0, 3));
    }

    #[test]
    fn test_failed_combinations_skipped() {
        let mesh = primitives::cube();
        let grid = ParameterGrid::default()
            .with_angle_thresholds(vec![f64::NAN, 30.0])
            .with_min_island_faces(vec![5]);
        let result = optimize(&mesh, &grid, Metric::Coverage, &UnwrapOptions::default()).unwrap();

        assert_eq!(result.failures, 1);
        assert_eq!(result.trials.len(), 1);
        let options = result.best_options(&UnwrapOptions::default()).unwrap();
        assert_eq!(options.angle_threshold, 30.0);
    }

    #[test]
    fn test_empty_grid() {
        let mesh = primitives::cube();
        let grid = ParameterGrid::default().with_min_island_faces(Vec::new());
        assert!(optimize(&mesh, &grid, Metric::Stretch, &UnwrapOptions::default()).is_err());
    }
}
