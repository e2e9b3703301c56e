//! Two-dimensional histograms used by the cut QA.
//!
//! Counts are stored in row-major order: `counts[iy * nx + ix]`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bin edges spaced uniformly on `[low, high]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn uniform_edges(n_bins: usize, low: f64, high: f64) -> Vec<f64> {
    let width = (high - low) / n_bins as f64;
    (0..=n_bins).map(|i| low + width * i as f64).collect()
}

/// Bin edges spaced logarithmically on `[low, high]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn log_edges(n_bins: usize, low: f64, high: f64) -> Vec<f64> {
    let factor = (high / low).powf(1.0 / n_bins as f64);
    let mut edges = Vec::with_capacity(n_bins + 1);
    let mut edge = low;
    edges.push(edge);
    for _ in 0..n_bins {
        edge *= factor;
        edges.push(edge);
    }
    edges
}

/// Index of the bin containing `value`, `None` outside the axis.
fn find_bin(edges: &[f64], value: f64) -> Option<usize> {
    let first = *edges.first()?;
    let last = *edges.last()?;
    if !(first..last).contains(&value) {
        return None;
    }
    Some(edges.partition_point(|&edge| edge <= value) - 1)
}

/// Counting histogram over two variable-width axes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Histogram2D {
    name: String,
    title: String,
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    counts: Vec<u64>,
    entries: u64,
}

impl Histogram2D {
    /// Creates an empty histogram.
    ///
    /// # Arguments
    ///
    /// * `name` - Storage name
    /// * `title` - Title with axis labels, `;`-separated
    /// * `x_edges` - Monotonic bin edges of the x axis
    /// * `y_edges` - Monotonic bin edges of the y axis
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        x_edges: Vec<f64>,
        y_edges: Vec<f64>,
    ) -> Self {
        let nx = x_edges.len().saturating_sub(1);
        let ny = y_edges.len().saturating_sub(1);
        Self {
            name: name.into(),
            title: title.into(),
            x_edges,
            y_edges,
            counts: vec![0; nx * ny],
            entries: 0,
        }
    }

    /// Adds one entry. Values outside the axes only count as entries.
    pub fn fill(&mut self, x: f64, y: f64) {
        self.entries += 1;
        if let Some((ix, iy)) = self.bin_of(x, y) {
            let idx = iy * self.nx() + ix;
            self.counts[idx] += 1;
        }
    }

    /// Bin indices of a point.
    #[must_use]
    pub fn bin_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        Some((find_bin(&self.x_edges, x)?, find_bin(&self.y_edges, y)?))
    }

    /// Count in one bin.
    #[must_use]
    pub fn count(&self, ix: usize, iy: usize) -> u64 {
        if ix >= self.nx() || iy >= self.ny() {
            return 0;
        }
        self.counts[iy * self.nx() + ix]
    }

    /// Number of x bins.
    #[must_use]
    pub fn nx(&self) -> usize {
        self.x_edges.len().saturating_sub(1)
    }

    /// Number of y bins.
    #[must_use]
    pub fn ny(&self) -> usize {
        self.y_edges.len().saturating_sub(1)
    }

    /// Number of fills, in range or not.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of all in-range bins.
    #[must_use]
    pub fn integral(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Storage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Bin edges of the x axis.
    #[must_use]
    pub fn x_edges(&self) -> &[f64] {
        &self.x_edges
    }
}
