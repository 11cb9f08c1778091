use std::fmt;

/// Mean and sample standard deviation of one parameter's error.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterStats {
    pub name: &'static str,
    pub count: usize,
    pub mean: f64,
    /// Divides by `n - 1`; zero with fewer than two samples.
    pub stddev: f64,
}

impl fmt::Display for ParameterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<11} {:>8.3} +/- {:<8.3} (n={})",
            format!("{}:", self.name),
            self.mean,
            self.stddev,
            self.count
        )
    }
}

#[derive(Clone, Debug, Default)]
struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

impl Accumulator {
    // Welford's online update.
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn stddev(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }
}

/// Per-parameter error accumulator. Parameters are reported in the order
/// they were registered.
#[derive(Clone, Debug)]
pub struct ErrorStatistics {
    parameters: Vec<(&'static str, Accumulator)>,
}

impl ErrorStatistics {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            parameters: names.iter().map(|&n| (n, Accumulator::default())).collect(),
        }
    }

    /// Adds one `truth - estimate` error. Unregistered names and
    /// non-finite errors are ignored.
    pub fn record(&mut self, name: &str, error: f64) {
        if !error.is_finite() {
            log::debug!("Ignoring non-finite {name} error");
            return;
        }
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some((_, acc)) => acc.push(error),
            None => log::debug!("Ignoring unregistered parameter {name}"),
        }
    }

    pub fn parameters(&self) -> Vec<ParameterStats> {
        self.parameters
            .iter()
            .map(|(name, acc)| ParameterStats {
                name: *name,
                count: acc.count,
                mean: acc.mean,
                stddev: acc.stddev(),
            })
            .collect()
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterStats> {
        self.parameters().into_iter().find(|p| p.name == name)
    }
}
