//! Run configuration
//!
//! A `RunConfig` is built once, validated, and then handed by reference
//! to every stage of the pipeline.

use crate::error::*;
use crate::plot::RenderOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the solver lives and where results land.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultLayout {
    pub results_dir: PathBuf,
    pub build_dir: PathBuf,
    pub source_dir: PathBuf,
}

impl Default for ResultLayout {
    fn default() -> Self {
        ResultLayout {
            results_dir: PathBuf::from("results"),
            build_dir: PathBuf::from("build"),
            source_dir: PathBuf::from("src"),
        }
    }
}

impl ResultLayout {
    /// All layout directories below a common root.
    pub fn rooted<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        ResultLayout {
            results_dir: root.join("results"),
            build_dir: root.join("build"),
            source_dir: root.join("src"),
        }
    }

    pub fn method_dir(&self, method: &str) -> PathBuf {
        self.results_dir.join(method)
    }

    pub fn output_path(&self, method: &str) -> PathBuf {
        self.method_dir(method).join("output.txt")
    }

    pub fn time_path(&self, method: &str) -> PathBuf {
        self.method_dir(method).join("execution_time.txt")
    }

    pub fn plot_path(&self, method: &str) -> PathBuf {
        let mut result = self.results_dir.join("plots");
        result.push(format!("temperature_distribution_{method}.png"));
        result
    }

    pub fn executable_path(&self, method: &str) -> PathBuf {
        self.build_dir.join(method)
    }

    pub fn source_path(&self, method: &str) -> PathBuf {
        self.source_dir.join(format!("{method}.cpp"))
    }
}

/// How to build the solver when `compile_first` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileConfig {
    pub compiler: String,
    pub flags: Vec<String>,
    /// Overrides `ResultLayout::source_path`.
    pub source: Option<PathBuf>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            compiler: "g++".to_string(),
            flags: Vec::new(),
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub method: String,
    pub rows: usize,
    pub cols: usize,
    pub tolerance: f64,
    pub compile_first: bool,
    pub layout: ResultLayout,
    pub compile: CompileConfig,
    /// Kill the solver if it runs longer than this.
    pub timeout: Option<Duration>,
    pub render: RenderOptions,
    /// Open the plot in a viewer once it is written.
    pub show: bool,
}

impl RunConfig {
    /// Create a configuration with default layout and rendering,
    /// checking the solver parameters.
    pub fn new(
        method: &str,
        rows: usize,
        cols: usize,
        tolerance: f64,
    ) -> Result<Self> {
        let result = RunConfig {
            method: method.to_string(),
            rows,
            cols,
            tolerance,
            compile_first: false,
            layout: ResultLayout::default(),
            compile: CompileConfig::default(),
            timeout: None,
            render: RenderOptions::default(),
            show: false,
        };
        result.validate()?;
        Ok(result)
    }

    pub fn validate(&self) -> Result<()> {
        if self.method.is_empty()
            || self
                .method
                .chars()
                .any(|c| std::path::is_separator(c) || c.is_whitespace())
        {
            return Err(Error::InvalidConfig(format!(
                "method {:?} must be a non-empty name without path separators",
                self.method
            )));
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid dimensions must be positive, got {} x {}",
                self.rows, self.cols
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        if let Some(t) = self.timeout {
            if t.is_zero() {
                return Err(Error::InvalidConfig(
                    "timeout must be greater than zero".to_string(),
                ));
            }
        }
        self.render.validate()
    }

    /// Solver arguments in the order the solver expects them.
    pub fn solver_args(&self) -> [String; 3] {
        [
            self.rows.to_string(),
            self.cols.to_string(),
            self.tolerance.to_string(),
        ]
    }

    pub fn executable_path(&self) -> PathBuf {
        self.layout.executable_path(&self.method)
    }

    pub fn source_path(&self) -> PathBuf {
        self.compile
            .source
            .clone()
            .unwrap_or_else(|| self.layout.source_path(&self.method))
    }

    pub fn output_path(&self) -> PathBuf {
        self.layout.output_path(&self.method)
    }

    pub fn time_path(&self) -> PathBuf {
        self.layout.time_path(&self.method)
    }

    pub fn plot_path(&self) -> PathBuf {
        self.layout.plot_path(&self.method)
    }

    pub fn plot_title(&self) -> String {
        format!("Temperature Distribution ({})", self.method)
    }
}
