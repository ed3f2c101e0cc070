use crate::build_info;
use crate::colormap::ColorScale;
use crate::config::*;
use crate::error::*;
use crate::plot::RenderOptions;
use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::time::Duration;

/// Run an external heat-equation solver and plot its temperature grid.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Solver name, selects `<build-dir>/<method>` and `<results-dir>/<method>/`.
    #[arg(short, long, default_value = "gauss")]
    pub method: String,

    /// Grid rows passed to the solver.
    #[arg(short, long, default_value = "1000")]
    pub rows: usize,

    /// Grid columns passed to the solver.
    #[arg(short, long, default_value = "1000")]
    pub cols: usize,

    /// Convergence tolerance passed to the solver.
    #[arg(short, long, default_value = "0.01")]
    pub tolerance: f64,

    /// Build the solver from source before running it.
    #[arg(long)]
    pub compile: bool,

    /// Compiler used with --compile.
    #[arg(long, default_value = "g++")]
    pub compiler: String,

    /// Extra compiler flag, may be repeated (e.g. --compile-flag=-fopenmp).
    #[arg(long = "compile-flag", allow_hyphen_values = true)]
    pub compile_flags: Vec<String>,

    /// Solver source, defaults to `<source-dir>/<method>.cpp`.
    #[arg(long)]
    pub source: Option<PathBuf>,

    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    #[arg(long, default_value = "build")]
    pub build_dir: PathBuf,

    #[arg(long, default_value = "src")]
    pub source_dir: PathBuf,

    /// Kill the solver after this many seconds.
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Plot resolution.
    #[arg(long, default_value = "300")]
    pub dpi: u32,

    #[arg(long, value_enum, default_value = "hot")]
    pub colormap: ColorScale,

    /// Keep the full figure instead of cropping to its content.
    #[arg(long)]
    pub no_tight: bool,

    /// Open the plot in an image viewer when done.
    #[arg(long)]
    pub show: bool,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print build information and quit
    #[arg(long)]
    pub build_info: bool,
}

impl Args {
    /// Parse the command line, set up logging and handle --build-info.
    pub fn cli_setup(name: &str) -> Self {
        let args = Args::parse();

        if args.build_info {
            build_info::print_report(name);
            std::process::exit(0);
        }

        let level = if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        // Only fails if a logger is already installed.
        let _ = TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        );

        args
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        match self.timeout {
            None => Ok(None),
            Some(s) => Duration::try_from_secs_f64(s).map(Some).map_err(|_| {
                Error::InvalidConfig(format!("invalid timeout {s}"))
            }),
        }
    }

    pub fn run_config(&self) -> Result<RunConfig> {
        let config = RunConfig {
            method: self.method.clone(),
            rows: self.rows,
            cols: self.cols,
            tolerance: self.tolerance,
            compile_first: self.compile,
            layout: ResultLayout {
                results_dir: self.results_dir.clone(),
                build_dir: self.build_dir.clone(),
                source_dir: self.source_dir.clone(),
            },
            compile: CompileConfig {
                compiler: self.compiler.clone(),
                flags: self.compile_flags.clone(),
                source: self.source.clone(),
            },
            timeout: self.timeout()?,
            render: RenderOptions {
                dpi: self.dpi,
                tight: !self.no_tight,
                color_scale: self.colormap,
                ..Default::default()
            },
            show: self.show,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let args = Args::parse_from(["heatrun"]);
        let config = args.run_config().unwrap();
        assert_eq!(config.method, "gauss");
        assert_eq!((config.rows, config.cols), (1000, 1000));
        assert_eq!(config.tolerance, 0.01);
        assert!(!config.compile_first);
        assert!(!config.show);
        assert_eq!(config.timeout, None);
        assert_eq!(config.render, RenderOptions::default());
        assert_eq!(config.layout, ResultLayout::default());
        assert_eq!(config.compile, CompileConfig::default());
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "heatrun",
            "--method",
            "jacobi2d",
            "-r",
            "50",
            "-c",
            "60",
            "-t",
            "0.5",
            "--compile",
            "--compile-flag=-fopenmp",
            "--compile-flag",
            "-O2",
            "--source",
            "parallel/jacobi2d.cpp",
            "--timeout",
            "2.5",
            "--colormap",
            "inferno",
            "--dpi",
            "100",
        ]);
        let config = args.run_config().unwrap();
        assert_eq!(config.method, "jacobi2d");
        assert_eq!((config.rows, config.cols), (50, 60));
        assert!(config.compile_first);
        assert_eq!(config.compile.flags, vec!["-fopenmp", "-O2"]);
        assert_eq!(config.source_path(), PathBuf::from("parallel/jacobi2d.cpp"));
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.render.color_scale, ColorScale::Inferno);
        assert_eq!(config.render.dpi, 100);
    }

    #[test]
    fn rejects_negative_timeout() {
        let args = Args::parse_from(["heatrun", "--timeout=-1"]);
        assert!(matches!(args.run_config(), Err(Error::InvalidConfig(_))));
    }
}
