//! Orchestrator
//!
//! Runs compile (optional), solve, parse and render in order. The first
//! failure ends the run; nothing is retried.

use crate::config::RunConfig;
use crate::error::*;
use crate::parser::{self, SolverHeader};
use crate::plot::{self, PlotArtifact};
use crate::runner::{self, CancelToken, RunResult};
use crate::display;
use log::{debug, error, info, warn};

/// The unit of work a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Configuring,
    Compiling,
    Running,
    Parsing,
    Rendering,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Configuring => "configuration",
            Step::Compiling => "compilation",
            Step::Running => "execution",
            Step::Parsing => "parsing",
            Step::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Compiling,
    Running,
    Parsing,
    Rendering,
    Done,
    /// Carries the step that was in progress.
    Failed(Step),
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed(_))
    }

    /// Step in progress while in this stage, `None` for terminal stages.
    pub fn step(&self) -> Option<Step> {
        match self {
            Stage::Idle => Some(Step::Configuring),
            Stage::Compiling => Some(Step::Compiling),
            Stage::Running => Some(Step::Running),
            Stage::Parsing => Some(Step::Parsing),
            Stage::Rendering => Some(Step::Rendering),
            Stage::Done | Stage::Failed(_) => None,
        }
    }
}

/// User-facing description of a failure, naming the step it happened in.
pub fn failure_message(step: Step, e: &Error) -> String {
    format!("{step}: {e}")
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub run: RunResult,
    pub header: SolverHeader,
    pub grid_shape: (usize, usize),
    pub artifact: PlotArtifact,
}

pub struct Pipeline {
    config: RunConfig,
    cancel: Option<CancelToken>,
    history: Vec<Stage>,
}

impl Pipeline {
    pub fn new(config: RunConfig) -> Self {
        Pipeline {
            config,
            cancel: None,
            history: vec![Stage::Idle],
        }
    }

    /// Let another thread stop the solver through `token`.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        *self.history.last().unwrap_or(&Stage::Idle)
    }

    /// The step a failed run stopped in.
    pub fn failed_step(&self) -> Option<Step> {
        match self.stage() {
            Stage::Failed(step) => Some(step),
            _ => None,
        }
    }

    /// Every stage entered so far, starting with `Idle`.
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    fn enter(&mut self, next: Stage) {
        debug!("Pipeline: {:?} -> {:?}", self.stage(), next);
        self.history.push(next);
    }

    pub fn run(&mut self) -> Result<Outcome> {
        if self.stage() != Stage::Idle {
            return Err(Error::InvalidConfig(
                "a pipeline can only be run once".to_string(),
            ));
        }
        match self.run_stages() {
            Ok(outcome) => {
                self.enter(Stage::Done);
                Ok(outcome)
            }
            Err(e) => {
                let step = self.stage().step().unwrap_or(Step::Configuring);
                error!("{} failed: {}", step, e);
                self.enter(Stage::Failed(step));
                Err(e)
            }
        }
    }

    fn run_stages(&mut self) -> Result<Outcome> {
        self.config.validate()?;

        let executable = if self.config.compile_first {
            self.enter(Stage::Compiling);
            runner::compile(&self.config)?
        } else {
            self.config.executable_path()
        };

        self.enter(Stage::Running);
        let run = runner::run(&executable, &self.config, self.cancel.as_ref())?;

        self.enter(Stage::Parsing);
        let parsed = parser::parse(&run.raw_output_path)?;
        let header = parsed.header;
        if let Some(iter) = header.iterations() {
            info!(
                "Solver converged after {} iterations (difmax {})",
                iter,
                header
                    .max_difference()
                    .map_or("unknown".to_string(), |d| d.to_string())
            );
        }
        if let Some((rows, cols, _)) = header.echoed_parameters() {
            if (rows, cols) != (self.config.rows, self.config.cols) {
                warn!(
                    "Solver reports a {} x {} grid, requested {} x {}",
                    rows, cols, self.config.rows, self.config.cols
                );
            }
        }

        self.enter(Stage::Rendering);
        let artifact = plot::render(
            &parsed.grid,
            &self.config.plot_title(),
            &self.config.plot_path(),
            &self.config.render,
        )?;

        if self.config.show {
            display::show(&artifact.path);
        }

        Ok(Outcome {
            run,
            header,
            grid_shape: parsed.grid.shape(),
            artifact,
        })
    }
}
