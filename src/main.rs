use heatrun::cli::Args;
use heatrun::pipeline::{failure_message, Step};
use heatrun::Pipeline;

fn fail(step: Step, e: heatrun::Error) -> ! {
    eprintln!("Error: {}", failure_message(step, &e));
    std::process::exit(1);
}

fn main() {
    let args = Args::cli_setup("heatrun");

    let config = match args.run_config() {
        Ok(config) => config,
        Err(e) => fail(Step::Configuring, e),
    };

    let mut pipeline = Pipeline::new(config);
    match pipeline.run() {
        Ok(outcome) => {
            let (rows, cols) = outcome.grid_shape;
            println!(
                "Execution time: {:.4} seconds, {} x {} grid plotted to {:?}",
                outcome.run.duration_seconds, rows, cols, outcome.artifact.path
            );
        }
        Err(e) => fail(pipeline.failed_step().unwrap_or(Step::Configuring), e),
    }
}
