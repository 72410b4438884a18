pub mod cli;

use clap::Parser;
use machines::{InMemoryEnvironment, Message};
use scheduler::SearchLoop;
use solver::Guard;

use checkpoint::{CheckpointImage, CheckpointStore, FileCheckpointStore};
use cli::Cli;

/// Spawns `n` machines wired in a ring, each sending one message to its
/// successor, so there is something for the search loop to explore without
/// a compiled input program. Reference/demo mode only — a real caller
/// supplies its own `MachineEnvironment`.
fn build_demo_environment(n: usize) -> InMemoryEnvironment {
    let mut env = InMemoryEnvironment::new();
    let ids: Vec<_> = (0..n.max(1)).map(|_| env.spawn(Vec::new())).collect();
    for (i, &id) in ids.iter().enumerate() {
        let next = ids[(i + 1) % ids.len()];
        env.enqueue(id, Guard::true_(), Message::new(next, "ping", Vec::new()));
    }
    env
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    common::init_logger("pexplore", cli.verbosity, cli.json_logs);
    let config = cli.to_scheduler_config();

    let env = build_demo_environment(cli.demo_machines);
    let mut search = SearchLoop::new(env, config);

    if let Some(resume_path) = &cli.resume_from {
        let store = FileCheckpointStore::new(resume_path);
        let image = store.load()?;
        search.coverage = image.coverage;
        search.ctx.global.restore(image.global_creation_counters);
        search.result = image.result;
        tracing::info!(path = %resume_path.display(), "resumed from checkpoint");
        search.resume_search(image.schedule, image.counters)?;
    } else {
        search.do_search()?;
    }

    tracing::info!(
        iterations = search.counters.iter,
        depth = search.counters.depth,
        coverage = search.coverage.coverage(),
        result = %search.result,
        "search finished"
    );

    if let Some(out_path) = &cli.checkpoint_out {
        let image = CheckpointImage {
            schedule: search.schedule.clone(),
            counters: search.counters,
            coverage: search.coverage.clone(),
            global_creation_counters: search.ctx.global.snapshot(),
            result: search.result.clone(),
        };
        let store = FileCheckpointStore::new(out_path);
        store.save(&image)?;
        tracing::info!(path = %out_path.display(), "wrote checkpoint");
    }

    Ok(())
}
