use std::path::{Path, PathBuf};

use forgebench::client::memory::InMemoryToolchain;
use forgebench::models::ComponentKind;
use forgebench::{BenchConfig, Journal, SessionOrchestrator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Bench config first: it decides where the journal lives.
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => BenchConfig::load(&path)?,
        None => {
            eprintln!("[Main] no bench config given, using built-in rehearsal scenario");
            BenchConfig::default()
        }
    };

    // =========================================================================
    // JOURNAL INITIALIZATION - MUST PRECEDE ANY log::* CALL
    // =========================================================================
    let journal = Journal::new(Path::new(&config.journal_dir))?;
    if let Err(e) = journal.register_global(log::LevelFilter::Info) {
        eprintln!("[Main] WARNING: failed to register journal as global logger: {}", e);
    }
    log::info!("forgebench {} starting", forgebench::VERSION);
    eprintln!("[Main] session journal: {}", journal.path().display());

    // =========================================================================
    // REHEARSAL BACKEND - SIMULATED TOOLCHAIN STORE
    // =========================================================================
    // Application components are created in the IDE, not by these workflows;
    // seed them so retrieval by name matches the persisted registry.
    let toolchain = InMemoryToolchain::new();
    for name in &config.preexisting_applications {
        toolchain.seed_component(&config.workspace(), name, ComponentKind::Application)?;
        log::info!("seeded preexisting application '{}'", name);
    }

    let orchestrator =
        SessionOrchestrator::new(Box::new(toolchain.clone())).with_journal(journal.clone());
    let workflow = config.to_workflow();

    match orchestrator.run(&workflow) {
        Ok(report) => {
            for step in &report.steps {
                match &step.status {
                    Some(status) => {
                        log::info!("{} ({}): {}", step.step, step.component, status.diagnostics)
                    }
                    None => log::info!("{} ({}): resolved", step.step, step.component),
                }
            }
            log::info!("build order: [{}]", report.build_order().join(", "));

            let (opened, closed) = toolchain.session_counts();
            debug_assert_eq!(opened, closed);

            journal.flush()?;
            eprintln!("[Main] rehearsal complete ({} builds)", report.build_order().len());
            Ok(())
        }
        Err(e) => {
            log::error!("rehearsal failed: {}", e);
            let _ = journal.flush();
            Err(e.into())
        }
    }
}
