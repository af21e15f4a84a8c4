use crate::service::TranslationService;
use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};

/// Start the maintenance job that sweeps expired cache entries and elapsed
/// rate windows on `schedule` (six-field cron, seconds first).
pub async fn start_scheduler(service: Arc<TranslationService>, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    info!("Scheduling maintenance sweep (cron: {})", schedule);

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let service = Arc::clone(&service);

        Box::pin(async move {
            if let Err(e) = run_sweep(&service).await {
                error!("Maintenance sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

async fn run_sweep(service: &TranslationService) -> Result<()> {
    let (entries, windows) = service.sweep().await?;

    if entries > 0 || windows > 0 {
        info!(
            "Swept {} expired cache entries and {} rate windows",
            entries, windows
        );
    } else {
        debug!("Maintenance sweep found nothing to remove");
    }

    Ok(())
}
