use crate::admissions::client::AdmissionsBackend;
use crate::event::AppEvent;
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Fetches `/jobs` on a fixed interval until stopped or dropped.
///
/// Each cycle awaits its own fetch before waiting for the next tick, and ticks
/// missed during a slow fetch are skipped, so polls never stack. Results that
/// arrive after `stop` are dropped.
pub struct JobPoller {
    cancel: CancellationToken,
}

impl JobPoller {
    pub fn spawn(
        runtime_handle: &Handle,
        backend: Arc<dyn AdmissionsBackend>,
        period: Duration,
        tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        runtime_handle.spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = backend.jobs() => result,
                };
                if token.is_cancelled() {
                    break;
                }

                match result {
                    Ok(snapshot) => {
                        if tx.send(AppEvent::JobsRefreshed(snapshot)).is_err() {
                            tracing::debug!("job poller receiver dropped");
                            break;
                        }
                    }
                    Err(err) => tracing::warn!("failed to refresh jobs: {err}"),
                }
            }
            tracing::debug!("job poller stopped");
        });

        Self { cancel }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for JobPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admissions::client::testing::ScriptedAdmissionsBackend;
    use crate::jobs::{job, JobStatus, JobsSnapshot};

    fn drain(rx: &mpsc::Receiver<AppEvent>) -> usize {
        rx.try_iter()
            .filter(|event| matches!(event, AppEvent::JobsRefreshed(_)))
            .count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn polls_repeatedly_until_stopped() {
        let backend = Arc::new(ScriptedAdmissionsBackend::default().jobs(JobsSnapshot::from_entries(
            vec![("job-1", job(JobStatus::Running))],
        )));
        let (tx, rx) = mpsc::channel();
        let poller = JobPoller::spawn(
            &Handle::current(),
            backend.clone(),
            Duration::from_millis(10),
            tx,
        );

        time::sleep(Duration::from_millis(120)).await;
        poller.stop();
        time::sleep(Duration::from_millis(30)).await;

        assert!(drain(&rx) >= 2);
        assert!(backend.jobs_calls() >= 2);

        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(drain(&rx), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dropping_the_poller_stops_it() {
        let backend = Arc::new(ScriptedAdmissionsBackend::default());
        let (tx, rx) = mpsc::channel();
        let poller = JobPoller::spawn(&Handle::current(), backend.clone(), Duration::from_millis(10), tx);
        time::sleep(Duration::from_millis(40)).await;
        drop(poller);
        time::sleep(Duration::from_millis(30)).await;

        let calls = backend.jobs_calls();
        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(backend.jobs_calls(), calls);
        drop(rx);
    }
}
