//! One sync run: source → transform → reconcile → write.

use tracing::info;

use crate::apply::{ApplyReport, CloudWriter};
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::reconcile::{SyncPlan, reconcile};
use crate::remote::CalendarService;
use crate::source::EventSource;
use crate::transform::EventTransformer;
use crate::window::SyncWindow;

/// What a run saw and did.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub window: SyncWindow,
    /// Instances read from the local store.
    pub fetched: usize,
    /// Instances dropped as cancelled.
    pub skipped: usize,
    pub plan: SyncPlan,
    /// `None` for a dry run.
    pub report: Option<ApplyReport>,
}

pub struct Pipeline<'a, Src, Svc> {
    source: &'a Src,
    service: &'a Svc,
    transformer: EventTransformer,
}

impl<'a, Src, Svc> Pipeline<'a, Src, Svc>
where
    Src: EventSource,
    Svc: CalendarService,
{
    pub fn new(source: &'a Src, service: &'a Svc, config: &SyncConfig) -> Self {
        Pipeline {
            source,
            service,
            transformer: EventTransformer::new(config),
        }
    }

    /// Read, transform and classify without writing anything.
    pub async fn plan(&self, window: &SyncWindow) -> SyncResult<SyncOutcome> {
        let events = self.source.fetch_window(window)?;
        let targets = self.transformer.transform(&events);
        info!(
            fetched = events.len(),
            transformed = targets.len(),
            from = %window.start,
            to = %window.end,
            "read local calendar"
        );

        let skipped = events.len() - targets.len();
        let plan = reconcile(self.service, window, targets).await?;

        Ok(SyncOutcome {
            window: window.clone(),
            fetched: events.len(),
            skipped,
            plan,
            report: None,
        })
    }

    /// Full run. Classification completes before the first write.
    pub async fn run(&self, window: &SyncWindow) -> SyncResult<SyncOutcome> {
        let mut outcome = self.plan(window).await?;
        let report = CloudWriter::new(self.service).apply(&outcome.plan).await?;
        outcome.report = Some(report);
        Ok(outcome)
    }
}
