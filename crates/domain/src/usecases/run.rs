//! Digest run - orchestrates fetching, curation, analysis, assembly and delivery

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    model::{RunStage, RunSummary},
    ports::{Analyzer, Clock, Delivery},
    prompt::PromptTemplate,
    usecases::{
        analyze::AnalysisInvoker,
        assemble::{ReportAssembler, RunContext},
        curate::Curator,
        fetch::SourceChain,
    },
};

/// Everything that varies per bot
#[derive(Clone)]
pub struct DigestPlan {
    pub template: PromptTemplate,
    pub chain: SourceChain,
    pub curator: Curator,
}

/// Single straight-line run of one bot
pub struct DigestRun<A, D, Cl>
where
    A: Analyzer + ?Sized,
    D: Delivery + ?Sized,
    Cl: Clock + ?Sized,
{
    plan: DigestPlan,
    analyzer: Arc<A>,
    delivery: Arc<D>,
    clock: Arc<Cl>,
}

impl<A, D, Cl> DigestRun<A, D, Cl>
where
    A: Analyzer + ?Sized,
    D: Delivery + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(plan: DigestPlan, analyzer: Arc<A>, delivery: Arc<D>, clock: Arc<Cl>) -> Self {
        Self {
            plan,
            analyzer,
            delivery,
            clock,
        }
    }

    /// Run every stage once. Never fails: the report is delivered exactly once.
    pub async fn run_once(&self) -> RunSummary {
        let span = tracing::info_span!(
            "digest_run",
            run_id = %Uuid::new_v4(),
            bot = %self.plan.template.bot
        );
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> RunSummary {
        let run_at = self.clock.now();

        enter(RunStage::Fetching);
        let outcome = self.plan.chain.resolve(run_at).await;
        let fetched = outcome.items.len();

        enter(RunStage::Filtering);
        let curated = self.plan.curator.curate(outcome.items);

        enter(RunStage::Analyzing);
        let invoker = AnalysisInvoker::new(self.analyzer.as_ref(), self.plan.template.clone());
        let mut analyses = Vec::with_capacity(curated.len());
        for item in &curated {
            analyses.push(invoker.analyze(item).await);
        }

        enter(RunStage::Assembling);
        let context = RunContext {
            run_at,
            source_count: self.plan.chain.len(),
            sources_tried: outcome.sources_tried.clone(),
        };
        let report = ReportAssembler::new(self.plan.template.clone()).assemble(
            &context,
            &curated,
            &analyses,
        );
        let text = report.render();

        let delivered = match self.delivery.deliver(&text).await {
            Ok(receipt) => {
                tracing::info!(sink = receipt.sink, status = ?receipt.status, "Report delivered");
                true
            }
            Err(error) => {
                tracing::error!(error = %error, "Report delivery failed");
                false
            }
        };
        enter(RunStage::Delivered);

        let summary = RunSummary {
            sources_tried: outcome.sources_tried,
            fetched,
            curated,
            analyses,
            report,
            delivered,
        };

        tracing::info!(
            fetched = summary.fetched,
            curated = summary.curated.len(),
            failed_analyses = summary.failed_analyses(),
            sentinel = summary.report.is_sentinel(),
            delivered = summary.delivered,
            "Digest run complete"
        );

        summary
    }
}

fn enter(stage: RunStage) {
    tracing::debug!(stage = %stage, "Entering stage");
}
