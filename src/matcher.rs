//! End-to-end matching: crawl a search, then judge every listing

use crate::crawler::CrawlOrchestrator;
use crate::extract::ListingRecord;
use crate::format::describe;
use crate::judge::{Judge, JudgeError, Judger, Verdict};
use crate::CrawlError;

/// One crawled listing and what the judge made of it
#[derive(Debug)]
pub struct MatchOutcome {
    pub record: ListingRecord,
    pub verdict: Result<Verdict, JudgeError>,
}

impl MatchOutcome {
    pub fn is_recommended(&self) -> bool {
        self.verdict
            .as_ref()
            .map(Verdict::is_recommended)
            .unwrap_or(false)
    }
}

/// Couples a crawl orchestrator with a judge
pub struct JobMatcher<J> {
    orchestrator: CrawlOrchestrator,
    judger: Judger<J>,
}

impl<J: Judge> JobMatcher<J> {
    pub fn new(orchestrator: CrawlOrchestrator, judger: Judger<J>) -> Self {
        Self {
            orchestrator,
            judger,
        }
    }

    pub fn orchestrator(&self) -> &CrawlOrchestrator {
        &self.orchestrator
    }

    /// Crawls `search_url` and judges each record against `requirements`
    ///
    /// Outcomes follow source order. Only a failed search page aborts; a
    /// failed judgement stays attached to its own record.
    pub async fn match_listings(
        &self,
        requirements: &str,
        search_url: &str,
        max_num: i64,
    ) -> Result<Vec<MatchOutcome>, CrawlError> {
        let result = self.orchestrator.crawl(search_url, max_num).await?;

        let descriptions: Vec<String> = result.records.iter().map(describe).collect();
        let verdicts = self.judger.judge_batch(requirements, &descriptions).await;

        let outcomes: Vec<MatchOutcome> = result
            .records
            .into_iter()
            .zip(verdicts)
            .map(|(record, verdict)| MatchOutcome { record, verdict })
            .collect();

        tracing::info!(
            "{} of {} listings recommended",
            outcomes.iter().filter(|o| o.is_recommended()).count(),
            outcomes.len()
        );

        Ok(outcomes)
    }
}
