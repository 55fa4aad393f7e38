use anyhow::{Result, anyhow};
use async_trait::async_trait;
use magi_rs::generator::context::GeneratorContext;
use magi_rs::generator::outlet::{ReportOptions, render_report, save};
use magi_rs::generator::progress::ProgressSink;
use magi_rs::generator::reviewer::{ACCEPTANCE_SENTENCE, ReviewVerdict, UNEXPECTED_FORMAT_PREFIX};
use magi_rs::llm::{GenerationRole, Generator, QueryList};
use magi_rs::search::{SearchClient, SearchHit};
use magi_rs::{Config, ResearchError, execute};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// 按用途返回固定回复的文本生成服务
struct FixedGenerator {
    review: String,
}

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(
        &self,
        role: GenerationRole,
        _system_prompt: &str,
        _user_prompt: &str,
    ) -> Result<String> {
        Ok(match role {
            GenerationRole::Summarize => "Relevant facts about the sea.".to_string(),
            GenerationRole::Compose => {
                "<think>plan the answer</think>Tides follow the moon [1] and the sun [2].".to_string()
            }
            GenerationRole::Review => self.review.clone(),
        })
    }

    async fn plan_queries(&self, _system_prompt: &str, _user_prompt: &str) -> Result<QueryList> {
        Ok(QueryList {
            queries: vec![
                "moon tides".to_string(),
                "sun tides".to_string(),
                "tide tables".to_string(),
            ],
        })
    }
}

/// 每个查询返回一个网页，"tide tables" 的网页无法提取
struct OnePagePerQuery;

#[async_trait]
impl SearchClient for OnePagePerQuery {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            title: format!("About {}", query),
            url: format!("https://{}.example", query.replace(' ', "-")),
        }])
    }

    async fn extract(&self, url: &str) -> Result<Option<String>> {
        if url.contains("tide-tables") {
            return Ok(None);
        }
        Ok(Some(format!("page body of {}", url)))
    }
}

struct FailingSearch;

#[async_trait]
impl SearchClient for FailingSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Err(anyhow!("search service unavailable"))
    }

    async fn extract(&self, _url: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Default)]
struct CollectedProgress {
    percentages: Mutex<Vec<u8>>,
}

impl ProgressSink for CollectedProgress {
    fn report(&self, percentage: u8, _message: &str) {
        self.percentages.lock().unwrap().push(percentage);
    }
}

fn context_with(
    review: &str,
    search: Arc<dyn SearchClient>,
) -> (GeneratorContext, Arc<CollectedProgress>) {
    let progress = Arc::new(CollectedProgress::default());
    let context = GeneratorContext::with_services(
        Config::default(),
        Arc::new(FixedGenerator {
            review: review.to_string(),
        }),
        search,
        progress.clone(),
    );
    (context, progress)
}

#[tokio::test]
async fn test_full_run_produces_cited_report() {
    let (context, progress) = context_with(ACCEPTANCE_SENTENCE, Arc::new(OnePagePerQuery));

    let state = execute(&context, "What causes tides?").await.unwrap();

    assert_eq!(state.queries.len(), 3);
    assert_eq!(state.partial_results.len(), 2);
    assert_eq!(state.review, Some(ReviewVerdict::Accepted));
    assert_eq!(state.final_output, "Tides follow the moon [1] and the sun [2].");
    assert_eq!(state.composer_thinking, "plan the answer");
    assert_eq!(state.references.len(), 2);
    assert_eq!(state.references[0].url, "https://moon-tides.example");
    assert_eq!(state.references[1].url, "https://sun-tides.example");

    let percentages = progress.percentages.lock().unwrap().clone();
    assert!(percentages.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percentages.last(), Some(&100));

    let report = render_report(&state, &ReportOptions::default());
    assert!(report.contains("[1] - [About moon tides](https://moon-tides.example)"));
    assert!(report.contains("[2] - [About sun tides](https://sun-tides.example)"));
    assert!(!report.contains("<think>"));
}

#[tokio::test]
async fn test_unrecognized_review_keeps_draft() {
    let (context, _) = context_with("Looks mostly fine to me.", Arc::new(OnePagePerQuery));

    let state = execute(&context, "What causes tides?").await.unwrap();

    assert_eq!(state.final_output, state.draft);
    assert!(state.review_feedback.starts_with(UNEXPECTED_FORMAT_PREFIX));
    assert!(state.review_feedback.ends_with("Looks mostly fine to me."));
}

#[tokio::test]
async fn test_search_outage_fails_the_run() {
    let (context, progress) = context_with(ACCEPTANCE_SENTENCE, Arc::new(FailingSearch));

    let err = execute(&context, "What causes tides?").await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ResearchError>(),
        Some(ResearchError::BranchFailed { .. })
    ));
    assert!(!progress.percentages.lock().unwrap().contains(&100));
}

#[tokio::test]
async fn test_report_saved_to_disk() {
    let (context, _) = context_with(
        "Unsupported claim.\n<CORRECTED_FINAL_RESPONSE>Tides follow the moon [1].</CORRECTED_FINAL_RESPONSE>",
        Arc::new(OnePagePerQuery),
    );
    let state = execute(&context, "What causes tides?").await.unwrap();

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out/report.md");
    let options = ReportOptions {
        include_feedback: true,
        include_timing: false,
    };
    save(&state, Some(path.clone()), &options).await.unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("Tides follow the moon [1]."));
    assert!(written.contains("## Reviewer Feedback\n\nUnsupported claim."));
}
