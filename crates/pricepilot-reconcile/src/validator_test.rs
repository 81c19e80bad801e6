use std::collections::VecDeque;
use std::sync::Mutex;

use pricepilot_core::Currency;

use super::*;

/// Replies with queued responses in order and records each batch it saw.
struct ScriptedJudge {
    replies: Mutex<VecDeque<Result<String, JudgeError>>>,
    seen: Mutex<Vec<Vec<CandidateProjection>>>,
}

impl ScriptedJudge {
    fn new(replies: Vec<Result<String, JudgeError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl RelevanceJudge for ScriptedJudge {
    async fn judge(
        &self,
        batch: &[CandidateProjection],
        _query: &str,
        _country: Country,
    ) -> Result<String, JudgeError> {
        self.seen.lock().unwrap().push(batch.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(JudgeError::EmptyResponse))
    }
}

struct StalledJudge;

impl RelevanceJudge for StalledJudge {
    async fn judge(
        &self,
        _batch: &[CandidateProjection],
        _query: &str,
        _country: Country,
    ) -> Result<String, JudgeError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("[]".to_string())
    }
}

fn make_product(n: usize) -> CanonicalProduct {
    CanonicalProduct::new(
        format!("https://www.example.com/item/{n}"),
        format!("{}.00", 100 + n),
        Currency::Usd,
        format!("Listing number {n}"),
        "Example",
    )
}

fn fast_settings(batch_size: usize) -> ValidationSettings {
    ValidationSettings {
        batch_size,
        batch_delay: Duration::ZERO,
        overall_timeout: Duration::from_secs(5),
    }
}

fn relevant(index: usize, score: u32, clean_name: &str) -> String {
    format!(
        r#"{{"original_index": {index}, "relevance_score": {score}, "clean_name": "{clean_name}",
            "confidence_score": 88, "is_relevant": true, "reason": "match"}}"#
    )
}

// -----------------------------------------------------------------------
// strip_fences / parse_judgments
// -----------------------------------------------------------------------

#[test]
fn strip_fences_handles_json_fence() {
    let reply = "```json\n[{\"original_index\": 0}]\n```";
    assert_eq!(strip_fences(reply), "[{\"original_index\": 0}]");
}

#[test]
fn strip_fences_handles_prose_around_array() {
    let reply = "Here you go:\n[{\"original_index\": 1}]\nHope that helps.";
    assert_eq!(strip_fences(reply), "[{\"original_index\": 1}]");
}

#[test]
fn strip_fences_handles_inline_language_tag() {
    assert_eq!(strip_fences("```json [] ```"), "[]");
}

#[test]
fn parse_judgments_skips_malformed_entries() {
    let reply = r#"[
        {"original_index": 0, "relevance_score": 90, "is_relevant": true},
        "not an object",
        {"original_index": "two"},
        {"original_index": 2, "relevance_score": 40.5}
    ]"#;
    let judgments = parse_judgments(reply).unwrap();
    assert_eq!(judgments.len(), 2);
    assert_eq!(judgments[1].relevance_score, Some(40.5));
}

#[test]
fn parse_judgments_rejects_non_array() {
    let err = parse_judgments("I cannot help with that.").unwrap_err();
    assert!(matches!(err, JudgeError::Parse(_)));
}

// -----------------------------------------------------------------------
// merge rules
// -----------------------------------------------------------------------

#[test]
fn merge_applies_clean_name_and_clamps_scores() {
    let batch = [make_product(0)];
    let judgments = parse_judgments(
        r#"[{"original_index": 0, "relevance_score": 140, "confidence_score": -3,
            "clean_name": "Apple iPhone 16 Pro", "is_relevant": true, "reason": "exact"}]"#,
    )
    .unwrap();
    let merged = merge_batch(&batch, &judgments);
    assert_eq!(merged.len(), 1);
    let record = &merged[0];
    assert!(record.ai.validated);
    assert_eq!(record.product_name, "Apple iPhone 16 Pro");
    assert!((record.ai.relevance_score - 100.0).abs() < f64::EPSILON);
    assert!(record.ai.confidence_score.abs() < f64::EPSILON);
}

#[test]
fn merge_keeps_name_when_clean_name_is_short() {
    let batch = [make_product(0)];
    let judgments = parse_judgments(&format!("[{}]", relevant(0, 90, "iPad"))).unwrap();
    let merged = merge_batch(&batch, &judgments);
    assert_eq!(merged[0].product_name, "Listing number 0");
    assert_eq!(merged[0].ai.clean_name, "iPad");
}

#[test]
fn merge_ignores_out_of_range_and_repeated_indices() {
    let batch = [make_product(0), make_product(1)];
    let reply = format!(
        "[{}, {}, {}, {}]",
        relevant(1, 95, "First judgment wins"),
        relevant(1, 10, "Second judgment ignored"),
        relevant(7, 99, "Out of range"),
        r#"{"original_index": -1, "relevance_score": 99, "is_relevant": true}"#
    );
    let merged = merge_batch(&batch, &parse_judgments(&reply).unwrap());
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].product_name, "First judgment wins");
}

#[test]
fn merge_filters_irrelevant_and_low_scores() {
    let batch = [make_product(0), make_product(1), make_product(2)];
    let reply = r#"[
        {"original_index": 0, "relevance_score": 70, "is_relevant": true},
        {"original_index": 1, "relevance_score": 69.9, "is_relevant": true},
        {"original_index": 2, "relevance_score": 95, "is_relevant": false}
    ]"#;
    let merged = merge_batch(&batch, &parse_judgments(reply).unwrap());
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].link, "https://www.example.com/item/0");
}

// -----------------------------------------------------------------------
// validate
// -----------------------------------------------------------------------

#[tokio::test]
async fn validate_uses_batch_local_indices() {
    let products: Vec<_> = (0..4).map(make_product).collect();
    let judge = ScriptedJudge::new(vec![
        Ok(format!("[{}, {}]", relevant(0, 90, "Batch one first"), relevant(1, 90, "Batch one second"))),
        Ok(format!("[{}]", relevant(1, 90, "Batch two second"))),
    ]);

    let outcome = validate(&products, "listing", Country::Us, &judge, &fast_settings(2)).await;

    assert_eq!(outcome.status(), ValidationStatus::Validated);
    let links: Vec<&str> = outcome.products().iter().map(|p| p.link.as_str()).collect();
    assert_eq!(
        links,
        vec![
            "https://www.example.com/item/0",
            "https://www.example.com/item/1",
            "https://www.example.com/item/3",
        ]
    );
    let seen = judge.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1][0].index, 0);
    assert_eq!(seen[1][0].name, "Listing number 2");
}

#[tokio::test]
async fn invalid_json_batch_passes_through_unannotated() {
    let products: Vec<_> = (0..4).map(make_product).collect();
    let judge = ScriptedJudge::new(vec![
        Ok("this is not json".to_string()),
        Ok(format!("[{}, {}]", relevant(0, 90, "Judged record two"), relevant(1, 90, "Judged record three"))),
    ]);

    let outcome = validate(&products, "listing", Country::Us, &judge, &fast_settings(2)).await;

    match &outcome {
        ValidationOutcome::Partial { failed_batches, .. } => assert_eq!(failed_batches, &vec![0]),
        other => panic!("expected Partial, got: {other:?}"),
    }
    let records = outcome.products();
    assert_eq!(records.len(), 4);
    assert!(!records[0].ai.validated);
    assert!(!records[1].ai.validated);
    assert_eq!(records[0].product_name, "Listing number 0");
    assert!(records[2].ai.validated);
    assert_eq!(records[3].product_name, "Judged record three");
}

#[tokio::test]
async fn every_batch_failing_falls_back_to_input() {
    let products: Vec<_> = (0..3).map(make_product).collect();
    let judge = ScriptedJudge::new(vec![
        Err(JudgeError::Status {
            status: 500,
            body: "upstream".to_string(),
        }),
        Err(JudgeError::EmptyResponse),
    ]);

    let outcome = validate(&products, "listing", Country::Us, &judge, &fast_settings(2)).await;

    assert_eq!(outcome.status(), ValidationStatus::Fallback);
    assert_eq!(outcome.products(), products.as_slice());
}

#[tokio::test]
async fn deadline_abandons_batches_and_falls_back() {
    let products: Vec<_> = (0..3).map(make_product).collect();
    let settings = ValidationSettings {
        batch_size: 10,
        batch_delay: Duration::ZERO,
        overall_timeout: Duration::from_millis(50),
    };

    let outcome = validate(&products, "listing", Country::Us, &StalledJudge, &settings).await;

    match outcome {
        ValidationOutcome::Fallback { products: kept, reason } => {
            assert_eq!(kept, products);
            assert!(reason.contains("deadline"));
        }
        other => panic!("expected Fallback, got: {other:?}"),
    }
}

#[tokio::test]
async fn empty_input_needs_no_judge_call() {
    let judge = ScriptedJudge::new(Vec::new());
    let outcome = validate(&[], "listing", Country::Us, &judge, &fast_settings(10)).await;
    assert_eq!(outcome.status(), ValidationStatus::Validated);
    assert!(outcome.products().is_empty());
    assert!(judge.seen.lock().unwrap().is_empty());
}
