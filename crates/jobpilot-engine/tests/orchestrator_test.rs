//! End-to-end engine tests against the scripted fake surface.

mod common;

use common::{detail_body, FakeSurface};
use jobpilot_core::{
    AppConfig, CancelToken, DeliveryStatus, JobIdentity, JobRecord, Platform, ProgressBus,
    ProgressReport,
};
use jobpilot_db::{blacklists, jobs, Database};
use jobpilot_engine::{
    delivery_overview, selectors, DeliveryEngine, DiscoveryEngine, EngineError, Orchestrator,
    SessionMonitor,
};
use jobpilot_llm::GreetingGenerator;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.search.keywords = vec!["Rust".to_string()];
    config.search.cities = vec!["101020100".to_string()];
    config
}

async fn orchestrator_over(
    fake: &FakeSurface,
    db: &Database,
    config: AppConfig,
    cancel: CancelToken,
) -> (Orchestrator, mpsc::Receiver<ProgressReport>) {
    let surface = fake.as_surface();
    let monitor = Arc::new(SessionMonitor::new(
        Arc::clone(&surface),
        db.clone(),
        Platform::Boss,
    ));
    let (bus, rx) = ProgressBus::new();

    let orchestrator = Orchestrator::new(
        surface,
        db.clone(),
        config,
        monitor,
        None,
        bus,
        cancel,
        Platform::Boss,
    );
    (orchestrator, rx)
}

#[tokio::test]
async fn test_full_run_discovers_filters_and_delivers() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();
    fake.set_footer_after(0);
    fake.set_cards(3);
    for i in 0..3 {
        fake.push_detail_body(detail_body(
            &format!("j{i}"),
            "r1",
            "示例科技",
            "20-35K·14薪",
        ));
    }

    let db = Database::in_memory().await.expect("create database");
    let cancel = CancelToken::new();
    let (orchestrator, _reports) = orchestrator_over(&fake, &db, test_config(), cancel).await;

    let summary = orchestrator.run().await.expect("run succeeds");

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.delivered, 3);
    assert_eq!(summary.filtered, 0);
    assert_eq!(summary.failed, 0);

    let stats = jobs::delivery_stats(db.pool()).await.expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.delivered, 3);

    // Every delivery went through the chat flow.
    let chat_clicks = fake
        .clicks()
        .iter()
        .filter(|(sel, _)| sel == selectors::CHAT_BUTTON)
        .count();
    assert_eq!(chat_clicks, 3);
}

#[tokio::test]
async fn test_cancellation_stops_at_next_candidate_boundary() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();
    fake.set_footer_after(0);
    fake.set_cards(10);
    for i in 0..10 {
        fake.push_detail_body(detail_body(&format!("j{i}"), "r1", "示例科技", "20-35K"));
    }

    let db = Database::in_memory().await.expect("create database");
    let cancel = CancelToken::new();
    // Fires while candidate 3's detail is being captured, after two
    // completed deliveries.
    fake.cancel_after_captures(3, cancel.clone());

    let (orchestrator, mut reports) = orchestrator_over(&fake, &db, test_config(), cancel).await;
    let result = orchestrator.run().await;

    assert!(matches!(result, Err(EngineError::Cancelled)));

    let stats = jobs::delivery_stats(db.pool()).await.expect("stats");
    assert_eq!(stats.delivered, 2);
    // The third candidate was stored but its delivery never started.
    assert_eq!(stats.total, 3);
    assert_eq!(stats.not_delivered, 1);

    // The counts gathered before the abort are still reported.
    let mut messages = Vec::new();
    while let Ok(report) = reports.try_recv() {
        messages.push(report.message);
    }
    assert!(messages
        .iter()
        .any(|m| m.starts_with("run ended early") && m.contains("2 delivered")));
}

#[tokio::test]
async fn test_blacklisted_candidates_are_filtered_without_delivery() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();
    fake.set_footer_after(0);
    fake.set_cards(2);
    for i in 0..2 {
        fake.push_detail_body(detail_body(
            &format!("j{i}"),
            "r1",
            "某某外包服务公司",
            "20-35K",
        ));
    }

    let db = Database::in_memory().await.expect("create database");
    blacklists::add_entry(db.pool(), blacklists::BlacklistKind::Company, "外包")
        .await
        .expect("add blacklist entry");

    let cancel = CancelToken::new();
    let (orchestrator, _reports) = orchestrator_over(&fake, &db, test_config(), cancel).await;
    let summary = orchestrator.run().await.expect("run succeeds");

    assert_eq!(summary.filtered, 2);
    assert_eq!(summary.delivered, 0);

    let stats = jobs::delivery_stats(db.pool()).await.expect("stats");
    assert_eq!(stats.filtered, 2);

    // The chat flow was never touched.
    assert!(fake
        .clicks()
        .iter()
        .all(|(sel, _)| sel != selectors::CHAT_BUTTON));
}

#[tokio::test]
async fn test_terminal_candidates_are_skipped_on_rediscovery() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();
    fake.set_footer_after(0);
    fake.set_cards(1);
    fake.push_detail_body(detail_body("j0", "r1", "示例科技", "20-35K"));

    let db = Database::in_memory().await.expect("create database");

    // Same identity already delivered in an earlier run.
    let known = JobRecord {
        identity: JobIdentity::new("j0", "r1"),
        title: "Rust开发工程师".to_string(),
        company: "示例科技".to_string(),
        salary: "20-35K".to_string(),
        location: String::new(),
        experience: String::new(),
        degree: String::new(),
        recruiter_name: String::new(),
        recruiter_title: String::new(),
        recruiter_activity: String::new(),
        description: String::new(),
        status: DeliveryStatus::NotDelivered,
    };
    jobs::upsert_job(db.pool(), Platform::Boss, &known)
        .await
        .expect("seed job");
    jobs::update_delivery_status(db.pool(), &known.identity, DeliveryStatus::Delivered)
        .await
        .expect("seed status");

    let cancel = CancelToken::new();
    let (orchestrator, _reports) = orchestrator_over(&fake, &db, test_config(), cancel).await;
    let summary = orchestrator.run().await.expect("run succeeds");

    assert_eq!(summary.skipped_known, 1);
    assert_eq!(summary.discovered, 0);
    assert_eq!(summary.delivered, 0);
}

#[tokio::test]
async fn test_debug_mode_stores_but_never_delivers() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();
    fake.set_footer_after(0);
    fake.set_cards(2);
    for i in 0..2 {
        fake.push_detail_body(detail_body(&format!("j{i}"), "r1", "示例科技", "20-35K"));
    }

    let db = Database::in_memory().await.expect("create database");
    let mut config = test_config();
    config.search.debug = true;

    let cancel = CancelToken::new();
    let (orchestrator, _reports) = orchestrator_over(&fake, &db, config, cancel).await;
    let summary = orchestrator.run().await.expect("run succeeds");

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.delivered, 0);

    let stats = jobs::delivery_stats(db.pool()).await.expect("stats");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.not_delivered, 2);
}

#[tokio::test(start_paused = true)]
async fn test_scrolling_is_bounded_without_end_marker() {
    let fake = FakeSurface::new();
    fake.set_cards(5);
    // Footer never shows; the iteration cap is the only way out.

    let (bus, _rx) = ProgressBus::new();
    let discovery =
        DiscoveryEngine::new(fake.as_surface(), bus, CancelToken::new(), Platform::Boss);

    let count = discovery.load_all_cards().await.expect("load cards");
    assert_eq!(count, 5);
    assert_eq!(fake.scroll_count(), 120);
}

#[tokio::test]
async fn test_overview_averages_parsed_salaries() {
    let db = Database::in_memory().await.expect("create database");

    for (i, salary) in ["15-25K", "300元/天", "面议"].iter().enumerate() {
        let mut job = accepted_job();
        job.identity = JobIdentity::new(format!("j{i}"), "r1");
        job.salary = (*salary).to_string();
        jobs::upsert_job(db.pool(), Platform::Boss, &job)
            .await
            .expect("seed job");
    }

    let overview = delivery_overview(&db).await.expect("overview");
    assert_eq!(overview.stats.total, 3);
    assert_eq!(overview.stats.not_delivered, 3);

    // Mean of the two parseable midpoints: 20 and 6.525.
    let avg = overview.average_salary_k.expect("average present");
    assert!((avg - 13.2625).abs() < 1e-9);
}

#[tokio::test]
async fn test_overview_without_parseable_salaries() {
    let db = Database::in_memory().await.expect("create database");

    let mut job = accepted_job();
    job.salary = "面议".to_string();
    jobs::upsert_job(db.pool(), Platform::Boss, &job)
        .await
        .expect("seed job");

    let overview = delivery_overview(&db).await.expect("overview");
    assert!(overview.average_salary_k.is_none());
}

struct FailingGreeter;

#[async_trait::async_trait]
impl GreetingGenerator for FailingGreeter {
    async fn generate(&self, _job: &JobRecord, _keyword: &str) -> jobpilot_llm::Result<String> {
        Err(jobpilot_llm::LlmError::EmptyResponse)
    }
}

struct DecliningGreeter;

#[async_trait::async_trait]
impl GreetingGenerator for DecliningGreeter {
    async fn generate(&self, _job: &JobRecord, _keyword: &str) -> jobpilot_llm::Result<String> {
        Ok("false".to_string())
    }
}

#[derive(Default)]
struct RecordingGreeter {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl GreetingGenerator for RecordingGreeter {
    async fn generate(&self, _job: &JobRecord, _keyword: &str) -> jobpilot_llm::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("您好，看到贵司职位与我的经验很匹配。".to_string())
    }
}

fn delivery_engine_with(
    fake: &FakeSurface,
    greeter: Arc<dyn GreetingGenerator>,
) -> (DeliveryEngine, String) {
    delivery_engine_over(fake, greeter, true)
}

fn delivery_engine_over(
    fake: &FakeSurface,
    greeter: Arc<dyn GreetingGenerator>,
    enable_ai: bool,
) -> (DeliveryEngine, String) {
    let mut config = test_config();
    config.search.enable_ai = enable_ai;
    let template = config.search.greet_template.clone();
    let (bus, _rx) = ProgressBus::new();

    let engine = DeliveryEngine::new(
        fake.as_surface(),
        config.search,
        Some(greeter),
        bus,
        CancelToken::new(),
        Platform::Boss,
    );
    (engine, template)
}

fn accepted_job() -> JobRecord {
    JobRecord {
        identity: JobIdentity::new("j9", "r9"),
        title: "Rust开发工程师".to_string(),
        company: "示例科技".to_string(),
        salary: "20-35K".to_string(),
        location: String::new(),
        experience: String::new(),
        degree: String::new(),
        recruiter_name: "王女士".to_string(),
        recruiter_title: "HR".to_string(),
        recruiter_activity: "刚刚活跃".to_string(),
        description: "负责核心服务开发".to_string(),
        status: DeliveryStatus::NotDelivered,
    }
}

#[tokio::test(start_paused = true)]
async fn test_greeting_failure_falls_back_to_template() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();

    let (engine, template) = delivery_engine_with(&fake, Arc::new(FailingGreeter));
    let outcome = engine
        .deliver(&accepted_job(), "Rust")
        .await
        .expect("deliver");

    assert_eq!(outcome.status, DeliveryStatus::Delivered);
    assert_eq!(outcome.message, template);

    let fills = fake.fills();
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].1, template);
}

#[tokio::test(start_paused = true)]
async fn test_model_rejection_sentinel_falls_back_to_template() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();

    let (engine, template) = delivery_engine_with(&fake, Arc::new(DecliningGreeter));
    let outcome = engine
        .deliver(&accepted_job(), "Rust")
        .await
        .expect("deliver");

    assert_eq!(outcome.status, DeliveryStatus::Delivered);
    assert_eq!(outcome.message, template);
}

#[tokio::test(start_paused = true)]
async fn test_ai_disabled_sends_template_without_calling_model() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();

    let greeter = Arc::new(RecordingGreeter::default());
    let (engine, template) =
        delivery_engine_over(&fake, Arc::clone(&greeter) as Arc<dyn GreetingGenerator>, false);

    let outcome = engine
        .deliver(&accepted_job(), "Rust")
        .await
        .expect("deliver");

    assert_eq!(outcome.status, DeliveryStatus::Delivered);
    assert_eq!(outcome.message, template);
    assert_eq!(greeter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_missing_description_sends_template_without_calling_model() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();

    let greeter = Arc::new(RecordingGreeter::default());
    let (engine, template) =
        delivery_engine_over(&fake, Arc::clone(&greeter) as Arc<dyn GreetingGenerator>, true);

    let mut job = accepted_job();
    job.description = String::new();
    let outcome = engine.deliver(&job, "Rust").await.expect("deliver");

    assert_eq!(outcome.message, template);
    assert_eq!(greeter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_ai_greeting_is_sent_when_enabled() {
    let fake = FakeSurface::new();
    fake.script_chat_flow();

    let greeter = Arc::new(RecordingGreeter::default());
    let (engine, template) =
        delivery_engine_over(&fake, Arc::clone(&greeter) as Arc<dyn GreetingGenerator>, true);

    let outcome = engine
        .deliver(&accepted_job(), "Rust")
        .await
        .expect("deliver");

    assert_eq!(greeter.calls.load(Ordering::SeqCst), 1);
    assert_ne!(outcome.message, template);
}

#[tokio::test(start_paused = true)]
async fn test_missing_chat_button_records_failure() {
    let fake = FakeSurface::new();
    fake.set_present(selectors::DETAIL_LINK);
    fake.set_attribute(selectors::DETAIL_LINK, "href", "/job_detail/abc.html");
    // No chat button scripted; every attempt misses.

    let (engine, _template) = delivery_engine_with(&fake, Arc::new(FailingGreeter));
    let outcome = engine
        .deliver(&accepted_job(), "Rust")
        .await
        .expect("deliver");

    assert_eq!(outcome.status, DeliveryStatus::Failed);
    assert!(!outcome.attachment_sent);
}
