//! Tool handlers end to end: fake backend and catalog, real store in a temp dir.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use serde_json::Value;

use skincare_advisor::catalog::ProductCatalog;
use skincare_advisor::config::Config;
use skincare_advisor::dispatch::{ChatBackend, CompletionRequest, CompletionResult};
use skincare_advisor::error::AdvisorError;
use skincare_advisor::format::Locale;
use skincare_advisor::model::{Product, SkinAnalysisResult};
use skincare_advisor::server::AdvisorServer;
use skincare_advisor::store::{AnalysisStore, LocalStore};
use skincare_advisor::tools::analysis::{AnalyzeRequest, HistoryRequest, LatestRequest};
use skincare_advisor::tools::chat::ChatRequest;
use skincare_advisor::tools::routine::{RoutineToggleRequest, RoutineUpdateRequest};

const REPLY: &str = "\
skinType: Oily
hydrationLevel: Low
oilLevel: High
overallCondition: Fair
concerns: [acne]
recommendations: [Cleanse twice daily, Use oil-free moisturizer]
tips: [Drink water]
recommendedProducts: [Gel Cleanser]";

struct FixedBackend(Option<&'static str>);

#[async_trait]
impl ChatBackend for FixedBackend {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResult, AdvisorError> {
        match self.0 {
            Some(text) => Ok(CompletionResult {
                text: text.to_string(),
                model: req.model.clone(),
                provider: "fixed".to_string(),
                latency_ms: 3,
            }),
            None => Err(AdvisorError::Timeout(120_000)),
        }
    }
}

struct FixedCatalog(Vec<Product>);

#[async_trait]
impl ProductCatalog for FixedCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, AdvisorError> {
        Ok(self.0.clone())
    }

    async fn find_by_name_and_skin_type(
        &self,
        name: &str,
        skin_type: &str,
        limit: usize,
    ) -> Result<Vec<Product>, AdvisorError> {
        Ok(self
            .0
            .iter()
            .filter(|p| p.name == name && p.suits(skin_type))
            .take(limit)
            .cloned()
            .collect())
    }
}

struct ReadOnlyStore;

#[async_trait]
impl AnalysisStore for ReadOnlyStore {
    async fn save_analysis(&self, _: &str, _: &SkinAnalysisResult) -> Result<String, AdvisorError> {
        Err(AdvisorError::Store("read-only".to_string()))
    }

    async fn latest_analysis(&self, _: &str) -> Result<Option<SkinAnalysisResult>, AdvisorError> {
        Ok(None)
    }

    async fn history(&self, _: &str, _: usize) -> Result<Vec<SkinAnalysisResult>, AdvisorError> {
        Ok(Vec::new())
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("skincare-server-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(dir: &std::path::Path, locale: Locale) -> Config {
    let mut config = Config::from_vars(|_| None);
    config.data_dir = dir.to_path_buf();
    config.locale = locale;
    config
}

fn catalog() -> Arc<FixedCatalog> {
    Arc::new(FixedCatalog(vec![Product {
        id: "p1".to_string(),
        name: "Gel Cleanser".to_string(),
        category: "Cleanser".to_string(),
        skin_types: vec!["Oily".to_string()],
        ..Default::default()
    }]))
}

fn server(
    dir: &std::path::Path,
    reply: Option<&'static str>,
    locale: Locale,
) -> (AdvisorServer, Arc<LocalStore>) {
    let store = Arc::new(LocalStore::new(dir));
    let server = AdvisorServer::with_parts(
        Arc::new(FixedBackend(reply)),
        catalog(),
        store.clone(),
        store.clone(),
        &config(dir, locale),
    );
    (server, store)
}

fn write_image(dir: &std::path::Path) -> String {
    let path = dir.join("face.png");
    std::fs::write(&path, [0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap();
    path.to_string_lossy().into_owned()
}

/// Decode the JSON envelope carried in the first text content.
fn envelope(result: &CallToolResult) -> Value {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .expect("tool result should carry text content");
    serde_json::from_str(&text).expect("envelope should be JSON")
}

fn latest(user: &str) -> Parameters<LatestRequest> {
    Parameters(LatestRequest {
        user_id: Some(user.to_string()),
    })
}

// ---------------------------------------------------------------------------
// analyze_skin / latest_analysis / analysis_history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyze_then_read_back() {
    let dir = temp_dir("analyze");
    let (server, _) = server(&dir, Some(REPLY), Locale::En);

    let result = server
        .analyze_skin(Parameters(AnalyzeRequest {
            image_path: write_image(&dir),
            user_id: Some("ann".to_string()),
        }))
        .await
        .unwrap();
    let json = envelope(&result);
    assert_eq!(json["status"], "success");
    assert_eq!(json["content_type"], "markdown");
    assert!(json["content"].as_str().unwrap().contains("• **Skin type**: Oily"));
    assert!(!json["content"].as_str().unwrap().contains("could not be saved"));
    assert_eq!(json["metadata"]["data"]["result"]["recommendedProductIds"][0], "p1");
    assert!(json["metadata"]["data"]["document_id"].is_string());

    let json = envelope(&server.latest_analysis(latest("ann")).await.unwrap());
    assert_eq!(json["status"], "success");
    // IDs are resolved back to catalog names.
    assert!(json["content"].as_str().unwrap().contains("- Gel Cleanser"));
    assert_eq!(json["metadata"]["data"]["skinType"], "Oily");

    let json = envelope(
        &server
            .analysis_history(Parameters(HistoryRequest {
                user_id: Some("ann".to_string()),
                limit: None,
            }))
            .await
            .unwrap(),
    );
    let content = json["content"].as_str().unwrap();
    assert!(content.contains("UTC: Oily (1 concerns, 1 products)"), "got: {content}");
    assert_eq!(json["metadata"]["data"].as_array().unwrap().len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn unsaved_analysis_is_flagged() {
    let dir = temp_dir("unsaved");
    let server = AdvisorServer::with_parts(
        Arc::new(FixedBackend(Some(REPLY))),
        catalog(),
        Arc::new(ReadOnlyStore),
        Arc::new(LocalStore::new(&dir)),
        &config(&dir, Locale::En),
    );

    let result = server
        .analyze_skin(Parameters(AnalyzeRequest {
            image_path: write_image(&dir),
            user_id: None,
        }))
        .await
        .unwrap();
    let json = envelope(&result);
    assert_eq!(json["status"], "success");
    assert!(
        json["content"]
            .as_str()
            .unwrap()
            .ends_with("(This analysis could not be saved to your history.)")
    );
    assert!(json["metadata"]["data"]["document_id"].is_null());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn backend_failure_is_an_error_envelope() {
    let dir = temp_dir("backend-fail");
    let (server, _) = server(&dir, None, Locale::En);

    let result = server
        .analyze_skin(Parameters(AnalyzeRequest {
            image_path: write_image(&dir),
            user_id: None,
        }))
        .await
        .unwrap();
    assert_ne!(result.is_error, Some(true));
    let json = envelope(&result);
    assert_eq!(json["status"], "error");
    assert_eq!(json["content"], "Analysis failed: request timed out after 120000ms");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn missing_image_is_invalid_params() {
    let dir = temp_dir("missing-image");
    let (server, _) = server(&dir, Some(REPLY), Locale::En);

    let result = server
        .analyze_skin(Parameters(AnalyzeRequest {
            image_path: dir.join("nope.jpg").to_string_lossy().into_owned(),
            user_id: None,
        }))
        .await;
    assert!(result.is_err());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn unknown_product_ids_fall_back_to_the_id() {
    let dir = temp_dir("unknown-id");
    let (server, store) = server(&dir, Some(REPLY), Locale::En);
    let stored = SkinAnalysisResult {
        skin_type: "Dry".to_string(),
        recommended_product_ids: vec!["p1".to_string(), "gone-42".to_string()],
        timestamp: 5,
        ..Default::default()
    };
    store.save_analysis("ann", &stored).await.unwrap();

    let json = envelope(&server.latest_analysis(latest("ann")).await.unwrap());
    let content = json["content"].as_str().unwrap();
    assert!(content.contains("- Gel Cleanser\n- gone-42"), "got: {content}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn empty_states_are_localized() {
    let dir = temp_dir("empty");
    let (server, _) = server(&dir, Some(REPLY), Locale::Vi);

    let json = envelope(&server.latest_analysis(latest("new")).await.unwrap());
    assert_eq!(json["status"], "success");
    assert_eq!(json["content"], Locale::Vi.messages().no_analysis);
    assert!(json["metadata"].get("data").is_none());

    let json = envelope(&server.routine(latest("new")).await.unwrap());
    assert_eq!(json["content"], Locale::Vi.messages().no_routine);
    assert_eq!(json["metadata"]["data"]["steps"], serde_json::json!([]));

    let (en, _) = server_en(&dir);
    let json = envelope(&en.latest_analysis(latest("new")).await.unwrap());
    assert_eq!(json["content"], "No skin analysis yet. Use `analyze_skin` with a photo first.");

    let _ = std::fs::remove_dir_all(&dir);
}

fn server_en(dir: &std::path::Path) -> (AdvisorServer, Arc<LocalStore>) {
    server(dir, Some(REPLY), Locale::En)
}

// ---------------------------------------------------------------------------
// routine / routine_toggle / routine_update
// ---------------------------------------------------------------------------

async fn seed(store: &LocalStore, user: &str, timestamp: i64, steps: &[&str]) {
    let analysis = SkinAnalysisResult {
        recommendations: steps.iter().map(|s| s.to_string()).collect(),
        timestamp,
        ..Default::default()
    };
    store.save_analysis(user, &analysis).await.unwrap();
}

#[tokio::test]
async fn routine_edits_persist_across_server_instances() {
    let dir = temp_dir("routine");
    let (server, store) = server(&dir, Some(REPLY), Locale::En);
    seed(&store, "ann", 10, &["Cleanse", "Moisturize"]).await;

    let json = envelope(
        &server
            .routine_toggle(Parameters(RoutineToggleRequest {
                user_id: Some("ann".to_string()),
                index: 1,
            }))
            .await
            .unwrap(),
    );
    assert_eq!(json["status"], "success");
    assert_eq!(json["content"], "0. [ ] Cleanse\n1. [x] Moisturize");

    server
        .routine_update(Parameters(RoutineUpdateRequest {
            user_id: Some("ann".to_string()),
            index: 0,
            text: "Double cleanse".to_string(),
        }))
        .await
        .unwrap();

    // A fresh server over the same directory sees the saved state.
    let (restarted, _) = server_en(&dir);
    let json = envelope(&restarted.routine(latest("ann")).await.unwrap());
    assert_eq!(json["content"], "0. [ ] Double cleanse\n1. [x] Moisturize");
    assert_eq!(json["metadata"]["data"]["steps"][1]["is_done"], true);

    // Other users are untouched.
    seed(&store, "bob", 10, &["Cleanse", "Moisturize"]).await;
    let json = envelope(&restarted.routine(latest("bob")).await.unwrap());
    assert_eq!(json["content"], "0. [ ] Cleanse\n1. [ ] Moisturize");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn newer_analysis_starts_a_fresh_routine() {
    let dir = temp_dir("routine-fresh");
    let (server, store) = server(&dir, Some(REPLY), Locale::En);
    seed(&store, "ann", 10, &["Cleanse"]).await;
    server
        .routine_toggle(Parameters(RoutineToggleRequest {
            user_id: Some("ann".to_string()),
            index: 0,
        }))
        .await
        .unwrap();

    seed(&store, "ann", 20, &["Exfoliate", "SPF"]).await;
    let json = envelope(&server.routine(latest("ann")).await.unwrap());
    assert_eq!(json["content"], "0. [ ] Exfoliate\n1. [ ] SPF");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn routine_index_out_of_range_is_invalid_params() {
    let dir = temp_dir("routine-range");
    let (server, store) = server(&dir, Some(REPLY), Locale::En);
    seed(&store, "ann", 10, &["Cleanse"]).await;

    let toggled = server
        .routine_toggle(Parameters(RoutineToggleRequest {
            user_id: Some("ann".to_string()),
            index: 3,
        }))
        .await;
    assert!(toggled.is_err());

    let updated = server
        .routine_update(Parameters(RoutineUpdateRequest {
            user_id: Some("ann".to_string()),
            index: 0,
            text: "   ".to_string(),
        }))
        .await;
    assert!(updated.is_err());

    let json = envelope(&server.routine(latest("ann")).await.unwrap());
    assert_eq!(json["content"], "0. [ ] Cleanse");

    let _ = std::fs::remove_dir_all(&dir);
}

// ---------------------------------------------------------------------------
// chat / chat_history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_records_the_session_transcript() {
    let dir = temp_dir("chat");
    let (server, _) = server(&dir, Some("  Wear sunscreen. "), Locale::En);

    let json = envelope(
        &server
            .chat(Parameters(ChatRequest {
                message: "Best daily habit?".to_string(),
            }))
            .await
            .unwrap(),
    );
    assert_eq!(json["status"], "success");
    assert_eq!(json["content"], "Wear sunscreen.");
    assert_eq!(json["metadata"]["model_used"], "openai/gpt-4o");

    let json = envelope(&server.chat_history().await.unwrap());
    let messages = json["metadata"]["data"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["text"], Locale::En.messages().greeting);
    assert_eq!(messages[1]["from_user"], true);
    assert_eq!(messages[2]["text"], "Wear sunscreen.");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn failed_chat_returns_the_apology_as_error() {
    let dir = temp_dir("chat-fail");
    let (server, _) = server(&dir, None, Locale::En);

    let json = envelope(
        &server
            .chat(Parameters(ChatRequest {
                message: "Hello?".to_string(),
            }))
            .await
            .unwrap(),
    );
    assert_eq!(json["status"], "error");
    assert_eq!(
        json["content"],
        "Sorry, I couldn't process your request: request timed out after 120000ms"
    );

    let blank = server
        .chat(Parameters(ChatRequest {
            message: " ".to_string(),
        }))
        .await;
    assert!(blank.is_err());

    let json = envelope(&server.chat_history().await.unwrap());
    assert_eq!(json["metadata"]["data"].as_array().unwrap().len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}
