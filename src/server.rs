use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use tokio::sync::Mutex;

use crate::analyzer::SkinAnalyzer;
use crate::catalog::ProductCatalog;
use crate::chat::{AdvisorChat, ChatTranscript};
use crate::config::Config;
use crate::dispatch::ChatBackend;
use crate::dispatch::http::HttpDispatch;
use crate::error::AdvisorError;
use crate::format::{Locale, render_history, render_stored};
use crate::image;
use crate::model::SkinAnalysisResult;
use crate::response::{ToolMetadata, ToolResponse};
use crate::routine::{Routine, RoutineTracker};
use crate::store::{AnalysisStore, LocalStore, RoutineStore};
use crate::tools::analysis::{AnalyzeRequest, HistoryRequest, LatestRequest, user_or_default};
use crate::tools::chat::ChatRequest;
use crate::tools::products::{ProductListing, ProductsRequest};
use crate::tools::routine::{RoutineToggleRequest, RoutineUpdateRequest};

#[derive(Clone)]
pub struct AdvisorServer {
    analyzer: Arc<SkinAnalyzer>,
    chat: Arc<AdvisorChat>,
    /// Session transcript; one exchange at a time keeps question and answer adjacent.
    transcript: Arc<Mutex<ChatTranscript>>,
    routines: Arc<RoutineTracker>,
    catalog: Arc<dyn ProductCatalog>,
    default_user: String,
    analysis_model: String,
    locale: Locale,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AdvisorServer {
    /// Production wiring: HTTP backend plus the local JSON store.
    pub fn new(config: Config) -> Result<Self, AdvisorError> {
        let backend: Arc<dyn ChatBackend> = Arc::new(HttpDispatch::new(config.endpoint.clone())?);
        let store = Arc::new(LocalStore::new(config.data_dir.clone()));
        tracing::info!("data directory: {}", store.base_dir().display());
        Ok(Self::with_parts(
            backend,
            store.clone(),
            store.clone(),
            store,
            &config,
        ))
    }

    /// Wire the server from explicit collaborators.
    pub fn with_parts(
        backend: Arc<dyn ChatBackend>,
        catalog: Arc<dyn ProductCatalog>,
        store: Arc<dyn AnalysisStore>,
        routines: Arc<dyn RoutineStore>,
        config: &Config,
    ) -> Self {
        let analyzer = SkinAnalyzer::new(
            backend.clone(),
            catalog.clone(),
            store.clone(),
            config.analysis_model.clone(),
            config.locale,
        );
        let chat = AdvisorChat::new(backend, config.chat_model.clone(), config.locale);
        Self {
            analyzer: Arc::new(analyzer),
            chat: Arc::new(chat),
            transcript: Arc::new(Mutex::new(ChatTranscript::new(config.locale))),
            routines: Arc::new(RoutineTracker::new(store, routines)),
            catalog,
            default_user: config.default_user.clone(),
            analysis_model: config.analysis_model.clone(),
            locale: config.locale,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "analyze_skin",
        description = "Analyze a photo of skin: skin type, hydration, oil level, condition, concerns, care recommendations, tips and matching catalog products. The result is saved to the user's history."
    )]
    pub async fn analyze_skin(
        &self,
        Parameters(req): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user = user_or_default(req.user_id.as_deref(), &self.default_user).to_string();
        let image = image::load_image(&req.image_path)
            .await
            .map_err(|e| McpError::invalid_params(e.user_message(), None))?;

        let messages = self.locale.messages();
        let start = Instant::now();
        let response = match self.analyzer.analyze(&user, image).await {
            Ok(outcome) => {
                let mut content = outcome.display.clone();
                if outcome.document_id.is_none() {
                    content.push_str(&format!("\n\n{}", messages.not_saved));
                }
                ToolResponse::markdown(
                    content,
                    ToolMetadata::new("analyze_skin", &outcome.model, start.elapsed().as_secs_f64())
                        .with_data(&outcome),
                )
            }
            Err(e) => {
                tracing::warn!("analyze_skin failed: {e}");
                ToolResponse::error(
                    format!("{}: {}", messages.analysis_failed, e.user_message()),
                    ToolMetadata::new(
                        "analyze_skin",
                        &self.analysis_model,
                        start.elapsed().as_secs_f64(),
                    ),
                )
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "chat",
        description = "Ask the skincare assistant a question about skin, skincare products or routines."
    )]
    pub async fn chat(
        &self,
        Parameters(req): Parameters<ChatRequest>,
    ) -> Result<CallToolResult, McpError> {
        image::validate_message(&req.message)
            .map_err(|e| McpError::invalid_params(e.user_message(), None))?;

        let start = Instant::now();
        let reply = {
            let mut transcript = self.transcript.lock().await;
            transcript.send(&self.chat, &req.message).await.clone()
        };
        let metadata = ToolMetadata::new("chat", self.chat.model(), start.elapsed().as_secs_f64());

        let response = if reply.failed {
            ToolResponse::error(reply.text, metadata)
        } else {
            ToolResponse::success(reply.text, metadata)
        };
        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "chat_history",
        description = "Show this session's chat transcript, starting with the assistant's greeting.",
        annotations(read_only_hint = true)
    )]
    pub async fn chat_history(&self) -> Result<CallToolResult, McpError> {
        let transcript = self.transcript.lock().await;
        let content = transcript
            .messages()
            .iter()
            .map(|m| {
                let who = if m.from_user { "**You**" } else { "**Assistant**" };
                format!("{who}: {}", m.text)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let response = ToolResponse::markdown(
            content,
            ToolMetadata::new("chat_history", "none", 0.0).with_data(&transcript.messages()),
        );
        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "latest_analysis",
        description = "Show the user's most recent skin analysis.",
        annotations(read_only_hint = true)
    )]
    pub async fn latest_analysis(
        &self,
        Parameters(req): Parameters<LatestRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user = user_or_default(req.user_id.as_deref(), &self.default_user);
        let metadata = ToolMetadata::new("latest_analysis", "none", 0.0);

        let response = match self.analyzer.latest(user).await {
            Ok(Some(result)) => {
                let names = self.product_names(&result).await;
                ToolResponse::markdown(
                    render_stored(&result, names, self.locale),
                    metadata.with_data(&result),
                )
            }
            Ok(None) => {
                ToolResponse::success(self.locale.messages().no_analysis.to_string(), metadata)
            }
            Err(e) => {
                tracing::warn!("latest_analysis failed: {e}");
                ToolResponse::error(e.user_message(), metadata)
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "analysis_history",
        description = "List the user's past skin analyses, newest first.",
        annotations(read_only_hint = true)
    )]
    pub async fn analysis_history(
        &self,
        Parameters(req): Parameters<HistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user = user_or_default(req.user_id.as_deref(), &self.default_user);
        let metadata = ToolMetadata::new("analysis_history", "none", 0.0);

        let response = match self.analyzer.history(user, req.limit()).await {
            Ok(results) => ToolResponse::markdown(
                render_history(&results, self.locale),
                metadata.with_data(&results),
            ),
            Err(e) => {
                tracing::warn!("analysis_history failed: {e}");
                ToolResponse::error(e.user_message(), metadata)
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "products",
        description = "Browse the product catalog by category and/or skin type.",
        annotations(read_only_hint = true)
    )]
    pub async fn products(
        &self,
        Parameters(req): Parameters<ProductsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let metadata = ToolMetadata::new("products", "none", 0.0);

        let response = match self.catalog.list_products().await {
            Ok(all) => {
                let listing = ProductListing::build(&all, &req);
                ToolResponse::markdown(listing.to_markdown(), metadata.with_data(&listing))
            }
            Err(e) => {
                tracing::warn!("products failed: {e}");
                ToolResponse::error(e.user_message(), metadata)
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "routine",
        description = "Today's skincare routine from the latest analysis, with each step's done state. Steps are numbered from 0.",
        annotations(read_only_hint = true)
    )]
    pub async fn routine(
        &self,
        Parameters(req): Parameters<LatestRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user = user_or_default(req.user_id.as_deref(), &self.default_user);
        let result = self.routines.current(user).await;
        self.routine_response("routine", result)
    }

    #[tool(
        name = "routine_toggle",
        description = "Mark a step of the user's routine done, or undone again."
    )]
    pub async fn routine_toggle(
        &self,
        Parameters(req): Parameters<RoutineToggleRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user = user_or_default(req.user_id.as_deref(), &self.default_user);
        let result = self.routines.toggle(user, req.index).await;
        self.routine_response("routine_toggle", result)
    }

    #[tool(
        name = "routine_update",
        description = "Replace the text of a step in the user's routine."
    )]
    pub async fn routine_update(
        &self,
        Parameters(req): Parameters<RoutineUpdateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let user = user_or_default(req.user_id.as_deref(), &self.default_user);
        let result = self.routines.update(user, req.index, &req.text).await;
        self.routine_response("routine_update", result)
    }
}

impl AdvisorServer {
    /// Catalog names for the result's product IDs; unknown IDs are shown as-is.
    async fn product_names(&self, result: &SkinAnalysisResult) -> Vec<String> {
        let products = self.catalog.list_products().await.unwrap_or_else(|e| {
            tracing::warn!("catalog unavailable while rendering analysis: {e}");
            Vec::new()
        });
        result
            .recommended_product_ids
            .iter()
            .map(|id| {
                products
                    .iter()
                    .find(|p| &p.id == id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| id.clone())
            })
            .collect()
    }

    fn routine_response(
        &self,
        tool: &str,
        result: Result<Routine, AdvisorError>,
    ) -> Result<CallToolResult, McpError> {
        let metadata = ToolMetadata::new(tool, "none", 0.0);
        let response = match result {
            Ok(routine) => {
                let content = if routine.is_empty() {
                    self.locale.messages().no_routine.to_string()
                } else {
                    routine.to_markdown()
                };
                ToolResponse::markdown(content, metadata.with_data(&routine))
            }
            Err(AdvisorError::InvalidInput(msg)) => {
                return Err(McpError::invalid_params(msg, None));
            }
            Err(e) => {
                tracing::warn!("{tool} failed: {e}");
                ToolResponse::error(e.user_message(), metadata)
            }
        };
        Ok(response.into_call_tool_result())
    }
}

#[tool_handler]
impl ServerHandler for AdvisorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "skincare-advisor".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Skincare advisor.\n\n\
                 1. `analyze_skin` with the path of a skin photo to get a structured analysis \
                    and product matches; the result is saved per user.\n\
                 2. `latest_analysis` / `analysis_history` to read saved results.\n\
                 3. `routine` for today's checklist built from the latest recommendations; \
                    `routine_toggle` / `routine_update` to tick off or edit steps.\n\
                 4. `products` to browse the catalog; `chat` for skincare questions, \
                    `chat_history` for this session's transcript."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
