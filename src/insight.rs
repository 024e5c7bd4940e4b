// Natural-language insights about a chart selection, from an external
// completion service with deterministic fallbacks.

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::data::Dataset;
use crate::error::ServiceError;
use crate::registry::ChartType;
use crate::transform::ChartRequest;

const MAX_INSIGHTS: usize = 4;
const SUMMARY_COLUMNS: usize = 5;

/// Anything that can turn a prompt into a text completion.
pub trait CompletionService {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiClient {
    pub fn new(settings: &Settings) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.ai_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.openai_api_key.clone(),
            endpoint: format!("{}/chat/completions", settings.openai_base_url),
            model: settings.ai_model.clone(),
            max_tokens: settings.ai_max_tokens,
            temperature: settings.ai_temperature,
        })
    }

    fn payload(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        })
    }
}

impl CompletionService for OpenAiClient {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        debug!(endpoint = %self.endpoint, model = %self.model, "requesting completion");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.payload(prompt))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json()?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ServiceError::Malformed("missing choices[0].message.content".to_string()))
    }
}

/// Bounded description of a dataset sent along with the prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub shape: (usize, usize),
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
}

impl DatasetSummary {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            shape: dataset.shape(),
            numeric_columns: dataset
                .numeric_columns()
                .iter()
                .take(SUMMARY_COLUMNS)
                .map(|c| c.name.clone())
                .collect(),
            categorical_columns: dataset
                .categorical_columns()
                .iter()
                .take(SUMMARY_COLUMNS)
                .map(|c| c.name.clone())
                .collect(),
        }
    }
}

fn selection(request: &ChartRequest) -> String {
    let mut context = format!(
        "Chart: {}, X: {}, Y: {}",
        request.chart_type,
        request.x_column,
        request.y_column.as_deref().unwrap_or("None")
    );
    if let Some(size) = &request.size_column {
        context.push_str(&format!(", Size: {}", size));
    }
    if let Some(stack) = &request.stack_column {
        context.push_str(&format!(", Stack: {}", stack));
    }
    context
}

pub fn build_prompt(summary: &DatasetSummary, request: &ChartRequest) -> String {
    let data_context = serde_json::to_string(summary).unwrap_or_default();
    format!(
        "Data context: {}\nSelected: {}\n\n\
         Provide 3-4 brief insights about this visualization choice.\n\
         Format as JSON array of strings. Each insight should be 1 sentence.",
        data_context,
        selection(request)
    )
}

/// Parse a JSON array of strings, tolerating a surrounding markdown fence.
/// An empty array is treated as no answer.
fn parse_insights(text: &str) -> Option<Vec<String>> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches("json");
        body = body.strip_suffix("```").unwrap_or(body);
    }
    let insights: Vec<String> = serde_json::from_str(body.trim()).ok()?;
    if insights.is_empty() {
        None
    } else {
        Some(insights)
    }
}

/// Used when the service answered with something that is not a list of insights.
pub fn parse_fallback(chart_type: ChartType, x: &str, y: Option<&str>) -> Vec<String> {
    vec![
        format!("✅ {} is perfect for your data combination", chart_type.title()),
        format!(
            "📊 Shows clear relationship between {} and {}",
            x,
            y.unwrap_or("distribution")
        ),
        "🎯 Great choice for exploring patterns in your dataset".to_string(),
        "💡 Consider filtering data if you have too many categories".to_string(),
    ]
}

/// Used when the service could not be reached at all.
pub fn failure_fallback(chart_type: ChartType, x: &str, y: Option<&str>) -> Vec<String> {
    let columns = match y {
        Some(y) => format!("{} and {}", x, y),
        None => x.to_string(),
    };
    vec![
        format!("📊 {} visualization selected", chart_type.title()),
        format!("✅ Good choice for {}", columns),
        "🎯 This chart type effectively shows your data patterns".to_string(),
        "💡 Make sure your data is clean for best results".to_string(),
    ]
}

/// Up to four short insights about the chart selection. Never fails:
/// service errors and unusable answers are replaced by canned messages.
pub fn recommend(
    service: &dyn CompletionService,
    dataset: &Dataset,
    request: &ChartRequest,
) -> Vec<String> {
    let prompt = build_prompt(&DatasetSummary::of(dataset), request);
    let y = request.y_column.as_deref();

    let mut insights = match service.complete(&prompt) {
        Ok(text) => parse_insights(&text).unwrap_or_else(|| {
            warn!(chart = %request.chart_type, "AI answer was not a JSON list of insights");
            parse_fallback(request.chart_type, &request.x_column, y)
        }),
        Err(e) => {
            warn!(chart = %request.chart_type, error = %e, "AI insights unavailable");
            failure_fallback(request.chart_type, &request.x_column, y)
        }
    };
    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Like [`recommend`], but the service itself may have failed to come up.
/// That failure is absorbed the same way as a failed call.
pub fn recommend_from<S: CompletionService>(
    service: Result<S, ServiceError>,
    dataset: &Dataset,
    request: &ChartRequest,
) -> Vec<String> {
    match service {
        Ok(service) => recommend(&service, dataset, request),
        Err(e) => {
            warn!(chart = %request.chart_type, error = %e, "AI client unavailable");
            failure_fallback(request.chart_type, &request.x_column, request.y_column.as_deref())
        }
    }
}

/// Insights from the OpenAI client described by `settings`.
pub fn recommend_with_settings(settings: &Settings, dataset: &Dataset, request: &ChartRequest) -> Vec<String> {
    recommend_from(OpenAiClient::new(settings), dataset, request)
}
