use async_trait::async_trait;

pub mod gemini;

pub use gemini::GeminiClient;

use crate::plan::plan;
use crate::prompt::build_prompt_with_focus;
use crate::response::{normalize, Analysis};
use crate::utils::video_label;
use crate::Result;

/// Remote model that can look at a video and answer a prompt about it
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    /// Send the video reference and prompt, returning the model's raw text reply
    async fn describe(&self, video_url: &str, prompt: &str) -> Result<String>;

    /// Name of the backing service, for logs
    fn name(&self) -> &'static str;
}

/// Result of one video in a batch run
#[derive(Debug)]
pub struct BatchItem {
    pub url: String,
    pub video_id: String,
    pub analysis: Analysis,
}

/// Plans offsets, prompts the analyzer and normalizes its reply
pub struct Timestamper<A: VideoAnalyzer> {
    analyzer: A,
    focus: Option<String>,
}

impl<A: VideoAnalyzer> Timestamper<A> {
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            focus: None,
        }
    }

    /// Add a content hint to every prompt
    pub fn with_focus(mut self, focus: Option<String>) -> Self {
        self.focus = focus;
        self
    }

    /// Generate timestamps for one video.
    ///
    /// Only an invalid interval is returned as `Err`. Remote call failures and unparseable
    /// replies are logged and come back as [`Analysis::Failed`].
    pub async fn generate_timestamps(&self, video_url: &str, interval_minutes: i64) -> Result<Analysis> {
        let plan = plan(interval_minutes)?;
        let prompt = build_prompt_with_focus(&plan, self.focus.as_deref());

        tracing::info!(
            "Asking {} about {} offsets in {}",
            self.analyzer.name(),
            plan.len(),
            video_url
        );

        match self.analyzer.describe(video_url, &prompt).await {
            Ok(raw) => Ok(normalize(&raw)),
            Err(err) => {
                tracing::warn!("Error generating timestamps: {}", err);
                Ok(Analysis::Failed(err))
            }
        }
    }

    /// Process several videos one after another. A failure on one video never stops the rest.
    pub async fn generate_batch<S: AsRef<str>>(
        &self,
        urls: &[S],
        interval_minutes: i64,
    ) -> Result<Vec<BatchItem>> {
        // Reject a bad interval once instead of failing every item
        plan(interval_minutes)?;

        let mut items = Vec::with_capacity(urls.len());

        for (index, url) in urls.iter().enumerate() {
            let url = url.as_ref();
            let video_id = video_label(url);
            tracing::info!("Processing video {}/{}: {}", index + 1, urls.len(), video_id);

            let analysis = self.generate_timestamps(url, interval_minutes).await?;
            match analysis.failure() {
                None => tracing::info!("Generated {} timestamps for {}", analysis.entries().len(), video_id),
                Some(err) => tracing::warn!("Skipping {}: {}", video_id, err),
            }

            items.push(BatchItem {
                url: url.to_string(),
                video_id,
                analysis,
            });
        }

        Ok(items)
    }
}
