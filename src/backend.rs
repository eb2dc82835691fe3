use log::{debug, error, info};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::compress::{compress, CompressOptions, CompressedImage};
use crate::config::BackendConfig;
use crate::error::{Result, SubmitError};
use crate::models::{ScoreSubmission, ValidatedSubmission};
use crate::utils::{now_millis, object_path, random_nonce};

#[derive(Deserialize, Debug)]
struct BackendErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Thin client for the hosted storage bucket and submissions table.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            http: Client::new(),
            config,
        })
    }

    pub fn upload_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url(),
            self.config.bucket,
            path
        )
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url(),
            self.config.bucket,
            path
        )
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.base_url(), self.config.table)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    pub async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        debug!("Uploading {} bytes to {}", bytes.len(), path);
        let resp = self
            .authorized(self.http.post(self.upload_url(path)))
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        ensure_success(resp).await
    }

    pub async fn insert(&self, record: &ScoreSubmission) -> Result<()> {
        debug!("Inserting submission row: {}", serde_json::to_string(record)?);
        let resp = self
            .authorized(self.http.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;
        ensure_success(resp).await
    }

    /// Compresses the screenshot, stores it, and records the submission row.
    /// Returns the public URL of the stored image.
    pub async fn submit(
        &self,
        submission: ValidatedSubmission,
        options: &CompressOptions,
    ) -> Result<String> {
        let CompressedImage { bytes, width, height, quality } =
            compress(&submission.image.bytes, options)?;
        info!(
            "Compressed {} from {} KB to {} KB ({}x{} q{})",
            submission.image.name,
            submission.image.size_kb(),
            bytes.len().div_ceil(1024),
            width,
            height,
            quality
        );

        let path = object_path(&submission.team_id, submission.map, now_millis(), random_nonce());
        self.upload(&path, bytes, CompressedImage::MIME).await?;

        let url = self.public_url(&path);
        let record = submission.into_record(url.clone());
        self.insert(&record).await.map_err(|e| {
            error!("Image stored at {} but row insert failed: {}", path, e);
            e
        })?;

        info!(
            "Submitted team {} map {} placement {}",
            record.team_id,
            record.map_number,
            record.placement.get()
        );
        Ok(url)
    }
}

async fn ensure_success(resp: Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SubmitError::Backend {
        status: status.as_u16(),
        message: backend_message(&body),
    })
}

fn backend_message(body: &str) -> String {
    serde_json::from_str::<BackendErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        BackendClient::new(BackendConfig {
            url: "https://abc.supabase.co/".into(),
            anon_key: "anon".into(),
            bucket: "scoreboards".into(),
            table: "submissions".into(),
        })
        .unwrap()
    }

    #[test]
    fn urls_follow_storage_and_rest_layout() {
        let c = client();
        assert_eq!(
            c.upload_url("t1/map01_1_00000000.jpg"),
            "https://abc.supabase.co/storage/v1/object/scoreboards/t1/map01_1_00000000.jpg"
        );
        assert_eq!(
            c.public_url("t1/map01_1_00000000.jpg"),
            "https://abc.supabase.co/storage/v1/object/public/scoreboards/t1/map01_1_00000000.jpg"
        );
        assert_eq!(c.table_url(), "https://abc.supabase.co/rest/v1/submissions");
    }

    #[test]
    fn new_rejects_incomplete_config() {
        let err = BackendClient::new(BackendConfig {
            url: "https://abc.supabase.co".into(),
            anon_key: String::new(),
            bucket: "b".into(),
            table: "t".into(),
        })
        .unwrap_err();
        assert!(matches!(err, SubmitError::Config(_)));
    }

    #[test]
    fn backend_message_prefers_json_fields() {
        assert_eq!(
            backend_message(r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#),
            "The resource already exists"
        );
        assert_eq!(backend_message(r#"{"error":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(backend_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(backend_message(""), "no response body");
    }
}
