// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! HTTP client for the translation backend.
//!
//! Images are posted as raw PNG bodies; chains are posted as JSON. Every
//! response is parsed leniently so a sloppy backend degrades to defaults
//! instead of failing the whole request.

use super::{
    ChainItem, ChainTranslation, Detection, RegionTranslation, ServiceError, TranslationService,
};
use serde::Serialize;
use std::time::Duration;

/// Translation backend reachable over HTTP.
pub struct HttpTranslationService {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RetranslateRequest<'a> {
    target_language: &'a str,
    items: &'a [ChainItem],
}

impl HttpTranslationService {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn post_image(
        &self,
        path: &str,
        image: &[u8],
        target_language: &str,
    ) -> Result<String, ServiceError> {
        let response = self
            .agent
            .post(&self.endpoint(path))
            .query("targetLanguage", target_language)
            .set("Content-Type", "image/png")
            .send_bytes(image)
            .map_err(map_transport_error)?;
        response
            .into_string()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))
    }
}

impl TranslationService for HttpTranslationService {
    fn detect(&self, image: &[u8], target_language: &str) -> Result<Vec<Detection>, ServiceError> {
        let body = self.post_image("detect", image, target_language)?;
        let detections = parse_detections(&body)?;
        log::info!("Detection returned {} regions", detections.len());
        Ok(detections)
    }

    fn translate_region(
        &self,
        image: &[u8],
        target_language: &str,
    ) -> Result<RegionTranslation, ServiceError> {
        let body = self.post_image("translate-region", image, target_language)?;
        Ok(parse_region(&body))
    }

    fn retranslate_chain(
        &self,
        chain: &[ChainItem],
        target_language: &str,
    ) -> Result<Vec<ChainTranslation>, ServiceError> {
        if chain.is_empty() {
            return Ok(Vec::new());
        }
        let request = RetranslateRequest {
            target_language,
            items: chain,
        };
        let body = self
            .agent
            .post(&self.endpoint("retranslate"))
            .send_json(&request)
            .map_err(map_transport_error)?
            .into_string()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        parse_chain(&body)
    }
}

fn map_transport_error(error: ureq::Error) -> ServiceError {
    match error {
        ureq::Error::Status(code, response) => ServiceError::Status {
            code,
            message: response.status_text().to_string(),
        },
        ureq::Error::Transport(transport) => ServiceError::Unavailable(transport.to_string()),
    }
}

/// Parse a detection list. `null`, an empty body, or a wrapper object with a
/// `detections` field are all accepted.
pub fn parse_detections(body: &str) -> Result<Vec<Detection>, ServiceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    let list = match value {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Object(mut map) => map
            .remove("detections")
            .unwrap_or(serde_json::Value::Null),
        other => other,
    };
    match list {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()),
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(ServiceError::Malformed(format!(
            "expected a list of detections, got {other}"
        ))),
    }
}

/// Parse a region translation, substituting the sentinel for anything
/// unusable.
pub fn parse_region(body: &str) -> RegionTranslation {
    match serde_json::from_str::<RegionTranslation>(body) {
        Ok(region) => region,
        Err(e) => {
            log::warn!("Unusable region translation payload: {}", e);
            RegionTranslation::sentinel()
        }
    }
}

/// Parse chain results. Entries without a usable id are skipped.
pub fn parse_chain(body: &str) -> Result<Vec<ChainTranslation>, ServiceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    let list = match value {
        serde_json::Value::Object(mut map) => {
            map.remove("items").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    };
    match list {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(ServiceError::Malformed(format!(
            "expected a list of translations, got {other}"
        ))),
    }
}
