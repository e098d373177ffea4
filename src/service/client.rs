use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::HiringService;
use super::error::ServiceError;
use super::types::{
    AdvanceResponse, NextStepResponse, OrgProfile, RecordRequest, SaveOutcome,
    SaveWorkflowResponse, ServiceErrorBody,
};
use crate::config::HireflowConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::{CandidateId, CandidateProgress, StageKind, StagePayload, WorkflowDefinition};
use crate::session::Session;

/// REST client for the hiring-data service. Every request carries the
/// session's bearer credential; without one nothing is sent.
pub struct HiringClient {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HiringClient {
    pub fn new(base_url: &str, session: Session) -> Result<Self> {
        Self::with_timeouts(
            base_url,
            session,
            Duration::from_secs(10),
            Duration::from_secs(30),
        )
    }

    pub fn from_config(config: &HireflowConfig) -> Result<Self> {
        Self::with_timeouts(
            &config.base_url,
            Session::with_token(config.token.clone()),
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_timeouts(
        base_url: &str,
        session: Session,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PipelineError::Config(format!("invalid base_url `{base_url}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PipelineError::Config(format!(
                "base_url `{base_url}` cannot carry a path"
            )));
        }
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .map_err(ServiceError::from)?;
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ServiceError> {
        let token = self.session.bearer()?;
        let url = self.endpoint(segments);
        debug!(%method, %url, "hiring service request");
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, ServiceError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ServiceErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("unknown error").to_string()
                    } else {
                        body
                    }
                });
            warn!(status = status.as_u16(), %message, "hiring service call failed");
            return Err(ServiceError::from_status(status, message));
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ServiceError> {
        let body = self.send(req).await?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    async fn post_detail<T: Serialize>(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        payload: &T,
        kind: &str,
    ) -> Result<(), ServiceError> {
        let flag_key = stage.flag_key();
        let req = self
            .request(
                Method::POST,
                &["candidates", candidate.as_str(), "stages", &flag_key, kind],
            )?
            .json(&RecordRequest {
                candidate_id: candidate,
                stage,
                payload,
            });
        self.send(req).await.map(|_| ())
    }
}

impl HiringService for HiringClient {
    async fn get_workflow(&self) -> Result<WorkflowDefinition, ServiceError> {
        let req = self.request(Method::GET, &["workflow"])?;
        self.send_json(req).await
    }

    async fn save_workflow(
        &self,
        definition: &WorkflowDefinition,
    ) -> Result<SaveOutcome, ServiceError> {
        let req = self.request(Method::PUT, &["workflow"])?.json(definition);
        let resp: SaveWorkflowResponse = self.send_json(req).await?;
        Ok(resp.status)
    }

    async fn next_step(&self, candidate: &CandidateId) -> Result<Option<StageKind>, ServiceError> {
        let req = self.request(Method::GET, &["candidates", candidate.as_str(), "next-step"])?;
        let resp: NextStepResponse = self.send_json(req).await?;
        Ok(resp.next_step)
    }

    async fn advance_candidate(
        &self,
        candidate: &CandidateId,
    ) -> Result<AdvanceResponse, ServiceError> {
        let req = self.request(Method::POST, &["candidates", candidate.as_str(), "advance"])?;
        self.send_json(req).await
    }

    async fn candidate_progress(
        &self,
        candidate: &CandidateId,
    ) -> Result<CandidateProgress, ServiceError> {
        let req = self.request(Method::GET, &["candidates", candidate.as_str(), "progress"])?;
        self.send_json(req).await
    }

    async fn record_stage_detail(
        &self,
        candidate: &CandidateId,
        stage: &StageKind,
        payload: &StagePayload,
    ) -> Result<(), ServiceError> {
        let kind = payload.kind();
        match payload {
            StagePayload::Schedule(p) => self.post_detail(candidate, stage, p, kind).await,
            StagePayload::Feedback(p) => self.post_detail(candidate, stage, p, kind).await,
            StagePayload::Submission(p) => self.post_detail(candidate, stage, p, kind).await,
            StagePayload::Offer(p) => self.post_detail(candidate, stage, p, kind).await,
        }
    }

    async fn org_profile(&self) -> Result<OrgProfile, ServiceError> {
        let req = self.request(Method::GET, &["organization", "profile"])?;
        self.send_json(req).await
    }
}
