// JSON-over-HTTP ingestion client

use super::{Publisher, check_batch};
use crate::error::PublishError;
use crate::models::Datapoint;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PutMetricData<'a> {
    namespace: &'a str,
    metric_data: &'a [Datapoint],
}

pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPublisher {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    #[instrument(
        skip(self, datapoints),
        fields(operation = "publish", batch_len = datapoints.len())
    )]
    async fn publish(&self, datapoints: &[Datapoint], namespace: &str) -> Result<(), PublishError> {
        check_batch(datapoints)?;

        let body = PutMetricData {
            namespace,
            metric_data: datapoints,
        };
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
