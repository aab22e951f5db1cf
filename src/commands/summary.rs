use crate::api::{ApiError, SummaryClient};

/// Send a prompt to the summary provider and return its text
pub async fn request_summary(client: &dyn SummaryClient, prompt: &str) -> Result<String, ApiError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::InvalidRequest("prompt is empty".to_string()));
    }

    let response = client.summarize(prompt).await?;
    let response = response.trim();
    if response.is_empty() {
        return Err(ApiError::ParseError(format!(
            "{} returned an empty summary",
            client.provider_name()
        )));
    }

    log::debug!("{} returned {} characters", client.provider_name(), response.chars().count());
    Ok(response.to_string())
}
