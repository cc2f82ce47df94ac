use serde::{Deserialize, Serialize};

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Body of `POST /api/chat/{id}` and `POST /api/chat/{id}/edit/{message_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The (new or revised) user message.
    pub message: String,
    /// The model identifier selected by the user.
    pub model: String,
}

impl ChatRequest {
    /// Create a new `ChatRequest`.
    pub fn new(message: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            model: model.into(),
        }
    }
}

/// Body of `POST /api/job-fit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobFitRequest {
    /// The candidate to evaluate.
    pub candidate_id: String,
    /// The job description pasted by the user.
    pub job_description: String,
    /// The model identifier selected by the user.
    pub model: String,
}

impl JobFitRequest {
    /// Create a new `JobFitRequest` using the default model.
    pub fn new(candidate_id: impl Into<String>, job_description: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            job_description: job_description.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn chat_request_serialization() {
        let request = ChatRequest::new("Is she a fit?", DEFAULT_MODEL);
        assert_eq!(
            to_value(&request).unwrap(),
            json!({"message": "Is she a fit?", "model": "openai/gpt-4o-mini"})
        );
    }

    #[test]
    fn job_fit_request_serialization() {
        let request = JobFitRequest::new("jdoe", "Rust engineer").with_model("x/y");
        assert_eq!(
            to_value(&request).unwrap(),
            json!({
                "candidate_id": "jdoe",
                "job_description": "Rust engineer",
                "model": "x/y"
            })
        );
    }
}
