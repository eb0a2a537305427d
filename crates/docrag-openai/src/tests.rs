//! Snapshot tests for the OpenAI client

#[cfg(test)]
mod snapshot_tests {
    use std::collections::HashMap;

    use crate::client::{ChatMessage, ChatRequest, EmbeddingRequest};
    use crate::{EmbeddingProvider, Error, LLMProvider, OpenAIClient, OpenAIConfig};
    use insta::assert_yaml_snapshot;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_config_snapshot() {
        let config = OpenAIConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENAI_EMBEDDING_MODEL", "text-embedding-ada-002"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "sk-test");
        assert_yaml_snapshot!(config, @r###"
        ---
        api_url: "http://localhost:8080/v1"
        embedding_model: text-embedding-ada-002
        chat_model: gpt-4o-mini
        timeout:
          secs: 60
          nanos: 0
        "###);
    }

    #[test]
    fn test_missing_api_key() {
        let result = OpenAIConfig::from_lookup(lookup(&[("OPENAI_BASE_URL", "http://localhost")]));
        assert!(matches!(result, Err(Error::Configuration(_))));

        let result = OpenAIConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")]));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_invalid_timeout() {
        let result = OpenAIConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = OpenAIConfig::new("sk-secret".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_embedding_request_snapshot() {
        let input = vec![
            "Jobs are released from the Job Order screen".to_string(),
            "Close a job once all operations are complete".to_string(),
        ];
        let request = EmbeddingRequest {
            input: &input,
            model: "text-embedding-3-small",
        };

        assert_yaml_snapshot!(request, @r###"
        ---
        input:
          - Jobs are released from the Job Order screen
          - Close a job once all operations are complete
        model: text-embedding-3-small
        "###);
    }

    #[test]
    fn test_chat_request_omits_missing_temperature() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage { role: "user", content: "hello" }],
            max_tokens: 64,
            temperature: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 64);
    }

    #[test]
    fn test_model_selection() {
        let client = OpenAIClient::new(OpenAIConfig::new("test_key".to_string()))
            .unwrap()
            .with_embedding_model("text-embedding-3-large")
            .with_chat_model("gpt-4o");

        assert_eq!(EmbeddingProvider::model_id(&client), "text-embedding-3-large");
        assert_eq!(LLMProvider::model_id(&client), "gpt-4o");
    }
}
