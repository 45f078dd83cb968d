//! Live vendor data fetched from mock documentation and a mock Ollama server

use cms_evaluator::config::{LlmConfig, VendorConfig, VendorSource};
use cms_evaluator::{
    build_provider, Catalog, CapabilityScorer, EvalError, Ontology, ProviderKind, Selection,
    VendorAgent, VendorData,
};
use indexmap::IndexMap;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(name)
}

fn ontology() -> Arc<Ontology> {
    Arc::new(Ontology::load(&data_path("ontology.json")).unwrap())
}

fn vendor_config(docs_url: &str) -> VendorConfig {
    let mut sources = IndexMap::new();
    sources.insert(
        "contentful".to_string(),
        VendorSource {
            platform: Some("Contentful".to_string()),
            urls: vec![
                format!("{}/features", docs_url),
                format!("{}/pricing", docs_url),
            ],
        },
    );
    VendorConfig {
        sources,
        ..VendorConfig::default()
    }
}

fn agent(llm_url: String, vendor: VendorConfig) -> VendorAgent {
    let llm = LlmConfig {
        provider: ProviderKind::Ollama,
        api_url: Some(llm_url),
        timeout_secs: 5,
        ..LlmConfig::default()
    };
    let provider = build_provider(&llm).unwrap();
    VendorAgent::new(provider, ontology(), vendor).unwrap()
}

fn ollama_body(content: serde_json::Value) -> String {
    json!({
        "model": "llama3.1",
        "message": {"role": "assistant", "content": content.to_string()},
        "done": true
    })
    .to_string()
}

#[tokio::test]
async fn fetched_scores_change_the_ranking_input() {
    let mut docs = mockito::Server::new_async().await;
    let _features = docs
        .mock("GET", "/features")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body><nav>Menu</nav><h1>Features</h1><p>Content modeling and GraphQL delivery</p></body></html>")
        .create_async()
        .await;
    let _pricing = docs
        .mock("GET", "/pricing")
        .with_status(200)
        .with_body("<p>Free, Basic and Premium plans</p>")
        .create_async()
        .await;

    let mut llm = mockito::Server::new_async().await;
    let chat = llm
        .mock("POST", "/api/chat")
        .match_body(mockito::Matcher::Regex("Content modeling and GraphQL delivery".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ollama_body(json!({
            "capabilities": {
                "content_modeling": 3,
                "delivery": 3,
                "personalization": 3,
                "workflow": 3,
                "integrations": 3,
                "performance": 3,
                "operational": 3
            },
            "pricing_tier": "Premium",
            "key_features": ["GraphQL API", "Localization"],
            "strengths": ["API-first"],
            "weaknesses": []
        })))
        .expect(1)
        .create_async()
        .await;

    let agent = agent(llm.url(), vendor_config(&docs.url()));
    let data = agent.fetch("contentful").await.unwrap();
    chat.assert_async().await;

    assert_eq!(data.platform, "Contentful");
    assert_eq!(data.source_urls.len(), 2);
    assert_eq!(data.pricing_tier.as_deref(), Some("Premium"));
    assert!(data.excerpt.contains("Free, Basic and Premium plans"));
    assert!(!data.excerpt.contains("Menu"));
    assert!(data.extracted_by.starts_with("ollama"));

    // Saved output loads back and overlays the shipped catalog
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), serde_json::to_string(&vec![data]).unwrap()).unwrap();
    let saved = VendorData::load_all(file.path()).unwrap();

    let ontology = ontology();
    let mut catalog = Catalog::load(&data_path("platforms.json"), &ontology).unwrap();
    let selection = Selection::new(vec!["enrollment_funnel".to_string()]);
    let scorer = CapabilityScorer::new(&ontology);
    let before = scorer
        .score_platform(catalog.find("Contentful").unwrap(), &selection)
        .unwrap();

    let name = saved[0].apply(&mut catalog, &ontology).unwrap();
    assert_eq!(name, "Contentful");
    let after = scorer
        .score_platform(catalog.find("Contentful").unwrap(), &selection)
        .unwrap();

    assert_eq!(catalog.find("Contentful").unwrap().capabilities["personalization"], 3);
    assert!(after.composite > before.composite);
}

#[tokio::test]
async fn unreachable_docs_fail_before_the_model_is_asked() {
    let mut docs = mockito::Server::new_async().await;
    let _down = docs
        .mock("GET", mockito::Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let mut llm = mockito::Server::new_async().await;
    let chat = llm.mock("POST", "/api/chat").expect(0).create_async().await;

    let agent = agent(llm.url(), vendor_config(&docs.url()));
    let err = agent.fetch("Contentful").await.unwrap_err();
    assert!(matches!(err, EvalError::RemoteService { .. }));
    chat.assert_async().await;
}
