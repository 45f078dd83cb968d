//! CMS platform evaluation
//!
//! Scores CMS vendor platforms against a capability ontology, optionally
//! asks an LLM for structured assessments or for scores read from live
//! vendor documentation, and renders comparison reports.
//!
//! ```no_run
//! use cms_evaluator::{Catalog, CapabilityScorer, Ontology, Selection};
//! use std::path::Path;
//!
//! # fn main() -> cms_evaluator::Result<()> {
//! let ontology = Ontology::load(Path::new("data/ontology.json"))?;
//! let catalog = Catalog::load(Path::new("data/platforms.json"), &ontology)?;
//! let scorer = CapabilityScorer::new(&ontology);
//! let ranked = scorer.rank(&catalog, &Selection::new(vec!["marketing_site".into()]))?;
//! println!("{}: {:.2}", ranked[0].platform, ranked[0].composite);
//! # Ok(())
//! # }
//! ```

pub mod assessment;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod llm;
pub mod metrics;
pub mod ontology;
pub mod report;
pub mod scoring;
pub mod vendor;

pub use assessment::{AssessmentSource, PlatformAssessment};
pub use catalog::{ArchitectureCatalog, ArchitectureOption, Catalog, Platform};
pub use config::AppConfig;
pub use error::{EvalError, Result};
pub use evaluator::{AssessmentCache, PlatformEvaluator, RetryPolicy};
pub use llm::{build_provider, LlmProvider, ProviderKind};
pub use ontology::Ontology;
pub use report::{Report, ReportEntry, ReportFormat, ReportGenerator};
pub use scoring::{CapabilityScorer, OutcomeWeights, ScoreCard, Selection};
pub use vendor::{VendorAgent, VendorData};
