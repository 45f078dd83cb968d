//! cms-eval: score, evaluate and report on CMS platforms

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cms_evaluator::config::{AppConfig, LlmConfig};
use cms_evaluator::llm::{build_provider, ProviderKind};
use cms_evaluator::metrics::METRICS;
use cms_evaluator::{
    ArchitectureCatalog, Catalog, CapabilityScorer, Ontology, OutcomeWeights, PlatformEvaluator,
    ReportEntry, ReportFormat, ReportGenerator, Selection, VendorAgent, VendorData,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cms-eval")]
#[command(about = "CMS platform evaluation against a capability ontology")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "CMS_EVAL_CONFIG")]
    config: Option<PathBuf>,

    /// Ontology document, overrides data.ontology_path
    #[arg(long, global = true)]
    ontology: Option<PathBuf>,

    /// Platform catalog, overrides data.catalog_path
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Architecture options, overrides data.architectures_path
    #[arg(long, global = true)]
    architectures: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Print collected metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank catalog platforms with local capability scoring
    Score {
        /// Use case key (repeatable, defaults to all)
        #[arg(short, long = "use-case")]
        use_cases: Vec<String>,

        /// Business outcome weight as key=value (repeatable)
        #[arg(short, long = "weight", value_parser = parse_weight)]
        weights: Vec<(String, f64)>,

        /// Print score cards as JSON
        #[arg(long)]
        json: bool,

        /// Saved `fetch` output whose scores replace catalog scores (repeatable)
        #[arg(long = "vendor-data")]
        vendor_data: Vec<PathBuf>,
    },

    /// Ask the configured LLM provider to assess platforms
    Evaluate {
        /// Platform name (repeatable, defaults to the whole catalog)
        #[arg(short, long = "platform")]
        platforms: Vec<String>,

        /// File with vendor material to ground the assessment
        #[arg(long)]
        context: Option<PathBuf>,

        /// Ground each assessment in freshly fetched vendor documentation
        #[arg(long, conflicts_with = "context")]
        live: bool,

        /// Provider override (openai, anthropic, ollama)
        #[arg(long)]
        provider: Option<ProviderKind>,
    },

    /// Generate an evaluation report
    Report {
        /// Use case key (repeatable, defaults to all)
        #[arg(short, long = "use-case")]
        use_cases: Vec<String>,

        /// Business outcome weight as key=value (repeatable)
        #[arg(short, long = "weight", value_parser = parse_weight)]
        weights: Vec<(String, f64)>,

        /// Platform name (repeatable, defaults to the whole catalog)
        #[arg(short, long = "platform")]
        platforms: Vec<String>,

        /// Output format: text, markdown, json, docx
        #[arg(short, long, default_value = "markdown")]
        format: ReportFormat,

        /// Output file (defaults to stdout; required for docx)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Architecture option label to recommend (repeatable)
        #[arg(short = 'a', long = "architecture")]
        recommendations: Vec<String>,

        /// Use LLM assessments instead of local scoring
        #[arg(long)]
        ai: bool,

        /// Provider override for --ai
        #[arg(long)]
        provider: Option<ProviderKind>,

        /// Report title, overrides report.title
        #[arg(long)]
        title: Option<String>,

        /// Saved `fetch` output whose scores replace catalog scores (repeatable)
        #[arg(long = "vendor-data")]
        vendor_data: Vec<PathBuf>,
    },

    /// Extract capability scores from live vendor documentation
    Fetch {
        /// Vendor key or catalog platform (repeatable, defaults to every configured source)
        #[arg(short, long = "platform")]
        platforms: Vec<String>,

        /// Write the extracted data to a JSON file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Provider override (openai, anthropic, ollama)
        #[arg(long)]
        provider: Option<ProviderKind>,
    },

    /// Show the capability ontology
    Ontology {
        /// Validate and print the content hash only
        #[arg(long)]
        check: bool,
    },

    /// Show which LLM providers are usable
    Providers,
}

fn parse_weight(s: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let weight: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("weight '{}' is not a number", value))?;
    Ok((key.trim().to_string(), weight))
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "info,cms_evaluator=debug,cms_eval=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Loaded configuration and data documents
struct Workspace {
    config: AppConfig,
    ontology: Arc<Ontology>,
    catalog: Catalog,
}

impl Workspace {
    fn load(cli: &Cli) -> Result<Self> {
        let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
        if let Some(path) = &cli.ontology {
            config.data.ontology_path = path.clone();
        }
        if let Some(path) = &cli.catalog {
            config.data.catalog_path = path.clone();
        }
        if let Some(path) = &cli.architectures {
            config.data.architectures_path = path.clone();
        }

        let ontology = Ontology::load(&config.data.ontology_path).context("Failed to load ontology")?;
        let catalog =
            Catalog::load(&config.data.catalog_path, &ontology).context("Failed to load platform catalog")?;

        Ok(Self {
            config,
            ontology: Arc::new(ontology),
            catalog,
        })
    }

    fn selection(&self, use_cases: Vec<String>, weights: Vec<(String, f64)>) -> Selection {
        let use_cases = if use_cases.is_empty() {
            self.ontology.use_case_keys().map(str::to_string).collect()
        } else {
            use_cases
        };
        let mut outcome_weights = OutcomeWeights::default();
        for (key, weight) in weights {
            outcome_weights.set(key, weight);
        }
        Selection::new(use_cases).with_weights(outcome_weights)
    }

    /// Requested platforms resolved to catalog names, or the whole catalog
    fn platform_names(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            return self.catalog.names().map(str::to_string).collect();
        }
        requested
            .iter()
            .map(|name| match self.catalog.find(name) {
                Ok(platform) => platform.name.clone(),
                // Platforms outside the catalog can still be assessed by a model
                Err(_) => name.clone(),
            })
            .collect()
    }

    fn llm_config(&self, provider: Option<ProviderKind>) -> LlmConfig {
        match provider {
            Some(kind) => self.config.llm.for_provider(kind),
            None => self.config.llm.clone(),
        }
    }

    fn evaluator(&self, provider: Option<ProviderKind>) -> Result<PlatformEvaluator> {
        let llm = self.llm_config(provider);
        let provider = build_provider(&llm).context("Failed to build LLM provider")?;
        let mut config = self.config.clone();
        config.llm = llm;
        Ok(PlatformEvaluator::from_config(&config, provider, self.ontology.clone()))
    }

    fn vendor_agent(&self, provider: Option<ProviderKind>) -> Result<VendorAgent> {
        let provider =
            build_provider(&self.llm_config(provider)).context("Failed to build LLM provider")?;
        Ok(VendorAgent::new(provider, self.ontology.clone(), self.config.vendor.clone())?)
    }

    /// Overlay scores from saved vendor data files onto the catalog
    fn apply_vendor_data(&mut self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            let all = VendorData::load_all(path)
                .with_context(|| format!("Failed to load vendor data {}", path.display()))?;
            for data in &all {
                let name = data
                    .apply(&mut self.catalog, &self.ontology)
                    .with_context(|| format!("Failed to apply vendor data for {}", data.platform))?;
                info!(
                    "Using live scores for {} (fetched {})",
                    name,
                    data.fetched_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = run(&cli).await;

    if cli.metrics {
        eprintln!("{}", METRICS.render());
    }
    result
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Score {
            use_cases,
            weights,
            json,
            vendor_data,
        } => {
            let mut ws = Workspace::load(cli)?;
            ws.apply_vendor_data(vendor_data)?;
            cmd_score(&ws, ws.selection(use_cases.clone(), weights.clone()), *json)
        }
        Commands::Evaluate {
            platforms,
            context,
            live,
            provider,
        } => {
            let ws = Workspace::load(cli)?;
            cmd_evaluate(&ws, platforms, context.as_deref(), *live, *provider).await
        }
        Commands::Report {
            use_cases,
            weights,
            platforms,
            format,
            out,
            recommendations,
            ai,
            provider,
            title,
            vendor_data,
        } => {
            let mut ws = Workspace::load(cli)?;
            ws.apply_vendor_data(vendor_data)?;
            let selection = ws.selection(use_cases.clone(), weights.clone());
            let options = ReportOptions {
                platforms,
                format: *format,
                out: out.as_deref(),
                recommendations,
                ai: *ai,
                provider: *provider,
                title: title.as_deref(),
            };
            cmd_report(&ws, &selection, options).await
        }
        Commands::Fetch {
            platforms,
            out,
            provider,
        } => {
            let ws = Workspace::load(cli)?;
            cmd_fetch(&ws, platforms, out.as_deref(), *provider).await
        }
        Commands::Ontology { check } => {
            let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
            if let Some(path) = &cli.ontology {
                config.data.ontology_path = path.clone();
            }
            let ontology = Ontology::load(&config.data.ontology_path).context("Failed to load ontology")?;
            cmd_ontology(&ontology, *check);
            Ok(())
        }
        Commands::Providers => {
            let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
            cmd_providers(&config).await
        }
    }
}

fn cmd_score(ws: &Workspace, selection: Selection, json: bool) -> Result<()> {
    let scorer = CapabilityScorer::new(&ws.ontology);
    let cards = scorer.rank(&ws.catalog, &selection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    println!(
        "{:<4} {:<28} {:>9} {:>9} {:>9}  {}",
        "#", "Platform", "Composite", "Use-case", "Business", "Best use case"
    );
    for (i, card) in cards.iter().enumerate() {
        let best = card
            .best_use_case()
            .and_then(|(key, _)| ws.ontology.use_case(key).ok())
            .map(|u| u.label.as_str())
            .unwrap_or("-");
        println!(
            "{:<4} {:<28} {:>9.2} {:>9.2} {:>9.2}  {}",
            i + 1,
            card.platform,
            card.composite,
            card.use_case_fit,
            card.business_fit,
            best
        );
    }
    if let Some(card) = cards.first() {
        let weights: Vec<String> = card
            .outcome_weights
            .iter()
            .map(|(k, w)| format!("{}={:.2}", k, w))
            .collect();
        println!("\nOutcome weights: {}", weights.join(", "));
    }
    Ok(())
}

async fn cmd_evaluate(
    ws: &Workspace,
    platforms: &[String],
    context: Option<&Path>,
    live: bool,
    provider: Option<ProviderKind>,
) -> Result<()> {
    let vendor_context = match context {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?,
        ),
        None => None,
    };

    let evaluator = ws.evaluator(provider)?;
    let names = ws.platform_names(platforms);
    info!("Evaluating {} platform(s) with {}", names.len(), evaluator.provider().name());

    let results = if live {
        let agent = ws.vendor_agent(provider)?;
        let mut results = Vec::with_capacity(names.len());
        for name in &names {
            let result = match agent.collect(name).await {
                Ok(docs) => {
                    let context = agent.context_text(&docs);
                    evaluator.evaluate(name, Some(context.as_str())).await
                }
                Err(e) => Err(e),
            };
            results.push((name.clone(), result));
        }
        results
    } else {
        evaluator.evaluate_many(&names, vendor_context.as_deref()).await
    };

    let mut assessments = Vec::new();
    let mut failures = 0;
    for (name, result) in results {
        match result {
            Ok(assessment) => assessments.push(assessment),
            Err(e) => {
                failures += 1;
                warn!("{}: {}", name, e);
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&assessments)?);
    if failures > 0 {
        bail!("{} of {} evaluation(s) failed", failures, names.len());
    }
    Ok(())
}

async fn cmd_fetch(
    ws: &Workspace,
    platforms: &[String],
    out: Option<&Path>,
    provider: Option<ProviderKind>,
) -> Result<()> {
    let agent = ws.vendor_agent(provider)?;
    let names: Vec<String> = if platforms.is_empty() {
        agent.config().sources.keys().cloned().collect()
    } else {
        platforms.to_vec()
    };
    if names.is_empty() {
        bail!("No vendor sources configured under [vendor.sources]");
    }

    let mut fetched = Vec::new();
    let mut failures = 0;
    for (name, result) in agent.fetch_many(&names).await {
        match result {
            Ok(data) => {
                if ws.catalog.find(&data.platform).is_err() {
                    warn!("{} is not in the catalog; its scores cannot be overlaid", data.platform);
                }
                fetched.push(data);
            }
            Err(e) => {
                failures += 1;
                warn!("{}: {}", name, e);
            }
        }
    }

    let json = serde_json::to_string_pretty(&fetched)?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write vendor data to {}", path.display()))?;
            info!("Wrote vendor data for {} platform(s) to {}", fetched.len(), path.display());
        }
        None => println!("{}", json),
    }
    if failures > 0 {
        bail!("{} of {} vendor fetch(es) failed", failures, names.len());
    }
    Ok(())
}

struct ReportOptions<'a> {
    platforms: &'a [String],
    format: ReportFormat,
    out: Option<&'a Path>,
    recommendations: &'a [String],
    ai: bool,
    provider: Option<ProviderKind>,
    title: Option<&'a str>,
}

async fn cmd_report(ws: &Workspace, selection: &Selection, options: ReportOptions<'_>) -> Result<()> {
    if options.format.is_binary() && options.out.is_none() {
        bail!("--out is required for {} reports", options.format);
    }

    let scorer = CapabilityScorer::new(&ws.ontology);
    let entries = if options.ai {
        ai_entries(ws, &scorer, selection, &options).await?
    } else {
        local_entries(ws, &scorer, selection, options.platforms)?
    };

    let architecture_catalog = if options.recommendations.is_empty() {
        None
    } else {
        Some(
            ArchitectureCatalog::load(&ws.config.data.architectures_path)
                .context("Failed to load architecture options")?,
        )
    };

    let title = options.title.unwrap_or(&ws.config.report.title);
    let mut generator = ReportGenerator::new(title, &ws.ontology);
    if let Some(catalog) = &architecture_catalog {
        generator = generator.with_architectures(catalog);
    }
    let bytes = generator.generate(entries, &selection.use_cases, options.recommendations, options.format)?;

    match options.out {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Wrote {} report to {}", options.format, path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&bytes)?;
            println!();
        }
    }
    Ok(())
}

fn local_entries(
    ws: &Workspace,
    scorer: &CapabilityScorer<'_>,
    selection: &Selection,
    platforms: &[String],
) -> Result<Vec<ReportEntry>> {
    let ranked = scorer.rank(&ws.catalog, selection)?;
    let wanted: Vec<&str> = platforms
        .iter()
        .map(|name| ws.catalog.find(name).map(|p| p.name.as_str()))
        .collect::<cms_evaluator::Result<_>>()?;

    ranked
        .into_iter()
        .filter(|card| wanted.is_empty() || wanted.contains(&card.platform.as_str()))
        .map(|card| -> Result<ReportEntry> {
            let platform = ws.catalog.get(&card.platform)?;
            let assessment = scorer.assess(platform, selection)?;
            Ok(ReportEntry::new(assessment)
                .with_platform(platform.clone())
                .with_score_card(card))
        })
        .collect()
}

async fn ai_entries(
    ws: &Workspace,
    scorer: &CapabilityScorer<'_>,
    selection: &Selection,
    options: &ReportOptions<'_>,
) -> Result<Vec<ReportEntry>> {
    let evaluator = ws.evaluator(options.provider)?;
    let names = ws.platform_names(options.platforms);

    let mut entries = Vec::new();
    for (name, result) in evaluator.evaluate_many(&names, None).await {
        let assessment = match result {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                continue;
            }
        };
        let card = scorer.score_assessment(&assessment, selection)?;
        let mut entry = ReportEntry::new(assessment).with_score_card(card);
        if let Ok(platform) = ws.catalog.get(&name) {
            entry = entry.with_platform(platform.clone());
        }
        entries.push(entry);
    }

    if entries.is_empty() {
        bail!("No platform could be evaluated with {}", evaluator.provider().name());
    }
    entries.sort_by(|a, b| {
        b.assessment
            .overall_fit_score
            .total_cmp(&a.assessment.overall_fit_score)
    });
    Ok(entries)
}

fn cmd_ontology(ontology: &Ontology, check: bool) {
    if check {
        println!(
            "ontology OK (version {}): {} capabilities, {} use cases, {} outcomes",
            ontology.version().unwrap_or("unversioned"),
            ontology.capabilities().len(),
            ontology.use_cases().len(),
            ontology.business_outcomes().len()
        );
        println!("sha256 {}", ontology.content_hash());
        return;
    }

    println!("Capabilities:");
    for (key, cap) in ontology.capabilities() {
        println!("  {:<18} {:<32} [{}] {}", key, cap.label, cap.importance, cap.facets.join(", "));
    }
    println!("\nUse cases:");
    for (key, use_case) in ontology.use_cases() {
        let reqs: Vec<String> = use_case
            .required_capabilities
            .iter()
            .map(|(cap, level)| format!("{}>={}", cap, level))
            .collect();
        println!("  {:<18} {:<32} {}", key, use_case.label, reqs.join(", "));
    }
    println!("\nBusiness outcomes:");
    for (key, outcome) in ontology.business_outcomes() {
        println!("  {:<18} {:<32} {:.2}", key, outcome.label, outcome.weight);
    }
}

async fn cmd_providers(config: &AppConfig) -> Result<()> {
    for kind in ProviderKind::ALL {
        let llm = config.llm.for_provider(kind);
        let provider = build_provider(&llm)?;
        let status = if provider.is_available().await {
            "available".to_string()
        } else {
            match llm.api_key_env() {
                Some(var) => format!("unavailable (set {})", var),
                None => format!("unavailable (no server at {})", llm.api_url()),
            }
        };
        let marker = if kind == config.llm.provider { "*" } else { " " };
        println!("{} {:<10} {:<28} {}", marker, kind, provider.model(), status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("conversion=0.4").unwrap(), ("conversion".to_string(), 0.4));
        assert!(parse_weight("conversion").is_err());
        assert!(parse_weight("conversion=high").is_err());
    }

    #[test]
    fn test_cli_parses_report_flags() {
        let cli = Cli::try_parse_from([
            "cms-eval",
            "report",
            "--use-case",
            "marketing_site",
            "--weight",
            "conversion=0.5",
            "--format",
            "docx",
            "--out",
            "report.docx",
            "--architecture",
            "Option B",
        ])
        .unwrap();
        match cli.command {
            Commands::Report {
                use_cases,
                weights,
                format,
                recommendations,
                ..
            } => {
                assert_eq!(use_cases, ["marketing_site"]);
                assert_eq!(weights[0].1, 0.5);
                assert_eq!(format, ReportFormat::Docx);
                assert_eq!(recommendations, ["Option B"]);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_architecture_labels_and_file_coexist() {
        let cli = Cli::try_parse_from([
            "cms-eval",
            "report",
            "--architectures",
            "data/architectures.json",
            "-a",
            "Option A",
            "--architecture",
            "Option C",
        ])
        .unwrap();
        assert_eq!(cli.architectures, Some(PathBuf::from("data/architectures.json")));
        match cli.command {
            Commands::Report { recommendations, .. } => {
                assert_eq!(recommendations, ["Option A", "Option C"]);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_cli_parses_fetch_and_vendor_data() {
        let cli = Cli::try_parse_from(["cms-eval", "fetch", "-p", "sanity", "-o", "live.json"]).unwrap();
        match cli.command {
            Commands::Fetch { platforms, out, .. } => {
                assert_eq!(platforms, ["sanity"]);
                assert_eq!(out, Some(PathBuf::from("live.json")));
            }
            _ => panic!("expected fetch command"),
        }

        let cli = Cli::try_parse_from(["cms-eval", "score", "--vendor-data", "live.json"]).unwrap();
        match cli.command {
            Commands::Score { vendor_data, .. } => {
                assert_eq!(vendor_data, [PathBuf::from("live.json")]);
            }
            _ => panic!("expected score command"),
        }
    }

    #[test]
    fn test_live_conflicts_with_context_file() {
        let result = Cli::try_parse_from(["cms-eval", "evaluate", "--live", "--context", "notes.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
