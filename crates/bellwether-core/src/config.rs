use crate::errors::ConfigError;
use crate::model::{BackendConfig, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const SUPPORTED_PLAN_VERSION: u32 = 1;

/// A benchmark plan: which backends to probe, with which scenarios, under
/// which limits. Credentials arrive as plain fields from the caller; the
/// core never reads the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchPlan {
    pub version: u32,
    #[serde(default)]
    pub settings: PlanSettings,
    pub backends: Vec<BackendConfig>,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanSettings {
    pub parallel: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub deadline_seconds: Option<u64>,
    pub streaming: Option<bool>,
}

impl PlanSettings {
    pub fn to_harness_settings(&self) -> crate::engine::harness::HarnessSettings {
        let defaults = crate::engine::harness::HarnessSettings::default();
        crate::engine::harness::HarnessSettings {
            parallel: self.parallel.unwrap_or(defaults.parallel).max(1),
            timeout: self
                .timeout_seconds
                .map(std::time::Duration::from_secs)
                .unwrap_or(defaults.timeout),
            deadline: self.deadline_seconds.map(std::time::Duration::from_secs),
            streaming: self.streaming.unwrap_or(false),
        }
    }
}

pub fn load_plan(path: &Path) -> Result<BenchPlan, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read plan {}: {}", path.display(), e)))?;
    parse_plan(&raw)
}

pub fn parse_plan(raw: &str) -> Result<BenchPlan, ConfigError> {
    let plan: BenchPlan =
        serde_yaml::from_str(raw).map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    validate_plan(&plan)?;
    Ok(plan)
}

fn validate_plan(plan: &BenchPlan) -> Result<(), ConfigError> {
    if plan.version != SUPPORTED_PLAN_VERSION {
        return Err(ConfigError(format!(
            "unsupported plan version {} (supported: {})",
            plan.version, SUPPORTED_PLAN_VERSION
        )));
    }
    if plan.backends.is_empty() {
        return Err(ConfigError("plan has no backends".into()));
    }
    if plan.scenarios.is_empty() {
        return Err(ConfigError("plan has no scenarios".into()));
    }
    let mut seen = HashSet::new();
    for backend in &plan.backends {
        if !seen.insert(backend.model_name.as_str()) {
            return Err(ConfigError(format!(
                "duplicate model_name '{}' in plan",
                backend.model_name
            )));
        }
    }
    for scenario in &plan.scenarios {
        if let crate::model::Validation::RegexMatch { pattern } = &scenario.validation {
            regex::Regex::new(pattern).map_err(|e| {
                ConfigError(format!(
                    "invalid regex pattern in scenario '{}': {}",
                    scenario.name, e
                ))
            })?;
        }
    }
    Ok(())
}

/// The stock scenario set used by the smoke plan: one prompt per complexity
/// class, each with a sections-present validation rule.
pub fn sample_plan_yaml() -> &'static str {
    r#"version: 1
settings:
  parallel: 10
  timeout_seconds: 30
backends:
  - model_name: gpt-3.5-turbo
    kind: openai
  - model_name: deepseek-ai/deepseek-r1
    kind: openai
    base_url: https://integrate.api.nvidia.com/v1
scenarios:
  - name: Technical Documentation
    prompt: >-
      Generate a comprehensive technical documentation for a RESTful API
      with authentication and rate limiting.
    complexity: medium
    validation:
      type: must_contain
      must_contain: [Overview, Authentication, Endpoints, Error Handling]
  - name: Code Generation
    prompt: >-
      Create a Python class for managing a simple task management system
      with CRUD operations.
    complexity: high
    validation:
      type: must_contain
      must_contain: [create_task, update_task, delete_task, list_tasks]
  - name: Complex Reasoning
    prompt: >-
      Analyze the potential economic and social impacts of widespread AI
      adoption in the next decade.
    complexity: extreme
    validation:
      type: non_empty
  - name: Multilingual Translation
    prompt: >-
      Translate a complex technical paragraph about quantum computing from
      English to Mandarin, maintaining technical accuracy.
    complexity: extreme
    validation:
      type: non_empty
"#
}
