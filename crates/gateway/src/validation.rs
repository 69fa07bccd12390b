//! Request validation: content-security rules and schema validation.
//!
//! Two independent gates, both of which must pass:
//!
//! 1. **Content rules** — pattern heuristics (SQL injection, script/XSS,
//!    suspicious identifiers) run against the serialized request body. Any
//!    match on a rule whose action is `BLOCK` rejects the request. Rules
//!    are data, not code: the set is deserializable from configuration so
//!    new rules ship without touching gateway logic.
//! 2. **Schema validation** — structural checks (required fields, ranges,
//!    enums) against a typed payload per [`SchemaKind`], accumulating
//!    per-field errors.

use std::{fmt, sync::LazyLock, time::Duration};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    error::AuthError,
    violation::Severity,
};

/// Largest accepted token transaction amount.
pub const MAX_TRANSACTION_AMOUNT: f64 = 1000.0;

/// Longest accepted generation prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Largest accepted generation token budget.
pub const MAX_GENERATION_TOKENS: u32 = 2048;

static WALLET_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("wallet address pattern is valid")
});

// ---------------------------------------------------------------------------
// Content-security rules
// ---------------------------------------------------------------------------

/// What to do when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    /// Reject the request.
    Block,
    /// Record the match, let the request through.
    Monitor,
    /// Rate-limit-style rule; enforced by the limiter, not the content gate.
    RateLimit,
}

/// One compiled content-security rule.
#[derive(Debug, Clone)]
pub struct SecurityRule {
    /// Rule name, e.g. `SQL_INJECTION`.
    pub kind: String,
    /// The compiled pattern.
    pub pattern: Regex,
    /// What a match means.
    pub action: RuleAction,
    /// How severe a match is.
    pub severity: Severity,
    /// Match-count threshold for rate-limit-style rules.
    pub threshold: Option<u32>,
    /// Window for rate-limit-style rules.
    pub duration: Option<Duration>,
}

/// Serialized form of a rule, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule name.
    pub kind: String,
    /// Uncompiled pattern source.
    pub pattern: String,
    /// What a match means.
    pub action: RuleAction,
    /// How severe a match is.
    pub severity: Severity,
    /// Match-count threshold for rate-limit-style rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    /// Window in seconds for rate-limit-style rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

/// Errors raised while loading a rule table.
///
/// Patterns are compiled at load time so a bad rule fails deployment, not
/// the first request that happens to exercise it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuleError {
    /// The rule table is not valid JSON.
    #[error("invalid rule table: {0}")]
    Parse(#[source] serde_json::Error),

    /// A rule's pattern does not compile.
    #[error("invalid pattern for rule {kind}: {source}")]
    InvalidPattern {
        /// The rule whose pattern failed.
        kind: String,
        /// The compilation failure.
        #[source]
        source: regex::Error,
    },
}

/// A matched blocking rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentViolation {
    /// The rule that matched.
    pub rule: String,
    /// The rule's severity.
    pub severity: Severity,
}

impl fmt::Display for ContentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content matched {} rule ({})", self.rule, self.severity)
    }
}

fn default_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec {
            kind: "SQL_INJECTION".into(),
            pattern: r"(?i)'.*--|\b(?:ALTER|CREATE|DELETE|DROP|EXEC(?:UTE)?|INSERT(?: +INTO)?|MERGE|SELECT|UPDATE|UNION(?: +ALL)?)\b".into(),
            action: RuleAction::Block,
            severity: Severity::Critical,
            threshold: None,
            duration_secs: None,
        },
        RuleSpec {
            kind: "XSS".into(),
            pattern: r#"(?i)<script\b[^>]*>[\s\S]*?</script>|javascript:|data:|vbscript:|on\w+\s*=|style\s*=\s*".*expression\s*\(|<\w+\s+[^>]*\s+on\w+\s*=|document\.|window\.|eval\(|setTimeout\(|setInterval\(|new\s+Function\(|alert\(|confirm\(|prompt\(|fetch\(|XMLHttpRequest\("#.into(),
            action: RuleAction::Block,
            severity: Severity::High,
            threshold: None,
            duration_secs: None,
        },
        RuleSpec {
            kind: "SUSPICIOUS_WALLET".into(),
            pattern: r"(?i)^(?:0x0000|0x1234|1111)".into(),
            action: RuleAction::Block,
            severity: Severity::High,
            threshold: None,
            duration_secs: None,
        },
        RuleSpec {
            kind: "RAPID_REQUESTS".into(),
            pattern: ".*".into(),
            action: RuleAction::RateLimit,
            severity: Severity::Medium,
            threshold: Some(100),
            duration_secs: Some(60),
        },
    ]
}

/// A compiled, ordered set of content-security rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<SecurityRule>,
}

impl RuleSet {
    /// The built-in rule table.
    ///
    /// # Panics
    ///
    /// Panics if the built-in table fails to compile, which would be a
    /// defect in the table itself.
    #[must_use]
    pub fn defaults() -> Self {
        Self::from_specs(default_specs()).expect("built-in rule table is valid")
    }

    /// Compiles a rule table from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidPattern`] for the first rule whose
    /// pattern does not compile.
    pub fn from_specs(specs: Vec<RuleSpec>) -> Result<Self, RuleError> {
        let rules = specs
            .into_iter()
            .map(|spec| {
                let pattern = Regex::new(&spec.pattern)
                    .map_err(|source| RuleError::InvalidPattern { kind: spec.kind.clone(), source })?;
                Ok(SecurityRule {
                    kind: spec.kind,
                    pattern,
                    action: spec.action,
                    severity: spec.severity,
                    threshold: spec.threshold,
                    duration: spec.duration_secs.map(Duration::from_secs),
                })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;
        Ok(Self { rules })
    }

    /// Loads and compiles a rule table from JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Parse`] for malformed JSON and
    /// [`RuleError::InvalidPattern`] for uncompilable patterns.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json).map_err(RuleError::Parse)?;
        Self::from_specs(specs)
    }

    /// The compiled rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[SecurityRule] {
        &self.rules
    }

    /// Runs the rule battery over raw request content.
    ///
    /// The first matching `BLOCK` rule rejects; `MONITOR` matches are
    /// logged and ignored; rate-limit-style rules are the limiter's
    /// concern, not the content gate's.
    ///
    /// # Errors
    ///
    /// Returns the matched blocking rule as a [`ContentViolation`].
    pub fn validate_content(&self, raw: &str) -> Result<(), ContentViolation> {
        for rule in &self.rules {
            match rule.action {
                RuleAction::Block => {
                    if rule.pattern.is_match(raw) {
                        return Err(ContentViolation {
                            rule: rule.kind.clone(),
                            severity: rule.severity,
                        });
                    }
                },
                RuleAction::Monitor => {
                    if rule.pattern.is_match(raw) {
                        tracing::info!(rule = %rule.kind, "content rule matched (monitor)");
                    }
                },
                RuleAction::RateLimit => {},
            }
        }
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::defaults()
    }
}

// ---------------------------------------------------------------------------
// Schema validation
// ---------------------------------------------------------------------------

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending field, in wire naming.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Named request schemas the gateway validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// Wallet connection request body.
    WalletConnection,
    /// Image generation request body.
    Generation,
    /// Token transaction request body.
    TokenTransaction,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalletConnection => write!(f, "WalletConnectionRequest"),
            Self::Generation => write!(f, "GenerationRequest"),
            Self::TokenTransaction => write!(f, "TokenTransaction"),
        }
    }
}

/// Wallet connection request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConnectionRequest {
    /// Base58 wallet public key.
    pub wallet_address: String,
    /// Base64 detached signature.
    pub signature: String,
    /// The signed message.
    pub message: String,
}

/// Generation safety level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyLevel {
    /// Minimal filtering.
    Low,
    /// Default filtering.
    Medium,
    /// Strictest filtering.
    High,
}

/// Generation model settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Model identifier.
    pub model: String,
    /// Safety level.
    pub safety_level: SafetyLevel,
    /// Token budget.
    pub max_tokens: u32,
}

/// Generation request client metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    /// Calling client identifier.
    pub client_id: String,
    /// Session the request runs under.
    pub session_id: String,
}

/// Image generation request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// The generation prompt.
    pub prompt: String,
    /// Model settings.
    pub settings: GenerationSettings,
    /// Client metadata.
    pub metadata: GenerationMetadata,
}

/// Token transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Mint new tokens.
    Mint,
    /// Transfer existing tokens.
    Transfer,
    /// Burn tokens.
    Burn,
}

/// Optional transaction annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    /// Free-form reason.
    pub reason: String,
    /// External reference, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

/// Token transaction request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransactionRequest {
    /// Transaction amount.
    pub amount: f64,
    /// Base58 recipient wallet.
    pub recipient_address: String,
    /// What kind of transaction this is.
    pub transaction_type: TransactionType,
    /// Optional annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TransactionMetadata>,
}

/// A payload that passed schema validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedRequest {
    /// A validated wallet connection body.
    WalletConnection(WalletConnectionRequest),
    /// A validated generation body.
    Generation(GenerationRequest),
    /// A validated token transaction body.
    TokenTransaction(TokenTransactionRequest),
}

fn decode<T: serde::de::DeserializeOwned>(
    payload: &serde_json::Value,
) -> Result<T, Vec<FieldError>> {
    serde_json::from_value(payload.clone())
        .map_err(|e| vec![FieldError::new("body", e.to_string())])
}

fn check_wallet_field(field: &str, value: &str, errors: &mut Vec<FieldError>) {
    if !WALLET_ADDRESS_RE.is_match(value) {
        errors.push(FieldError::new(field, "must be a base58 address of 32 to 44 characters"));
    }
}

/// Validates a payload against a named schema.
///
/// Structural failures (missing fields, wrong types, out-of-enum values)
/// surface as a single `body` error from deserialization; semantic checks
/// then accumulate, so a payload with several bad fields reports them all
/// in one pass.
///
/// # Errors
///
/// Returns the accumulated [`FieldError`]s when any check fails.
pub fn validate_schema(
    kind: SchemaKind,
    payload: &serde_json::Value,
) -> Result<ValidatedRequest, Vec<FieldError>> {
    match kind {
        SchemaKind::WalletConnection => {
            let request: WalletConnectionRequest = decode(payload)?;
            let mut errors = Vec::new();

            check_wallet_field("walletAddress", &request.wallet_address, &mut errors);
            if request.signature.is_empty() {
                errors.push(FieldError::new("signature", "must not be empty"));
            }
            if request.message.is_empty() {
                errors.push(FieldError::new("message", "must not be empty"));
            }

            if errors.is_empty() {
                Ok(ValidatedRequest::WalletConnection(request))
            } else {
                Err(errors)
            }
        },
        SchemaKind::Generation => {
            let request: GenerationRequest = decode(payload)?;
            let mut errors = Vec::new();

            if request.prompt.is_empty() {
                errors.push(FieldError::new("prompt", "must not be empty"));
            } else if request.prompt.chars().count() > MAX_PROMPT_CHARS {
                errors.push(FieldError::new(
                    "prompt",
                    format!("must be at most {MAX_PROMPT_CHARS} characters"),
                ));
            }
            if request.settings.model.is_empty() {
                errors.push(FieldError::new("settings.model", "must not be empty"));
            }
            if request.settings.max_tokens == 0 {
                errors.push(FieldError::new("settings.maxTokens", "must be at least 1"));
            } else if request.settings.max_tokens > MAX_GENERATION_TOKENS {
                errors.push(FieldError::new(
                    "settings.maxTokens",
                    format!("must be at most {MAX_GENERATION_TOKENS}"),
                ));
            }

            if errors.is_empty() {
                Ok(ValidatedRequest::Generation(request))
            } else {
                Err(errors)
            }
        },
        SchemaKind::TokenTransaction => {
            let request: TokenTransactionRequest = decode(payload)?;
            let mut errors = Vec::new();

            if request.amount <= 0.0 {
                errors.push(FieldError::new("amount", "must be positive"));
            } else if request.amount > MAX_TRANSACTION_AMOUNT {
                errors.push(FieldError::new(
                    "amount",
                    format!("must be at most {MAX_TRANSACTION_AMOUNT}"),
                ));
            }
            check_wallet_field("recipientAddress", &request.recipient_address, &mut errors);

            if errors.is_empty() {
                Ok(ValidatedRequest::TokenTransaction(request))
            } else {
                Err(errors)
            }
        },
    }
}

/// The combined request gate: content rules plus schema validation.
#[derive(Debug, Clone, Default)]
pub struct RequestValidator {
    rules: RuleSet,
}

impl RequestValidator {
    /// Creates a validator over the given rule set.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Creates a validator over the built-in rule table.
    #[must_use]
    pub fn with_default_rules() -> Self {
        Self::new(RuleSet::defaults())
    }

    /// The active rule set.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Validates a request body: content rules first, then the schema.
    ///
    /// # Errors
    ///
    /// - [`AuthError::BlockedContent`] when a blocking rule matches the serialized body
    /// - [`AuthError::Validation`] when schema validation fails
    pub fn validate(
        &self,
        kind: SchemaKind,
        payload: &serde_json::Value,
    ) -> Result<ValidatedRequest, AuthError> {
        let raw = payload.to_string();
        self.rules
            .validate_content(&raw)
            .map_err(|violation| AuthError::blocked_content(violation.rule))?;

        validate_schema(kind, payload).map_err(AuthError::validation)
    }
}
