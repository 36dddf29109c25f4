//! Built-in secret detection rules.
//!
//! Pure data: well-known token formats matched by regex, plus three
//! entropy rules for generic high-randomness values. Each entry carries a
//! CWE identifier in metadata and remediation text for reporters.

use std::collections::HashMap;

use crate::findings::{Confidence, Severity};

use super::{Rule, RuleSet};

/// Compact table row; converted to a full [`Rule`] by [`builtin_rules`].
struct SecretRuleDef {
    id: &'static str,
    severity: Severity,
    confidence: Confidence,
    pattern: &'static str,
    description: &'static str,
    keywords: &'static [&'static str],
    remediation: &'static str,
}

const CWE_HARDCODED_CREDENTIALS: &str = "CWE-798";

#[rustfmt::skip]
const SECRET_RULES: &[SecretRuleDef] = &[
    // Cloud providers
    SecretRuleDef {
        id: "SEC-001", severity: Severity::High, confidence: Confidence::High,
        pattern: r"\b((?:A3T[A-Z0-9]|AKIA|ASIA|ABIA|ACCA)[A-Z2-7]{16})\b",
        description: "AWS Access Key ID detected",
        keywords: &["akia", "asia", "abia", "acca", "a3t"],
        remediation: "Use environment variables or IAM roles instead of hard-coded keys. Rotate the exposed key immediately.",
    },
    SecretRuleDef {
        id: "SEC-002", severity: Severity::Critical, confidence: Confidence::High,
        pattern: r#"(?i)aws_secret_access_key\s*[=:]\s*[A-Za-z0-9/+=]{40}"#,
        description: "AWS Secret Access Key detected",
        keywords: &["aws_secret"],
        remediation: "Move the key to a secrets manager and rotate it immediately.",
    },
    SecretRuleDef {
        id: "SEC-003", severity: Severity::High, confidence: Confidence::High,
        pattern: r"AIza[0-9A-Za-z\-_]{35}",
        description: "GCP API Key detected",
        keywords: &["aiza"],
        remediation: "Restrict the API key in the GCP console and prefer application default credentials.",
    },
    SecretRuleDef {
        id: "SEC-004", severity: Severity::Critical, confidence: Confidence::High,
        pattern: r#"(?i)"type"\s*:\s*"service_account""#,
        description: "GCP Service Account JSON detected",
        keywords: &["service_account"],
        remediation: "Use workload identity federation instead of service account key files; delete and rotate the key.",
    },
    SecretRuleDef {
        id: "SEC-005", severity: Severity::High, confidence: Confidence::Medium,
        pattern: r#"(?i)(client_secret|client-secret)\s*[=:]\s*['"][0-9a-zA-Z~._\-]{34,}['"]"#,
        description: "Azure AD Client Secret detected",
        keywords: &["client_secret", "client-secret"],
        remediation: "Use managed identities or certificate-based authentication; rotate the secret in Azure AD.",
    },
    SecretRuleDef {
        id: "SEC-006", severity: Severity::High, confidence: Confidence::High,
        pattern: r"dop_v1_[a-f0-9]{64}",
        description: "DigitalOcean Personal Access Token detected",
        keywords: &["dop_v1_"],
        remediation: "Revoke the token in the DigitalOcean control panel and use environment variables.",
    },

    // Source control
    SecretRuleDef {
        id: "SEC-010", severity: Severity::High, confidence: Confidence::High,
        pattern: r"gh[pso]_[A-Za-z0-9_]{36,}",
        description: "GitHub Personal Access Token detected",
        keywords: &["ghp_", "ghs_", "gho_"],
        remediation: "Revoke the token in GitHub settings and use CI-provided tokens instead.",
    },
    SecretRuleDef {
        id: "SEC-011", severity: Severity::High, confidence: Confidence::High,
        pattern: r"github_pat_[A-Za-z0-9_]{82}",
        description: "GitHub Fine-Grained Personal Access Token detected",
        keywords: &["github_pat_"],
        remediation: "Revoke the token in GitHub settings and generate a new one.",
    },
    SecretRuleDef {
        id: "SEC-012", severity: Severity::High, confidence: Confidence::High,
        pattern: r"glpat-[A-Za-z0-9\-_]{20,}",
        description: "GitLab Personal Access Token detected",
        keywords: &["glpat-"],
        remediation: "Revoke the token in GitLab user settings and use CI/CD variables.",
    },

    // Communication platforms
    SecretRuleDef {
        id: "SEC-020", severity: Severity::High, confidence: Confidence::High,
        pattern: r"xoxb-[0-9]{10,13}-[0-9]{10,13}-[a-zA-Z0-9]{24,}",
        description: "Slack Bot Token detected",
        keywords: &["xoxb"],
        remediation: "Regenerate the bot token in Slack app settings and store it in environment variables.",
    },
    SecretRuleDef {
        id: "SEC-021", severity: Severity::High, confidence: Confidence::High,
        pattern: r"https://hooks\.slack\.com/services/T[A-Z0-9]{8,}/B[A-Z0-9]{8,}/[A-Za-z0-9]{24,}",
        description: "Slack Webhook URL detected",
        keywords: &["hooks.slack.com"],
        remediation: "Regenerate the webhook URL in Slack app settings.",
    },
    SecretRuleDef {
        id: "SEC-022", severity: Severity::High, confidence: Confidence::High,
        pattern: r"https://discord(?:app)?\.com/api/webhooks/[0-9]+/[A-Za-z0-9_\-]+",
        description: "Discord Webhook URL detected",
        keywords: &["discord.com/api/webhooks", "discordapp.com/api/webhooks"],
        remediation: "Delete and recreate the webhook in Discord channel settings.",
    },

    // Payment processors
    SecretRuleDef {
        id: "SEC-030", severity: Severity::Critical, confidence: Confidence::High,
        pattern: r"(?:sk_(?:test|live)|rk_(?:test|live))_[A-Za-z0-9]{20,}",
        description: "Stripe API Key detected",
        keywords: &["sk_test", "sk_live", "rk_test", "rk_live"],
        remediation: "Roll the API key in the Stripe dashboard and use environment variables.",
    },
    SecretRuleDef {
        id: "SEC-031", severity: Severity::High, confidence: Confidence::High,
        pattern: r"whsec_[A-Za-z0-9+/=]{32,}",
        description: "Stripe Webhook Secret detected",
        keywords: &["whsec_"],
        remediation: "Roll the webhook signing secret in the Stripe dashboard.",
    },
    SecretRuleDef {
        id: "SEC-032", severity: Severity::High, confidence: Confidence::High,
        pattern: r"shpat_[a-fA-F0-9]{32}",
        description: "Shopify Access Token detected",
        keywords: &["shpat_"],
        remediation: "Revoke the access token in Shopify admin and generate a new one.",
    },

    // AI/ML providers
    SecretRuleDef {
        id: "SEC-040", severity: Severity::High, confidence: Confidence::High,
        pattern: r"sk-proj-[A-Za-z0-9\-_]{80,}",
        description: "OpenAI Project API Key detected",
        keywords: &["sk-proj-"],
        remediation: "Revoke the key in the OpenAI dashboard and generate a new one.",
    },
    SecretRuleDef {
        id: "SEC-041", severity: Severity::High, confidence: Confidence::High,
        pattern: r"sk-ant-api[a-zA-Z0-9\-_]{80,}",
        description: "Anthropic API Key detected",
        keywords: &["sk-ant-api"],
        remediation: "Revoke the key in the provider console and generate a new one.",
    },
    SecretRuleDef {
        id: "SEC-042", severity: Severity::High, confidence: Confidence::High,
        pattern: r"hf_[A-Za-z0-9]{34,}",
        description: "HuggingFace Token detected",
        keywords: &["hf_"],
        remediation: "Revoke the token in HuggingFace account settings.",
    },
    SecretRuleDef {
        id: "SEC-043", severity: Severity::High, confidence: Confidence::High,
        pattern: r"r8_[A-Za-z0-9]{38,}",
        description: "Replicate API Token detected",
        keywords: &["r8_"],
        remediation: "Regenerate the token in Replicate account settings.",
    },

    // DevOps and package registries
    SecretRuleDef {
        id: "SEC-050", severity: Severity::High, confidence: Confidence::High,
        pattern: r"npm_[A-Za-z0-9]{36,}",
        description: "NPM Access Token detected",
        keywords: &["npm_"],
        remediation: "Revoke the token on npmjs.com and use automation tokens in CI.",
    },
    SecretRuleDef {
        id: "SEC-051", severity: Severity::High, confidence: Confidence::High,
        pattern: r"pypi-[A-Za-z0-9\-_]{16,}",
        description: "PyPI Upload Token detected",
        keywords: &["pypi-"],
        remediation: "Revoke the token on pypi.org and generate a new one.",
    },
    SecretRuleDef {
        id: "SEC-052", severity: Severity::Critical, confidence: Confidence::High,
        pattern: r"hvs\.[A-Za-z0-9]{24,}",
        description: "HashiCorp Vault Service Token detected",
        keywords: &["hvs."],
        remediation: "Revoke the token with 'vault token revoke' and issue a new one.",
    },
    SecretRuleDef {
        id: "SEC-053", severity: Severity::High, confidence: Confidence::High,
        pattern: r"dckr_pat_[A-Za-z0-9\-_]{27,}",
        description: "Docker Hub Personal Access Token detected",
        keywords: &["dckr_pat_"],
        remediation: "Revoke the token in Docker Hub security settings.",
    },

    // Generic
    SecretRuleDef {
        id: "SEC-060", severity: Severity::Critical, confidence: Confidence::High,
        pattern: r"-----BEGIN (?:RSA |EC |OPENSSH |DSA |PGP )?PRIVATE KEY(?: BLOCK)?-----",
        description: "Private key material detected",
        keywords: &["private key"],
        remediation: "Remove the key from the repository, rotate it, and load keys from secure storage.",
    },
    SecretRuleDef {
        id: "SEC-061", severity: Severity::High, confidence: Confidence::Medium,
        pattern: r#"(?i)(?:password|passwd|pwd)\s*[=:]\s*['"][^'"]{8,}['"]"#,
        description: "Hard-coded password assignment detected",
        keywords: &["password", "passwd", "pwd"],
        remediation: "Read passwords from environment variables or a secrets manager.",
    },
];

/// Restricts entropy rules to source-like files; lockfiles, checksums, and
/// generated files produce large numbers of false positives.
const ENTROPY_SOURCE_FILE_PATTERNS: &[&str] = &[
    "*.go", "*.py", "*.js", "*.ts", "*.jsx", "*.tsx", "*.java", "*.kt", "*.rb", "*.php", "*.rs",
    "*.c", "*.cpp", "*.h", "*.cs", "*.swift", "*.sh", "*.bash", "*.zsh", "*.yaml", "*.yml",
    "*.json", "*.toml", "*.ini", "*.cfg", "*.conf", "*.env", "*.env.*", ".env", ".env.*", "*.xml",
    "*.properties", "*.gradle", "Dockerfile", "docker-compose.yml", "docker-compose.yaml",
    "Makefile", "*.mk",
];

/// Rule ID of the generic high-entropy assignment rule.
pub const ENTROPY_ASSIGNMENT_RULE: &str = "SEC-161";
/// Rule ID of the base64 blob entropy rule.
pub const ENTROPY_BASE64_RULE: &str = "SEC-162";
/// Rule ID of the hex string entropy rule.
pub const ENTROPY_HEX_RULE: &str = "SEC-163";

fn entropy_rule(
    id: &str,
    description: &str,
    confidence: Confidence,
    threshold: &str,
    require_context: bool,
    keywords: &[&str],
    remediation: &str,
) -> Rule {
    let mut metadata = HashMap::from([
        ("cwe".to_string(), CWE_HARDCODED_CREDENTIALS.to_string()),
        ("entropy_threshold".to_string(), threshold.to_string()),
    ]);
    if require_context {
        metadata.insert("require_context".to_string(), "true".to_string());
    }
    Rule {
        id: id.to_string(),
        version: "1.1".to_string(),
        description: description.to_string(),
        severity: Severity::Medium,
        confidence,
        matcher_type: "entropy".to_string(),
        pattern: String::new(),
        file_patterns: ENTROPY_SOURCE_FILE_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        tags: vec!["secrets".to_string(), "entropy".to_string()],
        metadata,
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        remediation: Some(remediation.to_string()),
        references: vec!["https://cwe.mitre.org/data/definitions/798.html".to_string()],
    }
}

/// The complete builtin catalog: regex token rules plus the three entropy
/// rules, in a fresh [`RuleSet`].
pub fn builtin_rules() -> RuleSet {
    let mut set = RuleSet::new();
    for def in SECRET_RULES {
        set.add(Rule {
            id: def.id.to_string(),
            version: "1.0".to_string(),
            description: def.description.to_string(),
            severity: def.severity,
            confidence: def.confidence,
            matcher_type: "regex".to_string(),
            pattern: def.pattern.to_string(),
            file_patterns: Vec::new(),
            tags: vec!["secrets".to_string()],
            metadata: HashMap::from([(
                "cwe".to_string(),
                CWE_HARDCODED_CREDENTIALS.to_string(),
            )]),
            keywords: def.keywords.iter().map(|s| s.to_string()).collect(),
            remediation: Some(def.remediation.to_string()),
            references: vec!["https://cwe.mitre.org/data/definitions/798.html".to_string()],
        });
    }

    set.add(entropy_rule(
        ENTROPY_ASSIGNMENT_RULE,
        "High-entropy string in assignment (possible secret)",
        Confidence::Medium,
        "5.0",
        false,
        &["=", ":", "password", "secret", "key", "token", "credential", "api_key", "private"],
        "Move high-entropy values to environment variables or a secrets manager.",
    ));
    set.add(entropy_rule(
        ENTROPY_BASE64_RULE,
        "High-entropy base64 blob detected (possible encoded secret)",
        Confidence::Low,
        "5.2",
        true,
        &["password", "secret", "key", "token", "credential", "api_key", "private", "auth"],
        "Inspect this base64-encoded value; if it contains a secret, move it to a secrets manager.",
    ));
    set.add(entropy_rule(
        ENTROPY_HEX_RULE,
        "High-entropy hex string detected (possible secret key)",
        Confidence::Low,
        "4.5",
        true,
        &["key", "secret", "token", "password", "credential", "private", "auth"],
        "Review this hex string; if it is a cryptographic key, move it to a secrets manager.",
    ));

    set
}
