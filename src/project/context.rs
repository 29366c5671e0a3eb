//! Conversation-context analysis.
//!
//! Keyword heuristics over the raw conversation text decide how the
//! project-generation prompt is parametrized. Pure and allocation-only, so
//! many sessions can analyze concurrently without synchronization.

/// Inferred characteristics of the requested project. Any subset of fields
/// may be empty; consumers must tolerate an all-empty context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectContext {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub project_type: Option<String>,
    pub domain: Option<String>,
}

/// Language rules: keywords plus the language/framework pair they imply.
/// First matching rule wins; later rules are not evaluated.
const LANGUAGE_RULES: &[(&[&str], &str, &str)] = &[
    (
        &["c#", "csharp", ".net", "namespace", "using system"],
        "csharp",
        ".NET",
    ),
    (&["java", "spring", "maven"], "java", "Spring/Maven"),
    (&["python", "django", "flask"], "python", "Python"),
    (
        &["javascript", "node", "react"],
        "javascript",
        "Node.js/React",
    ),
    (
        &["typescript", "angular", "vue"],
        "typescript",
        "TypeScript",
    ),
];

const PROJECT_TYPE_RULES: &[(&[&str], &str)] = &[
    (&["library", "sdk"], "library"),
    (&["api", "service"], "api"),
    (&["web", "website", "frontend"], "web"),
    (&["console", "cli", "terminal"], "console"),
];

const DOMAIN_RULES: &[(&[&str], &str)] = &[
    (&["weather", "forecast"], "weather"),
    (&["user", "auth", "login"], "user-management"),
    (&["shop", "order", "ecommerce", "cart"], "ecommerce"),
];

/// Derives the project context from conversation text. Case-folded
/// membership checks per rule family; absence of a keyword simply leaves
/// the field empty.
pub fn analyze_context(conversation: &str) -> ProjectContext {
    let history = conversation.to_lowercase();
    let mut context = ProjectContext::default();

    for (keywords, language, framework) in LANGUAGE_RULES {
        if keywords.iter().any(|k| history.contains(k)) {
            context.language = Some((*language).to_string());
            context.framework = Some((*framework).to_string());
            break;
        }
    }

    for (keywords, project_type) in PROJECT_TYPE_RULES {
        if keywords.iter().any(|k| history.contains(k)) {
            context.project_type = Some((*project_type).to_string());
            break;
        }
    }

    for (keywords, domain) in DOMAIN_RULES {
        if keywords.iter().any(|k| history.contains(k)) {
            context.domain = Some((*domain).to_string());
            break;
        }
    }

    context
}
