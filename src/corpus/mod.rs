//! The static prompt-engineering knowledge corpus.
//!
//! The corpus is a set of short, keyword-tagged text fragments loaded once
//! at startup from a markdown-like document of `## SECTION:` and
//! `### <kind>: <name>` markers. When the document is missing or yields no
//! fragments, a built-in set of universal guidance fragments is used
//! instead; startup never fails on corpus absence.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::CorpusError;

/// Fixed vocabulary used to derive fragment keywords.
///
/// Keyword derivation must be deterministic given the fragment text, so the
/// retrieval scores in the pipeline are reproducible across runs.
const VOCABULARY: &[&str] = &[
    "actionable",
    "ambiguity",
    "audience",
    "chain",
    "clarity",
    "clear",
    "code",
    "constraint",
    "context",
    "creative",
    "data",
    "debug",
    "example",
    "format",
    "goal",
    "instruction",
    "iterate",
    "json",
    "language",
    "list",
    "marketing",
    "negative",
    "output",
    "persona",
    "reasoning",
    "requirement",
    "role",
    "step",
    "story",
    "structure",
    "style",
    "task",
    "template",
    "tone",
    "writing",
];

/// One indexed unit of the reference corpus.
#[derive(Debug, Clone)]
pub struct KnowledgeFragment {
    /// Section the fragment belongs to.
    pub section: String,
    /// Topic name within the section.
    pub topic: String,
    /// Free-text body.
    pub body: String,
    /// Keywords derived once from section/topic/body via [`VOCABULARY`].
    pub keywords: BTreeSet<String>,
}

impl KnowledgeFragment {
    /// Build a fragment, deriving its keywords from the source text.
    pub fn new(
        section: impl Into<String>,
        topic: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let section = section.into();
        let topic = topic.into();
        let body = body.into();
        let keywords = derive_keywords(&section, &topic, &body);
        Self {
            section,
            topic,
            body,
            keywords,
        }
    }
}

/// Derive the keyword set for a fragment: every vocabulary term contained in
/// the lower-cased concatenation of section, topic, and body.
fn derive_keywords(section: &str, topic: &str, body: &str) -> BTreeSet<String> {
    let haystack = format!("{} {} {}", section, topic, body).to_lowercase();
    VOCABULARY
        .iter()
        .filter(|term| haystack.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

/// The loaded fragment table, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    fragments: Vec<KnowledgeFragment>,
}

impl Corpus {
    /// An empty corpus. Retrieval against it always degrades to the
    /// universal fallback guidance.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a corpus document.
    ///
    /// Recognized markers:
    /// - `## SECTION: <name>` opens a section
    /// - `### <kind>: <name>` opens a topic; body lines follow until the
    ///   next marker
    ///
    /// Lines outside a topic are ignored. Topics with a blank body are
    /// dropped.
    pub fn from_document(text: &str) -> Self {
        let mut fragments = Vec::new();
        let mut section = String::from("General");
        let mut topic: Option<String> = None;
        let mut body: Vec<&str> = Vec::new();

        let mut flush = |section: &str, topic: &mut Option<String>, body: &mut Vec<&str>| {
            if let Some(name) = topic.take() {
                let text = body.join("\n").trim().to_string();
                if !text.is_empty() {
                    fragments.push(KnowledgeFragment::new(section, name, text));
                }
            }
            body.clear();
        };

        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("## SECTION:") {
                flush(&section, &mut topic, &mut body);
                section = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("### ") {
                flush(&section, &mut topic, &mut body);
                let name = rest
                    .split_once(':')
                    .map(|(_, name)| name.trim())
                    .unwrap_or_else(|| rest.trim());
                topic = Some(name.to_string());
            } else if topic.is_some() {
                body.push(line);
            }
        }
        flush(&section, &mut topic, &mut body);

        Self { fragments }
    }

    /// Load a corpus document from disk.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let text = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_document(&text))
    }

    /// Load a corpus document, degrading to the built-in fragment set when
    /// the path is absent, unreadable, or yields no fragments.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::load(path) {
                Ok(corpus) if !corpus.is_empty() => {
                    tracing::info!(
                        path = %path.display(),
                        fragments = corpus.len(),
                        "loaded knowledge corpus"
                    );
                    corpus
                }
                Ok(_) => {
                    tracing::warn!(
                        path = %path.display(),
                        "corpus document contains no fragments, using built-in guidance"
                    );
                    Self::builtin()
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "failed to load corpus document, using built-in guidance"
                    );
                    Self::builtin()
                }
            },
            None => Self::builtin(),
        }
    }

    /// The built-in fragment set used when no corpus document is available.
    pub fn builtin() -> Self {
        Self::from_document(BUILTIN_GUIDANCE)
    }

    /// All fragments, in document order.
    pub fn fragments(&self) -> &[KnowledgeFragment] {
        &self.fragments
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether the corpus holds no fragments.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Built-in prompt-engineering guidance, in the corpus document format.
const BUILTIN_GUIDANCE: &str = r#"## SECTION: Fundamentals

### PRINCIPLE: Clarity
Clear prompts specify exactly what you want. Avoid ambiguity by using precise
language and defining terms that could be interpreted multiple ways.

### PRINCIPLE: Context
Provide relevant background information. Tell the AI what role it should
play, what the situation is, and any constraints or requirements.

### PRINCIPLE: Constraints
Specify constraints clearly: length limits, format requirements, topics to
avoid, or specific points to include.

### PRINCIPLE: Structure
Use structured formatting like bullet points, numbered lists, or XML tags to
organize complex prompts and expected outputs.

## SECTION: Techniques

### TECHNIQUE: Few-shot examples
Include 2-3 examples of the desired input-output format to guide the model's
responses.

### TECHNIQUE: Chain of thought
For reasoning tasks, ask the model to think step by step or explain its
reasoning to improve accuracy.

### TECHNIQUE: Role prompting
Assign a specific role or persona: "You are an expert Python developer"
helps focus responses on domain expertise.

### TECHNIQUE: Negative instructions
Specify what NOT to do: "Do not include disclaimers" or "Avoid technical
jargon" can improve output quality.

## SECTION: Output Control

### TECHNIQUE: Output format
Specify the exact output format you want: JSON, markdown, bullet points, or
a specific template structure.

### TECHNIQUE: Iteration
Break complex tasks into subtasks. Use multi-turn conversations to refine
and build on previous outputs.
"#;
