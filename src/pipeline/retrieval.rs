//! Retrieval stage: assembles supporting context from the knowledge corpus.
//!
//! Scoring is deterministic keyword matching, not a learned semantic
//! search. The stage never fails and never returns an empty context: when
//! nothing in the corpus scores above zero, a fixed universal-guidance
//! summary is returned instead.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::corpus::{Corpus, KnowledgeFragment};
use crate::specialists::SpecialistKind;

/// Maximum number of fragments rendered into one context blob.
pub const MAX_CONTEXT_FRAGMENTS: usize = 8;

/// Maximum specialist-specific fragments appended by the secondary query.
const SPECIALIST_EXTRA_FRAGMENTS: usize = 2;

/// Heading rendered above every context blob.
const CONTEXT_BANNER: &str = "PROMPT ENGINEERING BEST PRACTICES:";

/// Universal guidance returned when nothing in the corpus matches.
const FALLBACK_GUIDANCE: &str = "\
Apply universal prompt engineering principles: state the task clearly and \
unambiguously, provide the background context the model needs, specify the \
desired output format, set explicit constraints, and make sure the goal is \
actionable. Where helpful, add examples of the expected output and assign \
the model a concrete role.";

/// Retrieval stage over the immutable corpus table.
pub struct Retriever {
    corpus: Arc<Corpus>,
}

impl Retriever {
    /// Build a retriever over a loaded corpus.
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    /// Assemble the context blob for a request.
    ///
    /// Primary results (scored against prompt + goal) come first; up to
    /// two specialist-specific fragments are appended, deduplicated by
    /// fragment identity; at most [`MAX_CONTEXT_FRAGMENTS`] total.
    pub fn retrieve(&self, prompt: &str, goal: &str, kind: SpecialistKind) -> String {
        let query = format!("{} {}", prompt, goal).to_lowercase();
        let primary = self.rank(&query);

        let primary_ids: HashSet<usize> = primary.iter().map(|(idx, _)| *idx).collect();
        let extras: Vec<usize> = self
            .rank(kind.identifier())
            .into_iter()
            .map(|(idx, _)| idx)
            .filter(|idx| !primary_ids.contains(idx))
            .take(SPECIALIST_EXTRA_FRAGMENTS)
            .collect();

        let combined: Vec<usize> = primary
            .into_iter()
            .map(|(idx, _)| idx)
            .chain(extras)
            .take(MAX_CONTEXT_FRAGMENTS)
            .collect();

        if combined.is_empty() {
            tracing::debug!("no corpus fragments matched, using fallback guidance");
            return format!("{}\n\n{}", CONTEXT_BANNER, FALLBACK_GUIDANCE);
        }

        tracing::debug!(fragments = combined.len(), "assembled retrieval context");
        self.render(&combined)
    }

    /// Score every fragment against a query and return matches ranked by
    /// descending score. Zero-score fragments are excluded.
    fn rank(&self, query: &str) -> Vec<(usize, f64)> {
        let tokens: Vec<&str> = query.split_whitespace().collect();

        let mut scored: Vec<(usize, f64)> = self
            .corpus
            .fragments()
            .iter()
            .enumerate()
            .map(|(idx, fragment)| (idx, score_fragment(query, &tokens, fragment)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored
    }

    /// Render selected fragments under the banner, each as a labeled
    /// section/topic heading followed by its body.
    fn render(&self, indices: &[usize]) -> String {
        let fragments = self.corpus.fragments();
        let mut out = String::from(CONTEXT_BANNER);
        out.push_str("\n\n");
        for idx in indices {
            let fragment = &fragments[*idx];
            out.push_str(&format!(
                "[{} / {}]\n{}\n\n",
                fragment.section, fragment.topic, fragment.body
            ));
        }
        out.trim_end().to_string()
    }
}

/// Score one fragment against the lower-cased query.
fn score_fragment(query: &str, tokens: &[&str], fragment: &KnowledgeFragment) -> f64 {
    let mut score = 0.0;

    for keyword in &fragment.keywords {
        if query.contains(keyword.as_str()) {
            score += 2.0;
        }
        for token in tokens {
            if *token != keyword.as_str()
                && (token.contains(keyword.as_str()) || keyword.contains(token))
            {
                score += 1.0;
            }
        }
    }

    let section = fragment.section.to_lowercase();
    if tokens.iter().any(|token| section.contains(token)) {
        score += 1.0;
    }

    let topic = fragment.topic.to_lowercase();
    if tokens.iter().any(|token| topic.contains(token)) {
        score += 2.0;
    }

    let body = fragment.body.to_lowercase();
    let mut counted: HashSet<&str> = HashSet::new();
    for token in tokens {
        if token.len() > 3 && counted.insert(*token) && body.contains(token) {
            score += 0.5;
        }
    }

    score
}
