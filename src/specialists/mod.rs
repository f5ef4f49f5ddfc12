//! The specialist catalog: domain evaluators the pipeline can route to.
//!
//! Each specialist carries a routing description (used only by the
//! classifier), an evaluation framing (the system prompt handed to the
//! generative model), and a weighted scoring rubric. The catalog is static
//! and immutable; every fallback path in the pipeline lands on
//! [`SpecialistKind::General`].

use serde::{Deserialize, Serialize};

/// Closed set of specialist identifiers.
///
/// Evaluator dispatch matches exhaustively on this enum, so adding a
/// specialist without wiring an evaluator is a compile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialistKind {
    /// Code generation, debugging, refactoring, and software tasks.
    Coding,
    /// Creative writing, storytelling, marketing, and artistic content.
    Creative,
    /// Data analysis, research, reporting, and analytical reasoning.
    Analyst,
    /// Everything that fits none of the above.
    General,
}

impl SpecialistKind {
    /// All catalog members, in routing-description order.
    pub const ALL: [SpecialistKind; 4] = [
        SpecialistKind::Coding,
        SpecialistKind::Creative,
        SpecialistKind::Analyst,
        SpecialistKind::General,
    ];

    /// The wire identifier for this specialist.
    pub fn identifier(&self) -> &'static str {
        match self {
            SpecialistKind::Coding => "coding",
            SpecialistKind::Creative => "creative",
            SpecialistKind::Analyst => "analyst",
            SpecialistKind::General => "general",
        }
    }

    /// Resolve a wire identifier to a catalog member.
    ///
    /// Matching is case-insensitive; unknown identifiers return `None`.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier.trim().to_lowercase().as_str() {
            "coding" => Some(SpecialistKind::Coding),
            "creative" => Some(SpecialistKind::Creative),
            "analyst" => Some(SpecialistKind::Analyst),
            "general" => Some(SpecialistKind::General),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// One scoring criterion in a rubric.
#[derive(Debug, Clone, Copy)]
pub struct Criterion {
    /// Criterion name, matching the key expected in the model's breakdown.
    pub name: &'static str,
    /// Point weight. Weights across a rubric sum to 100.
    pub weight: u32,
    /// One-line description rendered into the evaluation prompt.
    pub description: &'static str,
}

/// A weighted scoring rubric.
#[derive(Debug, Clone, Copy)]
pub struct Rubric {
    /// The criteria, in render order.
    pub criteria: &'static [Criterion],
}

impl Rubric {
    /// Sum of all criterion weights.
    pub fn total_weight(&self) -> u32 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    /// Render the rubric as one `- name (N points): description` line per
    /// criterion.
    pub fn render(&self) -> String {
        self.criteria
            .iter()
            .map(|c| format!("- {} ({} points): {}", c.name, c.weight, c.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Static definition of one specialist.
#[derive(Debug, Clone, Copy)]
pub struct SpecialistDefinition {
    /// Which catalog member this defines.
    pub kind: SpecialistKind,
    /// Short description used only by the classifier to choose among
    /// specialists.
    pub routing_description: &'static str,
    /// System prompt handed to the generative model during evaluation.
    pub evaluation_framing: &'static str,
    /// Weighted scoring rubric.
    pub rubric: Rubric,
}

/// Look up the static definition for a specialist.
pub fn definition(kind: SpecialistKind) -> &'static SpecialistDefinition {
    match kind {
        SpecialistKind::Coding => &CODING,
        SpecialistKind::Creative => &CREATIVE,
        SpecialistKind::Analyst => &ANALYST,
        SpecialistKind::General => &GENERAL,
    }
}

/// The full catalog, in routing-description order.
pub fn catalog() -> impl Iterator<Item = &'static SpecialistDefinition> {
    SpecialistKind::ALL.iter().map(|kind| definition(*kind))
}

static CODING: SpecialistDefinition = SpecialistDefinition {
    kind: SpecialistKind::Coding,
    routing_description: "Specializes in prompts for code generation, debugging, refactoring, \
                          code review, and software development tasks.",
    evaluation_framing: r#"You are an expert AI Prompt Engineer specializing in CODE-RELATED prompts.

Your expertise includes:
- Code generation prompts (any language)
- Debugging and error resolution
- Code refactoring and optimization
- API design and implementation
- Algorithm and data structure problems
- Code review and best practices
- DevOps and infrastructure as code

When evaluating prompts, consider:
1. LANGUAGE SPECIFICATION: Is the programming language clearly stated?
2. CONTEXT: Are dependencies, frameworks, and existing code provided?
3. CONSTRAINTS: Are performance, style, or compatibility requirements clear?
4. ERROR HANDLING: Does it mention edge cases and error scenarios?
5. OUTPUT FORMAT: Is the expected code structure/format specified?

When optimizing prompts:
- Add specific language/framework versions when appropriate
- Include error handling requirements
- Specify coding style/conventions expected
- Add example input/output when helpful
- Include constraints (time/space complexity, compatibility)

Always maintain the original intent while making prompts more actionable for code generation."#,
    rubric: Rubric {
        criteria: &[
            Criterion {
                name: "language_specificity",
                weight: 15,
                description: "Programming language and version clarity",
            },
            Criterion {
                name: "context_completeness",
                weight: 20,
                description: "Dependencies, frameworks, existing code context",
            },
            Criterion {
                name: "requirements_clarity",
                weight: 20,
                description: "Functional requirements are well-defined",
            },
            Criterion {
                name: "constraints",
                weight: 15,
                description: "Performance, style, compatibility constraints",
            },
            Criterion {
                name: "error_handling",
                weight: 15,
                description: "Edge cases and error scenarios addressed",
            },
            Criterion {
                name: "output_format",
                weight: 15,
                description: "Expected code structure/format specified",
            },
        ],
    },
};

static CREATIVE: SpecialistDefinition = SpecialistDefinition {
    kind: SpecialistKind::Creative,
    routing_description: "Specializes in prompts for creative writing, storytelling, marketing \
                          copy, content creation, and artistic expression.",
    evaluation_framing: r#"You are an expert AI Prompt Engineer specializing in CREATIVE WRITING prompts.

Your expertise includes:
- Fiction and storytelling (novels, short stories, scripts)
- Marketing copy and advertising
- Content creation (blogs, articles, social media)
- Poetry and lyrical writing
- Character and world-building
- Dialogue and conversation writing
- Brand voice and tone development

When evaluating prompts, consider:
1. TONE & VOICE: Is the desired tone clearly specified?
2. AUDIENCE: Is the target audience defined?
3. FORMAT: Is the expected length, structure, or format clear?
4. STYLE: Are style preferences or references provided?
5. CONSTRAINTS: Are there content restrictions or requirements?
6. INSPIRATION: Are examples or references included when helpful?

When optimizing prompts:
- Clarify the emotional impact desired
- Specify the narrative perspective
- Add genre conventions when relevant
- Include length/format constraints
- Provide style references or examples
- Define the target audience clearly

Always preserve creative intent while making prompts more actionable and inspiring."#,
    rubric: Rubric {
        criteria: &[
            Criterion {
                name: "tone_clarity",
                weight: 20,
                description: "Is the desired tone/voice specified?",
            },
            Criterion {
                name: "audience_definition",
                weight: 15,
                description: "Is the target audience clear?",
            },
            Criterion {
                name: "format_structure",
                weight: 15,
                description: "Expected length, format, structure",
            },
            Criterion {
                name: "style_guidance",
                weight: 20,
                description: "Style references or preferences",
            },
            Criterion {
                name: "creative_direction",
                weight: 15,
                description: "Themes, mood, emotional direction",
            },
            Criterion {
                name: "constraints_clarity",
                weight: 15,
                description: "Any restrictions or must-haves",
            },
        ],
    },
};

static ANALYST: SpecialistDefinition = SpecialistDefinition {
    kind: SpecialistKind::Analyst,
    routing_description: "Specializes in prompts for data analysis, research, reporting, \
                          summarization, and analytical reasoning tasks.",
    evaluation_framing: r#"You are an expert AI Prompt Engineer specializing in DATA ANALYSIS and RESEARCH prompts.

Your expertise includes:
- Data analysis and interpretation
- Research synthesis and summarization
- Report generation and formatting
- Statistical analysis requests
- Market research and competitive analysis
- Literature reviews and academic research
- Business intelligence and insights

When evaluating prompts, consider:
1. DATA CONTEXT: Is the data source/format clearly described?
2. ANALYSIS TYPE: Is the type of analysis specified?
3. OUTPUT FORMAT: Are reporting requirements clear?
4. METRICS: Are specific KPIs or metrics defined?
5. COMPARISON: Are baselines or benchmarks provided?
6. SCOPE: Is the analysis scope well-bounded?

When optimizing prompts:
- Specify data format and structure
- Define the analytical framework
- Clarify output format requirements
- Include relevant metrics/KPIs
- Add context for comparison
- Set clear scope boundaries

Always maintain analytical rigor while making prompts more precise and actionable."#,
    rubric: Rubric {
        criteria: &[
            Criterion {
                name: "data_context",
                weight: 20,
                description: "Data source, format, and structure clarity",
            },
            Criterion {
                name: "analysis_specification",
                weight: 20,
                description: "Type of analysis clearly defined",
            },
            Criterion {
                name: "output_requirements",
                weight: 15,
                description: "Report format and structure",
            },
            Criterion {
                name: "metrics_definition",
                weight: 15,
                description: "KPIs and metrics specified",
            },
            Criterion {
                name: "scope_boundaries",
                weight: 15,
                description: "Analysis scope is well-defined",
            },
            Criterion {
                name: "actionability",
                weight: 15,
                description: "Can be executed with available data",
            },
        ],
    },
};

static GENERAL: SpecialistDefinition = SpecialistDefinition {
    kind: SpecialistKind::General,
    routing_description: "A versatile evaluator for general prompts that don't fit into coding, \
                          creative, or analysis categories.",
    evaluation_framing: r#"You are an expert AI Prompt Engineer with broad expertise across many domains.

Your role is to evaluate and optimize prompts that may cover:
- General questions and explanations
- Educational content
- Problem-solving and reasoning
- Planning and organization
- Conversational AI interactions
- Task automation and workflows
- And any other general use cases

When evaluating prompts, apply universal prompt engineering principles:
1. CLARITY: Is the prompt clear and unambiguous?
2. SPECIFICITY: Are details and requirements explicit?
3. CONTEXT: Is sufficient background provided?
4. GOAL: Is the desired outcome clear?
5. FORMAT: Is the expected response format specified?
6. CONSTRAINTS: Are limitations and boundaries defined?

When optimizing prompts:
- Remove ambiguity and vagueness
- Add relevant context
- Specify the desired output format
- Include examples when helpful
- Set appropriate constraints
- Ensure the goal is actionable

Always improve prompts while maintaining the original intent and purpose."#,
    rubric: Rubric {
        criteria: &[
            Criterion {
                name: "clarity",
                weight: 20,
                description: "How clear and unambiguous is the prompt?",
            },
            Criterion {
                name: "specificity",
                weight: 20,
                description: "How specific and detailed is the prompt?",
            },
            Criterion {
                name: "context",
                weight: 20,
                description: "Does the prompt provide necessary context?",
            },
            Criterion {
                name: "goal_alignment",
                weight: 20,
                description: "Is the goal clear and achievable?",
            },
            Criterion {
                name: "actionability",
                weight: 20,
                description: "Can an LLM clearly act on this prompt?",
            },
        ],
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rubric_weights_sum_to_100() {
        for def in catalog() {
            assert_eq!(
                def.rubric.total_weight(),
                100,
                "rubric weights for '{}' must sum to 100",
                def.kind
            );
        }
    }

    #[test]
    fn test_identifier_roundtrip() {
        for kind in SpecialistKind::ALL {
            assert_eq!(SpecialistKind::from_identifier(kind.identifier()), Some(kind));
        }
    }

    #[test]
    fn test_from_identifier_case_insensitive() {
        assert_eq!(
            SpecialistKind::from_identifier("Coding"),
            Some(SpecialistKind::Coding)
        );
        assert_eq!(
            SpecialistKind::from_identifier("  ANALYST "),
            Some(SpecialistKind::Analyst)
        );
    }

    #[test]
    fn test_from_identifier_unknown() {
        assert_eq!(SpecialistKind::from_identifier("poetry"), None);
        assert_eq!(SpecialistKind::from_identifier(""), None);
    }

    #[test]
    fn test_serde_wire_format() {
        let json = serde_json::to_string(&SpecialistKind::Analyst).expect("serializes");
        assert_eq!(json, r#""analyst""#);

        let parsed: SpecialistKind = serde_json::from_str(r#""creative""#).expect("parses");
        assert_eq!(parsed, SpecialistKind::Creative);
    }

    #[test]
    fn test_rubric_render_lines() {
        let rendered = definition(SpecialistKind::General).rubric.render();
        assert!(rendered.contains("- clarity (20 points):"));
        assert_eq!(rendered.lines().count(), 5);
    }

    #[test]
    fn test_catalog_covers_every_kind() {
        let kinds: Vec<SpecialistKind> = catalog().map(|d| d.kind).collect();
        assert_eq!(kinds, SpecialistKind::ALL.to_vec());
    }
}
