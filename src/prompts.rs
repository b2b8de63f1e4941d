//! Prompt construction and structured-response schemas
//!
//! Two AI calls exist: the architecture analysis and the six-slide
//! presentation script. Both force a tool call whose arguments are validated
//! against a JSON schema, so the prompts here and the schemas must stay in
//! lockstep.

use crate::github::RepoMetadata;
use crate::providers::ResponseSchema;
use crate::sampling::{FetchedFile, SamplingStats};
use serde_json::json;

/// Options shaping the analysis prompt and response schema
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Ask for a suggested narrative block
    pub include_narrative: bool,
    /// Ask for a mermaid architecture diagram
    pub include_mermaid: bool,
    /// `developer`, `manager`, `investor`, or `all`
    pub target_audience: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_narrative: true,
            include_mermaid: true,
            target_audience: "all".to_string(),
        }
    }
}

/// System prompt for the architecture analysis call
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert software architect. Analyze the entire codebase provided and return a comprehensive analysis as structured JSON.

Be precise and factual. Extract real data from the code - don't make up metrics.
When the repository context mentions files that were skipped, factor that into your analysis (e.g., the true scale and complexity of the project).";

/// Builds the natural-language summary of the sampling decision
///
/// Prepended to the user prompt so the model's narrative reflects the true
/// repository scale even though it only sees a sampled subset.
pub fn build_sampling_context(stats: &SamplingStats, estimated_tokens: usize) -> String {
    let skipped_summary = stats
        .skipped_categories
        .iter()
        .map(|s| format!("{} {}", s.count, s.category))
        .collect::<Vec<_>>()
        .join(", ");
    let type_dist = stats
        .file_type_distribution
        .iter()
        .map(|e| format!("{} ({}%)", e.extension, e.percent))
        .collect::<Vec<_>>()
        .join(", ");

    let mut parts = vec![
        format!("Repository has {} files total.", stats.total_files),
        format!(
            "{} code files were analyzed in detail (strategy: {}).",
            stats.selected_files, stats.budget_strategy
        ),
    ];
    if !skipped_summary.is_empty() {
        parts.push(format!("Skipped: {}.", skipped_summary));
    }
    parts.push(format!("File types present: {}.", type_dist));
    parts.push(format!("Estimated context: ~{} tokens.", estimated_tokens));
    parts.join(" ")
}

/// Builds the analysis user prompt from the fetched file bodies
pub fn analysis_user_prompt(
    owner: &str,
    repo: &str,
    files: &[FetchedFile],
    sampling_context: &str,
    options: &AnalysisOptions,
) -> String {
    let file_block = files
        .iter()
        .map(|f| format!("--- {} ---\n{}", f.path, f.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    let context_prefix = if sampling_context.is_empty() {
        String::new()
    } else {
        format!("REPOSITORY CONTEXT:\n{}\n\n", sampling_context)
    };

    let mut optional_fields = Vec::new();
    if options.include_mermaid {
        optional_fields.push(
            r#"  "mermaid_architecture": "graph TD\n  A[\"Component Name\"] --> B[\"Other Component\"]\n  ...""#
                .to_string(),
        );
    }
    if options.include_narrative {
        optional_fields.push(
            r#"  "suggested_narrative": {
    "hook": "Opening line to grab attention",
    "chapters": [
      { "title": "string", "content": "string", "duration_seconds": 15 }
    ],
    "closing": "Final memorable statement"
  }"#
            .to_string(),
        );
    }

    let audience_field = if options.target_audience == "all" {
        r#"  "target_audiences": {
    "developer": "Why a dev would care about this repo",
    "manager": "Why a PM/CTO would care",
    "investor": "Why this tech matters for business"
  }"#
        .to_string()
    } else {
        format!(
            r#"  "target_audiences": {{
    "{audience}": "Why a {audience} would care about this repo"
  }}"#,
            audience = options.target_audience
        )
    };

    let mut sections = optional_fields;
    sections.push(audience_field);

    format!(
        r#"{context_prefix}Analyze this entire codebase for the repository {owner}/{repo}.

FILES:
{file_block}

Return a JSON object with this EXACT structure:
{{
  "project_name": "string",
  "summary": "2-3 sentence description of what this project does",
  "main_language": "string",
  "languages": ["array of all languages detected"],
  "framework": "string or null (React, Django, Express, etc.)",
  "architecture_type": "monolith | microservices | serverless | library | CLI | API | fullstack",
  "key_components": [
    {{ "name": "string", "purpose": "string", "files": ["paths"] }}
  ],
  "patterns_detected": ["Observer", "MVC", "Singleton", etc.],
  "dependencies_highlight": [
    {{ "name": "string", "why": "string" }}
  ],
  "complexity_score": 1-10,
  "interesting_facts": [
    "string - something surprising or impressive about this codebase"
  ],
{optional}
}}

CRITICAL RULES for "mermaid_architecture":
- Use QUOTED labels for ALL nodes: A["Label text"] not A[Label text]
- NEVER use parentheses () inside brackets [] - Mermaid interprets them as shape syntax
- Use short, clear labels (max 4 words per node)
- Keep the diagram between 5-12 nodes for readability
- Use subgraph blocks to group related components
- Example: graph TD\n  A["API Gateway"] --> B["Auth Service"]\n  subgraph Core\n    B --> C["Database"]\n  end"#,
        optional = sections.join(",\n"),
    )
}

/// Response schema for the analysis call
pub fn analysis_schema(options: &AnalysisOptions) -> ResponseSchema {
    let mut required = vec![
        "project_name",
        "summary",
        "main_language",
        "languages",
        "framework",
        "architecture_type",
        "key_components",
        "patterns_detected",
        "dependencies_highlight",
        "complexity_score",
        "interesting_facts",
        "target_audiences",
    ];
    if options.include_mermaid {
        required.push("mermaid_architecture");
    }
    if options.include_narrative {
        required.push("suggested_narrative");
    }

    let mut properties = json!({
        "project_name": { "type": "string" },
        "summary": { "type": "string" },
        "main_language": { "type": "string" },
        "languages": { "type": "array", "items": { "type": "string" } },
        "framework": { "type": ["string", "null"] },
        "architecture_type": { "type": "string" },
        "key_components": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "purpose": { "type": "string" },
                    "files": { "type": "array", "items": { "type": "string" } },
                },
                "required": ["name", "purpose", "files"],
            },
        },
        "patterns_detected": { "type": "array", "items": { "type": "string" } },
        "dependencies_highlight": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "why": { "type": "string" },
                },
                "required": ["name", "why"],
            },
        },
        "complexity_score": { "type": "number" },
        "interesting_facts": { "type": "array", "items": { "type": "string" } },
        "target_audiences": { "type": "object" },
    });

    if options.include_mermaid {
        properties["mermaid_architecture"] = json!({ "type": "string" });
    }
    if options.include_narrative {
        properties["suggested_narrative"] = json!({
            "type": "object",
            "properties": {
                "hook": { "type": "string" },
                "chapters": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "content": { "type": "string" },
                            "duration_seconds": { "type": "number" },
                        },
                        "required": ["title", "content", "duration_seconds"],
                    },
                },
                "closing": { "type": "string" },
            },
            "required": ["hook", "chapters", "closing"],
        });
    }

    ResponseSchema {
        name: "return_analysis".to_string(),
        description: "Return the structured repository analysis".to_string(),
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    }
}

fn language_guide(language: &str) -> &'static str {
    match language {
        "fr" => "Write ALL slide content and voice scripts in French (francais). Titles, content, and voiceScript MUST be in French. Use natural, idiomatic French.",
        "de" => "Write ALL slide content and voice scripts in German (Deutsch). Titles, content, and voiceScript MUST be in German. Use natural, idiomatic German.",
        _ => "Write ALL slide content and voice scripts in English.",
    }
}

fn tone_guide(mode: &str) -> &'static str {
    if mode == "developer" {
        "Use a technical, precise tone. Focus on architecture, code patterns, and engineering decisions. Include specific technical details, performance characteristics, and implementation insights."
    } else {
        "Use an engaging, storytelling tone. Focus on the problem being solved, the impact, and why developers should care. Make it exciting and accessible. Use metaphors and analogies."
    }
}

/// System prompt for the slide-generation call
pub fn slides_system_prompt(mode: &str, language: &str) -> String {
    format!(
        r#"You are a world-class documentary narrator and storytelling expert. You transform dry technical repositories into compelling cinematic narratives. Every repository has a hero's journey - find it and tell it. Use dramatic pauses, compelling statistics, and emotional hooks. Never use boring bullet points - use narrative flow.

{language_guide}

{tone_guide}

Generate exactly 6 slides for a GitHub repository presentation.

The 6 slides MUST follow this structure:
1. Hook - A compelling problem statement or attention-grabbing stat (type: "hook")
2. Overview - What the project does in simple, clear terms (type: "overview")
3. Architecture - How it works technically, include a mermaid diagram (type: "architecture")
4. Key Features / Data Insights - Standout capabilities. For data science / ML projects, use type "data" and provide chartConfig with real metrics. For other projects, use type "features".
5. Code Walkthrough / Algorithm - A practical usage snippet. For algorithm-heavy projects, use type "algorithm" and provide codeAnimation with step-by-step highlighting AND optionally a dataStructureAnimation. For other projects, use type "code".
6. Impact - Adoption stats, community, and call-to-action (type: "impact")

For each slide, provide:
- title: Slide headline (max 8 words)
- content: Markdown body (2-4 paragraphs, use bullet points, bold, code spans)
- visualDescription: A vivid scene description for AI image generation (for a dark-themed tech illustration)
- voiceScript: MANDATORY narration script (30-50 words, conversational, professional). EVERY slide MUST have a voiceScript - this is critical for continuous audio narration.
- type: One of "hook", "overview", "architecture", "features", "code", "impact", "data", "algorithm"
- mermaidDiagram: ONLY for the architecture slide, provide a valid Mermaid flowchart diagram string. For other slides, omit this field.
- stats: For slides that mention numbers, provide an array of stat objects with {{label, value, suffix?, prefix?}}. Extract real numbers from the repository data.
- chartConfig: For "data" type slides ONLY. Use REAL data from the README: benchmarks, performance comparisons, language distributions, accuracy metrics.
- codeAnimation: For "algorithm" type slides ONLY. Show the CORE algorithm or usage pattern, keep code under 20 lines, 4-8 steps, each step highlighting 1-3 lines with a clear explanation.
- dataStructureAnimation: For "algorithm" type slides, optionally visualize how the algorithm transforms data, 3-6 steps.

IMPORTANT for voiceScript: EVERY slide MUST have a voiceScript. No exceptions. This powers the continuous narration engine.

IMPORTANT for mermaidDiagram: Use simple graph TD syntax. Keep it clean. Example:
graph TD
  A[Input] --> B[Process]
  B --> C[Output]"#,
        language_guide = language_guide(language),
        tone_guide = tone_guide(mode),
    )
}

/// Builds the slide-generation user prompt from repository metadata
pub fn slides_user_prompt(meta: &RepoMetadata) -> String {
    let media_context = if meta.media_urls.is_empty() {
        String::new()
    } else {
        let listing = meta
            .media_urls
            .iter()
            .enumerate()
            .map(|(i, u)| format!("{}. {}", i + 1, u))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "\n\nThe repository contains these media files (screenshots, demos, diagrams) from the README:\n{listing}\n\nFor each slide, you can assign relevant media URLs in the \"repoMediaUrls\" field. IMPORTANT RULES:\n- Only assign a media URL to a slide if it is genuinely relevant to that slide's topic.\n- Do NOT repeat the same media URL across multiple slides.\n- Do NOT assign media if you cannot reasonably infer what the image shows from its URL/filename.\n- It's better to assign NO media than to assign irrelevant media.\n- Maximum 2 media URLs per slide."
        )
    };

    let languages = meta
        .languages
        .iter()
        .map(|(l, b)| format!("{}: {}", l, b))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Create a presentation for this GitHub repository:

Repository: {full_name}
Description: {description}
Main Language: {language}
Stars: {stars} | Forks: {forks} | Issues: {issues}
License: {license}
Topics: {topics}
Languages: {languages}
{media_context}
README (first 3000 chars):
{readme}"#,
        full_name = meta.full_name,
        description = meta.description,
        language = meta.language,
        stars = meta.stars,
        forks = meta.forks,
        issues = meta.open_issues,
        license = meta.license,
        topics = if meta.topics.is_empty() {
            "None".to_string()
        } else {
            meta.topics.join(", ")
        },
        languages = languages,
        media_context = media_context,
        readme = meta.readme,
    )
}

/// Response schema for the slide-generation call
pub fn slides_schema() -> ResponseSchema {
    ResponseSchema {
        name: "create_presentation".to_string(),
        description: "Create a 6-slide presentation from repository data".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "slides": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "content": { "type": "string" },
                            "visualDescription": { "type": "string" },
                            "voiceScript": { "type": "string" },
                            "type": {
                                "type": "string",
                                "enum": ["hook", "overview", "architecture", "features", "code", "impact", "data", "algorithm"],
                            },
                            "mermaidDiagram": { "type": "string" },
                            "stats": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "label": { "type": "string" },
                                        "value": { "type": "number" },
                                        "suffix": { "type": "string" },
                                        "prefix": { "type": "string" },
                                    },
                                    "required": ["label", "value"],
                                },
                            },
                            "repoMediaUrls": {
                                "type": "array",
                                "description": "Relevant media URLs from the repository. Only include genuinely relevant URLs. Max 2.",
                                "items": { "type": "string" },
                            },
                            "chartConfig": {
                                "type": "object",
                                "description": "Chart visualization for data/metrics slides. Use real data from the repo.",
                                "properties": {
                                    "type": { "type": "string", "enum": ["bar", "line", "pie", "radar", "area"] },
                                    "title": { "type": "string" },
                                    "data": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "name": { "type": "string" },
                                                "value": { "type": "number" },
                                            },
                                            "required": ["name", "value"],
                                        },
                                    },
                                    "series": { "type": "array", "items": { "type": "string" } },
                                    "xAxisLabel": { "type": "string" },
                                    "yAxisLabel": { "type": "string" },
                                },
                                "required": ["type", "title", "data"],
                            },
                            "codeAnimation": {
                                "type": "object",
                                "description": "Step-by-step code walkthrough animation for algorithm slides.",
                                "properties": {
                                    "code": { "type": "string" },
                                    "language": { "type": "string" },
                                    "steps": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "lines": { "type": "array", "items": { "type": "number" } },
                                                "explanation": { "type": "string" },
                                            },
                                            "required": ["lines", "explanation"],
                                        },
                                    },
                                },
                                "required": ["code", "language", "steps"],
                            },
                            "dataStructureAnimation": {
                                "type": "object",
                                "description": "Data structure visualization with step-by-step state changes.",
                                "properties": {
                                    "type": { "type": "string", "enum": ["array", "tree", "graph", "stack", "queue", "linked-list"] },
                                    "steps": {
                                        "type": "array",
                                        "items": {
                                            "type": "object",
                                            "properties": {
                                                "nodes": {
                                                    "type": "array",
                                                    "items": {
                                                        "type": "object",
                                                        "properties": {
                                                            "id": { "type": "string" },
                                                            "label": { "type": "string" },
                                                            "highlight": { "type": "boolean" },
                                                        },
                                                        "required": ["id", "label"],
                                                    },
                                                },
                                                "edges": {
                                                    "type": "array",
                                                    "items": {
                                                        "type": "object",
                                                        "properties": {
                                                            "from": { "type": "string" },
                                                            "to": { "type": "string" },
                                                            "label": { "type": "string" },
                                                        },
                                                        "required": ["from", "to"],
                                                    },
                                                },
                                                "caption": { "type": "string" },
                                            },
                                            "required": ["nodes", "caption"],
                                        },
                                    },
                                },
                                "required": ["type", "steps"],
                            },
                        },
                        "required": ["title", "content", "visualDescription", "voiceScript", "type"],
                        "additionalProperties": false,
                    },
                },
            },
            "required": ["slides"],
            "additionalProperties": false,
        }),
    }
}
