//! Priority ranking and adaptive budget selection
//!
//! Eligible files are ranked into six tiers (identity files first, then
//! build config, entry points, high-signal names, shallow source, everything
//! else) and the top of the ranking is taken under a budget derived from the
//! repository's size. The selection decision is summarized in
//! [`SamplingStats`] so the caller, and ultimately the AI model, can see
//! what was left out.

use super::filter::{self, ASSET_EXTENSIONS, LOCK_FILENAMES, SOURCE_EXTENSIONS};
use crate::github::TreeEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const IDENTITY_FILES: &[&str] = &[
    "README.md", "readme.md", "README.rst", "README.txt", "package.json", "Cargo.toml",
    "pyproject.toml", "go.mod", "pom.xml", "build.gradle", "Gemfile", "composer.json",
    "setup.py", "setup.cfg", "deno.json", "deno.jsonc",
];

const CONFIG_FILES: &[&str] = &[
    "tsconfig.json", "vite.config.ts", "vite.config.js", "next.config.js", "next.config.mjs",
    "next.config.ts", "webpack.config.js", "webpack.config.ts", "rollup.config.js",
    "rollup.config.ts", "Dockerfile", "docker-compose.yml", "docker-compose.yaml",
    ".env.example", "Makefile", "Procfile", "nest-cli.json", "angular.json", "nuxt.config.ts",
];

const ENTRY_POINT_BASES: &[&str] = &["main", "index", "app", "server", "core", "mod", "lib"];

const HIGH_RELEVANCE_KEYWORDS: &[&str] = &[
    "route", "router", "api", "controller", "handler", "schema", "model", "type", "interface",
    "entity", "middleware", "guard", "interceptor", "service", "store", "context", "provider",
    "hook",
];

static SHALLOW_SOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(src|lib|pkg|app|core|internal|cmd)/").unwrap());
const SHALLOW_MAX_DEPTH: usize = 3;

/// A file selected for content fetching, with its priority tier
///
/// Priority 1 is highest; the value is assigned once and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrioritizedFile {
    /// Path relative to the repository root
    pub path: String,
    /// Priority tier, 1 = selected first
    pub priority: u8,
}

/// Share of one file extension in the unfiltered listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionShare {
    /// Extension including the dot, or `"(no ext)"`
    pub extension: String,
    /// Percentage of all files, rounded
    pub percent: u32,
}

/// One category of skipped files, with its count
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedCategory {
    /// Human-readable category label
    pub category: String,
    /// Number of files in the category
    pub count: usize,
}

/// Audit metadata describing one filtering/selection decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingStats {
    /// Files in the raw listing
    pub total_files: usize,
    /// Files surviving the exclusion rules
    pub code_files: usize,
    /// Files removed by the exclusion rules
    pub excluded_files: usize,
    /// Files actually selected under the budget
    pub selected_files: usize,
    /// Label of the budget bracket applied
    pub budget_strategy: String,
    /// Top extensions of the unfiltered listing by share
    pub file_type_distribution: Vec<ExtensionShare>,
    /// Named skip categories with counts
    pub skipped_categories: Vec<SkippedCategory>,
}

/// Computes the adaptive file budget for a repository
///
/// Small repositories are read in full; medium and large ones are capped so
/// prompt size stays bounded regardless of the caller's request.
pub fn adaptive_budget(code_file_count: usize, requested_max: usize) -> usize {
    if code_file_count <= 30 {
        code_file_count
    } else if code_file_count <= 100 {
        25.min(requested_max)
    } else {
        20.min(requested_max)
    }
}

fn budget_strategy_label(code_file_count: usize) -> &'static str {
    if code_file_count <= 30 {
        "small_repo_all"
    } else if code_file_count <= 100 {
        "medium_repo_top25"
    } else {
        "large_repo_top20"
    }
}

fn assign_priority(path: &str) -> Option<u8> {
    let name = filter::file_name(path);
    let ext = filter::extension(name);
    let base = name
        .to_lowercase()
        .strip_suffix(&ext)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_lowercase());
    let lower_path = path.to_lowercase();

    // Identity files: what the project *is*.
    if IDENTITY_FILES.contains(&name) {
        return Some(1);
    }

    // Build/deploy configuration.
    if CONFIG_FILES.contains(&name) {
        return Some(2);
    }

    // Everything below must be source code.
    if !SOURCE_EXTENSIONS.contains(ext.as_str()) {
        return None;
    }

    // Entry points.
    if ENTRY_POINT_BASES
        .iter()
        .any(|k| base == *k || base.starts_with(&format!("{}.", k)))
    {
        return Some(3);
    }

    // High-relevance names: routes, schemas, models, services.
    if HIGH_RELEVANCE_KEYWORDS
        .iter()
        .any(|kw| base.contains(kw) || lower_path.contains(&format!("/{}/", kw)))
    {
        return Some(4);
    }

    // Shallow files under conventional source roots.
    if SHALLOW_SOURCE_RE.is_match(&lower_path) && filter::depth(path) <= SHALLOW_MAX_DEPTH {
        return Some(5);
    }

    Some(6)
}

/// Ranks eligible files and selects a budget-bounded subset
///
/// Returns the ordered selection together with the stats block. Ties within
/// a priority tier break toward shallower paths; the sort is stable, so the
/// same candidate set always yields the same selection.
pub fn select(files: &[TreeEntry], requested_max: usize) -> (Vec<PrioritizedFile>, SamplingStats) {
    let mut ext_counts: HashMap<String, usize> = HashMap::new();
    for file in files {
        let ext = filter::extension(filter::file_name(&file.path));
        *ext_counts.entry(ext).or_insert(0) += 1;
    }

    let candidates: Vec<&TreeEntry> = files
        .iter()
        .filter(|f| filter::is_eligible(&f.path))
        .collect();
    let excluded_count = files.len() - candidates.len();

    let budget = adaptive_budget(candidates.len(), requested_max);
    let strategy = budget_strategy_label(candidates.len());

    let mut ranked: Vec<PrioritizedFile> = candidates
        .iter()
        .filter_map(|f| {
            assign_priority(&f.path).map(|priority| PrioritizedFile {
                path: f.path.clone(),
                priority,
            })
        })
        .collect();

    ranked.sort_by_key(|f| (f.priority, filter::depth(&f.path)));
    ranked.truncate(budget);

    let stats = SamplingStats {
        total_files: files.len(),
        code_files: candidates.len(),
        excluded_files: excluded_count,
        selected_files: ranked.len(),
        budget_strategy: strategy.to_string(),
        file_type_distribution: top_extensions(&ext_counts, files.len(), 8),
        skipped_categories: skipped_categories(files),
    };

    (ranked, stats)
}

fn top_extensions(
    counts: &HashMap<String, usize>,
    total: usize,
    limit: usize,
) -> Vec<ExtensionShare> {
    if total == 0 {
        return Vec::new();
    }
    let mut sorted: Vec<(&String, &usize)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    sorted
        .into_iter()
        .take(limit)
        .map(|(ext, count)| ExtensionShare {
            extension: if ext.is_empty() {
                "(no ext)".to_string()
            } else {
                ext.clone()
            },
            percent: ((*count as f64 / total as f64) * 100.0).round() as u32,
        })
        .collect()
}

fn skipped_categories(files: &[TreeEntry]) -> Vec<SkippedCategory> {
    let dependency_count = files
        .iter()
        .filter(|f| f.path.contains("node_modules/") || f.path.contains("vendor/"))
        .count();
    let asset_count = files
        .iter()
        .filter(|f| {
            let ext = filter::extension(filter::file_name(&f.path));
            ASSET_EXTENSIONS.contains(ext.as_str())
        })
        .count();
    let lock_count = files
        .iter()
        .filter(|f| {
            let name = filter::file_name(&f.path);
            LOCK_FILENAMES.contains(name) || name.ends_with(".lock")
        })
        .count();

    let mut categories = Vec::new();
    if dependency_count > 0 {
        categories.push(SkippedCategory {
            category: "dependency files (node_modules, vendor)".to_string(),
            count: dependency_count,
        });
    }
    if asset_count > 0 {
        categories.push(SkippedCategory {
            category: "asset files (images, fonts)".to_string(),
            count: asset_count,
        });
    }
    if lock_count > 0 {
        categories.push(SkippedCategory {
            category: "lock files".to_string(),
            count: lock_count,
        });
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::TreeEntryKind;
    use pretty_assertions::assert_eq;

    fn blob(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: TreeEntryKind::Blob,
            size: None,
        }
    }

    #[test]
    fn test_adaptive_budget_brackets() {
        assert_eq!(adaptive_budget(12, 30), 12);
        assert_eq!(adaptive_budget(30, 30), 30);
        assert_eq!(adaptive_budget(31, 30), 25);
        assert_eq!(adaptive_budget(100, 30), 25);
        assert_eq!(adaptive_budget(101, 30), 20);
        assert_eq!(adaptive_budget(500, 30), 20);
        // Never exceeds the caller's request.
        assert_eq!(adaptive_budget(80, 10), 10);
        assert_eq!(adaptive_budget(300, 5), 5);
    }

    #[test]
    fn test_budget_never_exceeds_candidates_or_request() {
        for n in 0..200 {
            for max in [1, 5, 20, 25, 30, 50] {
                let b = adaptive_budget(n, max);
                assert!(b <= n.max(25).max(max));
                if n <= 30 {
                    assert_eq!(b, n);
                } else {
                    assert!(b <= max);
                }
            }
        }
    }

    #[test]
    fn test_priority_tiers() {
        assert_eq!(assign_priority("README.md"), Some(1));
        assert_eq!(assign_priority("Cargo.toml"), Some(1));
        assert_eq!(assign_priority("Dockerfile"), Some(2));
        assert_eq!(assign_priority("tsconfig.json"), Some(2));
        assert_eq!(assign_priority("src/main.rs"), Some(3));
        assert_eq!(assign_priority("src/app.config.ts"), Some(3));
        assert_eq!(assign_priority("src/user_controller.py"), Some(4));
        assert_eq!(assign_priority("backend/api/users.go"), Some(4));
        assert_eq!(assign_priority("src/widgets.rs"), Some(5));
        assert_eq!(assign_priority("deep/nested/path/to/util.ts"), Some(6));
        // Non-source files that are neither identity nor config are dropped.
        assert_eq!(assign_priority("notes.txt"), None);
        assert_eq!(assign_priority("CHANGELOG.md"), None);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let files: Vec<TreeEntry> = (0..150)
            .map(|i| blob(&format!("pkg/module_{:03}/impl_{:03}.rs", i % 40, i)))
            .chain([blob("README.md"), blob("src/main.rs")])
            .collect();

        let (first, _) = select(&files, 30);
        let (second, _) = select(&files, 30);
        assert_eq!(first, second);
        assert_eq!(first[0].path, "README.md");
        assert_eq!(first[1].path, "src/main.rs");
    }

    #[test]
    fn test_tiebreak_prefers_shallow_paths() {
        let files = vec![
            blob("a/b/c/d/handler.rs"),
            blob("a/handler_two.rs"),
            blob("a/b/handler_three.rs"),
        ];
        let (selected, _) = select(&files, 30);
        let depths: Vec<usize> = selected
            .iter()
            .map(|f| f.path.split('/').count())
            .collect();
        let mut sorted = depths.clone();
        sorted.sort_unstable();
        assert_eq!(depths, sorted);
    }

    #[test]
    fn test_large_repo_stats() {
        // 500 raw files; 150 eligible source files in a large repository.
        let mut files: Vec<TreeEntry> = (0..150)
            .map(|i| blob(&format!("src/part_{:02}/file_{:03}.ts", i % 20, i)))
            .collect();
        for i in 0..250 {
            files.push(blob(&format!("node_modules/dep/{}.js", i)));
        }
        for i in 0..90 {
            files.push(blob(&format!("assets/img_{}.png", i)));
        }
        for _ in 0..10 {
            files.push(blob("sub/package-lock.json"));
        }

        let (selected, stats) = select(&files, 30);
        assert_eq!(stats.total_files, 500);
        assert_eq!(stats.code_files, 150);
        assert_eq!(stats.excluded_files, 350);
        assert_eq!(stats.budget_strategy, "large_repo_top20");
        assert_eq!(selected.len(), 20);
        assert_eq!(stats.selected_files, 20);

        let dependency = stats
            .skipped_categories
            .iter()
            .find(|c| c.category.starts_with("dependency"))
            .unwrap();
        assert_eq!(dependency.count, 250);
        let locks = stats
            .skipped_categories
            .iter()
            .find(|c| c.category == "lock files")
            .unwrap();
        assert_eq!(locks.count, 10);
    }

    #[test]
    fn test_medium_repo_strategy() {
        let files: Vec<TreeEntry> = (0..40)
            .map(|i| blob(&format!("src/mod_{:02}/item.rs", i)))
            .collect();
        let (selected, stats) = select(&files, 30);
        assert_eq!(stats.budget_strategy, "medium_repo_top25");
        assert_eq!(selected.len(), 25);
    }

    #[test]
    fn test_small_repo_reads_everything() {
        let files: Vec<TreeEntry> = (0..12)
            .map(|i| blob(&format!("src/file_{}.rs", i)))
            .collect();
        let (selected, stats) = select(&files, 30);
        assert_eq!(stats.budget_strategy, "small_repo_all");
        assert_eq!(selected.len(), 12);
    }

    #[test]
    fn test_extension_histogram() {
        let mut files: Vec<TreeEntry> = (0..8).map(|i| blob(&format!("a/f{}.ts", i))).collect();
        files.push(blob("b/x.rs"));
        files.push(blob("c/y.rs"));

        let (_, stats) = select(&files, 30);
        assert_eq!(stats.file_type_distribution[0].extension, ".ts");
        assert_eq!(stats.file_type_distribution[0].percent, 80);
        assert_eq!(stats.file_type_distribution[1].extension, ".rs");
        assert_eq!(stats.file_type_distribution[1].percent, 20);
    }
}
