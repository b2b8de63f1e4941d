//! Eligibility rules for repository file listings
//!
//! Every blob in the raw listing passes through [`is_eligible`] before
//! ranking. The rules are pure and order-independent: build output,
//! dependency caches, VCS metadata, lockfiles, binary/media extensions, and
//! generated-file name patterns are all excluded.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Extensions considered source code for prioritization purposes
pub static SOURCE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".ts", ".tsx", ".js", ".jsx", ".py", ".go", ".rs", ".java", ".cpp", ".c", ".h", ".hpp",
        ".rb", ".swift", ".kt", ".kts", ".scala", ".clj", ".ex", ".exs", ".zig", ".lua", ".php",
        ".cs", ".fs", ".ml", ".hs", ".erl", ".sh", ".bash", ".yaml", ".yml", ".toml", ".ini",
        ".cfg",
    ]
    .into_iter()
    .collect()
});

static EXCLUDED_DIRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "node_modules", "vendor", "dist", "build", ".git", "__pycache__", ".next", ".nuxt",
        "target", "out", "coverage", ".cache", ".vscode", ".idea", "bin", "obj", "venv", "env",
        ".env", "assets", "static", "docs", ".github", "migrations", "fixtures", "seeds", "test",
        "tests", "spec", "__tests__", "__mocks__", ".turbo", ".parcel-cache",
    ]
    .into_iter()
    .collect()
});

static EXCLUDED_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".bmp", ".tiff", ".woff",
        ".woff2", ".ttf", ".eot", ".otf", ".exe", ".dll", ".so", ".dylib", ".wasm", ".bin", ".o",
        ".a", ".csv", ".parquet", ".sqlite", ".db", ".map", ".lock", ".zip", ".tar", ".gz",
        ".rar", ".7z", ".mp3", ".mp4", ".wav", ".avi", ".mov", ".webm",
    ]
    .into_iter()
    .collect()
});

static EXCLUDED_FILENAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "package-lock.json", "yarn.lock", "pnpm-lock.yaml", "bun.lockb", "Gemfile.lock",
        "Pipfile.lock", "poetry.lock", "composer.lock", "go.sum", "Cargo.lock", "flake.lock",
        ".DS_Store", "Thumbs.db", ".gitignore", ".gitattributes", ".editorconfig", ".prettierrc",
        ".eslintignore",
    ]
    .into_iter()
    .collect()
});

/// Lockfile names, for the skip-category stats
pub static LOCK_FILENAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "package-lock.json", "yarn.lock", "pnpm-lock.yaml", "bun.lockb", "Gemfile.lock",
        "Pipfile.lock", "poetry.lock", "composer.lock", "go.sum", "Cargo.lock", "flake.lock",
    ]
    .into_iter()
    .collect()
});

/// Asset extensions, for the skip-category stats
pub static ASSET_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".woff", ".woff2", ".ttf",
        ".eot",
    ]
    .into_iter()
    .collect()
});

// Test/spec files, generated type declarations, snapshots, storybook and
// e2e fixtures. Minified files are caught here rather than by extension
// since ".min.js" still ends in ".js".
static EXCLUDED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\.test\.",
        r"(?i)\.spec\.",
        r"(?i)\.d\.ts$",
        r"(?i)\.min\.",
        r"(?i)\.snap$",
        r"(?i)\.stories\.",
        r"(?i)\.e2e\.",
    ]
    .into_iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Returns the final path segment
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns the lowercased extension including the dot, or `""` if none
pub fn extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Number of path segments
pub fn depth(path: &str) -> usize {
    path.split('/').count()
}

fn in_excluded_dir(path: &str) -> bool {
    path.split('/').any(|segment| EXCLUDED_DIRS.contains(segment))
}

fn matches_excluded_pattern(name: &str) -> bool {
    EXCLUDED_PATTERNS.iter().any(|re| re.is_match(name))
}

/// Whether a file survives the exclusion rules and may be ranked
///
/// Pure: the same path always yields the same answer, independent of the
/// rest of the listing.
pub fn is_eligible(path: &str) -> bool {
    let name = file_name(path);
    let ext = extension(name);

    if EXCLUDED_FILENAMES.contains(name) {
        return false;
    }
    if EXCLUDED_EXTENSIONS.contains(ext.as_str()) {
        return false;
    }
    if in_excluded_dir(path) {
        return false;
    }
    if matches_excluded_pattern(name) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_directories() {
        assert!(!is_eligible("node_modules/react/index.js"));
        assert!(!is_eligible("packages/app/node_modules/x/y.ts"));
        assert!(!is_eligible("target/debug/main.rs"));
        assert!(!is_eligible("__tests__/util.ts"));
        assert!(is_eligible("src/main.rs"));
    }

    #[test]
    fn test_excluded_filenames_and_extensions() {
        assert!(!is_eligible("package-lock.json"));
        assert!(!is_eligible("Cargo.lock"));
        assert!(!is_eligible("logo.png"));
        assert!(!is_eligible("bundle.min.js"));
        assert!(!is_eligible("app.js.map"));
        assert!(is_eligible("package.json"));
    }

    #[test]
    fn test_excluded_patterns() {
        assert!(!is_eligible("src/util.test.ts"));
        assert!(!is_eligible("src/Api.Spec.js"));
        assert!(!is_eligible("types/global.d.ts"));
        assert!(!is_eligible("src/__snapshots__/x.snap"));
        assert!(!is_eligible("src/Button.stories.tsx"));
        assert!(is_eligible("src/testing_helpers.rs"));
    }

    #[test]
    fn test_is_pure_and_order_independent() {
        let paths = ["src/a.rs", "vendor/b.rs", "lib/c.py", "img/d.png"];
        let forward: Vec<bool> = paths.iter().map(|p| is_eligible(p)).collect();
        let reverse: Vec<bool> = paths.iter().rev().map(|p| is_eligible(p)).collect();
        assert_eq!(forward, reverse.into_iter().rev().collect::<Vec<_>>());
        // Repeated evaluation yields identical answers.
        for p in paths {
            assert_eq!(is_eligible(p), is_eligible(p));
        }
    }

    #[test]
    fn test_extension_helper() {
        assert_eq!(extension("main.RS"), ".rs");
        assert_eq!(extension("archive.tar.gz"), ".gz");
        assert_eq!(extension("Makefile"), "");
    }
}
