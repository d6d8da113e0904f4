//! Detection of library components by their inclusion marker.
//!
//! A component opts in by declaring, in its instance or module script:
//!
//! ```svelte
//! <script context="module">
//!     export const evidenceInclude = true
//! </script>
//! ```

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid regex"));

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>").expect("valid regex"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$").expect("valid regex"));

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bexport\s+const\s+(?:[A-Za-z_$][\w$]*\s*=\s*[^,;]+,\s*)*evidenceInclude\s*=\s*true\b(?:\s*[;,\n]|\s*$)")
        .expect("valid regex")
});

/// Whether a component's script declares `export const evidenceInclude = true`.
///
/// Only a `const` export initialised with the literal `true` counts.
pub fn has_inclusion_marker(source: &str) -> bool {
    let without_styles = STYLE_BLOCK.replace_all(source, "");

    SCRIPT_BLOCK.captures_iter(&without_styles).any(|caps| {
        let script = &caps[1];
        let script = BLOCK_COMMENT.replace_all(script, "");
        let script = LINE_COMMENT.replace_all(&script, "");
        MARKER.is_match(&script)
    })
}

/// Recursively find `.svelte` files under `root`.
///
/// Skips `node_modules` and entries starting with `.` or `+`.
pub fn find_components(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let entries = fs::read_dir(root).with_context(|| format!("Failed to read {}", root.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", root.display()))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == "node_modules" || name.starts_with('.') || name.starts_with('+') {
            continue;
        }

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            found.extend(find_components(&path)?);
        } else if name.ends_with(".svelte") {
            found.push(path);
        }
    }

    found.sort();
    Ok(found)
}

/// Names (file stems) of the components under `root` that carry the marker.
pub fn library_components(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for path in find_components(root)? {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read component {}", path.display()))?;
        if has_inclusion_marker(&source) {
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_module_script_marker() {
        let source = r#"
<script context="module">
    export const evidenceInclude = true;
</script>

<div>Chart</div>
"#;
        assert!(has_inclusion_marker(source));
    }

    #[test]
    fn test_instance_script_marker() {
        let source =
            "<script>\n  export let data;\n  export const evidenceInclude = true\n</script>";
        assert!(has_inclusion_marker(source));
    }

    #[test]
    fn test_requires_const_and_literal_true() {
        assert!(!has_inclusion_marker("<script>export let evidenceInclude = true</script>"));
        assert!(!has_inclusion_marker("<script>export const evidenceInclude = false</script>"));
        assert!(!has_inclusion_marker("<script>export const evidenceInclude = \"true\"</script>"));
        assert!(!has_inclusion_marker("<script>export const evidenceInclude = trueish</script>"));
        assert!(!has_inclusion_marker("<script>const evidenceInclude = true</script>"));
    }

    #[test]
    fn test_multiple_declarators() {
        let source = "<script>export const title = 'Chart', evidenceInclude = true;</script>";
        assert!(has_inclusion_marker(source));
    }

    #[test]
    fn test_ignores_markup_styles_and_comments() {
        assert!(!has_inclusion_marker("<p>export const evidenceInclude = true</p>"));
        assert!(!has_inclusion_marker(
            "<style>/* export const evidenceInclude = true */</style><script></script>"
        ));
        assert!(!has_inclusion_marker(
            "<script>\n// export const evidenceInclude = true\n</script>"
        ));
        assert!(!has_inclusion_marker(
            "<script>/*\nexport const evidenceInclude = true\n*/</script>"
        ));
    }

    #[test]
    fn test_library_components() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("charts")).unwrap();
        fs::create_dir_all(root.join("node_modules").join("dep")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();

        let marked = "<script context=\"module\">export const evidenceInclude = true</script>";
        fs::write(root.join("charts").join("BarChart.svelte"), marked).unwrap();
        fs::write(root.join("Plain.svelte"), "<script>let x = 1;</script>").unwrap();
        fs::write(root.join("+page.svelte"), marked).unwrap();
        fs::write(root.join("node_modules").join("dep").join("Dep.svelte"), marked).unwrap();
        fs::write(root.join(".hidden").join("Secret.svelte"), marked).unwrap();
        fs::write(root.join("notes.md"), marked).unwrap();

        assert_eq!(find_components(root).unwrap().len(), 2);
        assert_eq!(library_components(root).unwrap(), vec!["BarChart"]);
    }
}
