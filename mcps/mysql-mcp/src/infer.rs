//! Database inference engine
//!
//! Guesses the intended database by scanning a project directory for
//! textual hints (env keys, connection URLs) and reconciling them against
//! the schemas the account can actually see. The engine is conservative:
//! it only ever answers when exactly one hint matches an accessible schema,
//! or when a single schema exists and no ambiguity is possible. Everything
//! else is "no decision" and the caller must disambiguate.
//!
//! The scan is bounded (file count, per-file size, directory depth) and
//! per-file read failures are swallowed; the engine is pure over a
//! filesystem root plus a candidate list, which keeps it testable without
//! a live server.

use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::types::Evidence;

/// Well-known configuration filenames, read before the general walk.
const PREFERRED_FILES: &[&str] = &[
    ".env",
    ".env.local",
    "env.example",
    "config.yml",
    "application.yml",
    "application.yaml",
    "config.json",
    "settings.py",
    "database.yml",
    "package.json",
    "pyproject.toml",
];

/// Text-like suffixes eligible for the general walk.
const TEXT_SUFFIXES: &[&str] = &[
    ".env", ".yml", ".yaml", ".json", ".py", ".ts", ".js", ".toml", ".ini", ".properties",
];

/// Scan ceilings: total files read, bytes read per file, and directory
/// depth below the project root.
const MAX_FILES: usize = 200;
const MAX_READ_BYTES: u64 = 256 * 1024;
const MAX_DEPTH: usize = 3;

/// One hint-extraction rule. Key rules take the first match only (a file
/// normally sets a variable once); URL rules collect every occurrence.
struct HintRule {
    pattern: Regex,
    all_matches: bool,
}

/// The rule table. Kept explicit so each rule can be exercised against
/// literal fixture strings.
static HINT_RULES: Lazy<Vec<HintRule>> = Lazy::new(|| {
    let mut rules = Vec::new();
    for key in ["MYSQL_DATABASE", "DB_NAME", "DATABASE_NAME", "MYSQL_DB"] {
        rules.push(HintRule {
            pattern: Regex::new(&format!(r"{}\s*=\s*([A-Za-z0-9_\-]+)", key))
                .expect("static key pattern"),
            all_matches: false,
        });
    }
    for url in [
        r"(?i)jdbc:mysql://[^/\s]+/([A-Za-z0-9_\-]+)",
        r"(?i)mysql://[^/\s]+/([A-Za-z0-9_\-]+)",
    ] {
        rules.push(HintRule {
            pattern: Regex::new(url).expect("static url pattern"),
            all_matches: true,
        });
    }
    rules
});

/// Extract candidate database names from one file's text.
/// Deduplicated, first-seen order.
pub fn extract_hints(text: &str) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    let mut push = |hint: &str| {
        if !hints.iter().any(|h| h == hint) {
            hints.push(hint.to_string());
        }
    };

    for rule in HINT_RULES.iter() {
        if rule.all_matches {
            for caps in rule.pattern.captures_iter(text) {
                push(&caps[1]);
            }
        } else if let Some(caps) = rule.pattern.captures(text) {
            push(&caps[1]);
        }
    }

    hints
}

/// Decision rule: intersect hints with accessible schemas.
///
/// Exactly one match wins. No match with a single accessible schema falls
/// through to that schema. Anything else is no decision - in particular a
/// multi-element intersection is never ordered into an answer, which keeps
/// the outcome independent of scan order.
pub fn decide(hints: &[String], candidates: &[String]) -> Option<String> {
    let intersection: Vec<&String> = hints.iter().filter(|h| candidates.contains(h)).collect();
    match intersection.as_slice() {
        [only] => Some((*only).clone()),
        [] if candidates.len() == 1 => Some(candidates[0].clone()),
        _ => None,
    }
}

/// Read at most `MAX_READ_BYTES` of a file, lossily decoded. Any failure
/// is treated as "nothing to read".
fn read_prefix(path: &Path) -> Option<String> {
    let file = std::fs::File::open(path).ok()?;
    let mut buf = Vec::new();
    file.take(MAX_READ_BYTES).read_to_end(&mut buf).ok()?;
    Some(String::from_utf8_lossy(&buf).into_owned())
}

fn has_text_suffix(name: &str) -> bool {
    let lower = name.to_lowercase();
    TEXT_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Collect hints from a bounded scan of the project tree: well-known
/// filenames first, then a sorted shallow walk over text-like files.
fn scan_project(root: &Path) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    let mut merge = |found: Vec<String>| {
        for hint in found {
            if !hints.contains(&hint) {
                hints.push(hint);
            }
        }
    };

    let mut scanned = 0usize;
    for name in PREFERRED_FILES {
        let path = root.join(name);
        if path.is_file() {
            if let Some(text) = read_prefix(&path) {
                merge(extract_hints(&text));
                scanned += 1;
            }
        }
    }

    if scanned < MAX_FILES {
        // Sorted traversal so repeated runs over the same tree read files
        // in the same order.
        let walker = WalkDir::new(root)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok());
        for entry in walker {
            if scanned >= MAX_FILES {
                break;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            if !has_text_suffix(&entry.file_name().to_string_lossy()) {
                continue;
            }
            if let Some(text) = read_prefix(entry.path()) {
                merge(extract_hints(&text));
                scanned += 1;
            }
        }
    }

    tracing::debug!(files_scanned = scanned, hints = hints.len(), "project scan complete");
    hints
}

/// One full inference pass over `root`, given the accessible schemas.
///
/// Returns the selected database (if the decision rule fired) and the
/// evidence bundle. The evidence is internal; external callers only ever
/// see `Evidence::summary()`.
pub fn infer(root: &Path, candidates: Vec<String>) -> (Option<String>, Evidence) {
    if candidates.is_empty() {
        return (None, Evidence { candidates, ..Evidence::default() });
    }

    let hints = scan_project(root);
    let selected = decide(&hints, &candidates);

    let evidence = Evidence {
        candidates,
        hints,
        selected: selected.clone(),
    };
    (selected, evidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // --- rule table -------------------------------------------------------

    #[test]
    fn test_extracts_env_keys() {
        let hints = extract_hints("DB_NAME=shop\nDB_USER=root\n");
        assert_eq!(hints, vec!["shop"]);
    }

    #[test]
    fn test_extracts_env_key_with_spaces() {
        let hints = extract_hints("MYSQL_DATABASE = inventory");
        assert_eq!(hints, vec!["inventory"]);
    }

    #[test]
    fn test_extracts_jdbc_url() {
        let hints = extract_hints("url: jdbc:mysql://db.example.com:3306/orders?useSSL=false");
        assert_eq!(hints, vec!["orders"]);
    }

    #[test]
    fn test_extracts_bare_url_case_insensitive() {
        let hints = extract_hints("DATABASE_URL=MySQL://root@localhost/shop");
        assert_eq!(hints, vec!["shop"]);
    }

    #[test]
    fn test_hints_deduplicated_first_seen_order() {
        let text = "DB_NAME=shop\nDATABASE_NAME=billing\nmysql://h/shop\n";
        let hints = extract_hints(text);
        assert_eq!(hints, vec!["shop", "billing"]);
    }

    #[test]
    fn test_no_hints_in_unrelated_text() {
        assert!(extract_hints("fn main() { println!(\"hello\"); }").is_empty());
    }

    // --- decision rule ----------------------------------------------------

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_intersection_selected() {
        let selected = decide(&strings(&["shop"]), &strings(&["shop", "billing"]));
        assert_eq!(selected.as_deref(), Some("shop"));
    }

    #[test]
    fn test_no_hints_single_candidate_falls_through() {
        let selected = decide(&[], &strings(&["shop"]));
        assert_eq!(selected.as_deref(), Some("shop"));
    }

    #[test]
    fn test_no_hints_multiple_candidates_is_no_decision() {
        assert_eq!(decide(&[], &strings(&["shop", "billing"])), None);
    }

    #[test]
    fn test_multiple_matches_is_no_decision() {
        let selected = decide(
            &strings(&["shop", "billing"]),
            &strings(&["shop", "billing"]),
        );
        assert_eq!(selected, None);
    }

    #[test]
    fn test_never_selects_inaccessible_schema() {
        // Hint present but not among the accessible schemas: with multiple
        // candidates nothing can be selected.
        let selected = decide(&strings(&["legacy"]), &strings(&["shop", "billing"]));
        assert_eq!(selected, None);
    }

    // --- project scan -----------------------------------------------------

    #[test]
    fn test_infer_from_env_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "DB_NAME=shop\n").unwrap();

        let (db, evidence) = infer(dir.path(), strings(&["shop", "billing"]));
        assert_eq!(db.as_deref(), Some("shop"));
        assert_eq!(evidence.selected.as_deref(), Some("shop"));
        assert!(evidence.hints.contains(&"shop".to_string()));
    }

    #[test]
    fn test_infer_from_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("config").join("db");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("settings.yml"), "jdbc:mysql://h:3306/shop\n").unwrap();

        let (db, _) = infer(dir.path(), strings(&["shop", "billing"]));
        assert_eq!(db.as_deref(), Some("shop"));
    }

    #[test]
    fn test_infer_ignores_files_beyond_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("settings.yml"), "DB_NAME=shop\n").unwrap();

        let (db, evidence) = infer(dir.path(), strings(&["shop", "billing"]));
        assert_eq!(db, None);
        assert!(evidence.hints.is_empty());
    }

    #[test]
    fn test_infer_ignores_non_text_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.md"), "DB_NAME=shop\n").unwrap();

        let (db, _) = infer(dir.path(), strings(&["shop", "billing"]));
        assert_eq!(db, None);
    }

    #[test]
    fn test_infer_no_candidates_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "DB_NAME=shop\n").unwrap();

        let (db, evidence) = infer(dir.path(), vec![]);
        assert_eq!(db, None);
        // Nothing was scanned: there is nothing to select from.
        assert!(evidence.hints.is_empty());
    }

    #[test]
    fn test_infer_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "DB_NAME=shop\n").unwrap();
        fs::write(dir.path().join("app.json"), "mysql://h/billing\n").unwrap();

        let candidates = strings(&["shop", "billing"]);
        let first = infer(dir.path(), candidates.clone());
        for _ in 0..5 {
            let again = infer(dir.path(), candidates.clone());
            assert_eq!(again.0, first.0);
            assert_eq!(again.1.hints, first.1.hints);
        }
    }
}
