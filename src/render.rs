//! Markdown document renderer.

use std::fmt::Write as _;

use crate::pipeline::crawl::SkippedDirectory;
use crate::pipeline::MigrationGuideResult;
use crate::ports::{DocumentRenderer, RenderedDocument};

/// Renders results as one Markdown document, one numbered section per result.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl DocumentRenderer for MarkdownRenderer {
    fn render(
        &self,
        repo_name: &str,
        results: &[MigrationGuideResult],
        skipped: &[SkippedDirectory],
    ) -> RenderedDocument {
        let mut out = String::from("# Migration Guide\n\n");
        if !skipped.is_empty() {
            out.push_str("> **Skipped directories:** not listed, not covered.\n>\n");
            for dir in skipped {
                let _ = writeln!(out, "> - `{}`: {}", dir.path, dir.reason);
            }
            out.push('\n');
        }
        for (i, result) in results.iter().enumerate() {
            if i > 0 {
                out.push_str("\n---\n\n");
            }
            let _ = write!(out, "## {}. {}", i + 1, result.file_path);
            if let Some(part) = result.part.filter(|p| p.total > 1) {
                let _ = write!(out, " (part {}/{})", part.index + 1, part.total);
            }
            out.push_str("\n\n");

            if !result.dependencies.is_empty() {
                out.push_str("**Dependencies:**\n\n");
                for dep in &result.dependencies {
                    let _ = writeln!(out, "- `{dep}`");
                }
                out.push('\n');
            }

            out.push_str(result.guide_text.trim_end());
            out.push('\n');
        }

        RenderedDocument {
            file_name: format!("migration-guide-{repo_name}.md"),
            content_type: "text/markdown; charset=utf-8".into(),
            body: out.into_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ChunkPart;

    fn result(path: &str, deps: &[&str], text: &str, part: Option<ChunkPart>) -> MigrationGuideResult {
        MigrationGuideResult {
            file_path: path.into(),
            dependencies: deps.iter().map(|d| (*d).to_string()).collect(),
            guide_text: text.into(),
            part,
        }
    }

    #[test]
    fn renders_numbered_sections_in_order() {
        let doc = MarkdownRenderer.render(
            "shop",
            &[
                result("a.py", &["os"], "Guide A\n", None),
                result("dir/b.js", &[], "Guide B", Some(ChunkPart { index: 1, total: 2 })),
            ],
            &[],
        );
        let body = String::from_utf8(doc.body).unwrap();

        assert_eq!(doc.file_name, "migration-guide-shop.md");
        assert!(body.starts_with("# Migration Guide\n\n## 1. a.py\n\n"));
        assert!(body.contains("- `os`"));
        assert!(body.contains("## 2. dir/b.js (part 2/2)"));
        assert!(body.find("Guide A").unwrap() < body.find("Guide B").unwrap());
        assert_eq!(body.matches("\n---\n").count(), 1);
    }

    #[test]
    fn single_chunk_files_omit_part_marker() {
        let single = result("x.rb", &[], "g", Some(ChunkPart { index: 0, total: 1 }));
        let doc = MarkdownRenderer.render("r", &[single], &[]);
        let body = String::from_utf8(doc.body).unwrap();
        assert!(body.contains("## 1. x.rb\n"));
        assert!(!body.contains("part"));
    }

    #[test]
    fn skipped_directories_are_listed_before_sections() {
        let skipped = [SkippedDirectory { path: "vendor".into(), reason: "broken pipe".into() }];
        let doc = MarkdownRenderer.render("shop", &[result("main.rb", &[], "g", None)], &skipped);
        let body = String::from_utf8(doc.body).unwrap();

        let note = body.find("**Skipped directories:**").unwrap();
        assert!(body.contains("> - `vendor`: broken pipe\n"));
        assert!(note < body.find("## 1. main.rb").unwrap());
    }

    #[test]
    fn complete_crawl_has_no_skipped_note() {
        let doc = MarkdownRenderer.render("shop", &[result("main.rb", &[], "g", None)], &[]);
        assert!(!String::from_utf8(doc.body).unwrap().contains("Skipped"));
    }
}
