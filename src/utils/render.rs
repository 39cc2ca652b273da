use crate::models::{Paper, Summary};
use std::fmt::Write;

/// Renders a summary as Markdown, section by section like the summary tab.
pub fn summary_to_markdown(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", summary.title);
    let _ = writeln!(out, "> {}\n", summary.introduction);

    for point in &summary.key_points {
        let _ = writeln!(out, "## {}\n", point.heading);
        let _ = writeln!(out, "{}\n", point.content);
    }

    if !summary.implications.is_empty() {
        out.push_str("## Key Implications\n\n");
        for implication in &summary.implications {
            let _ = writeln!(out, "- {implication}");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "## Conclusion\n");
    let _ = writeln!(out, "{}", summary.conclusion);
    out
}

/// One line per paper, newest first as returned by the backend.
pub fn paper_table(papers: &[Paper]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<38}  {:<10}  {:>4}  {:<16}  TITLE",
        "ID", "STATUS", "%", "UPLOADED"
    );
    for paper in papers {
        let _ = writeln!(
            out,
            "{:<38}  {:<10}  {:>4}  {:<16}  {}",
            paper.id,
            paper.status,
            paper.processing_progress,
            paper.upload_date.format("%Y-%m-%d %H:%M"),
            paper.display_title()
        );
    }
    out
}
