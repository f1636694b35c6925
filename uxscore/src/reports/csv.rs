//! CSV rendering of the evaluation report.
//!
//! One line per score, prefixed with the evaluation's base columns; an
//! evaluation without scores still gets one line with the score columns
//! empty. Text columns are double-quoted as-is, matching the format the
//! report's existing consumers parse.

use crate::db::models::reports::ReportEvaluation;

use super::format_average;

const HEADER: &str =
    "Project Name,Project Description,Evaluation Website URL,Notes,Created At,User,Category,Score,Comment,Average Score";

pub fn render(rows: &[ReportEvaluation]) -> String {
    let mut csv = String::new();
    csv.push_str(HEADER);
    csv.push_str("\r\n");

    for row in rows {
        let base = format!(
            "\"{}\",\"{}\",\"{}\",\"{}\",\"{}\",\"{}\"",
            row.project_name,
            row.project_description,
            row.website_url,
            row.notes,
            row.created_at.format("%d/%m/%Y"),
            row.created_by,
        );
        let average = format_average(row.average_score());

        if row.scores.is_empty() {
            csv.push_str(&format!("{base},,,{average}\r\n"));
            continue;
        }
        for score in &row.scores {
            csv.push_str(&format!(
                "{base},\"{}\",{},\"{}\",{average}\r\n",
                score.category_name, score.score, score.comment,
            ));
        }
    }

    csv
}
