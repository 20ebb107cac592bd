//! Database statistics.
//!
//! Summarizes what is indexed: per-project document and chunk counts plus
//! the database file size. Used by `studydesk stats`.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

/// Per-project breakdown of document and chunk counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStats {
    pub name: String,
    pub doc_count: i64,
    pub chunk_count: i64,
    pub created_at: i64,
}

/// Query per-project counts, including projects with no documents.
pub async fn collect_stats(pool: &SqlitePool) -> Result<Vec<ProjectStats>> {
    let rows = sqlx::query(
        r#"
        SELECT
            p.name,
            p.created_at,
            COUNT(DISTINCT d.id) AS doc_count,
            COUNT(tc.id) AS chunk_count
        FROM projects p
        LEFT JOIN documents d ON d.project_id = p.id
        LEFT JOIN text_chunks tc ON tc.document_id = d.id
        GROUP BY p.id
        ORDER BY p.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| ProjectStats {
            name: row.get("name"),
            doc_count: row.get("doc_count"),
            chunk_count: row.get("chunk_count"),
            created_at: row.get("created_at"),
        })
        .collect())
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let projects = collect_stats(&pool).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);
    let total_docs: i64 = projects.iter().map(|p| p.doc_count).sum();
    let total_chunks: i64 = projects.iter().map(|p| p.chunk_count).sum();

    println!("Study Desk: Database Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Projects:    {}", projects.len());
    println!("  Documents:   {}", total_docs);
    println!("  Chunks:      {}", total_chunks);

    if !projects.is_empty() {
        println!();
        println!("  By project:");
        println!(
            "  {:<28} {:>6} {:>8}   {}",
            "PROJECT", "DOCS", "CHUNKS", "CREATED"
        );
        println!("  {}", "-".repeat(62));
        for p in &projects {
            println!(
                "  {:<28} {:>6} {:>8}   {}",
                p.name,
                p.doc_count,
                p.chunk_count,
                format_ts_iso(p.created_at)
            );
        }
    }
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

pub(crate) fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_format_ts_iso() {
        assert_eq!(format_ts_iso(0), "1970-01-01 00:00");
    }
}
