use crate::casing::{compute_renamed_name, CasingMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub input: PathBuf,
    pub mode: CasingMode,
    pub recursive: bool,
    pub include_hidden: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            mode: CasingMode::Sentence,
            recursive: false,
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameCandidate {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub new_base: String,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameStats {
    pub scanned_files: usize,
    pub markdown_files: usize,
    pub skipped_non_markdown: usize,
    pub skipped_hidden: usize,
    pub planned: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub mode: CasingMode,
    pub candidates: Vec<RenameCandidate>,
    pub stats: RenameStats,
}

pub fn generate_plan(options: &PlanOptions) -> Result<RenamePlan> {
    if !options.input.exists() {
        anyhow::bail!("対象フォルダが存在しません: {}", options.input.display());
    }

    let mut stats = RenameStats::default();
    let markdown_files = collect_markdown_files(
        &options.input,
        options.recursive,
        options.include_hidden,
        &mut stats,
    )?;

    let mut candidates = Vec::with_capacity(markdown_files.len());
    for path in markdown_files {
        let candidate = plan_single_file(&path, options.mode)?;
        if !candidate.changed {
            stats.unchanged += 1;
        }
        stats.planned += 1;
        candidates.push(candidate);
    }

    Ok(RenamePlan {
        mode: options.mode,
        candidates,
        stats,
    })
}

/// 単一ファイルのリネーム候補を計算します。拡張子の有無は問いません。
/// ベース名が変換後と一致する場合 `changed == false` となり、リネーム不要です。
pub fn plan_single_file(path: &Path, mode: CasingMode) -> Result<RenameCandidate> {
    let base = path
        .file_stem()
        .map(|v| v.to_string_lossy().to_string())
        .with_context(|| format!("ファイル名を取得できませんでした: {}", path.display()))?;
    let new_base = compute_renamed_name(&base, mode);

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let target_path = match path.extension() {
        Some(ext) => parent.join(format!("{}.{}", new_base, ext.to_string_lossy())),
        None => parent.join(&new_base),
    };

    let changed = new_base != base;
    Ok(RenameCandidate {
        original_path: path.to_path_buf(),
        target_path,
        new_base,
        changed,
    })
}

fn collect_markdown_files(
    root: &Path,
    recursive: bool,
    include_hidden: bool,
    stats: &mut RenameStats,
) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("フォルダ走査に失敗しました: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            stats.scanned_files += 1;

            if is_hidden(path) && !include_hidden {
                stats.skipped_hidden += 1;
                continue;
            }

            if is_markdown(path) {
                stats.markdown_files += 1;
                out.push(path.to_path_buf());
            } else {
                stats.skipped_non_markdown += 1;
            }
        }
    } else {
        for entry in fs::read_dir(root)
            .with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
        {
            let entry =
                entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            stats.scanned_files += 1;
            if is_hidden(&path) && !include_hidden {
                stats.skipped_hidden += 1;
                continue;
            }
            if is_markdown(&path) {
                stats.markdown_files += 1;
                out.push(path);
            } else {
                stats.skipped_non_markdown += 1;
            }
        }
        out.sort();
    }

    Ok(out)
}

pub(crate) fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown")
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
