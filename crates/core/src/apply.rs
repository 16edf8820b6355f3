use crate::config::app_paths;
use crate::planner::{RenameCandidate, RenamePlan};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UndoLog {
    operations: Vec<RenameOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RenameOperation {
    from: PathBuf,
    to: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFailure {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApplyResult {
    pub applied: usize,
    pub unchanged: usize,
    pub failures: Vec<RenameFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoResult {
    pub restored: usize,
}

/// 計画を順番に適用します。1件の失敗は記録して続行します (全体は中断しません)。
pub fn apply_plan(plan: &RenamePlan) -> Result<ApplyResult> {
    let mut result = ApplyResult::default();
    let mut operations = Vec::new();

    for candidate in &plan.candidates {
        if !candidate.changed {
            result.unchanged += 1;
            continue;
        }
        match rename_candidate(candidate) {
            Ok(()) => {
                result.applied += 1;
                operations.push(RenameOperation {
                    from: candidate.original_path.clone(),
                    to: candidate.target_path.clone(),
                });
            }
            Err(err) => result.failures.push(RenameFailure {
                original_path: candidate.original_path.clone(),
                target_path: candidate.target_path.clone(),
                message: format!("{err:#}"),
            }),
        }
    }

    if !operations.is_empty() {
        persist_undo(&operations)?;
    }

    Ok(result)
}

/// 1件のリネームを実行します。一時名を経由することで、大文字小文字を
/// 区別しないファイルシステムでも自分自身を「既存の衝突先」と誤認しません。
/// 本当に別ファイルが衝突する場合は元の名前に戻して失敗を返します。
pub fn rename_candidate(candidate: &RenameCandidate) -> Result<()> {
    let temp_path = temp_path_for(&candidate.original_path);
    fs::rename(&candidate.original_path, &temp_path).with_context(|| {
        format!(
            "一時リネームに失敗しました: {} -> {}",
            candidate.original_path.display(),
            temp_path.display()
        )
    })?;

    if candidate.target_path.exists() {
        let collision = anyhow::anyhow!(
            "リネーム先が既に存在します: {}",
            candidate.target_path.display()
        );
        return Err(rollback_or_chain(
            collision,
            &temp_path,
            &candidate.original_path,
        ));
    }

    if let Err(err) = fs::rename(&temp_path, &candidate.target_path) {
        let apply_err = anyhow::Error::from(err).context(format!(
            "リネームに失敗しました: {} -> {}",
            candidate.original_path.display(),
            candidate.target_path.display()
        ));
        return Err(rollback_or_chain(
            apply_err,
            &temp_path,
            &candidate.original_path,
        ));
    }

    Ok(())
}

fn rollback_or_chain(err: anyhow::Error, temp_path: &Path, original_path: &Path) -> anyhow::Error {
    match fs::rename(temp_path, original_path) {
        Ok(()) => err,
        Err(rollback_err) => err.context(format!(
            "元の名前へのロールバックにも失敗しました: {} ({rollback_err})",
            original_path.display()
        )),
    }
}

pub fn undo_last() -> Result<UndoResult> {
    let paths = app_paths()?;
    if !paths.undo_path.exists() {
        anyhow::bail!("取り消し可能な履歴がありません");
    }

    let raw = fs::read_to_string(&paths.undo_path).with_context(|| {
        format!(
            "取り消しログを読めませんでした: {}",
            paths.undo_path.display()
        )
    })?;
    let log = serde_json::from_str::<UndoLog>(&raw).context("取り消しログが壊れています")?;

    let restored = restore_operations(&log)?;

    fs::remove_file(&paths.undo_path).with_context(|| {
        format!(
            "取り消しログ削除に失敗しました: {}",
            paths.undo_path.display()
        )
    })?;

    Ok(UndoResult { restored })
}

fn restore_operations(log: &UndoLog) -> Result<usize> {
    let mut restored = 0usize;
    for op in log.operations.iter().rev() {
        if !op.to.exists() {
            continue;
        }
        fs::rename(&op.to, &op.from).with_context(|| {
            format!(
                "取り消しに失敗しました: {} -> {}",
                op.to.display(),
                op.from.display()
            )
        })?;
        restored += 1;
    }
    Ok(restored)
}

fn persist_undo(operations: &[RenameOperation]) -> Result<()> {
    let paths = app_paths()?;
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "設定ディレクトリ作成に失敗しました: {}",
            paths.config_dir.display()
        )
    })?;

    let log = UndoLog {
        operations: operations.to_vec(),
    };
    let body =
        serde_json::to_string_pretty(&log).context("取り消しログのシリアライズに失敗しました")?;
    fs::write(&paths.undo_path, body).with_context(|| {
        format!(
            "取り消しログ書き込みに失敗しました: {}",
            paths.undo_path.display()
        )
    })?;
    Ok(())
}

fn temp_path_for(original_path: &Path) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let parent = original_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = original_path
        .file_name()
        .map(|v| v.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    parent.join(format!(".fnote_tmp_{}_{}", now, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casing::CasingMode;
    use crate::planner::{generate_plan, plan_single_file, PlanOptions};
    use std::fs::File;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    fn apply_candidates(candidates: &[&RenameCandidate]) -> ApplyResult {
        let mut result = ApplyResult::default();
        for candidate in candidates {
            match rename_candidate(candidate) {
                Ok(()) => result.applied += 1,
                Err(err) => result.failures.push(RenameFailure {
                    original_path: candidate.original_path.clone(),
                    target_path: candidate.target_path.clone(),
                    message: format!("{err:#}"),
                }),
            }
        }
        result
    }

    #[test]
    fn one_collision_does_not_abort_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("first note.md"));
        touch(&dir.path().join("second note.md"));
        // "first note.md" のリネーム先を先取りして衝突させる
        touch(&dir.path().join("First note.md"));

        let plan = generate_plan(&PlanOptions {
            input: dir.path().to_path_buf(),
            mode: CasingMode::Sentence,
            ..PlanOptions::default()
        })
        .unwrap();

        let changed: Vec<_> = plan.candidates.iter().filter(|c| c.changed).collect();
        assert_eq!(changed.len(), 2);

        let result = apply_candidates(&changed);
        assert_eq!(result.applied, 1);
        assert_eq!(result.failures.len(), 1);
        assert!(dir.path().join("Second note.md").exists());
        // 衝突したファイルは元の名前のまま残る
        assert!(dir.path().join("first note.md").exists());
    }

    #[test]
    fn unchanged_candidates_are_never_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Already fine.md");
        touch(&path);

        let candidate = plan_single_file(&path, CasingMode::Sentence).unwrap();
        assert!(!candidate.changed);
        assert_eq!(candidate.target_path, path);
    }

    #[test]
    fn rename_candidate_moves_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip PLAN draft.md");
        touch(&path);

        let candidate = plan_single_file(&path, CasingMode::Title).unwrap();
        rename_candidate(&candidate).unwrap();

        assert!(!path.exists());
        assert!(dir.path().join("Trip PLAN Draft.md").exists());
    }

    #[test]
    fn restore_replays_operations_in_reverse() {
        let dir = tempfile::tempdir().unwrap();
        let renamed = dir.path().join("Renamed note.md");
        touch(&renamed);

        let log = UndoLog {
            operations: vec![
                RenameOperation {
                    from: dir.path().join("missing note.md"),
                    to: dir.path().join("Missing note.md"),
                },
                RenameOperation {
                    from: dir.path().join("renamed note.md"),
                    to: renamed.clone(),
                },
            ],
        };

        // 既に消えたリネーム先は読み飛ばし、残りを元に戻す
        let restored = restore_operations(&log).unwrap();
        assert_eq!(restored, 1);
        assert!(dir.path().join("renamed note.md").exists());
        assert!(!renamed.exists());
    }
}
