use crate::apply::rename_candidate;
use crate::casing::CasingMode;
use crate::planner::{is_markdown, plan_single_file};
use notify::event::{EventKind, ModifyKind};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("監視フォルダが存在しません: {0}")]
    MissingRoot(PathBuf),
    #[error("ファイル監視を開始できませんでした: {0}")]
    Watcher(#[from] notify::Error),
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub root: PathBuf,
    pub mode: CasingMode,
    pub delay: Duration,
    pub recursive: bool,
}

/// ファイル監視ループを実行します。新規作成は `delay` 待ってから、
/// 変更は即座にリネームします。監視チャンネルが閉じるとループを抜け、
/// 保留中のリネームは破棄されます。
pub fn watch_root(options: &WatchOptions) -> Result<(), WatchError> {
    if !options.root.exists() {
        return Err(WatchError::MissingRoot(options.root.clone()));
    }

    let (tx, rx) = mpsc::channel();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    let recursive_mode = if options.recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&options.root, recursive_mode)?;

    println!("監視を開始しました: {}", options.root.display());

    let mut queue = DebounceQueue::default();
    loop {
        let received = match queue.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(timeout) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => Some(event),
                Err(_) => break,
            },
        };

        match received {
            Some(Ok(event)) => handle_event(&mut queue, &event, options.delay),
            Some(Err(err)) => eprintln!("監視エラー: {err}"),
            None => {}
        }

        for path in queue.take_due(Instant::now()) {
            fire_rename(&path, options.mode);
        }
    }

    Ok(())
}

fn handle_event(queue: &mut DebounceQueue, event: &notify::Event, delay: Duration) {
    let now = Instant::now();
    for path in &event.paths {
        if !is_markdown(path) {
            continue;
        }
        match event.kind {
            EventKind::Create(_) => queue.schedule(path.clone(), now + delay),
            EventKind::Modify(ModifyKind::Name(_)) => {
                // リネームイベントは旧名と新名の両方で届きうる。
                // 実在するパスだけを新しい名前として扱う。
                if path.exists() {
                    queue.schedule(path.clone(), now);
                } else {
                    queue.cancel(path);
                }
            }
            EventKind::Modify(_) => queue.schedule(path.clone(), now),
            EventKind::Remove(_) => queue.cancel(path),
            _ => {}
        }
    }
}

fn fire_rename(path: &Path, mode: CasingMode) {
    if !path.exists() {
        return;
    }
    match plan_single_file(path, mode) {
        // 変換後の名前が同じなら何もしない。自分のリネームで発生した
        // イベントもここで止まる。
        Ok(candidate) if !candidate.changed => {}
        Ok(candidate) => match rename_candidate(&candidate) {
            Ok(()) => println!(
                "リネームしました: {} -> {}",
                candidate.original_path.display(),
                candidate.target_path.display()
            ),
            Err(err) => eprintln!("リネームに失敗しました: {err:#}"),
        },
        Err(err) => eprintln!("候補の計算に失敗しました: {err:#}"),
    }
}

/// パスごとの保留リネーム。同じパスには早い方の期限が残ります。
#[derive(Debug, Default)]
struct DebounceQueue {
    pending: HashMap<PathBuf, Instant>,
}

impl DebounceQueue {
    fn schedule(&mut self, path: PathBuf, deadline: Instant) {
        self.pending
            .entry(path)
            .and_modify(|existing| {
                if deadline < *existing {
                    *existing = deadline;
                }
            })
            .or_insert(deadline);
    }

    fn cancel(&mut self, path: &Path) {
        self.pending.remove(path);
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    fn take_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut due: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        due.sort();
        for path in &due {
            self.pending.remove(path);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_deadline_wins_for_same_path() {
        let mut queue = DebounceQueue::default();
        let now = Instant::now();
        let path = PathBuf::from("note.md");

        queue.schedule(path.clone(), now + Duration::from_secs(5));
        queue.schedule(path.clone(), now);
        assert_eq!(queue.next_deadline(), Some(now));

        // 遅い期限で上書きされない
        queue.schedule(path, now + Duration::from_secs(5));
        assert_eq!(queue.next_deadline(), Some(now));
    }

    #[test]
    fn take_due_drains_only_expired_entries() {
        let mut queue = DebounceQueue::default();
        let now = Instant::now();

        queue.schedule(PathBuf::from("b.md"), now);
        queue.schedule(PathBuf::from("a.md"), now);
        queue.schedule(PathBuf::from("later.md"), now + Duration::from_secs(60));

        let due = queue.take_due(now);
        assert_eq!(due, vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
        assert_eq!(
            queue.next_deadline(),
            Some(now + Duration::from_secs(60))
        );

        assert!(queue.take_due(now).is_empty());
    }

    #[test]
    fn cancel_discards_a_pending_rename() {
        let mut queue = DebounceQueue::default();
        let now = Instant::now();
        let path = PathBuf::from("gone.md");

        queue.schedule(path.clone(), now);
        queue.cancel(&path);
        assert_eq!(queue.next_deadline(), None);
        assert!(queue.take_due(now).is_empty());
    }
}
