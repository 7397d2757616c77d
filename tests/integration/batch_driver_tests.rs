/*!
 * Tests for the batch driver: ordering, checkpoint coalescing, abort
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use codex_translator::checkpoint::{Checkpointer, Clock, ManualClock};
use codex_translator::dataset::{CharacterRecord, CheckpointSink, DatasetFile, DatasetStatus, render_dataset};
use codex_translator::errors::AppError;
use codex_translator::providers::mock::{MockErrorType, MockProvider, MockReply};
use codex_translator::translation::retry::RecordingSleeper;
use codex_translator::{Controller, TranslationError};

use crate::common;

const WINDOW: Duration = Duration::from_millis(5000);

/// Keeps a copy of every checkpoint
#[derive(Default)]
struct MemorySink {
    snapshots: Vec<Vec<CharacterRecord>>,
}

impl CheckpointSink for MemorySink {
    fn write(&mut self, records: &[CharacterRecord]) -> Result<(), AppError> {
        self.snapshots.push(records.to_vec());
        Ok(())
    }
}

/// Clock that moves forward by a fixed step every time it is read
struct SteppingClock {
    now_ms: AtomicU64,
    step_ms: u64,
}

impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms.fetch_add(self.step_ms, Ordering::SeqCst))
    }
}

fn english_records(count: usize) -> Vec<CharacterRecord> {
    (0..count)
        .map(|i| common::record(&format!("char{}", i), &format!("description {}", i), &format!("scenario {}", i)))
        .collect()
}

fn make_controller(t: common::TestTranslator) -> (Controller<MockProvider>, Arc<RecordingSleeper>) {
    let jitter_sleeper = Arc::new(RecordingSleeper::new());
    let controller = Controller::new(t.translator, Duration::from_millis(300))
        .with_sleeper(jitter_sleeper.clone())
        .with_progress(false);
    (controller, jitter_sleeper)
}

#[tokio::test]
async fn test_run_withFrozenClock_shouldWriteFirstAndFinalCheckpointOnly() -> Result<()> {
    let t = common::single_endpoint(MockReply::fenced("已翻译"));
    let (controller, jitter_sleeper) = make_controller(t);
    let clock = Arc::new(ManualClock::new());
    let mut checkpointer = Checkpointer::with_clock(MemorySink::default(), WINDOW, Box::new(Arc::clone(&clock)));
    let mut records = english_records(4);

    let summary = controller.run(&mut records, &mut checkpointer).await?;

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.changed, 4);
    assert_eq!(summary.checkpoints, 2);

    let snapshots = &checkpointer.sink().snapshots;
    assert_eq!(snapshots.len(), 2);
    // First write sees only the first record translated, the trailing one sees everything
    assert_eq!(DatasetStatus::of(&snapshots[0]).pending_records, 3);
    assert!(DatasetStatus::of(&snapshots[1]).is_complete());

    // One jitter pause per changed record, each within bounds
    let pauses = jitter_sleeper.sleeps();
    assert_eq!(pauses.len(), 4);
    assert!(pauses.iter().all(|d| *d <= Duration::from_millis(300)));
    Ok(())
}

#[tokio::test]
async fn test_run_withAdvancingClock_shouldFireOncePerWindow() -> Result<()> {
    let t = common::single_endpoint(MockReply::fenced("已翻译"));
    let (controller, _) = make_controller(t);
    let clock = SteppingClock {
        now_ms: AtomicU64::new(0),
        step_ms: 3000,
    };
    let mut checkpointer = Checkpointer::with_clock(MemorySink::default(), WINDOW, Box::new(clock));
    let mut records = english_records(4);

    // Saves at 0 (fire), 3000 (coalesce), 6000 (fire), 9000 (coalesce); flush at 12000
    let summary = controller.run(&mut records, &mut checkpointer).await?;

    assert_eq!(summary.checkpoints, 3);
    let snapshots = &checkpointer.sink().snapshots;
    assert_eq!(DatasetStatus::of(&snapshots[0]).pending_records, 3);
    assert_eq!(DatasetStatus::of(&snapshots[1]).pending_records, 1);
    assert!(DatasetStatus::of(&snapshots[2]).is_complete());
    Ok(())
}

#[tokio::test]
async fn test_run_withNothingPending_shouldNeverWriteOrPause() -> Result<()> {
    let t = common::single_endpoint(MockReply::fenced("不应被调用"));
    let clients = t.clients.clone();
    let (controller, jitter_sleeper) = make_controller(t);
    let mut checkpointer = Checkpointer::with_clock(MemorySink::default(), WINDOW, Box::new(ManualClock::new()));
    let mut records = vec![
        common::record("a", "阿拉娜", "旅行者"),
        common::record("b", "马尔科", "战士"),
    ];

    let summary = controller.run(&mut records, &mut checkpointer).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.changed, 0);
    assert_eq!(summary.checkpoints, 0);
    assert_eq!(clients[0].call_count(), 0);
    assert!(jitter_sleeper.sleeps().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_run_withExhaustedField_shouldFlushPendingCheckpointAndAbort() {
    common::init_test_logging();
    // Two records succeed (four fields), then every request fails
    let t = common::scripted_endpoint(vec![
        MockReply::fenced("描述零"),
        MockReply::fenced("场景零"),
        MockReply::fenced("描述一"),
        MockReply::fenced("场景一"),
    ]);
    let clients = t.clients.clone();
    let (controller, _) = make_controller(t);
    let mut checkpointer = Checkpointer::with_clock(MemorySink::default(), WINDOW, Box::new(ManualClock::new()));
    let mut records = english_records(4);

    let error = controller.run(&mut records, &mut checkpointer).await.unwrap_err();

    let cause = error.downcast_ref::<TranslationError>().expect("translation error");
    match cause {
        TranslationError::Exhausted { character, text, .. } => {
            assert_eq!(character, "char2");
            assert_eq!(text, "description 2");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(clients[0].call_count(), 4 + 5);

    // The second record's coalesced checkpoint must still reach the sink
    let snapshots = &checkpointer.sink().snapshots;
    assert_eq!(snapshots.len(), 2);
    let last = &snapshots[1];
    assert_eq!(last[1].description, "描述一");
    assert_eq!(last[1].scenario, "场景一");
    assert_eq!(last[2].description, "description 2");
    assert_eq!(last[3].description, "description 3");
}

#[tokio::test]
async fn test_run_withDatasetFile_shouldBeResumableAndIdempotent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut records = english_records(3);
    records[1].description = "已经是中文".to_string();
    let path = common::create_test_file(temp_dir.path(), "codex.json", &render_dataset(&records)?)?;

    // First run translates everything
    let t = common::single_endpoint(MockReply::fenced("翻译结果"));
    let (controller, _) = make_controller(t);
    let dataset = DatasetFile::new(&path);
    let mut records = dataset.load()?;
    let mut checkpointer = Checkpointer::new(dataset.clone(), WINDOW);
    let summary = controller.run(&mut records, &mut checkpointer).await?;
    assert_eq!(summary.changed, 3);

    let reloaded = dataset.load()?;
    assert_eq!(reloaded, records);
    assert!(DatasetStatus::of(&reloaded).is_complete());
    assert_eq!(reloaded[1].description, "已经是中文");

    // A restart finds nothing left to do
    let t = common::single_endpoint(MockReply::fenced("不应被调用"));
    let clients = t.clients.clone();
    let (controller, _) = make_controller(t);
    let mut records = dataset.load()?;
    let mut checkpointer = Checkpointer::new(dataset.clone(), WINDOW);
    let summary = controller.run(&mut records, &mut checkpointer).await?;

    assert_eq!(summary.changed, 0);
    assert_eq!(clients[0].call_count(), 0);
    assert_eq!(dataset.load()?, reloaded);
    Ok(())
}

#[tokio::test]
async fn test_run_withRotation_shouldSpreadRetriesAcrossEndpoints() -> Result<()> {
    let t = common::translator_with(vec![
        MockProvider::always(MockReply::Error(MockErrorType::RateLimit)),
        MockProvider::always(MockReply::fenced("翻译")),
    ]);
    let clients = t.clients.clone();
    let (controller, _) = make_controller(t);
    let mut checkpointer = Checkpointer::with_clock(MemorySink::default(), WINDOW, Box::new(ManualClock::new()));
    let mut records = english_records(1);

    controller.run(&mut records, &mut checkpointer).await?;

    // Each field starts on endpoint "a", fails, then succeeds on "b"
    assert_eq!(clients[0].call_count(), 2);
    assert_eq!(clients[1].call_count(), 2);
    assert_eq!(records[0].description, "翻译");
    Ok(())
}
