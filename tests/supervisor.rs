mod common;

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use common::{FakeLauncher, Recorder, until};
use shardvisor::{
    Config, Event, EventKind, ExitOutcome, ProcessError, RuntimeError, ShardSet, Subscribe,
    Supervisor,
};

fn supervisor() -> (Supervisor, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![rec.clone()];
    (Supervisor::new(Config::default(), subs), rec)
}

fn no_requests() -> mpsc::Receiver<()> {
    let (_tx, rx) = mpsc::channel(1);
    rx
}

const NO_INPUT: Option<&'static [u8]> = None;

#[tokio::test]
async fn test_clean_exit_stops_cluster_with_zero() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", Some(ExitOutcome::Success));
    let caves = launcher.shard("Caves", Some(ExitOutcome::Success));
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    master.exit(ExitOutcome::Success);
    let code = sup
        .run_with(&launcher, &shards, NO_INPUT, no_requests())
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(master.interrupts(), 0);
    assert_eq!(caves.interrupts(), 1);
    assert_eq!(
        launcher.launched(),
        [
            ("Master".to_string(), "[Master] ".to_string()),
            ("Caves".to_string(), "[Caves ] ".to_string()),
        ]
    );
    assert_eq!(rec.count(EventKind::ShardExited), 2);
    assert_eq!(rec.count(EventKind::CascadeTriggered), 1);
    assert_eq!(rec.find(EventKind::AllStopped).unwrap().code, Some(0));
}

#[tokio::test]
async fn test_failing_shard_cascades_once() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", Some(ExitOutcome::Success));
    let caves = launcher.shard("Caves", Some(ExitOutcome::Success));
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    master.exit(ExitOutcome::Code(2));
    let code = sup
        .run_with(&launcher, &shards, NO_INPUT, no_requests())
        .await
        .unwrap();

    assert_eq!(code, 2);
    assert_eq!(master.interrupts(), 0);
    assert_eq!(caves.interrupts(), 1);

    let failed = rec.find(EventKind::ShardFailed).unwrap();
    assert_eq!(failed.shard.as_deref(), Some("Master"));
    assert_eq!(failed.code, Some(2));

    let cascade = rec.find(EventKind::CascadeTriggered).unwrap();
    assert_eq!(cascade.shard.as_deref(), Some("Master"));
    assert_eq!(rec.count(EventKind::CascadeTriggered), 1);
    assert_eq!(rec.count(EventKind::ShutdownRequested), 0);
}

#[tokio::test]
async fn test_last_non_zero_exit_code_wins() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", None);
    let caves = launcher.shard("Caves", Some(ExitOutcome::Code(3)));
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, _rec) = supervisor();

    master.exit(ExitOutcome::Code(2));
    let code = sup
        .run_with(&launcher, &shards, NO_INPUT, no_requests())
        .await
        .unwrap();

    assert_eq!(caves.interrupts(), 1);
    assert_eq!(code, 3);
}

#[tokio::test]
async fn test_first_spawn_failure_is_an_error() {
    let launcher = FakeLauncher::new();
    launcher.failing("Master");
    let caves = launcher.shard("Caves", Some(ExitOutcome::Success));
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    let err = sup
        .run_with(&launcher, &shards, NO_INPUT, no_requests())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Spawn(ProcessError::Spawn { ref shard, .. }) if shard == "Master"
    ));
    assert!(launcher.launched().is_empty());
    assert_eq!(caves.interrupts(), 0);
    assert_eq!(rec.count(EventKind::ShardSpawnFailed), 1);
    let failed = rec.find(EventKind::ShardSpawnFailed).unwrap();
    assert_eq!(failed.shard.as_deref(), Some("Master"));
}

#[tokio::test]
async fn test_later_spawn_failure_stops_started_shards() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", Some(ExitOutcome::Success));
    launcher.failing("Caves");
    let forest = launcher.shard("Forest", Some(ExitOutcome::Success));
    let shards = ShardSet::new(["Master", "Caves", "Forest"]).unwrap();
    let (sup, rec) = supervisor();

    let code = sup
        .run_with(&launcher, &shards, NO_INPUT, no_requests())
        .await
        .unwrap();

    assert_eq!(code, 1);
    assert_eq!(master.interrupts(), 1);
    assert_eq!(forest.interrupts(), 0);
    assert_eq!(launcher.launched().len(), 1);

    let cascade = rec.find(EventKind::CascadeTriggered).unwrap();
    assert_eq!(cascade.shard.as_deref(), Some("Caves"));

    let skipped = rec.find(EventKind::ShardNotStarted).unwrap();
    assert_eq!(skipped.shard.as_deref(), Some("Forest"));
    assert_eq!(rec.count(EventKind::ShardNotStarted), 1);
}

#[tokio::test]
async fn test_shutdown_request_interrupts_every_shard_once() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", Some(ExitOutcome::Success));
    let caves = launcher.shard("Caves", Some(ExitOutcome::Success));
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    let (tx, rx) = mpsc::channel(4);
    tx.send(()).await.unwrap();
    let code = sup
        .run_with(&launcher, &shards, NO_INPUT, rx)
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(master.interrupts(), 1);
    assert_eq!(caves.interrupts(), 1);
    assert_eq!(rec.count(EventKind::ShutdownRequested), 1);
    assert_eq!(rec.count(EventKind::CascadeTriggered), 0);
    assert_eq!(rec.count(EventKind::InterruptSent), 2);
    assert_eq!(rec.count(EventKind::ForcedExit), 0);
}

#[tokio::test]
async fn test_second_request_forces_exit() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", None);
    let caves = launcher.shard("Caves", None);
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    let (tx, rx) = mpsc::channel(4);
    let run = sup.run_with(&launcher, &shards, NO_INPUT, rx);
    let operator = async {
        tx.send(()).await.unwrap();
        until(|| master.interrupts() == 1 && caves.interrupts() == 1).await;
        tx.send(()).await.unwrap();
    };
    let (code, ()) = tokio::join!(run, operator);

    assert_eq!(code.unwrap(), 0);
    assert_eq!(rec.count(EventKind::ForcedExit), 1);
    assert_eq!(rec.find(EventKind::ForcedExit).unwrap().count, Some(2));
    assert_eq!(rec.count(EventKind::AllStopped), 0);
}

#[tokio::test]
async fn test_failed_interrupt_is_not_fatal() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", None);
    let caves = launcher.stubborn("Caves");
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    master.exit(ExitOutcome::Success);
    let run = sup.run_with(&launcher, &shards, NO_INPUT, no_requests());
    let operator = async {
        until(|| caves.interrupts() == 1).await;
        caves.exit(ExitOutcome::Code(130));
    };
    let (code, ()) = tokio::join!(run, operator);

    assert_eq!(code.unwrap(), 130);
    let failed = rec.find(EventKind::InterruptFailed).unwrap();
    assert_eq!(failed.shard.as_deref(), Some("Caves"));
    assert_eq!(rec.count(EventKind::AllStopped), 1);
}

#[tokio::test]
async fn test_input_reaches_selected_shard() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", Some(ExitOutcome::Success));
    let caves = launcher.shard("Caves", Some(ExitOutcome::Success));
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    let mut caves_stdin = caves.take_stdin();
    let input: &'static [u8] = b":Caves\nc_save()\n";
    let run = sup.run_with(&launcher, &shards, Some(input), no_requests());
    let operator = async {
        let mut buf = [0u8; 9];
        caves_stdin.read_exact(&mut buf).await.unwrap();
        master.exit(ExitOutcome::Success);
        buf
    };
    let (code, received) = tokio::join!(run, operator);

    assert_eq!(code.unwrap(), 0);
    assert_eq!(&received, b"c_save()\n");
    let selected = rec.find(EventKind::InputSelected).unwrap();
    assert_eq!(selected.shard.as_deref(), Some("Caves"));
}

#[tokio::test]
async fn test_events_published_before_run_reach_subscribers() {
    let (sup, rec) = supervisor();
    let shards = ShardSet::new(["Master"]).unwrap();

    for round in 1..=2 {
        sup.bus().publish(
            Event::new(EventKind::SignalUnavailable).with_reason("signal driver unavailable"),
        );
        let launcher = FakeLauncher::new();
        let master = launcher.shard("Master", None);
        master.exit(ExitOutcome::Success);

        sup.run_with(&launcher, &shards, NO_INPUT, no_requests())
            .await
            .unwrap();
        assert_eq!(rec.count(EventKind::SignalUnavailable), round);
    }
}

#[tokio::test]
async fn test_interrupting_an_exiting_shard_is_not_reported() {
    let launcher = FakeLauncher::new();
    let master = launcher.shard("Master", None);
    let caves = launcher.exiting("Caves");
    let shards = ShardSet::new(["Master", "Caves"]).unwrap();
    let (sup, rec) = supervisor();

    master.exit(ExitOutcome::Success);
    let run = sup.run_with(&launcher, &shards, NO_INPUT, no_requests());
    let operator = async {
        until(|| caves.interrupts() == 1).await;
        caves.exit(ExitOutcome::Success);
    };
    let (code, ()) = tokio::join!(run, operator);

    assert_eq!(code.unwrap(), 0);
    assert_eq!(rec.count(EventKind::InterruptFailed), 0);
    assert_eq!(rec.count(EventKind::InterruptSent), 0);
    assert_eq!(rec.count(EventKind::ShardExited), 2);
}
