#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use proptest::prelude::*;
use serde_json::json;
use zena_tasks::*;

fn rank(status: JobStatus) -> u8 {
    match status {
        JobStatus::Pending => 0,
        JobStatus::Running => 1,
        JobStatus::Completed | JobStatus::Failed => 2,
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Run,
    Complete,
    Fail,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Run), Just(Op::Complete), Just(Op::Fail)]
}

proptest! {
    #[test]
    fn prop_observed_statuses_are_monotonic(ops in proptest::collection::vec(op(), 0..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let manager = JobManager::new();
            let job = manager.create_job("task.search", "u1").await.unwrap();
            let mut observed = vec![job.status];

            for op in ops {
                let before = manager.get_job(&job.id).await.unwrap();
                let outcome = match op {
                    Op::Run => manager.mark_running(&job.id).await,
                    Op::Complete => manager.mark_completed(&job.id, json!("ok")).await,
                    Op::Fail => manager.mark_failed(&job.id, "err").await,
                };
                let after = manager.get_job(&job.id).await.unwrap();
                match outcome {
                    Ok(updated) => prop_assert_eq!(&updated, &after),
                    Err(JobError::InvalidJobTransition { .. }) => prop_assert_eq!(&before, &after),
                    Err(e) => prop_assert!(false, "unexpected error {}", e),
                }
                observed.push(after.status);
            }

            for pair in observed.windows(2) {
                prop_assert!(rank(pair[0]) <= rank(pair[1]));
                if pair[0].is_terminal() {
                    prop_assert_eq!(pair[0], pair[1]);
                }
            }

            let last = manager.get_job(&job.id).await.unwrap();
            prop_assert_eq!(last.result.is_some(), last.status == JobStatus::Completed);
            prop_assert_eq!(last.error.is_some(), last.status == JobStatus::Failed);
            prop_assert_eq!(last.terminated_at.is_some(), last.status.is_terminal());
            Ok(())
        })?;
    }
}
