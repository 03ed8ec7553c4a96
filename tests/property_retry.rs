// tests/property_retry.rs

use std::time::Duration;

use proptest::prelude::*;

use swarm_supervisor::supervisor::{
    AttemptOutcome, Session, SupervisorCommand, SupervisorCore, SupervisorEvent,
    SupervisorOutcome, SupervisorState,
};

/// Drive the core with a sequence of attempt outcomes until it finishes.
///
/// Returns the number of attempts started, the number of backoffs and the
/// final outcome.
fn drive(max_retries: u32, outcomes: &[bool]) -> (u32, u32, SupervisorOutcome) {
    let mut core = SupervisorCore::new(Session::new(max_retries, Duration::from_secs(120)));
    let mut outcomes = outcomes.iter().copied();
    let mut started = 0;
    let mut backoffs = 0;

    let mut next = core.step(SupervisorEvent::Start);
    loop {
        match next.expect("core stalled") {
            SupervisorCommand::StartAttempt { attempt } => {
                started += 1;
                assert_eq!(attempt, started);
                let ok = outcomes.next().unwrap_or(false);
                let outcome = if ok {
                    AttemptOutcome::Success
                } else {
                    AttemptOutcome::Failure
                };
                next = core.step(SupervisorEvent::AttemptFinished(outcome));
            }
            SupervisorCommand::Backoff(delay) => {
                assert_eq!(delay, Duration::from_secs(120));
                backoffs += 1;
                next = core.step(SupervisorEvent::BackoffElapsed);
            }
            SupervisorCommand::Finish(outcome) => {
                assert!(core.state().is_terminal());
                return (started, backoffs, outcome);
            }
        }
    }
}

proptest! {
    #[test]
    fn attempts_never_exceed_max_retries(
        max_retries in 1u32..20,
        outcomes in proptest::collection::vec(any::<bool>(), 0..30),
    ) {
        let (started, backoffs, outcome) = drive(max_retries, &outcomes);

        prop_assert!(started >= 1);
        prop_assert!(started <= max_retries);
        prop_assert_eq!(backoffs, started - 1);

        let first_success = outcomes
            .iter()
            .position(|&ok| ok)
            .map(|i| i as u32 + 1);

        match first_success {
            Some(n) if n <= max_retries => {
                prop_assert_eq!(outcome, SupervisorOutcome::Succeeded { attempts: n });
                prop_assert_eq!(started, n);
            }
            _ => {
                prop_assert_eq!(outcome, SupervisorOutcome::Exhausted { attempts: max_retries });
                prop_assert_eq!(started, max_retries);
            }
        }
    }

    #[test]
    fn terminal_states_ignore_further_events(
        max_retries in 1u32..5,
        succeed in any::<bool>(),
    ) {
        let outcomes = if succeed { vec![true] } else { Vec::new() };
        let mut core = SupervisorCore::new(Session::new(max_retries, Duration::from_secs(1)));
        let mut next = core.step(SupervisorEvent::Start);
        let mut i = 0;
        while let Some(cmd) = next {
            next = match cmd {
                SupervisorCommand::StartAttempt { .. } => {
                    let ok = outcomes.get(i).copied().unwrap_or(false);
                    i += 1;
                    core.step(SupervisorEvent::AttemptFinished(if ok {
                        AttemptOutcome::Success
                    } else {
                        AttemptOutcome::Failure
                    }))
                }
                SupervisorCommand::Backoff(_) => core.step(SupervisorEvent::BackoffElapsed),
                SupervisorCommand::Finish(_) => None,
            };
        }

        let state = core.state();
        prop_assert!(matches!(state, SupervisorState::Succeeded | SupervisorState::Exhausted));
        prop_assert!(core.step(SupervisorEvent::Start).is_none());
        prop_assert!(core.step(SupervisorEvent::BackoffElapsed).is_none());
        prop_assert!(core.step(SupervisorEvent::AttemptFinished(AttemptOutcome::Success)).is_none());
        prop_assert_eq!(core.state(), state);
    }
}
