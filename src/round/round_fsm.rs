use std::fmt;

use rust_fsm::state_machine;

/*
 * Idle
 * Presenting: the prompt is being spoken
 * AwaitingAnswer: listening, or waiting for a typed answer / choice
 * Evaluating
 *    Correct or attempts exhausted: next prompt, or the end when the target is reached
 *    Incorrect: wait again, optionally after one more replay of the prompt
 * Finished
 */
state_machine! {
    derive(Debug, Clone, Copy, PartialEq, Eq)
    pub RoundFsm(Idle)

    Idle => {
        Start => Presenting
    },
    Presenting => {
        PlaybackComplete => AwaitingAnswer,
        Abandon => Finished,
    },
    AwaitingAnswer => {
        AnswerSubmitted => Evaluating,
        Abandon => Finished,
    },
    Evaluating => {
        NextPrompt => Presenting,
        Retry => AwaitingAnswer,
        RetryWithReplay => Presenting,
        TargetReached => Finished,
    }
}

impl fmt::Display for RoundFsmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
