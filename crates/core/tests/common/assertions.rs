//! Custom assertion helpers over pipeline events.

use wr_protocol::ipc::Event;

/// Step indices that reported a `StepStarted` event, in order.
#[allow(dead_code)]
pub fn started_steps(events: &[Event]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StepStarted { step_index, .. } => Some(*step_index),
            _ => None,
        })
        .collect()
}

/// Assert that events start with `PipelineStarted` and end with
/// `PipelineFinished` carrying `success`.
#[allow(dead_code)]
pub fn assert_pipeline_bracketed(events: &[Event], success: bool) {
    assert!(
        matches!(events.first(), Some(Event::PipelineStarted { .. })),
        "First event should be PipelineStarted, got: {:?}",
        events.first()
    );
    assert!(
        matches!(events.last(), Some(Event::PipelineFinished { success: s, .. }) if *s == success),
        "Last event should be PipelineFinished {{ success: {success} }}, got: {:?}",
        events.last()
    );
}
