//! Built-in demo graph: a light-triggered sound alarm.
//!
//! When the room gets dark, listen for six seconds. If it was loud, sound
//! the buzzer, light the LED and notify the remote hub, then wait for the
//! hub to cancel the alarm.

use actiflow_domain::comparison::Comparison;
use actiflow_domain::error::ActiflowError;
use actiflow_domain::graph::{Activity, ActivityGraph};
use actiflow_domain::remote::Method;
use actiflow_domain::sample::SampleField;

/// Endpoint notified when the alarm goes off.
pub const ALARM_URI: &str = "http://example.runmyprocess.com/object/42/alarm";

/// Inbound event that silences the alarm.
pub const CANCEL_EVENT: &str = "cancel alarm";

/// Build the `alarm` graph.
///
/// # Errors
///
/// Returns [`ActiflowError::Validation`] only if the definition below is
/// broken.
pub fn alarm_graph() -> Result<ActivityGraph, ActiflowError> {
    ActivityGraph::builder()
        .name("alarm")
        .activity(
            Activity::new("start")
                .write("led", 0.0)
                .await_threshold("brightness", Comparison::Lt, 900.0, "activity2"),
        )
        .activity(
            Activity::new("activity2")
                .log("light on")
                .log("sampling sound")
                .sample("sound", 6000)
                .log("sampling sound done")
                .then("split_xor3"),
        )
        .activity(Activity::new("split_xor3").branch(
            SampleField::Max,
            Comparison::Gt,
            1000.0,
            "activity5",
            "activity4",
        ))
        .activity(Activity::new("activity4"))
        .activity(
            Activity::new("activity5")
                .write("buzzer", 500.0)
                .write("led", 1.0)
                .then("activity6"),
        )
        .activity(
            Activity::new("activity6")
                .send(ALARM_URI, Method::Put, "ON")
                .then("await7"),
        )
        .activity(Activity::new("await7").await_event(CANCEL_EVENT, Method::Put, "activity8"))
        .activity(
            Activity::new("activity8")
                .write("buzzer", 0.0)
                .write("led", 0.0)
                .then("activity9"),
        )
        .activity(Activity::new("activity9"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_alarm_graph() {
        let graph = alarm_graph().unwrap();
        assert_eq!(graph.entry.as_str(), "start");
        assert_eq!(graph.activities.len(), 9);
    }

    #[test]
    fn should_watch_brightness_only() {
        let graph = alarm_graph().unwrap();
        let watched = graph.watched_sensors();
        let names: Vec<&str> = watched.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["brightness"]);
    }
}
