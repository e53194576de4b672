//! Activity graph — the automation program an instance executes.
//!
//! A graph is a set of [`Activity`] nodes with one entry point. Each
//! activity runs its [`Step`]s and leaves through exactly one [`Exit`]:
//! straight to the next activity, through a [`ConditionalEdge`], into a
//! suspension point ([`ThresholdWatch`] / [`CancellationWait`]), or to the
//! end of the chain.

mod activity;
mod edge;

pub use activity::{Activity, Exit, Resume, Step};
pub use edge::{CancellationWait, ConditionalEdge, Predicate, ThresholdWatch};

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ActiflowError, ValidationError};
use crate::id::{ActivityId, CapabilityName};

/// A validated automation program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityGraph {
    pub name: String,
    pub entry: ActivityId,
    pub activities: Vec<Activity>,
}

impl ActivityGraph {
    /// Create a builder for constructing an [`ActivityGraph`].
    #[must_use]
    pub fn builder() -> ActivityGraphBuilder {
        ActivityGraphBuilder::default()
    }

    /// Parse a graph from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ActiflowError::Definition`] if the text is not a graph
    /// definition, or [`ActiflowError::Validation`] if the graph breaks an
    /// invariant.
    pub fn from_json(text: &str) -> Result<Self, ActiflowError> {
        let graph: Self = serde_json::from_str(text)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Look up an activity by id.
    #[must_use]
    pub fn activity(&self, id: &ActivityId) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == *id)
    }

    /// Sensors the graph samples or watches.
    #[must_use]
    pub fn referenced_sensors(&self) -> BTreeSet<&CapabilityName> {
        let mut sensors = BTreeSet::new();
        for activity in &self.activities {
            for step in &activity.steps {
                if let Step::Sample { sensor, .. } = step {
                    sensors.insert(sensor);
                }
            }
            if let Exit::AwaitThreshold(watch) = &activity.exit {
                sensors.insert(&watch.sensor);
            }
        }
        sensors
    }

    /// Sensors that some activity arms a threshold watch on.
    #[must_use]
    pub fn watched_sensors(&self) -> BTreeSet<&CapabilityName> {
        self.activities
            .iter()
            .filter_map(|a| match &a.exit {
                Exit::AwaitThreshold(watch) => Some(&watch.sensor),
                _ => None,
            })
            .collect()
    }

    /// Actuators the graph writes to.
    #[must_use]
    pub fn referenced_actuators(&self) -> BTreeSet<&CapabilityName> {
        self.activities
            .iter()
            .flat_map(|a| a.steps.iter())
            .filter_map(|step| match step {
                Step::Write { actuator, .. } => Some(actuator),
                _ => None,
            })
            .collect()
    }

    /// Check graph invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found:
    /// - empty name, no activities, or an undefined entry
    /// - an activity id used twice
    /// - an exit leading to an undefined activity
    /// - a non-finite write value, threshold, or predicate value
    /// - a cycle of `next`/`branch` edges with no suspension point on it
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.activities.is_empty() {
            return Err(ValidationError::NoActivities);
        }

        let mut seen = HashSet::new();
        for activity in &self.activities {
            if !seen.insert(&activity.id) {
                return Err(ValidationError::DuplicateActivity(activity.id.clone()));
            }
        }
        if !seen.contains(&self.entry) {
            return Err(ValidationError::MissingEntry(self.entry.clone()));
        }

        for activity in &self.activities {
            if let Some(missing) = activity.successors().into_iter().find(|s| !seen.contains(s)) {
                return Err(ValidationError::UndefinedActivity {
                    from: activity.id.clone(),
                    to: missing.clone(),
                });
            }
            if !activity.has_finite_values() {
                return Err(ValidationError::NonFiniteValue {
                    activity: activity.id.clone(),
                });
            }
        }

        if let Some(cycle) = find_unbounded_chain(&self.activities) {
            return Err(ValidationError::UnboundedChain(cycle));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first search over chained (non-suspending) edges.
fn find_unbounded_chain(activities: &[Activity]) -> Option<Vec<ActivityId>> {
    let index: HashMap<&ActivityId, usize> = activities
        .iter()
        .enumerate()
        .map(|(i, a)| (&a.id, i))
        .collect();
    let mut marks = vec![Mark::Unvisited; activities.len()];
    let mut path = Vec::new();

    for start in 0..activities.len() {
        if marks[start] == Mark::Unvisited {
            if let Some(cycle) = visit(start, activities, &index, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    activities: &[Activity],
    index: &HashMap<&ActivityId, usize>,
    marks: &mut [Mark],
    path: &mut Vec<usize>,
) -> Option<Vec<ActivityId>> {
    marks[node] = Mark::InProgress;
    path.push(node);

    for next in activities[node].chained_successors() {
        let Some(&target) = index.get(next) else {
            continue;
        };
        match marks[target] {
            Mark::InProgress => {
                let start = path.iter().position(|&p| p == target).unwrap_or(0);
                return Some(
                    path[start..]
                        .iter()
                        .map(|&i| activities[i].id.clone())
                        .collect(),
                );
            }
            Mark::Unvisited => {
                if let Some(cycle) = visit(target, activities, index, marks, path) {
                    return Some(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    path.pop();
    marks[node] = Mark::Done;
    None
}

/// Step-by-step builder for [`ActivityGraph`].
#[derive(Debug, Default)]
pub struct ActivityGraphBuilder {
    name: Option<String>,
    entry: Option<ActivityId>,
    activities: Vec<Activity>,
}

impl ActivityGraphBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the entry activity. Defaults to the first activity added.
    #[must_use]
    pub fn entry(mut self, entry: impl Into<ActivityId>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    #[must_use]
    pub fn activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// Consume the builder, validate, and return an [`ActivityGraph`].
    ///
    /// # Errors
    ///
    /// Returns [`ActiflowError::Validation`] if the graph breaks an invariant.
    pub fn build(self) -> Result<ActivityGraph, ActiflowError> {
        let entry = self
            .entry
            .or_else(|| self.activities.first().map(|a| a.id.clone()))
            .ok_or(ValidationError::NoActivities)?;
        let graph = ActivityGraph {
            name: self.name.unwrap_or_default(),
            entry,
            activities: self.activities,
        };
        graph.validate()?;
        Ok(graph)
    }
}
