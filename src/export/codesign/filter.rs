//! Filters narrowing selectable signing groups.
//!
//! Each filter either rejects a group or returns it with narrowed profile
//! lists. Filters marked as hard constraints are never skipped, even when they
//! leave no group behind.

use super::group::SelectableGroup;
use super::report::ResolutionStep;
use crate::export::DistributionMethod;
use std::collections::{BTreeMap, BTreeSet};

/// A single stage of the group filter pipeline.
pub trait GroupFilter {
    /// Which pipeline step this filter implements.
    fn step(&self) -> ResolutionStep;

    /// Whether the step may be skipped when it would eliminate every group.
    fn skippable(&self) -> bool;

    /// Human readable description for the resolution report.
    fn describe(&self) -> String;

    /// Returns the (possibly narrowed) group, or `None` to eliminate it.
    fn apply(&self, group: &SelectableGroup) -> Option<SelectableGroup>;
}

/// Keeps profiles granting every entitlement the target declares; groups
/// must then cover every target.
pub struct EntitlementsFilter {
    entitlements: BTreeMap<String, BTreeSet<String>>,
}

impl EntitlementsFilter {
    pub fn new(entitlements: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { entitlements }
    }
}

impl GroupFilter for EntitlementsFilter {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::Entitlements
    }

    fn skippable(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        "profiles must grant every entitlement declared by their target".to_string()
    }

    fn apply(&self, group: &SelectableGroup) -> Option<SelectableGroup> {
        let narrowed = group.narrow(|bundle_id, profile| match self.entitlements.get(bundle_id) {
            Some(required) => profile.grants_entitlements(required),
            None => true,
        })?;
        narrowed.covers_all_targets().then_some(narrowed)
    }
}

/// Keeps profiles classified as exactly the requested distribution method.
pub struct ExportMethodFilter {
    method: DistributionMethod,
}

impl ExportMethodFilter {
    pub fn new(method: DistributionMethod) -> Self {
        Self { method }
    }
}

impl GroupFilter for ExportMethodFilter {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::ExportMethod
    }

    fn skippable(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("profiles must allow {} distribution", self.method)
    }

    fn apply(&self, group: &SelectableGroup) -> Option<SelectableGroup> {
        group.narrow(|_, profile| profile.export_method == self.method)
    }
}

/// Keeps groups whose certificate belongs to the requested team.
pub struct TeamFilter {
    team_id: String,
}

impl TeamFilter {
    pub fn new(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
        }
    }
}

impl GroupFilter for TeamFilter {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::Team
    }

    fn skippable(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        format!("certificate must belong to team {}", self.team_id)
    }

    fn apply(&self, group: &SelectableGroup) -> Option<SelectableGroup> {
        (group.certificate.team_id == self.team_id).then(|| group.clone())
    }
}

/// Rejects groups made up only of Xcode managed profiles.
///
/// Applied when the archive itself was signed with a non-managed profile.
/// Surviving groups keep a target's managed candidates only when it has no
/// non-managed one.
pub struct NotManagedFilter;

impl GroupFilter for NotManagedFilter {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::ArchiveOrigin
    }

    fn skippable(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "archive was signed with a non-managed profile; groups of only managed profiles may not re-sign it"
            .to_string()
    }

    fn apply(&self, group: &SelectableGroup) -> Option<SelectableGroup> {
        if group.profiles.values().flatten().all(|profile| profile.managed) {
            return None;
        }

        let mut narrowed = group.clone();
        for candidates in narrowed.profiles.values_mut() {
            if candidates.iter().any(|profile| !profile.managed) {
                candidates.retain(|profile| !profile.managed);
            }
        }
        Some(narrowed)
    }
}

/// Removes profiles named like the default (fallback) profile.
pub struct ExcludeProfileNameFilter {
    name: String,
}

impl ExcludeProfileNameFilter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl GroupFilter for ExcludeProfileNameFilter {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::DefaultProfile
    }

    fn skippable(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("prefer project profiles over the default profile '{}'", self.name)
    }

    fn apply(&self, group: &SelectableGroup) -> Option<SelectableGroup> {
        group.narrow(|_, profile| profile.name != self.name)
    }
}
