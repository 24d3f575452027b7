//! Code signing group resolution.
//!
//! Turns installed certificates and profiles plus the archive's bundle
//! targets into at most one [`ResolvedGroup`]:
//!
//! 1. Seed one group per certificate (profile matches target and embeds certificate)
//! 2. Entitlements
//! 3. Export method
//! 4. Team (only with an explicit team id)
//! 5. Archive origin (only when the archive was signed without a managed profile)
//! 6. Default profile exclusion (only without a team id and with a default profile)
//! 7. First profile per target
//! 8. First group wins
//!
//! Nothing here performs IO or logs; every decision is recorded in the
//! returned [`ResolutionReport`].

use super::certificate::Certificate;
use super::filter::{
    EntitlementsFilter, ExcludeProfileNameFilter, ExportMethodFilter, GroupFilter,
    NotManagedFilter, TeamFilter,
};
use super::group::{ResolvedGroup, SelectableGroup, pin_order, seed_groups};
use super::profile::ProvisioningProfile;
use super::report::{DiagnosticKind, ResolutionReport, ResolutionStep, StepOutcome};
use crate::export::DistributionMethod;
use crate::export::archive::BundleTarget;
use std::collections::BTreeMap;

/// Operator and archive inputs steering resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolutionRequest {
    pub method: DistributionMethod,
    pub team_id: Option<String>,
    /// Whether the archive's embedded profile is Xcode managed.
    pub archive_managed: bool,
    /// Name of the fallback profile, when one could be fetched.
    pub default_profile_name: Option<String>,
}

impl ResolutionRequest {
    pub fn new(method: DistributionMethod) -> Self {
        Self {
            method,
            team_id: None,
            archive_managed: false,
            default_profile_name: None,
        }
    }
}

/// Outcome of a resolution run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// `None` when no group qualified.
    pub group: Option<ResolvedGroup>,
    pub report: ResolutionReport,
}

/// Selects one certificate and one profile per bundle target.
///
/// # Examples
///
/// ```
/// use xcarchive_export::export::DistributionMethod;
/// use xcarchive_export::export::codesign::{CodeSignGroupResolver, ResolutionRequest};
///
/// let resolver = CodeSignGroupResolver::new(&[], &[], &[]);
/// let resolution = resolver.resolve(&ResolutionRequest::new(DistributionMethod::AppStore));
/// assert!(resolution.group.is_none());
/// ```
#[derive(Debug)]
pub struct CodeSignGroupResolver {
    certificates: Vec<Certificate>,
    profiles: Vec<ProvisioningProfile>,
    targets: Vec<BundleTarget>,
}

impl CodeSignGroupResolver {
    /// Creates a resolver; input order does not influence the result.
    pub fn new(
        certificates: &[Certificate],
        profiles: &[ProvisioningProfile],
        targets: &[BundleTarget],
    ) -> Self {
        let (certificates, profiles) = pin_order(certificates, profiles);
        Self {
            certificates,
            profiles,
            targets: targets.to_vec(),
        }
    }

    /// Runs the full pipeline.
    pub fn resolve(&self, request: &ResolutionRequest) -> Resolution {
        let mut report = ResolutionReport::default();

        let mut groups = seed_groups(&self.certificates, &self.profiles, &self.targets);
        report.record(
            ResolutionStep::Seed,
            self.certificates.len(),
            groups.len(),
            StepOutcome::Applied,
            format!(
                "{} certificate(s), {} profile(s), {} target(s)",
                self.certificates.len(),
                self.profiles.len(),
                self.targets.len()
            ),
        );

        for stage in self.stages(request) {
            groups = match stage {
                Stage::Run(filter) => run_filter(filter.as_ref(), groups, &mut report),
                Stage::NotApplicable(step, reason) => {
                    report.record(step, groups.len(), groups.len(), StepOutcome::NotApplicable, reason);
                    groups
                }
            };
        }

        let resolved = narrow_profiles(&groups, &mut report);
        let group = select(resolved, request, &mut report);

        Resolution { group, report }
    }

    fn stages(&self, request: &ResolutionRequest) -> Vec<Stage> {
        let entitlements = self
            .targets
            .iter()
            .map(|t| (t.bundle_id.clone(), t.entitlement_keys.clone()))
            .collect::<BTreeMap<_, _>>();

        let team = match &request.team_id {
            Some(team_id) => Stage::Run(Box::new(TeamFilter::new(team_id.clone()))),
            None => Stage::NotApplicable(ResolutionStep::Team, "no team id supplied"),
        };

        let origin = if request.archive_managed {
            Stage::NotApplicable(
                ResolutionStep::ArchiveOrigin,
                "archive was signed with a managed profile; any profile may re-sign it",
            )
        } else {
            Stage::Run(Box::new(NotManagedFilter))
        };

        let default_profile = match (&request.team_id, &request.default_profile_name) {
            (None, Some(name)) => Stage::Run(Box::new(ExcludeProfileNameFilter::new(name.clone()))),
            (Some(_), _) => Stage::NotApplicable(ResolutionStep::DefaultProfile, "team id supplied"),
            (None, None) => {
                Stage::NotApplicable(ResolutionStep::DefaultProfile, "no default profile available")
            }
        };

        vec![
            Stage::Run(Box::new(EntitlementsFilter::new(entitlements))),
            Stage::Run(Box::new(ExportMethodFilter::new(request.method))),
            team,
            origin,
            default_profile,
        ]
    }
}

enum Stage {
    Run(Box<dyn GroupFilter>),
    NotApplicable(ResolutionStep, &'static str),
}

fn run_filter(
    filter: &dyn GroupFilter,
    groups: Vec<SelectableGroup>,
    report: &mut ResolutionReport,
) -> Vec<SelectableGroup> {
    let before = groups.len();
    let filtered: Vec<SelectableGroup> = groups.iter().filter_map(|g| filter.apply(g)).collect();

    if filtered.is_empty() && before > 0 && filter.skippable() {
        report.record(
            filter.step(),
            before,
            before,
            StepOutcome::Skipped,
            filter.describe(),
        );
        report.diagnose(
            DiagnosticKind::StepSkipped,
            format!(
                "No signing group satisfies the {} filter ({}); ignoring it",
                filter.step(),
                filter.describe()
            ),
        );
        return groups;
    }

    report.record(
        filter.step(),
        before,
        filtered.len(),
        StepOutcome::Applied,
        filter.describe(),
    );
    filtered
}

/// A resolved group plus the targets it could not cover.
struct Narrowed {
    group: ResolvedGroup,
    uncovered: Vec<String>,
}

fn narrow_profiles(groups: &[SelectableGroup], report: &mut ResolutionReport) -> Vec<Narrowed> {
    let narrowed: Vec<Narrowed> = groups
        .iter()
        .map(|group| {
            let mut profiles = BTreeMap::new();
            let mut uncovered = Vec::new();
            for (bundle_id, candidates) in &group.profiles {
                match candidates.first() {
                    Some(profile) => {
                        profiles.insert(bundle_id.clone(), profile.clone());
                    }
                    None => uncovered.push(bundle_id.clone()),
                }
            }
            Narrowed {
                group: ResolvedGroup {
                    certificate: group.certificate.clone(),
                    profiles,
                },
                uncovered,
            }
        })
        .collect();

    report.record(
        ResolutionStep::ProfileNarrowing,
        groups.len(),
        narrowed.len(),
        StepOutcome::Applied,
        "first candidate profile per target",
    );
    narrowed
}

fn select(
    narrowed: Vec<Narrowed>,
    request: &ResolutionRequest,
    report: &mut ResolutionReport,
) -> Option<ResolvedGroup> {
    let count = narrowed.len();
    let selected = narrowed.into_iter().next();

    match &selected {
        None => report.diagnose(
            DiagnosticKind::Empty,
            format!(
                "Failed to find a code signing group for {} export; signing is left to xcodebuild",
                request.method
            ),
        ),
        Some(Narrowed { group, uncovered }) => {
            for bundle_id in uncovered {
                report.diagnose(
                    DiagnosticKind::UncoveredTarget,
                    format!("No profile available to sign ({}) target", bundle_id),
                );
            }
            if count > 1 {
                report.diagnose(
                    DiagnosticKind::Ambiguous,
                    format!(
                        "{} code signing groups qualify; using the one for certificate {}",
                        count, group.certificate.common_name
                    ),
                );
            }
            if group.has_mixed_management() {
                report.diagnose(
                    DiagnosticKind::MixedManagement,
                    "Both Xcode managed and non-managed profiles in the selected code signing group",
                );
            }
        }
    }

    report.record(
        ResolutionStep::FinalSelection,
        count,
        usize::from(selected.is_some()),
        StepOutcome::Applied,
        "first group in enumeration order",
    );
    selected.map(|narrowed| narrowed.group)
}
