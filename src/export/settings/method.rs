//! Distribution method and product variant enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the exported package may be installed.
///
/// The string forms are the ones `xcodebuild` expects in the `method` key of
/// an export options property list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistributionMethod {
    /// Installable on registered development devices.
    #[serde(rename = "development")]
    Development,
    /// Installable on registered devices outside development.
    #[serde(rename = "ad-hoc")]
    AdHoc,
    /// In-house enterprise distribution.
    #[serde(rename = "enterprise")]
    Enterprise,
    /// App Store / TestFlight upload.
    #[serde(rename = "app-store")]
    AppStore,
}

impl DistributionMethod {
    /// All methods, in the order they are listed to operators.
    pub const ALL: [DistributionMethod; 4] = [
        DistributionMethod::Development,
        DistributionMethod::AdHoc,
        DistributionMethod::Enterprise,
        DistributionMethod::AppStore,
    ];

    /// The `xcodebuild` spelling of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::AdHoc => "ad-hoc",
            Self::Enterprise => "enterprise",
            Self::AppStore => "app-store",
        }
    }
}

impl fmt::Display for DistributionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown distribution method '{}' (expected one of: {})",
                    s,
                    Self::ALL.map(|m| m.as_str()).join(", ")
                )
            })
    }
}

/// The operator's method choice: a fixed method, or the method of the
/// profile the archive was signed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum MethodSelection {
    AutoDetect,
    Fixed(DistributionMethod),
}

impl MethodSelection {
    const AUTO_DETECT: &'static str = "auto-detect";

    /// The fixed method, or `detected` when auto-detecting.
    pub fn resolve(self, detected: DistributionMethod) -> DistributionMethod {
        match self {
            Self::AutoDetect => detected,
            Self::Fixed(method) => method,
        }
    }
}

impl From<DistributionMethod> for MethodSelection {
    fn from(method: DistributionMethod) -> Self {
        Self::Fixed(method)
    }
}

impl fmt::Display for MethodSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoDetect => f.write_str(Self::AUTO_DETECT),
            Self::Fixed(method) => fmt::Display::fmt(method, f),
        }
    }
}

impl FromStr for MethodSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::AUTO_DETECT {
            return Ok(Self::AutoDetect);
        }
        s.parse::<DistributionMethod>().map(Self::Fixed).map_err(|_| {
            format!(
                "unknown distribution method '{}' (expected one of: {}, {})",
                s,
                DistributionMethod::ALL.map(|m| m.as_str()).join(", "),
                Self::AUTO_DETECT
            )
        })
    }
}

impl TryFrom<String> for MethodSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which application inside the archive is being distributed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportProduct {
    /// The main application.
    #[default]
    #[serde(rename = "app")]
    App,
    /// The App Clip embedded in the main application.
    #[serde(rename = "app-clip")]
    AppClip,
}

impl ExportProduct {
    /// Lowest `xcodebuild` major version able to export this product.
    pub fn min_xcodebuild_major(&self) -> u32 {
        match self {
            Self::App => 0,
            Self::AppClip => 12,
        }
    }

    /// The operator-facing spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::AppClip => "app-clip",
        }
    }
}

impl fmt::Display for ExportProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportProduct {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "app" => Ok(Self::App),
            "app-clip" => Ok(Self::AppClip),
            other => Err(format!(
                "unknown product '{}' (expected one of: app, app-clip)",
                other
            )),
        }
    }
}
