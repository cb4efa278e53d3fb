//! Subscription plan entitlements.
//!
//! Each plan maps to a fixed [`PlanLimits`] record. Plan names coming from
//! the database or from billing webhooks are normalized (trimmed,
//! lower-cased); anything unrecognized resolves to [`Plan::Starter`].
//!
//! Feature checks are closed-world: a feature name that does not parse into
//! a [`Feature`] is denied.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Professional,
    Enterprise,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Professional => "professional",
            Plan::Enterprise => "enterprise",
        }
    }

    /// Resolve a free-form plan name, falling back to `Starter`.
    pub fn from_name(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or(Plan::Starter)
    }

    pub fn limits(self) -> PlanLimits {
        match self {
            Plan::Starter => STARTER,
            Plan::Professional => PROFESSIONAL,
            Plan::Enterprise => ENTERPRISE,
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starter" => Ok(Plan::Starter),
            "professional" => Ok(Plan::Professional),
            "enterprise" => Ok(Plan::Enterprise),
            other => Err(format!("Unknown plan '{other}'")),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean capabilities gated by plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    AiInsights,
    SecurityScan,
    ExitSurveys,
    ApiAccess,
    PrioritySupport,
    CustomBranding,
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai_insights" => Ok(Feature::AiInsights),
            "security_scan" => Ok(Feature::SecurityScan),
            "exit_surveys" => Ok(Feature::ExitSurveys),
            "api_access" => Ok(Feature::ApiAccess),
            "priority_support" => Ok(Feature::PrioritySupport),
            "custom_branding" => Ok(Feature::CustomBranding),
            other => Err(format!("Unknown feature '{other}'")),
        }
    }
}

/// Numeric caps and feature flags for one plan. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanLimits {
    pub max_users: Option<u32>,
    pub max_offboardings_per_month: Option<u32>,
    pub max_templates: Option<u32>,
    pub ai_insights: bool,
    pub security_scan: bool,
    pub exit_surveys: bool,
    pub api_access: bool,
    pub priority_support: bool,
    pub custom_branding: bool,
}

impl PlanLimits {
    pub fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::AiInsights => self.ai_insights,
            Feature::SecurityScan => self.security_scan,
            Feature::ExitSurveys => self.exit_surveys,
            Feature::ApiAccess => self.api_access,
            Feature::PrioritySupport => self.priority_support,
            Feature::CustomBranding => self.custom_branding,
        }
    }
}

const STARTER: PlanLimits = PlanLimits {
    max_users: Some(5),
    max_offboardings_per_month: Some(10),
    max_templates: Some(3),
    ai_insights: false,
    security_scan: false,
    exit_surveys: true,
    api_access: false,
    priority_support: false,
    custom_branding: false,
};

const PROFESSIONAL: PlanLimits = PlanLimits {
    max_users: Some(25),
    max_offboardings_per_month: Some(100),
    max_templates: Some(25),
    ai_insights: true,
    security_scan: true,
    exit_surveys: true,
    api_access: false,
    priority_support: true,
    custom_branding: false,
};

const ENTERPRISE: PlanLimits = PlanLimits {
    max_users: None,
    max_offboardings_per_month: None,
    max_templates: None,
    ai_insights: true,
    security_scan: true,
    exit_surveys: true,
    api_access: true,
    priority_support: true,
    custom_branding: true,
};

/// Limits for a stored plan name (`None` and unknown names resolve to starter).
pub fn limits_for(plan_name: Option<&str>) -> PlanLimits {
    Plan::from_name(plan_name).limits()
}

/// Whether the plan grants the named feature. Unknown feature names are denied.
pub fn has_feature(plan_name: Option<&str>, feature_name: &str) -> bool {
    match feature_name.parse::<Feature>() {
        Ok(feature) => limits_for(plan_name).allows(feature),
        Err(_) => false,
    }
}

/// Whether `current` more items fit under an optional cap.
pub fn within_limit(cap: Option<u32>, current: i64) -> bool {
    match cap {
        Some(max) => current < i64::from(max),
        None => true,
    }
}
