//! Closed vocabularies of the behavior contract.
//!
//! The `as_str()` values are wire tokens used by screen definitions; once
//! published, do not rename.

use serde::{Deserialize, Serialize};

/// Canonical `kind` tags.
pub const CANONICAL_KINDS: &[&str] = &["navigation", "mutation", "action", "interaction", "legacy"];

/// Prefix marking a legacy action name as a state mutation.
pub const STATE_ACTION_PREFIX: &str = "state:";

/// Key added to mutation args carrying the original legacy action name.
pub const LEGACY_ACTION_MARKER: &str = "_legacyAction";

/// Media action verbs executed by the contract executor.
pub const MEDIA_ACTION_VERBS: &[&str] = &["crop", "filter", "frame", "layout", "motion", "overlay"];

/// Domain for media actions that do not name one.
pub const DEFAULT_ACTION_DOMAIN: &str = "image";

/// Lifetime attached to mutations decoded from `state:` actions.
pub const DURABLE_LIFETIME: &str = "durable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationVerb {
    Go,
    Back,
    Open,
    Close,
    Route,
}

impl NavigationVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Back => "back",
            Self::Open => "open",
            Self::Close => "close",
            Self::Route => "route",
        }
    }

    pub fn all() -> &'static [NavigationVerb] {
        &[Self::Go, Self::Back, Self::Open, Self::Close, Self::Route]
    }

    /// Unknown tokens return `None`; callers decide the fallback.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|verb| verb.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionVerb {
    Tap,
    Double,
    Long,
    Drag,
    Scroll,
    Swipe,
}

impl InteractionVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Double => "double",
            Self::Long => "long",
            Self::Drag => "drag",
            Self::Scroll => "scroll",
            Self::Swipe => "swipe",
        }
    }

    pub fn all() -> &'static [InteractionVerb] {
        &[
            Self::Tap,
            Self::Double,
            Self::Long,
            Self::Drag,
            Self::Scroll,
            Self::Swipe,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|verb| verb.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationVerb {
    Update,
    Append,
    Replace,
    Clear,
}

impl MutationVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Append => "append",
            Self::Replace => "replace",
            Self::Clear => "clear",
        }
    }
}

/// One known `state:<suffix>` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSuffix {
    pub suffix: &'static str,
    pub verb: MutationVerb,
    pub scope: &'static str,
    /// Log intent the mutation is recorded under; `None` for `clear`,
    /// which truncates instead of appending.
    pub event: Option<&'static str>,
}

/// Known `state:` suffixes, in lookup order.
pub const STATE_SUFFIXES: &[StateSuffix] = &[
    StateSuffix {
        suffix: "journal.add",
        verb: MutationVerb::Append,
        scope: "journal",
        event: Some("journal.add"),
    },
    StateSuffix {
        suffix: "journal.set",
        verb: MutationVerb::Update,
        scope: "journal",
        event: Some("journal.set"),
    },
    StateSuffix {
        suffix: "update",
        verb: MutationVerb::Update,
        scope: "values",
        event: Some("state.update"),
    },
    StateSuffix {
        suffix: "currentView",
        verb: MutationVerb::Replace,
        scope: "view",
        event: Some("state:currentView"),
    },
    StateSuffix {
        suffix: "scan.result",
        verb: MutationVerb::Append,
        scope: "scans",
        event: Some("scan.result"),
    },
    StateSuffix {
        suffix: "scan.interpreted",
        verb: MutationVerb::Append,
        scope: "scans",
        event: Some("scan.interpreted"),
    },
    StateSuffix {
        suffix: "interaction.record",
        verb: MutationVerb::Append,
        scope: "interactions",
        event: Some("interaction.record"),
    },
    StateSuffix {
        suffix: "clear",
        verb: MutationVerb::Clear,
        scope: "log",
        event: None,
    },
];

pub fn state_suffix(suffix: &str) -> Option<&'static StateSuffix> {
    STATE_SUFFIXES.iter().find(|entry| entry.suffix == suffix)
}

pub fn is_media_action(name: &str) -> bool {
    MEDIA_ACTION_VERBS.contains(&name)
}

pub fn is_canonical_kind(kind: &str) -> bool {
    CANONICAL_KINDS.contains(&kind)
}
