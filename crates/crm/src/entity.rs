//! CRM resource kinds and their base paths.

/// A CRM resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Contact,
    Tag,
    List,
    Campaign,
    Template,
    Automation,
    Webhook,
    SmartLink,
    Report,
}

impl Entity {
    pub const ALL: [Entity; 9] = [
        Entity::Contact,
        Entity::Tag,
        Entity::List,
        Entity::Campaign,
        Entity::Template,
        Entity::Automation,
        Entity::Webhook,
        Entity::SmartLink,
        Entity::Report,
    ];

    pub fn base_path(self) -> &'static str {
        match self {
            Self::Contact => "/subscribers",
            Self::Tag => "/tags",
            Self::List => "/lists",
            Self::Campaign => "/campaigns",
            Self::Template => "/email-templates",
            Self::Automation => "/funnels",
            Self::Webhook => "/webhook",
            Self::SmartLink => "/smart-links",
            Self::Report => "/reports",
        }
    }

    /// Base path followed by `suffix` (empty, `/{id}`, `/{id}/tags`, ...).
    pub fn path(self, suffix: &str) -> String {
        format!("{}{suffix}", self.base_path())
    }

    /// Whether a 404 from this entity's endpoints means "not shipped yet"
    /// rather than a real error.
    ///
    /// Only smart links qualify: the remote API documents them but does not
    /// serve them.
    pub fn degrades_on_not_found(self) -> bool {
        matches!(self, Self::SmartLink)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Contact => "contact",
            Self::Tag => "tag",
            Self::List => "list",
            Self::Campaign => "campaign",
            Self::Template => "template",
            Self::Automation => "automation",
            Self::Webhook => "webhook",
            Self::SmartLink => "smart-link",
            Self::Report => "report",
        };
        f.write_str(name)
    }
}
