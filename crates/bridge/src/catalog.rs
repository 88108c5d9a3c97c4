//! The tool catalog: one entry per CRM operation.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use crm::{CampaignStatus, CrmClient};
use rmcp::model::Tool;
use serde_json::Value;

use crate::args::Args;
use crate::schema::{Field, FieldKind, to_json_schema};
use crate::{Error, Result};

/// Future returned by a tool handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Pulls typed arguments out of `Args` and calls exactly one client method.
pub type Handler = fn(CrmClient, Args) -> HandlerFuture;

/// Groups tools by the CRM entity they touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Contacts,
    Tags,
    Lists,
    Campaigns,
    Templates,
    Automations,
    Webhooks,
    SmartLinks,
    Reports,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Contacts,
        Category::Tags,
        Category::Lists,
        Category::Campaigns,
        Category::Templates,
        Category::Automations,
        Category::Webhooks,
        Category::SmartLinks,
        Category::Reports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Tags => "tags",
            Self::Lists => "lists",
            Self::Campaigns => "campaigns",
            Self::Templates => "templates",
            Self::Automations => "automations",
            Self::Webhooks => "webhooks",
            Self::SmartLinks => "smart-links",
            Self::Reports => "reports",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown category {s:?} (expected one of: {})", known.join(", "))
            })
    }
}

/// A registered tool: descriptor data plus its handler.
#[derive(Clone)]
pub struct ToolEntry {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub fields: Vec<Field>,
    pub handler: Handler,
}

impl ToolEntry {
    /// Descriptor advertised in `tools/list`.
    pub fn descriptor(&self) -> Tool {
        Tool::new(self.name, self.description, to_json_schema(&self.fields))
    }
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

fn boxed<F>(future: F) -> HandlerFuture
where
    F: Future<Output = Result<Value>> + Send + 'static,
{
    Box::pin(future)
}

fn page_fields() -> Vec<Field> {
    vec![
        Field::optional("page", FieldKind::Integer, "Page number, starting at 1"),
        Field::optional("perPage", FieldKind::Integer, "Results per page"),
    ]
}

fn with_paging(mut fields: Vec<Field>) -> Vec<Field> {
    fields.extend(page_fields());
    fields
}

fn id_field(what: &'static str) -> Field {
    Field::required("id", FieldKind::Integer, what)
}

const CONTACT_STATUSES: &[&str] = &["subscribed", "unsubscribed", "bounced", "pending"];

fn contact_fields(email_required: bool) -> Vec<Field> {
    let email = if email_required {
        Field::required("email", FieldKind::String, "Email address")
    } else {
        Field::optional("email", FieldKind::String, "Email address")
    };
    vec![
        email,
        Field::optional("firstName", FieldKind::String, "First name"),
        Field::optional("lastName", FieldKind::String, "Last name"),
        Field::optional("phone", FieldKind::String, "Phone number"),
        Field::optional("status", FieldKind::String, "Subscription status")
            .one_of(CONTACT_STATUSES),
        Field::optional("fields", FieldKind::Object, "Custom field values keyed by field slug"),
        Field::optional("tagIds", FieldKind::Array, "Tag IDs to apply").of(FieldKind::Integer),
        Field::optional("listIds", FieldKind::Array, "List IDs to join").of(FieldKind::Integer),
    ]
}

fn campaign_fields(create: bool) -> Vec<Field> {
    let (name, subject) = if create {
        (
            Field::required("name", FieldKind::String, "Internal campaign name"),
            Field::required("subject", FieldKind::String, "Email subject line"),
        )
    } else {
        (
            Field::optional("name", FieldKind::String, "Internal campaign name"),
            Field::optional("subject", FieldKind::String, "Email subject line"),
        )
    };
    vec![
        name,
        subject,
        Field::optional("templateId", FieldKind::Integer, "Email template to send"),
        Field::optional("listIds", FieldKind::Array, "Recipient list IDs").of(FieldKind::Integer),
        Field::optional("fromName", FieldKind::String, "Sender name"),
        Field::optional("fromEmail", FieldKind::String, "Sender address"),
        Field::optional("scheduledAt", FieldKind::String, "ISO 8601 send time"),
    ]
}

/// Every tool, in listing order.
pub fn catalog() -> Vec<ToolEntry> {
    let mut entries = Vec::new();
    entries.extend(contacts());
    entries.extend(tags());
    entries.extend(lists());
    entries.extend(campaigns());
    entries.extend(content());
    entries.extend(smart_links());
    entries.extend(reports());
    entries
}

fn contacts() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "crm_list_contacts",
            category: Category::Contacts,
            description: "List contacts (subscribers), optionally filtered by status",
            fields: with_paging(vec![
                Field::optional("status", FieldKind::String, "Only contacts with this status")
                    .one_of(CONTACT_STATUSES),
            ]),
            handler: |client, args| {
                boxed(async move { Ok(client.list_contacts(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_get_contact",
            category: Category::Contacts,
            description: "Get a single contact by ID",
            fields: vec![id_field("Contact ID")],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.get_contact(id).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_create_contact",
            category: Category::Contacts,
            description: "Create a contact",
            fields: contact_fields(true),
            handler: |client, args| {
                boxed(async move { Ok(client.create_contact(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_update_contact",
            category: Category::Contacts,
            description: "Update a contact's details; omitted fields are left unchanged",
            fields: {
                let mut fields = vec![id_field("Contact ID")];
                fields.extend(contact_fields(false));
                fields
            },
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.update_contact(id, args.into_body()).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_delete_contact",
            category: Category::Contacts,
            description: "Delete a contact",
            fields: vec![id_field("Contact ID")],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.delete_contact(id).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_search_contacts",
            category: Category::Contacts,
            description: "Search contacts by email, name or phone",
            fields: with_paging(vec![Field::required(
                "query",
                FieldKind::String,
                "Text to match against email, name and phone",
            )]),
            handler: |client, mut args| {
                boxed(async move {
                    let term = args.take_str("query")?;
                    Ok(client.search_contacts(&term, args.into_query()).await?)
                })
            },
        },
    ]
}

fn tags() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "crm_list_tags",
            category: Category::Tags,
            description: "List all tags",
            fields: page_fields(),
            handler: |client, args| {
                boxed(async move { Ok(client.list_tags(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_create_tag",
            category: Category::Tags,
            description: "Create a tag",
            fields: vec![
                Field::required("name", FieldKind::String, "Tag name"),
                Field::optional("color", FieldKind::String, "Display color, e.g. #ff8800"),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.create_tag(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_update_tag",
            category: Category::Tags,
            description: "Rename or recolor a tag",
            fields: vec![
                id_field("Tag ID"),
                Field::optional("name", FieldKind::String, "New tag name"),
                Field::optional("color", FieldKind::String, "New display color"),
            ],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.update_tag(id, args.into_body()).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_delete_tag",
            category: Category::Tags,
            description: "Delete a tag",
            fields: vec![id_field("Tag ID")],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.delete_tag(id).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_attach_tags_to_contact",
            category: Category::Tags,
            description: "Apply one or more tags to a contact",
            fields: vec![
                Field::required("subscriberId", FieldKind::Integer, "Contact ID"),
                Field::required("tagIds", FieldKind::Array, "Tag IDs to apply")
                    .of(FieldKind::Integer),
            ],
            handler: |client, mut args| {
                boxed(async move {
                    let contact = args.take_id("subscriberId")?;
                    let tag_ids = args.take_ids("tagIds")?;
                    Ok(client.attach_tags(contact, &tag_ids).await?)
                })
            },
        },
    ]
}

fn lists() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "crm_list_lists",
            category: Category::Lists,
            description: "List all mailing lists",
            fields: page_fields(),
            handler: |client, args| {
                boxed(async move { Ok(client.list_lists(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_create_list",
            category: Category::Lists,
            description: "Create a mailing list",
            fields: vec![
                Field::required("name", FieldKind::String, "List name"),
                Field::optional("description", FieldKind::String, "What the list is for"),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.create_list(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_update_list",
            category: Category::Lists,
            description: "Rename a mailing list or change its description",
            fields: vec![
                id_field("List ID"),
                Field::optional("name", FieldKind::String, "New list name"),
                Field::optional("description", FieldKind::String, "New description"),
            ],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.update_list(id, args.into_body()).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_delete_list",
            category: Category::Lists,
            description: "Delete a mailing list",
            fields: vec![id_field("List ID")],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.delete_list(id).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_attach_lists_to_contact",
            category: Category::Lists,
            description: "Add a contact to one or more mailing lists",
            fields: vec![
                Field::required("subscriberId", FieldKind::Integer, "Contact ID"),
                Field::required("listIds", FieldKind::Array, "List IDs to join")
                    .of(FieldKind::Integer),
            ],
            handler: |client, mut args| {
                boxed(async move {
                    let contact = args.take_id("subscriberId")?;
                    let list_ids = args.take_ids("listIds")?;
                    Ok(client.attach_lists(contact, &list_ids).await?)
                })
            },
        },
    ]
}

fn campaigns() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "crm_list_campaigns",
            category: Category::Campaigns,
            description: "List email campaigns",
            fields: with_paging(vec![
                Field::optional("status", FieldKind::String, "Only campaigns with this status")
                    .one_of(&["draft", "scheduled", "active", "paused", "sent"]),
            ]),
            handler: |client, args| {
                boxed(async move { Ok(client.list_campaigns(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_create_campaign",
            category: Category::Campaigns,
            description: "Create an email campaign",
            fields: campaign_fields(true),
            handler: |client, args| {
                boxed(async move { Ok(client.create_campaign(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_update_campaign",
            category: Category::Campaigns,
            description: "Update a campaign's content, recipients or schedule",
            fields: {
                let mut fields = vec![id_field("Campaign ID")];
                fields.extend(campaign_fields(false));
                fields
            },
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.update_campaign(id, args.into_body()).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_set_campaign_status",
            category: Category::Campaigns,
            description: "Pause or resume a campaign",
            fields: vec![
                id_field("Campaign ID"),
                Field::required("status", FieldKind::String, "paused to pause, active to resume")
                    .one_of(&["paused", "active"]),
            ],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    let status: CampaignStatus =
                        args.take_str("status")?.parse().map_err(Error::invalid)?;
                    Ok(client.set_campaign_status(id, status).await?)
                })
            },
        },
    ]
}

/// Templates, automations and webhooks: list and create only.
fn content() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "crm_list_templates",
            category: Category::Templates,
            description: "List email templates",
            fields: page_fields(),
            handler: |client, args| {
                boxed(async move { Ok(client.list_templates(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_create_template",
            category: Category::Templates,
            description: "Create an email template",
            fields: vec![
                Field::required("name", FieldKind::String, "Template name"),
                Field::required("html", FieldKind::String, "HTML body"),
                Field::optional("subject", FieldKind::String, "Default subject line"),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.create_template(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_list_automations",
            category: Category::Automations,
            description: "List automations (funnels)",
            fields: page_fields(),
            handler: |client, args| {
                boxed(async move { Ok(client.list_automations(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_create_automation",
            category: Category::Automations,
            description: "Create an automation (funnel)",
            fields: vec![
                Field::required("name", FieldKind::String, "Automation name"),
                Field::optional("trigger", FieldKind::String, "Event that starts the automation"),
                Field::optional("steps", FieldKind::Array, "Ordered step definitions")
                    .of(FieldKind::Object),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.create_automation(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_list_webhooks",
            category: Category::Webhooks,
            description: "List registered webhooks",
            fields: Vec::new(),
            handler: |client, args| {
                boxed(async move { Ok(client.list_webhooks(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_create_webhook",
            category: Category::Webhooks,
            description: "Register a webhook",
            fields: vec![
                Field::required("url", FieldKind::String, "Endpoint that receives events"),
                Field::optional("events", FieldKind::Array, "Event names to subscribe to")
                    .of(FieldKind::String),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.create_webhook(args.into_body()).await?) })
            },
        },
    ]
}

fn smart_links() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "crm_list_smart_links",
            category: Category::SmartLinks,
            description: "List smart links",
            fields: page_fields(),
            handler: |client, args| {
                boxed(async move { Ok(client.list_smart_links(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_get_smart_link",
            category: Category::SmartLinks,
            description: "Get a smart link by ID",
            fields: vec![id_field("Smart link ID")],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.get_smart_link(id).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_create_smart_link",
            category: Category::SmartLinks,
            description: "Create a smart link",
            fields: vec![
                Field::required("url", FieldKind::String, "Destination URL"),
                Field::optional("title", FieldKind::String, "Link title"),
                Field::optional("shortcode", FieldKind::String, "Custom shortcode"),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.create_smart_link(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_update_smart_link",
            category: Category::SmartLinks,
            description: "Update a smart link",
            fields: vec![
                id_field("Smart link ID"),
                Field::optional("url", FieldKind::String, "New destination URL"),
                Field::optional("title", FieldKind::String, "New title"),
            ],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.update_smart_link(id, args.into_body()).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_delete_smart_link",
            category: Category::SmartLinks,
            description: "Delete a smart link",
            fields: vec![id_field("Smart link ID")],
            handler: |client, mut args| {
                boxed(async move {
                    let id = args.take_id("id")?;
                    Ok(client.delete_smart_link(id).await?)
                })
            },
        },
        ToolEntry {
            name: "crm_generate_smart_link_shortcode",
            category: Category::SmartLinks,
            description: "Generate an unused shortcode for a destination URL",
            fields: vec![
                Field::required("url", FieldKind::String, "Destination URL"),
                Field::optional("length", FieldKind::Integer, "Shortcode length"),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.generate_shortcode(args.into_body()).await?) })
            },
        },
        ToolEntry {
            name: "crm_validate_smart_link_url",
            category: Category::SmartLinks,
            description: "Check that a URL is acceptable as a smart link destination",
            fields: vec![Field::required("url", FieldKind::String, "URL to check")],
            handler: |client, args| {
                boxed(async move { Ok(client.validate_url(args.into_body()).await?) })
            },
        },
    ]
}

fn reports() -> Vec<ToolEntry> {
    vec![
        ToolEntry {
            name: "crm_get_report_stats",
            category: Category::Reports,
            description: "Get account statistics: contacts, sends, opens and clicks",
            fields: vec![
                Field::optional("startDate", FieldKind::String, "Range start, YYYY-MM-DD"),
                Field::optional("endDate", FieldKind::String, "Range end, YYYY-MM-DD"),
                Field::optional("campaignId", FieldKind::Integer, "Limit to one campaign"),
            ],
            handler: |client, args| {
                boxed(async move { Ok(client.report_stats(args.into_query()).await?) })
            },
        },
        ToolEntry {
            name: "crm_list_custom_fields",
            category: Category::Reports,
            description: "List the custom contact fields defined in the account",
            fields: Vec::new(),
            handler: |client, args| {
                boxed(async move { Ok(client.custom_fields(args.into_query()).await?) })
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_parse_from_their_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        let err = "smart_links".parse::<Category>().unwrap_err();
        assert!(err.contains("smart-links"), "{err}");
    }

    #[test]
    fn descriptor_renders_the_schema() {
        let entry = catalog().into_iter().find(|e| e.name == "crm_get_contact").unwrap();
        let tool = entry.descriptor();
        assert_eq!(tool.name, "crm_get_contact");
        assert_eq!(tool.description.as_deref(), Some(entry.description));
        assert_eq!(tool.input_schema["required"], serde_json::json!(["id"]));
    }
}
