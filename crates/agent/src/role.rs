//! Role descriptors: the static table every Structured Agent is built from.
//!
//! A role is data, not code. Adding an agent means adding a row to
//! [`builtin_roles`]; the generic [`crate::StructuredAgent`] does the rest.

use crate::schema::{FieldSpec, OutputSchema};

/// Whether a role consults the Knowledge Store before calling the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grounding {
    None,
    /// Retrieve if possible; proceed without grounding if the store fails.
    Optional,
    /// Retrieval must succeed or the invocation fails.
    Required,
}

/// Immutable description of one agent role.
#[derive(Debug, Clone)]
pub struct AgentRole {
    pub name: String,

    /// One line shown to the Router when the role is exposed as a tool.
    pub description: String,

    /// Ordered directive strings making up the system prompt.
    pub instructions: Vec<String>,

    pub schema: Option<OutputSchema>,

    /// Side-effect capability names the role may use (e.g. `web_search`).
    pub capabilities: Vec<String>,

    pub grounding: Grounding,

    /// Model used when no override is configured.
    pub default_model: Option<String>,

    /// Exposed to the Router as a tool.
    pub routable: bool,
}

impl AgentRole {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: Vec::new(),
            schema: None,
            capabilities: Vec::new(),
            grounding: Grounding::None,
            default_model: None,
            routable: false,
        }
    }

    pub fn with_instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions = instructions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_capability(mut self, name: impl Into<String>) -> Self {
        self.capabilities.push(name.into());
        self
    }

    pub fn with_grounding(mut self, grounding: Grounding) -> Self {
        self.grounding = grounding;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn routable(mut self) -> Self {
        self.routable = true;
        self
    }

    pub fn allows(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// System prompt: the instructions, one per line, followed by the
    /// schema's format instructions when the role has one.
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.instructions.join("\n");
        if let Some(schema) = &self.schema {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str(&schema.prompt_instructions());
        }
        prompt
    }
}

/// The built-in roles, in the order the Router lists them.
pub fn builtin_roles() -> Vec<AgentRole> {
    vec![
        AgentRole::new(
            "content",
            "Write a short piece of content (social post, caption, article snippet) in the user's brand voice.",
        )
        .with_instructions([
            "You are an expert AI content creator and editor.",
            "Your goal is to produce high-quality text based on the user's request.",
            "Adapt your writing style to the user's voice as found in the knowledge base; when knowledge base context is present, prioritize it.",
            "Use the web_search tool if the user mentions recent events or facts you do not know.",
            "Return ONLY the generated content, ready to paste into the editor. No preamble such as 'Here is the post:'.",
            "Write in the same language as the request.",
        ])
        .with_capability("web_search")
        .with_grounding(Grounding::Optional)
        .with_default_model("gpt-4o-mini")
        .routable(),
        AgentRole::new(
            "analytics",
            "Research a market question or trend on the web and summarize the findings.",
        )
        .with_instructions([
            "You are a data analyst and market researcher.",
            "You verify facts on the web and analyze metrics.",
            "When asked about trends, search the web first.",
            "Provide concise summaries of your findings.",
        ])
        .with_capability("web_search")
        .with_default_model("gpt-4o-mini")
        .routable(),
        AgentRole::new(
            "ugc",
            "Write a short-form UGC video script (TikTok/Reels) with a hook and scenes.",
        )
        .with_instructions([
            "You are a world-class viral scriptwriter for TikTok and Reels.",
            "Your goal is to create highly engaging, authentic UGC (user-generated content) scripts.",
            "You may receive a product name, audience, expert persona and video style.",
            "Keep it conversational and avoid marketing jargon. Focus on emotions and benefits.",
            "Use the visual field for direction on camera angles, lighting and movement.",
        ])
        .with_schema(ugc_schema())
        .with_default_model("gpt-4o")
        .routable(),
        AgentRole::new(
            "static_ad",
            "Write copy for a single static ad (headline, body, call to action, image idea).",
        )
        .with_instructions([
            "You are a high-converting static ad copywriter.",
            "Your goal is impactful copy for visual ads (banners, Instagram and Facebook feed).",
            "You may receive a product name, target audience and an offer or objective.",
            "Keep the tone consistent with the brand but focused on performance and conversion.",
            "The image suggestion must be descriptive enough for a designer or an AI image generator.",
        ])
        .with_schema(static_ad_schema())
        .with_default_model("gpt-4o")
        .routable(),
        AgentRole::new(
            "email",
            "Write one marketing email (subject line, preheader, body, button text).",
        )
        .with_instructions([
            "You are an expert email marketing copywriter.",
            "Your goal is engaging emails that get opened and clicked.",
            "You may receive an email objective (welcome, sales, nurture), target audience and product context.",
            "Focus on storytelling and one clear call to action per email.",
            "Keep the tone personal and direct, as if writing to a friend.",
        ])
        .with_schema(email_schema())
        .with_default_model("gpt-4o")
        .routable(),
        AgentRole::new(
            "message",
            "Write short direct-message variations for WhatsApp, DM or SMS.",
        )
        .with_instructions([
            "You are an expert in conversational marketing and sales scripts.",
            "Your goal is short, conversational messages for WhatsApp, DM or SMS.",
            "You may receive a context or objective (cold outreach, follow-up, recovery) and a tone of voice.",
            "Write three variations: a direct approach, a soft approach and an urgency approach.",
            "Messages must be ready to send. Avoid placeholders like '[Insert Name]' unless absolutely necessary.",
            "Use emojis where appropriate, but do not overdo it.",
        ])
        .with_schema(message_schema())
        .with_default_model("gpt-4o")
        .routable(),
        AgentRole::new(
            "brain",
            "Answer questions from the company's uploaded documents.",
        )
        .with_instructions([
            "You are the Brain of the company. You have access to all internal documents.",
            "Always rely on the knowledge base first.",
            "If the answer is found in the documents, cite the source.",
            "If it is not found, use your general knowledge but say so.",
        ])
        .with_grounding(Grounding::Required)
        .with_default_model("gpt-4o"),
    ]
}

pub fn ugc_schema() -> OutputSchema {
    OutputSchema::new(
        "ugc_script",
        vec![
            FieldSpec::text("title", "Catchy title"),
            FieldSpec::text("hook", "The first line that grabs attention"),
            FieldSpec::list(
                "scenes",
                vec![
                    FieldSpec::text("visual", "Description of what is seen"),
                    FieldSpec::text("audio", "What is said"),
                ],
            ),
        ],
    )
}

pub fn static_ad_schema() -> OutputSchema {
    OutputSchema::new(
        "static_ad",
        vec![
            FieldSpec::text("headline", "Attention-grabbing headline (max 50 chars)"),
            FieldSpec::text("body", "Persuasive, benefit-focused text (max 280 chars)"),
            FieldSpec::text("cta", "Strong call to action"),
            FieldSpec::text("image_suggestion", "Detailed description of the visual for this copy"),
        ],
    )
}

pub fn email_schema() -> OutputSchema {
    OutputSchema::new(
        "email",
        vec![
            FieldSpec::text("subject_line", "Subject line with a high open rate"),
            FieldSpec::text("preheader", "Preview text shown in the inbox"),
            FieldSpec::text(
                "body_content",
                "The full email body in Markdown, with paragraphs, bullet points and bold for readability",
            ),
            FieldSpec::text("cta_button", "Text for the main button"),
        ],
    )
}

pub fn message_schema() -> OutputSchema {
    OutputSchema::new(
        "message_variations",
        vec![FieldSpec::list(
            "variations",
            vec![
                FieldSpec::text("label", "Direct approach"),
                FieldSpec::text("text", "The actual message content"),
            ],
        )],
    )
}

/// Platform knowledge given to the Router's classification call.
pub const PLATFORM_PROMPT: &str = r#"You are Aura, the assistant of the Aura AI marketing platform.

Platform areas:
- /dashboard: overview and stats
- /dashboard/brain: upload documents so the AI learns the brand voice
- /dashboard/generator/ugc: UGC video script generator
- /dashboard/generator/static: static ad generator
- /dashboard/generator/email: email generator and email sequences
- /dashboard/generator/messages: WhatsApp/DM message generator
- /dashboard/campaigns: multi-channel campaigns
- /dashboard/products, /dashboard/audiences, /dashboard/experts: brand assets
- /dashboard/analytics: performance analytics
- /dashboard/editor: content editor
- /dashboard/copy-center, /dashboard/my-copies: saved copies
- /dashboard/settings: account settings

Decide how to handle each message:
1. QUICK TASK (one post, one caption, one ad, one email, a few messages, a quick research question): call exactly ONE of the available tools with a self-contained prompt that keeps every detail the user gave, in the user's language.
2. COMPLEX WORK (full campaigns, sequences of several emails, multi-step projects, or work that needs a dedicated generator or area): reply with ONLY this JSON object and nothing before or after it:
{"type":"action","action":"navigate","path":"<one of the paths above>","message":"<short explanation in the user's language>"}
3. Anything else (greetings, questions about the platform): answer directly in plain text, in the user's language.

Never call more than one tool."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_is_complete() {
        let roles = builtin_roles();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["content", "analytics", "ugc", "static_ad", "email", "message", "brain"]
        );

        let routable: Vec<&str> = roles
            .iter()
            .filter(|r| r.routable)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(routable.len(), 6);
        assert!(!routable.contains(&"brain"));
    }

    #[test]
    fn grounding_and_capabilities() {
        let roles = builtin_roles();
        let get = |n: &str| roles.iter().find(|r| r.name == n).unwrap();

        assert_eq!(get("content").grounding, Grounding::Optional);
        assert!(get("content").allows("web_search"));
        assert_eq!(get("brain").grounding, Grounding::Required);
        assert!(!get("email").allows("web_search"));
        assert!(get("email").schema.is_some());
        assert!(get("analytics").schema.is_none());
    }

    #[test]
    fn system_prompt_appends_schema() {
        let role = AgentRole::new("static_ad", "ads")
            .with_instructions(["Be bold."])
            .with_schema(static_ad_schema());
        let prompt = role.system_prompt();
        assert!(prompt.starts_with("Be bold.\n\n"));
        assert!(prompt.contains("\"image_suggestion\""));
    }

    #[test]
    fn platform_prompt_names_navigation_paths() {
        assert!(PLATFORM_PROMPT.contains("/dashboard/generator/email"));
        assert!(PLATFORM_PROMPT.contains(r#""action":"navigate""#));
    }
}
