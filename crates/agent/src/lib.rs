//! Agents for Aura: the role table, the generic Structured Agent, the
//! Tool Registry and the Router.
//!
//! A request to `/api/chat` goes through the [`Router`], which classifies
//! it with one model call and then answers directly, redirects the user,
//! or delegates to exactly one agent via the [`ToolRegistry`]. The
//! per-agent endpoints call a [`StructuredAgent`] directly.

pub mod registry;
pub mod role;
pub mod router;
pub mod schema;
pub mod setup;
pub mod structured;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use registry::{AgentInvocation, DispatchError, ToolDescriptor, ToolRegistry};
pub use role::{AgentRole, Grounding, PLATFORM_PROMPT, builtin_roles};
pub use router::{RouteState, Router, RoutingError, UNKNOWN_TOOL_APOLOGY};
pub use schema::{FieldKind, FieldSpec, OutputSchema, strip_code_fences};
pub use setup::AgentSet;
pub use structured::{AgentError, InvocationContext, StructuredAgent};
