//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod entitlement;
mod group;
mod organization;
mod pagination;
mod resource;
mod role;

pub use entitlement::{
    Entitlement, EntitlementKind, Grant, ORG_MEMBERSHIP_SLUG, OrgEntitlement,
};
pub use group::{Group, GroupMember, GroupMemberOrg, GroupRole};
pub use organization::{OrgMember, Organization};
pub use pagination::{PageBag, PageState, parse_link_header, parse_page_token};
pub use resource::{Resource, ResourceId, ResourceTrait, ResourceType};
pub use role::{MINIMAL_ROLE_SLUG, Role, RoleScope, ScopedRole, classify_role_name};
