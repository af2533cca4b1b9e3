use std::sync::Arc;

use snyk_sync_core::AppError;
use snyk_sync_domain::{
    Entitlement, EntitlementKind, Grant, PageBag, Resource, ResourceId, ResourceType,
};

use crate::test_support::{ApiCall, FakeSnykApi, org_member, organization, role};
use crate::{PageRequest, ResourceProvisioner, ResourceSyncer};

use super::{OrganizationSyncer, RevokePlan, plan_revoke};

fn group_id() -> ResourceId {
    ResourceId::new(ResourceType::Group, "g1")
}

fn org_resource() -> Resource {
    Resource::new(ResourceId::new(ResourceType::Organization, "o1"), "Payments")
        .with_parent(group_id())
}

fn user(id: &str) -> ResourceId {
    ResourceId::new(ResourceType::User, id)
}

fn standard_roles() -> Vec<snyk_sync_domain::Role> {
    vec![
        role("r1", "Org Admin"),
        role("r2", "Org Collaborator"),
        role("g1", "Group Admin"),
        role("r3", "Org Read Only"),
    ]
}

fn membership() -> Entitlement {
    Entitlement::assignment(org_resource().id().clone(), "member", "Payments member", "")
}

fn permission(role_id: &str) -> Entitlement {
    Entitlement::permission(org_resource().id().clone(), role_id, "", "")
}

fn syncer(api: &Arc<FakeSnykApi>) -> OrganizationSyncer {
    OrganizationSyncer::new(api.clone(), Vec::new())
}

#[tokio::test]
async fn grants_pair_membership_with_role_entitlement() {
    let api = Arc::new(
        FakeSnykApi::default()
            .with_roles(vec![role("r1", "Org Admin"), role("r2", "Org Collaborator")])
            .with_org_members("o1", vec![org_member("u1", "admin")]),
    );

    let grants = syncer(&api)
        .grants(&org_resource())
        .await
        .unwrap_or_else(|error| panic!("grants failed: {error}"));

    let ids: Vec<String> = grants.iter().map(Grant::id).collect();
    assert_eq!(ids, vec!["org:o1:member:user:u1", "org:o1:r1:user:u1"]);
    assert_eq!(
        api.calls().await,
        vec![ApiCall::ListOrgMembers("o1".to_owned()), ApiCall::ListRoles]
    );
}

#[tokio::test]
async fn grants_match_member_role_regardless_of_case() {
    let api = Arc::new(
        FakeSnykApi::default()
            .with_roles(vec![role("r1", "Org Admin"), role("r2", "Org Collaborator")])
            .with_org_members("o1", vec![org_member("u1", "Admin")]),
    );

    let grants = syncer(&api)
        .grants(&org_resource())
        .await
        .unwrap_or_else(|error| panic!("grants failed: {error}"));

    let ids: Vec<String> = grants.iter().map(Grant::id).collect();
    assert_eq!(ids, vec!["org:o1:member:user:u1", "org:o1:r1:user:u1"]);
}

#[tokio::test]
async fn grants_keep_membership_when_member_role_is_unknown() {
    let api = Arc::new(
        FakeSnykApi::default()
            .with_roles(standard_roles())
            .with_org_members(
                "o1",
                vec![org_member("u1", "custom"), org_member("u2", "collaborator")],
            ),
    );

    let grants = syncer(&api)
        .grants(&org_resource())
        .await
        .unwrap_or_else(|error| panic!("grants failed: {error}"));

    let ids: Vec<String> = grants.iter().map(Grant::id).collect();
    assert_eq!(
        ids,
        vec![
            "org:o1:member:user:u1",
            "org:o1:member:user:u2",
            "org:o1:r2:user:u2",
        ]
    );
}

#[tokio::test]
async fn entitlements_list_membership_then_org_roles() {
    let api = Arc::new(FakeSnykApi::default().with_roles(standard_roles()));

    let entitlements = syncer(&api)
        .entitlements(&org_resource())
        .await
        .unwrap_or_else(|error| panic!("entitlements failed: {error}"));

    let slugs: Vec<&str> = entitlements.iter().map(Entitlement::slug).collect();
    assert_eq!(slugs, vec!["member", "r1", "r2"]);
    assert_eq!(entitlements[0].kind(), EntitlementKind::Assignment);
    assert_eq!(entitlements[0].display_name(), "Payments member");
    assert_eq!(entitlements[1].kind(), EntitlementKind::Permission);
    assert_eq!(entitlements[1].display_name(), "Org Admin");
}

#[tokio::test]
async fn list_without_parent_is_empty() {
    let api = Arc::new(FakeSnykApi::default());

    let page = syncer(&api)
        .list(None, "")
        .await
        .unwrap_or_else(|error| panic!("list failed: {error}"));

    assert!(page.resources.is_empty());
    assert_eq!(page.next_page_token, "");
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn list_walks_pages_until_last_link() {
    let page_two = "https://api.example/v1/group/g1/orgs?perPage=50&page=2";
    let api = Arc::new(
        FakeSnykApi::default()
            .with_organization_page(
                None,
                vec![organization("o1", "Payments"), organization("o2", "Search")],
                &format!("<{page_two}>; rel=\"next\""),
            )
            .with_organization_page(
                Some(page_two),
                vec![organization("o3", "Billing")],
                "<https://api.example/v1/group/g1/orgs?perPage=50&page=2>; rel=\"last\"",
            ),
    );
    let syncer = syncer(&api);

    let first = syncer
        .list(Some(&group_id()), "")
        .await
        .unwrap_or_else(|error| panic!("first page failed: {error}"));
    assert_eq!(first.resources.len(), 2);
    assert!(!first.next_page_token.is_empty());
    assert_eq!(first.resources[0].parent_id(), Some(&group_id()));

    let second = syncer
        .list(Some(&group_id()), &first.next_page_token)
        .await
        .unwrap_or_else(|error| panic!("second page failed: {error}"));
    assert_eq!(second.resources.len(), 1);
    assert_eq!(second.next_page_token, "");

    assert_eq!(
        api.calls().await,
        vec![
            ApiCall::ListOrganizations(PageRequest::first(50)),
            ApiCall::ListOrganizations(PageRequest {
                page_url: Some(page_two.to_owned()),
                per_page: 50,
            }),
        ]
    );
}

#[tokio::test]
async fn list_resumes_identically_from_the_same_token() {
    let page_two = "https://api.example/v1/group/g1/orgs?page=2";
    let api = Arc::new(
        FakeSnykApi::default()
            .with_organization_page(
                None,
                vec![organization("o1", "Payments")],
                &format!("<{page_two}>; rel=\"next\""),
            )
            .with_organization_page(Some(page_two), vec![organization("o2", "Search")], ""),
    );
    let syncer = syncer(&api);
    let token = syncer
        .list(Some(&group_id()), "")
        .await
        .unwrap_or_else(|error| panic!("first page failed: {error}"))
        .next_page_token;

    let once = syncer
        .list(Some(&group_id()), &token)
        .await
        .unwrap_or_else(|error| panic!("resume failed: {error}"));
    let twice = syncer
        .list(Some(&group_id()), &token)
        .await
        .unwrap_or_else(|error| panic!("resume failed: {error}"));

    assert_eq!(once, twice);
    assert_eq!(once.next_page_token, "");
}

#[tokio::test]
async fn list_applies_org_allow_list() {
    let api = Arc::new(FakeSnykApi::default().with_organization_page(
        None,
        vec![organization("o1", "Payments"), organization("o2", "Search")],
        "",
    ));
    let syncer = OrganizationSyncer::new(api.clone(), vec!["o2".to_owned()]).with_page_size(10);

    let page = syncer
        .list(Some(&group_id()), "")
        .await
        .unwrap_or_else(|error| panic!("list failed: {error}"));

    assert_eq!(page.resources.len(), 1);
    assert_eq!(page.resources[0].id().resource(), "o2");
    assert_eq!(
        api.calls().await,
        vec![ApiCall::ListOrganizations(PageRequest::first(10))]
    );
}

#[tokio::test]
async fn list_rejects_corrupt_page_token() {
    let api = Arc::new(FakeSnykApi::default());

    let result = syncer(&api).list(Some(&group_id()), "%%corrupt%%").await;

    assert!(matches!(result, Err(AppError::Decode(_))));
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn first_page_token_keeps_the_org_frame() {
    let api = Arc::new(FakeSnykApi::default().with_organization_page(
        None,
        Vec::new(),
        "<https://api.example/v1/group/g1/orgs?page=2>",
    ));

    let page = syncer(&api)
        .list(Some(&group_id()), "")
        .await
        .unwrap_or_else(|error| panic!("list failed: {error}"));

    let bag = PageBag::unmarshal(&page.next_page_token).unwrap_or_else(|_| panic!("test"));
    assert_eq!(bag.depth(), 1);
    assert_eq!(
        bag.current().map(|state| state.resource_type()),
        Some(ResourceType::Organization)
    );
    assert_eq!(bag.page_token(), "https://api.example/v1/group/g1/orgs?page=2");
}

#[tokio::test]
async fn granting_membership_adds_member_as_collaborator() {
    let api = Arc::new(FakeSnykApi::default().with_roles(standard_roles()));
    let syncer = syncer(&api);

    syncer
        .grant(&user("u7"), &membership())
        .await
        .unwrap_or_else(|error| panic!("grant failed: {error}"));
    syncer
        .grant(&user("u7"), &permission("r1"))
        .await
        .unwrap_or_else(|error| panic!("grant failed: {error}"));

    assert_eq!(
        api.writes().await,
        vec![
            ApiCall::AddOrgMember {
                org_id: "o1".to_owned(),
                user_id: "u7".to_owned(),
            },
            ApiCall::UpdateOrgMemberRole {
                org_id: "o1".to_owned(),
                user_id: "u7".to_owned(),
                role_id: "r1".to_owned(),
            },
        ]
    );
    assert_eq!(api.org_member_role("o1", "u7").await.as_deref(), Some("admin"));
}

#[tokio::test]
async fn granting_membership_alone_leaves_collaborator_role() {
    let api = Arc::new(FakeSnykApi::default().with_roles(standard_roles()));

    syncer(&api)
        .grant(&user("u8"), &membership())
        .await
        .unwrap_or_else(|error| panic!("grant failed: {error}"));

    assert_eq!(
        api.org_member_role("o1", "u8").await.as_deref(),
        Some("collaborator")
    );
}

#[tokio::test]
async fn granting_vanished_role_fails_without_write() {
    let api = Arc::new(FakeSnykApi::default().with_roles(standard_roles()));

    let result = syncer(&api).grant(&user("u1"), &permission("r404")).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(api.writes().await.is_empty());
}

#[tokio::test]
async fn revoking_higher_role_downgrades_to_collaborator() {
    let api = Arc::new(
        FakeSnykApi::default()
            .with_roles(standard_roles())
            .with_org_members("o1", vec![org_member("u1", "admin")]),
    );

    syncer(&api)
        .revoke(&Grant::new(permission("r1"), user("u1")))
        .await
        .unwrap_or_else(|error| panic!("revoke failed: {error}"));

    assert_eq!(
        api.writes().await,
        vec![ApiCall::UpdateOrgMemberRole {
            org_id: "o1".to_owned(),
            user_id: "u1".to_owned(),
            role_id: "r2".to_owned(),
        }]
    );
    assert_eq!(
        api.org_member_role("o1", "u1").await.as_deref(),
        Some("collaborator")
    );
}

#[tokio::test]
async fn revoking_minimal_role_removes_membership() {
    let api = Arc::new(
        FakeSnykApi::default()
            .with_roles(standard_roles())
            .with_org_members("o1", vec![org_member("u1", "collaborator")]),
    );

    syncer(&api)
        .revoke(&Grant::new(permission("r2"), user("u1")))
        .await
        .unwrap_or_else(|error| panic!("revoke failed: {error}"));

    assert_eq!(
        api.writes().await,
        vec![ApiCall::RemoveOrgMember {
            org_id: "o1".to_owned(),
            user_id: "u1".to_owned(),
        }]
    );
    assert_eq!(api.org_member_role("o1", "u1").await, None);
}

#[tokio::test]
async fn revoking_membership_removes_member() {
    let api = Arc::new(
        FakeSnykApi::default().with_org_members("o1", vec![org_member("u1", "admin")]),
    );

    syncer(&api)
        .revoke(&Grant::new(membership(), user("u1")))
        .await
        .unwrap_or_else(|error| panic!("revoke failed: {error}"));

    assert_eq!(
        api.calls().await,
        vec![ApiCall::RemoveOrgMember {
            org_id: "o1".to_owned(),
            user_id: "u1".to_owned(),
        }]
    );
}

#[tokio::test]
async fn revoking_unknown_role_fails_without_write() {
    let api = Arc::new(FakeSnykApi::default().with_roles(standard_roles()));

    let result = syncer(&api)
        .revoke(&Grant::new(permission("r404"), user("u1")))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(message)) if message.contains("r404")));
    assert!(api.writes().await.is_empty());
}

#[tokio::test]
async fn revoking_without_minimal_role_fails_without_write() {
    let api = Arc::new(FakeSnykApi::default().with_roles(vec![role("r1", "Org Admin")]));

    let result = syncer(&api)
        .revoke(&Grant::new(permission("r1"), user("u1")))
        .await;

    assert!(
        matches!(result, Err(AppError::NotFound(message)) if message.contains("minimal default role"))
    );
    assert!(api.writes().await.is_empty());
}

#[tokio::test]
async fn non_user_principals_are_rejected_before_any_call() {
    let api = Arc::new(FakeSnykApi::default().with_roles(standard_roles()));
    let syncer = syncer(&api);
    let team = ResourceId::new(ResourceType::Group, "g1");

    let granted = syncer.grant(&team, &permission("r1")).await;
    let revoked = syncer
        .revoke(&Grant::new(membership(), team.clone()))
        .await;

    assert!(matches!(granted, Err(AppError::UnsupportedPrincipal(_))));
    assert!(matches!(revoked, Err(AppError::UnsupportedPrincipal(_))));
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn entitlements_of_other_resources_are_rejected() {
    let api = Arc::new(FakeSnykApi::default().with_roles(standard_roles()));
    let group_entitlement = Entitlement::permission(group_id(), "admin", "", "");

    let result = syncer(&api).grant(&user("u1"), &group_entitlement).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(api.calls().await.is_empty());
}

#[test]
fn revoke_plan_distinguishes_minimal_role() {
    let roles = crate::filter_roles(&standard_roles(), snyk_sync_domain::RoleScope::Org);

    assert!(matches!(
        plan_revoke(&roles, "r2"),
        Ok(RevokePlan::RemoveMembership)
    ));
    assert!(matches!(
        plan_revoke(&roles, "r1"),
        Ok(RevokePlan::Downgrade { ref minimal_role_id }) if minimal_role_id == "r2"
    ));
    assert!(plan_revoke(&roles, "g1").is_err());
}
