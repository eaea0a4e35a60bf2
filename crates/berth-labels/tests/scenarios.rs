use std::sync::Arc;

use anyhow::{Context, Result, bail};
use berth_labels::{
    Credential, ErrorKind, LabelQuery, LabelResult, LabelService, LabelUpdate, MemoryLabelStore,
    MemoryPolicySource, NewLabel,
};
use berth_test_support::fixtures::{
    DEVELOPER, GUEST, OUTSIDER, PRIVATE_PROJECT, PROJECT_ADMIN, PUBLIC_PROJECT, SYSADMIN,
    memory_directory, policy_record,
};

struct Harness {
    service: LabelService,
    policies: Arc<MemoryPolicySource>,
}

fn harness() -> Harness {
    let directory = Arc::new(memory_directory());
    let policies = Arc::new(MemoryPolicySource::new());
    let store = Arc::new(MemoryLabelStore::new(directory.clone()));
    let service = LabelService::new(store, directory.clone(), directory, policies.clone());
    Harness { service, policies }
}

fn kind_of<T>(result: LabelResult<T>) -> Result<ErrorKind> {
    match result {
        Ok(_) => bail!("expected an error"),
        Err(err) => Ok(err.kind()),
    }
}

#[tokio::test]
async fn global_label_lifecycle() -> Result<()> {
    let h = harness();
    let admin = SYSADMIN.credential();

    let id = h
        .service
        .create_label(&admin, NewLabel::global("security"))
        .await
        .context("create global label")?;
    assert_eq!(
        kind_of(h.service.create_label(&admin, NewLabel::global("security")).await)?,
        ErrorKind::Conflict
    );
    let label = h.service.get_label(&admin, id).await?;
    assert_eq!(label.name, "security");
    h.service.delete_label(&admin, id).await?;
    assert_eq!(kind_of(h.service.get_label(&admin, id).await)?, ErrorKind::NotFound);
    Ok(())
}

#[tokio::test]
async fn create_rules() -> Result<()> {
    let h = harness();
    assert_eq!(
        kind_of(
            h.service
                .create_label(&Credential::Anonymous, NewLabel::global("x"))
                .await
        )?,
        ErrorKind::Unauthenticated
    );
    assert_eq!(
        kind_of(h.service.create_label(&SYSADMIN.credential(), NewLabel::global("")).await)?,
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind_of(
            h.service
                .create_label(&PROJECT_ADMIN.credential(), NewLabel::global("x"))
                .await
        )?,
        ErrorKind::Forbidden
    );
    assert_eq!(
        kind_of(
            h.service
                .create_label(&DEVELOPER.credential(), NewLabel::project("x", PRIVATE_PROJECT))
                .await
        )?,
        ErrorKind::Forbidden
    );
    assert_eq!(
        kind_of(
            h.service
                .create_label(&PROJECT_ADMIN.credential(), NewLabel::project("x", 999))
                .await
        )?,
        ErrorKind::NotFound
    );
    assert_eq!(
        kind_of(
            h.service
                .create_label(&OUTSIDER.credential(), NewLabel::project("x", 999))
                .await
        )?,
        ErrorKind::Forbidden
    );
    h.service
        .create_label(&PROJECT_ADMIN.credential(), NewLabel::project("x", PRIVATE_PROJECT))
        .await
        .context("project admin creates in own project")?;
    Ok(())
}

#[tokio::test]
async fn get_rules() -> Result<()> {
    let h = harness();
    let private = h
        .service
        .create_label(&PROJECT_ADMIN.credential(), NewLabel::project("dev", PRIVATE_PROJECT))
        .await?;
    let public = h
        .service
        .create_label(&PROJECT_ADMIN.credential(), NewLabel::project("dev", PUBLIC_PROJECT))
        .await?;

    assert_eq!(
        kind_of(h.service.get_label(&SYSADMIN.credential(), 0).await)?,
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind_of(h.service.get_label(&SYSADMIN.credential(), 1000).await)?,
        ErrorKind::NotFound
    );
    assert_eq!(
        h.service.get_label(&Credential::Anonymous, public).await?.id,
        public
    );
    assert_eq!(
        kind_of(h.service.get_label(&Credential::Anonymous, private).await)?,
        ErrorKind::Unauthenticated
    );
    assert_eq!(
        kind_of(h.service.get_label(&OUTSIDER.credential(), private).await)?,
        ErrorKind::Forbidden
    );
    h.service.get_label(&GUEST.credential(), private).await?;
    Ok(())
}

#[tokio::test]
async fn list_rules() -> Result<()> {
    let h = harness();
    let admin = SYSADMIN.credential();
    h.service.create_label(&admin, NewLabel::global("test")).await?;
    h.service
        .create_label(&admin, NewLabel::project("dev", PRIVATE_PROJECT))
        .await?;

    let page = h
        .service
        .list_labels(&admin, LabelQuery::global().with_name("tes"))
        .await?;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "test");
    let page = h
        .service
        .list_labels(&admin, LabelQuery::global().with_name("dev"))
        .await?;
    assert!(page.items.is_empty());

    assert_eq!(
        kind_of(h.service.list_labels(&admin, LabelQuery::project(0)).await)?,
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind_of(
            h.service
                .list_labels(&OUTSIDER.credential(), LabelQuery::project(PRIVATE_PROJECT))
                .await
        )?,
        ErrorKind::Forbidden
    );
    let page = h
        .service
        .list_labels(&DEVELOPER.credential(), LabelQuery::project(PRIVATE_PROJECT))
        .await?;
    assert_eq!(page.total, 1);
    let page = h
        .service
        .list_labels(&Credential::Anonymous, LabelQuery::global())
        .await?;
    assert_eq!(page.total, 1);
    Ok(())
}

#[tokio::test]
async fn update_and_delete_rules() -> Result<()> {
    let h = harness();
    let owner = PROJECT_ADMIN.credential();
    let id = h
        .service
        .create_label(&owner, NewLabel::project("dev", PRIVATE_PROJECT))
        .await?;
    h.service
        .create_label(&owner, NewLabel::project("prod", PRIVATE_PROJECT))
        .await?;

    assert_eq!(
        kind_of(
            h.service
                .update_label(&Credential::Anonymous, id, LabelUpdate::rename("a"))
                .await
        )?,
        ErrorKind::Unauthenticated
    );
    assert_eq!(
        kind_of(h.service.update_label(&owner, 0, LabelUpdate::rename("a")).await)?,
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind_of(
            h.service
                .update_label(&DEVELOPER.credential(), id, LabelUpdate::rename("a"))
                .await
        )?,
        ErrorKind::Forbidden
    );
    assert_eq!(
        kind_of(h.service.update_label(&owner, id, LabelUpdate::rename("prod")).await)?,
        ErrorKind::Conflict
    );
    assert_eq!(h.service.get_label(&owner, id).await?.name, "dev");
    let renamed = h
        .service
        .update_label(&owner, id, LabelUpdate::rename("staging"))
        .await?;
    assert_eq!(renamed.name, "staging");

    assert_eq!(
        kind_of(h.service.delete_label(&Credential::Anonymous, id).await)?,
        ErrorKind::Unauthenticated
    );
    assert_eq!(
        kind_of(h.service.delete_label(&owner, 0).await)?,
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        kind_of(h.service.delete_label(&DEVELOPER.credential(), id).await)?,
        ErrorKind::Forbidden
    );
    h.service.delete_label(&owner, id).await?;
    assert_eq!(
        kind_of(h.service.delete_label(&owner, id).await)?,
        ErrorKind::NotFound
    );
    Ok(())
}

#[tokio::test]
async fn non_members_never_learn_about_missing_labels() -> Result<()> {
    let h = harness();
    let id = h
        .service
        .create_label(&PROJECT_ADMIN.credential(), NewLabel::project("dev", PRIVATE_PROJECT))
        .await?;
    let outsider = OUTSIDER.credential();
    for target in [id, 4242] {
        assert_eq!(
            kind_of(
                h.service
                    .update_label(&outsider, target, LabelUpdate::rename("x"))
                    .await
            )?,
            ErrorKind::Forbidden
        );
        assert_eq!(
            kind_of(h.service.delete_label(&outsider, target).await)?,
            ErrorKind::Forbidden
        );
    }
    assert_eq!(
        kind_of(
            h.service
                .create_label(&outsider, NewLabel::project("x", PRIVATE_PROJECT))
                .await
        )?,
        ErrorKind::Forbidden
    );
    Ok(())
}

#[tokio::test]
async fn resources_reference_scan() -> Result<()> {
    let h = harness();
    let admin = SYSADMIN.credential();
    let global = h.service.create_label(&admin, NewLabel::global("g")).await?;
    let project = h
        .service
        .create_label(&admin, NewLabel::project("p", PRIVATE_PROJECT))
        .await?;
    let unused = h.service.create_label(&admin, NewLabel::global("unused")).await?;

    h.policies
        .insert(policy_record(
            10,
            PRIVATE_PROJECT,
            &format!(
                r#"[{{"kind":"label","value":{global}}},{{"kind":"label","value":"{project}"}}]"#
            ),
        ))
        .await;
    h.policies
        .insert(policy_record(11, PUBLIC_PROJECT, r#"[{"kind":"name","value":"lib/**"}]"#))
        .await;
    h.policies
        .insert(policy_record(12, PUBLIC_PROJECT, "not json at all"))
        .await;

    let found = h.service.list_label_resources(&admin, global).await?;
    assert_eq!(
        found
            .replication_policies
            .iter()
            .map(|p| p.id)
            .collect::<Vec<_>>(),
        vec![10]
    );
    let found = h.service.list_label_resources(&admin, project).await?;
    assert_eq!(found.replication_policies.len(), 1);
    assert_eq!(found.replication_policies[0].id, 10);
    let found = h.service.list_label_resources(&admin, unused).await?;
    assert!(found.replication_policies.is_empty());

    let body = serde_json::to_value(&found)?;
    assert_eq!(body, serde_json::json!({"replication_policies": []}));
    Ok(())
}

#[tokio::test]
async fn resources_access_rules() -> Result<()> {
    let h = harness();
    let admin = SYSADMIN.credential();
    let global = h.service.create_label(&admin, NewLabel::global("g")).await?;
    let project = h
        .service
        .create_label(&admin, NewLabel::project("p", PRIVATE_PROJECT))
        .await?;

    assert_eq!(
        kind_of(
            h.service
                .list_label_resources(&Credential::Anonymous, global)
                .await
        )?,
        ErrorKind::Unauthenticated
    );
    assert_eq!(
        kind_of(h.service.list_label_resources(&admin, 9999).await)?,
        ErrorKind::NotFound
    );
    assert_eq!(
        kind_of(
            h.service
                .list_label_resources(&PROJECT_ADMIN.credential(), global)
                .await
        )?,
        ErrorKind::Forbidden
    );
    assert_eq!(
        kind_of(h.service.list_label_resources(&DEVELOPER.credential(), project).await)?,
        ErrorKind::Forbidden
    );
    h.service
        .list_label_resources(&PROJECT_ADMIN.credential(), project)
        .await?;
    Ok(())
}
