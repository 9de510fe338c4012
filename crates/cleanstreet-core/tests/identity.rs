//! Identity store tests: worker provisioning/removal and self-deletion.

mod common;

use std::sync::Arc;

use cleanstreet_core::{
    AccountRequest, ClaimStatus, CoreError, IdentityService, SessionRecord, Submission,
};
use common::{photo, Harness};
use database::{account, complaint, ComplaintStatus, Role};
use mock_services::FailingEvidenceStore;

fn worker_request(email: &str, password: Option<&str>) -> AccountRequest {
    AccountRequest {
        display_name: "Ravi".to_string(),
        email: email.to_string(),
        phone: Some("  ".to_string()),
        password: password.map(str::to_string),
    }
}

async fn file(h: &Harness, reporter_id: i64, description: &str) -> database::Complaint {
    h.engine
        .submit(
            reporter_id,
            Submission {
                description: description.to_string(),
                before_evidence: photo("before.jpg"),
                location: None,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_provision_worker() {
    let h = Harness::new().await;

    let worker = h
        .identity
        .provision_worker(Role::Admin, worker_request("ravi@crew.example.com", Some("pw")))
        .await
        .unwrap();
    assert_eq!(worker.role, Role::Worker);
    assert_eq!(worker.phone, None);
    assert!(worker.has_credential());

    let duplicate = h
        .identity
        .provision_worker(Role::Admin, worker_request("RAVI@crew.example.com", Some("pw")))
        .await;
    assert!(matches!(duplicate, Err(CoreError::DuplicateIdentity(_))));
}

#[tokio::test]
async fn test_provision_worker_checks() {
    let h = Harness::new().await;

    for role in [Role::User, Role::Worker] {
        let result = h
            .identity
            .provision_worker(role, worker_request("ravi@crew.example.com", Some("pw")))
            .await;
        assert!(matches!(result, Err(CoreError::Unauthorized { .. })));
    }

    let result = h
        .identity
        .provision_worker(Role::Admin, worker_request("ravi-at-crew", Some("pw")))
        .await;
    assert!(matches!(result, Err(CoreError::InvalidEmailFormat(_))));

    let result = h
        .identity
        .provision_worker(Role::Admin, worker_request("ravi@crew.example.com", None))
        .await;
    assert!(matches!(result, Err(CoreError::InvalidInput(_))));

    assert!(account::list_accounts(h.db.pool()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_worker_with_active_work() {
    let h = Harness::new().await;
    let reporter = h.reporter("Asha").await;
    let worker = h.worker("Ravi").await;
    let c = file(&h, reporter.id, "Litter").await;
    h.engine
        .claim_or_update(worker.id, c.id, ClaimStatus::InProgress)
        .await
        .unwrap();

    let result = h.identity.remove_worker(Role::Admin, worker.id).await;
    assert!(matches!(
        result,
        Err(CoreError::HasActiveWork { open: 1, .. })
    ));
    assert!(account::get_account(h.db.pool(), worker.id).await.is_ok());

    // Once the work is completed the worker can go; history keeps the id.
    h.engine.complete(worker.id, c.id, photo("after.png")).await.unwrap();
    h.identity.remove_worker(Role::Admin, worker.id).await.unwrap();

    assert!(account::get_account(h.db.pool(), worker.id).await.is_err());
    let history = complaint::get_complaint(h.db.pool(), c.id).await.unwrap();
    assert_eq!(history.status, ComplaintStatus::Completed);
    assert_eq!(history.assigned_worker_id, Some(worker.id));
}

#[tokio::test]
async fn test_remove_worker_checks() {
    let h = Harness::new().await;
    let reporter = h.reporter("Asha").await;
    let worker = h.worker("Ravi").await;

    let result = h.identity.remove_worker(Role::Worker, worker.id).await;
    assert!(matches!(result, Err(CoreError::Unauthorized { .. })));

    let result = h.identity.remove_worker(Role::Admin, reporter.id).await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })));

    let result = h.identity.remove_worker(Role::Admin, 999).await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let h = Harness::new().await;
    let reporter = h.reporter("Asha").await;
    let other = h.reporter("Bo").await;
    let worker = h.worker("Ravi").await;

    let first = file(&h, reporter.id, "Overflowing bin").await;
    let second = file(&h, reporter.id, "Broken bench").await;
    let kept = file(&h, other.id, "Graffiti").await;
    let done = h
        .engine
        .complete(worker.id, second.id, photo("after.png"))
        .await
        .unwrap();

    let refs = vec![
        first.before_evidence_ref.clone(),
        second.before_evidence_ref.clone(),
        done.after_evidence_ref.clone().unwrap(),
    ];
    for reference in &refs {
        assert!(h.evidence.contains(reference).await);
    }

    let session = SessionRecord::from(&reporter);
    let report = h.identity.delete_account(&session, reporter.id).await.unwrap();
    assert_eq!(report.complaints_removed, 2);
    assert_eq!(report.evidence_released, 3);
    assert_eq!(report.evidence_failed, 0);

    for reference in &refs {
        assert!(!h.evidence.contains(reference).await);
    }
    assert!(account::get_account(h.db.pool(), reporter.id).await.is_err());
    assert!(complaint::get_complaint(h.db.pool(), first.id).await.is_err());
    assert!(complaint::get_complaint(h.db.pool(), second.id).await.is_err());

    assert!(h.evidence.contains(&kept.before_evidence_ref).await);
    assert!(complaint::get_complaint(h.db.pool(), kept.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_account_only_by_owner() {
    let h = Harness::new().await;
    let reporter = h.reporter("Asha").await;
    let other = h.reporter("Bo").await;
    let c = file(&h, reporter.id, "Litter").await;

    let result = h
        .identity
        .delete_account(&SessionRecord::from(&other), reporter.id)
        .await;
    assert!(matches!(result, Err(CoreError::Unauthorized { .. })));
    assert!(complaint::get_complaint(h.db.pool(), c.id).await.is_ok());
    assert!(h.evidence.contains(&c.before_evidence_ref).await);
}

#[tokio::test]
async fn test_delete_account_survives_evidence_failures() {
    let h = Harness::new().await;
    let reporter = h.reporter("Asha").await;
    file(&h, reporter.id, "Litter").await;

    let store = Arc::new(FailingEvidenceStore::failing_deletes());
    let identity = IdentityService::new(h.db.clone(), store);

    let report = identity
        .delete_account(&SessionRecord::from(&reporter), reporter.id)
        .await
        .unwrap();
    assert_eq!(report.complaints_removed, 1);
    assert_eq!(report.evidence_failed, 1);
    assert!(account::get_account(h.db.pool(), reporter.id).await.is_err());
}

#[tokio::test]
async fn test_worker_cannot_delete_self_with_active_work() {
    let h = Harness::new().await;
    let reporter = h.reporter("Asha").await;
    let worker = h.worker("Ravi").await;
    let c = file(&h, reporter.id, "Litter").await;
    h.engine
        .claim_or_update(worker.id, c.id, ClaimStatus::Accepted)
        .await
        .unwrap();

    let result = h
        .identity
        .delete_account(&SessionRecord::from(&worker), worker.id)
        .await;
    assert!(matches!(result, Err(CoreError::HasActiveWork { .. })));
    assert!(account::get_account(h.db.pool(), worker.id).await.is_ok());
}

#[tokio::test]
async fn test_change_password() {
    let h = Harness::new().await;
    let created = h
        .identity
        .create_account(
            AccountRequest {
                display_name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                phone: Some("98450 12345".to_string()),
                password: Some("old".to_string()),
            },
            Role::User,
        )
        .await
        .unwrap();

    let wrong = h.identity.change_password(created.id, "nope", "new").await;
    assert!(matches!(wrong, Err(CoreError::InvalidCredential)));

    h.identity.change_password(created.id, "old", "new").await.unwrap();
    let stored = h.identity.profile(created.id).await.unwrap();
    assert!(cleanstreet_core::verify_password("new", &stored.credential_hash));
    assert!(!cleanstreet_core::verify_password("old", &stored.credential_hash));
    assert_eq!(stored.phone.as_deref(), Some("98450 12345"));
}

#[tokio::test]
async fn test_admin_listings() {
    let h = Harness::new().await;
    h.reporter("Asha").await;
    h.worker("Zed").await;
    h.worker("Meena").await;

    let workers = h.identity.list_workers(Role::Admin).await.unwrap();
    let names: Vec<_> = workers.iter().map(|w| w.display_name.as_str()).collect();
    assert_eq!(names, vec!["Meena", "Zed"]);

    let accounts = h.identity.list_accounts(Role::Admin).await.unwrap();
    assert_eq!(accounts.len(), 3);
    assert!(accounts.iter().all(|a| !a.external_linked));

    assert!(matches!(
        h.identity.list_workers(Role::User).await,
        Err(CoreError::Unauthorized { .. })
    ));
    assert!(matches!(
        h.identity.list_accounts(Role::Worker).await,
        Err(CoreError::Unauthorized { .. })
    ));
}
