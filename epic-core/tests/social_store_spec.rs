use speculate2::speculate;

speculate! {
    use chrono::{Duration, Utc};
    use epic_core::models::*;
    use epic_core::Database;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn setup_db() -> Database {
        Database::open_memory().expect("Failed to create test database")
    }

    fn create_pending(db: &Database, organization_id: Uuid, content: &str) -> SocialSuggestion {
        db.create_suggestion(organization_id, CreateSuggestionInput {
            trigger_type: TriggerType::Manual,
            content: content.into(),
            image_url: None,
            suggested_platforms: vec![Platform::Twitter],
            status: SuggestionStatus::Pending,
        })
        .expect("Failed to create suggestion")
    }

    describe "autopilot settings" {
        it "are absent until saved" {
            let db = setup_db();
            assert!(db.get_autopilot_settings(Uuid::new_v4()).unwrap().is_none());
        }

        it "apply partial updates over disabled defaults" {
            let db = setup_db();
            let org = Uuid::new_v4();

            let settings = db.upsert_autopilot_settings(org, UpdateAutopilotSettingsInput {
                enabled: Some(true),
                on_lead_converted: Some(true),
                ..Default::default()
            })
            .unwrap();
            assert!(settings.enabled);
            assert!(settings.on_lead_converted);
            assert!(!settings.on_five_star_call);
            assert_eq!(settings.approval_mode, ApprovalMode::RequiresApproval);
            assert_eq!(settings.max_posts_per_day, DEFAULT_MAX_POSTS_PER_DAY);

            let updated = db.upsert_autopilot_settings(org, UpdateAutopilotSettingsInput {
                approval_mode: Some(ApprovalMode::AutoPost),
                default_platforms: Some(BTreeSet::from([Platform::Linkedin, Platform::Twitter])),
                ..Default::default()
            })
            .unwrap();
            assert!(updated.enabled);
            assert!(updated.on_lead_converted);
            assert_eq!(updated.approval_mode, ApprovalMode::AutoPost);

            let stored = db.get_autopilot_settings(org).unwrap().unwrap();
            assert_eq!(
                stored.default_platforms,
                BTreeSet::from([Platform::Twitter, Platform::Linkedin])
            );
        }

        it "always enable manual triggers" {
            let settings = AutopilotSettings::disabled(Uuid::new_v4(), Utc::now());
            assert!(settings.trigger_enabled(TriggerType::Manual));
            assert!(!settings.trigger_enabled(TriggerType::WeeklyContent));
        }
    }

    describe "suggestions" {
        it "are scoped to their organization" {
            let db = setup_db();
            let org = Uuid::new_v4();
            let suggestion = create_pending(&db, org, "Hello");

            assert!(db.get_suggestion(org, suggestion.id).unwrap().is_some());
            assert!(db.get_suggestion(Uuid::new_v4(), suggestion.id).unwrap().is_none());
            assert!(db.list_suggestions(Uuid::new_v4(), None).unwrap().is_empty());
        }

        it "list newest first and filter by status" {
            let db = setup_db();
            let org = Uuid::new_v4();
            let older = create_pending(&db, org, "first");
            let newer = create_pending(&db, org, "second");
            db.dismiss_suggestion(org, older.id).unwrap();

            let all = db.list_suggestions(org, None).unwrap();
            assert_eq!(all.len(), 2);
            assert_eq!(all[0].id, newer.id);

            let pending = db.list_suggestions(org, Some(SuggestionStatus::Pending)).unwrap();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].id, newer.id);

            let dismissed = db.list_suggestions(org, Some(SuggestionStatus::Dismissed)).unwrap();
            assert_eq!(dismissed[0].id, older.id);
            assert!(dismissed[0].dismissed_at.is_some());
        }

        it "record a post and log it" {
            let db = setup_db();
            let org = Uuid::new_v4();
            let suggestion = create_pending(&db, org, "Launch day");

            let entry = db
                .record_post(org, suggestion.id, "post-123", &[Platform::Twitter])
                .unwrap();
            assert_eq!(entry.suggestion_id, suggestion.id);

            let stored = db.get_suggestion(org, suggestion.id).unwrap().unwrap();
            assert_eq!(stored.status, SuggestionStatus::Posted);
            assert_eq!(stored.post_id.as_deref(), Some("post-123"));
            assert_eq!(stored.post_platforms, vec![Platform::Twitter]);
            assert!(stored.posted_at.is_some());

            let log = db.list_post_log(org).unwrap();
            assert_eq!(log.len(), 1);
            assert_eq!(log[0].post_id, "post-123");
        }

        it "refuse to post or dismiss twice" {
            let db = setup_db();
            let org = Uuid::new_v4();
            let suggestion = create_pending(&db, org, "Once");

            db.record_post(org, suggestion.id, "post-1", &[Platform::Twitter]).unwrap();
            assert!(db.record_post(org, suggestion.id, "post-2", &[Platform::Twitter]).is_err());
            assert!(!db.dismiss_suggestion(org, suggestion.id).unwrap());
            assert_eq!(db.list_post_log(org).unwrap().len(), 1);
        }
    }

    describe "post counting" {
        it "counts posts inside the window only" {
            let db = setup_db();
            let org = Uuid::new_v4();
            for i in 0..2 {
                let suggestion = create_pending(&db, org, &format!("post {}", i));
                db.record_post(org, suggestion.id, &format!("p{}", i), &[Platform::Facebook]).unwrap();
            }

            assert_eq!(db.count_posts_since(org, Utc::now() - Duration::hours(24)).unwrap(), 2);
            assert_eq!(db.count_posts_since(org, Utc::now() + Duration::hours(1)).unwrap(), 0);
            assert_eq!(db.count_posts_since(Uuid::new_v4(), Utc::now() - Duration::hours(24)).unwrap(), 0);
        }
    }

    describe "users" {
        it "provision once per email" {
            let db = setup_db();
            let org = Uuid::new_v4();

            let (user, created) = db.provision_user(ProvisionUserInput {
                email: "Owner@Example.com ".into(),
                name: Some("Owner".into()),
                organization_id: Some(org),
            })
            .unwrap();
            assert!(created);
            assert_eq!(user.email, "owner@example.com");

            let (again, created) = db.provision_user(ProvisionUserInput {
                email: "owner@example.com".into(),
                name: None,
                organization_id: None,
            })
            .unwrap();
            assert!(!created);
            assert_eq!(again.id, user.id);
            assert_eq!(again.organization_id, Some(org));
            assert_eq!(db.get_user(user.id).unwrap().unwrap().email, "owner@example.com");
        }

        it "adopt an organization when they had none" {
            let db = setup_db();
            let org = Uuid::new_v4();
            db.provision_user(ProvisionUserInput {
                email: "solo@example.com".into(),
                name: None,
                organization_id: None,
            })
            .unwrap();

            let (user, _) = db.provision_user(ProvisionUserInput {
                email: "solo@example.com".into(),
                name: None,
                organization_id: Some(org),
            })
            .unwrap();
            assert_eq!(user.organization_id, Some(org));
        }

        it "reject an empty email" {
            let db = setup_db();
            let result = db.provision_user(ProvisionUserInput {
                email: "  ".into(),
                name: None,
                organization_id: None,
            });
            assert!(result.is_err());
        }
    }

    describe "brands" {
        it "upsert by organization" {
            let db = setup_db();
            let org = Uuid::new_v4();
            assert!(db.get_brand(org).unwrap().is_none());

            db.upsert_brand(org, "Acme", None).unwrap();
            db.upsert_brand(org, "Acme Roofing", Some("Roofs that last")).unwrap();

            let brand = db.get_brand(org).unwrap().unwrap();
            assert_eq!(brand.name, "Acme Roofing");
            assert_eq!(brand.description.as_deref(), Some("Roofs that last"));
        }
    }
}
