use nextnote::controller::{NoteStore, ShareGuard, UserDirectory};
use nextnote::db::Database;
use nextnote::models::*;
use speculate2::speculate;
use uuid::Uuid;

fn uid(s: &str) -> UserId {
    UserId::from(s)
}

fn create_test_note(db: &Database, owner: &str, title: &str) -> Note {
    db.create_note(
        NoteDraft::new(title.to_string(), None, Some("body".to_string())),
        &uid(owner),
    )
    .expect("Failed to create note")
}

fn patch(note: &Note) -> NotePatch {
    NotePatch {
        id: note.id,
        title: note.title.clone(),
        name: note.name.clone(),
        grouping: None,
        content: None,
        deleted: None,
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "users" {
        it "registers a user with a display name" {
            let user = db.create_user(CreateUserInput {
                uid: uid("alice"),
                display_name: Some("Alice Liddell".to_string()),
            }).expect("Failed to create user");

            assert_eq!(user.display_name, "Alice Liddell");
            let found = db.get_user(&uid("alice")).expect("Query failed");
            assert_eq!(found, Some(user));
        }

        it "defaults the display name to the uid" {
            let user = db.create_user(CreateUserInput {
                uid: uid("bob"),
                display_name: None,
            }).expect("Failed to create user");

            assert_eq!(user.display_name, "bob");
        }

        it "renames an existing user" {
            db.create_user(CreateUserInput { uid: uid("bob"), display_name: None }).unwrap();
            db.create_user(CreateUserInput {
                uid: uid("bob"),
                display_name: Some("Robert".to_string()),
            }).unwrap();

            let found = db.get_user(&uid("bob")).unwrap().expect("User missing");
            assert_eq!(found.display_name, "Robert");
        }

        it "expands unknown users to their uid" {
            let info = db.user_info(&uid("ghost")).expect("Lookup failed");
            assert_eq!(info, UserInfo::unknown(&uid("ghost")));
            assert!(!db.exists(&uid("ghost")).unwrap());
        }
    }

    describe "notes" {
        describe "create_note" {
            it "assigns an id and records the owner" {
                let note = create_test_note(&db, "alice", "Groceries");

                assert_eq!(note.title, "Groceries");
                assert_eq!(note.name, "Groceries");
                assert_eq!(note.owner, uid("alice"));
                assert!(!note.deleted);

                let found = db.get_note(note.id).unwrap().expect("Note missing");
                assert_eq!(found.id, note.id);
                assert_eq!(found.content, "body");
                assert_eq!(found.owner, uid("alice"));
            }
        }

        describe "get_note" {
            it "returns None for a non-existent note" {
                assert!(db.get_note(Uuid::new_v4()).unwrap().is_none());
            }
        }

        describe "update_note" {
            it "writes the title and keeps omitted fields" {
                let note = db.create_note(
                    NoteDraft::new("Old".to_string(), Some("work".to_string()), Some("text".to_string())),
                    &uid("alice"),
                ).unwrap();

                let updated = db.update_note(NotePatch {
                    title: "New".to_string(),
                    name: "New".to_string(),
                    ..patch(&note)
                }).unwrap().expect("Note missing");

                assert_eq!(updated.title, "New");
                assert_eq!(updated.name, "New");
                assert_eq!(updated.grouping.as_deref(), Some("work"));
                assert_eq!(updated.content, "text");
                assert_eq!(updated.owner, uid("alice"));
                assert!(updated.updated_at >= note.updated_at);

                let found = db.get_note(note.id).unwrap().unwrap();
                assert_eq!(found.title, "New");
                assert_eq!(found.grouping.as_deref(), Some("work"));
            }

            it "sets the soft-delete flag" {
                let note = create_test_note(&db, "alice", "Trash me");

                let updated = db.update_note(NotePatch { deleted: Some(true), ..patch(&note) })
                    .unwrap()
                    .unwrap();

                assert!(updated.deleted);
                assert!(db.get_note(note.id).unwrap().unwrap().deleted);
            }

            it "clears the grouping on an explicit null" {
                let note = db.create_note(
                    NoteDraft::new("Standup".to_string(), Some("work".to_string()), None),
                    &uid("alice"),
                ).unwrap();

                let updated = db.update_note(NotePatch { grouping: Some(None), ..patch(&note) })
                    .unwrap()
                    .unwrap();

                assert_eq!(updated.grouping, None);
                assert_eq!(db.get_note(note.id).unwrap().unwrap().grouping, None);
            }

            it "returns None for a non-existent note" {
                let note = create_test_note(&db, "alice", "Gone");
                db.delete_note(note.id).unwrap();

                assert!(db.update_note(patch(&note)).unwrap().is_none());
            }
        }

        describe "delete_note" {
            it "removes the note and reports it" {
                let note = create_test_note(&db, "alice", "Bye");

                assert!(db.delete_note(note.id).unwrap());
                assert!(db.get_note(note.id).unwrap().is_none());
                assert!(!db.delete_note(note.id).unwrap());
            }

            it "removes the note's share roles" {
                let note = create_test_note(&db, "alice", "Shared");
                db.upsert_share(note.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();

                db.delete_note(note.id).unwrap();

                assert!(db.get_share_permissions(note.id, &uid("bob")).unwrap().is_none());
            }
        }

        describe "get_notes_for_user" {
            it "returns owned notes in full" {
                let note = create_test_note(&db, "alice", "Mine");
                create_test_note(&db, "bob", "Not mine");

                let refs = db.get_notes_for_user(&uid("alice"), None, None).unwrap();

                assert_eq!(refs.len(), 1);
                match &refs[0] {
                    NoteRef::Full(found) => assert_eq!(found.id, note.id),
                    other => panic!("Expected full note, got {:?}", other),
                }
            }

            it "lists shared notes by id after owned notes" {
                let own = create_test_note(&db, "bob", "Bob's");
                let shared = create_test_note(&db, "alice", "Alice's");
                db.upsert_share(shared.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();

                let refs = db.get_notes_for_user(&uid("bob"), None, None).unwrap();

                assert_eq!(refs.len(), 2);
                assert_eq!(refs[0].id(), own.id);
                assert_eq!(refs[1], NoteRef::IdOnly(shared.id));
            }

            it "orders owned notes by most recent update" {
                let first = create_test_note(&db, "alice", "First");
                let second = create_test_note(&db, "alice", "Second");
                db.update_note(NotePatch { content: Some("edited".to_string()), ..patch(&first) })
                    .unwrap();

                let refs = db.get_notes_for_user(&uid("alice"), None, None).unwrap();
                let ids: Vec<_> = refs.iter().map(NoteRef::id).collect();

                assert_eq!(ids, vec![first.id, second.id]);
            }

            it "filters on the deleted flag" {
                let live = create_test_note(&db, "alice", "Live");
                let trashed = create_test_note(&db, "alice", "Trashed");
                db.update_note(NotePatch { deleted: Some(true), ..patch(&trashed) }).unwrap();

                let live_ids: Vec<_> = db.get_notes_for_user(&uid("alice"), Some(false), None)
                    .unwrap().iter().map(NoteRef::id).collect();
                let trash_ids: Vec<_> = db.get_notes_for_user(&uid("alice"), Some(true), None)
                    .unwrap().iter().map(NoteRef::id).collect();
                let all = db.get_notes_for_user(&uid("alice"), None, None).unwrap();

                assert_eq!(live_ids, vec![live.id]);
                assert_eq!(trash_ids, vec![trashed.id]);
                assert_eq!(all.len(), 2);
            }

            it "filters on the grouping" {
                let work = db.create_note(
                    NoteDraft::new("Standup".to_string(), Some("work".to_string()), None),
                    &uid("alice"),
                ).unwrap();
                db.create_note(
                    NoteDraft::new("Milk".to_string(), Some("home".to_string()), None),
                    &uid("alice"),
                ).unwrap();
                let shared_work = db.create_note(
                    NoteDraft::new("Roadmap".to_string(), Some("work".to_string()), None),
                    &uid("bob"),
                ).unwrap();
                db.upsert_share(shared_work.id, &uid("alice"), Permissions::READ, &uid("bob")).unwrap();

                let refs = db.get_notes_for_user(&uid("alice"), None, Some("work")).unwrap();

                assert_eq!(refs.len(), 2);
                assert_eq!(refs[0].id(), work.id);
                assert_eq!(refs[1], NoteRef::IdOnly(shared_work.id));
            }
        }
    }

    describe "shares" {
        describe "upsert_share" {
            it "creates a role" {
                let note = create_test_note(&db, "alice", "Shared");

                let role = db.upsert_share(note.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();

                assert_eq!(role.note_id, note.id);
                assert_eq!(role.share_with, uid("bob"));
                assert_eq!(role.permissions, Permissions::READ);
            }

            it "replaces the permissions of an existing role" {
                let note = create_test_note(&db, "alice", "Shared");
                let first = db.upsert_share(note.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();

                let second = db.upsert_share(
                    note.id,
                    &uid("bob"),
                    Permissions::READ | Permissions::UPDATE,
                    &uid("alice"),
                ).unwrap();

                assert_eq!(second.permissions.bits(), 3);
                assert_eq!(second.created_at, first.created_at);
                assert_eq!(db.get_share_roles(note.id, &uid("alice")).unwrap().len(), 1);
            }

            it "records who granted the role" {
                let note = create_test_note(&db, "alice", "Shared");
                db.upsert_share(note.id, &uid("bob"), Permissions::READ | Permissions::SHARE, &uid("alice"))
                    .unwrap();

                let role = db.upsert_share(note.id, &uid("carol"), Permissions::READ, &uid("bob")).unwrap();
                assert_eq!(role.shared_by, uid("bob"));

                let role = db.upsert_share(note.id, &uid("carol"), Permissions::READ, &uid("alice")).unwrap();
                assert_eq!(role.shared_by, uid("alice"));
                let stored = db.get_share_roles(note.id, &uid("alice")).unwrap();
                assert!(stored.iter().all(|r| r.shared_by == uid("alice")));
            }

            it "fails for a non-existent note" {
                assert!(db.upsert_share(Uuid::new_v4(), &uid("bob"), Permissions::READ, &uid("alice")).is_err());
            }
        }

        describe "get_share_roles" {
            it "lists every recipient" {
                let note = create_test_note(&db, "alice", "Shared");
                db.upsert_share(note.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();
                db.upsert_share(note.id, &uid("carol"), Permissions::ALL, &uid("alice")).unwrap();

                let roles = db.get_share_roles(note.id, &uid("alice")).unwrap();
                let mut recipients: Vec<_> = roles.iter().map(|r| r.share_with.to_string()).collect();
                recipients.sort();

                assert_eq!(recipients, vec!["bob", "carol"]);
            }

            it "returns nothing when the owner does not match" {
                let note = create_test_note(&db, "alice", "Shared");
                db.upsert_share(note.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();

                assert!(db.get_share_roles(note.id, &uid("mallory")).unwrap().is_empty());
            }
        }

        describe "delete_share" {
            it "removes the role once" {
                let note = create_test_note(&db, "alice", "Shared");
                db.upsert_share(note.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();

                assert!(db.delete_share(note.id, &uid("bob")).unwrap());
                assert!(!db.delete_share(note.id, &uid("bob")).unwrap());
                assert!(db.get_share_roles(note.id, &uid("alice")).unwrap().is_empty());
            }
        }

        describe "check_permission" {
            it "always allows the owner" {
                let note = create_test_note(&db, "alice", "Mine");

                assert!(db.check_permission(&uid("alice"), Permissions::DELETE, &note).unwrap());
            }

            it "allows a recipient only the granted bits" {
                let note = create_test_note(&db, "alice", "Shared");
                db.upsert_share(note.id, &uid("bob"), Permissions::READ | Permissions::UPDATE, &uid("alice")).unwrap();

                assert!(db.check_permission(&uid("bob"), Permissions::UPDATE, &note).unwrap());
                assert!(!db.check_permission(&uid("bob"), Permissions::DELETE, &note).unwrap());
            }

            it "denies users without a role" {
                let note = create_test_note(&db, "alice", "Private");

                assert!(!db.check_permission(&uid("eve"), Permissions::READ, &note).unwrap());
            }
        }
    }

    describe "trait dispatch" {
        it "serves the controller collaborators from one database" {
            let store: &dyn NoteStore = &db;
            let guard: &dyn ShareGuard = &db;

            let note = store.create(NoteDraft::new("Via trait".to_string(), None, None), &uid("alice"))
                .unwrap();
            guard.grant(note.id, &uid("bob"), Permissions::READ, &uid("alice")).unwrap();

            assert_eq!(guard.roles_for(note.id, &uid("alice")).unwrap().len(), 1);
            assert!(guard.revoke(note.id, &uid("bob")).unwrap());
            assert!(store.delete(note.id).unwrap());
            assert!(store.find(note.id).unwrap().is_none());
        }
    }
}

#[test]
fn file_backed_database_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("nextnote.db");

    let note_id = {
        let db = Database::open(path.clone()).expect("Failed to open database");
        db.migrate().expect("Failed to migrate");
        create_test_note(&db, "alice", "Persistent").id
    };

    let db = Database::open(path).expect("Failed to reopen database");
    db.migrate().expect("Failed to migrate");
    let note = db.get_note(note_id).unwrap().expect("Note missing after reopen");
    assert_eq!(note.title, "Persistent");
}
