use mango_storage::{CredentialDocument, DocumentStore, DuckDbStore, MemoryStore, StorageError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn doc(username: &str, password: &str) -> CredentialDocument {
    CredentialDocument::new(username, password)
}

// ── Shared contract, run against every backend ──────────────────

async fn get_missing_is_none(store: &dyn DocumentStore) {
    assert!(store.get("nosuchsite").await.unwrap().is_none());
}

async fn set_then_get(store: &dyn DocumentStore) {
    store.set("example.com", &doc("alice", "00aa")).await.unwrap();
    let got = store.get("example.com").await.unwrap().unwrap();
    assert_eq!(got, doc("alice", "00aa"));
}

async fn set_overwrites(store: &dyn DocumentStore) {
    store.set("example.com", &doc("alice", "01")).await.unwrap();
    store.set("example.com", &doc("bob", "02")).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all, vec![("example.com".to_string(), doc("bob", "02"))]);
}

async fn delete_removes(store: &dyn DocumentStore) {
    store.set("gone.org", &doc("u", "ff")).await.unwrap();
    store.delete("gone.org").await.unwrap();
    assert!(store.get("gone.org").await.unwrap().is_none());
}

async fn delete_missing_is_not_found(store: &dyn DocumentStore) {
    let err = store.delete("nosuchsite").await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got: {err:?}");
    assert!(matches!(err, StorageError::NotFound(key) if key == "nosuchsite"));
}

async fn list_all_is_sorted_by_key(store: &dyn DocumentStore) {
    store.set("zeta.io", &doc("z", "03")).await.unwrap();
    store.set("alpha.io", &doc("a", "01")).await.unwrap();
    store.set("mid.io", &doc("m", "02")).await.unwrap();

    let keys: Vec<String> = store.list_all().await.unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["alpha.io", "mid.io", "zeta.io"]);
}

async fn keys_are_opaque(store: &dyn DocumentStore) {
    let key = "weird key/with 'quotes'; and spaces";
    store.set(key, &doc("u", "aa")).await.unwrap();
    assert_eq!(store.get(key).await.unwrap(), Some(doc("u", "aa")));
    assert!(store.get("weird key").await.unwrap().is_none());
}

macro_rules! backend_contract {
    ($module:ident, $make:expr) => {
        mod $module {
            use super::*;

            #[tokio::test]
            async fn get_missing_is_none() {
                let (_guard, store) = $make;
                super::get_missing_is_none(&store).await;
            }

            #[tokio::test]
            async fn set_then_get() {
                let (_guard, store) = $make;
                super::set_then_get(&store).await;
            }

            #[tokio::test]
            async fn set_overwrites() {
                let (_guard, store) = $make;
                super::set_overwrites(&store).await;
            }

            #[tokio::test]
            async fn delete_removes() {
                let (_guard, store) = $make;
                super::delete_removes(&store).await;
            }

            #[tokio::test]
            async fn delete_missing_is_not_found() {
                let (_guard, store) = $make;
                super::delete_missing_is_not_found(&store).await;
            }

            #[tokio::test]
            async fn list_all_is_sorted_by_key() {
                let (_guard, store) = $make;
                super::list_all_is_sorted_by_key(&store).await;
            }

            #[tokio::test]
            async fn keys_are_opaque() {
                let (_guard, store) = $make;
                super::keys_are_opaque(&store).await;
            }
        }
    };
}

fn duckdb_file() -> (TempDir, DuckDbStore) {
    let dir = TempDir::new().unwrap();
    let store = DuckDbStore::open(&dir.path().join("vault.duckdb"), "credentials").unwrap();
    (dir, store)
}

backend_contract!(memory, ((), MemoryStore::new()));
backend_contract!(duckdb_in_memory, ((), DuckDbStore::open_in_memory("credentials").unwrap()));
backend_contract!(duckdb_on_disk, duckdb_file());

// ── Backend specifics ───────────────────────────────────────────

#[tokio::test]
async fn duckdb_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.duckdb");

    {
        let store = DuckDbStore::open(&path, "credentials").unwrap();
        store.set("example.com", &doc("alice", "beef")).await.unwrap();
    }

    let reopened = DuckDbStore::open(&path, "credentials").unwrap();
    assert_eq!(reopened.get("example.com").await.unwrap(), Some(doc("alice", "beef")));
}

#[tokio::test]
async fn duckdb_collections_are_isolated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vault.duckdb");

    let work = DuckDbStore::open(&path, "work").unwrap();
    work.set("example.com", &doc("w", "01")).await.unwrap();
    drop(work);

    let personal = DuckDbStore::open(&path, "personal").unwrap();
    assert!(personal.get("example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn memory_store_len_tracks_documents() {
    let store = MemoryStore::new();
    assert!(store.is_empty().await);
    store.set("a", &doc("u", "01")).await.unwrap();
    store.set("b", &doc("u", "02")).await.unwrap();
    store.set("a", &doc("u", "03")).await.unwrap();
    assert_eq!(store.len().await, 2);
}

#[test]
fn document_wire_format() {
    let json = serde_json::to_value(doc("alice", "0a0b")).unwrap();
    assert_eq!(json, serde_json::json!({"username": "alice", "password": "0a0b"}));
}
