//! Directory upload and file download against the in-memory transport.

use async_trait::async_trait;
use bytes::Bytes;
use s3kit::{
    Classification, Client, ContentTypes, ListPage, MemoryTransport, ObjectMeta, StoreError,
    StoredObject, Transport, TransportError,
};
use std::fs;
use std::path::Path;
use std::time::Duration;

const BUCKET: &str = "snapshots";

fn client() -> Client<MemoryTransport> {
    Client::new(BUCKET, MemoryTransport::new())
}

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Serves one fixed object for every key, like a store that reports its
/// own ETag and encryption headers.
struct FixedObject(StoredObject);

#[async_trait]
impl Transport for FixedObject {
    async fn get(&self, _bucket: &str, _key: &str) -> Classification<StoredObject> {
        Classification::Found(self.0.clone())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        _body: Bytes,
        _content_type: Option<&str>,
    ) -> Result<(), TransportError> {
        Err(TransportError::new("PutObject", bucket, key, "read-only"))
    }

    async fn delete(&self, _bucket: &str, _key: &str) -> Classification<()> {
        Classification::NotFound
    }

    async fn head(&self, _bucket: &str, _key: &str) -> Classification<ObjectMeta> {
        Classification::Found(ObjectMeta {
            size: self.0.body.len() as u64,
            content_type: self.0.content_type.clone(),
            e_tag: self.0.e_tag.clone(),
        })
    }

    async fn list_page(
        &self,
        _bucket: &str,
        _prefix: &str,
        _continuation: Option<String>,
    ) -> Result<ListPage, TransportError> {
        Ok(ListPage::default())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> Result<String, TransportError> {
        Err(TransportError::new("PresignGetObject", bucket, key, "unsupported"))
    }
}

/// `hello` under a 32-digit ETag that is not its MD5.
fn opaque_etag_object() -> StoredObject {
    StoredObject {
        body: Bytes::from_static(b"hello"),
        e_tag: Some("0123456789abcdef0123456789abcdef".to_string()),
        ..StoredObject::default()
    }
}

async fn keys(client: &Client<MemoryTransport>, prefix: &str) -> Vec<String> {
    client
        .list(prefix)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect()
}

#[tokio::test]
async fn test_upload_directory_maps_keys_and_content_types() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "a.json", r#"{"a": 1}"#);
    write_file(root.path(), "sub/b.txt", "bee");

    let client = client();
    let uploaded = client.upload_directory("snap", root.path()).await.unwrap();
    assert_eq!(uploaded, ["snap/a.json", "snap/sub/b.txt"]);

    let a = client.read_object("snap/a.json").await.unwrap().unwrap();
    assert_eq!(a.content_type.as_deref(), Some("application/json"));
    assert_eq!(a.body.to_vec(), br#"{"a": 1}"#.to_vec());

    let b = client.read_object("snap/sub/b.txt").await.unwrap().unwrap();
    assert_eq!(b.content_type.as_deref(), Some("text/plain"));

    assert_eq!(keys(&client, "snap").await, ["snap/a.json", "snap/sub/b.txt"]);
}

#[tokio::test]
async fn test_upload_directory_unknown_extension_has_no_content_type() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "blob.bin", "\u{1}\u{2}");
    write_file(root.path(), "LICENSE", "GPL");

    let client = client();
    client.upload_directory("", root.path()).await.unwrap();

    for key in ["blob.bin", "LICENSE"] {
        let object = client.read_object(key).await.unwrap().unwrap();
        assert!(object.content_type.is_none(), "{} has a content type", key);
    }
}

#[tokio::test]
async fn test_upload_directory_uses_custom_table() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "notes.md", "# notes");
    write_file(root.path(), "data.json", "{}");

    let client = Client::new(BUCKET, MemoryTransport::new())
        .with_content_types(ContentTypes::empty().with("md", "text/markdown"));
    client.upload_directory("docs", root.path()).await.unwrap();

    let md = client.head("docs/notes.md").await.unwrap().unwrap();
    assert_eq!(md.content_type.as_deref(), Some("text/markdown"));
    let json = client.head("docs/data.json").await.unwrap().unwrap();
    assert!(json.content_type.is_none());
}

#[tokio::test]
async fn test_upload_empty_directory() {
    let root = tempfile::tempdir().unwrap();
    fs::create_dir_all(root.path().join("only/dirs")).unwrap();

    let client = client();
    let uploaded = client.upload_directory("snap", root.path()).await.unwrap();
    assert!(uploaded.is_empty());
    assert!(client.transport().is_empty(BUCKET));
}

#[tokio::test]
async fn test_upload_missing_directory_fails() {
    let root = tempfile::tempdir().unwrap();
    let err = client()
        .upload_directory("snap", root.path().join("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Walk(_)));
}

#[tokio::test]
async fn test_upload_stops_at_first_failed_write() {
    let root = tempfile::tempdir().unwrap();
    for i in 1..=5 {
        write_file(root.path(), &format!("{}.txt", i), &i.to_string());
    }

    let transport = MemoryTransport::new();
    transport.fail_key(BUCKET, "run/3.txt");
    let client = Client::new(BUCKET, transport);

    let err = client.upload_directory("run", root.path()).await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(ref e) if e.key == "run/3.txt"));
    assert_eq!(keys(&client, "run/").await, ["run/1.txt", "run/2.txt"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_upload_stops_at_first_unreadable_file() {
    let root = tempfile::tempdir().unwrap();
    for i in [1, 2, 4, 5] {
        write_file(root.path(), &format!("{}.txt", i), &i.to_string());
    }
    // Dangling symlink: listed by the walk, but cannot be read.
    std::os::unix::fs::symlink(root.path().join("gone"), root.path().join("3.txt")).unwrap();

    let client = client();
    let err = client.upload_directory("run", root.path()).await.unwrap_err();
    assert!(matches!(err, StoreError::Walk(_) | StoreError::Io { .. }));

    assert_eq!(keys(&client, "run/").await, ["run/1.txt", "run/2.txt"]);
}

#[tokio::test]
async fn test_upload_file_outside_root() {
    let root = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    write_file(other.path(), "x.txt", "x");

    let err = client()
        .upload_file("p", root.path(), other.path().join("x.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::OutsideRoot { .. }));
}

#[tokio::test]
async fn test_download_file_flattens_key() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "sub/b.txt", "bee contents");
    let client = client();
    client.upload_directory("snap", root.path()).await.unwrap();

    let out = tempfile::tempdir().unwrap();
    let dest = out.path().join("nested/out");
    let path = client.download_file("snap/sub/b.txt", &dest).await.unwrap();

    assert_eq!(path, dest.join("b.txt"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "bee contents");
    assert!(!dest.join("sub").exists());
}

#[tokio::test]
async fn test_download_file_overwrites() {
    let client = client();
    client.write("k/report.csv", "new".as_bytes().to_vec(), None).await.unwrap();

    let out = tempfile::tempdir().unwrap();
    fs::write(out.path().join("report.csv"), "old and longer").unwrap();

    client.download_file("k/report.csv", out.path()).await.unwrap();
    assert_eq!(fs::read_to_string(out.path().join("report.csv")).unwrap(), "new");
}

#[tokio::test]
async fn test_download_missing_key_is_error() {
    let out = tempfile::tempdir().unwrap();
    let err = client()
        .download_file("snap/missing.txt", out.path())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound { ref key, .. } if key == "snap/missing.txt"));
    assert!(!out.path().join("missing.txt").exists());
}

#[tokio::test]
async fn test_download_directory_key_is_rejected() {
    let out = tempfile::tempdir().unwrap();
    let err = client().download_file("snap/sub/", out.path()).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidKey(_)));
}

#[tokio::test]
async fn test_upload_single_file_root() {
    let root = tempfile::tempdir().unwrap();
    write_file(root.path(), "report.csv", "a,b");

    let client = client();
    let uploaded = client
        .upload_directory("exports", root.path().join("report.csv"))
        .await
        .unwrap();
    assert_eq!(uploaded, ["exports/report.csv"]);

    let object = client.read_object("exports/report.csv").await.unwrap().unwrap();
    assert_eq!(object.content_type.as_deref(), Some("text/csv"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_download_key_with_backslash() {
    let client = client();
    client.write("dir/a\\b.txt", b"x".to_vec(), None).await.unwrap();

    let out = tempfile::tempdir().unwrap();
    let path = client.download_file("dir/a\\b.txt", out.path()).await.unwrap();
    assert_eq!(path, out.path().join("a\\b.txt"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "x");
}

#[tokio::test]
async fn test_download_kms_object_skips_md5_check() {
    for (sse, customer) in [
        (Some("aws:kms"), None),
        (Some("aws:kms:dsse"), None),
        (None, Some("AES256")),
    ] {
        let object = StoredObject {
            server_side_encryption: sse.map(str::to_owned),
            sse_customer_algorithm: customer.map(str::to_owned),
            ..opaque_etag_object()
        };
        let client = Client::new("b", FixedObject(object));

        let out = tempfile::tempdir().unwrap();
        let path = client.download_file("k/hello.txt", out.path()).await.unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }
}

#[tokio::test]
async fn test_download_checksum_mismatch_fails() {
    let client = Client::new("b", FixedObject(opaque_etag_object()));

    let out = tempfile::tempdir().unwrap();
    let err = client
        .download_file("k/hello.txt", out.path())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::ChecksumMismatch { ref actual, .. } if actual == "5d41402abc4b2a76b9719d911017c592"
    ));
    assert!(!out.path().join("hello.txt").exists());
}

#[tokio::test]
async fn test_download_without_verification_accepts_any_etag() {
    let client = Client::new("b", FixedObject(opaque_etag_object())).with_checksum_verification(false);

    let out = tempfile::tempdir().unwrap();
    let path = client.download_file("k/hello.txt", out.path()).await.unwrap();
    assert_eq!(fs::read_to_string(path).unwrap(), "hello");
}
